//! Command implementations

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use augur_engine::{PredictionEngine, split};
use augur_utils::types::{Profile, ResultBundle, SEGMENT_COUNT};

use crate::Config;
use crate::server::{self, AppState, PredictionResponse};

const SEGMENT_TITLES: [&str; SEGMENT_COUNT] = ["Past", "Present", "Future"];

fn engine_from(config: &Config) -> Result<PredictionEngine> {
    config.validate()?;
    PredictionEngine::from_config(config).context("Failed to set up the generation clients")
}

pub(super) async fn execute_serve(config: &Config) -> Result<()> {
    let engine = engine_from(config)?;
    let address = config.server.bind_address();
    info!(model = %config.text.model, "Starting HTTP service");
    server::serve(&address, AppState::new(engine))
        .await
        .with_context(|| format!("Failed to serve on {address}"))
}

pub(super) async fn execute_predict(config: &Config, profile: Profile, out_dir: Option<&Path>, json: bool) -> Result<()> {
    profile.validate()?;
    let engine = engine_from(config)?;
    let bundle = engine.request_prediction(&profile).await?;

    if let Some(dir) = out_dir {
        for path in write_images(dir, &bundle)? {
            eprintln!("✓ Wrote {}", path.display());
        }
    }

    let mut stdout = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &PredictionResponse::from(bundle))?;
        writeln!(stdout)?;
    } else {
        print_segments(&mut stdout, bundle.segments.iter().map(String::as_str))?;
    }
    Ok(())
}

pub(super) fn execute_split(file: Option<&Path>, json: bool) -> Result<()> {
    let text = match file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).context("Failed to read stdin")?;
            buffer
        }
    };

    let segments = split(&text);
    let mut stdout = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &segments)?;
        writeln!(stdout)?;
    } else {
        print_segments(&mut stdout, segments.iter().map(String::as_str))?;
    }
    Ok(())
}

pub(super) fn execute_config(config: &Config, json: bool) -> Result<()> {
    let effective = config.effective_config();
    let mut stdout = io::stdout().lock();

    if json {
        let map: serde_json::Map<String, serde_json::Value> = effective
            .into_iter()
            .map(|(key, (value, source))| (key, serde_json::json!({ "value": value, "source": source })))
            .collect();
        serde_json::to_writer_pretty(&mut stdout, &map)?;
        writeln!(stdout)?;
        return Ok(());
    }

    let width = effective.keys().map(String::len).max().unwrap_or(0);
    writeln!(stdout, "Effective configuration:")?;
    for (key, (value, source)) in &effective {
        writeln!(stdout, "  {key:<width$}  {value}  [{source}]")?;
    }
    Ok(())
}

fn print_segments<'a>(out: &mut impl Write, segments: impl Iterator<Item = &'a str>) -> io::Result<()> {
    for (index, (title, segment)) in SEGMENT_TITLES.iter().zip(segments).enumerate() {
        if index > 0 {
            writeln!(out)?;
        }
        writeln!(out, "== {title} ==")?;
        writeln!(out, "{segment}")?;
    }
    Ok(())
}

fn write_images(dir: &Path, bundle: &ResultBundle) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let mut written = Vec::with_capacity(SEGMENT_COUNT);
    for (index, image) in bundle.images.iter().enumerate() {
        let Some(bytes) = image else { continue };
        let path = dir.join(format!("image-{}.png", index + 1));
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
