//! CLI entry point and dispatch logic
//!
//! `run()` parses arguments, discovers configuration, installs the tracing
//! subscriber, dispatches the command and prints every error itself. main.rs
//! only maps the returned code to the process exit status.

use anyhow::Result;
use clap::Parser;

use augur_utils::error::{ConfigError, PredictionError, ProfileError};
use augur_utils::logging::init_tracing;
use augur_utils::redaction::redact_secrets;
use augur_utils::types::Profile;

use super::args::{Cli, Commands};
use super::commands;
use super::report::display_for_user;
use crate::{CliArgs, Config, ExitCode};

/// Main CLI execution function.
///
/// Returns `Err(ExitCode)` after printing a report when the command fails.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        port: match &cli.command {
            Commands::Serve { port } => *port,
            _ => None,
        },
        text_model: cli.model.clone(),
        verbose: cli.verbose.then_some(true),
        log_json: cli.log_json.then_some(true),
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", display_for_user(&err));
            return Err(ExitCode::from(&err));
        }
    };

    if let Err(err) = init_tracing(config.logging.verbose, config.logging.json) {
        eprintln!("⚠ Logging could not be initialised: {err}");
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let result = rt.block_on(dispatch(cli.command, &config));

    match result {
        Ok(()) => Ok(()),
        Err(error) => Err(report(&error)),
    }
}

async fn dispatch(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Serve { .. } => commands::execute_serve(config).await,
        Commands::Predict {
            name,
            birth_date,
            question,
            topic,
            partner_name,
            partner_birth_date,
            out_dir,
            json,
        } => {
            let mut profile = Profile::new(name, birth_date, question, topic);
            if let (Some(partner), Some(partner_birth)) = (partner_name, partner_birth_date) {
                profile = profile.with_partner(partner, partner_birth);
            }
            commands::execute_predict(config, profile, out_dir.as_deref(), json).await
        }
        Commands::Split { file, json } => commands::execute_split(file.as_deref(), json),
        Commands::Config { json } => commands::execute_config(config, json),
    }
}

/// Print the error and pick the exit code
fn report(error: &anyhow::Error) -> ExitCode {
    if let Some(err) = error.downcast_ref::<ConfigError>() {
        eprintln!("{}", display_for_user(err));
        return ExitCode::from(err);
    }
    if let Some(err) = error.downcast_ref::<ProfileError>() {
        eprintln!("{}", display_for_user(err));
        return ExitCode::from(err);
    }
    if let Some(err) = error.downcast_ref::<PredictionError>() {
        eprintln!("{}", display_for_user(err));
        return ExitCode::from(err);
    }

    eprintln!("✗ Unexpected error: {}", redact_secrets(&format!("{error:#}")));
    eprintln!("\n  General troubleshooting:");
    eprintln!("    - Run with --verbose for more detailed output");
    eprintln!("    - Run `augur config` to check credentials and endpoints");
    ExitCode::INTERNAL
}

#[cfg(test)]
mod tests {
    use super::*;
    use augur_utils::error::GenError;

    #[test]
    fn test_report_maps_exit_codes() {
        let config = anyhow::Error::new(ConfigError::MissingRequired("text.api_key".to_string()));
        assert_eq!(report(&config), ExitCode::CLI_ARGS);

        let profile = anyhow::Error::new(ProfileError::MissingField("name"));
        assert_eq!(report(&profile), ExitCode::CLI_ARGS);

        let prediction = anyhow::Error::new(PredictionError::Text(GenError::EmptyResponse));
        assert_eq!(report(&prediction), ExitCode::PREDICTION_FAILED);

        assert_eq!(report(&anyhow::anyhow!("disk full")), ExitCode::INTERNAL);
    }
}
