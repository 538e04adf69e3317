//! CLI argument definitions and parsing structures

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use augur_utils::types::Topic;

/// augur - illustrated three-part tarot readings
#[derive(Parser, Debug)]
#[command(name = "augur")]
#[command(about = "Generate a three-part reading with an LLM and illustrate each part")]
#[command(long_about = r#"
augur asks a text model for a three-part reading (past, present, future),
splits it into segments, derives an image prompt for each segment and
generates the three illustrations concurrently.

EXAMPLES:
  # Run the HTTP service
  augur serve --port 8080

  # One reading from the command line, images written to ./reading
  augur predict --name Anna --birth-date 15.03.1990 --topic career \
      --question "Should I change jobs?" --out-dir reading

  # See how a text would be segmented (no network)
  echo "First\n\nSecond\n\nThird" | augur split

  # Show the effective configuration and where each value came from
  augur config

CONFIGURATION:
  Precedence: CLI flags > environment > config file > defaults
  Config file: --config <path>, else $AUGUR_CONFIG, else ./augur.toml
  Credentials: OPENROUTER_API_KEY, KANDINSKY_API_KEY, KANDINSKY_SECRET, KANDINSKY_URL
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Text model to request (e.g. anthropic/claude-3-haiku)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Port to listen on (overrides PORT and the config file)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Produce one reading and print it
    ///
    /// EXAMPLES:
    ///   augur predict --name Anna --birth-date 15.03.1990 --topic love \
    ///       --partner-name Boris --partner-birth-date 02.11.1988 --question "Is he the one?"
    Predict {
        #[arg(long)]
        name: String,

        /// Date of birth, DD.MM.YYYY
        #[arg(long)]
        birth_date: String,

        #[arg(long)]
        question: String,

        /// love, health, career or decision
        #[arg(long, value_parser = parse_topic)]
        topic: Topic,

        #[arg(long, requires = "partner_birth_date")]
        partner_name: Option<String>,

        /// Partner's date of birth, DD.MM.YYYY
        #[arg(long, requires = "partner_name")]
        partner_birth_date: Option<String>,

        /// Write image-1.png .. image-3.png into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Print the response as JSON (images base64-encoded)
        #[arg(long)]
        json: bool,
    },

    /// Split text from a file or stdin into three segments
    Split {
        /// Read from this file instead of stdin
        file: Option<PathBuf>,

        /// Print the segments as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration with value sources
    Config {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn parse_topic(value: &str) -> Result<Topic, String> {
    value.parse::<Topic>().map_err(|e| e.to_string())
}

/// Build the CLI command structure without parsing arguments
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
