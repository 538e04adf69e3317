use std::path::PathBuf;

/// Values the command line may override. `None` leaves lower layers in effect.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub text_model: Option<String>,
    pub verbose: Option<bool>,
    pub log_json: Option<bool>,
}
