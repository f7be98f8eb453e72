use serde::{Deserialize, Serialize};

use crate::theme::Theme;

const APP_NAME: &str = "balance_tui";
const CONFIG_NAME: &str = "config";

/// Persisted client settings. The theme key is written back on every
/// toggle so it survives restarts; everything else is user-edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub poll_interval_secs: u64,
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".to_string(),
            poll_interval_secs: 1,
            theme: Theme::Light,
        }
    }
}

pub fn load() -> Result<Config, confy::ConfyError> {
    confy::load(APP_NAME, CONFIG_NAME)
}

pub fn store(config: &Config) -> Result<(), confy::ConfyError> {
    confy::store(APP_NAME, CONFIG_NAME, config)
}

pub fn path() -> Result<std::path::PathBuf, confy::ConfyError> {
    confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
}
