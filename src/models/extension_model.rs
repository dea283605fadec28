use serde::{Deserialize, Serialize};

/// Contents of `plugin.json`, also posted to the core on registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtensionConfig {
    pub name: String,
    pub id: String,
    pub version: String,
    pub description: String,
    pub mode: String,
    pub author: String,
    pub cmd: Vec<String>,
    pub enabled: bool,
    pub last_updated: String,
    pub git_path: String,
    pub category: String,
    pub post_url: String,
    pub webpage: String,
    #[serde(default = "default_file_formats")]
    pub file_formats: Vec<String>,
    pub ask_form: bool,
    pub connection: Connection,
    #[serde(default)]
    pub configuration: ReaderConfiguration,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Connection {
    pub ip: String,
    pub port: u16,
    pub target: String,
    pub target_port: u16,
}

/// Reader behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfiguration {
    /// Hide synthetic variables ("#time", "#radius", "#last", ...) from the
    /// exposed header list.
    #[serde(default = "default_true")]
    pub skip_unnamed: bool,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

impl Default for ReaderConfiguration {
    fn default() -> Self {
        Self {
            skip_unnamed: true,
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

fn default_file_formats() -> Vec<String> {
    vec!["res".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_heartbeat_secs() -> u64 {
    15
}
