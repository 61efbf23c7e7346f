use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub devices: DeviceSettings,
    #[serde(default)]
    pub policy: PolicySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSettings {
    /// Registry implementation ("memory")
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Groups known to the registry at startup
    #[serde(default = "default_groups")]
    pub groups: Vec<String>,
    /// Device tags known to the registry at startup
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicySettings {
    /// Policy backend implementation ("memory")
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Site VPN peer addresses, one selectable `siteN` interface each
    #[serde(default)]
    pub site_vpns: Vec<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_groups() -> Vec<String> {
    vec!["wan".to_string(), "dns".to_string(), "lan".to_string()]
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("devices.backend", "memory")?
            .set_default("devices.groups", default_groups())?
            .set_default("policy.backend", "memory")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // LOGGING__LEVEL, DEVICES__GROUPS=wan,lan, POLICY__SITE_VPNS=10.0.0.1, etc.
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("devices.groups")
                    .with_list_parse_key("devices.tags")
                    .with_list_parse_key("policy.site_vpns"),
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            groups: default_groups(),
            tags: vec![],
        }
    }
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            site_vpns: vec![],
        }
    }
}
