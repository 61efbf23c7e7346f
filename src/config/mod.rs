mod settings;

pub use settings::{DeviceSettings, LoggingConfig, PolicySettings, Settings};
