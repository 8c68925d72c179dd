use std::path::PathBuf;

use config::ConfigError;
use serde::Deserialize;

use crate::{core::model::DEFAULT_MSG_THROTTLE, utils};

const CONFIG: &str = include_str!("../../.config/config.json5");

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub _data_dir: PathBuf,
    #[serde(default)]
    pub _config_dir: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WidgetConfig {
    #[serde(default = "default_msg_throttle")]
    pub msg_throttle: usize,
}

fn default_msg_throttle() -> usize {
    DEFAULT_MSG_THROTTLE
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            msg_throttle: DEFAULT_MSG_THROTTLE,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default, flatten)]
    pub config: AppConfig,
    #[serde(default)]
    pub widgets: WidgetConfig,
}

impl Config {
    /// Embedded defaults, overridden by an optional user config file and then
    /// by `NBWIDGET_*` environment variables (`NBWIDGET_WIDGETS__MSG_THROTTLE`).
    pub fn new() -> Result<Self, ConfigError> {
        let default_config = Self::embedded()?;
        let data_dir = utils::get_data_dir();
        let config_dir = utils::get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("_data_dir", data_dir.to_string_lossy().to_string())?
            .set_default("_config_dir", config_dir.to_string_lossy().to_string())?
            .set_default(
                "widgets.msg_throttle",
                default_config.widgets.msg_throttle as i64,
            )?;

        let config_files = [
            ("config.json5", config::FileFormat::Json5),
            ("config.json", config::FileFormat::Json),
            ("config.yaml", config::FileFormat::Yaml),
            ("config.toml", config::FileFormat::Toml),
            ("config.ini", config::FileFormat::Ini),
        ];
        let mut found_config = false;
        for (file, format) in &config_files {
            builder = builder.add_source(
                config::File::from(config_dir.join(file))
                    .format(*format)
                    .required(false),
            );
            if config_dir.join(file).exists() {
                found_config = true
            }
        }
        if !found_config {
            tracing::info!("No configuration file found, using defaults");
        }
        builder = builder.add_source(
            config::Environment::with_prefix(utils::paths::PROJECT_NAME.as_str())
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// The defaults shipped with the binary.
    pub fn embedded() -> Result<Self, ConfigError> {
        json5::from_str(CONFIG)
            .map_err(|e| ConfigError::Message(format!("Failed to load default config: {e}")))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.widgets.msg_throttle == 0 {
            return Err(ConfigError::Message(String::from(
                "widgets.msg_throttle must be at least 1",
            )));
        }
        Ok(())
    }
}
