//! Provides application configuration options.
//!
//! Configuration options can be parsed from config files in TOML format.

pub mod log;
pub mod pipeline;

use std::{collections::HashMap, env};

use config::{
    Config, ConfigError, Environment, File, FileFormat, Source, Value,
};
use serde::{Deserialize, Serialize};

#[doc(inline)]
pub use self::{log::Log, pipeline::Pipeline};

/// CLI argument that is responsible for holding application configuration
/// file path.
pub(crate) static APP_CONF_PATH_CMD_ARG_NAME: &str = "--conf";

/// Environment variable that is responsible for holding application
/// configuration file path.
pub(crate) static APP_CONF_PATH_ENV_VAR_NAME: &str = "MEDEA_PROGRESSIVE_CONF";

/// Prefix of the environment variables overriding configuration options.
static APP_CONF_ENV_PREFIX: &str = "MEDEA_PROGRESSIVE";

/// Holds application config.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Conf {
    /// Logging settings.
    pub log: Log,

    /// Settings of the stdin processing pipeline.
    pub pipeline: Pipeline,
}

impl Source for Conf {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<HashMap<String, Value>, ConfigError> {
        let serialized = toml::to_string(self)
            .map_err(|e| ConfigError::Foreign(Box::new(e)))?;
        File::from_str(serialized.as_str(), FileFormat::Toml).collect()
    }
}

impl Conf {
    /// Creates new [`Conf`] and applies values from such sources
    /// and in that order:
    /// - default values;
    /// - configuration file, the name of which is given as a command line
    ///   parameter or environment variable;
    /// - environment variables.
    pub fn parse() -> Result<Self, ConfigError> {
        let mut cfg = Config::new();

        let _ = cfg.merge(Self::default())?;

        if let Some(path) =
            get_conf_file_name(env::var(APP_CONF_PATH_ENV_VAR_NAME), env::args())
        {
            let _ = cfg.merge(File::with_name(&path))?;
        }

        let _ = cfg.merge(
            Environment::with_prefix(APP_CONF_ENV_PREFIX).separator("__"),
        )?;

        cfg.try_into()
    }
}

/// Returns the path to the configuration file, if it's set via CLI `args`
/// or environment variable.
fn get_conf_file_name<T>(
    env_var: Result<String, env::VarError>,
    mut cmd_args: T,
) -> Option<String>
where
    T: Iterator<Item = String>,
{
    if let Ok(path) = env_var {
        return Some(path);
    }
    let _ = cmd_args.by_ref().find(|arg| arg == APP_CONF_PATH_CMD_ARG_NAME)?;
    cmd_args.next()
}
