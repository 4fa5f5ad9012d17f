//! Environment-driven bridge configuration.

use crate::extension::DEFAULT_MODULE_NAME;
use crate::logging::default_log_level;
use std::path::PathBuf;

/// Environment variable overriding the published module name.
pub const ENV_MODULE_NAME: &str = "NATIVE_BRIDGE_MODULE_NAME";
/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "NATIVE_BRIDGE_LOG_LEVEL";
/// Environment variable selecting a log directory (stderr when unset).
pub const ENV_LOG_DIR: &str = "NATIVE_BRIDGE_LOG_DIR";

/// Load-time settings for the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub module_name: String,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            module_name: DEFAULT_MODULE_NAME.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl BridgeConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; blank values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();
        Self {
            module_name: read(ENV_MODULE_NAME).unwrap_or(defaults.module_name),
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
        }
    }

    /// `log_dir` as the string form accepted by `init_logging`.
    pub fn log_dir_str(&self) -> Option<String> {
        self.log_dir
            .as_ref()
            .map(|dir| dir.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{BridgeConfig, ENV_LOG_DIR, ENV_LOG_LEVEL, ENV_MODULE_NAME};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = BridgeConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.module_name, "custom_extension");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_and_trims_overrides() {
        let config = BridgeConfig::from_lookup(lookup_from(&[
            (ENV_MODULE_NAME, " fastmath "),
            (ENV_LOG_LEVEL, "warn"),
            (ENV_LOG_DIR, "/var/log/bridge"),
        ]));
        assert_eq!(config.module_name, "fastmath");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/bridge")));
        assert_eq!(config.log_dir_str().as_deref(), Some("/var/log/bridge"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = BridgeConfig::from_lookup(lookup_from(&[
            (ENV_MODULE_NAME, "   "),
            (ENV_LOG_DIR, ""),
        ]));
        assert_eq!(config.module_name, "custom_extension");
        assert!(config.log_dir.is_none());
    }
}
