//! Cluster option parsing (`cluster.toml` or the `options` block of a snapshot).

use serde::{Deserialize, Serialize};
use std::path::Path;

use thiserror::Error;

/// Errors raised while loading or validating cluster options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid options file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render options: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid value '{value}' for {option}")]
    InvalidValue { option: &'static str, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Cluster-wide scheduler options.
///
/// Every field has the same default the scheduler would apply if the
/// option were absent from the cluster configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClusterOptions {
    /// `default`, `utilization`, `minimal` or `balanced`.
    pub placement_strategy: String,
    /// `none`, `migrate-on-red`, `only-green`, `progressive` or `custom`.
    pub node_health_strategy: String,
    /// Base health score, only used by the `progressive` strategy.
    pub node_health_base: String,
    pub node_health_green: String,
    pub node_health_yellow: String,
    pub node_health_red: String,
    /// Whether resources are probed on nodes where their state is unknown.
    pub enable_startup_probes: bool,
    /// Fencing action used when a node must be fenced (`reboot` or `off`).
    pub stonith_action: String,
    /// When true, resources may run anywhere unless constrained away.
    pub symmetric_cluster: bool,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            placement_strategy: "default".to_string(),
            node_health_strategy: "none".to_string(),
            node_health_base: "0".to_string(),
            node_health_green: "0".to_string(),
            node_health_yellow: "0".to_string(),
            node_health_red: "-INFINITY".to_string(),
            enable_startup_probes: true,
            stonith_action: "reboot".to_string(),
            symmetric_cluster: true,
        }
    }
}

impl ClusterOptions {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let options: ClusterOptions = toml::from_str(content)?;
        options.check_stonith_action()?;
        Ok(options)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Normalized fencing action; `poweroff` is accepted as an alias of `off`.
    pub fn fence_action(&self) -> &str {
        if self.stonith_action.eq_ignore_ascii_case("poweroff") {
            "off"
        } else {
            &self.stonith_action
        }
    }

    fn check_stonith_action(&self) -> ConfigResult<()> {
        match self.stonith_action.to_ascii_lowercase().as_str() {
            "reboot" | "off" | "poweroff" => Ok(()),
            _ => Err(ConfigError::InvalidValue {
                option: "stonith-action",
                value: self.stonith_action.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClusterOptions::default();
        assert_eq!(options.placement_strategy, "default");
        assert_eq!(options.node_health_strategy, "none");
        assert_eq!(options.node_health_red, "-INFINITY");
        assert!(options.enable_startup_probes);
        assert!(options.symmetric_cluster);
    }

    #[test]
    fn test_parse_minimal() {
        let options = ClusterOptions::from_toml_str("").unwrap();
        assert_eq!(options, ClusterOptions::default());
    }

    #[test]
    fn test_parse_kebab_case_keys() {
        let toml_str = r#"
placement-strategy = "balanced"
node-health-strategy = "progressive"
node-health-base = "-50"
enable-startup-probes = false
"#;
        let options = ClusterOptions::from_toml_str(toml_str).unwrap();
        assert_eq!(options.placement_strategy, "balanced");
        assert_eq!(options.node_health_strategy, "progressive");
        assert_eq!(options.node_health_base, "-50");
        assert!(!options.enable_startup_probes);
        assert_eq!(options.stonith_action, "reboot");
    }

    #[test]
    fn test_rejects_unknown_stonith_action() {
        let err = ClusterOptions::from_toml_str("stonith-action = \"explode\"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { option: "stonith-action", .. }));
    }

    #[test]
    fn test_poweroff_alias() {
        let options = ClusterOptions {
            stonith_action: "poweroff".to_string(),
            ..ClusterOptions::default()
        };
        assert_eq!(options.fence_action(), "off");
    }

    #[test]
    fn test_from_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cluster.toml");
        let options = ClusterOptions {
            node_health_strategy: "migrate-on-red".to_string(),
            ..ClusterOptions::default()
        };
        std::fs::write(&path, options.to_toml_string().unwrap()).unwrap();

        let loaded = ClusterOptions::from_file(&path).unwrap();
        assert_eq!(loaded, options);
    }

    #[test]
    fn test_missing_file() {
        let err = ClusterOptions::from_file(Path::new("/nonexistent/cluster.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
