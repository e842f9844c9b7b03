//! Configuration file

use std::fs;
use std::path::Path;

use anyhow::Context;
use rowmap_pipeline::TransformOptions;
use serde::Deserialize;

/// Contents of the YAML file passed with `--config`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Defaults for `transform`; command-line flags override them
    pub options: TransformOptions,
    /// Log filter used when neither `RUST_LOG` nor `-v` is given
    pub log_level: Option<String>,
}

impl Config {
    /// Read the config at `path`, or the defaults when there is none
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config '{}'", path.display()))
    }

    pub fn parse(yaml: &str) -> anyhow::Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let config = Config::parse("log_level: debug\noptions:\n  max_errors: 5\n").unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.options.max_errors, Some(5));
        assert!(!config.options.skip_errors);
    }

    #[test]
    fn test_empty_and_unknown_keys() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
        assert!(Config::parse("verbosity: 3").is_err());
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = Config::load(Some(Path::new("/nonexistent/rowmap.yaml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rowmap.yaml"));
    }
}
