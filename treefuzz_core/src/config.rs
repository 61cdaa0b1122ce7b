use serde::Deserialize;
use std::path::Path;

/// Engine parameters as read from a TOML file.
///
/// ```toml
/// probability = 0.2
/// child-probability = 0.5
/// seed = 42
/// max-empty-rounds = 5
/// ```
///
/// Probabilities are validated when the engine is built from the configuration,
/// not while parsing.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct FuzzerConfig {
    /// Probability of mutating any single field.
    pub probability: f64,
    /// Probability available to mutators for their own choices; defaults to `probability`.
    #[serde(default)]
    pub child_probability: Option<f64>,
    #[serde(default = "default_id_probability")]
    pub id_probability: f64,
    /// Seed for reproducible sessions; drawn from entropy if absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_max_empty_rounds")]
    pub max_empty_rounds: usize,
    #[serde(default = "default_default_fuzzers")]
    pub default_fuzzers: bool,
}

pub fn default_probability() -> f64 {
    0.1
}

pub fn default_id_probability() -> f64 {
    0.3
}

pub fn default_max_empty_rounds() -> usize {
    10
}

fn default_default_fuzzers() -> bool {
    true
}

impl FuzzerConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file at {:?}: {}", path, e))?;

        let config: FuzzerConfig = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from config file {:?}: {}", path, e)
        })?;

        Ok(config)
    }

    /// The child probability in effect.
    pub fn effective_child_probability(&self) -> f64 {
        self.child_probability.unwrap_or(self.probability)
    }
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        Self {
            probability: default_probability(),
            child_probability: None,
            id_probability: default_id_probability(),
            seed: None,
            max_empty_rounds: default_max_empty_rounds(),
            default_fuzzers: default_default_fuzzers(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write config");
        file
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let file = write_config("probability = 0.25\n");
        let config = FuzzerConfig::load_from_file(file.path()).expect("Config should load");

        assert_eq!(config.probability, 0.25);
        assert_eq!(config.effective_child_probability(), 0.25);
        assert_eq!(config.id_probability, 0.3);
        assert_eq!(config.seed, None);
        assert_eq!(config.max_empty_rounds, 10);
        assert!(config.default_fuzzers);
    }

    #[test]
    fn full_config_is_parsed() {
        let file = write_config(
            r#"
probability = 0.2
child-probability = 0.5
id-probability = 1.0
seed = 42
max-empty-rounds = 3
default-fuzzers = false
"#,
        );
        let config = FuzzerConfig::load_from_file(file.path()).unwrap();

        assert_eq!(
            config,
            FuzzerConfig {
                probability: 0.2,
                child_probability: Some(0.5),
                id_probability: 1.0,
                seed: Some(42),
                max_empty_rounds: 3,
                default_fuzzers: false,
            }
        );
        assert_eq!(config.effective_child_probability(), 0.5);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config("probability = 0.2\nthreads = 4\n");
        let error = FuzzerConfig::load_from_file(file.path()).unwrap_err();
        assert!(
            error.to_string().contains("Failed to parse TOML"),
            "Unexpected error: {error}"
        );
    }

    #[test]
    fn missing_probability_is_rejected() {
        let file = write_config("seed = 1\n");
        assert!(FuzzerConfig::load_from_file(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let error = FuzzerConfig::load_from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(error.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn default_config_matches_serde_defaults() {
        let config = FuzzerConfig::default();
        assert_eq!(config.probability, default_probability());
        assert_eq!(config.max_empty_rounds, default_max_empty_rounds());
        assert!(config.child_probability.is_none());
    }
}
