//! Configuration system

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct SampleConfig {
        scene_path: String,
        pretty_json: bool,
    }

    impl Config for SampleConfig {}

    #[test]
    fn test_unsupported_format() {
        let config = SampleConfig::default();
        assert!(matches!(
            config.save_to_file("settings.yaml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            SampleConfig::load_from_file("settings.yaml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = std::env::temp_dir().join("scene_runtime_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sample.toml");
        let path = path.to_str().unwrap();

        let config = SampleConfig {
            scene_path: "scenes/level1.scn".to_string(),
            pretty_json: true,
        };
        config.save_to_file(path).unwrap();
        let loaded = SampleConfig::load_from_file(path).unwrap();
        assert_eq!(loaded, config);
    }
}
