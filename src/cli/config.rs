// FILE: src/cli/config.rs

use crate::error::{CompatError, Result};
use crate::types::TargetBrowser;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Path of the compat snapshot
    pub data: Option<String>,
    pub browsers: Option<Vec<TargetBrowser>>,
    pub css_values: Option<bool>,
    pub flag_unknown_browsers: Option<bool>,
}

pub fn load(config_path: &str) -> Result<ConfigFile> {
    let config_content = fs::read_to_string(config_path).map_err(|e| {
        CompatError::FileNotFound {
            path: format!("Config file {}: {}", config_path, e),
        }
    })?;

    let config = if config_path.ends_with(".json") {
        serde_json::from_str(&config_content)
            .map_err(|e| CompatError::format(format!("Invalid JSON config: {}", e)))?
    } else if config_path.ends_with(".toml") {
        toml::from_str(&config_content)
            .map_err(|e| CompatError::format(format!("Invalid TOML config: {}", e)))?
    } else {
        return Err(CompatError::format("Config file must be .json or .toml format"));
    };

    log::info!("Loaded configuration from {}", config_path);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_load_json_config() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "webcompat.json",
            r#"{
                "data": "data.json",
                "browsers": [{ "id": "firefox", "version": 69 }, { "id": "safari", "version": "13" }],
                "css_values": true
            }"#,
        );

        let config = load(&path).unwrap();
        assert_eq!(config.data.as_deref(), Some("data.json"));
        assert_eq!(config.css_values, Some(true));
        assert_eq!(config.flag_unknown_browsers, None);

        let browsers = config.browsers.unwrap();
        assert_eq!(browsers[0], TargetBrowser::new("firefox", "69"));
        assert_eq!(browsers[1], TargetBrowser::new("safari", "13"));
    }

    #[test]
    fn test_load_toml_config() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "webcompat.toml",
            r#"
data = "data.json"
flag_unknown_browsers = false

[[browsers]]
id = "chrome"
version = "77"
"#,
        );

        let config = load(&path).unwrap();
        assert_eq!(config.flag_unknown_browsers, Some(false));
        assert_eq!(config.browsers.unwrap(), vec![TargetBrowser::new("chrome", "77")]);
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "webcompat.yaml", "data: x");
        assert!(matches!(load(&path), Err(CompatError::InvalidFormat { .. })));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(
            load(&path.to_string_lossy()),
            Err(CompatError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_malformed_json_config() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "webcompat.json", "{ \"css_values\": ");
        assert!(matches!(load(&path), Err(CompatError::InvalidFormat { .. })));
    }
}
