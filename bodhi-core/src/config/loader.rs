//! Configuration loading and management

use super::schema::Config;
use super::validate::validate_config;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "BODHI_GUIDE__";

/// Environment variables that map onto a config path
const ENV_ALIASES: [(&str, &str); 3] = [
    ("GEMINI_API_KEY", "provider.api_key"),
    ("PORT", "server.port"),
    ("HOST", "server.host"),
];

/// Configuration loader
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a new config loader with the default config directory
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .map(|h| h.join(".bodhi-guide"))
            .unwrap_or_else(|| PathBuf::from(".bodhi-guide"));

        Self { config_dir }
    }

    /// Create a new config loader with a custom config directory
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Load configuration from file and environment
    pub fn load(&self) -> crate::Result<Config> {
        let config_path = self.config_path();
        let mut merged = serde_json::to_value(Config::default())?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let file_value: Value = serde_json::from_str(&content)?;
            merge_values(&mut merged, file_value);
        }

        apply_alias_overrides(&mut merged);
        apply_path_overrides(&mut merged);

        let config: Config = serde_json::from_value(merged)
            .map_err(|e| crate::Error::Config(format!("invalid configuration: {}", e)))?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &Config) -> crate::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(self.config_path(), content)?;
        Ok(())
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(existing) = base_map.get_mut(&key) {
                    merge_values(existing, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn parse_env_value(raw: &str) -> Value {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        return v;
    }
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(raw.to_string())
}

fn set_path_value(root: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return;
    };

    let mut current = root;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Some(map) = current.as_object_mut() else {
            return;
        };
        current = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Some(map) = current.as_object_mut() {
        map.insert(last.clone(), value);
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('.').map(ToString::to_string).collect()
}

fn get_path_value<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(root, |current, segment| current.get(segment))
}

/// Parse an env value against the field it replaces.
///
/// String and optional fields keep the raw text even when it looks like a
/// number or bool, so `12345` stays a valid API key.
fn env_value_for(config: &Value, path: &[String], raw: &str) -> Value {
    match get_path_value(config, path) {
        Some(Value::String(_)) | Some(Value::Null) => Value::String(raw.to_string()),
        _ => parse_env_value(raw),
    }
}

fn apply_alias_overrides(config: &mut Value) {
    for (env_key, target_path) in ENV_ALIASES {
        if let Ok(raw) = std::env::var(env_key) {
            let path = split_path(target_path);
            let value = env_value_for(config, &path, &raw);
            set_path_value(config, &path, value);
        }
    }
}

fn apply_path_overrides(config: &mut Value) {
    for (key, value) in std::env::vars() {
        let Some(suffix) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let segments: Vec<String> = suffix
            .split("__")
            .filter(|s| !s.is_empty())
            .map(|s| s.to_ascii_lowercase())
            .collect();
        if segments.is_empty() {
            continue;
        }
        let value = env_value_for(config, &segments, &value);
        set_path_value(config, &segments, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::{Mutex, MutexGuard};
    use tempfile::TempDir;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    struct EnvVarGuard {
        key: String,
        original: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &str, value: &str) -> Self {
            let original = std::env::var(key).ok();
            std::env::set_var(key, value);
            Self {
                key: key.to_string(),
                original,
            }
        }

        fn unset(key: &str) -> Self {
            let original = std::env::var(key).ok();
            std::env::remove_var(key);
            Self {
                key: key.to_string(),
                original,
            }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.original {
                std::env::set_var(&self.key, value);
            } else {
                std::env::remove_var(&self.key);
            }
        }
    }

    fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn clean_env() -> Vec<EnvVarGuard> {
        ENV_ALIASES
            .iter()
            .map(|(key, _)| EnvVarGuard::unset(key))
            .collect()
    }

    #[test]
    fn test_load_default_config() {
        let _lock = lock_env();
        let _clean = clean_env();
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader.load().unwrap();

        assert_eq!(config.provider.model, "gemini-1.5-flash");
        assert_eq!(config.provider.max_output_tokens, 1024);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_save_and_load_config() {
        let _lock = lock_env();
        let _clean = clean_env();
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());

        let mut config = Config::default();
        config.provider.model = "gemini-1.5-pro".to_string();

        loader.save(&config).unwrap();
        let loaded = loader.load().unwrap();

        assert_eq!(loaded.provider.model, "gemini-1.5-pro");
    }

    #[test]
    fn test_load_applies_alias_env_overrides() {
        let _lock = lock_env();
        let _clean = clean_env();
        let _key_guard = EnvVarGuard::set("GEMINI_API_KEY", "12345678");
        let _port_guard = EnvVarGuard::set("PORT", "8080");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader.load().unwrap();

        assert_eq!(config.provider.api_key, "12345678");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_applies_path_env_overrides() {
        let _lock = lock_env();
        let _clean = clean_env();
        let _model_guard = EnvVarGuard::set("BODHI_GUIDE__PROVIDER__MODEL", "gemini-2.0-flash");
        let _temp_guard = EnvVarGuard::set("BODHI_GUIDE__PROVIDER__TEMPERATURE", "0.2");
        let _top_k_guard = EnvVarGuard::set("BODHI_GUIDE__PROVIDER__TOP_K", "12");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader.load().unwrap();

        assert_eq!(config.provider.model, "gemini-2.0-flash");
        assert!((config.provider.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.provider.top_k, 12);
    }

    #[test]
    fn test_path_env_overrides_alias_and_file() {
        let _lock = lock_env();
        let _clean = clean_env();
        let _alias_guard = EnvVarGuard::set("GEMINI_API_KEY", "key-alias");
        let _path_guard = EnvVarGuard::set("BODHI_GUIDE__PROVIDER__API_KEY", "key-path-override");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());

        std::fs::write(
            temp_dir.path().join("config.json"),
            r#"{"provider":{"api_key":"key-file"}}"#,
        )
        .unwrap();

        let config = loader.load().unwrap();
        assert_eq!(config.provider.api_key, "key-path-override");
    }

    #[test]
    fn test_path_env_keeps_string_fields_as_text() {
        let _lock = lock_env();
        let _clean = clean_env();
        let _key_guard = EnvVarGuard::set("BODHI_GUIDE__PROVIDER__API_KEY", "12345");
        let _persona_guard = EnvVarGuard::set("BODHI_GUIDE__PERSONA__INSTRUCTION", "true");
        let _base_guard = EnvVarGuard::set("BODHI_GUIDE__PROVIDER__API_BASE", "http://127.0.0.1:9");
        let _port_guard = EnvVarGuard::set("BODHI_GUIDE__SERVER__PORT", "8081");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader.load().unwrap();

        assert_eq!(config.provider.api_key, "12345");
        assert_eq!(config.persona.instruction, "true");
        assert_eq!(config.provider.api_base.as_deref(), Some("http://127.0.0.1:9"));
        assert_eq!(config.server.port, 8081);
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let _lock = lock_env();
        let _clean = clean_env();
        let _port_guard = EnvVarGuard::set("PORT", "not-a-port");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let err = loader.load().unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_validation_rejects_invalid_temperature() {
        let _lock = lock_env();
        let _clean = clean_env();
        let _temp_guard = EnvVarGuard::set("BODHI_GUIDE__PROVIDER__TEMPERATURE", "2.5");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let err = loader.load().unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }
}
