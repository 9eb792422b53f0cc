//! `recall.toml` plus environment overrides.

use anyhow::{Context, Result};
use recall_gen::GeneratorConfig;
use recall_json::{paths, DEFAULT_MAX_BACKUPS};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_USER_ID: &str = "default";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub generator: GeneratorSection,
    pub remote: RemoteSection,
    pub json: JsonSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RemoteSection {
    pub database_url: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JsonSection {
    pub max_backups: Option<usize>,
}

impl Config {
    /// Reads `path` if given (it must exist), else the default config file if
    /// there is one.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::read(p),
            None => {
                let p = paths::default_config_file();
                if p.exists() {
                    Self::read(&p)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn generator(&self) -> GeneratorConfig {
        self.generator_with(env_var)
    }

    pub fn generator_with(&self, env: impl Fn(&str) -> Option<String>) -> GeneratorConfig {
        let defaults = GeneratorConfig::default();
        GeneratorConfig {
            api_key: env("OPENAI_API_KEY"),
            model: self.generator.model.clone().unwrap_or(defaults.model),
            temperature: self.generator.temperature.unwrap_or(defaults.temperature),
            base_url: self.generator.base_url.clone().unwrap_or(defaults.base_url),
        }
    }

    pub fn remote(&self) -> (Option<String>, String) {
        self.remote_with(env_var)
    }

    /// Database URL and user id for the remote store; the environment wins.
    pub fn remote_with(&self, env: impl Fn(&str) -> Option<String>) -> (Option<String>, String) {
        let url = env("RECALL_DATABASE_URL").or_else(|| self.remote.database_url.clone());
        let user = env("RECALL_USER_ID")
            .or_else(|| self.remote.user_id.clone())
            .unwrap_or_else(|| DEFAULT_USER_ID.to_string());
        (url, user)
    }

    pub fn max_backups(&self) -> usize {
        self.json.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::from_toml("").unwrap();
        let gen = cfg.generator_with(no_env);
        assert_eq!(gen.model, "gpt-3.5-turbo");
        assert_eq!(gen.temperature, 0.7);
        assert!(gen.api_key.is_none());
        assert_eq!(cfg.remote_with(no_env), (None, DEFAULT_USER_ID.to_string()));
        assert_eq!(cfg.max_backups(), DEFAULT_MAX_BACKUPS);
    }

    #[test]
    fn sections_are_read() {
        let cfg = Config::from_toml(
            r#"
            [generator]
            model = "gpt-4o-mini"
            temperature = 0.2
            base_url = "http://localhost:11434/v1"

            [remote]
            database_url = "postgres://localhost/recall"
            user_id = "alice"

            [json]
            max_backups = 3
            "#,
        )
        .unwrap();
        let gen = cfg.generator_with(no_env);
        assert_eq!(gen.model, "gpt-4o-mini");
        assert_eq!(gen.base_url, "http://localhost:11434/v1");
        assert_eq!(
            cfg.remote_with(no_env),
            (Some("postgres://localhost/recall".to_string()), "alice".to_string())
        );
        assert_eq!(cfg.max_backups(), 3);
    }

    #[test]
    fn environment_overrides_file() {
        let cfg = Config::from_toml("[remote]\nuser_id = \"alice\"").unwrap();
        let env = |k: &str| match k {
            "OPENAI_API_KEY" => Some("sk-env".to_string()),
            "RECALL_USER_ID" => Some("bob".to_string()),
            "RECALL_DATABASE_URL" => Some("postgres://env/db".to_string()),
            _ => None,
        };
        assert_eq!(cfg.generator_with(env).api_key.as_deref(), Some("sk-env"));
        assert_eq!(cfg.remote_with(env), (Some("postgres://env/db".to_string()), "bob".to_string()));
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());

        let path = dir.path().join("recall.toml");
        std::fs::write(&path, "[json]\nmax_backups = 1\n").unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap().max_backups(), 1);
    }

    #[test]
    fn unknown_value_types_are_errors() {
        assert!(Config::from_toml("[json]\nmax_backups = \"many\"").is_err());
    }
}
