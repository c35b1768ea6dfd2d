use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Externally loaded configuration, passed into the pipeline as an explicit
/// immutable value at job start. Values resolve from an optional JSON
/// settings file, then environment variables override field by field.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Base URL of the blob store account.
    pub account_endpoint: Option<String>,
    /// Fallback source container when the request omits one.
    pub container_source: Option<String>,
    /// Fallback destination container when the request omits one.
    pub container_target: Option<String>,
    /// Shared credential used when a job opts out of delegated identity.
    pub shared_credential: Option<String>,
    /// Root under which per-job workspaces are created.
    pub workspace_root: Option<PathBuf>,
    /// Upper bound on workspace removal attempts.
    pub cleanup_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            account_endpoint: None,
            container_source: None,
            container_target: None,
            shared_credential: None,
            workspace_root: None,
            cleanup_attempts: Self::DEFAULT_CLEANUP_ATTEMPTS,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("could not read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Settings {
    pub const DEFAULT_CLEANUP_ATTEMPTS: u32 = 10;

    /// Load settings from an optional JSON file, then apply environment
    /// overrides (`DECANT_*`).
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| {
                    SettingsError::Read {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Settings::default(),
        };
        settings.apply_env(|var| std::env::var(var).ok());
        Ok(settings)
    }

    /// Override fields from an environment lookup. The lookup is injectable
    /// so the override logic is testable without touching process state.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn set(slot: &mut Option<String>, value: Option<String>) {
            if let Some(value) = value
                && !value.is_empty()
            {
                *slot = Some(value);
            }
        }
        set(&mut self.account_endpoint, lookup("DECANT_ACCOUNT_ENDPOINT"));
        set(&mut self.container_source, lookup("DECANT_CONTAINER_SOURCE"));
        set(&mut self.container_target, lookup("DECANT_CONTAINER_TARGET"));
        set(
            &mut self.shared_credential,
            lookup("DECANT_SHARED_CREDENTIAL"),
        );
        if let Some(root) = lookup("DECANT_WORKSPACE_ROOT")
            && !root.is_empty()
        {
            self.workspace_root = Some(PathBuf::from(root));
        }
        if let Some(attempts) = lookup("DECANT_CLEANUP_ATTEMPTS")
            && let Ok(attempts) = attempts.parse()
        {
            self.cleanup_attempts = attempts;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert!(settings.account_endpoint.is_none());
        assert_eq!(
            settings.cleanup_attempts,
            Settings::DEFAULT_CLEANUP_ATTEMPTS
        );
    }

    #[test]
    fn parses_settings_file_and_ignores_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"accountEndpoint":"https://acct.example.net","containerSource":"incoming"}"#,
        )
        .unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(
            settings.account_endpoint.as_deref(),
            Some("https://acct.example.net")
        );
        assert_eq!(settings.container_source.as_deref(), Some("incoming"));
        assert!(settings.container_target.is_none());
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut settings = Settings {
            container_source: Some("from-file".into()),
            ..Settings::default()
        };
        settings.apply_env(|var| match var {
            "DECANT_CONTAINER_SOURCE" => Some("from-env".into()),
            "DECANT_CLEANUP_ATTEMPTS" => Some("3".into()),
            _ => None,
        });
        assert_eq!(settings.container_source.as_deref(), Some("from-env"));
        assert_eq!(settings.cleanup_attempts, 3);
    }

    #[test]
    fn empty_environment_values_do_not_override() {
        let mut settings = Settings {
            container_source: Some("from-file".into()),
            ..Settings::default()
        };
        settings.apply_env(|var| match var {
            "DECANT_CONTAINER_SOURCE" => Some(String::new()),
            _ => None,
        });
        assert_eq!(settings.container_source.as_deref(), Some("from-file"));
    }

    #[test]
    fn missing_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Settings::load(Some(&dir.path().join("absent.json")));
        assert!(matches!(result, Err(SettingsError::Read { .. })));
    }

    #[test]
    fn malformed_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Settings::load(Some(&path)),
            Err(SettingsError::Parse { .. })
        ));
    }
}
