//! Configuration types and loading
//!
//! Config precedence: env vars > config file > defaults. The config file
//! itself comes from `--config`, then `CONFIG_PATH`, then
//! `center-admin.toml` in the working directory. Only the default file may
//! be missing.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "center-admin.toml";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// REST backend connection settings
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Where the admin credential is persisted
#[derive(Debug, Default, Deserialize)]
pub struct SessionConfig {
    /// Session file; `~/` is expanded against `HOME`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8001".into()
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                common::Error::MissingConfig(path.to_path_buf())
            } else {
                common::Error::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.finish()
    }

    /// Load `center-admin.toml` if present, otherwise start from defaults.
    pub fn load_default() -> common::Result<Self> {
        match Self::load(Path::new(DEFAULT_CONFIG_FILE)) {
            Err(common::Error::MissingConfig(_)) => Config::default().finish(),
            other => other,
        }
    }

    fn finish(mut self) -> common::Result<Self> {
        if let Ok(url) = std::env::var("CENTER_BACKEND_URL") {
            self.backend.base_url = url;
        }
        if let Ok(path) = std::env::var("CENTER_SESSION_PATH") {
            self.session.path = Some(PathBuf::from(path));
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> common::Result<()> {
        // Validate base_url is a valid URL with http(s) scheme
        if !self.backend.base_url.starts_with("http://")
            && !self.backend.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.backend.base_url
            )));
        }

        if self.backend.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self
            .session
            .path
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(common::Error::Config("session.path must not be empty".into()));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    /// Session file location: configured path, else
    /// `$XDG_CONFIG_HOME/center-admin/session.json`, else
    /// `$HOME/.config/center-admin/session.json`.
    pub fn session_path(&self) -> common::Result<PathBuf> {
        if let Some(path) = &self.session.path {
            return expand_home(path);
        }
        let base = match std::env::var_os("XDG_CONFIG_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => home_dir()?.join(".config"),
        };
        Ok(base.join("center-admin").join("session.json"))
    }

    /// Explicit config path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(p.to_path_buf());
        }
        std::env::var_os("CONFIG_PATH").map(PathBuf::from)
    }
}

fn home_dir() -> common::Result<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| {
            common::Error::Config("HOME is not set; configure session.path explicitly".into())
        })
}

fn expand_home(path: &Path) -> common::Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => Ok(home_dir()?.join(rest)),
        Err(_) => Ok(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that touch process environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn clear_overrides() {
        unsafe {
            remove_env("CENTER_BACKEND_URL");
            remove_env("CENTER_SESSION_PATH");
        }
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("center-admin.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn load_valid_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[backend]
base_url = "https://center.example"
timeout_secs = 5

[session]
path = "/var/lib/center/session.json"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.backend.base_url, "https://center.example");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(
            config.session_path().unwrap(),
            PathBuf::from("/var/lib/center/session.json")
        );
    }

    #[test]
    fn empty_file_uses_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "");

        let config = Config::load(&path).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8001");
        assert_eq!(config.backend.timeout_secs, 30);
        assert!(config.session.path.is_none());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = Config::load(Path::new("/nonexistent/path/center-admin.toml"));
        assert!(matches!(result, Err(common::Error::MissingConfig(_))));
    }

    #[test]
    fn invalid_toml_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");
        assert!(matches!(Config::load(&path), Err(common::Error::Toml(_))));
    }

    #[test]
    fn base_url_without_scheme_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[backend]\nbase_url = \"center.example\"\n");

        let err = Config::load(&path).unwrap_err().to_string();
        assert!(
            err.contains("base_url must start with http"),
            "error message should explain the issue, got: {err}"
        );
    }

    #[test]
    fn zero_timeout_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[backend]\ntimeout_secs = 0\n");
        assert!(Config::load(&path).is_err(), "timeout_secs = 0 must be rejected");
    }

    #[test]
    fn env_overrides_file_values() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[backend]\nbase_url = \"http://file.example\"\n");

        unsafe {
            set_env("CENTER_BACKEND_URL", "http://env.example");
            set_env("CENTER_SESSION_PATH", "/tmp/env-session.json");
        }
        let config = Config::load(&path).unwrap();
        clear_overrides();

        assert_eq!(config.backend.base_url, "http://env.example");
        assert_eq!(
            config.session_path().unwrap(),
            PathBuf::from("/tmp/env-session.json")
        );
    }

    #[test]
    fn env_override_is_validated_too() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "");

        unsafe { set_env("CENTER_BACKEND_URL", "ftp://nope") };
        let result = Config::load(&path);
        clear_overrides();

        assert!(result.is_err());
    }

    #[test]
    fn session_path_expands_home() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let original_home = std::env::var_os("HOME");
        unsafe { set_env("HOME", "/home/admin") };
        let config = Config {
            session: SessionConfig {
                path: Some(PathBuf::from("~/center/session.json")),
            },
            ..Config::default()
        };
        let path = config.session_path();
        match original_home {
            Some(home) => unsafe { std::env::set_var("HOME", home) },
            None => unsafe { remove_env("HOME") },
        }
        assert_eq!(path.unwrap(), PathBuf::from("/home/admin/center/session.json"));
    }

    #[test]
    fn default_session_path_under_xdg_config_home() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("XDG_CONFIG_HOME", "/xdg") };
        let path = Config::default().session_path().unwrap();
        unsafe { remove_env("XDG_CONFIG_HOME") };
        assert_eq!(path, PathBuf::from("/xdg/center-admin/session.json"));
    }

    #[test]
    fn resolve_path_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/should-lose.toml") };
        let path = Config::resolve_path(Some(Path::new("/cli/wins.toml")));
        assert_eq!(
            path,
            Some(PathBuf::from("/cli/wins.toml")),
            "CLI arg must take precedence over CONFIG_PATH env var"
        );

        let path = Config::resolve_path(None);
        assert_eq!(path, Some(PathBuf::from("/env/should-lose.toml")));
        unsafe { remove_env("CONFIG_PATH") };

        assert_eq!(Config::resolve_path(None), None);
    }
}
