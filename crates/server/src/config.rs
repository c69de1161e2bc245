// Server configuration.
//
// Layered lowest to highest: built-in defaults, `~/.codelab/config.toml`,
// environment variables, command line flags.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 4000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_WORKSPACE_DIR: &str = "workspace";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot resolve listen host `{host}`: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },
}

/// Path to the user config file: `~/.codelab/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".codelab").join("config.toml"))
}

/// Optional on-disk settings. Every key may be omitted.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub workspace_dir: Option<PathBuf>,
    pub log_filter: Option<String>,
    pub cors_origins: Option<String>,
}

impl FileConfig {
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Load `explicit`, else `~/.codelab/config.toml`. A missing file yields
    /// the empty config; a broken one is an error the caller may log and
    /// ignore.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match global_config_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };
        if explicit.is_none() && !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub workspace_dir: Option<PathBuf>,
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen host: an IP literal or a hostname resolved at bind time.
    pub host: String,
    pub port: u16,
    /// Initial workspace root; created at startup when missing.
    pub workspace_dir: PathBuf,
    /// Log filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Comma-separated CORS origins (or `"*"`/unset for any).
    pub cors_origins: Option<String>,
}

impl ServerConfig {
    /// Layer environment variables over `file`.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `CODELAB_HOST` | `0.0.0.0` |
    /// | `PORT` | `4000` |
    /// | `CODELAB_WORKSPACE_DIR` | `./workspace` |
    /// | `CODELAB_LOG_FILTER` | `info` |
    /// | `CODELAB_CORS_ORIGINS` | *(any origin)* |
    pub fn from_env(file: FileConfig) -> Self {
        Self::from_env_fn(file, |key| std::env::var(key))
    }

    /// Testable constructor that accepts an environment lookup function.
    fn from_env_fn<F>(file: FileConfig, env: F) -> Self
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let host = env("CODELAB_HOST")
            .ok()
            .or(file.host)
            .unwrap_or_else(|| DEFAULT_HOST.into());
        let port = env("PORT")
            .ok()
            .and_then(|value| value.trim().parse().ok())
            .or(file.port)
            .unwrap_or(DEFAULT_PORT);
        let workspace_dir = env("CODELAB_WORKSPACE_DIR")
            .ok()
            .map(PathBuf::from)
            .or(file.workspace_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACE_DIR));
        let log_filter = env("CODELAB_LOG_FILTER")
            .ok()
            .or(file.log_filter)
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.into());
        let cors_origins = env("CODELAB_CORS_ORIGINS").ok().or(file.cors_origins);

        Self {
            host,
            port,
            workspace_dir,
            log_filter,
            cors_origins,
        }
    }

    pub fn with_overrides(mut self, overrides: CliOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(workspace_dir) = overrides.workspace_dir {
            self.workspace_dir = workspace_dir;
        }
        self
    }
}

impl ServerConfig {
    /// Every socket address `host:port` resolves to. A host that does not
    /// resolve is an error; there is no fallback to another interface.
    pub async fn listen_addrs(&self) -> Result<Vec<SocketAddr>, ConfigError> {
        let resolve_error = |source| ConfigError::Resolve { host: self.host.clone(), source };
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        let addrs: Vec<SocketAddr> =
            tokio::net::lookup_host((host, self.port)).await.map_err(resolve_error)?.collect();
        if addrs.is_empty() {
            return Err(resolve_error(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no addresses returned",
            )));
        }
        Ok(addrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from_map(
        map: HashMap<&'static str, &'static str>,
    ) -> impl Fn(&str) -> Result<String, std::env::VarError> {
        move |key: &str| map.get(key).map(|v| v.to_string()).ok_or(std::env::VarError::NotPresent)
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = ServerConfig::from_env_fn(FileConfig::default(), env_from_map(HashMap::new()));
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.workspace_dir, PathBuf::from("workspace"));
        assert_eq!(cfg.log_filter, "info");
        assert!(cfg.cors_origins.is_none());
    }

    #[test]
    fn port_from_env() {
        let mut m = HashMap::new();
        m.insert("PORT", "9090");
        let cfg = ServerConfig::from_env_fn(FileConfig::default(), env_from_map(m));
        assert_eq!(cfg.port, 9090);
    }

    #[test]
    fn invalid_port_uses_default() {
        let mut m = HashMap::new();
        m.insert("PORT", "not_a_number");
        let cfg = ServerConfig::from_env_fn(FileConfig::default(), env_from_map(m));
        assert_eq!(cfg.port, 4000);
    }

    #[test]
    fn env_overrides_file_values() {
        let file = FileConfig {
            port: Some(5000),
            workspace_dir: Some(PathBuf::from("/srv/from-file")),
            log_filter: Some("debug".into()),
            ..FileConfig::default()
        };
        let mut m = HashMap::new();
        m.insert("CODELAB_WORKSPACE_DIR", "/srv/from-env");
        let cfg = ServerConfig::from_env_fn(file, env_from_map(m));
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.workspace_dir, PathBuf::from("/srv/from-env"));
        assert_eq!(cfg.log_filter, "debug");
    }

    #[test]
    fn cli_overrides_win() {
        let mut m = HashMap::new();
        m.insert("CODELAB_HOST", "127.0.0.1");
        m.insert("PORT", "3000");
        let cfg = ServerConfig::from_env_fn(FileConfig::default(), env_from_map(m)).with_overrides(
            CliOverrides {
                host: None,
                port: Some(4100),
                workspace_dir: Some(PathBuf::from("/tmp/cli")),
            },
        );
        assert_eq!((cfg.host.as_str(), cfg.port), ("127.0.0.1", 4100));
        assert_eq!(cfg.workspace_dir, PathBuf::from("/tmp/cli"));
    }

    #[test]
    fn file_config_parses_toml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "port = 4500\nworkspace_dir = \"/srv/code\"\n").unwrap();

        let file = FileConfig::load_from(&path).expect("config should parse");
        assert_eq!(file.port, Some(4500));
        assert_eq!(file.workspace_dir, Some(PathBuf::from("/srv/code")));
        assert!(file.host.is_none());
    }

    #[test]
    fn file_config_rejects_unknown_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "prot = 4500\n").unwrap();

        assert!(matches!(FileConfig::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(matches!(FileConfig::discover(Some(&missing)), Err(ConfigError::Io { .. })));
    }

    #[tokio::test]
    async fn hostname_resolves_to_loopback_only() {
        let mut m = HashMap::new();
        m.insert("CODELAB_HOST", "localhost");
        let cfg = ServerConfig::from_env_fn(FileConfig::default(), env_from_map(m));
        assert_eq!(cfg.host, "localhost");

        let addrs = cfg.listen_addrs().await.expect("localhost should resolve");
        assert!(!addrs.is_empty());
        assert!(addrs.iter().all(|addr| addr.ip().is_loopback()), "{addrs:?}");
        assert!(addrs.iter().all(|addr| addr.port() == 4000));
    }

    #[tokio::test]
    async fn ip_literals_resolve_verbatim() {
        let cfg = ServerConfig::from_env_fn(FileConfig::default(), env_from_map(HashMap::new()))
            .with_overrides(CliOverrides { host: Some("[::1]".into()), port: Some(4100), ..Default::default() });
        let addrs = cfg.listen_addrs().await.expect("literal should resolve");
        assert_eq!(addrs, vec!["[::1]:4100".parse::<SocketAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn unresolvable_host_is_an_error() {
        let cfg = ServerConfig::from_env_fn(FileConfig::default(), env_from_map(HashMap::new()))
            .with_overrides(CliOverrides { host: Some("bad host name".into()), ..Default::default() });
        assert!(matches!(cfg.listen_addrs().await, Err(ConfigError::Resolve { .. })));
    }
}
