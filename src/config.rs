use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use clap::Parser;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// Cache lifetime used when `cacheTTL` is absent or zero.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

#[derive(Parser, Debug, Clone, Default)]
#[command(
    version,
    about = "Aggregating RSS proxy: merges remote feeds into one cached feed",
    override_usage = "feed-relay -f <config file>\n       cat <config file> | feed-relay"
)]
pub struct Cli {
    /// YAML configuration file, reloaded whenever it is written
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,
}

/// One remote feed origin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedSource {
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    pub filters: Vec<String>,
    /// Milliseconds to wait between launching two fetches of this source.
    #[serde(rename = "rateLimit")]
    pub rate_limit: u64,
}

impl FeedSource {
    /// Full addresses to fetch, in declared filter order.
    pub fn urls(&self) -> impl Iterator<Item = String> + '_ {
        self.filters
            .iter()
            .map(move |filter| format!("{}{}", self.base_url, filter))
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "endPoint")]
    pub end_point: String,
    pub feeds: Vec<FeedSource>,
    #[serde(rename = "cacheTTL")]
    pub cache_ttl: u64,
}

impl Config {
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Ok(serde_yaml::from_slice(data)?)
    }

    pub fn cache_ttl(&self) -> Duration {
        match self.cache_ttl {
            0 => Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Address to bind. A bare `:port` listens on every interface.
    pub fn listen_addr(&self) -> Result<String> {
        let end_point = self.end_point.trim();
        if end_point.is_empty() {
            return Err(AppError::ConfigError("endPoint is not set".to_string()));
        }
        if end_point.starts_with(':') {
            return Ok(format!("0.0.0.0{}", end_point));
        }
        Ok(end_point.to_string())
    }
}

/// Where the configuration document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Stdin,
    File(PathBuf),
}

impl ConfigOrigin {
    /// Piped standard input wins over `-f`. `None` means there is nothing to
    /// load and the caller should print usage.
    pub fn from_cli(cli: &Cli) -> Option<Self> {
        Self::select(stdin_is_piped(), cli.file.clone())
    }

    pub fn select(stdin_piped: bool, file: Option<PathBuf>) -> Option<Self> {
        if stdin_piped {
            return Some(ConfigOrigin::Stdin);
        }
        file.map(ConfigOrigin::File)
    }

    pub fn load(&self) -> Result<Config> {
        match self {
            ConfigOrigin::Stdin => read_config(io::stdin().lock()),
            ConfigOrigin::File(path) => {
                let file = File::open(path).map_err(|e| {
                    AppError::ConfigError(format!("cannot open {}: {}", path.display(), e))
                })?;
                read_config(file)
            }
        }
    }

    /// Only file-backed configuration can be watched for changes.
    pub fn watch_path(&self) -> Option<&Path> {
        match self {
            ConfigOrigin::Stdin => None,
            ConfigOrigin::File(path) => Some(path),
        }
    }
}

/// Reads until end of stream into a growable buffer, then parses.
fn read_config<R: Read>(mut reader: R) -> Result<Config> {
    let mut buf = Vec::with_capacity(4 * 1024);
    reader.read_to_end(&mut buf)?;
    Config::from_slice(&buf)
}

#[cfg(unix)]
fn stdin_is_piped() -> bool {
    use std::os::fd::AsFd;
    use std::os::unix::fs::FileTypeExt;

    io::stdin()
        .as_fd()
        .try_clone_to_owned()
        .map(File::from)
        .and_then(|stdin| stdin.metadata())
        .map(|meta| meta.file_type().is_fifo())
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn stdin_is_piped() -> bool {
    use std::io::IsTerminal;

    !io::stdin().is_terminal()
}

/// Holds the active configuration. Readers take a whole snapshot; reloads
/// swap the reference, never individual fields.
pub struct ConfigStore {
    current: ArcSwap<Config>,
}

impl ConfigStore {
    pub fn new(config: Config) -> Self {
        Self {
            current: ArcSwap::from_pointee(config),
        }
    }

    pub fn snapshot(&self) -> Arc<Config> {
        self.current.load_full()
    }

    pub fn replace(&self, config: Config) {
        self.current.store(Arc::new(config));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
endPoint: "127.0.0.1:8080"
cacheTTL: 10
feeds:
  - baseUrl: "http://x/"
    filters: ["a", "b"]
    rateLimit: 250
  - baseUrl: "http://y/?q="
    filters: []
"#;

    #[test]
    fn parses_documented_keys() {
        let config = Config::from_slice(SAMPLE.as_bytes()).unwrap();

        assert_eq!(config.end_point, "127.0.0.1:8080");
        assert_eq!(config.cache_ttl(), Duration::from_secs(10));
        assert_eq!(config.feeds.len(), 2);
        assert_eq!(config.feeds[0].base_url, "http://x/");
        assert_eq!(config.feeds[0].filters, vec!["a", "b"]);
        assert_eq!(config.feeds[0].rate_limit(), Duration::from_millis(250));
        assert_eq!(config.feeds[1].rate_limit, 0, "missing rateLimit defaults to 0");
        assert!(config.feeds[1].filters.is_empty());
    }

    #[test]
    fn absent_or_zero_ttl_means_an_hour() {
        let absent = Config::from_slice(b"endPoint: ':9000'\n").unwrap();
        let zero = Config::from_slice(b"endPoint: ':9000'\ncacheTTL: 0\n").unwrap();
        let explicit = Config::from_slice(b"endPoint: ':9000'\ncacheTTL: 3600\n").unwrap();

        assert_eq!(absent.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(zero.cache_ttl(), explicit.cache_ttl());
    }

    #[test]
    fn urls_concatenate_base_and_filter_in_order() {
        let source = FeedSource {
            base_url: "https://nyaa.example/?page=rss&q=".to_string(),
            filters: vec!["one".to_string(), "two".to_string()],
            rate_limit: 0,
        };

        let urls: Vec<String> = source.urls().collect();
        assert_eq!(
            urls,
            vec![
                "https://nyaa.example/?page=rss&q=one",
                "https://nyaa.example/?page=rss&q=two"
            ]
        );
    }

    #[test]
    fn listen_addr_accepts_bare_port() {
        let mut config = Config {
            end_point: ":8080".to_string(),
            ..Default::default()
        };
        assert_eq!(config.listen_addr().unwrap(), "0.0.0.0:8080");

        config.end_point = "localhost:1234".to_string();
        assert_eq!(config.listen_addr().unwrap(), "localhost:1234");

        config.end_point = String::new();
        assert!(matches!(config.listen_addr(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn malformed_document_is_a_config_error() {
        let err = Config::from_slice(b"feeds: [unterminated").unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn file_origin_loads_and_is_watchable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let origin = ConfigOrigin::File(file.path().to_path_buf());
        let config = origin.load().unwrap();

        assert_eq!(config.feeds.len(), 2);
        assert_eq!(origin.watch_path(), Some(file.path()));
        assert_eq!(ConfigOrigin::Stdin.watch_path(), None);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let origin = ConfigOrigin::File(PathBuf::from("/nonexistent/feed-relay.yaml"));
        assert!(matches!(origin.load(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn piped_stdin_wins_over_file_flag() {
        let origin = ConfigOrigin::select(true, Some(PathBuf::from("c.yaml")));
        assert_eq!(origin, Some(ConfigOrigin::Stdin));

        assert_eq!(ConfigOrigin::select(true, None), Some(ConfigOrigin::Stdin));
    }

    #[test]
    fn file_flag_used_without_pipe() {
        let origin = ConfigOrigin::select(false, Some(PathBuf::from("c.yaml")));
        assert_eq!(origin, Some(ConfigOrigin::File(PathBuf::from("c.yaml"))));
    }

    #[test]
    fn nothing_to_load_without_pipe_or_flag() {
        assert_eq!(ConfigOrigin::select(false, None), None);
    }

    #[test]
    fn cli_parses_file_flag() {
        let cli = Cli::try_parse_from(["feed-relay", "-f", "c.yaml"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("c.yaml")));

        let cli = Cli::try_parse_from(["feed-relay", "--file", "other.yaml"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("other.yaml")));

        let cli = Cli::try_parse_from(["feed-relay"]).unwrap();
        assert_eq!(cli.file, None);
    }

    #[test]
    fn cli_rejects_flag_without_path() {
        assert!(Cli::try_parse_from(["feed-relay", "-f"]).is_err());
    }

    #[test]
    fn stream_is_read_to_end_before_parsing() {
        // Small chunks force several reads of the same document
        let reader = io::BufReader::with_capacity(8, SAMPLE.as_bytes());
        let config = read_config(reader).unwrap();

        assert_eq!(config.end_point, "127.0.0.1:8080");
        assert_eq!(config.feeds.len(), 2);
        assert_eq!(config.feeds[0].filters, vec!["a", "b"]);
    }

    #[test]
    fn store_swaps_whole_config() {
        let store = ConfigStore::new(Config::from_slice(SAMPLE.as_bytes()).unwrap());
        let before = store.snapshot();

        store.replace(Config {
            end_point: ":1".to_string(),
            ..Default::default()
        });

        assert_eq!(before.feeds.len(), 2, "old snapshot stays intact");
        let after = store.snapshot();
        assert_eq!(after.end_point, ":1");
        assert!(after.feeds.is_empty());
    }
}
