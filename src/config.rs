//! Configuration module for the raw-http client.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

use crate::connection::{Target, DEFAULT_PORT};
use crate::display::{LineFormat, Overflow};

/// Address of the local proxy used when `--proxy` is given.
pub const PROXY_HOST: &str = "127.0.0.1";
pub const PROXY_PORT: u16 = 9999;

/// Command-line arguments for the client
#[derive(Parser, Debug)]
#[command(name = "raw-http")]
#[command(author = "raw-http authors")]
#[command(version = "0.1.0")]
#[command(about = "Send an HTTP/1.x request over a raw socket and print the response", long_about = None)]
pub struct CliArgs {
    /// Host to connect to
    pub host: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to connect to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Connect through the local proxy instead of the host itself
    #[arg(long)]
    pub proxy: bool,

    /// Proxy address override (e.g., 127.0.0.1:9999)
    #[arg(long)]
    pub proxy_addr: Option<String>,

    /// Resource path for the generated GET request
    #[arg(long)]
    pub path: Option<String>,

    /// File holding the full request text to send instead of a GET
    #[arg(short, long)]
    pub request: Option<PathBuf>,

    /// Keep CRLF line endings in the response body
    #[arg(long)]
    pub keep_crlf: bool,

    /// Treat the response body as JSON
    #[arg(long)]
    pub json: bool,

    /// Maximum JSON nesting depth to print
    #[arg(long)]
    pub depth: Option<usize>,

    /// Maximum number of JSON children to print per level
    #[arg(long)]
    pub children: Option<usize>,

    /// Maximum number of body lines to print
    #[arg(short = 'n', long)]
    pub lines: Option<usize>,

    /// Maximum line width when printing the body
    #[arg(short, long)]
    pub width: Option<usize>,

    /// Wrap long lines instead of truncating them
    #[arg(long)]
    pub wrap: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Request target configuration
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    /// Host to connect to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to connect to
    #[serde(default = "default_port")]
    pub port: u16,
    /// Route the connection through the local proxy
    #[serde(default)]
    pub via_proxy: bool,
    /// Resource path for the generated GET request
    #[serde(default = "default_path")]
    pub path: String,
    /// Translate CRLF to LF in response bodies
    #[serde(default = "default_true")]
    pub normalize_eol: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            via_proxy: false,
            path: default_path(),
            normalize_eol: true,
        }
    }
}

/// Fixed local proxy endpoint.
///
/// The proxy path connects here regardless of the requested target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_proxy_host")]
    pub host: String,
    #[serde(default = "default_proxy_port")]
    pub port: u16,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: default_proxy_host(),
            port: default_proxy_port(),
        }
    }
}

impl ProxyConfig {
    /// Parse a `host:port` override.
    pub fn parse(addr: &str) -> Result<Self, ConfigError> {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::InvalidProxy(addr.to_string()))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidProxy(addr.to_string()))?;
        if host.is_empty() {
            return Err(ConfigError::InvalidProxy(addr.to_string()));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

/// Output formatting configuration
#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    /// Maximum line width (unlimited when absent)
    pub width: Option<usize>,
    /// Maximum number of body lines (unlimited when absent)
    pub lines: Option<usize>,
    /// Wrap long lines instead of truncating them
    #[serde(default)]
    pub wrap: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: Some(default_width()),
            lines: None,
            wrap: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "httpbin.org".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_path() -> String {
    "/get".to_string()
}

fn default_true() -> bool {
    true
}

fn default_proxy_host() -> String {
    PROXY_HOST.to_string()
}

fn default_proxy_port() -> u16 {
    PROXY_PORT
}

fn default_width() -> usize {
    80
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub target: Target,
    pub via_proxy: bool,
    pub proxy: ProxyConfig,
    pub path: String,
    pub request_file: Option<PathBuf>,
    pub normalize_eol: bool,
    pub json: bool,
    pub depth: Option<usize>,
    pub children: Option<usize>,
    pub lines: Option<usize>,
    pub format: LineFormat,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(CliArgs::parse())
    }

    /// Merge parsed CLI args with the TOML file they point at, if any.
    pub fn from_args(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        let proxy = match cli.proxy_addr {
            Some(ref addr) => ProxyConfig::parse(addr)?,
            None => toml_config.proxy,
        };

        let wrap = cli.wrap || toml_config.display.wrap;
        let format = LineFormat {
            width: cli.width.or(toml_config.display.width),
            mode: if wrap {
                Overflow::Wrap
            } else {
                Overflow::Truncate
            },
            ..LineFormat::default()
        };

        Ok(Config {
            target: Target {
                host: cli.host.unwrap_or(toml_config.client.host),
                port: cli.port.unwrap_or(toml_config.client.port),
            },
            via_proxy: cli.proxy || toml_config.client.via_proxy,
            proxy,
            path: cli.path.unwrap_or(toml_config.client.path),
            request_file: cli.request,
            normalize_eol: !cli.keep_crlf && toml_config.client.normalize_eol,
            json: cli.json,
            depth: cli.depth,
            children: cli.children,
            lines: cli.lines.or(toml_config.display.lines),
            format,
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        })
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    InvalidProxy(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidProxy(addr) => {
                write!(f, "Invalid proxy address '{}', expected host:port", addr)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
