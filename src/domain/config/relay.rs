use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::policy::{AdmissionPolicy, DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_ALLOWED_TYPES};

pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 2000 * 1024 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Process-wide settings, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub port: u16,
    pub bind_address: IpAddr,
    pub upload_dir: PathBuf,
    /// In-flight uploads are written here and renamed into `upload_dir`
    /// once complete, so it must live on the same filesystem.
    pub staging_dir: PathBuf,
    pub public_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub policy: AdmissionPolicy,
    /// `None` disables request deadlines entirely.
    pub request_timeout: Option<Duration>,
}

impl RelayConfig {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        let upload_dir = upload_dir.into();
        Self {
            port: DEFAULT_PORT,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            staging_dir: default_staging_dir(&upload_dir),
            upload_dir,
            public_dir: PathBuf::from("public"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            policy: AdmissionPolicy::default(),
            request_timeout: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Self::new(get("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()));

        if let Some(dir) = get("STAGING_DIR") {
            config.staging_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("PUBLIC_DIR") {
            config.public_dir = PathBuf::from(dir);
        }
        if let Some(port) = get("PORT") {
            config.port = parse(&port, "PORT", "a valid u16")?;
        }
        if let Some(address) = get("BIND_ADDRESS") {
            config.bind_address = parse(&address, "BIND_ADDRESS", "an IP address")?;
        }
        if let Some(max) = get("MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = parse(&max, "MAX_UPLOAD_BYTES", "a positive integer")?;
            if config.max_upload_bytes == 0 {
                return Err(ConfigError::Invalid {
                    name: "MAX_UPLOAD_BYTES",
                    expected: "a positive integer",
                    value: max,
                });
            }
        }
        if let Some(secs) = get("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse(&secs, "REQUEST_TIMEOUT_SECS", "a number of seconds")?;
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        let allowed_types = get("ALLOWED_TYPES").map(|v| split_list(&v));
        let allowed_extensions = get("ALLOWED_EXTENSIONS").map(|v| split_list(&v));
        if allowed_types.is_some() || allowed_extensions.is_some() {
            config.policy = AdmissionPolicy::new(
                allowed_types.unwrap_or_else(|| to_owned_list(DEFAULT_ALLOWED_TYPES)),
                allowed_extensions.unwrap_or_else(|| to_owned_list(DEFAULT_ALLOWED_EXTENSIONS)),
            );
        }

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(
    value: &str,
    name: &'static str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        expected,
        value: value.to_string(),
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn default_staging_dir(upload_dir: &std::path::Path) -> PathBuf {
    let mut name = upload_dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "uploads".into());
    name.push(".partial");
    upload_dir.with_file_name(name)
}
