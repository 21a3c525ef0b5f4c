#![forbid(unsafe_code)]

use std::path::PathBuf;

pub(crate) const DEFAULT_HOST: &str = "127.0.0.1";
pub(crate) const DEFAULT_PORT: u16 = 5000;

pub(crate) const STORAGE_DIR_ENV: &str = "BUBBLES_STORAGE_DIR";
pub(crate) const HOST_ENV: &str = "BUBBLES_HOST";
pub(crate) const PORT_ENV: &str = "BUBBLES_PORT";
pub(crate) const SECRET_KEY_ENV: &str = "SECRET_KEY";

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ConfigError {
    MissingSecretKey,
    MissingValue(&'static str),
    InvalidPort(String),
    UnknownArgument(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSecretKey => {
                write!(f, "{SECRET_KEY_ENV} must be set to a non-empty value")
            }
            Self::MissingValue(flag) => write!(f, "{flag} expects a value"),
            Self::InvalidPort(raw) => write!(f, "invalid port: {raw:?}"),
            Self::UnknownArgument(arg) => write!(f, "unknown argument: {arg} (see --help)"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub(crate) struct ServerConfig {
    pub(crate) storage_dir: PathBuf,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) secret_key: String,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("storage_dir", &self.storage_dir)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl ServerConfig {
    pub(crate) fn from_process() -> Result<Self, ConfigError> {
        let args = std::env::args().skip(1).collect::<Vec<_>>();
        Self::parse(&args, |key| std::env::var(key).ok())
    }

    /// Flags win over environment variables; blank values count as unset.
    pub(crate) fn parse(
        args: &[String],
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut storage_dir: Option<String> = None;
        let mut host: Option<String> = None;
        let mut port: Option<String> = None;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let (slot, flag) = match arg.as_str() {
                "--storage-dir" => (&mut storage_dir, "--storage-dir"),
                "--host" => (&mut host, "--host"),
                "--port" => (&mut port, "--port"),
                other => return Err(ConfigError::UnknownArgument(other.to_string())),
            };
            let value = iter.next().ok_or(ConfigError::MissingValue(flag))?;
            *slot = Some(value.clone());
        }

        let non_blank = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let storage_dir = non_blank(storage_dir.or_else(|| env(STORAGE_DIR_ENV)))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let host = non_blank(host.or_else(|| env(HOST_ENV)))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match non_blank(port.or_else(|| env(PORT_ENV))) {
            None => DEFAULT_PORT,
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
        };
        let secret_key = non_blank(env(SECRET_KEY_ENV)).ok_or(ConfigError::MissingSecretKey)?;

        Ok(Self {
            storage_dir,
            host,
            port,
            secret_key,
        })
    }

    pub(crate) fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
