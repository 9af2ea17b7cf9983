//! Server configuration.
//!
//! Configuration comes from the command line — `pircd <port> <password>` —
//! and is immutable after construction. The local hostname is resolved once
//! at startup and used as the server prefix in every reply.

use std::io;

use thiserror::Error;

/// Configuration errors. All of these are startup-fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("usage: pircd <port> <password>")]
    Usage,

    #[error("invalid port number: {0}")]
    InvalidPort(String),

    #[error("password must not be empty")]
    EmptyPassword,

    #[error("failed to resolve local hostname: {0}")]
    Hostname(#[source] io::Error),
}

/// Immutable server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the server listens on.
    pub port: u16,
    /// Shared password every client must supply via PASS.
    pub password: String,
    /// Local hostname, used as the source prefix of server replies.
    pub host: String,
}

impl Config {
    /// Build a configuration from explicit values. Used by tests and
    /// embedders; the binary goes through [`Config::from_args`].
    pub fn new(port: u16, password: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            port,
            password: password.into(),
            host: host.into(),
        }
    }

    /// Parse and validate the command-line arguments (program name
    /// already stripped), resolving the local hostname.
    pub fn from_args<I>(mut args: I) -> Result<Self, ConfigError>
    where
        I: Iterator<Item = String>,
    {
        let (port, password) = match (args.next(), args.next(), args.next()) {
            (Some(port), Some(password), None) => (port, password),
            _ => return Err(ConfigError::Usage),
        };

        let port: u16 = port
            .parse()
            .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        if port == 0 {
            return Err(ConfigError::InvalidPort("0".to_owned()));
        }

        if password.is_empty() {
            return Err(ConfigError::EmptyPassword);
        }

        let host = resolve_hostname().map_err(ConfigError::Hostname)?;

        Ok(Self {
            port,
            password,
            host,
        })
    }
}

/// Resolve the local hostname via `gethostname(2)`.
fn resolve_hostname() -> io::Result<String> {
    let mut buf = [0u8; 256];
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr().cast::<libc::c_char>(), buf.len()) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8(buf[..len].to_vec())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "hostname is not valid UTF-8"))
}
