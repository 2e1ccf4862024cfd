//! Engine session configuration

use crate::error::{CgtError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default engine executable, resolved through `PATH`
pub const DEFAULT_ENGINE: &str = "cgt-py-adapter";

/// Upper bound for one response line (64MB)
pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024 * 1024;

/// Wire protocol spoken by the engine on the other end.
///
/// The engine does not negotiate, so the caller states which one it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProtocolVersion {
    /// Explicit Domineering dimensions, Snort by `size` with uncolored vertices
    V1,
    /// Domineering dimensions implied by the grid, Snort with per-vertex colors
    #[default]
    V2,
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::V1 => write!(f, "v1"),
            ProtocolVersion::V2 => write!(f, "v2"),
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = CgtError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "v1" => Ok(ProtocolVersion::V1),
            "2" | "v2" => Ok(ProtocolVersion::V2),
            other => Err(CgtError::Config(format!(
                "unknown protocol version '{}'",
                other
            ))),
        }
    }
}

/// Configuration for one engine session
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Engine executable
    pub program: PathBuf,
    /// Extra arguments passed to the engine
    pub args: Vec<String>,
    /// Wire protocol version
    pub protocol: ProtocolVersion,
    /// Read timeout per response; `None` waits forever
    pub read_timeout: Option<Duration>,
    /// How long `close` waits for the engine to exit before killing it
    pub shutdown_grace: Duration,
    /// Number of recent stderr lines retained
    pub stderr_tail_lines: usize,
    /// Longest accepted response line
    pub max_line_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_ENGINE),
            args: Vec::new(),
            protocol: ProtocolVersion::default(),
            read_timeout: None,
            shutdown_grace: Duration::from_millis(200),
            stderr_tail_lines: 64,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

impl EngineConfig {
    /// Config for the engine at `program`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Defaults overlaid with `CGT_ENGINE`, `CGT_PROTOCOL` and `CGT_READ_TIMEOUT_MS`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(program) = std::env::var("CGT_ENGINE") {
            config.program = PathBuf::from(program);
        }
        if let Ok(protocol) = std::env::var("CGT_PROTOCOL") {
            config.protocol = protocol.parse()?;
        }
        if let Ok(timeout) = std::env::var("CGT_READ_TIMEOUT_MS") {
            let ms: u64 = timeout.trim().parse().map_err(|_| {
                CgtError::Config(format!("bad CGT_READ_TIMEOUT_MS '{}'", timeout))
            })?;
            config.read_timeout = Some(Duration::from_millis(ms));
        }
        Ok(config)
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_protocol(mut self, protocol: ProtocolVersion) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_version_parse() {
        assert_eq!("1".parse::<ProtocolVersion>().unwrap(), ProtocolVersion::V1);
        assert_eq!("V2".parse::<ProtocolVersion>().unwrap(), ProtocolVersion::V2);
        assert!("3".parse::<ProtocolVersion>().is_err());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new("/opt/cgt/engine")
            .with_args(["--quiet"])
            .with_protocol(ProtocolVersion::V1)
            .with_read_timeout(Duration::from_secs(3));
        assert_eq!(config.program, PathBuf::from("/opt/cgt/engine"));
        assert_eq!(config.args, vec!["--quiet".to_string()]);
        assert_eq!(config.protocol, ProtocolVersion::V1);
        assert_eq!(config.read_timeout, Some(Duration::from_secs(3)));
        assert_eq!(config.max_line_bytes, DEFAULT_MAX_LINE_BYTES);
    }
}
