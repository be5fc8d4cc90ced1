//! Command-line interface.
//!
//! Flags take precedence over the `MCP_*` environment variables.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::core::transport::{DEFAULT_SSE_PORT, TransportConfig};
use crate::core::{Config, Result};

/// Serve tools declared in JSON manifests over MCP.
#[derive(Debug, Parser)]
#[command(name = "mcp-tool-server", version, about)]
pub struct Cli {
    /// Tool manifests, or directories of manifests, to load
    #[arg(value_name = "TOOLS_PATHS")]
    pub tools_paths: Vec<PathBuf>,

    /// Write debug logs (including tool parameters and results) to FILE
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Transport to serve on
    #[arg(long, value_enum)]
    pub transport: Option<TransportKind>,

    /// Port for the SSE transport
    #[arg(long)]
    pub port: Option<u16>,
}

/// Transport selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    Stdio,
    Sse,
}

impl Cli {
    /// Apply the flags on top of `config`.
    pub fn apply(self, config: &mut Config) -> Result<()> {
        if !self.tools_paths.is_empty() {
            config.tools.paths = self.tools_paths;
        }
        if let Some(log) = self.log {
            config.logging.file = Some(log);
        }

        match self.transport {
            Some(TransportKind::Stdio) => config.transport = TransportConfig::stdio(),
            Some(TransportKind::Sse) => {
                config.transport = sse_transport(self.port.unwrap_or(DEFAULT_SSE_PORT))?;
            }
            None => {
                if let Some(port) = self.port {
                    set_port(&mut config.transport, port);
                }
            }
        }
        Ok(())
    }
}

#[cfg(feature = "sse")]
fn sse_transport(port: u16) -> Result<TransportConfig> {
    Ok(TransportConfig::sse(port))
}

#[cfg(not(feature = "sse"))]
fn sse_transport(_port: u16) -> Result<TransportConfig> {
    Err(crate::core::Error::config("this build does not include the sse transport"))
}

/// `--port` without `--transport` only matters when the environment already
/// selected SSE.
#[cfg_attr(not(feature = "sse"), allow(unused_variables))]
fn set_port(transport: &mut TransportConfig, port: u16) {
    match transport {
        TransportConfig::Stdio => {}
        #[cfg(feature = "sse")]
        TransportConfig::Sse(cfg) => cfg.port = port,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_leave_config_alone() {
        let cli = Cli::try_parse_from(["mcp-tool-server"]).unwrap();
        let mut config = Config::default();
        cli.apply(&mut config).unwrap();
        assert!(config.transport.is_stdio());
        assert!(config.tools.paths.is_empty());
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_paths_and_log() {
        let cli = Cli::try_parse_from([
            "mcp-tool-server",
            "tools",
            "extra/one.json",
            "--log",
            "debug.log",
        ])
        .unwrap();
        let mut config = Config::default();
        cli.apply(&mut config).unwrap();
        assert_eq!(
            config.tools.paths,
            [PathBuf::from("tools"), PathBuf::from("extra/one.json")]
        );
        assert_eq!(config.logging.file, Some(PathBuf::from("debug.log")));
    }

    #[cfg(feature = "sse")]
    #[test]
    fn test_sse_with_port() {
        let cli = Cli::try_parse_from(["mcp-tool-server", "--transport", "sse", "--port", "9000"])
            .unwrap();
        let mut config = Config::default();
        cli.apply(&mut config).unwrap();
        assert_eq!(config.transport, TransportConfig::sse(9000));

        let cli = Cli::try_parse_from(["mcp-tool-server", "--transport", "sse"]).unwrap();
        let mut config = Config::default();
        cli.apply(&mut config).unwrap();
        assert_eq!(config.transport, TransportConfig::sse(DEFAULT_SSE_PORT));
    }

    #[cfg(feature = "sse")]
    #[test]
    fn test_flag_overrides_environment_transport() {
        let mut config = Config::default();
        config.transport = TransportConfig::sse(8081);

        let cli = Cli::try_parse_from(["mcp-tool-server", "--port", "7000"]).unwrap();
        cli.apply(&mut config).unwrap();
        assert_eq!(config.transport, TransportConfig::sse(7000));

        let cli = Cli::try_parse_from(["mcp-tool-server", "--transport", "stdio"]).unwrap();
        cli.apply(&mut config).unwrap();
        assert!(config.transport.is_stdio());
    }

    #[test]
    fn test_invalid_arguments_rejected() {
        assert!(Cli::try_parse_from(["mcp-tool-server", "--transport", "tcp"]).is_err());
        assert!(
            Cli::try_parse_from([
                "mcp-tool-server",
                "--transport",
                "sse",
                "--transport",
                "stdio"
            ])
            .is_err()
        );
        assert!(Cli::try_parse_from(["mcp-tool-server", "--port", "http"]).is_err());
    }
}
