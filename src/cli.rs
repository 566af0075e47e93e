use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Ip address of the probe; when given with --port, connects on startup.
    #[arg(long, short = 'a')]
    pub address: Option<String>,

    /// Tcp port of the probe.
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Scan-converted output width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Scan-converted output height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Directory holding the module's security keys.
    #[arg(long, short = 'k')]
    pub keydir: Option<PathBuf>,

    /// Probe model for the auto-loaded workflow.
    #[arg(long)]
    pub probe: Option<String>,

    /// Application for the auto-loaded workflow.
    #[arg(long)]
    pub application: Option<String>,

    /// Pem certificate sent right after connecting.
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// Path to the toml configuration file.
    #[arg(long)]
    pub config: Option<String>,

    /// Append logs to this file in addition to stdout.
    #[arg(long)]
    pub log_file: Option<String>,

    /// Increase log verbosity (-d for debug, -dd for trace).
    #[arg(long, short = 'd', action = clap::ArgAction::Count)]
    pub debug: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_connection_arguments() {
        let args =
            CliArgs::parse_from(["solum-bridge", "-a", "192.168.1.1", "-p", "5828", "-dd"]);
        assert_eq!(args.address.as_deref(), Some("192.168.1.1"));
        assert_eq!(args.port, Some(5828));
        assert_eq!(args.debug, 2);
    }

    #[test]
    fn defaults_leave_overrides_unset() {
        let args = CliArgs::parse_from(["solum-bridge"]);
        assert!(args.address.is_none());
        assert!(args.config.is_none());
        assert_eq!(args.debug, 0);
    }
}
