use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;

use crate::cli::CliArgs;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub probe: ProbeConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Probe connection and output settings.
#[derive(Debug, Deserialize)]
pub struct ProbeConfig {
    /// Ip address of the probe; empty means connect manually from the
    /// console.
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub port: u16,
    /// Scan-converted output width in pixels.
    pub width: u32,
    pub height: u32,
    /// Writable directory for the module's security keys.
    pub store_dir: PathBuf,
}

/// Workflow loaded automatically once the certificate validates.
#[derive(Debug, Deserialize, Default)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub probe: Option<String>,
    #[serde(default)]
    pub application: Option<String>,
    /// Pem certificate sent right after connecting, when set.
    #[serde(default)]
    pub certificate: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct QueueConfig {
    /// Event queue capacity; 0 selects an unbounded queue, anything else
    /// blocks producers when full.
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { capacity: 0 }
    }
}

impl Config {
    pub fn load(cli_args: &CliArgs) -> Result<Self> {
        let config_path = cli_args.config.as_deref().unwrap_or("config/default.toml");
        info!("loading configuration from {config_path}");

        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config file: {config_path}"))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("failed to parse config file: {config_path}"))?;

        config.override_with_cli_args(cli_args);
        config.validate()?;

        Ok(config)
    }

    fn override_with_cli_args(&mut self, args: &CliArgs) {
        if let Some(address) = &args.address {
            self.probe.address = address.clone();
        }
        if let Some(port) = args.port {
            self.probe.port = port;
        }
        if let Some(width) = args.width {
            self.probe.width = width;
        }
        if let Some(height) = args.height {
            self.probe.height = height;
        }
        if let Some(keydir) = &args.keydir {
            self.probe.store_dir = keydir.clone();
        }
        if let Some(probe) = &args.probe {
            self.workflow.probe = Some(probe.clone());
        }
        if let Some(application) = &args.application {
            self.workflow.application = Some(application.clone());
        }
        if let Some(cert) = &args.cert {
            self.workflow.certificate = Some(cert.clone());
        }
    }

    fn validate(&self) -> Result<()> {
        if self.probe.width == 0 || self.probe.height == 0 {
            anyhow::bail!("output size must be non-zero");
        }
        if self.probe.port != 0 && self.probe.address.is_empty() {
            anyhow::bail!("a port was configured without an ip address");
        }
        if self.workflow.probe.is_some() != self.workflow.application.is_some() {
            anyhow::bail!("workflow probe and application must be set together");
        }
        Ok(())
    }

    /// The workflow to auto-load on certificate validation, when fully
    /// configured.
    pub fn workflow_pair(&self) -> Option<(String, String)> {
        match (&self.workflow.probe, &self.workflow.application) {
            (Some(probe), Some(application)) => Some((probe.clone(), application.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Config {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn parses_full_config() {
        let config = parse(
            r#"
            [probe]
            address = "192.168.1.1"
            port = 5828
            width = 640
            height = 480
            store_dir = "/tmp/solum"

            [workflow]
            probe = "C3"
            application = "abdomen"
            certificate = "/tmp/probe.pem"

            [queue]
            capacity = 0
            "#,
        );
        assert_eq!(config.probe.port, 5828);
        assert_eq!(
            config.workflow_pair(),
            Some(("C3".to_owned(), "abdomen".to_owned()))
        );
        config.validate().unwrap();
    }

    #[test]
    fn rejects_port_without_address() {
        let config = parse(
            r#"
            [probe]
            port = 5828
            width = 640
            height = 480
            store_dir = "/tmp/solum"

            [workflow]

            [queue]
            capacity = 0
            "#,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_half_configured_workflow() {
        let config = parse(
            r#"
            [probe]
            width = 640
            height = 480
            store_dir = "/tmp/solum"

            [workflow]
            probe = "C3"

            [queue]
            capacity = 16
            "#,
        );
        assert!(config.validate().is_err());
        assert_eq!(config.workflow_pair(), None);
    }
}
