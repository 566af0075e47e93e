//! Command issuer: user actions mapped onto synchronous SDK control calls.
//!
//! A failed call is reported to the caller and nothing else changes; the
//! connection and imaging flags are only ever updated by the dispatcher when
//! the corresponding asynchronous confirmation arrives, so the synchronous
//! return value and the later event can never race on shared state. The one
//! concession is the pending mark after a connect call, which is guarded so
//! it can never overwrite a state the dispatcher already confirmed.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::error::{AppError, Result};
use crate::sdk::{Param, Platform, ProbeControl};
use crate::session::Session;

#[derive(Clone)]
pub struct Commander {
    sdk: Arc<dyn ProbeControl>,
    session: Arc<Session>,
}

impl Commander {
    pub fn new(sdk: Arc<dyn ProbeControl>, session: Arc<Session>) -> Self {
        Self { sdk, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Starts a connection attempt. The attempt is marked pending only if no
    /// connection event has been dispatched yet; the definitive state is
    /// whatever the dispatcher wrote last.
    pub fn connect(&self, address: &str, port: u16) -> Result<()> {
        info!("connecting to {address}:{port}");
        self.sdk.connect(address, port)?;
        self.session.begin_connecting();
        Ok(())
    }

    pub fn disconnect(&self) -> Result<()> {
        self.sdk.disconnect()?;
        Ok(())
    }

    /// Starts or stops imaging depending on the last confirmed state.
    pub fn toggle_imaging(&self) -> Result<()> {
        let run = !self.session.imaging_running();
        info!("requesting imaging {}", if run { "start" } else { "stop" });
        self.sdk.run_imaging(run)?;
        Ok(())
    }

    pub fn set_param(&self, param: Param, value: f64) -> Result<()> {
        self.sdk.set_param(param, value)?;
        Ok(())
    }

    pub fn get_param(&self, param: Param) -> Result<f64> {
        Ok(self.sdk.get_param(param)?)
    }

    /// Reads a pem certificate from disk and sends it for validation.
    pub fn load_certificate(&self, path: &Path) -> Result<()> {
        let pem = fs::read_to_string(path)?;
        if !pem.contains("-----BEGIN") {
            return Err(AppError::CertificateInvalid);
        }
        self.sdk.set_certificate(&pem)?;
        Ok(())
    }

    pub fn load_application(&self, probe: &str, application: &str) -> Result<()> {
        info!("loading application {application} on {probe}");
        self.sdk.load_application(probe, application)?;
        Ok(())
    }

    pub fn firmware_version(&self, platform: Platform) -> Result<String> {
        Ok(self.sdk.firmware_version(platform)?)
    }

    pub fn probes(&self) -> Result<Vec<String>> {
        Ok(self.sdk.probes()?)
    }

    pub fn applications(&self, probe: &str) -> Result<Vec<String>> {
        Ok(self.sdk.applications(probe)?)
    }
}
