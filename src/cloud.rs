//! One-shot retrieval of probe certificates from the cloud REST API.
//!
//! Best-effort by design: a single GET, no retries, no pagination. Failures
//! are terminal for the run and reported as is.

use log::debug;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// Default certificate listing endpoint.
pub const DEFAULT_URL: &str = "https://cloud.clarius.com/api/public/v0/devices/oem/?format=json";

#[derive(Debug, Deserialize)]
pub struct Listing {
    pub results: Vec<DeviceEntry>,
}

#[derive(Debug, Deserialize)]
pub struct DeviceEntry {
    pub device: Device,
    /// Present only for probes with an issued certificate.
    pub crt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Device {
    pub serial: String,
}

/// A probe serial paired with its issued certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedProbe {
    pub serial: String,
    pub certificate: String,
}

/// Keeps only the entries that carry a certificate.
pub fn authenticated_probes(listing: Listing) -> Vec<AuthenticatedProbe> {
    listing
        .results
        .into_iter()
        .filter_map(|entry| {
            entry.crt.map(|certificate| AuthenticatedProbe {
                serial: entry.device.serial,
                certificate,
            })
        })
        .collect()
}

/// Fetches the device listing and returns the authenticated probes.
pub fn fetch_certificates(url: &str, token: &str) -> Result<Vec<AuthenticatedProbe>> {
    debug!("requesting device listing from {url}");

    let response = ureq::get(url)
        .set("Authorization", &format!("OEM-API-Key {token}"))
        .call();

    match response {
        Ok(resp) => {
            let listing: Listing = resp.into_json()?;
            Ok(authenticated_probes(listing))
        }
        Err(ureq::Error::Status(status, resp)) => Err(AppError::Http {
            status,
            body: resp.into_string().unwrap_or_default(),
        }),
        Err(err) => Err(AppError::connection(err.to_string())),
    }
}
