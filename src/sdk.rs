//! Seam to the vendor probe SDK's synchronous control surface.
//!
//! The real library is a closed native module loaded at runtime; everything
//! in this crate talks to it through [`ProbeControl`] so the bridge,
//! dispatcher and console can run against the simulator in [`crate::sim`] or
//! a real binding interchangeably.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

/// A failed synchronous SDK call, carrying the vendor code and message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("({code}) {message}")]
pub struct SdkError {
    pub code: i32,
    pub message: String,
}

impl SdkError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Imaging parameters adjustable while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// Imaging depth in cm.
    ImageDepth,
    /// Gain in percent.
    Gain,
    /// Auto gain enable.
    AutoGain,
    /// Dynamic range in percent.
    DynamicRange,
    /// Color/power gain in percent.
    ColorGain,
    /// Imu streaming enable.
    ImuStreaming,
    /// Raw data buffering enable.
    RawBuffer,
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ImageDepth => "depth",
            Self::Gain => "gain",
            Self::AutoGain => "auto-gain",
            Self::DynamicRange => "dynamic-range",
            Self::ColorGain => "color-gain",
            Self::ImuStreaming => "imu",
            Self::RawBuffer => "raw-buffer",
        };
        f.write_str(name)
    }
}

impl FromStr for Param {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "depth" | "d" => Ok(Self::ImageDepth),
            "gain" | "g" => Ok(Self::Gain),
            "auto-gain" => Ok(Self::AutoGain),
            "dynamic-range" => Ok(Self::DynamicRange),
            "color-gain" => Ok(Self::ColorGain),
            "imu" | "i" => Ok(Self::ImuStreaming),
            "raw-buffer" => Ok(Self::RawBuffer),
            other => Err(format!("unknown parameter '{other}'")),
        }
    }
}

/// Probe hardware platforms, used for firmware version queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    V1,
    Hd,
    Hd3,
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(Self::V1),
            "hd" => Ok(Self::Hd),
            "hd3" => Ok(Self::Hd3),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// The SDK's synchronous control surface.
///
/// Calls may block while the module talks to the probe; issue them from a
/// thread that tolerates blocking. State confirmations arrive later through
/// the callback surface, never through these return values.
pub trait ProbeControl: Send + Sync {
    /// Initializes the module with a writable store directory and the
    /// desired scan-converted output size.
    fn init(&self, store_dir: &Path, width: u32, height: u32) -> Result<(), SdkError>;

    /// Starts an asynchronous connection attempt to the probe.
    fn connect(&self, address: &str, port: u16) -> Result<(), SdkError>;

    fn disconnect(&self) -> Result<(), SdkError>;

    /// Requests imaging to start (`true`) or stop (`false`).
    fn run_imaging(&self, run: bool) -> Result<(), SdkError>;

    fn set_param(&self, param: Param, value: f64) -> Result<(), SdkError>;

    fn get_param(&self, param: Param) -> Result<f64, SdkError>;

    /// Sends a pem certificate for validation; the result arrives as a
    /// certificate event.
    fn set_certificate(&self, pem: &str) -> Result<(), SdkError>;

    fn load_application(&self, probe: &str, application: &str) -> Result<(), SdkError>;

    fn firmware_version(&self, platform: Platform) -> Result<String, SdkError>;

    fn probes(&self) -> Result<Vec<String>, SdkError>;

    fn applications(&self, probe: &str) -> Result<Vec<String>, SdkError>;

    /// Stops all callback delivery. Must only return once no callback can
    /// still be in flight, so the module handle can be released safely
    /// afterwards.
    fn quiesce(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_parses_long_and_short_names() {
        assert_eq!("depth".parse::<Param>(), Ok(Param::ImageDepth));
        assert_eq!("g".parse::<Param>(), Ok(Param::Gain));
        assert_eq!("imu".parse::<Param>(), Ok(Param::ImuStreaming));
        assert!("bogus".parse::<Param>().is_err());
    }

    #[test]
    fn param_display_matches_parse() {
        for param in [Param::ImageDepth, Param::Gain, Param::RawBuffer] {
            assert_eq!(param.to_string().parse::<Param>(), Ok(param));
        }
    }
}
