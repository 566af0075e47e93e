//! Notification events marshalled off the SDK callback threads.
//!
//! Variants carry the raw numeric codes exactly as the SDK reported them;
//! decoding happens on the consumer thread so that out-of-range values can be
//! logged and dropped without ever touching a producer thread.

use crate::frame::{ImageFrame, ImuSample, RawFrame, SpectrumFrame};

/// Certificate validity code meaning the certificate is missing or unusable.
pub const CERT_INVALID: i32 = -1;

/// One SDK notification, queued for ordered delivery to the consumer thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connection {
        code: i32,
        port: i32,
        message: String,
    },
    Certificate {
        days_valid: i32,
    },
    PowerDown {
        code: i32,
        seconds: i32,
    },
    Imaging {
        code: i32,
        running: bool,
    },
    Button {
        code: i32,
        clicks: i32,
    },
    Error {
        code: i32,
        message: String,
    },
    ProcessedImage(ImageFrame),
    RawImage(RawFrame),
    Spectrum(SpectrumFrame),
    Imu(Vec<ImuSample>),
}

/// Result of a connection attempt as decoded from the callback code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionResult {
    /// The connect call itself errored out.
    CallError,
    Connected,
    Disconnected,
    Failed,
    SwUpdateRequired,
}

impl ConnectionResult {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::CallError),
            0 => Some(Self::Connected),
            1 => Some(Self::Disconnected),
            2 => Some(Self::Failed),
            3 => Some(Self::SwUpdateRequired),
            _ => None,
        }
    }
}

/// Imaging readiness reported alongside the running flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagingReadiness {
    NotReady,
    Ready,
    CertExpired,
    PoorWifi,
    NoContact,
    ChargingChanged,
}

impl ImagingReadiness {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::NotReady),
            1 => Some(Self::Ready),
            2 => Some(Self::CertExpired),
            3 => Some(Self::PoorWifi),
            4 => Some(Self::NoContact),
            5 => Some(Self::ChargingChanged),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerDownReason {
    Idle,
    TooHot,
    LowBattery,
    ButtonOff,
}

impl PowerDownReason {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Idle),
            1 => Some(Self::TooHot),
            2 => Some(Self::LowBattery),
            3 => Some(Self::ButtonOff),
            _ => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Idle => "idle timeout",
            Self::TooHot => "overheating",
            Self::LowBattery => "low battery",
            Self::ButtonOff => "button held",
        }
    }
}

/// Physical probe buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeButton {
    Up,
    Down,
    Handle,
}

impl ProbeButton {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Up),
            1 => Some(Self::Down),
            2 => Some(Self::Handle),
            _ => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Handle => "handle",
        }
    }
}
