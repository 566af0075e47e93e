//! Owned frame records streamed from the probe.
//!
//! Every buffer handed to a callback is only valid for the duration of the
//! call, so all frame types here own deep copies of their data.

/// A single inertial measurement tagged to a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImuSample {
    /// Timestamp in nanoseconds.
    pub tm: u64,
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
    pub gx: f64,
    pub gy: f64,
    pub gz: f64,
    pub mx: f64,
    pub my: f64,
    pub mz: f64,
}

/// Properties of a scan-converted image as reported by the callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessedImageInfo {
    pub width: u32,
    pub height: u32,
    /// Full size of the image buffer in bytes.
    pub image_size: usize,
    pub microns_per_pixel: f64,
    /// Image timestamp in nanoseconds.
    pub timestamp_ns: u64,
    /// Acquisition angle for volumetric sweeps.
    pub angle: f64,
}

/// A scan-converted image with its owned pixel data and tagged imu batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
    pub microns_per_pixel: f64,
    pub timestamp_ns: u64,
    pub angle: f64,
    pub imu: Vec<ImuSample>,
}

impl ImageFrame {
    /// Builds a frame from a callback buffer, copying the pixels and imu data
    /// out before the producer reclaims them.
    pub fn copied_from(data: &[u8], nfo: &ProcessedImageInfo, imu: &[ImuSample]) -> Self {
        let pixels = nfo.width as usize * nfo.height as usize;
        let bits_per_pixel = if pixels > 0 {
            (nfo.image_size / pixels * 8) as u32
        } else {
            0
        };

        Self {
            data: data.to_vec(),
            width: nfo.width,
            height: nfo.height,
            bits_per_pixel,
            microns_per_pixel: nfo.microns_per_pixel,
            timestamp_ns: nfo.timestamp_ns,
            angle: nfo.angle,
            imu: imu.to_vec(),
        }
    }
}

/// Properties of a pre-scan-converted image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawImageInfo {
    pub lines: u32,
    pub samples: u32,
    pub bits_per_sample: u32,
    /// Microns per sample (axial).
    pub axial: f64,
    /// Microns per line (lateral).
    pub lateral: f64,
    pub timestamp_ns: u64,
    /// Jpeg compressed size, 0 when the data is uncompressed.
    pub jpeg_size: usize,
    /// True when the buffer holds radiofrequency data.
    pub rf: bool,
    pub angle: f64,
}

/// A pre-scan-converted frame, either raw grayscale in polar co-ordinates or
/// radiofrequency data depending on the `rf` flag.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub info: RawImageInfo,
}

impl RawFrame {
    pub fn copied_from(data: &[u8], info: &RawImageInfo) -> Self {
        Self {
            data: data.to_vec(),
            info: *info,
        }
    }
}

/// Properties of a spectral frame (m or pulsed-wave).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumInfo {
    pub lines: u32,
    pub samples: u32,
    pub bits_per_sample: u32,
    /// Line repetition period of the spectrum.
    pub period: f64,
    /// Microns per sample for an m spectrum.
    pub microns_per_sample: f64,
    /// Velocity per sample for a pw spectrum.
    pub velocity_per_sample: f64,
    /// True for a pw spectrum, false for an m spectrum.
    pub pw: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumFrame {
    pub data: Vec<u8>,
    pub info: SpectrumInfo,
}

impl SpectrumFrame {
    pub fn copied_from(data: &[u8], info: &SpectrumInfo) -> Self {
        Self {
            data: data.to_vec(),
            info: *info,
        }
    }
}
