//! Callback adapter and event queue.
//!
//! The SDK invokes its callbacks on threads it owns. Each callback is turned
//! into exactly one [`Event`] and handed through a channel to the single
//! consumer thread running the dispatcher. Buffers that die when the
//! callback returns are copied here, before the enqueue.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::debug;

use crate::event::Event;
use crate::frame::{ImageFrame, ImuSample, ProcessedImageInfo, RawFrame, RawImageInfo, SpectrumFrame, SpectrumInfo};

/// Creates the event queue and its producer-side adapter.
///
/// A `capacity` of zero selects an unbounded queue; any other value bounds
/// the queue and blocks producers when it fills, trading callback latency
/// for a memory cap.
pub fn event_channel(capacity: usize) -> (CallbackBridge, Receiver<Event>) {
    let (tx, rx) = if capacity == 0 {
        unbounded()
    } else {
        bounded(capacity)
    };
    (CallbackBridge { tx }, rx)
}

/// Producer-side adapter mapping the SDK callback surface onto events.
///
/// Clone one per producer; events from a single clone arrive at the consumer
/// in the order they were sent.
#[derive(Debug, Clone)]
pub struct CallbackBridge {
    tx: Sender<Event>,
}

impl CallbackBridge {
    fn enqueue(&self, event: Event) {
        // A send error means the consumer already shut down; late callbacks
        // during teardown are expected and dropped quietly.
        if self.tx.send(event).is_err() {
            debug!("event queue closed, dropping late callback");
        }
    }

    /// A new scan-converted image was streamed.
    pub fn on_processed_image(&self, data: &[u8], nfo: &ProcessedImageInfo, imu: &[ImuSample]) {
        self.enqueue(Event::ProcessedImage(ImageFrame::copied_from(
            data, nfo, imu,
        )));
    }

    /// A new pre-scan-converted or rf image was streamed.
    pub fn on_raw_image(&self, data: &[u8], nfo: &RawImageInfo) {
        self.enqueue(Event::RawImage(RawFrame::copied_from(data, nfo)));
    }

    /// A new spectral image was streamed.
    pub fn on_spectrum_image(&self, data: &[u8], nfo: &SpectrumInfo) {
        self.enqueue(Event::Spectrum(SpectrumFrame::copied_from(data, nfo)));
    }

    /// Standalone imu data was streamed.
    pub fn on_imu_data(&self, samples: &[ImuSample]) {
        self.enqueue(Event::Imu(samples.to_vec()));
    }

    /// The connection state changed.
    pub fn on_connection(&self, code: i32, port: i32, message: &str) {
        self.enqueue(Event::Connection {
            code,
            port,
            message: message.to_owned(),
        });
    }

    /// A certificate sent for validation was processed.
    pub fn on_certificate(&self, days_valid: i32) {
        self.enqueue(Event::Certificate { days_valid });
    }

    /// The probe announced it is powering down.
    pub fn on_power_down(&self, code: i32, seconds: i32) {
        self.enqueue(Event::PowerDown { code, seconds });
    }

    /// The imaging state changed.
    pub fn on_imaging_state(&self, code: i32, running: bool) {
        self.enqueue(Event::Imaging { code, running });
    }

    /// A physical button was pressed.
    pub fn on_button(&self, code: i32, clicks: i32) {
        self.enqueue(Event::Button { code, clicks });
    }

    /// The module reported an error.
    pub fn on_error(&self, code: i32, message: &str) {
        self.enqueue(Event::Error {
            code,
            message: message.to_owned(),
        });
    }
}
