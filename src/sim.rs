//! In-process probe simulator.
//!
//! Implements [`ProbeControl`] against the callback adapter so the whole
//! pipeline can run without vendor hardware or the native module. Control
//! calls succeed synchronously and the matching confirmations are emitted
//! asynchronously from simulator-owned threads, mirroring how the real
//! module behaves.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::debug;

use crate::bridge::CallbackBridge;
use crate::frame::{ImuSample, ProcessedImageInfo};
use crate::sdk::{Param, Platform, ProbeControl, SdkError};

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 480;
const FRAME_PERIOD: Duration = Duration::from_millis(50);

struct Inner {
    bridge: Option<CallbackBridge>,
    streamer: Option<JoinHandle<()>>,
    /// Short-lived threads emitting one-shot confirmations.
    notifiers: Vec<JoinHandle<()>>,
    connected: bool,
    application_loaded: bool,
    params: Vec<(Param, f64)>,
}

/// Simulated probe backing the demo and the tests.
pub struct SimProbe {
    inner: Mutex<Inner>,
    streaming: Arc<AtomicBool>,
}

impl SimProbe {
    pub fn new(bridge: CallbackBridge) -> Self {
        Self {
            inner: Mutex::new(Inner {
                bridge: Some(bridge),
                streamer: None,
                notifiers: Vec::new(),
                connected: false,
                application_loaded: false,
                params: Vec::new(),
            }),
            streaming: Arc::new(AtomicBool::new(false)),
        }
    }

    fn stop_streamer(inner: &mut Inner, streaming: &AtomicBool) {
        streaming.store(false, Ordering::Release);
        if let Some(handle) = inner.streamer.take() {
            // Join so no frame callback can be in flight past this point.
            let _ = handle.join();
        }
    }
}

impl ProbeControl for SimProbe {
    fn init(&self, store_dir: &Path, width: u32, height: u32) -> Result<(), SdkError> {
        debug!(
            "sim init: store {:?}, output {}x{}",
            store_dir, width, height
        );
        Ok(())
    }

    fn connect(&self, address: &str, port: u16) -> Result<(), SdkError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.connected {
            return Err(SdkError::new(-1, "already connected"));
        }
        let bridge = inner
            .bridge
            .clone()
            .ok_or_else(|| SdkError::new(-1, "module shut down"))?;
        inner.connected = true;

        let message = format!("connected to {address}:{port}");
        inner.notifiers.push(thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            bridge.on_connection(0, 37425, &message);
        }));
        Ok(())
    }

    fn disconnect(&self) -> Result<(), SdkError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.connected {
            return Err(SdkError::new(-1, "not connected"));
        }
        inner.connected = false;
        inner.application_loaded = false;
        Self::stop_streamer(&mut inner, &self.streaming);

        if let Some(bridge) = inner.bridge.clone() {
            bridge.on_imaging_state(1, false);
            bridge.on_connection(1, 0, "user disconnect");
        }
        Ok(())
    }

    fn run_imaging(&self, run: bool) -> Result<(), SdkError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.connected {
            return Err(SdkError::new(-1, "not connected"));
        }
        if run && !inner.application_loaded {
            return Err(SdkError::new(-1, "no application loaded"));
        }

        if !run {
            Self::stop_streamer(&mut inner, &self.streaming);
            if let Some(bridge) = inner.bridge.clone() {
                bridge.on_imaging_state(1, false);
            }
            return Ok(());
        }

        if self.streaming.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let bridge = inner
            .bridge
            .clone()
            .ok_or_else(|| SdkError::new(-1, "module shut down"))?;
        let streaming = self.streaming.clone();
        inner.streamer = Some(thread::spawn(move || {
            bridge.on_imaging_state(1, true);

            let data = vec![0u8; (FRAME_WIDTH * FRAME_HEIGHT) as usize];
            let mut timestamp_ns: u64 = 0;
            while streaming.load(Ordering::Acquire) {
                timestamp_ns += FRAME_PERIOD.as_nanos() as u64;
                let nfo = ProcessedImageInfo {
                    width: FRAME_WIDTH,
                    height: FRAME_HEIGHT,
                    image_size: data.len(),
                    microns_per_pixel: 100.0,
                    timestamp_ns,
                    angle: 0.0,
                };
                let imu = [ImuSample {
                    tm: timestamp_ns,
                    ..Default::default()
                }];
                bridge.on_processed_image(&data, &nfo, &imu);
                thread::sleep(FRAME_PERIOD);
            }
        }));
        Ok(())
    }

    fn set_param(&self, param: Param, value: f64) -> Result<(), SdkError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.connected {
            return Err(SdkError::new(-1, "not connected"));
        }
        inner.params.retain(|(p, _)| *p != param);
        inner.params.push((param, value));
        Ok(())
    }

    fn get_param(&self, param: Param) -> Result<f64, SdkError> {
        let inner = self.inner.lock().unwrap();
        if !inner.connected {
            return Err(SdkError::new(-1, "not connected"));
        }
        Ok(inner
            .params
            .iter()
            .find(|(p, _)| *p == param)
            .map(|(_, v)| *v)
            .unwrap_or(0.0))
    }

    fn set_certificate(&self, pem: &str) -> Result<(), SdkError> {
        let mut inner = self.inner.lock().unwrap();
        let bridge = inner
            .bridge
            .clone()
            .ok_or_else(|| SdkError::new(-1, "module shut down"))?;
        let days_valid = if pem.contains("-----BEGIN") { 365 } else { -1 };
        inner.notifiers.push(thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            bridge.on_certificate(days_valid);
        }));
        Ok(())
    }

    fn load_application(&self, probe: &str, application: &str) -> Result<(), SdkError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.connected {
            return Err(SdkError::new(-1, "not connected"));
        }
        if !self.probes()?.iter().any(|p| p == probe) {
            return Err(SdkError::new(-1, format!("unknown probe '{probe}'")));
        }
        inner.application_loaded = true;
        if let Some(bridge) = inner.bridge.clone() {
            debug!("sim loaded {application} on {probe}");
            bridge.on_imaging_state(1, false);
        }
        Ok(())
    }

    fn firmware_version(&self, platform: Platform) -> Result<String, SdkError> {
        Ok(match platform {
            Platform::V1 => "9.3.0".to_owned(),
            Platform::Hd => "11.2.0".to_owned(),
            Platform::Hd3 => "12.0.2".to_owned(),
        })
    }

    fn probes(&self) -> Result<Vec<String>, SdkError> {
        Ok(vec!["C3".to_owned(), "L7".to_owned(), "C7".to_owned()])
    }

    fn applications(&self, probe: &str) -> Result<Vec<String>, SdkError> {
        match probe {
            "C3" | "C7" => Ok(vec!["abdomen".to_owned(), "cardiac".to_owned()]),
            "L7" => Ok(vec!["msk".to_owned(), "vascular".to_owned()]),
            other => Err(SdkError::new(-1, format!("unknown probe '{other}'"))),
        }
    }

    fn quiesce(&self) {
        let mut inner = self.inner.lock().unwrap();
        Self::stop_streamer(&mut inner, &self.streaming);
        for handle in inner.notifiers.drain(..) {
            let _ = handle.join();
        }
        // Dropping the adapter closes this producer; no further callbacks
        // can be emitted once quiesce returns.
        inner.bridge = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::event_channel;
    use crate::event::Event;
    use std::time::Instant;

    fn connected_probe() -> (SimProbe, crossbeam_channel::Receiver<Event>) {
        let (bridge, rx) = event_channel(0);
        let probe = SimProbe::new(bridge);
        probe.connect("192.168.1.1", 5828).unwrap();
        // Wait for the asynchronous confirmation.
        match rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            Event::Connection { code: 0, .. } => {}
            other => panic!("unexpected event {other:?}"),
        }
        (probe, rx)
    }

    #[test]
    fn connect_emits_confirmation_event() {
        let (_probe, _rx) = connected_probe();
    }

    #[test]
    fn run_requires_loaded_application() {
        let (probe, _rx) = connected_probe();
        assert!(probe.run_imaging(true).is_err());

        probe.load_application("C3", "abdomen").unwrap();
        probe.run_imaging(true).unwrap();
        probe.run_imaging(false).unwrap();
    }

    #[test]
    fn streaming_emits_frames_until_stopped() {
        let (probe, rx) = connected_probe();
        probe.load_application("C3", "abdomen").unwrap();
        probe.run_imaging(true).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut frames = 0;
        while frames < 3 && Instant::now() < deadline {
            if let Ok(event) = rx.recv_timeout(Duration::from_millis(200)) {
                if matches!(event, Event::ProcessedImage(_)) {
                    frames += 1;
                }
            }
        }
        assert_eq!(frames, 3);
        probe.run_imaging(false).unwrap();
    }

    #[test]
    fn no_events_delivered_after_quiesce() {
        let (probe, rx) = connected_probe();
        probe.load_application("C3", "abdomen").unwrap();
        probe.run_imaging(true).unwrap();

        probe.quiesce();

        // Drain whatever was enqueued before quiesce; the channel must then
        // disconnect because the simulator dropped its adapter.
        while rx.recv_timeout(Duration::from_millis(100)).is_ok() {}
        assert!(rx
            .recv_timeout(Duration::from_millis(100))
            .is_err());
        assert!(probe.run_imaging(false).is_err() || probe.inner.lock().unwrap().bridge.is_none());
    }

    #[test]
    fn parameters_round_trip() {
        let (probe, _rx) = connected_probe();
        probe.set_param(Param::Gain, 60.0).unwrap();
        assert_eq!(probe.get_param(Param::Gain).unwrap(), 60.0);
        assert_eq!(probe.get_param(Param::ImageDepth).unwrap(), 0.0);
    }
}
