//! Consumer-thread event dispatcher.
//!
//! A single thread drains the event queue in arrival order, decodes the raw
//! callback codes, mutates the session state and drives the UI sink. All
//! state mutation happens here; producers only ever touch the queue.

use std::io::Write;
use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, error, info, warn};

use crate::control::Commander;
use crate::event::{
    ConnectionResult, Event, ImagingReadiness, PowerDownReason, ProbeButton, CERT_INVALID,
};
use crate::frame::ImageFrame;
use crate::session::{ConnectionState, Session};

/// Certificate validity as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertStatus {
    Invalid,
    Expired,
    ValidDays(i32),
}

/// Consumer-side sink for user-visible updates.
///
/// Implementations run on the dispatcher thread and must stay cheap; a slow
/// render is throttled by the frame coalescing in [`Dispatcher::run`], not by
/// buffering.
pub trait ProbeUi: Send {
    fn show_status(&mut self, message: &str);
    fn show_certificate(&mut self, status: CertStatus);
    /// Toggles the run control label between start and stop.
    fn set_run_label(&mut self, running: bool);
    fn render(&mut self, frame: &ImageFrame);
}

/// Console sink used by the demo binary.
pub struct ConsoleUi {
    session: Arc<Session>,
}

impl ConsoleUi {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

impl ProbeUi for ConsoleUi {
    fn show_status(&mut self, message: &str) {
        info!("{message}");
    }

    fn show_certificate(&mut self, status: CertStatus) {
        match status {
            CertStatus::Invalid => error!("certificate invalid or not found"),
            CertStatus::Expired => error!("certificate expired"),
            CertStatus::ValidDays(days) => info!("certificate valid for {days} more days"),
        }
    }

    fn set_run_label(&mut self, running: bool) {
        info!(
            "imaging {}",
            if running { "running" } else { "stopped" }
        );
    }

    fn render(&mut self, frame: &ImageFrame) {
        if self.session.stream_print() {
            print!(
                "image: {}, {}x{} @ {} bpp, {:.2} um/px, imu: {} pts\r",
                frame.timestamp_ns,
                frame.width,
                frame.height,
                frame.bits_per_pixel,
                frame.microns_per_pixel,
                frame.imu.len()
            );
            let _ = std::io::stdout().flush();
        }
    }
}

/// The event-processing state machine.
pub struct Dispatcher<U: ProbeUi> {
    commander: Commander,
    ui: U,
    session: Arc<Session>,
    /// Workflow loaded automatically once the certificate validates.
    workflow: Option<(String, String)>,
    /// Most recently dispatched frame; older frames are never retained.
    latest_frame: Option<ImageFrame>,
}

impl<U: ProbeUi> Dispatcher<U> {
    pub fn new(
        commander: Commander,
        ui: U,
        session: Arc<Session>,
        workflow: Option<(String, String)>,
    ) -> Self {
        Self {
            commander,
            ui,
            session,
            workflow,
            latest_frame: None,
        }
    }

    pub fn latest_frame(&self) -> Option<&ImageFrame> {
        self.latest_frame.as_ref()
    }

    /// Drains the queue until every producer has hung up, then returns.
    ///
    /// Consecutive queued image frames are collapsed to the newest before
    /// delivery, so a slow sink drops stale frames instead of falling
    /// behind. Non-frame events are never dropped or reordered.
    pub fn run(&mut self, rx: &Receiver<Event>) {
        let mut pending: Option<Event> = None;
        loop {
            let event = match pending.take() {
                Some(event) => event,
                None => match rx.recv() {
                    Ok(event) => event,
                    Err(_) => break,
                },
            };

            let event = if let Event::ProcessedImage(mut frame) = event {
                loop {
                    match rx.try_recv() {
                        Ok(Event::ProcessedImage(newer)) => frame = newer,
                        Ok(other) => {
                            pending = Some(other);
                            break;
                        }
                        Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                    }
                }
                Event::ProcessedImage(frame)
            } else {
                event
            };

            self.handle(event);
        }
        debug!("event queue closed, dispatcher exiting");
    }

    /// Processes one event. Malformed payloads are logged and dropped; this
    /// function never panics on bad input.
    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Connection { code, port, message } => self.on_connection(code, port, &message),
            Event::Certificate { days_valid } => self.on_certificate(days_valid),
            Event::PowerDown { code, seconds } => match PowerDownReason::from_code(code) {
                Some(reason) => self.ui.show_status(&format!(
                    "probe powering down ({}) in {seconds}s",
                    reason.describe()
                )),
                None => warn!("dropping power down event with unknown code {code}"),
            },
            Event::Imaging { code, running } => self.on_imaging(code, running),
            Event::Button { code, clicks } => match ProbeButton::from_code(code) {
                Some(button) => self
                    .ui
                    .show_status(&format!("{} button pressed, clicks: {clicks}", button.describe())),
                None => warn!("dropping button event with unknown code {code}"),
            },
            Event::Error { code, message } => {
                self.ui.show_status(&format!("probe error ({code}): {message}"));
            }
            Event::ProcessedImage(frame) => {
                self.ui.render(&frame);
                self.latest_frame = Some(frame);
            }
            Event::RawImage(frame) => {
                debug!(
                    "raw image: {}x{} @ {} bps, rf: {}",
                    frame.info.lines, frame.info.samples, frame.info.bits_per_sample, frame.info.rf
                );
            }
            Event::Spectrum(frame) => {
                debug!(
                    "spectrum: {}x{} @ {} bps, pw: {}",
                    frame.info.lines, frame.info.samples, frame.info.bits_per_sample, frame.info.pw
                );
            }
            Event::Imu(samples) => {
                debug!("imu data: {} samples", samples.len());
            }
        }
    }

    fn on_connection(&mut self, code: i32, port: i32, message: &str) {
        let result = match ConnectionResult::from_code(code) {
            Some(result) => result,
            None => {
                warn!("dropping connection event with unknown code {code}");
                return;
            }
        };

        match result {
            ConnectionResult::Connected => {
                self.session.set_connection(ConnectionState::Connected);
                self.ui
                    .show_status(&format!("connected, streaming on port {port}"));
            }
            ConnectionResult::Disconnected => {
                self.session.set_connection(ConnectionState::Disconnected);
                self.session.set_imaging_running(false);
                self.ui.show_status("disconnected from probe");
            }
            ConnectionResult::Failed | ConnectionResult::CallError => {
                self.session.set_connection(ConnectionState::Error);
                self.ui
                    .show_status(&format!("connection failed: {message}"));
            }
            ConnectionResult::SwUpdateRequired => {
                // Informational only; the link itself is unchanged.
                self.ui
                    .show_status("software update required prior to imaging");
            }
        }
    }

    fn on_certificate(&mut self, days_valid: i32) {
        if days_valid == CERT_INVALID {
            self.ui.show_certificate(CertStatus::Invalid);
        } else if days_valid == 0 {
            self.ui.show_certificate(CertStatus::Expired);
        } else if days_valid > 0 {
            self.ui.show_certificate(CertStatus::ValidDays(days_valid));
            // The one automatic action: a validated certificate loads the
            // configured workflow.
            if let Some((probe, application)) = self.workflow.clone() {
                if let Err(err) = self.commander.load_application(&probe, &application) {
                    self.ui
                        .show_status(&format!("application load failed: {err}"));
                }
            }
        } else {
            warn!("dropping certificate event with invalid validity {days_valid}");
        }
    }

    fn on_imaging(&mut self, code: i32, running: bool) {
        let state = match ImagingReadiness::from_code(code) {
            Some(state) => state,
            None => {
                warn!("dropping imaging event with unknown code {code}");
                return;
            }
        };

        self.session.set_imaging_running(running);
        self.ui.set_run_label(running);

        match state {
            ImagingReadiness::Ready => {}
            ImagingReadiness::NotReady => {
                self.ui
                    .show_status("not ready to image, load a probe application first");
            }
            ImagingReadiness::CertExpired => {
                self.ui
                    .show_status("certificate needs updating prior to imaging");
            }
            ImagingReadiness::PoorWifi => {
                self.ui.show_status("imaging stopped due to poor wifi");
            }
            ImagingReadiness::NoContact => {
                self.ui
                    .show_status("imaging stopped, no patient contact detected");
            }
            ImagingReadiness::ChargingChanged => {
                self.ui.show_status("charging status changed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::event_channel;
    use crate::frame::ProcessedImageInfo;
    use crate::sdk::{Param, Platform, ProbeControl, SdkError};
    use std::path::Path;
    use std::sync::Mutex;

    /// Control surface that records calls and succeeds.
    #[derive(Default)]
    struct RecordingProbe {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingProbe {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }
    }

    impl ProbeControl for RecordingProbe {
        fn init(&self, _: &Path, _: u32, _: u32) -> Result<(), SdkError> {
            self.record("init");
            Ok(())
        }
        fn connect(&self, address: &str, port: u16) -> Result<(), SdkError> {
            self.record(format!("connect {address}:{port}"));
            Ok(())
        }
        fn disconnect(&self) -> Result<(), SdkError> {
            self.record("disconnect");
            Ok(())
        }
        fn run_imaging(&self, run: bool) -> Result<(), SdkError> {
            self.record(format!("run {run}"));
            Ok(())
        }
        fn set_param(&self, param: Param, value: f64) -> Result<(), SdkError> {
            self.record(format!("set {param} {value}"));
            Ok(())
        }
        fn get_param(&self, _: Param) -> Result<f64, SdkError> {
            Ok(0.0)
        }
        fn set_certificate(&self, _: &str) -> Result<(), SdkError> {
            self.record("set_certificate");
            Ok(())
        }
        fn load_application(&self, probe: &str, application: &str) -> Result<(), SdkError> {
            self.record(format!("load {probe}/{application}"));
            Ok(())
        }
        fn firmware_version(&self, _: Platform) -> Result<String, SdkError> {
            Ok("12.0.2".into())
        }
        fn probes(&self) -> Result<Vec<String>, SdkError> {
            Ok(vec![])
        }
        fn applications(&self, _: &str) -> Result<Vec<String>, SdkError> {
            Ok(vec![])
        }
        fn quiesce(&self) {}
    }

    /// Sink that records everything it is shown.
    #[derive(Default)]
    struct RecordingUi {
        statuses: Vec<String>,
        certs: Vec<CertStatus>,
        run_labels: Vec<bool>,
        rendered: Vec<u64>,
    }

    impl ProbeUi for RecordingUi {
        fn show_status(&mut self, message: &str) {
            self.statuses.push(message.to_owned());
        }
        fn show_certificate(&mut self, status: CertStatus) {
            self.certs.push(status);
        }
        fn set_run_label(&mut self, running: bool) {
            self.run_labels.push(running);
        }
        fn render(&mut self, frame: &ImageFrame) {
            self.rendered.push(frame.timestamp_ns);
        }
    }

    fn dispatcher(
        workflow: Option<(String, String)>,
    ) -> (Dispatcher<RecordingUi>, Arc<RecordingProbe>, Arc<Session>) {
        let probe = Arc::new(RecordingProbe::default());
        let session = Arc::new(Session::new());
        let commander = Commander::new(probe.clone(), session.clone());
        let dispatcher = Dispatcher::new(commander, RecordingUi::default(), session.clone(), workflow);
        (dispatcher, probe, session)
    }

    #[test]
    fn valid_certificate_loads_application_exactly_once() {
        let (mut dispatcher, probe, _) =
            dispatcher(Some(("C3".to_owned(), "abdomen".to_owned())));

        dispatcher.handle(Event::Certificate { days_valid: 120 });
        assert_eq!(probe.calls(), vec!["load C3/abdomen"]);
    }

    #[test]
    fn invalid_or_expired_certificate_loads_nothing() {
        let (mut dispatcher, probe, _) =
            dispatcher(Some(("C3".to_owned(), "abdomen".to_owned())));

        dispatcher.handle(Event::Certificate { days_valid: CERT_INVALID });
        dispatcher.handle(Event::Certificate { days_valid: 0 });
        assert!(probe.calls().is_empty());
        assert_eq!(
            dispatcher.ui.certs,
            vec![CertStatus::Invalid, CertStatus::Expired]
        );
    }

    #[test]
    fn connection_success_is_idempotent() {
        let (mut dispatcher, _, session) = dispatcher(None);

        let connected = Event::Connection {
            code: 0,
            port: 5828,
            message: "ok".into(),
        };
        dispatcher.handle(connected.clone());
        assert_eq!(session.connection(), ConnectionState::Connected);
        dispatcher.handle(connected);
        assert_eq!(session.connection(), ConnectionState::Connected);
    }

    #[test]
    fn connection_failure_surfaces_message() {
        let (mut dispatcher, _, session) = dispatcher(None);

        dispatcher.handle(Event::Connection {
            code: 2,
            port: 0,
            message: "probe unreachable".into(),
        });
        assert_eq!(session.connection(), ConnectionState::Error);
        assert!(dispatcher.ui.statuses[0].contains("probe unreachable"));
    }

    #[test]
    fn disconnect_clears_imaging_flag() {
        let (mut dispatcher, _, session) = dispatcher(None);

        dispatcher.handle(Event::Imaging { code: 1, running: true });
        assert!(session.imaging_running());

        dispatcher.handle(Event::Connection {
            code: 1,
            port: 0,
            message: "bye".into(),
        });
        assert_eq!(session.connection(), ConnectionState::Disconnected);
        assert!(!session.imaging_running());
    }

    #[test]
    fn malformed_codes_are_dropped_without_state_change() {
        let (mut dispatcher, probe, session) = dispatcher(None);

        dispatcher.handle(Event::Connection {
            code: 42,
            port: 0,
            message: "?".into(),
        });
        dispatcher.handle(Event::Imaging { code: -7, running: true });
        dispatcher.handle(Event::Button { code: 99, clicks: 1 });
        dispatcher.handle(Event::Certificate { days_valid: -12 });

        assert_eq!(session.connection(), ConnectionState::Disconnected);
        assert!(!session.imaging_running());
        assert!(probe.calls().is_empty());
        assert!(dispatcher.ui.statuses.is_empty());
    }

    #[test]
    fn imaging_event_toggles_run_label() {
        let (mut dispatcher, _, session) = dispatcher(None);

        dispatcher.handle(Event::Imaging { code: 1, running: true });
        dispatcher.handle(Event::Imaging { code: 1, running: false });
        assert_eq!(dispatcher.ui.run_labels, vec![true, false]);
        assert!(!session.imaging_running());
    }

    fn enqueue_frame(bridge: &crate::bridge::CallbackBridge, timestamp_ns: u64) {
        let nfo = ProcessedImageInfo {
            width: 2,
            height: 2,
            image_size: 4,
            microns_per_pixel: 100.0,
            timestamp_ns,
            angle: 0.0,
        };
        bridge.on_processed_image(&[0u8; 4], &nfo, &[]);
    }

    #[test]
    fn consecutive_frames_coalesce_to_newest() {
        let (mut dispatcher, _, _) = dispatcher(None);
        let (bridge, rx) = event_channel(0);

        // Three frames queued back to back, then a button, then one more
        // frame. The dispatcher should render frame 3, the button, frame 4.
        for ts in 1..=3 {
            enqueue_frame(&bridge, ts);
        }
        bridge.on_button(0, 1);
        enqueue_frame(&bridge, 4);
        drop(bridge);

        dispatcher.run(&rx);

        assert_eq!(dispatcher.ui.rendered, vec![3, 4]);
        assert_eq!(dispatcher.ui.statuses.len(), 1);
        assert!(dispatcher.ui.statuses[0].contains("button"));
        assert_eq!(dispatcher.latest_frame().unwrap().timestamp_ns, 4);
    }

    #[test]
    fn run_drains_queue_until_disconnect() {
        let (mut dispatcher, _, session) = dispatcher(None);
        let (bridge, rx) = event_channel(0);

        bridge.on_connection(0, 5828, "ok");
        bridge.on_imaging_state(1, true);
        drop(bridge);

        dispatcher.run(&rx);
        assert_eq!(session.connection(), ConnectionState::Connected);
        assert!(session.imaging_running());
    }
}
