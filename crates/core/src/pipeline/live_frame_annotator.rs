use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use crate::annotation::domain::drawing_surface::DrawingSurface;
use crate::annotation::domain::overlay::{draw_detections, OverlayStyle};
use crate::capture::domain::camera::{CameraProvider, CameraStream, CaptureRequest};
use crate::pipeline::annotator_logger::{AnnotatorLogger, NullAnnotatorLogger, ResponseDisposition};
use crate::pipeline::request_dispatcher::RequestDispatcher;
use crate::recognition::domain::face_service::{FaceRecognitionService, RecognitionOutcome};
use crate::recognition::infrastructure::jpeg_encoder::encode_jpeg;
use crate::shared::client_config::ClientConfig;
use crate::shared::constants::{
    DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH, DEFAULT_FRAME_RATE, DEFAULT_SAMPLE_INTERVAL,
    JPEG_QUALITY,
};
use crate::shared::detection::Detection;
use crate::shared::error::ClientError;
use crate::shared::frame::Frame;

/// Tunables for a [`LiveFrameAnnotator`].
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatorConfig {
    /// Submit every K-th rendered frame for recognition. Must be at least 1.
    pub sample_interval: usize,
    pub capture: CaptureRequest,
    pub jpeg_quality: u8,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            capture: CaptureRequest {
                width: DEFAULT_CAPTURE_WIDTH,
                height: DEFAULT_CAPTURE_HEIGHT,
                frame_rate: DEFAULT_FRAME_RATE,
                device: None,
            },
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

impl AnnotatorConfig {
    pub fn from_client_config(config: &ClientConfig) -> Self {
        Self {
            sample_interval: config.sample_interval,
            capture: CaptureRequest {
                width: config.capture_width,
                height: config.capture_height,
                frame_rate: config.frame_rate,
                device: config.camera_device.clone(),
            },
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnotatorState {
    Idle,
    Running,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Result of one render step.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// Not running; nothing was drawn or submitted.
    Idle,
    /// Running, but the camera has not delivered its first frame yet.
    /// Nothing was drawn and the frame counter did not move.
    Warming,
    /// A frame was drawn. `failed` carries the most recent recognition
    /// failure drained during this step, for transient display.
    Rendered {
        submitted: bool,
        failed: Option<ClientError>,
    },
    /// The camera stopped delivering frames; the session was torn down.
    Ended(ClientError),
}

/// Everything that belongs to one start..stop cycle.
struct CaptureSession {
    id: u64,
    stream: Box<dyn CameraStream>,
    frame_counter: u64,
    last_displayed_tag: u64,
    overlay: Vec<Detection>,
    last_frame: Option<Frame>,
}

/// A finished recognition request, tagged with the frame it was taken from.
struct Submission {
    session_id: u64,
    tag: u64,
    latency: Duration,
    result: Result<RecognitionOutcome, ClientError>,
}

/// Renders the live camera feed and overlays recognition results.
///
/// A cooperative state machine (`Idle -> Running -> Idle`) driven by the
/// caller's event loop: call [`tick`](Self::tick) once per display refresh.
/// Every K-th frame is JPEG-encoded and submitted through the dispatcher;
/// results come back over a channel and are applied on the next tick, so
/// the surface is only ever touched from the caller's thread.
///
/// Each submission is tagged with its session id and frame counter. A
/// response is drawn only if it belongs to the current session and is
/// newer than the overlay already on screen.
pub struct LiveFrameAnnotator {
    config: AnnotatorConfig,
    style: OverlayStyle,
    camera: Box<dyn CameraProvider>,
    service: Arc<dyn FaceRecognitionService>,
    dispatcher: Box<dyn RequestDispatcher>,
    logger: Box<dyn AnnotatorLogger>,
    surface: Weak<Mutex<dyn DrawingSurface>>,
    session: Option<CaptureSession>,
    next_session_id: u64,
    in_flight: usize,
    results_tx: Sender<Submission>,
    results_rx: Receiver<Submission>,
}

impl LiveFrameAnnotator {
    /// The annotator keeps only a weak handle on `surface`; the caller owns it.
    pub fn new<S: DrawingSurface + 'static>(
        config: AnnotatorConfig,
        camera: Box<dyn CameraProvider>,
        service: Arc<dyn FaceRecognitionService>,
        dispatcher: Box<dyn RequestDispatcher>,
        surface: &Arc<Mutex<S>>,
    ) -> Result<Self, ClientError> {
        if config.sample_interval == 0 {
            return Err(ClientError::Validation(
                "sample interval must be at least 1".to_string(),
            ));
        }
        let surface: Arc<Mutex<dyn DrawingSurface>> = surface.clone();
        let (results_tx, results_rx) = crossbeam_channel::unbounded();
        Ok(Self {
            config,
            style: OverlayStyle::default(),
            camera,
            service,
            dispatcher,
            logger: Box::new(NullAnnotatorLogger),
            surface: Arc::downgrade(&surface),
            session: None,
            next_session_id: 0,
            in_flight: 0,
            results_tx,
            results_rx,
        })
    }

    pub fn with_logger(mut self, logger: Box<dyn AnnotatorLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    pub fn state(&self) -> AnnotatorState {
        if self.session.is_some() {
            AnnotatorState::Running
        } else {
            AnnotatorState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Frames rendered in the current session; 0 while idle.
    pub fn frame_count(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.frame_counter)
    }

    /// Submissions dispatched but not yet drained.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Opens the camera and enters `Running`. A no-op while already running.
    ///
    /// On failure the annotator stays `Idle` and the error is returned for
    /// display.
    pub fn start(&mut self) -> Result<StartOutcome, ClientError> {
        if self.session.is_some() {
            return Ok(StartOutcome::AlreadyRunning);
        }
        let Some(surface) = self.surface.upgrade() else {
            let err = ClientError::DeviceError("drawing surface is no longer available".into());
            self.logger.error(&err);
            return Err(err);
        };

        let stream = match self.camera.open(&self.config.capture) {
            Ok(stream) => stream,
            Err(e) => {
                self.logger.error(&e);
                return Err(e);
            }
        };
        let (width, height) = stream.resolution();

        {
            let mut surface = surface.lock().unwrap_or_else(PoisonError::into_inner);
            surface.clear();
            surface.set_visible(true);
        }

        self.next_session_id += 1;
        self.session = Some(CaptureSession {
            id: self.next_session_id,
            stream,
            frame_counter: 0,
            last_displayed_tag: 0,
            overlay: Vec::new(),
            last_frame: None,
        });
        self.logger.info(&format!(
            "Camera started at {width}x{height}, sampling every {} frame(s)",
            self.config.sample_interval
        ));
        Ok(StartOutcome::Started)
    }

    /// Releases the camera, clears and hides the surface, and returns to
    /// `Idle`. Requests still in flight are discarded when they land.
    /// Safe to call while idle.
    pub fn stop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        session.stream.close();
        let frames = session.frame_counter;
        drop(session);

        if let Some(surface) = self.surface.upgrade() {
            let mut surface = surface.lock().unwrap_or_else(PoisonError::into_inner);
            surface.clear();
            surface.set_visible(false);
        }
        self.logger.info(&format!("Camera stopped after {frames} frame(s)"));
        self.logger.summary();
    }

    /// One render step: apply finished responses, draw the next camera
    /// frame with the current overlay, and submit every K-th frame.
    pub fn tick(&mut self) -> TickOutcome {
        if self.session.is_none() {
            return TickOutcome::Idle;
        }
        let (_, failed) = self.drain_responses();

        let read = match self.session.as_mut() {
            Some(session) => session.stream.try_read_frame(),
            None => return TickOutcome::Idle,
        };
        let frame = match read {
            Ok(Some(frame)) => frame,
            Ok(None) => return TickOutcome::Warming,
            Err(e) => {
                self.logger.error(&e);
                self.stop();
                return TickOutcome::Ended(e);
            }
        };

        let draw_start = Instant::now();
        if !self.paint(&frame) {
            self.logger.info("Drawing surface released, stopping camera");
            self.stop();
            return TickOutcome::Idle;
        }
        self.logger.timing("draw", draw_start.elapsed().as_secs_f64() * 1000.0);

        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Idle;
        };
        session.frame_counter += 1;
        let tag = session.frame_counter;
        let session_id = session.id;

        let submitted = tag % self.config.sample_interval as u64 == 0
            && self.submit(session_id, tag, frame.clone());

        if let Some(session) = self.session.as_mut() {
            session.last_frame = Some(frame);
        }
        TickOutcome::Rendered { submitted, failed }
    }

    /// Applies finished responses without waiting for the next tick.
    ///
    /// If a newer overlay was accepted, the last drawn frame is repainted
    /// with it. Returns the most recent failure, if any.
    pub fn poll_responses(&mut self) -> Option<ClientError> {
        let (changed, failed) = self.drain_responses();
        if changed {
            let last = self.session.as_ref().and_then(|s| s.last_frame.clone());
            if let Some(frame) = last {
                self.paint(&frame);
            }
        }
        failed
    }

    fn submit(&mut self, session_id: u64, tag: u64, frame: Frame) -> bool {
        let service = Arc::clone(&self.service);
        let tx = self.results_tx.clone();
        let quality = self.config.jpeg_quality;
        let submitted_at = Instant::now();

        let job = Box::new(move || {
            let result = encode_jpeg(&frame, quality).and_then(|jpeg| service.recognize(&jpeg));
            // The annotator may be gone by now; nothing left to report to.
            let _ = tx.send(Submission {
                session_id,
                tag,
                latency: submitted_at.elapsed(),
                result,
            });
        });

        match self.dispatcher.dispatch(job) {
            Ok(()) => {
                self.in_flight += 1;
                self.logger.submitted(tag);
                true
            }
            Err(e) => {
                self.logger.error(&e);
                false
            }
        }
    }

    /// Returns whether the overlay changed and the last failure seen.
    fn drain_responses(&mut self) -> (bool, Option<ClientError>) {
        let mut changed = false;
        let mut failed = None;

        while let Ok(submission) = self.results_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            let latency_ms = submission.latency.as_secs_f64() * 1000.0;

            let Some(session) = self
                .session
                .as_mut()
                .filter(|s| s.id == submission.session_id)
            else {
                self.logger.response(ResponseDisposition::Orphaned, latency_ms);
                continue;
            };

            let outcome = match submission.result {
                Ok(RecognitionOutcome {
                    error: Some(message),
                    ..
                }) => Err(ClientError::Protocol(format!(
                    "service could not process frame: {message}"
                ))),
                other => other,
            };

            match outcome {
                Err(e) => {
                    self.logger.response(ResponseDisposition::Failed, latency_ms);
                    self.logger.error(&e);
                    failed = Some(e);
                }
                Ok(_) if submission.tag <= session.last_displayed_tag => {
                    self.logger.response(ResponseDisposition::Stale, latency_ms);
                }
                Ok(outcome) => {
                    session.last_displayed_tag = submission.tag;
                    session.overlay = outcome.faces;
                    changed = true;
                    self.logger.response(ResponseDisposition::Displayed, latency_ms);
                }
            }
        }
        (changed, failed)
    }

    /// Draws `frame` and the current overlay. Returns false when the
    /// surface has been dropped by its owner.
    fn paint(&self, frame: &Frame) -> bool {
        let Some(surface) = self.surface.upgrade() else {
            return false;
        };
        let overlay = self.session.as_ref().map_or(&[] as &[Detection], |s| s.overlay.as_slice());
        let mut surface = surface.lock().unwrap_or_else(PoisonError::into_inner);
        surface.draw_frame(frame);
        draw_detections(&mut *surface, overlay, &self.style);
        true
    }
}

impl Drop for LiveFrameAnnotator {
    fn drop(&mut self) {
        self.stop();
    }
}
