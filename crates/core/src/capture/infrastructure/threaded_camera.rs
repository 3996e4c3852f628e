use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::capture::domain::camera::{CameraProvider, CameraStream, CaptureRequest};
use crate::shared::error::ClientError;
use crate::shared::frame::Frame;

const DEFAULT_CHANNEL_CAPACITY: usize = 2;
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Decodes camera frames on a dedicated thread so render ticks never wait
/// on the device.
///
/// Layout: `camera thread → bounded channel → read_frame`
///
/// Reads return the newest decoded frame, or repeat the previous one when
/// the camera has not produced a new frame since the last call. Before the
/// first frame arrives `try_read_frame` returns `Ok(None)`, and
/// `read_frame` waits for it. Either fails once the camera has been silent
/// for the first-frame timeout.
pub struct ThreadedCameraProvider {
    inner: Box<dyn CameraProvider>,
    channel_capacity: usize,
    first_frame_timeout: Duration,
}

impl ThreadedCameraProvider {
    pub fn new(inner: Box<dyn CameraProvider>) -> Self {
        Self {
            inner,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            first_frame_timeout: FIRST_FRAME_TIMEOUT,
        }
    }

    pub fn with_first_frame_timeout(mut self, timeout: Duration) -> Self {
        self.first_frame_timeout = timeout;
        self
    }
}

impl CameraProvider for ThreadedCameraProvider {
    fn open(&self, request: &CaptureRequest) -> Result<Box<dyn CameraStream>, ClientError> {
        let stream = self.inner.open(request)?;
        let resolution = stream.resolution();
        let (frame_tx, frame_rx) = crossbeam_channel::bounded(self.channel_capacity);
        let cancelled = Arc::new(AtomicBool::new(false));
        let handle = spawn_reader(stream, frame_tx, cancelled.clone())?;

        Ok(Box::new(ThreadedCameraStream {
            frames: Some(frame_rx),
            handle: Some(handle),
            cancelled,
            resolution,
            last: None,
            opened_at: Instant::now(),
            first_frame_timeout: self.first_frame_timeout,
        }))
    }
}

fn spawn_reader(
    mut stream: Box<dyn CameraStream>,
    frame_tx: Sender<Result<Frame, ClientError>>,
    cancelled: Arc<AtomicBool>,
) -> Result<JoinHandle<()>, ClientError> {
    thread::Builder::new()
        .name("facelens-camera".to_string())
        .spawn(move || {
            while !cancelled.load(Ordering::Relaxed) {
                let result = stream.read_frame();
                let failed = result.is_err();
                if frame_tx.send(result).is_err() || failed {
                    break;
                }
            }
            stream.close();
        })
        .map_err(|e| ClientError::DeviceError(format!("failed to spawn camera thread: {e}")))
}

pub struct ThreadedCameraStream {
    frames: Option<Receiver<Result<Frame, ClientError>>>,
    handle: Option<JoinHandle<()>>,
    cancelled: Arc<AtomicBool>,
    resolution: (u32, u32),
    last: Option<Frame>,
    opened_at: Instant,
    first_frame_timeout: Duration,
}

impl ThreadedCameraStream {
    fn frames(&self) -> Result<&Receiver<Result<Frame, ClientError>>, ClientError> {
        self.frames
            .as_ref()
            .ok_or_else(|| ClientError::DeviceError("camera stream is closed".into()))
    }

    fn reader_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Takes the newest queued frame, falling back to the last one shown.
    fn take_newest(
        &mut self,
        mut newest: Option<Result<Frame, ClientError>>,
    ) -> Result<Option<Frame>, ClientError> {
        if let Ok(frames) = self.frames() {
            while let Ok(result) = frames.try_recv() {
                newest = Some(result);
            }
        }
        match newest {
            Some(Ok(frame)) => {
                self.last = Some(frame.clone());
                Ok(Some(frame))
            }
            Some(Err(e)) => Err(e),
            None => match &self.last {
                Some(frame) if !self.reader_finished() => Ok(Some(frame.clone())),
                Some(_) => Err(ClientError::DeviceError("camera stream ended".into())),
                None => Ok(None),
            },
        }
    }
}

impl CameraStream for ThreadedCameraStream {
    fn read_frame(&mut self) -> Result<Frame, ClientError> {
        let first = match &self.last {
            Some(_) => None,
            None => {
                let remaining = self.first_frame_timeout.saturating_sub(self.opened_at.elapsed());
                match self.frames()?.recv_timeout(remaining) {
                    Ok(result) => Some(result),
                    Err(RecvTimeoutError::Timeout) => {
                        return Err(ClientError::DeviceError("camera produced no frames".into()))
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        return Err(ClientError::DeviceError("camera stream ended".into()))
                    }
                }
            }
        };
        self.take_newest(first)?
            .ok_or_else(|| ClientError::DeviceError("camera stream ended".into()))
    }

    fn try_read_frame(&mut self) -> Result<Option<Frame>, ClientError> {
        self.frames()?;
        match self.take_newest(None)? {
            Some(frame) => Ok(Some(frame)),
            None if self.reader_finished() => {
                Err(ClientError::DeviceError("camera stream ended".into()))
            }
            None if self.opened_at.elapsed() >= self.first_frame_timeout => {
                Err(ClientError::DeviceError("camera produced no frames".into()))
            }
            None => Ok(None),
        }
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Stops the camera thread and waits for it to release the device.
    fn close(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        // Unblocks a reader waiting on a full channel.
        self.frames = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Camera thread panicked");
            }
        }
        self.last = None;
    }
}

impl Drop for ThreadedCameraStream {
    fn drop(&mut self) {
        self.close();
    }
}
