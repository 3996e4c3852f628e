use crate::shared::error::ClientError;
use crate::shared::frame::Frame;

/// What to ask the camera for. Audio is never requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureRequest {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    /// Platform device identifier; `None` selects the default camera.
    pub device: Option<String>,
}

/// Acquires camera streams.
///
/// Fails with [`ClientError::PermissionDenied`] when the OS refuses access
/// and [`ClientError::DeviceError`] for missing or broken hardware.
pub trait CameraProvider: Send {
    fn open(&self, request: &CaptureRequest) -> Result<Box<dyn CameraStream>, ClientError>;
}

/// An open camera. Dropping the stream releases the device.
pub trait CameraStream: Send {
    /// Blocks until the next frame is decoded.
    fn read_frame(&mut self) -> Result<Frame, ClientError>;

    /// Like [`read_frame`](Self::read_frame), but returns `Ok(None)` instead
    /// of waiting when no frame is available yet. Streams that decode on the
    /// caller's thread simply read.
    fn try_read_frame(&mut self) -> Result<Option<Frame>, ClientError> {
        self.read_frame().map(Some)
    }

    fn resolution(&self) -> (u32, u32);

    /// Releases the device early. Idempotent.
    fn close(&mut self);
}
