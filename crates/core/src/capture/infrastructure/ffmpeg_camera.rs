use crate::capture::domain::camera::{CameraProvider, CameraStream, CaptureRequest};
use crate::shared::error::ClientError;
use crate::shared::frame::Frame;

const EPERM: i32 = 1;
const EACCES: i32 = 13;

/// Opens webcams through libavdevice (v4l2 on Linux, avfoundation on macOS,
/// dshow on Windows).
pub struct FfmpegCameraProvider;

impl FfmpegCameraProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FfmpegCameraProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraProvider for FfmpegCameraProvider {
    fn open(&self, request: &CaptureRequest) -> Result<Box<dyn CameraStream>, ClientError> {
        ffmpeg_next::init().map_err(|e| ClientError::DeviceError(e.to_string()))?;
        ffmpeg_next::device::register_all();

        let format_name = input_format_name();
        let format = ffmpeg_next::device::input::video()
            .find(|f| f.name() == format_name)
            .ok_or_else(|| {
                ClientError::DeviceError(format!("capture backend '{format_name}' not available"))
            })?;

        let device = match &request.device {
            Some(device) => device.clone(),
            None => default_device()?,
        };

        let mut options = ffmpeg_next::Dictionary::new();
        for (key, value) in capture_options(request) {
            options.set(key, &value);
        }

        log::info!(
            "Opening camera {device} via {format_name} at {}x{}",
            request.width,
            request.height
        );

        let ictx = match ffmpeg_next::format::open_with(
            &device,
            &ffmpeg_next::format::format::Format::Input(format),
            options,
        ) {
            Ok(ffmpeg_next::format::context::Context::Input(ictx)) => ictx,
            Ok(_) => {
                return Err(ClientError::DeviceError(format!(
                    "{device} did not open as an input"
                )))
            }
            Err(e) => return Err(classify_open_error(&device, e)),
        };

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| ClientError::DeviceError(format!("{device} has no video stream")))?;
        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| ClientError::DeviceError(e.to_string()))?;
        let decoder = codec_ctx
            .decoder()
            .video()
            .map_err(|e| ClientError::DeviceError(e.to_string()))?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg_next::format::Pixel::RGB24,
            request.width,
            request.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| ClientError::DeviceError(e.to_string()))?;

        Ok(Box::new(FfmpegCameraStream {
            ictx: Some(ictx),
            decoder: Some(decoder),
            scaler: Some(scaler),
            stream_index,
            width: request.width,
            height: request.height,
            frame_index: 0,
        }))
    }
}

/// A live camera input. Frames are scaled to the requested resolution.
pub struct FfmpegCameraStream {
    ictx: Option<ffmpeg_next::format::context::Input>,
    decoder: Option<ffmpeg_next::decoder::Video>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    stream_index: usize,
    width: u32,
    height: u32,
    frame_index: u64,
}

// Safety: the stream is owned by one annotator and only touched from the
// thread that drives it. The raw pointers inside ffmpeg types are not shared.
unsafe impl Send for FfmpegCameraStream {}

impl CameraStream for FfmpegCameraStream {
    fn read_frame(&mut self) -> Result<Frame, ClientError> {
        let (Some(ictx), Some(decoder), Some(scaler)) = (
            self.ictx.as_mut(),
            self.decoder.as_mut(),
            self.scaler.as_mut(),
        ) else {
            return Err(ClientError::DeviceError("camera stream is closed".into()));
        };

        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        loop {
            if decoder.receive_frame(&mut decoded).is_ok() {
                let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
                scaler
                    .run(&decoded, &mut rgb_frame)
                    .map_err(|e| ClientError::DeviceError(e.to_string()))?;
                let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
                let frame = Frame::new(pixels, self.width, self.height, self.frame_index);
                self.frame_index += 1;
                return Ok(frame);
            }

            let Some((stream, packet)) = ictx.packets().next() else {
                return Err(ClientError::DeviceError("camera stream ended".into()));
            };
            if stream.index() != self.stream_index {
                continue;
            }
            if let Err(e) = decoder.send_packet(&packet) {
                log::debug!("Dropping undecodable camera packet: {e}");
            }
        }
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn close(&mut self) {
        if self.ictx.is_some() {
            log::info!("Releasing camera");
        }
        self.scaler = None;
        self.decoder = None;
        self.ictx = None;
    }
}

impl Drop for FfmpegCameraStream {
    fn drop(&mut self) {
        self.close();
    }
}

fn input_format_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "avfoundation"
    } else if cfg!(target_os = "windows") {
        "dshow"
    } else {
        "v4l2"
    }
}

fn default_device() -> Result<String, ClientError> {
    if cfg!(target_os = "macos") {
        Ok("0".to_string())
    } else if cfg!(target_os = "windows") {
        Err(ClientError::DeviceError(
            "no default camera on Windows; set camera_device to \"video=<name>\"".into(),
        ))
    } else {
        Ok("/dev/video0".to_string())
    }
}

fn capture_options(request: &CaptureRequest) -> Vec<(&'static str, String)> {
    vec![
        ("video_size", format!("{}x{}", request.width, request.height)),
        ("framerate", request.frame_rate.to_string()),
    ]
}

fn classify_open_error(device: &str, error: ffmpeg_next::Error) -> ClientError {
    match error {
        ffmpeg_next::Error::Other { errno } if errno == EACCES || errno == EPERM => {
            ClientError::PermissionDenied(format!("{device}: {error}"))
        }
        _ => ClientError::DeviceError(format!("{device}: {error}")),
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// stripping per-row stride padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CaptureRequest {
        CaptureRequest {
            width: 640,
            height: 480,
            frame_rate: 30,
            device: None,
        }
    }

    #[test]
    fn test_capture_options_carry_size_and_rate() {
        let opts = capture_options(&request());
        assert_eq!(
            opts,
            vec![
                ("video_size", "640x480".to_string()),
                ("framerate", "30".to_string())
            ]
        );
    }

    #[test]
    fn test_access_errors_map_to_permission_denied() {
        let err = classify_open_error("/dev/video0", ffmpeg_next::Error::Other { errno: EACCES });
        assert!(matches!(err, ClientError::PermissionDenied(_)));
        let err = classify_open_error("/dev/video0", ffmpeg_next::Error::Other { errno: EPERM });
        assert!(matches!(err, ClientError::PermissionDenied(_)));
    }

    #[test]
    fn test_other_errors_map_to_device_error() {
        let err = classify_open_error("/dev/video9", ffmpeg_next::Error::Other { errno: 2 });
        assert!(matches!(err, ClientError::DeviceError(_)));
        let err = classify_open_error("/dev/video9", ffmpeg_next::Error::Eof);
        assert!(matches!(err, ClientError::DeviceError(_)));
    }

    #[test]
    fn test_extract_rgb_pixels_strips_padding() {
        let mut frame =
            ffmpeg_next::util::frame::video::Video::new(ffmpeg_next::format::Pixel::RGB24, 2, 2);
        let stride = frame.stride(0);
        let data = frame.data_mut(0);
        for row in 0..2 {
            for col in 0..2 {
                let offset = row * stride + col * 3;
                data[offset] = (row * 2 + col) as u8;
                data[offset + 1] = 0;
                data[offset + 2] = 0;
            }
        }

        let pixels = extract_rgb_pixels(&frame, 2, 2);
        assert_eq!(pixels.len(), 12);
        assert_eq!(pixels[0], 0);
        assert_eq!(pixels[3], 1);
        assert_eq!(pixels[6], 2);
        assert_eq!(pixels[9], 3);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_missing_device_is_device_error() {
        let provider = FfmpegCameraProvider::new();
        let req = CaptureRequest {
            device: Some("/dev/video-does-not-exist".to_string()),
            ..request()
        };
        match provider.open(&req) {
            Err(ClientError::DeviceError(_)) => {}
            Err(other) => panic!("expected DeviceError, got {other:?}"),
            Ok(_) => panic!("nonexistent device opened"),
        }
    }
}
