use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Submit every Nth rendered frame for recognition.
pub const DEFAULT_SAMPLE_INTERVAL: usize = 3;

pub const DEFAULT_CAPTURE_WIDTH: u32 = 640;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 480;
pub const DEFAULT_FRAME_RATE: u32 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// JPEG quality for sampled webcam frames (0-100).
pub const JPEG_QUALITY: u8 = 92;

pub const TOAST_DURATION: Duration = Duration::from_secs(5);

/// Upload formats the recognition service accepts.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

pub const SERVER_URL_ENV: &str = "FACELENS_SERVER_URL";
