pub mod ffmpeg_camera;
pub mod threaded_camera;
