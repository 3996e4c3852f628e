pub mod http_face_service;
pub mod jpeg_encoder;
mod wire;
