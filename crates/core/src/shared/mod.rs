pub mod client_config;
pub mod constants;
pub mod detection;
pub mod encoded_image;
pub mod error;
pub mod frame;
pub mod known_face;
