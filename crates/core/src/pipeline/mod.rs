pub mod annotator_logger;
pub mod known_faces_use_case;
pub mod live_frame_annotator;
pub mod recognize_image_use_case;
pub mod request_dispatcher;
