pub mod add_face_tab;
pub mod known_faces_tab;
pub mod recognize_tab;
pub mod webcam_tab;
