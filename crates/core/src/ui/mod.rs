pub mod known_faces_list;
pub mod notifications;
