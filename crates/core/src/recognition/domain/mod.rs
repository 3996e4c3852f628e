pub mod face_service;
