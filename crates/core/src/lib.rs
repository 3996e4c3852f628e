pub mod annotation;
pub mod capture;
pub mod pipeline;
pub mod recognition;
pub mod shared;
pub mod ui;
