pub mod geometry;
pub mod settings;
pub mod window;
