pub mod compositor;
pub mod geometry;
pub mod headless;
pub mod scale;
