pub mod shadow_style;
pub mod tracked;

pub use tracked::TrackedWindow;
