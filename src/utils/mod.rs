pub mod content_guard;
pub mod pdf;
