pub mod annotator;
pub mod gravity;
pub mod traits;
pub mod transform;
pub mod types;
