pub mod document;
pub mod ops;
pub mod patch;

pub use document::Document;
pub(crate) use ops::build_delta;
pub use ops::{EditOperation, Plan, normalize};
pub use patch::Patch;
