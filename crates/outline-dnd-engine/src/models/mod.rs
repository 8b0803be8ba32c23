pub mod document_ref;

pub use document_ref::DocumentRef;
