//! Document records as seen by the analysis subsystem
//!
//! The document store owns many more fields (MIME type, size, tags...);
//! only the ones the analysis lifecycle reads or writes are modelled here.

mod record;
mod status;

pub use record::{Document, DocumentId, Review};
pub use status::DocumentStatus;
