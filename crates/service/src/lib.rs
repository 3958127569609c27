//! Service layer for the license panel.
//! - `storage`: the key-value seam and its memory / file / REST backends.
//! - `licenses`: record types, id validation and the admin-gated mutations.

pub mod errors;
pub mod storage;
pub mod licenses;

pub use errors::ServiceError;
