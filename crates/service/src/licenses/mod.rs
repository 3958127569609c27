//! License records and the admin-gated service that mutates them.

pub mod domain;
pub mod service;

pub use domain::{AddLicenseInput, DeleteLicenseInput, License, MutationRequest};
pub use service::{DeleteOutcome, LicenseService, MutationOutcome};
