//! Storage abstractions for service layer
//!
//! `KvStore` is the only seam the license service talks to; backends decide
//! whether the value lives in process memory, a local JSON file or a remote
//! KV REST endpoint.

pub mod kv_store;
pub mod memory;
pub mod json_file_store;
pub mod rest;

pub use json_file_store::JsonFileKvStore;
pub use kv_store::KvStore;
pub use memory::MemoryKvStore;
pub use rest::RestKvStore;
