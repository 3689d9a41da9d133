//! Record storage
//!
//! The store owns the memory records; everything else in the system holds
//! id back-references only.

mod store;

pub use store::{MemoryStore, Page, TenantStats};
