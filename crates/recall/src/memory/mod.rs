//! Memory data model
//!
//! Record types, graph edge types, and listing filters.

pub mod filter;
pub mod types;

pub use filter::ListFilter;
pub use types::{
    Direction, Edge, EdgeType, Memory, MemoryId, MemoryPatch, MemoryType, NewMemory,
    RelatedMemory,
};
