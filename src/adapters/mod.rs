// Adapters layer: concrete implementations of the content store port.

pub mod memory_store;

pub use memory_store::MemoryStore;
