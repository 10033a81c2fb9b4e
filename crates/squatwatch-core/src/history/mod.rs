// # History Store Implementations
//
// Implementations of the HistoryStore trait for different persistence
// strategies.

pub mod file;
pub mod memory;

pub use file::{FileHistoryStore, FileHistoryStoreFactory};
pub use memory::{MemoryHistoryStore, MemoryHistoryStoreFactory};
