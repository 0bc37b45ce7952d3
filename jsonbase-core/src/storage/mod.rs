// src/storage/mod.rs
//! Collection persistence

mod file_storage;
pub mod io;
mod memory_storage;
mod traits;

pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;
pub use traits::Storage;
