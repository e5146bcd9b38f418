pub mod file;
pub mod memory;

pub use file::{FileStorage, FileStorageOptions};
pub use memory::MemoryStorage;
