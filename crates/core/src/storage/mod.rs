#[cfg(not(target_arch = "wasm32"))]
pub mod file;
pub mod memory;
pub mod traits;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::KeyValueStore;
