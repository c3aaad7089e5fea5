pub mod cache;
pub mod content;

pub use cache::HashCache;
pub use content::{hash_bytes, hash_file};
