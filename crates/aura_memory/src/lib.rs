pub mod compressor;
pub mod profile;
pub mod sqlite;
pub mod store;

pub use compressor::MemoryCompressor;
pub use profile::{ProfileDefaults, ProfileStore, CENTRAL_RECORD};
pub use sqlite::SqliteStore;
pub use store::InMemoryStore;
