pub mod similarity;
pub mod snapshot;
pub mod store;

pub use store::{StoreStats, VectorStore};
