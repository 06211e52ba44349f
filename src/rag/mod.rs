//! Document indexing and retrieval.
//!
//! - `TextSplitter`: fixed-size overlapping character chunking
//! - `VectorStore` / `SqliteVectorStore`: embedded chunk persistence with
//!   brute-force cosine search
//! - `DocumentIndexer`: PDF text extraction -> chunking -> batched embed+insert
//! - `Retriever`: query embedding -> top-K search -> context serialization

pub mod indexer;
pub mod retriever;
pub mod splitter;
pub mod sqlite;
pub mod store;

pub use indexer::DocumentIndexer;
pub use retriever::Retriever;
pub use sqlite::SqliteVectorStore;
pub use store::VectorStore;
