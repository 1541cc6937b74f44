mod qdrant;
mod serper;

pub use qdrant::QdrantIndex;
pub use serper::SerperClient;
