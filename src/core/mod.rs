// Core algorithm exports
pub mod dbscan;
pub mod error;
pub mod extract;
pub mod neighbors;
pub mod recommender;
pub mod summary;

pub use dbscan::Dbscan;
pub use error::ClusteringError;
pub use extract::{extract_tagged_records, to_tagged_record};
pub use neighbors::{build_neighbor_finder, GridIndex, LinearScan, NeighborFinder};
pub use recommender::Recommender;
pub use summary::{centroid, dominant_cluster, summarize, top_tags};
