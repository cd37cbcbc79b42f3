pub mod byte_tracker;
pub mod centroid_tracker;
pub mod config;
pub mod detection;
pub mod error;
pub mod matching;
pub mod pipeline;
pub mod reconcile;
pub mod rect;
pub mod tracker;

mod lapjv;

pub use byte_tracker::ByteTracker;
pub use centroid_tracker::CentroidTracker;
pub use config::{ByteTrackConfig, CentroidConfig, PipelineConfig};
pub use detection::Detection;
pub use error::TrackError;
pub use pipeline::{BlobPipeline, FrameResult, TrackerKind};
pub use reconcile::{reconcile, Shape, TrackedBlob};
pub use rect::Rect;
pub use tracker::{MultiObjectTracker, TrackedObject, TrackerStats};
