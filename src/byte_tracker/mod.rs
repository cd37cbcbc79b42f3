mod byte_tracker;
mod motion;
pub mod strack;

pub use crate::error::TrackError;
pub use crate::rect::Rect;
pub use byte_tracker::{partition_detections, ByteTracker};
pub use strack::{STrack, STrackState};
