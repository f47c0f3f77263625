use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Coordinate frame id and acquisition time shared by an image/cloud pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameHeader {
    pub frame_id: String,
    pub stamp: SystemTime,
}

impl FrameHeader {
    pub fn new(frame_id: impl Into<String>, stamp: SystemTime) -> Self {
        Self {
            frame_id: frame_id.into(),
            stamp,
        }
    }

    /// Header for `frame_id` stamped with the current wall-clock time.
    pub fn now(frame_id: impl Into<String>) -> Self {
        Self::new(frame_id, SystemTime::now())
    }

    /// Same frame id, new stamp.
    pub fn restamped(&self, stamp: SystemTime) -> Self {
        Self::new(self.frame_id.clone(), stamp)
    }
}
