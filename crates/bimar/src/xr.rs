//! Scripted XR session: replays marker tracking from a JSON file.
//!
//! ```json
//! {
//!   "reference_space": "local",
//!   "image_scores": ["trackable"],
//!   "repeat": true,
//!   "frames": [
//!     { "results": [ { "image_index": 0, "state": "tracked",
//!                      "pose": [1,0,0,0, 0,1,0,0, 0,0,1,-2, 0,0,0,1] } ] },
//!     { "results": [] }
//!   ]
//! }
//! ```
//!
//! Poses are row-major, as an XR runtime delivers them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use bimar_core::{
    ImageTrackingScore, RawPose, ReferenceSpace, TrackingResult, TrackingState, XrFrame, XrSession,
};

use crate::error::{BimarError, Result};

/// One marker entry of a scripted frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedResult {
    pub image_index: u32,
    pub state: TrackingState,
    /// Row-major pose; absent when the runtime has none.
    #[serde(default)]
    pub pose: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct FrameScript {
    #[serde(default)]
    results: Vec<ScriptedResult>,
}

/// A recorded XR frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptedFrame {
    results: Vec<TrackingResult>,
    poses: Vec<Option<RawPose>>,
}

impl ScriptedFrame {
    pub fn new(entries: impl IntoIterator<Item = ScriptedResult>) -> Self {
        let mut frame = Self::default();
        for entry in entries {
            frame.results.push(TrackingResult {
                image_index: entry.image_index,
                state: entry.state,
            });
            frame.poses.push(entry.pose.map(RawPose::new));
        }
        frame
    }
}

impl XrFrame for ScriptedFrame {
    fn tracking_results(&self) -> &[TrackingResult] {
        &self.results
    }

    /// Scripted poses are already expressed in the session's reference space.
    fn pose(&self, result: &TrackingResult, _reference: ReferenceSpace) -> Option<RawPose> {
        self.results
            .iter()
            .position(|r| r == result)
            .and_then(|i| self.poses.get(i).cloned().flatten())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionScript {
    #[serde(default)]
    reference_space: ReferenceSpace,
    #[serde(default)]
    image_scores: Vec<ImageTrackingScore>,
    #[serde(default)]
    repeat: bool,
    #[serde(default)]
    frames: Vec<FrameScript>,
}

/// An image-tracking session backed by a recorded script.
#[derive(Debug, Clone)]
pub struct ScriptedSession {
    reference_space: ReferenceSpace,
    image_scores: Vec<ImageTrackingScore>,
    repeat: bool,
    frames: Vec<ScriptedFrame>,
}

impl ScriptedSession {
    pub fn new(
        reference_space: ReferenceSpace,
        image_scores: Vec<ImageTrackingScore>,
        frames: Vec<ScriptedFrame>,
    ) -> Self {
        Self {
            reference_space,
            image_scores,
            repeat: false,
            frames,
        }
    }

    /// Replays the frames in a loop instead of ending after the last one.
    #[must_use]
    pub fn repeating(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let script: SessionScript = serde_json::from_str(text)?;
        Ok(Self {
            reference_space: script.reference_space,
            image_scores: script.image_scores,
            repeat: script.repeat,
            frames: script
                .frames
                .into_iter()
                .map(|frame| ScriptedFrame::new(frame.results))
                .collect(),
        })
    }

    /// Reads a session script from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| BimarError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let session = Self::from_json(&text).map_err(|source| BimarError::Script {
            path: path.display().to_string(),
            source,
        })?;
        log::info!(
            "tracking script {} loaded: {} frames",
            path.display(),
            session.frames.len()
        );
        Ok(session)
    }

    /// Frame for the `index`-th rendered frame, or `None` once a
    /// non-repeating script has ended.
    pub fn frame(&self, index: usize) -> Option<&ScriptedFrame> {
        if self.frames.is_empty() {
            return None;
        }
        if self.repeat {
            self.frames.get(index % self.frames.len())
        } else {
            self.frames.get(index)
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl XrSession for ScriptedSession {
    fn reference_space(&self) -> ReferenceSpace {
        self.reference_space
    }

    fn tracked_image_scores(&self) -> Vec<ImageTrackingScore> {
        self.image_scores.clone()
    }
}
