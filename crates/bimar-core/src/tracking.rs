//! Marker tracking: XR frame boundary and the pose tracker.

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Tracking state of one marker image in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingState {
    /// The image is currently seen by the camera.
    Tracked,
    /// The pose is extrapolated from earlier frames.
    Emulated,
    Untrackable,
}

/// Whether the runtime can track a configured image at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageTrackingScore {
    Trackable,
    Untrackable,
}

/// One marker's record for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingResult {
    /// Index of the image in the session's tracked-image list.
    pub image_index: u32,
    pub state: TrackingState,
}

/// Pose payload as delivered by the runtime: a row-major 4x4 matrix.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawPose {
    pub matrix: Vec<f32>,
}

impl RawPose {
    pub fn new(matrix: Vec<f32>) -> Self {
        Self { matrix }
    }

    /// Builds a pose from a column-major matrix.
    pub fn from_mat4(matrix: Mat4) -> Self {
        Self {
            matrix: matrix.transpose().to_cols_array().to_vec(),
        }
    }

    /// Decodes the matrix, failing unless exactly 16 elements are present.
    pub fn to_mat4(&self, image_index: u32) -> Result<Mat4> {
        let elements: &[f32; 16] =
            self.matrix
                .as_slice()
                .try_into()
                .map_err(|_| CoreError::MalformedPose {
                    image_index,
                    len: self.matrix.len(),
                })?;
        // Row-major input read as columns, then flipped.
        Ok(Mat4::from_cols_array(elements).transpose())
    }
}

/// Coordinate space poses are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceSpace {
    #[default]
    Local,
    LocalFloor,
    Viewer,
}

/// Per-frame view of an XR runtime.
pub trait XrFrame {
    /// Tracking results in runtime order.
    fn tracking_results(&self) -> &[TrackingResult];

    /// Pose of the result's image relative to `reference`.
    fn pose(&self, result: &TrackingResult, reference: ReferenceSpace) -> Option<RawPose>;
}

/// Session-level view of an XR runtime.
pub trait XrSession {
    fn reference_space(&self) -> ReferenceSpace;

    /// One score per configured image, in configuration order.
    fn tracked_image_scores(&self) -> Vec<ImageTrackingScore>;
}

/// Number of configured images the runtime can track.
pub fn count_trackable_images(scores: &[ImageTrackingScore]) -> usize {
    scores
        .iter()
        .filter(|score| **score != ImageTrackingScore::Untrackable)
        .count()
}

/// Which tracked result wins when several are tracked in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// The last tracked result in runtime order.
    #[default]
    LastTracked,
    /// The tracked result with the smallest image index.
    LowestImageIndex,
}

/// Updates the anchored model transform from marker poses.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseTracker {
    pub tie_break: TieBreak,
}

impl PoseTracker {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    /// Overwrites `target` with the pose of the winning tracked marker.
    ///
    /// Returns whether `target` was written. Without a frame, or without any
    /// tracked result, `target` is left untouched. A tracked result whose pose is
    /// missing or malformed fails the whole frame and `target` is not modified.
    pub fn update_pose(
        &self,
        target: &mut Mat4,
        frame: Option<&dyn XrFrame>,
        reference: ReferenceSpace,
    ) -> Result<bool> {
        let Some(frame) = frame else {
            return Ok(false);
        };

        let mut winner: Option<(u32, Mat4)> = None;
        for result in frame.tracking_results() {
            if result.state != TrackingState::Tracked {
                continue;
            }
            let pose = frame
                .pose(result, reference)
                .ok_or(CoreError::MissingPose {
                    image_index: result.image_index,
                })?;
            let matrix = pose.to_mat4(result.image_index)?;

            let replace = match (self.tie_break, winner) {
                (_, None) | (TieBreak::LastTracked, Some(_)) => true,
                (TieBreak::LowestImageIndex, Some((index, _))) => result.image_index < index,
            };
            if replace {
                winner = Some((result.image_index, matrix));
            }
        }

        match winner {
            Some((image_index, matrix)) => {
                log::debug!(
                    "model pose updated from marker {image_index}: {:?}",
                    matrix.w_axis.truncate()
                );
                *target = matrix;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
