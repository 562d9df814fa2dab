//! Hip facing orientation from four landmark joint positions.

use crate::error::FacingError;
use crate::types::{Index, Position, Quaternion};
use crate::utils::{self, is_degenerate};
use cgmath::{InnerSpace, Matrix3, One};
use serde::{Deserialize, Serialize};

pub use crate::utils::DEGENERATE_EPSILON;

/// Where the landmarks sit in a per-frame position list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkIndices {
    #[serde(default = "default_hip")]
    pub hip: Index,
    #[serde(default = "default_upper_spine")]
    pub upper_spine: Index,
    #[serde(default = "default_left_shoulder")]
    pub left_shoulder: Index,
    #[serde(default = "default_right_shoulder")]
    pub right_shoulder: Index,
}

fn default_hip() -> Index {
    0
}

fn default_upper_spine() -> Index {
    2
}

fn default_left_shoulder() -> Index {
    15
}

fn default_right_shoulder() -> Index {
    19
}

impl Default for LandmarkIndices {
    fn default() -> Self {
        Self {
            hip: default_hip(),
            upper_spine: default_upper_spine(),
            left_shoulder: default_left_shoulder(),
            right_shoulder: default_right_shoulder(),
        }
    }
}

impl LandmarkIndices {
    fn check(&self, len: usize) -> Result<(), FacingError> {
        for index in [self.hip, self.upper_spine, self.left_shoulder, self.right_shoulder] {
            if index >= len {
                return Err(FacingError::MissingLandmark { index, len });
            }
        }
        Ok(())
    }
}

/// Which guard replaced the result with the identity rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degeneracy {
    /// Hip and upper spine coincide.
    ZeroUp,
    /// Both shoulders coincide.
    ZeroShoulderSpan,
    /// Shoulder line runs along the spine.
    ShoulderParallelToUp,
    ZeroForward,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facing {
    pub quaternion: Quaternion,
    pub degeneracy: Option<Degeneracy>,
}

impl Facing {
    fn degenerate(reason: Degeneracy) -> Self {
        tracing::trace!(?reason, "Degenerate landmarks, using identity facing");
        Facing {
            quaternion: Quaternion::one(),
            degeneracy: Some(reason),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.degeneracy.is_some()
    }

    /// Components as `[x, y, z, w]`.
    pub fn to_xyzw(&self) -> [f64; 4] {
        utils::quat_to_xyzw(self.quaternion)
    }
}

/// Facing of the pelvis as the rotation taking +X to the right, +Y up the spine and
/// +Z forward.
///
/// Up runs from the hip to the upper spine, right from the left to the right shoulder
/// made orthogonal to up. Any near-zero vector along the way yields the identity rotation
/// together with the guard that fired; only landmark indices outside `landmarks` are errors.
pub fn compute_facing(
    landmarks: &[Position],
    indices: &LandmarkIndices,
) -> Result<Facing, FacingError> {
    indices.check(landmarks.len())?;

    let up = landmarks[indices.upper_spine] - landmarks[indices.hip];
    let up_len = up.magnitude();
    if is_degenerate(up_len) {
        return Ok(Facing::degenerate(Degeneracy::ZeroUp));
    }
    let up_hat = up / up_len;

    let raw_right = landmarks[indices.right_shoulder] - landmarks[indices.left_shoulder];
    if is_degenerate(raw_right.magnitude()) {
        return Ok(Facing::degenerate(Degeneracy::ZeroShoulderSpan));
    }

    // Gram-Schmidt
    let right = raw_right - up_hat * raw_right.dot(up_hat);
    let right_len = right.magnitude();
    if is_degenerate(right_len) {
        return Ok(Facing::degenerate(Degeneracy::ShoulderParallelToUp));
    }
    let right_hat = right / right_len;

    // right x up keeps the [right, up, forward] basis right handed
    let forward = right_hat.cross(up_hat);
    let forward_len = forward.magnitude();
    if is_degenerate(forward_len) {
        return Ok(Facing::degenerate(Degeneracy::ZeroForward));
    }
    let forward_hat = forward / forward_len;

    let frame = Matrix3::from_cols(right_hat, up_hat, forward_hat);
    Ok(Facing {
        quaternion: utils::matrix_to_quat(frame),
        degeneracy: None,
    })
}

/// Facing quaternion using the default landmark layout. Degenerate input gives identity.
pub fn compute_facing_quaternion(landmarks: &[Position]) -> Result<Quaternion, FacingError> {
    compute_facing(landmarks, &LandmarkIndices::default()).map(|facing| facing.quaternion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tests::{approx_eq_3, same_rotation};
    use cgmath::{Deg, Rotation, Rotation3, Zero};

    fn landmarks(hip: Position, spine: Position, left: Position, right: Position) -> Vec<Position> {
        let mut positions = vec![Position::zero(); 23];
        positions[0] = hip;
        positions[2] = spine;
        positions[15] = left;
        positions[19] = right;
        positions
    }

    fn canonical() -> Vec<Position> {
        landmarks(
            Position::new(0.0, 0.0, 0.0),
            Position::new(0.0, 1.0, 0.0),
            Position::new(-1.0, 1.0, 0.0),
            Position::new(1.0, 1.0, 0.0),
        )
    }

    #[test]
    fn canonical_frame_is_identity() {
        let q = compute_facing_quaternion(&canonical()).unwrap();
        assert!(same_rotation(q, Quaternion::one(), 1e-12));
    }

    #[test]
    fn turned_body_rotates_about_up() {
        let turn = Quaternion::from_angle_y(Deg(135.0));
        let rotated: Vec<Position> = canonical()
            .into_iter()
            .map(|p| turn.rotate_vector(p))
            .collect();
        let facing = compute_facing(&rotated, &LandmarkIndices::default()).unwrap();
        assert!(!facing.is_degenerate());
        assert!(same_rotation(facing.quaternion, turn, 1e-9));
    }

    #[test]
    fn frame_axes_follow_landmarks() {
        let positions = landmarks(
            Position::new(0.5, 1.0, 0.0),
            Position::new(0.5, 1.0, 2.0),
            Position::new(0.5, 3.0, 2.0),
            Position::new(0.5, -1.0, 2.5),
        );
        let q = compute_facing_quaternion(&positions).unwrap();
        // up along +Z, right along -Y after removing the spine component
        assert!(approx_eq_3(q.rotate_vector(Position::unit_y()), Position::unit_z(), 1e-9));
        assert!(approx_eq_3(
            q.rotate_vector(Position::unit_x()),
            Position::new(0.0, -1.0, 0.0),
            1e-9
        ));
        assert!((q.magnitude() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hip_on_spine_is_identity() {
        let positions = landmarks(
            Position::new(0.2, 1.0, 0.3),
            Position::new(0.2, 1.0, 0.3),
            Position::new(-1.0, 1.0, 0.0),
            Position::new(1.0, 1.0, 0.0),
        );
        let facing = compute_facing(&positions, &LandmarkIndices::default()).unwrap();
        assert_eq!(facing.quaternion, Quaternion::one());
        assert_eq!(facing.degeneracy, Some(Degeneracy::ZeroUp));
        assert!(facing.to_xyzw().iter().all(|c| c.is_finite()));
        assert_eq!(facing.to_xyzw(), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn coincident_shoulders_is_identity() {
        let positions = landmarks(
            Position::zero(),
            Position::new(0.0, 1.0, 0.0),
            Position::new(0.3, 1.0, 0.0),
            Position::new(0.3, 1.0, 0.0),
        );
        let facing = compute_facing(&positions, &LandmarkIndices::default()).unwrap();
        assert_eq!(facing.degeneracy, Some(Degeneracy::ZeroShoulderSpan));
        assert_eq!(facing.quaternion, Quaternion::one());
    }

    #[test]
    fn shoulders_along_spine_is_identity() {
        let positions = landmarks(
            Position::zero(),
            Position::new(0.0, 1.0, 0.0),
            Position::new(0.0, 1.0, 0.0),
            Position::new(0.0, 2.0, 0.0),
        );
        let facing = compute_facing(&positions, &LandmarkIndices::default()).unwrap();
        assert_eq!(facing.degeneracy, Some(Degeneracy::ShoulderParallelToUp));
        assert_eq!(facing.quaternion, Quaternion::one());
    }

    #[test]
    fn short_landmark_list_is_rejected() {
        let positions = vec![Position::zero(); 19];
        assert_eq!(
            compute_facing_quaternion(&positions),
            Err(FacingError::MissingLandmark { index: 19, len: 19 })
        );
    }

    #[test]
    fn custom_indices() {
        let indices = LandmarkIndices {
            hip: 0,
            upper_spine: 1,
            left_shoulder: 2,
            right_shoulder: 3,
        };
        let positions = vec![
            Position::zero(),
            Position::new(0.0, 1.0, 0.0),
            Position::new(-1.0, 1.0, 0.0),
            Position::new(1.0, 1.0, 0.0),
        ];
        let facing = compute_facing(&positions, &indices).unwrap();
        assert!(same_rotation(facing.quaternion, Quaternion::one(), 1e-12));
    }
}
