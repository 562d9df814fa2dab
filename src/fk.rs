//! Forward kinematics: one frame of channel values to global joint transforms.

use crate::error::FkError;
use crate::types::*;
use crate::utils;
use cgmath::{One, Rotation, Zero};

/// Frame values read by a single joint, split into translation and rotation parts.
#[derive(Debug, Default)]
struct JointSample {
    position: Vec<f64>,
    rotation_axes: Vec<Axis>,
    rotation_angles: Vec<f64>,
}

impl JointSample {
    /// Read one value per channel starting at `index`. Channels whose value would lie
    /// past the end of the frame are skipped. Returns the index after the last value read.
    fn read(channels: &[Channel], frame: &[f64], mut index: Index) -> (JointSample, Index) {
        let mut sample = JointSample::default();
        for channel in channels.iter() {
            if index >= frame.len() {
                continue;
            }
            let value = frame[index];
            index += 1;
            if channel.is_position() {
                sample.position.push(value);
            } else if channel.is_rotation() {
                sample.rotation_axes.push(channel.axis());
                sample.rotation_angles.push(value);
            }
        }
        (sample, index)
    }

    /// The translation triple in the order the position values were read, present only
    /// when exactly three of them were.
    fn translation(&self) -> Option<Position> {
        match self.position[..] {
            [x, y, z] => Some(Position::new(x, y, z)),
            _ => None,
        }
    }

    fn rotation(&self) -> Quaternion {
        utils::euler_channels_to_quat(&self.rotation_axes, &self.rotation_angles)
    }

    fn axis_order(&self) -> String {
        self.rotation_axes.iter().map(|axis| axis.letter()).collect()
    }
}

/// Evaluate `node` and its subtree for one frame.
///
/// `start` is the index of the first frame value owned by `node`, `slot` its pre-order
/// joint index. Writes global transforms into `pose` and returns `(next_value, next_slot)`,
/// the running indices after the whole subtree has been consumed.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_node(
    node: &JointNode,
    frame: &[f64],
    start: Index,
    slot: Index,
    parent_position: Position,
    parent_rotation: Quaternion,
    is_root: bool,
    pose: &mut Pose,
) -> Result<(Index, Index), FkError> {
    let (global_position, global_rotation, mut index) = if node.channels.is_empty() {
        if is_root {
            return Err(FkError::RootPositionIncomplete {
                joint: node.name.clone(),
                found: 0,
            });
        }
        (
            parent_position + parent_rotation.rotate_vector(node.offset),
            parent_rotation,
            start,
        )
    } else {
        let (sample, index) = JointSample::read(&node.channels, frame, start);
        let local_rotation = sample.rotation();
        tracing::trace!(
            joint = %node.name,
            axis_order = %sample.axis_order(),
            "Read {} frame values",
            index - start
        );

        if is_root {
            let position = sample.translation().ok_or_else(|| FkError::RootPositionIncomplete {
                joint: node.name.clone(),
                found: sample.position.len(),
            })?;
            (position, local_rotation, index)
        } else {
            let local_position = sample.translation().unwrap_or(node.offset);
            (
                parent_position + parent_rotation.rotate_vector(local_position),
                parent_rotation * local_rotation,
                index,
            )
        }
    };

    pose.global_positions[slot] = global_position;
    pose.global_rotations[slot] = global_rotation;

    let mut next_slot = slot + 1;
    for child in node.children.iter() {
        let (child_index, child_slot) = evaluate_node(
            child,
            frame,
            index,
            next_slot,
            global_position,
            global_rotation,
            false,
            pose,
        )?;
        index = child_index;
        next_slot = child_slot;
    }

    Ok((index, next_slot))
}

/// Evaluate one frame into an existing pose, overwriting every slot.
pub fn evaluate_frame_into(
    skeleton: &Skeleton,
    frame: &[f64],
    pose: &mut Pose,
) -> Result<Index, FkError> {
    if frame.is_empty() {
        return Err(FkError::EmptyFrame);
    }
    pose.reset(skeleton.num_joints());
    let (consumed, _) = evaluate_node(
        skeleton.root(),
        frame,
        0,
        0,
        Position::zero(),
        Quaternion::one(),
        true,
        pose,
    )?;
    Ok(consumed)
}

/// Global transforms of every joint for one frame.
pub fn evaluate_frame(skeleton: &Skeleton, frame: &[f64]) -> Result<Pose, FkError> {
    let mut pose = Pose::for_skeleton(skeleton);
    let consumed = evaluate_frame_into(skeleton, frame, &mut pose)?;
    if consumed < frame.len() {
        tracing::debug!(
            "Frame has {} values, skeleton consumed {}",
            frame.len(),
            consumed
        );
    }
    Ok(pose)
}

/// Global joint positions for one frame, in pre-order.
pub fn frame_positions(skeleton: &Skeleton, frame: &[f64]) -> Result<Vec<Position>, FkError> {
    evaluate_frame(skeleton, frame).map(|pose| pose.global_positions)
}

/// Global joint positions for every frame of a motion.
pub fn evaluate_motion<F: AsRef<[f64]>>(
    skeleton: &Skeleton,
    frames: &[F],
) -> Result<Vec<Vec<Position>>, FkError> {
    let mut pose = Pose::for_skeleton(skeleton);
    let mut positions = Vec::with_capacity(frames.len());
    for frame in frames.iter() {
        evaluate_frame_into(skeleton, frame.as_ref(), &mut pose)?;
        positions.push(pose.global_positions.clone());
    }
    Ok(positions)
}
