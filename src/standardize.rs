//! Post-processing of per-frame joint positions before they are written out.

use crate::error::StandardizeError;
use crate::types::{Index, Position};
use serde::{Deserialize, Serialize};

/// Positions relative to the root joint, which always comes first in pre-order.
pub fn translate_to_root(positions: &[Position]) -> Result<Vec<Position>, StandardizeError> {
    let root = *positions.first().ok_or(StandardizeError::EmptyFrame)?;
    Ok(positions.iter().map(|&p| p - root).collect())
}

/// Selects joints out of a full skeleton and reorders them into the layout expected
/// downstream. `order[k]` is the position inside the selection that ends up at `k`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointSubset {
    #[serde(default = "default_target_indices")]
    pub target_indices: Vec<Index>,
    #[serde(default = "default_order")]
    pub order: Vec<Index>,
}

/// Joints of the full dance rig that are kept.
fn default_target_indices() -> Vec<Index> {
    vec![
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 12, 13, 14, 16, 17, 18, 19, 20, 21, 37, 38, 39, 40,
    ]
}

/// Resulting layout: 0 hip, 1-2 upper body, 3 neck, 4 head, 5-6 eyes, 7-10 left leg,
/// 11-14 right leg, 15-18 left arm, 19-22 right arm.
fn default_order() -> Vec<Index> {
    vec![
        0, 9, 10, 11, 12, 13, 14, 1, 2, 3, 4, 5, 6, 7, 8, 15, 16, 17, 18, 19, 20, 21, 22,
    ]
}

impl Default for JointSubset {
    fn default() -> Self {
        Self {
            target_indices: default_target_indices(),
            order: default_order(),
        }
    }
}

impl JointSubset {
    pub fn apply(&self, positions: &[Position]) -> Result<Vec<Position>, StandardizeError> {
        let selected = self
            .target_indices
            .iter()
            .map(|&index| {
                positions
                    .get(index)
                    .copied()
                    .ok_or(StandardizeError::IndexOutOfRange {
                        index,
                        len: positions.len(),
                    })
            })
            .collect::<Result<Vec<Position>, _>>()?;

        self.order
            .iter()
            .map(|&index| {
                selected
                    .get(index)
                    .copied()
                    .ok_or(StandardizeError::IndexOutOfRange {
                        index,
                        len: selected.len(),
                    })
            })
            .collect()
    }
}
