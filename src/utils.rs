use crate::types::{Axis, Quaternion};
use cgmath::{Deg, InnerSpace, Matrix3, One, Rotation3};

/// Vectors shorter than this have no usable direction.
pub const DEGENERATE_EPSILON: f64 = 1e-6;

pub(crate) fn is_degenerate(length: f64) -> bool {
    length < DEGENERATE_EPSILON
}

/// Convert euler angles in DEGREES, listed in channel declaration order, to a quaternion.
///
/// The channels are read as extrinsic rotations applied in reverse declaration order:
/// the last declared axis acts first, and every earlier axis is applied on top of it
/// in the fixed frame. The result equals the product of the elemental rotations in
/// declaration order, so for "Zrotation Xrotation Yrotation" it is `Rz * Rx * Ry`.
pub fn euler_channels_to_quat(axes: &[Axis], angles: &[f64]) -> Quaternion {
    axes.iter()
        .zip(angles.iter())
        .rev()
        .fold(Quaternion::one(), |rotation, (axis, angle)| {
            Quaternion::from_axis_angle(axis.unit(), Deg(*angle)) * rotation
        })
}

/// Convert a rotation matrix (columns are the rotated basis vectors) to a unit quaternion.
///
/// Picks the largest of the trace and the three diagonal elements before taking the
/// square root, which keeps the division well conditioned near 180 degree rotations.
pub fn matrix_to_quat(m: Matrix3<f64>) -> Quaternion {
    // cgmath matrices are column major: m.c.r is row r of column c
    let (r00, r01, r02) = (m.x.x, m.y.x, m.z.x);
    let (r10, r11, r12) = (m.x.y, m.y.y, m.z.y);
    let (r20, r21, r22) = (m.x.z, m.y.z, m.z.z);

    let trace = r00 + r11 + r22;
    let (w, x, y, z) = if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0;
        (0.25 * s, (r21 - r12) / s, (r02 - r20) / s, (r10 - r01) / s)
    } else if r00 > r11 && r00 > r22 {
        let s = (1.0 + r00 - r11 - r22).sqrt() * 2.0;
        ((r21 - r12) / s, 0.25 * s, (r01 + r10) / s, (r02 + r20) / s)
    } else if r11 > r22 {
        let s = (1.0 + r11 - r00 - r22).sqrt() * 2.0;
        ((r02 - r20) / s, (r01 + r10) / s, 0.25 * s, (r12 + r21) / s)
    } else {
        let s = (1.0 + r22 - r00 - r11).sqrt() * 2.0;
        ((r10 - r01) / s, (r02 + r20) / s, (r12 + r21) / s, 0.25 * s)
    };

    Quaternion::new(w, x, y, z).normalize()
}

/// Quaternion components as `[x, y, z, w]`.
pub fn quat_to_xyzw(q: Quaternion) -> [f64; 4] {
    [q.v.x, q.v.y, q.v.z, q.s]
}
