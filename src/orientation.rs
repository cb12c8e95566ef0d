//! Quaternion conversions for consumers of tool poses.
//!
//! Quaternions are stored as [qx, qy, qz, qw]. Polhemus devices natively report
//! azimuth/elevation/roll (ZYX Euler, degrees); backends that read that output
//! format convert with [`quaternion_from_azimuth_elevation_roll`].

use crate::types::Pose;

/// Convert azimuth (Z), elevation (Y), roll (X) in degrees to [qx, qy, qz, qw].
pub fn quaternion_from_azimuth_elevation_roll(azimuth: f64, elevation: f64, roll: f64) -> [f64; 4] {
    let (sz, cz) = (azimuth.to_radians() * 0.5).sin_cos();
    let (sy, cy) = (elevation.to_radians() * 0.5).sin_cos();
    let (sx, cx) = (roll.to_radians() * 0.5).sin_cos();

    let w = cz * cy * cx + sz * sy * sx;
    let x = cz * cy * sx - sz * sy * cx;
    let y = cz * sy * cx + sz * cy * sx;
    let z = sz * cy * cx - cz * sy * sx;
    [x, y, z, w]
}

/// Convert [qx, qy, qz, qw] to [azimuth, elevation, roll] in degrees.
///
/// Inverse of [`quaternion_from_azimuth_elevation_roll`]. Elevation is clamped
/// to +-90 degrees at the gimbal-lock singularity.
pub fn azimuth_elevation_roll(q: &[f64; 4]) -> [f64; 3] {
    let [x, y, z, w] = *q;
    let azimuth = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));
    let elevation = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0).asin();
    let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
    [azimuth.to_degrees(), elevation.to_degrees(), roll.to_degrees()]
}

/// Convert [qx, qy, qz, qw] to a 3x3 rotation matrix (row-major).
pub fn rotation_matrix(q: &[f64; 4]) -> [[f64; 3]; 3] {
    let [x, y, z, w] = *q;
    [
        [1.0 - 2.0*(y*y + z*z), 2.0*(x*y - z*w),       2.0*(x*z + y*w)],
        [2.0*(x*y + z*w),       1.0 - 2.0*(x*x + z*z), 2.0*(y*z - x*w)],
        [2.0*(x*z - y*w),       2.0*(y*z + x*w),       1.0 - 2.0*(x*x + y*y)],
    ]
}

/// Scale a quaternion to unit length. A zero quaternion becomes the identity.
pub fn normalize(q: &[f64; 4]) -> [f64; 4] {
    let norm = q.iter().map(|c| c * c).sum::<f64>().sqrt();
    if norm < 1e-12 {
        return [0.0, 0.0, 0.0, 1.0];
    }
    [q[0] / norm, q[1] / norm, q[2] / norm, q[3] / norm]
}

impl Pose {
    /// Build a pose from a position and Polhemus-style Euler angles in degrees.
    pub fn from_azimuth_elevation_roll(position: [f64; 3], azimuth: f64, elevation: f64, roll: f64) -> Pose {
        Pose::new(
            position,
            quaternion_from_azimuth_elevation_roll(azimuth, elevation, roll),
        )
    }

    pub fn rotation_matrix(&self) -> [[f64; 3]; 3] {
        rotation_matrix(&self.orientation)
    }

    /// Rotate `v` by this pose's orientation and translate by its position.
    pub fn transform_point(&self, v: [f64; 3]) -> [f64; 3] {
        let m = self.rotation_matrix();
        let mut out = self.position;
        for (row, o) in m.iter().zip(out.iter_mut()) {
            *o += row[0] * v[0] + row[1] * v[1] + row[2] * v[2];
        }
        out
    }
}
