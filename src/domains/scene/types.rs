use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn add(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(&self, other: &Vec3) -> f64 {
        self.sub(other).norm()
    }
}

/// Position plus RPY-XYZ orientation (radians), the pose format of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Vec3) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
        }
    }

    pub fn from_rotation(rotation: Vec3) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation,
        }
    }

    /// Tool pointing down: 180 degrees about X.
    pub fn tool_down(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::new(PI, 0.0, 0.0),
        }
    }

    /// Rz(rz) * Ry(ry) * Rx(rx), fixed-axis roll/pitch/yaw.
    pub fn rotation_matrix(&self) -> [[f64; 3]; 3] {
        let (sx, cx) = self.rotation.x.sin_cos();
        let (sy, cy) = self.rotation.y.sin_cos();
        let (sz, cz) = self.rotation.z.sin_cos();
        [
            [cz * cy, cz * sy * sx - sz * cx, cz * sy * cx + sz * sx],
            [sz * cy, sz * sy * sx + cz * cx, sz * sy * cx - cz * sx],
            [-sy, cy * sx, cy * cx],
        ]
    }

    /// Post-multiplies by a pure translation, i.e. moves `offset` along this pose's own axes.
    pub fn translated_local(&self, offset: Vec3) -> Pose {
        let r = self.rotation_matrix();
        let delta = Vec3::new(
            r[0][0] * offset.x + r[0][1] * offset.y + r[0][2] * offset.z,
            r[1][0] * offset.x + r[1][1] * offset.y + r[1][2] * offset.z,
            r[2][0] * offset.x + r[2][1] * offset.y + r[2][2] * offset.z,
        );
        Pose {
            position: self.position.add(&delta),
            rotation: self.rotation,
        }
    }
}
