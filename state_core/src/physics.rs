//! Pose decoding: Euler → rotation matrix → quaternion, and team mirroring.
//!
//! ## Rotation matrix convention
//! Columns are the body axes expressed in world coordinates:
//! - column 0 = forward = (cP·cY, cP·sY, sP)
//! - column 1 = left    = (cY·sP·sR − cR·sY, sY·sP·sR + cR·cY, −cP·sR)
//! - column 2 = up      = (−cR·cY·sP − sR·sY, −cR·sY·sP + sR·cY, cP·cR)
//!
//! ## Quaternion convention
//! `[w, x, y, z]`, extracted with trace-based branch selection and then
//! negated as a whole. Consumers compare against quaternions produced the
//! same way, so the sign must not be normalised.
//!
//! ## Mirroring
//! The other team's view is a half-turn about the vertical axis: x and y of
//! every vector are negated and π is added to yaw.

use crate::types::{vec3, Quat, RotMat, Vec3};
use bot_packet::Physics;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::f32::consts::PI;

/// Per-component scale applied to vectors when mirroring
const INVERT_VEC: Vec3 = Vec3::new(-1.0, -1.0, 1.0);

/// Offset added to (pitch, yaw, roll) when mirroring
const INVERT_PYR: Vec3 = Vec3::new(0.0, PI, 0.0);

/// Rotation matrix and quaternion derived from one Euler triple.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orientation {
    pub rotation: RotMat,
    pub quaternion: Quat,
}

impl Orientation {
    pub fn from_euler(pyr: &Vec3) -> Self {
        let rotation = euler_to_rotation(pyr);
        let quaternion = rotation_to_quaternion(&rotation);
        Self {
            rotation,
            quaternion,
        }
    }
}

/// Decoded physical state of a car or the ball.
///
/// The orientation is computed on first access and cached until the Euler
/// triple is replaced.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// (pitch, yaw, roll)
    euler_angles: Vec3,
    #[serde(skip)]
    orientation: OnceCell<Orientation>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros(), Vec3::zeros(), Vec3::zeros())
    }
}

impl PartialEq for Pose {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
            && self.linear_velocity == other.linear_velocity
            && self.angular_velocity == other.angular_velocity
            && self.euler_angles == other.euler_angles
    }
}

impl Pose {
    pub fn new(
        position: Vec3,
        euler_angles: Vec3,
        linear_velocity: Vec3,
        angular_velocity: Vec3,
    ) -> Self {
        Self {
            position,
            linear_velocity,
            angular_velocity,
            euler_angles,
            orientation: OnceCell::new(),
        }
    }

    /// Decode all raw fields of a car.
    pub fn from_car_physics(physics: &Physics) -> Self {
        let r = physics.rotation;
        Self::new(
            vec3(physics.location),
            Vec3::new(r.pitch, r.yaw, r.roll),
            vec3(physics.velocity),
            vec3(physics.angular_velocity),
        )
    }

    /// Decode the ball. Its orientation is not tracked and stays at zero.
    pub fn from_ball_physics(physics: &Physics) -> Self {
        Self::new(
            vec3(physics.location),
            Vec3::zeros(),
            vec3(physics.velocity),
            vec3(physics.angular_velocity),
        )
    }

    /// Team-mirrored view of this pose.
    pub fn mirrored(&self) -> Self {
        Self::new(
            self.position.component_mul(&INVERT_VEC),
            self.euler_angles + INVERT_PYR,
            self.linear_velocity.component_mul(&INVERT_VEC),
            self.angular_velocity.component_mul(&INVERT_VEC),
        )
    }

    pub fn euler_angles(&self) -> Vec3 {
        self.euler_angles
    }

    /// Replace the Euler triple and drop the cached orientation.
    pub fn set_euler_angles(&mut self, pyr: Vec3) {
        self.euler_angles = pyr;
        self.orientation = OnceCell::new();
    }

    pub fn pitch(&self) -> f32 {
        self.euler_angles.x
    }

    pub fn yaw(&self) -> f32 {
        self.euler_angles.y
    }

    pub fn roll(&self) -> f32 {
        self.euler_angles.z
    }

    pub fn orientation(&self) -> &Orientation {
        self.orientation
            .get_or_init(|| Orientation::from_euler(&self.euler_angles))
    }

    /// True once the orientation has been computed for the current triple.
    pub fn has_cached_orientation(&self) -> bool {
        self.orientation.get().is_some()
    }

    pub fn rotation_mtx(&self) -> RotMat {
        self.orientation().rotation
    }

    pub fn quaternion(&self) -> Quat {
        self.orientation().quaternion
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation().rotation.column(0).into_owned()
    }

    pub fn left(&self) -> Vec3 {
        self.orientation().rotation.column(1).into_owned()
    }

    pub fn right(&self) -> Vec3 {
        -self.left()
    }

    pub fn up(&self) -> Vec3 {
        self.orientation().rotation.column(2).into_owned()
    }
}

/// Build the body-to-world rotation matrix from (pitch, yaw, roll).
pub fn euler_to_rotation(pyr: &Vec3) -> RotMat {
    let (sp, cp) = pyr.x.sin_cos();
    let (sy, cy) = pyr.y.sin_cos();
    let (sr, cr) = pyr.z.sin_cos();

    RotMat::new(
        cp * cy,
        cy * sp * sr - cr * sy,
        -cr * cy * sp - sr * sy,
        cp * sy,
        sy * sp * sr + cr * cy,
        -cr * sy * sp + sr * cy,
        sp,
        -cp * sr,
        cp * cr,
    )
}

/// Extract `[w, x, y, z]` from a rotation matrix, negated.
pub fn rotation_to_quaternion(m: &RotMat) -> Quat {
    let trace = m.trace();
    let mut q = Quat::zeros();

    if trace > 0.0 {
        let s = (trace + 1.0).sqrt();
        q[0] = s * 0.5;
        let s = 0.5 / s;
        q[1] = (m[(2, 1)] - m[(1, 2)]) * s;
        q[2] = (m[(0, 2)] - m[(2, 0)]) * s;
        q[3] = (m[(1, 0)] - m[(0, 1)]) * s;
    } else if m[(0, 0)] >= m[(1, 1)] && m[(0, 0)] >= m[(2, 2)] {
        let s = (1.0 + m[(0, 0)] - m[(1, 1)] - m[(2, 2)]).sqrt();
        let inv_s = 0.5 / s;
        q[1] = 0.5 * s;
        q[2] = (m[(1, 0)] + m[(0, 1)]) * inv_s;
        q[3] = (m[(2, 0)] + m[(0, 2)]) * inv_s;
        q[0] = (m[(2, 1)] - m[(1, 2)]) * inv_s;
    } else if m[(1, 1)] > m[(2, 2)] {
        let s = (1.0 + m[(1, 1)] - m[(0, 0)] - m[(2, 2)]).sqrt();
        let inv_s = 0.5 / s;
        q[1] = (m[(0, 1)] + m[(1, 0)]) * inv_s;
        q[2] = 0.5 * s;
        q[3] = (m[(1, 2)] + m[(2, 1)]) * inv_s;
        q[0] = (m[(0, 2)] - m[(2, 0)]) * inv_s;
    } else {
        let s = (1.0 + m[(2, 2)] - m[(0, 0)] - m[(1, 1)]).sqrt();
        let inv_s = 0.5 / s;
        q[1] = (m[(0, 2)] + m[(2, 0)]) * inv_s;
        q[2] = (m[(1, 2)] + m[(2, 1)]) * inv_s;
        q[3] = 0.5 * s;
        q[0] = (m[(1, 0)] - m[(0, 1)]) * inv_s;
    }

    -q
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
