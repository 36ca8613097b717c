//! Math type aliases and helper functions.
//!
//! All tracking and projection math is `f32`. Orientations are unit
//! quaternions; matrices follow the OpenGL clip convention (depth in
//! `[-1, 1]`) since render targets are handed to GL-style consumers.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Unit quaternion (f32) used for every orientation in the crate.
pub type Quat = nalgebra::UnitQuaternion<f32>;

// ===== Helper functions =====

/// Create a quaternion from x, y, z, w components. The result is normalized.
pub fn quat_from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Quat {
    Quat::from_quaternion(nalgebra::Quaternion::new(w, x, y, z))
}

/// Convert a quaternion to a `[x, y, z, w]` array.
pub fn quat_to_array(q: &Quat) -> [f32; 4] {
    [q.coords.x, q.coords.y, q.coords.z, q.coords.w]
}

/// Orientation from Euler angles in degrees.
///
/// The rotation is applied roll (about Z) first, then pitch (about X),
/// then yaw (about Y): `q = yaw * pitch * roll`.
pub fn quat_from_euler_degrees(yaw: f32, pitch: f32, roll: f32) -> Quat {
    let qy = Quat::from_axis_angle(&Vec3::y_axis(), yaw.to_radians());
    let qx = Quat::from_axis_angle(&Vec3::x_axis(), pitch.to_radians());
    let qz = Quat::from_axis_angle(&Vec3::z_axis(), roll.to_radians());
    qy * qx * qz
}

/// Orientation whose local Z axis points along `direction`, with `up` fixing the roll.
pub fn quat_from_direction(direction: &Vec3, up: &Vec3) -> Quat {
    Quat::face_towards(direction, up)
}

/// Rotation axis scaled by the rotation angle in radians.
///
/// Returns zero for the identity rotation.
pub fn scaled_axis(q: &Quat) -> Vec3 {
    q.scaled_axis()
}

/// Build a translation-only 4x4 matrix.
pub fn mat4_from_translation(t: &Vec3) -> Mat4 {
    Mat4::new_translation(t)
}

/// Build a rotation-only 4x4 matrix.
pub fn mat4_from_rotation(q: &Quat) -> Mat4 {
    q.to_homogeneous()
}

/// Transform a point by a 4x4 matrix (with perspective divide).
pub fn transform_point(m: &Mat4, p: &Vec3) -> Vec3 {
    m.transform_point(&nalgebra::Point3::from(*p)).coords
}

/// Build a rigid transform matrix from a position and orientation.
pub fn mat4_from_pose(position: &Vec3, orientation: &Quat) -> Mat4 {
    mat4_from_translation(position) * mat4_from_rotation(orientation)
}

/// OpenGL-style off-axis perspective projection (`glFrustum`).
pub fn frustum_gl(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let rml = right - left;
    let tmb = top - bottom;
    let fmn = far - near;
    #[rustfmt::skip]
    let result = Mat4::new(
        2.0 * near / rml, 0.0,              (right + left) / rml,  0.0,
        0.0,              2.0 * near / tmb, (top + bottom) / tmb,  0.0,
        0.0,              0.0,              -(far + near) / fmn,   -2.0 * far * near / fmn,
        0.0,              0.0,              -1.0,                  0.0,
    );
    result
}
