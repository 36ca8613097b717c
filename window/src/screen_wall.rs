//! Screen wall geometry for fixed-screen output modes.
//!
//! A screen wall is the physical rectangle a window covers, given by its
//! bottom-left, bottom-right and top-left corners in tracking space.

use vrplex_core::config::ScreenPlacement;
use vrplex_core::math::{quat_from_direction, transform_point, Mat4, Quat, Vec3};
use vrplex_core::{Frustum, Rect, ScreenInfo};

/// Corners of the wall covered by `window`.
///
/// With [`ScreenPlacement::Center`] the full screen is centered at the
/// configured point with its physical size, and then cut down to the part
/// the window covers. With `fixed_to` set, the corners are carried along by
/// that tracking matrix.
pub fn screen_wall(
    placement: &ScreenPlacement,
    window: &Rect,
    screen: &ScreenInfo,
    fixed_to: Option<&Mat4>,
) -> [Vec3; 3] {
    let corners = match placement {
        ScreenPlacement::Center { center } => {
            let [w, h] = screen.physical_size;
            let bl = Vec3::new(-w / 2.0, -h / 2.0, 0.0);
            let br = Vec3::new(w / 2.0, -h / 2.0, 0.0);
            let tl = Vec3::new(-w / 2.0, h / 2.0, 0.0);
            let center = Vec3::from(*center);
            window_part(&[bl, br, tl], window, &screen.geometry).map(|c| c + center)
        }
        ScreenPlacement::Corners {
            bottom_left,
            bottom_right,
            top_left,
        } => [
            Vec3::from(*bottom_left),
            Vec3::from(*bottom_right),
            Vec3::from(*top_left),
        ],
    };
    match fixed_to {
        Some(m) => corners.map(|c| transform_point(m, &c)),
        None => corners,
    }
}

/// Restrict full-screen corners to the window's share of the screen.
///
/// Window coordinates grow downwards, wall coordinates upwards.
fn window_part(corners: &[Vec3; 3], window: &Rect, display: &Rect) -> [Vec3; 3] {
    let [bl, br, tl] = *corners;
    let tr = br + (tl - bl);
    let dw = display.width.max(1) as f32;
    let dh = display.height.max(1) as f32;
    let x = (window.x - display.x) as f32 / dw;
    let y = 1.0 - (window.y + window.height as i32 - display.y) as f32 / dh;
    let w = window.width as f32 / dw;
    let h = window.height as f32 / dh;

    let l0 = bl * (1.0 - x) + br * x;
    let l1 = tl * (1.0 - x) + tr * x;
    let r0 = bl * (1.0 - x - w) + br * (x + w);
    let r1 = tl * (1.0 - x - w) + tr * (x + w);
    [
        l0 * (1.0 - y) + l1 * y,
        r0 * (1.0 - y) + r1 * y,
        l0 * (1.0 - y - h) + l1 * (y + h),
    ]
}

/// Off-axis frustum and view orientation of an eye looking at a wall.
///
/// The orientation faces the wall plane head-on with the wall's up axis,
/// so the frustum is expressed in the wall's basis.
pub fn wall_frustum(wall: &[Vec3; 3], eye: &Vec3, near: f32, far: f32) -> (Frustum, Quat) {
    let bl = wall[0] - eye;
    let br = wall[1] - eye;
    let tl = wall[2] - eye;
    let right = (br - bl).normalize();
    let up = (tl - bl).normalize();
    let normal = up.cross(&right);
    let distance = normal.dot(&bl);

    let l = bl.dot(&right);
    let r = l + (br - bl).norm();
    let b = bl.dot(&up);
    let t = b + (tl - bl).norm();
    let q = near / distance;
    let frustum = Frustum::new(l * q, r * q, b * q, t * q, near, far);

    let projection = normal * distance;
    (frustum, quat_from_direction(&-projection, &up))
}
