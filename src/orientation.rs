use image::DynamicImage;

use crate::marker::MarkerDetection;

/// How far the page content is currently turned clockwise from upright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Upright,
    Rotated90,
    Rotated180,
    Rotated270,
}

/// Snap window centres in degrees, paired with the orientation they select
pub const ROTATION_CENTERS_DEG: [(f64, Orientation); 3] = [
    (90.0, Orientation::Rotated90),
    (180.0, Orientation::Rotated180),
    (270.0, Orientation::Rotated270),
];

/// Default half-width of each snap window in degrees
pub const DEFAULT_SNAP_TOLERANCE_DEG: f64 = 20.0;

/// Wrap an angle in degrees into (-180, 180]
fn wrap_degrees(angle: f64) -> f64 {
    let mut wrapped = angle % 360.0;
    if wrapped > 180.0 {
        wrapped -= 360.0;
    } else if wrapped <= -180.0 {
        wrapped += 360.0;
    }
    wrapped
}

/// Minimal absolute angular distance in degrees between two angles
fn angular_distance(a: f64, b: f64) -> f64 {
    wrap_degrees(a - b).abs()
}

/// Estimate the page rotation in degrees from one side marker. The corner
/// 0 -> corner 3 edge points straight down on an upright page, so its
/// screen-space direction minus 90° is how far the page is turned
/// clockwise. Result is wrapped into (-180, 180]; both half-turn
/// directions report 180.
pub fn estimate_rotation(marker: &MarkerDetection) -> f64 {
    let edge = marker.corners[3] - marker.corners[0];
    let direction = (edge.y as f64).atan2(edge.x as f64).to_degrees();
    wrap_degrees(direction - 90.0)
}

/// Snap a rotation estimate to the nearest 90° class. An estimate belongs
/// to a class when its minimal angular distance to the centre is strictly
/// below the tolerance; estimates inside no window are detector noise on
/// an already-upright page.
pub fn snap_orientation(angle_deg: f64, tolerance_deg: f64) -> Orientation {
    for (center, orientation) in ROTATION_CENTERS_DEG {
        if angular_distance(angle_deg, center) < tolerance_deg {
            return orientation;
        }
    }
    Orientation::Upright
}

/// Which axis a corner flip mirrors
#[derive(Debug, Clone, Copy)]
enum Flip {
    Vertical,
    Horizontal,
    Both,
}

/// Transpose and/or flip every corner of every marker, mirroring what the
/// matching image rotation does to the pixel grid. `(width, height)` are
/// the image dimensions before the transform; flips use the continuous
/// convention x' = new_width - x, y' = new_height - y.
fn transpose_flip_corners(
    markers: &mut [MarkerDetection],
    width: u32,
    height: u32,
    transpose: bool,
    flip: Flip,
) {
    let (new_width, new_height) = if transpose {
        (height as f32, width as f32)
    } else {
        (width as f32, height as f32)
    };

    for marker in markers.iter_mut() {
        for corner in marker.corners.iter_mut() {
            if transpose {
                let x = corner.x;
                corner.x = corner.y;
                corner.y = x;
            }
            match flip {
                Flip::Vertical => corner.y = new_height - corner.y,
                Flip::Horizontal => corner.x = new_width - corner.x,
                Flip::Both => {
                    corner.x = new_width - corner.x;
                    corner.y = new_height - corner.y;
                }
            }
        }
    }
}

/// Rotate the image back to upright and apply the same correction to every
/// corner of every detection, so later crop math sees upright coordinates.
pub fn apply_orientation(
    orientation: Orientation,
    image: DynamicImage,
    markers: &mut [MarkerDetection],
) -> DynamicImage {
    let (width, height) = (image.width(), image.height());

    match orientation {
        Orientation::Upright => image,
        Orientation::Rotated90 => {
            // Undo a clockwise quarter turn: transpose, then mirror top to bottom
            transpose_flip_corners(markers, width, height, true, Flip::Vertical);
            image.rotate270()
        }
        Orientation::Rotated180 => {
            transpose_flip_corners(markers, width, height, false, Flip::Both);
            image.rotate180()
        }
        Orientation::Rotated270 => {
            // Undo a counter-clockwise quarter turn: transpose, then mirror left to right
            transpose_flip_corners(markers, width, height, true, Flip::Horizontal);
            image.rotate90()
        }
    }
}
