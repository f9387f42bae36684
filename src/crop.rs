use crate::marker::{MarkerDetection, PageParity};

/// Default gap in pixels between a marker's content-facing edge and the
/// crop line
pub const DEFAULT_INSET: f32 = 15.0;

/// Crop bounds in pixels: left/top inclusive, right/bottom exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl CropRect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// True when the bounds enclose no area. A malformed marker layout can
    /// push the inset lines past each other; callers reject such rects
    /// instead of writing an empty image.
    pub fn is_degenerate(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Clamp the bounds to an image of the given dimensions
    pub fn clamp_to(&self, width: u32, height: u32) -> CropRect {
        CropRect {
            left: self.left.clamp(0, width as i32),
            right: self.right.clamp(0, width as i32),
            top: self.top.clamp(0, height as i32),
            bottom: self.bottom.clamp(0, height as i32),
        }
    }
}

/// Corner indices facing the page content, per parity. Odd and even pages
/// mirror each other, so the content-facing pair differs: corners 0 and 3
/// on odd pages, 1 and 2 on even pages.
fn side_corner_pair(parity: PageParity) -> (usize, usize) {
    match parity {
        PageParity::Odd => (0, 3),
        PageParity::Even => (1, 2),
    }
}

/// Horizontal crop bounds from the two side markers. Input order carries
/// no meaning; the marker with the smaller corner-0 x is the left one.
/// Bounds truncate toward zero, matching integer pixel addressing.
pub fn side_bounds(
    a: &MarkerDetection,
    b: &MarkerDetection,
    parity: PageParity,
    inset: f32,
) -> (i32, i32) {
    let (left, right) = if a.corners[0].x > b.corners[0].x {
        (b, a)
    } else {
        (a, b)
    };
    let (i, j) = side_corner_pair(parity);

    let left_bound = left.corners[i].x.max(left.corners[j].x) + inset;
    let right_bound = right.corners[i].x.min(right.corners[j].x) - inset;
    (left_bound as i32, right_bound as i32)
}

/// Vertical crop bounds from the top and bottom markers. The marker with
/// the smaller corner-0 y is the top one; the corner indices here are the
/// same for both parities (bottom edge of the top marker, top edge of the
/// bottom marker).
pub fn top_bottom_bounds(a: &MarkerDetection, b: &MarkerDetection, inset: f32) -> (i32, i32) {
    let (top, bottom) = if a.corners[0].y > b.corners[0].y {
        (b, a)
    } else {
        (a, b)
    };

    let top_bound = top.corners[2].y.max(top.corners[3].y) + inset;
    let bottom_bound = bottom.corners[0].y.min(bottom.corners[1].y) - inset;
    (top_bound as i32, bottom_bound as i32)
}

/// Assemble the full crop rect from both marker pairs
pub fn compute_crop(
    sides: (&MarkerDetection, &MarkerDetection),
    top_bottom: (&MarkerDetection, &MarkerDetection),
    parity: PageParity,
    inset: f32,
) -> CropRect {
    let (left, right) = side_bounds(sides.0, sides.1, parity, inset);
    let (top, bottom) = top_bottom_bounds(top_bottom.0, top_bottom.1, inset);
    CropRect {
        left,
        right,
        top,
        bottom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::Point2f;

    fn marker(id: u32, corners: [(f32, f32); 4]) -> MarkerDetection {
        MarkerDetection {
            id,
            corners: corners.map(|(x, y)| Point2f::new(x, y)),
        }
    }

    fn left_side() -> MarkerDetection {
        marker(0, [(100.0, 50.0), (100.0, 150.0), (120.0, 150.0), (120.0, 50.0)])
    }

    fn right_side() -> MarkerDetection {
        marker(0, [(400.0, 50.0), (400.0, 150.0), (420.0, 150.0), (420.0, 50.0)])
    }

    #[test]
    fn test_side_bounds_even_scenario() {
        let (left, right) = side_bounds(&left_side(), &right_side(), PageParity::Even, 15.0);
        assert_eq!(left, 135);
        assert_eq!(right, 385);
    }

    #[test]
    fn test_side_bounds_order_independent() {
        let forward = side_bounds(&left_side(), &right_side(), PageParity::Even, 15.0);
        let reversed = side_bounds(&right_side(), &left_side(), PageParity::Even, 15.0);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_parity_selects_corner_pair() {
        // Skewed quads whose 0/3 and 1/2 corner pairs span different x ranges
        let left = marker(0, [(100.0, 50.0), (104.0, 150.0), (124.0, 150.0), (120.0, 50.0)]);
        let right = marker(0, [(400.0, 50.0), (404.0, 150.0), (424.0, 150.0), (420.0, 50.0)]);

        let odd = side_bounds(&left, &right, PageParity::Odd, 15.0);
        assert_eq!(odd, (135, 385));

        let even = side_bounds(&left, &right, PageParity::Even, 15.0);
        assert_eq!(even, (139, 389));
    }

    #[test]
    fn test_top_bottom_bounds() {
        let top = marker(1, [(360.0, 40.0), (444.0, 40.0), (444.0, 124.0), (360.0, 124.0)]);
        let bottom = marker(1, [(360.0, 876.0), (444.0, 876.0), (444.0, 960.0), (360.0, 960.0)]);

        let forward = top_bottom_bounds(&top, &bottom, 15.0);
        assert_eq!(forward, (139, 861));

        let reversed = top_bottom_bounds(&bottom, &top, 15.0);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_bounds_truncate_toward_zero() {
        let (left, _) = side_bounds(&left_side(), &right_side(), PageParity::Even, 15.7);
        assert_eq!(left, 135);
    }

    #[test]
    fn test_compute_crop_assembles_rect() {
        let top = marker(1, [(360.0, 40.0), (444.0, 40.0), (444.0, 124.0), (360.0, 124.0)]);
        let bottom = marker(1, [(360.0, 876.0), (444.0, 876.0), (444.0, 960.0), (360.0, 960.0)]);

        let rect = compute_crop(
            (&left_side(), &right_side()),
            (&top, &bottom),
            PageParity::Even,
            15.0,
        );
        assert_eq!(
            rect,
            CropRect {
                left: 135,
                right: 385,
                top: 139,
                bottom: 861,
            }
        );
        assert_eq!(rect.width(), 250);
        assert_eq!(rect.height(), 722);
        assert!(!rect.is_degenerate());
    }

    #[test]
    fn test_degenerate_when_inset_lines_cross() {
        // Side markers close enough that the insets overlap
        let left = marker(0, [(100.0, 50.0), (100.0, 150.0), (120.0, 150.0), (120.0, 50.0)]);
        let right = marker(0, [(130.0, 50.0), (130.0, 150.0), (150.0, 150.0), (150.0, 50.0)]);

        let (l, r) = side_bounds(&left, &right, PageParity::Even, 15.0);
        let rect = CropRect {
            left: l,
            right: r,
            top: 0,
            bottom: 100,
        };
        assert!(rect.is_degenerate());
    }

    #[test]
    fn test_clamp_to_image() {
        let rect = CropRect {
            left: -20,
            right: 900,
            top: 10,
            bottom: 1200,
        };
        let clamped = rect.clamp_to(800, 1000);
        assert_eq!(
            clamped,
            CropRect {
                left: 0,
                right: 800,
                top: 10,
                bottom: 1000,
            }
        );

        // Entirely outside collapses to an empty rect
        let outside = CropRect {
            left: 900,
            right: 950,
            top: 0,
            bottom: 100,
        };
        assert!(outside.clamp_to(800, 1000).is_degenerate());
    }
}
