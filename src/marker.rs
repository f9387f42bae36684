use nalgebra::Vector2;

/// Image-space point in pixels, x right, y down, origin at the top-left
pub type Point2f = Vector2<f32>;

/// Marker corners in canonical order: the marker's own top-left corner
/// first, then clockwise as seen in the image (top-right, bottom-right,
/// bottom-left). On an upright marker the corner 0 -> corner 3 edge points
/// straight down.
pub type Quad = [Point2f; 4];

/// A decoded fiducial marker
#[derive(Debug, Clone)]
pub struct MarkerDetection {
    /// Decoded marker identifier
    pub id: u32,
    /// Corner positions in canonical order
    pub corners: Quad,
}

/// Page parity of a bound book. Facing pages mirror each other, so odd and
/// even pages carry different marker identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageParity {
    Odd,
    Even,
}

/// Assignment of marker identifiers to the four page roles
#[derive(Debug, Clone, Copy)]
pub struct RoleIds {
    pub even_side: u32,
    pub even_top: u32,
    pub odd_side: u32,
    pub odd_top: u32,
}

impl RoleIds {
    /// Identifier of the side (left/right) marker pair for this parity
    pub fn side_id(&self, parity: PageParity) -> u32 {
        match parity {
            PageParity::Odd => self.odd_side,
            PageParity::Even => self.even_side,
        }
    }

    /// Identifier of the top/bottom marker pair for this parity
    pub fn top_bottom_id(&self, parity: PageParity) -> u32 {
        match parity {
            PageParity::Odd => self.odd_top,
            PageParity::Even => self.even_top,
        }
    }
}

impl Default for RoleIds {
    fn default() -> Self {
        Self {
            even_side: 0,
            even_top: 1,
            odd_side: 2,
            odd_top: 3,
        }
    }
}

/// Detections sorted into roles, as index lists into the detection slice.
/// Indices rather than copies: the orientation pass mutates every detection
/// in place and the partition keeps addressing the updated corners.
#[derive(Debug, Default)]
pub struct RolePartition {
    /// Left/right marker indices, in detector order
    pub sides: Vec<usize>,
    /// Top/bottom marker indices, in detector order
    pub top_bottom: Vec<usize>,
}

/// Decide page parity from the identifiers present. Detections matching an
/// odd-role id count for odd, even-role ids for even, anything else is
/// ignored. Odd wins ties, so a page with no recognizable markers is
/// treated as odd (and then fails count validation downstream).
pub fn classify_parity(detections: &[MarkerDetection], roles: &RoleIds) -> PageParity {
    let mut odd = 0usize;
    let mut even = 0usize;

    for detection in detections {
        if detection.id == roles.odd_side || detection.id == roles.odd_top {
            odd += 1;
        }
        if detection.id == roles.even_side || detection.id == roles.even_top {
            even += 1;
        }
    }

    if odd >= even {
        PageParity::Odd
    } else {
        PageParity::Even
    }
}

/// Sort detections into side and top/bottom roles for the given parity.
/// Detector order is preserved; counts are not validated here.
pub fn partition_roles(
    detections: &[MarkerDetection],
    parity: PageParity,
    roles: &RoleIds,
) -> RolePartition {
    let side_id = roles.side_id(parity);
    let top_bottom_id = roles.top_bottom_id(parity);

    let mut partition = RolePartition::default();
    for (index, detection) in detections.iter().enumerate() {
        if detection.id == side_id {
            partition.sides.push(index);
        }
        if detection.id == top_bottom_id {
            partition.top_bottom.push(index);
        }
    }

    partition
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(id: u32) -> MarkerDetection {
        MarkerDetection {
            id,
            corners: [Point2f::new(0.0, 0.0); 4],
        }
    }

    #[test]
    fn test_parity_tie_resolves_odd() {
        let pair = [detection(0), detection(2)];
        assert_eq!(classify_parity(&pair, &RoleIds::default()), PageParity::Odd);

        let detections = [detection(0), detection(1), detection(2), detection(3)];
        let parity = classify_parity(&detections, &RoleIds::default());
        assert_eq!(parity, PageParity::Odd);
    }

    #[test]
    fn test_parity_empty_resolves_odd() {
        let parity = classify_parity(&[], &RoleIds::default());
        assert_eq!(parity, PageParity::Odd);
    }

    #[test]
    fn test_parity_even_majority() {
        let detections = [detection(0), detection(0), detection(1), detection(2)];
        let parity = classify_parity(&detections, &RoleIds::default());
        assert_eq!(parity, PageParity::Even);
    }

    #[test]
    fn test_parity_ignores_unknown_ids() {
        let detections = [detection(7), detection(7), detection(7), detection(0)];
        let parity = classify_parity(&detections, &RoleIds::default());
        assert_eq!(parity, PageParity::Even);
    }

    #[test]
    fn test_partition_filters_by_parity_and_keeps_order() {
        let detections = [
            detection(3),
            detection(2),
            detection(99),
            detection(2),
            detection(3),
        ];
        let partition = partition_roles(&detections, PageParity::Odd, &RoleIds::default());
        assert_eq!(partition.sides, vec![1, 3]);
        assert_eq!(partition.top_bottom, vec![0, 4]);
    }

    #[test]
    fn test_partition_other_parity_ids_excluded() {
        let detections = [detection(0), detection(1), detection(2), detection(3)];
        let partition = partition_roles(&detections, PageParity::Even, &RoleIds::default());
        assert_eq!(partition.sides, vec![0]);
        assert_eq!(partition.top_bottom, vec![1]);
    }

    #[test]
    fn test_custom_role_ids() {
        let roles = RoleIds {
            even_side: 10,
            even_top: 11,
            odd_side: 20,
            odd_top: 21,
        };
        let detections = [detection(20), detection(21), detection(0)];
        assert_eq!(classify_parity(&detections, &roles), PageParity::Odd);

        let partition = partition_roles(&detections, PageParity::Odd, &roles);
        assert_eq!(partition.sides, vec![0]);
        assert_eq!(partition.top_bottom, vec![1]);
    }
}
