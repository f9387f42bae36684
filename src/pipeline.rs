use image::DynamicImage;

use crate::crop::{compute_crop, DEFAULT_INSET};
use crate::detector::{detect_markers, DetectorParams};
use crate::error::CropError;
use crate::marker::{classify_parity, partition_roles, MarkerDetection, RoleIds};
use crate::orientation::{
    apply_orientation, estimate_rotation, snap_orientation, DEFAULT_SNAP_TOLERANCE_DEG,
};

/// Page-processing configuration
#[derive(Debug, Clone)]
pub struct CropConfig {
    /// Marker identifier assignment for the four page roles
    pub roles: RoleIds,
    /// Gap in pixels between marker edges and the crop lines
    pub inset: f32,
    /// Half-width in degrees of the rotation snap windows
    pub snap_tolerance: f64,
    /// Detector tunables
    pub detector: DetectorParams,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            roles: RoleIds::default(),
            inset: DEFAULT_INSET,
            snap_tolerance: DEFAULT_SNAP_TOLERANCE_DEG,
            detector: DetectorParams::default(),
        }
    }
}

/// Detect the fiducial markers in a page photograph and crop it to the
/// marked content area
pub fn process(
    image: DynamicImage,
    config: &CropConfig,
    verbose: bool,
) -> Result<DynamicImage, CropError> {
    let gray = image.to_luma8();
    let detections = detect_markers(&gray, &config.detector);

    if verbose {
        eprintln!("Detected {} markers", detections.len());
        for detection in &detections {
            eprintln!(
                "  id {} at ({:.1}, {:.1})",
                detection.id, detection.corners[0].x, detection.corners[0].y
            );
        }
    }

    process_detections(image, detections, config, verbose)
}

/// Classify, orient, and crop a page from already-decoded detections.
/// Split out of `process` so callers can drive synthetic detections
/// through the same path.
pub fn process_detections(
    image: DynamicImage,
    mut detections: Vec<MarkerDetection>,
    config: &CropConfig,
    verbose: bool,
) -> Result<DynamicImage, CropError> {
    let parity = classify_parity(&detections, &config.roles);
    let partition = partition_roles(&detections, parity, &config.roles);
    if partition.sides.len() != 2 || partition.top_bottom.len() != 2 {
        return Err(CropError::MarkerCount {
            sides: partition.sides.len(),
            top_bottom: partition.top_bottom.len(),
        });
    }

    // Estimated once, from the first side marker in detector order
    let estimate = estimate_rotation(&detections[partition.sides[0]]);
    let orientation = snap_orientation(estimate, config.snap_tolerance);

    if verbose {
        eprintln!("Page parity: {:?}", parity);
        eprintln!("Rotation estimate: {:.2}° -> {:?}", estimate, orientation);
    }

    // One pass updates every detection, so the partition indices keep
    // addressing the same markers afterwards
    let image = apply_orientation(orientation, image, &mut detections);

    let rect = compute_crop(
        (
            &detections[partition.sides[0]],
            &detections[partition.sides[1]],
        ),
        (
            &detections[partition.top_bottom[0]],
            &detections[partition.top_bottom[1]],
        ),
        parity,
        config.inset,
    )
    .clamp_to(image.width(), image.height());

    if rect.is_degenerate() {
        return Err(CropError::DegenerateCrop {
            left: rect.left,
            right: rect.right,
            top: rect.top,
            bottom: rect.bottom,
        });
    }

    if verbose {
        eprintln!(
            "Crop bounds: left={} right={} top={} bottom={}",
            rect.left, rect.right, rect.top, rect.bottom
        );
    }

    Ok(image.crop_imm(
        rect.left as u32,
        rect.top as u32,
        rect.width() as u32,
        rect.height() as u32,
    ))
}
