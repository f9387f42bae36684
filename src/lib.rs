pub mod cli;
pub mod crop;
pub mod detector;
pub mod error;
pub mod marker;
pub mod orientation;
pub mod pipeline;

pub use cli::Cli;
pub use crop::{compute_crop, side_bounds, top_bottom_bounds, CropRect};
pub use detector::{detect_markers, draw_marker, DetectorParams};
pub use error::CropError;
pub use marker::{classify_parity, partition_roles, MarkerDetection, PageParity, RoleIds};
pub use orientation::{apply_orientation, estimate_rotation, snap_orientation, Orientation};
pub use pipeline::{process, process_detections, CropConfig};
