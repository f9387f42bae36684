use clap::Parser;
use std::path::PathBuf;

use crate::crop::DEFAULT_INSET;
use crate::detector::DetectorParams;
use crate::marker::RoleIds;
use crate::orientation::DEFAULT_SNAP_TOLERANCE_DEG;
use crate::pipeline::CropConfig;

#[derive(Parser, Debug)]
#[command(name = "markcrop")]
#[command(version, about = "Straighten and crop scanned book pages to their fiducial marker frame")]
pub struct Cli {
    /// Input image path
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output image path; the extension picks the format
    #[arg(required = true)]
    pub output: PathBuf,

    /// Gap in pixels between marker edges and the crop lines
    #[arg(long, default_value_t = DEFAULT_INSET)]
    pub inset: f32,

    /// Marker ids as "even-side,even-top,odd-side,odd-top"
    #[arg(long, default_value = "0,1,2,3", value_parser = parse_role_ids)]
    pub marker_ids: RoleIds,

    /// Half-width in degrees of the rotation snap windows
    #[arg(long, default_value_t = DEFAULT_SNAP_TOLERANCE_DEG)]
    pub snap_tolerance: f64,

    /// Show processing details
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// Bundle the flags into a pipeline configuration
    pub fn crop_config(&self) -> CropConfig {
        CropConfig {
            roles: self.marker_ids,
            inset: self.inset,
            snap_tolerance: self.snap_tolerance,
            detector: DetectorParams::default(),
        }
    }
}

fn parse_role_ids(s: &str) -> Result<RoleIds, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Invalid marker id list '{}', expected even-side,even-top,odd-side,odd-top",
            s
        ));
    }

    let mut ids = [0u32; 4];
    for (slot, part) in ids.iter_mut().zip(parts.iter()) {
        *slot = part
            .trim()
            .parse()
            .map_err(|_| format!("Invalid marker id: {}", part))?;
    }

    Ok(RoleIds {
        even_side: ids[0],
        even_top: ids[1],
        odd_side: ids[2],
        odd_top: ids[3],
    })
}
