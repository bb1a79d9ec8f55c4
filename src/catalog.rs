//! Standard RSC catalog and reel profiles of the plant.

use crate::config::MachineConfig;
use crate::error::Result;
use crate::types::{BoxSpec, FoldedDims, ReelProfile};

/// Folded dimensions in cm, as the boxes are sold.
const STANDARD_BOXES_CM: [(u32, u32, u32); 11] = [
    (20, 20, 10),
    (20, 20, 20),
    (30, 20, 15),
    (30, 20, 20),
    (40, 30, 20),
    (40, 30, 30),
    (50, 40, 30),
    (50, 40, 40),
    (60, 40, 30),
    (60, 40, 40),
    (70, 50, 50),
];

pub const WIDE_REEL: &str = "1.60";
pub const NARROW_REEL: &str = "1.30";

/// The two reels, wide first: 1600mm with 1520mm usable, 1300mm with 1230mm.
pub fn standard_reels() -> Vec<ReelProfile> {
    vec![
        ReelProfile::new(WIDE_REEL, 1600, 1520),
        ReelProfile::new(NARROW_REEL, 1300, 1230),
    ]
}

/// Catalog boxes keyed as `LxWxH` in cm; plate geometry is derived in mm.
pub fn standard_boxes(config: &MachineConfig) -> Result<Vec<BoxSpec>> {
    STANDARD_BOXES_CM
        .iter()
        .map(|&(l, w, h)| {
            let folded = FoldedDims {
                length: l * 10,
                width: w * 10,
                height: h * 10,
            };
            BoxSpec::from_folded(
                format!("{l}x{w}x{h}"),
                format!("{l}×{w}×{h}"),
                folded,
                config,
            )
        })
        .collect()
}
