//! Flattened plate geometry for Regular Slotted Containers.

use crate::config::MachineConfig;
use crate::error::{Error, Result};
use crate::types::{BoxId, BoxSpec, FoldedDims, PlateGeometry};

/// Unfolds a box: `2L + 2W + glue flap` long, `H + W` high.
///
/// Plates longer than the machine limit are split into two half-plates of
/// `ceil(len / 2) + overlap` each.
pub fn derive_unfolded(folded: FoldedDims, config: &MachineConfig) -> Result<PlateGeometry> {
    let FoldedDims {
        length,
        width,
        height,
    } = folded;
    if length == 0 || width == 0 || height == 0 {
        return Err(Error::InvalidDimension(format!(
            "folded dimensions must be non-zero, got {folded}"
        )));
    }
    let flattened_length = 2 * length as u64 + 2 * width as u64 + config.glue_flap as u64;
    let plate_height = height as u64 + width as u64;
    match (u32::try_from(flattened_length), u32::try_from(plate_height)) {
        (Ok(flattened_length), Ok(plate_height)) => {
            split_plate(flattened_length, plate_height, config)
        }
        _ => Err(Error::InvalidDimension(format!(
            "folded dimensions {folded} are out of range"
        ))),
    }
}

/// Applies the double-plate rule to an already flattened plate.
pub fn split_plate(
    flattened_length: u32,
    plate_height: u32,
    config: &MachineConfig,
) -> Result<PlateGeometry> {
    if flattened_length == 0 || plate_height == 0 {
        return Err(Error::InvalidDimension(format!(
            "plate dimensions must be non-zero, got {flattened_length}x{plate_height}"
        )));
    }
    if flattened_length <= config.max_plate_length {
        return Ok(PlateGeometry {
            flattened_length,
            plate_length: flattened_length,
            plate_height,
            multiplier: 1,
        });
    }

    let Some(half) = flattened_length
        .div_ceil(2)
        .checked_add(config.overlap)
        .filter(|&half| half <= config.max_plate_length)
    else {
        return Err(Error::InvalidDimension(format!(
            "plate length {flattened_length}mm exceeds {}mm even as a double plate",
            config.max_plate_length
        )));
    };
    Ok(PlateGeometry {
        flattened_length,
        plate_length: half,
        plate_height,
        multiplier: 2,
    })
}

impl BoxSpec {
    /// Builds a box from folded dimensions in mm.
    pub fn from_folded(
        id: impl Into<String>,
        name: impl Into<String>,
        folded: FoldedDims,
        config: &MachineConfig,
    ) -> Result<Self> {
        Ok(Self {
            id: BoxId::new(id),
            name: name.into(),
            folded: Some(folded),
            plate: derive_unfolded(folded, config)?,
        })
    }

    /// Builds a box from pre-derived flattened plate dimensions in mm.
    pub fn from_plate(
        id: impl Into<String>,
        name: impl Into<String>,
        flattened_length: u32,
        plate_height: u32,
        config: &MachineConfig,
    ) -> Result<Self> {
        Ok(Self {
            id: BoxId::new(id),
            name: name.into(),
            folded: None,
            plate: split_plate(flattened_length, plate_height, config)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(length: u32, width: u32, height: u32) -> FoldedDims {
        FoldedDims {
            length,
            width,
            height,
        }
    }

    #[test]
    fn test_single_plate() {
        let plate = derive_unfolded(dims(200, 200, 100), &MachineConfig::default()).unwrap();
        assert_eq!(plate.plate_length, 850);
        assert_eq!(plate.plate_height, 300);
        assert_eq!(plate.multiplier, 1);
        assert_eq!(plate.flattened_length, 850);
    }

    #[test]
    fn test_double_plate() {
        // 2*700 + 2*500 + 50 = 2450
        let plate = derive_unfolded(dims(700, 500, 500), &MachineConfig::default()).unwrap();
        assert_eq!(plate.flattened_length, 2450);
        assert_eq!(plate.multiplier, 2);
        assert_eq!(plate.plate_length, 1250);
        assert_eq!(plate.plate_height, 1000);
        assert!(plate.plate_length <= 2080);
        // Joined halves cover the full length
        assert!(2 * plate.plate_length >= plate.flattened_length);
    }

    #[test]
    fn test_limit_is_inclusive() {
        let plate = split_plate(2080, 500, &MachineConfig::default()).unwrap();
        assert_eq!(plate.multiplier, 1);
        let plate = split_plate(2081, 500, &MachineConfig::default()).unwrap();
        assert_eq!(plate.multiplier, 2);
        assert_eq!(plate.plate_length, 1041 + 25);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let cfg = MachineConfig::default();
        assert!(matches!(
            derive_unfolded(dims(0, 200, 100), &cfg),
            Err(Error::InvalidDimension(_))
        ));
        assert!(matches!(
            derive_unfolded(dims(200, 200, 0), &cfg),
            Err(Error::InvalidDimension(_))
        ));
        assert!(matches!(
            split_plate(850, 0, &cfg),
            Err(Error::InvalidDimension(_))
        ));
    }

    #[test]
    fn test_too_long_even_split() {
        let cfg = MachineConfig::default();
        assert!(matches!(
            split_plate(5000, 300, &cfg),
            Err(Error::InvalidDimension(_))
        ));
    }

    #[test]
    fn test_huge_overlap_is_an_error() {
        let cfg = MachineConfig {
            overlap: u32::MAX,
            ..MachineConfig::default()
        };
        assert!(matches!(
            derive_unfolded(dims(700, 500, 500), &cfg),
            Err(Error::InvalidDimension(_))
        ));
    }

    #[test]
    fn test_box_from_plate_matches_folded() {
        let cfg = MachineConfig::default();
        let a = BoxSpec::from_folded("a", "A", dims(700, 500, 500), &cfg).unwrap();
        let b = BoxSpec::from_plate("b", "B", 2450, 1000, &cfg).unwrap();
        assert_eq!(a.plate, b.plate);
        assert_eq!(a.plates_for(10), 20);
        assert!(b.folded.is_none());
    }
}
