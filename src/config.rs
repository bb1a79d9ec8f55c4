use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const MAX_PLATE_LENGTH: u32 = 2080;
pub const MAX_DISTINCT_CUT_LENGTHS: usize = 2;
pub const GLUE_FLAP: u32 = 50;
pub const CHAPETON_OVERLAP: u32 = 25;
pub const QUANTITY_TOLERANCE_PERCENT: u64 = 95;
pub const MAX_SUGGESTIONS: usize = 4;
pub const DEFAULT_MAX_PASSES: usize = 50;

/// Machine limits and tuning knobs for one planning run. All lengths in mm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub max_plate_length: u32,
    pub glue_flap: u32,
    pub overlap: u32,
    /// Lower bound for a suggested quantity, as a percent of the request.
    pub quantity_tolerance_percent: u64,
    pub max_suggestions: usize,
    /// Upper bound on passes the combined packer commits before giving up.
    pub max_passes: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            max_plate_length: MAX_PLATE_LENGTH,
            glue_flap: GLUE_FLAP,
            overlap: CHAPETON_OVERLAP,
            quantity_tolerance_percent: QUANTITY_TOLERANCE_PERCENT,
            max_suggestions: MAX_SUGGESTIONS,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl MachineConfig {
    /// Rejects limits the cutting line cannot run with. Only the pass cap and
    /// the suggestion count are free to vary; everything else may tighten
    /// the machine limits but never loosen them.
    pub fn validate(&self) -> Result<()> {
        if self.max_plate_length == 0 || self.max_plate_length > MAX_PLATE_LENGTH {
            return Err(Error::InvalidConfig(format!(
                "max_plate_length must be in 1..={MAX_PLATE_LENGTH}, got {}",
                self.max_plate_length
            )));
        }
        if self.overlap >= self.max_plate_length {
            return Err(Error::InvalidConfig(format!(
                "overlap {}mm leaves no room on a {}mm plate",
                self.overlap, self.max_plate_length
            )));
        }
        if self.glue_flap >= self.max_plate_length {
            return Err(Error::InvalidConfig(format!(
                "glue_flap {}mm leaves no room on a {}mm plate",
                self.glue_flap, self.max_plate_length
            )));
        }
        if self.quantity_tolerance_percent > 100 {
            return Err(Error::InvalidConfig(format!(
                "quantity_tolerance_percent must be at most 100, got {}",
                self.quantity_tolerance_percent
            )));
        }
        if self.max_passes == 0 {
            return Err(Error::InvalidConfig("max_passes must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Smallest quantity still accepted as a rounding of `qty`.
    pub fn min_accepted_qty(&self, qty: u32) -> u64 {
        (u64::from(qty) * self.quantity_tolerance_percent.min(100)).div_ceil(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_accepted_qty_rounds_up() {
        let cfg = MachineConfig::default();
        assert_eq!(cfg.min_accepted_qty(1000), 950);
        assert_eq!(cfg.min_accepted_qty(7), 7);
        assert_eq!(cfg.min_accepted_qty(0), 0);
    }

    #[test]
    fn test_tolerance_above_full_is_capped() {
        let cfg = MachineConfig {
            quantity_tolerance_percent: u64::MAX,
            ..MachineConfig::default()
        };
        assert_eq!(cfg.min_accepted_qty(u32::MAX), u64::from(u32::MAX));
    }

    #[test]
    fn test_validate_defaults() {
        assert_eq!(MachineConfig::default().validate(), Ok(()));
        let tighter = MachineConfig {
            max_plate_length: 1800,
            max_passes: 1,
            ..MachineConfig::default()
        };
        assert_eq!(tighter.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_loosened_limits() {
        let rejected = [
            MachineConfig {
                max_plate_length: 3000,
                ..MachineConfig::default()
            },
            MachineConfig {
                max_plate_length: 0,
                ..MachineConfig::default()
            },
            MachineConfig {
                overlap: u32::MAX,
                ..MachineConfig::default()
            },
            MachineConfig {
                glue_flap: u32::MAX,
                ..MachineConfig::default()
            },
            MachineConfig {
                quantity_tolerance_percent: u64::MAX,
                ..MachineConfig::default()
            },
            MachineConfig {
                max_passes: 0,
                ..MachineConfig::default()
            },
        ];
        for cfg in rejected {
            assert!(
                matches!(cfg.validate(), Err(Error::InvalidConfig(_))),
                "{cfg:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg: MachineConfig = serde_json::from_str(r#"{"max_passes": 3}"#).unwrap();
        assert_eq!(cfg.max_passes, 3);
        assert_eq!(cfg.max_plate_length, 2080);
    }
}
