//! Single-lane baseline: one box type per reel, no mixing.

use serde::{Deserialize, Serialize};

use crate::types::{BoxId, BoxSpec, ReelId, ReelProfile, mm_to_meters, waste_percent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneOption {
    pub reel: ReelId,
    pub boxes_per_row: u32,
    pub row_width: u32,
    pub waste_width: u32,
    pub waste_percent: f64,
    pub plates: u64,
    pub rows: u64,
    pub linear_mm: u64,
    pub linear_meters: f64,
}

/// Baseline for one box across every reel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneBaseline {
    pub box_id: BoxId,
    pub quantity: u32,
    /// Feasible options, best first.
    pub options: Vec<LaneOption>,
    /// Reels the plate does not fit across.
    pub infeasible_on: Vec<ReelId>,
}

impl LaneBaseline {
    pub fn best(&self) -> Option<&LaneOption> {
        self.options.first()
    }

    pub fn is_infeasible(&self) -> bool {
        self.options.is_empty()
    }
}

/// Plates of `spec` that fit side by side across the reel.
pub fn boxes_per_row(spec: &BoxSpec, reel: &ReelProfile) -> u32 {
    reel.usable / spec.plate_height()
}

/// Packs `qty` boxes of one type on one reel. `None` if the plate is taller
/// than the usable width.
pub fn evaluate(spec: &BoxSpec, qty: u32, reel: &ReelProfile) -> Option<LaneOption> {
    let per_row = boxes_per_row(spec, reel);
    if per_row == 0 {
        return None;
    }
    let row_width = per_row * spec.plate_height();
    let waste_width = reel.usable - row_width;
    let plates = spec.plates_for(qty);
    let rows = plates.div_ceil(per_row as u64);
    let linear_mm = rows * spec.plate_length() as u64;
    Some(LaneOption {
        reel: reel.id.clone(),
        boxes_per_row: per_row,
        row_width,
        waste_width,
        waste_percent: waste_percent(waste_width, reel.usable),
        plates,
        rows,
        linear_mm,
        linear_meters: mm_to_meters(linear_mm),
    })
}

/// Evaluates every reel and orders options by waste, then reel length used.
pub fn baseline(spec: &BoxSpec, qty: u32, reels: &[ReelProfile]) -> LaneBaseline {
    let mut options = Vec::new();
    let mut infeasible_on = Vec::new();
    for reel in reels {
        match evaluate(spec, qty, reel) {
            Some(option) => options.push(option),
            None => infeasible_on.push(reel.id.clone()),
        }
    }
    // Waste compared on integers: a/ua < b/ub  <=>  a*ub < b*ua
    let usable_of = |id: &ReelId| {
        reels
            .iter()
            .find(|r| &r.id == id)
            .map_or(1, |r| r.usable as u64)
    };
    options.sort_by(|a, b| {
        let lhs = a.waste_width as u64 * usable_of(&b.reel);
        let rhs = b.waste_width as u64 * usable_of(&a.reel);
        lhs.cmp(&rhs).then(a.linear_mm.cmp(&b.linear_mm))
    });
    LaneBaseline {
        box_id: spec.id.clone(),
        quantity: qty,
        options,
        infeasible_on,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MachineConfig;

    fn reels() -> Vec<ReelProfile> {
        vec![
            ReelProfile::new("1.60", 1600, 1520),
            ReelProfile::new("1.30", 1300, 1230),
        ]
    }

    fn plate_box(id: &str, flattened: u32, height: u32) -> BoxSpec {
        BoxSpec::from_plate(id, id, flattened, height, &MachineConfig::default()).unwrap()
    }

    #[test]
    fn test_wide_reel_scenario() {
        let spec = plate_box("20x20x10", 850, 300);
        let option = evaluate(&spec, 1000, &reels()[0]).unwrap();
        assert_eq!(option.boxes_per_row, 5);
        assert_eq!(option.row_width, 1500);
        assert!((option.waste_percent - 1.3158).abs() < 0.001);
        assert_eq!(option.rows, 200);
        assert!((option.linear_meters - 170.0).abs() < 1e-9);
    }

    #[test]
    fn test_best_prefers_lower_waste() {
        // 1520 % 300 = 20 (1.3%), 1230 % 300 = 30 (2.4%)
        let spec = plate_box("20x20x10", 850, 300);
        let base = baseline(&spec, 1000, &reels());
        assert_eq!(base.options.len(), 2);
        assert_eq!(base.best().unwrap().reel, ReelId::new("1.60"));
        assert!(base.infeasible_on.is_empty());
    }

    #[test]
    fn test_tie_broken_by_linear_meters() {
        let reels = vec![
            ReelProfile::new("narrow", 700, 600),
            ReelProfile::new("wide", 1300, 1200),
        ];
        let spec = plate_box("a", 1000, 300);
        let base = baseline(&spec, 40, &reels);
        // Both reels waste 0%; the wide one needs half the rows
        assert_eq!(base.best().unwrap().reel, ReelId::new("wide"));
        assert_eq!(base.best().unwrap().rows, 10);
    }

    #[test]
    fn test_infeasible_reel_recorded() {
        let spec = plate_box("tall", 1000, 1300);
        let base = baseline(&spec, 10, &reels());
        assert_eq!(base.options.len(), 1);
        assert_eq!(base.infeasible_on, vec![ReelId::new("1.30")]);

        let giant = plate_box("giant", 1000, 1600);
        let base = baseline(&giant, 10, &reels());
        assert!(base.is_infeasible());
        assert!(base.best().is_none());
    }

    #[test]
    fn test_double_plate_needs_twice_the_plates() {
        let spec = plate_box("70x50x50", 2450, 1000);
        let option = evaluate(&spec, 10, &reels()[0]).unwrap();
        assert_eq!(option.boxes_per_row, 1);
        assert_eq!(option.plates, 20);
        assert_eq!(option.rows, 20);
        assert_eq!(option.linear_mm, 20 * 1250);
    }

    #[test]
    fn test_waste_bounds() {
        for height in [100, 250, 300, 333, 700, 1000, 1230, 1520] {
            let spec = plate_box("x", 900, height);
            for reel in reels() {
                if let Some(option) = evaluate(&spec, 1, &reel) {
                    assert!(option.waste_percent >= 0.0);
                    assert!(option.waste_percent < 100.0);
                }
            }
        }
    }
}
