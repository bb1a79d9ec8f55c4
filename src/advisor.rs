//! Quantity rounding: nearby quantities that fill every row of a pass.

use std::collections::HashSet;

use crate::config::MachineConfig;
use crate::lane;
use crate::types::{
    BoxSpec, QuantitySuggestion, ReelProfile, SuggestionReason, mm_to_meters, waste_percent,
};

/// Suggests up to `config.max_suggestions` quantities for `qty` boxes of
/// `spec`, each a whole number of full rows on some reel.
///
/// Quantities at or above the request come first, then lower waste, then
/// the smaller relative change.
pub fn suggest(
    spec: &BoxSpec,
    qty: u32,
    reels: &[ReelProfile],
    config: &MachineConfig,
) -> Vec<QuantitySuggestion> {
    let floor = config.min_accepted_qty(qty);
    let mut suggestions = Vec::new();

    for reel in reels {
        let per_row = lane::boxes_per_row(spec, reel);
        if per_row == 0 {
            continue;
        }
        let waste_width = reel.usable - per_row * spec.plate_height();
        let rows_exact = (qty as u64).div_ceil(per_row as u64);

        let candidates = [rows_exact.checked_sub(1), Some(rows_exact), Some(rows_exact + 1)];
        for rows in candidates.into_iter().flatten().filter(|&r| r > 0) {
            let suggested = rows * per_row as u64;
            if suggested < floor {
                continue;
            }
            let difference = suggested as i64 - qty as i64;
            let reason = match difference {
                0 => SuggestionReason::ExactFit,
                d if d > 0 => SuggestionReason::CompletesRow,
                _ => SuggestionReason::SavesMaterial,
            };
            // Double plates need two plate slots per box
            let plate_rows = (suggested * spec.multiplier() as u64).div_ceil(per_row as u64);
            let linear_mm = plate_rows * spec.plate_length() as u64;

            suggestions.push(QuantitySuggestion {
                box_id: spec.id.clone(),
                original_qty: qty,
                suggested_qty: suggested,
                difference,
                reel: reel.id.clone(),
                boxes_per_row: per_row,
                rows,
                waste_percent: waste_percent(waste_width, reel.usable),
                linear_meters: mm_to_meters(linear_mm),
                is_minimum: suggested >= qty as u64,
                reason,
            });
        }
    }

    let mut seen = HashSet::new();
    suggestions.retain(|s| seen.insert((s.suggested_qty, s.reel.clone())));
    // Relative change shares the denominator, so |diff| orders the same
    suggestions.sort_by(|a, b| {
        b.is_minimum
            .cmp(&a.is_minimum)
            .then(a.waste_percent.total_cmp(&b.waste_percent))
            .then(a.difference.unsigned_abs().cmp(&b.difference.unsigned_abs()))
    });
    suggestions.truncate(config.max_suggestions);
    suggestions
}
