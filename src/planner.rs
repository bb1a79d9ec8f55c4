use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::advisor;
use crate::config::MachineConfig;
use crate::error::{Error, Result};
use crate::lane::{self, LaneBaseline};
use crate::packer::{Packer, PlateDemand};
use crate::types::{
    BoxId, BoxSpec, PackResult, ProductionRequest, QuantitySuggestion, ReelChoice, ReelId,
    ReelProfile,
};

/// Everything one planning run produces, for every configured reel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionPlan {
    pub selected: ReelId,
    /// One combined-packer run per reel, in reel order.
    pub runs: Vec<PackResult>,
    pub baseline: Vec<LaneBaseline>,
    pub suggestions: Vec<QuantitySuggestion>,
    /// Boxes that fit across no reel at all.
    pub infeasible: Vec<BoxId>,
    pub total_boxes: u64,
    pub total_plates: u64,
}

impl ProductionPlan {
    pub fn selected_run(&self) -> Option<&PackResult> {
        self.runs.iter().find(|r| r.reel.id == self.selected)
    }
}

pub struct Planner {
    reels: Vec<ReelProfile>,
    config: MachineConfig,
}

impl Planner {
    pub fn new(reels: Vec<ReelProfile>, config: MachineConfig) -> Result<Self> {
        config.validate()?;
        if reels.is_empty() {
            return Err(Error::InvalidDimension(
                "at least one reel profile is required".to_string(),
            ));
        }
        let mut ids = HashSet::new();
        for reel in &reels {
            if reel.usable == 0 || reel.usable >= reel.width {
                return Err(Error::InvalidDimension(format!(
                    "reel {} must have 0 < usable < width, got usable {} of {}",
                    reel.id, reel.usable, reel.width
                )));
            }
            if !ids.insert(&reel.id) {
                return Err(Error::DuplicateReel(reel.id.clone()));
            }
        }
        Ok(Self { reels, config })
    }

    pub fn plan(
        &self,
        boxes: &[BoxSpec],
        requests: &[ProductionRequest],
        choice: &ReelChoice,
    ) -> Result<ProductionPlan> {
        let catalog = self.validate_boxes(boxes)?;
        let wanted = merge_requests(requests, &catalog)?;
        if let ReelChoice::Forced(id) = choice
            && !self.reels.iter().any(|r| &r.id == id)
        {
            return Err(Error::UnknownReel(id.clone()));
        }

        let runs: Vec<PackResult> = self
            .reels
            .iter()
            .map(|reel| {
                let demands = wanted
                    .iter()
                    .map(|&(spec, qty)| PlateDemand::from_spec(spec, qty))
                    .collect();
                Packer::new(reel.clone(), self.config.max_passes, demands).solve()
            })
            .collect();

        let baseline: Vec<LaneBaseline> = wanted
            .iter()
            .map(|&(spec, qty)| lane::baseline(spec, qty, &self.reels))
            .collect();
        let infeasible = baseline
            .iter()
            .filter(|b| b.is_infeasible())
            .map(|b| b.box_id.clone())
            .collect();
        let suggestions = wanted
            .iter()
            .flat_map(|&(spec, qty)| advisor::suggest(spec, qty, &self.reels, &self.config))
            .collect();

        let selected = match choice {
            ReelChoice::Forced(id) => id.clone(),
            ReelChoice::Auto => select_reel(&runs)
                .ok_or_else(|| {
                    Error::InvalidDimension("at least one reel profile is required".to_string())
                })?,
        };

        let plan = ProductionPlan {
            selected,
            total_boxes: wanted.iter().map(|&(_, qty)| qty as u64).sum(),
            total_plates: wanted.iter().map(|&(spec, qty)| spec.plates_for(qty)).sum(),
            runs,
            baseline,
            suggestions,
            infeasible,
        };

        if let Some(run) = plan.selected_run() {
            info!(
                reel = %plan.selected,
                boxes = wanted.len(),
                passes = run.totals.passes,
                linear_meters = run.totals.total_linear_meters,
                waste_percent = run.totals.weighted_waste_percent,
                partial = run.is_partial(),
                "production plan ready"
            );
        }
        Ok(plan)
    }

    fn validate_boxes<'a>(&self, boxes: &'a [BoxSpec]) -> Result<HashMap<&'a BoxId, &'a BoxSpec>> {
        let mut catalog = HashMap::new();
        for spec in boxes {
            let plate = &spec.plate;
            if plate.plate_length == 0 || plate.plate_height == 0 {
                return Err(Error::InvalidDimension(format!(
                    "box {} has a zero plate dimension",
                    spec.id
                )));
            }
            if plate.plate_length > self.config.max_plate_length {
                return Err(Error::InvalidDimension(format!(
                    "box {} plate length {}mm exceeds {}mm",
                    spec.id, plate.plate_length, self.config.max_plate_length
                )));
            }
            if !matches!(plate.multiplier, 1 | 2) {
                return Err(Error::InvalidDimension(format!(
                    "box {} plate multiplier must be 1 or 2, got {}",
                    spec.id, plate.multiplier
                )));
            }
            if catalog.insert(&spec.id, spec).is_some() {
                return Err(Error::DuplicateBox(spec.id.clone()));
            }
        }
        Ok(catalog)
    }
}

/// Sums repeated requests per box in first-seen order and drops zeros.
fn merge_requests<'a>(
    requests: &[ProductionRequest],
    catalog: &HashMap<&BoxId, &'a BoxSpec>,
) -> Result<Vec<(&'a BoxSpec, u32)>> {
    let mut merged: Vec<(&'a BoxSpec, u32)> = Vec::new();
    for req in requests {
        let spec = *catalog
            .get(&req.box_id)
            .ok_or_else(|| Error::UnknownBox(req.box_id.clone()))?;
        match merged.iter_mut().find(|(s, _)| s.id == req.box_id) {
            Some((_, qty)) => *qty = qty.saturating_add(req.quantity),
            None => merged.push((spec, req.quantity)),
        }
    }
    merged.retain(|&(_, qty)| qty > 0);
    Ok(merged)
}

/// Fewest unplaceable boxes, complete over partial, then lowest row-weighted
/// waste, then least reel length. Earlier reels win ties.
fn select_reel(runs: &[PackResult]) -> Option<ReelId> {
    runs.iter()
        .reduce(|best, run| {
            let better = run
                .unplaceable
                .len()
                .cmp(&best.unplaceable.len())
                .then(run.is_partial().cmp(&best.is_partial()))
                .then(
                    run.totals
                        .weighted_waste_percent
                        .total_cmp(&best.totals.weighted_waste_percent),
                )
                .then(run.totals.total_linear_mm.cmp(&best.totals.total_linear_mm))
                .is_lt();
            if better { run } else { best }
        })
        .map(|run| run.reel.id.clone())
}
