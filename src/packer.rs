use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::config::MAX_DISTINCT_CUT_LENGTHS;
use crate::types::{
    BoxId, BoxSpec, CutPlan, CutSlot, PackResult, PlanTotals, ReelProfile, ResidualPending,
    mm_to_meters, waste_percent,
};

/// Plates of one box type waiting to be cut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateDemand {
    pub box_id: BoxId,
    pub plate_length: u32,
    pub plate_height: u32,
    pub plates: u64,
}

impl PlateDemand {
    pub fn new(
        box_id: impl Into<String>,
        plate_length: u32,
        plate_height: u32,
        plates: u64,
    ) -> Self {
        Self {
            box_id: BoxId::new(box_id),
            plate_length,
            plate_height,
            plates,
        }
    }

    pub fn from_spec(spec: &BoxSpec, qty: u32) -> Self {
        Self {
            box_id: spec.id.clone(),
            plate_length: spec.plate_length(),
            plate_height: spec.plate_height(),
            plates: spec.plates_for(qty),
        }
    }
}

/// A width-feasible selection for one pass. Slots index into `Packer::demands`.
#[derive(Debug, Clone)]
struct Candidate {
    slots: Vec<(usize, u32)>,
    width_used: u32,
    cut_lengths: usize,
    rows: u64,
    plates: u64,
}

impl Candidate {
    /// `(100 - waste%) * plates` scaled by the usable width, which is fixed
    /// within one run, so the comparison stays in integers.
    fn score(&self) -> u128 {
        self.width_used as u128 * self.plates as u128
    }

    fn cmp_rank(&self, other: &Candidate) -> Ordering {
        self.score()
            .cmp(&other.score())
            .then(self.width_used.cmp(&other.width_used))
            .then(other.cut_lengths.cmp(&self.cut_lengths))
            .then(other.slots.len().cmp(&self.slots.len()))
    }
}

/// Keeps the earlier candidate unless the later one ranks strictly higher.
fn better(current: Option<Candidate>, found: Option<Candidate>) -> Option<Candidate> {
    match (current, found) {
        (Some(cur), Some(new)) => {
            if new.cmp_rank(&cur) == Ordering::Greater {
                Some(new)
            } else {
                Some(cur)
            }
        }
        (cur, new) => cur.or(new),
    }
}

/// Greedy multi-type packer for one reel.
///
/// Each pass takes the best-scoring mix of at most two cut lengths, commits
/// it for as many rows as its scarcest box allows, and never revisits it.
pub struct Packer {
    reel: ReelProfile,
    max_passes: usize,
    demands: Vec<PlateDemand>,
}

impl Packer {
    pub fn new(reel: ReelProfile, max_passes: usize, mut demands: Vec<PlateDemand>) -> Self {
        // Tallest first; ties by id keep runs reproducible
        demands.sort_by(|a, b| {
            b.plate_height
                .cmp(&a.plate_height)
                .then_with(|| a.box_id.cmp(&b.box_id))
        });
        Self {
            reel,
            max_passes,
            demands,
        }
    }

    pub fn solve(&self) -> PackResult {
        let mut pending: Vec<u64> = self.demands.iter().map(|d| d.plates).collect();
        let mut unplaceable = Vec::new();

        for (i, d) in self.demands.iter().enumerate() {
            if pending[i] > 0 && (d.plate_height == 0 || d.plate_height > self.reel.usable) {
                warn!(
                    box_id = %d.box_id,
                    plate_height = d.plate_height,
                    reel = %self.reel.id,
                    "plate taller than usable reel width"
                );
                unplaceable.push(d.box_id.clone());
                pending[i] = 0;
            }
        }

        let mut passes = Vec::new();
        let mut capped = false;
        while pending.iter().any(|&p| p > 0) {
            if passes.len() >= self.max_passes {
                capped = true;
                warn!(
                    reel = %self.reel.id,
                    passes = passes.len(),
                    "pass limit reached with plates still pending"
                );
                break;
            }

            let Some(best) = self.best_candidate(&pending) else {
                // Unreachable once tall plates are filtered; never spin on leftovers
                for (i, d) in self.demands.iter().enumerate() {
                    if pending[i] > 0 {
                        unplaceable.push(d.box_id.clone());
                        pending[i] = 0;
                    }
                }
                break;
            };

            let plan = self.commit(&best, &mut pending);
            debug!(
                reel = %self.reel.id,
                pass = passes.len() + 1,
                rows = plan.rows,
                width_used = plan.width_used,
                waste_percent = plan.waste_percent,
                "committed pass"
            );
            passes.push(plan);
        }

        let residual = if capped {
            self.demands
                .iter()
                .zip(&pending)
                .filter(|&(_, &p)| p > 0)
                .map(|(d, &p)| ResidualPending {
                    box_id: d.box_id.clone(),
                    plates: p,
                })
                .collect()
        } else {
            Vec::new()
        };

        PackResult {
            reel: self.reel.clone(),
            totals: PlanTotals::from_passes(&passes),
            passes,
            unplaceable,
            residual,
        }
    }

    fn best_candidate(&self, pending: &[u64]) -> Option<Candidate> {
        let mut lengths: Vec<u32> = self
            .demands
            .iter()
            .zip(pending)
            .filter(|&(_, &p)| p > 0)
            .map(|(d, _)| d.plate_length)
            .collect();
        lengths.sort_unstable();
        lengths.dedup();

        length_groups(&lengths, MAX_DISTINCT_CUT_LENGTHS)
            .iter()
            .map(|group| self.best_in_group(pending, group))
            .fold(None, better)
    }

    /// Best candidate using exactly the cut lengths in `group`.
    fn best_in_group(&self, pending: &[u64], group: &[u32]) -> Option<Candidate> {
        let members: Vec<usize> = (0..self.demands.len())
            .filter(|&i| pending[i] > 0 && group.contains(&self.demands[i].plate_length))
            .collect();
        self.explore(pending, &members, 0, self.reel.usable, &[], group.len())
    }

    fn explore(
        &self,
        pending: &[u64],
        members: &[usize],
        start: usize,
        remaining: u32,
        selection: &[(usize, u32)],
        group_size: usize,
    ) -> Option<Candidate> {
        let mut best = None;
        for pos in start..members.len() {
            let idx = members[pos];
            let height = self.demands[idx].plate_height;
            let max_count = (remaining / height) as u64;
            let max_count = max_count.min(pending[idx]) as u32;

            for count in (1..=max_count).rev() {
                let mut next = selection.to_vec();
                next.push((idx, count));
                best = better(best, self.evaluate(pending, &next, group_size));
                best = better(
                    best,
                    self.explore(
                        pending,
                        members,
                        pos + 1,
                        remaining - height * count,
                        &next,
                        group_size,
                    ),
                );
            }
        }
        best
    }

    fn evaluate(
        &self,
        pending: &[u64],
        selection: &[(usize, u32)],
        group_size: usize,
    ) -> Option<Candidate> {
        let mut lengths: Vec<u32> = selection
            .iter()
            .map(|&(i, _)| self.demands[i].plate_length)
            .collect();
        lengths.sort_unstable();
        lengths.dedup();
        if lengths.len() != group_size {
            return None;
        }

        let rows = selection
            .iter()
            .map(|&(i, count)| pending[i].div_ceil(count as u64))
            .min()?;
        if rows == 0 {
            return None;
        }

        let width_used: u32 = selection
            .iter()
            .map(|&(i, count)| self.demands[i].plate_height * count)
            .sum();
        let plates: u64 = selection.iter().map(|&(_, count)| count as u64 * rows).sum();

        Some(Candidate {
            slots: selection.to_vec(),
            width_used,
            cut_lengths: lengths.len(),
            rows,
            plates,
        })
    }

    fn commit(&self, candidate: &Candidate, pending: &mut [u64]) -> CutPlan {
        let slots: Vec<CutSlot> = candidate
            .slots
            .iter()
            .map(|&(i, count)| {
                let d = &self.demands[i];
                pending[i] = pending[i].saturating_sub(count as u64 * candidate.rows);
                CutSlot {
                    box_id: d.box_id.clone(),
                    plate_height: d.plate_height,
                    plate_length: d.plate_length,
                    count,
                }
            })
            .collect();

        let mut cut_lengths: Vec<u32> = slots.iter().map(|s| s.plate_length).collect();
        cut_lengths.sort_unstable();
        cut_lengths.dedup();

        let longest = cut_lengths.last().copied().unwrap_or(0);
        let waste_width = self.reel.usable - candidate.width_used;
        let linear_mm = candidate.rows * longest as u64;

        CutPlan {
            reel: self.reel.clone(),
            slots,
            cut_lengths,
            width_used: candidate.width_used,
            waste_width,
            waste_percent: waste_percent(waste_width, self.reel.usable),
            rows: candidate.rows,
            linear_mm,
            linear_meters: mm_to_meters(linear_mm),
        }
    }
}

/// Every combination of 1..=`max` lengths, smaller groups first, each in
/// lexicographic order of the sorted input.
fn length_groups(lengths: &[u32], max: usize) -> Vec<Vec<u32>> {
    fn combine(
        lengths: &[u32],
        size: usize,
        start: usize,
        prefix: &[u32],
        out: &mut Vec<Vec<u32>>,
    ) {
        if prefix.len() == size {
            out.push(prefix.to_vec());
            return;
        }
        for i in start..lengths.len() {
            let mut next = prefix.to_vec();
            next.push(lengths[i]);
            combine(lengths, size, i + 1, &next, out);
        }
    }

    let mut groups = Vec::new();
    for size in 1..=max.min(lengths.len()) {
        combine(lengths, size, 0, &[], &mut groups);
    }
    groups
}
