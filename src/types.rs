use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a box type in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxId(String);

impl BoxId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BoxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a reel profile, e.g. "1.60".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReelId(String);

impl ReelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Folded box dimensions in mm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldedDims {
    pub length: u32,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for FoldedDims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.length, self.width, self.height)
    }
}

/// Physical plate(s) a box is cut from.
///
/// `plate_length` is the length of one physical plate. For double plates it
/// is the half-plate length including the overlap, while `flattened_length`
/// keeps the full unfolded length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateGeometry {
    pub flattened_length: u32,
    pub plate_length: u32,
    pub plate_height: u32,
    pub multiplier: u32,
}

impl PlateGeometry {
    pub fn is_double(&self) -> bool {
        self.multiplier == 2
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxSpec {
    pub id: BoxId,
    pub name: String,
    /// Absent when the box was supplied as pre-derived plate dimensions.
    pub folded: Option<FoldedDims>,
    pub plate: PlateGeometry,
}

impl BoxSpec {
    pub fn plate_length(&self) -> u32 {
        self.plate.plate_length
    }

    pub fn plate_height(&self) -> u32 {
        self.plate.plate_height
    }

    pub fn multiplier(&self) -> u32 {
        self.plate.multiplier
    }

    /// Physical plates needed to build `qty` boxes.
    pub fn plates_for(&self, qty: u32) -> u64 {
        qty as u64 * self.plate.multiplier as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReelProfile {
    pub id: ReelId,
    pub width: u32,
    pub usable: u32,
}

impl ReelProfile {
    pub fn new(id: impl Into<String>, width: u32, usable: u32) -> Self {
        Self {
            id: ReelId::new(id),
            width,
            usable,
        }
    }

    pub fn trim(&self) -> u32 {
        self.width.saturating_sub(self.usable)
    }
}

impl std::fmt::Display for ReelProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}mm usable)", self.id, self.usable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRequest {
    pub box_id: BoxId,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub quantity: u32,
}

impl ProductionRequest {
    pub fn new(box_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            box_id: BoxId::new(box_id),
            quantity,
        }
    }
}

/// Which reel the planner commits to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReelChoice {
    #[default]
    Auto,
    Forced(ReelId),
}

impl std::str::FromStr for ReelChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("reel choice must not be empty".to_string()),
            "auto" => Ok(ReelChoice::Auto),
            id => Ok(ReelChoice::Forced(ReelId::new(id))),
        }
    }
}

/// One lane group inside a pass: `count` plates of one box side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutSlot {
    pub box_id: BoxId,
    pub plate_height: u32,
    pub plate_length: u32,
    pub count: u32,
}

impl CutSlot {
    pub fn width(&self) -> u32 {
        self.plate_height * self.count
    }
}

/// One committed pass across the reel, repeated `rows` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutPlan {
    pub reel: ReelProfile,
    pub slots: Vec<CutSlot>,
    /// Distinct plate lengths, ascending. Never more than two.
    pub cut_lengths: Vec<u32>,
    pub width_used: u32,
    pub waste_width: u32,
    pub waste_percent: f64,
    pub rows: u64,
    /// Reel consumed by this pass: rows times the longest cut length.
    pub linear_mm: u64,
    pub linear_meters: f64,
}

impl CutPlan {
    pub fn plates(&self) -> u64 {
        self.slots
            .iter()
            .map(|s| s.count as u64 * self.rows)
            .sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanTotals {
    pub passes: usize,
    pub total_plates: u64,
    pub total_linear_mm: u64,
    pub total_linear_meters: f64,
    /// Waste percent of each pass weighted by its row count.
    pub weighted_waste_percent: f64,
}

impl PlanTotals {
    pub fn from_passes(passes: &[CutPlan]) -> Self {
        let total_rows: u64 = passes.iter().map(|p| p.rows).sum();
        let total_linear_mm: u64 = passes.iter().map(|p| p.linear_mm).sum();
        let weighted_waste_percent = if total_rows == 0 {
            0.0
        } else {
            passes
                .iter()
                .map(|p| p.waste_percent * p.rows as f64)
                .sum::<f64>()
                / total_rows as f64
        };
        Self {
            passes: passes.len(),
            total_plates: passes.iter().map(|p| p.plates()).sum(),
            total_linear_mm,
            total_linear_meters: mm_to_meters(total_linear_mm),
            weighted_waste_percent,
        }
    }
}

/// Plates still pending for a box when the packer stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidualPending {
    pub box_id: BoxId,
    pub plates: u64,
}

/// Outcome of one combined-packer run on one reel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackResult {
    pub reel: ReelProfile,
    pub passes: Vec<CutPlan>,
    pub totals: PlanTotals,
    /// Boxes whose plate height exceeds this reel's usable width.
    pub unplaceable: Vec<BoxId>,
    /// Non-empty only when the pass limit was reached.
    pub residual: Vec<ResidualPending>,
}

impl PackResult {
    pub fn is_partial(&self) -> bool {
        !self.residual.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionReason {
    ExactFit,
    CompletesRow,
    SavesMaterial,
}

impl std::fmt::Display for SuggestionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestionReason::ExactFit => write!(f, "exact match, rows are full"),
            SuggestionReason::CompletesRow => write!(f, "completes a row"),
            SuggestionReason::SavesMaterial => write!(f, "saves material"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitySuggestion {
    pub box_id: BoxId,
    pub original_qty: u32,
    pub suggested_qty: u64,
    pub difference: i64,
    pub reel: ReelId,
    pub boxes_per_row: u32,
    pub rows: u64,
    pub waste_percent: f64,
    pub linear_meters: f64,
    pub is_minimum: bool,
    pub reason: SuggestionReason,
}

pub fn waste_percent(waste_width: u32, usable: u32) -> f64 {
    if usable == 0 {
        return 0.0;
    }
    waste_width as f64 / usable as f64 * 100.0
}

pub fn mm_to_meters(mm: u64) -> f64 {
    mm as f64 / 1000.0
}

/// Accepts any non-negative integral JSON number, including `12.0`.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative integer, got {value}"
        )));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(rows: u64, waste_width: u32, lengths: &[u32]) -> CutPlan {
        let reel = ReelProfile::new("1.60", 1600, 1520);
        let width_used = reel.usable - waste_width;
        let longest = *lengths.iter().max().unwrap();
        CutPlan {
            slots: vec![CutSlot {
                box_id: BoxId::new("a"),
                plate_height: width_used,
                plate_length: longest,
                count: 1,
            }],
            cut_lengths: lengths.to_vec(),
            width_used,
            waste_width,
            waste_percent: waste_percent(waste_width, reel.usable),
            rows,
            linear_mm: rows * longest as u64,
            linear_meters: mm_to_meters(rows * longest as u64),
            reel,
        }
    }

    #[test]
    fn test_totals_weight_waste_by_rows() {
        let passes = vec![pass(300, 0, &[850]), pass(100, 152, &[1000])];
        let totals = PlanTotals::from_passes(&passes);
        assert_eq!(totals.passes, 2);
        assert_eq!(totals.total_plates, 400);
        assert_eq!(totals.total_linear_mm, 300 * 850 + 100 * 1000);
        assert!((totals.weighted_waste_percent - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_totals_empty() {
        let totals = PlanTotals::from_passes(&[]);
        assert_eq!(totals, PlanTotals::default());
    }

    #[test]
    fn test_reel_choice_parse() {
        assert_eq!("auto".parse::<ReelChoice>(), Ok(ReelChoice::Auto));
        assert_eq!(
            "1.30".parse::<ReelChoice>(),
            Ok(ReelChoice::Forced(ReelId::new("1.30")))
        );
        assert!("".parse::<ReelChoice>().is_err());
    }

    #[test]
    fn test_request_quantity_accepts_integral_floats() {
        let req: ProductionRequest =
            serde_json::from_str(r#"{"box_id": "20x20x10", "quantity": 12.0}"#).unwrap();
        assert_eq!(req.quantity, 12);
        assert!(
            serde_json::from_str::<ProductionRequest>(r#"{"box_id": "x", "quantity": -3}"#)
                .is_err()
        );
        assert!(
            serde_json::from_str::<ProductionRequest>(r#"{"box_id": "x", "quantity": 1.5}"#)
                .is_err()
        );
    }
}
