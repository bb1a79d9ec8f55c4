use crate::types::CutPlan;

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 24.0;

/// Draws one row of a pass: reel length runs left to right, usable width
/// top to bottom. Each lane is one plate; unused width is shaded with `.`.
pub fn render_pass(plan: &CutPlan) -> String {
    let length = plan.cut_lengths.last().copied().unwrap_or(0);
    let usable = plan.reel.usable;
    if length == 0 || usable == 0 {
        return String::new();
    }

    // Axes scale independently; a reel row is far wider than it is long
    let scale_x = MAX_WIDTH / length as f64;
    let scale_y = MAX_HEIGHT / usable as f64;
    let grid_w = MAX_WIDTH as usize;
    let grid_h = MAX_HEIGHT as usize;
    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];

    // Waste strip under the last lane
    let used_h = (plan.width_used as f64 * scale_y).round() as usize;
    for row in grid.iter_mut().take(grid_h).skip(used_h + 1) {
        for cell in row.iter_mut().take(grid_w).skip(1) {
            *cell = '.';
        }
    }

    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    let mut offset = 0u32;
    for slot in &plan.slots {
        for _ in 0..slot.count {
            let sy = (offset as f64 * scale_y).round() as usize;
            let ey = ((offset + slot.plate_height) as f64 * scale_y).round() as usize;
            let sw = (slot.plate_length as f64 * scale_x).round() as usize;
            offset += slot.plate_height;

            let sh = ey.saturating_sub(sy);
            if sw == 0 || sh == 0 {
                continue;
            }
            draw_rect(&mut grid, 0, sy, sw, sh);

            let label = format!("{} {}x{}", slot.box_id, slot.plate_length, slot.plate_height);
            let label_chars: Vec<char> = label.chars().collect();
            if sh >= 2 && sw > label_chars.len() + 1 {
                let cy = sy + sh / 2;
                let start_x = (sw / 2).saturating_sub(label_chars.len() / 2).max(1);
                for (i, &ch) in label_chars.iter().enumerate() {
                    let x = start_x + i;
                    if x < sw {
                        grid[cy][x] = ch;
                    }
                }
            }
        }
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let cols = match grid.first() {
        Some(row) => row.len(),
        None => return,
    };

    let mut put = |gx: usize, gy: usize, edge: char| {
        if gx >= cols || gy >= rows {
            return;
        }
        let cell = &mut grid[gy][gx];
        *cell = match (*cell, edge) {
            ('+', _) => '+',
            ('|', '-') | ('-', '|') => '+',
            _ => edge,
        };
    };

    for i in x..=x + w {
        put(i, y, '-');
        put(i, y + h, '-');
    }
    for j in y..=y + h {
        put(x, j, '|');
        put(x + w, j, '|');
    }
    for &cx in &[x, x + w] {
        for &cy in &[y, y + h] {
            put(cx, cy, '+');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoxId, CutSlot, ReelProfile, mm_to_meters, waste_percent};

    fn plan(slots: Vec<CutSlot>) -> CutPlan {
        let reel = ReelProfile::new("1.60", 1600, 1520);
        let width_used: u32 = slots.iter().map(|s| s.width()).sum();
        let mut cut_lengths: Vec<u32> = slots.iter().map(|s| s.plate_length).collect();
        cut_lengths.sort_unstable();
        cut_lengths.dedup();
        let longest = *cut_lengths.last().unwrap() as u64;
        CutPlan {
            waste_width: reel.usable - width_used,
            waste_percent: waste_percent(reel.usable - width_used, reel.usable),
            reel,
            slots,
            cut_lengths,
            width_used,
            rows: 10,
            linear_mm: 10 * longest,
            linear_meters: mm_to_meters(10 * longest),
        }
    }

    fn slot(id: &str, length: u32, height: u32, count: u32) -> CutSlot {
        CutSlot {
            box_id: BoxId::new(id),
            plate_height: height,
            plate_length: length,
            count,
        }
    }

    #[test]
    fn test_render_single_lane_type() {
        let output = render_pass(&plan(vec![slot("20x20x10", 850, 300, 5)]));
        assert!(output.contains('+'));
        assert!(output.contains('-'));
        assert!(output.contains('|'));
        assert!(output.contains("20x20x10 850x300"));
        // 20mm of waste is too thin to shade at this scale
        assert!(!output.contains('.'));
    }

    #[test]
    fn test_render_two_lengths_with_waste() {
        let output = render_pass(&plan(vec![
            slot("40x30x20", 1450, 500, 1),
            slot("20x20x10", 850, 300, 1),
        ]));
        assert!(output.contains("40x30x20 1450x500"));
        assert!(output.contains("20x20x10 850x300"));
        assert!(output.contains('.'));
    }

    #[test]
    fn test_render_empty() {
        let mut empty = plan(vec![slot("a", 850, 300, 1)]);
        empty.cut_lengths.clear();
        assert!(render_pass(&empty).is_empty());
    }
}
