//! Toroidal grid - Ring-buffered cell storage and the per-row update.
//!
//! The grid holds `frames_per_cycle` temporally-staggered copies of the
//! logical `height x width` field in one flat ring of `vertical x width`
//! cells. Writers advance through the ring row by row; a reader that stays a
//! full generation behind the write frontier observes a coherent frame
//! without any locking.
//!
//! Cell storage is `AtomicI8` accessed with `Ordering::Relaxed` throughout.
//! Races between row workers, the eraser, and the snapshot reader are
//! tolerated: the visualization needs plausible evolving structure, not
//! per-cell determinism. Only generation-window arithmetic keeps the reader
//! clear of in-flight writes.

use std::sync::atomic::{AtomicI8, Ordering};

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{infection_next, reaction_next, RuleState};
use crate::schema::{ConfigError, EngineConfig};

/// Cell state. Small signed values; `WALL` is reserved.
pub type Cell = i8;

/// Sentinel for the frozen border; never produced by a rule for the interior.
pub const WALL: Cell = -1;

/// Empty/ground state.
pub const GROUND: Cell = 0;

/// Ring-buffered toroidal grid.
pub struct ToroidalGrid {
    /// Logical grid height in cells.
    pub height: usize,
    /// Logical grid width in cells.
    pub width: usize,
    edge: usize,
    vertical: usize,
    memory: Box<[AtomicI8]>,
    rule: RuleState,
}

impl ToroidalGrid {
    /// Build a grid from a validated configuration, with randomized initial
    /// cell states. Fails fast on degenerate dimensions; `calculate` and
    /// `erase` perform no validation of their own.
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let vertical = config.vertical();
        let cells = vertical * config.width;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let memory: Box<[AtomicI8]> = (0..cells)
            .map(|_| AtomicI8::new(rng.gen_range(0..i8::MAX)))
            .collect();
        let rule = RuleState::new(config.rule, cells, &mut rng);

        Ok(Self {
            height: config.height,
            width: config.width,
            edge: config.edge,
            vertical,
            memory,
            rule,
        })
    }

    /// Physical ring height in rows.
    #[inline]
    pub fn vertical(&self) -> usize {
        self.vertical
    }

    /// Cell at flat ring index `pos`.
    #[inline]
    pub fn cell(&self, pos: usize) -> Cell {
        self.memory[pos].load(Ordering::Relaxed)
    }

    /// Map a physical ring row plus a generation offset to another ring row.
    ///
    /// Total for any cursor value and step; `frame(frame(line, s), -s)`
    /// returns `line` for `line` in `[0, vertical)`.
    #[inline]
    pub fn frame(&self, line: usize, step: i64) -> usize {
        let v = self.vertical as i64;
        ((line % self.vertical) as i64 + step * self.height as i64).rem_euclid(v) as usize
    }

    /// Compute one row of the next generation.
    ///
    /// `line` is a physical ring row in `[0, vertical)`. Interior-band rows
    /// update columns `[edge, width - edge)` from the previous-generation
    /// frame at `frame(line, -1)`; border-band rows and the outer columns
    /// are forced to `WALL`. The sole simulation-side mutator.
    pub fn calculate(&self, line: usize) {
        let h = line % self.height;
        let body = h >= self.edge && h < self.height - self.edge;
        let dst = line * self.width;
        let src = self.frame(line, -1) * self.width;

        if body {
            for w in self.edge..self.width - self.edge {
                let next = match &self.rule {
                    RuleState::Infection => infection_next(&self.memory, src + w, self.width),
                    RuleState::Reaction(channels) => {
                        reaction_next(channels, src + w, dst + w, self.width)
                    }
                    RuleState::Placeholder => GROUND,
                };
                self.memory[dst + w].store(next, Ordering::Relaxed);
            }
        } else {
            for w in 0..self.width {
                self.memory[dst + w].store(WALL, Ordering::Relaxed);
            }
        }
        for w in 0..self.edge {
            self.memory[dst + w].store(WALL, Ordering::Relaxed);
            self.memory[dst + self.width - w - 1].store(WALL, Ordering::Relaxed);
        }
    }

    /// Clear every cell within `radius` of the drag segment
    /// `(x0, y0) -> (x1, y1)` to ground, in both the target row and its
    /// one-generation-back predecessor so the edit survives the next sweep.
    ///
    /// Distance is point-to-segment; only the `[y0 +/- radius] x
    /// [x0 +/- radius]` bounding box is scanned. Out-of-range coordinates are
    /// clipped; if both endpoints are outside the grid this is a no-op.
    pub fn erase(&self, y0: i32, x0: i32, y1: i32, x1: i32, radius: i32) {
        let height = self.height as i32;
        let width = self.width as i32;
        let in_range =
            |y: i32, x: i32| -> bool { y >= 0 && y < height && x >= 0 && x < width };
        if !in_range(y0, x0) && !in_range(y1, x1) {
            return;
        }

        let dy = (y1 - y0) as f32;
        let dx = (x1 - x0) as f32;
        let len2 = dy * dy + dx * dx;
        let reach = radius as f32;

        for h in (y0 - radius).max(0)..(y0 + 1 + radius).min(height) {
            let dst = h as usize * self.width;
            let src = self.frame(h as usize, -1) * self.width;
            let py = (h - y0) as f32;

            for w in (x0 - radius).max(0)..(x0 + 1 + radius).min(width) {
                let px = (w - x0) as f32;
                let t = if len2 > 0.0 {
                    ((px * dx + py * dy) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let ddy = t * dy - py;
                let ddx = t * dx - px;

                if (ddy * ddy + ddx * ddx).sqrt() < reach {
                    self.clear_cell(dst + w as usize);
                    self.clear_cell(src + w as usize);
                }
            }
        }
    }

    #[inline]
    fn clear_cell(&self, pos: usize) {
        self.memory[pos].store(GROUND, Ordering::Relaxed);
        // Reaction concentrations regrow erased cells unless cleared too.
        if let RuleState::Reaction(channels) = &self.rule {
            channels.set(pos, 0.0, 0.0, 0.0);
        }
    }
}

/// Snapshot summary for monitoring, in the spirit of a frame histogram.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GridStats {
    /// Cells above ground (drawn by a renderer).
    pub active_cells: usize,
    pub min_state: Cell,
    pub max_state: Cell,
}

impl GridStats {
    /// Compute statistics from a snapshot.
    pub fn from_cells(cells: &[Cell]) -> Self {
        let mut active_cells = 0usize;
        let mut min_state = Cell::MAX;
        let mut max_state = Cell::MIN;

        for &cell in cells {
            if cell > GROUND {
                active_cells += 1;
            }
            min_state = min_state.min(cell);
            max_state = max_state.max(cell);
        }

        Self {
            active_cells,
            min_state,
            max_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RuleKind;
    use proptest::prelude::*;

    fn config(height: usize, width: usize) -> EngineConfig {
        EngineConfig {
            height,
            width,
            seed: Some(42),
            ..EngineConfig::default()
        }
    }

    impl ToroidalGrid {
        /// Overwrite the entire ring.
        fn fill(&self, value: Cell) {
            for slot in self.memory.iter() {
                slot.store(value, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(ToroidalGrid::new(&config(0, 8)).is_err());
        assert!(ToroidalGrid::new(&EngineConfig {
            edge: 4,
            ..config(8, 8)
        })
        .is_err());
    }

    #[test]
    fn test_border_invariant_after_full_sweep() {
        let grid = ToroidalGrid::new(&config(8, 8)).unwrap();
        for line in 0..8 {
            grid.calculate(line);
        }

        for h in 0..8 {
            for w in 0..8 {
                let cell = grid.cell(h * 8 + w);
                if h == 0 || h == 7 || w == 0 || w == 7 {
                    assert_eq!(cell, WALL, "border at ({h},{w})");
                } else {
                    assert_ne!(cell, WALL, "interior at ({h},{w})");
                }
            }
        }
    }

    #[test]
    fn test_interior_reflects_one_rule_application() {
        let grid = ToroidalGrid::new(&config(8, 8)).unwrap();
        // Previous generation all ground: the interior must stay ground.
        grid.fill(GROUND);
        for line in 0..8 {
            grid.calculate(line);
        }
        for h in 1..7 {
            for w in 1..7 {
                assert_eq!(grid.cell(h * 8 + w), GROUND);
            }
        }
    }

    #[test]
    fn test_max_severity_row_recovers() {
        let grid = ToroidalGrid::new(&config(8, 8)).unwrap();
        grid.fill(9);
        grid.calculate(3);
        for w in 1..7 {
            assert_eq!(grid.cell(3 * 8 + w), GROUND);
        }
    }

    #[test]
    fn test_placeholder_rule_yields_ground_interior() {
        let grid = ToroidalGrid::new(&EngineConfig {
            rule: RuleKind::Placeholder,
            ..config(8, 8)
        })
        .unwrap();
        grid.calculate(4);
        for w in 0..8 {
            let expected = if w == 0 || w == 7 { WALL } else { GROUND };
            assert_eq!(grid.cell(4 * 8 + w), expected);
        }
    }

    #[test]
    fn test_reaction_grid_sweeps_in_display_range() {
        let grid = ToroidalGrid::new(&EngineConfig {
            rule: RuleKind::Reaction,
            ..config(16, 16)
        })
        .unwrap();
        for line in 0..grid.vertical() {
            grid.calculate(line);
        }
        for h in 1..15 {
            for w in 1..15 {
                let cell = grid.cell(h * 16 + w);
                assert!((GROUND..=i8::MAX).contains(&cell), "cell at ({h},{w})");
            }
        }
    }

    #[test]
    fn test_erase_degenerate_segment_is_circle() {
        let grid = ToroidalGrid::new(&config(16, 16)).unwrap();
        grid.fill(5);
        grid.erase(8, 8, 8, 8, 3);

        for h in 0..16i32 {
            for w in 0..16i32 {
                let dist = (((h - 8).pow(2) + (w - 8).pow(2)) as f32).sqrt();
                let expected = if dist < 3.0 { GROUND } else { 5 };
                assert_eq!(grid.cell(h as usize * 16 + w as usize), expected);
            }
        }
        // Predecessor frame rows carry the same circle.
        for h in 5..=11i32 {
            let src = grid.frame(h as usize, -1) * 16;
            for w in 0..16i32 {
                let dist = (((h - 8).pow(2) + (w - 8).pow(2)) as f32).sqrt();
                let expected = if dist < 3.0 { GROUND } else { 5 };
                assert_eq!(grid.cell(src + w as usize), expected, "prev ({h},{w})");
            }
        }
    }

    #[test]
    fn test_erase_on_empty_grid_is_noop() {
        let grid = ToroidalGrid::new(&config(10, 10)).unwrap();
        grid.fill(GROUND);
        grid.erase(3, 3, 3, 3, 1);
        for pos in 0..grid.vertical() * 10 {
            assert_eq!(grid.cell(pos), GROUND);
        }
    }

    #[test]
    fn test_erase_clips_out_of_range() {
        let grid = ToroidalGrid::new(&config(10, 10)).unwrap();
        grid.fill(5);
        // One endpoint inside: clipped, not skipped.
        grid.erase(0, 0, -5, -5, 2);
        assert_eq!(grid.cell(0), GROUND);
        // Both endpoints outside: no-op.
        grid.fill(5);
        grid.erase(-3, -3, -8, 20, 4);
        for pos in 0..grid.vertical() * 10 {
            assert_eq!(grid.cell(pos), 5);
        }
    }

    #[test]
    fn test_erase_segment_distance_within_pointer_box() {
        let grid = ToroidalGrid::new(&config(16, 16)).unwrap();
        grid.fill(5);
        // Horizontal drag from (8,4) to (8,10); the scan stays inside the
        // [y0 +/- r] x [x0 +/- r] box anchored at the first endpoint.
        grid.erase(8, 4, 8, 10, 2);

        // Segment distance, not endpoint distance: off-axis cells near the
        // segment clear too.
        for h in 7..=9 {
            for w in 4..=6 {
                assert_eq!(grid.cell(h * 16 + w), GROUND, "near segment ({h},{w})");
            }
        }
        // (8,3) is behind the start point but within the radius.
        assert_eq!(grid.cell(8 * 16 + 3), GROUND);
        // On the segment but outside the pointer box: untouched.
        assert_eq!(grid.cell(8 * 16 + 8), 5);
        assert_eq!(grid.cell(8 * 16 + 13), 5);
    }

    proptest! {
        #[test]
        fn prop_frame_round_trip(
            height in 3usize..64,
            frames in prop::sample::select(vec![2usize, 4, 8, 16]),
            line_factor in 0.0f64..1.0,
            step in -1000i64..1000,
        ) {
            let grid = ToroidalGrid::new(&EngineConfig {
                height,
                width: 8,
                edge: 1,
                frames_per_cycle: frames,
                seed: Some(1),
                ..EngineConfig::default()
            }).unwrap();
            let vertical = grid.vertical();
            let line = (line_factor * vertical as f64) as usize % vertical;

            let forward = grid.frame(line, step);
            prop_assert!(forward < vertical);
            prop_assert_eq!(grid.frame(forward, -step), line);
        }

        #[test]
        fn prop_erase_circle_geometry(
            y in 0i32..24,
            x in 0i32..24,
            radius in 1i32..6,
        ) {
            let grid = ToroidalGrid::new(&config(24, 24)).unwrap();
            grid.fill(5);
            grid.erase(y, x, y, x, radius);

            for h in 0..24i32 {
                for w in 0..24i32 {
                    let dist = (((h - y).pow(2) + (w - x).pow(2)) as f32).sqrt();
                    let expected = if dist < radius as f32 { GROUND } else { 5 };
                    prop_assert_eq!(grid.cell(h as usize * 24 + w as usize), expected);
                }
            }
        }
    }

    #[test]
    fn test_stats_counts_active_cells() {
        let cells = [GROUND, 3, WALL, 9, GROUND, 1];
        let stats = GridStats::from_cells(&cells);
        assert_eq!(stats.active_cells, 3);
        assert_eq!(stats.min_state, WALL);
        assert_eq!(stats.max_state, 9);
    }
}
