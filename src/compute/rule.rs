//! Update rules - Per-cell transition functions over a 3x3 neighborhood.
//!
//! The active variant is selected once per grid instance; `calculate` matches
//! on it per row, never per cell.

use std::sync::atomic::{AtomicI8, AtomicU32, Ordering};

use rand::Rng;

use super::{Cell, GROUND, WALL};
use crate::schema::RuleKind;

/// Infection severity range; states run 0 (ground) to `RANGE - 1` (maximum).
pub const INFECTION_RANGE: i32 = 10;

/// Weighted neighbor sum below this keeps a ground cell healthy.
pub const INFECTION_LOW: i32 = 5;

/// Weighted neighbor sum at or above this turns a ground cell fully infected.
pub const INFECTION_HIGH: i32 = INFECTION_RANGE * 9;

/// Reaction coefficients for the cyclic channel pairing
/// a <- (b, c), b <- (c, a), c <- (a, b).
const REACT_F1: f32 = 1.2;
const REACT_F2: f32 = 1.0;

/// Rule dispatch state, built once at grid construction.
///
/// The reaction variant owns three auxiliary concentration channels
/// co-indexed with the cell ring; they share its lifetime and its
/// relaxed-race policy.
pub enum RuleState {
    Infection,
    Reaction(Channels),
    /// Extension point only; computes nothing and always yields ground.
    Placeholder,
}

impl RuleState {
    /// Build the state for `kind` over a ring of `cells` total cells.
    pub fn new<R: Rng>(kind: RuleKind, cells: usize, rng: &mut R) -> Self {
        match kind {
            RuleKind::Infection => RuleState::Infection,
            RuleKind::Reaction => RuleState::Reaction(Channels::random(cells, rng)),
            RuleKind::Placeholder => RuleState::Placeholder,
        }
    }
}

/// Three concentration channels stored as f32 bit patterns in relaxed
/// atomics, mirroring the cell ring's tolerated-race storage.
pub struct Channels {
    a: Box<[AtomicU32]>,
    b: Box<[AtomicU32]>,
    c: Box<[AtomicU32]>,
}

#[inline]
fn load_f32(slot: &AtomicU32) -> f32 {
    f32::from_bits(slot.load(Ordering::Relaxed))
}

#[inline]
fn store_f32(slot: &AtomicU32, value: f32) {
    slot.store(value.to_bits(), Ordering::Relaxed);
}

impl Channels {
    fn random<R: Rng>(cells: usize, rng: &mut R) -> Self {
        let mut channel = || -> Box<[AtomicU32]> {
            (0..cells)
                .map(|_| AtomicU32::new(rng.gen_range(0.0f32..1.0).to_bits()))
                .collect()
        };
        Self {
            a: channel(),
            b: channel(),
            c: channel(),
        }
    }

    /// Concentrations at `pos`.
    #[inline]
    pub fn get(&self, pos: usize) -> (f32, f32, f32) {
        (
            load_f32(&self.a[pos]),
            load_f32(&self.b[pos]),
            load_f32(&self.c[pos]),
        )
    }

    #[inline]
    pub fn set(&self, pos: usize, a: f32, b: f32, c: f32) {
        store_f32(&self.a[pos], a);
        store_f32(&self.b[pos], b);
        store_f32(&self.c[pos], c);
    }

    /// 3x3 neighborhood mean of every channel around `pos`.
    #[inline]
    fn mean(&self, pos: usize, width: usize) -> (f32, f32, f32) {
        let mut ma = 0.0f32;
        let mut mb = 0.0f32;
        let mut mc = 0.0f32;
        let start = pos - 1 - width;

        for dh in 0..3 {
            for dw in 0..3 {
                let p = start + dh * width + dw;
                ma += load_f32(&self.a[p]);
                mb += load_f32(&self.b[p]);
                mc += load_f32(&self.c[p]);
            }
        }
        (ma / 9.0, mb / 9.0, mc / 9.0)
    }
}

/// Infection transition for the cell at flat index `pos` in the
/// previous-generation frame.
///
/// The neighbor sum uses a unit 3x3 mask with a zero center; border walls
/// adjacent to the interior contribute their sentinel value.
#[inline]
pub fn infection_next(memory: &[AtomicI8], pos: usize, width: usize) -> Cell {
    let current = memory[pos].load(Ordering::Relaxed);
    if current == WALL {
        return WALL;
    }
    if i32::from(current) == INFECTION_RANGE - 1 {
        // Maximum severity recovers.
        return GROUND;
    }

    let start = pos - 1 - width;
    let mut neighbours: i32 = 0;
    for dh in 0..3 {
        for dw in 0..3 {
            if dh == 1 && dw == 1 {
                continue;
            }
            neighbours += i32::from(memory[start + dh * width + dw].load(Ordering::Relaxed));
        }
    }

    if current == GROUND {
        if neighbours < INFECTION_LOW {
            GROUND
        } else if neighbours < INFECTION_HIGH {
            2 // incubating
        } else {
            3 // infected
        }
    } else {
        (neighbours / 8 + 5).min(INFECTION_RANGE - 1) as Cell
    }
}

/// Bounded nonlinear channel transition: `clamp(x * (1 + f1*y - f2*z), 0, 1)`.
#[inline]
fn react(x: f32, y: f32, z: f32) -> f32 {
    (x * (1.0 + REACT_F1 * y - REACT_F2 * z)).clamp(0.0, 1.0)
}

/// Reaction transition: update all three channels at `dst` from the 3x3
/// channel means around `src`, and derive the displayed cell state from
/// channel `a`.
#[inline]
pub fn reaction_next(channels: &Channels, src: usize, dst: usize, width: usize) -> Cell {
    let (ma, mb, mc) = channels.mean(src, width);
    let na = react(ma, mb, mc);
    let nb = react(mb, mc, ma);
    let nc = react(mc, ma, mb);
    channels.set(dst, na, nb, nc);
    (na * f32::from(i8::MAX)) as Cell
}
