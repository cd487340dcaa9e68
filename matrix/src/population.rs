//! Deterministic population of a freshly cleared matrix.

use bubble_burst_core::{BubbleId, BubbleKind, GridCoord};

use crate::{Bubble, Grid};

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1_442_695_040_888_963_407;

/// Creates the bubbles for a new game and places them on the grid.
///
/// Kinds are drawn from a seeded linear congruential generator, so the same
/// seed reproduces the same board. Identifiers increase monotonically for the
/// lifetime of the factory and are never reused, which keeps identities
/// unambiguous across games.
#[derive(Debug)]
pub(crate) struct BubbleFactory {
    rng_state: u64,
    next_id: u32,
}

impl BubbleFactory {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng_state: seed,
            next_id: 0,
        }
    }

    /// Creates a single bubble of the given kind at the coordinate.
    pub(crate) fn create(&mut self, kind: BubbleKind, coord: GridCoord) -> Bubble {
        let bubble = Bubble::new(BubbleId::new(self.next_id), kind, coord);
        self.next_id = self.next_id.wrapping_add(1);
        bubble
    }

    /// Fills every cell of the grid with a freshly created bubble.
    pub(crate) fn populate(&mut self, grid: &mut Grid) {
        let dims = grid.dims();
        for row in 0..dims.rows() {
            for column in 0..dims.columns() {
                let kind = self.next_kind();
                let bubble = self.create(kind, GridCoord::new(row, column));
                grid.insert(bubble);
            }
        }
    }

    fn next_kind(&mut self) -> BubbleKind {
        // The multiplier is a multiple of five, so the low bits cycle through
        // a tiny set of residues; select from the high bits instead.
        let value = self.advance_rng() >> 32;
        BubbleKind::ALL[(value % BubbleKind::ALL.len() as u64) as usize]
    }

    fn advance_rng(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.rng_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_burst_core::GridDims;

    #[test]
    fn equal_seeds_reproduce_the_same_board() {
        let dims = GridDims::new(4, 5);
        let mut first = Grid::new(dims);
        let mut second = Grid::new(dims);

        BubbleFactory::new(0x5eed).populate(&mut first);
        BubbleFactory::new(0x5eed).populate(&mut second);

        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.id(), b.id());
            assert_eq!(a.kind(), b.kind());
            assert_eq!(a.location(), b.location());
        }
    }

    #[test]
    fn identifiers_stay_unique_across_games() {
        let dims = GridDims::new(2, 2);
        let mut factory = BubbleFactory::new(7);

        let mut grid = Grid::new(dims);
        factory.populate(&mut grid);
        let first_ids: Vec<_> = grid.iter().map(|bubble| bubble.id().get()).collect();

        grid.clear();
        factory.populate(&mut grid);
        let second_ids: Vec<_> = grid.iter().map(|bubble| bubble.id().get()).collect();

        assert_eq!(first_ids, vec![0, 1, 2, 3]);
        assert_eq!(second_ids, vec![4, 5, 6, 7]);
    }
}
