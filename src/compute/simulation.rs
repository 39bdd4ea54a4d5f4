//! Double-buffered simulation driver.

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::Grid;
use crate::schema::StreamConfig;

/// Current/next grid pair plus the generation counter.
///
/// `step` computes into the spare grid and swaps the two, so neither
/// buffer is ever copied or shared.
pub struct Simulation {
    current: Grid,
    next: Grid,
    rng: StdRng,
    generation: u64,
    perturb_interval: u64,
}

impl Simulation {
    /// Create the board pair described by `config`.
    ///
    /// With `pregenerate` enabled the board starts from a random fill,
    /// otherwise all cells are dead.
    pub fn new(config: &StreamConfig) -> Self {
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut sim = Self::from_grid(
            Grid::new(config.grid_width(), config.grid_height()),
            rng,
            config.perturb_interval,
        );
        if config.pregenerate {
            sim.current.fill_random(&mut sim.rng);
        }
        sim
    }

    /// Start from an explicit board.
    pub fn from_grid(initial: Grid, rng: StdRng, perturb_interval: u64) -> Self {
        assert!(perturb_interval > 0, "perturb interval must be non-zero");
        let next = Grid::new(initial.width(), initial.height());
        Self {
            current: initial,
            next,
            rng,
            generation: 0,
            perturb_interval,
        }
    }

    /// Advance one generation, perturbing on the configured cadence.
    pub fn step(&mut self) {
        self.next.advance_from(&self.current);
        std::mem::swap(&mut self.current, &mut self.next);
        self.generation += 1;

        if self.generation % self.perturb_interval == 0 {
            let (x, y) = self.current.perturb(&mut self.rng);
            log::debug!("generation {}: perturbed around ({x}, {y})", self.generation);
        }
    }

    /// Advance `steps` generations without any pacing.
    pub fn run(&mut self, steps: u64) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// The generation currently on display.
    #[inline]
    pub fn current(&self) -> &Grid {
        &self.current
    }

    /// Number of generations computed so far.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
