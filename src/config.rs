/// Total number of playouts spent on one decision.
pub const DEFAULT_PLAYOUT_BUDGET: usize = 200;

/// Tunables of the [`RolloutAgent`](crate::player::RolloutAgent).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentConfig {
    /// Playouts per decision, shared evenly between the candidates.
    pub playout_budget: usize,
    /// Fixed seed for reproducible decisions. `None` draws a fresh one per decision.
    pub seed: Option<u64>,
    /// Evaluate candidates on the rayon thread pool.
    pub parallel: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            playout_budget: DEFAULT_PLAYOUT_BUDGET,
            seed: None,
            parallel: true,
        }
    }
}

impl AgentConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_playout_budget(mut self, playout_budget: usize) -> Self {
        self.playout_budget = playout_budget;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Playouts each candidate receives, rounded down. Zero once the pool
    /// outgrows the budget.
    pub fn playouts_per_candidate(&self, pool_size: usize) -> usize {
        if pool_size == 0 {
            return 0;
        }
        self.playout_budget / pool_size
    }
}
