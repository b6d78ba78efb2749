//! Discount policies consulted by the seller's discount handler

use agora_core::AgentId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Upper bound (exclusive) of the default discount draw
pub const DEFAULT_MAX_DISCOUNT: u32 = 20;

/// Decides whether a buyer gets a discount on a title, and how much
pub trait DiscountPolicy: Send {
    /// `Some(percent)` grants a discount in `[0, 100)`; `None` refuses
    fn offer(&mut self, title: &str, buyer: &AgentId) -> Option<u32>;
}

/// Coin flip, then a uniform percentage in `[0, max_percent)`
#[derive(Debug)]
pub struct RandomDiscount {
    rng: StdRng,
    max_percent: u32,
}

impl RandomDiscount {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy(), DEFAULT_MAX_DISCOUNT)
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), DEFAULT_MAX_DISCOUNT)
    }

    /// `max_percent` is clamped to `1..=100`
    pub fn with_rng(rng: StdRng, max_percent: u32) -> Self {
        Self {
            rng,
            max_percent: max_percent.clamp(1, 100),
        }
    }
}

impl Default for RandomDiscount {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscountPolicy for RandomDiscount {
    fn offer(&mut self, _title: &str, _buyer: &AgentId) -> Option<u32> {
        if self.rng.gen_bool(0.5) {
            Some(self.rng.gen_range(0..self.max_percent))
        } else {
            None
        }
    }
}

/// Always answers the same way
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedDiscount(pub Option<u32>);

impl DiscountPolicy for FixedDiscount {
    fn offer(&mut self, _title: &str, _buyer: &AgentId) -> Option<u32> {
        self.0
    }
}
