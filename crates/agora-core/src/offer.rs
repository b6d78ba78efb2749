//! Offer records and the winner-selection rule

use serde::{Deserialize, Serialize};

use crate::types::AgentId;

/// What one seller offered during one negotiation
///
/// `price == 0` means no proposal was received (refusal, timeout or
/// malformed reply). `discount` is a percentage in `[0, 100)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub seller: AgentId,
    pub price: u64,
    pub discount: u32,
}

impl Offer {
    pub fn new(seller: AgentId) -> Self {
        Self {
            seller,
            price: 0,
            discount: 0,
        }
    }

    pub fn has_proposal(&self) -> bool {
        self.price > 0
    }

    /// `price - price * discount / 100`, truncating
    pub fn effective_price(&self) -> u64 {
        effective_price(self.price, self.discount)
    }
}

/// Discounts above 100% floor the price at zero
pub fn effective_price(price: u64, discount: u32) -> u64 {
    let reduction = price as u128 * discount as u128 / 100;
    (price as u128).saturating_sub(reduction) as u64
}

/// The seller chosen to receive the purchase order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub seller: AgentId,
    pub price: u64,
}

/// Pick the seller with the strictly smallest effective price.
///
/// Offers without a proposal are skipped. Ties go to the offer that comes
/// first in `offers`, which is the order the sellers were discovered in.
pub fn select_winner(offers: &[Offer]) -> Option<Winner> {
    let mut best: Option<Winner> = None;
    for offer in offers.iter().filter(|o| o.has_proposal()) {
        let price = offer.effective_price();
        let better = match &best {
            None => true,
            Some(current) => price < current.price,
        };
        if better {
            best = Some(Winner {
                seller: offer.seller.clone(),
                price,
            });
        }
    }
    best
}
