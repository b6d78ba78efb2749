use agora_core::{effective_price, select_winner, AgentId, Offer};
use proptest::prelude::*;

fn offers_strategy() -> impl Strategy<Value = Vec<(u64, u32)>> {
    // price 0 stands for "no proposal"
    prop::collection::vec((prop_oneof![Just(0u64), 1u64..10_000], 0u32..100), 0..12)
}

fn build(raw: &[(u64, u32)]) -> Vec<Offer> {
    raw.iter()
        .enumerate()
        .map(|(i, (price, discount))| Offer {
            seller: AgentId::from_string(format!("seller-{i}")),
            price: *price,
            discount: *discount,
        })
        .collect()
}

proptest! {
    #[test]
    fn winner_minimizes_effective_price(raw in offers_strategy()) {
        let offers = build(&raw);
        let winner = select_winner(&offers);

        let candidates: Vec<(usize, u64)> = raw
            .iter()
            .enumerate()
            .filter(|(_, (price, _))| *price > 0)
            .map(|(i, (price, discount))| (i, price - price * (*discount as u64) / 100))
            .collect();

        match candidates.iter().map(|(_, p)| *p).min() {
            None => prop_assert!(winner.is_none()),
            Some(min) => {
                let first = candidates.iter().find(|(_, p)| *p == min).unwrap().0;
                let winner = winner.unwrap();
                prop_assert_eq!(winner.price, min);
                prop_assert_eq!(winner.seller, AgentId::from_string(format!("seller-{first}")));
            }
        }
    }

    #[test]
    fn sellers_without_proposal_never_win(raw in offers_strategy()) {
        let offers = build(&raw);
        if let Some(winner) = select_winner(&offers) {
            let offer = offers.iter().find(|o| o.seller == winner.seller).unwrap();
            prop_assert!(offer.price > 0);
        }
    }

    #[test]
    fn effective_price_never_exceeds_list_price(price in 0u64..1_000_000, discount in 0u32..100) {
        prop_assert!(effective_price(price, discount) <= price);
    }
}
