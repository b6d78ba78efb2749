//! Simulated market: sellers and buyers sharing one in-process bus

use std::str::FromStr;
use std::sync::Arc;

use agora_agents::{
    BuyerAgent, BuyerConfig, BuyerError, BuyerExit, CatalogueHandle, NegotiationReport,
    RandomDiscount, SellerAgent,
};
use agora_bus::{InMemoryDirectory, InProcTransport};
use agora_core::{AgentId, Inventory};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::config::{AgoraConfig, SellerConfig};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    #[error("expected SELLER:TITLE=PRICE, got '{0}'")]
    Format(String),

    #[error("invalid price in '{input}': {reason}")]
    Price { input: String, reason: String },
}

/// A `--sell SELLER:TITLE=PRICE` flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub seller: String,
    pub title: String,
    pub price: u64,
}

impl FromStr for Listing {
    type Err = ListingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (seller, rest) = s
            .split_once(':')
            .ok_or_else(|| ListingError::Format(s.to_string()))?;
        let (title, price) = rest
            .rsplit_once('=')
            .ok_or_else(|| ListingError::Format(s.to_string()))?;
        let (seller, title) = (seller.trim(), title.trim());
        if seller.is_empty() || title.is_empty() {
            return Err(ListingError::Format(s.to_string()));
        }

        let price: u64 = price.trim().parse().map_err(|e: std::num::ParseIntError| {
            ListingError::Price {
                input: s.to_string(),
                reason: e.to_string(),
            }
        })?;
        if price == 0 {
            return Err(ListingError::Price {
                input: s.to_string(),
                reason: "price must be positive".to_string(),
            });
        }

        Ok(Self {
            seller: seller.to_string(),
            title: title.to_string(),
            price,
        })
    }
}

/// What happened while the market was open
#[derive(Debug, Default)]
pub struct MarketSummary {
    pub reports: Vec<NegotiationReport>,
    pub exits: Vec<(AgentId, BuyerExit)>,
}

impl MarketSummary {
    pub fn purchases(&self) -> usize {
        self.exits
            .iter()
            .filter(|(_, exit)| matches!(exit, BuyerExit::Purchased { .. }))
            .count()
    }
}

/// Open the market and run until every buyer has stopped or `shutdown` fires.
///
/// One buyer is started per entry of `items`; with no items a single buyer
/// runs with the configured target (if any). Listings are added to running
/// sellers through their catalogue handles, creating sellers that the
/// configuration does not name.
pub async fn run_market<F>(
    config: &AgoraConfig,
    items: &[String],
    listings: Vec<Listing>,
    shutdown: F,
) -> anyhow::Result<MarketSummary>
where
    F: std::future::Future<Output = ()> + Send,
{
    let transport = InProcTransport::new();
    let directory = Arc::new(InMemoryDirectory::new());
    let (stop_tx, stop_rx) = watch::channel(false);
    let stop_signal = |mut rx: watch::Receiver<bool>| async move {
        let _ = rx.wait_for(|stop| *stop).await;
    };

    let mut sellers: Vec<SellerConfig> = config.market.sellers.clone();
    for listing in &listings {
        if !sellers.iter().any(|s| s.name == listing.seller) {
            sellers.push(SellerConfig {
                name: listing.seller.clone(),
                books: Default::default(),
            });
        }
    }

    let mut catalogues: Vec<CatalogueHandle> = Vec::new();
    let mut seller_tasks = JoinSet::new();
    for (index, seller) in sellers.iter().enumerate() {
        let id = AgentId::from_string(seller.name.clone());
        let rng = match config.market.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_entropy(),
        };
        let inventory: Inventory = seller
            .books
            .iter()
            .map(|(title, price)| (title.clone(), *price))
            .collect();

        let agent = SellerAgent::new(
            id.clone(),
            transport.register(id),
            Arc::new(transport.clone()),
            directory.clone(),
        )
        .with_inventory(Arc::new(inventory))
        .with_policy(RandomDiscount::with_rng(rng, config.market.max_discount));
        catalogues.push(agent.catalogue());
        seller_tasks.spawn(agent.run(stop_signal(stop_rx.clone())));
    }

    for listing in listings {
        let Some(catalogue) = catalogues
            .iter()
            .find(|c| c.seller().as_str() == listing.seller)
        else {
            continue;
        };
        catalogue.update(listing.title, listing.price)?;
    }

    let targets: Vec<Option<String>> = if items.is_empty() {
        vec![config.buyer.target.clone()]
    } else {
        items.iter().cloned().map(Some).collect()
    };

    let (report_tx, mut reports) = mpsc::unbounded_channel();
    let mut buyer_tasks: JoinSet<(AgentId, Result<BuyerExit, BuyerError>)> = JoinSet::new();
    for (index, target) in targets.into_iter().enumerate() {
        let id = AgentId::from_string(format!("buyer-{}", index + 1));
        let buyer_config = BuyerConfig {
            target,
            ..config.buyer.clone()
        };
        let agent = BuyerAgent::new(
            id.clone(),
            buyer_config,
            transport.register(id.clone()),
            Arc::new(transport.clone()),
            directory.clone(),
        )
        .with_observer(report_tx.clone());
        let stop = stop_signal(stop_rx.clone());
        buyer_tasks.spawn(async move { (id, agent.run(stop).await) });
    }
    drop(report_tx);

    tracing::info!(
        sellers = sellers.len(),
        buyers = buyer_tasks.len(),
        "Market open"
    );

    let mut summary = MarketSummary::default();
    tokio::pin!(shutdown);
    let mut stopping = false;

    while !buyer_tasks.is_empty() {
        tokio::select! {
            _ = &mut shutdown, if !stopping => {
                tracing::info!("Shutdown requested, closing market");
                stopping = true;
                let _ = stop_tx.send(true);
            }
            Some(report) = reports.recv() => {
                log_report(&report);
                summary.reports.push(report);
            }
            Some(joined) = buyer_tasks.join_next() => {
                let (buyer, result) = joined?;
                let exit = result?;
                tracing::info!(buyer = %buyer, exit = ?exit, "Buyer finished");
                summary.exits.push((buyer, exit));
            }
        }
    }

    let _ = stop_tx.send(true);
    while let Some(joined) = seller_tasks.join_next().await {
        joined?;
    }
    while let Ok(report) = reports.try_recv() {
        log_report(&report);
        summary.reports.push(report);
    }

    tracing::info!(
        negotiations = summary.reports.len(),
        purchases = summary.purchases(),
        "Market closed"
    );
    Ok(summary)
}

fn log_report(report: &NegotiationReport) {
    tracing::info!(
        negotiation = %report.negotiation_id,
        title = %report.item,
        sellers = report.sellers.len(),
        outcome = ?report.outcome,
        "Negotiation finished"
    );
}
