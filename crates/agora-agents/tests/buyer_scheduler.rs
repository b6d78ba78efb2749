mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agora_agents::{BuyerAgent, BuyerConfig, BuyerExit, FixedDiscount, Outcome, TraceStage};
use agora_bus::{BusError, Directory, InMemoryDirectory, ServiceDescription};
use agora_core::{AgentId, BOOK_SELLING_SERVICE, BOOK_TRADING_SERVICE_NAME};
use async_trait::async_trait;
use tokio::sync::mpsc;

use common::{agent, Market};

fn buyer(market: &Market, config: BuyerConfig) -> BuyerAgent {
    let id = agent("buyer");
    BuyerAgent::new(
        id.clone(),
        config,
        market.mailbox(&id),
        market.transport.clone(),
        market.directory.clone(),
    )
}

/// Directory whose first `failures` searches report it as unreachable
struct FlakyDirectory {
    inner: Arc<InMemoryDirectory>,
    failures: AtomicUsize,
    searches: AtomicUsize,
}

impl FlakyDirectory {
    fn new(inner: Arc<InMemoryDirectory>, failures: usize) -> Self {
        Self {
            inner,
            failures: AtomicUsize::new(failures),
            searches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Directory for FlakyDirectory {
    async fn register(&self, agent: AgentId, service: ServiceDescription) -> agora_bus::Result<()> {
        self.inner.register(agent, service).await
    }

    async fn deregister(&self, agent: &AgentId) -> agora_bus::Result<()> {
        self.inner.deregister(agent).await
    }

    async fn search(&self, service_type: &str) -> agora_bus::Result<Vec<AgentId>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let outage = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if outage {
            return Err(BusError::DirectoryUnavailable {
                reason: "registry offline".to_string(),
            });
        }
        self.inner.search(service_type).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_buyer_purchases_cheapest_and_stops() {
    let market = Market::new();
    market.spawn_seller(market.seller("s1", &[("Dune", 120)], FixedDiscount(Some(10))));
    market.spawn_seller(market.seller("s2", &[("Dune", 100)], FixedDiscount(None)));

    let (tx, mut reports) = mpsc::unbounded_channel();
    let buyer_agent = buyer(&market, BuyerConfig::for_target("Dune")).with_observer(tx);

    let exit = tokio::time::timeout(
        Duration::from_secs(300),
        buyer_agent.run(std::future::pending()),
    )
    .await
    .expect("buyer should finish")
    .unwrap();

    assert_eq!(
        exit,
        BuyerExit::Purchased {
            seller: agent("s2"),
            price: 100
        }
    );
    // earlier ticks may have found no sellers yet; the last report is the purchase
    let mut last = None;
    while let Ok(report) = reports.try_recv() {
        last = Some(report);
    }
    let report = last.unwrap();
    assert_eq!(report.item, "Dune");
    assert!(report.outcome.is_success());
    assert_eq!(report.trace.count(TraceStage::Outcome), 1);

    market.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_buyer_retries_until_title_is_listed() {
    let market = Market::new();
    let seller = market.seller("s1", &[], FixedDiscount(None));
    let catalogue = seller.catalogue();
    market.spawn_seller(seller);

    let (tx, mut reports) = mpsc::unbounded_channel();
    let config = BuyerConfig {
        tick_interval_secs: 10.0,
        ..BuyerConfig::for_target("Dune")
    };
    let run = tokio::spawn(buyer(&market, config).with_observer(tx).run(std::future::pending()));

    let first = tokio::time::timeout(Duration::from_secs(60), reports.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.outcome, Outcome::NoOffers);

    catalogue.update("Dune", 42).unwrap();

    let exit = tokio::time::timeout(Duration::from_secs(60), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(
        exit,
        BuyerExit::Purchased {
            seller: agent("s1"),
            price: 42
        }
    );
    market.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_buyer_skips_ticks_without_sellers() {
    let market = Market::new();
    let (tx, mut reports) = mpsc::unbounded_channel();
    let config = BuyerConfig {
        tick_interval_secs: 1.0,
        ..BuyerConfig::for_target("Dune")
    };
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let run = tokio::spawn(buyer(&market, config).with_observer(tx).run(async move {
        let _ = stop_rx.await;
    }));

    tokio::time::sleep(Duration::from_secs(5)).await;
    stop_tx.send(()).unwrap();

    let exit = run.await.unwrap().unwrap();
    assert_eq!(exit, BuyerExit::Shutdown);
    assert!(reports.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_seller_withdraws_service_on_shutdown() {
    let market = Market::new();
    let handle = market.spawn_seller(market.seller("s1", &[("Dune", 10)], FixedDiscount(None)));

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(
        market.directory.search(BOOK_SELLING_SERVICE).await.unwrap(),
        vec![agent("s1")]
    );

    market.shutdown();
    handle.await.unwrap();
    assert!(market
        .directory
        .search(BOOK_SELLING_SERVICE)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_observer_sees_every_negotiation() {
    let market = Market::new();
    market.spawn_seller(market.seller("s1", &[("Emma", 5)], FixedDiscount(None)));

    let (tx, mut reports) = mpsc::unbounded_channel();
    let config = BuyerConfig {
        tick_interval_secs: 0.05,
        stop_on_purchase: false,
        ..BuyerConfig::for_target("Dune")
    };
    let stop_signal = Arc::new(tokio::sync::Notify::new());
    let stop = stop_signal.clone();
    let run = tokio::spawn(buyer(&market, config).with_observer(tx).run(async move {
        stop.notified().await;
    }));

    for _ in 0..2 {
        let report = tokio::time::timeout(Duration::from_secs(5), reports.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.outcome, Outcome::NoOffers);
        assert_eq!(report.outcome.reason(), "not available for sale");
    }

    stop_signal.notify_one();
    assert_eq!(run.await.unwrap().unwrap(), BuyerExit::Shutdown);
    market.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_buyer_survives_discovery_outage() {
    let market = Market::new();
    market.spawn_seller(market.seller("s1", &[("Dune", 55)], FixedDiscount(None)));
    let directory = Arc::new(FlakyDirectory::new(market.directory.clone(), 3));

    let (tx, mut reports) = mpsc::unbounded_channel();
    let id = agent("buyer");
    let config = BuyerConfig {
        tick_interval_secs: 10.0,
        ..BuyerConfig::for_target("Dune")
    };
    let buyer_agent = BuyerAgent::new(
        id.clone(),
        config,
        market.mailbox(&id),
        market.transport.clone(),
        directory.clone(),
    )
    .with_observer(tx);

    let exit = tokio::time::timeout(
        Duration::from_secs(120),
        buyer_agent.run(std::future::pending()),
    )
    .await
    .expect("buyer should recover from the outage")
    .unwrap();

    assert_eq!(
        exit,
        BuyerExit::Purchased {
            seller: agent("s1"),
            price: 55
        }
    );
    // three failed ticks, then the one that bought
    assert_eq!(directory.searches.load(Ordering::SeqCst), 4);
    let report = reports.try_recv().unwrap();
    assert!(report.outcome.is_success());
    assert!(reports.try_recv().is_err());
    market.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_purchase_ends_overlapping_negotiations() {
    let market = Market::new();
    market.spawn_seller(market.seller("s1", &[("Dune", 80)], FixedDiscount(None)));
    // registered but never answers, so every round waits out the deadline
    let _silent = market.mailbox(&agent("crashed"));
    market
        .directory
        .register(
            agent("crashed"),
            ServiceDescription::new(BOOK_SELLING_SERVICE, BOOK_TRADING_SERVICE_NAME),
        )
        .await
        .unwrap();

    let (tx, mut reports) = mpsc::unbounded_channel();
    let mut config = BuyerConfig {
        tick_interval_secs: 1.0,
        ..BuyerConfig::for_target("Dune")
    };
    config.negotiation.phase_timeout = Some(Duration::from_secs(5));

    let exit = tokio::time::timeout(
        Duration::from_secs(60),
        buyer(&market, config).with_observer(tx).run(std::future::pending()),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(
        exit,
        BuyerExit::Purchased {
            seller: agent("s1"),
            price: 80
        }
    );
    // rounds still waiting on the silent seller are dropped without a report
    let mut finished = Vec::new();
    while let Ok(report) = reports.try_recv() {
        finished.push(report);
    }
    assert_eq!(finished.iter().filter(|r| r.outcome.is_success()).count(), 1);
    assert!(finished.last().unwrap().outcome.is_success());
    market.shutdown();
}
