//! End-to-end order flow: risk gate → submission → dispatch → index

use std::time::{Duration, Instant};

use oms_core::prelude::*;

fn wait_for_processed(manager: &OrderManager, count: u64) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while manager.stats().orders_processed < count {
        assert!(Instant::now() < deadline, "dispatch worker stalled");
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn limit_order(venue: Venue, symbol: &str, side: Side, price: f64, quantity: f64) -> Order {
    Order {
        client_order_id: format!("it-{symbol}-{side}"),
        venue,
        symbol: symbol.to_string(),
        side,
        price,
        quantity,
        ..Order::default()
    }
}

#[test]
fn test_risk_gated_submission_flow() {
    let risk = RiskEngine::new(RiskConfig {
        max_order_value: 10_000.0,
        ..RiskConfig::default()
    });
    risk.start();

    let manager = OrderManager::new(OrderManagerConfig {
        ring_buffer_size: 256,
        max_orders_per_second: 1_000,
        max_active_orders: 1_024,
        cpu_cores: vec![],
    });
    manager.start().unwrap();

    let good = limit_order(Venue::BinanceSpot, "BTCUSDT", Side::Buy, 40_000.0, 0.1);
    let too_big = limit_order(Venue::BinanceSpot, "BTCUSDT", Side::Buy, 40_000.0, 0.5);

    // The producer runs every order through the risk engine first
    assert!(risk.check_order(&good));
    assert!(manager.submit_order(good));
    risk.update_order_count(1);

    assert!(!risk.check_order(&too_big));
    // Rejected by risk: never submitted

    wait_for_processed(&manager, 1);

    let admitted = manager.get_orders_by_venue(Venue::BinanceSpot);
    assert_eq!(admitted.len(), 1);
    assert_eq!(admitted[0].symbol, "BTCUSDT");
    assert_eq!(risk.open_orders(), 1);

    manager.stop();
    risk.stop();
}

#[test]
fn test_ids_strictly_increase_in_dispatch_order() {
    let manager = OrderManager::new(OrderManagerConfig {
        ring_buffer_size: 1_024,
        max_orders_per_second: 100_000,
        max_active_orders: 4_096,
        cpu_cores: vec![],
    });
    manager.start().unwrap();

    const PER_VENUE: usize = 50;
    for i in 0..PER_VENUE {
        for venue in [Venue::BinanceSpot, Venue::BybitFutures, Venue::Upbit] {
            let order = limit_order(venue, "ETHUSDT", Side::Sell, 2_500.0, 0.2);
            assert!(manager.submit_order(order), "submission {i} on {venue}");
        }
    }

    wait_for_processed(&manager, (PER_VENUE * 3) as u64);
    manager.stop();

    // Per venue, FIFO means ids appear in admission order
    for venue in [Venue::BinanceSpot, Venue::BybitFutures, Venue::Upbit] {
        let orders = manager.get_orders_by_venue(venue);
        assert_eq!(orders.len(), PER_VENUE);
        for window in orders.windows(2) {
            assert!(window[0].id < window[1].id);
        }
    }

    // Globally, every id is unique and the range is dense
    let mut ids: Vec<OrderId> = [Venue::BinanceSpot, Venue::BybitFutures, Venue::Upbit]
        .iter()
        .flat_map(|&v| manager.get_orders_by_venue(v))
        .map(|o| o.id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), PER_VENUE * 3);
}

#[test]
fn test_cancel_after_admission_then_restart() {
    let manager = OrderManager::new(OrderManagerConfig {
        ring_buffer_size: 64,
        max_orders_per_second: 1_000,
        max_active_orders: 256,
        cpu_cores: vec![],
    });

    manager.start().unwrap();
    assert!(manager.submit_order(limit_order(
        Venue::OkxFutures,
        "SOLUSDT",
        Side::Buy,
        150.0,
        1.0
    )));
    wait_for_processed(&manager, 1);

    let id = manager.get_orders_by_venue(Venue::OkxFutures)[0].id;
    assert!(manager.cancel_order(id, Venue::OkxFutures));
    wait_for_processed(&manager, 2);
    assert_eq!(manager.get_order(id).unwrap().status, OrderStatus::Canceled);

    // Stop/start cycle keeps the index and the id counter
    manager.stop();
    manager.start().unwrap();

    assert!(manager.submit_order(limit_order(
        Venue::OkxFutures,
        "SOLUSDT",
        Side::Buy,
        151.0,
        1.0
    )));
    wait_for_processed(&manager, 3);
    manager.stop();

    let orders = manager.get_orders_by_venue(Venue::OkxFutures);
    assert_eq!(orders.len(), 2);
    assert!(orders[1].id > id);
}
