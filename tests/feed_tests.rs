// Metrics feed: batches reconciled into the published view, reset on disconnect

mod common;

use common::{ScriptedTransport, WAIT, snapshot, wait_for_state};
use fleetwatch::feed::MetricsFeed;
use fleetwatch::mock::default_fleet;
use fleetwatch::stream::ConnectionState;
use fleetwatch::transport::SimulatedTransport;
use tokio::time::timeout;

async fn connected_feed() -> (MetricsFeed<ScriptedTransport>, ScriptedTransport) {
    let transport = ScriptedTransport::new();
    let feed = MetricsFeed::new(transport.clone());
    let mut state = feed.subscribe_state();
    assert!(feed.connect());
    transport.confirm_open();
    wait_for_state(&mut state, ConnectionState::Connected).await;
    (feed, transport)
}

#[tokio::test]
async fn test_batches_are_merged_into_ordered_view() {
    let (feed, transport) = connected_feed().await;
    let mut view = feed.subscribe();

    transport.push_batch(&[snapshot("b", "Zeta", 10.0), snapshot("a", "Alpha", 20.0)]);
    transport.push_batch(&[snapshot("b", "Zeta", 95.0)]);

    let current = timeout(
        WAIT,
        view.wait_for(|v| v.metrics.iter().any(|m| m.cpu_load == 95.0)),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    let names: Vec<&str> = current.metrics.iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["Alpha", "Zeta"]);
    assert_eq!(current.state, ConnectionState::Connected);
}

#[tokio::test]
async fn test_disconnect_clears_view_immediately() {
    let (feed, transport) = connected_feed().await;
    let mut view = feed.subscribe();
    transport.push_batch(&[snapshot("a", "Alpha", 10.0), snapshot("b", "Beta", 20.0)]);
    timeout(WAIT, view.wait_for(|v| v.metrics.len() == 2))
        .await
        .unwrap()
        .unwrap();

    assert!(feed.disconnect());
    assert!(feed.metrics().is_empty());
    assert_eq!(feed.state(), ConnectionState::Connected);

    // Late batch between the close request and its acknowledgment stays out
    transport.push_batch(&[snapshot("c", "Gamma", 30.0)]);
    let mut state = feed.subscribe_state();
    transport.acknowledge_close();
    wait_for_state(&mut state, ConnectionState::Disconnected).await;
    assert!(feed.metrics().is_empty());
}

#[tokio::test]
async fn test_repeated_disconnect_keeps_view_empty() {
    let (feed, transport) = connected_feed().await;
    let mut state = feed.subscribe_state();
    assert!(feed.disconnect());
    transport.acknowledge_close();
    wait_for_state(&mut state, ConnectionState::Disconnected).await;

    assert!(!feed.disconnect());
    assert!(!feed.disconnect());
    assert!(feed.metrics().is_empty());
    assert_eq!(transport.close_requests(), 1);
}

#[tokio::test]
async fn test_unexpected_close_keeps_last_view_but_hides_cards() {
    let (feed, transport) = connected_feed().await;
    let mut view = feed.subscribe();
    transport.push_batch(&[snapshot("a", "Alpha", 10.0)]);
    timeout(WAIT, view.wait_for(|v| v.metrics.len() == 1))
        .await
        .unwrap()
        .unwrap();

    let mut state = feed.subscribe_state();
    transport.die();
    wait_for_state(&mut state, ConnectionState::Disconnected).await;

    assert_eq!(feed.metrics().len(), 1);
    let dashboard = feed.dashboard();
    assert!(dashboard.cards.is_empty());
    assert!(dashboard.can_connect);
}

#[tokio::test]
async fn test_state_changes_are_published() {
    let transport = ScriptedTransport::new();
    let feed = MetricsFeed::new(transport.clone());
    let mut view = feed.subscribe();
    feed.connect();
    transport.confirm_open();
    timeout(WAIT, view.wait_for(|v| v.state == ConnectionState::Connected))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_simulated_transport_feeds_whole_fleet() {
    let fleet = default_fleet();
    let feed = MetricsFeed::new(SimulatedTransport::new(fleet.clone(), 20).with_seed(3));
    let mut view = feed.subscribe();
    assert!(feed.connect());

    let current = timeout(WAIT, view.wait_for(|v| v.metrics.len() == fleet.len()))
        .await
        .unwrap()
        .unwrap()
        .clone();
    let names: Vec<&str> = current.metrics.iter().map(|m| m.name()).collect();
    assert_eq!(
        names,
        vec![
            "Background Worker",
            "Database Server 1",
            "Redis Cache",
            "Web Server Alpha"
        ]
    );

    let mut state = feed.subscribe_state();
    wait_for_state(&mut state, ConnectionState::Connected).await;
    assert!(feed.disconnect());
    wait_for_state(&mut state, ConnectionState::Disconnected).await;
    assert!(feed.metrics().is_empty());
}

#[tokio::test]
async fn test_published_state_tracks_manager_without_lag() {
    let transport = ScriptedTransport::new();
    let feed = MetricsFeed::new(transport.clone());
    let view = feed.subscribe();

    assert!(feed.connect());
    assert_eq!(view.borrow().state, ConnectionState::Connecting);

    let mut state = feed.subscribe_state();
    transport.confirm_open();
    wait_for_state(&mut state, ConnectionState::Connected).await;
    assert_eq!(view.borrow().state, ConnectionState::Connected);

    transport.push_batch(&[snapshot("a", "Alpha", 10.0)]);
    transport.die();
    wait_for_state(&mut state, ConnectionState::Disconnected).await;
    let current = view.borrow().clone();
    assert_eq!(current.state, ConnectionState::Disconnected);
    assert_eq!(current.metrics.len(), 1);
    assert!(feed.dashboard().can_connect);
}

#[tokio::test]
async fn test_disconnect_while_connecting_keeps_view_and_stream() {
    let (feed, transport) = connected_feed().await;
    let mut view = feed.subscribe();
    transport.push_batch(&[snapshot("a", "Alpha", 10.0)]);
    timeout(WAIT, view.wait_for(|v| v.metrics.len() == 1))
        .await
        .unwrap()
        .unwrap();
    let mut state = feed.subscribe_state();
    transport.die();
    wait_for_state(&mut state, ConnectionState::Disconnected).await;

    // Reconnecting: nothing to close yet, so nothing is reset
    assert!(feed.connect());
    assert!(!feed.disconnect());
    assert_eq!(feed.metrics().len(), 1);
    assert_eq!(feed.state(), ConnectionState::Connecting);
    assert_eq!(transport.close_requests(), 0);

    // Once disconnected again, disconnect clears the kept view
    transport.die();
    wait_for_state(&mut state, ConnectionState::Disconnected).await;
    assert!(!feed.disconnect());
    assert!(feed.metrics().is_empty());
}
