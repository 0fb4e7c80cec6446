//! Contract Test: Monitor Loop
//!
//! Constraints verified:
//! - Detection notifies every subscriber once, then clears them all
//! - Detection ends the monitoring cycle
//! - Subscribers who arrive after the snapshot are not part of that event
//! - A failing scanner never crashes the loop; it just tries again later
//! - Repeated scan failures trigger the configured pause
//!
//! If this test fails, restoration notices are being lost or duplicated.

mod common;

use common::*;
use std::sync::Arc;
use std::time::Duration;
use wifiwatch_core::messages::{POWER_RESTORED, START_COMMAND};
use wifiwatch_core::{MonitorLoop, MonitoringState, Notifier, PresenceProber, SubscriptionManager};

fn restored_to(transport: &RecordingTransport, chat_id: &str) -> usize {
    transport
        .sent_to(chat_id)
        .iter()
        .filter(|m| m.text == POWER_RESTORED)
        .count()
}

#[tokio::test(start_paused = true)]
async fn detection_notifies_all_subscribers_and_goes_idle() {
    let scanner = ScriptedScanner::new();
    let transport = RecordingTransport::new();
    let manager = manager_with(&scanner, &transport);

    manager.subscribe(id("u1")).await;
    manager.subscribe(id("u2")).await;
    settle().await;

    scanner.show(&["Neighbour", TARGET]);
    tokio::time::sleep(INTERVAL).await;

    assert_eq!(restored_to(&transport, "u1"), 1);
    assert_eq!(restored_to(&transport, "u2"), 1);

    let notice = transport
        .sent_to("u1")
        .into_iter()
        .find(|m| m.text == POWER_RESTORED)
        .unwrap();
    assert_eq!(notice.buttons, Some(vec![START_COMMAND.to_string()]));

    assert!(manager.subscribers().await.is_empty());
    assert_eq!(manager.monitoring_state().await, MonitoringState::Idle);
    assert!(!manager.is_monitor_running().await);
}

#[tokio::test(start_paused = true)]
async fn sustained_presence_does_not_repeat_notification() {
    let scanner = ScriptedScanner::new();
    scanner.show(&[TARGET]);
    let transport = RecordingTransport::new();
    let manager = manager_with(&scanner, &transport);

    manager.subscribe(id("u1")).await;
    settle().await;
    tokio::time::sleep(INTERVAL * 5).await;

    assert_eq!(restored_to(&transport, "u1"), 1);
    assert_eq!(scanner.scan_count(), 1, "loop must stop after detection");
}

#[tokio::test(start_paused = true)]
async fn late_subscriber_waits_for_the_next_event() {
    let scanner = ScriptedScanner::new();
    let transport = RecordingTransport::new();
    transport.hold(POWER_RESTORED);
    let manager = manager_with(&scanner, &transport);

    manager.subscribe(id("u1")).await;
    manager.subscribe(id("u2")).await;
    settle().await;

    scanner.show(&[TARGET]);
    tokio::time::sleep(INTERVAL).await;

    // Detection happened; the notice to u1 is parked mid-broadcast
    assert_eq!(restored_to(&transport, "u1"), 1);
    assert_eq!(restored_to(&transport, "u2"), 0);
    assert!(manager.subscribers().await.is_empty());
    assert!(!manager.is_monitor_running().await);

    scanner.show(&[]);
    manager.subscribe(id("u3")).await;
    settle().await;

    assert!(manager.is_monitor_running().await, "u3 starts a fresh cycle");
    assert_eq!(manager.monitoring_state().await, MonitoringState::Active);

    transport.release();
    settle().await;

    assert_eq!(restored_to(&transport, "u1"), 1);
    assert_eq!(restored_to(&transport, "u2"), 1);
    assert_eq!(restored_to(&transport, "u3"), 0, "u3 joined after the snapshot");
    assert_eq!(manager.subscribers().await, vec![id("u3")]);
    assert!(manager.is_monitor_running().await);
    assert_eq!(scanner.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn subscribing_after_restoration_starts_a_fresh_cycle() {
    let scanner = ScriptedScanner::new();
    scanner.show(&[TARGET]);
    let transport = RecordingTransport::new();
    let manager = manager_with(&scanner, &transport);

    manager.subscribe(id("u1")).await;
    settle().await;
    assert_eq!(restored_to(&transport, "u1"), 1);
    assert!(!manager.is_monitor_running().await);

    scanner.show(&[]);
    manager.subscribe(id("u3")).await;
    settle().await;

    assert!(manager.is_monitor_running().await);
    assert_eq!(restored_to(&transport, "u3"), 0);

    scanner.show(&[TARGET]);
    tokio::time::sleep(INTERVAL).await;

    assert_eq!(restored_to(&transport, "u3"), 1);
    assert_eq!(restored_to(&transport, "u1"), 1, "u1 was not re-subscribed");
}

#[tokio::test(start_paused = true)]
async fn failed_probe_is_survived_and_retried_after_interval() {
    let scanner = ScriptedScanner::new();
    scanner.fail();
    let transport = RecordingTransport::new();
    let manager = manager_with(&scanner, &transport);

    manager.subscribe(id("u1")).await;
    settle().await;
    assert_eq!(scanner.scan_count(), 1);
    assert!(manager.is_monitor_running().await);

    tokio::time::sleep(INTERVAL).await;
    assert_eq!(scanner.scan_count(), 2);

    scanner.show(&[TARGET]);
    tokio::time::sleep(INTERVAL).await;

    assert_eq!(restored_to(&transport, "u1"), 1);
}

#[tokio::test(start_paused = true)]
async fn repeated_failures_pause_the_loop() {
    let scanner = ScriptedScanner::new();
    scanner.fail();
    let transport = RecordingTransport::new();

    let notifier = Notifier::new(Arc::new(transport.clone()));
    let prober = PresenceProber::new(Box::new(scanner.clone()), Duration::from_secs(30));
    let pause = Duration::from_secs(3600);
    let monitor = MonitorLoop::new(prober, notifier.clone(), TARGET, INTERVAL)
        .with_failure_pause(2, pause);
    let manager = SubscriptionManager::new(notifier, monitor);

    manager.subscribe(id("u1")).await;
    settle().await;
    tokio::time::sleep(INTERVAL).await;
    assert_eq!(scanner.scan_count(), 2, "second failure reaches the limit");

    tokio::time::sleep(INTERVAL * 10).await;
    assert_eq!(scanner.scan_count(), 2, "paused, not polling");

    // the pause started at the second probe, one interval in
    tokio::time::sleep(pause - INTERVAL * 10).await;
    assert_eq!(scanner.scan_count(), 3, "resumed after the pause");
}
