//! Integration tests for the matchmaker actor.

use std::time::Duration;

use arena_matchmaker::{
    MatchError, MatchFormed, MatchPreferences, MatchmakerConfig, MatchmakerHandle,
    spawn_matchmaker,
};
use arena_protocol::PlayerId;
use tokio::sync::mpsc;

fn prefs(mode: &str, skill: u32) -> MatchPreferences {
    MatchPreferences {
        mode: mode.into(),
        skill,
    }
}

fn spawn(config: MatchmakerConfig) -> (MatchmakerHandle, mpsc::Receiver<MatchFormed>) {
    let (events_tx, events_rx) = mpsc::channel(64);
    (spawn_matchmaker(config, events_tx), events_rx)
}

#[tokio::test]
async fn test_match_formed_immediately_when_pool_fills() {
    let (mm, mut events) = spawn(MatchmakerConfig::default());

    mm.enqueue(PlayerId(1), prefs("chess", 1200)).await.unwrap();
    mm.enqueue(PlayerId(2), prefs("chess", 1210)).await.unwrap();

    let formed = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("match should form without waiting for a tick")
        .unwrap();
    assert_eq!(formed.players, vec![PlayerId(1), PlayerId(2)]);
    assert_eq!(mm.waiting().await.unwrap(), 0);
}

#[tokio::test]
async fn test_cancel_not_queued() {
    let (mm, _events) = spawn(MatchmakerConfig::default());
    let result = mm.cancel(PlayerId(7)).await;
    assert!(matches!(result, Err(MatchError::NotQueued(p)) if p == PlayerId(7)));
}

#[tokio::test]
async fn test_cancel_prevents_match() {
    let (mm, mut events) = spawn(MatchmakerConfig::default());

    mm.enqueue(PlayerId(1), prefs("chess", 1000)).await.unwrap();
    mm.cancel(PlayerId(1)).await.unwrap();
    mm.enqueue(PlayerId(2), prefs("chess", 1000)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(events.try_recv().is_err());
    assert_eq!(mm.waiting().await.unwrap(), 1);
}

#[tokio::test]
async fn test_double_enqueue_rejected() {
    let (mm, _events) = spawn(MatchmakerConfig::default());
    mm.enqueue(PlayerId(1), prefs("chess", 1000)).await.unwrap();
    let result = mm.enqueue(PlayerId(1), prefs("chess", 1000)).await;
    assert!(matches!(result, Err(MatchError::AlreadyQueued(_))));
}

#[tokio::test]
async fn test_pool_capacity_backpressure() {
    let (mm, _events) = spawn(MatchmakerConfig {
        max_waiting: 1,
        ..MatchmakerConfig::default()
    });
    // Distant band so the first request stays queued.
    mm.enqueue(PlayerId(1), prefs("chess", 100)).await.unwrap();
    let result = mm.enqueue(PlayerId(2), prefs("chess", 9000)).await;
    assert!(matches!(result, Err(MatchError::QueueFull)));
}

#[tokio::test(start_paused = true)]
async fn test_widening_matches_distant_bands_after_wait() {
    let (mm, mut events) = spawn(MatchmakerConfig {
        band_width: 100,
        widen_after: Duration::from_secs(5),
        widen_interval: Duration::from_secs(5),
        evaluate_every: Duration::from_secs(1),
        ..MatchmakerConfig::default()
    });

    // Two bands apart: needs radius 2, i.e. widen_after + one interval.
    mm.enqueue(PlayerId(1), prefs("chess", 100)).await.unwrap();
    mm.enqueue(PlayerId(2), prefs("chess", 300)).await.unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(events.try_recv().is_err(), "should not match before widening");

    tokio::time::sleep(Duration::from_secs(10)).await;
    let formed = events.try_recv().expect("widened bands should match");
    assert_eq!(formed.players, vec![PlayerId(1), PlayerId(2)]);
}

#[tokio::test]
async fn test_fifo_fairness_across_batches() {
    let (mm, mut events) = spawn(MatchmakerConfig::default());

    for id in 1..=6 {
        mm.enqueue(PlayerId(id), prefs("chess", 1000)).await.unwrap();
    }

    let mut matched_order = Vec::new();
    for _ in 0..3 {
        let formed = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        matched_order.extend(formed.players);
    }
    let expected: Vec<PlayerId> = (1..=6).map(PlayerId).collect();
    assert_eq!(matched_order, expected);
}

#[tokio::test]
async fn test_shutdown_makes_handle_unavailable() {
    let (mm, _events) = spawn(MatchmakerConfig::default());
    mm.shutdown().await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    let result = mm.enqueue(PlayerId(1), prefs("chess", 1000)).await;
    assert!(matches!(
        result,
        Err(MatchError::Unavailable) | Err(MatchError::QueueFull)
    ));
}
