//! Integration tests driving the full stack: matchmaker → supervisor →
//! room → registry, with the chess mode plugged in.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use arena::{GameService, ResultSink, ServiceConfig, SinkError};
use arena_chess::{ChessConfig, ChessGame};
use arena_protocol::{
    ClientCommand, Outcome, PlayerId, RoomId, RoomResult, ServerEvent,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Sink that records every result it sees.
#[derive(Clone, Default)]
struct RecordingSink {
    results: Arc<Mutex<Vec<RoomResult>>>,
}

impl RecordingSink {
    fn recorded(&self) -> Vec<RoomResult> {
        self.results.lock().unwrap().clone()
    }
}

impl ResultSink for RecordingSink {
    async fn record(&self, result: &RoomResult) -> Result<(), SinkError> {
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }
}

type ChessService = GameService<ChessGame, RecordingSink>;

fn spawn_service() -> (ChessService, RecordingSink) {
    let sink = RecordingSink::default();
    let service = ChessService::spawn(ServiceConfig::default(), ChessConfig, sink.clone());
    (service, sink)
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> ServerEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Reads events until a MatchFormed arrives, returning room and roster.
async fn wait_match(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> (RoomId, Vec<PlayerId>) {
    loop {
        if let ServerEvent::MatchFormed { room_id, players, .. } = next_event(rx).await {
            return (room_id, players);
        }
    }
}

/// Reads events until a RoomResult arrives.
async fn wait_result(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> RoomResult {
    loop {
        if let ServerEvent::RoomResult(result) = next_event(rx).await {
            return result;
        }
    }
}

async fn queue(service: &ChessService, player: PlayerId) {
    service
        .handle_command(
            player,
            ClientCommand::JoinQueue {
                mode: "standard".to_string(),
                skill: 1200,
            },
        )
        .await;
}

async fn play(service: &ChessService, player: PlayerId, from: &str, to: &str) {
    service
        .execute(
            player,
            ClientCommand::GameAction {
                payload: json!({ "from": from, "to": to }),
            },
        )
        .await
        .unwrap_or_else(|e| panic!("move {from}->{to} by {player} rejected: {e}"));
}

/// Polls until `check` passes or a few seconds elapse.
async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_end_to_end_chess_match() {
    let (service, sink) = spawn_service();
    let p1 = PlayerId(1);
    let p2 = PlayerId(2);
    let mut rx1 = service.connect(p1).await;
    let mut rx2 = service.connect(p2).await;

    queue(&service, p1).await;
    queue(&service, p2).await;

    let (room_id, players) = wait_match(&mut rx1).await;
    let (room_id_2, _) = wait_match(&mut rx2).await;
    assert_eq!(room_id, room_id_2);
    assert_eq!(players.len(), 2);
    assert_eq!(service.room_of(p1).await, Some(room_id));
    assert_eq!(service.room_of(p2).await, Some(room_id));

    // First in the roster plays White.
    let white = players[0];
    let black = players[1];

    // Scholar's Mate.
    play(&service, white, "e2", "e4").await;
    play(&service, black, "e7", "e5").await;
    play(&service, white, "f1", "c4").await;
    play(&service, black, "b8", "c6").await;
    play(&service, white, "d1", "h5").await;
    play(&service, black, "g8", "f6").await;
    play(&service, white, "h5", "f7").await;

    // Both sides see the result; the loser's copy is the same record.
    let result = wait_result(&mut rx1).await;
    let result_2 = wait_result(&mut rx2).await;
    assert_eq!(result.room_id, room_id);
    assert_eq!(result.winner(), Some(white));
    assert_eq!(result.reason, "checkmate");
    assert_eq!(result_2.winner(), Some(white));

    // Exactly one persistence call, and the room is gone.
    eventually(|| sink.recorded().len() == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sink.recorded().len(), 1);
    assert_eq!(sink.recorded()[0].winner(), Some(white));

    // Teardown drains through the signal pump.
    for _ in 0..200 {
        if service.room_of(p1).await.is_none() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(service.room_of(p1).await, None);
    assert_eq!(service.room_of(p2).await, None);
    assert_eq!(service.room_count().await, 0);
}

#[tokio::test]
async fn test_game_events_sequence_and_fanout() {
    let (service, _sink) = spawn_service();
    let p1 = PlayerId(11);
    let p2 = PlayerId(12);
    let mut rx1 = service.connect(p1).await;
    let mut rx2 = service.connect(p2).await;

    queue(&service, p1).await;
    queue(&service, p2).await;
    let (_, players) = wait_match(&mut rx1).await;
    wait_match(&mut rx2).await;

    play(&service, players[0], "e2", "e4").await;
    play(&service, players[1], "e7", "e5").await;
    play(&service, players[0], "g1", "f3").await;

    // Every member sees the same gap-free sequence.
    for rx in [&mut rx1, &mut rx2] {
        let mut seqs = Vec::new();
        while seqs.len() < 3 {
            if let ServerEvent::GameEvent(event) = next_event(rx).await {
                seqs.push(event.seq);
            }
        }
        assert_eq!(seqs, vec![1, 2, 3]);
    }
}

#[tokio::test]
async fn test_cancel_queue() {
    let (service, _sink) = spawn_service();
    let p = PlayerId(21);
    let mut rx = service.connect(p).await;

    queue(&service, p).await;
    assert_eq!(service.waiting().await, 1);

    service.handle_command(p, ClientCommand::CancelQueue).await;
    assert_eq!(service.waiting().await, 0);

    // A second cancel has nothing to remove.
    service.handle_command(p, ClientCommand::CancelQueue).await;
    match next_event(&mut rx).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, 404),
        other => panic!("expected error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_action_without_room_rejected() {
    let (service, _sink) = spawn_service();
    let p = PlayerId(31);
    let mut rx = service.connect(p).await;

    service
        .handle_command(
            p,
            ClientCommand::GameAction {
                payload: json!({ "from": "e2", "to": "e4" }),
            },
        )
        .await;

    match next_event(&mut rx).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, 404),
        other => panic!("expected error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_queue_while_seated_rejected() {
    let (service, _sink) = spawn_service();
    let p1 = PlayerId(41);
    let p2 = PlayerId(42);
    let mut rx1 = service.connect(p1).await;
    let mut rx2 = service.connect(p2).await;

    queue(&service, p1).await;
    queue(&service, p2).await;
    wait_match(&mut rx1).await;
    wait_match(&mut rx2).await;

    queue(&service, p1).await;
    match next_event(&mut rx1).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, 409),
        other => panic!("expected error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_action_payload() {
    let (service, _sink) = spawn_service();
    let p1 = PlayerId(51);
    let p2 = PlayerId(52);
    let mut rx1 = service.connect(p1).await;
    let mut rx2 = service.connect(p2).await;

    queue(&service, p1).await;
    queue(&service, p2).await;
    let (_, players) = wait_match(&mut rx1).await;
    wait_match(&mut rx2).await;

    service
        .handle_command(players[0], ClientCommand::GameAction {
            payload: json!({ "bogus": true }),
        })
        .await;

    let offender = if players[0] == p1 { &mut rx1 } else { &mut rx2 };
    match next_event(offender).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, 400),
        other => panic!("expected error, got {:?}", other),
    }

    // The game is untouched: the next legal move gets sequence 1.
    play(&service, players[0], "e2", "e4").await;
    loop {
        if let ServerEvent::GameEvent(event) = next_event(&mut rx2).await {
            assert_eq!(event.seq, 1);
            break;
        }
    }
}

#[tokio::test]
async fn test_chat_in_room() {
    let (service, _sink) = spawn_service();
    let p1 = PlayerId(61);
    let p2 = PlayerId(62);
    let outsider = PlayerId(63);
    let mut rx1 = service.connect(p1).await;
    let mut rx2 = service.connect(p2).await;
    let mut rx3 = service.connect(outsider).await;

    queue(&service, p1).await;
    queue(&service, p2).await;
    wait_match(&mut rx1).await;
    wait_match(&mut rx2).await;

    service
        .handle_command(p1, ClientCommand::ChatMessage {
            text: "good luck".to_string(),
        })
        .await;

    for rx in [&mut rx1, &mut rx2] {
        loop {
            if let ServerEvent::ChatMessage(message) = next_event(rx).await {
                assert_eq!(message.sender, p1);
                assert_eq!(message.text, "good luck");
                break;
            }
        }
    }

    // Players outside the room can't post into it.
    service
        .handle_command(outsider, ClientCommand::ChatMessage {
            text: "let me in".to_string(),
        })
        .await;
    match next_event(&mut rx3).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, 404),
        other => panic!("expected error, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_grace_expiry_forfeits() {
    let (service, sink) = spawn_service();
    let p1 = PlayerId(71);
    let p2 = PlayerId(72);
    let mut rx1 = service.connect(p1).await;
    let mut rx2 = service.connect(p2).await;

    queue(&service, p1).await;
    queue(&service, p2).await;
    wait_match(&mut rx1).await;
    wait_match(&mut rx2).await;

    service.disconnect(p1);
    // Default grace is 30s; let it lapse.
    tokio::time::sleep(Duration::from_secs(31)).await;

    let result = wait_result(&mut rx2).await;
    assert_eq!(result.winner(), Some(p2));
    assert_eq!(result.reason, "forfeit");
    assert!(matches!(result.outcome, Outcome::Win { .. }));

    eventually(|| sink.recorded().len() == 1).await;
    assert_eq!(service.room_of(p2).await, None);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_before_seating_still_forfeits() {
    // A player can drop in the gap between match formation and room
    // creation. Their grace clock must still run, or the opponent
    // waits forever.
    let (service, sink) = spawn_service();
    let p1 = PlayerId(75);
    let p2 = PlayerId(76);
    let mut rx1 = service.connect(p1).await;
    let _rx2 = service.connect(p2).await;

    queue(&service, p1).await;
    queue(&service, p2).await;
    // The match is formed but the room pump hasn't run yet.
    service.disconnect(p2);

    let (room_id, _) = wait_match(&mut rx1).await;
    assert_eq!(service.room_of(p1).await, Some(room_id));

    tokio::time::sleep(Duration::from_secs(31)).await;

    let result = wait_result(&mut rx1).await;
    assert_eq!(result.winner(), Some(p1));
    assert_eq!(result.reason, "forfeit");

    eventually(|| sink.recorded().len() == 1).await;
    assert_eq!(service.room_of(p2).await, None);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_within_grace_resumes() {
    let (service, sink) = spawn_service();
    let p1 = PlayerId(81);
    let p2 = PlayerId(82);
    let mut rx1 = service.connect(p1).await;
    let mut rx2 = service.connect(p2).await;

    queue(&service, p1).await;
    queue(&service, p2).await;
    let (room_id, players) = wait_match(&mut rx1).await;
    wait_match(&mut rx2).await;

    service.disconnect(p1);
    tokio::time::sleep(Duration::from_secs(10)).await;

    // Back within the grace window: membership survives.
    rx1 = service.connect(p1).await;
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(service.room_of(p1).await, Some(room_id));
    assert!(sink.recorded().is_empty());

    // The game is still playable.
    play(&service, players[0], "e2", "e4").await;
    loop {
        if let ServerEvent::GameEvent(event) = next_event(&mut rx1).await {
            assert_eq!(event.seq, 1);
            break;
        }
    }
}

#[tokio::test]
async fn test_fuzz_membership_stays_single_room() {
    // Random churn across a small population. The membership index
    // panics on any double-booking, so surviving the run is the assert.
    let (service, _sink) = spawn_service();
    let mut rng = StdRng::seed_from_u64(42);

    let players: Vec<PlayerId> = (1..=8).map(PlayerId).collect();
    let mut channels: Vec<Option<mpsc::UnboundedReceiver<ServerEvent>>> = Vec::new();
    for &p in &players {
        channels.push(Some(service.connect(p).await));
    }

    for _ in 0..200 {
        let i = rng.random_range(0..players.len());
        let p = players[i];
        match rng.random_range(0..5u32) {
            0 => queue(&service, p).await,
            1 => service.handle_command(p, ClientCommand::CancelQueue).await,
            2 => {
                service.disconnect(p);
                channels[i] = None;
            }
            3 => {
                if channels[i].is_none() {
                    channels[i] = Some(service.connect(p).await);
                }
            }
            _ => {
                let _ = service.leave_room(p).await;
            }
        }
        // Drain whatever arrived so channels never look abandoned.
        if let Some(rx) = channels[i].as_mut() {
            while rx.try_recv().is_ok() {}
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    // Every player resolves to at most one room, and lookups agree.
    for &p in &players {
        if let Some(room_id) = service.room_of(p).await {
            assert_eq!(service.room_of(p).await, Some(room_id));
        }
    }
}
