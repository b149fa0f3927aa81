//! Room supervisor: owns the live rooms and the membership index.
//!
//! One supervisor per service. It turns `MatchFormed` events into room
//! actors, routes player actions to the right room, applies the
//! disconnect policy, and tears rooms down when they finish — handing
//! each result to the [`ResultSink`](crate::ResultSink) without letting
//! a slow sink block teardown.

use std::collections::HashMap;
use std::sync::Arc;

use arena_matchmaker::MatchFormed;
use arena_protocol::{GameEvent, PlayerId, RoomId, ServerEvent};
use arena_registry::{ConnectionRegistry, PlayerStatus};
use arena_room::{GameRules, RoomHandle, RoomPolicy, RoomSignal, spawn_room};
use rand::Rng;
use tokio::sync::{Mutex, mpsc};

use crate::{ArenaError, ResultSink, RoomIndex};

/// Command channel depth per room actor.
const ROOM_CHANNEL_SIZE: usize = 64;

/// Length of the human-facing room code.
const ROOM_CODE_LEN: usize = 8;

struct State<G: GameRules> {
    rooms: HashMap<RoomId, RoomHandle<G>>,
    index: RoomIndex,
}

/// Creates rooms from formed matches and supervises them to completion.
pub struct Supervisor<G: GameRules, S: ResultSink> {
    registry: Arc<ConnectionRegistry>,
    sink: Arc<S>,
    policy: RoomPolicy,
    game_config: G::Config,
    signals: mpsc::UnboundedSender<RoomSignal>,
    state: Mutex<State<G>>,
}

impl<G: GameRules, S: ResultSink> Supervisor<G, S> {
    /// Creates the supervisor and the lifecycle-signal stream its rooms
    /// report on. The caller pumps the receiver into
    /// [`handle_signal`](Self::handle_signal).
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        sink: S,
        policy: RoomPolicy,
        game_config: G::Config,
    ) -> (Self, mpsc::UnboundedReceiver<RoomSignal>) {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let supervisor = Self {
            registry,
            sink: Arc::new(sink),
            policy,
            game_config,
            signals: signal_tx,
            state: Mutex::new(State {
                rooms: HashMap::new(),
                index: RoomIndex::new(),
            }),
        };
        (supervisor, signal_rx)
    }

    /// Spins up a room for a formed match and seats its players.
    pub async fn create_room(&self, formed: MatchFormed) -> RoomId {
        let room_id = formed.room_id;
        let code = room_code();
        let handle = spawn_room::<G>(
            room_id,
            code.clone(),
            self.policy.clone(),
            self.game_config.clone(),
            formed.players.len(),
            Arc::clone(&self.registry),
            self.signals.clone(),
            ROOM_CHANNEL_SIZE,
        );

        {
            let mut state = self.state.lock().await;
            state.index.insert_room(room_id, &formed.players);
            state.rooms.insert(room_id, handle.clone());
        }
        tracing::info!(
            %room_id,
            code,
            mode = %formed.mode,
            players = ?formed.players,
            "room created for match"
        );

        for &player_id in &formed.players {
            if let Err(e) = handle.join(player_id).await {
                tracing::warn!(%room_id, %player_id, error = %e, "seat failed");
            }
        }
        for &player_id in &formed.players {
            let _ = self
                .registry
                .set_status(player_id, PlayerStatus::InRoom(room_id));
            if let Err(e) = self.registry.send(
                player_id,
                ServerEvent::MatchFormed {
                    room_id,
                    code: code.clone(),
                    players: formed.players.clone(),
                },
            ) {
                tracing::debug!(%room_id, %player_id, error = %e, "match notice undelivered");
            }
        }

        // A player may have dropped between match formation and seating;
        // their disconnect event predates the index entry, so re-check
        // here or the room would wait on them forever.
        for &player_id in &formed.players {
            if !self.registry.is_registered(player_id) {
                tracing::info!(%room_id, %player_id, "seated player already gone");
                handle.disconnected(player_id).await;
            }
        }
        room_id
    }

    /// Decodes and routes a game action to the sender's room.
    ///
    /// Errors go back to the sender only; other members never see them.
    pub async fn route_action(
        &self,
        player_id: PlayerId,
        payload: serde_json::Value,
    ) -> Result<GameEvent, ArenaError> {
        let handle = self.handle_for(player_id).await?;
        let action: G::Action = serde_json::from_value(payload)
            .map_err(|e| arena_protocol::ProtocolError::InvalidMessage(e.to_string()))?;
        Ok(handle.apply(player_id, action).await?)
    }

    /// Voluntary departure from the player's current room.
    pub async fn leave(&self, player_id: PlayerId) -> Result<(), ArenaError> {
        let handle = self.handle_for(player_id).await?;
        handle.leave(player_id).await?;
        Ok(())
    }

    /// Reacts to a dropped connection: the room starts its grace clock
    /// (or drops a Forming member outright).
    pub async fn on_disconnect(&self, player_id: PlayerId) {
        let handle = {
            let state = self.state.lock().await;
            state
                .index
                .room_of(player_id)
                .and_then(|room_id| state.rooms.get(&room_id).cloned())
        };
        if let Some(handle) = handle {
            handle.disconnected(player_id).await;
        }
    }

    /// Reacts to a returning connection within the grace window.
    pub async fn on_reconnect(&self, player_id: PlayerId) {
        let found = {
            let state = self.state.lock().await;
            state
                .index
                .room_of(player_id)
                .and_then(|room_id| state.rooms.get(&room_id).cloned().map(|h| (room_id, h)))
        };
        if let Some((room_id, handle)) = found {
            handle.reconnected(player_id).await;
            let _ = self
                .registry
                .set_status(player_id, PlayerStatus::InRoom(room_id));
        }
    }

    /// Processes one lifecycle signal from a room.
    pub async fn handle_signal(&self, signal: RoomSignal) {
        match signal {
            RoomSignal::Started { room_id } => {
                tracing::debug!(%room_id, "room reported game start");
            }
            RoomSignal::Left { room_id, player_id } => {
                {
                    let mut state = self.state.lock().await;
                    if state.index.room_of(player_id) == Some(room_id) {
                        state.index.remove_player(player_id);
                    }
                }
                let _ = self.registry.set_status(player_id, PlayerStatus::Idle);
            }
            RoomSignal::Finished { result } => {
                let room_id = result.room_id;

                // Persistence is fire-and-forget: a slow or failing sink
                // must never hold up teardown.
                let sink = Arc::clone(&self.sink);
                let record = result.clone();
                tokio::spawn(async move {
                    if let Err(e) = sink.record(&record).await {
                        tracing::error!(%room_id, error = %e, "result persistence failed");
                    }
                });

                let (handle, members) = {
                    let mut state = self.state.lock().await;
                    let handle = state.rooms.remove(&room_id);
                    let members = state.index.remove_room(room_id);
                    (handle, members)
                };
                for player_id in members {
                    let _ = self.registry.set_status(player_id, PlayerStatus::Idle);
                }
                if let Some(handle) = handle {
                    handle.shutdown().await;
                }
                tracing::info!(
                    %room_id,
                    outcome = ?result.outcome,
                    reason = %result.reason,
                    "room torn down"
                );
            }
        }
    }

    /// The room a player is currently indexed into.
    pub async fn room_of(&self, player_id: PlayerId) -> Option<RoomId> {
        self.state.lock().await.index.room_of(player_id)
    }

    /// The indexed members of a room.
    pub async fn members_of(&self, room_id: RoomId) -> Option<Vec<PlayerId>> {
        self.state
            .lock()
            .await
            .index
            .members_of(room_id)
            .map(|m| m.to_vec())
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.state.lock().await.rooms.len()
    }

    async fn handle_for(&self, player_id: PlayerId) -> Result<RoomHandle<G>, ArenaError> {
        let state = self.state.lock().await;
        state
            .index
            .room_of(player_id)
            .and_then(|room_id| state.rooms.get(&room_id).cloned())
            .ok_or(ArenaError::NotInRoom(player_id))
    }
}

/// Generates the human-facing room code: 8 uppercase hex characters.
fn room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| {
            let d = rng.random_range(0..16u32);
            char::from_digit(d, 16)
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or('0')
        })
        .collect()
}
