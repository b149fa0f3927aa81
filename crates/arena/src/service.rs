//! `GameService`: the wiring layer that ties everything together.
//!
//! Construction order: registry → matchmaker → supervisor, then three
//! pump tasks move events between them:
//!
//! - formed matches → `Supervisor::create_room`
//! - room lifecycle signals → `Supervisor::handle_signal`
//! - registry disconnects → queue cancellation + room grace clocks
//!
//! A transport (WebSocket server, test harness) drives the service
//! through [`connect`](GameService::connect) and
//! [`handle_command`](GameService::handle_command); everything outbound
//! arrives on the per-player channel returned by `connect`.

use std::sync::Arc;

use arena_matchmaker::{MatchPreferences, MatchmakerConfig, MatchmakerHandle, spawn_matchmaker};
use arena_protocol::{ClientCommand, PlayerId, RoomId, ServerEvent};
use arena_registry::{ConnectionRegistry, PlayerStatus};
use arena_room::{GameRules, RoomPolicy};
use tokio::sync::mpsc;

use crate::{ArenaError, ChatRelay, ResultSink, Supervisor};

/// Capacity of the matchmaker → supervisor event channel.
const MATCH_EVENTS_SIZE: usize = 64;

/// Service-level configuration. Defaults match the component defaults.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub matchmaker: MatchmakerConfig,
    pub room_policy: RoomPolicy,
}

/// A running game service for one game mode.
///
/// Cheap to share: hold it in an `Arc` and call it from every
/// connection task.
pub struct GameService<G: GameRules, S: ResultSink> {
    registry: Arc<ConnectionRegistry>,
    matchmaker: MatchmakerHandle,
    supervisor: Arc<Supervisor<G, S>>,
    chat: ChatRelay,
}

impl<G: GameRules, S: ResultSink> GameService<G, S> {
    /// Builds the component graph and spawns the pump tasks.
    pub fn spawn(config: ServiceConfig, game_config: G::Config, sink: S) -> Self {
        let (registry, mut disconnects) = ConnectionRegistry::new();
        let registry = Arc::new(registry);

        let (match_tx, mut match_rx) = mpsc::channel(MATCH_EVENTS_SIZE);
        let matchmaker = spawn_matchmaker(config.matchmaker, match_tx);

        let (supervisor, mut signals) = Supervisor::new(
            Arc::clone(&registry),
            sink,
            config.room_policy,
            game_config,
        );
        let supervisor = Arc::new(supervisor);

        {
            let supervisor = Arc::clone(&supervisor);
            tokio::spawn(async move {
                while let Some(formed) = match_rx.recv().await {
                    supervisor.create_room(formed).await;
                }
                tracing::debug!("match event stream closed");
            });
        }
        {
            let supervisor = Arc::clone(&supervisor);
            tokio::spawn(async move {
                while let Some(signal) = signals.recv().await {
                    supervisor.handle_signal(signal).await;
                }
                tracing::debug!("room signal stream closed");
            });
        }
        {
            let supervisor = Arc::clone(&supervisor);
            let matchmaker = matchmaker.clone();
            tokio::spawn(async move {
                while let Some(player_id) = disconnects.recv().await {
                    // Not queued is the common case, not a failure.
                    if matchmaker.cancel(player_id).await.is_ok() {
                        tracing::debug!(%player_id, "queue entry cancelled on disconnect");
                    }
                    supervisor.on_disconnect(player_id).await;
                }
                tracing::debug!("disconnect stream closed");
            });
        }

        Self {
            chat: ChatRelay::new(Arc::clone(&registry)),
            registry,
            matchmaker,
            supervisor,
        }
    }

    /// Attaches a player and returns their outbound event stream.
    ///
    /// Reconnecting within the disconnect grace window resumes the
    /// player's room membership.
    pub async fn connect(&self, player_id: PlayerId) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.registry.register(player_id, tx);
        self.supervisor.on_reconnect(player_id).await;
        rx
    }

    /// Detaches a player. Their room (if any) starts the grace clock.
    pub fn disconnect(&self, player_id: PlayerId) {
        self.registry.unregister(player_id);
    }

    /// Dispatches one inbound command, reporting failures to the sender
    /// as a `ServerEvent::Error` — never to the other players.
    pub async fn handle_command(&self, player_id: PlayerId, command: ClientCommand) {
        if let Err(e) = self.execute(player_id, command).await {
            let code = e.code();
            tracing::debug!(%player_id, code, error = %e, "command rejected");
            let _ = self.registry.send(
                player_id,
                ServerEvent::Error {
                    code,
                    message: e.to_string(),
                },
            );
        }
    }

    /// Dispatches one inbound command, returning the failure instead of
    /// reporting it. `handle_command` is this plus error delivery.
    pub async fn execute(
        &self,
        player_id: PlayerId,
        command: ClientCommand,
    ) -> Result<(), ArenaError> {
        match command {
            ClientCommand::JoinQueue { mode, skill } => {
                if let Some(room_id) = self.supervisor.room_of(player_id).await {
                    return Err(ArenaError::AlreadyInRoom(player_id, room_id));
                }
                self.matchmaker
                    .enqueue(player_id, MatchPreferences { mode, skill })
                    .await?;
                let _ = self.registry.set_status(player_id, PlayerStatus::Queued);
                Ok(())
            }
            ClientCommand::CancelQueue => {
                self.matchmaker.cancel(player_id).await?;
                let _ = self.registry.set_status(player_id, PlayerStatus::Idle);
                Ok(())
            }
            ClientCommand::GameAction { payload } => {
                // The event was already broadcast by the room.
                self.supervisor.route_action(player_id, payload).await?;
                Ok(())
            }
            ClientCommand::ChatMessage { text } => {
                let room_id = self
                    .supervisor
                    .room_of(player_id)
                    .await
                    .ok_or(ArenaError::NotInRoom(player_id))?;
                let members = self
                    .supervisor
                    .members_of(room_id)
                    .await
                    .unwrap_or_default();
                self.chat.post(room_id, &members, player_id, &text)?;
                Ok(())
            }
            ClientCommand::Disconnect => {
                self.disconnect(player_id);
                Ok(())
            }
        }
    }

    /// Voluntarily leaves the current room (a forfeit mid-game).
    pub async fn leave_room(&self, player_id: PlayerId) -> Result<(), ArenaError> {
        self.supervisor.leave(player_id).await
    }

    /// The room a player is currently in.
    pub async fn room_of(&self, player_id: PlayerId) -> Option<RoomId> {
        self.supervisor.room_of(player_id).await
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.supervisor.room_count().await
    }

    /// Number of players waiting in the matchmaker.
    pub async fn waiting(&self) -> usize {
        self.matchmaker.waiting().await.unwrap_or(0)
    }

    /// The connection registry (for transports that deliver directly).
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}
