//! Room actor: an isolated Tokio task that owns one match's state.
//!
//! Each room runs in its own task and is the sole assigner of its event
//! sequence numbers. All mutation flows through the actor's command
//! channel, so two `apply` calls on the same room can never interleave —
//! different rooms are fully independent tasks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use arena_protocol::{GameEvent, Outcome, PlayerId, RoomId, RoomResult, ServerEvent};
use arena_registry::ConnectionRegistry;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::{FormingTimeout, GameRules, RoomError, RoomPhase, RoomPolicy};

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand<G: GameRules> {
    /// Seat a player (idempotent while Forming).
    Join {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Voluntary departure. Mid-game this is a forfeit.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Validate and apply a game action.
    Apply {
        player_id: PlayerId,
        action: G::Action,
        reply: oneshot::Sender<Result<GameEvent, RoomError>>,
    },

    /// The player's channel dropped; start the grace clock.
    Disconnected { player_id: PlayerId },

    /// The player came back within the grace period.
    Reconnected { player_id: PlayerId },

    /// Request a metadata snapshot.
    Info { reply: oneshot::Sender<RoomInfo> },

    /// Tear the actor down.
    Shutdown,
}

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub code: String,
    pub phase: RoomPhase,
    /// Roster in join order, departed members excluded.
    pub players: Vec<PlayerId>,
    pub target_size: usize,
    /// State version counter; bumps once per applied event.
    pub version: u64,
}

/// Lifecycle notifications from a room to its supervisor.
#[derive(Debug, Clone)]
pub enum RoomSignal {
    /// The room left Forming and the game started.
    Started { room_id: RoomId },
    /// A member departed (left or forfeited) before the room finished.
    Left { room_id: RoomId, player_id: PlayerId },
    /// The room reached a terminal state. Emitted exactly once.
    Finished { result: RoomResult },
}

/// Handle to a running room actor. Cheap to clone.
pub struct RoomHandle<G: GameRules> {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand<G>>,
}

// Manual impl: a derive would demand `G: Clone`, which the rules types
// never need to be.
impl<G: GameRules> Clone for RoomHandle<G> {
    fn clone(&self) -> Self {
        Self {
            room_id: self.room_id,
            sender: self.sender.clone(),
        }
    }
}

impl<G: GameRules> RoomHandle<G> {
    /// Returns the room's unique ID.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Seats a player in the room.
    pub async fn join(&self, player_id: PlayerId) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Removes a player; a forfeit if the game is running.
    pub async fn leave(&self, player_id: PlayerId) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Validates and applies an action, returning the sequenced event
    /// that was broadcast to all members.
    pub async fn apply(
        &self,
        player_id: PlayerId,
        action: G::Action,
    ) -> Result<GameEvent, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Apply {
                player_id,
                action,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Notifies the room that a member's channel dropped.
    pub async fn disconnected(&self, player_id: PlayerId) {
        let _ = self
            .sender
            .send(RoomCommand::Disconnected { player_id })
            .await;
    }

    /// Notifies the room that a member reconnected in time.
    pub async fn reconnected(&self, player_id: PlayerId) {
        let _ = self
            .sender
            .send(RoomCommand::Reconnected { player_id })
            .await;
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(RoomCommand::Shutdown).await;
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<G: GameRules> {
    room_id: RoomId,
    code: String,
    policy: RoomPolicy,
    target_size: usize,
    phase: RoomPhase,
    /// Full roster in join order. Join order is authoritative for
    /// turn order, so entries are never reordered.
    members: Vec<PlayerId>,
    /// Members who left or forfeited. Kept in the roster for the result.
    departed: HashSet<PlayerId>,
    /// Disconnected members and their forfeit deadlines.
    absent: HashMap<PlayerId, Instant>,
    forming_deadline: Instant,
    game_config: G::Config,
    state: Option<G::State>,
    version: u64,
    next_seq: u64,
    registry: Arc<ConnectionRegistry>,
    signals: mpsc::UnboundedSender<RoomSignal>,
    receiver: mpsc::Receiver<RoomCommand<G>>,
}

impl<G: GameRules> RoomActor<G> {
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, code = %self.code, "room opened");

        loop {
            let deadline = self.next_deadline();
            let wake = deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(RoomCommand::Join { player_id, reply }) => {
                            let _ = reply.send(self.handle_join(player_id));
                        }
                        Some(RoomCommand::Leave { player_id, reply }) => {
                            let _ = reply.send(self.handle_leave(player_id));
                        }
                        Some(RoomCommand::Apply { player_id, action, reply }) => {
                            let _ = reply.send(self.handle_apply(player_id, action));
                        }
                        Some(RoomCommand::Disconnected { player_id }) => {
                            self.handle_disconnected(player_id);
                        }
                        Some(RoomCommand::Reconnected { player_id }) => {
                            self.handle_reconnected(player_id);
                        }
                        Some(RoomCommand::Info { reply }) => {
                            let _ = reply.send(self.info());
                        }
                        Some(RoomCommand::Shutdown) | None => break,
                    }
                }
                _ = tokio::time::sleep_until(wake), if deadline.is_some() => {
                    self.handle_deadline(Instant::now());
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room closed");
    }

    // -- membership -------------------------------------------------------

    fn handle_join(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        if self.is_present(player_id) {
            // Idempotent re-join: already seated, nothing to do.
            tracing::debug!(room_id = %self.room_id, %player_id, "duplicate join ignored");
            return Ok(());
        }

        match self.phase {
            RoomPhase::Forming => {
                if self.present_count() >= self.target_size {
                    return Err(RoomError::RoomFull(self.room_id));
                }
            }
            RoomPhase::Active if self.policy.allow_midgame_join => {
                if self.present_count() >= self.target_size {
                    return Err(RoomError::RoomFull(self.room_id));
                }
            }
            RoomPhase::Active => return Err(RoomError::NotJoinable(self.room_id)),
            RoomPhase::Finished => return Err(RoomError::RoomClosed(self.room_id)),
        }

        self.members.push(player_id);
        self.departed.remove(&player_id);
        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            seated = self.present_count(),
            target = self.target_size,
            "player joined"
        );
        self.broadcast_roster();

        if self.phase == RoomPhase::Forming && self.present_count() >= self.target_size {
            self.start_game();
        }
        Ok(())
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        if !self.is_present(player_id) {
            return Err(RoomError::NotMember(player_id, self.room_id));
        }

        match self.phase {
            RoomPhase::Forming => {
                self.members.retain(|&p| p != player_id);
                self.absent.remove(&player_id);
                tracing::info!(room_id = %self.room_id, %player_id, "player left while forming");
                let _ = self.signals.send(RoomSignal::Left {
                    room_id: self.room_id,
                    player_id,
                });
                if self.members.is_empty() {
                    self.finish(Outcome::Aborted, "abandoned");
                } else {
                    self.broadcast_roster();
                }
            }
            RoomPhase::Active => {
                tracing::info!(room_id = %self.room_id, %player_id, "player left mid-game");
                self.forfeit(player_id, "forfeit");
            }
            RoomPhase::Finished => {}
        }
        Ok(())
    }

    fn handle_disconnected(&mut self, player_id: PlayerId) {
        if !self.is_present(player_id) {
            return;
        }
        match self.phase {
            RoomPhase::Forming => {
                // Nothing invested yet; treat as a leave.
                let _ = self.handle_leave(player_id);
            }
            RoomPhase::Active => {
                let deadline = Instant::now() + self.policy.disconnect_grace;
                self.absent.insert(player_id, deadline);
                tracing::info!(
                    room_id = %self.room_id,
                    %player_id,
                    grace_ms = self.policy.disconnect_grace.as_millis() as u64,
                    "member disconnected, grace clock started"
                );
                if self.connected_count() == 0 {
                    self.finish(Outcome::Aborted, "all players disconnected");
                }
            }
            RoomPhase::Finished => {}
        }
    }

    fn handle_reconnected(&mut self, player_id: PlayerId) {
        if self.absent.remove(&player_id).is_some() {
            tracing::info!(room_id = %self.room_id, %player_id, "member reconnected in time");
        }
    }

    // -- game actions ------------------------------------------------------

    fn handle_apply(
        &mut self,
        player_id: PlayerId,
        action: G::Action,
    ) -> Result<GameEvent, RoomError> {
        match self.phase {
            RoomPhase::Forming => return Err(RoomError::NotActive(self.room_id)),
            RoomPhase::Finished => return Err(RoomError::RoomClosed(self.room_id)),
            RoomPhase::Active => {}
        }
        if !self.is_present(player_id) {
            return Err(RoomError::NotMember(player_id, self.room_id));
        }

        let state = self
            .state
            .as_mut()
            .ok_or(RoomError::NotActive(self.room_id))?;

        // Rejections leave version and sequence untouched.
        G::validate(state, player_id, &action).map_err(RoomError::InvalidAction)?;

        let payload = G::apply(state, player_id, action);
        let terminal = G::outcome(state);
        self.version += 1;
        let seq = self.next_seq;
        self.next_seq += 1;

        let event = GameEvent {
            room_id: self.room_id,
            player_id,
            seq,
            payload,
        };
        tracing::debug!(room_id = %self.room_id, %player_id, seq, "event applied");
        self.broadcast(ServerEvent::GameEvent(event.clone()));

        if let Some((outcome, reason)) = terminal {
            self.finish(outcome, &reason);
        }
        Ok(event)
    }

    // -- lifecycle ---------------------------------------------------------

    fn start_game(&mut self) {
        let roster: Vec<PlayerId> = self.present_members();
        self.state = Some(G::init(&self.game_config, &roster));
        self.phase = RoomPhase::Active;
        tracing::info!(
            room_id = %self.room_id,
            players = ?roster,
            "game started"
        );
        self.broadcast_roster();
        let _ = self.signals.send(RoomSignal::Started {
            room_id: self.room_id,
        });
    }

    /// Removes a player from play and resolves the game if too few remain.
    fn forfeit(&mut self, player_id: PlayerId, reason: &str) {
        self.departed.insert(player_id);
        self.absent.remove(&player_id);
        if let Some(state) = &mut self.state {
            G::forfeit(state, player_id);
        }
        let _ = self.signals.send(RoomSignal::Left {
            room_id: self.room_id,
            player_id,
        });

        let remaining = self.present_members();
        match remaining.len() {
            0 => self.finish(Outcome::Aborted, "abandoned"),
            1 => self.finish(Outcome::Win { winner: remaining[0] }, reason),
            _ => {
                // Multiplayer variants may continue; ask the rules.
                self.broadcast_roster();
                if let Some(state) = &self.state {
                    if let Some((outcome, why)) = G::outcome(state) {
                        self.finish(outcome, &why);
                    }
                }
            }
        }
    }

    fn handle_deadline(&mut self, now: Instant) {
        if self.phase == RoomPhase::Forming {
            if now < self.forming_deadline {
                return;
            }
            match self.policy.on_forming_timeout {
                FormingTimeout::Abort => {
                    tracing::warn!(room_id = %self.room_id, "forming timed out, aborting");
                    self.finish(Outcome::Aborted, "forming timeout");
                }
                FormingTimeout::StartShortHanded { min_players } => {
                    if self.present_count() >= min_players {
                        tracing::warn!(
                            room_id = %self.room_id,
                            seated = self.present_count(),
                            target = self.target_size,
                            "forming timed out, starting short-handed"
                        );
                        self.start_game();
                    } else {
                        self.finish(Outcome::Aborted, "forming timeout");
                    }
                }
            }
            return;
        }

        // Grace expiries: forfeit every member whose deadline passed.
        let expired: Vec<PlayerId> = self
            .absent
            .iter()
            .filter(|&(_, &deadline)| deadline <= now)
            .map(|(&p, _)| p)
            .collect();
        for player_id in expired {
            if self.phase.is_terminal() {
                break;
            }
            tracing::info!(room_id = %self.room_id, %player_id, "grace elapsed, forfeiting");
            self.forfeit(player_id, "forfeit");
        }
    }

    fn finish(&mut self, outcome: Outcome, reason: &str) {
        if self.phase.is_terminal() {
            return;
        }
        self.phase = RoomPhase::Finished;
        self.absent.clear();

        let result = RoomResult {
            room_id: self.room_id,
            code: self.code.clone(),
            players: self.members.clone(),
            outcome,
            reason: reason.to_string(),
        };
        tracing::info!(
            room_id = %self.room_id,
            ?outcome,
            reason,
            "room finished"
        );
        self.broadcast(ServerEvent::RoomResult(result.clone()));
        let _ = self.signals.send(RoomSignal::Finished { result });
        // The actor stays up to answer with RoomClosed until the
        // supervisor tears it down.
    }

    // -- helpers -----------------------------------------------------------

    fn is_present(&self, player_id: PlayerId) -> bool {
        self.members.contains(&player_id) && !self.departed.contains(&player_id)
    }

    fn present_members(&self) -> Vec<PlayerId> {
        self.members
            .iter()
            .copied()
            .filter(|p| !self.departed.contains(p))
            .collect()
    }

    fn present_count(&self) -> usize {
        self.present_members().len()
    }

    /// Present members with a live connection (not in grace).
    fn connected_count(&self) -> usize {
        self.present_members()
            .iter()
            .filter(|p| !self.absent.contains_key(p))
            .count()
    }

    fn broadcast(&self, event: ServerEvent) {
        let recipients = self.present_members();
        let report = self.registry.broadcast(&recipients, &event);
        if !report.complete() {
            tracing::warn!(
                room_id = %self.room_id,
                unreachable = ?report.unreachable,
                "partial broadcast delivery"
            );
        }
    }

    fn broadcast_roster(&self) {
        self.broadcast(ServerEvent::RoomUpdate {
            room_id: self.room_id,
            players: self.present_members(),
        });
    }

    fn next_deadline(&self) -> Option<Instant> {
        match self.phase {
            RoomPhase::Forming => Some(self.forming_deadline),
            RoomPhase::Active => self.absent.values().min().copied(),
            RoomPhase::Finished => None,
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            code: self.code.clone(),
            phase: self.phase,
            players: self.present_members(),
            target_size: self.target_size,
            version: self.version,
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
///
/// `channel_size` bounds the command channel; a full channel makes
/// callers wait rather than queueing without limit.
pub fn spawn_room<G: GameRules>(
    room_id: RoomId,
    code: String,
    policy: RoomPolicy,
    game_config: G::Config,
    target_size: usize,
    registry: Arc<ConnectionRegistry>,
    signals: mpsc::UnboundedSender<RoomSignal>,
    channel_size: usize,
) -> RoomHandle<G> {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor::<G> {
        room_id,
        code,
        forming_deadline: Instant::now() + policy.forming_timeout,
        policy,
        target_size,
        phase: RoomPhase::Forming,
        members: Vec::new(),
        departed: HashSet::new(),
        absent: HashMap::new(),
        game_config,
        state: None,
        version: 0,
        next_seq: 1,
        registry,
        signals,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
