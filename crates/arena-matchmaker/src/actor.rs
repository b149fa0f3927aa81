//! Matchmaker actor: an isolated task owning the waiting pools.
//!
//! Enqueue and cancel arrive on a bounded command inbox, so connection
//! churn never contends on a lock with the (potentially slower) match
//! formation pass — and a full inbox is explicit backpressure rather
//! than unbounded buffering. Formed matches leave on a bounded event
//! channel consumed by the supervisor.

use arena_protocol::PlayerId;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};

use crate::{MatchError, MatchFormed, MatchPreferences, MatchRequest, MatchmakerConfig, WaitingPools};

/// Command inbox depth. Full inbox → enqueue rejected with `QueueFull`.
const INBOX_SIZE: usize = 256;

/// Commands sent to the matchmaker actor.
pub(crate) enum MatchmakerCommand {
    Enqueue {
        request: MatchRequest,
        reply: oneshot::Sender<Result<(), MatchError>>,
    },
    Cancel {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), MatchError>>,
    },
    Waiting {
        reply: oneshot::Sender<usize>,
    },
    Shutdown,
}

/// Handle to the running matchmaker. Cheap to clone.
#[derive(Clone)]
pub struct MatchmakerHandle {
    sender: mpsc::Sender<MatchmakerCommand>,
}

impl MatchmakerHandle {
    /// Queues a player for matchmaking.
    ///
    /// # Errors
    /// - [`MatchError::QueueFull`] — inbox or pools at capacity.
    /// - [`MatchError::AlreadyQueued`] — the player is already waiting.
    /// - [`MatchError::Unavailable`] — the actor is gone.
    pub async fn enqueue(
        &self,
        player_id: PlayerId,
        prefs: MatchPreferences,
    ) -> Result<(), MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let cmd = MatchmakerCommand::Enqueue {
            request: MatchRequest {
                player_id,
                prefs,
                enqueued_at: Instant::now(),
            },
            reply: reply_tx,
        };
        self.sender.try_send(cmd).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => MatchError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => MatchError::Unavailable,
        })?;
        reply_rx.await.map_err(|_| MatchError::Unavailable)?
    }

    /// Removes a player's waiting request.
    ///
    /// # Errors
    /// Returns [`MatchError::NotQueued`] if the player isn't waiting.
    pub async fn cancel(&self, player_id: PlayerId) -> Result<(), MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchmakerCommand::Cancel {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| MatchError::Unavailable)?;
        reply_rx.await.map_err(|_| MatchError::Unavailable)?
    }

    /// Number of requests currently waiting.
    pub async fn waiting(&self) -> Result<usize, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchmakerCommand::Waiting { reply: reply_tx })
            .await
            .map_err(|_| MatchError::Unavailable)?;
        reply_rx.await.map_err(|_| MatchError::Unavailable)
    }

    /// Tells the matchmaker to shut down.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(MatchmakerCommand::Shutdown).await;
    }
}

struct MatchmakerActor {
    pools: WaitingPools,
    receiver: mpsc::Receiver<MatchmakerCommand>,
    events: mpsc::Sender<MatchFormed>,
    evaluate_every: std::time::Duration,
}

impl MatchmakerActor {
    async fn run(mut self) {
        tracing::info!("matchmaker started");
        let mut tick = tokio::time::interval(self.evaluate_every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(MatchmakerCommand::Enqueue { request, reply }) => {
                            let result = self.pools.enqueue(request);
                            let matched_now = result.is_ok();
                            let _ = reply.send(result);
                            // A fresh request may complete a pool
                            // immediately; don't wait for the tick.
                            if matched_now && !self.emit_matches().await {
                                break;
                            }
                        }
                        Some(MatchmakerCommand::Cancel { player_id, reply }) => {
                            let _ = reply.send(self.pools.cancel(player_id));
                        }
                        Some(MatchmakerCommand::Waiting { reply }) => {
                            let _ = reply.send(self.pools.len());
                        }
                        Some(MatchmakerCommand::Shutdown) | None => break,
                    }
                }
                _ = tick.tick() => {
                    if !self.emit_matches().await {
                        break;
                    }
                }
            }
        }
        tracing::info!("matchmaker stopped");
    }

    /// Runs a formation pass and forwards results. Returns `false` when
    /// the event consumer is gone and the actor should stop.
    async fn emit_matches(&mut self) -> bool {
        for formed in self.pools.form_matches(Instant::now()) {
            if self.events.send(formed).await.is_err() {
                tracing::warn!("match event consumer gone, stopping matchmaker");
                return false;
            }
        }
        true
    }
}

/// Spawns the matchmaker task.
///
/// `events` receives every [`MatchFormed`]; the consumer (the room
/// supervisor) creates a room per event. The channel is bounded — if the
/// consumer falls behind, the actor waits, the inbox fills, and enqueue
/// starts rejecting with `QueueFull`.
pub fn spawn_matchmaker(
    config: MatchmakerConfig,
    events: mpsc::Sender<MatchFormed>,
) -> MatchmakerHandle {
    let (tx, rx) = mpsc::channel(INBOX_SIZE);
    let actor = MatchmakerActor {
        evaluate_every: config.evaluate_every,
        pools: WaitingPools::new(config),
        receiver: rx,
        events,
    };
    tokio::spawn(actor.run());
    MatchmakerHandle { sender: tx }
}
