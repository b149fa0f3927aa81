//! Waiting pools and the match-formation pass.
//!
//! Pure data structure, no tasks or channels — the actor in `actor.rs`
//! drives it. Keeping the pool logic synchronous makes the formation
//! pass deterministic and directly unit-testable.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use arena_protocol::{PlayerId, RoomId};
// Tokio's Instant so widening follows the (pausable) runtime clock.
use tokio::time::Instant;

use crate::MatchError;

/// What a player asked for when queueing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPreferences {
    /// Game mode key; requests only ever match within one mode.
    pub mode: String,
    /// Skill rating, bucketed into bands of `band_width`.
    pub skill: u32,
}

/// One waiting matchmaking request.
///
/// Created on enqueue, consumed when matched or cancelled.
#[derive(Debug, Clone)]
pub struct MatchRequest {
    pub player_id: PlayerId,
    pub prefs: MatchPreferences,
    pub enqueued_at: Instant,
}

/// The matchmaker assembled a compatible group.
///
/// Players are listed in queue order (oldest first); the room created
/// from this event seats them in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFormed {
    pub room_id: RoomId,
    pub mode: String,
    pub players: Vec<PlayerId>,
}

/// Tunables for pool behavior. All deterministic — no randomness anywhere
/// in matching, so runs are reproducible in tests.
#[derive(Debug, Clone)]
pub struct MatchmakerConfig {
    /// Players per match.
    pub group_size: usize,
    /// Skill points per compatibility band.
    pub band_width: u32,
    /// How long a request waits before its band starts widening.
    pub widen_after: Duration,
    /// Each further interval of waiting widens the band by one more.
    pub widen_interval: Duration,
    /// Period of the evaluation tick (drives widening-based matches).
    pub evaluate_every: Duration,
    /// Total waiting requests across all pools; enqueue beyond this is
    /// rejected with `QueueFull`.
    pub max_waiting: usize,
}

impl Default for MatchmakerConfig {
    fn default() -> Self {
        Self {
            group_size: 2,
            band_width: 100,
            widen_after: Duration::from_secs(5),
            widen_interval: Duration::from_secs(5),
            evaluate_every: Duration::from_secs(1),
            max_waiting: 1024,
        }
    }
}

/// Mode-keyed FIFO queues of waiting requests.
pub struct WaitingPools {
    config: MatchmakerConfig,
    queues: HashMap<String, VecDeque<MatchRequest>>,
    waiting: usize,
}

impl WaitingPools {
    pub fn new(config: MatchmakerConfig) -> Self {
        Self {
            config,
            queues: HashMap::new(),
            waiting: 0,
        }
    }

    /// Total waiting requests across all modes.
    pub fn len(&self) -> usize {
        self.waiting
    }

    pub fn is_empty(&self) -> bool {
        self.waiting == 0
    }

    /// Adds a request to the back of its mode's queue.
    ///
    /// # Errors
    /// - [`MatchError::AlreadyQueued`] if the player is already waiting
    ///   (in any mode).
    /// - [`MatchError::QueueFull`] at capacity.
    pub fn enqueue(&mut self, request: MatchRequest) -> Result<(), MatchError> {
        // Duplicate check first: a player already waiting should hear
        // that, not that the pool happens to be full.
        if self
            .queues
            .values()
            .flatten()
            .any(|r| r.player_id == request.player_id)
        {
            return Err(MatchError::AlreadyQueued(request.player_id));
        }
        if self.waiting >= self.config.max_waiting {
            return Err(MatchError::QueueFull);
        }

        tracing::debug!(
            player_id = %request.player_id,
            mode = %request.prefs.mode,
            skill = request.prefs.skill,
            "request enqueued"
        );
        self.queues
            .entry(request.prefs.mode.clone())
            .or_default()
            .push_back(request);
        self.waiting += 1;
        Ok(())
    }

    /// Removes a player's waiting request.
    ///
    /// # Errors
    /// Returns [`MatchError::NotQueued`] if the player isn't waiting.
    pub fn cancel(&mut self, player_id: PlayerId) -> Result<(), MatchError> {
        for queue in self.queues.values_mut() {
            if let Some(pos) = queue.iter().position(|r| r.player_id == player_id) {
                queue.remove(pos);
                self.waiting -= 1;
                tracing::debug!(%player_id, "request cancelled");
                return Ok(());
            }
        }
        Err(MatchError::NotQueued(player_id))
    }

    /// Forms every match currently possible, oldest requests first.
    ///
    /// Within one mode queue the pass walks seeds front-to-back: the
    /// seed's band (widened by its wait time) gathers the first
    /// `group_size - 1` later requests compatible with it. Groups keep
    /// strict queue order, so two requests with identical criteria can
    /// never be matched out of arrival order. A seed that can't fill a
    /// group stays put and later seeds still get their try.
    pub fn form_matches(&mut self, now: Instant) -> Vec<MatchFormed> {
        let group_size = self.config.group_size;
        let mut formed = Vec::new();

        for (mode, queue) in &mut self.queues {
            loop {
                let Some(group) = find_group(queue, now, group_size, &self.config) else {
                    break;
                };
                // Remove back-to-front so earlier indices stay valid.
                let mut players = Vec::with_capacity(group.len());
                for &idx in group.iter().rev() {
                    let request = queue.remove(idx).expect("index from scan");
                    players.push(request.player_id);
                }
                players.reverse();
                self.waiting -= players.len();

                let room_id = RoomId::fresh();
                tracing::info!(
                    %room_id,
                    mode = %mode,
                    players = ?players,
                    "match formed"
                );
                formed.push(MatchFormed {
                    room_id,
                    mode: mode.clone(),
                    players,
                });
            }
        }
        self.queues.retain(|_, q| !q.is_empty());
        formed
    }

}

/// How many extra bands a request reaches after waiting, as a pure
/// function of elapsed time.
fn radius(config: &MatchmakerConfig, request: &MatchRequest, now: Instant) -> u32 {
    let elapsed = now.saturating_duration_since(request.enqueued_at);
    if elapsed < config.widen_after {
        return 0;
    }
    let over = elapsed - config.widen_after;
    1 + (over.as_millis() / config.widen_interval.as_millis().max(1)) as u32
}

fn band(config: &MatchmakerConfig, skill: u32) -> u32 {
    skill / config.band_width.max(1)
}

/// Two requests are compatible when the band gap is within the wider of
/// the two reach radii — an old request can pull in newcomers.
fn compatible(
    config: &MatchmakerConfig,
    a: &MatchRequest,
    b: &MatchRequest,
    now: Instant,
) -> bool {
    let gap = band(config, a.prefs.skill).abs_diff(band(config, b.prefs.skill));
    gap <= radius(config, a, now).max(radius(config, b, now))
}

/// Finds the first seed (front-to-back) that can assemble a full group,
/// returning the queue indices of the group in ascending order.
fn find_group(
    queue: &VecDeque<MatchRequest>,
    now: Instant,
    group_size: usize,
    config: &MatchmakerConfig,
) -> Option<Vec<usize>> {
    for seed_idx in 0..queue.len() {
        let seed = &queue[seed_idx];
        let mut group = vec![seed_idx];
        for (idx, candidate) in queue.iter().enumerate().skip(seed_idx + 1) {
            if compatible(config, seed, candidate, now) {
                group.push(idx);
                if group.len() == group_size {
                    return Some(group);
                }
            }
        }
    }
    None
}
