//! The membership index: `room → members` and `player → room`.
//!
//! Both directions are kept in lockstep. Every mutation re-checks the
//! pair and panics on any mismatch: a player indexed into two rooms or
//! a dangling mapping is a defect in this process, and limping on with
//! a corrupt index would route actions to the wrong game.

use std::collections::HashMap;

use arena_protocol::{PlayerId, RoomId};

/// Dual-map membership index. Pure data, no locking — the supervisor
/// guards it.
#[derive(Debug, Default)]
pub struct RoomIndex {
    room_members: HashMap<RoomId, Vec<PlayerId>>,
    player_room: HashMap<PlayerId, RoomId>,
}

impl RoomIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new room and its members.
    ///
    /// # Panics
    /// If the room already exists or any member is already indexed into
    /// another room.
    pub fn insert_room(&mut self, room_id: RoomId, members: &[PlayerId]) {
        if self.room_members.contains_key(&room_id) {
            panic!("room index corrupt: room {room_id} inserted twice");
        }
        for &player_id in members {
            if let Some(existing) = self.player_room.get(&player_id) {
                panic!(
                    "room index corrupt: player {player_id} joining room {room_id} \
                     while indexed into room {existing}"
                );
            }
        }
        self.room_members.insert(room_id, members.to_vec());
        for &player_id in members {
            self.player_room.insert(player_id, room_id);
        }
        self.check();
    }

    /// Drops a room and returns its remaining members.
    pub fn remove_room(&mut self, room_id: RoomId) -> Vec<PlayerId> {
        let members = self.room_members.remove(&room_id).unwrap_or_default();
        for player_id in &members {
            self.player_room.remove(player_id);
        }
        self.check();
        members
    }

    /// Drops one player's membership. No-op if the player isn't indexed.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Option<RoomId> {
        let room_id = self.player_room.remove(&player_id)?;
        if let Some(members) = self.room_members.get_mut(&room_id) {
            members.retain(|&p| p != player_id);
        }
        self.check();
        Some(room_id)
    }

    /// The room a player is currently in.
    pub fn room_of(&self, player_id: PlayerId) -> Option<RoomId> {
        self.player_room.get(&player_id).copied()
    }

    /// The indexed members of a room.
    pub fn members_of(&self, room_id: RoomId) -> Option<&[PlayerId]> {
        self.room_members.get(&room_id).map(|m| m.as_slice())
    }

    pub fn room_count(&self) -> usize {
        self.room_members.len()
    }

    pub fn player_count(&self) -> usize {
        self.player_room.len()
    }

    /// Verifies both directions agree. Called after every mutation.
    fn check(&self) {
        for (&player_id, &room_id) in &self.player_room {
            let listed = self
                .room_members
                .get(&room_id)
                .is_some_and(|members| members.contains(&player_id));
            if !listed {
                panic!(
                    "room index corrupt: player {player_id} maps to room {room_id} \
                     but is not in its member list"
                );
            }
        }
        let listed_total: usize = self.room_members.values().map(|m| m.len()).sum();
        if listed_total != self.player_room.len() {
            panic!(
                "room index corrupt: {listed_total} listed members vs {} player mappings",
                self.player_room.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut index = RoomIndex::new();
        index.insert_room(RoomId(1), &[pid(1), pid(2)]);

        assert_eq!(index.room_of(pid(1)), Some(RoomId(1)));
        assert_eq!(index.members_of(RoomId(1)), Some(&[pid(1), pid(2)][..]));
        assert_eq!(index.room_count(), 1);
        assert_eq!(index.player_count(), 2);
    }

    #[test]
    fn test_remove_room_clears_members() {
        let mut index = RoomIndex::new();
        index.insert_room(RoomId(1), &[pid(1), pid(2)]);

        let members = index.remove_room(RoomId(1));
        assert_eq!(members, vec![pid(1), pid(2)]);
        assert_eq!(index.room_of(pid(1)), None);
        assert_eq!(index.player_count(), 0);
    }

    #[test]
    fn test_remove_player_keeps_room() {
        let mut index = RoomIndex::new();
        index.insert_room(RoomId(1), &[pid(1), pid(2)]);

        assert_eq!(index.remove_player(pid(1)), Some(RoomId(1)));
        assert_eq!(index.remove_player(pid(1)), None);
        assert_eq!(index.members_of(RoomId(1)), Some(&[pid(2)][..]));
    }

    #[test]
    #[should_panic(expected = "room index corrupt")]
    fn test_double_membership_panics() {
        let mut index = RoomIndex::new();
        index.insert_room(RoomId(1), &[pid(1)]);
        index.insert_room(RoomId(2), &[pid(1)]);
    }

    #[test]
    #[should_panic(expected = "inserted twice")]
    fn test_duplicate_room_panics() {
        let mut index = RoomIndex::new();
        index.insert_room(RoomId(1), &[pid(1)]);
        index.insert_room(RoomId(1), &[pid(2)]);
    }
}
