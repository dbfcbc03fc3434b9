use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// One game of Contact, from the first defend announcement to the revealed word.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Stable identifier for the game.
    pub id: Uuid,
    /// Chat id of the defender.
    pub defender_id: u64,
    /// Defender display name when the game started.
    pub defender_name: String,
    /// Revealed word, once the game is over.
    pub word: Option<String>,
    /// When the game started.
    pub started_at: SystemTime,
    /// When the game ended, if it did.
    pub ended_at: Option<SystemTime>,
}

/// A defend round: the prefix revealed by one announcement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefenceEntity {
    /// Stable identifier for the round.
    pub id: Uuid,
    /// Game the round belongs to.
    pub game_id: Uuid,
    /// Revealed prefix, upper-cased without spaces.
    pub text: String,
    /// Chat message carrying the announcement.
    pub message_id: Option<u64>,
    /// When the prefix was announced.
    pub started_at: SystemTime,
}

/// A clue as posted, with its outcome once known.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClueEntity {
    /// Stable identifier for the clue.
    pub id: Uuid,
    /// Game the clue belongs to.
    pub game_id: Uuid,
    /// Defend round the clue was posted in.
    pub defence_id: Option<Uuid>,
    /// Number chosen by the setter.
    pub number: String,
    /// Chat id of the setter.
    pub setter_id: u64,
    /// Setter display name.
    pub setter_name: String,
    /// Clue text.
    pub text: String,
    /// Who solved it.
    pub solver: Option<String>,
    /// Accepted solution.
    pub solution: Option<String>,
    /// Chat message carrying the clue.
    pub message_id: Option<u64>,
    /// When the clue was posted.
    pub posted_at: SystemTime,
    /// When the clue was solved or killed.
    pub died_at: Option<SystemTime>,
}

impl ClueEntity {
    /// Still on the board: neither solved nor dead.
    pub fn is_open(&self) -> bool {
        self.died_at.is_none()
    }
}

/// A player's contact on a clue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactEntity {
    /// Game the contact belongs to.
    pub game_id: Uuid,
    /// Contacted clue.
    pub clue_id: Uuid,
    /// Chat id of the contacting player.
    pub user_id: u64,
    /// Display name of the contacting player.
    pub user_name: String,
    /// When the contact was made.
    pub contacted_at: SystemTime,
}

/// Named list of chat users (`whitelist` or `pinglist`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RosterEntity {
    /// Roster name.
    pub name: String,
    /// Members in insertion order.
    pub members: Vec<String>,
}
