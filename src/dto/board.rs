use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{clue::ClueState, state_machine::GamePhase};

/// Live view of the game published to HTTP and SSE clients.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BoardSnapshot {
    /// Current game phase.
    pub phase: GamePhase,
    /// Incremented on every phase transition.
    pub version: usize,
    /// Persisted game identifier, when a game is running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<Uuid>,
    /// Defender display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defender: Option<String>,
    /// Game start, RFC 3339.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// Revealed prefix.
    pub defending: String,
    /// Active clues in posting order.
    pub clues: Vec<ClueView>,
    /// Whether chatty replies are enabled.
    pub verbose: bool,
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self {
            phase: GamePhase::Idle,
            version: 0,
            game_id: None,
            defender: None,
            started_at: None,
            defending: String::new(),
            clues: Vec::new(),
            verbose: true,
        }
    }
}

/// One active clue as shown on the board.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ClueView {
    /// Clue number.
    pub number: String,
    /// Clue text.
    pub text: String,
    /// Setter display name.
    pub setter: String,
    /// Clue state.
    pub state: ClueState,
    /// Names of the players who contacted it.
    pub contacts: Vec<String>,
    /// Guess waiting for the setter, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_guess: Option<String>,
    /// Who made the pending guess.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guesser: Option<String>,
}
