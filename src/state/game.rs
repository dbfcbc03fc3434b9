use std::time::SystemTime;

use indexmap::IndexSet;
use uuid::Uuid;

/// Chat user identifier as assigned by the chat service.
pub type UserId = u64;
/// Chat message identifier as assigned by the chat service.
pub type MessageId = u64;

/// Identity of a chat participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    /// Stable chat id.
    pub id: UserId,
    /// Display name at the time of the event.
    pub name: String,
    /// Room moderators are super users.
    pub is_moderator: bool,
}

impl ChatUser {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_moderator: false,
        }
    }

    pub fn moderator(mut self) -> Self {
        self.is_moderator = true;
        self
    }

    /// Name usable in an @-mention (chat mentions cannot contain spaces).
    pub fn mention(&self) -> String {
        self.name.replace(' ', "")
    }
}

/// Solution recorded when a clue is solved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedClue {
    /// Clue number.
    pub number: String,
    /// Upper-cased accepted solution.
    pub solution: String,
}

/// Per-game fields owned by the lifecycle.
#[derive(Debug, Clone, Default)]
pub struct GameSession {
    /// Identifier of the persisted game record.
    pub game_id: Option<Uuid>,
    /// Identifier of the current defend round record.
    pub defence_id: Option<Uuid>,
    /// The player defending the word.
    pub defender: Option<ChatUser>,
    /// Revealed prefix, upper-cased with spaces removed.
    pub defending_text: String,
    /// Pinned announcement of the current prefix.
    pub defending_message: Option<MessageId>,
    /// Contacts who have used their one guess since the last pass.
    pub pass_guessers: IndexSet<UserId>,
    /// The last pass happened on a clue nobody contacted.
    pub no_contact_pass: bool,
    /// Most recently solved clue.
    pub last_solved: Option<SolvedClue>,
    /// Text of the most recent guess made on a passed clue.
    pub last_guess: Option<String>,
    /// When the game started.
    pub started_at: Option<SystemTime>,
    /// Number of defend announcements this game.
    pub rounds: usize,
    /// Number of contacts made this game, including withdrawn clues.
    pub contacts_made: usize,
}

impl GameSession {
    /// Start a fresh game defended by `defender`.
    pub fn begin(defender: ChatUser) -> Self {
        Self {
            game_id: Some(Uuid::new_v4()),
            defender: Some(defender),
            started_at: Some(SystemTime::now()),
            ..Self::default()
        }
    }

    pub fn is_defender(&self, user: &ChatUser) -> bool {
        self.defender
            .as_ref()
            .is_some_and(|defender| defender.id == user.id)
    }

    /// Display name of the defender, or a placeholder before the game starts.
    pub fn defender_name(&self) -> &str {
        self.defender
            .as_ref()
            .map(|defender| defender.name.as_str())
            .unwrap_or("the defender")
    }

    /// Clear pass bookkeeping after a pass is resolved.
    pub fn clear_pass(&mut self) {
        self.pass_guessers.clear();
        self.no_contact_pass = false;
    }
}

/// Upper-case `text` and drop every whitespace character.
pub fn normalize_word(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_all_spaces() {
        assert_eq!(normalize_word(" Ro ck\tet "), "ROCKET");
    }

    #[test]
    fn mention_drops_spaces() {
        assert_eq!(ChatUser::new(4, "Jon Skeet").mention(), "JonSkeet");
    }

    #[test]
    fn defender_is_matched_by_id() {
        let session = GameSession::begin(ChatUser::new(7, "dana"));
        assert!(session.is_defender(&ChatUser::new(7, "dana (renamed)")));
        assert!(!session.is_defender(&ChatUser::new(8, "dana")));
        assert!(session.game_id.is_some());
    }

    #[test]
    fn clearing_a_pass_forgets_who_guessed() {
        let mut session = GameSession::begin(ChatUser::new(7, "dana"));
        session.pass_guessers.insert(3);
        session.no_contact_pass = true;
        session.clear_pass();
        assert!(session.pass_guessers.is_empty());
        assert!(!session.no_contact_pass);
    }
}
