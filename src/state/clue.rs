use std::time::{Instant, SystemTime};

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::game::{ChatUser, MessageId, UserId};

/// Lifecycle of a single clue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClueState {
    /// Posted and waiting to be guessed.
    Set,
    /// The defender passed on it; contacts may guess.
    Passed,
    /// A new letter was revealed and the setter has not said whether it survives.
    Schroedinger,
    /// Guessed correctly.
    Solved,
    /// Killed by its setter, a command, or a failed pass.
    Dead,
}

/// Guess waiting for the setter's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingGuess {
    /// Upper-cased guess text.
    pub text: String,
    /// Display name of whoever guessed.
    pub guesser: String,
    /// When the guess was made.
    pub since: Instant,
    /// Whether the setter was already reminded about it.
    pub warned: bool,
}

/// Riddle posted by a player, keyed by its clue number.
#[derive(Debug, Clone)]
pub struct Clue {
    /// Number chosen by the setter (`3`, `4.1`, `7''`).
    pub number: String,
    /// Who posted the clue.
    pub setter: ChatUser,
    /// Bare clue text.
    pub text: String,
    /// Chat message carrying the clue, if known.
    pub message: Option<MessageId>,
    /// Players who contacted the clue, by user id.
    pub contacts: IndexMap<UserId, String>,
    /// Wall-clock time the clue was posted.
    pub posted_at: SystemTime,
    /// Identifier of the persisted clue record.
    pub record_id: Uuid,
    /// Defend round the clue was posted in.
    pub defence_id: Option<Uuid>,
    /// Whether the setter was reminded about an unconfirmed Schroedinger state.
    pub warned: bool,
    /// Who solved the clue, once solved.
    pub solver: Option<String>,
    /// Accepted solution, once solved.
    pub solution: Option<String>,
    state: ClueState,
    state_since: Instant,
    guess: Option<PendingGuess>,
}

impl Clue {
    pub fn new(
        number: impl Into<String>,
        text: impl Into<String>,
        setter: ChatUser,
        message: Option<MessageId>,
        now: Instant,
    ) -> Self {
        Self {
            number: number.into(),
            setter,
            text: text.into(),
            message,
            contacts: IndexMap::new(),
            posted_at: SystemTime::now(),
            record_id: Uuid::new_v4(),
            defence_id: None,
            warned: false,
            solver: None,
            solution: None,
            state: ClueState::Set,
            state_since: now,
            guess: None,
        }
    }

    pub fn state(&self) -> ClueState {
        self.state
    }

    /// Instant the clue entered its current state.
    pub fn state_since(&self) -> Instant {
        self.state_since
    }

    /// Move to `state`; a new state is eligible for a fresh reminder.
    pub fn set_state(&mut self, state: ClueState, now: Instant) {
        self.state = state;
        self.state_since = now;
        self.warned = false;
    }

    pub fn guess(&self) -> Option<&PendingGuess> {
        self.guess.as_ref()
    }

    pub fn guess_mut(&mut self) -> Option<&mut PendingGuess> {
        self.guess.as_mut()
    }

    /// Record a guess awaiting the setter's verdict.
    pub fn set_guess(&mut self, text: &str, guesser: &str, now: Instant) {
        self.guess = Some(PendingGuess {
            text: text.trim().to_uppercase(),
            guesser: guesser.to_string(),
            since: now,
            warned: false,
        });
    }

    pub fn clear_guess(&mut self) -> Option<PendingGuess> {
        self.guess.take()
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, ClueState::Solved | ClueState::Dead)
    }
}

/// Returned when a number is already taken by another active clue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("There is already an active clue #{number}.  Please edit or repost with a different number.")]
pub struct AlreadyActive {
    /// The contested clue number.
    pub number: String,
}

/// Active clues keyed by number, plus everything solved or killed this game.
#[derive(Debug, Default)]
pub struct ClueRegistry {
    active: IndexMap<String, Clue>,
    history: Vec<Clue>,
}

impl ClueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `clue` under a number no active clue uses.
    pub fn add(&mut self, clue: Clue) -> Result<(), AlreadyActive> {
        if self.active.contains_key(&clue.number) {
            return Err(AlreadyActive {
                number: clue.number,
            });
        }
        self.active.insert(clue.number.clone(), clue);
        Ok(())
    }

    /// Refresh the text of clue `number` when `message` is the one that posted it.
    pub fn edit(&mut self, number: &str, message: MessageId, text: &str) -> bool {
        match self.active.get_mut(number) {
            Some(clue) if clue.message == Some(message) => {
                clue.text = text.to_string();
                true
            }
            _ => false,
        }
    }

    /// Point an existing clue at the bot's own re-post of it.
    ///
    /// Only succeeds when the text matches, so a resumed clue is never confused with a new one.
    pub fn relink(&mut self, number: &str, text: &str, message: MessageId) -> bool {
        match self.active.get_mut(number) {
            Some(clue) if clue.text.trim() == text.trim() => {
                clue.message = Some(message);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, number: &str) -> Option<&Clue> {
        self.active.get(number)
    }

    pub fn get_mut(&mut self, number: &str) -> Option<&mut Clue> {
        self.active.get_mut(number)
    }

    pub fn contains(&self, number: &str) -> bool {
        self.active.contains_key(number)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Active clues in posting order.
    pub fn iter(&self) -> impl Iterator<Item = &Clue> {
        self.active.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Clue> {
        self.active.values_mut()
    }

    /// Solved and dead clues in the order they left the board.
    pub fn history(&self) -> &[Clue] {
        &self.history
    }

    /// Sum of contacts over every active clue.
    pub fn total_contacts(&self) -> usize {
        self.active.values().map(|clue| clue.contacts.len()).sum()
    }

    /// The clue the defender passed on, if any.
    pub fn passed(&self) -> Option<&Clue> {
        self.active
            .values()
            .find(|clue| clue.state() == ClueState::Passed)
    }

    /// Numbers of every active clue carried by `message`.
    pub fn numbers_for_message(&self, message: MessageId) -> Vec<String> {
        self.active
            .values()
            .filter(|clue| clue.message == Some(message))
            .map(|clue| clue.number.clone())
            .collect()
    }

    /// Whether any active clue still lives in `message`.
    pub fn message_in_use(&self, message: MessageId) -> bool {
        self.active
            .values()
            .any(|clue| clue.message == Some(message))
    }

    /// Resolve a clue to `final_state` and move it to the history.
    pub fn remove(&mut self, number: &str, final_state: ClueState, now: Instant) -> Option<&Clue> {
        let mut clue = self.active.shift_remove(number)?;
        clue.clear_guess();
        clue.set_state(final_state, now);
        self.history.push(clue);
        self.history.last()
    }

    /// Mark every remaining clue dead while keeping it listed for the final summary.
    pub fn finish_all(&mut self, now: Instant) {
        for clue in self.active.values_mut() {
            clue.clear_guess();
            clue.set_state(ClueState::Dead, now);
        }
    }

    /// Move every active clue to the history.
    pub fn retire_all(&mut self) {
        self.history
            .extend(self.active.drain(..).map(|(_, clue)| clue));
    }

    /// Forget everything, ready for a new game.
    pub fn clear(&mut self) {
        self.active.clear();
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: UserId, name: &str) -> ChatUser {
        ChatUser::new(id, name)
    }

    fn clue(number: &str, text: &str, message: MessageId) -> Clue {
        Clue::new(number, text, user(1, "alice"), Some(message), Instant::now())
    }

    #[test]
    fn added_clue_is_set_with_its_text_and_setter() {
        let mut registry = ClueRegistry::new();
        assert_eq!(registry.add(clue("3", "Greek letter", 10)), Ok(()));

        let stored = registry.get("3").unwrap();
        assert_eq!(stored.state(), ClueState::Set);
        assert_eq!(stored.text, "Greek letter");
        assert_eq!(stored.setter.name, "alice");
    }

    #[test]
    fn duplicate_number_from_another_message_is_rejected() {
        let mut registry = ClueRegistry::new();
        registry.add(clue("3", "first", 10)).unwrap();

        let err = registry.add(clue("3", "second", 11)).unwrap_err();
        assert_eq!(err.number, "3");
        assert_eq!(registry.get("3").unwrap().text, "first");
    }

    #[test]
    fn edit_of_the_same_message_updates_text() {
        let mut registry = ClueRegistry::new();
        registry.add(clue("3", "frist", 10)).unwrap();
        assert!(!registry.edit("3", 11, "hijacked"));
        assert!(registry.edit("3", 10, "first"));
        assert_eq!(registry.get("3").unwrap().text, "first");
        assert!(registry.add(clue("3", "first", 10)).is_err());
    }

    #[test]
    fn relink_requires_identical_text() {
        let mut registry = ClueRegistry::new();
        let mut restored = clue("3", "Greek letter", 10);
        restored.message = None;
        registry.add(restored).unwrap();

        assert!(!registry.relink("3", "Roman letter", 99));
        assert!(registry.relink("3", " Greek letter ", 99));
        assert_eq!(registry.get("3").unwrap().message, Some(99));
    }

    #[test]
    fn guess_and_guesser_are_set_and_cleared_together() {
        let mut c = clue("3", "text", 10);
        assert!(c.guess().is_none());

        c.set_guess("foobar ", "dave", Instant::now());
        let pending = c.guess().unwrap();
        assert_eq!(pending.text, "FOOBAR");
        assert_eq!(pending.guesser, "dave");

        c.clear_guess();
        assert!(c.guess().is_none());
    }

    #[test]
    fn remove_moves_clue_to_history() {
        let mut registry = ClueRegistry::new();
        registry.add(clue("3", "a", 10)).unwrap();
        registry.add(clue("4", "b", 10)).unwrap();

        let removed = registry.remove("3", ClueState::Solved, Instant::now()).unwrap();
        assert_eq!(removed.state(), ClueState::Solved);
        assert!(!registry.contains("3"));
        assert!(registry.message_in_use(10));
        assert_eq!(registry.history().len(), 1);
    }

    #[test]
    fn finish_all_keeps_clues_listed_until_retired() {
        let mut registry = ClueRegistry::new();
        registry.add(clue("1", "a", 10)).unwrap();
        registry.add(clue("2", "b", 11)).unwrap();

        registry.finish_all(Instant::now());
        assert_eq!(registry.len(), 2);
        assert!(registry.iter().all(|c| c.state() == ClueState::Dead));

        registry.retire_all();
        assert!(registry.is_empty());
        assert_eq!(registry.history().len(), 2);
    }
}
