use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// High-level phases the game can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// No game is running; waiting for a defender to announce a word.
    Idle,
    /// The defender guesses clues against the revealed prefix.
    Guessing,
    /// The defender passed on a clue; its contacts get to guess.
    Passed,
    /// A passed clue was solved; the defender owes a letter.
    WaitingForLetter,
    /// The word was revealed; the summary is being emitted.
    Finished,
}

impl GamePhase {
    /// Whether a game is in progress (anything but idle or finished).
    pub fn is_active(self) -> bool {
        matches!(
            self,
            GamePhase::Guessing | GamePhase::Passed | GamePhase::WaitingForLetter
        )
    }
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// The defender posted a (new) prefix.
    DefenderAnnounced,
    /// A saved game was restored from the archive.
    Resumed,
    /// The defender passed on a clue.
    Pass,
    /// The pass ended without a solve (last contact denied, unpass, or the clue died).
    PassAbandoned,
    /// A contact solved the passed clue.
    PassSolved,
    /// The defender revealed the word or a trusted user ended the game.
    GameOver,
    /// Return to idle once the summary has been sent.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: GamePhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
}

/// State machine gating which chat actions are legal.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    version: usize,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Idle,
            version: 0,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Validate and apply `event`, returning the new phase.
    pub fn apply(&mut self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (
                GamePhase::Idle
                | GamePhase::Guessing
                | GamePhase::Passed
                | GamePhase::WaitingForLetter,
                GameEvent::DefenderAnnounced,
            ) => GamePhase::Guessing,
            (GamePhase::Idle, GameEvent::Resumed) => GamePhase::Guessing,
            (GamePhase::Guessing, GameEvent::Pass) => GamePhase::Passed,
            (GamePhase::Passed, GameEvent::PassAbandoned) => GamePhase::Guessing,
            (GamePhase::Passed, GameEvent::PassSolved) => GamePhase::WaitingForLetter,
            (
                GamePhase::Guessing | GamePhase::Passed | GamePhase::WaitingForLetter,
                GameEvent::GameOver,
            ) => GamePhase::Finished,
            (GamePhase::Finished, GameEvent::Reset) => GamePhase::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut GameStateMachine, event: GameEvent) -> GamePhase {
        sm.apply(event).unwrap()
    }

    #[test]
    fn initial_state_is_idle() {
        let sm = GameStateMachine::new();
        assert_eq!(sm.phase(), GamePhase::Idle);
    }

    #[test]
    fn full_happy_path_through_game() {
        let mut sm = GameStateMachine::new();

        assert_eq!(
            apply(&mut sm, GameEvent::DefenderAnnounced),
            GamePhase::Guessing
        );
        assert_eq!(apply(&mut sm, GameEvent::Pass), GamePhase::Passed);
        assert_eq!(
            apply(&mut sm, GameEvent::PassSolved),
            GamePhase::WaitingForLetter
        );
        assert_eq!(
            apply(&mut sm, GameEvent::DefenderAnnounced),
            GamePhase::Guessing
        );
        assert_eq!(apply(&mut sm, GameEvent::GameOver), GamePhase::Finished);
        assert_eq!(apply(&mut sm, GameEvent::Reset), GamePhase::Idle);
        assert_eq!(sm.snapshot().version, 6);
    }

    #[test]
    fn abandoned_pass_returns_to_guessing() {
        let mut sm = GameStateMachine::new();
        apply(&mut sm, GameEvent::DefenderAnnounced);
        apply(&mut sm, GameEvent::Pass);
        assert_eq!(
            apply(&mut sm, GameEvent::PassAbandoned),
            GamePhase::Guessing
        );
    }

    #[test]
    fn cannot_pass_twice() {
        let mut sm = GameStateMachine::new();
        apply(&mut sm, GameEvent::DefenderAnnounced);
        apply(&mut sm, GameEvent::Pass);

        let err = sm.apply(GameEvent::Pass).unwrap_err();
        assert_eq!(err.from, GamePhase::Passed);
        assert_eq!(err.event, GameEvent::Pass);
        assert_eq!(sm.phase(), GamePhase::Passed);
    }

    #[test]
    fn resume_only_from_idle() {
        let mut sm = GameStateMachine::new();
        assert_eq!(apply(&mut sm, GameEvent::Resumed), GamePhase::Guessing);
        assert!(sm.apply(GameEvent::Resumed).is_err());
    }

    #[test]
    fn invalid_transition_leaves_version_untouched() {
        let mut sm = GameStateMachine::new();
        let err = sm.apply(GameEvent::GameOver).unwrap_err();
        assert_eq!(err.from, GamePhase::Idle);
        assert_eq!(sm.snapshot().version, 0);
    }
}
