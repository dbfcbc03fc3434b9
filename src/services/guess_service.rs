//! Guess arbitration: who may guess which clue, and the setter's verdict.

use tracing::info;

use crate::{
    error::{GameError, GameResult},
    services::referee::Referee,
    state::{
        clue::ClueState,
        game::{ChatUser, SolvedClue, normalize_word},
        state_machine::{GameEvent, GamePhase},
    },
};

impl Referee {
    /// `N: word` and every verdict-like message from someone other than the setter.
    pub(crate) fn submit_guess(&mut self, number: &str, text: &str, guesser: &ChatUser) -> GameResult {
        let phase = self.machine.phase();
        let is_defender = self.session.is_defender(guesser);
        let defender = self.session.defender_name().to_string();
        let guess = text.trim().to_uppercase();

        match phase {
            GamePhase::Idle => return Ok(()),
            GamePhase::Finished => {
                return Err(GameError::conflict(
                    "The game is over.  No more guesses are being accepted.",
                )
                .chatty());
            }
            GamePhase::WaitingForLetter => {
                return Err(GameError::conflict(format!(
                    "We are currently waiting for {defender} to provide an additional letter.  No guesses (or clues) are being accepted right now."
                )));
            }
            GamePhase::Guessing | GamePhase::Passed => {}
        }

        // "12: was a great clue" and friends.
        if phase == GamePhase::Guessing && !is_defender && guess.starts_with("WAS") {
            return Ok(());
        }

        let passed = self.passed_number();
        let Some(clue) = self.clues.get(number) else {
            return Err(match (phase, is_defender) {
                (_, true) => GameError::not_found(format!(
                    "There doesn't appear to be an active clue with the number {number}, so you can't make a guess."
                ))
                .chatty(),
                (GamePhase::Passed, false) => GameError::conflict(format!(
                    "{defender} has passed on clue #{}. We are currently only accepting guesses for that clue from those who have contacted it.",
                    passed.unwrap_or_default()
                )),
                _ => GameError::invalid(
                    "Clue text must be **bold** (surround it with `**` or `__`).  Please try again.",
                )
                .chatty(),
            });
        };

        let clue_passed = clue.state() == ClueState::Passed;
        if let Some(pending) = clue.guess()
            && !(phase == GamePhase::Passed && clue_passed)
        {
            return Err(GameError::conflict(format!(
                "We are currently waiting on {} to confirm or deny {}'s guess for clue #{number}.  Please wait until that has been done before making another guess.",
                clue.setter.name, pending.guesser
            )));
        }

        if is_defender {
            if phase == GamePhase::Passed && clue.state() != ClueState::Set {
                return Err(GameError::conflict(format!(
                    "You passed on clue #{}.  Please refrain from making guesses until the pass is resolved.",
                    passed.unwrap_or_default()
                ))
                .chatty());
            }
            return self.defender_guess(number, &guess, guesser);
        }

        if phase == GamePhase::Guessing {
            return Err(GameError::forbidden(
                "You can't make guesses right now; that's the defender's job.  Wait till a clue has been passed.",
            )
            .chatty());
        }

        if !clue_passed {
            return Err(GameError::conflict(format!(
                "{defender} has passed on clue #{}. We are currently only accepting guesses for that clue from those who have contacted it.",
                passed.unwrap_or_default()
            )));
        }

        if !self.session.no_contact_pass && !clue.contacts.contains_key(&guesser.id) {
            return Err(GameError::forbidden(format!(
                "You haven't contacted clue #{number}.  Only those who have contacted the clue may guess.  (To see who has contacted it, use **`!contacts {number}`**)"
            ))
            .chatty());
        }

        if !self.session.no_contact_pass && self.session.pass_guessers.contains(&guesser.id) {
            return Err(GameError::conflict(format!(
                "You already had your guess for clue #{number}.  Let the other contacts have a go."
            ))
            .chatty());
        }

        let now = self.now;
        if let Some(clue) = self.clues.get_mut(number) {
            clue.set_guess(&guess, &guesser.name, now);
        }
        self.session.pass_guessers.insert(guesser.id);
        self.session.last_guess = Some(guess);
        info!(clue = number, guesser = %guesser.name, "contact guessed the passed clue");
        Ok(())
    }

    fn defender_guess(&mut self, number: &str, guess: &str, defender: &ChatUser) -> GameResult {
        let prefix = self.session.defending_text.clone();
        let normalized = normalize_word(guess);
        if !normalized.starts_with(&prefix) {
            let start: String = normalized.chars().take(prefix.chars().count()).collect();
            return Err(GameError::invalid(format!(
                "The word being defended starts with **{prefix}**.  Your guess starts with **{start}**.  Try again."
            )));
        }

        let now = self.now;
        if let Some(clue) = self.clues.get_mut(number) {
            clue.set_guess(guess, &defender.name, now);
        }
        info!(clue = number, "defender guessed");
        Ok(())
    }

    /// `N: yes` from the setter solves the clue.
    pub(crate) fn confirm_guess(&mut self, number: &str, text: &str, user: &ChatUser) -> GameResult {
        let Some(clue) = self.clues.get_mut(number) else {
            return Err(GameError::not_found(format!(
                "There is no clue #{number}.  What exactly are you confirming?"
            )));
        };

        if clue.setter.id != user.id {
            return self.submit_guess(number, text, user);
        }

        let Some(pending) = clue.clear_guess() else {
            return Err(GameError::conflict(format!(
                "There was no guess made for #{number}.  What exactly are you confirming?"
            )));
        };

        let solved_pass =
            clue.state() == ClueState::Passed && self.machine.phase() == GamePhase::Passed;
        clue.solver = Some(pending.guesser.clone());
        clue.solution = Some(pending.text.clone());
        self.session.last_solved = Some(SolvedClue {
            number: number.to_string(),
            solution: pending.text,
        });
        info!(clue = number, solver = %pending.guesser, "clue solved");
        self.retire_clue(number, ClueState::Solved);

        if solved_pass {
            let no_contact_pass = self.session.no_contact_pass;
            self.machine.apply(GameEvent::PassSolved)?;
            self.session.clear_pass();
            if !no_contact_pass {
                let defender = self.session.defender_name().to_string();
                self.chat(format!(
                    "You guessed correctly.  {defender} must give up a letter!"
                ));
            }
        }
        Ok(())
    }

    /// `N: no` from the setter rejects the guess; the last failed contact kills a passed clue.
    pub(crate) fn deny_guess(&mut self, number: &str, text: &str, user: &ChatUser) -> GameResult {
        let Some(clue) = self.clues.get_mut(number) else {
            return Err(GameError::not_found(format!(
                "There is no clue #{number}.  What exactly are you denying?"
            )));
        };

        if clue.setter.id != user.id {
            return self.submit_guess(number, text, user);
        }

        if clue.clear_guess().is_none() {
            return Err(GameError::conflict(format!(
                "There was no guess made for #{number}.  What exactly are you denying?"
            )));
        }
        info!(clue = number, "guess denied");

        let exhausted = self.machine.phase() == GamePhase::Passed
            && clue.state() == ClueState::Passed
            && !self.session.no_contact_pass
            && clue
                .contacts
                .keys()
                .all(|contact| self.session.pass_guessers.contains(contact));
        if exhausted {
            self.say(format!(
                "It looks like no one guessed right.  Clue #{number} is now dead. Carry on."
            ));
            self.retire_clue(number, ClueState::Dead);
            self.machine.apply(GameEvent::PassAbandoned)?;
            self.session.clear_pass();
        }
        Ok(())
    }
}
