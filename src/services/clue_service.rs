//! Clue registration, contacts, and clue removal.

use std::time::SystemTime;

use tracing::{debug, info};

use crate::{
    dao::models::ContactEntity,
    error::{GameError, GameResult},
    services::referee::{ChatMessage, Record, Referee, clue_record},
    state::{
        clue::{Clue, ClueState},
        game::{ChatUser, MessageId},
        state_machine::{GameEvent, GamePhase},
    },
};

impl Referee {
    /// Register every number of a clue post; each failure is answered on its own.
    pub(crate) fn add_clues(&mut self, message: &ChatMessage, numbers: &[String], text: &str) {
        for number in numbers {
            if let Err(err) = self.add_clue(message, number, text) {
                self.reply_error(err);
            }
        }
    }

    fn add_clue(&mut self, message: &ChatMessage, number: &str, text: &str) -> GameResult {
        let user = &message.user;

        if self.clues.edit(number, message.id, text) {
            debug!(clue = number, "clue text edited");
            self.persist_clue(number);
            return Ok(());
        }

        let defender = self.session.defender_name().to_string();
        match self.machine.phase() {
            GamePhase::Guessing => {}
            GamePhase::Passed => {
                let passed = self.passed_number().unwrap_or_default();
                return Err(GameError::conflict(format!(
                    "{defender} has passed on clue #{passed}. Please don't post any new clues until the pass has been resolved. I recommend deleting this clue, and reposting after the pass is resolved. (I am ignoring it.)"
                )));
            }
            GamePhase::WaitingForLetter => {
                return Err(GameError::conflict(format!(
                    "We are waiting on {defender} to provide a new letter. Please don't post any new clues until they have done so. I recommend deleting this clue (I am ignoring it)"
                )));
            }
            GamePhase::Finished => {
                return Err(
                    GameError::conflict("The game is over.  No clues are being accepted.").chatty(),
                );
            }
            GamePhase::Idle => {
                debug!(clue = number, "clue posted with no game running; ignoring");
                return Ok(());
            }
        }

        if self.session.is_defender(user) {
            return Err(GameError::forbidden(
                "You are the defender -- you can't post clues!",
            ));
        }

        let mut clue = Clue::new(number, text, user.clone(), Some(message.id), self.now);
        clue.defence_id = self.session.defence_id;
        self.clues
            .add(clue)
            .map_err(|err| GameError::conflict(err.to_string()))?;
        self.persist_clue(number);

        info!(clue = number, setter = %user.name, "clue added");
        self.star(message.id);
        self.advise_on_clue_count();
        Ok(())
    }

    fn advise_on_clue_count(&mut self) {
        let count = self.clues.len();
        if count < self.rules.max_clues {
            return;
        }

        self.chat(format!(
            "There are now {count} unsolved clues.  Please don't post any more clues until some have been resolved."
        ));
        let total = self.clues.total_contacts();
        if total >= self.rules.contact_threshold {
            let defender = self.session.defender_name().to_string();
            self.chat(format!(
                "{defender}, there are a total of {total} contacts on existing clues.  You might want to think about passing if you can't solve any of them. (Use `!contacts` to see current contacts.)"
            ));
        } else {
            self.chat(
                "There aren't very many contacts on existing clues.  Why don't you focus on solving some of them instead of posting more?",
            );
        }
    }

    /// Adopt the bot's own re-post of a resumed clue.
    pub(crate) fn relink_clues(&mut self, message: MessageId, numbers: &[String], text: &str) {
        for number in numbers {
            if self.clues.relink(number, text, message) {
                debug!(clue = %number, message, "relinked resumed clue");
                self.star(message);
                self.persist_clue(number);
            }
        }
    }

    /// Number of the clue currently passed on.
    pub(crate) fn passed_number(&self) -> Option<String> {
        self.clues.passed().map(|clue| clue.number.clone())
    }

    /// Remove an active clue for good, archiving it and releasing its stars.
    pub(crate) fn retire_clue(&mut self, number: &str, state: ClueState) {
        let now = self.now;
        let Some(clue) = self.clues.remove(number, state, now) else {
            return;
        };
        let record = clue_record(&self.session, clue, Some(SystemTime::now()));
        let message = clue.message;

        if let Some(record) = record {
            self.persist(Record::Clue(record));
        }
        self.release_stars(message);
        info!(clue = number, ?state, "clue retired");
    }

    /// `N dies` from the setter, or `!kill N` when `forced`.
    pub(crate) fn kill_clue(
        &mut self,
        number: &str,
        text: &str,
        user: &ChatUser,
        forced: bool,
    ) -> GameResult {
        let Some(clue) = self.clues.get(number) else {
            return Err(GameError::not_found(format!("There is no clue #{number}.")));
        };

        if !forced && clue.setter.id != user.id {
            return self.submit_guess(number, text, user);
        }

        let was_passed =
            clue.state() == ClueState::Passed && self.machine.phase() == GamePhase::Passed;
        self.retire_clue(number, ClueState::Dead);
        if was_passed {
            self.machine.apply(GameEvent::PassAbandoned)?;
            self.session.clear_pass();
        }
        Ok(())
    }

    /// `N lives` from the setter ends the Schroedinger state.
    pub(crate) fn confirm_life(&mut self, number: &str, text: &str, user: &ChatUser) -> GameResult {
        let Some(clue) = self.clues.get_mut(number) else {
            return Err(GameError::not_found(format!("There is no clue #{number}.")));
        };

        if clue.setter.id != user.id {
            return self.submit_guess(number, text, user);
        }

        if clue.state() == ClueState::Schroedinger {
            clue.set_state(ClueState::Set, self.now);
            debug!(clue = number, "clue confirmed alive");
        }
        Ok(())
    }

    /// `c N, M` contacts one or more clues.
    pub(crate) fn add_contacts(&mut self, user: &ChatUser, numbers: &[String]) {
        let defender = self.session.defender_name().to_string();
        let refusal = match self.machine.phase() {
            GamePhase::Idle => return,
            GamePhase::WaitingForLetter => Some(GameError::conflict(format!(
                "We are currently waiting for {defender} to provide an additional letter.  No contacts are being accepted right now."
            ))),
            GamePhase::Finished => Some(
                GameError::conflict("The game is over.  No more contacts are being accepted.")
                    .chatty(),
            ),
            GamePhase::Guessing | GamePhase::Passed => None,
        };
        if let Some(err) = refusal {
            self.reply_error(err);
            return;
        }

        for number in numbers {
            if let Err(err) = self.add_contact(user, number) {
                self.reply_error(err);
            }
        }
    }

    fn add_contact(&mut self, user: &ChatUser, number: &str) -> GameResult {
        let passed = self.passed_number();
        if self.machine.phase() == GamePhase::Passed && passed.as_deref() != Some(number) {
            let defender = self.session.defender_name();
            return Err(GameError::conflict(format!(
                "{defender} has passed on clue #{}. Contacts on other clues will have to wait until the pass has been resolved.",
                passed.unwrap_or_default()
            )));
        }

        let Some(clue) = self.clues.get_mut(number) else {
            return Err(GameError::not_found(format!(
                "There doesn't appear to be an active clue with the number {number}, therefore you can't contact it."
            )));
        };

        if clue.setter.id == user.id {
            return Err(GameError::forbidden("You can't contact your own clue!"));
        }

        if clue.contacts.insert(user.id, user.name.clone()).is_some() {
            return Ok(());
        }
        let clue_id = clue.record_id;
        self.session.contacts_made += 1;
        info!(clue = number, user = %user.name, "contact added");

        if let Some(game_id) = self.session.game_id {
            self.persist(Record::Contact(ContactEntity {
                game_id,
                clue_id,
                user_id: user.id,
                user_name: user.name.clone(),
                contacted_at: SystemTime::now(),
            }));
        }
        Ok(())
    }

    /// `uc N` withdraws the user's contact; `!uncontact N` clears every contact of the clue.
    pub(crate) fn remove_contacts(&mut self, user: &ChatUser, numbers: &[String], clear_all: bool) {
        for number in numbers {
            if let Err(err) = self.remove_contact(user, number, clear_all) {
                self.reply_error(err);
            }
        }
    }

    fn remove_contact(&mut self, user: &ChatUser, number: &str, clear_all: bool) -> GameResult {
        let Some(clue) = self.clues.get_mut(number) else {
            return Err(GameError::not_found(format!(
                "There doesn't appear to be an active clue with the number {number}, therefore you can't uncontact it."
            ))
            .chatty());
        };
        let clue_id = clue.record_id;

        let removed: Vec<u64> = if clear_all {
            clue.contacts.drain(..).map(|(id, _)| id).collect()
        } else if clue.contacts.shift_remove(&user.id).is_some() {
            vec![user.id]
        } else {
            return Err(GameError::conflict(format!(
                "You can't uncontact a clue you never contacted! (#{number})"
            ))
            .chatty());
        };

        info!(clue = number, removed = removed.len(), "contacts withdrawn");
        if let Some(game_id) = self.session.game_id {
            for user_id in removed {
                self.persist(Record::Uncontact {
                    game_id,
                    clue_id,
                    user_id,
                });
            }
        }
        if clear_all {
            self.chat(format!("Cleared all contacts for clue #{number}."));
        }
        Ok(())
    }

    /// A deleted message withdraws every clue it carried.
    pub(crate) fn message_deleted(&mut self, message: MessageId) {
        for number in self.clues.numbers_for_message(message) {
            let was_passed = self
                .clues
                .get(&number)
                .is_some_and(|clue| clue.state() == ClueState::Passed)
                && self.machine.phase() == GamePhase::Passed;

            self.retire_clue(&number, ClueState::Dead);
            if was_passed && let Err(err) = self.machine.apply(GameEvent::PassAbandoned) {
                self.reply_error(err.into());
            }
            if was_passed {
                self.session.clear_pass();
            }
            self.chat(format!("Clue #{number} was deleted, so I've removed it."));
        }
        self.stars.remove(&message);
    }
}
