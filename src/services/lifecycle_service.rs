//! Game lifecycle: defend announcements, passes, game over, and resuming archived games.

use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{DefenceEntity, GameEntity},
    error::{GameError, GameResult},
    services::{
        referee::{ChatMessage, Effect, Record, Referee, ResumeSnapshot, clue_record},
        stats,
    },
    state::{
        clue::{Clue, ClueState},
        game::{ChatUser, GameSession, normalize_word},
        state_machine::{GameEvent, GamePhase},
    },
};

impl Referee {
    /// `defending: **PREFIX**` starts a game or reveals a new letter.
    pub(crate) fn announce_defender(&mut self, message: &ChatMessage, text: String) -> GameResult {
        let user = &message.user;
        match self.machine.phase() {
            GamePhase::Idle => self.start_game(user),
            phase if phase.is_active() && !self.session.is_defender(user) => {
                return Err(GameError::conflict(format!(
                    "{} is already defending. Finish this game (or `!end` it) before starting another.",
                    self.session.defender_name()
                )));
            }
            _ => {}
        }

        let previous = self.session.defending_message.replace(message.id);
        if previous != Some(message.id) {
            if let Some(previous) = previous {
                self.push(Effect::CancelStars(previous));
            }
            if self.pin_cooldown.try_fire(self.now) {
                self.push(Effect::TogglePin(message.id));
            } else {
                warn!(message = message.id, "pin cooldown active; not pinning defend message");
            }
        }

        self.machine.apply(GameEvent::DefenderAnnounced)?;
        self.session.defending_text = text;
        self.session.clear_pass();
        self.session.rounds += 1;
        let defence_id = Uuid::new_v4();
        self.session.defence_id = Some(defence_id);

        let now = self.now;
        for clue in self.clues.iter_mut() {
            clue.set_state(ClueState::Schroedinger, now);
        }

        if let Some(game_id) = self.session.game_id {
            self.persist(Record::Defence(DefenceEntity {
                id: defence_id,
                game_id,
                text: self.session.defending_text.clone(),
                message_id: Some(message.id),
                started_at: SystemTime::now(),
            }));
        }
        info!(prefix = %self.session.defending_text, round = self.session.rounds, "defender revealed a prefix");
        Ok(())
    }

    fn start_game(&mut self, defender: &ChatUser) {
        self.clues.clear();
        self.session = GameSession::begin(defender.clone());
        if let Some(record) = self.game_record(None, None) {
            self.persist(Record::Game(record));
        }
        info!(game_id = ?self.session.game_id, defender = %defender.name, "game started");
    }

    fn game_record(&self, word: Option<String>, ended_at: Option<SystemTime>) -> Option<GameEntity> {
        let defender = self.session.defender.as_ref()?;
        Some(GameEntity {
            id: self.session.game_id?,
            defender_id: defender.id,
            defender_name: defender.name.clone(),
            word,
            started_at: self.session.started_at.unwrap_or_else(SystemTime::now),
            ended_at,
        })
    }

    /// `passing on N` from the defender.
    pub(crate) fn pass_clue(&mut self, user: &ChatUser, number: &str) -> GameResult {
        let phase = self.machine.phase();
        if phase == GamePhase::Idle {
            return Ok(());
        }
        if !self.session.is_defender(user) {
            return Err(GameError::forbidden("Only the defender can pass on clues."));
        }
        match phase {
            GamePhase::Passed => {
                return Err(GameError::conflict(format!(
                    "You have already passed on clue #{}.  Wait until that pass is resolved (or `!unpass` it) before passing again.",
                    self.passed_number().unwrap_or_default()
                )));
            }
            GamePhase::WaitingForLetter => {
                return Err(GameError::conflict(
                    "We are waiting for you to provide a new letter.  Give one up before passing on another clue.",
                ));
            }
            GamePhase::Finished => {
                return Err(
                    GameError::conflict("The game is over.  There is nothing left to pass on.").chatty(),
                );
            }
            GamePhase::Idle | GamePhase::Guessing => {}
        }
        if !self.clues.contains(number) {
            return Err(GameError::not_found(format!(
                "There is no current clue #{number}. Try passing on an *existing* clue!"
            )));
        }

        self.machine.apply(GameEvent::Pass)?;
        let now = self.now;
        let Some(clue) = self.clues.get_mut(number) else {
            return Ok(());
        };
        clue.clear_guess();
        clue.set_state(ClueState::Passed, now);
        let contacts: Vec<String> = clue.contacts.values().cloned().collect();
        let text = clue.text.clone();

        self.session.pass_guessers.clear();
        self.session.no_contact_pass = contacts.is_empty();
        self.session.last_guess = None;
        info!(clue = number, contacts = contacts.len(), "defender passed");

        match contacts.as_slice() {
            [] => self.chat(format!(
                "...but clue #{number} hasn't been contacted!?  Ok, I guess you know what you're doing... (You can `!unpass` if you made a mistake.)"
            )),
            [only] => self.chat(format!(
                "Clue #{number} (**{text}**) was contacted by: ***{only}***. Make your guess!"
            )),
            many => self.chat(format!(
                "Clue #{number} (**{text}**) was contacted by: ***{}***. Make your guesses (one each)!",
                many.join(", ")
            )),
        }
        Ok(())
    }

    /// `!unpass` puts the passed clue back into play.
    pub(crate) fn reverse_pass(&mut self) -> GameResult {
        let passed = self.passed_number();
        let (Some(number), GamePhase::Passed) = (passed, self.machine.phase()) else {
            return Err(GameError::conflict(
                "There is nothing to undo.  No clues are currently \"passed\".",
            ));
        };

        self.machine.apply(GameEvent::PassAbandoned)?;
        let now = self.now;
        if let Some(clue) = self.clues.get_mut(&number) {
            clue.clear_guess();
            clue.set_state(ClueState::Set, now);
        }
        self.session.clear_pass();
        info!(clue = %number, "pass reversed");
        self.say(format!(
            "Okay, I've cleaned up your mess.  Clue #{number} is no longer passed.  Next time, say what you mean!"
        ));
        Ok(())
    }

    /// Game-over announcement; only the defender's own announcement counts.
    pub(crate) fn declare_game_over(&mut self, user: &ChatUser, word: String) -> GameResult {
        if !self.machine.phase().is_active() || !self.session.is_defender(user) {
            return Ok(());
        }
        self.end_game(Some(word))
    }

    /// Finish the game: summary, archive, and back to idle.
    pub(crate) fn end_game(&mut self, word: Option<String>) -> GameResult {
        self.machine.apply(GameEvent::GameOver)?;
        let now = self.now;
        let ended_at = SystemTime::now();

        let word = word.or_else(|| self.inferred_word());
        self.clues.finish_all(now);

        if !self.clues.is_empty() {
            let lines: Vec<String> = self
                .clues
                .iter()
                .map(|clue| format!("#{}: {} (by {})", clue.number, clue.text, clue.setter.name))
                .collect();
            self.say_long(format!(
                "Clues still standing when the game ended:\n{}",
                lines.join("\n")
            ));
        }

        let leftovers: Vec<_> = self
            .clues
            .iter()
            .map(|clue| (clue.message, clue_record(&self.session, clue, Some(ended_at))))
            .collect();
        self.clues.retire_all();
        for (message, record) in leftovers {
            if let Some(record) = record {
                self.persist(Record::Clue(record));
            }
            self.release_stars(message);
        }
        if let Some(message) = self.session.defending_message.take() {
            self.push(Effect::CancelStars(message));
        }

        let summary = stats::live(&self.session, &self.clues, ended_at).summary();
        match &word {
            Some(word) => self.say(format!("Game over!  The word was **{word}**.")),
            None => self.say("Game over!"),
        }
        self.say(summary);

        if let Some(record) = self.game_record(word.clone(), Some(ended_at)) {
            self.persist(Record::Game(record));
        }
        info!(game_id = ?self.session.game_id, word = ?word, "game finished");

        self.machine.apply(GameEvent::Reset)?;
        self.session = GameSession::default();
        self.clues.clear();
        Ok(())
    }

    /// Best guess at the word when the game ends without an announcement.
    fn inferred_word(&self) -> Option<String> {
        let prefix = &self.session.defending_text;
        self.session
            .last_solved
            .as_ref()
            .map(|solved| normalize_word(&solved.solution))
            .filter(|solution| solution.starts_with(prefix.as_str()))
            .or_else(|| self.session.last_guess.as_deref().map(normalize_word))
    }

    /// Rebuild an archived game loaded for `!resume`.
    pub(crate) fn resume_game(&mut self, snapshot: ResumeSnapshot) -> GameResult {
        if self.machine.phase() != GamePhase::Idle {
            return Err(GameError::conflict(
                "A game is already in progress.  Use **`!end`** before resuming another.",
            ));
        }
        let ResumeSnapshot {
            game,
            defences,
            mut clues,
            contacts,
        } = snapshot;
        if game.ended_at.is_some() {
            return Err(GameError::conflict(format!(
                "Game {} is already over; there is nothing to resume.",
                game.id
            )));
        }

        self.clues.clear();
        let mut session = GameSession::begin(ChatUser::new(game.defender_id, &game.defender_name));
        session.game_id = Some(game.id);
        session.started_at = Some(game.started_at);
        session.rounds = defences.len();
        session.contacts_made = contacts.len();
        if let Some(latest) = defences.iter().max_by_key(|defence| defence.started_at) {
            session.defending_text = latest.text.clone();
            session.defence_id = Some(latest.id);
        }
        self.session = session;
        self.machine.apply(GameEvent::Resumed)?;

        clues.sort_by_key(|clue| clue.posted_at);
        let now = self.now;
        let mut reposts = Vec::new();
        for entity in clues.into_iter().filter(|clue| clue.is_open()) {
            let setter = ChatUser::new(entity.setter_id, &entity.setter_name);
            let mut clue = Clue::new(&entity.number, &entity.text, setter, None, now);
            clue.record_id = entity.id;
            clue.defence_id = entity.defence_id;
            clue.posted_at = entity.posted_at;
            clue.contacts = contacts
                .iter()
                .filter(|contact| contact.clue_id == entity.id)
                .map(|contact| (contact.user_id, contact.user_name.clone()))
                .collect();

            if let Err(err) = self.clues.add(clue) {
                warn!(clue = %err.number, "duplicate clue number in archive; skipping");
                continue;
            }
            reposts.push(format!(
                "{}: **{}** (by {})",
                entity.number, entity.text, entity.setter_name
            ));
        }

        info!(game_id = %game.id, clues = reposts.len(), "game resumed");
        self.say(format!(
            "Resuming game {}: {} is defending **{}**.",
            game.id,
            game.defender_name,
            self.session.defending_text
        ));
        for repost in reposts {
            self.say(repost);
        }
        Ok(())
    }
}
