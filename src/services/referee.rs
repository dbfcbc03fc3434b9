//! Arbitration core: consumes one chat event at a time and returns the effects to execute.
//!
//! The referee is synchronous and owns every piece of game context; the async shell around it
//! only executes [`Effect`]s and feeds events back in.

use std::{
    collections::HashMap,
    time::{Instant, SystemTime},
};

use indexmap::IndexSet;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Rules},
    dao::models::{ClueEntity, ContactEntity, DefenceEntity, GameEntity, RosterEntity},
    dto::{
        board::{BoardSnapshot, ClueView},
        format_system_time,
        stats::GameStats,
    },
    error::{GameError, GameResult},
    services::{
        classifier::{Access, Classifier, Intent},
        cooldown::Cooldown,
        monitor,
        output::OutputGate,
        stats,
        waves::WaveTracker,
    },
    state::{
        clue::{Clue, ClueRegistry},
        game::{ChatUser, GameSession, MessageId, UserId},
        state_machine::{GamePhase, GameStateMachine},
    },
};

/// Chat message as delivered by the bridge, already HTML-unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Chat message id.
    pub id: MessageId,
    /// Author of the message.
    pub user: ChatUser,
    /// Message body.
    pub content: String,
    /// Stars on the message when the event was produced.
    pub stars: u32,
}

/// Inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A new message appeared in the room.
    Posted(ChatMessage),
    /// An existing message was edited; handled like a new post.
    Edited(ChatMessage),
    /// A message was removed from the room.
    Deleted(MessageId),
    /// The star count of a message changed.
    StarsChanged {
        /// Starred message.
        message: MessageId,
        /// New star count.
        stars: u32,
    },
}

/// Side effect requested by the referee.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Post a message to the room.
    Say {
        /// Message body.
        text: String,
        /// Whether the chat length ceiling was enforced.
        length_check: bool,
    },
    /// Star a message.
    Star(MessageId),
    /// Remove every star from a message.
    CancelStars(MessageId),
    /// Pin or unpin a message.
    TogglePin(MessageId),
    /// Write a record to the archive.
    Persist(Record),
    /// Load an archived game and feed it back through [`Referee::restore`].
    Resume(Uuid),
    /// Load an archived game and feed its stats back through [`Referee::report_stats`].
    Stats(Uuid),
    /// Stop the service.
    Shutdown,
}

/// Archive write requested by the referee.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Game created or finished.
    Game(GameEntity),
    /// New defend round.
    Defence(DefenceEntity),
    /// Clue created, edited, solved or killed.
    Clue(ClueEntity),
    /// Contact made.
    Contact(ContactEntity),
    /// Contact withdrawn.
    Uncontact {
        /// Game of the clue.
        game_id: Uuid,
        /// Uncontacted clue.
        clue_id: Uuid,
        /// Player withdrawing the contact.
        user_id: UserId,
    },
    /// Whitelist or pinglist changed.
    Roster(RosterEntity),
}

/// The two persisted user lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterKind {
    /// Users trusted to run commands, by id.
    Whitelist,
    /// Names pinged when enough people wave.
    Pinglist,
}

impl RosterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RosterKind::Whitelist => "whitelist",
            RosterKind::Pinglist => "pinglist",
        }
    }
}

/// Archived game loaded for `!resume`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeSnapshot {
    /// Game record.
    pub game: GameEntity,
    /// Every defend round of the game.
    pub defences: Vec<DefenceEntity>,
    /// Every clue of the game.
    pub clues: Vec<ClueEntity>,
    /// Every live contact of the game.
    pub contacts: Vec<ContactEntity>,
}

/// The game referee.
pub struct Referee {
    pub(crate) rules: Rules,
    pub(crate) classifier: Classifier,
    pub(crate) machine: GameStateMachine,
    pub(crate) session: GameSession,
    pub(crate) clues: ClueRegistry,
    pub(crate) waves: WaveTracker,
    pub(crate) gate: OutputGate,
    pub(crate) whitelist: IndexSet<UserId>,
    pub(crate) pinglist: IndexSet<String>,
    pub(crate) verbose: bool,
    pub(crate) bot: Option<ChatUser>,
    /// Last known star count per message.
    pub(crate) stars: HashMap<MessageId, u32>,
    pub(crate) pin_cooldown: Cooldown,
    pub(crate) ping_cooldown: Cooldown,
    pub(crate) list_cooldown: Cooldown,
    pub(crate) now: Instant,
    effects: Vec<Effect>,
}

impl Referee {
    pub fn new(config: &AppConfig) -> Self {
        let rules = config.rules.clone();
        Self {
            classifier: Classifier::new(rules.command_prefix),
            machine: GameStateMachine::new(),
            session: GameSession::default(),
            clues: ClueRegistry::new(),
            waves: WaveTracker::new(rules.wave_horizon, rules.waves_for_ping),
            gate: OutputGate::new(&rules),
            whitelist: config.whitelist.iter().copied().collect(),
            pinglist: config.pinglist.iter().cloned().collect(),
            verbose: true,
            bot: None,
            stars: HashMap::new(),
            pin_cooldown: Cooldown::new(rules.pin_cooldown),
            ping_cooldown: Cooldown::new(rules.ping_cooldown),
            list_cooldown: Cooldown::new(rules.list_cooldown),
            now: Instant::now(),
            effects: Vec::new(),
            rules,
        }
    }

    /// Record the chat identity the bot posts under.
    pub fn identify(&mut self, bot: ChatUser) {
        info!(bot_id = bot.id, bot_name = %bot.name, "bot identity received");
        self.bot = Some(bot);
    }

    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    /// Replace a roster with its persisted members.
    pub fn load_roster(&mut self, kind: RosterKind, members: Vec<String>) {
        match kind {
            RosterKind::Whitelist => {
                self.whitelist = members
                    .iter()
                    .filter_map(|member| member.parse().ok())
                    .collect();
            }
            RosterKind::Pinglist => self.pinglist = members.into_iter().collect(),
        }
        debug!(roster = kind.as_str(), "roster loaded");
    }

    /// Current members of a roster in persisted form.
    pub fn roster(&self, kind: RosterKind) -> RosterEntity {
        let members = match kind {
            RosterKind::Whitelist => self.whitelist.iter().map(u64::to_string).collect(),
            RosterKind::Pinglist => self.pinglist.iter().cloned().collect(),
        };
        RosterEntity {
            name: kind.as_str().to_string(),
            members,
        }
    }

    /// Arbitrate one chat event.
    pub fn handle(&mut self, event: ChatEvent, now: Instant) -> Vec<Effect> {
        self.begin(now);
        match event {
            ChatEvent::Posted(message) => self.on_message(message, false),
            ChatEvent::Edited(message) => self.on_message(message, true),
            ChatEvent::Deleted(message) => self.message_deleted(message),
            ChatEvent::StarsChanged { message, stars } => {
                self.stars.insert(message, stars);
            }
        }
        self.after_event();
        std::mem::take(&mut self.effects)
    }

    /// Apply an archived game loaded for `!resume`.
    pub fn restore(&mut self, loaded: GameResult<ResumeSnapshot>, now: Instant) -> Vec<Effect> {
        self.begin(now);
        if let Err(err) = loaded.and_then(|snapshot| self.resume_game(snapshot)) {
            self.reply_error(err);
        }
        std::mem::take(&mut self.effects)
    }

    /// Post the stats of an archived game requested with `!stats`.
    pub fn report_stats(
        &mut self,
        game_id: Uuid,
        loaded: GameResult<GameStats>,
        now: Instant,
    ) -> Vec<Effect> {
        self.begin(now);
        match loaded {
            Ok(stats) => self.say(format!("Game {game_id}: {}", stats.summary())),
            Err(err) => self.reply_error(err),
        }
        std::mem::take(&mut self.effects)
    }

    /// Start a new call; effects left behind by a call that panicked are discarded.
    fn begin(&mut self, now: Instant) {
        if !self.effects.is_empty() {
            debug!(dropped = self.effects.len(), "discarding effects of an interrupted event");
            self.effects.clear();
        }
        self.now = now;
    }

    /// Stats of the game currently in progress.
    pub fn live_stats(&self) -> GameStats {
        stats::live(&self.session, &self.clues, SystemTime::now())
    }

    /// Board view for HTTP and SSE clients.
    pub fn board(&self) -> BoardSnapshot {
        let snapshot = self.machine.snapshot();
        BoardSnapshot {
            phase: snapshot.phase,
            version: snapshot.version,
            game_id: self.session.game_id,
            defender: self.session.defender.as_ref().map(|d| d.name.clone()),
            started_at: self.session.started_at.map(format_system_time),
            defending: self.session.defending_text.clone(),
            clues: self
                .clues
                .iter()
                .map(|clue| ClueView {
                    number: clue.number.clone(),
                    text: clue.text.clone(),
                    setter: clue.setter.name.clone(),
                    state: clue.state(),
                    contacts: clue.contacts.values().cloned().collect(),
                    pending_guess: clue.guess().map(|g| g.text.clone()),
                    guesser: clue.guess().map(|g| g.guesser.clone()),
                })
                .collect(),
            verbose: self.verbose,
        }
    }

    fn on_message(&mut self, message: ChatMessage, edited: bool) {
        self.stars.insert(message.id, message.stars);
        let intent = self.classifier.classify(&message.content);
        debug!(message = message.id, user = %message.user.name, edited, ?intent, "classified chat message");

        if self.is_bot(&message.user) {
            if let Intent::NewClues { numbers, text } = intent {
                self.relink_clues(message.id, &numbers, &text);
            }
            return;
        }

        if let Err(err) = self.dispatch(&message, intent) {
            self.reply_error(err);
        }
    }

    fn dispatch(&mut self, message: &ChatMessage, intent: Intent) -> GameResult {
        let user = &message.user;
        match intent {
            Intent::DenyGuess { number, text } => self.deny_guess(&number, &text, user),
            Intent::ConfirmGuess { number, text } => self.confirm_guess(&number, &text, user),
            Intent::ClueDies { number, text } => self.kill_clue(&number, &text, user, false),
            Intent::ClueLives { number, text } => self.confirm_life(&number, &text, user),
            Intent::NewClues { numbers, text } => {
                self.add_clues(message, &numbers, &text);
                Ok(())
            }
            Intent::GameOver { word } => self.declare_game_over(user, word),
            Intent::Defending { text } => self.announce_defender(message, text),
            Intent::Guess { number, text } => self.submit_guess(&number, &text, user),
            Intent::Contact { numbers } => {
                self.add_contacts(user, &numbers);
                Ok(())
            }
            Intent::Uncontact { numbers } => {
                self.remove_contacts(user, &numbers, false);
                Ok(())
            }
            Intent::Pass { number } => self.pass_clue(user, &number),
            Intent::Command(command) => self.run_command(user, command),
            Intent::Wave => {
                self.waves.wave(user.id, self.now);
                Ok(())
            }
            Intent::UnknownCommand(name) => self.unknown_command(user, &name),
            Intent::Unrecognized => Ok(()),
        }
    }

    fn after_event(&mut self) {
        if self.verbose && self.machine.phase().is_active() {
            let defender = self.session.defender_name().to_string();
            let reminders = monitor::schroedinger_reminders(
                &mut self.clues,
                self.rules.schroedinger_timeout,
                &defender,
                self.now,
            )
            .into_iter()
            .chain(monitor::guess_reminders(
                &mut self.clues,
                self.rules.guess_timeout,
                self.now,
            ))
            .collect::<Vec<_>>();
            for reminder in reminders {
                self.say(reminder);
            }
        }

        if let Some(count) = self.waves.check(self.now)
            && self.ping_cooldown.try_fire(self.now)
        {
            info!(waves = count, "enough waves; pinging the pinglist");
            self.say(format!(
                "There are {count} people waiting to play Contact!  Want to join?"
            ));
            self.send_pings();
            self.waves.clear();
        }
    }

    pub(crate) fn is_bot(&self, user: &ChatUser) -> bool {
        self.bot.as_ref().is_some_and(|bot| bot.id == user.id)
    }

    pub(crate) fn access_of(&self, user: &ChatUser) -> Access {
        if user.is_moderator || self.is_bot(user) {
            Access::Super
        } else if self.whitelist.contains(&user.id) {
            Access::Trusted
        } else {
            Access::Anyone
        }
    }

    /// Post through the output gate, enforcing the length ceiling.
    pub(crate) fn say(&mut self, text: impl Into<String>) {
        self.post(text.into(), true);
    }

    /// Post through the output gate without the length ceiling.
    pub(crate) fn say_long(&mut self, text: impl Into<String>) {
        self.post(text.into(), false);
    }

    /// Post only in verbose mode.
    pub(crate) fn chat(&mut self, text: impl Into<String>) {
        if self.verbose {
            self.say(text);
        }
    }

    fn post(&mut self, text: String, length_check: bool) {
        if self.gate.admit(&text, length_check, self.now) {
            self.effects.push(Effect::Say { text, length_check });
        }
    }

    pub(crate) fn reply_error(&mut self, err: GameError) {
        debug!(error = %err, chatty = err.is_chatty(), "chat action rejected");
        if err.is_chatty() && !self.verbose {
            return;
        }
        self.say(err.to_string());
    }

    pub(crate) fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub(crate) fn persist(&mut self, record: Record) {
        self.effects.push(Effect::Persist(record));
    }

    /// Persist the current state of an active clue.
    pub(crate) fn persist_clue(&mut self, number: &str) {
        let record = self
            .clues
            .get(number)
            .and_then(|clue| clue_record(&self.session, clue, None));
        if let Some(record) = record {
            self.persist(Record::Clue(record));
        }
    }

    /// Star `message` unless it already carries stars.
    pub(crate) fn star(&mut self, message: MessageId) {
        let stars = self.stars.entry(message).or_default();
        if *stars == 0 {
            *stars = 1;
            self.effects.push(Effect::Star(message));
        }
    }

    /// Cancel stars on `message` once no active clue lives in it.
    pub(crate) fn release_stars(&mut self, message: Option<MessageId>) {
        if let Some(message) = message
            && !self.clues.message_in_use(message)
        {
            self.stars.insert(message, 0);
            self.effects.push(Effect::CancelStars(message));
        }
    }

    /// Mention everyone on the pinglist, a batch of names per message.
    pub(crate) fn send_pings(&mut self) {
        let mentions: Vec<String> = self
            .pinglist
            .iter()
            .map(|name| format!("@{}", name.replace(' ', "")))
            .collect();
        for batch in mentions.chunks(self.rules.ping_batch.max(1)) {
            self.say(batch.join(" "));
        }
    }
}

/// Persisted form of `clue`, when the game is being archived.
pub(crate) fn clue_record(
    session: &GameSession,
    clue: &Clue,
    died_at: Option<SystemTime>,
) -> Option<ClueEntity> {
    Some(ClueEntity {
        id: clue.record_id,
        game_id: session.game_id?,
        defence_id: clue.defence_id,
        number: clue.number.clone(),
        setter_id: clue.setter.id,
        setter_name: clue.setter.name.clone(),
        text: clue.text.clone(),
        solver: clue.solver.clone(),
        solution: clue.solution.clone(),
        message_id: clue.message,
        posted_at: clue.posted_at,
        died_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chatter(id: MessageId) -> ChatEvent {
        ChatEvent::Posted(ChatMessage {
            id,
            user: ChatUser::new(2, "sam"),
            content: "anyone here?".into(),
            stars: 0,
        })
    }

    #[test]
    fn effects_of_an_interrupted_event_are_not_replayed() {
        let mut referee = Referee::new(&AppConfig::default());
        referee.push(Effect::Star(7));
        referee.push(Effect::Say {
            text: "half a reply".into(),
            length_check: true,
        });

        let effects = referee.handle(chatter(8), Instant::now());
        assert!(!effects.contains(&Effect::Star(7)));
        assert!(effects.iter().all(|effect| !matches!(effect, Effect::Say { .. })));
    }

    #[test]
    fn stats_report_starts_from_a_clean_slate() {
        let mut referee = Referee::new(&AppConfig::default());
        referee.push(Effect::TogglePin(3));
        let effects = referee.report_stats(
            Uuid::nil(),
            Err(GameError::not_found("gone")),
            Instant::now(),
        );
        assert!(!effects.contains(&Effect::TogglePin(3)));
    }
}
