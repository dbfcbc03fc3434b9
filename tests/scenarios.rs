//! Whole games played through the public referee API.

use std::time::{Duration, Instant, SystemTime};

use contact_referee::{
    config::AppConfig,
    dao::models::{ClueEntity, ContactEntity, DefenceEntity, GameEntity},
    services::referee::{ChatEvent, ChatMessage, Effect, Record, Referee, ResumeSnapshot},
    state::{clue::ClueState, game::ChatUser, state_machine::GamePhase},
};
use uuid::Uuid;

struct Room {
    referee: Referee,
    now: Instant,
    next_message: u64,
}

impl Room {
    fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    fn with_config(config: AppConfig) -> Self {
        let mut referee = Referee::new(&config);
        referee.identify(ChatUser::new(999, "Referee"));
        Self {
            referee,
            now: Instant::now(),
            next_message: 100,
        }
    }

    /// Post `content` as `user`, two seconds after the previous post.
    fn post(&mut self, user: &ChatUser, content: &str) -> Vec<Effect> {
        self.next_message += 1;
        self.now += Duration::from_secs(2);
        self.referee.handle(
            ChatEvent::Posted(ChatMessage {
                id: self.next_message,
                user: user.clone(),
                content: content.into(),
                stars: 0,
            }),
            self.now,
        )
    }

    /// Replace the text of an earlier message.
    fn edit(&mut self, id: u64, user: &ChatUser, content: &str) -> Vec<Effect> {
        self.now += Duration::from_secs(2);
        self.referee.handle(
            ChatEvent::Edited(ChatMessage {
                id,
                user: user.clone(),
                content: content.into(),
                stars: 1,
            }),
            self.now,
        )
    }

    fn wait(&mut self, secs: u64) {
        self.now += Duration::from_secs(secs);
    }

    fn last_message(&self) -> u64 {
        self.next_message
    }

    fn phase(&self) -> GamePhase {
        self.referee.phase()
    }
}

fn said(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Say { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

fn dora() -> ChatUser {
    ChatUser::new(1, "dora")
}

fn sam() -> ChatUser {
    ChatUser::new(2, "sam")
}

fn xavi() -> ChatUser {
    ChatUser::new(3, "xavi")
}

fn yara() -> ChatUser {
    ChatUser::new(4, "yara")
}

fn mona() -> ChatUser {
    ChatUser::new(5, "mona").moderator()
}

#[test]
fn defender_guess_is_held_until_the_setter_confirms() {
    let mut room = Room::new();
    let effects = room.post(&dora(), "I am defending: <b>F</b>");
    assert_eq!(room.phase(), GamePhase::Guessing);
    assert!(effects.contains(&Effect::TogglePin(room.last_message())));
    assert!(
        effects
            .iter()
            .any(|effect| matches!(effect, Effect::Persist(Record::Game(_))))
    );

    let effects = room.post(&sam(), "3: <b>FOO</b>");
    let clue_message = room.last_message();
    assert!(effects.contains(&Effect::Star(clue_message)));

    room.post(&dora(), "3: FOOBAR");
    let board = room.referee.board();
    assert_eq!(board.clues[0].pending_guess.as_deref(), Some("FOOBAR"));
    assert_eq!(board.clues[0].guesser.as_deref(), Some("dora"));

    let effects = room.post(&sam(), "3: yes");
    assert!(room.referee.board().clues.is_empty());
    assert_eq!(room.phase(), GamePhase::Guessing);
    assert!(effects.contains(&Effect::CancelStars(clue_message)));
    let solved = effects.iter().find_map(|effect| match effect {
        Effect::Persist(Record::Clue(clue)) => Some(clue.clone()),
        _ => None,
    });
    let solved = solved.expect("solved clue is archived");
    assert_eq!(solved.solver.as_deref(), Some("dora"));
    assert!(solved.died_at.is_some());
    assert_eq!(room.referee.live_stats().solved, 1);
}

#[test]
fn defender_guess_must_extend_the_revealed_prefix() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>FO</b>");
    room.post(&sam(), "3: <b>a sly animal</b>");

    let effects = room.post(&dora(), "3: BOX");
    assert_eq!(
        said(&effects),
        ["The word being defended starts with **FO**.  Your guess starts with **BO**.  Try again."]
    );
    assert!(room.referee.board().clues[0].pending_guess.is_none());
}

#[test]
fn second_guess_waits_for_the_first_verdict() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>F</b>");
    room.post(&sam(), "3: <b>a sly animal</b>");
    room.post(&dora(), "3: FOX");

    let effects = room.post(&dora(), "3: FIG");
    assert_eq!(
        said(&effects),
        ["We are currently waiting on sam to confirm or deny dora's guess for clue #3.  Please wait until that has been done before making another guess."]
    );
    assert_eq!(
        room.referee.board().clues[0].pending_guess.as_deref(),
        Some("FOX")
    );
}

#[test]
fn confirmations_from_others_are_guesses_and_need_a_pending_guess() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>F</b>");
    room.post(&sam(), "3: <b>a sly animal</b>");

    let effects = room.post(&xavi(), "3: yes");
    assert_eq!(
        said(&effects),
        ["You can't make guesses right now; that's the defender's job.  Wait till a clue has been passed."]
    );

    let effects = room.post(&sam(), "3: yes");
    assert_eq!(
        said(&effects),
        ["There was no guess made for #3.  What exactly are you confirming?"]
    );
    assert_eq!(room.referee.board().clues.len(), 1);
}

#[test]
fn failed_contacts_kill_a_passed_clue() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>C</b>");
    room.post(&sam(), "5: <b>farm animal</b>");
    room.post(&xavi(), "contact 5");
    room.post(&yara(), "c5");

    let effects = room.post(&dora(), "passing on 5");
    assert_eq!(room.phase(), GamePhase::Passed);
    assert_eq!(
        said(&effects),
        ["Clue #5 (**farm animal**) was contacted by: ***xavi, yara***. Make your guesses (one each)!"]
    );

    room.post(&xavi(), "5: CAT");
    room.post(&sam(), "5: no");
    assert_eq!(room.phase(), GamePhase::Passed);
    assert_eq!(room.referee.board().clues[0].state, ClueState::Passed);

    room.post(&yara(), "5: COW");
    let effects = room.post(&sam(), "5: no");
    assert_eq!(
        said(&effects),
        ["It looks like no one guessed right.  Clue #5 is now dead. Carry on."]
    );
    assert_eq!(room.phase(), GamePhase::Guessing);
    assert!(room.referee.board().clues.is_empty());
    assert_eq!(room.referee.live_stats().died, 1);
}

#[test]
fn only_contacts_may_guess_a_passed_clue() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>C</b>");
    room.post(&sam(), "5: <b>farm animal</b>");
    room.post(&xavi(), "contact 5");
    room.post(&dora(), "pass 5");

    let effects = room.post(&yara(), "5: COW");
    assert_eq!(
        said(&effects),
        ["You haven't contacted clue #5.  Only those who have contacted the clue may guess.  (To see who has contacted it, use **`!contacts 5`**)"]
    );
    assert!(room.referee.board().clues[0].pending_guess.is_none());
}

#[test]
fn solving_an_uncontacted_pass_waits_for_a_letter_quietly() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>B</b>");
    room.post(&sam(), "7: <b>it floats</b>");

    let effects = room.post(&dora(), "pass 7");
    assert!(said(&effects)[0].starts_with("...but clue #7 hasn't been contacted!?"));

    room.post(&yara(), "7: BOAT");
    let effects = room.post(&sam(), "7: yes");
    assert_eq!(room.phase(), GamePhase::WaitingForLetter);
    assert!(
        said(&effects)
            .iter()
            .all(|text| !text.contains("give up a letter"))
    );

    let effects = room.post(&xavi(), "8: <b>too early</b>");
    assert_eq!(
        said(&effects),
        ["We are waiting on dora to provide a new letter. Please don't post any new clues until they have done so. I recommend deleting this clue (I am ignoring it)"]
    );

    room.post(&dora(), "I am defending: <b>BO</b>");
    assert_eq!(room.phase(), GamePhase::Guessing);
}

#[test]
fn solving_a_contacted_pass_asks_for_a_letter() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>B</b>");
    room.post(&sam(), "7: <b>it floats</b>");
    room.post(&xavi(), "contact 7");
    room.post(&dora(), "pass 7");
    room.post(&xavi(), "7: BOAT");

    let effects = room.post(&sam(), "7: yes");
    assert_eq!(room.phase(), GamePhase::WaitingForLetter);
    assert!(said(&effects).contains(&"You guessed correctly.  dora must give up a letter!".to_string()));
}

#[test]
fn new_letter_makes_every_clue_uncertain() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>B</b>");
    room.post(&sam(), "1: <b>it floats</b>");
    room.post(&xavi(), "2: <b>it bounces</b>");

    room.post(&dora(), "I am defending: <b>BO</b>");
    let board = room.referee.board();
    assert_eq!(board.defending, "BO");
    assert!(
        board
            .clues
            .iter()
            .all(|clue| clue.state == ClueState::Schroedinger)
    );

    room.post(&sam(), "1 lives");
    let board = room.referee.board();
    assert_eq!(board.clues[0].state, ClueState::Set);
    assert_eq!(board.clues[1].state, ClueState::Schroedinger);
}

#[test]
fn too_many_clues_with_few_contacts_suggests_solving() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>S</b>");

    let mut replies = Vec::new();
    for number in 1..=11 {
        let effects = room.post(&sam(), &format!("{number}: <b>clue {number}</b>"));
        replies.extend(said(&effects));
    }

    assert!(replies.contains(&"There are now 11 unsolved clues.  Please don't post any more clues until some have been resolved.".to_string()));
    assert!(replies.contains(&"There aren't very many contacts on existing clues.  Why don't you focus on solving some of them instead of posting more?".to_string()));
}

#[test]
fn too_many_clues_with_many_contacts_suggests_passing() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>S</b>");
    for number in 1..=4 {
        room.post(&sam(), &format!("{number}: <b>clue {number}</b>"));
    }
    room.post(&xavi(), "contact 1, 2, 3");
    room.post(&yara(), "contact 1, 2");

    let mut replies = Vec::new();
    for number in 5..=11 {
        let effects = room.post(&sam(), &format!("{number}: <b>clue {number}</b>"));
        replies.extend(said(&effects));
    }

    assert!(replies.contains(&"dora, there are a total of 5 contacts on existing clues.  You might want to think about passing if you can't solve any of them. (Use `!contacts` to see current contacts.)".to_string()));
}

#[test]
fn defender_cannot_post_clues_and_clues_need_a_game() {
    let mut room = Room::new();
    let effects = room.post(&sam(), "1: <b>nobody is defending</b>");
    assert!(effects.is_empty());

    room.post(&dora(), "I am defending: <b>S</b>");
    let effects = room.post(&dora(), "1: <b>my own clue</b>");
    assert_eq!(said(&effects), ["You are the defender -- you can't post clues!"]);
    assert!(room.referee.board().clues.is_empty());
}

#[test]
fn deleting_a_clue_message_withdraws_the_clue() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>S</b>");
    room.post(&sam(), "1, 2: <b>double trouble</b>");
    let message = room.last_message();
    assert_eq!(room.referee.board().clues.len(), 2);

    room.now += Duration::from_secs(2);
    let effects = room.referee.handle(ChatEvent::Deleted(message), room.now);
    assert!(room.referee.board().clues.is_empty());
    assert_eq!(
        said(&effects),
        [
            "Clue #1 was deleted, so I've removed it.",
            "Clue #2 was deleted, so I've removed it."
        ]
    );
    let cancels = effects
        .iter()
        .filter(|effect| **effect == Effect::CancelStars(message))
        .count();
    assert_eq!(cancels, 1);
}

#[test]
fn defender_ends_the_game_with_a_summary() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>S</b>");
    room.post(&sam(), "1: <b>a star</b>");
    room.post(&dora(), "1: SUN");
    room.post(&sam(), "1: yes");
    room.post(&xavi(), "2: <b>left standing</b>");

    let effects = room.post(&dora(), "DH: sunshine");
    let replies = said(&effects);
    assert_eq!(room.phase(), GamePhase::Idle);
    assert!(replies.contains(&"Game over!  The word was **SUNSHINE**.".to_string()));
    assert!(replies.iter().any(|text| text.starts_with("Clues still standing when the game ended:\n#2: left standing (by xavi)")));
    assert!(replies.iter().any(|text| text.starts_with("2 clues were set: 1 solved, 1 died.")));

    let game = effects.iter().rev().find_map(|effect| match effect {
        Effect::Persist(Record::Game(game)) => Some(game.clone()),
        _ => None,
    });
    let game = game.expect("finished game is archived");
    assert_eq!(game.word.as_deref(), Some("SUNSHINE"));
    assert!(game.ended_at.is_some());
    assert!(room.referee.board().clues.is_empty());
}

#[test]
fn game_over_from_someone_else_is_ignored() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>S</b>");
    let effects = room.post(&sam(), "DH: sunshine");
    assert!(effects.is_empty());
    assert_eq!(room.phase(), GamePhase::Guessing);
}

#[test]
fn commands_respect_access_levels() {
    let config = AppConfig {
        whitelist: vec![3],
        ..AppConfig::default()
    };
    let mut room = Room::with_config(config);
    room.post(&dora(), "I am defending: <b>S</b>");
    room.post(&sam(), "1: <b>a star</b>");

    let effects = room.post(&yara(), "!clues");
    assert_eq!(effects.len(), 1);
    assert!(!said(&effects)[0].contains("a star"));

    let effects = room.post(&xavi(), "!clues");
    assert_eq!(said(&effects), ["1: a star (by sam)"]);

    let effects = room.post(&xavi(), "!shutdown");
    assert!(!effects.contains(&Effect::Shutdown));

    let moderator = ChatUser::new(5, "mona").moderator();
    let effects = room.post(&moderator, "!shutdown");
    assert!(effects.contains(&Effect::Shutdown));
    assert_eq!(said(&effects), ["Shutting down.  Goodbye!"]);
}

#[test]
fn resume_and_stats_commands_ask_the_archive() {
    let mut room = Room::with_config(AppConfig {
        whitelist: vec![3],
        ..AppConfig::default()
    });
    let game_id = Uuid::new_v4();

    let effects = room.post(&xavi(), &format!("!stats {game_id}"));
    assert_eq!(effects, [Effect::Stats(game_id)]);

    let effects = room.post(&xavi(), &format!("!resume {game_id}"));
    assert_eq!(effects, [Effect::Resume(game_id)]);
}

#[test]
fn resumed_game_restores_open_clues_and_contacts() {
    let mut room = Room::new();
    let game_id = Uuid::new_v4();
    let start = SystemTime::now();
    let open_clue = Uuid::new_v4();

    let clue = |id: Uuid, number: &str, offset: u64, died: bool| ClueEntity {
        id,
        game_id,
        defence_id: None,
        number: number.into(),
        setter_id: 2,
        setter_name: "sam".into(),
        text: format!("clue {number}"),
        solver: None,
        solution: None,
        message_id: Some(50 + offset),
        posted_at: start + Duration::from_secs(offset),
        died_at: died.then_some(start + Duration::from_secs(100)),
    };

    let snapshot = ResumeSnapshot {
        game: GameEntity {
            id: game_id,
            defender_id: 1,
            defender_name: "dora".into(),
            word: None,
            started_at: start,
            ended_at: None,
        },
        defences: vec![
            DefenceEntity {
                id: Uuid::new_v4(),
                game_id,
                text: "C".into(),
                message_id: Some(10),
                started_at: start,
            },
            DefenceEntity {
                id: Uuid::new_v4(),
                game_id,
                text: "CO".into(),
                message_id: Some(20),
                started_at: start + Duration::from_secs(30),
            },
        ],
        clues: vec![
            clue(Uuid::new_v4(), "1", 1, true),
            clue(open_clue, "2", 2, false),
        ],
        contacts: vec![ContactEntity {
            game_id,
            clue_id: open_clue,
            user_id: 3,
            user_name: "xavi".into(),
            contacted_at: start,
        }],
    };

    let effects = room.referee.restore(Ok(snapshot), room.now);
    assert_eq!(room.phase(), GamePhase::Guessing);
    assert_eq!(
        said(&effects),
        [
            format!("Resuming game {game_id}: dora is defending **CO**."),
            "2: **clue 2** (by sam)".to_string(),
        ]
    );

    let board = room.referee.board();
    assert_eq!(board.clues.len(), 1);
    assert_eq!(board.clues[0].contacts, ["xavi"]);

    // The bot's own re-post takes over the clue's message.
    let bot = ChatUser::new(999, "Referee");
    let effects = room.post(&bot, "2: <b>clue 2</b> (by sam)");
    assert!(effects.contains(&Effect::Star(room.last_message())));
    assert_eq!(room.referee.board().clues.len(), 1);
}

#[test]
fn enough_waves_ping_the_pinglist() {
    let config = AppConfig {
        pinglist: vec!["Jon Skeet".into(), "ana".into()],
        ..AppConfig::default()
    };
    let mut room = Room::with_config(config);
    for user in [dora(), sam(), xavi()] {
        assert!(said(&room.post(&user, "o/")).is_empty());
    }

    let effects = room.post(&yara(), "o/");
    assert_eq!(
        said(&effects),
        [
            "There are 4 people waiting to play Contact!  Want to join?",
            "@JonSkeet @ana"
        ]
    );
}

#[test]
fn each_contact_gets_one_guess_per_pass() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>C</b>");
    room.post(&sam(), "5: <b>farm animal</b>");
    room.post(&xavi(), "contact 5");
    room.post(&yara(), "c5");
    room.post(&dora(), "passing on 5");

    room.post(&xavi(), "5: CAT");
    room.post(&sam(), "5: no");
    let effects = room.post(&xavi(), "5: COLT");
    assert_eq!(
        said(&effects),
        ["You already had your guess for clue #5.  Let the other contacts have a go."]
    );
    assert!(room.referee.board().clues[0].pending_guess.is_none());
    assert_eq!(room.phase(), GamePhase::Passed);

    room.post(&yara(), "5: COW");
    room.post(&sam(), "5: yes");
    assert_eq!(room.phase(), GamePhase::WaitingForLetter);
}

#[test]
fn passing_again_gets_guidance_instead_of_an_error_dump() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>B</b>");
    room.post(&sam(), "5: <b>it floats</b>");
    room.post(&xavi(), "6: <b>it bounces</b>");

    room.post(&dora(), "pass 5");
    let effects = room.post(&dora(), "pass 6");
    assert_eq!(
        said(&effects),
        ["You have already passed on clue #5.  Wait until that pass is resolved (or `!unpass` it) before passing again."]
    );

    room.post(&yara(), "5: BOAT");
    room.post(&sam(), "5: yes");
    assert_eq!(room.phase(), GamePhase::WaitingForLetter);

    let effects = room.post(&dora(), "pass 6");
    assert_eq!(
        said(&effects),
        ["We are waiting for you to provide a new letter.  Give one up before passing on another clue."]
    );
    assert_eq!(room.phase(), GamePhase::WaitingForLetter);
}

#[test]
fn defender_passes_despite_a_trailing_remark() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>B</b>");
    room.post(&sam(), "5: <b>it floats</b>");
    room.post(&xavi(), "c 5 please");

    room.post(&dora(), "passing on 5, sorry");
    assert_eq!(room.phase(), GamePhase::Passed);
    assert_eq!(room.referee.board().clues[0].contacts, ["xavi"]);
}

#[test]
fn unpass_puts_the_clue_back_in_play() {
    let mut room = Room::with_config(AppConfig {
        whitelist: vec![1],
        ..AppConfig::default()
    });
    room.post(&dora(), "I am defending: <b>C</b>");

    let effects = room.post(&dora(), "!unpass");
    assert_eq!(
        said(&effects),
        ["There is nothing to undo.  No clues are currently \"passed\"."]
    );

    room.post(&sam(), "5: <b>farm animal</b>");
    room.post(&dora(), "pass 5");
    let effects = room.post(&dora(), "!unpass");
    assert_eq!(
        said(&effects),
        ["Okay, I've cleaned up your mess.  Clue #5 is no longer passed.  Next time, say what you mean!"]
    );
    assert_eq!(room.phase(), GamePhase::Guessing);
    assert_eq!(room.referee.board().clues[0].state, ClueState::Set);
}

#[test]
fn killing_the_passed_clue_abandons_the_pass() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>C</b>");
    room.post(&sam(), "5: <b>farm animal</b>");
    room.post(&xavi(), "contact 5");
    room.post(&dora(), "pass 5");

    room.post(&mona(), "!kill 5");
    assert_eq!(room.phase(), GamePhase::Guessing);
    assert!(room.referee.board().clues.is_empty());
    assert_eq!(room.referee.live_stats().died, 1);
}

#[test]
fn deleting_the_passed_clue_abandons_the_pass() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>C</b>");
    room.post(&sam(), "5: <b>farm animal</b>");
    let message = room.last_message();
    room.post(&xavi(), "contact 5");
    room.post(&dora(), "pass 5");

    room.wait(2);
    let effects = room.referee.handle(ChatEvent::Deleted(message), room.now);
    assert_eq!(said(&effects), ["Clue #5 was deleted, so I've removed it."]);
    assert_eq!(room.phase(), GamePhase::Guessing);
    assert!(room.referee.board().clues.is_empty());
}

#[test]
fn editing_a_clue_message_updates_its_text() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>F</b>");
    room.post(&sam(), "3: <b>a sly animl</b>");
    let message = room.last_message();

    let effects = room.edit(message, &sam(), "3: <b>a sly animal</b>");
    assert!(said(&effects).is_empty());
    let board = room.referee.board();
    assert_eq!(board.clues.len(), 1);
    assert_eq!(board.clues[0].text, "a sly animal");
    assert!(effects.iter().any(|effect| matches!(
        effect,
        Effect::Persist(Record::Clue(clue)) if clue.text == "a sly animal"
    )));
}

#[test]
fn uncertain_clues_are_nagged_once_per_letter() {
    let reminder = "@sam, it's been more than 1.5 minutes since dora provided a new letter, and you still haven't indicated whether clue #1 is alive or dead.";
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>B</b>");
    room.post(&sam(), "1: <b>it floats</b>");
    room.post(&dora(), "I am defending: <b>BO</b>");

    room.wait(91);
    assert_eq!(said(&room.post(&xavi(), "anyone here?")), [reminder]);
    room.wait(30);
    assert!(said(&room.post(&xavi(), "anyone here?")).is_empty());

    room.post(&dora(), "I am defending: <b>BOA</b>");
    room.wait(91);
    assert_eq!(said(&room.post(&xavi(), "anyone here?")), [reminder]);
}

#[test]
fn unanswered_guesses_are_nagged_once() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>F</b>");
    room.post(&sam(), "3: <b>a sly animal</b>");
    room.post(&dora(), "3: FOX");

    room.wait(31);
    assert_eq!(
        said(&room.post(&xavi(), "anyone here?")),
        ["@sam, dora guessed *FOX* for clue #3.  Please confirm or deny the guess."]
    );
    room.wait(31);
    assert!(said(&room.post(&xavi(), "anyone here?")).is_empty());
}

#[test]
fn reminders_stay_quiet_outside_verbose_mode() {
    let mut room = Room::new();
    room.post(&mona(), "!verbose off");
    room.post(&dora(), "I am defending: <b>F</b>");
    room.post(&sam(), "1: <b>a sly animal</b>");
    room.post(&xavi(), "2: <b>a fish</b>");
    room.post(&dora(), "1: FOX");
    room.post(&dora(), "I am defending: <b>FI</b>");

    room.wait(120);
    assert!(said(&room.post(&xavi(), "anyone here?")).is_empty());
}

#[test]
fn shutup_silences_the_referee_until_speak() {
    let mut room = Room::new();
    room.post(&dora(), "I am defending: <b>F</b>");

    let effects = room.post(&mona(), "!shutup");
    assert_eq!(said(&effects).len(), 1);
    assert!(said(&effects)[0].starts_with("Ok, I won't say anything else for 10 minutes"));

    let effects = room.post(&sam(), "1: <b>a sly animal</b>");
    assert!(effects.contains(&Effect::Star(room.last_message())));
    assert!(said(&effects).is_empty());
    assert!(said(&room.post(&dora(), "2: <b>my own clue</b>")).is_empty());

    assert_eq!(
        said(&room.post(&mona(), "!speak")),
        ["Your wish is my command.  What can I do for you?"]
    );
    assert_eq!(
        said(&room.post(&dora(), "2: <b>my own clue</b>")),
        ["You are the defender -- you can't post clues!"]
    );
    assert_eq!(room.referee.board().clues.len(), 1);
}
