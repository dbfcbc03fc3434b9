//! The referee task: owns the [`Referee`], consumes inputs in arrival order and executes the
//! effects it returns.

use std::{
    panic::{self, AssertUnwindSafe},
    time::Instant,
};

use futures::future::BoxFuture;
use tokio::{sync::mpsc, time::timeout};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    dao::{game_store::GameStore, storage::StorageResult},
    dto::{stats::GameStats, ws::BridgeOutboundMessage},
    error::GameResult,
    services::{
        game_service::{self, STORAGE_TIMEOUT},
        referee::{ChatEvent, Effect, Record, Referee, ResumeSnapshot, RosterKind},
    },
    state::{SharedState, game::ChatUser},
};

/// Everything the referee task consumes.
#[derive(Debug)]
pub enum RefereeInput {
    /// The bridge told us who the bot is.
    Identified(ChatUser),
    /// A room event relayed by the bridge.
    Chat(ChatEvent),
    /// Archive answer to a `!resume`.
    Restored(GameResult<ResumeSnapshot>),
    /// Archive answer to a `!stats`.
    StatsLoaded(Uuid, GameResult<GameStats>),
    /// Persisted roster, `None` when nothing was stored yet.
    RosterLoaded(RosterKind, Option<Vec<String>>),
}

/// Drive the referee until every sender is gone.
pub async fn run(state: SharedState, mut inbox: mpsc::Receiver<RefereeInput>) {
    let mut referee = Referee::new(state.config());
    let (records_tx, records_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_writer(state.clone(), records_rx));

    let mut rosters_requested = false;
    state.publish_board(referee.board());

    while let Some(input) = inbox.recv().await {
        let now = Instant::now();
        let effects = match input {
            RefereeInput::Identified(bot) => {
                referee.identify(bot);
                if !rosters_requested {
                    rosters_requested = true;
                    spawn_roster_load(&state);
                }
                Vec::new()
            }
            RefereeInput::Chat(event) => guarded(|| referee.handle(event, now)),
            RefereeInput::Restored(loaded) => guarded(|| referee.restore(loaded, now)),
            RefereeInput::StatsLoaded(game_id, loaded) => {
                guarded(|| referee.report_stats(game_id, loaded, now))
            }
            RefereeInput::RosterLoaded(kind, Some(members)) => {
                referee.load_roster(kind, members);
                Vec::new()
            }
            RefereeInput::RosterLoaded(kind, None) => {
                info!(roster = kind.as_str(), "no stored roster; seeding from config");
                vec![Effect::Persist(Record::Roster(referee.roster(kind)))]
            }
        };

        execute(&state, &records_tx, effects).await;
        state.publish_board(referee.board());
    }

    info!("referee inbox closed; stopping");
}

/// Run one referee call, dropping the event if it panics so the loop keeps going.
fn guarded(work: impl FnOnce() -> Vec<Effect>) -> Vec<Effect> {
    panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|_| {
        error!("referee panicked while handling an event; event dropped");
        Vec::new()
    })
}

async fn execute(
    state: &SharedState,
    records: &mpsc::UnboundedSender<Record>,
    effects: Vec<Effect>,
) {
    for effect in effects {
        let outbound = match effect {
            Effect::Say { text, length_check } => BridgeOutboundMessage::Send { text, length_check },
            Effect::Star(message_id) => BridgeOutboundMessage::ToggleStar { message_id },
            Effect::CancelStars(message_id) => BridgeOutboundMessage::CancelStars { message_id },
            Effect::TogglePin(message_id) => BridgeOutboundMessage::TogglePin { message_id },
            Effect::Persist(record) => {
                if records.send(record).is_err() {
                    warn!("persistence writer stopped; record dropped");
                }
                continue;
            }
            Effect::Resume(game_id) => {
                let state = state.clone();
                tokio::spawn(async move {
                    let loaded = game_service::load_for_resume(&state, game_id).await;
                    state.submit(RefereeInput::Restored(loaded)).await;
                });
                continue;
            }
            Effect::Stats(game_id) => {
                let state = state.clone();
                tokio::spawn(async move {
                    let loaded = game_service::load_stats(&state, game_id).await;
                    state.submit(RefereeInput::StatsLoaded(game_id, loaded)).await;
                });
                continue;
            }
            Effect::Shutdown => {
                state.request_shutdown();
                continue;
            }
        };

        if let Err(err) = state.send_to_bridge(&outbound).await {
            warn!(error = %err, action = ?outbound, "failed to forward action to bridge");
        }
    }
}

fn spawn_roster_load(state: &SharedState) {
    let state = state.clone();
    tokio::spawn(async move {
        let Some(store) = state.game_store().await else {
            info!("storage unavailable; keeping configured rosters");
            return;
        };

        for kind in [RosterKind::Whitelist, RosterKind::Pinglist] {
            match timeout(STORAGE_TIMEOUT, store.find_roster(kind.as_str().to_string())).await {
                Ok(Ok(found)) => {
                    let members = found.map(|roster| roster.members);
                    state.submit(RefereeInput::RosterLoaded(kind, members)).await;
                }
                Ok(Err(err)) => warn!(roster = kind.as_str(), error = %err, "failed to load roster"),
                Err(_) => warn!(roster = kind.as_str(), "timed out loading roster"),
            }
        }
    });
}

/// Write records one at a time, in the order the referee produced them.
async fn run_writer(state: SharedState, mut records: mpsc::UnboundedReceiver<Record>) {
    while let Some(record) = records.recv().await {
        let kind = record_kind(&record);

        if state.is_degraded().await {
            warn!(record = kind, "storage degraded; record dropped");
            continue;
        }
        let Some(store) = state.game_store().await else {
            warn!(record = kind, "storage unavailable; record dropped");
            continue;
        };

        match timeout(STORAGE_TIMEOUT, write(store.as_ref(), record)).await {
            Ok(Ok(())) => debug!(record = kind, "record persisted"),
            Ok(Err(err)) => warn!(record = kind, error = %err, "failed to persist record"),
            Err(_) => warn!(record = kind, "timed out persisting record"),
        }
    }
}

fn write(store: &dyn GameStore, record: Record) -> BoxFuture<'static, StorageResult<()>> {
    match record {
        Record::Game(game) => store.save_game(game),
        Record::Defence(defence) => store.save_defence(defence),
        Record::Clue(clue) => store.save_clue(clue),
        Record::Contact(contact) => store.save_contact(contact),
        Record::Uncontact {
            game_id,
            clue_id,
            user_id,
        } => store.delete_contact(game_id, clue_id, user_id),
        Record::Roster(roster) => store.save_roster(roster),
    }
}

fn record_kind(record: &Record) -> &'static str {
    match record {
        Record::Game(_) => "game",
        Record::Defence(_) => "defence",
        Record::Clue(_) => "clue",
        Record::Contact(_) => "contact",
        Record::Uncontact { .. } => "uncontact",
        Record::Roster(_) => "roster",
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::game_store::memory::MemoryGameStore,
        services::referee::ChatMessage,
        state::{AppState, state_machine::GamePhase},
    };

    fn posted(id: u64, user: ChatUser, content: &str) -> RefereeInput {
        RefereeInput::Chat(ChatEvent::Posted(ChatMessage {
            id,
            user,
            content: content.into(),
            stars: 0,
        }))
    }

    #[tokio::test]
    async fn chat_events_update_the_board_and_reach_the_archive() {
        let (state, inbox) = AppState::new(AppConfig::default(), None);
        let store = Arc::new(MemoryGameStore::new());
        state.set_game_store(store.clone()).await;
        tokio::spawn(run(state.clone(), inbox));

        let dora = ChatUser::new(1, "dora");
        let sam = ChatUser::new(2, "sam");
        state.submit(posted(10, dora, "I am defending: <b>co</b>")).await;
        state.submit(posted(11, sam, "1: <b>a shellfish</b>")).await;

        let mut board = state.board();
        for _ in 0..100 {
            if board.clues.len() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            board = state.board();
        }

        assert_eq!(board.phase, GamePhase::Guessing);
        assert_eq!(board.defending, "CO");
        assert_eq!(board.clues[0].setter, "sam");

        let game_id = board.game_id.expect("game id on the board");
        let mut clues = Vec::new();
        for _ in 0..100 {
            clues = store.list_clues(game_id).await.unwrap();
            if !clues.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(clues.len(), 1);
        assert_eq!(clues[0].text, "a shellfish");
    }
}
