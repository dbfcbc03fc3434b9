//! Archive lookups shared by the HTTP routes and the referee task.

use std::{sync::Arc, time::Duration};

use tokio::time::timeout;
use uuid::Uuid;

use crate::{
    dao::game_store::GameStore,
    dto::stats::GameStats,
    error::{GameError, GameResult, ServiceError},
    services::{referee::ResumeSnapshot, stats},
    state::SharedState,
};

/// Upper bound on a single archive round trip.
pub const STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Load everything recorded about `game_id`; `Ok(None)` when the game is unknown.
pub async fn load_archive(
    store: Arc<dyn GameStore>,
    game_id: Uuid,
) -> Result<Option<ResumeSnapshot>, ServiceError> {
    timeout(STORAGE_TIMEOUT, fetch(store, game_id))
        .await
        .map_err(|_| ServiceError::Timeout)?
}

async fn fetch(
    store: Arc<dyn GameStore>,
    game_id: Uuid,
) -> Result<Option<ResumeSnapshot>, ServiceError> {
    let Some(game) = store.find_game(game_id).await? else {
        return Ok(None);
    };
    let (defences, clues, contacts) = futures::try_join!(
        store.list_defences(game_id),
        store.list_clues(game_id),
        store.list_contacts(game_id),
    )?;
    Ok(Some(ResumeSnapshot {
        game,
        defences,
        clues,
        contacts,
    }))
}

/// Stats of an archived game, for the HTTP API.
pub async fn archived_stats(state: &SharedState, game_id: Uuid) -> Result<GameStats, ServiceError> {
    let store = state.game_store().await.ok_or(ServiceError::Degraded)?;
    let snapshot = load_archive(store, game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game {game_id} not found")))?;
    Ok(stats_of(&snapshot))
}

/// Load a game for `!resume`, phrased for the chat room.
pub async fn load_for_resume(state: &SharedState, game_id: Uuid) -> GameResult<ResumeSnapshot> {
    let store = state.game_store().await.ok_or_else(archive_down)?;
    load_archive(store, game_id)
        .await
        .map_err(|_| archive_down())?
        .ok_or_else(|| unknown_game(game_id))
}

/// Load a game's stats for `!stats`, phrased for the chat room.
pub async fn load_stats(state: &SharedState, game_id: Uuid) -> GameResult<GameStats> {
    load_for_resume(state, game_id)
        .await
        .map(|snapshot| stats_of(&snapshot))
}

fn stats_of(snapshot: &ResumeSnapshot) -> GameStats {
    stats::archived(
        &snapshot.game,
        &snapshot.defences,
        &snapshot.clues,
        &snapshot.contacts,
    )
}

fn archive_down() -> GameError {
    GameError::unavailable("I can't reach the game archive right now.  Try again later.")
}

fn unknown_game(game_id: Uuid) -> GameError {
    GameError::not_found(format!("I couldn't find a game with id {game_id}."))
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::dao::{
        game_store::memory::MemoryGameStore,
        models::{ClueEntity, DefenceEntity, GameEntity},
    };

    #[tokio::test]
    async fn archive_bundles_every_record_of_the_game() {
        let store = Arc::new(MemoryGameStore::new());
        let game_id = Uuid::new_v4();
        let start = SystemTime::now();

        store
            .save_game(GameEntity {
                id: game_id,
                defender_id: 1,
                defender_name: "dora".into(),
                word: None,
                started_at: start,
                ended_at: None,
            })
            .await
            .unwrap();
        store
            .save_defence(DefenceEntity {
                id: Uuid::new_v4(),
                game_id,
                text: "CO".into(),
                message_id: Some(10),
                started_at: start,
            })
            .await
            .unwrap();
        store
            .save_clue(ClueEntity {
                id: Uuid::new_v4(),
                game_id,
                defence_id: None,
                number: "1".into(),
                setter_id: 2,
                setter_name: "sam".into(),
                text: "a shellfish".into(),
                solver: Some("dora".into()),
                solution: Some("COCKLE".into()),
                message_id: Some(11),
                posted_at: start + Duration::from_secs(1),
                died_at: Some(start + Duration::from_secs(60)),
            })
            .await
            .unwrap();

        let snapshot = load_archive(store, game_id).await.unwrap().unwrap();
        assert_eq!(snapshot.defences.len(), 1);
        assert_eq!(snapshot.clues.len(), 1);
        assert!(snapshot.contacts.is_empty());

        let stats = stats_of(&snapshot);
        assert_eq!(stats.solved, 1);
        assert_eq!(stats.letters, 2);
    }

    #[tokio::test]
    async fn unknown_game_loads_as_none() {
        let store = Arc::new(MemoryGameStore::new());
        assert!(load_archive(store, Uuid::new_v4()).await.unwrap().is_none());
    }
}
