#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;

use crate::dao::models::{ClueEntity, ContactEntity, DefenceEntity, GameEntity, RosterEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the archive of games, clues, contacts and rosters.
pub trait GameStore: Send + Sync {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn save_defence(&self, defence: DefenceEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn list_defences(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<DefenceEntity>>>;
    fn save_clue(&self, clue: ClueEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn list_clues(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ClueEntity>>>;
    fn save_contact(&self, contact: ContactEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn delete_contact(
        &self,
        game_id: Uuid,
        clue_id: Uuid,
        user_id: u64,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn list_contacts(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ContactEntity>>>;
    fn save_roster(&self, roster: RosterEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_roster(&self, name: String) -> BoxFuture<'static, StorageResult<Option<RosterEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
