use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{ClueEntity, ContactEntity, DefenceEntity, GameEntity, RosterEntity},
    storage::StorageResult,
};

type ContactKey = (Uuid, Uuid, u64);

/// Process-local archive used when no CouchDB server is configured.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    games: Arc<DashMap<Uuid, GameEntity>>,
    defences: Arc<DashMap<Uuid, DefenceEntity>>,
    clues: Arc<DashMap<Uuid, ClueEntity>>,
    contacts: Arc<DashMap<ContactKey, ContactEntity>>,
    rosters: Arc<DashMap<String, RosterEntity>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn ready<T: Send + 'static>(value: T) -> BoxFuture<'static, StorageResult<T>> {
    Box::pin(async move { Ok(value) })
}

impl GameStore for MemoryGameStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.games.insert(game.id, game);
        ready(())
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        ready(self.games.get(&id).map(|entry| entry.value().clone()))
    }

    fn save_defence(&self, defence: DefenceEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.defences.insert(defence.id, defence);
        ready(())
    }

    fn list_defences(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<DefenceEntity>>> {
        let mut defences: Vec<DefenceEntity> = self
            .defences
            .iter()
            .filter(|entry| entry.game_id == game_id)
            .map(|entry| entry.value().clone())
            .collect();
        defences.sort_by_key(|defence| defence.started_at);
        ready(defences)
    }

    fn save_clue(&self, clue: ClueEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.clues.insert(clue.id, clue);
        ready(())
    }

    fn list_clues(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ClueEntity>>> {
        let mut clues: Vec<ClueEntity> = self
            .clues
            .iter()
            .filter(|entry| entry.game_id == game_id)
            .map(|entry| entry.value().clone())
            .collect();
        clues.sort_by_key(|clue| clue.posted_at);
        ready(clues)
    }

    fn save_contact(&self, contact: ContactEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.contacts.insert(
            (contact.game_id, contact.clue_id, contact.user_id),
            contact,
        );
        ready(())
    }

    fn delete_contact(
        &self,
        game_id: Uuid,
        clue_id: Uuid,
        user_id: u64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.contacts.remove(&(game_id, clue_id, user_id));
        ready(())
    }

    fn list_contacts(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ContactEntity>>> {
        let mut contacts: Vec<ContactEntity> = self
            .contacts
            .iter()
            .filter(|entry| entry.game_id == game_id)
            .map(|entry| entry.value().clone())
            .collect();
        contacts.sort_by_key(|contact| contact.contacted_at);
        ready(contacts)
    }

    fn save_roster(&self, roster: RosterEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.rosters.insert(roster.name.clone(), roster);
        ready(())
    }

    fn find_roster(&self, name: String) -> BoxFuture<'static, StorageResult<Option<RosterEntity>>> {
        ready(self.rosters.get(&name).map(|entry| entry.value().clone()))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        ready(())
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        ready(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    fn contact(game_id: Uuid, clue_id: Uuid, user_id: u64) -> ContactEntity {
        ContactEntity {
            game_id,
            clue_id,
            user_id,
            user_name: format!("user{user_id}"),
            contacted_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn contacts_are_scoped_to_their_game_and_deletable() {
        let store = MemoryGameStore::new();
        let (game, other_game, clue) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        store.save_contact(contact(game, clue, 1)).await.unwrap();
        store.save_contact(contact(game, clue, 2)).await.unwrap();
        store.save_contact(contact(other_game, clue, 3)).await.unwrap();
        store.delete_contact(game, clue, 1).await.unwrap();

        let listed = store.list_contacts(game).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].user_id, 2);
    }

    #[tokio::test]
    async fn clues_are_listed_in_posting_order() {
        let store = MemoryGameStore::new();
        let game_id = Uuid::new_v4();
        let start = SystemTime::now();

        for (offset, number) in [(2, "b"), (1, "a")] {
            store
                .save_clue(ClueEntity {
                    id: Uuid::new_v4(),
                    game_id,
                    defence_id: None,
                    number: number.into(),
                    setter_id: 1,
                    setter_name: "alice".into(),
                    text: "text".into(),
                    solver: None,
                    solution: None,
                    message_id: None,
                    posted_at: start + Duration::from_secs(offset),
                    died_at: None,
                })
                .await
                .unwrap();
        }

        let numbers: Vec<_> = store
            .list_clues(game_id)
            .await
            .unwrap()
            .into_iter()
            .map(|clue| clue.number)
            .collect();
        assert_eq!(numbers, ["a", "b"]);
    }
}
