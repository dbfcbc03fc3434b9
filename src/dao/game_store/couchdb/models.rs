use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const GAME_PREFIX: &str = "game::";
pub const DEFENCE_PREFIX: &str = "defence::";
pub const CLUE_PREFIX: &str = "clue::";
pub const CONTACT_PREFIX: &str = "contact::";
pub const ROSTER_PREFIX: &str = "roster::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Any archived record wrapped with CouchDB's `_id`/`_rev` bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> CouchDocument<T> {
    pub fn new(id: String, body: T) -> Self {
        Self { id, rev: None, body }
    }
}

/// Revision-only view used before overwriting or deleting a document.
#[derive(Debug, Deserialize)]
pub struct RevisionOnly {
    #[serde(rename = "_rev")]
    pub rev: String,
}

pub fn game_doc_id(id: Uuid) -> String {
    format!("{GAME_PREFIX}{id}")
}

/// Prefix shared by every per-game document of `kind`.
pub fn game_scoped_prefix(kind: &str, game_id: Uuid) -> String {
    format!("{kind}{game_id}:")
}

pub fn defence_doc_id(game_id: Uuid, id: Uuid) -> String {
    format!("{}{id}", game_scoped_prefix(DEFENCE_PREFIX, game_id))
}

pub fn clue_doc_id(game_id: Uuid, id: Uuid) -> String {
    format!("{}{id}", game_scoped_prefix(CLUE_PREFIX, game_id))
}

pub fn contact_doc_id(game_id: Uuid, clue_id: Uuid, user_id: u64) -> String {
    format!(
        "{}{clue_id}:{user_id}",
        game_scoped_prefix(CONTACT_PREFIX, game_id)
    )
}

pub fn roster_doc_id(name: &str) -> String {
    format!("{ROSTER_PREFIX}{name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::RosterEntity;

    #[test]
    fn contact_ids_share_the_game_prefix() {
        let (game, clue) = (Uuid::new_v4(), Uuid::new_v4());
        let id = contact_doc_id(game, clue, 42);
        assert!(id.starts_with(&game_scoped_prefix(CONTACT_PREFIX, game)));
        assert!(id.ends_with(":42"));
    }

    #[test]
    fn document_flattens_its_body() {
        let doc = CouchDocument::new(
            roster_doc_id("pinglist"),
            RosterEntity {
                name: "pinglist".into(),
                members: vec!["bob".into()],
            },
        );
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["_id"], "roster::pinglist");
        assert_eq!(json["members"][0], "bob");
        assert!(json.get("_rev").is_none());
    }
}
