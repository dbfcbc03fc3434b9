/// Archive storage backends.
pub mod game_store;
/// Archived record definitions.
pub mod models;
/// Backend-neutral storage errors.
pub mod storage;
