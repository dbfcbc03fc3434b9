/// Chat connection lifecycle for the bridge bot.
pub mod bridge_service;
/// Message classification into game intents and commands.
pub mod classifier;
/// Clue registration, contacts, kills and deletions.
pub mod clue_service;
/// Bot commands.
pub mod command_service;
pub mod cooldown;
/// OpenAPI documentation generation.
pub mod documentation;
/// The referee task and its persistence writer.
pub mod event_loop;
/// Archive lookups for resume and stats.
pub mod game_service;
/// Guess submission and setter answers.
pub mod guess_service;
/// Health check service.
pub mod health_service;
/// Defender announcements, passes and game end.
pub mod lifecycle_service;
/// Reminders for stale clues and unanswered guesses.
pub mod monitor;
pub mod output;
pub mod referee;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
pub mod stats;
/// Storage reconnection and degraded mode.
pub mod storage_supervisor;
pub mod waves;
