//! Referee for the Contact word game, played in a chat room through a bridge bot.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
