pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod game;
pub mod http;
pub mod matchmaking;
pub mod metrics;
pub mod protocol;
pub mod rating;
pub mod ws;
