pub mod scoreboard;
pub mod service;
pub mod session;
