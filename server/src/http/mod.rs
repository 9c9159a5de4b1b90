pub mod auth;
pub mod friends;
pub mod games;
pub mod health;
pub mod invitations;
pub mod leaderboard;
pub mod matchmaking;
pub mod notifications;
pub mod players;
pub mod presence;
pub mod routes;
