pub mod friend_repo;
pub mod invitation_repo;
pub mod match_repo;
pub mod models;
pub mod notification_repo;
pub mod player_repo;
pub mod queue_repo;
