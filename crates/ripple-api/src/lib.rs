pub mod conversations;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod presence;
pub mod reactions;
pub mod reads;
pub mod state;
pub mod typing;
pub mod users;
