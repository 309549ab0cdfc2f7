pub mod identity;
pub mod public;
pub mod resources;
pub mod response;
pub mod share;
pub mod state;
pub mod users;
