pub mod assistant;
pub mod gateway;
pub mod handlers;
pub mod history;
pub mod intent;
pub mod notify;
pub mod quick_actions;
pub mod sessions;
pub mod snapshot;
pub mod templates;
