pub mod manager;
pub mod message;
pub mod publisher;
pub mod registry;
pub mod retry;
pub mod settings;
pub mod transport;
