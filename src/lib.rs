pub mod broadcast;
pub mod credentials;
pub mod errors;
pub mod message;
pub mod registry;
pub mod server;
pub mod session;
