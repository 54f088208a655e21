//! chatrelay core library — config, credential bootstrapping, the Google
//! Chat client, and the HTTP relay server used by the CLI.

pub mod chat;
pub mod config;
pub mod credentials;
pub mod server;
