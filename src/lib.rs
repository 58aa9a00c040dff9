pub mod cache;
pub mod common;
pub mod configs;
pub mod server;
pub mod stream;
pub mod transport;
pub mod upstream;
