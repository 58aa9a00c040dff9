pub mod base;
pub mod browser;
pub mod cache;
pub mod keys;
pub mod logging;
pub mod resolver;
pub mod server;
pub mod tmdb;
pub mod upstream;

pub use base::*;
pub use browser::*;
pub use cache::*;
pub use keys::*;
pub use logging::*;
pub use resolver::*;
pub use server::*;
pub use tmdb::*;
pub use upstream::*;
