pub mod fmovies;
pub mod tmdb;
pub mod videostr;

pub use fmovies::FmoviesClient;
pub use tmdb::TmdbClient;
pub use videostr::VideostrClient;
