pub mod aggregator;
pub mod cache;
pub mod favorites;
pub mod normalizer;
pub mod token;
pub mod users;
pub mod weather;

pub use cache::{MemoryCache, NoopCache, ResponseCache};
pub use favorites::FavoritesService;
pub use token::{Claims, TokenService};
pub use users::UserService;
pub use weather::WeatherService;
