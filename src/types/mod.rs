pub mod forecast;
pub mod geo;
pub mod openweather;
pub mod requests;

pub use forecast::{CurrentConditions, DailyForecastItem, HourlyForecastItem};
pub use geo::Coordinates;
pub use openweather::ProviderResponse;
pub use requests::{
    CreateFavoriteRequest, CreateUserRequest, LoginRequest, LoginResponse, UpdateUserRequest,
};
