pub mod openweather_api;

pub use openweather_api::{OpenWeatherApi, WeatherQuery};
