use once_cell::sync::Lazy;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub openweather_api_key: String,
    #[serde(default = "default_openweather_api_url")]
    pub openweather_api_url: String,
    /// Exchange rates are optional: without a key the fx routes are not
    /// registered at all.
    pub openexchangerates_api_key: Option<String>,
    #[serde(default = "default_openexchangerates_api_url")]
    pub openexchangerates_api_url: String,
    #[serde(default = "default_airports_path")]
    pub airports_path: String,
    #[serde(default = "default_results_limit")]
    pub default_results_limit: usize,
    /// Unset means cached rates never expire.
    pub fx_cache_max_age_seconds: Option<i64>,
}

fn default_openweather_api_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_openexchangerates_api_url() -> String {
    "https://openexchangerates.org/api".to_string()
}

fn default_airports_path() -> String {
    "airports.json".to_string()
}

fn default_results_limit() -> usize {
    50
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    envy::prefixed("TAILWIND_API_")
        .from_env::<Config>()
        .expect("Missing OpenWeather config. Required env var: TAILWIND_API_OPENWEATHER_API_KEY")
});

pub fn config() -> &'static Config {
    &CONFIG
}
