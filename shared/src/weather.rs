use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastKind {
    Current,
    Hourly,
    Daily,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub description: String,
    /// Numeric weather-condition code from the upstream provider.
    pub group_id: u16,
    pub name: String,
}

/// Display icon buckets for weather condition codes.
/// https://openweathermap.org/weather-conditions#Weather-Condition-Codes-2
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IconCategory {
    Storm,
    Rain,
    Snow,
    Fog,
    Clear,
    Cloudy,
    Wind,
}

impl Condition {
    /// Classify the condition code by numeric range, never by name.
    pub fn icon_category(&self) -> IconCategory {
        match self.group_id {
            200..=299 => IconCategory::Storm,
            300..=599 => IconCategory::Rain,
            600..=699 => IconCategory::Snow,
            700..=799 => IconCategory::Fog,
            800 => IconCategory::Clear,
            801..=899 => IconCategory::Cloudy,
            _ => IconCategory::Wind,
        }
    }
}

/// One normalized weather sample, in the unit system the client asked for.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    /// Cloud cover percentage.
    pub clouds: u8,
    /// Relative humidity percentage.
    pub humidity: u8,
    /// Rain-or-snow quantity in millimeters: last hour for current/hourly
    /// samples, the cumulative day figure for daily samples.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
    /// Atmospheric pressure in hectopascals.
    pub pressure: f64,
    pub temperature: f64,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ForecastKind>,
    /// 0-based position within the sample's forecast segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_index: Option<usize>,
    /// Visibility in meters; daily samples carry none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
    pub weather: Condition,
    pub wind_speed: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherBundle {
    pub current: Weather,
    pub forecast: Vec<Weather>,
    pub location_label: String,
}
