use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use shared::models::{LatLon, Units};
use shared::weather::{Condition, ForecastKind, Weather, WeatherBundle};

use crate::config::config;

/// How far ahead the forecast window reaches: the next 3 hours and the next
/// 7 days.
const HOURLY_SAMPLES: usize = 3;
const DAILY_SAMPLES: usize = 7;

/// Client for the OpenWeather "one call" endpoint.
#[derive(Clone)]
pub struct OpenWeather {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenWeather {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    pub fn from_config() -> Self {
        let conf = config();
        Self::new(
            conf.openweather_api_key.clone(),
            conf.openweather_api_url.clone(),
        )
    }

    /// Fetch raw current/hourly/daily weather for a coordinate. The unit
    /// system is forwarded verbatim to the provider; nothing is converted
    /// locally.
    pub async fn one_call(&self, coordinates: &LatLon, units: Units) -> Result<OneCallResponse> {
        let url = format!("{}/onecall", self.base_url);
        let lat = coordinates.latitude().to_string();
        let lon = coordinates.longitude().to_string();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("appid", self.api_key.as_str()),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("units", units.as_str()),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather")?;

        match response.status() {
            reqwest::StatusCode::OK => {}
            status => {
                return Err(anyhow!(
                    "OpenWeather request failed with status: {}",
                    status
                ));
            }
        }

        response
            .json::<OneCallResponse>()
            .await
            .context("Failed to decode OpenWeather response")
    }
}

#[derive(Debug, Deserialize)]
pub struct OneCallResponse {
    pub current: RawInstant,
    #[serde(default)]
    pub hourly: Vec<RawInstant>,
    #[serde(default)]
    pub daily: Vec<RawDaily>,
}

/// Shape shared by the upstream `current` and `hourly` samples.
#[derive(Debug, Deserialize)]
pub struct RawInstant {
    pub temp: f64,
    pub humidity: u8,
    pub clouds: u8,
    pub pressure: f64,
    pub wind_speed: f64,
    pub visibility: Option<f64>,
    pub rain: Option<RawPrecipitation>,
    pub snow: Option<RawPrecipitation>,
    pub weather: Vec<RawCondition>,
}

/// The upstream `daily` sample: structured temperature, cumulative scalar
/// precipitation, no visibility.
#[derive(Debug, Deserialize)]
pub struct RawDaily {
    pub temp: RawDailyTemp,
    pub humidity: u8,
    pub clouds: u8,
    pub pressure: f64,
    pub wind_speed: f64,
    pub rain: Option<f64>,
    pub snow: Option<f64>,
    pub weather: Vec<RawCondition>,
}

/// Daily temperatures also carry min/max/night/eve/morn components; only the
/// day reading is surfaced.
#[derive(Debug, Deserialize)]
pub struct RawDailyTemp {
    pub day: f64,
}

/// Last-hour precipitation quantity, e.g. `{"1h": 0.25}`.
#[derive(Debug, Deserialize)]
pub struct RawPrecipitation {
    #[serde(rename = "1h")]
    pub one_hour: f64,
}

#[derive(Debug, Deserialize)]
pub struct RawCondition {
    pub id: u16,
    pub main: String,
    pub description: String,
}

fn map_condition(conditions: &[RawCondition]) -> Result<Condition> {
    let first = conditions
        .first()
        .ok_or_else(|| anyhow!("OpenWeather sample carried no weather condition"))?;

    Ok(Condition {
        description: first.description.clone(),
        group_id: first.id,
        name: first.main.clone(),
    })
}

/// Normalize a current or hourly sample.
fn map_instant(raw: &RawInstant) -> Result<Weather> {
    Ok(Weather {
        clouds: raw.clouds,
        humidity: raw.humidity,
        // Rain takes priority over snow when both fell in the last hour
        precipitation: raw
            .rain
            .as_ref()
            .or(raw.snow.as_ref())
            .map(|p| p.one_hour),
        pressure: raw.pressure,
        temperature: raw.temp,
        kind: None,
        type_index: None,
        visibility: raw.visibility,
        weather: map_condition(&raw.weather)?,
        wind_speed: raw.wind_speed,
    })
}

/// Normalize a daily sample: the day-component temperature, cumulative
/// precipitation, and no visibility reading at all.
fn map_daily(raw: &RawDaily) -> Result<Weather> {
    Ok(Weather {
        clouds: raw.clouds,
        humidity: raw.humidity,
        precipitation: raw.rain.or(raw.snow),
        pressure: raw.pressure,
        temperature: raw.temp.day,
        kind: None,
        type_index: None,
        visibility: None,
        weather: map_condition(&raw.weather)?,
        wind_speed: raw.wind_speed,
    })
}

/// Assemble the client-facing bundle: current conditions followed by the
/// earliest 3 hourly and earliest 7 daily forecast samples, each tagged with
/// its kind and position within its segment. Shorter upstream arrays are
/// used as-is, never padded.
pub fn bundle(payload: &OneCallResponse, location_label: String) -> Result<WeatherBundle> {
    let current = map_instant(&payload.current)?;

    let mut forecast = Vec::with_capacity(HOURLY_SAMPLES + DAILY_SAMPLES);

    for (index, hour) in payload.hourly.iter().take(HOURLY_SAMPLES).enumerate() {
        let mut sample = map_instant(hour)?;
        sample.kind = Some(ForecastKind::Hourly);
        sample.type_index = Some(index);
        forecast.push(sample);
    }

    for (index, day) in payload.daily.iter().take(DAILY_SAMPLES).enumerate() {
        let mut sample = map_daily(day)?;
        sample.kind = Some(ForecastKind::Daily);
        sample.type_index = Some(index);
        forecast.push(sample);
    }

    Ok(WeatherBundle {
        current,
        forecast,
        location_label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instant(extra: serde_json::Value) -> serde_json::Value {
        let mut sample = json!({
            "temp": 17.5,
            "humidity": 80,
            "clouds": 40,
            "pressure": 1013,
            "wind_speed": 3.2,
            "visibility": 10000,
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky"}]
        });
        sample
            .as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        sample
    }

    fn daily(extra: serde_json::Value) -> serde_json::Value {
        let mut sample = json!({
            "temp": {"day": 21.0, "min": 12.0, "max": 23.5, "night": 14.0},
            "humidity": 60,
            "clouds": 75,
            "pressure": 1009,
            "wind_speed": 5.1,
            "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds"}]
        });
        sample
            .as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        sample
    }

    fn payload(hourly: usize, daily_count: usize) -> OneCallResponse {
        let value = json!({
            "current": instant(json!({})),
            "hourly": (0..hourly).map(|_| instant(json!({}))).collect::<Vec<_>>(),
            "daily": (0..daily_count).map(|_| daily(json!({}))).collect::<Vec<_>>(),
        });
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_instant_precipitation_prefers_rain() {
        let raw: RawInstant =
            serde_json::from_value(instant(json!({"rain": {"1h": 2.0}, "snow": {"1h": 3.0}})))
                .unwrap();
        assert_eq!(map_instant(&raw).unwrap().precipitation, Some(2.0));

        let rain_only: RawInstant =
            serde_json::from_value(instant(json!({"rain": {"1h": 2.0}}))).unwrap();
        assert_eq!(map_instant(&rain_only).unwrap().precipitation, Some(2.0));

        let snow_only: RawInstant =
            serde_json::from_value(instant(json!({"snow": {"1h": 3.0}}))).unwrap();
        assert_eq!(map_instant(&snow_only).unwrap().precipitation, Some(3.0));

        let dry: RawInstant = serde_json::from_value(instant(json!({}))).unwrap();
        assert_eq!(map_instant(&dry).unwrap().precipitation, None);
    }

    #[test]
    fn test_daily_precipitation_prefers_rain() {
        let both: RawDaily =
            serde_json::from_value(daily(json!({"rain": 4.2, "snow": 1.1}))).unwrap();
        assert_eq!(map_daily(&both).unwrap().precipitation, Some(4.2));

        let snow_only: RawDaily = serde_json::from_value(daily(json!({"snow": 1.1}))).unwrap();
        assert_eq!(map_daily(&snow_only).unwrap().precipitation, Some(1.1));
    }

    #[test]
    fn test_daily_uses_day_temperature_and_no_visibility() {
        let raw: RawDaily = serde_json::from_value(daily(json!({}))).unwrap();
        let sample = map_daily(&raw).unwrap();

        assert_eq!(sample.temperature, 21.0);
        assert_eq!(sample.visibility, None);
    }

    #[test]
    fn test_instant_keeps_visibility() {
        let raw: RawInstant = serde_json::from_value(instant(json!({}))).unwrap();
        assert_eq!(map_instant(&raw).unwrap().visibility, Some(10000.0));
    }

    #[test]
    fn test_missing_condition_is_a_decode_error() {
        let raw: RawInstant =
            serde_json::from_value(instant(json!({"weather": []}))).unwrap();
        assert!(map_instant(&raw).is_err());
    }

    #[test]
    fn test_bundle_truncates_forecast_window() {
        let bundle = bundle(&payload(48, 8), "Heathrow, London".to_string()).unwrap();

        assert_eq!(bundle.forecast.len(), HOURLY_SAMPLES + DAILY_SAMPLES);

        let kinds: Vec<_> = bundle.forecast.iter().map(|s| s.kind.unwrap()).collect();
        assert_eq!(
            kinds,
            vec![
                ForecastKind::Hourly,
                ForecastKind::Hourly,
                ForecastKind::Hourly,
                ForecastKind::Daily,
                ForecastKind::Daily,
                ForecastKind::Daily,
                ForecastKind::Daily,
                ForecastKind::Daily,
                ForecastKind::Daily,
                ForecastKind::Daily,
            ]
        );

        let indices: Vec<_> = bundle
            .forecast
            .iter()
            .map(|s| s.type_index.unwrap())
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_bundle_uses_short_upstream_arrays_without_padding() {
        let bundle = bundle(&payload(1, 2), "Nearest, Near".to_string()).unwrap();

        assert_eq!(bundle.forecast.len(), 3);
        assert_eq!(bundle.forecast[0].kind, Some(ForecastKind::Hourly));
        assert_eq!(bundle.forecast[1].kind, Some(ForecastKind::Daily));
        assert_eq!(bundle.forecast[2].kind, Some(ForecastKind::Daily));
    }

    #[test]
    fn test_bundle_current_is_untagged() {
        let bundle = bundle(&payload(0, 0), "Heathrow, London".to_string()).unwrap();

        assert!(bundle.forecast.is_empty());
        assert_eq!(bundle.current.kind, None);
        assert_eq!(bundle.current.type_index, None);
        assert_eq!(bundle.location_label, "Heathrow, London");
    }
}
