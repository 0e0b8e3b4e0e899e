use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use shared::models::{LatLon, Units};

use crate::airports::{AirportQuery, Directory};
use crate::config::config;
use crate::fx::{self, ExchangeRates, RateCache};
use crate::weather::{self, OpenWeather};

pub async fn run(address: std::net::SocketAddr) {
    let conf = config();

    let directory = Directory::load(Path::new(&conf.airports_path))
        .expect(format!("Failed to load airports dataset: {}", &conf.airports_path).as_str());
    log::info!(
        "Loaded {} airports from {}",
        directory.len(),
        conf.airports_path
    );
    let directory = Arc::new(directory);

    let health_route = warp::path!("health").map(|| StatusCode::OK);

    let airports_route = warp::path!("api" / "airports")
        .and(warp::get())
        .and(warp::query::<AirportsParams>())
        .and(with_directory(directory.clone()))
        .and_then(list_airports);

    let weather_route = warp::path!("api" / "airport" / String / "weather")
        .and(warp::get())
        .and(warp::query::<WeatherParams>())
        .and(with_directory(directory.clone()))
        .and(with_weather(OpenWeather::from_config()))
        .and_then(airport_weather);

    let api = health_route.or(airports_route).or(weather_route);

    let routes: BoxedFilter<(Response,)> = match conf.openexchangerates_api_key.as_ref() {
        Some(api_key) => {
            let client = ExchangeRates::new(
                api_key.clone(),
                conf.openexchangerates_api_url.clone(),
            );
            let cache = Arc::new(RateCache::from_config());

            let fx_rates_route = warp::path!("api" / "fx" / "rates")
                .and(warp::get())
                .and(with_fx(client.clone(), cache.clone()))
                .and_then(fx_rates);

            let fx_convert_route = warp::path!("api" / "fx" / "convert")
                .and(warp::get())
                .and(warp::query::<ConvertParams>())
                .and(with_fx(client, cache))
                .and_then(fx_convert);

            api.or(fx_rates_route)
                .or(fx_convert_route)
                .map(into_response)
                .boxed()
        }
        None => {
            log::warn!(
                "TAILWIND_API_OPENEXCHANGERATES_API_KEY is not set, fx endpoints are disabled"
            );
            api.map(into_response).boxed()
        }
    };

    let routes = routes.recover(rejection).with(warp::compression::gzip());

    warp::serve(routes).run(address).await
}

fn into_response(reply: impl Reply) -> Response {
    reply.into_response()
}

fn with_directory(
    directory: Arc<Directory>,
) -> impl Filter<Extract = (Arc<Directory>,), Error = Infallible> + Clone {
    warp::any().map(move || directory.clone())
}

fn with_weather(
    client: OpenWeather,
) -> impl Filter<Extract = (OpenWeather,), Error = Infallible> + Clone {
    warp::any().map(move || client.clone())
}

fn with_fx(
    client: ExchangeRates,
    cache: Arc<RateCache>,
) -> impl Filter<Extract = (ExchangeRates, Arc<RateCache>), Error = Infallible> + Clone {
    let client = warp::any().map(move || client.clone());
    let cache = warp::any().map(move || cache.clone());
    client.and(cache)
}

/// Query parameters for the airports listing. Numeric parameters are parsed
/// defensively: a malformed value falls back to its default instead of
/// failing the request.
#[derive(Debug, Deserialize)]
struct AirportsParams {
    search: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

impl AirportsParams {
    fn into_query(self, default_limit: usize) -> AirportQuery {
        AirportQuery {
            search: self.search,
            origin: parse_origin(self.latitude.as_deref(), self.longitude.as_deref()),
            offset: parse_or(self.offset.as_deref(), 0),
            limit: parse_or(self.limit.as_deref(), default_limit),
        }
    }
}

/// Ranking needs both coordinates, parseable and finite; anything else means
/// unranked results rather than an error.
fn parse_origin(latitude: Option<&str>, longitude: Option<&str>) -> Option<LatLon> {
    let latitude: f64 = latitude?.parse().ok()?;
    let longitude: f64 = longitude?.parse().ok()?;

    if latitude.is_finite() && longitude.is_finite() {
        Some(LatLon(latitude, longitude))
    } else {
        None
    }
}

fn parse_or(value: Option<&str>, default: usize) -> usize {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

async fn list_airports(
    params: AirportsParams,
    directory: Arc<Directory>,
) -> Result<impl Reply, Rejection> {
    let query = params.into_query(config().default_results_limit);

    Ok(warp::reply::json(&directory.query(&query)))
}

#[derive(Debug, Deserialize)]
struct WeatherParams {
    units: Option<Units>,
}

async fn airport_weather(
    airport_id: String,
    params: WeatherParams,
    directory: Arc<Directory>,
    client: OpenWeather,
) -> Result<impl Reply, Rejection> {
    let airport = directory
        .get(&airport_id)
        .ok_or_else(|| warp::reject::custom(UnknownAirport))?;

    let payload = client
        .one_call(&airport.coordinates, params.units.unwrap_or_default())
        .await
        .map_err(|e| warp::reject::custom(Upstream(e)))?;

    // The airport name is more precise than the upstream's own location label
    let label = format!("{}, {}", airport.name, airport.city);
    let bundle = weather::bundle(&payload, label).map_err(|e| warp::reject::custom(Upstream(e)))?;

    Ok(warp::reply::json(&bundle))
}

async fn fx_rates(
    client: ExchangeRates,
    cache: Arc<RateCache>,
) -> Result<impl Reply, Rejection> {
    let rates = cache
        .get_or_fetch(&client)
        .await
        .map_err(|e| warp::reject::custom(Upstream(e)))?;

    Ok(warp::reply::json(&rates))
}

#[derive(Debug, Deserialize)]
struct ConvertParams {
    from: String,
    to: String,
    amount: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Conversion {
    from: String,
    to: String,
    amount: f64,
    result: f64,
}

async fn fx_convert(
    params: ConvertParams,
    client: ExchangeRates,
    cache: Arc<RateCache>,
) -> Result<impl Reply, Rejection> {
    let rates = cache
        .get_or_fetch(&client)
        .await
        .map_err(|e| warp::reject::custom(Upstream(e)))?;

    let result = fx::convert(&rates, &params.from, &params.to, params.amount)
        .ok_or_else(|| warp::reject::custom(UnknownCurrency))?;

    // Two decimals is a display convention, applied only at this boundary
    let result = (result * 100.0).round() / 100.0;

    Ok(warp::reply::json(&Conversion {
        from: params.from,
        to: params.to,
        amount: params.amount,
        result,
    }))
}

#[derive(Debug)]
struct UnknownAirport;
impl warp::reject::Reject for UnknownAirport {}

#[derive(Debug)]
struct UnknownCurrency;
impl warp::reject::Reject for UnknownCurrency {}

#[derive(Debug)]
struct Upstream(anyhow::Error);
impl warp::reject::Reject for Upstream {}

#[derive(Serialize)]
struct ErrorMessage {
    code: u16,
    message: String,
}

pub async fn rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found.")
    } else if err.find::<UnknownAirport>().is_some() {
        (StatusCode::NOT_FOUND, "Unknown airport id.")
    } else if err.find::<UnknownCurrency>().is_some() {
        (StatusCode::NOT_FOUND, "Unknown currency code.")
    } else if let Some(Upstream(e)) = err.find::<Upstream>() {
        log::error!("Upstream provider error: {:?}", e);
        (StatusCode::BAD_GATEWAY, "Upstream provider error.")
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid query parameters.")
    } else {
        log::error!("Error: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
    };

    let json = warp::reply::json(&ErrorMessage {
        code: code.as_u16(),
        message: message.into(),
    });

    Ok(warp::reply::with_status(json, code))
}
