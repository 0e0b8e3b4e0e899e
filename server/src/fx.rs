use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::config;

/// Rates relative to the provider's fixed base currency.
pub type Rates = HashMap<String, f64>;

/// Client for the Open Exchange Rates API.
#[derive(Clone)]
pub struct ExchangeRates {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ExchangeRates {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    pub async fn latest_rates(&self) -> Result<Rates> {
        let url = format!("{}/latest.json", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("app_id", self.api_key.as_str())])
            .send()
            .await
            .context("Failed to send request to Open Exchange Rates")?;

        match response.status() {
            reqwest::StatusCode::OK => {}
            status => {
                return Err(anyhow!(
                    "Open Exchange Rates request failed with status: {}",
                    status
                ));
            }
        }

        let parsed: LatestRatesResponse = response
            .json()
            .await
            .context("Failed to decode Open Exchange Rates response")?;

        Ok(parsed.rates)
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: Rates,
}

/// Convert an amount between two currencies quoted against a common base:
/// `rates[to] / rates[from] * amount`. Unknown codes yield `None`.
pub fn convert(rates: &Rates, from: &str, to: &str, amount: f64) -> Option<f64> {
    let from_rate = rates.get(from)?;
    let to_rate = rates.get(to)?;

    Some(to_rate / from_rate * amount)
}

#[derive(Clone, Debug)]
struct CachedRates {
    rates: Rates,
    fetched_at: DateTime<Utc>,
}

impl CachedRates {
    fn is_fresh(&self, max_age: Option<TimeDelta>, now: DateTime<Utc>) -> bool {
        match max_age {
            Some(max_age) => now - self.fetched_at <= max_age,
            None => true,
        }
    }
}

/// Single-slot in-memory cache for exchange rates. Without a `max_age` a
/// fetched value never expires, but the fetch time is recorded either way so
/// expiry is a configuration change rather than a redesign.
pub struct RateCache {
    slot: RwLock<Option<CachedRates>>,
    max_age: Option<TimeDelta>,
}

impl RateCache {
    pub fn new(max_age: Option<TimeDelta>) -> Self {
        Self {
            slot: RwLock::new(None),
            max_age,
        }
    }

    pub fn from_config() -> Self {
        Self::new(config().fx_cache_max_age_seconds.map(TimeDelta::seconds))
    }

    /// Cached rates, if the slot holds an unexpired value.
    pub async fn fresh_rates(&self) -> Option<Rates> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|cached| cached.is_fresh(self.max_age, Utc::now()))
            .map(|cached| cached.rates.clone())
    }

    pub async fn store(&self, rates: Rates) {
        let mut slot = self.slot.write().await;
        *slot = Some(CachedRates {
            rates,
            fetched_at: Utc::now(),
        });
    }

    /// Serve from the cache, fetching from the provider only when the slot
    /// is empty or expired. Provider failures propagate; the previous value
    /// is not used as a fallback.
    pub async fn get_or_fetch(&self, client: &ExchangeRates) -> Result<Rates> {
        if let Some(rates) = self.fresh_rates().await {
            return Ok(rates);
        }

        let rates = client.latest_rates().await?;
        self.store(rates.clone()).await;

        Ok(rates)
    }
}
