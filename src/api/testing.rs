// ============================================================================
// Transport scripté pour les tests
// ============================================================================
// Répond sans réseau avec des corps JSON canoniques et compte les appels
// ============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::api::transport::{HttpResponse, Transport};
use crate::error::ApiError;

/// Corps de GET /global
pub(crate) fn global_body() -> String {
    json!({
        "data": {
            "active_cryptocurrencies": 12000,
            "total_market_cap": { "usd": 2_450_000_000_000.0_f64, "eur": 2_250_000_000_000.0_f64 },
            "total_volume": { "usd": 98_100_000_000.0_f64 },
            "market_cap_percentage": { "btc": 52.31, "eth": 17.2 }
        }
    })
    .to_string()
}

/// Corps de GET /coins/markets avec `count` pièces classées par capitalisation
pub(crate) fn markets_body(count: usize) -> String {
    let coins: Vec<_> = (1..=count)
        .map(|rank| {
            json!({
                "id": format!("coin-{}", rank),
                "market_cap_rank": rank,
                "name": format!("Coin {}", rank),
                "symbol": format!("c{}", rank),
                "image": format!("https://img.test/{}.png", rank),
                "current_price": (1000.0 / rank as f64),
                "price_change_percentage_24h": (rank as f64 - 2.5),
                "market_cap": (1e9 / rank as f64),
                "total_volume": (1e8 / rank as f64),
                "sparkline_in_7d": { "price": [1.0, 2.0, 3.0] }
            })
        })
        .collect();

    serde_json::Value::Array(coins).to_string()
}

/// Transport dont les réponses sont modifiables pendant le test
pub(crate) struct FakeTransport {
    global: Mutex<Result<HttpResponse, ApiError>>,
    markets: Mutex<Result<HttpResponse, ApiError>>,
    global_calls: AtomicUsize,
    markets_calls: AtomicUsize,
    last_url: Mutex<Option<String>>,
}

impl FakeTransport {
    /// Les deux endpoints répondent 200 ; le classement contient `count` pièces
    pub(crate) fn healthy(count: usize) -> Self {
        Self {
            global: Mutex::new(Ok(HttpResponse::new(200, global_body()))),
            markets: Mutex::new(Ok(HttpResponse::new(200, markets_body(count)))),
            global_calls: AtomicUsize::new(0),
            markets_calls: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        }
    }

    pub(crate) fn set_global(&self, response: Result<HttpResponse, ApiError>) {
        *self.global.lock().unwrap() = response;
    }

    pub(crate) fn set_markets(&self, response: Result<HttpResponse, ApiError>) {
        *self.markets.lock().unwrap() = response;
    }

    pub(crate) fn global_calls(&self) -> usize {
        self.global_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn markets_calls(&self) -> usize {
        self.markets_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.global_calls() + self.markets_calls()
    }

    pub(crate) fn last_url(&self) -> Option<String> {
        self.last_url.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, ApiError> {
        *self.last_url.lock().unwrap() = Some(url.to_string());

        if url.contains("/coins/markets") {
            self.markets_calls.fetch_add(1, Ordering::SeqCst);
            self.markets.lock().unwrap().clone()
        } else {
            self.global_calls.fetch_add(1, Ordering::SeqCst);
            self.global.lock().unwrap().clone()
        }
    }
}
