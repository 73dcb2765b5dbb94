// ============================================================================
// API Client : CoinGecko
// ============================================================================
// Récupère les statistiques globales et le classement des cryptomonnaies
//
// CONCEPTS RUST :
// 1. Generics : DataClient<T: Transport> (réseau réel ou transport de test)
// 2. Serde : schéma explicite à la frontière réseau
//    -> un JSON inattendu devient ApiError::MalformedResponse
// 3. Mutex : le cache est partagé par deux requêtes concurrentes
//    -> le verrou n'est jamais gardé pendant un .await
// ============================================================================

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use crate::api::transport::Transport;
use crate::cache::{CacheStore, Clock};
use crate::error::ApiError;
use crate::models::{CoinRecord, MarketData, MarketSnapshot};

/// URL de base de l'API publique CoinGecko v3
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Clé de cache des statistiques globales
pub const GLOBAL_CACHE_KEY: &str = "global";

/// Clé de cache du classement : "top-{currency}-{limit}"
pub fn ranked_cache_key(currency: &str, limit: usize) -> String {
    format!("top-{}-{}", currency, limit)
}

// ============================================================================
// Schéma JSON de CoinGecko
// ============================================================================
// Les champs absents du schéma sont ignorés par serde ; les champs requis
// manquants (ou du mauvais type) font échouer la désérialisation.
// ============================================================================

/// Réponse de GET /global
#[derive(Debug, Deserialize)]
struct GlobalResponse {
    data: GlobalData,
}

#[derive(Debug, Deserialize)]
struct GlobalData {
    total_market_cap: UsdAmount,
    total_volume: UsdAmount,
    market_cap_percentage: Dominance,
}

/// Les montants globaux sont indexés par devise ; seul "usd" nous intéresse
#[derive(Debug, Deserialize)]
struct UsdAmount {
    usd: f64,
}

#[derive(Debug, Deserialize)]
struct Dominance {
    btc: f64,
}

/// Un élément de GET /coins/markets
#[derive(Debug, Deserialize)]
struct MarketCoin {
    id: String,
    market_cap_rank: Option<u32>,
    name: String,
    symbol: String,
    image: Option<String>,
    current_price: f64,
    price_change_percentage_24h: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
    sparkline_in_7d: Option<Sparkline>,
}

#[derive(Debug, Deserialize)]
struct Sparkline {
    #[serde(default)]
    price: Vec<f64>,
}

impl From<GlobalResponse> for MarketSnapshot {
    fn from(response: GlobalResponse) -> Self {
        let data = response.data;
        Self {
            total_market_cap_usd: data.total_market_cap.usd,
            total_volume_usd: data.total_volume.usd,
            btc_dominance_pct: data.market_cap_percentage.btc,
        }
    }
}

impl From<MarketCoin> for CoinRecord {
    fn from(coin: MarketCoin) -> Self {
        Self {
            id: coin.id,
            rank: coin.market_cap_rank,
            name: coin.name,
            symbol: coin.symbol,
            icon_url: coin.image.unwrap_or_default(),
            current_price: coin.current_price,
            price_change_pct_24h: coin.price_change_percentage_24h,
            market_cap: coin.market_cap,
            total_volume: coin.total_volume,
            sparkline: coin.sparkline_in_7d.map(|s| s.price).unwrap_or_default(),
        }
    }
}

// ============================================================================
// DataClient
// ============================================================================

/// Valeurs mises en cache (les deux requêtes partagent le même CacheStore)
#[derive(Debug, Clone)]
enum Cached {
    Global(MarketSnapshot),
    Ranked(Vec<CoinRecord>),
}

/// Client des deux requêtes logiques, chacune mise en cache sous sa propre clé
pub struct DataClient<T> {
    transport: T,
    base_url: String,
    cache: Mutex<CacheStore<Cached>>,
}

impl<T: Transport> DataClient<T> {
    /// Crée un client avec son propre cache
    ///
    /// CONCEPT : pas de singleton
    /// - Le client est construit explicitement dans main() puis possédé par
    ///   le worker ; chaque test construit le sien
    pub fn new(
        transport: T,
        base_url: impl Into<String>,
        cache_window: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: Mutex::new(CacheStore::new(cache_window, clock)),
        }
    }

    /// Statistiques globales (clé "global")
    #[instrument(skip(self))]
    pub async fn fetch_global_snapshot(&self) -> Result<MarketSnapshot, ApiError> {
        let cached = self.cache().get(GLOBAL_CACHE_KEY);
        if let Some(Cached::Global(snapshot)) = cached {
            debug!("Serving global snapshot from cache");
            return Ok(snapshot);
        }

        let url = format!("{}/global", self.base_url);
        let response: GlobalResponse = self.get_json(&url).await?;
        let snapshot = MarketSnapshot::from(response);

        self.cache().set(GLOBAL_CACHE_KEY, Cached::Global(snapshot));
        info!(
            market_cap = snapshot.total_market_cap_usd,
            btc_dominance = snapshot.btc_dominance_pct,
            "Fetched global snapshot"
        );
        Ok(snapshot)
    }

    /// Top `limit` pièces par capitalisation décroissante, avec sparkline 7j
    #[instrument(skip(self))]
    pub async fn fetch_ranked_coins(
        &self,
        currency: &str,
        limit: usize,
    ) -> Result<Vec<CoinRecord>, ApiError> {
        let key = ranked_cache_key(currency, limit);
        let cached = self.cache().get(&key);
        if let Some(Cached::Ranked(coins)) = cached {
            debug!(key = %key, coins = coins.len(), "Serving ranked coins from cache");
            return Ok(coins);
        }

        let url = self.ranked_url(currency, limit);
        let response: Vec<MarketCoin> = self.get_json(&url).await?;
        let coins: Vec<CoinRecord> = response.into_iter().map(CoinRecord::from).collect();

        self.cache().set(key, Cached::Ranked(coins.clone()));
        info!(coins = coins.len(), "Fetched ranked coins");
        Ok(coins)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Vide le cache (refresh manuel, cache-bust)
    pub fn clear_cache(&self) {
        debug!("Clearing data cache");
        self.cache().clear();
    }

    fn ranked_url(&self, currency: &str, limit: usize) -> String {
        format!(
            concat!(
                "{}/coins/markets?vs_currency={}&order=market_cap_desc&per_page={}&page=1",
                "&sparkline=true&price_change_percentage=24h"
            ),
            self.base_url, currency, limit
        )
    }

    /// GET + vérification du statut + désérialisation typée
    async fn get_json<R: DeserializeOwned>(&self, url: &str) -> Result<R, ApiError> {
        debug!(url = %url, "Requesting CoinGecko");
        let response = self.transport.get(url).await.map_err(|e| {
            error!(error = %e, "Transport failure");
            e
        })?;

        if !response.is_success() {
            error!(status = response.status, "CoinGecko returned error status");
            return Err(ApiError::Fetch {
                status: response.status,
            });
        }

        serde_json::from_str(&response.body).map_err(|e| {
            error!(error = %e, "Unexpected JSON shape");
            ApiError::MalformedResponse(e.to_string())
        })
    }

    /// CONCEPT RUST : PoisonError::into_inner
    /// - Un panic pendant qu'un verrou est tenu "empoisonne" le Mutex
    /// - Le cache reste cohérent (chaque opération est atomique), on continue
    fn cache(&self) -> MutexGuard<'_, CacheStore<Cached>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Lance les deux requêtes en parallèle et attend les deux
///
/// CONCEPT RUST : tokio::join!
/// - Les deux futures progressent en même temps sur la même tâche
/// - Contrairement à try_join!, on attend la fin des deux (les deux
///   peuvent remplir le cache même si l'autre échoue)
/// - Échec partiel = échec total : aucune moitié n'est renvoyée
pub async fn load_market<T: Transport>(
    client: &DataClient<T>,
    currency: &str,
    limit: usize,
) -> Result<MarketData, ApiError> {
    let (snapshot, coins) = tokio::join!(
        client.fetch_global_snapshot(),
        client.fetch_ranked_coins(currency, limit)
    );

    Ok(MarketData {
        snapshot: snapshot?,
        coins: coins?,
        currency: currency.to_string(),
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================
