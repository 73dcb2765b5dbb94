// ============================================================================
// Module : api
// ============================================================================
// Ce module contient le client de données CoinGecko et son transport HTTP
// ============================================================================

pub mod coingecko; // Client CoinGecko (cache + schéma + erreurs typées)
pub mod transport; // Seam HTTP (reqwest en production)

#[cfg(test)]
pub(crate) mod testing; // Transport scripté pour les tests

// Re-export des types principaux
pub use coingecko::{load_market, ranked_cache_key, DataClient, DEFAULT_BASE_URL};
pub use transport::{HttpResponse, ReqwestTransport, Transport};
