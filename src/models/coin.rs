// ============================================================================
// Structure : CoinRecord
// ============================================================================
// Une cryptomonnaie du classement par capitalisation (une ligne du tableau)
//
// CONCEPTS RUST :
// 1. Option<T> : les champs que l'API peut renvoyer à null
// 2. Vec<f64> : la sparkline 7 jours (vide si l'API ne la fournit pas)
// 3. Le Vec<CoinRecord> est remplacé en entier à chaque fetch (jamais patché)
// ============================================================================

use serde::{Deserialize, Serialize};

/// Une pièce telle que validée à la frontière réseau
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    /// Identifiant CoinGecko (ex: "bitcoin")
    pub id: String,

    /// Rang par capitalisation (None si l'API ne le connaît pas)
    pub rank: Option<u32>,

    /// Nom complet (ex: "Bitcoin")
    pub name: String,

    /// Symbole en minuscules, comme renvoyé par l'API (ex: "btc")
    pub symbol: String,

    /// URL de l'icône
    pub icon_url: String,

    /// Prix dans la devise demandée
    pub current_price: f64,

    /// Variation sur 24h en pourcentage
    pub price_change_pct_24h: Option<f64>,

    pub market_cap: Option<f64>,

    pub total_volume: Option<f64>,

    /// Prix horaires sur 7 jours
    pub sparkline: Vec<f64>,
}

impl CoinRecord {
    /// Crée une pièce minimale (utile pour les tests et les démos)
    pub fn new(id: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rank: None,
            name: name.into(),
            symbol: symbol.into(),
            icon_url: String::new(),
            current_price: 0.0,
            price_change_pct_24h: None,
            market_cap: None,
            total_volume: None,
            sparkline: Vec::new(),
        }
    }

    /// Symbole affiché en majuscules (ex: "BTC")
    pub fn display_symbol(&self) -> String {
        self.symbol.to_uppercase()
    }

    /// Vrai si le nom OU le symbole contient `needle` (déjà en minuscules)
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.symbol.to_lowercase().contains(needle)
    }

    /// Retourne true si la pièce est en hausse sur 24h (null compte comme 0)
    pub fn is_positive(&self) -> bool {
        self.price_change_pct_24h.unwrap_or(0.0) >= 0.0
    }
}
