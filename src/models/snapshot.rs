// ============================================================================
// Structure : MarketSnapshot
// ============================================================================
// Statistiques globales du marché crypto (capitalisation, volume, dominance)
// Immuable une fois récupérée, remplacée en entier à chaque fetch
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::format::{format_magnitude, format_percentage};

/// Agrégats globaux du marché, en USD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub total_market_cap_usd: f64,
    pub total_volume_usd: f64,
    pub btc_dominance_pct: f64,
}

/// Textes prêts à afficher dans le header du dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDisplay {
    pub total_market_cap: String,
    pub total_volume: String,
    pub btc_dominance: String,
}

impl MarketSnapshot {
    /// Formate les trois agrégats ("$2.45T", "$98.10B", "52.31%")
    pub fn display(&self) -> SnapshotDisplay {
        SnapshotDisplay {
            total_market_cap: format_magnitude(Some(self.total_market_cap_usd), 2),
            total_volume: format_magnitude(Some(self.total_volume_usd), 2),
            btc_dominance: format_percentage(Some(self.btc_dominance_pct)),
        }
    }
}
