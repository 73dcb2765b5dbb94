// ============================================================================
// Module : models
// ============================================================================
// Ce module contient les structures de données typées du dashboard
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module public (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod coin;     // Une ligne du classement (coin.rs)
pub mod snapshot; // Agrégats globaux du marché (snapshot.rs)

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use coinwatch::models::coin::CoinRecord;
// On peut faire : use coinwatch::models::CoinRecord;
pub use coin::CoinRecord;
pub use snapshot::{MarketSnapshot, SnapshotDisplay};

/// Résultat complet d'un cycle de chargement (les deux requêtes ont réussi)
#[derive(Debug, Clone, PartialEq)]
pub struct MarketData {
    pub snapshot: MarketSnapshot,
    pub coins: Vec<CoinRecord>,
    /// Devise dans laquelle les prix des pièces ont été demandés
    pub currency: String,
}
