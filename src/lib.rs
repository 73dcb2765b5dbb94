// ============================================================================
// CoinWatch - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;     // Client CoinGecko (transport + cache)
pub mod app;     // État de l'application
pub mod cache;   // Cache à fenêtre de validité + horloge injectable
pub mod config;  // Configuration (fichier + environnement)
pub mod error;   // Erreurs typées
pub mod format;  // Formatage des nombres, devises et sparklines
pub mod models;  // Structures de données
pub mod refresh; // Orchestrateur de rafraîchissement
pub mod ui;      // Interface utilisateur
pub mod view;    // Filtre + tri (projection)
