// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod events;    // Gestion des événements clavier et du focus
pub mod dashboard; // Rendu de l'interface principale
pub mod surface;   // Frontière moteur / affichage (RenderSurface)

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{Event, EventHandler};
pub use surface::{DashboardSurface, MarketFrame, RenderSurface};
