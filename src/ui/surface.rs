// ============================================================================
// Surface de rendu
// ============================================================================
// Frontière entre le moteur (ViewState + orchestrateur) et l'affichage
//
// CONCEPTS RUST :
// 1. Trait : le moteur ne connaît pas ratatui, seulement RenderSurface
// 2. DashboardSurface : implémentation qui garde la dernière image pour le
//    prochain terminal.draw()
// 3. En test : une surface qui enregistre les appels
// ============================================================================

use crate::models::SnapshotDisplay;
use crate::refresh::{RefreshOrchestrator, RefreshStatus};
use crate::view::{CoinRow, SortSpec, ViewState};

/// Largeur (en caractères) de la sparkline 7 jours
pub const SPARKLINE_WIDTH: usize = 16;

/// Tout ce qu'il faut pour dessiner le tableau et le header
#[derive(Debug, Clone, PartialEq)]
pub struct MarketFrame {
    /// Projection filtrée + triée, déjà formatée
    pub rows: Vec<CoinRow>,
    pub snapshot: Option<SnapshotDisplay>,
    pub sort: SortSpec,
    pub currency: String,
    pub filter: String,
    /// Taille du jeu complet (pour "12 / 100")
    pub total: usize,
}

impl MarketFrame {
    pub fn from_view(view: &ViewState, sparkline_width: usize) -> Self {
        Self {
            rows: view.rows(sparkline_width),
            snapshot: view.snapshot().map(|s| s.display()),
            sort: view.sort(),
            currency: view.currency().to_string(),
            filter: view.filter_text().to_string(),
            total: view.all_coins().len(),
        }
    }
}

/// Reçoit les données à afficher et les transitions de chargement/erreur
pub trait RenderSurface {
    fn render_market(&mut self, frame: MarketFrame);
    fn render_status(&mut self, status: &RefreshStatus);
}

/// Pousse la projection courante et le statut vers la surface
pub fn publish<S: RenderSurface>(
    view: &ViewState,
    orchestrator: &RefreshOrchestrator,
    surface: &mut S,
) {
    surface.render_market(MarketFrame::from_view(view, SPARKLINE_WIDTH));
    surface.render_status(&orchestrator.status());
}

/// Surface du dashboard TUI : garde la dernière image reçue
#[derive(Debug, Clone)]
pub struct DashboardSurface {
    pub frame: Option<MarketFrame>,
    pub status: RefreshStatus,
}

impl DashboardSurface {
    pub fn new() -> Self {
        Self {
            frame: None,
            status: RefreshStatus {
                loading: false,
                error: None,
                offline: false,
                auto_refresh: true,
                last_updated_ms: None,
            },
        }
    }

    /// Nombre de lignes actuellement affichées
    pub fn row_count(&self) -> usize {
        self.frame.as_ref().map(|f| f.rows.len()).unwrap_or(0)
    }
}

impl Default for DashboardSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for DashboardSurface {
    fn render_market(&mut self, frame: MarketFrame) {
        self.frame = Some(frame);
    }

    fn render_status(&mut self, status: &RefreshStatus) {
        self.status = status.clone();
    }
}
