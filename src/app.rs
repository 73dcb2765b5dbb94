// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Composition : App possède le ViewState, l'orchestrateur et la surface
//
// PATTERN : "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Les méthodes qui déclenchent un chargement retournent la requête :
//   c'est main.rs qui l'envoie au worker (App ne connaît pas le réseau)
// ============================================================================

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::Clock;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::MarketData;
use crate::refresh::{RefreshOrchestrator, RefreshRequest, Trigger};
use crate::ui::surface::{self, DashboardSurface};
use crate::view::{CoinRow, SortField, ViewState};

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : tableau des cryptos
    Dashboard,

    /// Mode recherche : chaque touche met à jour le filtre
    /// CONCEPT : Modal input mode (Vim-like)
    /// - Enter garde le filtre, ESC l'efface
    Search,
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Two-step quit : première pression de 'q' -> true
    pub confirm_quit: bool,

    pub current_screen: Screen,

    /// Index de la ligne sélectionnée dans la projection
    pub selected_index: usize,

    view: ViewState,
    orchestrator: RefreshOrchestrator,
    surface: DashboardSurface,
    config: Config,
    clock: Arc<dyn Clock>,
}

impl App {
    /// Crée l'application à partir de la configuration validée
    pub fn new(config: Config, clock: Arc<dyn Clock>) -> Self {
        let view = ViewState::new(config.currency.clone());
        let orchestrator = RefreshOrchestrator::new(config.refresh_settings(), clock.now_ms());

        let mut app = Self {
            running: true,
            confirm_quit: false,
            current_screen: Screen::Dashboard,
            selected_index: 0,
            view,
            orchestrator,
            surface: DashboardSurface::new(),
            config,
            clock,
        };
        app.publish();
        app
    }

    // ========================================================================
    // Cycle de rafraîchissement
    // ========================================================================

    /// Passe un déclencheur à l'orchestrateur puis republie l'état
    pub fn trigger(&mut self, trigger: Trigger) -> Option<RefreshRequest> {
        let request = self.orchestrator.handle(trigger, &self.view, self.clock.now_ms());
        self.publish();
        request
    }

    /// Premier chargement (respecte le cache)
    pub fn start(&mut self) -> Option<RefreshRequest> {
        self.trigger(Trigger::InitialLoad)
    }

    /// 'r' : vide le cache et recharge
    pub fn manual_refresh(&mut self) -> Option<RefreshRequest> {
        self.trigger(Trigger::ManualRefresh)
    }

    /// 'R' : relance après une erreur, sans effet sinon
    pub fn retry(&mut self) -> Option<RefreshRequest> {
        if self.last_error().is_none() {
            debug!("Retry ignored: no error to recover from");
            return None;
        }
        self.trigger(Trigger::Retry)
    }

    /// Focus du terminal gagné/perdu
    pub fn set_visible(&mut self, visible: bool) -> Option<RefreshRequest> {
        self.trigger(Trigger::VisibilityChanged { visible })
    }

    /// Résultat du test de connectivité
    pub fn set_online(&mut self, online: bool) -> Option<RefreshRequest> {
        let trigger = if online {
            Trigger::NetworkOnline
        } else {
            Trigger::NetworkOffline
        };
        self.trigger(trigger)
    }

    /// Vérifie l'échéance du timer (appelé à chaque tour de boucle)
    pub fn poll_timer(&mut self) -> Option<RefreshRequest> {
        let request = self.orchestrator.poll_timer(&self.view, self.clock.now_ms());
        if request.is_some() {
            self.publish();
        }
        request
    }

    /// Applique le résultat renvoyé par le worker
    ///
    /// Retourne false si le résultat était dépassé (ignoré)
    pub fn apply_result(&mut self, seq: u64, result: Result<MarketData, ApiError>) -> bool {
        let applied = self
            .orchestrator
            .complete(seq, result, &mut self.view, self.clock.now_ms());
        if applied {
            self.clamp_selection();
            self.publish();
        }
        applied
    }

    // ========================================================================
    // Actions utilisateur sur la vue
    // ========================================================================

    /// Touches 1 à 6 : même colonne -> inverse, autre colonne -> décroissant
    pub fn sort_by(&mut self, field: SortField) {
        self.view.set_sort(field);
        self.selected_index = 0;
        self.publish();
    }

    /// 'c' : devise suivante, rechargement immédiat
    pub fn cycle_currency(&mut self) -> Option<RefreshRequest> {
        let next = self.config.next_currency(self.view.currency());
        if next == self.view.currency() {
            return None;
        }

        info!(currency = %next, "Currency changed");
        self.view.set_currency(next);
        self.trigger(Trigger::CurrencyChanged)
    }

    /// 'a' : active/désactive le rafraîchissement automatique
    pub fn toggle_auto_refresh(&mut self) {
        let enabled = !self.orchestrator.auto_refresh();
        self.orchestrator.set_auto_refresh(enabled);
        self.publish();
    }

    // ========================================================================
    // Recherche (filtre en direct)
    // ========================================================================

    pub fn start_search(&mut self) {
        self.current_screen = Screen::Search;
    }

    pub fn search_push(&mut self, c: char) {
        let mut text = self.view.filter_text().to_string();
        text.push(c);
        self.update_filter(text);
    }

    pub fn search_backspace(&mut self) {
        let mut text = self.view.filter_text().to_string();
        text.pop();
        self.update_filter(text);
    }

    /// Enter : garde le filtre et revient au tableau
    pub fn submit_search(&mut self) {
        self.current_screen = Screen::Dashboard;
    }

    /// ESC : efface le filtre
    pub fn cancel_search(&mut self) {
        self.current_screen = Screen::Dashboard;
        self.update_filter(String::new());
    }

    pub fn is_searching(&self) -> bool {
        self.current_screen == Screen::Search
    }

    fn update_filter(&mut self, text: String) {
        self.view.set_filter(text);
        self.selected_index = 0;
        self.publish();
    }

    // ========================================================================
    // Navigation et quit
    // ========================================================================

    /// CONCEPT RUST : saturating_sub() évite l'underflow des usize
    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn navigate_down(&mut self) {
        let max_index = self.surface.row_count().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    /// Ligne sélectionnée dans la dernière image publiée
    pub fn selected_row(&self) -> Option<&CoinRow> {
        self.surface.frame.as_ref()?.rows.get(self.selected_index)
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    // ========================================================================
    // Accès en lecture pour le rendu
    // ========================================================================

    pub fn surface(&self) -> &DashboardSurface {
        &self.surface
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.surface.status.error.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn publish(&mut self) {
        surface::publish(&self.view, &self.orchestrator, &mut self.surface);
    }

    fn clamp_selection(&mut self) {
        let max_index = self.view.filtered_sorted().len().saturating_sub(1);
        self.selected_index = self.selected_index.min(max_index);
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cache::ManualClock;
    use crate::models::{CoinRecord, MarketSnapshot};

    fn market(names: &[&str]) -> MarketData {
        market_in("usd", names)
    }

    fn market_in(currency: &str, names: &[&str]) -> MarketData {
        MarketData {
            snapshot: MarketSnapshot {
                total_market_cap_usd: 2e12,
                total_volume_usd: 8e10,
                btc_dominance_pct: 51.0,
            },
            coins: names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let mut coin = CoinRecord::new(name.to_lowercase(), *name, &name[..3]);
                    coin.rank = Some(i as u32 + 1);
                    coin.market_cap = Some(1e9 / (i as f64 + 1.0));
                    coin
                })
                .collect(),
            currency: currency.to_string(),
        }
    }

    fn app() -> (App, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let app = App::new(Config::default(), clock.clone());
        (app, clock)
    }

    fn loaded_app() -> (App, Arc<ManualClock>) {
        let (mut app, clock) = app();
        let request = app.start().unwrap();
        assert!(app.apply_result(request.seq, Ok(market(&["Bitcoin", "Ethereum", "Solana"]))));
        (app, clock)
    }

    #[test]
    fn test_app_creation() {
        let (app, _) = app();
        assert!(app.is_running());
        assert_eq!(app.current_screen, Screen::Dashboard);
        assert_eq!(app.surface().row_count(), 0);
        assert!(!app.surface().status.loading);
    }

    #[test]
    fn test_start_then_apply_result() {
        let (mut app, clock) = app();
        let request = app.start().unwrap();
        assert!(app.surface().status.loading);
        assert!(!request.bust_cache);

        clock.advance(Duration::from_millis(300));
        assert!(app.apply_result(request.seq, Ok(market(&["Bitcoin", "Ethereum"]))));
        assert_eq!(app.surface().row_count(), 2);
        assert_eq!(app.surface().status.last_updated_ms, Some(300));
    }

    #[test]
    fn test_retry_only_after_error() {
        let (mut app, _) = loaded_app();
        assert!(app.retry().is_none());

        let request = app.manual_refresh().unwrap();
        assert!(request.bust_cache);
        app.apply_result(request.seq, Err(ApiError::Fetch { status: 500 }));
        assert_eq!(app.last_error(), Some(&ApiError::Fetch { status: 500 }));
        assert_eq!(app.surface().row_count(), 3);

        let retry = app.retry().unwrap();
        assert_eq!(retry.trigger, Trigger::Retry);
        assert!(!retry.bust_cache);
    }

    #[test]
    fn test_cycle_currency_requests_reload() {
        let (mut app, _) = loaded_app();
        let request = app.cycle_currency().unwrap();
        assert_eq!(request.currency, "eur");
        assert_eq!(request.trigger, Trigger::CurrencyChanged);
        assert_eq!(app.view().currency(), "eur");
    }

    #[test]
    fn test_prices_keep_their_currency_until_new_data_arrives() {
        let (mut app, _) = app();
        let request = app.start().unwrap();
        let mut data = market(&["Bitcoin"]);
        data.coins[0].current_price = 60_000.0;
        app.apply_result(request.seq, Ok(data));
        assert_eq!(app.selected_row().unwrap().price, "$60,000.00");

        let request = app.cycle_currency().unwrap();
        assert_eq!(app.view().currency(), "eur");
        assert_eq!(app.selected_row().unwrap().price, "$60,000.00");

        app.apply_result(request.seq, Err(ApiError::Fetch { status: 500 }));
        assert_eq!(app.selected_row().unwrap().price, "$60,000.00");
        assert_eq!(app.view().data_currency(), "usd");

        let retry = app.retry().unwrap();
        assert_eq!(retry.currency, "eur");
        let mut data = market_in("eur", &["Bitcoin"]);
        data.coins[0].current_price = 55_000.0;
        app.apply_result(retry.seq, Ok(data));
        assert_eq!(app.selected_row().unwrap().price, "€55,000.00");
    }

    #[test]
    fn test_superseded_result_is_ignored() {
        let (mut app, _) = loaded_app();
        let first = app.cycle_currency().unwrap();
        let second = app.cycle_currency().unwrap();

        assert!(!app.apply_result(first.seq, Ok(market(&["Stale"]))));
        assert!(app.apply_result(second.seq, Ok(market(&["Bitcoin"]))));
        assert_eq!(app.surface().row_count(), 1);
    }

    #[test]
    fn test_search_filters_live_and_escape_clears() {
        let (mut app, _) = loaded_app();
        app.start_search();
        assert!(app.is_searching());

        for c in "eth".chars() {
            app.search_push(c);
        }
        assert_eq!(app.surface().row_count(), 1);
        assert_eq!(app.selected_row().unwrap().name, "Ethereum");

        app.search_backspace();
        app.search_backspace();
        app.search_backspace();
        assert_eq!(app.surface().row_count(), 3);

        app.search_push('s');
        app.submit_search();
        assert!(!app.is_searching());
        assert_eq!(app.view().filter_text(), "s");

        app.start_search();
        app.cancel_search();
        assert_eq!(app.view().filter_text(), "");
        assert_eq!(app.surface().row_count(), 3);
    }

    #[test]
    fn test_sort_by_toggles_direction() {
        let (mut app, _) = loaded_app();
        app.sort_by(SortField::Name);
        assert_eq!(app.selected_row().unwrap().name, "Solana");

        app.sort_by(SortField::Name);
        assert_eq!(app.selected_row().unwrap().name, "Bitcoin");
    }

    #[test]
    fn test_navigation_is_clamped() {
        let (mut app, _) = loaded_app();
        app.navigate_up();
        assert_eq!(app.selected_index, 0);

        for _ in 0..10 {
            app.navigate_down();
        }
        assert_eq!(app.selected_index, 2);
    }

    #[test]
    fn test_timer_respects_auto_refresh_toggle() {
        let (mut app, clock) = loaded_app();
        app.toggle_auto_refresh();
        assert!(!app.surface().status.auto_refresh);

        clock.advance(Duration::from_secs(121));
        assert!(app.poll_timer().is_none());

        app.toggle_auto_refresh();
        clock.advance(Duration::from_secs(121));
        let request = app.poll_timer().unwrap();
        assert_eq!(request.trigger, Trigger::TimerTick);
    }

    #[test]
    fn test_focus_and_network_signals() {
        let (mut app, _) = loaded_app();
        assert!(app.set_visible(false).is_none());
        let request = app.set_visible(true).unwrap();
        assert!(request.bust_cache);

        assert!(app.set_online(false).is_none());
        assert!(app.surface().status.offline);
        let request = app.set_online(true).unwrap();
        assert!(!request.bust_cache);
        assert!(!app.surface().status.offline);
    }

    #[test]
    fn test_two_step_quit() {
        let (mut app, _) = app();
        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());
        app.cancel_quit();
        assert!(!app.is_awaiting_quit_confirmation());
        app.quit();
        assert!(!app.is_running());
    }
}
