// ============================================================================
// Module : refresh
// ============================================================================
// Orchestrateur de rafraîchissement : machine à états Idle -> Loading ->
// {Ready, Failed}, alimentée par un enum de déclencheurs
//
// CONCEPTS RUST :
// 1. State machine avec enum : un seul état actif, transitions explicites
// 2. Une seule fonction de transition (handle) pour tous les déclencheurs
// 3. Horloge virtuelle : le timer est une échéance (next_tick_ms) comparée
//    à un `now_ms` fourni par l'appelant -> testable sans vrai timer
// 4. Numéro de séquence : un résultat dépassé par une requête plus récente
//    est ignoré
//
// L'orchestrateur ne fait aucun I/O : il décide QUAND charger (RefreshRequest)
// et applique le résultat (complete). Le worker exécute la requête.
// ============================================================================

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::{load_market, DataClient, Transport};
use crate::error::ApiError;
use crate::models::MarketData;
use crate::view::ViewState;

// ============================================================================
// Déclencheurs, états, requêtes
// ============================================================================

/// Événements qui peuvent lancer un chargement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Premier chargement au démarrage
    InitialLoad,
    /// L'utilisateur demande "rafraîchir maintenant" (vide le cache)
    ManualRefresh,
    /// L'utilisateur relance après une erreur (respecte le cache)
    Retry,
    /// Échéance du timer périodique
    TimerTick,
    /// La vue devient visible (focus terminal) ou cachée
    VisibilityChanged { visible: bool },
    /// Retour du réseau (recharge en respectant le cache)
    NetworkOnline,
    NetworkOffline,
    /// La devise a changé dans ViewState
    CurrencyChanged,
}

impl Trigger {
    /// Refresh manuel, timer et retour de visibilité contournent le cache
    pub fn busts_cache(&self) -> bool {
        matches!(
            self,
            Trigger::ManualRefresh | Trigger::TimerTick | Trigger::VisibilityChanged { .. }
        )
    }
}

/// État de chargement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed(ApiError),
}

/// Ordre de chargement émis par l'orchestrateur, exécuté par le worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    pub seq: u64,
    pub trigger: Trigger,
    pub currency: String,
    pub limit: usize,
    pub bust_cache: bool,
}

/// Paramètres du rafraîchissement (issus de Config)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    pub interval: Duration,
    pub limit: usize,
    pub auto_refresh: bool,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(120_000),
            limit: 100,
            auto_refresh: true,
        }
    }
}

/// Ce que la surface de rendu doit savoir pour le spinner et les bannières
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshStatus {
    pub loading: bool,
    pub error: Option<ApiError>,
    pub offline: bool,
    pub auto_refresh: bool,
    pub last_updated_ms: Option<i64>,
}

// ============================================================================
// RefreshOrchestrator
// ============================================================================

pub struct RefreshOrchestrator {
    state: LoadState,
    settings: RefreshSettings,
    /// Séquence de la dernière requête émise
    seq: u64,
    visible: bool,
    online: bool,
    offline_notice: bool,
    auto_refresh: bool,
    next_tick_ms: i64,
    last_updated_ms: Option<i64>,
}

impl RefreshOrchestrator {
    /// Crée l'orchestrateur en Idle ; le premier tick tombe à now + interval
    pub fn new(settings: RefreshSettings, now_ms: i64) -> Self {
        Self {
            state: LoadState::Idle,
            settings,
            seq: 0,
            visible: true,
            online: true,
            offline_notice: false,
            auto_refresh: settings.auto_refresh,
            next_tick_ms: now_ms.saturating_add(millis(settings.interval)),
            last_updated_ms: None,
        }
    }

    /// Fonction de transition unique
    ///
    /// Retourne Some(request) si le déclencheur lance un chargement
    /// (Idle/Ready/Failed/Loading -> Loading), None sinon.
    pub fn handle(
        &mut self,
        trigger: Trigger,
        view: &ViewState,
        now_ms: i64,
    ) -> Option<RefreshRequest> {
        match trigger {
            Trigger::TimerTick => {
                if !self.visible || !self.auto_refresh {
                    debug!(
                        visible = self.visible,
                        auto_refresh = self.auto_refresh,
                        "Timer tick suppressed"
                    );
                    return None;
                }
            }

            Trigger::VisibilityChanged { visible } => {
                let was_visible = self.visible;
                self.visible = visible;
                if !visible || was_visible {
                    debug!(visible, "Visibility changed without refresh");
                    return None;
                }
                // Reprise : le timer repart de maintenant
                self.restart_timer(now_ms);
            }

            Trigger::NetworkOffline => {
                warn!("Network went offline");
                self.online = false;
                self.offline_notice = true;
                return None;
            }

            Trigger::NetworkOnline => {
                let was_online = self.online;
                self.online = true;
                self.offline_notice = false;
                if was_online {
                    return None;
                }
                info!("Network back online");
            }

            Trigger::InitialLoad
            | Trigger::ManualRefresh
            | Trigger::Retry
            | Trigger::CurrencyChanged => {}
        }

        Some(self.begin(trigger, view))
    }

    /// Vérifie l'échéance du timer périodique
    ///
    /// CONCEPT : pas de rattrapage
    /// - Si plusieurs intervalles sont passés (machine en veille), un seul tick
    pub fn poll_timer(&mut self, view: &ViewState, now_ms: i64) -> Option<RefreshRequest> {
        if now_ms < self.next_tick_ms {
            return None;
        }

        self.restart_timer(now_ms);
        self.handle(Trigger::TimerTick, view, now_ms)
    }

    /// Applique le résultat d'une requête
    ///
    /// - Séquence dépassée : ignoré, retourne false
    /// - Ok : pièces + snapshot remplacés ensemble -> Ready
    /// - Err : rien n'est appliqué -> Failed(err)
    pub fn complete(
        &mut self,
        seq: u64,
        result: Result<MarketData, ApiError>,
        view: &mut ViewState,
        now_ms: i64,
    ) -> bool {
        if seq != self.seq {
            debug!(seq, latest = self.seq, "Discarding superseded result");
            return false;
        }

        match result {
            Ok(data) => {
                info!(seq, coins = data.coins.len(), "Market data applied");
                view.apply_market(data);
                self.state = LoadState::Ready;
                self.last_updated_ms = Some(now_ms);
            }
            Err(e) => {
                warn!(seq, error = %e, "Refresh cycle failed");
                self.state = LoadState::Failed(e);
            }
        }

        true
    }

    /// Active/désactive le rafraîchissement automatique
    pub fn set_auto_refresh(&mut self, enabled: bool) {
        info!(enabled, "Auto-refresh toggled");
        self.auto_refresh = enabled;
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub fn last_updated_ms(&self) -> Option<i64> {
        self.last_updated_ms
    }

    pub fn status(&self) -> RefreshStatus {
        RefreshStatus {
            loading: self.is_loading(),
            error: match &self.state {
                LoadState::Failed(e) => Some(e.clone()),
                _ => None,
            },
            offline: self.offline_notice,
            auto_refresh: self.auto_refresh,
            last_updated_ms: self.last_updated_ms,
        }
    }

    fn begin(&mut self, trigger: Trigger, view: &ViewState) -> RefreshRequest {
        self.seq += 1;
        self.state = LoadState::Loading;

        let request = RefreshRequest {
            seq: self.seq,
            trigger,
            currency: view.currency().to_string(),
            limit: self.settings.limit,
            bust_cache: trigger.busts_cache(),
        };
        debug!(?request, "Refresh started");
        request
    }

    fn restart_timer(&mut self, now_ms: i64) {
        self.next_tick_ms = now_ms.saturating_add(millis(self.settings.interval));
    }
}

/// Durée en ms, saturée à i64::MAX
fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Exécute une requête : cache-bust éventuel puis les deux appels en parallèle
pub async fn execute<T: Transport>(
    client: &DataClient<T>,
    request: &RefreshRequest,
) -> Result<MarketData, ApiError> {
    if request.bust_cache {
        client.clear_cache();
    }
    load_market(client, &request.currency, request.limit).await
}

// ============================================================================
// Tests unitaires
// ============================================================================
