// ============================================================================
// Module : cache
// ============================================================================
// Mémoïsation à fenêtre de temps, indexée par l'identité de la requête
//
// CONCEPTS RUST :
// 1. Generics : CacheStore<T> fonctionne pour n'importe quel T: Clone
// 2. Trait objects : Arc<dyn Clock> permet d'injecter une horloge virtuelle
// 3. Atomics : ManualClock partage son temps entre threads sans Mutex
//
// Une entrée expirée est logiquement absente : elle reste dans la HashMap
// jusqu'au prochain set() qui l'écrase (pas de nettoyage en arrière-plan).
// ============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

// ============================================================================
// Horloge injectable
// ============================================================================

/// Source de temps en millisecondes depuis l'epoch
///
/// CONCEPT : Virtual clock
/// - En production : SystemClock (heure réelle)
/// - En test : ManualClock (on avance le temps à la main)
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Horloge système (chrono)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Horloge manuelle : le temps n'avance que quand on appelle advance()
///
/// Clone partage le même compteur (Arc), ce qui permet de garder une poignée
/// dans le test pendant que le cache possède l'autre.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now
            .fetch_add(i64::try_from(by.as_millis()).unwrap_or(i64::MAX), Ordering::SeqCst);
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

// ============================================================================
// CacheEntry et CacheStore
// ============================================================================

/// Valeur mise en cache avec son instant de récupération
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at_ms: i64,
}

/// Cache clé -> valeur valide pendant `window`
pub struct CacheStore<T> {
    entries: HashMap<String, CacheEntry<T>>,
    window_ms: i64,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> CacheStore<T> {
    /// Crée un cache vide
    ///
    /// La fenêtre vaut au minimum 1 ms : un set() suivi d'un get() au même
    /// instant renvoie toujours la valeur écrite.
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            window_ms: i64::try_from(window.as_millis()).unwrap_or(i64::MAX).max(1),
            clock,
        }
    }

    /// Retourne la valeur si elle est encore dans la fenêtre
    pub fn get(&self, key: &str) -> Option<T> {
        let entry = self.entries.get(key)?;
        let elapsed = self.clock.now_ms() - entry.fetched_at_ms;

        if elapsed < self.window_ms {
            trace!(key, elapsed_ms = elapsed, "Cache hit");
            Some(entry.value.clone())
        } else {
            trace!(key, elapsed_ms = elapsed, "Cache entry expired");
            None
        }
    }

    /// Écrit (ou écrase) la valeur pour cette clé, horodatée maintenant
    pub fn set(&mut self, key: impl Into<String>, value: T) {
        let fetched_at_ms = self.clock.now_ms();
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                fetched_at_ms,
            },
        );
    }

    /// Vide tout le cache (refresh manuel)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms as u64)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
