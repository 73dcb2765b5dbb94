// ============================================================================
// Module : config
// ============================================================================
// Configuration de l'application
//
// Ordre de résolution :
// 1. Valeurs par défaut (Config::default)
// 2. Fichier JSON optionnel : ~/.config/coinwatch/config.json (Linux)
// 3. Variables d'environnement COINWATCH_*
//
// CONCEPTS RUST :
// 1. #[serde(default)] : les champs absents du fichier gardent leur défaut
// 2. Validation explicite : une devise non supportée est refusée au démarrage
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::DEFAULT_BASE_URL;
use crate::error::ConfigError;
use crate::refresh::RefreshSettings;

/// Devises acceptées par /coins/markets (vs_currency) et proposées dans l'UI
pub const SUPPORTED_CURRENCIES: [&str; 10] =
    ["usd", "eur", "gbp", "jpy", "aud", "cad", "chf", "inr", "btc", "eth"];

/// per_page maximum accepté par CoinGecko
pub const MAX_LIMIT: usize = 250;

/// Plus petit intervalle de rafraîchissement (API publique limitée en débit)
pub const MIN_REFRESH_INTERVAL_MS: u64 = 10_000;

/// Plus petit intervalle entre deux tests de connectivité
pub const MIN_PROBE_INTERVAL_MS: u64 = 1_000;

/// Borne haute commune des durées en ms (24 h)
pub const MAX_INTERVAL_MS: u64 = 86_400_000;

/// Timeout HTTP maximum (s)
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Configuration complète
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL de base de l'API (sans "/" final)
    pub api_base_url: String,

    /// Devise initiale (code en minuscules, ex: "usd")
    pub currency: String,

    /// Devises parcourues avec la touche 'c'
    pub currencies: Vec<String>,

    /// Nombre de pièces du classement
    pub limit: usize,

    /// Durée de validité du cache (ms)
    pub cache_window_ms: u64,

    /// Intervalle du rafraîchissement automatique (ms)
    pub refresh_interval_ms: u64,

    pub auto_refresh: bool,

    pub request_timeout_secs: u64,

    /// Intervalle entre deux tests de connectivité (ms)
    pub probe_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            currency: "usd".to_string(),
            currencies: ["usd", "eur", "gbp", "jpy", "btc"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            limit: 100,
            cache_window_ms: 60_000,
            refresh_interval_ms: 120_000,
            auto_refresh: true,
            request_timeout_secs: 10,
            probe_interval_ms: 15_000,
        }
    }
}

impl Config {
    /// Chemin du fichier de configuration par défaut
    ///
    /// - Linux : ~/.config/coinwatch/config.json
    /// - macOS : ~/Library/Application Support/coinwatch/config.json
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("coinwatch").join("config.json"))
    }

    /// Charge défauts + fichier (s'il existe) + environnement, puis valide
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;

        info!(currency = %config.currency, limit = config.limit, "Configuration loaded");
        Ok(config)
    }

    /// Lit un fichier JSON (les champs absents prennent leur valeur par défaut)
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Applique les surcharges COINWATCH_*
    ///
    /// CONCEPT RUST : closure en paramètre
    /// - `lookup` remplace std::env::var, ce qui rend la fonction testable
    ///   sans modifier l'environnement du process
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("COINWATCH_API_URL") {
            self.api_base_url = url;
        }

        if let Some(currency) = lookup("COINWATCH_CURRENCY") {
            self.currency = currency.trim().to_lowercase();
        }

        if let Some(limit) = lookup("COINWATCH_LIMIT") {
            self.limit = limit.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: "COINWATCH_LIMIT",
                value: limit.clone(),
            })?;
        }

        if let Some(flag) = lookup("COINWATCH_AUTO_REFRESH") {
            self.auto_refresh = match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        name: "COINWATCH_AUTO_REFRESH",
                        value: flag,
                    })
                }
            };
        }

        Ok(())
    }

    /// Vérifie devise(s), limite et durées
    pub fn validate(&self) -> Result<(), ConfigError> {
        let currencies = std::iter::once(&self.currency).chain(self.currencies.iter());
        for currency in currencies {
            if !is_supported_currency(currency) {
                return Err(ConfigError::UnsupportedCurrency(currency.clone()));
            }
        }

        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(ConfigError::LimitOutOfRange {
                value: self.limit,
                max: MAX_LIMIT,
            });
        }

        // (nom, valeur, min, max)
        let intervals = [
            (
                "refresh_interval_ms",
                self.refresh_interval_ms,
                MIN_REFRESH_INTERVAL_MS,
                MAX_INTERVAL_MS,
            ),
            (
                "probe_interval_ms",
                self.probe_interval_ms,
                MIN_PROBE_INTERVAL_MS,
                MAX_INTERVAL_MS,
            ),
            ("cache_window_ms", self.cache_window_ms, 0, MAX_INTERVAL_MS),
            (
                "request_timeout_secs",
                self.request_timeout_secs,
                1,
                MAX_REQUEST_TIMEOUT_SECS,
            ),
        ];
        for (name, value, min, max) in intervals {
            if !(min..=max).contains(&value) {
                return Err(ConfigError::IntervalOutOfRange { name, value, min, max });
            }
        }

        Ok(())
    }

    pub fn refresh_settings(&self) -> RefreshSettings {
        RefreshSettings {
            interval: Duration::from_millis(self.refresh_interval_ms),
            limit: self.limit,
            auto_refresh: self.auto_refresh,
        }
    }

    pub fn cache_window(&self) -> Duration {
        Duration::from_millis(self.cache_window_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Devise suivante dans la liste de cycle (la première si inconnue)
    pub fn next_currency(&self, current: &str) -> String {
        let position = self.currencies.iter().position(|c| c == current);
        let next = match position {
            Some(index) => (index + 1) % self.currencies.len(),
            None => 0,
        };

        self.currencies
            .get(next)
            .cloned()
            .unwrap_or_else(|| current.to_string())
    }
}

/// Vrai si l'API accepte ce code de devise
pub fn is_supported_currency(code: &str) -> bool {
    SUPPORTED_CURRENCIES.contains(&code)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_window(), Duration::from_secs(60));
        assert_eq!(config.refresh_settings().interval, Duration::from_secs(120));
        assert_eq!(config.refresh_settings().limit, 100);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{"currency":"eur","limit":50}"#).unwrap();
        assert_eq!(config.currency, "eur");
        assert_eq!(config.limit, 50);
        assert_eq!(config.refresh_interval_ms, 120_000);
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("COINWATCH_CURRENCY", " GBP "),
                ("COINWATCH_LIMIT", "25"),
                ("COINWATCH_AUTO_REFRESH", "off"),
            ]))
            .unwrap();

        assert_eq!(config.currency, "gbp");
        assert_eq!(config.limit, 25);
        assert!(!config.auto_refresh);
    }

    #[test]
    fn test_invalid_env_values() {
        let mut config = Config::default();
        assert!(matches!(
            config.apply_env(env(&[("COINWATCH_LIMIT", "many")])),
            Err(ConfigError::InvalidEnv { name: "COINWATCH_LIMIT", .. })
        ));
        assert!(config.apply_env(env(&[("COINWATCH_AUTO_REFRESH", "maybe")])).is_err());
    }

    #[test]
    fn test_validation_rejects_unsupported_currency_and_limit() {
        let mut config = Config {
            currency: "doge".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedCurrency(c)) if c == "doge"
        ));

        config.currency = "usd".to_string();
        config.limit = 0;
        assert!(matches!(config.validate(), Err(ConfigError::LimitOutOfRange { .. })));

        config.limit = 251;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_intervals() {
        let config = Config {
            refresh_interval_ms: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IntervalOutOfRange { name: "refresh_interval_ms", value: 0, .. })
        ));

        let config = Config {
            probe_interval_ms: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IntervalOutOfRange { name: "probe_interval_ms", .. })
        ));

        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            cache_window_ms: 0,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_huge_intervals() {
        let config = Config {
            refresh_interval_ms: u64::MAX,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IntervalOutOfRange { name: "refresh_interval_ms", .. })
        ));

        let config = Config {
            cache_window_ms: MAX_INTERVAL_MS + 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_next_currency_cycles() {
        let config = Config::default();
        assert_eq!(config.next_currency("usd"), "eur");
        assert_eq!(config.next_currency("btc"), "usd");
        assert_eq!(config.next_currency("chf"), "usd");
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let file_name = format!("coinwatch-config-{}.json", std::process::id());
        let path = std::env::temp_dir().join(file_name);
        std::fs::write(&path, "{ not json").unwrap();

        let result = Config::from_file(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
