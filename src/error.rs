// ============================================================================
// Module : error
// ============================================================================
// Erreurs typées de la bibliothèque
//
// CONCEPT RUST : thiserror
// - #[derive(Error)] implémente std::error::Error automatiquement
// - #[error("...")] génère l'implémentation de Display
// - Le binaire (main.rs) continue d'utiliser anyhow pour le contexte
// ============================================================================

use thiserror::Error;

/// Erreurs du client de données (réseau, HTTP, schéma JSON)
///
/// CONCEPT RUST : Clone sur une erreur
/// - reqwest::Error n'est pas Clone, on stocke donc son message
/// - Permet à l'orchestrateur de garder l'erreur dans LoadState::Failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Échec du transport (DNS, timeout, connexion refusée, hors ligne)
    #[error("network error: {0}")]
    Network(String),

    /// Le serveur a répondu avec un statut non-2xx
    #[error("HTTP error! status: {status}")]
    Fetch { status: u16 },

    /// La réponse JSON ne correspond pas au schéma attendu
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// Statut HTTP si l'erreur vient du serveur
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Fetch { status } => Some(*status),
            _ => None,
        }
    }
}

/// Erreurs de chargement ou de validation de la configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported currency '{0}'")]
    UnsupportedCurrency(String),

    #[error("limit must be between 1 and {max}, got {value}")]
    LimitOutOfRange { value: usize, max: usize },

    #[error("{name} must be between {min} and {max}, got {value}")]
    IntervalOutOfRange {
        name: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_carries_status() {
        let err = ApiError::Fetch { status: 500 };
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "HTTP error! status: 500");
        assert_eq!(ApiError::Network("offline".into()).status(), None);
    }
}
