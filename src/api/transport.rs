// ============================================================================
// Transport HTTP
// ============================================================================
// Seam entre le client de données et le réseau
//
// CONCEPTS RUST :
// 1. async-trait : méthodes async dans un trait (object-safe, Send)
// 2. Le client de données est générique sur Transport
//    -> en production : ReqwestTransport
//    -> en test : un transport scripté, sans réseau
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::ApiError;

/// User-Agent envoyé à l'API
pub const USER_AGENT: &str = concat!("coinwatch/", env!("CARGO_PKG_VERSION"));

/// Réponse HTTP brute : statut + corps texte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 200-299
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Effectue un GET et renvoie la réponse, quel que soit son statut
///
/// Seuls les échecs de transport (DNS, timeout, hors ligne) sont des Err ici ;
/// l'interprétation du statut appartient au client de données.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, ApiError>;
}

/// Transport réel basé sur reqwest
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Crée le client HTTP avec timeout et User-Agent
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self))]
    async fn get(&self, url: &str) -> Result<HttpResponse, ApiError> {
        debug!("Sending HTTP request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        debug!(status, "Received HTTP response");

        // CONCEPT : un corps illisible est un échec de transport
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}
