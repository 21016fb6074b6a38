use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub negotiation: NegotiationConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Upper bound on request body size, enforced before codecs run
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Content-negotiation defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NegotiationConfig {
    /// Concrete media type substituted when negotiation ends on a bare
    /// wildcard
    #[serde(default = "default_fallback_media_type")]
    pub fallback_media_type: String,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            fallback_media_type: default_fallback_media_type(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("static default address")
}

fn default_max_body_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_fallback_media_type() -> String {
    "application/octet-stream".to_string()
}
