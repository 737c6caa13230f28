//! Connection context: cluster selection and the two remote channel endpoints.
//!
//! The context is immutable once built. A process-wide instance, resolved from
//! the environment on first use, is available through [`ConnectionContext::global`].

use crate::network::{
    CLUSTER_ENV, DEVNET_RPC_URL, DEVNET_WS_URL, MAINNET_RPC_URL, MAINNET_WS_URL,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Cluster ─────────────────────────────────────────────────────────────────

/// Ledger cluster the dashboard talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Cluster {
    #[serde(rename = "mainnet-beta")]
    MainnetBeta,
    #[default]
    #[serde(rename = "devnet")]
    Devnet,
}

impl Cluster {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Devnet => "devnet",
        }
    }

    /// Default request/response endpoint.
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => MAINNET_RPC_URL,
            Cluster::Devnet => DEVNET_RPC_URL,
        }
    }

    /// Default push-subscription endpoint.
    pub fn ws_url(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => MAINNET_WS_URL,
            Cluster::Devnet => DEVNET_WS_URL,
        }
    }

    /// Read the cluster from `MANGO_CLUSTER`, falling back to devnet.
    pub fn from_env() -> Self {
        match std::env::var(CLUSTER_ENV) {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Unknown cluster, using devnet");
                Cluster::Devnet
            }),
            Err(_) => Cluster::Devnet,
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cluster {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mainnet-beta" | "mainnet" => Ok(Cluster::MainnetBeta),
            "devnet" => Ok(Cluster::Devnet),
            other => Err(format!("unknown cluster: {}", other)),
        }
    }
}

// ─── ConnectionContext ───────────────────────────────────────────────────────

/// Configuration for both channels to the remote ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionContext {
    cluster: Cluster,
    primary_endpoint: String,
    push_endpoint: String,
}

lazy_static::lazy_static! {
    static ref GLOBAL_CONTEXT: ConnectionContext = ConnectionContext::from_env();
}

impl ConnectionContext {
    pub fn builder() -> ConnectionContextBuilder {
        ConnectionContextBuilder::default()
    }

    /// Context for the given cluster's default endpoints.
    pub fn for_cluster(cluster: Cluster) -> Self {
        Self {
            cluster,
            primary_endpoint: cluster.rpc_url().to_string(),
            push_endpoint: cluster.ws_url().to_string(),
        }
    }

    pub fn from_env() -> Self {
        let ctx = Self::for_cluster(Cluster::from_env());
        tracing::info!(
            cluster = %ctx.cluster,
            endpoint = %ctx.primary_endpoint,
            "Resolved connection context"
        );
        ctx
    }

    /// Process-wide context, resolved from the environment on first access.
    pub fn global() -> &'static ConnectionContext {
        &GLOBAL_CONTEXT
    }

    pub fn cluster(&self) -> Cluster {
        self.cluster
    }

    pub fn primary_endpoint(&self) -> &str {
        &self.primary_endpoint
    }

    pub fn push_endpoint(&self) -> &str {
        &self.push_endpoint
    }
}

impl Default for ConnectionContext {
    fn default() -> Self {
        Self::for_cluster(Cluster::default())
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct ConnectionContextBuilder {
    cluster: Option<Cluster>,
    primary_endpoint: Option<String>,
    push_endpoint: Option<String>,
}

impl ConnectionContextBuilder {
    pub fn cluster(mut self, cluster: Cluster) -> Self {
        self.cluster = Some(cluster);
        self
    }

    pub fn primary_endpoint(mut self, url: &str) -> Self {
        self.primary_endpoint = Some(url.to_string());
        self
    }

    pub fn push_endpoint(mut self, url: &str) -> Self {
        self.push_endpoint = Some(url.to_string());
        self
    }

    pub fn build(self) -> ConnectionContext {
        let cluster = self.cluster.unwrap_or_default();
        ConnectionContext {
            cluster,
            primary_endpoint: self
                .primary_endpoint
                .unwrap_or_else(|| cluster.rpc_url().to_string()),
            push_endpoint: self
                .push_endpoint
                .unwrap_or_else(|| cluster.ws_url().to_string()),
        }
    }
}
