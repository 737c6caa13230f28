//! Cluster endpoints and well-known routes.

/// Request/response RPC endpoint on mainnet.
pub const MAINNET_RPC_URL: &str = "https://mango.rpcpool.com/";

/// Push-subscription endpoint on mainnet.
pub const MAINNET_WS_URL: &str = "wss://mango.rpcpool.com/";

/// Request/response RPC endpoint on devnet.
pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";

/// Push-subscription endpoint on devnet.
pub const DEVNET_WS_URL: &str = "wss://api.devnet.solana.com";

/// Environment variable selecting the cluster.
pub const CLUSTER_ENV: &str = "MANGO_CLUSTER";

/// Group selected when nothing else is configured.
pub const DEFAULT_GROUP_NAME: &str = "merps_test_v1";

/// Route used when a market token cannot be resolved.
pub const DEFAULT_ROUTE: &str = "/";

/// Route used when an account token cannot be resolved.
pub const ACCOUNT_ROUTE: &str = "/account";
