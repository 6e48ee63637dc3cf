//! Normalized Taproot-Assets result shapes.

use serde::{Deserialize, Serialize};

/// Normalized tapd daemon info; doubles as the readiness probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapdInfo {
    /// Daemon version string.
    pub version: String,
    /// Identity pubkey of the anchoring lnd node.
    pub lnd_identity_pubkey: String,
    /// Whether the daemon is synced to its anchoring lnd.
    pub synced_to_chain: bool,
}

/// Balance of one asset held by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    /// Asset id (hex).
    pub asset_id: String,
    /// Human-readable asset name chosen at mint time.
    pub name: String,
    /// Units held. Asset units are opaque integers, never satoshis.
    pub balance: u64,
}

/// Result of committing a mint batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintOutcome {
    /// Batch key of the pending mint (hex). The asset id only exists
    /// once the anchoring transaction confirms.
    pub batch_key: String,
}

/// Normalized decoded asset address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedAssetAddress {
    /// Asset id the address accepts (hex).
    pub asset_id: String,
    /// Units the address requests.
    pub amount: u64,
}
