//! # Normalized Lightning Results
//!
//! Category-wide result shapes shared by all four adapters. All amounts
//! are integer satoshis unless a field is explicitly millisatoshi.

use serde::{Deserialize, Serialize};
use shared_types::{MilliSats, Sats};

/// Normalized node identity and sync state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightningNodeInfo {
    /// Identity public key (hex).
    pub pubkey: String,
    /// Node alias.
    pub alias: String,
    /// Advertised connection URL: `pubkey@host:port`.
    pub rpc_url: String,
    /// Best block height the node has processed.
    pub block_height: u64,
    /// Whether the node considers itself synced to its chain backend.
    pub synced_to_chain: bool,
}

/// Normalized on-chain wallet balances, in satoshis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Confirmed plus unconfirmed.
    pub total: Sats,
    /// Confirmed only.
    pub confirmed: Sats,
    /// Unconfirmed only.
    pub unconfirmed: Sats,
}

/// Unified channel status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelStatus {
    /// Funding transaction broadcast, not yet confirmed.
    Opening,
    /// Active.
    Open,
    /// Close initiated, not yet resolved.
    Closing,
    /// Fully resolved.
    Closed,
}

/// Normalized channel projection. Replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Funding outpoint `txid:index`, the cross-implementation channel id.
    pub channel_point: String,
    /// Remote peer's identity pubkey.
    pub remote_pubkey: String,
    /// Total channel capacity.
    pub capacity: Sats,
    /// Our side's balance.
    pub local_balance: Sats,
    /// Remote side's balance.
    pub remote_balance: Sats,
    /// Unified status.
    pub status: ChannelStatus,
    /// Whether the channel is unannounced.
    pub is_private: bool,
}

/// Result of opening a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenChannelOutcome {
    /// Funding transaction id.
    pub txid: String,
    /// Funding output index.
    pub output_index: u32,
}

impl OpenChannelOutcome {
    /// The `txid:index` channel point.
    #[must_use]
    pub fn channel_point(&self) -> String {
        format!("{}:{}", self.txid, self.output_index)
    }
}

/// Normalized decoded invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedInvoice {
    /// Payment hash (hex).
    pub payment_hash: String,
    /// Invoice amount in millisatoshis. Zero for "any amount" invoices.
    pub amount_msat: MilliSats,
    /// Invoice description.
    pub description: String,
}

/// Normalized payment result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    /// Payment preimage (hex) proving settlement.
    pub preimage: String,
    /// Amount actually paid, in millisatoshis.
    pub amount_msat: MilliSats,
}

/// Split a `pubkey@host:port` connection URL.
///
/// Returns `(pubkey, host_port)`; `None` when the URL has no `@`.
#[must_use]
pub fn split_connection_url(url: &str) -> Option<(&str, &str)> {
    url.split_once('@')
}
