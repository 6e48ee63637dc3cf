//! # Normalized Chain Results
//!
//! Category-wide result shapes. Every chain adapter maps its backend's
//! native responses into these; callers never see backend field names.

use serde::{Deserialize, Serialize};
use shared_types::Sats;

/// Block reward halving interval on regtest.
pub const REGTEST_HALVING_INTERVAL: u64 = 150;

/// Coinbase maturity: blocks before a coinbase output is spendable.
pub const COINBASE_MATURITY: u64 = 100;

/// Initial block subsidy in satoshis (50 BTC).
pub const INITIAL_REWARD_SATS: u64 = 50 * Sats::PER_BTC;

/// Normalized chain-tip info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    /// Current block height.
    pub blocks: u64,
    /// Hash of the chain tip.
    pub best_block_hash: String,
    /// Chain name; always "regtest" in a lab topology.
    pub chain: String,
    /// Whether the node is still in initial block download.
    pub initial_block_download: bool,
}

/// Normalized wallet info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    /// Spendable balance.
    pub balance: Sats,
    /// Coinbase outputs still maturing.
    pub immature_balance: Sats,
}

/// Block subsidy at `height`, accounting for regtest halvings.
#[must_use]
pub fn block_reward_sats(height: u64) -> Sats {
    let halvings = height / REGTEST_HALVING_INTERVAL;
    if halvings >= 64 {
        return Sats::ZERO;
    }
    Sats(INITIAL_REWARD_SATS >> halvings)
}

/// Blocks to mine so the wallet can cover `shortfall` in spendable funds.
///
/// Enough blocks to earn the shortfall at the current subsidy, plus
/// whatever it takes for those coinbases to reach maturity from `height`.
#[must_use]
pub fn blocks_to_mine(height: u64, shortfall: Sats) -> u32 {
    let reward = block_reward_sats(height).0.max(1);
    let earning_blocks = shortfall.0.div_ceil(reward);
    let maturity_gap = COINBASE_MATURITY.saturating_sub(height);
    u32::try_from(earning_blocks + maturity_gap).unwrap_or(u32::MAX)
}
