//! # Amount Types
//!
//! Integer satoshi and millisatoshi amounts. Adapters normalize every
//! backend amount into these before it crosses their boundary; floating
//! point never appears in an amount path.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// An amount in satoshis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Sats(pub u64);

/// An amount in millisatoshis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct MilliSats(pub u64);

impl Sats {
    pub const ZERO: Sats = Sats(0);

    /// Satoshis per whole bitcoin.
    pub const PER_BTC: u64 = 100_000_000;

    /// Parse a backend amount that may arrive as an integer or a decimal
    /// string (e.g. bitcoind's BTC-denominated `"0.00010000"`).
    ///
    /// `btc_denominated` selects whether the value is in BTC or already in
    /// satoshis. Decimal parsing is exact: the fractional part is padded
    /// to 8 digits and combined with integer arithmetic.
    pub fn parse(value: &serde_json::Value, btc_denominated: bool) -> Option<Sats> {
        match value {
            serde_json::Value::Number(n) => {
                if btc_denominated {
                    // Render through the raw text to avoid f64 rounding.
                    Self::from_btc_str(&n.to_string())
                } else {
                    n.as_u64().map(Sats)
                }
            }
            serde_json::Value::String(s) => {
                if btc_denominated {
                    Self::from_btc_str(s)
                } else {
                    s.parse::<u64>().ok().map(Sats)
                }
            }
            _ => None,
        }
    }

    /// Parse a BTC-denominated decimal string exactly.
    pub fn from_btc_str(s: &str) -> Option<Sats> {
        let s = s.trim();
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if frac.len() > 8 {
            return None;
        }
        let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let mut frac_padded = frac.to_string();
        while frac_padded.len() < 8 {
            frac_padded.push('0');
        }
        let frac: u64 = if frac_padded.is_empty() {
            0
        } else {
            frac_padded.parse().ok()?
        };
        whole
            .checked_mul(Self::PER_BTC)
            .and_then(|w| w.checked_add(frac))
            .map(Sats)
    }

    /// Render as a BTC-denominated decimal string (8 fractional digits).
    #[must_use]
    pub fn to_btc_string(&self) -> String {
        format!("{}.{:08}", self.0 / Self::PER_BTC, self.0 % Self::PER_BTC)
    }
}

impl MilliSats {
    /// Parse a backend millisatoshi amount that may arrive as an integer
    /// or an integer string. Decimal and float shapes are rejected.
    pub fn parse(value: &serde_json::Value) -> Option<MilliSats> {
        match value {
            serde_json::Value::Number(n) => n.as_u64().map(MilliSats),
            serde_json::Value::String(s) => s.trim().parse::<u64>().ok().map(MilliSats),
            _ => None,
        }
    }

    /// Truncating conversion to whole satoshis.
    #[must_use]
    pub fn to_sats(self) -> Sats {
        Sats(self.0 / 1000)
    }
}

impl From<Sats> for MilliSats {
    fn from(sats: Sats) -> Self {
        MilliSats(sats.0 * 1000)
    }
}

impl Add for Sats {
    type Output = Sats;
    fn add(self, rhs: Sats) -> Sats {
        Sats(self.0 + rhs.0)
    }
}

impl AddAssign for Sats {
    fn add_assign(&mut self, rhs: Sats) {
        self.0 += rhs.0;
    }
}

impl Sub for Sats {
    type Output = Sats;
    fn sub(self, rhs: Sats) -> Sats {
        Sats(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Sats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sat", self.0)
    }
}

impl fmt::Display for MilliSats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} msat", self.0)
    }
}
