//! Destination address validation.

use serde::{Deserialize, Serialize};

/// Address formats understood by the chain backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressFormat {
    /// 20-byte account hash, `0x` followed by 40 hex digits.
    Hex,
    /// Base58Check-encoded structured account id: version byte plus
    /// 20-byte body, checksum verified.
    Base58,
    /// Wallet-managed account name.
    Account,
}

impl AddressFormat {
    /// Pure format check; no chain I/O, same answer for the same input.
    pub fn is_valid(&self, address: &str) -> bool {
        match self {
            AddressFormat::Hex => is_valid_hex(address),
            AddressFormat::Base58 => is_valid_base58(address),
            AddressFormat::Account => is_valid_account(address),
        }
    }
}

fn is_valid_hex(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(body) => matches!(hex::decode(body), Ok(bytes) if bytes.len() == 20),
        None => false,
    }
}

fn is_valid_base58(address: &str) -> bool {
    match bs58::decode(address).with_check(None).into_vec() {
        Ok(payload) => payload.len() == 21,
        Err(_) => false,
    }
}

// Account names end up inside a wallet-CLI command batch, so the
// charset doubles as an injection guard.
fn is_valid_account(address: &str) -> bool {
    !address.is_empty()
        && address.len() <= 64
        && address
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-')
}
