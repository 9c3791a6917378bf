//! Chain access for the Koin faucet.
//!
//! Everything the faucet needs from a blockchain sits behind one
//! [`ChainClient`] trait with three interchangeable backends:
//! - an in-memory stub for environments without a node,
//! - a JSON-RPC node paired with a local signing subprocess,
//! - an external wallet CLI driven over its command line.

pub mod address;
pub mod client;
pub mod error;
pub mod retry;
pub mod rpc;
pub mod signer;
pub mod stub;
pub mod types;
pub mod wallet_cli;

pub use address::AddressFormat;
pub use client::{connect, BackendKind, ChainClient, ChainConfig};
pub use error::{ChainError, ChainResult};
pub use signer::SignerClient;
pub use stub::StubClient;
pub use types::TokenInfo;
pub use wallet_cli::CliWalletClient;
