pub mod client;

pub use alloy::primitives::{Address, B256, U256};
pub use alloy::primitives::utils::{format_ether, parse_ether};
pub use alloy::signers::local::PrivateKeySigner;
