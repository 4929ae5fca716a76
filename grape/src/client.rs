use async_trait::async_trait;
use mockall::automock;
use alloy::{network::{Ethereum, EthereumWallet}, sol};
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use anyhow::Result;
use tracing::debug;
use url::Url;
use crate::client::GrapeNodes::GrapeNodesInstance;

sol!(
    #[sol(rpc)]
    #[derive(Debug)]
    interface GrapeNodes {
        function compound() external;
        function getTotalRewards(address account) external view returns (uint256);
    }
);

/// Receipt status code of a transaction that executed successfully.
pub const SUCCESS_STATUS: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompoundReceipt {
    pub transaction_hash: B256,
    pub status: u64,
}

impl CompoundReceipt {
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }
}

#[automock]
#[async_trait]
pub trait GrapeClientTrait {
    /// Accrued rewards of `account`, in wei.
    async fn get_total_rewards(&self, account: Address) -> Result<U256>;
    /// Sends `compound()` and waits for it to be mined. A reverted transaction
    /// is returned as a receipt, not as an error.
    async fn compound(&self) -> Result<CompoundReceipt>;
}

#[derive(Clone)]
pub struct GrapeClient {
    contract: GrapeNodesInstance<(), DynProvider, Ethereum>,
    signer: PrivateKeySigner,
}

impl GrapeClient {
    pub fn new(signer: PrivateKeySigner, rpc_url: Url, address: Address) -> Self {
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::new(signer.clone()))
            .on_http(rpc_url)
            .erased();

        let contract: GrapeNodesInstance<(), DynProvider, Ethereum> = GrapeNodes::new(address, provider);

        Self { contract, signer }
    }

    pub fn wallet(&self) -> Address {
        self.signer.address()
    }

    pub fn contract_address(&self) -> Address {
        *self.contract.address()
    }
}

#[async_trait]
impl GrapeClientTrait for GrapeClient {
    async fn get_total_rewards(&self, account: Address) -> Result<U256> {
        let rewards = self.contract.getTotalRewards(account).call().await?;
        Ok(rewards._0)
    }

    async fn compound(&self) -> Result<CompoundReceipt> {
        let pending = self.contract.compound().send().await?;
        debug!("Sent compound transaction {}", pending.tx_hash());

        match pending.get_receipt().await {
            Ok(receipt) => Ok(CompoundReceipt {
                transaction_hash: receipt.transaction_hash,
                status: u64::from(receipt.status()),
            }),
            Err(e) => Err(anyhow::anyhow!("Failed to get receipt: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const PRIVATE_KEY: &str = "6df79891f22b0f3c9e9fb53b966a8861fd6fef69f99772c5c4dbcf303f10d901";
    const CONTRACT_ADDRESS: &str = "0xd77b0756be406a6a78d47285edd59234d781d568";

    fn signer() -> PrivateKeySigner {
        PrivateKeySigner::from_str(PRIVATE_KEY).expect("Invalid private key")
    }

    #[test]
    fn test_receipt_status() {
        let ok = CompoundReceipt { transaction_hash: B256::ZERO, status: 1 };
        let reverted = CompoundReceipt { transaction_hash: B256::ZERO, status: 0 };

        assert!(ok.is_success());
        assert!(!reverted.is_success());
    }

    #[test]
    fn test_client_binds_wallet_and_contract() {
        let address = Address::from_str(CONTRACT_ADDRESS).expect("Invalid contract address");
        let rpc_url = Url::parse("http://localhost:8545").expect("Invalid rpc url");
        let client = GrapeClient::new(signer(), rpc_url, address);

        assert_eq!(client.wallet(), signer().address());
        assert_eq!(client.contract_address(), address);
    }

    #[tokio::test]
    async fn test_mock_client() {
        let mut grape = MockGrapeClientTrait::new();
        grape.expect_get_total_rewards()
            .returning(|_| Ok(U256::from(42u64)));

        let rewards = grape.get_total_rewards(Address::ZERO).await.expect("Failed to get rewards");
        assert_eq!(rewards, U256::from(42u64));
    }
}
