//! Solana wallet backed by a local keypair

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    signature::Keypair,
    signer::Signer,
    transaction::VersionedTransaction,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::RpcConfig;
use crate::error::{Error, Result};
use crate::quote::{SwapOrder, SwapTransactionBuilder, UnsignedSwap};
use crate::registry::ChainFamily;

use super::WalletCapability;

/// Connected iff a keypair is loaded
pub struct SolanaWallet {
    signer: RwLock<Option<Arc<Keypair>>>,
    rpc: Arc<RpcClient>,
    builder: Arc<dyn SwapTransactionBuilder>,
}

impl SolanaWallet {
    pub fn new(config: &RpcConfig, builder: Arc<dyn SwapTransactionBuilder>) -> Self {
        let rpc = RpcClient::new_with_timeout_and_commitment(
            config.solana_endpoint.clone(),
            Duration::from_millis(config.timeout_ms),
            CommitmentConfig::confirmed(),
        );

        Self {
            signer: RwLock::new(None),
            rpc: Arc::new(rpc),
            builder,
        }
    }

    /// Construct already connected with the given keypair
    pub fn with_signer(
        config: &RpcConfig,
        builder: Arc<dyn SwapTransactionBuilder>,
        keypair: Keypair,
    ) -> Self {
        let mut wallet = Self::new(config, builder);
        wallet.signer = RwLock::new(Some(Arc::new(keypair)));
        wallet
    }

    pub async fn connect(&self, keypair: Keypair) -> String {
        let address = keypair.pubkey().to_string();
        *self.signer.write().await = Some(Arc::new(keypair));
        info!("Connected Solana wallet {}", super::shorten_address(&address, 4, 4));
        address
    }

    pub async fn disconnect(&self) {
        *self.signer.write().await = None;
        info!("Disconnected Solana wallet");
    }

    async fn keypair(&self) -> Result<Arc<Keypair>> {
        self.signer
            .read()
            .await
            .clone()
            .ok_or(Error::WalletNotConnected(ChainFamily::Solana))
    }
}

/// Decode the aggregator's base64 transaction and sign it with `keypair`
fn sign_transaction(encoded: &str, keypair: &Keypair) -> Result<VersionedTransaction> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::Deserialization(format!("Invalid base64 transaction: {}", e)))?;

    let unsigned: VersionedTransaction = bincode::deserialize(&bytes)
        .map_err(|e| Error::Deserialization(format!("Invalid transaction bytes: {}", e)))?;

    VersionedTransaction::try_new(unsigned.message, &[keypair])
        .map_err(|e| Error::Execution(format!("Failed to sign transaction: {}", e)))
}

#[async_trait]
impl WalletCapability for SolanaWallet {
    fn family(&self) -> ChainFamily {
        ChainFamily::Solana
    }

    async fn is_connected(&self) -> bool {
        self.signer.read().await.is_some()
    }

    async fn address(&self) -> Option<String> {
        self.signer
            .read()
            .await
            .as_ref()
            .map(|k| k.pubkey().to_string())
    }

    async fn sign_and_submit(&self, order: &SwapOrder) -> Result<String> {
        let keypair = self.keypair().await?;

        let encoded = match self.builder.build_swap(order).await? {
            UnsignedSwap::Solana { transaction } => transaction,
            UnsignedSwap::Evm { .. } => {
                return Err(Error::Execution(
                    "Aggregator returned an EVM transaction for a Solana source chain".to_string(),
                ))
            }
        };

        let tx = sign_transaction(&encoded, &keypair)?;
        debug!("Signed swap transaction for {}", keypair.pubkey());

        let signature = self.rpc.send_transaction(&tx).await?;
        info!("Submitted Solana swap: {}", signature);
        Ok(signature.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{hash::Hash, message::Message, pubkey::Pubkey, system_instruction};

    struct NoBuilder;

    #[async_trait]
    impl SwapTransactionBuilder for NoBuilder {
        async fn build_swap(&self, _order: &SwapOrder) -> Result<UnsignedSwap> {
            Err(Error::Execution("unused".to_string()))
        }
    }

    fn encoded_transfer(payer: &Keypair) -> String {
        let ix = system_instruction::transfer(&payer.pubkey(), &Pubkey::new_unique(), 1_000);
        let message = Message::new_with_blockhash(&[ix], Some(&payer.pubkey()), &Hash::default());
        let tx = VersionedTransaction {
            signatures: vec![Default::default()],
            message: solana_sdk::message::VersionedMessage::Legacy(message),
        };
        STANDARD.encode(bincode::serialize(&tx).unwrap())
    }

    #[test]
    fn test_sign_transaction() {
        let payer = Keypair::new();
        let signed = sign_transaction(&encoded_transfer(&payer), &payer).unwrap();
        assert_eq!(signed.signatures.len(), 1);
        assert!(signed.verify_with_results().iter().all(|ok| *ok));
    }

    #[test]
    fn test_sign_transaction_rejects_garbage() {
        let payer = Keypair::new();
        assert!(matches!(
            sign_transaction("not base64!!", &payer),
            Err(Error::Deserialization(_))
        ));
        assert!(matches!(
            sign_transaction(&STANDARD.encode([1u8, 2, 3]), &payer),
            Err(Error::Deserialization(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_follows_keypair() {
        let wallet = SolanaWallet::new(&crate::Config::default().rpc, Arc::new(NoBuilder));
        assert!(!wallet.is_connected().await);
        assert!(wallet.address().await.is_none());

        let keypair = Keypair::new();
        let expected = keypair.pubkey().to_string();
        assert_eq!(wallet.connect(keypair).await, expected);
        assert!(wallet.is_connected().await);
        assert_eq!(wallet.address().await, Some(expected));

        wallet.disconnect().await;
        assert!(!wallet.is_connected().await);
    }
}
