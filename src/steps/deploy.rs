//! Contract Deployment: wallet preconditions, one contract-creation
//! broadcast, receipt polling, and the confirmation wait.
//!
//! The wallet is reached only through [`SigningProvider`], an
//! EIP-1193-shaped seam (`request accounts`, `current chain`,
//! `switch chain`, `deploy`). [`JsonRpcSigningProvider`] implements it with
//! an ethers HTTP provider against a node or signer that manages the
//! deployer account.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::abi::{self, Token};
use ethers::providers::{
    Http, Middleware, PendingTransaction, Provider, ProviderError as RpcClientError, RpcError,
};
use ethers::types::{Address, TransactionReceipt, TransactionRequest, TxHash, U256, U64};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::merkle;
use crate::errors::{ProviderError, StepError};

/// Chain the campaign must be deployed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTarget {
    pub name: String,
    pub chain_id: u64,
}

/// Constructor parameters of the collection contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorArgs {
    pub name: String,
    pub symbol: String,
    pub max_supply: u64,
    #[serde(rename = "baseURI")]
    pub base_uri: String,
    pub commitment_root: String,
}

impl ConstructorArgs {
    /// ABI encoding of `(string,string,uint256,string,bytes32)`.
    pub fn encode(&self) -> Option<Vec<u8>> {
        let root = merkle::from_hex(&self.commitment_root)?;
        Some(abi::encode(&[
            Token::String(self.name.clone()),
            Token::String(self.symbol.clone()),
            Token::Uint(U256::from(self.max_supply)),
            Token::String(self.base_uri.clone()),
            Token::FixedBytes(root.to_vec()),
        ]))
    }
}

/// The parts of a transaction receipt the deployer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub contract_address: Option<String>,
    pub block_number: u64,
    pub success: bool,
}

/// Wallet and chain access. Real implementation: `JsonRpcSigningProvider`.
#[async_trait]
pub trait SigningProvider: Send + Sync {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;

    async fn chain_id(&self) -> Result<u64, ProviderError>;

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError>;

    /// Broadcast one contract-creation transaction and return its hash.
    async fn deploy_contract(
        &self,
        from: &str,
        args: &ConstructorArgs,
    ) -> Result<String, ProviderError>;

    /// `None` while the transaction is not yet mined.
    async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>, ProviderError>;

    async fn block_number(&self) -> Result<u64, ProviderError>;

    /// Wait until `tx_hash` is mined and `confirmations` further blocks sit
    /// on top of it. A reverted receipt is returned as soon as it is seen.
    /// `None` means the transaction was dropped.
    async fn confirmed_receipt(
        &self,
        tx_hash: &str,
        confirmations: u64,
        poll_interval: Duration,
    ) -> Result<Option<TxReceipt>, ProviderError> {
        let receipt = loop {
            match self.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => break receipt,
                Ok(None) => {}
                Err(e) => tracing::debug!(tx_hash, error = %e, "receipt poll failed"),
            }
            tokio::time::sleep(poll_interval).await;
        };
        if !receipt.success {
            return Ok(Some(receipt));
        }

        let target = receipt.block_number.saturating_add(confirmations);
        loop {
            match self.block_number().await {
                Ok(head) if head >= target => return Ok(Some(receipt)),
                Ok(head) => tracing::debug!(tx_hash, head, target, "waiting for confirmations"),
                Err(e) => tracing::debug!(tx_hash, error = %e, "block number poll failed"),
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

/// Timing policy for waiting on a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentPolicy {
    /// Blocks to wait after the mining block before the deployment counts
    /// as settled. Explorer indexing lags behind fresh blocks.
    pub confirmations: u64,
    pub poll_interval: Duration,
    /// Upper bound for mining plus the confirmation wait.
    pub receipt_timeout: Duration,
}

impl Default for DeploymentPolicy {
    fn default() -> Self {
        Self {
            confirmations: 5,
            poll_interval: Duration::from_secs(2),
            receipt_timeout: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub contract_address: String,
    pub tx_hash: String,
    pub block_number: u64,
}

pub struct ContractDeployer {
    provider: Arc<dyn SigningProvider>,
    network: NetworkTarget,
    policy: DeploymentPolicy,
}

impl ContractDeployer {
    pub fn new(
        provider: Arc<dyn SigningProvider>,
        network: NetworkTarget,
        policy: DeploymentPolicy,
    ) -> Self {
        Self {
            provider,
            network,
            policy,
        }
    }

    pub fn network(&self) -> &NetworkTarget {
        &self.network
    }

    /// Check wallet and network preconditions, then broadcast exactly one
    /// contract-creation transaction. Returns the transaction hash.
    pub async fn submit(&self, args: &ConstructorArgs) -> Result<String, StepError> {
        if args.encode().is_none() {
            return Err(StepError::TransactionFailed {
                tx_hash: None,
                reason: format!(
                    "commitment root '{}' is not a 32-byte hex value",
                    args.commitment_root
                ),
            });
        }

        let account = self.ensure_account().await?;
        self.ensure_network().await?;

        let tx_hash = self
            .provider
            .deploy_contract(&account, args)
            .await
            .map_err(|e| match e {
                e if e.is_user_rejection() => StepError::UserRejected(e.to_string()),
                ProviderError::Unavailable(msg) => StepError::WalletUnavailable(msg),
                other => StepError::TransactionFailed {
                    tx_hash: None,
                    reason: other.to_string(),
                },
            })?;

        tracing::info!(
            network = %self.network.name,
            from = %account,
            tx_hash = %tx_hash,
            "contract creation transaction broadcast"
        );
        Ok(tx_hash)
    }

    /// Wait for `tx_hash` to be mined and confirmed, and extract the
    /// deployed address.
    pub async fn await_deployment(&self, tx_hash: &str) -> Result<DeployedContract, StepError> {
        let failed = |reason: String| StepError::TransactionFailed {
            tx_hash: Some(tx_hash.to_string()),
            reason,
        };
        let waited = tokio::time::timeout(
            self.policy.receipt_timeout,
            self.provider.confirmed_receipt(
                tx_hash,
                self.policy.confirmations,
                self.policy.poll_interval,
            ),
        )
        .await;
        let receipt = match waited {
            Err(_) => {
                return Err(failed(format!(
                    "not mined with {} confirmations within {}s",
                    self.policy.confirmations,
                    self.policy.receipt_timeout.as_secs()
                )));
            }
            Ok(Err(e)) => return Err(failed(e.to_string())),
            Ok(Ok(None)) => return Err(failed("transaction was dropped".to_string())),
            Ok(Ok(Some(receipt))) => receipt,
        };
        if !receipt.success {
            return Err(StepError::TransactionReverted {
                tx_hash: tx_hash.to_string(),
            });
        }
        let contract_address = receipt
            .contract_address
            .filter(|address| address.parse::<Address>().is_ok())
            .ok_or_else(|| failed("receipt carries no contract address".to_string()))?;

        tracing::info!(
            tx_hash,
            contract_address = %contract_address,
            block = receipt.block_number,
            confirmations = self.policy.confirmations,
            "deployment confirmed"
        );
        Ok(DeployedContract {
            contract_address,
            tx_hash: tx_hash.to_string(),
            block_number: receipt.block_number,
        })
    }

    /// `submit` followed by `await_deployment`.
    pub async fn deploy(&self, args: &ConstructorArgs) -> Result<DeployedContract, StepError> {
        let tx_hash = self.submit(args).await?;
        self.await_deployment(&tx_hash).await
    }

    async fn ensure_account(&self) -> Result<String, StepError> {
        let accounts = self.provider.request_accounts().await.map_err(|e| {
            if e.is_user_rejection() {
                StepError::UserRejected(e.to_string())
            } else {
                StepError::WalletUnavailable(e.to_string())
            }
        })?;
        accounts
            .into_iter()
            .next()
            .ok_or_else(|| StepError::WalletUnavailable("wallet exposes no accounts".to_string()))
    }

    async fn ensure_network(&self) -> Result<(), StepError> {
        let expected = self.network.chain_id;
        let actual = self.current_chain().await?;
        if actual == expected {
            return Ok(());
        }

        tracing::warn!(
            expected,
            actual,
            network = %self.network.name,
            "wallet on wrong network, requesting switch"
        );
        if let Err(e) = self.provider.switch_chain(expected).await {
            let reason = match e.code() {
                Some(ProviderError::USER_REJECTED) => "network switch rejected".to_string(),
                Some(ProviderError::UNRECOGNIZED_CHAIN) | Some(ProviderError::UNSUPPORTED_METHOD) => {
                    "wallet cannot switch to this network".to_string()
                }
                _ => format!("network switch failed: {e}"),
            };
            return Err(StepError::WrongNetwork {
                expected,
                actual,
                reason,
            });
        }

        let after = self.current_chain().await?;
        if after != expected {
            return Err(StepError::WrongNetwork {
                expected,
                actual: after,
                reason: "wallet still on another network after switch".to_string(),
            });
        }
        Ok(())
    }

    async fn current_chain(&self) -> Result<u64, StepError> {
        self.provider
            .chain_id()
            .await
            .map_err(|e| StepError::WalletUnavailable(e.to_string()))
    }
}

/// Map an ethers transport error onto the wallet error taxonomy, keeping
/// EIP-1193 codes from JSON-RPC error responses.
fn provider_error(e: RpcClientError) -> ProviderError {
    if let Some(response) = e.as_error_response() {
        return ProviderError::Rpc {
            code: response.code,
            message: response.message.clone(),
        };
    }
    if e.as_serde_error().is_some() {
        return ProviderError::InvalidResponse(e.to_string());
    }
    ProviderError::Unavailable(e.to_string())
}

fn parse_hash(tx_hash: &str) -> Result<TxHash, ProviderError> {
    tx_hash
        .parse::<TxHash>()
        .map_err(|e| ProviderError::InvalidResponse(format!("bad transaction hash '{tx_hash}': {e}")))
}

/// `None` while the receipt has no block yet.
fn to_tx_receipt(tx_hash: &str, receipt: TransactionReceipt) -> Option<TxReceipt> {
    let block = receipt.block_number?;
    Some(TxReceipt {
        tx_hash: tx_hash.to_string(),
        contract_address: receipt.contract_address.map(|address| format!("{address:?}")),
        block_number: block.as_u64(),
        success: receipt.status.map(|status| status == U64::from(1)).unwrap_or(true),
    })
}

/// `SigningProvider` over an ethers HTTP provider.
///
/// Transactions are sent with `eth_sendTransaction`, so the endpoint must
/// manage the deployer account (a dev node, a signing proxy, or a
/// wallet bridge).
pub struct JsonRpcSigningProvider {
    provider: Provider<Http>,
    bytecode: Vec<u8>,
    timeout: Duration,
}

impl JsonRpcSigningProvider {
    pub fn new(
        url: impl Into<String>,
        bytecode: Vec<u8>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let url = url.into();
        let provider = Provider::<Http>::try_from(url.as_str())
            .map_err(|e| ProviderError::Unavailable(format!("invalid RPC URL '{url}': {e}")))?;
        Ok(Self {
            provider,
            bytecode,
            timeout,
        })
    }

    /// Parse `0x`-prefixed (or bare) hex creation bytecode.
    pub fn parse_bytecode(hex_text: &str) -> Result<Vec<u8>, ProviderError> {
        let trimmed = hex_text.trim();
        hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
            .map_err(|e| ProviderError::InvalidResponse(format!("invalid bytecode: {e}")))
    }

    /// Bound a single node round trip by the configured timeout.
    async fn rpc<T>(
        &self,
        call: impl Future<Output = Result<T, RpcClientError>>,
    ) -> Result<T, ProviderError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                ProviderError::Unavailable(format!(
                    "node did not answer within {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(provider_error)
    }
}

#[async_trait]
impl SigningProvider for JsonRpcSigningProvider {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        let requested = self
            .rpc(self.provider.request::<_, Vec<Address>>("eth_requestAccounts", ()))
            .await;
        let accounts = match requested {
            Err(ProviderError::Rpc { code, .. }) if code == ProviderError::METHOD_NOT_FOUND => {
                self.rpc(self.provider.get_accounts()).await?
            }
            other => other?,
        };
        Ok(accounts.iter().map(|address| format!("{address:?}")).collect())
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        let id = self.rpc(self.provider.get_chainid()).await?;
        if id.bits() > 64 {
            return Err(ProviderError::InvalidResponse(format!("chain id {id} out of range")));
        }
        Ok(id.low_u64())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.rpc(self.provider.request::<_, Value>(
            "wallet_switchEthereumChain",
            [json!({ "chainId": format!("0x{chain_id:x}") })],
        ))
        .await
        .map(|_| ())
    }

    async fn deploy_contract(
        &self,
        from: &str,
        args: &ConstructorArgs,
    ) -> Result<String, ProviderError> {
        let encoded = args.encode().ok_or_else(|| {
            ProviderError::InvalidResponse("constructor arguments cannot be encoded".to_string())
        })?;
        let from = from
            .parse::<Address>()
            .map_err(|e| ProviderError::InvalidResponse(format!("bad account '{from}': {e}")))?;
        let mut data = self.bytecode.clone();
        data.extend_from_slice(&encoded);

        let tx = TransactionRequest::new().from(from).data(data);
        let pending = self.rpc(self.provider.send_transaction(tx, None)).await?;
        Ok(format!("{:?}", pending.tx_hash()))
    }

    async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>, ProviderError> {
        let hash = parse_hash(tx_hash)?;
        let receipt = self.rpc(self.provider.get_transaction_receipt(hash)).await?;
        Ok(receipt.and_then(|receipt| to_tx_receipt(tx_hash, receipt)))
    }

    async fn block_number(&self) -> Result<u64, ProviderError> {
        Ok(self.rpc(self.provider.get_block_number()).await?.as_u64())
    }

    async fn confirmed_receipt(
        &self,
        tx_hash: &str,
        confirmations: u64,
        poll_interval: Duration,
    ) -> Result<Option<TxReceipt>, ProviderError> {
        let hash = parse_hash(tx_hash)?;
        // ethers counts the mining block as the first confirmation
        let required = usize::try_from(confirmations.saturating_add(1)).unwrap_or(usize::MAX);
        let receipt = PendingTransaction::new(hash, &self.provider)
            .interval(poll_interval)
            .confirmations(required)
            .await
            .map_err(provider_error)?;
        Ok(receipt.and_then(|receipt| to_tx_receipt(tx_hash, receipt)))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    pub const CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";

    /// Scriptable in-memory wallet + chain.
    pub struct MockProvider {
        pub chain: Mutex<u64>,
        pub accounts: Vec<String>,
        pub reject_accounts: bool,
        pub reject_switch: bool,
        pub reject_deploy: bool,
        pub revert: bool,
        /// Receipt appears after this many polls.
        pub pending_polls: usize,
        pub deploy_calls: AtomicUsize,
        pub switch_calls: AtomicUsize,
        pub receipt_polls: AtomicUsize,
        pub head: AtomicU64,
    }

    impl Default for MockProvider {
        fn default() -> Self {
            Self {
                chain: Mutex::new(11155111),
                accounts: vec!["0x00000000000000000000000000000000000000a1".to_string()],
                reject_accounts: false,
                reject_switch: false,
                reject_deploy: false,
                revert: false,
                pending_polls: 0,
                deploy_calls: AtomicUsize::new(0),
                switch_calls: AtomicUsize::new(0),
                receipt_polls: AtomicUsize::new(0),
                head: AtomicU64::new(100),
            }
        }
    }

    impl MockProvider {
        pub fn deploys(&self) -> usize {
            self.deploy_calls.load(Ordering::SeqCst)
        }
    }

    fn rejected() -> ProviderError {
        ProviderError::Rpc {
            code: ProviderError::USER_REJECTED,
            message: "User rejected the request.".to_string(),
        }
    }

    #[async_trait]
    impl SigningProvider for MockProvider {
        async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
            if self.reject_accounts {
                return Err(rejected());
            }
            Ok(self.accounts.clone())
        }

        async fn chain_id(&self) -> Result<u64, ProviderError> {
            Ok(*self.chain.lock().unwrap())
        }

        async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
            self.switch_calls.fetch_add(1, Ordering::SeqCst);
            if self.reject_switch {
                return Err(rejected());
            }
            *self.chain.lock().unwrap() = chain_id;
            Ok(())
        }

        async fn deploy_contract(
            &self,
            _from: &str,
            _args: &ConstructorArgs,
        ) -> Result<String, ProviderError> {
            if self.reject_deploy {
                return Err(rejected());
            }
            let n = self.deploy_calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("0xtx{n}"))
        }

        async fn transaction_receipt(
            &self,
            tx_hash: &str,
        ) -> Result<Option<TxReceipt>, ProviderError> {
            let polls = self.receipt_polls.fetch_add(1, Ordering::SeqCst);
            if polls < self.pending_polls {
                return Ok(None);
            }
            Ok(Some(TxReceipt {
                tx_hash: tx_hash.to_string(),
                contract_address: Some(CONTRACT.to_string()),
                block_number: 100,
                success: !self.revert,
            }))
        }

        async fn block_number(&self) -> Result<u64, ProviderError> {
            Ok(self.head.fetch_add(1, Ordering::SeqCst))
        }
    }

    pub fn fast_policy() -> DeploymentPolicy {
        DeploymentPolicy {
            confirmations: 5,
            poll_interval: Duration::from_millis(1),
            receipt_timeout: Duration::from_secs(5),
        }
    }

    pub fn sepolia() -> NetworkTarget {
        NetworkTarget {
            name: "sepolia".to_string(),
            chain_id: 11155111,
        }
    }

    pub fn args() -> ConstructorArgs {
        ConstructorArgs {
            name: "Camp".to_string(),
            symbol: "CAMP".to_string(),
            max_supply: 100,
            base_uri: "ipfs://X/".to_string(),
            commitment_root: format!("0x{}", "ab".repeat(32)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use std::sync::atomic::Ordering;

    fn deployer(provider: Arc<MockProvider>) -> ContractDeployer {
        ContractDeployer::new(provider, sepolia(), fast_policy())
    }

    #[tokio::test]
    async fn test_deploy_returns_address_after_confirmations() {
        let provider = Arc::new(MockProvider {
            pending_polls: 2,
            ..Default::default()
        });
        let deployed = deployer(provider.clone()).deploy(&args()).await.unwrap();
        assert_eq!(deployed.contract_address, CONTRACT);
        assert_eq!(deployed.tx_hash, "0xtx0");
        assert_eq!(provider.deploys(), 1);
        // head started at 100 and must have reached 105
        assert!(provider.head.load(Ordering::SeqCst) > 105);
    }

    #[tokio::test]
    async fn test_wrong_network_is_switched() {
        let provider = Arc::new(MockProvider {
            chain: std::sync::Mutex::new(1),
            ..Default::default()
        });
        deployer(provider.clone()).deploy(&args()).await.unwrap();
        assert_eq!(provider.switch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(*provider.chain.lock().unwrap(), 11155111);
    }

    #[tokio::test]
    async fn test_rejected_switch_is_wrong_network() {
        let provider = Arc::new(MockProvider {
            chain: std::sync::Mutex::new(1),
            reject_switch: true,
            ..Default::default()
        });
        let err = deployer(provider.clone()).deploy(&args()).await.unwrap_err();
        match err {
            StepError::WrongNetwork {
                expected, actual, ..
            } => {
                assert_eq!(expected, 11155111);
                assert_eq!(actual, 1);
            }
            other => panic!("Expected WrongNetwork, got {other:?}"),
        }
        assert_eq!(provider.deploys(), 0);
    }

    #[tokio::test]
    async fn test_no_accounts_is_wallet_unavailable() {
        let provider = Arc::new(MockProvider {
            accounts: vec![],
            ..Default::default()
        });
        let err = deployer(provider).deploy(&args()).await.unwrap_err();
        assert!(matches!(err, StepError::WalletUnavailable(_)));
    }

    #[tokio::test]
    async fn test_user_rejection_on_deploy() {
        let provider = Arc::new(MockProvider {
            reject_deploy: true,
            ..Default::default()
        });
        let err = deployer(provider).deploy(&args()).await.unwrap_err();
        assert!(matches!(err, StepError::UserRejected(_)));
    }

    #[tokio::test]
    async fn test_user_rejection_on_accounts() {
        let provider = Arc::new(MockProvider {
            reject_accounts: true,
            ..Default::default()
        });
        let err = deployer(provider).deploy(&args()).await.unwrap_err();
        assert!(matches!(err, StepError::UserRejected(_)));
    }

    #[tokio::test]
    async fn test_reverted_receipt() {
        let provider = Arc::new(MockProvider {
            revert: true,
            ..Default::default()
        });
        let err = deployer(provider).deploy(&args()).await.unwrap_err();
        assert!(matches!(err, StepError::TransactionReverted { .. }));
    }

    #[tokio::test]
    async fn test_receipt_timeout_is_transaction_failed() {
        let provider = Arc::new(MockProvider {
            pending_polls: usize::MAX,
            ..Default::default()
        });
        let deployer = ContractDeployer::new(
            provider,
            sepolia(),
            DeploymentPolicy {
                confirmations: 5,
                poll_interval: Duration::from_millis(1),
                receipt_timeout: Duration::from_millis(20),
            },
        );
        let err = deployer.deploy(&args()).await.unwrap_err();
        assert!(matches!(
            err,
            StepError::TransactionFailed {
                tx_hash: Some(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_invalid_root_fails_before_broadcast() {
        let provider = Arc::new(MockProvider::default());
        let mut bad = args();
        bad.commitment_root = "0x1234".to_string();
        let err = deployer(provider.clone()).submit(&bad).await.unwrap_err();
        assert!(matches!(err, StepError::TransactionFailed { tx_hash: None, .. }));
        assert_eq!(provider.deploys(), 0);
    }

    #[test]
    fn test_constructor_args_encode() {
        let encoded = args().encode().unwrap();
        // five head words + three strings of one data word each
        assert_eq!(encoded.len(), 5 * 32 + 3 * 64);
        assert_eq!(&encoded[128..160], &[0xab; 32]);
    }

    #[test]
    fn test_constructor_args_json_shape() {
        let json = serde_json::to_value(args()).unwrap();
        assert_eq!(json["baseURI"], "ipfs://X/");
        assert_eq!(json["maxSupply"], 100);
        assert!(json["commitmentRoot"].is_string());
    }

    #[test]
    fn test_parse_bytecode() {
        assert_eq!(
            JsonRpcSigningProvider::parse_bytecode(" 0x6080\n").unwrap(),
            vec![0x60, 0x80]
        );
        assert!(JsonRpcSigningProvider::parse_bytecode("0xabc").is_err());
    }
}
