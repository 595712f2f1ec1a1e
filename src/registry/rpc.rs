//! JSON-RPC Address Registry Adapter
//!
//! Talks to the deployed registry contract through an Ethereum node's
//! JSON-RPC endpoint. Registrations are sent with `eth_sendTransaction` from
//! an account the node manages; lookups use `eth_call`.

use crate::domain::address::ContractAddress;
use crate::domain::ports::{AddressRegistry, RegistryEntry, TxHandle, TxReceipt};
use crate::error::{Error, Result};
use alloy_primitives::{hex, B256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

sol! {
    interface IContractRegistry {
        function setContractAddress(string name, string version, address addr) external;
        function getContractAddress(string name) external view returns (address addr);
    }
}

/// EIP-1474 code for execution reverted
const EXECUTION_REVERTED: i64 = 3;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the JSON-RPC registry adapter
#[derive(Debug, Clone)]
pub struct RpcRegistryConfig {
    /// Node endpoint
    pub rpc_url: String,
    /// Deployed registry contract
    pub registry_address: ContractAddress,
    /// Account that signs registrations (must be unlocked on the node)
    pub sender: Option<ContractAddress>,
    /// Blocks required on top of (and including) the inclusion block
    pub confirmations: u64,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

// =============================================================================
// JSON-RPC Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    block_number: Option<String>,
    status: Option<String>,
}

// =============================================================================
// RPC Registry
// =============================================================================

/// Registry adapter backed by an Ethereum JSON-RPC node
pub struct RpcRegistry {
    config: RpcRegistryConfig,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcRegistry {
    /// Create a new adapter
    pub fn new(config: RpcRegistryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            config,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    /// Issue a JSON-RPC call, returning `Value::Null` for an absent result
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!("RPC -> {} {}", method, request.params);

        let transport = |e: reqwest::Error| self.transport_error(method, e);
        let response: RpcResponse = self
            .http
            .post(&self.config.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        if let Some(err) = response.error {
            debug!("RPC <- {} error {}: {}", method, err.code, err.message);
            return Err(Error::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        let result = response.result.unwrap_or(Value::Null);
        debug!("RPC <- {} {}", method, result);
        Ok(result)
    }

    /// HTTP deadline expiry is a timeout, not a transport failure
    fn transport_error(&self, method: &str, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                operation: format!("{} request", method),
                after: self.config.request_timeout,
            }
        } else {
            Error::Transport(err)
        }
    }

    async fn block_number(&self) -> Result<u64> {
        parse_quantity(&self.call("eth_blockNumber", json!([])).await?)
    }
}

#[async_trait]
impl AddressRegistry for RpcRegistry {
    async fn set_contract_address(&self, entry: &RegistryEntry) -> Result<TxHandle> {
        let sender = self.config.sender.ok_or_else(|| {
            Error::Configuration("a sender account is required to submit registrations".into())
        })?;

        let data = IContractRegistry::setContractAddressCall {
            name: entry.name.clone(),
            version: entry.version.clone(),
            addr: entry.address.as_address(),
        }
        .abi_encode();

        let params = json!([{
            "from": sender.to_string(),
            "to": self.config.registry_address.to_string(),
            "data": hex::encode_prefixed(data),
        }]);

        let result = self
            .call("eth_sendTransaction", params)
            .await
            .map_err(|e| match e {
                Error::Rpc { code, message } => Error::Submission {
                    reason: format!("{} (code {})", message, code),
                },
                other => other,
            })?;

        let tx = TxHandle(parse_hash(&result)?);
        info!(
            "Submitted setContractAddress({}, {}, {}) as {}",
            entry.name, entry.version, entry.address, tx
        );
        Ok(tx)
    }

    async fn transaction_receipt(&self, tx: &TxHandle) -> Result<Option<TxReceipt>> {
        let result = self
            .call("eth_getTransactionReceipt", json!([tx.to_string()]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }

        let receipt: RpcReceipt = serde_json::from_value(result)?;
        let block_number = match receipt.block_number.as_deref() {
            Some(raw) => parse_quantity_str(raw)?,
            None => return Ok(None),
        };

        if self.config.confirmations > 1 {
            let head = self.block_number().await?;
            if head.saturating_sub(block_number).saturating_add(1) < self.config.confirmations {
                debug!(
                    "{} included in block {}, head {} ({} confirmations required)",
                    tx, block_number, head, self.config.confirmations
                );
                return Ok(None);
            }
        }

        let succeeded = match receipt.status.as_deref() {
            Some(raw) => parse_quantity_str(raw)? == 1,
            // Pre-Byzantium receipts carry no status
            None => true,
        };

        Ok(Some(TxReceipt {
            tx: *tx,
            block_number,
            succeeded,
        }))
    }

    async fn get_contract_address(&self, name: &str) -> Result<ContractAddress> {
        let data = IContractRegistry::getContractAddressCall {
            name: name.to_string(),
        }
        .abi_encode();

        let params = json!([
            {
                "to": self.config.registry_address.to_string(),
                "data": hex::encode_prefixed(data),
            },
            "latest"
        ]);

        let not_found = || Error::NotFound {
            name: name.to_string(),
        };

        let result = match self.call("eth_call", params).await {
            Ok(result) => result,
            Err(Error::Rpc { code, message })
                if code == EXECUTION_REVERTED || message.contains("revert") =>
            {
                debug!("getContractAddress({}) reverted: {}", name, message);
                return Err(not_found());
            }
            Err(e) => return Err(e),
        };

        let raw = result.as_str().ok_or_else(|| {
            Error::Internal(format!("eth_call returned non-string result: {}", result))
        })?;
        let bytes = hex::decode(raw.trim_start_matches("0x"))
            .map_err(|e| Error::Internal(format!("eth_call returned invalid hex: {}", e)))?;
        if bytes.is_empty() {
            return Err(not_found());
        }

        let decoded = IContractRegistry::getContractAddressCall::abi_decode_returns(&bytes, true)
            .map_err(|e| {
                Error::Internal(format!("malformed getContractAddress return data: {}", e))
            })?;

        let address = ContractAddress::from(decoded.addr);
        if address.is_zero() {
            return Err(not_found());
        }
        Ok(address)
    }

    async fn chain_id(&self) -> Result<u64> {
        parse_quantity(&self.call("eth_chainId", json!([])).await?)
    }

    fn backend_name(&self) -> &str {
        "json-rpc"
    }
}

// =============================================================================
// Quantity Parsing
// =============================================================================

fn parse_quantity(value: &Value) -> Result<u64> {
    let raw = value
        .as_str()
        .ok_or_else(|| Error::Internal(format!("expected hex quantity, got {}", value)))?;
    parse_quantity_str(raw)
}

fn parse_quantity_str(raw: &str) -> Result<u64> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| Error::Internal(format!("hex quantity without 0x prefix: {}", raw)))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| Error::Internal(format!("invalid hex quantity {}: {}", raw, e)))
}

fn parse_hash(value: &Value) -> Result<B256> {
    let raw = value
        .as_str()
        .ok_or_else(|| Error::Internal(format!("expected transaction hash, got {}", value)))?;
    B256::from_str(raw).map_err(|e| Error::Internal(format!("invalid transaction hash {}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{keccak256, Address};
    use assert_matches::assert_matches;
    use axum::{extract::State, routing::post, Json, Router};
    use std::collections::BTreeMap;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    const STAKING: &str = "0xcC7A9e9c8E60ecc12D5A6cd9BEFEFFCD253104E9";
    const REGISTRY: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";
    const SENDER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    /// Minimal node that executes registry calls against a map
    #[derive(Default)]
    struct FakeNode {
        entries: Mutex<BTreeMap<String, Address>>,
        requests: Mutex<Vec<Value>>,
        reject_submissions: bool,
        head: u64,
        delay: Duration,
    }

    fn ok(id: &Value, result: Value) -> Json<Value> {
        Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
    }

    fn err(id: &Value, code: i64, message: &str) -> Json<Value> {
        Json(json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } }))
    }

    fn calldata(request: &Value, index: usize) -> Vec<u8> {
        let data = request["params"][index]["data"].as_str().unwrap();
        hex::decode(data.trim_start_matches("0x")).unwrap()
    }

    async fn handle(State(node): State<Arc<FakeNode>>, Json(request): Json<Value>) -> Json<Value> {
        node.requests.lock().unwrap().push(request.clone());
        if !node.delay.is_zero() {
            tokio::time::sleep(node.delay).await;
        }
        let id = &request["id"];

        match request["method"].as_str().unwrap_or_default() {
            "eth_chainId" => ok(id, json!("0x7a69")),
            "eth_blockNumber" => ok(id, json!(format!("0x{:x}", node.head))),
            "eth_sendTransaction" => {
                if node.reject_submissions {
                    return err(id, -32000, "execution reverted: caller is not the owner");
                }
                let data = calldata(&request, 0);
                let call =
                    IContractRegistry::setContractAddressCall::abi_decode(&data, true).unwrap();
                node.entries.lock().unwrap().insert(call.name, call.addr);
                ok(id, json!(keccak256(&data).to_string()))
            }
            "eth_getTransactionReceipt" => ok(
                id,
                json!({
                    "transactionHash": request["params"][0],
                    "blockNumber": "0x5",
                    "status": "0x1",
                }),
            ),
            "eth_call" => {
                let data = calldata(&request, 0);
                let call =
                    IContractRegistry::getContractAddressCall::abi_decode(&data, true).unwrap();
                match node.entries.lock().unwrap().get(&call.name) {
                    Some(addr) => {
                        let mut word = [0u8; 32];
                        word[12..].copy_from_slice(addr.as_slice());
                        ok(id, json!(hex::encode_prefixed(word)))
                    }
                    None => err(id, EXECUTION_REVERTED, "execution reverted: unknown contract"),
                }
            }
            other => err(id, -32601, &format!("method {} not found", other)),
        }
    }

    async fn spawn_node(node: Arc<FakeNode>) -> SocketAddr {
        let app = Router::new().route("/", post(handle)).with_state(node);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn adapter(addr: SocketAddr, confirmations: u64) -> RpcRegistry {
        RpcRegistry::new(RpcRegistryConfig {
            rpc_url: format!("http://{}/", addr),
            registry_address: ContractAddress::parse(REGISTRY).unwrap(),
            sender: Some(ContractAddress::parse(SENDER).unwrap()),
            confirmations,
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(&json!("0x7a69")).unwrap(), 31337);
        assert_eq!(parse_quantity(&json!("0x0")).unwrap(), 0);
        assert!(parse_quantity(&json!("7a69")).is_err());
        assert!(parse_quantity(&json!(5)).is_err());
    }

    #[tokio::test]
    async fn test_register_and_lookup_over_http() {
        let node = Arc::new(FakeNode {
            head: 5,
            ..Default::default()
        });
        let registry = adapter(spawn_node(node.clone()).await, 1);

        let entry = RegistryEntry::new("ETHStaking", "1.0", STAKING).unwrap();
        let tx = registry.set_contract_address(&entry).await.unwrap();

        let receipt = registry.transaction_receipt(&tx).await.unwrap().unwrap();
        assert_eq!(receipt.block_number, 5);
        assert!(receipt.succeeded);

        let found = registry.get_contract_address("ETHStaking").await.unwrap();
        assert_eq!(found, entry.address);

        // Submission targets the registry from the configured sender
        let requests = node.requests.lock().unwrap();
        let send = requests
            .iter()
            .find(|r| r["method"] == "eth_sendTransaction")
            .unwrap();
        assert_eq!(
            send["params"][0]["to"].as_str().unwrap().to_lowercase(),
            REGISTRY.to_lowercase()
        );
        assert_eq!(
            send["params"][0]["from"].as_str().unwrap().to_lowercase(),
            SENDER.to_lowercase()
        );
    }

    #[tokio::test]
    async fn test_unknown_name_maps_revert_to_not_found() {
        let node = Arc::new(FakeNode::default());
        let registry = adapter(spawn_node(node).await, 1);

        assert_matches!(
            registry.get_contract_address("CarbonToken").await,
            Err(Error::NotFound { name }) if name == "CarbonToken"
        );
    }

    #[tokio::test]
    async fn test_rejected_submission() {
        let node = Arc::new(FakeNode {
            reject_submissions: true,
            ..Default::default()
        });
        let registry = adapter(spawn_node(node).await, 1);

        let entry = RegistryEntry::new("ETHStaking", "1.0", STAKING).unwrap();
        assert_matches!(
            registry.set_contract_address(&entry).await,
            Err(Error::Submission { reason }) if reason.contains("not the owner")
        );
    }

    #[tokio::test]
    async fn test_waits_for_confirmations() {
        // Included in block 5, head at 6: two confirmations, three required
        let node = Arc::new(FakeNode {
            head: 6,
            ..Default::default()
        });
        let addr = spawn_node(node).await;

        let tx = TxHandle(B256::repeat_byte(0xab));
        assert!(adapter(addr, 3).transaction_receipt(&tx).await.unwrap().is_none());
        assert!(adapter(addr, 2).transaction_receipt(&tx).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_sender_is_configuration_error() {
        let node = Arc::new(FakeNode::default());
        let addr = spawn_node(node.clone()).await;
        let registry = RpcRegistry::new(RpcRegistryConfig {
            sender: None,
            ..adapter(addr, 1).config
        })
        .unwrap();

        let entry = RegistryEntry::new("ETHStaking", "1.0", STAKING).unwrap();
        assert_matches!(
            registry.set_contract_address(&entry).await,
            Err(Error::Configuration(_))
        );
        assert!(node.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_confirmation_check_tolerates_extreme_values() {
        // Head behind the inclusion block, and a confirmation count near u64::MAX
        let node = Arc::new(FakeNode {
            head: 3,
            ..Default::default()
        });
        let addr = spawn_node(node).await;

        let tx = TxHandle(B256::repeat_byte(0xcd));
        assert!(adapter(addr, 2).transaction_receipt(&tx).await.unwrap().is_none());
        assert!(adapter(addr, u64::MAX).transaction_receipt(&tx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_http_deadline_is_a_timeout() {
        let node = Arc::new(FakeNode {
            delay: Duration::from_secs(2),
            ..Default::default()
        });
        let addr = spawn_node(node).await;
        let registry = RpcRegistry::new(RpcRegistryConfig {
            request_timeout: Duration::from_millis(200),
            ..adapter(addr, 1).config
        })
        .unwrap();

        let err = registry.chain_id().await.unwrap_err();
        assert_matches!(
            err,
            Error::Timeout { ref operation, .. } if operation == "eth_chainId request"
        );
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_stalled_submission_reports_timeout() {
        use crate::client::{ClientConfig, RegistrationClient};
        use crate::config::RegistrarConfig;
        use crate::registry::RegistryFactory;

        let node = Arc::new(FakeNode {
            delay: Duration::from_secs(3),
            ..Default::default()
        });
        let addr = spawn_node(node).await;

        let client_config = ClientConfig {
            submit_timeout: Duration::from_millis(500),
            query_timeout: Duration::from_millis(250),
            ..Default::default()
        };
        let config = RegistrarConfig::new(
            &format!("http://{}/", addr),
            REGISTRY,
            Some(SENDER),
            1,
            false,
            client_config.clone(),
        )
        .unwrap();
        let client = RegistrationClient::new(RegistryFactory::create(&config).unwrap(), client_config);

        assert_matches!(
            client.register("ETHStaking", "1.0", STAKING).await,
            Err(Error::Timeout { operation, after })
                if operation == "submission" && after == Duration::from_millis(500)
        );
    }

    #[tokio::test]
    async fn test_chain_id() {
        let node = Arc::new(FakeNode::default());
        let registry = adapter(spawn_node(node).await, 1);
        assert_eq!(registry.chain_id().await.unwrap(), 31337);
        assert_eq!(registry.backend_name(), "json-rpc");
    }
}
