//! Contract query facade.
//!
//! Stateless dispatch over four read-only ERC-20 accessors. Every query is a
//! direct call to the RPC endpoint: no retry, no cache.

use crate::error::{Error, Result};
use ethers::contract::abigen;
use ethers::providers::{Http, Provider};
use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use serde::{Serialize, Serializer};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error};

abigen!(
    Erc20Token,
    r#"[
        function totalSupply() external view returns (uint256)
        function balanceOf(address owner) external view returns (uint256)
        function name() external view returns (string)
        function symbol() external view returns (string)
    ]"#
);

// ============================================================================
// ACTIONS AND RESULTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractAction {
    TotalSupply,
    Name,
    Symbol,
    BalanceOf,
}

impl ContractAction {
    /// Selector as callers spell it (`?action=totalSupply`)
    pub fn parse(action: &str) -> Option<ContractAction> {
        match action {
            "totalSupply" => Some(ContractAction::TotalSupply),
            "name" => Some(ContractAction::Name),
            "symbol" => Some(ContractAction::Symbol),
            "balanceOf" => Some(ContractAction::BalanceOf),
            _ => None,
        }
    }
}

/// Integer amount from the chain.
///
/// Serialized as a JSON number when it fits in u128, otherwise as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount(pub U256);

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.0 <= U256::from(u128::MAX) {
            serializer.serialize_u128(self.0.as_u128())
        } else {
            serializer.collect_str(&self.0)
        }
    }
}

/// One-field object named after the action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractQueryResult {
    TotalSupply(TokenAmount),
    Name(String),
    Symbol(String),
    Balance(TokenAmount),
}

/// Parse a hex address (any case, optional 0x) and render its EIP-55 form
pub fn normalize_address(raw: &str) -> Result<(Address, String)> {
    let address: Address = raw
        .trim()
        .parse()
        .map_err(|_| Error::invalid_request(format!("Invalid address: {}", raw)))?;
    Ok((address, to_checksum(&address, None)))
}

// ============================================================================
// CONTRACT ACCESS
// ============================================================================

/// Read-only accessors of the token contract
pub trait TokenContract: Send + Sync {
    fn total_supply(&self) -> impl Future<Output = Result<U256>> + Send;
    fn name(&self) -> impl Future<Output = Result<String>> + Send;
    fn symbol(&self) -> impl Future<Output = Result<String>> + Send;
    fn balance_of(&self, owner: Address) -> impl Future<Output = Result<U256>> + Send;
}

/// ERC-20 contract reached over HTTP JSON-RPC
pub struct Erc20Contract {
    inner: Erc20Token<Provider<Http>>,
}

impl Erc20Contract {
    pub fn connect(rpc_url: &str, contract_address: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| Error::config(format!("invalid RPC url {}: {}", rpc_url, e)))?;
        let (address, checksummed) = normalize_address(contract_address)
            .map_err(|_| Error::config(format!("invalid contract address {}", contract_address)))?;

        debug!(contract = %checksummed, "token contract configured");
        Ok(Self {
            inner: Erc20Token::new(address, Arc::new(provider)),
        })
    }
}

fn transport_error(method: &str, err: impl std::fmt::Display) -> Error {
    error!(method, error = %err, "error getting smart contract data");
    Error::upstream(err.to_string())
}

impl TokenContract for Erc20Contract {
    async fn total_supply(&self) -> Result<U256> {
        self.inner
            .total_supply()
            .call()
            .await
            .map_err(|e| transport_error("totalSupply", e))
    }

    async fn name(&self) -> Result<String> {
        self.inner
            .name()
            .call()
            .await
            .map_err(|e| transport_error("name", e))
    }

    async fn symbol(&self) -> Result<String> {
        self.inner
            .symbol()
            .call()
            .await
            .map_err(|e| transport_error("symbol", e))
    }

    async fn balance_of(&self, owner: Address) -> Result<U256> {
        self.inner
            .balance_of(owner)
            .call()
            .await
            .map_err(|e| transport_error("balanceOf", e))
    }
}

// ============================================================================
// FACADE
// ============================================================================

pub struct ContractFacade<C> {
    contract: C,
}

impl<C: TokenContract> ContractFacade<C> {
    pub fn new(contract: C) -> Self {
        Self { contract }
    }

    /// Validate the request, then make exactly one contract call.
    ///
    /// Invalid requests never reach the contract.
    pub async fn query(&self, action: Option<&str>, address: Option<&str>) -> Result<ContractQueryResult> {
        let action = action
            .and_then(ContractAction::parse)
            .ok_or_else(|| Error::invalid_request("Invalid action."))?;

        match action {
            ContractAction::TotalSupply => Ok(ContractQueryResult::TotalSupply(TokenAmount(
                self.contract.total_supply().await?,
            ))),
            ContractAction::Name => Ok(ContractQueryResult::Name(self.contract.name().await?)),
            ContractAction::Symbol => Ok(ContractQueryResult::Symbol(self.contract.symbol().await?)),
            ContractAction::BalanceOf => {
                let raw = address
                    .filter(|a| !a.trim().is_empty())
                    .ok_or_else(|| Error::invalid_request("Missing address parameter."))?;
                let (owner, checksummed) = normalize_address(raw)?;
                debug!(owner = %checksummed, "querying balance");

                Ok(ContractQueryResult::Balance(TokenAmount(
                    self.contract.balance_of(owner).await?,
                )))
            }
        }
    }
}
