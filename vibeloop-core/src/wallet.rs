//! Wallet connection and holder gating.
//!
//! vibeloop never reads balances itself. A connected address is handed to an
//! external serverless function (invoked by name) which answers whether the
//! wallet holds the community token; eligible holders unlock the holder-only
//! pet cosmetics.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::FunctionsConfig;
use crate::db::{profile_or_new, Store};
use crate::error::{Error, Result};

/// Supported wallet families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletKind {
    /// Pera wallet on Algorand
    Algorand,
    /// Base (or any EVM chain) via WalletConnect
    Evm,
}

impl WalletKind {
    /// Chain identifier sent to the holder-check function.
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletKind::Algorand => "algorand",
            WalletKind::Evm => "evm",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WalletKind::Algorand => "Pera (Algorand)",
            WalletKind::Evm => "WalletConnect (Base)",
        }
    }

    /// Guess the family from the address shape.
    pub fn detect(address: &str) -> Option<Self> {
        let address = address.trim();
        if validate_address(WalletKind::Evm, address).is_ok() {
            Some(WalletKind::Evm)
        } else if validate_address(WalletKind::Algorand, address).is_ok() {
            Some(WalletKind::Algorand)
        } else {
            None
        }
    }
}

impl std::fmt::Display for WalletKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WalletKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "algorand" | "algo" | "pera" => Ok(WalletKind::Algorand),
            "evm" | "base" | "ethereum" | "walletconnect" => Ok(WalletKind::Evm),
            _ => Err(format!("unknown chain: {}", s)),
        }
    }
}

const ALGORAND_ADDRESS_LEN: usize = 58;
const EVM_HEX_LEN: usize = 40;

/// Check that `address` is well formed for `kind`.
pub fn validate_address(kind: WalletKind, address: &str) -> Result<()> {
    let ok = match kind {
        WalletKind::Algorand => {
            address.len() == ALGORAND_ADDRESS_LEN
                && address
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b))
        }
        WalletKind::Evm => address
            .strip_prefix("0x")
            .or_else(|| address.strip_prefix("0X"))
            .is_some_and(|hex| {
                hex.len() == EVM_HEX_LEN && hex.bytes().all(|b| b.is_ascii_hexdigit())
            }),
    };
    if ok {
        Ok(())
    } else {
        Err(Error::Wallet(format!(
            "not a valid {} address: {}",
            kind.as_str(),
            address
        )))
    }
}

/// Shorten for display: first 6, an ellipsis, last 4.
pub fn format_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

/// Decides whether a wallet is eligible for holder perks.
pub trait HolderCheck {
    fn is_holder(&self, kind: WalletKind, address: &str) -> Result<bool>;
}

/// Result of [`connect_wallet`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletConnection {
    pub kind: WalletKind,
    pub address: String,
    pub display: String,
    pub holder_eligible: bool,
}

/// Validate `address`, save it on the profile and ask `checker` about eligibility.
///
/// A failed eligibility check does not undo the connection; it is reported as
/// not eligible.
pub fn connect_wallet(
    store: &dyn Store,
    checker: Option<&dyn HolderCheck>,
    user_id: &str,
    kind: WalletKind,
    address: &str,
    now: DateTime<Utc>,
) -> Result<WalletConnection> {
    let address = address.trim();
    validate_address(kind, address)?;

    let mut profile = profile_or_new(store, user_id, now)?;
    profile.wallet_address = Some(address.to_string());
    profile.updated_at = now;
    store.upsert_profile(&profile)?;

    let holder_eligible = match checker {
        Some(checker) => match checker.is_holder(kind, address) {
            Ok(eligible) => eligible,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Holder check failed");
                false
            }
        },
        None => false,
    };

    let shown = format_address(address);
    tracing::info!(
        user_id,
        chain = %kind,
        address = %shown,
        holder_eligible,
        "Wallet connected"
    );
    Ok(WalletConnection {
        kind,
        address: address.to_string(),
        display: shown,
        holder_eligible,
    })
}

/// Remove the stored address. Returns whether one was set.
pub fn disconnect_wallet(store: &dyn Store, user_id: &str, now: DateTime<Utc>) -> Result<bool> {
    let Some(mut profile) = store.get_profile(user_id)? else {
        return Ok(false);
    };
    if profile.wallet_address.take().is_none() {
        return Ok(false);
    }
    profile.updated_at = now;
    store.upsert_profile(&profile)?;
    Ok(true)
}

// ============================================
// Serverless function client
// ============================================

#[derive(Serialize)]
struct HolderCheckRequest<'a> {
    address: &'a str,
    chain: &'a str,
}

#[derive(Debug, Deserialize)]
struct HolderCheckResponse {
    eligible: bool,
}

/// HTTP client that invokes serverless functions by name.
pub struct FunctionsClient {
    config: FunctionsConfig,
    http_client: reqwest::Client,
    base_url: String,
    retry_delay: Duration,
}

impl FunctionsClient {
    /// Returns an error if the configuration is missing the functions host.
    pub fn new(config: FunctionsConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| Error::Config("functions.base_url is required".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", api_key))
                    .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?,
            );
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            base_url,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// First backoff delay; doubles on each retry.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn function_url(&self, name: &str) -> String {
        format!(
            "{}/functions/v1/{}",
            self.base_url,
            urlencoding::encode(name)
        )
    }

    /// Invoke the holder-check function once.
    pub async fn check_holder(&self, kind: WalletKind, address: &str) -> Result<bool> {
        let url = self.function_url(&self.config.holder_check);
        let body = HolderCheckRequest {
            address,
            chain: kind.as_str(),
        };

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Functions(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            let result: HolderCheckResponse = response
                .json()
                .await
                .map_err(|e| Error::Functions(format!("failed to parse response: {}", e)))?;
            Ok(result.eligible)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Functions(format!(
                "API error ({}): {}",
                status, error_text
            )))
        }
    }

    /// Holder check with retries on transient failures (5xx, network).
    pub async fn check_holder_with_retry(&self, kind: WalletKind, address: &str) -> Result<bool> {
        let mut last_error = None;
        let mut delay = self.retry_delay;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    "Retrying holder check (attempt {}/{}), waiting {:?}",
                    attempt + 1,
                    self.config.max_retries + 1,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_secs(30));
            }

            match self.check_holder(kind, address).await {
                Ok(eligible) => return Ok(eligible),
                Err(e) if is_retryable_error(&e) => {
                    tracing::warn!("Transient error checking holder: {}", e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Functions("max retries exceeded".to_string())))
    }
}

fn is_retryable_error(error: &Error) -> bool {
    match error {
        Error::Functions(msg) => {
            msg.starts_with("API error (5") || msg.starts_with("HTTP request failed")
        }
        _ => false,
    }
}

/// Blocking wrapper around [`FunctionsClient`] for synchronous callers.
pub struct SyncFunctionsClient {
    inner: FunctionsClient,
    runtime: tokio::runtime::Runtime,
}

impl SyncFunctionsClient {
    /// Returns `None` when no functions host is configured.
    pub fn new(config: &FunctionsConfig) -> Result<Option<Self>> {
        if !config.is_ready() {
            return Ok(None);
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Functions(format!("failed to create runtime: {}", e)))?;
        let inner = FunctionsClient::new(config.clone())?;
        Ok(Some(Self { inner, runtime }))
    }

    pub fn from_client(inner: FunctionsClient) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Functions(format!("failed to create runtime: {}", e)))?;
        Ok(Self { inner, runtime })
    }
}

impl HolderCheck for SyncFunctionsClient {
    fn is_holder(&self, kind: WalletKind, address: &str) -> Result<bool> {
        self.runtime
            .block_on(self.inner.check_holder_with_retry(kind, address))
    }
}
