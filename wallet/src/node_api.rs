use async_trait::async_trait;
use log::{debug, error, trace};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tickwire_common::{
    api::node::{
        BroadcastTransactionRequest, BroadcastTransactionResponse, QuerySmartContractRequest,
        QuerySmartContractResponse, TickInfoResponse,
    },
    transaction::SignedTransaction,
};
use url::Url;

use crate::error::NetworkError;

pub const TICK_INFO_PATH: &str = "v1/tick-info";
pub const BROADCAST_PATH: &str = "v1/broadcast-transaction";
pub const QUERY_PATH: &str = "v1/querySmartContract";

// Remote ledger node
// Calls are never retried: a transaction with a finite validity window
// must not be resubmitted behind the caller's back
#[async_trait]
pub trait NodeClient: Send + Sync {
    async fn current_tick(&self) -> Result<u32, NetworkError>;

    // Returns the transaction id acknowledged by the node
    async fn broadcast(&self, tx: &SignedTransaction) -> Result<String, NetworkError>;

    // Returns the base64 response data
    async fn query(&self, request: &QuerySmartContractRequest<'_>) -> Result<String, NetworkError>;
}

#[derive(Debug, Clone)]
pub struct NodeApiConfig {
    pub request_timeout: Duration,
    pub connection_timeout: Duration,
}

impl Default for NodeApiConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

// Accept addresses with or without scheme, always ending with a slash so joins keep the path
pub fn parse_base_url(address: &str) -> Result<Url, NetworkError> {
    let mut address = if address.starts_with("http://") || address.starts_with("https://") {
        address.to_owned()
    } else {
        format!("http://{}", address)
    };
    if !address.ends_with('/') {
        address.push('/');
    }

    Url::parse(&address).map_err(|e| NetworkError::InvalidUrl {
        url: address.clone(),
        reason: e.to_string(),
    })
}

// Shared JSON-over-HTTP plumbing for the node and the remote signer
#[derive(Debug, Clone)]
pub struct HttpJsonClient {
    client: Client,
    base_url: Url,
    config: NodeApiConfig,
}

impl HttpJsonClient {
    pub fn new(address: &str, config: NodeApiConfig) -> Result<Self, NetworkError> {
        let base_url = parse_base_url(address)?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connection_timeout)
            .build()
            .map_err(|e| NetworkError::Unreachable {
                endpoint: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, NetworkError> {
        self.base_url
            .join(path)
            .map_err(|e| NetworkError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                reason: e.to_string(),
            })
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, NetworkError> {
        let url = self.endpoint(path)?;
        let request = self.client.get(url.clone());
        self.send(url, request).await
    }

    pub async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, NetworkError> {
        let url = self.endpoint(path)?;
        let request = self.client.post(url.clone()).json(body);
        self.send(url, request).await
    }

    async fn send<R: DeserializeOwned>(
        &self,
        url: Url,
        request: RequestBuilder,
    ) -> Result<R, NetworkError> {
        let endpoint = url.to_string();
        if log::log_enabled!(log::Level::Trace) {
            trace!("HTTP request to {}", endpoint);
        }

        let result = self.execute(&endpoint, request).await;
        if let Err(e) = &result {
            if log::log_enabled!(log::Level::Error) {
                error!("{}", e);
            }
        }
        result
    }

    async fn execute<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<R, NetworkError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout {
                    endpoint: endpoint.to_owned(),
                    timeout: self.config.request_timeout,
                }
            } else {
                NetworkError::Unreachable {
                    endpoint: endpoint.to_owned(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| NetworkError::Unreachable {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(NetworkError::Status {
                endpoint: endpoint.to_owned(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| NetworkError::MalformedJson {
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })
    }

    fn missing(&self, path: &str, field: &'static str) -> NetworkError {
        NetworkError::MissingField {
            endpoint: format!("{}{}", self.base_url, path),
            field,
        }
    }
}

// Node client over its HTTP/JSON surface
pub struct NodeApi {
    http: HttpJsonClient,
}

impl NodeApi {
    pub fn new(address: &str) -> Result<Self, NetworkError> {
        Self::with_config(address, NodeApiConfig::default())
    }

    pub fn with_config(address: &str, config: NodeApiConfig) -> Result<Self, NetworkError> {
        Ok(Self {
            http: HttpJsonClient::new(address, config)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        self.http.base_url()
    }
}

#[async_trait]
impl NodeClient for NodeApi {
    async fn current_tick(&self) -> Result<u32, NetworkError> {
        let response: TickInfoResponse = self.http.get(TICK_INFO_PATH).await?;
        let tick = response
            .tick_info
            .map(|info| info.tick)
            .ok_or_else(|| self.http.missing(TICK_INFO_PATH, "tickInfo"))?;

        if log::log_enabled!(log::Level::Debug) {
            debug!("current tick is {}", tick);
        }
        Ok(tick)
    }

    async fn broadcast(&self, tx: &SignedTransaction) -> Result<String, NetworkError> {
        let request = BroadcastTransactionRequest::new(tx);
        let response: BroadcastTransactionResponse =
            self.http.post(BROADCAST_PATH, &request).await?;
        response
            .transaction_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| self.http.missing(BROADCAST_PATH, "transactionId"))
    }

    async fn query(&self, request: &QuerySmartContractRequest<'_>) -> Result<String, NetworkError> {
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "querying contract {} function {} with {} bytes",
                request.contract_index, request.input_type, request.input_size
            );
        }
        let response: QuerySmartContractResponse = self.http.post(QUERY_PATH, request).await?;
        response
            .response_data
            .ok_or_else(|| self.http.missing(QUERY_PATH, "responseData"))
    }
}
