//! Control-plane client over HTTP.
//!
//! # Responsibilities
//! - Issue the five control-plane calls against the JSON gateway
//! - Follow `next_marker` pagination on listings
//! - Map transport and status failures onto `ApiError`
//!
//! # Security Constraints
//! - The bearer token comes only from the environment, never from config
//! - The token is never logged

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::schema::ControlPlaneConfig;
use crate::load_balancer::types::{
    ApiError, ApiResult, CreateRuleRequest, Listener, Rule, TargetGroup,
};
use crate::load_balancer::ElbApi;

/// One page of a listing.
#[derive(Debug, Deserialize)]
struct Page<T> {
    items: Vec<T>,
    #[serde(default)]
    next_marker: Option<String>,
}

/// `ElbApi` implementation backed by the control-plane gateway.
#[derive(Clone)]
pub struct HttpElbClient {
    http: reqwest::Client,
    endpoint: Url,
    timeout_secs: u64,
    page_size: u32,
}

impl HttpElbClient {
    /// Build a client; reads the bearer token from `config.token_env` if set.
    pub fn new(config: &ControlPlaneConfig) -> ApiResult<Self> {
        let endpoint: Url = config.endpoint.parse().map_err(|e| {
            ApiError::Http(format!("invalid control-plane endpoint '{}': {}", config.endpoint, e))
        })?;

        let mut headers = HeaderMap::new();
        match std::env::var(&config.token_env) {
            Ok(token) if !token.is_empty() => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| ApiError::Http(format!("{} holds an invalid token", config.token_env)))?;
                headers.insert(AUTHORIZATION, value);
            }
            _ => tracing::debug!(token_env = %config.token_env, "No control-plane token set"),
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Http(e.to_string()))?;

        Ok(Self {
            http,
            endpoint,
            timeout_secs: config.timeout_secs,
            page_size: config.page_size,
        })
    }

    /// Endpoint URL with each segment percent-encoded as a single path segment.
    fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Http(format!("endpoint '{}' cannot take a path", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout_secs)
            } else {
                ApiError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT => ApiError::Rejected(message),
            _ => ApiError::Status {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        response.json().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get_all<T: DeserializeOwned>(&self, url: Url) -> ApiResult<Vec<T>> {
        let mut items = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let mut page_url = url.clone();
            {
                let mut query = page_url.query_pairs_mut();
                query.append_pair("page_size", &self.page_size.to_string());
                if let Some(m) = &marker {
                    query.append_pair("marker", m);
                }
            }

            let page: Page<T> = Self::decode(self.send(self.http.get(page_url)).await?).await?;
            items.extend(page.items);
            match page.next_marker {
                Some(next) if !next.is_empty() => marker = Some(next),
                _ => break,
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl ElbApi for HttpElbClient {
    async fn list_listeners(&self, load_balancer_arn: &str) -> ApiResult<Vec<Listener>> {
        let url = self.url(&["load-balancers", load_balancer_arn, "listeners"])?;
        self.get_all(url).await
    }

    async fn list_rules(&self, listener_arn: &str) -> ApiResult<Vec<Rule>> {
        let url = self.url(&["listeners", listener_arn, "rules"])?;
        self.get_all(url).await
    }

    async fn create_rule(&self, listener_arn: &str, request: &CreateRuleRequest) -> ApiResult<Rule> {
        let url = self.url(&["listeners", listener_arn, "rules"])?;
        let response = self.send(self.http.post(url).json(request)).await?;
        Self::decode(response).await
    }

    async fn delete_rule(&self, rule_arn: &str) -> ApiResult<()> {
        let url = self.url(&["rules", rule_arn])?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    async fn list_target_groups(&self) -> ApiResult<Vec<TargetGroup>> {
        let url = self.url(&["target-groups"])?;
        self.get_all(url).await
    }
}

impl std::fmt::Debug for HttpElbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpElbClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout_secs", &self.timeout_secs)
            .field("page_size", &self.page_size)
            .finish()
    }
}
