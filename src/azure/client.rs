//! HTTP client for the Azure Resource Manager REST API.
//!
//! Injects the bearer token, decodes ARM error bodies, waits for accepted
//! long-running operations and follows `nextLink` pagination. Requests are
//! never retried.

use super::auth::TokenProvider;
use super::error::{ArmError, ArmResult, ErrorBody};
use crate::config;
use crate::models::ArmList;
use colored::Colorize;
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const ASYNC_OPERATION: &str = "azure-asyncoperation";

/// Body returned by an `Azure-AsyncOperation` status URL.
#[derive(Deserialize, Debug)]
struct OperationStatus {
    status: String,
    #[serde(default)]
    error: Option<ErrorBody>,
}

/// How a successful response says the work is finished or still running.
enum Completion {
    Done,
    AsyncOperation(String),
    Location(String),
}

#[derive(Clone)]
pub struct ArmClient {
    http: reqwest::Client,
    base_url: String,
    subscription_id: String,
    tokens: Arc<dyn TokenProvider>,
    poll_interval: Duration,
}

impl ArmClient {
    pub fn new(subscription_id: &str, tokens: Arc<dyn TokenProvider>) -> ArmResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config::HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| ArmError::Transport {
                target: config::ARM_ENDPOINT.to_string(),
                source: e,
            })?;
        Ok(ArmClient {
            http,
            base_url: config::ARM_ENDPOINT.to_string(),
            subscription_id: subscription_id.to_string(),
            tokens,
            poll_interval: Duration::from_millis(config::SLEEP_MSEC),
        })
    }

    /// Point the client at another endpoint (sovereign clouds, tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// `{base}/subscriptions/{sub}{suffix}?api-version={api_version}`
    pub fn subscription_url(&self, suffix: &str, api_version: &str) -> String {
        format!(
            "{}/subscriptions/{}{}?api-version={}",
            self.base_url, self.subscription_id, suffix, api_version
        )
    }

    /// `{base}/subscriptions/{sub}/resourceGroups/{group}{suffix}?api-version=...`
    pub fn resource_group_url(&self, group: &str, suffix: &str, api_version: &str) -> String {
        self.subscription_url(&format!("/resourceGroups/{group}{suffix}"), api_version)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> ArmResult<reqwest::Response> {
        let token = self.tokens.token().await?;
        log::debug!("{} {}", method.as_str(), url.on_blue());

        let mut request = self.http.request(method.clone(), url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let resp = request.send().await.map_err(|e| ArmError::Transport {
            target: url.to_string(),
            source: e,
        })?;

        let status = resp.status();
        if status.is_success() {
            log::trace!("{} {} -> {}", method.as_str(), url, status);
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        log::warn!(
            "{failed} {method} {url} -> {status}",
            failed = "failed".on_red(),
            method = method.as_str(),
        );
        Err(ArmError::from_response(method.as_str(), url, status.as_u16(), &text))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ArmResult<T> {
        let resp = self.send(Method::GET, url, None).await?;
        read_body(url, resp).await
    }

    /// `PUT` a resource and return its state once provisioning finished.
    pub async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> ArmResult<T> {
        self.write_json(Method::PUT, url, body).await
    }

    /// `PATCH` a resource with a partial body.
    pub async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> ArmResult<T> {
        self.write_json(Method::PATCH, url, body).await
    }

    async fn write_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: &B,
    ) -> ArmResult<T> {
        let body = serde_json::to_value(body)?;
        let resp = self.send(method, url, Some(body)).await?;
        match completion(resp.status(), resp.headers()) {
            Completion::Done => read_body(url, resp).await,
            pending => {
                self.wait(url, pending, resp.headers()).await?;
                self.get_json(url).await
            }
        }
    }

    /// `POST` an action such as `start` or `deallocate` and wait for it.
    pub async fn post_action(&self, url: &str) -> ArmResult<()> {
        let resp = self.send(Method::POST, url, None).await?;
        let pending = completion(resp.status(), resp.headers());
        self.wait(url, pending, resp.headers()).await
    }

    pub async fn delete(&self, url: &str) -> ArmResult<()> {
        let resp = self.send(Method::DELETE, url, None).await?;
        let pending = completion(resp.status(), resp.headers());
        self.wait(url, pending, resp.headers()).await
    }

    /// Fetch every page of a list, following `nextLink`.
    pub async fn get_all_pages<T: DeserializeOwned>(&self, url: &str) -> ArmResult<Vec<T>> {
        let mut items: Vec<T> = Vec::new();
        let mut next = Some(url.to_string());
        let mut count_pages = 0;

        while let Some(page_url) = next.take() {
            let page: ArmList<T> = self.get_json(&page_url).await?;
            let count = page.value.len();
            items.extend(page.value);
            log::info!(
                "got page#{count_pages:2} record_count=+{count:3} => {total:3}",
                total = items.len()
            );
            count_pages += 1;

            next = match page.next_link {
                Some(link) if link == page_url => {
                    return Err(ArmError::status(
                        "GET",
                        &page_url,
                        200,
                        "NextLinkNotUnique",
                        "nextLink repeats the current page - possible infinite loop",
                    ))
                }
                Some(link) if !link.is_empty() => Some(link),
                _ => None,
            };
        }
        Ok(items)
    }

    async fn wait(&self, target: &str, pending: Completion, headers: &HeaderMap) -> ArmResult<()> {
        let delay = retry_after(headers).unwrap_or(self.poll_interval);
        match pending {
            Completion::Done => Ok(()),
            Completion::AsyncOperation(op_url) => {
                self.poll_async_operation(target, &op_url, delay).await
            }
            Completion::Location(loc_url) => self.poll_location(target, &loc_url, delay).await,
        }
    }

    async fn poll_async_operation(
        &self,
        target: &str,
        op_url: &str,
        mut delay: Duration,
    ) -> ArmResult<()> {
        loop {
            tokio::time::sleep(delay).await;
            let resp = self.send(Method::GET, op_url, None).await?;
            delay = retry_after(resp.headers()).unwrap_or(self.poll_interval);
            let op: OperationStatus = read_body(op_url, resp).await?;
            log::debug!("operation for {target}: {}", op.status);
            match op.status.as_str() {
                "Succeeded" => return Ok(()),
                "Failed" | "Canceled" => {
                    return Err(ArmError::Operation {
                        target: target.to_string(),
                        status: op.status,
                        message: op.error.map(|e| e.message).unwrap_or_default(),
                    })
                }
                _ => continue,
            }
        }
    }

    async fn poll_location(&self, target: &str, loc_url: &str, mut delay: Duration) -> ArmResult<()> {
        loop {
            tokio::time::sleep(delay).await;
            let resp = self.send(Method::GET, loc_url, None).await?;
            if resp.status() != StatusCode::ACCEPTED {
                log::debug!("operation for {target}: done ({})", resp.status());
                return Ok(());
            }
            delay = retry_after(resp.headers()).unwrap_or(self.poll_interval);
        }
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn completion(status: StatusCode, headers: &HeaderMap) -> Completion {
    if let Some(op_url) = header_str(headers, ASYNC_OPERATION) {
        return Completion::AsyncOperation(op_url);
    }
    if status == StatusCode::ACCEPTED {
        if let Some(loc_url) = header_str(headers, LOCATION.as_str()) {
            return Completion::Location(loc_url);
        }
    }
    Completion::Done
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    header_str(headers, RETRY_AFTER.as_str())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

async fn read_body<T: DeserializeOwned>(url: &str, resp: reqwest::Response) -> ArmResult<T> {
    let text = resp.text().await.map_err(|e| ArmError::Transport {
        target: url.to_string(),
        source: e,
    })?;
    decode(url, &text)
}

/// Parse a JSON body, reporting the failing path on error.
fn decode<T: DeserializeOwned>(url: &str, text: &str) -> ArmResult<T> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        log::error!("OUTPUT START:\n\n{}\n\nOUTPUT END\n", text);
        ArmError::Decode {
            target: url.to_string(),
            path: e.path().to_string(),
            message: e.inner().to_string(),
        }
    })
}
