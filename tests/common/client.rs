//! HTTP client for the action API.

use serde_json::{Value, json};

const ACCOUNT_HEADER: &str = "x-eureka-account";

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    account: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String, account: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            account: account.map(str::to_string),
        }
    }

    fn with_account(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.account {
            Some(account) => request.header(ACCOUNT_HEADER, account),
            None => request,
        }
    }

    /// Invoke an action; returns the HTTP status and decoded body.
    pub async fn action(&self, name: &str, params: Value) -> anyhow::Result<(u16, Value)> {
        let request = self
            .http
            .post(format!("{}/api/actions/{}", self.base_url, name))
            .json(&json!({ "params": params }));
        let response = self.with_account(request).send().await?;
        let status = response.status().as_u16();
        Ok((status, response.json().await?))
    }

    /// GET a path and return the status and body text.
    pub async fn get(&self, path: &str) -> anyhow::Result<(u16, String)> {
        let request = self.http.get(format!("{}{}", self.base_url, path));
        let response = self.with_account(request).send().await?;
        let status = response.status().as_u16();
        Ok((status, response.text().await?))
    }
}
