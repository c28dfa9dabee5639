use anyhow::{anyhow, Context};
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use url::Url;

/// Thin JSON client for the admin API. Unwraps the `{success, data}` envelope.
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(server: &str) -> anyhow::Result<Self> {
        let base = Url::parse(server).with_context(|| format!("invalid server URL: {}", server))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(anyhow!("server URL must be http or https: {}", server));
        }
        Ok(Self {
            base,
            http: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).with_context(|| format!("invalid path: {}", path))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        self.send::<(), T>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> anyhow::Result<T> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> anyhow::Result<T> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    /// Raw health probe: returns the status code and body without unwrapping
    pub async fn health(&self) -> anyhow::Result<(StatusCode, Value)> {
        let res = self.http.get(self.url("/health")?).send().await?;
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> anyhow::Result<T> {
        let url = self.url(path)?;
        let mut req = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req
            .send()
            .await
            .with_context(|| format!("{} {} failed", method, url))?;
        let status = res.status();
        let envelope = res
            .json::<Value>()
            .await
            .with_context(|| format!("{} {} returned a non-JSON body ({})", method, url, status))?;

        unwrap_envelope(status, envelope)
    }
}

fn unwrap_envelope<T: DeserializeOwned>(status: StatusCode, envelope: Value) -> anyhow::Result<T> {
    let success = envelope.get("success").and_then(Value::as_bool).unwrap_or(false);
    if !status.is_success() || !success {
        let message = envelope
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed");
        return Err(anyhow!("{} ({})", message, status));
    }

    let data = envelope.get("data").cloned().unwrap_or(Value::Null);
    serde_json::from_value(data).context("unexpected response shape")
}
