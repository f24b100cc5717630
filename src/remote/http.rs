use super::contract::ScriptService;
use crate::error::RemoteError;
use crate::script::ScriptDescriptor;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    result: Vec<ScriptDescriptor>,
}

/// JSON-over-HTTP client for a script configuration endpoint.
///
/// Routes: `GET/POST {base}/scripts`, `GET/PUT {base}/scripts/{id}`.
pub struct HttpScriptService {
    client: reqwest::Client,
    base_url: String,
    include_dependencies: bool,
}

impl HttpScriptService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            include_dependencies: false,
        })
    }

    /// Ask the service to also resolve library scripts the published script uses.
    pub fn with_dependencies(mut self, include: bool) -> Self {
        self.include_dependencies = include;
        self
    }

    fn scripts_url(&self) -> String {
        format!("{}/scripts", self.base_url)
    }

    fn script_url(&self, id: &str) -> String {
        format!("{}/scripts/{}", self.base_url, id)
    }

    fn write_query(&self) -> Vec<(&'static str, &'static str)> {
        if self.include_dependencies {
            vec![("includeDependencies", "true")]
        } else {
            Vec::new()
        }
    }
}

async fn check(response: reqwest::Response, id: &str) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::CONFLICT => Err(RemoteError::Conflict(id.to_string())),
        StatusCode::NOT_FOUND => Err(RemoteError::NotFound(id.to_string())),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl ScriptService for HttpScriptService {
    async fn read(&self, id: &str) -> Result<Option<ScriptDescriptor>, RemoteError> {
        let response = self.client.get(self.script_url(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check(response, id).await?;
        Ok(Some(response.json().await?))
    }

    async fn create(&self, descriptor: &ScriptDescriptor) -> Result<String, RemoteError> {
        debug!(script = %descriptor.name, "POST script");
        let response = self
            .client
            .post(self.scripts_url())
            .query(&self.write_query())
            .json(descriptor)
            .send()
            .await?;
        let created: ScriptDescriptor = check(response, &descriptor.id).await?.json().await?;
        Ok(created.id)
    }

    async fn update(&self, id: &str, descriptor: &ScriptDescriptor) -> Result<(), RemoteError> {
        debug!(script = %descriptor.name, id = %id, "PUT script");
        let response = self
            .client
            .put(self.script_url(id))
            .query(&self.write_query())
            .json(descriptor)
            .send()
            .await?;
        check(response, id).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ScriptDescriptor>, RemoteError> {
        let response = self.client.get(self.scripts_url()).send().await?;
        let listed: ListResponse = check(response, "").await?.json().await?;
        Ok(listed.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let service = HttpScriptService::new("https://cfg.example.com/api/", Duration::from_secs(5))
            .unwrap();
        assert_eq!(service.scripts_url(), "https://cfg.example.com/api/scripts");
        assert_eq!(service.script_url("ab"), "https://cfg.example.com/api/scripts/ab");
        assert!(service.write_query().is_empty());
        assert_eq!(
            service.with_dependencies(true).write_query(),
            vec![("includeDependencies", "true")]
        );
    }
}
