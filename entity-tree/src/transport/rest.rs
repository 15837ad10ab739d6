//! HTTP implementation of the command and record surfaces

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{CommandSurface, RecordSource};
use crate::config::ServerConfig;
use crate::error::{ConsoleError, ConsoleResult};
use crate::inspector::ViewName;
use crate::model::{Entity, Record};

/// REST client for the entity collection
///
/// Every entity lives at `{root}{id}`; children, views and properties hang
/// off that URL. Responses are wrapped as `{ "result": ... }` where the result
/// is either one object or an array of them.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    root: Url,
    session_header: String,
    session_token: Option<String>,
}

impl RestClient {
    pub fn new(config: &ServerConfig) -> ConsoleResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ConsoleError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let mut root = Url::parse(config.root_url.trim())?;
        if !root.path().ends_with('/') {
            let path = format!("{}/", root.path());
            root.set_path(&path);
        }

        Ok(Self {
            client,
            root,
            session_header: config.session_header.clone(),
            session_token: config.session_token.clone(),
        })
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    fn entity_url(&self, id: &str, segment: Option<&str>) -> ConsoleResult<Url> {
        let relative = match segment {
            Some(segment) => format!("{}/{}", id, segment),
            None => id.to_string(),
        };
        Ok(self.root.join(&relative)?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self.client.request(method, url);
        match &self.session_token {
            Some(token) => req.header(self.session_header.as_str(), token.as_str()),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> ConsoleResult<Response> {
        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %response.url(), "request rejected");
            return Err(ConsoleError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(response)
    }

    async fn get_result(&self, url: Url) -> ConsoleResult<Vec<Value>> {
        debug!(%url, "GET");
        let response = self.send(self.request(Method::GET, url)).await?;
        let body: Value = response.json().await?;
        unwrap_result(body)
    }
}

/// Items of a `{ "result": ... }` envelope
pub(crate) fn unwrap_result(body: Value) -> ConsoleResult<Vec<Value>> {
    let Value::Object(mut envelope) = body else {
        return Err(ConsoleError::MalformedResponse(
            "expected a JSON object envelope".to_string(),
        ));
    };
    match envelope.remove("result") {
        Some(Value::Array(items)) => Ok(items),
        Some(Value::Null) => Ok(Vec::new()),
        Some(single) => Ok(vec![single]),
        None => Err(ConsoleError::MalformedResponse(
            "missing 'result' field".to_string(),
        )),
    }
}

fn into_record(item: Value) -> ConsoleResult<Record> {
    match item {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(ConsoleError::MalformedResponse(format!(
            "expected a record object, got {}",
            other
        ))),
    }
}

#[async_trait]
impl CommandSurface for RestClient {
    async fn children(&self, id: &str, resource_id: Option<&str>) -> ConsoleResult<Vec<Entity>> {
        let mut url = self.entity_url(id, Some("children"))?;
        if let Some(resource_id) = resource_id {
            url.query_pairs_mut().append_pair("resourceId", resource_id);
        }
        self.get_result(url)
            .await?
            .into_iter()
            .map(|item| {
                serde_json::from_value(item)
                    .map_err(|e| ConsoleError::MalformedResponse(format!("bad entity: {}", e)))
            })
            .collect()
    }

    async fn delete_node(&self, id: &str) -> ConsoleResult<bool> {
        let url = self.entity_url(id, None)?;
        debug!(%url, "DELETE");
        let response = self.request(Method::DELETE, url).send().await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(ConsoleError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            }),
        }
    }

    async fn set_property(&self, id: &str, key: &str, value: &Value) -> ConsoleResult<()> {
        let url = self.entity_url(id, None)?;
        let mut body = Map::new();
        body.insert(key.to_string(), value.clone());
        debug!(%url, key, "PUT");
        self.send(self.request(Method::PUT, url).json(&body)).await?;
        Ok(())
    }

    async fn get_property(&self, id: &str, key: &str) -> ConsoleResult<Value> {
        let url = self.entity_url(id, None)?;
        let record = match self.get_result(url).await?.into_iter().next() {
            Some(item) => into_record(item)?,
            None => return Ok(Value::Null),
        };
        Ok(record.get(key).cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl RecordSource for RestClient {
    async fn fetch_view(
        &self,
        id: &str,
        view: ViewName,
        page_size: usize,
    ) -> ConsoleResult<Vec<Record>> {
        let mut url = self.entity_url(id, Some(view.path_segment()))?;
        url.query_pairs_mut()
            .append_pair("pageSize", &page_size.max(1).to_string());
        self.get_result(url)
            .await?
            .into_iter()
            .map(into_record)
            .collect()
    }
}
