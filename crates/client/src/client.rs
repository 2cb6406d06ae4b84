//! HTTP client for the Port REST API

use crate::{ClientError, PortConfig, Result};
use port_export_core::{Blueprint, Entity};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

const USER_AGENT: &str = concat!("port-exporter/", env!("CARGO_PKG_VERSION"));

/// Authenticated client for blueprint and entity endpoints
///
/// The bearer token obtained by [`authenticate`](Self::authenticate) is
/// kept for the lifetime of the client.
pub struct PortClient {
    client: Client,
    config: PortConfig,
    token: Option<String>,
}

impl PortClient {
    /// Create a client; fails fast on missing credentials
    pub fn new(config: PortConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            config,
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Exchange the client credentials for an access token
    #[instrument(skip(self))]
    pub async fn authenticate(&mut self) -> Result<()> {
        let url = self.endpoint(&["auth", "access_token"])?;
        info!("Authenticating with Port API...");

        let request = AuthRequest {
            client_id: &self.config.client_id,
            client_secret: self.config.client_secret(),
        };
        let response = self.client.post(url.clone()).json(&request).send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClientError::AuthRejected {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body: AuthResponse = check_status(response).await?.json().await?;

        let token = body
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(ClientError::MissingToken)?;
        self.token = Some(token);

        info!("Authentication successful");
        Ok(())
    }

    /// List every blueprint
    #[instrument(skip(self))]
    pub async fn blueprints(&self) -> Result<Vec<Blueprint>> {
        info!("Fetching blueprints...");
        let url = self.endpoint(&["blueprints"])?;
        let blueprints: Vec<Blueprint> = self
            .fetch_all(url, "blueprints", &[])
            .await?
            .ok_or_else(|| ClientError::UnexpectedResponse {
                url: self.base_url().to_string(),
                message: "blueprint listing returned 404".into(),
            })?;
        info!("Retrieved {} blueprints", blueprints.len());
        Ok(blueprints)
    }

    /// Fetch one blueprint definition; `None` if it does not exist
    #[instrument(skip(self))]
    pub async fn blueprint(&self, blueprint_id: &str) -> Result<Option<Blueprint>> {
        let url = self.endpoint(&["blueprints", blueprint_id])?;
        let Some(mut body) = self.get_json(url.clone(), &[]).await? else {
            return Ok(None);
        };
        match body.get_mut("blueprint").map(Value::take) {
            Some(Value::Null) | None => Ok(None),
            Some(value) => Ok(Some(parse(&url, value)?)),
        }
    }

    /// List every entity of a blueprint, following pagination
    #[instrument(skip(self))]
    pub async fn entities(&self, blueprint_id: &str, include_calculated: bool) -> Result<Vec<Entity>> {
        info!("Fetching entities for blueprint: {}", blueprint_id);
        let url = self.endpoint(&["blueprints", blueprint_id, "entities"])?;
        let query = calculated_query(include_calculated);

        let mut entities: Vec<Entity> = self
            .fetch_all(url, "entities", &query)
            .await?
            .ok_or_else(|| ClientError::BlueprintNotFound(blueprint_id.to_string()))?;
        for entity in &mut entities {
            assign_blueprint(entity, blueprint_id);
        }

        info!("Retrieved {} entities for blueprint {}", entities.len(), blueprint_id);
        Ok(entities)
    }

    /// Fetch one entity; `None` if the blueprint has no such entity
    #[instrument(skip(self))]
    pub async fn entity(
        &self,
        blueprint_id: &str,
        entity_id: &str,
        include_calculated: bool,
    ) -> Result<Option<Entity>> {
        debug!("Fetching entity: {} from blueprint: {}", entity_id, blueprint_id);
        let url = self.endpoint(&["blueprints", blueprint_id, "entities", entity_id])?;
        let query = calculated_query(include_calculated);

        let Some(mut body) = self.get_json(url.clone(), &query).await? else {
            return Ok(None);
        };
        match body.get_mut("entity").map(Value::take) {
            Some(Value::Null) | None => Ok(None),
            Some(value) => {
                let mut entity: Entity = parse(&url, value)?;
                assign_blueprint(&mut entity, blueprint_id);
                Ok(Some(entity))
            }
        }
    }

    /// Build `{base_url}/seg/seg/...`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| ClientError::Config(format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("base URL cannot carry a path: {}", self.config.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn token(&self) -> Result<&str> {
        self.token.as_deref().ok_or(ClientError::NotAuthenticated)
    }

    /// GET a JSON body; `None` on 404
    async fn get_json(&self, url: Url, query: &[(&str, String)]) -> Result<Option<Value>> {
        let token = self.token()?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check_status(response).await?.json().await?))
    }

    /// Page through a list endpoint, collecting the array under `key`.
    ///
    /// Each request carries `limit`; a non-empty `next` cursor in the body
    /// is sent back as `from` until the server stops returning one.
    /// `None` when the first page is a 404.
    async fn fetch_all<T: DeserializeOwned>(
        &self,
        url: Url,
        key: &str,
        query: &[(&str, String)],
    ) -> Result<Option<Vec<T>>> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen = HashSet::new();

        loop {
            let mut page_query = query.to_vec();
            page_query.push(("limit", self.config.page_size.to_string()));
            if let Some(from) = &cursor {
                page_query.push(("from", from.clone()));
            }

            let Some(body) = self.get_json(url.clone(), &page_query).await? else {
                if cursor.is_none() {
                    return Ok(None);
                }
                return Err(ClientError::UnexpectedResponse {
                    url: url.to_string(),
                    message: "page disappeared during pagination".into(),
                });
            };

            let page: Page<T> = Page::from_body(&url, body, key)?;
            debug!("Fetched page of {} {} from {}", page.items.len(), key, url);
            items.extend(page.items);

            match page.next {
                Some(next) => {
                    if !seen.insert(next.clone()) {
                        return Err(ClientError::PaginationLoop(next));
                    }
                    cursor = Some(next);
                }
                None => break,
            }
        }

        Ok(Some(items))
    }
}

// ==========================================
// REQUEST/RESPONSE TYPES
// ==========================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    access_token: Option<String>,
}

/// One page of a list endpoint
struct Page<T> {
    items: Vec<T>,
    next: Option<String>,
}

impl<T: DeserializeOwned> Page<T> {
    fn from_body(url: &Url, mut body: Value, key: &str) -> Result<Self> {
        let items = match body.get_mut(key).map(Value::take) {
            Some(Value::Null) | None => Vec::new(),
            Some(value) => parse(url, value)?,
        };
        let next = body
            .get("next")
            .and_then(Value::as_str)
            .filter(|cursor| !cursor.is_empty())
            .map(String::from);
        Ok(Self { items, next })
    }
}

fn parse<T: DeserializeOwned>(url: &Url, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ClientError::UnexpectedResponse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn calculated_query(include_calculated: bool) -> Vec<(&'static str, String)> {
    if include_calculated {
        Vec::new()
    } else {
        vec![("exclude_calculated_properties", "true".to_string())]
    }
}

fn assign_blueprint(entity: &mut Entity, blueprint_id: &str) {
    if entity.blueprint.is_empty() {
        entity.blueprint = blueprint_id.to_string();
    }
}

/// Turn a non-success response into [`ClientError::Api`], using the body's
/// `message` when the API provides one
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });

    Err(ClientError::Api {
        status: status.as_u16(),
        url,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base_url: &str) -> PortClient {
        PortClient::new(PortConfig::new("id", "secret").with_base_url(base_url)).unwrap()
    }

    #[test]
    fn test_client_creation_requires_credentials() {
        let result = PortClient::new(PortConfig::new("", "secret"));
        assert!(matches!(result, Err(ClientError::MissingCredentials(_))));
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client("https://api.getport.io/v1/");
        let url = client
            .endpoint(&["blueprints", "service", "entities", "team/a b"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.getport.io/v1/blueprints/service/entities/team%2Fa%20b"
        );
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_page_from_body() {
        let url = Url::parse("https://api.getport.io/v1/blueprints").unwrap();

        let page: Page<Blueprint> = Page::from_body(
            &url,
            json!({"ok": true, "blueprints": [{"identifier": "service"}], "next": "abc"}),
            "blueprints",
        )
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next.as_deref(), Some("abc"));

        let page: Page<Blueprint> =
            Page::from_body(&url, json!({"ok": true, "next": ""}), "blueprints").unwrap();
        assert!(page.items.is_empty());
        assert!(page.next.is_none());
    }

    #[test]
    fn test_auth_request_body() {
        let request = AuthRequest {
            client_id: "id",
            client_secret: "secret",
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"clientId": "id", "clientSecret": "secret"})
        );
    }

    #[test]
    fn test_calculated_query() {
        assert!(calculated_query(true).is_empty());
        assert_eq!(
            calculated_query(false),
            vec![("exclude_calculated_properties", "true".to_string())]
        );
    }
}
