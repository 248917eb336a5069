//! Resource expansion.
//!
//! A resource names a collection backed by a JSON array file and expands
//! into a fixed set of CRUD-shaped endpoints:
//!
//! ```text
//! GET    /name        whole array
//! HEAD   /name        headers only
//! POST   /name        201, echoes the JSON body
//! GET    /name/{id}   item whose "id" matches
//! PUT    /name/{id}   body with the item's id forced
//! PATCH  /name/{id}   item merged with body fields
//! DELETE /name/{id}   204
//! ```
//!
//! Nothing is ever written back: each request re-reads the data file and
//! answers as if the change had been applied.

use std::fs;
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::{HeaderValue, Method, Request, Response, StatusCode};
use axum::response::IntoResponse;
use serde_json::{Map, Value};

use crate::config::schema::ResourceDefinition;
use crate::http::response::json_error;
use crate::routing::definition::{
    header_map, is_readable_file, DefinitionSource, Endpoint, ValidationError,
    DEFAULT_CONTENT_TYPE,
};
use crate::routing::handler::{not_found, ResponseProducer, ResponseTemplate};

/// Number of endpoints every resource expands into.
pub const ENDPOINTS_PER_RESOURCE: usize = 7;

/// Largest request body accepted by write actions.
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAction {
    List,
    Head,
    Create,
    Read,
    Replace,
    Update,
    Delete,
}

impl ResourceAction {
    pub const ALL: [ResourceAction; ENDPOINTS_PER_RESOURCE] = [
        ResourceAction::List,
        ResourceAction::Head,
        ResourceAction::Create,
        ResourceAction::Read,
        ResourceAction::Replace,
        ResourceAction::Update,
        ResourceAction::Delete,
    ];

    pub fn method(self) -> Method {
        match self {
            ResourceAction::List | ResourceAction::Read => Method::GET,
            ResourceAction::Head => Method::HEAD,
            ResourceAction::Create => Method::POST,
            ResourceAction::Replace => Method::PUT,
            ResourceAction::Update => Method::PATCH,
            ResourceAction::Delete => Method::DELETE,
        }
    }

    /// Whether the action addresses a single item (`/name/{id}`).
    pub fn is_item(self) -> bool {
        matches!(
            self,
            ResourceAction::Read
                | ResourceAction::Replace
                | ResourceAction::Update
                | ResourceAction::Delete
        )
    }

    fn status(self) -> StatusCode {
        match self {
            ResourceAction::Create => StatusCode::CREATED,
            ResourceAction::Delete => StatusCode::NO_CONTENT,
            _ => StatusCode::OK,
        }
    }
}

/// Answers one action of one resource.
#[derive(Debug, Clone)]
pub struct ResourceHandler {
    action: ResourceAction,
    data_file: PathBuf,
    template: ResponseTemplate,
}

impl ResourceHandler {
    pub fn action(&self) -> ResourceAction {
        self.action
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn template(&self) -> &ResponseTemplate {
        &self.template
    }

    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let items = match self.load_items().await {
            Some(items) => items,
            None => return not_found(),
        };

        let (mut parts, body) = request.into_parts();
        let id = if self.action.is_item() {
            match axum::extract::Path::<String>::from_request_parts(&mut parts, &()).await {
                Ok(axum::extract::Path(id)) => id,
                Err(rejection) => return rejection.into_response(),
            }
        } else {
            String::new()
        };

        match self.action {
            ResourceAction::List => self.json(&Value::Array(items)),
            ResourceAction::Head => self.template.respond(Body::empty()),
            ResourceAction::Create => match read_json_body(body).await {
                Ok(body) => self.json(&body),
                Err(response) => response,
            },
            ResourceAction::Read => match find_item(&items, &id) {
                Some(item) => self.json(item),
                None => item_not_found(&id),
            },
            ResourceAction::Replace | ResourceAction::Update => {
                let Some(existing) = find_item(&items, &id).cloned() else {
                    return item_not_found(&id);
                };
                let fields = match read_json_body(body).await {
                    Ok(Value::Object(fields)) => fields,
                    Ok(_) => return bad_request("request body must be a JSON object"),
                    Err(response) => return response,
                };
                let merged = if self.action == ResourceAction::Update {
                    merge_fields(existing.clone(), fields)
                } else {
                    fields
                };
                self.json(&with_id(merged, &existing))
            }
            ResourceAction::Delete => match find_item(&items, &id) {
                Some(_) => self.template.respond(Body::empty()),
                None => item_not_found(&id),
            },
        }
    }

    fn json(&self, value: &Value) -> Response<Body> {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.template.respond(Body::from(bytes)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize resource response");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    async fn load_items(&self) -> Option<Vec<Value>> {
        let bytes = match tokio::fs::read(&self.data_file).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    file = %self.data_file.display(),
                    error = %e,
                    "Resource data file unavailable"
                );
                return None;
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Array(items)) => Some(items),
            Ok(_) | Err(_) => {
                tracing::warn!(
                    file = %self.data_file.display(),
                    "Resource data file is not a JSON array"
                );
                None
            }
        }
    }
}

/// Expand the `index`-th resource definition into its endpoints.
pub fn expand(
    index: usize,
    definition: &ResourceDefinition,
    resource_root: &Path,
) -> Result<Vec<Endpoint>, ValidationError> {
    let origin = DefinitionSource::Resource {
        index,
        name: definition.name.clone(),
    };
    let invalid = |message: String| ValidationError::new(origin.clone(), message);

    let name = definition.name.trim_matches('/');
    if name.is_empty() {
        return Err(invalid("Resource name must not be empty".to_string()));
    }
    if name.contains('/') {
        return Err(invalid(format!(
            "Resource name '{}' must be a single path segment",
            definition.name
        )));
    }

    let file_name = definition
        .file
        .clone()
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| format!("{}.json", name));
    let data_file = resource_root.join(&file_name);

    if !is_readable_file(&data_file) {
        return Err(invalid(format!(
            "Invalid file '{}' in resource '{}'",
            file_name, name
        )));
    }
    let parsed = fs::read(&data_file)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok());
    if !matches!(parsed, Some(Value::Array(_))) {
        return Err(invalid(format!(
            "File '{}' of resource '{}' must contain a JSON array",
            file_name, name
        )));
    }

    let headers = header_map(&definition.headers).map_err(invalid)?;
    let template = ResponseTemplate::new(
        HeaderValue::from_static(DEFAULT_CONTENT_TYPE),
        headers,
        StatusCode::OK,
    );

    let collection = format!("/{}", name);
    let item = format!("/{}/{{id}}", name);

    Ok(ResourceAction::ALL
        .iter()
        .map(|&action| {
            let path = if action.is_item() {
                item.clone()
            } else {
                collection.clone()
            };
            let producer = ResponseProducer::Resource(ResourceHandler {
                action,
                data_file: data_file.clone(),
                template: template.with_status(action.status()),
            });
            Endpoint::new(path, action.method(), producer, origin.clone())
        })
        .collect())
}

fn id_matches(item: &Value, id: &str) -> bool {
    match item.get("id") {
        Some(Value::String(s)) => s == id,
        Some(Value::Number(n)) => n.to_string() == id,
        _ => false,
    }
}

fn find_item<'a>(items: &'a [Value], id: &str) -> Option<&'a Value> {
    items.iter().find(|item| id_matches(item, id))
}

fn merge_fields(existing: Value, fields: Map<String, Value>) -> Map<String, Value> {
    let mut merged = match existing {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    merged.extend(fields);
    merged
}

fn with_id(mut fields: Map<String, Value>, existing: &Value) -> Value {
    if let Some(id) = existing.get("id") {
        fields.insert("id".to_string(), id.clone());
    }
    Value::Object(fields)
}

async fn read_json_body(body: Body) -> Result<Value, Response<Body>> {
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| bad_request("request body too large or unreadable"))?;
    serde_json::from_slice(&bytes).map_err(|e| bad_request(&format!("invalid JSON body: {}", e)))
}

fn bad_request(message: &str) -> Response<Body> {
    json_error(StatusCode::BAD_REQUEST, message)
}

fn item_not_found(id: &str) -> Response<Body> {
    json_error(StatusCode::NOT_FOUND, format!("item '{}' not found", id))
}
