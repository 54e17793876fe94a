// src/services/firestore_client.rs
// DOCUMENTATION: Firestore REST v1 client
// PURPOSE: Read the mobile app's collections and mirror local writes back

use crate::config::Config;
use crate::errors::BoardError;
use chrono::{DateTime, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::json;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Page size used when listing collections
const LIST_PAGE_SIZE: u32 = 300;

/// Field map of a Firestore document
pub type Fields = HashMap<String, Value>;

/// Firestore typed value
/// DOCUMENTATION: Externally tagged exactly like the REST wire format,
/// e.g. `{"stringValue": "x"}` or `{"integerValue": "42"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    #[serde(with = "integer_string")]
    IntegerValue(i64),
    DoubleValue(f64),
    TimestampValue(DateTime<Utc>),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(LatLng),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: Fields,
}

/// Firestore encodes int64 as a JSON string; accept bare numbers too
mod integer_string {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Number(n) => Ok(n),
        }
    }
}

impl Value {
    pub fn null() -> Self {
        Value::NullValue(())
    }

    pub fn geo_point(lat: f64, lng: f64) -> Self {
        Value::GeoPointValue(LatLng {
            latitude: lat,
            longitude: lng,
        })
    }

    pub fn array<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Value::ArrayValue(ArrayValue {
            values: values.into_iter().collect(),
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::StringValue(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; integers widen to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::DoubleValue(d) => Some(*d),
            Value::IntegerValue(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Integer view; doubles are truncated
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::IntegerValue(i) => Some(*i),
            Value::DoubleValue(d) if d.is_finite() => Some(*d as i64),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::StringValue(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::StringValue(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::BooleanValue(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::IntegerValue(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::IntegerValue(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::DoubleValue(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::TimestampValue(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::NullValue(()))
    }
}

/// A document as returned by the REST API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    /// Last path segment of the resource name
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or("")
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        match self.get(field) {
            Some(Value::BooleanValue(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_geo_point(&self, field: &str) -> Option<LatLng> {
        match self.get(field) {
            Some(Value::GeoPointValue(p)) => Some(*p),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

/// Server-side field transform applied during a commit
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTransform {
    Increment { field: String, by: i64 },
    AppendMissingElements { field: String, values: Vec<Value> },
    RemoveAllFromArray { field: String, values: Vec<Value> },
}

impl FieldTransform {
    fn to_json(&self) -> serde_json::Value {
        match self {
            FieldTransform::Increment { field, by } => json!({
                "fieldPath": field,
                "increment": Value::IntegerValue(*by),
            }),
            FieldTransform::AppendMissingElements { field, values } => json!({
                "fieldPath": field,
                "appendMissingElements": ArrayValue { values: values.clone() },
            }),
            FieldTransform::RemoveAllFromArray { field, values } => json!({
                "fieldPath": field,
                "removeAllFromArray": ArrayValue { values: values.clone() },
            }),
        }
    }
}

/// One write of an atomic batch; paths are relative to the documents root
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Set { path: String, fields: Fields },
    Delete { path: String },
    Transform { path: String, transforms: Vec<FieldTransform> },
}

impl Write {
    fn to_json(&self, root: &str) -> serde_json::Value {
        match self {
            Write::Set { path, fields } => json!({
                "update": { "name": format!("{}/{}", root, path), "fields": fields }
            }),
            Write::Delete { path } => json!({ "delete": format!("{}/{}", root, path) }),
            Write::Transform { path, transforms } => json!({
                "transform": {
                    "document": format!("{}/{}", root, path),
                    "fieldTransforms": transforms.iter().map(FieldTransform::to_json).collect::<Vec<_>>(),
                }
            }),
        }
    }
}

/// Firestore REST client
/// DOCUMENTATION: Clone-cheap; every request waits on a shared rate limiter
#[derive(Clone)]
pub struct FirestoreClient {
    client: Client,
    base_url: String,
    project_id: String,
    access_token: Option<String>,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl FirestoreClient {
    pub fn new(
        base_url: String,
        project_id: String,
        access_token: Option<String>,
        requests_per_second: u32,
    ) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id,
            access_token,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
        }
    }

    /// Build a client when a project id is configured
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.firestore_enabled() {
            return None;
        }
        Some(Self::new(
            config.firestore_base_url.clone(),
            config.firestore_project_id.clone(),
            config.firebase_access_token.clone(),
            config.firestore_requests_per_second,
        ))
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// `projects/{id}/databases/(default)/documents`
    fn documents_root(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.documents_root(), path)
    }

    /// Rate-limit, authenticate and send; non-2xx becomes an error
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, BoardError> {
        self.limiter.until_ready().await;

        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            log::error!("Firestore {} request failed: {}", what, e);
            BoardError::ExternalApiError(format!("Request failed: {}", e))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(BoardError::NotFound(what.to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                log::error!("Firestore quota exceeded during {}", what);
                Err(BoardError::RateLimitExceeded)
            }
            _ => {
                log::error!("Firestore {} error {}: {}", what, status, body);
                Err(BoardError::ExternalApiError(format!(
                    "API error {}: {}",
                    status, body
                )))
            }
        }
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response, what: &str) -> Result<T, BoardError> {
        response.json::<T>().await.map_err(|e| {
            log::error!("Failed to parse Firestore {} response: {}", what, e);
            BoardError::ExternalApiError(format!("Parse error: {}", e))
        })
    }

    /// Every document of a collection (or subcollection path), all pages
    pub async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, BoardError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.url(collection))
                .query(&[("pageSize", LIST_PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = match self.send(request, collection).await {
                Ok(r) => r,
                // an absent collection lists as empty
                Err(BoardError::NotFound(_)) => break,
                Err(e) => return Err(e),
            };
            let page: ListDocumentsResponse = Self::parse(response, collection).await?;
            documents.extend(page.documents);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        log::debug!("Listed {} documents from {}", documents.len(), collection);
        Ok(documents)
    }

    pub async fn get_document(&self, path: &str) -> Result<Option<Document>, BoardError> {
        let request = self.client.get(self.url(path));
        match self.send(request, path).await {
            Ok(response) => Ok(Some(Self::parse(response, path).await?)),
            Err(BoardError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create or overwrite a document (PATCH without a mask)
    pub async fn set_document(&self, path: &str, fields: Fields) -> Result<Document, BoardError> {
        let request = self
            .client
            .patch(self.url(path))
            .json(&json!({ "fields": fields }));
        let response = self.send(request, path).await?;
        Self::parse(response, path).await
    }

    /// Add a document with a server-generated id
    pub async fn add_document(&self, collection: &str, fields: Fields) -> Result<Document, BoardError> {
        let request = self
            .client
            .post(self.url(collection))
            .json(&json!({ "fields": fields }));
        let response = self.send(request, collection).await?;
        Self::parse(response, collection).await
    }

    pub async fn delete_document(&self, path: &str) -> Result<(), BoardError> {
        let request = self.client.delete(self.url(path));
        self.send(request, path).await?;
        Ok(())
    }

    /// Apply writes atomically
    pub async fn commit(&self, writes: &[Write]) -> Result<(), BoardError> {
        if writes.is_empty() {
            return Ok(());
        }
        let root = self.documents_root();
        let body = json!({
            "writes": writes.iter().map(|w| w.to_json(&root)).collect::<Vec<_>>(),
        });
        let url = format!("{}/projects/{}/databases/(default)/documents:commit", self.base_url, self.project_id);
        let request = self.client.post(url).json(&body);
        self.send(request, "commit").await?;
        log::debug!("Committed {} Firestore writes", writes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_integer_values_are_strings_on_the_wire() {
        let encoded = serde_json::to_value(Value::IntegerValue(42)).unwrap();
        assert_eq!(encoded, json!({"integerValue": "42"}));

        let decoded: Value = serde_json::from_value(json!({"integerValue": "-7"})).unwrap();
        assert_eq!(decoded, Value::IntegerValue(-7));

        let bare: Value = serde_json::from_value(json!({"integerValue": 9})).unwrap();
        assert_eq!(bare, Value::IntegerValue(9));
    }

    #[test]
    fn test_null_and_option_conversion() {
        assert_eq!(serde_json::to_value(Value::null()).unwrap(), json!({"nullValue": null}));
        let none: Option<&str> = None;
        assert_eq!(Value::from(none), Value::null());
        assert_eq!(Value::from(Some("x")), Value::StringValue("x".into()));
    }

    #[test]
    fn test_decode_document() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/notes/abc123",
            "fields": {
                "note": {"stringValue": "hello"},
                "lat": {"doubleValue": 40.5},
                "lon": {"integerValue": "-3"},
                "likeCount": {"integerValue": "4"},
                "location": {"geoPointValue": {"latitude": 1.0, "longitude": 2.0}},
                "likedBy": {"arrayValue": {"values": [{"stringValue": "u1"}]}},
                "empty": {"arrayValue": {}},
                "timestamp": {"timestampValue": "2024-03-01T10:00:00.123Z"},
                "meta": {"mapValue": {"fields": {"k": {"booleanValue": true}}}}
            },
            "createTime": "2024-03-01T10:00:00Z",
            "updateTime": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(doc.id(), "abc123");
        assert_eq!(doc.get_str("note"), Some("hello"));
        assert_eq!(doc.get_f64("lat"), Some(40.5));
        assert_eq!(doc.get_f64("lon"), Some(-3.0));
        assert_eq!(doc.get_i64("likeCount"), Some(4));
        assert_eq!(
            doc.get_geo_point("location"),
            Some(LatLng { latitude: 1.0, longitude: 2.0 })
        );
        assert_eq!(doc.get("likedBy"), Some(&Value::array(vec!["u1".into()])));
        assert_eq!(doc.get("empty"), Some(&Value::array(Vec::new())));
        assert!(matches!(doc.get("timestamp"), Some(Value::TimestampValue(_))));
        assert!(matches!(doc.get("meta"), Some(Value::MapValue(_))));
        assert!(doc.get_str("missing").is_none());
    }

    #[test]
    fn test_timestamp_encoding() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let encoded = serde_json::to_value(Value::from(t)).unwrap();
        assert_eq!(encoded, json!({"timestampValue": "2024-01-02T03:04:05Z"}));
    }

    #[test]
    fn test_commit_write_shapes() {
        let root = "projects/p/databases/(default)/documents";

        let mut fields = Fields::new();
        fields.insert("followingId".into(), "b".into());
        let set = Write::Set { path: "users/a/following/b".into(), fields };
        assert_eq!(
            set.to_json(root),
            json!({"update": {
                "name": "projects/p/databases/(default)/documents/users/a/following/b",
                "fields": {"followingId": {"stringValue": "b"}}
            }})
        );

        let delete = Write::Delete { path: "users/b/followers/a".into() };
        assert_eq!(
            delete.to_json(root),
            json!({"delete": "projects/p/databases/(default)/documents/users/b/followers/a"})
        );

        let transform = Write::Transform {
            path: "notes/n1".into(),
            transforms: vec![
                FieldTransform::AppendMissingElements {
                    field: "likedBy".into(),
                    values: vec!["u1".into()],
                },
                FieldTransform::Increment { field: "likeCount".into(), by: 1 },
            ],
        };
        assert_eq!(
            transform.to_json(root),
            json!({"transform": {
                "document": "projects/p/databases/(default)/documents/notes/n1",
                "fieldTransforms": [
                    {"fieldPath": "likedBy", "appendMissingElements": {"values": [{"stringValue": "u1"}]}},
                    {"fieldPath": "likeCount", "increment": {"integerValue": "1"}}
                ]
            }})
        );
    }

    #[test]
    fn test_client_urls() {
        let client = FirestoreClient::new(
            "https://firestore.example/v1/".into(),
            "board".into(),
            None,
            0,
        );
        assert_eq!(
            client.url("notes/x"),
            "https://firestore.example/v1/projects/board/databases/(default)/documents/notes/x"
        );
        assert_eq!(client.project_id(), "board");
    }
}
