use super::{FirebaseConfig, endpoint_url, error_from_response};
use crate::provider::{Document, Identity, ProviderError, UserDirectory};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

/// Firestore REST client (`projects/*/databases/(default)/documents`).
#[derive(Clone, Debug)]
pub struct FirestoreDirectory {
    client: Client,
    config: FirebaseConfig,
}

#[derive(Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<FirestoreDocument>,
}

impl FirestoreDocument {
    fn into_document(self) -> Document {
        let id = self
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        Document::new(id, decode_fields(&self.fields))
    }
}

impl FirestoreDirectory {
    #[must_use]
    pub fn new(client: Client, config: FirebaseConfig) -> Self {
        Self { client, config }
    }

    /// GET one document; with `id_token` the read runs as that user.
    async fn fetch(
        &self,
        collection: &str,
        id: &str,
        id_token: Option<&SecretString>,
    ) -> Result<Option<Document>, ProviderError> {
        let mut segments = self.documents_path().to_vec();
        segments.extend([collection, id]);

        let url = endpoint_url(&self.config.firestore_url, &segments)?;

        let mut request = self
            .client
            .get(url)
            .query(&[("key", self.config.api_key.expose_secret())]);

        if let Some(token) = id_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("document {}/{} not found", collection, id);

            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let document: FirestoreDocument = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("get document: {e}")))?;

        Ok(Some(document.into_document()))
    }

    fn documents_path(&self) -> [&str; 6] {
        [
            "v1",
            "projects",
            self.config.project_id.as_str(),
            "databases",
            "(default)",
            "documents",
        ]
    }
}

/// Decode a Firestore `fields` map into plain JSON.
#[must_use]
pub fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), decode_value(value)))
        .collect()
}

/// Decode one typed Firestore value (`{"integerValue": "1"}`) into plain JSON.
///
/// `integerValue` is transported as a string and becomes a JSON number;
/// timestamps, references and bytes stay strings.
#[must_use]
pub fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|object| object.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "integerValue" => inner
            .as_str()
            .and_then(|raw| raw.parse::<i64>().ok())
            .map_or_else(|| inner.clone(), Value::from),
        "mapValue" => inner
            .get("fields")
            .and_then(Value::as_object)
            .map_or_else(|| Value::Object(Map::new()), |fields| {
                Value::Object(decode_fields(fields))
            }),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        _ => inner.clone(),
    }
}

#[async_trait]
impl UserDirectory for FirestoreDirectory {
    #[instrument(skip(self, value), fields(value_len = value.len()))]
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, ProviderError> {
        let mut url = endpoint_url(&self.config.firestore_url, &self.documents_path())?;

        // runQuery is a custom method on the documents resource
        let path = format!("{}:runQuery", url.path());
        url.set_path(&path);

        let query = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": { "stringValue": value },
                    }
                }
            }
        });

        debug!("firestore query URL: {}", url);

        let response = self
            .client
            .post(url)
            .query(&[("key", self.config.api_key.expose_secret())])
            .json(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        // An empty result is a single item carrying only `readTime`
        let items: Vec<RunQueryItem> = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("runQuery: {e}")))?;

        Ok(items
            .into_iter()
            .filter_map(|item| item.document)
            .map(FirestoreDocument::into_document)
            .collect())
    }

    #[instrument(skip(self))]
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, ProviderError> {
        self.fetch(collection, id, None).await
    }

    #[instrument(skip(self, identity), fields(uid = %identity.uid))]
    async fn get_as(
        &self,
        identity: &Identity,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, ProviderError> {
        self.fetch(collection, id, Some(&identity.id_token)).await
    }
}
