//! Collection site REST client
//!
//! Looks items up through the site's `/api/items` endpoint using a property
//! equality filter on the identifier property. The first matching item gives
//! the instance ID (`o:id`); its statement count is the number of values
//! across all vocabulary properties (`dcterms:title`, `schema:author`, ...).

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{CatalogError, CatalogMapping, CatalogSource, Lookup};

const USER_AGENT: &str = concat!("agm-integrate/", env!("CARGO_PKG_VERSION"));

/// Remote catalog service client
pub struct RemoteCatalog {
    http_client: reqwest::Client,
    items_url: String,
    identifier_property: String,
    credentials: Option<(String, String)>,
}

impl RemoteCatalog {
    /// Create a client for the site rooted at `base_url`
    ///
    /// `timeout` bounds every request; an expired request counts as a lookup
    /// failure.
    pub fn new(
        base_url: &str,
        identifier_property: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            items_url: format!("{}/api/items", base_url.trim_end_matches('/')),
            identifier_property: identifier_property.into(),
            credentials: None,
        })
    }

    /// Attach API key credentials sent with every request
    pub fn with_credentials(mut self, key_identity: String, key_credential: String) -> Self {
        self.credentials = Some((key_identity, key_credential));
        self
    }

    fn query_params(&self, key: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("property[0][property]", self.identifier_property.clone()),
            ("property[0][type]", "eq".to_string()),
            ("property[0][text]", key.to_string()),
        ];
        self.push_credentials(&mut params);
        params
    }

    fn push_credentials(&self, params: &mut Vec<(&'static str, String)>) {
        if let Some((identity, credential)) = &self.credentials {
            params.push(("key_identity", identity.clone()));
            params.push(("key_credential", credential.clone()));
        }
    }
}

#[async_trait]
impl CatalogSource for RemoteCatalog {
    fn source_id(&self) -> &'static str {
        "catalog-api"
    }

    async fn lookup(&self, key: &str) -> Result<Lookup, CatalogError> {
        tracing::debug!(key = %key, url = %self.items_url, "Querying catalog service");

        let response = self
            .http_client
            .get(&self.items_url)
            .query(&self.query_params(key))
            .send()
            .await
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError(status.as_u16(), error_text));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;

        parse_items_response(key, &body)
    }

    async fn probe(&self) -> bool {
        let mut params = vec![("per_page", "1".to_string())];
        self.push_credentials(&mut params);

        match self.http_client.get(&self.items_url).query(&params).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::debug!(status = response.status().as_u16(), "Catalog probe rejected");
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "Catalog probe failed");
                false
            }
        }
    }
}

/// Interpret an `/api/items` response body for `key`
///
/// An empty array is `NotFound`; anything other than an array of objects is a
/// parse error.
pub fn parse_items_response(key: &str, body: &Value) -> Result<Lookup, CatalogError> {
    let items = body
        .as_array()
        .ok_or_else(|| CatalogError::ParseError("expected an array of items".to_string()))?;

    let Some(item) = items.first() else {
        return Ok(Lookup::NotFound);
    };
    let item = item
        .as_object()
        .ok_or_else(|| CatalogError::ParseError("item is not an object".to_string()))?;

    let instance_id = match item.get("o:id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => return Err(CatalogError::ParseError("item has no o:id".to_string())),
    };

    if items.len() > 1 {
        tracing::debug!(key = %key, matches = items.len(), "Several catalog items share key, using first");
    }

    let existing_entity_count: usize = item
        .iter()
        .filter(|(name, _)| is_vocabulary_property(name))
        .filter_map(|(_, value)| value.as_array())
        .map(Vec::len)
        .sum();

    Ok(Lookup::Found(CatalogMapping {
        id: key.to_string(),
        instance_id,
        existing_entity_count,
    }))
}

/// `prefix:local` terms other than system (`o:`) and JSON-LD (`@`) keys
fn is_vocabulary_property(name: &str) -> bool {
    !name.starts_with("o:") && !name.starts_with('@') && name.contains(':')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_statements_are_counted() {
        let body = json!([{
            "@id": "https://collection.example.org/api/items/3405",
            "@type": "o:Item",
            "o:id": 3405,
            "o:is_public": true,
            "o:item_set": [{"o:id": 1}],
            "dcterms:identifier": [{"@value": "A737"}],
            "dcterms:title": [{"@value": "Space Trek"}, {"@value": "スペーストレック"}],
            "schema:author": [{"@value": "Jane"}]
        }]);

        let lookup = parse_items_response("A737", &body).unwrap();
        assert_eq!(
            lookup,
            Lookup::Found(CatalogMapping {
                id: "A737".to_string(),
                instance_id: "3405".to_string(),
                existing_entity_count: 4,
            })
        );
    }

    #[test]
    fn test_empty_result_is_not_found() {
        assert_eq!(parse_items_response("A737", &json!([])).unwrap(), Lookup::NotFound);
    }

    #[test]
    fn test_unexpected_shape_is_parse_error() {
        let err = parse_items_response("A737", &json!({"errors": "denied"})).unwrap_err();
        assert!(matches!(err, CatalogError::ParseError(_)));

        let err = parse_items_response("A737", &json!([{"dcterms:title": []}])).unwrap_err();
        assert!(matches!(err, CatalogError::ParseError(_)));
    }

    #[test]
    fn test_string_instance_id_accepted() {
        let lookup = parse_items_response("B1", &json!([{"o:id": "77"}])).unwrap();
        match lookup {
            Lookup::Found(mapping) => {
                assert_eq!(mapping.instance_id, "77");
                assert_eq!(mapping.existing_entity_count, 0);
            }
            Lookup::NotFound => panic!("expected a mapping"),
        }
    }

    #[test]
    fn test_query_carries_identifier_filter_and_credentials() {
        let client = RemoteCatalog::new(
            "https://collection.example.org/",
            "dcterms:identifier",
            Duration::from_secs(5),
        )
        .unwrap()
        .with_credentials("id".to_string(), "secret".to_string());

        assert_eq!(client.items_url, "https://collection.example.org/api/items");
        let params = client.query_params("A737");
        assert!(params.contains(&("property[0][property]", "dcterms:identifier".to_string())));
        assert!(params.contains(&("property[0][text]", "A737".to_string())));
        assert!(params.contains(&("key_credential", "secret".to_string())));
    }

    #[tokio::test]
    async fn test_unreachable_service_fails_probe() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let client =
            RemoteCatalog::new("http://127.0.0.1:9", "dcterms:identifier", Duration::from_millis(500)).unwrap();
        assert!(!client.probe().await);
        assert!(client.lookup("A737").await.is_err());
    }
}
