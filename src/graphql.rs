// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - GraphQL IDOR Probes
 * Schema introspection and alias-batching access tests
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::http_client::{HttpMethod, HttpResponse, SmartClient};

/// Alias-batch size per request; keeps query documents bounded.
const MAX_BATCH_SIZE: usize = 50;

/// Argument names that suggest an object identifier.
const ID_ARG_NAMES: &[&str] = &["id", "userid", "user_id", "accountid", "resourceid", "objectid"];

const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    types {
      name
      fields {
        name
        args {
          name
          type { name }
        }
      }
    }
  }
}"#;

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldArg {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(default)]
    pub args: Vec<FieldArg>,
}

/// Queries discovered via introspection that take an id-shaped argument.
#[derive(Debug, Default)]
pub struct IntrospectionResult {
    pub object_queries: Vec<SchemaField>,
}

/// Outcome of probing one query with a known-valid and a foreign id.
#[derive(Debug)]
pub struct QueryProbeResult {
    pub query_name: String,
    pub valid_status: u16,
    pub foreign_status: u16,
    pub is_vulnerable: bool,
    pub evidence: String,
}

/// IDOR probes against a GraphQL endpoint.
pub struct GraphQlTester<'a> {
    client: &'a SmartClient,
    endpoint: String,
    session: Option<String>,
}

impl<'a> GraphQlTester<'a> {
    pub fn new(client: &'a SmartClient, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            session: None,
        }
    }

    pub fn with_session(mut self, session: &str) -> Self {
        self.session = Some(session.to_string());
        self
    }

    /// Fetch the schema and pick out queries whose arguments look like
    /// object identifiers.
    pub async fn introspect(&self) -> Result<IntrospectionResult> {
        let response = self.execute(INTROSPECTION_QUERY).await?;
        let parsed: Value =
            serde_json::from_str(&response.body).context("Introspection response is not JSON")?;

        let mut result = IntrospectionResult::default();

        let types = parsed
            .pointer("/data/__schema/types")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for type_value in types {
            let fields: Vec<SchemaField> = type_value
                .get("fields")
                .and_then(|f| serde_json::from_value(f.clone()).ok())
                .unwrap_or_default();

            for field in fields {
                if field.args.iter().any(|arg| is_id_argument(&arg.name)) {
                    result.object_queries.push(field);
                }
            }
        }

        info!(
            "Introspection found {} object-scoped queries",
            result.object_queries.len()
        );
        Ok(result)
    }

    /// Probe one query with the caller's own id and a foreign id under the
    /// same session. Vulnerable only on a real differential: the foreign
    /// id must come back 200 with data and without a GraphQL error block.
    pub async fn test_query(
        &self,
        query_name: &str,
        id_arg: &str,
        valid_id: &str,
        foreign_id: &str,
    ) -> Result<QueryProbeResult> {
        let valid_doc = build_object_query(query_name, id_arg, valid_id);
        let valid_resp = self.execute(&valid_doc).await?;

        let foreign_doc = build_object_query(query_name, id_arg, foreign_id);
        let foreign_resp = self.execute(&foreign_doc).await?;

        let foreign_has_data = response_has_data(&foreign_resp.body, query_name);
        let foreign_has_errors = foreign_resp.body.contains("\"errors\"");

        let is_vulnerable = valid_resp.status_code == 200
            && foreign_resp.status_code == 200
            && foreign_has_data
            && !foreign_has_errors;

        let evidence = if is_vulnerable {
            format!(
                "Foreign id {:?} returned data under the same session as {:?}",
                foreign_id, valid_id
            )
        } else {
            String::new()
        };

        Ok(QueryProbeResult {
            query_name: query_name.to_string(),
            valid_status: valid_resp.status_code,
            foreign_status: foreign_resp.status_code,
            is_vulnerable,
            evidence,
        })
    }

    /// Alias-batching probe: one document querying many ids at once.
    /// Returns the ids that came back with data.
    pub async fn test_batch(
        &self,
        query_name: &str,
        id_arg: &str,
        ids: &[String],
    ) -> Result<Vec<String>> {
        let mut accessible = Vec::new();

        for chunk in ids.chunks(MAX_BATCH_SIZE) {
            let doc = build_batch_query(query_name, id_arg, chunk);
            let response = match self.execute(&doc).await {
                Ok(response) => response,
                Err(err) => {
                    debug!("Batch chunk failed: {}", err);
                    continue;
                }
            };

            let parsed: Value = match serde_json::from_str(&response.body) {
                Ok(parsed) => parsed,
                Err(_) => continue,
            };

            if let Some(data) = parsed.get("data").and_then(Value::as_object) {
                for (idx, id) in chunk.iter().enumerate() {
                    let alias = format!("q{}", idx);
                    if data.get(&alias).map(|v| !v.is_null()).unwrap_or(false) {
                        accessible.push(id.clone());
                    }
                }
            }
        }

        Ok(accessible)
    }

    async fn execute(&self, query: &str) -> Result<HttpResponse> {
        let request = GraphQlRequest {
            query,
            variables: None,
        };
        let body = serde_json::to_string(&request)?;

        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        self.client
            .execute(
                HttpMethod::Post,
                &self.endpoint,
                &headers,
                self.session.as_deref(),
                Some(&body),
            )
            .await
            .context("GraphQL request failed")
    }
}

fn build_object_query(query_name: &str, id_arg: &str, id: &str) -> String {
    format!(
        "query {{ {}({}: \"{}\") {{ id }} }}",
        query_name,
        id_arg,
        escape(id)
    )
}

fn build_batch_query(query_name: &str, id_arg: &str, ids: &[String]) -> String {
    let parts: Vec<String> = ids
        .iter()
        .enumerate()
        .map(|(idx, id)| {
            format!(
                "q{}: {}({}: \"{}\") {{ id }}",
                idx,
                query_name,
                id_arg,
                escape(id)
            )
        })
        .collect();
    format!("query {{ {} }}", parts.join(" "))
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn is_id_argument(name: &str) -> bool {
    let lower = name.to_lowercase();
    ID_ARG_NAMES.iter().any(|candidate| lower.contains(candidate))
}

fn response_has_data(body: &str, query_name: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer(&format!("/data/{}", query_name)).cloned())
        .map(|v| !v.is_null())
        .unwrap_or(false)
}
