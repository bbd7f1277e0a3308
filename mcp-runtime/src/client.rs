use std::num::NonZeroUsize;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::RegisterUzConfig;
use crate::types::{
    AccountingEntityDetail, AnnualReportDetail, EntityFilters, EntityKind, FinancialReportDetail,
    FinancialStatementDetail, IdPage, ParamError, SearchParams, Template, TemplatesResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaViolation {
    MissingField,
    WrongType,
}

impl SchemaViolation {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaViolation::MissingField => "missingField",
            SchemaViolation::WrongType => "wrongType",
        }
    }
}

/// Everything that can go wrong between a tool call and a decoded upstream
/// response. Transport, status, and shape failures stay distinct so the
/// dispatcher can report each under its own error code.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to the registry failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("registry returned HTTP {status}")]
    Api { status: u16 },
    #[error("registry response body was not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("registry response violated the expected schema at '{field}': {detail}")]
    Schema {
        field: String,
        violation: SchemaViolation,
        detail: String,
    },
    #[error(transparent)]
    InvalidParams(#[from] ParamError),
}

impl ClientError {
    fn missing(field: &str) -> Self {
        ClientError::Schema {
            field: field.to_string(),
            violation: SchemaViolation::MissingField,
            detail: format!("required field '{field}' is missing"),
        }
    }

    fn wrong_type(field: &str, expected: &str) -> Self {
        ClientError::Schema {
            field: field.to_string(),
            violation: SchemaViolation::WrongType,
            detail: format!("field '{field}' is not {expected}"),
        }
    }
}

/// Typed client for the RegisterUZ public API. Owns one connection pool for
/// the lifetime of the server.
#[derive(Debug, Clone)]
pub struct RegisterUzClient {
    config: RegisterUzConfig,
    http: reqwest::Client,
}

impl RegisterUzClient {
    pub fn new(config: RegisterUzConfig) -> Result<Self, ClientError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("registeruz-mcp/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(ClientError::Transport)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &RegisterUzConfig {
        &self.config
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url(), path)
    }

    /// One GET round trip: connection or timeout failures become
    /// `Transport`, non-2xx statuses become `Api`, non-JSON bodies become
    /// `Decode`. Shape checks happen in the typed decoders, not here.
    async fn fetch(&self, url: &str, query: &[(String, String)]) -> Result<Value, ClientError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(ClientError::Decode)
    }

    /// Fetches one listing page for `kind` and decodes it into an [`IdPage`].
    pub async fn list_ids(
        &self,
        kind: EntityKind,
        params: &SearchParams,
    ) -> Result<IdPage, ClientError> {
        if kind != EntityKind::AccountingEntities && !params.filters().is_empty() {
            return Err(ParamError::FiltersNotSupported.into());
        }
        let body = self
            .fetch(&self.api_url(kind.list_path()), &params.to_query())
            .await?;
        decode_id_page(&body)
    }

    /// Walks the cursor-paginated listing until the registry reports no more
    /// data, returning every id in server order. All-or-nothing: any failure
    /// mid-walk discards the partial result.
    pub async fn collect_all_ids(
        &self,
        kind: EntityKind,
        changed_since: Option<&str>,
        filters: EntityFilters,
        max_total: Option<NonZeroUsize>,
    ) -> Result<Vec<i64>, ClientError> {
        let changed_since = changed_since.unwrap_or(self.config.default_from_date());
        let mut params = SearchParams::new(changed_since)?.with_filters(filters);
        if kind != EntityKind::AccountingEntities && !params.filters().is_empty() {
            return Err(ParamError::FiltersNotSupported.into());
        }
        params.set_page_size(self.config.max_records());

        let mut all_ids: Vec<i64> = Vec::new();
        let mut pages = 0usize;
        loop {
            let page = self.list_ids(kind, &params).await?;
            pages += 1;
            all_ids.extend_from_slice(&page.ids);

            if let Some(cap) = max_total {
                if all_ids.len() >= cap.get() {
                    all_ids.truncate(cap.get());
                    debug!(
                        entity_type = kind.wire_name(),
                        pages,
                        total = all_ids.len(),
                        "id aggregation stopped at requested cap"
                    );
                    return Ok(all_ids);
                }
            }

            if !page.has_more {
                break;
            }
            let Some(last_id) = page.ids.last().copied() else {
                // The registry claims more data but returned no cursor to
                // continue from; stopping here avoids refetching page one
                // forever.
                warn!(
                    entity_type = kind.wire_name(),
                    pages, "registry reported more data on an empty page, stopping"
                );
                break;
            };
            params = params.continue_after(last_id);
        }

        debug!(
            entity_type = kind.wire_name(),
            pages,
            total = all_ids.len(),
            "id aggregation complete"
        );
        Ok(all_ids)
    }

    /// How many records of `kind` remain after a given change date.
    pub async fn remaining_count(
        &self,
        kind: EntityKind,
        params: &SearchParams,
    ) -> Result<u64, ClientError> {
        if !params.filters().is_empty() {
            return Err(ParamError::FiltersNotSupported.into());
        }
        let url = self.api_url(&format!("/zostavajuce-id/{}", kind.wire_name()));
        let body = self.fetch(&url, &params.to_query()).await?;
        match body.get("pocet") {
            None => Err(ClientError::missing("pocet")),
            Some(count) => count
                .as_u64()
                .ok_or_else(|| ClientError::wrong_type("pocet", "a non-negative integer")),
        }
    }

    pub async fn templates(&self) -> Result<Vec<Template>, ClientError> {
        let body = self.fetch(&self.api_url("/sablony"), &[]).await?;
        let parsed: TemplatesResponse =
            serde_json::from_value(body).map_err(classify_schema_error)?;
        Ok(parsed.sablony)
    }

    /// Free-text entity name suggestions. This endpoint lives outside the
    /// main API base and its response shape is not documented, so decoding
    /// is intentionally forgiving.
    pub async fn suggestions(&self, query: &str) -> Result<Vec<Value>, ClientError> {
        let body = self
            .fetch(
                self.config.suggestion_url(),
                &[("query".to_string(), query.to_string())],
            )
            .await?;
        Ok(match body {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("suggestions") {
                Some(Value::Array(items)) => items,
                Some(other) => vec![other],
                None => vec![Value::Object(map)],
            },
            other => vec![other],
        })
    }

    pub async fn accounting_entity(&self, id: i64) -> Result<AccountingEntityDetail, ClientError> {
        self.detail(EntityKind::AccountingEntities, id).await
    }

    pub async fn financial_statement(
        &self,
        id: i64,
    ) -> Result<FinancialStatementDetail, ClientError> {
        self.detail(EntityKind::FinancialStatements, id).await
    }

    pub async fn financial_report(&self, id: i64) -> Result<FinancialReportDetail, ClientError> {
        self.detail(EntityKind::FinancialReports, id).await
    }

    pub async fn annual_report(&self, id: i64) -> Result<AnnualReportDetail, ClientError> {
        self.detail(EntityKind::AnnualReports, id).await
    }

    async fn detail<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        id: i64,
    ) -> Result<T, ClientError> {
        let body = self
            .fetch(
                &self.api_url(kind.detail_path()),
                &[("id".to_string(), id.to_string())],
            )
            .await?;
        serde_json::from_value(body).map_err(classify_schema_error)
    }
}

/// Decodes a listing page by hand. Absent `id` or `existujeDalsieId` keys are
/// tolerated (empty page, final page); present keys of the wrong type are
/// schema violations.
fn decode_id_page(body: &Value) -> Result<IdPage, ClientError> {
    let ids = match body.get("id") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut ids = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let id = item
                    .as_i64()
                    .ok_or_else(|| ClientError::wrong_type(&format!("id[{index}]"), "an integer"))?;
                ids.push(id);
            }
            ids
        }
        Some(_) => return Err(ClientError::wrong_type("id", "an array of integers")),
    };

    let has_more = match body.get("existujeDalsieId") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => return Err(ClientError::wrong_type("existujeDalsieId", "a boolean")),
    };

    Ok(IdPage { ids, has_more })
}

/// serde reports missing required fields with a fixed message prefix; every
/// other decode failure is a wrong-type violation.
fn classify_schema_error(err: serde_json::Error) -> ClientError {
    let detail = err.to_string();
    if let Some(rest) = detail.strip_prefix("missing field `") {
        let field = rest.split('`').next().unwrap_or("").to_string();
        return ClientError::Schema {
            field,
            violation: SchemaViolation::MissingField,
            detail,
        };
    }
    ClientError::Schema {
        field: String::new(),
        violation: SchemaViolation::WrongType,
        detail,
    }
}
