//! MCP runtime for the Slovak RegisterUZ public business registry.
//!
//! Speaks JSON-RPC 2.0 over stdio with Content-Length framing and exposes the
//! registry's read-only endpoints as typed tools. All HTTP access goes through
//! [`client::RegisterUzClient`]; this module owns the protocol surface.

use std::num::NonZeroUsize;

use clap::{Args, Subcommand};
use serde_json::{Map, Value, json};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::error;

pub mod client;
pub mod config;
pub mod types;

use client::{ClientError, RegisterUzClient, SchemaViolation};
use config::RegisterUzConfig;
use types::{EntityFilters, EntityKind, LegalForm, ParamError, SearchParams};

const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
const MCP_SERVER_NAME: &str = "registeruz-mcp";

#[derive(Subcommand, Clone, Debug)]
pub enum McpCommands {
    /// Serve MCP over stdio (stdout is the protocol channel)
    Serve,
    /// Probe registry reachability and print a readiness report
    Diagnose(McpDiagnoseArgs),
}

#[derive(Args, Clone, Debug)]
pub struct McpDiagnoseArgs {
    /// Entity type used for the remaining-count probe
    #[arg(long, default_value = "uctovne-jednotky")]
    pub entity_type: String,
}

pub async fn run(config: RegisterUzConfig, command: McpCommands) -> i32 {
    let client = match RegisterUzClient::new(config) {
        Ok(client) => client,
        Err(err) => {
            let payload = json!({
                "error": "client_init_failed",
                "message": err.to_string(),
            });
            eprintln!("{}", to_pretty_json(&payload));
            return 1;
        }
    };

    match command {
        McpCommands::Serve => {
            let server = McpServer::new(client);
            let stdin = io::stdin();
            let mut reader = BufReader::new(stdin);
            let mut stdout = io::stdout();
            match server.serve_stdio(&mut reader, &mut stdout).await {
                Ok(()) => 0,
                Err(err) => {
                    let payload = json!({
                        "error": "mcp_server_error",
                        "message": err,
                    });
                    eprintln!("{}", to_pretty_json(&payload));
                    1
                }
            }
        }
        McpCommands::Diagnose(args) => {
            let server = McpServer::new(client);
            match server.run_startup_diagnostics(&args).await {
                Ok(report) => {
                    println!("{}", to_pretty_json(&report));
                    if report
                        .get("status")
                        .and_then(Value::as_str)
                        .is_some_and(|status| status == "ready")
                    {
                        0
                    } else {
                        2
                    }
                }
                Err(err) => {
                    eprintln!("{}", to_pretty_json(&err.to_value()));
                    1
                }
            }
        }
    }
}

pub struct McpServer {
    client: RegisterUzClient,
}

impl McpServer {
    pub fn new(client: RegisterUzClient) -> Self {
        Self { client }
    }

    pub async fn serve_stdio<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<(), String>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let incoming = read_framed_json(reader)
                .await
                .map_err(|e| format!("Failed to read MCP message: {e}"))?;
            let Some(incoming) = incoming else {
                break;
            };

            let responses = self.handle_incoming_message(incoming).await;
            for response in responses {
                write_framed_json(writer, &response)
                    .await
                    .map_err(|e| format!("Failed to write MCP response: {e}"))?;
            }
        }

        Ok(())
    }

    pub async fn handle_incoming_message(&self, incoming: Value) -> Vec<Value> {
        let mut responses = Vec::new();

        if let Some(batch) = incoming.as_array() {
            if batch.is_empty() {
                responses.push(error_response(
                    Value::Null,
                    RpcError::invalid_request("Batch request must not be empty"),
                ));
                return responses;
            }
            for item in batch {
                if let Some(response) = self.handle_single_message(item.clone()).await {
                    responses.push(response);
                }
            }
            return responses;
        }

        if let Some(response) = self.handle_single_message(incoming).await {
            responses.push(response);
        }
        responses
    }

    async fn handle_single_message(&self, incoming: Value) -> Option<Value> {
        let Some(obj) = incoming.as_object() else {
            return Some(error_response(
                Value::Null,
                RpcError::invalid_request("Request must be a JSON object"),
            ));
        };

        if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            let id = obj.get("id").cloned().unwrap_or(Value::Null);
            return Some(error_response(
                id,
                RpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        let Some(method) = obj.get("method").and_then(Value::as_str) else {
            // Most likely a client response; server does not issue outbound requests.
            return None;
        };

        let params = obj.get("params").cloned().unwrap_or(Value::Null);
        if let Some(id) = obj.get("id").cloned() {
            let result = self.handle_request(method, params).await;
            Some(match result {
                Ok(payload) => success_response(id, payload),
                Err(err) => error_response(id, err),
            })
        } else {
            self.handle_notification(method, params);
            None
        }
    }

    fn handle_notification(&self, method: &str, _params: Value) {
        if matches!(
            method,
            "notifications/initialized" | "notifications/cancelled"
        ) {
            return;
        }
        // Unknown notifications are intentionally ignored.
    }

    async fn handle_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(self.initialize_payload()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.tools_list_payload()),
            "tools/call" => self.handle_tools_call(params).await,
            "resources/list" => Ok(json!({ "resources": [] })),
            "prompts/list" => Ok(json!({ "prompts": [] })),
            _ => Err(RpcError::method_not_found(method)),
        }
    }

    fn initialize_payload(&self) -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {
                "tools": {
                    "listChanged": false
                },
                "resources": {
                    "listChanged": false
                },
                "prompts": {
                    "listChanged": false
                }
            },
            "serverInfo": {
                "name": MCP_SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": "Read-only access to the Slovak RegisterUZ business registry. Listing tools return one page of identifiers plus a has_more flag; pass continue_after_id to walk pages manually, or use get_all_entity_ids for automatic pagination (expensive on large date ranges, cap it with max_total). Detail tools resolve one identifier to a full record."
        })
    }

    fn tools_list_payload(&self) -> Value {
        let tools: Vec<Value> = tool_definitions()
            .into_iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema,
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    async fn handle_tools_call(&self, params: Value) -> Result<Value, RpcError> {
        let params = params
            .as_object()
            .ok_or_else(|| RpcError::invalid_params("tools/call params must be an object"))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("tools/call requires string field 'name'"))?;

        let args = match params.get("arguments") {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(_) => {
                return Err(RpcError::invalid_params(
                    "tools/call 'arguments' must be an object",
                ));
            }
        };

        // Tool failures are reported in-band with isError, never as RPC errors.
        Ok(match self.execute_tool(name, &args).await {
            Ok(payload) => tool_call_result(name, payload, false),
            Err(err) => tool_call_result(name, err.to_value(), true),
        })
    }

    async fn execute_tool(
        &self,
        tool_name: &str,
        args: &Map<String, Value>,
    ) -> Result<Value, ToolError> {
        match tool_name {
            "search_accounting_entities" => self.tool_search_accounting_entities(args).await,
            "get_financial_statements" => {
                self.tool_list_ids(EntityKind::FinancialStatements, args).await
            }
            "get_financial_reports" => self.tool_list_ids(EntityKind::FinancialReports, args).await,
            "get_annual_reports" => self.tool_list_ids(EntityKind::AnnualReports, args).await,
            "get_templates" => self.tool_get_templates(args).await,
            "get_remaining_count" => self.tool_get_remaining_count(args).await,
            "get_all_entity_ids" => self.tool_get_all_entity_ids(args).await,
            "get_entity_suggestions" => self.tool_get_entity_suggestions(args).await,
            "get_accounting_entity_detail" => {
                let id = required_i64(args, "id")?;
                let detail = self.client.accounting_entity(id).await?;
                serialize_detail(&detail)
            }
            "get_financial_statement_detail" => {
                let id = required_i64(args, "id")?;
                let detail = self.client.financial_statement(id).await?;
                serialize_detail(&detail)
            }
            "get_financial_report_detail" => {
                let id = required_i64(args, "id")?;
                let detail = self.client.financial_report(id).await?;
                serialize_detail(&detail)
            }
            "get_annual_report_detail" => {
                let id = required_i64(args, "id")?;
                let detail = self.client.annual_report(id).await?;
                serialize_detail(&detail)
            }
            other => Err(ToolError::new(
                "unknown_tool",
                format!("Unknown tool: {other}"),
            )),
        }
    }

    async fn tool_search_accounting_entities(
        &self,
        args: &Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let params = listing_params_from_args(args)?.with_filters(filters_from_args(args)?);
        let page = self
            .client
            .list_ids(EntityKind::AccountingEntities, &params)
            .await?;
        let count = page.ids.len();
        Ok(json!({
            "ids": page.ids,
            "has_more": page.has_more,
            "count": count
        }))
    }

    async fn tool_list_ids(
        &self,
        kind: EntityKind,
        args: &Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let params = listing_params_from_args(args)?;
        let page = self.client.list_ids(kind, &params).await?;
        let count = page.ids.len();
        Ok(json!({
            "ids": page.ids,
            "has_more": page.has_more,
            "count": count
        }))
    }

    async fn tool_get_templates(&self, _args: &Map<String, Value>) -> Result<Value, ToolError> {
        let templates = self.client.templates().await?;
        let templates_data: Vec<Value> = templates
            .iter()
            .map(|template| {
                let mut info = json!({ "id": template.id });
                if let Some(name) = template.nazov.value() {
                    info["name"] = json!(name);
                }
                if let Some(regulation) = template.nariadenie_mf.value() {
                    info["regulation"] = json!(regulation);
                }
                if let Some(tables) = template.tabulky.value() {
                    info["tables_count"] = json!(tables.len());
                }
                info
            })
            .collect();
        let count = templates_data.len();
        Ok(json!({
            "templates": templates_data,
            "count": count
        }))
    }

    async fn tool_get_remaining_count(
        &self,
        args: &Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let kind = required_entity_kind(args)?;
        let params = SearchParams::new(self.client.config().default_from_date())
            .map_err(|err| ToolError::from(ClientError::from(err)))?;
        let count = self.client.remaining_count(kind, &params).await?;
        Ok(json!({
            "entity_type": kind.wire_name(),
            "remaining_count": count
        }))
    }

    async fn tool_get_all_entity_ids(
        &self,
        args: &Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let kind = required_entity_kind(args)?;
        let changed_from = arg_optional_string(args, "changed_from")?;
        let filters = filters_from_args(args)?;
        let max_total = match arg_optional_u64(args, "max_total")? {
            None => None,
            Some(raw) => Some(
                NonZeroUsize::new(raw as usize).ok_or_else(|| {
                    ToolError::new("validation_failed", "'max_total' must be at least 1")
                        .with_field("max_total")
                })?,
            ),
        };

        let ids = self
            .client
            .collect_all_ids(kind, changed_from.as_deref(), filters, max_total)
            .await?;
        let count = ids.len();
        Ok(json!({
            "entity_type": kind.wire_name(),
            "ids": ids,
            "count": count
        }))
    }

    async fn tool_get_entity_suggestions(
        &self,
        args: &Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let query = required_string(args, "query")?;
        let suggestions = self.client.suggestions(&query).await?;
        let count = suggestions.len();
        Ok(json!({
            "suggestions": suggestions,
            "count": count
        }))
    }

    pub async fn run_startup_diagnostics(
        &self,
        args: &McpDiagnoseArgs,
    ) -> Result<Value, ToolError> {
        let kind = EntityKind::from_wire(&args.entity_type).ok_or_else(|| {
            ToolError::new(
                "validation_failed",
                format!("Unknown entity type '{}'", args.entity_type),
            )
            .with_field("entity_type")
        })?;

        let mut checks = Vec::new();
        let mut healthy = true;

        match self.client.templates().await {
            Ok(templates) => checks.push(json!({
                "check": "templates",
                "ok": true,
                "template_count": templates.len()
            })),
            Err(err) => {
                healthy = false;
                checks.push(json!({
                    "check": "templates",
                    "ok": false,
                    "error": err.to_string()
                }));
            }
        }

        let params = SearchParams::new(self.client.config().default_from_date())
            .map_err(|err| ToolError::from(ClientError::from(err)))?;
        match self.client.remaining_count(kind, &params).await {
            Ok(count) => checks.push(json!({
                "check": "remaining_count",
                "entity_type": kind.wire_name(),
                "ok": true,
                "remaining_count": count
            })),
            Err(err) => {
                healthy = false;
                checks.push(json!({
                    "check": "remaining_count",
                    "entity_type": kind.wire_name(),
                    "ok": false,
                    "error": err.to_string()
                }));
            }
        }

        Ok(json!({
            "status": if healthy { "ready" } else { "degraded" },
            "server": MCP_SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "base_url": self.client.config().base_url(),
            "checks": checks
        }))
    }
}

fn serialize_detail<T: serde::Serialize>(detail: &T) -> Result<Value, ToolError> {
    serde_json::to_value(detail).map_err(|err| {
        ToolError::new(
            "schema_error",
            format!("Failed to serialize registry record: {err}"),
        )
    })
}

/// Shared argument parsing for the four listing tools: required changed_from,
/// optional continue_after_id and max_records.
fn listing_params_from_args(args: &Map<String, Value>) -> Result<SearchParams, ToolError> {
    let changed_from = required_string(args, "changed_from")?;
    let mut params = SearchParams::new(&changed_from)
        .map_err(|err| ToolError::from(ClientError::from(err)))?;
    if let Some(id) = arg_optional_i64(args, "continue_after_id")? {
        params = params.continue_after(id);
    }
    if let Some(max_records) = arg_optional_u64(args, "max_records")? {
        params = params
            .with_max_records(max_records)
            .map_err(|err| ToolError::from(ClientError::from(err)))?;
    }
    Ok(params)
}

fn filters_from_args(args: &Map<String, Value>) -> Result<EntityFilters, ToolError> {
    let legal_form = match arg_optional_string(args, "legal_form")? {
        None => None,
        Some(code) => Some(LegalForm::from_code(&code).ok_or_else(|| {
            ToolError::new(
                "validation_failed",
                format!("Unknown legal form code '{code}'"),
            )
            .with_field("legal_form")
        })?),
    };
    Ok(EntityFilters {
        ico: arg_optional_string(args, "ico")?,
        dic: arg_optional_string(args, "dic")?,
        legal_form,
    })
}

fn required_entity_kind(args: &Map<String, Value>) -> Result<EntityKind, ToolError> {
    let raw = required_string(args, "entity_type")?;
    EntityKind::from_wire(&raw).ok_or_else(|| {
        ToolError::new("validation_failed", format!("Unknown entity type '{raw}'"))
            .with_field("entity_type")
    })
}

fn tool_call_result(tool_name: &str, payload: Value, is_error: bool) -> Value {
    let envelope = if is_error {
        json!({
            "status": "error",
            "tool": tool_name,
            "error": payload
        })
    } else {
        json!({
            "status": "ok",
            "tool": tool_name,
            "data": payload
        })
    };

    if is_error {
        json!({
            "isError": true,
            "content": [{ "type": "text", "text": to_pretty_json(&envelope) }],
            "structuredContent": envelope
        })
    } else {
        json!({
            "content": [{ "type": "text", "text": to_pretty_json(&envelope) }],
            "structuredContent": envelope
        })
    }
}

#[derive(Debug)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
        }
    }

    fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {method}"),
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolError {
    code: String,
    message: String,
    field: Option<String>,
    details: Option<Value>,
}

impl ToolError {
    fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            field: None,
            details: None,
        }
    }

    fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn to_value(&self) -> Value {
        let mut payload = json!({
            "error": self.code,
            "message": self.message
        });
        if let Some(field) = &self.field {
            payload["field"] = Value::String(field.clone());
        }
        if let Some(details) = &self.details {
            payload["details"] = details.clone();
        }
        payload
    }
}

impl From<ClientError> for ToolError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidParams(param) => {
                let field = match &param {
                    ParamError::MaxRecordsOutOfRange(_) => "max_records",
                    ParamError::InvalidChangedSince(_) => "changed_from",
                    ParamError::FiltersNotSupported => "entity_type",
                };
                ToolError::new("validation_failed", param.to_string()).with_field(field)
            }
            ClientError::Transport(source) => {
                ToolError::new("transport_failure", source.to_string())
            }
            ClientError::Api { status } => {
                ToolError::new("api_error", format!("registry returned HTTP {status}"))
                    .with_details(json!({ "status": status }))
            }
            ClientError::Decode(source) => {
                // A non-JSON body is an upstream contract break, same as a
                // shape mismatch, and gets the same log treatment.
                error!(source = %source, "registry returned a non-JSON body");
                ToolError::new(
                    "schema_error",
                    format!("registry response body was not valid JSON: {source}"),
                )
            }
            ClientError::Schema {
                field,
                violation,
                detail,
            } => {
                // A schema violation means the registry broke its own
                // contract, which is worth surfacing in the server log.
                error!(field = %field, violation = violation.as_str(), "registry schema violation");
                let mut tool_err = ToolError::new("schema_error", detail)
                    .with_details(json!({ "violation": violation.as_str() }));
                if !field.is_empty() {
                    tool_err = tool_err.with_field(field);
                }
                tool_err
            }
        }
    }
}

struct ToolDefinition {
    name: &'static str,
    description: &'static str,
    input_schema: Value,
}

fn id_listing_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "changed_from": {
                "type": "string",
                "description": "Date from which to retrieve changed records (YYYY-MM-DD)",
                "pattern": "^\\d{4}-\\d{2}-\\d{2}$"
            },
            "continue_after_id": {
                "type": "integer",
                "description": "Continue pagination after this ID"
            },
            "max_records": {
                "type": "integer",
                "description": "Maximum records to return (1-10000)",
                "minimum": 1,
                "maximum": 10000
            }
        },
        "required": ["changed_from"]
    })
}

fn detail_schema(what: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {
                "type": "integer",
                "description": format!("The {what} ID")
            }
        },
        "required": ["id"]
    })
}

fn entity_type_enum() -> Value {
    Value::Array(
        EntityKind::ALL
            .into_iter()
            .map(|kind| Value::String(kind.wire_name().to_string()))
            .collect(),
    )
}

fn tool_definitions() -> Vec<ToolDefinition> {
    let legal_form_codes: Vec<Value> = LegalForm::ALL
        .into_iter()
        .map(|form| Value::String(form.code().to_string()))
        .collect();

    vec![
        ToolDefinition {
            name: "search_accounting_entities",
            description: "Search for accounting entities (companies) in the Slovak business register",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "changed_from": {
                        "type": "string",
                        "description": "Date from which to retrieve changed records (YYYY-MM-DD)",
                        "pattern": "^\\d{4}-\\d{2}-\\d{2}$"
                    },
                    "ico": {
                        "type": "string",
                        "description": "Company identification number (ICO)"
                    },
                    "dic": {
                        "type": "string",
                        "description": "Tax identification number (DIC)"
                    },
                    "legal_form": {
                        "type": "string",
                        "description": "Legal form code (e.g. '112' for s.r.o., '121' for a.s.)",
                        "enum": legal_form_codes.clone()
                    },
                    "continue_after_id": {
                        "type": "integer",
                        "description": "Continue pagination after this ID"
                    },
                    "max_records": {
                        "type": "integer",
                        "description": "Maximum records to return (1-10000)",
                        "minimum": 1,
                        "maximum": 10000
                    }
                },
                "required": ["changed_from"]
            }),
        },
        ToolDefinition {
            name: "get_financial_statements",
            description: "Get financial statement identifiers from the Slovak business register",
            input_schema: id_listing_schema(),
        },
        ToolDefinition {
            name: "get_financial_reports",
            description: "Get financial report identifiers from the Slovak business register",
            input_schema: id_listing_schema(),
        },
        ToolDefinition {
            name: "get_annual_reports",
            description: "Get annual report identifiers from the Slovak business register",
            input_schema: id_listing_schema(),
        },
        ToolDefinition {
            name: "get_templates",
            description: "Get all available report templates from the Slovak business register",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: "get_remaining_count",
            description: "Get count of remaining IDs for a specific entity type",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "entity_type": {
                        "type": "string",
                        "description": "Type of entity",
                        "enum": entity_type_enum()
                    }
                },
                "required": ["entity_type"]
            }),
        },
        ToolDefinition {
            name: "get_all_entity_ids",
            description: "Get all IDs for an entity type with automatic pagination (use carefully for large datasets)",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "entity_type": {
                        "type": "string",
                        "description": "Type of entity",
                        "enum": entity_type_enum()
                    },
                    "changed_from": {
                        "type": "string",
                        "description": "Date from which to retrieve changed records (YYYY-MM-DD)",
                        "pattern": "^\\d{4}-\\d{2}-\\d{2}$"
                    },
                    "ico": {
                        "type": "string",
                        "description": "Company identification number (ICO), only valid for uctovne-jednotky"
                    },
                    "dic": {
                        "type": "string",
                        "description": "Tax identification number (DIC), only valid for uctovne-jednotky"
                    },
                    "legal_form": {
                        "type": "string",
                        "description": "Legal form code, only valid for uctovne-jednotky",
                        "enum": legal_form_codes
                    },
                    "max_total": {
                        "type": "integer",
                        "description": "Maximum total records to retrieve",
                        "minimum": 1
                    }
                },
                "required": ["entity_type"]
            }),
        },
        ToolDefinition {
            name: "get_entity_suggestions",
            description: "Get entity name suggestions based on a search query",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search term to get suggestions for (partial entity name)",
                        "minLength": 1
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: "get_accounting_entity_detail",
            description: "Get detailed information about a specific accounting entity (company)",
            input_schema: detail_schema("accounting entity"),
        },
        ToolDefinition {
            name: "get_financial_statement_detail",
            description: "Get detailed information about a specific financial statement",
            input_schema: detail_schema("financial statement"),
        },
        ToolDefinition {
            name: "get_financial_report_detail",
            description: "Get detailed information about a specific financial report with data content",
            input_schema: detail_schema("financial report"),
        },
        ToolDefinition {
            name: "get_annual_report_detail",
            description: "Get detailed information about a specific annual report",
            input_schema: detail_schema("annual report"),
        },
    ]
}

fn required_string(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    let value = args.get(key).ok_or_else(|| {
        ToolError::new(
            "validation_failed",
            format!("Missing required field '{key}'"),
        )
        .with_field(key)
    })?;
    match value {
        Value::String(v) if !v.trim().is_empty() => Ok(v.clone()),
        Value::String(_) => Err(ToolError::new(
            "validation_failed",
            format!("'{key}' must not be empty"),
        )
        .with_field(key)),
        _ => Err(
            ToolError::new("validation_failed", format!("'{key}' must be a string"))
                .with_field(key),
        ),
    }
}

fn required_i64(args: &Map<String, Value>, key: &str) -> Result<i64, ToolError> {
    let value = args.get(key).ok_or_else(|| {
        ToolError::new(
            "validation_failed",
            format!("Missing required field '{key}'"),
        )
        .with_field(key)
    })?;
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| {
            ToolError::new("validation_failed", format!("'{key}' must be an integer"))
                .with_field(key)
        }),
        _ => Err(
            ToolError::new("validation_failed", format!("'{key}' must be an integer"))
                .with_field(key),
        ),
    }
}

fn arg_optional_string(args: &Map<String, Value>, key: &str) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(v)) if v.trim().is_empty() => Ok(None),
        Some(Value::String(v)) => Ok(Some(v.clone())),
        Some(_) => Err(
            ToolError::new("validation_failed", format!("'{key}' must be a string"))
                .with_field(key),
        ),
    }
}

fn arg_optional_i64(args: &Map<String, Value>, key: &str) -> Result<Option<i64>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| {
                ToolError::new("validation_failed", format!("'{key}' must be an integer"))
                    .with_field(key)
            })
            .map(Some),
        Some(_) => Err(
            ToolError::new("validation_failed", format!("'{key}' must be an integer"))
                .with_field(key),
        ),
    }
}

fn arg_optional_u64(args: &Map<String, Value>, key: &str) -> Result<Option<u64>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| {
                ToolError::new(
                    "validation_failed",
                    format!("'{key}' must be an unsigned integer"),
                )
                .with_field(key)
            })
            .map(Some),
        Some(_) => Err(ToolError::new(
            "validation_failed",
            format!("'{key}' must be an unsigned integer"),
        )
        .with_field(key)),
    }
}

fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

fn error_response(id: Value, error: RpcError) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": error.code,
            "message": error.message
        }
    })
}

async fn read_framed_json<R>(reader: &mut R) -> Result<Option<Value>, std::io::Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;

    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            if content_length.is_none() {
                return Ok(None);
            }
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Unexpected EOF while reading MCP headers",
            ));
        }

        if line == "\r\n" {
            break;
        }

        let line = line.trim_end_matches(['\r', '\n']);
        if line.to_ascii_lowercase().starts_with("content-length:") {
            let raw_len = line
                .split_once(':')
                .map(|(_, right)| right.trim())
                .unwrap_or_default();
            let parsed = raw_len.parse::<usize>().map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "Invalid Content-Length header",
                )
            })?;
            content_length = Some(parsed);
        }
    }

    let content_length = content_length.ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Missing Content-Length header",
        )
    })?;
    let mut payload = vec![0_u8; content_length];
    reader.read_exact(&mut payload).await?;

    let json: Value = serde_json::from_slice(&payload).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Invalid JSON payload: {e}"),
        )
    })?;
    Ok(Some(json))
}

async fn write_framed_json<W>(writer: &mut W, value: &Value) -> Result<(), std::io::Error>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(value).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to serialize JSON: {e}"),
        )
    })?;
    let header = format!(
        "Content-Length: {}\r\nContent-Type: application/json\r\n\r\n",
        body.len()
    );
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

fn to_pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        DEFAULT_BASE_URL, DEFAULT_FROM_DATE, DEFAULT_MAX_RECORDS, DEFAULT_SUGGESTION_URL,
        DEFAULT_TIMEOUT_SECS,
    };
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn server_for(base_url: &str) -> McpServer {
        let config = RegisterUzConfig::new(
            base_url,
            DEFAULT_SUGGESTION_URL,
            DEFAULT_TIMEOUT_SECS,
            DEFAULT_MAX_RECORDS,
            DEFAULT_FROM_DATE,
        )
        .expect("test configuration must construct");
        McpServer::new(RegisterUzClient::new(config).expect("client must construct"))
    }

    fn offline_server() -> McpServer {
        server_for(DEFAULT_BASE_URL)
    }

    fn args(pairs: Value) -> Map<String, Value> {
        pairs.as_object().expect("test args must be an object").clone()
    }

    #[test]
    fn tool_definitions_cover_the_full_surface() {
        let tools = tool_definitions();
        let names: Vec<&str> = tools.iter().map(|tool| tool.name).collect();
        assert_eq!(
            names,
            vec![
                "search_accounting_entities",
                "get_financial_statements",
                "get_financial_reports",
                "get_annual_reports",
                "get_templates",
                "get_remaining_count",
                "get_all_entity_ids",
                "get_entity_suggestions",
                "get_accounting_entity_detail",
                "get_financial_statement_detail",
                "get_financial_report_detail",
                "get_annual_report_detail",
            ]
        );
    }

    #[test]
    fn listing_schemas_require_changed_from() {
        for tool in tool_definitions() {
            if matches!(
                tool.name,
                "search_accounting_entities"
                    | "get_financial_statements"
                    | "get_financial_reports"
                    | "get_annual_reports"
            ) {
                assert_eq!(tool.input_schema["required"], json!(["changed_from"]), "{}", tool.name);
            }
        }
    }

    #[test]
    fn entity_type_schemas_enumerate_all_kinds() {
        let tools = tool_definitions();
        let all_ids = tools
            .iter()
            .find(|tool| tool.name == "get_all_entity_ids")
            .expect("get_all_entity_ids is defined");
        assert_eq!(
            all_ids.input_schema["properties"]["entity_type"]["enum"],
            json!(["uctovne-jednotky", "uctovne-zavierky", "uctovne-vykazy", "vyrocne-spravy"])
        );
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_in_band() {
        let server = offline_server();
        let err = server
            .execute_tool("get_everything", &Map::new())
            .await
            .expect_err("unknown tool must fail");
        assert_eq!(err.to_value()["error"], json!("unknown_tool"));
    }

    #[tokio::test]
    async fn missing_changed_from_fails_before_any_request() {
        let upstream = MockServer::start().await;
        let server = server_for(&upstream.uri());
        let err = server
            .execute_tool("get_financial_statements", &Map::new())
            .await
            .expect_err("missing changed_from must fail");
        let payload = err.to_value();
        assert_eq!(payload["error"], json!("validation_failed"));
        assert_eq!(payload["field"], json!("changed_from"));
        let requests = upstream.received_requests().await.expect("request recording is on");
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn wrong_typed_max_records_fails_before_any_request() {
        let upstream = MockServer::start().await;
        let server = server_for(&upstream.uri());
        let err = server
            .execute_tool(
                "get_annual_reports",
                &args(json!({ "changed_from": "2024-01-01", "max_records": "many" })),
            )
            .await
            .expect_err("string max_records must fail");
        assert_eq!(err.to_value()["field"], json!("max_records"));
        let requests = upstream.received_requests().await.expect("request recording is on");
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_max_records_fails_before_any_request() {
        let upstream = MockServer::start().await;
        let server = server_for(&upstream.uri());
        let err = server
            .execute_tool(
                "get_financial_reports",
                &args(json!({ "changed_from": "2024-01-01", "max_records": 0 })),
            )
            .await
            .expect_err("zero max_records must fail");
        let payload = err.to_value();
        assert_eq!(payload["error"], json!("validation_failed"));
        assert_eq!(payload["field"], json!("max_records"));
        let requests = upstream.received_requests().await.expect("request recording is on");
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn invalid_entity_type_is_a_validation_failure() {
        let server = offline_server();
        let err = server
            .execute_tool(
                "get_remaining_count",
                &args(json!({ "entity_type": "obchodny-register" })),
            )
            .await
            .expect_err("unknown entity type must fail");
        let payload = err.to_value();
        assert_eq!(payload["error"], json!("validation_failed"));
        assert_eq!(payload["field"], json!("entity_type"));
    }

    #[tokio::test]
    async fn zero_max_total_is_a_validation_failure() {
        let upstream = MockServer::start().await;
        let server = server_for(&upstream.uri());
        let err = server
            .execute_tool(
                "get_all_entity_ids",
                &args(json!({ "entity_type": "uctovne-jednotky", "max_total": 0 })),
            )
            .await
            .expect_err("zero max_total must fail");
        assert_eq!(err.to_value()["field"], json!("max_total"));
        let requests = upstream.received_requests().await.expect("request recording is on");
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn unknown_legal_form_is_a_validation_failure() {
        let server = offline_server();
        let err = server
            .execute_tool(
                "search_accounting_entities",
                &args(json!({ "changed_from": "2024-01-01", "legal_form": "999" })),
            )
            .await
            .expect_err("unknown legal form must fail");
        assert_eq!(err.to_value()["field"], json!("legal_form"));
    }

    #[tokio::test]
    async fn search_tool_returns_page_payload() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/uctovne-jednotky"))
            .and(query_param("ico", "12345678"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": [11, 12],
                "existujeDalsieId": true
            })))
            .mount(&upstream)
            .await;

        let server = server_for(&upstream.uri());
        let payload = server
            .execute_tool(
                "search_accounting_entities",
                &args(json!({ "changed_from": "2024-01-01", "ico": "12345678" })),
            )
            .await
            .expect("search must succeed");

        assert_eq!(payload, json!({ "ids": [11, 12], "has_more": true, "count": 2 }));
    }

    #[tokio::test]
    async fn get_all_entity_ids_walks_pages() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/uctovne-zavierky"))
            .and(query_param("pokracovat-za-id", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": [3],
                "existujeDalsieId": false
            })))
            .mount(&upstream)
            .await;
        Mock::given(method("GET"))
            .and(path("/uctovne-zavierky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": [1, 2],
                "existujeDalsieId": true
            })))
            .mount(&upstream)
            .await;

        let server = server_for(&upstream.uri());
        let payload = server
            .execute_tool(
                "get_all_entity_ids",
                &args(json!({ "entity_type": "uctovne-zavierky", "changed_from": "2024-01-01" })),
            )
            .await
            .expect("aggregation must succeed");

        assert_eq!(
            payload,
            json!({ "entity_type": "uctovne-zavierky", "ids": [1, 2, 3], "count": 3 })
        );
    }

    #[tokio::test]
    async fn get_all_entity_ids_forwards_entity_filters() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/uctovne-jednotky"))
            .and(query_param("ico", "12345678"))
            .and(query_param("pravna-forma", "112"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": [9],
                "existujeDalsieId": false
            })))
            .mount(&upstream)
            .await;

        let server = server_for(&upstream.uri());
        let payload = server
            .execute_tool(
                "get_all_entity_ids",
                &args(json!({
                    "entity_type": "uctovne-jednotky",
                    "changed_from": "2024-01-01",
                    "ico": "12345678",
                    "legal_form": "112"
                })),
            )
            .await
            .expect("filtered aggregation must succeed");

        assert_eq!(payload["ids"], json!([9]));
        let requests = upstream.received_requests().await.expect("request recording is on");
        assert_eq!(requests.len(), 1);
        let query = requests[0].url.query().unwrap_or("");
        assert!(query.contains("ico=12345678"));
        assert!(query.contains("pravna-forma=112"));
    }

    #[tokio::test]
    async fn get_all_entity_ids_rejects_filters_for_report_kinds() {
        let upstream = MockServer::start().await;
        let server = server_for(&upstream.uri());
        let err = server
            .execute_tool(
                "get_all_entity_ids",
                &args(json!({ "entity_type": "uctovne-zavierky", "ico": "12345678" })),
            )
            .await
            .expect_err("filters on statement aggregation must fail");
        assert_eq!(err.to_value()["error"], json!("validation_failed"));
        let requests = upstream.received_requests().await.expect("request recording is on");
        assert!(requests.is_empty());
    }

    #[test]
    fn get_all_entity_ids_schema_exposes_entity_filters() {
        let tools = tool_definitions();
        let all_ids = tools
            .iter()
            .find(|tool| tool.name == "get_all_entity_ids")
            .expect("get_all_entity_ids is defined");
        let properties = all_ids.input_schema["properties"]
            .as_object()
            .expect("schema has properties");
        for key in ["ico", "dic", "legal_form"] {
            assert!(properties.contains_key(key), "{key} missing from schema");
        }
    }

    #[tokio::test]
    async fn non_json_body_maps_to_schema_error() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/uctovne-jednotky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&upstream)
            .await;

        let server = server_for(&upstream.uri());
        let err = server
            .execute_tool(
                "search_accounting_entities",
                &args(json!({ "changed_from": "2024-01-01" })),
            )
            .await
            .expect_err("html body must fail");
        assert_eq!(err.to_value()["error"], json!("schema_error"));
    }

    #[tokio::test]
    async fn detail_tool_serializes_sparse_record() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/uctovna-jednotka"))
            .and(query_param("id", "55"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 55,
                "nazovUJ": "Example s.r.o.",
                "dic": null
            })))
            .mount(&upstream)
            .await;

        let server = server_for(&upstream.uri());
        let payload = server
            .execute_tool("get_accounting_entity_detail", &args(json!({ "id": 55 })))
            .await
            .expect("detail must succeed");

        assert_eq!(payload["id"], json!(55));
        assert_eq!(payload["nazovUJ"], json!("Example s.r.o."));
        assert_eq!(payload["dic"], Value::Null);
        assert!(!payload.as_object().unwrap().contains_key("ico"));
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_api_error() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sablony"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&upstream)
            .await;

        let server = server_for(&upstream.uri());
        let err = server
            .execute_tool("get_templates", &Map::new())
            .await
            .expect_err("502 must fail");
        let payload = err.to_value();
        assert_eq!(payload["error"], json!("api_error"));
        assert_eq!(payload["details"]["status"], json!(502));
    }

    #[tokio::test]
    async fn schema_violation_maps_to_schema_error() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/uctovne-jednotky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "not-a-list"
            })))
            .mount(&upstream)
            .await;

        let server = server_for(&upstream.uri());
        let err = server
            .execute_tool(
                "search_accounting_entities",
                &args(json!({ "changed_from": "2024-01-01" })),
            )
            .await
            .expect_err("malformed page must fail");
        let payload = err.to_value();
        assert_eq!(payload["error"], json!("schema_error"));
        assert_eq!(payload["field"], json!("id"));
        assert_eq!(payload["details"]["violation"], json!("wrongType"));
    }

    #[tokio::test]
    async fn tools_call_wraps_failures_with_is_error() {
        let server = offline_server();
        let result = server
            .handle_tools_call(json!({
                "name": "get_remaining_count",
                "arguments": { "entity_type": "nonsense" }
            }))
            .await
            .expect("tool failures stay in-band");

        assert_eq!(result["isError"], json!(true));
        assert_eq!(result["structuredContent"]["status"], json!("error"));
        assert_eq!(
            result["structuredContent"]["error"]["error"],
            json!("validation_failed")
        );
    }

    #[tokio::test]
    async fn tools_call_success_envelope_has_structured_content() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sablony"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sablony": [{ "id": 1, "nazov": "Súvaha" }]
            })))
            .mount(&upstream)
            .await;

        let server = server_for(&upstream.uri());
        let result = server
            .handle_tools_call(json!({ "name": "get_templates" }))
            .await
            .expect("templates must succeed");

        assert!(result.get("isError").is_none());
        assert_eq!(result["structuredContent"]["status"], json!("ok"));
        assert_eq!(
            result["structuredContent"]["data"]["templates"][0]["name"],
            json!("Súvaha")
        );
        assert_eq!(result["content"][0]["type"], json!("text"));
    }

    #[tokio::test]
    async fn initialize_reports_protocol_and_server_info() {
        let server = offline_server();
        let payload = server
            .handle_request("initialize", Value::Null)
            .await
            .expect("initialize must succeed");
        assert_eq!(payload["protocolVersion"], json!(MCP_PROTOCOL_VERSION));
        assert_eq!(payload["serverInfo"]["name"], json!(MCP_SERVER_NAME));
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let server = offline_server();
        let response = server
            .handle_single_message(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/uninstall"
            }))
            .await
            .expect("request with id must get a response");
        assert_eq!(response["error"]["code"], json!(-32601));
    }

    #[tokio::test]
    async fn wrong_jsonrpc_version_is_invalid_request() {
        let server = offline_server();
        let response = server
            .handle_single_message(json!({
                "jsonrpc": "1.0",
                "id": 7,
                "method": "ping"
            }))
            .await
            .expect("bad version must get a response");
        assert_eq!(response["error"]["code"], json!(-32600));
        assert_eq!(response["id"], json!(7));
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let server = offline_server();
        let response = server
            .handle_single_message(json!({
                "jsonrpc": "2.0",
                "method": "notifications/initialized"
            }))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn empty_batch_is_invalid_request() {
        let server = offline_server();
        let responses = server.handle_incoming_message(json!([])).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["error"]["code"], json!(-32600));
    }

    #[tokio::test]
    async fn batch_requests_are_answered_in_order() {
        let server = offline_server();
        let responses = server
            .handle_incoming_message(json!([
                { "jsonrpc": "2.0", "id": 1, "method": "ping" },
                { "jsonrpc": "2.0", "method": "notifications/initialized" },
                { "jsonrpc": "2.0", "id": 2, "method": "ping" }
            ]))
            .await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], json!(1));
        assert_eq!(responses[1]["id"], json!(2));
    }

    #[tokio::test]
    async fn framed_json_round_trips() {
        let (client_side, server_side) = io::duplex(4096);
        let (_read_half, mut write_half) = io::split(client_side);
        let (read_half, _server_write) = io::split(server_side);

        let message = json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" });
        write_framed_json(&mut write_half, &message)
            .await
            .expect("write must succeed");

        let mut reader = BufReader::new(read_half);
        let decoded = read_framed_json(&mut reader)
            .await
            .expect("read must succeed")
            .expect("one message was written");
        assert_eq!(decoded, message);
    }

    #[tokio::test]
    async fn framed_read_returns_none_at_eof() {
        let mut reader = BufReader::new(&b""[..]);
        let decoded = read_framed_json(&mut reader).await.expect("eof is clean");
        assert!(decoded.is_none());
    }

    #[tokio::test]
    async fn framed_read_rejects_missing_content_length() {
        let mut reader = BufReader::new(&b"Content-Type: application/json\r\n\r\n{}"[..]);
        let err = read_framed_json(&mut reader)
            .await
            .expect_err("missing length header must fail");
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn diagnostics_report_ready_when_probes_pass() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sablony"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sablony": [] })))
            .mount(&upstream)
            .await;
        Mock::given(method("GET"))
            .and(path("/zostavajuce-id/uctovne-jednotky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pocet": 42 })))
            .mount(&upstream)
            .await;

        let server = server_for(&upstream.uri());
        let report = server
            .run_startup_diagnostics(&McpDiagnoseArgs {
                entity_type: "uctovne-jednotky".to_string(),
            })
            .await
            .expect("diagnostics must succeed");
        assert_eq!(report["status"], json!("ready"));
    }

    #[tokio::test]
    async fn diagnostics_report_degraded_on_probe_failure() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sablony"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&upstream)
            .await;
        Mock::given(method("GET"))
            .and(path("/zostavajuce-id/uctovne-zavierky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pocet": 0 })))
            .mount(&upstream)
            .await;

        let server = server_for(&upstream.uri());
        let report = server
            .run_startup_diagnostics(&McpDiagnoseArgs {
                entity_type: "uctovne-zavierky".to_string(),
            })
            .await
            .expect("degraded is still a report");
        assert_eq!(report["status"], json!("degraded"));
    }

    #[test]
    fn schema_violation_names_are_stable() {
        assert_eq!(SchemaViolation::MissingField.as_str(), "missingField");
        assert_eq!(SchemaViolation::WrongType.as_str(), "wrongType");
    }
}
