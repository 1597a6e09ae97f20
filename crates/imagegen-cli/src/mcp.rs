use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use imagegen_contracts::requests::ImageGenerationRequest;
use imagegen_contracts::ImageGenError;
use imagegen_engine::config::{SERVER_NAME, SERVER_VERSION};
use imagegen_engine::ImageGenService;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::tools::{text_content, tool_schemas, GENERATE_IMAGE, LIST_MODELS};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<ImageGenError> for JsonRpcError {
    fn from(err: ImageGenError) -> Self {
        Self {
            code: INTERNAL_ERROR,
            message: err.to_string(),
            data: Some(json!({ "kind": err.kind() })),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Line-delimited JSON-RPC server exposing the image tools.
pub struct McpServer {
    service: ImageGenService,
}

impl McpServer {
    pub fn new(service: ImageGenService) -> Self {
        Self { service }
    }

    /// Reads requests until EOF, writing one response line per request.
    pub fn serve<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<()> {
        info!("{SERVER_NAME} {SERVER_VERSION} listening on stdio");
        for line in input.lines() {
            let line = line.context("failed reading request line")?;
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line) {
                let encoded =
                    serde_json::to_string(&response).context("failed encoding response")?;
                writeln!(output, "{encoded}").context("failed writing response")?;
                output.flush().context("failed flushing response")?;
            }
        }
        info!("stdin closed, shutting down");
        Ok(())
    }

    pub fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let raw: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                warn!("unparseable request: {err}");
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(PARSE_ERROR, format!("Parse error: {err}")),
                ));
            }
        };
        let fallback_id = raw.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(err) => {
                return Some(JsonRpcResponse::failure(
                    fallback_id,
                    JsonRpcError::new(INVALID_REQUEST, format!("Invalid request: {err}")),
                ));
            }
        };
        self.handle_request(request)
    }

    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("received {}", request.method);
        let Some(id) = request.id else {
            // Notifications never get a reply, known or not.
            return None;
        };
        if request.jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(INVALID_REQUEST, "Invalid request: jsonrpc must be \"2.0\""),
            ));
        }
        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize(request.params.as_ref())),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tool_schemas(self.service.registry()) })),
            "tools/call" => self.call_tool(request.params),
            other => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        };
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let protocol_version = params
            .and_then(|params| params.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);
        json!({
            "protocolVersion": protocol_version,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION,
            },
        })
    }

    fn call_tool(&self, params: Option<Value>) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|err| JsonRpcError::new(INVALID_PARAMS, format!("Invalid params: {err}")))?;
        match params.name.as_str() {
            GENERATE_IMAGE => self.generate_image(params.arguments),
            LIST_MODELS => Ok(text_content(self.service.list_models())),
            other => Err(JsonRpcError::new(
                INVALID_PARAMS,
                format!("Unknown tool: {other}"),
            )),
        }
    }

    fn generate_image(&self, arguments: Option<Value>) -> std::result::Result<Value, JsonRpcError> {
        let request: ImageGenerationRequest =
            serde_json::from_value(arguments.unwrap_or_else(|| json!({}))).map_err(|err| {
                JsonRpcError::new(INVALID_PARAMS, format!("Invalid arguments: {err}"))
            })?;
        if request.prompt.trim().is_empty() {
            return Err(JsonRpcError::new(
                INVALID_PARAMS,
                "Missing required argument: prompt",
            ));
        }
        let envelope = self.service.generate_image(&request)?;
        let text = envelope
            .to_pretty_json()
            .map_err(|err| JsonRpcError::new(INTERNAL_ERROR, err.to_string()))?;
        Ok(text_content(text))
    }
}
