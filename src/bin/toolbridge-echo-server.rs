//! Minimal stdio MCP server for trying the bridge out and for the
//! integration tests.
//!
//! Speaks newline-delimited JSON-RPC on stdin/stdout and offers four tools:
//! `echo`, `add`, `getenv` and `fail`. `tools/list` is split over two pages.

use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const SECOND_PAGE: &str = "page-2";

type RpcError = (i64, String);

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let Ok(message) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        // Notifications carry no id, responses carry no method.
        let (Some(id), Some(method)) = (
            message.get("id").cloned(),
            message.get("method").and_then(Value::as_str),
        ) else {
            continue;
        };
        let params = message.get("params").cloned().unwrap_or(Value::Null);

        let response = match handle(method, &params) {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err((code, message)) => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": code, "message": message }
            }),
        };

        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        stdout.write_all(&payload).await?;
        stdout.flush().await?;
    }

    Ok(())
}

fn handle(method: &str, params: &Value) -> Result<Value, RpcError> {
    match method {
        "initialize" => Ok(json!({
            "protocolVersion": params
                .get("protocolVersion")
                .cloned()
                .unwrap_or_else(|| json!("2025-03-26")),
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": "toolbridge-echo-server",
                "version": env!("CARGO_PKG_VERSION")
            }
        })),
        "ping" => Ok(json!({})),
        "tools/list" => list_tools(params.get("cursor").and_then(Value::as_str)),
        "tools/call" => {
            let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
            let arguments = params
                .get("arguments")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            call_tool(name, &arguments)
        }
        other => Err((-32601, format!("method not found: {other}"))),
    }
}

fn list_tools(cursor: Option<&str>) -> Result<Value, RpcError> {
    match cursor {
        None => Ok(json!({
            "tools": [
                {
                    "name": "echo",
                    "description": "Echo a message back",
                    "inputSchema": {
                        "type": "object",
                        "properties": { "message": { "type": "string" } },
                        "required": ["message"]
                    }
                },
                {
                    "name": "add",
                    "description": "Add two integers",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "a": { "type": "integer" },
                            "b": { "type": "integer", "default": 0 }
                        },
                        "required": ["a"]
                    }
                }
            ],
            "nextCursor": SECOND_PAGE
        })),
        Some(SECOND_PAGE) => Ok(json!({
            "tools": [
                {
                    "name": "getenv",
                    "description": "Read an environment variable of the server process",
                    "inputSchema": {
                        "type": "object",
                        "properties": { "name": { "type": "string" } },
                        "required": ["name"]
                    }
                },
                {
                    "name": "fail",
                    "description": "Always report an error",
                    "inputSchema": { "type": "object", "properties": {} }
                }
            ]
        })),
        Some(other) => Err((-32602, format!("unknown cursor: {other}"))),
    }
}

fn call_tool(name: &str, arguments: &Map<String, Value>) -> Result<Value, RpcError> {
    let text = match name {
        "echo" => arguments
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        "add" => {
            let operand = |key: &str| arguments.get(key).and_then(Value::as_i64).unwrap_or(0);
            (operand("a") + operand("b")).to_string()
        }
        "getenv" => arguments
            .get("name")
            .and_then(Value::as_str)
            .and_then(|key| std::env::var(key).ok())
            .unwrap_or_default(),
        "fail" => {
            return Ok(json!({
                "content": [{ "type": "text", "text": "boom" }],
                "isError": true
            }))
        }
        other => return Err((-32602, format!("unknown tool: {other}"))),
    };

    Ok(json!({
        "content": [{ "type": "text", "text": text }],
        "isError": false
    }))
}
