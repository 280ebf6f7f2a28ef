//! Request dispatch for the line-delimited MCP protocol.

use log::{debug, error, info};
use mnemon_rs_protocol::{
    builtin_tools, error_codes, CallToolResult, ForgetArgs, ListMemoriesArgs, RecallArgs,
    RememberArgs, Request, Response, RpcError, ToolCallParams, PROTOCOL_VERSION,
};
use mnemon_rs_store::{Memory, SearchQuery, Store, StoreError};
use serde_json::{json, Value};
use std::io::{BufRead, Write};

/// Default result count for the `recall` tool.
const RECALL_DEFAULT_LIMIT: usize = 10;
/// Content preview length in `list_memories` output.
const LIST_PREVIEW_CHARS: usize = 100;

/// MCP server bound to a memory store.
pub struct Server {
    store: Store,
    list_default_limit: usize,
}

impl Server {
    /// Wrap a store; `list_default_limit` caps `list_memories` when the
    /// caller sends no limit.
    pub fn new(store: Store, list_default_limit: usize) -> Self {
        Server {
            store,
            list_default_limit,
        }
    }

    /// Serve requests line by line until the reader is exhausted.
    pub fn run(&self, reader: impl BufRead, mut writer: impl Write) -> std::io::Result<()> {
        info!("mcp server started");
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            debug!("received request (bytes={})", line.len());

            let response = self.handle_line(&line);
            let rendered = match serde_json::to_string(&response) {
                Ok(rendered) => rendered,
                Err(err) => {
                    error!("failed to render response (error={err})");
                    continue;
                }
            };
            writeln!(writer, "{rendered}")?;
            writer.flush()?;
        }
        info!("mcp server input closed");
        Ok(())
    }

    /// Dispatch a single request line to a response frame.
    pub fn handle_line(&self, line: &str) -> Response {
        let request: Request = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(_) => {
                return Response::failure(
                    None,
                    RpcError::new(error_codes::PARSE_ERROR, "Parse error", "Invalid JSON"),
                );
            }
        };

        debug!("handling request (method={}, id_set={})", request.method, request.id.is_some());
        match request.method.as_str() {
            "initialize" => Response::success(request.id, initialize_result()),
            "tools/list" => Response::success(request.id, json!({"tools": builtin_tools()})),
            "tools/call" => self.handle_tool_call(request),
            "resources/list" => Response::success(request.id, json!({"resources": []})),
            "resources/read" => Response::failure(
                request.id,
                RpcError::new(
                    error_codes::METHOD_NOT_FOUND,
                    "Not implemented",
                    "Resource reading not implemented",
                ),
            ),
            unknown => Response::failure(
                request.id,
                RpcError::new(
                    error_codes::METHOD_NOT_FOUND,
                    "Method not found",
                    format!("Unknown method: {unknown}"),
                ),
            ),
        }
    }

    /// Shut down the underlying store, draining pending saves.
    pub fn close(&self) -> Result<(), StoreError> {
        self.store.close()
    }

    fn handle_tool_call(&self, request: Request) -> Response {
        let params: ToolCallParams = match request
            .params
            .clone()
            .map(serde_json::from_value)
            .transpose()
        {
            Ok(Some(params)) => params,
            _ => {
                return Response::failure(
                    request.id,
                    RpcError::new(error_codes::INVALID_PARAMS, "Invalid params", "Expected object"),
                );
            }
        };

        info!("executing tool (tool={})", params.name);
        let outcome = match params.name.as_str() {
            "remember" => self.remember(params.arguments),
            "recall" => self.recall(params.arguments),
            "forget" => self.forget(params.arguments),
            "list_memories" => self.list_memories(params.arguments),
            "memory_stats" => self.memory_stats(),
            unknown => {
                return Response::failure(
                    request.id,
                    RpcError::new(error_codes::INVALID_PARAMS, "Unknown tool", unknown),
                );
            }
        };

        match outcome {
            Ok(text) => match serde_json::to_value(CallToolResult::text(text)) {
                Ok(result) => Response::success(request.id, result),
                Err(err) => Response::failure(
                    request.id,
                    RpcError::new(
                        error_codes::INTERNAL_ERROR,
                        "Internal error",
                        err.to_string(),
                    ),
                ),
            },
            Err(err) => Response::failure(request.id, rpc_error_for(&err)),
        }
    }

    fn remember(&self, arguments: Value) -> Result<String, StoreError> {
        let args: RememberArgs = parse_args(arguments)?;
        let record = self.store.store(
            &args.content,
            &args.summary,
            &args.category,
            args.tags,
            Default::default(),
        )?;
        Ok(format!(
            "Memory stored successfully with ID: {}",
            record.id
        ))
    }

    fn recall(&self, arguments: Value) -> Result<String, StoreError> {
        let args: RecallArgs = parse_args(arguments)?;
        let query = SearchQuery {
            query: args.query,
            category: args.category,
            tags: args.tags,
            limit: match args.limit {
                0 => RECALL_DEFAULT_LIMIT,
                limit => limit,
            },
        };

        let records = self.store.search(&query)?;
        if records.is_empty() {
            return Ok("No memories found matching your query.".to_string());
        }

        let mut output = format!("Found {} matching memories:\n\n", records.len());
        for (index, record) in records.iter().enumerate() {
            output.push_str(&format!("## Memory {} (ID: {})\n", index + 1, record.id));
            if !record.category.is_empty() {
                output.push_str(&format!("**Category:** {}\n", record.category));
            }
            if !record.tags.is_empty() {
                output.push_str(&format!("**Tags:** {}\n", record.tags.join(", ")));
            }
            if !record.summary.is_empty() {
                output.push_str(&format!("**Summary:** {}\n", record.summary));
            }
            output.push_str(&format!(
                "**Created:** {}\n",
                record.created_at.format("%Y-%m-%d %H:%M:%S")
            ));
            output.push_str(&format!("**Content:**\n{}\n\n", record.content));
            output.push_str("---\n\n");
        }
        Ok(output)
    }

    fn forget(&self, arguments: Value) -> Result<String, StoreError> {
        let args: ForgetArgs = parse_args(arguments)?;
        self.store.delete(&args.id)?;
        Ok(format!("Memory with ID {} has been forgotten.", args.id))
    }

    fn list_memories(&self, arguments: Value) -> Result<String, StoreError> {
        let args: ListMemoriesArgs = parse_args(arguments)?;
        let limit = match args.limit {
            0 => self.list_default_limit,
            limit => limit,
        };

        let records = self.store.list(&args.category, &args.tags, limit)?;
        if records.is_empty() {
            return Ok("No memories found.".to_string());
        }

        let mut output = format!("Found {} memories:\n\n", records.len());
        for (index, record) in records.iter().enumerate() {
            output.push_str(&format!(
                "{}. **{}** (ID: {})\n",
                index + 1,
                record.summary,
                record.id
            ));
            if !record.category.is_empty() {
                output.push_str(&format!("   Category: {}\n", record.category));
            }
            if !record.tags.is_empty() {
                output.push_str(&format!("   Tags: {}\n", record.tags.join(", ")));
            }
            output.push_str(&format!(
                "   Created: {}, Accessed: {} times\n",
                record.created_at.format("%Y-%m-%d"),
                record.access_count
            ));
            output.push_str(&format!("   Content: {}\n\n", preview(record)));
        }
        Ok(output)
    }

    fn memory_stats(&self) -> Result<String, StoreError> {
        let stats = self.store.stats();

        let mut output = String::from("## Memory Statistics\n\n");
        output.push_str(&format!("**Total Memories:** {}\n", stats.total_memories));
        output.push_str(&format!(
            "**Total Access Count:** {}\n",
            stats.total_access_count
        ));
        output.push_str(&format!("**Unique Keywords:** {}\n", stats.unique_keywords));
        output.push_str(&format!(
            "**Storage Used:** {} bytes ({:.1}%)\n",
            stats.total_size, stats.storage_used_pct
        ));
        output.push_str(&format!("**Data Directory:** {}\n\n", stats.data_directory));

        if !stats.categories.is_empty() {
            output.push_str("**Categories:**\n");
            let mut categories: Vec<_> = stats.categories.iter().collect();
            categories.sort();
            for (category, count) in categories {
                output.push_str(&format!("- {category}: {count}\n"));
            }
        }
        Ok(output)
    }
}

/// Initialize result advertised to clients.
fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {"listChanged": false},
            "resources": {"subscribe": false, "listChanged": false}
        },
        "serverInfo": {
            "name": "mnemon-memory-server",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, StoreError> {
    serde_json::from_value(arguments)
        .map_err(|err| StoreError::BadRequest(format!("invalid tool arguments: {err}")))
}

/// Map engine errors onto JSON-RPC error frames.
fn rpc_error_for(err: &StoreError) -> RpcError {
    let code = match err {
        StoreError::BadRequest(_) => error_codes::INVALID_PARAMS,
        _ => error_codes::INTERNAL_ERROR,
    };
    RpcError::new(code, "Tool execution failed", err.to_string())
}

fn preview(record: &Memory) -> String {
    if record.content.chars().count() <= LIST_PREVIEW_CHARS {
        return record.content.clone();
    }
    let truncated: String = record.content.chars().take(LIST_PREVIEW_CHARS).collect();
    format!("{truncated}...")
}
