//! Tool descriptors and typed tool arguments.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Parameters of a `tools/call` request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// A tool advertised by `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Result payload of a tool call: one or more content blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<ContentBlock>,
}

impl CallToolResult {
    /// A single text block, the only content type the server emits.
    pub fn text(text: impl Into<String>) -> Self {
        CallToolResult {
            content: vec![ContentBlock {
                kind: "text".to_string(),
                text: text.into(),
            }],
        }
    }
}

/// A typed content block inside a tool result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

/// Arguments of the `remember` tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RememberArgs {
    pub content: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Arguments of the `recall` tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecallArgs {
    pub query: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub limit: usize,
}

/// Arguments of the `forget` tool.
#[derive(Debug, Clone, Deserialize)]
pub struct ForgetArgs {
    pub id: String,
}

/// Arguments of the `list_memories` tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMemoriesArgs {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub limit: usize,
}

/// Descriptors for every tool the memory server exposes.
pub fn builtin_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "remember".to_string(),
            description: "Store information in memory with optional categorization and tags"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "content": {
                        "type": "string",
                        "description": "The content to remember"
                    },
                    "summary": {
                        "type": "string",
                        "description": "Optional summary of the content"
                    },
                    "category": {
                        "type": "string",
                        "description": "Optional category (e.g., 'code', 'concept', 'project')"
                    },
                    "tags": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Optional tags for categorization"
                    }
                },
                "required": ["content"]
            }),
        },
        ToolDescriptor {
            name: "recall".to_string(),
            description: "Search for stored memories".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    },
                    "category": {
                        "type": "string",
                        "description": "Optional category filter"
                    },
                    "tags": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Optional tags filter"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results (default: 10)",
                        "default": 10
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDescriptor {
            name: "forget".to_string(),
            description: "Delete a stored memory by ID".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "Memory ID to delete"
                    }
                },
                "required": ["id"]
            }),
        },
        ToolDescriptor {
            name: "list_memories".to_string(),
            description: "List all stored memories with optional filtering".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "description": "Optional category filter"
                    },
                    "tags": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Optional tags filter"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results",
                        "default": 20
                    }
                }
            }),
        },
        ToolDescriptor {
            name: "memory_stats".to_string(),
            description: "Get statistics about stored memories".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::{builtin_tools, CallToolResult, RememberArgs};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn advertises_the_five_memory_tools() {
        let tools = builtin_tools();
        let names: Vec<&str> = tools.iter().map(|tool| tool.name.as_str()).collect();
        assert_eq!(
            names,
            ["remember", "recall", "forget", "list_memories", "memory_stats"]
        );
        for tool in &tools {
            assert_eq!(tool.input_schema["type"], json!("object"));
        }
    }

    #[test]
    fn descriptors_render_camel_case_schema_key() {
        let rendered = serde_json::to_value(&builtin_tools()[0]).expect("render");
        assert!(rendered.get("inputSchema").is_some());
        assert!(rendered.get("input_schema").is_none());
    }

    #[test]
    fn tool_arguments_default_their_optional_fields() {
        let args: RememberArgs =
            serde_json::from_value(json!({"content": "just content"})).expect("parse");
        assert_eq!(args.content, "just content");
        assert!(args.summary.is_empty());
        assert!(args.tags.is_empty());
    }

    #[test]
    fn text_results_use_the_text_block_type() {
        let rendered = serde_json::to_value(CallToolResult::text("done")).expect("render");
        assert_eq!(rendered["content"][0]["type"], json!("text"));
        assert_eq!(rendered["content"][0]["text"], json!("done"));
    }
}
