//! Agent configuration and typed agent output.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::utils::strip_code_fences;

use super::prompt::PreloadRoute;

/// Output format an agent is configured to produce.
///
/// The format comes from the agent configuration; output is never sniffed
/// to guess its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseFormat {
    /// Free text or markdown
    #[default]
    Text,
    /// A JSON document
    Json,
    /// An image URL
    Image,
    /// A video URL
    Video,
    /// Tabular rows (JSON array of objects)
    Table,
    /// A node/edge graph
    Graph,
}

impl ResponseFormat {
    /// Wire name of the format.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Text => "string",
            ResponseFormat::Json => "json",
            ResponseFormat::Image => "image",
            ResponseFormat::Video => "video",
            ResponseFormat::Table => "table",
            ResponseFormat::Graph => "graph",
        }
    }

    /// Parse a wire name. `"string"`, `"text"` and `"markdown"` all mean text.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "text" | "markdown" => Some(ResponseFormat::Text),
            "json" => Some(ResponseFormat::Json),
            "image" => Some(ResponseFormat::Image),
            "video" => Some(ResponseFormat::Video),
            "table" => Some(ResponseFormat::Table),
            "graph" => Some(ResponseFormat::Graph),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ResponseFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResponseFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ResponseFormat::from_name(&name).unwrap_or_else(|| {
            warn!(format = %name, "Unknown agent response format, treating as text");
            ResponseFormat::Text
        }))
    }
}

/// Configuration of an AI agent selectable in the builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    /// Agent id
    pub id: String,
    /// Display label
    #[serde(default)]
    pub label: String,
    /// Description shown to the user
    #[serde(default)]
    pub description: String,
    /// Icon name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// System prompt sent to the model
    #[serde(default)]
    pub system_prompt: String,
    /// Model identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Declared output format
    #[serde(default)]
    pub response_format: ResponseFormat,
    /// Routes fetched and injected into the system prompt before generation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preload_routes: Vec<PreloadRoute>,
    /// Route to call with the approved output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<String>,
    /// Label of the next-action button
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action_label: Option<String>,
    /// Whether output must pass approval validation before the next action
    #[serde(default)]
    pub require_approval: bool,
}

impl AgentConfig {
    /// Create an agent with the given id, system prompt and format.
    pub fn new(
        id: impl Into<String>,
        system_prompt: impl Into<String>,
        response_format: ResponseFormat,
    ) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            description: String::new(),
            icon: None,
            system_prompt: system_prompt.into(),
            model: None,
            response_format,
            preload_routes: Vec::new(),
            next_action: None,
            next_action_label: None,
            require_approval: false,
        }
    }

    /// Parse raw model output according to this agent's declared format.
    pub fn parse_response(&self, raw: &str) -> Result<AgentResponse> {
        AgentResponse::parse(self.response_format, raw)
    }
}

/// A graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Node id
    pub id: String,
    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Free-form attributes
    #[serde(flatten)]
    pub data: serde_json::Map<String, Value>,
}

/// A graph edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Deserialize)]
struct GraphPayload {
    #[serde(default)]
    nodes: Vec<GraphNode>,
    #[serde(default)]
    edges: Vec<GraphEdge>,
}

/// Agent output tagged by its declared format.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentResponse {
    /// Free text
    Text(String),
    /// JSON document
    Json(Value),
    /// Image location
    Image {
        /// Image URL
        url: String,
    },
    /// Video location
    Video {
        /// Video URL
        url: String,
    },
    /// Tabular data
    Table {
        /// Column names in first-seen order
        columns: Vec<String>,
        /// Rows as JSON objects
        rows: Vec<serde_json::Map<String, Value>>,
    },
    /// Node/edge graph
    Graph {
        /// Nodes
        nodes: Vec<GraphNode>,
        /// Edges
        edges: Vec<GraphEdge>,
    },
}

impl AgentResponse {
    /// Parse raw model output for a declared format.
    ///
    /// JSON-bearing formats accept output wrapped in a markdown code fence.
    pub fn parse(format: ResponseFormat, raw: &str) -> Result<Self> {
        match format {
            ResponseFormat::Text => Ok(AgentResponse::Text(raw.to_string())),
            ResponseFormat::Json => Ok(AgentResponse::Json(parse_json(raw)?)),
            ResponseFormat::Image => Ok(AgentResponse::Image {
                url: parse_media_url(raw, "image")?,
            }),
            ResponseFormat::Video => Ok(AgentResponse::Video {
                url: parse_media_url(raw, "video")?,
            }),
            ResponseFormat::Table => parse_table(raw),
            ResponseFormat::Graph => {
                let payload: GraphPayload = serde_json::from_value(parse_json(raw)?)
                    .map_err(|e| Error::Parse(format!("Invalid graph output: {e}")))?;
                let node_ids: std::collections::HashSet<&str> =
                    payload.nodes.iter().map(|n| n.id.as_str()).collect();
                if let Some(edge) = payload
                    .edges
                    .iter()
                    .find(|e| !node_ids.contains(e.source.as_str()) || !node_ids.contains(e.target.as_str()))
                {
                    return Err(Error::Parse(format!(
                        "Graph edge {} -> {} references an unknown node",
                        edge.source, edge.target
                    )));
                }
                Ok(AgentResponse::Graph {
                    nodes: payload.nodes,
                    edges: payload.edges,
                })
            }
        }
    }

    /// The format this response was parsed as.
    pub fn format(&self) -> ResponseFormat {
        match self {
            AgentResponse::Text(_) => ResponseFormat::Text,
            AgentResponse::Json(_) => ResponseFormat::Json,
            AgentResponse::Image { .. } => ResponseFormat::Image,
            AgentResponse::Video { .. } => ResponseFormat::Video,
            AgentResponse::Table { .. } => ResponseFormat::Table,
            AgentResponse::Graph { .. } => ResponseFormat::Graph,
        }
    }

    /// The JSON document, for JSON responses.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            AgentResponse::Json(value) => Some(value),
            _ => None,
        }
    }
}

fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| Error::Parse(format!("Agent output is not valid JSON: {e}")))
}

fn parse_media_url(raw: &str, kind: &str) -> Result<String> {
    let text = strip_code_fences(raw);
    let url = if text.starts_with('{') {
        parse_json(text)?
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Parse(format!("The {kind} output has no 'url' field")))?
    } else {
        text.trim_matches('"').to_string()
    };

    url::Url::parse(&url)
        .map_err(|e| Error::Parse(format!("Invalid {kind} URL '{url}': {e}")))?;
    Ok(url)
}

fn parse_table(raw: &str) -> Result<AgentResponse> {
    let value = parse_json(raw)?;
    // Accept a bare array or {"rows": [...]}
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("rows") {
            Some(Value::Array(items)) => items,
            _ => return Err(Error::Parse("Table output must be an array of rows".to_string())),
        },
        _ => return Err(Error::Parse("Table output must be an array of rows".to_string())),
    };

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(row) = item else {
            return Err(Error::Parse("Every table row must be an object".to_string()));
        };
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
        rows.push(row);
    }

    Ok(AgentResponse::Table { columns, rows })
}
