//! Prompt assembly for AI builder agents.
//!
//! An agent's system prompt is extended with context fetched from its
//! preload routes. Routes are templates such as `/api/schemas/{schemaId}`
//! rendered with caller-supplied parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// HTTP method of a preload route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteMethod {
    /// GET request
    #[default]
    Get,
    /// POST request with a JSON body
    Post,
}

/// A backend route whose response is injected into an agent's system prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadRoute {
    /// Route template, e.g. `/api/schemas/{schemaId}`
    pub route: String,
    /// Section title in the prompt
    #[serde(default)]
    pub title: String,
    /// Explanation placed under the title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Request method
    #[serde(default)]
    pub method: RouteMethod,
    /// Dotted path selecting part of the response, e.g. `data.items`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    /// JSON body for POST routes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Query parameters (values may contain placeholders)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
}

impl PreloadRoute {
    /// Create a GET route with a title.
    pub fn new(route: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            title: title.into(),
            description: None,
            method: RouteMethod::Get,
            json_path: None,
            body: None,
            query: BTreeMap::new(),
        }
    }

    /// Render the route path and query with the given parameters.
    pub fn render(&self, params: &BTreeMap<String, String>) -> Result<RenderedRoute> {
        let path = render_template(&self.route, params)?;
        let query = self
            .query
            .iter()
            .map(|(k, v)| Ok((k.clone(), render_template(v, params)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(RenderedRoute {
            method: self.method,
            path,
            query,
            body: self.body.clone(),
        })
    }
}

/// A preload route with all placeholders substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRoute {
    /// Request method
    pub method: RouteMethod,
    /// Request path
    pub path: String,
    /// Query pairs
    pub query: Vec<(String, String)>,
    /// JSON body for POST routes
    pub body: Option<Value>,
}

/// Substitute `{name}` placeholders.
///
/// Fails when a placeholder has no parameter or a brace is left unclosed.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use gradian_client::ai::render_template;
///
/// let mut params = BTreeMap::new();
/// params.insert("schemaId".to_string(), "users".to_string());
/// assert_eq!(render_template("/api/schemas/{schemaId}", &params).unwrap(), "/api/schemas/users");
/// assert!(render_template("/api/{missing}", &params).is_err());
/// ```
pub fn render_template(template: &str, params: &BTreeMap<String, String>) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        output.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| Error::Template(format!("Unclosed placeholder in '{template}'")))?;
        let name = after[..end].trim();
        let value = params
            .get(name)
            .ok_or_else(|| Error::Template(format!("Missing parameter '{name}' for '{template}'")))?;
        output.push_str(value);
        rest = &after[end + 1..];
    }
    output.push_str(rest);
    Ok(output)
}

/// Select a value by dotted path; numeric segments index arrays.
///
/// An empty path selects the whole value.
pub fn extract_json_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// A user note attached to a previously generated schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Id of the schema the note applies to
    pub schema_id: String,
    /// Short label of the annotated element (field or section)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// The requested change
    pub note: String,
}

/// Builds the prompts sent to the AI builder.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    system_prompt: String,
    context: Vec<(String, Option<String>, String)>,
}

impl PromptBuilder {
    /// Start from an agent's system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            context: Vec::new(),
        }
    }

    /// Add the (already fetched) response of a preload route.
    ///
    /// The route's `json_path` selects part of the data; a path that
    /// matches nothing is an error.
    pub fn preloaded(mut self, route: &PreloadRoute, data: &Value) -> Result<Self> {
        let selected = match route.json_path.as_deref() {
            Some(path) => extract_json_path(data, path).ok_or_else(|| {
                Error::Template(format!(
                    "Path '{path}' not found in response of '{}'",
                    route.route
                ))
            })?,
            None => data,
        };
        let rendered = serde_json::to_string_pretty(selected)?;
        self.context
            .push((route.title.clone(), route.description.clone(), rendered));
        Ok(self)
    }

    /// The final system prompt with preloaded context appended.
    pub fn system_prompt(&self) -> String {
        let mut prompt = self.system_prompt.trim_end().to_string();
        for (title, description, data) in &self.context {
            prompt.push_str("\n\n## ");
            prompt.push_str(if title.is_empty() { "Context" } else { title });
            prompt.push('\n');
            if let Some(description) = description {
                prompt.push_str(description);
                prompt.push('\n');
            }
            prompt.push_str("```json\n");
            prompt.push_str(data);
            prompt.push_str("\n```");
        }
        prompt
    }

    /// Build a prompt asking the agent to revise an existing schema.
    ///
    /// Only annotations for the schema's own id are included.
    pub fn modify_existing(schema: &Value, annotations: &[Annotation]) -> Result<String> {
        let schema_id = schema
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::SchemaValidation("Schema must have an 'id' field".to_string()))?;

        let notes: Vec<&Annotation> = annotations
            .iter()
            .filter(|a| a.schema_id == schema_id && !a.note.trim().is_empty())
            .collect();
        if notes.is_empty() {
            return Err(Error::InvalidCommand(format!(
                "No annotations for schema '{schema_id}'"
            )));
        }

        let mut prompt = String::from("Modify the existing schema below. Keep its id and every part not mentioned in the requested changes.\n\n");
        prompt.push_str("```json\n");
        prompt.push_str(&serde_json::to_string_pretty(schema)?);
        prompt.push_str("\n```\n\nRequested changes:\n");
        for (index, annotation) in notes.iter().enumerate() {
            match &annotation.target {
                Some(target) => prompt.push_str(&format!(
                    "{}. [{}] {}\n",
                    index + 1,
                    target,
                    annotation.note.trim()
                )),
                None => prompt.push_str(&format!("{}. {}\n", index + 1, annotation.note.trim())),
            }
        }
        Ok(prompt)
    }
}
