//! AI builder support: agent configuration, prompt assembly, output parsing,
//! schema approval checks and generation supersession.

mod agent;
mod prompt;
mod session;
mod validate;

pub use agent::{AgentConfig, AgentResponse, GraphEdge, GraphNode, ResponseFormat};
pub use prompt::{
    extract_json_path, render_template, Annotation, PreloadRoute, PromptBuilder, RenderedRoute,
    RouteMethod,
};
pub use session::{BuilderRequest, BuilderResponse, BuilderSession, GenerationId, TokenUsage};
pub use validate::validate_schema;
