use std::sync::Arc;

use crate::catalog::ToolCatalog;
use crate::config::TurnConfig;
use crate::error::Result;
use crate::prompt;
use crate::provider::CompletionBackend;
use crate::transcript::Transcript;
use crate::types::SessionId;

/// Everything a turn needs: the completion backend, the tool catalog built
/// at startup, and generation settings. Immutable for the session's life.
pub struct AgentSession {
    pub id: SessionId,
    pub backend: Arc<dyn CompletionBackend>,
    pub catalog: ToolCatalog,
    pub config: TurnConfig,
    system_template: String,
}

impl AgentSession {
    pub fn new(backend: Arc<dyn CompletionBackend>, catalog: ToolCatalog, config: TurnConfig) -> Self {
        Self {
            id: SessionId::new(),
            backend,
            catalog,
            config,
            system_template: prompt::SYSTEM_PROMPT_TEMPLATE.to_string(),
        }
    }

    /// Replace the system prompt template. `{tools}` is substituted with the
    /// tool listing.
    pub fn with_system_template(mut self, template: impl Into<String>) -> Self {
        self.system_template = template.into();
        self
    }

    pub fn system_prompt(&self) -> String {
        prompt::render(&self.system_template, &self.catalog)
    }

    /// A transcript seeded with this session's system prompt.
    pub fn new_transcript(&self) -> Transcript {
        Transcript::with_system_prompt(self.system_prompt())
    }

    pub async fn run_turn(
        &self,
        query: &str,
        transcript: Option<Transcript>,
    ) -> Result<(String, Transcript)> {
        crate::agent_loop::run_turn(self, query, transcript).await
    }
}
