use std::collections::HashSet;

use crate::config::ToolErrorPolicy;
use crate::error::{BridgeError, Result};
use crate::provider::{ChatCompletionResponse, FinishReason, GenerationConfig};
use crate::session::AgentSession;
use crate::transcript::Transcript;
use crate::types::ToolCall;

/// Where a turn is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Init,
    AwaitingFirstResponse,
    ToolsRequested,
    AwaitingFollowupResponse,
    DirectAnswer,
    Done,
}

/// How the first response is handled
enum FirstResponse {
    Tools {
        content: String,
        tool_calls: Vec<ToolCall>,
    },
    Direct(String),
}

fn classify(response: ChatCompletionResponse) -> Result<FirstResponse> {
    if !response.tool_calls.is_empty() {
        check_distinct_ids(&response.tool_calls)?;
        return Ok(FirstResponse::Tools {
            content: response.content.unwrap_or_default(),
            tool_calls: response.tool_calls,
        });
    }

    match response.finish_reason {
        FinishReason::Stop => Ok(FirstResponse::Direct(response.content.unwrap_or_default())),
        other => Err(BridgeError::protocol(format!(
            "unexpected finish reason: {:?}",
            other
        ))),
    }
}

/// Each result is paired to its call by id, so ids must be unique before
/// anything runs.
fn check_distinct_ids(tool_calls: &[ToolCall]) -> Result<()> {
    let mut seen = HashSet::new();
    for call in tool_calls {
        if !seen.insert(&call.id) {
            return Err(BridgeError::protocol(format!(
                "tool call id '{}' requested more than once",
                call.id
            )));
        }
    }
    Ok(())
}

fn enter(state: &mut TurnState, next: TurnState) {
    tracing::trace!(from = ?*state, to = ?next, "turn state");
    *state = next;
}

/// Run one user turn.
///
/// Without a transcript, a new one is seeded with the session's system
/// prompt. The query is appended, the model is asked for an answer, and if
/// it asks for tools each call runs in order with its result appended; one
/// more completion (offered no tools) then produces the answer. The answer is
/// appended as the final assistant message and returned with the transcript.
///
/// On error the transcript is dropped; callers that want to keep history
/// across a failed turn pass a clone.
#[tracing::instrument(
    skip(session, query, transcript),
    fields(session.id = %session.id, turn.tool_calls = tracing::field::Empty)
)]
pub async fn run_turn(
    session: &AgentSession,
    query: &str,
    transcript: Option<Transcript>,
) -> Result<(String, Transcript)> {
    let mut state = TurnState::Init;
    let mut transcript = transcript.unwrap_or_else(|| session.new_transcript());
    transcript.push_user(query);

    let generation = GenerationConfig::from(&session.config);
    let schemas = session.catalog.schemas();

    enter(&mut state, TurnState::AwaitingFirstResponse);
    log_model_input("model input", &transcript, session);
    let first = session
        .backend
        .chat(transcript.messages(), schemas.as_deref(), &generation)
        .await?;
    log_model_output("model output", &first);

    let answer = match classify(first)? {
        FirstResponse::Direct(answer) => {
            enter(&mut state, TurnState::DirectAnswer);
            answer
        }
        FirstResponse::Tools {
            content,
            tool_calls,
        } => {
            enter(&mut state, TurnState::ToolsRequested);
            tracing::Span::current().record("turn.tool_calls", tool_calls.len() as u64);

            transcript.push_assistant(content, tool_calls.clone());
            for call in &tool_calls {
                let output = dispatch(session, call).await?;
                transcript.push_tool_result(call, output)?;
            }

            enter(&mut state, TurnState::AwaitingFollowupResponse);
            log_model_input("model input with tool results", &transcript, session);
            let followup = session
                .backend
                .chat(transcript.messages(), None, &generation)
                .await?;
            log_model_output("model final output", &followup);

            if !followup.tool_calls.is_empty() {
                return Err(BridgeError::protocol(
                    "follow-up response requested more tools",
                ));
            }
            followup.content.unwrap_or_default()
        }
    };

    transcript.push_assistant(answer.clone(), Vec::new());
    enter(&mut state, TurnState::Done);

    Ok((answer, transcript))
}

/// Invoke the catalog entry a call names.
async fn dispatch(session: &AgentSession, call: &ToolCall) -> Result<String> {
    let result = async {
        let tool = session.catalog.get(&call.name)?;
        let arguments = call.parse_arguments()?;
        tool.invoker().invoke(arguments).await
    }
    .await;

    match result {
        Err(err)
            if err.is_tool_failure()
                && session.config.on_tool_error == ToolErrorPolicy::ReportToModel =>
        {
            tracing::warn!(tool = %call.name, error = %err, "Tool failed, reporting to model");
            Ok(format!("error: {}", err))
        }
        other => other,
    }
}

fn log_model_input(label: &str, transcript: &Transcript, session: &AgentSession) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    for message in transcript.messages() {
        tracing::debug!(role = %message.role, content = %message.content, "{}", label);
    }
    if !session.catalog.is_empty() {
        tracing::debug!(tools = ?session.catalog.names(), "{}", label);
    }
}

fn log_model_output(label: &str, response: &ChatCompletionResponse) {
    tracing::debug!(
        content = response.content.as_deref().unwrap_or(""),
        finish_reason = ?response.finish_reason,
        tool_calls = ?response.tool_calls,
        "{}",
        label
    );
}
