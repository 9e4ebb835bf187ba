//! A provider that replays scripted replies.
//!
//! Used by the test suites of the tools, agent, gateway and CLI crates, where
//! the LLM is an opaque decision oracle that must behave deterministically.

use async_trait::async_trait;
use mathwise_core::error::ProviderError;
use mathwise_core::message::{Message, MessageToolCall};
use mathwise_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::{Mutex, MutexGuard};

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next step of the script. Once the
/// script runs out every further call fails with
/// [`ProviderError::InvalidResponse`]. Every request is recorded.
pub struct ScriptedProvider {
    steps: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        let mut steps = steps;
        steps.reverse();
        Self {
            steps: Mutex::new(steps),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replies with each text in order.
    pub fn texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(texts.into_iter().map(|t| Ok(text_response(t.as_ref()))).collect())
    }

    /// Replies once with `text`.
    pub fn single_text(text: &str) -> Self {
        Self::texts([text])
    }

    /// Fails the first call with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Number of completed calls so far.
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = lock(&self.requests);
            requests.push(request);
            requests.len()
        };
        lock(&self.steps).pop().unwrap_or_else(|| {
            Err(ProviderError::InvalidResponse(format!(
                "scripted provider exhausted at call #{call}"
            )))
        })
    }
}

/// Create a simple text response (no tool calls).
pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response carrying native tool calls.
pub fn tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    let mut response = text_response(thought);
    response.message.tool_calls = tool_calls;
    response
}

/// A native tool call passing `query` to the tool `name`.
pub fn tool_call(name: &str, query: &str) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: serde_json::json!({ "query": query }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_in_order_then_fails() {
        let provider = ScriptedProvider::texts(["first", "second"]);
        let req = || ProviderRequest::new("m", vec![Message::user("q")]);

        assert_eq!(provider.complete(req()).await.unwrap().message.content, "first");
        assert_eq!(provider.complete(req()).await.unwrap().message.content, "second");
        assert!(matches!(
            provider.complete(req()).await,
            Err(ProviderError::InvalidResponse(_))
        ));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn scripted_failure_is_returned() {
        let provider = ScriptedProvider::failing(ProviderError::Timeout("slow".into()));
        let err = provider
            .complete(ProviderRequest::new("m", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
    }

    #[test]
    fn tool_call_arguments_are_json() {
        let call = tool_call("Calculator", "2+2");
        let args: serde_json::Value = serde_json::from_str(&call.arguments).unwrap();
        assert_eq!(args["query"], "2+2");
    }
}
