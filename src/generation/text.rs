//! Text generation with tool loop.

use tracing::debug;

use crate::error::ParleyError;
use crate::provider::{ModelProvider, ProviderRequest};
use crate::tools::ToolSet;
use crate::types::*;

/// Maximum provider calls per turn, to prevent tool loops from running forever.
pub const MAX_TOOL_ITERATIONS: usize = 10;

/// Generate text with a tool loop.
///
/// If the model returns tool calls, they are run through `tools` and fed back
/// until the model produces a final text response or the iteration limit is
/// hit. Tool failures never end the loop: [`ToolSet::invoke`] turns them into
/// ordinary tool results.
pub async fn generate_text(
    provider: &dyn ModelProvider,
    mut messages: Vec<ModelMessage>,
    settings: GenerationSettings,
    tools: &ToolSet,
) -> Result<GenerateTextResult, ParleyError> {
    let tool_defs = (!tools.is_empty()).then(|| tools.definitions());

    let mut total_usage = Usage::default();
    let mut last_text = String::new();

    for iteration in 0..MAX_TOOL_ITERATIONS {
        let request = ProviderRequest {
            messages: messages.clone(),
            settings: settings.clone(),
            tools: tool_defs.clone(),
        };

        debug!(iteration, provider = provider.provider_name(), "generate_text: calling provider");
        let response = provider.generate_text(&request).await?;
        total_usage.merge(&response.usage);

        if response.tool_calls.is_empty() {
            messages.push(ModelMessage::assistant(response.text.clone()));
            return Ok(GenerateTextResult {
                text: response.text,
                messages,
                usage: total_usage,
                steps: iteration + 1,
                finish_reason: response.finish_reason,
            });
        }

        messages.push(ModelMessage::assistant_tool_calls(
            &response.text,
            &response.tool_calls,
        ));
        for call in &response.tool_calls {
            let outcome = tools.invoke(&call.name, &call.arguments).await;
            messages.push(ModelMessage::tool_result(
                call.id.clone(),
                outcome.content,
                outcome.is_error,
            ));
        }
        last_text = response.text;
    }

    debug!(
        limit = MAX_TOOL_ITERATIONS,
        "generate_text: tool iteration limit reached"
    );
    Ok(GenerateTextResult {
        text: last_text,
        messages,
        usage: total_usage,
        steps: MAX_TOOL_ITERATIONS,
        finish_reason: Some(FinishReason::Length),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays canned responses and records what it was sent.
    struct Scripted {
        responses: Mutex<Vec<ProviderResponse>>,
        seen: Mutex<Vec<ProviderRequest>>,
    }

    impl Scripted {
        fn new(mut responses: Vec<ProviderResponse>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelProvider for Scripted {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        fn model_id(&self) -> &str {
            "scripted"
        }

        async fn generate_text(
            &self,
            request: &ProviderRequest,
        ) -> Result<ProviderResponse, ParleyError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.responses.lock().unwrap().pop().unwrap_or_else(|| {
                ProviderResponse {
                    tool_calls: vec![AgentToolCall {
                        id: "again".into(),
                        name: "date".into(),
                        arguments: json!({}),
                    }],
                    ..Default::default()
                }
            }))
        }
    }

    fn text(t: &str) -> ProviderResponse {
        ProviderResponse {
            text: t.into(),
            usage: Usage {
                input_tokens: 1,
                output_tokens: 1,
                total_tokens: 2,
            },
            ..Default::default()
        }
    }

    fn call(name: &str) -> ProviderResponse {
        ProviderResponse {
            tool_calls: vec![AgentToolCall {
                id: "call_1".into(),
                name: name.into(),
                arguments: json!({}),
            }],
            ..Default::default()
        }
    }

    fn date_only() -> ToolSet {
        ToolSet::new().with_tool(crate::tools::builtin::date_tool())
    }

    #[tokio::test]
    async fn plain_reply_takes_one_step() {
        let provider = Scripted::new(vec![text("hi")]);
        let result = generate_text(
            &provider,
            vec![ModelMessage::user("hello")],
            GenerationSettings::default(),
            &ToolSet::new(),
        )
        .await
        .unwrap();
        assert_eq!(result.text, "hi");
        assert_eq!(result.steps, 1);
        assert_eq!(result.messages.len(), 2);
        assert!(provider.seen.lock().unwrap()[0].tools.is_none());
    }

    #[tokio::test]
    async fn tool_results_are_fed_back() {
        let provider = Scripted::new(vec![call("date"), text("done")]);
        let result = generate_text(
            &provider,
            vec![ModelMessage::user("date?")],
            GenerationSettings::default(),
            &date_only(),
        )
        .await
        .unwrap();

        assert_eq!(result.text, "done");
        assert_eq!(result.steps, 2);
        let seen = provider.seen.lock().unwrap();
        let tool_msg = seen[1].messages.last().unwrap();
        let tr = tool_msg.tool_result_part().unwrap();
        assert_eq!(tr.content, crate::tools::current_date());
        assert!(!tr.is_error);
    }

    #[tokio::test]
    async fn unknown_tools_do_not_stop_the_loop() {
        let provider = Scripted::new(vec![call("shell"), text("ok")]);
        let result = generate_text(
            &provider,
            vec![ModelMessage::user("x")],
            GenerationSettings::default(),
            &date_only(),
        )
        .await
        .unwrap();
        assert_eq!(result.text, "ok");
        let tr = result.messages[2].tool_result_part().unwrap();
        assert!(tr.is_error);
    }

    #[tokio::test]
    async fn loop_is_bounded() {
        let provider = Scripted::new(Vec::new());
        let result = generate_text(
            &provider,
            vec![ModelMessage::user("x")],
            GenerationSettings::default(),
            &date_only(),
        )
        .await
        .unwrap();
        assert_eq!(result.steps, MAX_TOOL_ITERATIONS);
        assert_eq!(result.finish_reason, Some(FinishReason::Length));
        assert_eq!(provider.seen.lock().unwrap().len(), MAX_TOOL_ITERATIONS);
    }
}
