//! Scripted provider used by unit tests across the crate

use super::{
    Completion, CompletionRequest, LlmError, LlmProvider, ProviderCapabilities, ProviderStatus,
    ToolCall,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

type Handler = Box<dyn Fn(&CompletionRequest) -> Result<Completion, LlmError> + Send + Sync>;

/// Replays queued answers, or asks a handler when the queue is empty
pub(crate) struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Completion, LlmError>>>,
    handler: Option<Handler>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Option<Duration>,
    status: ProviderStatus,
    function_calling: bool,
    structured_output: bool,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            handler: None,
            requests: Mutex::new(Vec::new()),
            delay: None,
            status: ProviderStatus::Ready,
            function_calling: true,
            structured_output: true,
        }
    }

    pub(crate) fn with_text(self, text: &str) -> Self {
        self.script
            .lock()
            .push_back(Ok(Completion::Text(text.to_string())));
        self
    }

    pub(crate) fn with_tool_calls(self, calls: Vec<ToolCall>) -> Self {
        self.script.lock().push_back(Ok(Completion::ToolCalls(calls)));
        self
    }

    pub(crate) fn with_error(self, err: LlmError) -> Self {
        self.script.lock().push_back(Err(err));
        self
    }

    pub(crate) fn with_handler(
        mut self,
        handler: impl Fn(&CompletionRequest) -> Result<Completion, LlmError> + Send + Sync + 'static,
    ) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn without_function_calling(mut self) -> Self {
        self.function_calling = false;
        self
    }

    pub(crate) fn without_structured_output(mut self) -> Self {
        self.structured_output = false;
        self
    }

    pub(crate) fn unavailable(mut self, reason: &str) -> Self {
        self.status = ProviderStatus::Unavailable(reason.to_string());
        self
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    fn name(&self) -> &str {
        "Scripted"
    }

    fn model(&self) -> String {
        "scripted-1".to_string()
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            function_calling: self.function_calling,
            structured_output: self.structured_output,
        }
    }

    fn status(&self) -> ProviderStatus {
        self.status.clone()
    }

    fn generate(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if let Some(next) = self.script.lock().pop_front() {
            return next;
        }
        match &self.handler {
            Some(handler) => handler(request),
            None => Err(LlmError::Internal("script exhausted".to_string())),
        }
    }
}
