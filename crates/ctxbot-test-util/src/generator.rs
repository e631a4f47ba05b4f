use std::sync::Mutex;

use async_trait::async_trait;
use ctxbot_lib::error::GenerationError;
use ctxbot_lib::llm::{GenerationRequest, Generator};

enum Script {
    Reply(String),
    Echo,
    Fail,
}

/// Generator that records every request and answers from a script.
pub struct ScriptedGenerator {
    script: Script,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always returns `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_script(Script::Reply(text.into()))
    }

    /// Returns the prompt it was sent, prefixed with `echo: `.
    pub fn echoing() -> Self {
        Self::with_script(Script::Echo)
    }

    /// Fails every call with a transport error.
    pub fn failing() -> Self {
        Self::with_script(Script::Fail)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Prompt text of the most recent request.
    pub fn last_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(GenerationRequest::prompt_text)
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Echo => Ok(format!("echo: {}", request.prompt_text())),
            Script::Fail => Err(GenerationError::Transport {
                message: "connection refused".into(),
            }),
        }
    }
}
