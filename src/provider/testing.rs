//! Scripted in-memory provider used by unit tests.

use crate::provider::ModelProvider;
use crate::provider::types::{FileState, FileUpload, GenerateResponse, ProviderError, RemoteFile};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::Mutex;

/// What `generate` should do when called.
#[derive(Clone)]
pub(crate) enum GenerateScript {
    Respond(GenerateResponse),
    Fail(StatusCode, String),
}

/// Recorded `generate` invocation.
#[derive(Clone, Debug)]
pub(crate) struct GenerateCall {
    pub file_names: Vec<String>,
    pub instruction: String,
}

pub(crate) struct ScriptedProvider {
    upload_state: FileState,
    poll_states: Mutex<VecDeque<FileState>>,
    fail_upload_for: Option<String>,
    generate: GenerateScript,
    pub uploads: Mutex<Vec<FileUpload>>,
    pub polls: Mutex<Vec<String>>,
    pub generate_calls: Mutex<Vec<GenerateCall>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            upload_state: FileState::Active,
            poll_states: Mutex::new(VecDeque::new()),
            fail_upload_for: None,
            generate: GenerateScript::Respond(GenerateResponse::from_text("generated")),
            uploads: Mutex::new(Vec::new()),
            polls: Mutex::new(Vec::new()),
            generate_calls: Mutex::new(Vec::new()),
        }
    }

    /// State reported right after upload.
    pub fn with_upload_state(mut self, state: FileState) -> Self {
        self.upload_state = state;
        self
    }

    /// States handed out by successive `poll_status` calls; `ACTIVE` once exhausted.
    pub fn with_poll_states(self, states: impl IntoIterator<Item = FileState>) -> Self {
        *self.poll_states.lock().unwrap() = states.into_iter().collect();
        self
    }

    pub fn failing_upload_for(mut self, display_name: &str) -> Self {
        self.fail_upload_for = Some(display_name.to_string());
        self
    }

    pub fn with_generate(mut self, script: GenerateScript) -> Self {
        self.generate = script;
        self
    }

    pub fn upload_names(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|upload| upload.display_name.clone())
            .collect()
    }

    pub fn poll_count(&self) -> usize {
        self.polls.lock().unwrap().len()
    }

    pub fn recorded_generate_calls(&self) -> Vec<GenerateCall> {
        self.generate_calls.lock().unwrap().clone()
    }
}

fn remote_file(display_name: &str, mime_type: &str, state: FileState) -> RemoteFile {
    RemoteFile {
        name: format!("files/{}", display_name.replace('.', "-")),
        display_name: Some(display_name.to_string()),
        mime_type: mime_type.to_string(),
        uri: format!("https://files.test/{display_name}"),
        state,
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn upload_file(&self, upload: FileUpload) -> Result<RemoteFile, ProviderError> {
        let file = remote_file(&upload.display_name, &upload.mime_type, self.upload_state);
        let rejected = self.fail_upload_for.as_deref() == Some(upload.display_name.as_str());
        self.uploads.lock().unwrap().push(upload);
        if rejected {
            return Err(ProviderError::UnexpectedStatus {
                status: StatusCode::BAD_REQUEST,
                body: "upload rejected".into(),
            });
        }
        Ok(file)
    }

    async fn poll_status(&self, name: &str) -> Result<RemoteFile, ProviderError> {
        self.polls.lock().unwrap().push(name.to_string());
        let state = self
            .poll_states
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FileState::Active);
        let display_name = name.trim_start_matches("files/").replace('-', ".");
        Ok(remote_file(&display_name, "text/plain", state))
    }

    async fn generate(
        &self,
        files: &[RemoteFile],
        instruction: &str,
    ) -> Result<GenerateResponse, ProviderError> {
        self.generate_calls.lock().unwrap().push(GenerateCall {
            file_names: files.iter().map(|file| file.name.clone()).collect(),
            instruction: instruction.to_string(),
        });
        match &self.generate {
            GenerateScript::Respond(response) => Ok(response.clone()),
            GenerateScript::Fail(status, body) => Err(ProviderError::UnexpectedStatus {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}
