#![allow(dead_code)]

use async_trait::async_trait;
use nodepatch_engine::{CancelHandle, ContentOracle, EngineError, OracleError, ProjectPath, SourceStore};
use nodepatch_protocol::{PatchRequest, RelevanceRequest};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Test double answering from per-file scripts
///
/// Files without a script get an `Unavailable` error.
#[derive(Default)]
pub struct ScriptedOracle {
    relevance: HashMap<String, Result<String, OracleError>>,
    patches: HashMap<String, Result<String, OracleError>>,
    request_patches: HashMap<String, String>,
    held_patch: Option<(String, Arc<Notify>, Arc<Notify>)>,
    cancel_on_patch: Option<(String, CancelHandle)>,
    pub relevance_requests: Mutex<Vec<RelevanceRequest>>,
    pub patch_requests: Mutex<Vec<PatchRequest>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relevance(mut self, file: &str, answer: &str) -> Self {
        self.relevance.insert(file.to_string(), Ok(answer.to_string()));
        self
    }

    pub fn relevance_error(mut self, file: &str, error: OracleError) -> Self {
        self.relevance.insert(file.to_string(), Err(error));
        self
    }

    pub fn patch(mut self, file: &str, answer: &str) -> Self {
        self.patches.insert(file.to_string(), Ok(answer.to_string()));
        self
    }

    /// Answer patch exchanges for `request` with `answer`, whatever the file
    pub fn patch_for_request(mut self, request: &str, answer: &str) -> Self {
        self.request_patches.insert(request.to_string(), answer.to_string());
        self
    }

    /// Park the patch exchange for `request`: signal `parked`, then wait for `release`
    pub fn hold_patch(mut self, request: &str, parked: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.held_patch = Some((request.to_string(), parked, release));
        self
    }

    /// Fire `handle` while answering the patch exchange for `file`
    pub fn cancel_during_patch(mut self, file: &str, handle: CancelHandle) -> Self {
        self.cancel_on_patch = Some((file.to_string(), handle));
        self
    }

    pub fn patch_request_for(&self, file: &str) -> Option<PatchRequest> {
        self.patch_requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.file_context.file_path == file)
            .cloned()
    }

    pub fn patch_calls(&self) -> usize {
        self.patch_requests.lock().unwrap().len()
    }
}

fn unscripted(file: &str) -> Result<String, OracleError> {
    Err(OracleError::unavailable(format!("no script for {file}")))
}

#[async_trait]
impl ContentOracle for ScriptedOracle {
    async fn assess_relevance(&self, request: &RelevanceRequest) -> Result<String, OracleError> {
        self.relevance_requests.lock().unwrap().push(request.clone());
        self.relevance
            .get(&request.file_path)
            .cloned()
            .unwrap_or_else(|| unscripted(&request.file_path))
    }

    async fn propose_edits(&self, request: &PatchRequest) -> Result<String, OracleError> {
        let file = request.file_context.file_path.clone();
        self.patch_requests.lock().unwrap().push(request.clone());
        if let Some((target, handle)) = &self.cancel_on_patch {
            if *target == file {
                handle.cancel();
            }
        }
        if let Some((held, parked, release)) = &self.held_patch {
            if *held == request.natural_language_request {
                parked.notify_one();
                release.notified().await;
            }
        }
        if let Some(answer) = self.request_patches.get(&request.natural_language_request) {
            return Ok(answer.clone());
        }
        self.patches.get(&file).cloned().unwrap_or_else(|| unscripted(&file))
    }
}

/// In-memory store with write accounting and injectable write failures
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, String>>,
    pub writes: Mutex<Vec<String>>,
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        Self {
            files: Mutex::new(files.iter().map(|(p, c)| (p.to_string(), c.to_string())).collect()),
            ..Default::default()
        }
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn content(&self, path: &str) -> String {
        self.files.lock().unwrap().get(path).cloned().unwrap_or_default()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl SourceStore for MemoryStore {
    async fn read(&self, path: &ProjectPath) -> nodepatch_engine::Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| EngineError::read(path.as_str(), std::io::ErrorKind::NotFound.into()))
    }

    async fn write(&self, path: &ProjectPath, content: &str) -> nodepatch_engine::Result<()> {
        if self.fail_writes {
            return Err(EngineError::write(
                path.as_str(),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume"),
            ));
        }
        self.writes.lock().unwrap().push(path.to_string());
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }
}

pub fn paths(raw: &[&str]) -> Vec<ProjectPath> {
    raw.iter()
        .map(|p| ProjectPath::new(Path::new("/project"), p).unwrap())
        .collect()
}

pub fn relevant(score: u8, targets: &str) -> String {
    format!("RELEVANT: YES\nSCORE: {score}\nREASON: matches the request\nTARGETS: {targets}\n")
}

/// Lines that differ between two buffers, 1-indexed
pub fn changed_lines(before: &str, after: &str) -> Vec<usize> {
    let before: Vec<&str> = before.split('\n').collect();
    let after: Vec<&str> = after.split('\n').collect();
    (0..before.len().max(after.len()))
        .filter(|&i| before.get(i) != after.get(i))
        .map(|i| i + 1)
        .collect()
}
