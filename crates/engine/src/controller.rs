use crate::applicator::apply_edits;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::oracle::{ContentOracle, OracleGate};
use crate::paths::ProjectPath;
use crate::planner::{build_patch_request, plan, prune_nested_targets};
use crate::report::{PatchOutcome, SessionReport};
use crate::selector::select_targets;
use crate::store::SourceStore;
use crate::validator::validate_or_repair;
use nodepatch_markup_index::{IndexerConfig, Language, MarkupIndexer, MarkupNode, StructuralFingerprint};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, Semaphore};
use tokio::task::JoinSet;

/// Per-file pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Idle,
    Indexing,
    Selecting,
    Planning,
    Applying,
    Validating,
    Committed,
    RolledBack,
}

struct StateTrace<'a> {
    path: &'a ProjectPath,
    state: PipelineState,
}

impl<'a> StateTrace<'a> {
    fn new(path: &'a ProjectPath) -> Self {
        Self {
            path,
            state: PipelineState::Idle,
        }
    }

    fn enter(&mut self, next: PipelineState) {
        log::debug!("{}: {:?} -> {:?}", self.path, self.state, next);
        self.state = next;
    }
}

/// Cancels a running session
///
/// Files already committed stay committed; every other file is abandoned
/// before its commit and reported as failed.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Exclusive per-path locks shared by every session of a controller
#[derive(Default)]
struct PathLocks {
    locks: Mutex<HashMap<ProjectPath, Arc<AsyncMutex<()>>>>,
}

impl PathLocks {
    async fn acquire(&self, path: &ProjectPath) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(path.clone()).or_default())
        };
        lock.lock_owned().await
    }
}

struct Shared {
    config: EngineConfig,
    gate: OracleGate,
    store: Arc<dyn SourceStore>,
    locks: PathLocks,
}

/// Drives the index → select → plan → apply → validate pipeline over a batch of files
pub struct BatchController {
    shared: Arc<Shared>,
}

impl BatchController {
    pub fn new(config: EngineConfig, oracle: Arc<dyn ContentOracle>, store: Arc<dyn SourceStore>) -> Result<Self> {
        config.validate().map_err(EngineError::InvalidConfig)?;
        let gate = OracleGate::new(oracle, config.oracle_concurrency, config.oracle_timeout());
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                gate,
                store,
                locks: PathLocks::default(),
            }),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Run one session; never fails, every file gets an outcome
    pub async fn run(&self, request: &str, files: Vec<ProjectPath>) -> SessionReport {
        self.run_cancellable(request, files, CancelHandle::default()).await
    }

    pub async fn run_cancellable(
        &self,
        request: &str,
        files: Vec<ProjectPath>,
        cancel: CancelHandle,
    ) -> SessionReport {
        let files = dedupe(files);
        let session = Arc::new(Session {
            shared: Arc::clone(&self.shared),
            gate: self.shared.gate.for_session(),
            request: request.to_string(),
            cancel,
        });
        log::info!(
            "Patch session started: {} file(s), file concurrency {}",
            files.len(),
            self.shared.config.file_concurrency
        );

        let permits = Arc::new(Semaphore::new(self.shared.config.file_concurrency));
        let mut tasks = JoinSet::new();
        for (index, path) in files.iter().cloned().enumerate() {
            let session = Arc::clone(&session);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                (index, session.process(path).await)
            });
        }

        let mut slots: Vec<Option<PatchOutcome>> = vec![None; files.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => log::error!("Pipeline task failed: {e}"),
            }
        }

        let outcomes: Vec<PatchOutcome> = slots
            .into_iter()
            .zip(files)
            .map(|(slot, path)| slot.unwrap_or_else(|| PatchOutcome::failed(path, "pipeline task aborted")))
            .collect();
        let report = SessionReport::from_outcomes(outcomes, session.gate.usage().snapshot());
        log::info!(
            "Patch session complete: {}/{} file(s) committed, {} oracle call(s), {} failure(s)",
            report.files_modified,
            report.files_analyzed,
            report.oracle_usage.calls,
            report.oracle_usage.failures
        );
        report
    }
}

/// Canonical paths are unique per session; later duplicates are dropped
fn dedupe(files: Vec<ProjectPath>) -> Vec<ProjectPath> {
    let mut seen = HashSet::new();
    files
        .into_iter()
        .filter(|path| {
            let fresh = seen.insert(path.clone());
            if !fresh {
                log::debug!("Ignoring duplicate path {path}");
            }
            fresh
        })
        .collect()
}

struct Session {
    shared: Arc<Shared>,
    gate: OracleGate,
    request: String,
    cancel: CancelHandle,
}

impl Session {
    async fn process(&self, path: ProjectPath) -> PatchOutcome {
        match self.pipeline(&path).await {
            Ok(outcome) => outcome,
            Err(EngineError::Cancelled) => {
                log::info!("{path}: abandoned (cancelled)");
                PatchOutcome::failed(path, "cancelled")
            }
            Err(e) => {
                log::warn!("{path}: {e}");
                PatchOutcome::failed(path, e.to_string())
            }
        }
    }

    fn ensure_active(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn pipeline(&self, path: &ProjectPath) -> Result<PatchOutcome> {
        let config = &self.shared.config;
        let mut trace = StateTrace::new(path);
        self.ensure_active()?;

        trace.enter(PipelineState::Indexing);
        let language = Language::from_path(path);
        if language == Language::Unknown {
            return Ok(PatchOutcome::skipped(path.clone(), "unsupported file type"));
        }
        let original = self.shared.store.read(path).await?;
        let fingerprint = StructuralFingerprint::extract(&original);
        let nodes = match index_file(language, &original, config) {
            Ok(nodes) => nodes,
            Err(e) => return Ok(PatchOutcome::skipped(path.clone(), e.to_string())),
        };
        if nodes.is_empty() {
            return Ok(PatchOutcome::skipped(path.clone(), "no markup nodes"));
        }
        let analyzed = nodes.len();
        self.ensure_active()?;

        trace.enter(PipelineState::Selecting);
        let decision = select_targets(
            &self.gate,
            &self.request,
            path.as_str(),
            fingerprint.primary_identifier.as_deref(),
            &nodes,
            config,
        )
        .await;
        self.ensure_active()?;
        if !decision.is_accepted(config.relevance_threshold) {
            log::info!("{path}: not selected (score {})", decision.score);
            return Ok(PatchOutcome::skipped(
                path.clone(),
                format!("not relevant (score {}): {}", decision.score, decision.reasoning),
            )
            .with_counts(analyzed, 0, 0)
            .with_score(decision.score));
        }

        trace.enter(PipelineState::Planning);
        let targets = if config.prune_nested_targets {
            prune_nested_targets(&nodes, &decision.target_node_ids)
        } else {
            decision.target_node_ids.clone()
        };
        let selected: Vec<&MarkupNode> = nodes.iter().filter(|n| targets.contains(&n.id)).collect();
        let line_count = original.split('\n').count();
        let patch_request = build_patch_request(&self.request, path.as_str(), &fingerprint, line_count, &selected);
        let patch_plan = plan(&self.gate, &patch_request).await;
        self.ensure_active()?;

        let outcome_base = |outcome: PatchOutcome, modified: usize| {
            outcome
                .with_counts(analyzed, selected.len(), modified)
                .with_score(decision.score)
                .with_follow_ups(patch_plan.follow_ups.clone())
        };
        if patch_plan.is_empty() {
            trace.enter(PipelineState::RolledBack);
            return Ok(outcome_base(
                PatchOutcome::no_op(path.clone(), "no edits proposed; content unchanged"),
                0,
            ));
        }

        let _guard = self.shared.locks.acquire(path).await;
        if self.shared.store.read(path).await? != original {
            log::warn!("{path}: changed on disk since it was indexed");
            trace.enter(PipelineState::RolledBack);
            return Ok(outcome_base(
                PatchOutcome::failed(path.clone(), "file changed during session"),
                0,
            ));
        }
        trace.enter(PipelineState::Applying);
        let applied = apply_edits(&original, &nodes, &patch_plan.edits);
        if !applied.superseded.is_empty() {
            log::warn!("{path}: superseded overlapping edits: {}", applied.superseded.join(", "));
        }
        if applied.applied_count == 0 || applied.content == original {
            trace.enter(PipelineState::RolledBack);
            return Ok(outcome_base(
                PatchOutcome::no_op(path.clone(), "edits left the file unchanged"),
                0,
            ));
        }

        trace.enter(PipelineState::Validating);
        let (content, repaired) =
            match validate_or_repair(applied.content, &fingerprint, &original, &applied.edited_lines) {
                Ok(validated) => validated,
                Err(EngineError::StructuralViolation(violations)) => {
                    log::warn!("{path}: {} structural violation(s), rolled back", violations.len());
                    trace.enter(PipelineState::RolledBack);
                    return Ok(outcome_base(
                        PatchOutcome::rolled_back(path.clone(), violations),
                        applied.applied_count,
                    ));
                }
                Err(e) => return Err(e),
            };
        if repaired {
            log::info!("{path}: repaired lost declarations");
        }

        self.ensure_active()?;
        if config.dry_run {
            trace.enter(PipelineState::Committed);
            return Ok(outcome_base(
                PatchOutcome::committed(path.clone(), format!("dry run, not written: {}", decision.reasoning)),
                applied.applied_count,
            )
            .with_repaired(repaired));
        }

        if let Err(e) = self.shared.store.write(path, &content).await {
            log::warn!("{path}: {e}");
            return Ok(outcome_base(PatchOutcome::failed(path.clone(), e.to_string()), applied.applied_count)
                .with_repaired(repaired));
        }
        trace.enter(PipelineState::Committed);
        log::info!("{path}: committed {} edit(s)", applied.applied_count);
        Ok(outcome_base(
            PatchOutcome::committed(path.clone(), decision.reasoning.clone()),
            applied.applied_count,
        )
        .with_repaired(repaired))
    }
}

fn index_file(language: Language, content: &str, config: &EngineConfig) -> Result<Vec<MarkupNode>> {
    let indexer_config = IndexerConfig::default().with_context_lines(config.context_lines);
    let mut indexer =
        MarkupIndexer::with_config(indexer_config, language).map_err(|e| EngineError::parse(e.to_string()))?;
    indexer.try_index(content).map_err(|e| EngineError::parse(e.to_string()))
}
