//! # nodepatch engine
//!
//! Applies natural-language change requests to exactly the markup nodes of
//! a file that need to change, leaving every other line byte-identical.
//!
//! ## Pipeline
//!
//! ```text
//! ProjectPath ──> SourceStore::read
//!     │
//!     ├──> Indexing    markup nodes + structural fingerprint
//!     ├──> Selecting   relevance/v1 exchange, threshold gate
//!     ├──> Planning    nested-target pruning, patch/v1 exchange
//!     ├──> Applying    splice bottom-up, overlap defense
//!     ├──> Validating  imports, exports, primary identifier, default export
//!     │                (one bounded repair pass)
//!     └──> Commit      atomic write, or rollback with violations
//! ```
//!
//! All oracle traffic goes through one [`OracleGate`]: a concurrency cap
//! independent of file parallelism, a per-call timeout and a per-session
//! usage counter.

mod applicator;
mod config;
mod controller;
mod error;
mod grammar;
mod oracle;
mod paths;
mod planner;
mod report;
mod selector;
mod store;
mod validator;

pub use applicator::{apply_edits, ApplyResult};
pub use config::EngineConfig;
pub use controller::{BatchController, CancelHandle};
pub use error::{EngineError, OracleError, Result, Violation};
pub use grammar::{decode_edit_map, decode_relevance, extract_json_object, NodeEditValue, RelevanceAnswer};
pub use oracle::{ContentOracle, OracleGate, OracleUsage, OracleUsageSnapshot};
pub use paths::ProjectPath;
pub use planner::{build_patch_request, plan, plan_from_response, prune_nested_targets, NodeEdit, PatchPlan};
pub use report::{OutcomeStatus, PatchOutcome, SessionReport};
pub use selector::{decision_from_response, describe_file, select_targets, RelevanceDecision};
pub use store::{FsStore, SourceStore};
pub use validator::{repair, validate, validate_or_repair, ValidationReport};
