//! # nodepatch markup index
//!
//! Structural indexing of source files that embed UI markup (JSX/TSX).
//!
//! ## Architecture
//!
//! ```text
//! Source Code
//!     │
//!     ├──> Language Detection (from extension)
//!     │
//!     ├──> Tree-sitter Parsing → AST (fails closed on syntax errors)
//!     │
//!     ├──> Preorder Traversal
//!     │    ├─> One MarkupNode per element, ids node_1, node_2, ...
//!     │    ├─> Span, exact snippet, context window
//!     │    └─> Attributes, literal text, advisory flags, depth
//!     │
//!     └──> StructuralFingerprint (imports, exports, primary identifier)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use nodepatch_markup_index::{MarkupIndexer, Language};
//!
//! let code = "export default function App() {\n  return <button>Sign In</button>;\n}\n";
//! let mut indexer = MarkupIndexer::new(Language::JavaScript).unwrap();
//! for node in indexer.index(code) {
//!     println!("{} <{}> lines {}", node.id, node.tag, node.span);
//! }
//! ```

mod config;
mod error;
mod fingerprint;
mod flags;
mod indexer;
mod language;
mod types;

pub use config::IndexerConfig;
pub use error::{IndexError, Result};
pub use fingerprint::{has_default_export, primary_identifier, StructuralFingerprint};
pub use flags::compute_flags;
pub use indexer::{index_source, slice_lines, MarkupIndexer};
pub use language::Language;
pub use types::{MarkupNode, NodeFlag, Span, UNKNOWN_TAG};
