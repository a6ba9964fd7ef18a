//! # ebs-kb — the persistent knowledge base
//!
//! A flat directory of content-addressed JSON records, written atomically
//! (temp-file-then-rename) and indexed by embedding distance with a substring-match
//! fallback. The engine writes to it from the evolution and execution nodes — a
//! lesson learned from a successful refinement, a success pattern worth repeating, or
//! the rationale behind a branch that got folded into a synthesis (§4.13).

pub mod error;
pub mod filename;
pub mod kb;
pub mod record;
pub mod search;

pub use error::KbError;
pub use kb::KnowledgeBase;
pub use record::{Record, RecordType};
pub use search::SearchResult;
