//! PushLog Authorship Engine: deterministic, rule-based heuristics.
//!
//! Takes an already-fetched commit history, filters out bots and generated
//! files, segments per-author work sessions, and folds independent signals
//! into one bounded score with an ordered, explainable list of reasons.
//!
//! No AI, no DB, no network; pure computation.

pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod session;
pub mod signals;
pub mod stats;
pub mod types;
pub mod velocity;

pub use compose::Composer;
pub use config::Config;
pub use engine::Engine;
pub use error::EngineError;
pub use types::{AnalysisRequest, Report};
