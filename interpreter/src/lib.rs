#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Lumen voice-command interpretation and adaptive pattern memory.
//!
//! Turns a free-text utterance into a structured action (intent + slots +
//! response) and learns per-user phrase→action associations that take
//! priority over fresh classification on later requests.

/// Core primitives: intents, utterances, action results.
#[path = "../command.rs"]
pub mod command;

/// Static keyword, app, and stop-word tables.
#[path = "../lexicon.rs"]
pub mod lexicon;

/// Ordered first-match intent resolution.
#[path = "../classifier.rs"]
pub mod classifier;

/// Per-intent slot extraction and fuzzy app matching.
#[path = "../slots.rs"]
pub mod slots;

/// Two-document TF-IDF cosine similarity.
#[path = "../similarity.rs"]
pub mod similarity;

/// Keyword-based emotion detection and empathetic responses.
#[path = "../emotion.rs"]
pub mod emotion;

/// Learned pattern memory and persistence collaborators.
#[path = "../patterns.rs"]
pub mod patterns;

/// The command interpreter orchestrator.
#[path = "../interpreter.rs"]
pub mod interpreter;

/// Telemetry helpers for logging/event emission.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// Sample orchestration entrypoint.
#[path = "../main.rs"]
pub mod orchestration_entry;

/// Prelude exports for consumers embedding the interpreter.
pub mod prelude {
    pub use crate::classifier::IntentClassifier;
    pub use crate::command::{ActionResult, Intent, Utterance};
    pub use crate::emotion::{detect as detect_emotion, response_for, Emotion};
    pub use crate::interpreter::{CommandInterpreter, CommandInterpreterBuilder};
    pub use crate::lexicon::{AppLexicon, IntentLexicon};
    pub use crate::patterns::{
        JsonPatternPersistence, MemoryPatternPersistence, PatternPersistence, PatternRecord,
        PatternStore, PatternStoreError,
    };
    pub use crate::similarity::similarity;
    pub use crate::telemetry::{InterpreterTelemetry, InterpreterTelemetryBuilder};
}
