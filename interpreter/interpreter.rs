use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::json;
use shared_logging::LogLevel;

use crate::classifier::IntentClassifier;
use crate::command::{ActionResult, Intent, Utterance};
use crate::lexicon::{AppLexicon, IntentLexicon};
use crate::patterns::{MemoryPatternPersistence, PatternPersistence, PatternStore};
use crate::slots::{extract, fuzzy_app_match};
use crate::telemetry::InterpreterTelemetry;

const WELCOME_RESPONSE: &str = "Welcome! I'm your personal voice assistant.\n\
    I can place calls, send messages, open apps, control music, set reminders \
    and check the weather.\n\
    Try \"call mom\", \"open whatsapp\" or \"remind me to drink water at 3 pm\". \
    Say \"help\" anytime for the full list.";

/// Builder used to configure a [`CommandInterpreter`].
pub struct CommandInterpreterBuilder {
    intents: IntentLexicon,
    apps: AppLexicon,
    persistence: Arc<dyn PatternPersistence>,
    telemetry: Option<InterpreterTelemetry>,
    welcome_new_users: bool,
}

impl Default for CommandInterpreterBuilder {
    fn default() -> Self {
        Self {
            intents: IntentLexicon::production_default(),
            apps: AppLexicon::production_default(),
            persistence: Arc::new(MemoryPatternPersistence::new()),
            telemetry: None,
            welcome_new_users: true,
        }
    }
}

impl CommandInterpreterBuilder {
    /// Overrides the intent dispatch table.
    #[must_use]
    pub fn intents(mut self, intents: IntentLexicon) -> Self {
        self.intents = intents;
        self
    }

    /// Overrides the app catalogue.
    #[must_use]
    pub fn apps(mut self, apps: AppLexicon) -> Self {
        self.apps = apps;
        self
    }

    /// Assigns the pattern persistence collaborator.
    #[must_use]
    pub fn persistence(mut self, persistence: Arc<dyn PatternPersistence>) -> Self {
        self.persistence = persistence;
        self
    }

    /// Attaches telemetry sinks.
    #[must_use]
    pub fn telemetry(mut self, telemetry: InterpreterTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Enables or disables the first-interaction welcome.
    #[must_use]
    pub fn welcome_new_users(mut self, enabled: bool) -> Self {
        self.welcome_new_users = enabled;
        self
    }

    /// Finalizes the builder returning a [`CommandInterpreter`].
    #[must_use]
    pub fn build(self) -> CommandInterpreter {
        CommandInterpreter {
            classifier: IntentClassifier::new(Arc::new(self.intents)),
            apps: self.apps,
            store: PatternStore::bootstrap(self.persistence),
            telemetry: self.telemetry,
            seen_users: RwLock::new(HashSet::new()),
            welcome_new_users: self.welcome_new_users,
        }
    }
}

/// Orchestrates recall, classification, extraction and fuzzy fallback.
///
/// Per-utterance state machine: RECALL → CLASSIFY → EXTRACT →
/// FUZZY_FALLBACK → terminal result. Every branch terminates in a
/// well-formed [`ActionResult`]; there is no fatal path.
pub struct CommandInterpreter {
    classifier: IntentClassifier,
    apps: AppLexicon,
    store: PatternStore,
    telemetry: Option<InterpreterTelemetry>,
    seen_users: RwLock<HashSet<String>>,
    welcome_new_users: bool,
}

impl CommandInterpreter {
    /// Creates a builder with production defaults.
    #[must_use]
    pub fn builder() -> CommandInterpreterBuilder {
        CommandInterpreterBuilder::default()
    }

    /// Read access to the pattern store (observability, tests).
    #[must_use]
    pub fn patterns(&self) -> &PatternStore {
        &self.store
    }

    /// Interprets one utterance for one user.
    pub fn interpret(&self, user_id: &str, text: &str) -> ActionResult {
        let utterance = Utterance::new(user_id, text);
        self.log(
            LogLevel::Info,
            "interpreter.command.received",
            user_id,
            json!({ "text": utterance.text }),
        );

        if let Some(result) = self.welcome_if_first_interaction(&utterance) {
            return result;
        }

        // RECALL: learned phrases outrank fresh classification. The stored
        // intent is re-extracted against the current text, not the phrase.
        if let Some(hit) = self.store.recall(&utterance.user_id, &utterance.text) {
            let result = extract(hit.intent, &utterance.text, &self.apps);
            self.store
                .reinforce(&utterance.user_id, &utterance.text, hit.intent);
            self.observe(
                "interpreter.pattern.recalled",
                user_id,
                json!({
                    "phrase": hit.phrase,
                    "score": hit.score,
                    "confidence": hit.confidence,
                    "intent": hit.intent.label(),
                }),
            );
            return result;
        }

        // CLASSIFY + EXTRACT.
        if let Some(intent) = self.classifier.classify(&utterance.text) {
            let result = extract(intent, &utterance.text, &self.apps);
            if result.action != "unknown" {
                self.store
                    .reinforce(&utterance.user_id, &utterance.text, intent);
            }
            self.observe(
                "interpreter.intent.classified",
                user_id,
                json!({ "intent": intent.label(), "action": result.action }),
            );
            return result;
        }

        // FUZZY_FALLBACK: maybe the whole utterance names an app.
        if let Some(result) = fuzzy_app_match(&utterance.text, &self.apps) {
            self.store
                .reinforce(&utterance.user_id, &utterance.text, Intent::OpenApp);
            self.observe(
                "interpreter.fuzzy.matched",
                user_id,
                json!({ "app_name": result.slot("app_name"), "action": result.action }),
            );
            return result;
        }

        let suggestions = self.suggestions(&utterance.text);
        self.observe(
            "interpreter.command.unknown",
            user_id,
            json!({ "text": utterance.text, "suggestions": suggestions }),
        );
        ActionResult::unknown(format!(
            "Sorry, I didn't understand '{}'. Did you mean: {}?",
            utterance.text,
            suggestions.join(", ")
        ))
        .with_suggestions(suggestions)
    }

    /// Up to three alternatives built from partial containment against the
    /// command names and the first five catalogue apps.
    fn suggestions(&self, text: &str) -> Vec<String> {
        let mut suggestions = Vec::new();
        for name in self.classifier.lexicon().command_names() {
            if text.contains(name) || name.contains(text) {
                suggestions.push(format!("{name} something"));
            }
        }
        for app in self.apps.sample(5) {
            if text.contains(app) || app.contains(text) {
                suggestions.push(format!("open {app}"));
            }
        }
        if suggestions.is_empty() {
            suggestions = vec![
                "open app".to_string(),
                "call someone".to_string(),
                "set reminder".to_string(),
                "play music".to_string(),
            ];
        }
        suggestions.truncate(3);
        suggestions
    }

    /// First interaction with an empty or bare-greeting utterance gets the
    /// capability welcome instead of command processing.
    fn welcome_if_first_interaction(&self, utterance: &Utterance) -> Option<ActionResult> {
        if !self.welcome_new_users {
            return None;
        }
        let first_time = !self.seen_users.read().contains(&utterance.user_id);
        if !first_time {
            return None;
        }
        self.seen_users.write().insert(utterance.user_id.clone());
        if matches!(utterance.text.as_str(), "" | "hello" | "hi" | "hey") {
            self.observe(
                "interpreter.user.welcomed",
                &utterance.user_id,
                json!({}),
            );
            return Some(ActionResult::new(Intent::Help, "welcome", WELCOME_RESPONSE));
        }
        None
    }

    fn observe(&self, event_type: &str, user_id: &str, payload: serde_json::Value) {
        self.log(LogLevel::Info, event_type, user_id, payload.clone());
        if let Some(telemetry) = &self.telemetry {
            if let Err(error) = telemetry.event(event_type, payload) {
                tracing::debug!(%error, event_type, "telemetry event dropped");
            }
        }
    }

    fn log(&self, level: LogLevel, message: &str, user_id: &str, fields: serde_json::Value) {
        if let Some(telemetry) = &self.telemetry {
            if let Err(error) = telemetry.log(level, message, Some(user_id), fields) {
                tracing::debug!(%error, message, "telemetry log dropped");
            }
        }
    }
}
