use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Closed set of things the assistant can be asked to do.
///
/// Declaration order here is not significant; matching priority lives in the
/// intent lexicon table, which is data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Capability summary request.
    Help,
    /// Schedule a reminder.
    SetReminder,
    /// Launch an installed application.
    OpenApp,
    /// Place a phone call.
    MakeCall,
    /// Send an SMS/text message.
    SendMessage,
    /// Playback and volume control.
    ControlMusic,
    /// Camera launch with mode selection.
    ControlCamera,
    /// Weather lookup.
    GetWeather,
    /// Photo gallery launch.
    OpenGallery,
    /// Device settings launch.
    OpenSettings,
    /// Calculator launch.
    OpenCalculator,
    /// Nothing matched.
    Unknown,
}

impl Intent {
    /// Returns the wire-level action name for the intent family.
    ///
    /// Some intents fan out into more specific action names at extraction
    /// time (music playback controls, for instance); this is the family
    /// default.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::SetReminder => "set_reminder",
            Self::OpenApp => "open_app",
            Self::MakeCall => "make_call",
            Self::SendMessage => "send_sms",
            Self::ControlMusic => "play_music",
            Self::ControlCamera => "open_camera",
            Self::GetWeather => "get_weather",
            Self::OpenGallery => "open_gallery",
            Self::OpenSettings => "open_settings",
            Self::OpenCalculator => "open_calculator",
            Self::Unknown => "unknown",
        }
    }
}

/// A single spoken (already transcribed) request, scoped to one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    /// Owning user identifier.
    pub user_id: String,
    /// Raw text as received from the speech layer.
    pub raw: String,
    /// Lowercased and trimmed text every matcher operates on.
    pub text: String,
    /// Arrival timestamp.
    pub received_at: DateTime<Utc>,
}

impl Utterance {
    /// Creates an utterance, normalising the text once at the boundary.
    #[must_use]
    pub fn new(user_id: impl Into<String>, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let text = raw.to_lowercase().trim().to_string();
        Self {
            user_id: user_id.into(),
            raw,
            text,
            received_at: Utc::now(),
        }
    }
}

/// Structured outcome of interpreting one utterance.
///
/// Serialises as the flat key/value record the wrapper layers expect:
/// `action`, `response`, plus whatever slots the intent extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// Wire-level action name (e.g. `make_call`, `volume_up`, `unknown`).
    pub action: String,
    /// Intent family the action belongs to.
    pub intent: Intent,
    /// Extracted slots, in extraction order.
    #[serde(flatten)]
    pub slots: IndexMap<String, String>,
    /// Human-readable response, always non-empty.
    pub response: String,
    /// Whether the command resolved to something actionable.
    pub success: bool,
    /// Alternatives offered when nothing matched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Set when the command needs a follow-up turn (e.g. message body).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub requires_input: bool,
}

impl ActionResult {
    /// Creates a successful result for the given intent and action name.
    #[must_use]
    pub fn new(intent: Intent, action: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            intent,
            slots: IndexMap::new(),
            response: response.into(),
            success: true,
            suggestions: Vec::new(),
            requires_input: false,
        }
    }

    /// Creates an `unknown` result with the given corrective response.
    #[must_use]
    pub fn unknown(response: impl Into<String>) -> Self {
        let mut result = Self::new(Intent::Unknown, "unknown", response);
        result.success = false;
        result
    }

    /// Attaches a slot and returns self for chaining.
    #[must_use]
    pub fn with_slot(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.slots.insert(field.into(), value.into());
        self
    }

    /// Attaches suggestions and returns self for chaining.
    #[must_use]
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Marks the result as needing a follow-up turn.
    #[must_use]
    pub fn needs_input(mut self) -> Self {
        self.requires_input = true;
        self
    }

    /// Convenience accessor for a slot value.
    #[must_use]
    pub fn slot(&self, field: &str) -> Option<&str> {
        self.slots.get(field).map(String::as_str)
    }
}
