use indexmap::IndexMap;

use crate::command::Intent;

/// One row of the intent dispatch table.
#[derive(Debug, Clone, Copy)]
pub struct IntentEntry {
    /// Short command name used in suggestions (`"call"`, `"reminder"`, ...).
    pub name: &'static str,
    /// Intent this row resolves to.
    pub intent: Intent,
    /// Trigger keywords matched by substring containment.
    pub keywords: &'static [&'static str],
}

/// Ordered intent→keywords table.
///
/// Row order is the matching priority and is part of the interpreter
/// contract: when an utterance carries keywords from two families
/// ("remind me to call mom"), the earlier row wins.
#[derive(Debug, Clone)]
pub struct IntentLexicon {
    entries: Vec<IntentEntry>,
}

impl IntentLexicon {
    /// Builds the production dispatch table.
    ///
    /// Priority: help > reminder > open > call > message > music > camera >
    /// weather > gallery > settings > calculator.
    #[must_use]
    pub fn production_default() -> Self {
        Self {
            entries: vec![
                IntentEntry {
                    name: "help",
                    intent: Intent::Help,
                    keywords: &["help", "commands", "what can you do"],
                },
                IntentEntry {
                    name: "reminder",
                    intent: Intent::SetReminder,
                    keywords: &["remind", "reminder", "alert", "notify"],
                },
                IntentEntry {
                    name: "open",
                    intent: Intent::OpenApp,
                    keywords: &["open", "launch", "start", "run"],
                },
                IntentEntry {
                    name: "call",
                    intent: Intent::MakeCall,
                    keywords: &["call", "phone", "dial", "ring"],
                },
                IntentEntry {
                    name: "message",
                    intent: Intent::SendMessage,
                    keywords: &["message", "text", "sms", "send"],
                },
                IntentEntry {
                    name: "music",
                    intent: Intent::ControlMusic,
                    keywords: &["play", "music", "song", "pause", "stop", "next", "previous"],
                },
                IntentEntry {
                    name: "camera",
                    intent: Intent::ControlCamera,
                    keywords: &["camera", "photo", "picture", "selfie"],
                },
                IntentEntry {
                    name: "weather",
                    intent: Intent::GetWeather,
                    keywords: &["weather", "temperature", "forecast"],
                },
                IntentEntry {
                    name: "gallery",
                    intent: Intent::OpenGallery,
                    keywords: &["gallery", "photos", "images"],
                },
                IntentEntry {
                    name: "settings",
                    intent: Intent::OpenSettings,
                    keywords: &["settings", "preferences", "config"],
                },
                IntentEntry {
                    name: "calculator",
                    intent: Intent::OpenCalculator,
                    keywords: &["calculator", "calculate", "math"],
                },
            ],
        }
    }

    /// Builds a table from custom rows (row order = priority).
    #[must_use]
    pub fn from_entries(entries: Vec<IntentEntry>) -> Self {
        Self { entries }
    }

    /// Iterates rows in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &IntentEntry> {
        self.entries.iter()
    }

    /// Short command names in priority order, excluding the help row.
    pub fn command_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries
            .iter()
            .filter(|entry| entry.intent != Intent::Help)
            .map(|entry| entry.name)
    }
}

/// Static app-name → platform-package lexicon, shared read-only across users.
#[derive(Debug, Clone)]
pub struct AppLexicon {
    apps: IndexMap<String, String>,
}

impl AppLexicon {
    /// Builds the stock catalogue of launchable apps.
    #[must_use]
    pub fn production_default() -> Self {
        let mut apps = IndexMap::new();
        for (name, package) in [
            ("whatsapp", "com.whatsapp"),
            ("instagram", "com.instagram.android"),
            ("youtube", "com.google.android.youtube"),
            ("facebook", "com.facebook.katana"),
            ("twitter", "com.twitter.android"),
            ("telegram", "org.telegram.messenger"),
            ("chrome", "com.android.chrome"),
            ("gmail", "com.google.android.gm"),
            ("maps", "com.google.android.apps.maps"),
            ("spotify", "com.spotify.music"),
            ("netflix", "com.netflix.mediaclient"),
            ("amazon", "in.amazon.mShop.android.shopping"),
            ("flipkart", "com.flipkart.android"),
            ("paytm", "net.one97.paytm"),
            ("phonepe", "com.phonepe.app"),
            ("gpay", "com.google.android.apps.nbu.paisa.user"),
            ("camera", "camera"),
            ("gallery", "gallery"),
            ("settings", "settings"),
            ("calculator", "calculator"),
            ("contacts", "contacts"),
            ("messages", "messages"),
            ("phone", "phone"),
        ] {
            apps.insert(name.to_string(), package.to_string());
        }
        Self { apps }
    }

    /// Creates an empty lexicon (useful for tests and custom catalogues).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            apps: IndexMap::new(),
        }
    }

    /// Registers or replaces an app entry.
    pub fn insert(&mut self, name: impl Into<String>, package: impl Into<String>) {
        self.apps.insert(name.into(), package.into());
    }

    /// Looks up a package identifier by exact app name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.apps.get(name).map(String::as_str)
    }

    /// App names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(String::as_str)
    }

    /// The first `limit` app names, offered as examples when lookup fails.
    #[must_use]
    pub fn sample(&self, limit: usize) -> Vec<&str> {
        self.names().take(limit).collect()
    }

    /// Number of known apps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Whether the catalogue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

/// Filler words stripped from app-launch commands before lexicon lookup.
pub const APP_NAME_STOP_WORDS: &[&str] =
    &["open", "launch", "start", "run", "the", "app", "application"];

/// English stop words ignored by the similarity scorer.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "am", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "before", "being", "below", "between", "both", "but", "by", "can",
    "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how",
    "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "you", "your",
];

/// Whether the token is an english stop word for similarity purposes.
#[must_use]
pub fn is_english_stop_word(token: &str) -> bool {
    ENGLISH_STOP_WORDS.contains(&token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_priority_puts_reminder_before_call() {
        let lexicon = IntentLexicon::production_default();
        let order: Vec<Intent> = lexicon.iter().map(|entry| entry.intent).collect();
        let reminder = order.iter().position(|i| *i == Intent::SetReminder);
        let call = order.iter().position(|i| *i == Intent::MakeCall);
        assert!(reminder < call);
    }

    #[test]
    fn app_lexicon_resolves_packages() {
        let apps = AppLexicon::production_default();
        assert_eq!(apps.get("whatsapp"), Some("com.whatsapp"));
        assert_eq!(apps.get("unheard-of"), None);
        assert_eq!(apps.sample(5).len(), 5);
    }

    #[test]
    fn command_names_skip_help() {
        let lexicon = IntentLexicon::production_default();
        let names: Vec<&str> = lexicon.command_names().collect();
        assert!(!names.contains(&"help"));
        assert_eq!(names.first(), Some(&"reminder"));
    }

    #[test]
    fn stop_word_membership() {
        assert!(is_english_stop_word("the"));
        assert!(!is_english_stop_word("whatsapp"));
    }
}
