use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Emotions the keyword detector can report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    /// Cheerful or enthusiastic wording.
    Happy,
    /// Dejected wording.
    Sad,
    /// Hostile or frustrated wording.
    Angry,
    /// Pressured or anxious wording.
    Stressed,
    /// Afraid wording.
    Fearful,
    /// Astonished wording.
    Surprised,
    /// Nothing detected.
    Neutral,
}

/// Emotion keyword table. Row order breaks score ties.
const EMOTION_KEYWORDS: &[(Emotion, &[&str])] = &[
    (
        Emotion::Happy,
        &["happy", "great", "awesome", "wonderful", "excellent", "good", "love", "amazing"],
    ),
    (
        Emotion::Sad,
        &["sad", "depressed", "down", "upset", "crying", "terrible", "awful", "bad"],
    ),
    (
        Emotion::Angry,
        &["angry", "mad", "furious", "annoyed", "frustrated", "hate", "stupid"],
    ),
    (
        Emotion::Stressed,
        &["stressed", "worried", "anxious", "nervous", "overwhelmed", "pressure"],
    ),
    (
        Emotion::Fearful,
        &["scared", "afraid", "frightened", "terrified", "worried", "nervous"],
    ),
    (
        Emotion::Surprised,
        &["wow", "amazing", "incredible", "unbelievable", "shocking", "surprised"],
    ),
];

/// Detects the dominant emotion by keyword-count voting.
///
/// Each table row scores one point per keyword contained in the text; the
/// highest score wins, ties go to the earlier row, and no hit at all is
/// `Neutral`. The input is expected lowercased.
#[must_use]
pub fn detect(text: &str) -> Emotion {
    let mut best = Emotion::Neutral;
    let mut best_score = 0_usize;
    for (emotion, keywords) in EMOTION_KEYWORDS {
        let score = keywords
            .iter()
            .filter(|keyword| text.contains(*keyword))
            .count();
        if score > best_score {
            best_score = score;
            best = *emotion;
        }
    }
    best
}

/// A canned empathetic line for the detected emotion.
///
/// Selection hashes the utterance text so the same phrasing always gets the
/// same line, while different phrasings rotate through the set.
#[must_use]
pub fn response_for(emotion: Emotion, text: &str) -> &'static str {
    let lines: &[&str] = match emotion {
        Emotion::Happy => &[
            "You sound cheerful today! That's wonderful!",
            "I can hear the joy in your voice!",
            "Your positive energy is contagious!",
        ],
        Emotion::Sad => &[
            "I notice you might be feeling down. Is there anything I can help with?",
            "Would you like me to play some uplifting music?",
            "I'm here if you need to talk.",
        ],
        Emotion::Angry => &[
            "You seem frustrated. Let me help you with that.",
            "Take a deep breath. How can I assist you?",
            "I understand you're upset. What can I do to help?",
        ],
        Emotion::Stressed => &[
            "You sound stressed. Would you like me to play some calming music?",
            "Let's take this one step at a time. How can I help?",
            "Maybe some relaxation techniques would help?",
        ],
        Emotion::Fearful => &[
            "Everything will be okay. I'm here to help.",
            "You're safe. What do you need assistance with?",
            "Let me help you feel more comfortable.",
        ],
        Emotion::Surprised => &[
            "That's interesting! Tell me more.",
            "I can hear the surprise in your voice!",
            "What happened?",
        ],
        Emotion::Neutral => &[
            "How can I help you today?",
            "What would you like me to do?",
            "I'm ready to assist you.",
        ],
    };
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    lines[(hasher.finish() as usize) % lines.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_clear_emotions() {
        assert_eq!(detect("i am so happy this is awesome"), Emotion::Happy);
        assert_eq!(detect("i hate this stupid thing"), Emotion::Angry);
        assert_eq!(detect("i'm worried and anxious about tomorrow"), Emotion::Stressed);
    }

    #[test]
    fn no_keywords_is_neutral() {
        assert_eq!(detect("open whatsapp"), Emotion::Neutral);
    }

    #[test]
    fn higher_count_beats_earlier_row() {
        // One "bad" (sad) versus two angry keywords.
        assert_eq!(detect("bad mood and i'm mad and furious"), Emotion::Angry);
    }

    #[test]
    fn responses_are_deterministic() {
        let first = response_for(Emotion::Sad, "i feel down");
        let second = response_for(Emotion::Sad, "i feel down");
        assert_eq!(first, second);
    }
}
