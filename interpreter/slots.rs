use once_cell::sync::Lazy;
use regex::Regex;

use crate::command::{ActionResult, Intent};
use crate::lexicon::{AppLexicon, APP_NAME_STOP_WORDS};
use crate::similarity::similarity;

static PHONE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{10}\b|\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap());

/// Full message patterns, tried in order: trigger, connector ("to" before
/// "message" so the contact token never swallows the connector), single-token
/// contact, second trigger, then the body greedy to end of string.
static MESSAGE_FULL: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)(?:send|text).*?\bto\s+(\S+).*?(?:saying|that|message)\s+(.+)").unwrap(),
        Regex::new(r"(?i)(?:send|text).*?\bmessage\s+(\S+).*?(?:saying|that|message)\s+(.+)")
            .unwrap(),
    ]
});

static MESSAGE_SIMPLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:message|text|sms)\s+(\S+)").unwrap());

/// Reminder time patterns, tried in order; the first match wins.
static REMINDER_TIMES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)(?:at|in)\s+\d{1,2}(?::\d{2})?\s*(?:am|pm)").unwrap(),
        Regex::new(r"(?i)in\s+\d+\s*(?:minutes?|mins?|hours?|hrs?)").unwrap(),
        Regex::new(r"(?i)(?:tomorrow|today|tonight)").unwrap(),
        Regex::new(r"(?i)at\s+\d{1,2}(?:\s*(?:am|pm))?").unwrap(),
    ]
});

static REMINDER_FILLERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:me|to|about|that)\b").unwrap());

static WEATHER_LOCATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:weather|temperature)\s+(?:in|at|for)\s+([a-zA-Z\s]+)").unwrap());

static PLAY_SONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)play\s+(.+?)(?:\s+by\s+(.+))?$").unwrap());

const HELP_RESPONSE: &str = "Here is what I can do:\n\
    Calls: \"call John\" or \"phone 9876543210\"\n\
    Messages: \"send message to mom saying I'm coming home\"\n\
    Apps: \"open camera\", \"launch whatsapp\"\n\
    Music: \"play music\", \"pause\", \"next song\", \"volume up\"\n\
    Reminders: \"remind me to call the doctor at 5 pm\"\n\
    Weather: \"what's the weather?\"";

/// Runs the slot extractor for the given intent over the normalised text.
///
/// Never fails: every branch terminates in a well-formed [`ActionResult`]
/// with a non-empty response. Missing required slots surface as `unknown`
/// with a corrective prompt.
#[must_use]
pub fn extract(intent: Intent, text: &str, apps: &AppLexicon) -> ActionResult {
    match intent {
        Intent::Help => ActionResult::new(Intent::Help, "help", HELP_RESPONSE),
        Intent::SetReminder => extract_reminder(text),
        Intent::OpenApp => extract_open_app(text, apps),
        Intent::MakeCall => extract_call(text),
        Intent::SendMessage => extract_message(text),
        Intent::ControlMusic => extract_music(text),
        Intent::ControlCamera => extract_camera(text),
        Intent::GetWeather => extract_weather(text),
        Intent::OpenGallery => {
            ActionResult::new(Intent::OpenGallery, "open_gallery", "Opening gallery")
        }
        Intent::OpenSettings => extract_settings(text),
        Intent::OpenCalculator => {
            ActionResult::new(Intent::OpenCalculator, "open_calculator", "Opening calculator")
        }
        Intent::Unknown => {
            ActionResult::unknown("I didn't catch that. Say \"help\" to see available commands.")
        }
    }
}

/// Strips launch filler words, leaving the candidate app name.
#[must_use]
pub fn extract_app_name(text: &str) -> String {
    let candidate = text
        .split_whitespace()
        .filter(|word| !APP_NAME_STOP_WORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ");
    if candidate.is_empty() {
        text.to_string()
    } else {
        candidate
    }
}

fn extract_open_app(text: &str, apps: &AppLexicon) -> ActionResult {
    let app_name = extract_app_name(text);

    if let Some(package) = apps.get(&app_name) {
        return launch_result(&app_name, package);
    }

    // Stop-word-stripped lookup missed; fall back to the similarity scorer
    // against every catalogue entry.
    if let Some(best) = find_best_app_match(&app_name, apps) {
        let package = apps.get(best).unwrap_or_default();
        return launch_result(best, package);
    }

    ActionResult::unknown(format!(
        "App '{}' not found. Available apps: {}",
        app_name,
        apps.sample(10).join(", ")
    ))
}

/// Best catalogue entry strictly above the open-app threshold (0.5).
///
/// The scan is stable: on a tie the first maximum seen wins.
#[must_use]
pub fn find_best_app_match<'a>(app_name: &str, apps: &'a AppLexicon) -> Option<&'a str> {
    let mut best_score = 0.0;
    let mut best_match = None;
    for candidate in apps.names() {
        let score = similarity(app_name, candidate);
        if score > best_score && score > 0.5 {
            best_score = score;
            best_match = Some(candidate);
        }
    }
    best_match
}

/// Fuzzy app resolution for utterances that matched no intent at all.
///
/// A catalogue key literally contained in the text wins immediately,
/// skipping the scorer. Otherwise the highest-scoring key strictly above
/// 0.6 is accepted; ties keep the first maximum.
#[must_use]
pub fn fuzzy_app_match(text: &str, apps: &AppLexicon) -> Option<ActionResult> {
    for candidate in apps.names() {
        if text.contains(candidate) {
            let package = apps.get(candidate).unwrap_or_default();
            return Some(launch_result(candidate, package));
        }
    }

    let mut best_score = 0.0;
    let mut best_match = None;
    for candidate in apps.names() {
        let score = similarity(text, candidate);
        if score > best_score && score > 0.6 {
            best_score = score;
            best_match = Some(candidate);
        }
    }
    best_match.map(|name| {
        let package = apps.get(name).unwrap_or_default();
        launch_result(name, package)
    })
}

fn launch_result(app_name: &str, package: &str) -> ActionResult {
    ActionResult::new(
        Intent::OpenApp,
        "open_app",
        format!("Opening {}", title_case(app_name)),
    )
    .with_slot("app_name", app_name)
    .with_slot("package", package)
}

fn extract_call(text: &str) -> ActionResult {
    if let Some(found) = PHONE_NUMBER.find(text) {
        let number = found.as_str();
        return ActionResult::new(Intent::MakeCall, "make_call", format!("Calling {number}"))
            .with_slot("phone_number", number);
    }

    // No digits; take everything after the first call trigger as the name.
    let words: Vec<&str> = text.split_whitespace().collect();
    for (i, word) in words.iter().enumerate() {
        if matches!(*word, "call" | "phone" | "dial") && i + 1 < words.len() {
            let contact = words[i + 1..].join(" ");
            return ActionResult::new(Intent::MakeCall, "make_call", format!("Calling {contact}"))
                .with_slot("contact_name", contact);
        }
    }

    ActionResult::unknown("Please specify a contact name or phone number to call")
}

fn extract_message(text: &str) -> ActionResult {
    if let Some(captures) = MESSAGE_FULL
        .iter()
        .find_map(|pattern| pattern.captures(text))
    {
        let contact = captures.get(1).map_or("", |m| m.as_str());
        let message = captures.get(2).map_or("", |m| m.as_str());
        return ActionResult::new(
            Intent::SendMessage,
            "send_sms",
            format!("Sending message to {contact}: {message}"),
        )
        .with_slot("contact", contact)
        .with_slot("message", message);
    }

    if let Some(captures) = MESSAGE_SIMPLE.captures(text) {
        let contact = captures.get(1).map_or("", |m| m.as_str());
        return ActionResult::new(
            Intent::SendMessage,
            "send_sms",
            format!("What message would you like to send to {contact}?"),
        )
        .with_slot("contact", contact)
        .with_slot("message", "")
        .needs_input();
    }

    ActionResult::unknown("Please specify contact and message. Say 'send message to John saying hello'")
}

fn extract_reminder(text: &str) -> ActionResult {
    let extracted_time = REMINDER_TIMES
        .iter()
        .find_map(|pattern| pattern.find(text))
        .map_or_else(|| "now".to_string(), |m| m.as_str().to_string());

    // Longest keyword first so "reminder" does not leave an "er" residue.
    let mut title = text.to_string();
    for keyword in ["reminder", "remind", "alert"] {
        title = title.replace(keyword, "");
    }
    if extracted_time != "now" {
        title = title.replace(&extracted_time, "");
    }
    title = REMINDER_FILLERS.replace_all(&title, "").to_string();
    let title = collapse_whitespace(&title);
    let title = if title.is_empty() {
        "Reminder".to_string()
    } else {
        title
    };

    ActionResult::new(
        Intent::SetReminder,
        "set_reminder",
        format!("Reminder set: {title} at {extracted_time}"),
    )
    .with_slot("title", title)
    .with_slot("time", extracted_time)
}

fn extract_weather(text: &str) -> ActionResult {
    let location = WEATHER_LOCATION
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map_or_else(
            || "current location".to_string(),
            |m| m.as_str().trim().to_string(),
        );

    // Stubbed payload; the live feed belongs to the wrapper layer.
    ActionResult::new(
        Intent::GetWeather,
        "get_weather",
        format!("Weather in {location}: 25°C, Sunny"),
    )
    .with_slot("location", location)
    .with_slot("temperature", "25°C")
    .with_slot("condition", "Sunny")
    .with_slot("humidity", "60%")
}

fn extract_music(text: &str) -> ActionResult {
    if text.contains("play") {
        if let Some(captures) = PLAY_SONG.captures(text) {
            let song = captures.get(1).map_or("", |m| m.as_str()).trim();
            let artist = captures.get(2).map(|m| m.as_str().trim().to_string());
            let mut response = format!("Playing {song}");
            if let Some(artist) = &artist {
                response.push_str(&format!(" by {artist}"));
            }
            let mut result = ActionResult::new(Intent::ControlMusic, "play_music", response)
                .with_slot("song", song);
            if let Some(artist) = artist {
                result = result.with_slot("artist", artist);
            }
            return result;
        }
        return ActionResult::new(Intent::ControlMusic, "play_music", "Playing music");
    }

    if text.contains("pause") || text.contains("stop") {
        return ActionResult::new(Intent::ControlMusic, "pause_music", "Pausing music");
    }
    if text.contains("next") || text.contains("skip") {
        return ActionResult::new(Intent::ControlMusic, "next_track", "Playing next track");
    }
    if text.contains("previous") || text.contains("back") {
        return ActionResult::new(
            Intent::ControlMusic,
            "previous_track",
            "Playing previous track",
        );
    }
    if text.contains("volume") || text.contains("loud") || text.contains("quiet") {
        if text.contains("up") || text.contains("increase") || text.contains("loud") {
            return ActionResult::new(Intent::ControlMusic, "volume_up", "Increasing volume");
        }
        if text.contains("down") || text.contains("decrease") || text.contains("quiet") {
            return ActionResult::new(Intent::ControlMusic, "volume_down", "Decreasing volume");
        }
    }

    ActionResult::unknown("Music command not recognized")
}

fn extract_camera(text: &str) -> ActionResult {
    if text.contains("selfie") || text.contains("front") {
        return ActionResult::new(
            Intent::ControlCamera,
            "open_camera",
            "Opening front camera for selfie",
        )
        .with_slot("mode", "front");
    }
    if text.contains("photo") || text.contains("picture") {
        return ActionResult::new(
            Intent::ControlCamera,
            "open_camera",
            "Opening camera to take photo",
        )
        .with_slot("mode", "back");
    }
    ActionResult::new(Intent::ControlCamera, "open_camera", "Opening camera")
        .with_slot("mode", "default")
}

fn extract_settings(text: &str) -> ActionResult {
    let section = if text.contains("wifi") {
        "wifi"
    } else if text.contains("bluetooth") {
        "bluetooth"
    } else {
        "main"
    };
    let response = match section {
        "wifi" => "Opening WiFi settings",
        "bluetooth" => "Opening Bluetooth settings",
        _ => "Opening settings",
    };
    ActionResult::new(Intent::OpenSettings, "open_settings", response).with_slot("section", section)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apps() -> AppLexicon {
        AppLexicon::production_default()
    }

    #[test]
    fn call_extracts_ten_digit_number() {
        let result = extract(Intent::MakeCall, "call 9876543210", &apps());
        assert_eq!(result.action, "make_call");
        assert_eq!(result.slot("phone_number"), Some("9876543210"));
    }

    #[test]
    fn call_extracts_separated_number() {
        let result = extract(Intent::MakeCall, "dial 987-654-3210", &apps());
        assert_eq!(result.slot("phone_number"), Some("987-654-3210"));
    }

    #[test]
    fn call_number_wins_over_contact() {
        let result = extract(Intent::MakeCall, "call mom at 9876543210", &apps());
        assert_eq!(result.slot("phone_number"), Some("9876543210"));
        assert_eq!(result.slot("contact_name"), None);
    }

    #[test]
    fn call_falls_back_to_contact_name() {
        let result = extract(Intent::MakeCall, "call john smith", &apps());
        assert_eq!(result.slot("contact_name"), Some("john smith"));
        assert_eq!(result.response, "Calling john smith");
    }

    #[test]
    fn call_without_target_prompts() {
        let result = extract(Intent::MakeCall, "call", &apps());
        assert_eq!(result.action, "unknown");
        assert!(!result.success);
    }

    #[test]
    fn message_full_pattern() {
        let result = extract(
            Intent::SendMessage,
            "send message to john saying hello there",
            &apps(),
        );
        assert_eq!(result.action, "send_sms");
        assert_eq!(result.slot("contact"), Some("john"));
        assert_eq!(result.slot("message"), Some("hello there"));
        assert!(!result.requires_input);
    }

    #[test]
    fn message_simple_pattern_requests_body() {
        let result = extract(Intent::SendMessage, "message john", &apps());
        assert_eq!(result.slot("contact"), Some("john"));
        assert_eq!(result.slot("message"), Some(""));
        assert!(result.requires_input);
    }

    #[test]
    fn message_without_contact_is_unknown() {
        let result = extract(Intent::SendMessage, "send", &apps());
        assert_eq!(result.action, "unknown");
    }

    #[test]
    fn reminder_extracts_time_and_title() {
        let result = extract(Intent::SetReminder, "remind me to call mom at 5 pm", &apps());
        assert_eq!(result.action, "set_reminder");
        assert_eq!(result.slot("time"), Some("at 5 pm"));
        assert_eq!(result.slot("title"), Some("call mom"));
    }

    #[test]
    fn reminder_relative_minutes() {
        let result = extract(Intent::SetReminder, "remind me in 20 minutes", &apps());
        assert_eq!(result.slot("time"), Some("in 20 minutes"));
    }

    #[test]
    fn reminder_day_words() {
        let result = extract(Intent::SetReminder, "remind me tomorrow about the rent", &apps());
        assert_eq!(result.slot("time"), Some("tomorrow"));
        assert_eq!(result.slot("title"), Some("the rent"));
    }

    #[test]
    fn reminder_defaults_to_now_and_generic_title() {
        let result = extract(Intent::SetReminder, "reminder", &apps());
        assert_eq!(result.slot("time"), Some("now"));
        assert_eq!(result.slot("title"), Some("Reminder"));
    }

    #[test]
    fn weather_extracts_location() {
        let result = extract(Intent::GetWeather, "weather in new york", &apps());
        assert_eq!(result.slot("location"), Some("new york"));
    }

    #[test]
    fn weather_defaults_location() {
        let result = extract(Intent::GetWeather, "what's the weather", &apps());
        assert_eq!(result.slot("location"), Some("current location"));
    }

    #[test]
    fn music_play_with_artist() {
        let result = extract(Intent::ControlMusic, "play bohemian rhapsody by queen", &apps());
        assert_eq!(result.action, "play_music");
        assert_eq!(result.slot("song"), Some("bohemian rhapsody"));
        assert_eq!(result.slot("artist"), Some("queen"));
    }

    #[test]
    fn music_transport_controls() {
        assert_eq!(
            extract(Intent::ControlMusic, "pause the song", &apps()).action,
            "pause_music"
        );
        assert_eq!(
            extract(Intent::ControlMusic, "next song", &apps()).action,
            "next_track"
        );
        assert_eq!(
            extract(Intent::ControlMusic, "previous song", &apps()).action,
            "previous_track"
        );
    }

    #[test]
    fn music_volume_directions() {
        assert_eq!(
            extract(Intent::ControlMusic, "volume up", &apps()).action,
            "volume_up"
        );
        assert_eq!(
            extract(Intent::ControlMusic, "turn the volume down", &apps()).action,
            "volume_down"
        );
    }

    #[test]
    fn music_unrecognised_is_unknown() {
        let result = extract(Intent::ControlMusic, "music", &apps());
        assert_eq!(result.action, "unknown");
    }

    #[test]
    fn open_app_exact_lookup() {
        let result = extract(Intent::OpenApp, "open whatsapp", &apps());
        assert_eq!(result.action, "open_app");
        assert_eq!(result.slot("package"), Some("com.whatsapp"));
        assert_eq!(result.response, "Opening Whatsapp");
    }

    #[test]
    fn open_app_strips_filler_words() {
        let result = extract(Intent::OpenApp, "launch the whatsapp app", &apps());
        assert_eq!(result.slot("package"), Some("com.whatsapp"));
    }

    #[test]
    fn open_app_miss_lists_samples() {
        let result = extract(Intent::OpenApp, "open frobnicator", &apps());
        assert_eq!(result.action, "unknown");
        assert!(result.response.contains("whatsapp"));
    }

    #[test]
    fn fuzzy_match_short_circuits_on_substring() {
        let result = fuzzy_app_match("whatsapp please", &apps()).unwrap();
        assert_eq!(result.slot("package"), Some("com.whatsapp"));
    }

    #[test]
    fn fuzzy_match_rejects_unrelated_text() {
        assert!(fuzzy_app_match("asdkjashd", &apps()).is_none());
    }

    #[test]
    fn camera_modes() {
        assert_eq!(
            extract(Intent::ControlCamera, "take a selfie", &apps()).slot("mode"),
            Some("front")
        );
        assert_eq!(
            extract(Intent::ControlCamera, "take a photo", &apps()).slot("mode"),
            Some("back")
        );
        assert_eq!(
            extract(Intent::ControlCamera, "camera", &apps()).slot("mode"),
            Some("default")
        );
    }

    #[test]
    fn settings_sections() {
        assert_eq!(
            extract(Intent::OpenSettings, "open wifi settings", &apps()).slot("section"),
            Some("wifi")
        );
        assert_eq!(
            extract(Intent::OpenSettings, "bluetooth settings", &apps()).slot("section"),
            Some("bluetooth")
        );
        assert_eq!(
            extract(Intent::OpenSettings, "settings", &apps()).slot("section"),
            Some("main")
        );
    }

    #[test]
    fn extractors_never_fail_on_noise() {
        for intent in [
            Intent::Help,
            Intent::SetReminder,
            Intent::OpenApp,
            Intent::MakeCall,
            Intent::SendMessage,
            Intent::ControlMusic,
            Intent::ControlCamera,
            Intent::GetWeather,
            Intent::OpenGallery,
            Intent::OpenSettings,
            Intent::OpenCalculator,
            Intent::Unknown,
        ] {
            let result = extract(intent, "", &apps());
            assert!(!result.response.is_empty());
        }
    }
}
