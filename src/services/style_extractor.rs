// src/services/style_extractor.rs
//! Keyword extraction over Bria structured prompts.
//!
//! The vocabulary below is the whole lexicon; matching is case-insensitive
//! substring search against the text of whichever alternate key is present.
//! Structured prompts are free-form JSON from the remote service, so decode
//! failures degrade to an empty result rather than an error.

use serde_json::{Map, Value};

use crate::models::StyleAttributes;

const LIGHTING_KEYS: &[&str] = &["lighting", "light", "illumination"];
const COLOR_KEYS: &[&str] = &["color_palette", "colors", "palette", "color"];
const MOOD_KEYS: &[&str] = &["mood", "vibe"];
const ATMOSPHERE_KEYS: &[&str] = &["atmosphere", "ambiance", "ambience"];
const TIME_KEYS: &[&str] = &["time_of_day", "time", "hour"];
const WEATHER_KEYS: &[&str] = &["weather", "conditions", "climate"];
const LOCATION_KEYS: &[&str] = &["location", "setting", "place", "environment"];
const TECHNICAL_KEYS: &[&str] = &["camera", "technical", "photography", "shot"];

const LIGHTING_KEYWORDS: &[&str] = &[
    "golden", "soft", "dramatic", "natural", "warm", "cool", "neon", "moody", "dim", "harsh",
    "diffused", "backlit", "studio", "ambient", "candlelit",
];
const MOOD_KEYWORDS: &[&str] = &[
    "serene", "dramatic", "melancholic", "joyful", "mysterious", "peaceful", "energetic", "calm",
    "dreamy", "nostalgic", "romantic", "ethereal", "playful", "somber",
];
const ATMOSPHERE_KEYWORDS: &[&str] = &[
    "misty", "foggy", "hazy", "smoky", "dusty", "ethereal", "airy", "dense", "crisp", "humid",
];
const TIME_KEYWORDS: &[&str] = &[
    "dawn", "sunrise", "morning", "noon", "midday", "afternoon", "sunset", "dusk", "twilight",
    "evening", "night", "midnight",
];
const WEATHER_KEYWORDS: &[&str] = &[
    "sunny", "rainy", "snowy", "stormy", "cloudy", "overcast", "windy", "foggy", "clear",
];
const LOCATION_KEYWORDS: &[&str] = &[
    "urban", "city", "street", "rural", "coastal", "beach", "mountain", "forest", "desert",
    "indoor", "outdoor", "studio", "garden", "lake", "ocean",
];
const TECHNICAL_KEYWORDS: &[&str] = &[
    "macro", "bokeh", "wide-angle", "telephoto", "closeup", "aerial", "panoramic", "portrait",
    "cinematic", "long exposure", "shallow depth", "tilt-shift",
];

// Color lists match both names and common hex prefixes, since palettes come
// back either way from the remote service.
const COOL_COLOR_MARKERS: &[&str] = &[
    "blue", "cyan", "teal", "turquoise", "navy", "indigo", "violet", "purple", "green", "mint",
    "#00", "#0a", "#1e", "#2e", "#4b", "#5d",
];
const WARM_COLOR_MARKERS: &[&str] = &[
    "red", "orange", "yellow", "gold", "amber", "brown", "beige", "cream", "peach", "coral",
    "pink", "magenta", "crimson", "#f", "#e", "#d",
];
const NEUTRAL_COLOR_MARKERS: &[&str] = &[
    "gray", "grey", "beige", "white", "black", "neutral", "taupe", "ivory",
];
const COLOR_DESCRIPTORS: &[&str] = &[
    "vibrant", "muted", "pastel", "monochrome", "warm", "cool", "earthy", "saturated",
    "desaturated", "vivid", "neutral",
];

/// Pulls per-category keyword matches out of one structured-prompt text.
/// Undecodable input yields an empty `StyleAttributes`.
pub fn extract_style_attributes(structured_prompt: &str) -> StyleAttributes {
    let root = match serde_json::from_str::<Value>(structured_prompt) {
        Ok(Value::Object(map)) => map,
        _ => return StyleAttributes::default(),
    };

    StyleAttributes {
        lighting: match_keywords(&root, LIGHTING_KEYS, LIGHTING_KEYWORDS),
        colors: extract_colors(&root),
        mood: match_keywords(&root, MOOD_KEYS, MOOD_KEYWORDS),
        atmosphere: match_keywords(&root, ATMOSPHERE_KEYS, ATMOSPHERE_KEYWORDS),
        time: match_keywords(&root, TIME_KEYS, TIME_KEYWORDS),
        weather: match_keywords(&root, WEATHER_KEYS, WEATHER_KEYWORDS),
        location: match_keywords(&root, LOCATION_KEYS, LOCATION_KEYWORDS),
        technical: match_keywords(&root, TECHNICAL_KEYS, TECHNICAL_KEYWORDS),
    }
}

fn find_value<'a>(root: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| root.get(*key))
}

/// Non-string values (nested objects, arrays) are matched against their
/// compact JSON text.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn match_keywords(root: &Map<String, Value>, keys: &[&str], vocab: &[&str]) -> Vec<String> {
    let Some(value) = find_value(root, keys) else {
        return Vec::new();
    };
    let text = value_to_text(value).to_lowercase();
    vocab
        .iter()
        .filter(|keyword| text.contains(*keyword))
        .map(|keyword| (*keyword).to_string())
        .collect()
}

/// Colors get their own path: palette lists are classified by temperature,
/// palette strings by descriptor vocabulary.
fn extract_colors(root: &Map<String, Value>) -> Vec<String> {
    let Some(value) = find_value(root, COLOR_KEYS) else {
        return Vec::new();
    };

    match value {
        Value::Array(entries) => classify_palette(entries),
        other => {
            let text = value_to_text(other).to_lowercase();
            COLOR_DESCRIPTORS
                .iter()
                .filter(|descriptor| text.contains(*descriptor))
                .map(|descriptor| (*descriptor).to_string())
                .collect()
        }
    }
}

fn classify_palette(entries: &[Value]) -> Vec<String> {
    let mut cool = 0usize;
    let mut warm = 0usize;
    let mut has_blue = false;
    let mut has_golden = false;
    let mut has_neutral = false;

    for entry in entries {
        let text = value_to_text(entry).to_lowercase();
        if COOL_COLOR_MARKERS.iter().any(|m| text.contains(m)) {
            cool += 1;
        }
        if WARM_COLOR_MARKERS.iter().any(|m| text.contains(m)) {
            warm += 1;
        }
        has_blue |= text.contains("blue");
        has_golden |= text.contains("gold");
        has_neutral |= NEUTRAL_COLOR_MARKERS.iter().any(|m| text.contains(m));
    }

    let mut matched = Vec::new();
    if cool > 0 && warm > 0 {
        matched.push("balanced".to_string());
    } else if cool > 0 {
        matched.push("cool".to_string());
    } else if warm > 0 {
        matched.push("warm".to_string());
    }
    if has_blue {
        matched.push("blue".to_string());
    }
    if has_golden {
        matched.push("golden".to_string());
    }
    if has_neutral {
        matched.push("neutral".to_string());
    }
    matched
}
