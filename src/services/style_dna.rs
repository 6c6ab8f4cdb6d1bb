// src/services/style_dna.rs
//! Separates the stylistic attributes of a structured prompt from its scene
//! content, so a style can be re-applied to a new subject without also
//! recreating the original scene.

use serde_json::{Map, Value};

use crate::models::StyleDna;

const LIGHTING_KEYS: &[&str] = &["lighting", "light", "illumination"];
const COLOR_PALETTE_KEYS: &[&str] = &["color_palette", "palette"];
const COLORS_KEYS: &[&str] = &["colors", "color"];
const MOOD_KEYS: &[&str] = &["mood", "vibe", "emotion"];
const ATMOSPHERE_KEYS: &[&str] = &["atmosphere", "ambiance", "ambience"];
const TONE_KEYS: &[&str] = &["tone", "tonality"];
const CAMERA_KEYS: &[&str] = &["camera", "camera_settings", "technical"];
const ARTISTIC_STYLE_KEYS: &[&str] = &["artistic_style", "art_style"];
const PHOTOGRAPHIC_STYLE_KEYS: &[&str] = &["photographic_style", "photography_style"];
const RENDERING_STYLE_KEYS: &[&str] = &["rendering_style", "render_style"];
const TIME_KEYS: &[&str] = &["time_of_day", "time"];
const SEASON_KEYS: &[&str] = &["season"];
const WEATHER_KEYS: &[&str] = &["weather"];

/// Top-level keys of a structured prompt considered stylistic. Matched
/// case-insensitively, exact or substring, so `color_palette` lands via
/// `color` and `lighting_setup` via `lighting`.
const STYLE_KEY_WHITELIST: &[&str] = &[
    "lighting",
    "light",
    "illumination",
    "color",
    "palette",
    "mood",
    "vibe",
    "atmosphere",
    "ambiance",
    "ambience",
    "tone",
    "technical",
    "camera",
    "style",
    "aesthetic",
    "render",
    "time",
    "season",
    "weather",
];

/// Decodes a structured prompt into its style-only view.
///
/// Decode failures degrade: the raw text is kept under `original` and every
/// style field stays empty. Never returns an error.
pub fn parse(structured_prompt: &str) -> StyleDna {
    let decoded: Value = match serde_json::from_str(structured_prompt) {
        Ok(value) => value,
        Err(_) => {
            return StyleDna {
                original: Some(Value::String(structured_prompt.to_string())),
                ..Default::default()
            };
        }
    };

    let Some(root) = decoded.as_object() else {
        return StyleDna {
            original: Some(decoded),
            ..Default::default()
        };
    };

    StyleDna {
        lighting: pick(root, LIGHTING_KEYS),
        color_palette: pick(root, COLOR_PALETTE_KEYS),
        colors: pick(root, COLORS_KEYS),
        mood: pick(root, MOOD_KEYS),
        atmosphere: pick(root, ATMOSPHERE_KEYS),
        tone: pick(root, TONE_KEYS),
        camera: pick(root, CAMERA_KEYS),
        artistic_style: pick(root, ARTISTIC_STYLE_KEYS),
        photographic_style: pick(root, PHOTOGRAPHIC_STYLE_KEYS),
        rendering_style: pick(root, RENDERING_STYLE_KEYS),
        time_of_day: pick(root, TIME_KEYS),
        season: pick(root, SEASON_KEYS),
        weather: pick(root, WEATHER_KEYS),
        original: Some(decoded.clone()),
    }
}

fn pick(root: &Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter().find_map(|key| root.get(*key)).cloned()
}

/// Renders populated fields as `"key: value"` clauses joined by commas, in a
/// fixed order. Empty DNA yields an empty string.
pub fn to_prompt_fragment(dna: &StyleDna) -> String {
    let mut clauses: Vec<String> = Vec::new();

    push_clause(&mut clauses, "lighting", &dna.lighting);
    push_clause(&mut clauses, "color palette", &dna.color_palette);
    push_clause(&mut clauses, "colors", &dna.colors);
    push_clause(&mut clauses, "mood", &dna.mood);
    push_clause(&mut clauses, "atmosphere", &dna.atmosphere);
    push_clause(&mut clauses, "tone", &dna.tone);
    push_camera_clauses(&mut clauses, &dna.camera);
    push_clause(&mut clauses, "artistic style", &dna.artistic_style);
    push_clause(&mut clauses, "photographic style", &dna.photographic_style);
    push_clause(&mut clauses, "rendering style", &dna.rendering_style);
    push_clause(&mut clauses, "time of day", &dna.time_of_day);
    push_clause(&mut clauses, "season", &dna.season);
    push_clause(&mut clauses, "weather", &dna.weather);

    clauses.join(", ")
}

fn push_clause(clauses: &mut Vec<String>, label: &str, value: &Option<Value>) {
    let Some(value) = value else { return };
    match value {
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() {
                clauses.push(format!("{}: {}", label, s));
            }
        }
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(scalar_text)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            if !joined.is_empty() {
                clauses.push(format!("{}: {}", label, joined));
            }
        }
        // Structured values keep only conditions/quality/type; a `direction`
        // sub-key encodes scene geometry, not style, and is dropped.
        Value::Object(map) => {
            let parts = ["conditions", "quality", "type"]
                .iter()
                .filter_map(|key| map.get(*key))
                .map(scalar_text)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>();
            if !parts.is_empty() {
                clauses.push(format!("{}: {}", label, parts.join(", ")));
            }
        }
        Value::Null => {}
        other => clauses.push(format!("{}: {}", label, other)),
    }
}

/// Camera settings render one clause per parameter (`lens: 85mm`), again
/// minus any `direction` sub-key.
fn push_camera_clauses(clauses: &mut Vec<String>, camera: &Option<Value>) {
    let Some(value) = camera else { return };
    match value {
        Value::Object(map) => {
            for (key, sub) in map {
                if key.to_lowercase().contains("direction") {
                    continue;
                }
                let text = scalar_text(sub);
                if !text.is_empty() {
                    clauses.push(format!("{}: {}", key.replace('_', " "), text));
                }
            }
        }
        other => push_clause(clauses, "camera", &Some(other.clone())),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Builds the generation prompt for a new subject in this style.
pub fn compose_prompt(subject: &str, dna: &StyleDna) -> String {
    let fragment = to_prompt_fragment(dna);
    if fragment.is_empty() {
        format!(
            "{}, maintaining the same visual style, lighting, and atmosphere",
            subject
        )
    } else {
        format!("{}, rendered with: {}", subject, fragment)
    }
}

/// Re-serializes only the whitelisted style keys of the original structured
/// prompt as JSON text.
///
/// An `aesthetics` object is copied with any `*composition*` sub-keys
/// stripped, since composition describes spatial layout. When nothing in the
/// original matches the whitelist, falls back to the handful of fields
/// already present on the DNA itself (possibly an empty object).
pub fn filter_to_style_only(dna: &StyleDna) -> String {
    let mut filtered = Map::new();

    if let Some(Value::Object(original)) = &dna.original {
        for (key, value) in original {
            let lower = key.to_lowercase();
            if !STYLE_KEY_WHITELIST.iter().any(|term| lower.contains(term)) {
                continue;
            }
            if lower.contains("aesthetic") {
                if let Value::Object(sub) = value {
                    let cleaned: Map<String, Value> = sub
                        .iter()
                        .filter(|(k, _)| !k.to_lowercase().contains("composition"))
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    filtered.insert(key.clone(), Value::Object(cleaned));
                    continue;
                }
            }
            filtered.insert(key.clone(), value.clone());
        }
    }

    if filtered.is_empty() {
        let fallback = [
            ("lighting", &dna.lighting),
            ("color_palette", &dna.color_palette),
            ("colors", &dna.colors),
            ("mood", &dna.mood),
            ("atmosphere", &dna.atmosphere),
        ];
        for (key, value) in fallback {
            if let Some(value) = value {
                filtered.insert(key.to_string(), value.clone());
            }
        }
    }

    serde_json::to_string(&Value::Object(filtered)).unwrap_or_else(|_| "{}".to_string())
}

/// Placeholder aggregation policy: with more than one DNA, the first is
/// returned unchanged. A real merge is an open product question; callers
/// must not rely on this combining anything.
pub fn aggregate(dnas: &[StyleDna]) -> StyleDna {
    dnas.first().cloned().unwrap_or_default()
}
