// src/services/profile_namer.rs
//! Derives a short human-readable label for a style profile from the
//! keywords its structured prompts have in common.

use crate::models::{StructuredPrompt, StyleAttributes};
use crate::services::style_extractor::extract_style_attributes;

pub const DEFAULT_MAX_NAME_LEN: usize = 40;

/// Deterministic, pure function of its input: same prompts, same name.
///
/// Fallback tiers: empty input yields `"Untitled Style"`, no extracted
/// keywords yields `"Custom Style Profile"`, and a panic anywhere in the
/// aggregation degrades to `"Style Profile"` instead of failing the request.
pub fn generate_profile_name(prompts: &[StructuredPrompt]) -> String {
    generate_profile_name_with_max(prompts, DEFAULT_MAX_NAME_LEN)
}

pub fn generate_profile_name_with_max(prompts: &[StructuredPrompt], max_len: usize) -> String {
    if prompts.is_empty() {
        return "Untitled Style".to_string();
    }

    std::panic::catch_unwind(|| name_from_prompts(prompts, max_len))
        .unwrap_or_else(|_| "Style Profile".to_string())
}

fn name_from_prompts(prompts: &[StructuredPrompt], max_len: usize) -> String {
    let union = union_attributes(prompts);

    // Priority order decides both flattening and tie-breaks: an earlier
    // category's keyword wins over a later one at equal frequency.
    let flattened: Vec<&String> = [
        &union.time,
        &union.weather,
        &union.location,
        &union.lighting,
        &union.mood,
        &union.colors,
        &union.atmosphere,
        &union.technical,
    ]
    .into_iter()
    .flatten()
    .collect();

    if flattened.is_empty() {
        return "Custom Style Profile".to_string();
    }

    // Frequency count in first-encountered order; the stable sort keeps that
    // order among equal counts.
    let mut counts: Vec<(&String, usize)> = Vec::new();
    for keyword in flattened.iter().copied() {
        match counts.iter_mut().find(|(k, _)| *k == keyword) {
            Some(entry) => entry.1 += 1,
            None => counts.push((keyword, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let words: Vec<String> = counts
        .iter()
        .take(4)
        .flat_map(|(keyword, _)| keyword.split_whitespace())
        .map(title_case)
        .collect();

    fit_to_length(words, max_len)
}

/// Per-category union across all records, duplicates removed. Order within a
/// category follows first encounter.
fn union_attributes(prompts: &[StructuredPrompt]) -> StyleAttributes {
    let mut union = StyleAttributes::default();
    for prompt in prompts {
        let attrs = extract_style_attributes(&prompt.structured_prompt);
        merge_unique(&mut union.lighting, attrs.lighting);
        merge_unique(&mut union.colors, attrs.colors);
        merge_unique(&mut union.mood, attrs.mood);
        merge_unique(&mut union.atmosphere, attrs.atmosphere);
        merge_unique(&mut union.time, attrs.time);
        merge_unique(&mut union.weather, attrs.weather);
        merge_unique(&mut union.location, attrs.location);
        merge_unique(&mut union.technical, attrs.technical);
    }
    union
}

fn merge_unique(into: &mut Vec<String>, from: Vec<String>) {
    for keyword in from {
        if !into.contains(&keyword) {
            into.push(keyword);
        }
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Drops trailing words until the name fits, but never below two words.
fn fit_to_length(mut words: Vec<String>, max_len: usize) -> String {
    let mut name = words.join(" ");
    while name.len() > max_len && words.len() > 2 {
        words.pop();
        name = words.join(" ");
    }
    name
}
