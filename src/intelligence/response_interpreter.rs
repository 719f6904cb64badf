// ABOUTME: Interprets raw model replies into structured nutrition estimates
// ABOUTME: Strict JSON decoding first, then ordered regex ladders over free-form prose
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Response Interpreter
//!
//! The same upstream call sometimes answers with the requested JSON object and
//! sometimes with Markdown prose. Two strategies are tried in order:
//!
//! 1. **Structured**: the trimmed reply (optionally inside a code fence) is a
//!    single JSON object; it is validated against [`StructuredReply`] before
//!    use and any mismatch falls through.
//! 2. **Heuristic**: decimal commas and non-breaking spaces are normalized,
//!    then each nutrition field is searched with its own ordered pattern
//!    ladder, most specific pattern first.
//!
//! Interpretation never fails loudly: a field that cannot be read stays
//! `None`, and a reply with no nutrition figure at all yields `None`.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::constants::DEFAULT_PORTION_SIZE;
use crate::models::{NutritionEstimate, PortionUnit};

/// Strategy that produced an estimate, for observability only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    /// Decoded from a strict JSON reply
    Structured,
    /// Extracted from free-form prose
    Heuristic,
}

/// Successful interpretation of one model reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    /// Canonical nutrition record
    pub estimate: NutritionEstimate,
    /// Strategy that succeeded
    pub strategy: ParseStrategy,
}

/// Nutrition field searched by the heuristic strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientField {
    /// Energy (kcal)
    Calories,
    /// Protein (g)
    Protein,
    /// Fat (g)
    Fat,
    /// Carbohydrates (g)
    Carbs,
}

impl NutrientField {
    /// All fields in extraction order
    pub const ALL: [Self; 4] = [Self::Calories, Self::Protein, Self::Fat, Self::Carbs];

    const fn label_pattern(self) -> &'static str {
        match self {
            Self::Calories => r"калори\w*|энергетическая\s+ценность|calories|energy",
            Self::Protein => r"белк\w*|белок|протеин\w*|proteins?",
            Self::Fat => r"жир\w*|fats?",
            Self::Carbs => r"углевод\w*|carb\w*",
        }
    }

    const fn unit_pattern(self) -> &'static str {
        match self {
            Self::Calories => r"ккал|kcal|кал|cal",
            Self::Protein | Self::Fat | Self::Carbs => r"грамм\w*|гр|г|g",
        }
    }
}

const NUMBER: &str = r"(?P<value>\d+(?:\.\d+)?)";
const EMPHASIS: &str = r"(?:\*\*|__)";

/// Pattern variants shared by every field, most specific first
///
/// `{E}` is an emphasis marker, `{L}` the field's label alternation anchored at
/// a word start, `{U}` its unit alternation and `{N}` the captured number. Replies disagree on whether
/// the label, the colon, or both sit inside the emphasis, so each placement
/// gets its own rung.
const FIELD_PATTERN_TEMPLATES: &[(&str, &str)] = &[
    (
        "emphasized_label_colon_unit",
        r"{E}\s*(?:{L})\s*:\s*{E}\s*~?\s*{N}\s*(?:{U})\b",
    ),
    (
        "emphasized_label_then_colon_unit",
        r"{E}\s*(?:{L})\s*{E}\s*:\s*~?\s*{N}\s*(?:{U})\b",
    ),
    (
        "emphasized_label_number",
        r"{E}\s*(?:{L})\s*:?\s*{E}\s*:?\s*~?\s*{N}",
    ),
    ("label_colon_unit", r"(?:{L})\s*:\s*~?\s*{N}\s*(?:{U})\b"),
    ("label_colon_number", r"(?:{L})\s*[:\-–—]\s*~?\s*{N}"),
    ("number_unit_label", r"{N}[^\S\n]*(?:{U})\.?[^\S\n]*(?:{L})"),
    ("label_near_number", r"(?:{L})[^\d\n]{0,24}?{N}"),
];

/// Calorie-only rung: an energy unit identifies the figure without a label
const CALORIE_UNIT_TEMPLATE: (&str, &str) = ("number_energy_unit", r"{N}\s*(?:ккал|kcal)\b");

/// One rung of a field's pattern ladder
#[derive(Debug)]
pub struct FieldPattern {
    /// Stable rung name, logged when the rung matches
    pub name: &'static str,
    regex: Regex,
}

impl FieldPattern {
    fn extract(&self, text: &str) -> Option<f64> {
        self.regex
            .captures(text)
            .and_then(|caps| parse_capture(&caps))
    }
}

fn parse_capture(caps: &Captures<'_>) -> Option<f64> {
    caps.name("value")
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn build_ladder(field: NutrientField) -> Vec<FieldPattern> {
    let mut templates: Vec<(&'static str, &'static str)> = FIELD_PATTERN_TEMPLATES.to_vec();
    if field == NutrientField::Calories {
        // Before the loose proximity rung, which could grab a portion figure
        templates.insert(templates.len() - 1, CALORIE_UNIT_TEMPLATE);
    }

    templates
        .into_iter()
        .filter_map(|(name, template)| {
            let pattern = format!(
                "(?i){}",
                template
                    .replace("{E}", EMPHASIS)
                    .replace("{L}", &format!(r"\b(?:{})", field.label_pattern()))
                    .replace("{U}", field.unit_pattern())
                    .replace("{N}", NUMBER)
            );
            Regex::new(&pattern)
                .ok()
                .map(|regex| FieldPattern { name, regex })
        })
        .collect()
}

static CALORIE_LADDER: LazyLock<Vec<FieldPattern>> =
    LazyLock::new(|| build_ladder(NutrientField::Calories));
static PROTEIN_LADDER: LazyLock<Vec<FieldPattern>> =
    LazyLock::new(|| build_ladder(NutrientField::Protein));
static FAT_LADDER: LazyLock<Vec<FieldPattern>> = LazyLock::new(|| build_ladder(NutrientField::Fat));
static CARBS_LADDER: LazyLock<Vec<FieldPattern>> =
    LazyLock::new(|| build_ladder(NutrientField::Carbs));

/// Ordered pattern ladder for a field
#[must_use]
pub fn field_ladder(field: NutrientField) -> &'static [FieldPattern] {
    match field {
        NutrientField::Calories => &CALORIE_LADDER,
        NutrientField::Protein => &PROTEIN_LADDER,
        NutrientField::Fat => &FAT_LADDER,
        NutrientField::Carbs => &CARBS_LADDER,
    }
}

/// Search `text` with the field's ladder; the first matching rung wins
///
/// `text` should already be normalized with [`normalize_text`].
#[must_use]
pub fn extract_field(text: &str, field: NutrientField) -> Option<f64> {
    field_ladder(field).iter().find_map(|pattern| {
        let value = pattern.extract(text)?;
        debug!(field = ?field, pattern = pattern.name, value, "Nutrient pattern matched");
        Some(value)
    })
}

static DECIMAL_COMMA_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d),(\d)").ok());

static EMPHASIZED_TEXT_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*|__([^_\n]+?)__|\*([^*\n]+?)\*").ok());

static PORTION_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    // Matches: "Размер порции: 250 г", "**Порция:** ~200 мл", "Portion size: 2 pcs"
    Regex::new(
        r"(?i)\b(?:размер\s+порции|порци[яи]|вес(?:\s+порции)?|portion(?:\s+size)?|serving(?:\s+size)?)[\s*_]*[:：]?[\s*_]*~?\s*(?P<value>\d+(?:\.\d+)?)\s*(?:(?P<unit>граммов|грамма|грамм|гр|г|миллилитров|мл|штук[иа]?|шт|ml|g|pcs|pieces|piece)\b)?",
    )
    .ok()
});

/// Replace decimal commas and non-breaking spaces before numeric matching
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    let spaced: String = raw
        .chars()
        .map(|c| match c {
            '\u{00A0}' | '\u{202F}' | '\u{2007}' | '\u{2009}' => ' ',
            other => other,
        })
        .collect();

    match DECIMAL_COMMA_PATTERN.as_ref() {
        Some(pattern) => pattern.replace_all(&spaced, "$1.$2").into_owned(),
        None => spaced,
    }
}

/// Interpret one raw model reply
///
/// Returns `None` when no calorie or macro figure can be located anywhere in
/// the reply. A JSON reply in the expected shape is never re-read as prose, so
/// one without figures also yields `None`.
#[must_use]
pub fn interpret(raw: &str) -> Option<Interpretation> {
    let candidate = strip_code_fence(raw.trim());
    if looks_structured(candidate) {
        match decode_structured(candidate) {
            StructuredDecode::Estimate(estimate) => {
                debug!(food = %estimate.food_name, "Interpreted reply as structured JSON");
                return Some(Interpretation {
                    estimate,
                    strategy: ParseStrategy::Structured,
                });
            }
            StructuredDecode::Unusable => {
                debug!("Structured reply carries no usable nutrition figures");
                return None;
            }
            StructuredDecode::SchemaMismatch => {
                debug!("Structured decode rejected, falling back to heuristic extraction");
            }
        }
    }

    let estimate = extract_heuristic(raw)?;
    debug!(food = %estimate.food_name, "Interpreted reply with heuristic extraction");
    Some(Interpretation {
        estimate,
        strategy: ParseStrategy::Heuristic,
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn looks_structured(text: &str) -> bool {
    text.starts_with('{') && text.ends_with('}')
}

/// Schema of the JSON object the model is asked to return
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuredReply {
    #[serde(alias = "food_name", alias = "name")]
    food_name: String,
    #[serde(alias = "portion_size", alias = "portion")]
    portion_size: Value,
    #[serde(default)]
    unit: Option<Value>,
    #[serde(default)]
    calories: Option<Value>,
    #[serde(default)]
    protein: Option<Value>,
    #[serde(default)]
    fat: Option<Value>,
    #[serde(default, alias = "carbohydrates")]
    carbs: Option<Value>,
}

/// Outcome of decoding a reply that looks like a JSON object
#[derive(Debug)]
enum StructuredDecode {
    /// Decoded with at least one nutrition figure
    Estimate(NutritionEstimate),
    /// Matches the schema but has no label or no figures
    Unusable,
    /// Not the expected schema; prose extraction may still apply
    SchemaMismatch,
}

fn decode_structured(text: &str) -> StructuredDecode {
    let reply: StructuredReply = match serde_json::from_str(text) {
        Ok(reply) => reply,
        Err(e) => {
            debug!(error = %e, "Structured reply does not match schema");
            return StructuredDecode::SchemaMismatch;
        }
    };

    let food_name = reply.food_name.trim();
    if food_name.is_empty() {
        return StructuredDecode::Unusable;
    }

    let portion_size = coerce_number(&reply.portion_size)
        .filter(|portion| *portion > 0.0)
        .map_or(DEFAULT_PORTION_SIZE, |portion| portion.round().max(1.0));
    let unit = reply
        .unit
        .as_ref()
        .and_then(Value::as_str)
        .map_or(PortionUnit::Mass, PortionUnit::from_str_lossy);

    let mut estimate = NutritionEstimate::new(food_name, portion_size, unit);
    estimate.calories = reply.calories.as_ref().and_then(coerce_number);
    estimate.protein = reply.protein.as_ref().and_then(coerce_number);
    estimate.fat = reply.fat.as_ref().and_then(coerce_number);
    estimate.carbs = reply.carbs.as_ref().and_then(coerce_number);

    if !estimate.has_nutrition_signal() {
        return StructuredDecode::Unusable;
    }

    // Explicit zeros in a structured reply are deliberate values
    estimate.backfill_macros(false);
    estimate.round_values();
    StructuredDecode::Estimate(estimate)
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn extract_heuristic(raw: &str) -> Option<NutritionEstimate> {
    let text = normalize_text(raw);

    let [calories, protein, fat, carbs] = NutrientField::ALL.map(|field| extract_field(&text, field));
    if calories.is_none() && protein.is_none() && fat.is_none() && carbs.is_none() {
        return None;
    }

    let food_name = extract_food_name(&text)?;
    let (portion_size, unit) = extract_portion(&text);

    let mut estimate = NutritionEstimate::new(food_name, portion_size, unit);
    estimate.calories = calories;
    estimate.protein = protein;
    estimate.fat = fat;
    estimate.carbs = carbs;
    estimate.backfill_macros(true);
    estimate.round_values();
    Some(estimate)
}

/// Food label from the first non-empty line
///
/// Emphasized text on that line wins; otherwise the whole line with markup
/// removed.
fn extract_food_name(text: &str) -> Option<String> {
    let first_line = text.lines().map(str::trim).find(|line| !line.is_empty())?;

    let emphasized = EMPHASIZED_TEXT_PATTERN
        .as_ref()
        .and_then(|pattern| pattern.captures(first_line))
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| clean_label(m.as_str()))
        .filter(|name| !name.is_empty());
    if emphasized.is_some() {
        return emphasized;
    }

    text.lines()
        .map(strip_markup)
        .find(|line| !line.is_empty())
}

fn strip_markup(line: &str) -> String {
    let without_marks: String = line
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '`' | '#'))
        .collect();
    let trimmed = without_marks.trim();
    let unbulleted = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("• "))
        .unwrap_or(trimmed);
    clean_label(unbulleted)
}

fn clean_label(label: &str) -> String {
    label.trim().trim_end_matches(':').trim().to_owned()
}

fn extract_portion(text: &str) -> (f64, PortionUnit) {
    let Some(caps) = PORTION_PATTERN.as_ref().and_then(|p| p.captures(text)) else {
        return (DEFAULT_PORTION_SIZE, PortionUnit::Mass);
    };

    let size = parse_capture(&caps)
        .filter(|v| *v > 0.0)
        .unwrap_or(DEFAULT_PORTION_SIZE);
    let unit = caps
        .name("unit")
        .map_or(PortionUnit::Mass, |m| PortionUnit::from_str_lossy(m.as_str()));
    (size, unit)
}
