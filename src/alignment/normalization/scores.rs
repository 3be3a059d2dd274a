use serde_json::Value;

use super::emoji::EMOJI_COUNT;
use crate::taxonomy::ScoreConvention;

const LABEL_KEYS: [&str; 3] = ["label", "emotion", "name"];
const SCORE_KEYS: [&str; 4] = ["score", "value", "confidence", "probability"];

/// Shape-checked classifier output for one segment or sample.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum RawScores {
    Labeled(Vec<(String, f64)>),
    EmojiDistribution(Vec<f64>),
}

/// Reads one raw score structure. `Err` carries a human-readable reason and
/// means the structure itself has the wrong schema.
pub(super) fn parse_scores(
    value: &Value,
    convention: ScoreConvention,
) -> Result<RawScores, String> {
    if convention == ScoreConvention::EmojiDistribution {
        return parse_distribution(value).map(RawScores::EmojiDistribution);
    }
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(label, score)| {
                score
                    .as_f64()
                    .map(|score| (label.clone(), score))
                    .ok_or_else(|| format!("score for '{label}' is not a number"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(RawScores::Labeled),
        Value::Array(entries) => entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| parse_entry(idx, entry))
            .collect::<Result<Vec<_>, _>>()
            .map(RawScores::Labeled),
        other => Err(format!(
            "expected a label->score object or an array of entries, got {}",
            kind_of(other)
        )),
    }
}

fn parse_entry(idx: usize, entry: &Value) -> Result<(String, f64), String> {
    let Value::Object(map) = entry else {
        return Err(format!("entry #{idx} is {}, not an object", kind_of(entry)));
    };
    let label = LABEL_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .ok_or_else(|| format!("entry #{idx} has no label field"))?;
    let score = SCORE_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_f64))
        .ok_or_else(|| format!("entry #{idx} ('{label}') has no numeric score field"))?;
    Ok((label.to_string(), score))
}

fn parse_distribution(value: &Value) -> Result<Vec<f64>, String> {
    let Value::Array(entries) = value else {
        return Err(format!(
            "expected an array of {EMOJI_COUNT} emoji probabilities, got {}",
            kind_of(value)
        ));
    };
    if entries.len() != EMOJI_COUNT {
        return Err(format!(
            "expected {EMOJI_COUNT} emoji probabilities, got {}",
            entries.len()
        ));
    }
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            entry
                .as_f64()
                .ok_or_else(|| format!("emoji probability #{idx} is not a number"))
        })
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
