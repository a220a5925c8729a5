use log::warn;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

use super::{Document, RelationRecord, SkillRecord, SubjectRecord};

#[derive(Clone, Debug, Deserialize)]
struct RawRelation {
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default, alias = "strength")]
    score: Option<Value>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawSkill {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, alias = "label", alias = "displayName")]
    name: Option<String>,
    #[serde(default)]
    relations: Vec<Value>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawSubject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    relations: Vec<Value>,
    #[serde(default)]
    skills: Vec<String>,
}

pub(super) fn parse_document(raw: &str) -> Result<Document> {
    let parsed: Value = serde_json::from_str(raw)?;
    let object = parsed
        .as_object()
        .ok_or_else(|| Error::InvalidDocument("top level must be a JSON object".to_owned()))?;

    let skills = entries(object.get("skills"), "skills")?
        .iter()
        .filter_map(|value| match RawSkill::deserialize(value) {
            Ok(raw) => Some(SkillRecord {
                id: raw.id.filter(|id| !id.trim().is_empty()),
                name: raw.name,
                relations: relations(&raw.relations),
            }),
            Err(error) => {
                warn!("skipping malformed skill record: {error}");
                None
            }
        })
        .collect();

    let subjects = entries(object.get("subjects"), "subjects")?
        .iter()
        .filter_map(|value| match RawSubject::deserialize(value) {
            Ok(raw) => Some(SubjectRecord {
                id: raw.id,
                name: raw.name,
                relations: relations(&raw.relations),
                skills: raw.skills,
            }),
            Err(error) => {
                warn!("skipping malformed subject record: {error}");
                None
            }
        })
        .collect();

    Ok(Document { skills, subjects })
}

fn entries<'a>(value: Option<&'a Value>, key: &str) -> Result<&'a [Value]> {
    match value {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(Error::InvalidDocument(format!("`{key}` must be an array"))),
    }
}

fn relations(values: &[Value]) -> Vec<RelationRecord> {
    values
        .iter()
        .filter_map(|value| {
            let raw = RawRelation::deserialize(value).ok()?;
            let kind = raw.kind.filter(|kind| !kind.is_empty())?;
            let target = raw.target.filter(|target| !target.is_empty())?;
            Some(RelationRecord {
                kind,
                target,
                score: raw.score.as_ref().and_then(parse_score),
            })
        })
        .collect()
}

/// Accepts numbers and numeric strings; anything non-positive or non-finite
/// counts as missing.
pub(super) fn parse_score(value: &Value) -> Option<f32> {
    let score = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    let score = score as f32;
    (score.is_finite() && score > 0.0).then_some(score)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_scores_from_numbers_and_strings() {
        assert_eq!(parse_score(&json!(7)), Some(7.0));
        assert_eq!(parse_score(&json!("2.5")), Some(2.5));
        assert_eq!(parse_score(&json!("high")), None);
        assert_eq!(parse_score(&json!(0)), None);
        assert_eq!(parse_score(&json!(null)), None);
    }

    #[test]
    fn scores_beyond_f32_range_count_as_missing() {
        assert_eq!(parse_score(&json!(1.0e300)), None);
        assert_eq!(parse_score(&json!("1e39")), None);
        assert!(parse_score(&json!(3.0e38)).is_some_and(f32::is_finite));
    }

    #[test]
    fn keeps_records_without_ids_for_the_builder_to_skip() {
        let document = parse_document(
            r#"{"skills": [{"name": "anonymous"}, {"id": "A", "relations": [{"kind": "Child"}]}]}"#,
        )
        .unwrap();

        assert_eq!(document.skills.len(), 2);
        assert_eq!(document.skills[0].id, None);
        assert!(document.skills[1].relations.is_empty());
    }

    #[test]
    fn rejects_non_array_sections() {
        let error = parse_document(r#"{"skills": {"id": "A"}}"#).unwrap_err();
        assert!(matches!(error, Error::InvalidDocument(_)));
    }

    #[test]
    fn missing_sections_are_empty() {
        let document = parse_document("{}").unwrap();
        assert!(document.skills.is_empty());
        assert!(document.subjects.is_empty());
    }
}
