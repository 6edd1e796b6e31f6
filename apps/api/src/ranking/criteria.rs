//! Criteria extraction from job descriptions, and parsing of caller-supplied criteria payloads.

use serde_json::Value;
use tracing::info;

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{strip_json_fences, CompletionOptions, CompletionService};
use crate::ranking::models::CriteriaSet;
use crate::ranking::prompts::{CRITERIA_PROMPT_TEMPLATE, CRITERIA_SYSTEM};
use crate::ranking::RankingError;
use crate::report::MAX_REPORT_CRITERIA;

/// Asks the model for the ranking criteria of a job description.
pub async fn extract_criteria(
    llm: &dyn CompletionService,
    jd_text: &str,
) -> Result<CriteriaSet, RankingError> {
    if jd_text.trim().is_empty() {
        return Err(RankingError::EmptyDocument);
    }

    let prompt = CRITERIA_PROMPT_TEMPLATE.replace("{jd_text}", jd_text);
    let options = CompletionOptions::deterministic(&format!("{CRITERIA_SYSTEM} {JSON_ONLY_SYSTEM}"));
    let completion = llm.complete(&prompt, &options).await?;

    let criteria = parse_criteria_completion(&completion)?;
    info!("Extracted {} criteria from job description", criteria.len());
    Ok(criteria)
}

/// Parses a criteria completion: `{"criteria": [...]}` or a bare array, optionally fenced.
pub fn parse_criteria_completion(completion: &str) -> Result<CriteriaSet, RankingError> {
    let value: Value = serde_json::from_str(strip_json_fences(completion))
        .map_err(|e| RankingError::CriteriaParse(format!("not valid JSON: {e}")))?;

    let items = criteria_items(&value).map_err(RankingError::CriteriaParse)?;
    let criteria = CriteriaSet::new(items);
    if criteria.is_empty() {
        return Err(RankingError::EmptyCriteria);
    }
    Ok(criteria)
}

/// Parses the `criteria` form field of a scoring request.
///
/// Accepts a JSON array of strings, an object with a `criteria` array (the extraction
/// response verbatim), or a JSON string that itself contains one of those.
pub fn parse_criteria_payload(raw: &str) -> Result<CriteriaSet, RankingError> {
    let value = match parse_payload_json(raw)? {
        Value::String(inner) => parse_payload_json(&inner)?,
        other => other,
    };

    let items = criteria_items(&value).map_err(RankingError::InvalidCriteriaPayload)?;
    let criteria = CriteriaSet::new(items);
    if criteria.is_empty() {
        return Err(RankingError::NoCriteria);
    }
    if criteria.len() > MAX_REPORT_CRITERIA {
        return Err(RankingError::InvalidCriteriaPayload(format!(
            "{} criteria given, at most {} fit in the report",
            criteria.len(),
            MAX_REPORT_CRITERIA
        )));
    }
    Ok(criteria)
}

fn parse_payload_json(raw: &str) -> Result<Value, RankingError> {
    if raw.trim().is_empty() {
        return Err(RankingError::InvalidCriteriaPayload(
            "criteria field is empty".to_string(),
        ));
    }
    serde_json::from_str(raw.trim()).map_err(|e| {
        RankingError::InvalidCriteriaPayload(format!(
            "not valid JSON (line {}, column {})",
            e.line(),
            e.column()
        ))
    })
}

/// Pulls the list of criterion strings out of an array or a `{"criteria": [...]}` object.
fn criteria_items(value: &Value) -> Result<Vec<&str>, String> {
    let array = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("criteria") {
            Some(Value::Array(items)) => items,
            Some(_) => return Err("'criteria' must be an array of strings".to_string()),
            None => return Err("expected an object with a 'criteria' array".to_string()),
        },
        _ => {
            return Err("expected a list of criteria or an object with a 'criteria' array".to_string())
        }
    };

    array
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .ok_or_else(|| format!("criterion at position {} is not a string", i + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::StubCompletion;
    use crate::llm_client::LlmError;

    const GO_JD: &str = "Require 3+ years Go experience; CKA certification preferred";

    #[tokio::test]
    async fn test_extract_criteria_end_to_end_with_stub() {
        let stub = StubCompletion::fixed(
            r#"{"criteria": ["3+ years Go experience", "CKA certification preferred"]}"#,
        );
        let criteria = extract_criteria(&stub, GO_JD).await.unwrap();
        assert_eq!(
            criteria.as_slice(),
            &[
                "3+ years Go experience".to_string(),
                "CKA certification preferred".to_string()
            ]
        );
        assert_eq!(stub.calls(), 1);
        assert!(stub.prompts()[0].contains(GO_JD));
    }

    #[tokio::test]
    async fn test_extract_criteria_blank_text_skips_model_call() {
        let stub = StubCompletion::fixed(r#"{"criteria": ["x"]}"#);
        let err = extract_criteria(&stub, "  \n ").await.unwrap_err();
        assert!(matches!(err, RankingError::EmptyDocument));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_extract_criteria_surfaces_model_failure() {
        let stub = StubCompletion::with(|_| Err(LlmError::Timeout));
        let err = extract_criteria(&stub, GO_JD).await.unwrap_err();
        assert!(matches!(err, RankingError::ModelService(LlmError::Timeout)));
    }

    #[tokio::test]
    async fn test_extract_criteria_empty_list_is_distinct_error() {
        let stub = StubCompletion::fixed(r#"{"criteria": []}"#);
        let err = extract_criteria(&stub, GO_JD).await.unwrap_err();
        assert!(matches!(err, RankingError::EmptyCriteria));
    }

    #[test]
    fn test_completion_accepts_fenced_json_and_bare_arrays() {
        let fenced = "```json\n{\"criteria\": [\"Go\", \"  Kubernetes \"]}\n```";
        assert_eq!(parse_criteria_completion(fenced).unwrap().len(), 2);

        let bare = r#"["Go", "", "SQL"]"#;
        let criteria = parse_criteria_completion(bare).unwrap();
        assert_eq!(criteria.as_slice(), &["Go".to_string(), "SQL".to_string()]);
    }

    #[test]
    fn test_completion_rejects_prose_instead_of_guessing() {
        let prose = "- 3+ years Go experience\n- CKA certification";
        let err = parse_criteria_completion(prose).unwrap_err();
        assert!(matches!(err, RankingError::CriteriaParse(_)));
    }

    #[test]
    fn test_completion_rejects_wrong_shapes() {
        for bad in [
            r#"{"requirements": ["Go"]}"#,
            r#"{"criteria": "Go"}"#,
            r#"{"criteria": ["Go", 3]}"#,
            r#"42"#,
        ] {
            let err = parse_criteria_completion(bad).unwrap_err();
            assert!(matches!(err, RankingError::CriteriaParse(_)), "{bad}");
        }
    }

    #[test]
    fn test_completion_of_only_blank_items_is_empty_criteria() {
        let err = parse_criteria_completion(r#"{"criteria": ["  ", ""]}"#).unwrap_err();
        assert!(matches!(err, RankingError::EmptyCriteria));
    }

    #[test]
    fn test_payload_accepts_extraction_response_verbatim() {
        let criteria =
            parse_criteria_payload(r#"{"criteria": ["Go", "CKA certification"]}"#).unwrap();
        assert_eq!(criteria.len(), 2);
    }

    #[test]
    fn test_payload_accepts_raw_array() {
        let criteria = parse_criteria_payload(r#"["Go", "Rust"]"#).unwrap();
        assert_eq!(criteria.as_slice()[1], "Rust");
    }

    #[test]
    fn test_payload_accepts_double_encoded_json_string() {
        let encoded = serde_json::to_string(r#"{"criteria": ["Go"]}"#).unwrap();
        let criteria = parse_criteria_payload(&encoded).unwrap();
        assert_eq!(criteria.as_slice(), &["Go".to_string()]);
    }

    #[test]
    fn test_payload_rejects_invalid_json_with_position() {
        let err = parse_criteria_payload("{criteria: [Go]}").unwrap_err();
        match err {
            RankingError::InvalidCriteriaPayload(msg) => assert!(msg.contains("line 1")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_payload_rejects_object_without_criteria_and_non_strings() {
        assert!(matches!(
            parse_criteria_payload(r#"{"skills": ["Go"]}"#),
            Err(RankingError::InvalidCriteriaPayload(_))
        ));
        assert!(matches!(
            parse_criteria_payload(r#"[{"text": "Go"}]"#),
            Err(RankingError::InvalidCriteriaPayload(_))
        ));
        assert!(matches!(
            parse_criteria_payload(r#""just a sentence""#),
            Err(RankingError::InvalidCriteriaPayload(_))
        ));
        assert!(matches!(
            parse_criteria_payload(""),
            Err(RankingError::InvalidCriteriaPayload(_))
        ));
    }

    #[test]
    fn test_payload_with_more_criteria_than_report_columns_is_rejected() {
        let items: Vec<String> = (0..=MAX_REPORT_CRITERIA).map(|i| format!("skill {i}")).collect();
        let payload = serde_json::to_string(&items).unwrap();
        assert!(matches!(
            parse_criteria_payload(&payload),
            Err(RankingError::InvalidCriteriaPayload(_))
        ));

        let payload = serde_json::to_string(&items[..MAX_REPORT_CRITERIA]).unwrap();
        assert_eq!(
            parse_criteria_payload(&payload).unwrap().len(),
            MAX_REPORT_CRITERIA
        );
    }

    #[test]
    fn test_payload_with_no_criteria_is_rejected() {
        assert!(matches!(
            parse_criteria_payload(r#"{"criteria": []}"#),
            Err(RankingError::NoCriteria)
        ));
    }
}
