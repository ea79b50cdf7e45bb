//! Validation of raw engine responses.
//!
//! The engine is an untrusted boundary: its text is parsed as JSON and every
//! field is checked before an [`Assessment`] is built. A response that is not
//! a JSON object is a [`AssessmentError::Malformed`]; individual bad fields
//! are dropped instead.

use log::debug;
use serde_json::Value;
use std::collections::BTreeMap;

use super::AssessmentError;
use super::schema::{Assessment, Dimension, Issue, Severity};

/// Parse and validate the engine's JSON text.
///
/// Some engines wrap their JSON in a markdown code fence despite being asked
/// not to, so a single surrounding fence is tolerated.
pub fn parse_assessment(text: &str) -> Result<Assessment, AssessmentError> {
    let body = strip_code_fence(text.trim());
    let value: Value = serde_json::from_str(body)
        .map_err(|e| AssessmentError::Malformed(format!("response is not valid JSON: {e}")))?;
    validate_assessment(&value)
}

/// Build an [`Assessment`] from an already-parsed JSON value.
pub fn validate_assessment(value: &Value) -> Result<Assessment, AssessmentError> {
    let object = value
        .as_object()
        .ok_or_else(|| AssessmentError::Malformed("response is not a JSON object".to_string()))?;

    let issues: Vec<Issue> = match object.get("issues") {
        Some(Value::Array(items)) => items.iter().filter_map(validate_issue).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            return Err(AssessmentError::Malformed(
                "`issues` must be an array".to_string(),
            ));
        }
    };

    let summary = object
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    let positive_highlights = object
        .get("positive_highlights")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut dimensions = object
        .get("scores")
        .and_then(Value::as_object)
        .map(validate_scores)
        .unwrap_or_default();

    if dimensions.is_empty() {
        dimensions = derive_scores_from_issues(&issues);
    }

    Ok(Assessment {
        dimensions,
        issues,
        summary,
        positive_highlights,
    })
}

/// Keep only finite numeric scores inside `0..=100`, keyed in lowercase.
fn validate_scores(raw: &serde_json::Map<String, Value>) -> BTreeMap<String, f64> {
    raw.iter()
        .filter_map(|(key, value)| {
            let score = value.as_f64()?;
            if !score.is_finite() || !(0.0..=100.0).contains(&score) {
                debug!(target: "ux_audit::assessment", "Dropping invalid score {key}={value}");
                return None;
            }
            Some((key.trim().to_ascii_lowercase(), score))
        })
        .collect()
}

fn validate_issue(raw: &Value) -> Option<Issue> {
    let object = raw.as_object()?;
    let text = |field: &str| {
        object
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let category = match text("category").map(|c| c.parse::<Dimension>()) {
        Some(Ok(category)) => category,
        _ => {
            debug!(target: "ux_audit::assessment", "Dropping issue without a known category: {raw}");
            return None;
        }
    };

    let severity = text("severity")
        .and_then(|s| s.parse::<Severity>().ok())
        .unwrap_or(Severity::Medium);

    let title = text("title").unwrap_or_else(|| format!("{} issue detected", category.label()));
    let description = text("description").unwrap_or_default();
    let suggestion = text("ai_suggestion")
        .or_else(|| text("suggestion"))
        .unwrap_or_else(|| default_suggestion(category));

    Some(Issue {
        title,
        description,
        severity,
        category,
        suggestion: Some(suggestion),
    })
}

fn default_suggestion(category: Dimension) -> String {
    format!(
        "Consider improving {} by addressing this issue. Focus on clarity, consistency, and accessibility best practices.",
        category.key()
    )
}

/// Score every fixed dimension from the issues in its category.
///
/// Each dimension starts at 100 and loses the severity penalty of every
/// issue filed under it, floored at 0.
#[must_use]
pub fn derive_scores_from_issues(issues: &[Issue]) -> BTreeMap<String, f64> {
    Dimension::ALL
        .into_iter()
        .map(|dimension| {
            let penalty: f64 = issues
                .iter()
                .filter(|issue| issue.category == dimension)
                .map(|issue| issue.severity.penalty())
                .sum();
            (dimension.key().to_string(), (100.0 - penalty).max(0.0))
        })
        .collect()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_response_with_scores() {
        let text = r#"{
            "issues": [
                {"title": "Low contrast", "description": "Grey on grey", "severity": "High", "category": "Accessibility"}
            ],
            "summary": "Decent page.",
            "positive_highlights": ["Clear hero"],
            "scores": {"Usability": 80, "clarity": 72.5}
        }"#;

        let assessment = parse_assessment(text).expect("valid response");
        assert_eq!(assessment.dimensions.get("usability"), Some(&80.0));
        assert_eq!(assessment.dimensions.get("clarity"), Some(&72.5));
        assert_eq!(assessment.dimensions.len(), 2);
        assert_eq!(assessment.issues.len(), 1);
        assert_eq!(assessment.issues[0].severity, Severity::High);
        assert_eq!(assessment.summary, "Decent page.");
        assert_eq!(assessment.positive_highlights, vec!["Clear hero".to_string()]);
    }

    #[test]
    fn test_invalid_scores_are_dropped_not_zero_filled() {
        let text = r#"{"scores": {"usability": "great", "clarity": 140, "navigation": -1, "aesthetics": 55}}"#;
        let assessment = parse_assessment(text).expect("valid response");
        assert_eq!(assessment.dimensions.len(), 1);
        assert_eq!(assessment.dimensions.get("aesthetics"), Some(&55.0));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        assert!(matches!(
            parse_assessment("Sure! Here is the audit: {"),
            Err(AssessmentError::Malformed(_))
        ));
        assert!(matches!(
            parse_assessment("[1, 2, 3]"),
            Err(AssessmentError::Malformed(_))
        ));
        assert!(matches!(
            parse_assessment(r#"{"issues": "none"}"#),
            Err(AssessmentError::Malformed(_))
        ));
    }

    #[test]
    fn test_code_fenced_json_is_accepted() {
        let text = "```json\n{\"summary\": \"ok\", \"scores\": {\"usability\": 90}}\n```";
        let assessment = parse_assessment(text).expect("fenced JSON");
        assert_eq!(assessment.summary, "ok");
    }

    #[test]
    fn test_issue_defaults_are_filled() {
        let text = r#"{"issues": [
            {"description": "Menu hidden", "severity": "urgent", "category": "navigation"},
            {"title": "Unknown", "category": "Performance"}
        ]}"#;
        let assessment = parse_assessment(text).expect("valid response");
        assert_eq!(assessment.issues.len(), 1);

        let issue = &assessment.issues[0];
        assert_eq!(issue.title, "Navigation issue detected");
        assert_eq!(issue.severity, Severity::Medium);
        assert!(
            issue
                .suggestion
                .as_deref()
                .is_some_and(|s| s.starts_with("Consider improving navigation"))
        );
    }

    #[test]
    fn test_scores_derived_from_issues_when_missing() {
        let text = r#"{"issues": [
            {"title": "a", "severity": "Critical", "category": "Usability"},
            {"title": "b", "severity": "Low", "category": "Usability"},
            {"title": "c", "severity": "High", "category": "Clarity"}
        ]}"#;
        let assessment = parse_assessment(text).expect("valid response");
        assert_eq!(assessment.dimensions.get("usability"), Some(&72.0));
        assert_eq!(assessment.dimensions.get("clarity"), Some(&85.0));
        assert_eq!(assessment.dimensions.get("navigation"), Some(&100.0));
        assert_eq!(assessment.dimensions.len(), 5);
    }
}
