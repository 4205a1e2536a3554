//! Structural (JSON) comparison for stages that emit token records.
//!
//! Both sides are parsed with `serde_json`; equality is deep value equality,
//! so `1` and `"1"` differ, array order matters, and object key order does not.
//! Mismatches are diffed on the pretty-printed values, which have sorted keys.

use serde_json::Value;

use super::{line_diff, require_success};
use crate::executor::ExecutionOutcome;
use crate::verdict::{Failure, Side};

pub fn compare(expected: &str, outcome: &ExecutionOutcome) -> Result<(), Failure> {
    require_success(outcome)?;

    if expected.trim().is_empty() && outcome.stdout.trim().is_empty() {
        return Ok(());
    }

    let expected_value = parse(expected, Side::Expected)?;
    let actual_value = parse(&outcome.stdout, Side::Actual)?;
    if expected_value == actual_value {
        return Ok(());
    }
    Err(Failure::StructuralMismatch {
        diff: line_diff(&canonical(&expected_value), &canonical(&actual_value)),
    })
}

fn parse(text: &str, side: Side) -> Result<Value, Failure> {
    serde_json::from_str(text).map_err(|err| Failure::MalformedOutput {
        side,
        message: err.to_string(),
    })
}

/// Canonical text form: sorted keys, two-space indentation.
pub fn canonical(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::tests::outcome;

    const TOKENS: &str = r#"[
  {"type": "KEYWORD", "value": "const"},
  {"type": "IDENTIFIER", "value": "x"},
  {"type": "INTEGER", "value": 42}
]"#;

    #[test]
    fn equal_records_pass_regardless_of_formatting_and_key_order() {
        let actual = r#"[{"value":"const","type":"KEYWORD"},{"type":"IDENTIFIER","value":"x"},{"type":"INTEGER","value":42}]"#;
        assert_eq!(compare(TOKENS, &outcome(actual, 0)), Ok(()));
    }

    #[test]
    fn numeric_and_string_typing_is_preserved() {
        let actual = r#"[{"type":"KEYWORD","value":"const"},{"type":"IDENTIFIER","value":"x"},{"type":"INTEGER","value":"42"}]"#;
        let Err(Failure::StructuralMismatch { diff }) = compare(TOKENS, &outcome(actual, 0)) else {
            panic!("expected a structural mismatch");
        };
        assert!(diff.contains("-    \"value\": 42"));
        assert!(diff.contains("+    \"value\": \"42\""));
    }

    #[test]
    fn record_order_is_significant() {
        let actual = r#"[{"type":"IDENTIFIER","value":"x"},{"type":"KEYWORD","value":"const"},{"type":"INTEGER","value":42}]"#;
        assert!(matches!(
            compare(TOKENS, &outcome(actual, 0)),
            Err(Failure::StructuralMismatch { .. })
        ));
    }

    #[test]
    fn unparseable_actual_is_malformed_output() {
        let result = compare(TOKENS, &outcome("[{\"type\": ", 0));
        assert!(matches!(
            result,
            Err(Failure::MalformedOutput {
                side: Side::Actual,
                ..
            })
        ));
    }

    #[test]
    fn unparseable_expected_is_reported_against_expected_side() {
        let result = compare("not json", &outcome("[]", 0));
        assert!(matches!(
            result,
            Err(Failure::MalformedOutput {
                side: Side::Expected,
                ..
            })
        ));
    }

    #[test]
    fn nonzero_exit_fails_before_parsing() {
        assert!(matches!(
            compare(TOKENS, &outcome("garbage", 1)),
            Err(Failure::NonZeroExit { code: 1, .. })
        ));
    }
}
