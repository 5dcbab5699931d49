//! The condition evaluator: a pure, total function deciding whether an edge
//! fires given a predecessor's output.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::output::Output;

/// What part of the execution state a condition inspects.
///
/// Only `node_output` is defined today; any other value is accepted at parse
/// time but always evaluates to `false`, per the data model's "unknown
/// match_target evaluates to false" rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTarget(pub String);

impl MatchTarget {
    pub fn node_output() -> Self {
        MatchTarget("node_output".to_string())
    }

    fn is_node_output(&self) -> bool {
        self.0 == "node_output"
    }
}

/// How `match_value` is compared against the stringified predecessor output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Contains,
    NotContains,
    Fuzzy,
    Regex,
}

/// A structured gate attached to an edge. Not executable code: a descriptor
/// interpreted by [`evaluate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub match_target: MatchTarget,
    pub match_type: MatchType,
    pub match_value: String,
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
}

fn default_case_sensitive() -> bool {
    true
}

/// Decide whether an edge fires. `condition = None` always fires. The
/// function never panics: an invalid regex, like an unknown match_target,
/// simply evaluates to `false`.
pub fn evaluate(condition: Option<&Condition>, predecessor_output: &Output) -> bool {
    let condition = match condition {
        None => return true,
        Some(c) => c,
    };

    if !condition.match_target.is_node_output() {
        return false;
    }

    let haystack = predecessor_output.as_condition_text();

    match condition.match_type {
        MatchType::Contains => contains(&haystack, &condition.match_value, condition.case_sensitive),
        MatchType::NotContains => {
            !contains(&haystack, &condition.match_value, condition.case_sensitive)
        }
        MatchType::Fuzzy => {
            let stripped_haystack = strip_whitespace(&haystack);
            let stripped_needle = strip_whitespace(&condition.match_value);
            contains(&stripped_haystack, &stripped_needle, condition.case_sensitive)
        }
        MatchType::Regex => match_regex(&haystack, &condition.match_value, condition.case_sensitive),
    }
}

fn contains(haystack: &str, needle: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        haystack.contains(needle)
    } else {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn match_regex(haystack: &str, pattern: &str, case_sensitive: bool) -> bool {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map(|re| re.is_match(haystack))
        .unwrap_or(false)
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_match_type() -> impl Strategy<Value = MatchType> {
        prop_oneof![
            Just(MatchType::Contains),
            Just(MatchType::NotContains),
            Just(MatchType::Fuzzy),
            Just(MatchType::Regex),
        ]
    }

    proptest! {
        /// `evaluate` never panics and is a pure function of its inputs:
        /// calling it twice on the same arguments gives the same answer.
        #[test]
        fn evaluate_is_deterministic_and_total(
            match_type in arb_match_type(),
            match_value in ".{0,16}",
            case_sensitive in any::<bool>(),
            haystack in ".{0,32}",
        ) {
            let condition = Condition {
                match_target: MatchTarget::node_output(),
                match_type,
                match_value,
                case_sensitive,
            };
            let output = Output::Text(haystack);
            let first = evaluate(Some(&condition), &output);
            let second = evaluate(Some(&condition), &output);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn none_condition_is_always_true(haystack in ".{0,32}") {
            prop_assert!(evaluate(None, &Output::Text(haystack)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(match_type: MatchType, value: &str, case_sensitive: bool) -> Condition {
        Condition {
            match_target: MatchTarget::node_output(),
            match_type,
            match_value: value.to_string(),
            case_sensitive,
        }
    }

    #[test]
    fn none_condition_always_fires() {
        assert!(evaluate(None, &Output::Text("anything".into())));
    }

    #[test]
    fn contains_matches_substring() {
        let c = cond(MatchType::Contains, "tech", true);
        assert!(evaluate(Some(&c), &Output::Text("tech_article".into())));
        assert!(!evaluate(Some(&c), &Output::Text("marketing".into())));
    }

    #[test]
    fn contains_case_insensitive() {
        let c = cond(MatchType::Contains, "TECH", false);
        assert!(evaluate(Some(&c), &Output::Text("tech_article".into())));
    }

    #[test]
    fn not_contains_inverts_contains() {
        let c = cond(MatchType::NotContains, "tech", true);
        assert!(!evaluate(Some(&c), &Output::Text("tech_article".into())));
        assert!(evaluate(Some(&c), &Output::Text("marketing".into())));
    }

    #[test]
    fn fuzzy_ignores_whitespace() {
        let c = cond(MatchType::Fuzzy, "hello world", true);
        assert!(evaluate(Some(&c), &Output::Text("  hello   world  ".into())));
    }

    #[test]
    fn regex_matches_unanchored() {
        let c = cond(MatchType::Regex, r"^tech_\w+$", true);
        assert!(evaluate(Some(&c), &Output::Text("tech_article".into())));
    }

    #[test]
    fn invalid_regex_evaluates_false_not_panic() {
        let c = cond(MatchType::Regex, "(unclosed", true);
        assert!(!evaluate(Some(&c), &Output::Text("anything".into())));
    }

    #[test]
    fn unknown_match_target_evaluates_false() {
        let mut c = cond(MatchType::Contains, "tech", true);
        c.match_target = MatchTarget("some_other_field".to_string());
        assert!(!evaluate(Some(&c), &Output::Text("tech_article".into())));
    }
}
