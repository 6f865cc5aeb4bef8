use regex::Regex;

use crate::config::ConfigError;

/// Ordered list of patterns used to find a task id inside a free-text description.
///
/// Priority follows list position: once a pattern matches anywhere in the text,
/// later patterns are never consulted, even if they match earlier in the string.
#[derive(Debug, Clone, Default)]
pub struct TaskPatterns {
    patterns: Vec<Regex>,
}

impl TaskPatterns {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|source| ConfigError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns the first task id found in `text`.
    ///
    /// A pattern with two or more capture groups yields its second group (the
    /// first one is a discardable prefix such as `#`); otherwise the whole match.
    pub fn extract(&self, text: Option<&str>) -> Option<String> {
        let text = text.filter(|t| !t.is_empty())?;

        for pattern in &self.patterns {
            let Some(caps) = pattern.captures(text) else {
                continue;
            };
            // captures_len counts the implicit whole-match group
            let found = if pattern.captures_len() > 2 {
                caps.get(2).map(|m| m.as_str())
            } else {
                caps.get(0).map(|m| m.as_str())
            };
            return found.filter(|id| !id.is_empty()).map(String::from);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REDMINE: &str = "(#)([0-9]{1,})";
    const JIRA_NO_GROUPS: &str = "SLUG-[0-9]+";
    const JIRA_WITH_PREFIX: &str = "(prefix#)(SLUG-[0-9]+)";

    fn find(patterns: &[&str], description: &str) -> Option<String> {
        TaskPatterns::new(patterns).unwrap().extract(Some(description))
    }

    #[test]
    fn second_group_wins_for_prefixed_pattern() {
        assert_eq!(find(&[REDMINE], "Long task description #21558").as_deref(), Some("21558"));
        assert_eq!(find(&[REDMINE], "#24361").as_deref(), Some("24361"));
        assert_eq!(
            find(&[JIRA_WITH_PREFIX], "prefix#SLUG-123 Description").as_deref(),
            Some("SLUG-123")
        );
    }

    #[test]
    fn whole_match_without_groups() {
        assert_eq!(find(&[JIRA_NO_GROUPS], "Description SLUG-123").as_deref(), Some("SLUG-123"));
        assert_eq!(find(&[JIRA_NO_GROUPS], "SLUG-123 Description").as_deref(), Some("SLUG-123"));
    }

    #[test]
    fn single_group_returns_whole_match() {
        assert_eq!(find(&["(SLUG)-[0-9]+"], "do SLUG-7 now").as_deref(), Some("SLUG-7"));
    }

    #[test]
    fn list_order_beats_position_in_text() {
        let both = [JIRA_NO_GROUPS, REDMINE];
        assert_eq!(find(&both, "SLUG-123 #456").as_deref(), Some("SLUG-123"));
        assert_eq!(find(&both, "Description #1234 SLUG-123").as_deref(), Some("SLUG-123"));
        assert_eq!(find(&both, "Description #1234").as_deref(), Some("1234"));
        assert_eq!(
            find(&[REDMINE, JIRA_NO_GROUPS], "Description SLUG-123 #1234").as_deref(),
            Some("1234")
        );
    }

    #[test]
    fn first_occurrence_of_winning_pattern() {
        assert_eq!(
            find(&[REDMINE], "#24361 Task description, with others things #333").as_deref(),
            Some("24361")
        );
    }

    #[test]
    fn empty_or_missing_text() {
        let patterns = TaskPatterns::new(&[REDMINE]).unwrap();
        assert_eq!(patterns.extract(Some("")), None);
        assert_eq!(patterns.extract(None), None);
        assert_eq!(patterns.extract(Some("Lorem ipsum dolor imet")), None);
    }

    #[test]
    fn non_participating_group_yields_nothing() {
        assert_eq!(find(&["(#)?(x)?SLUG"], "SLUG"), None);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = TaskPatterns::new(&["(unclosed"]).unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }
}
