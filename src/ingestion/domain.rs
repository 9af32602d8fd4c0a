use serde::{Deserialize, Serialize};

use crate::survey::QuestionType;

/// Keyword rule mapping a prompt onto a coarse survey domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRule {
    pub domain: String,
    /// Lower-case words; any match selects the domain.
    ///
    /// A word matches itself and its plural. A trailing `*` marks a stem
    /// that matches any word starting with it. Several words must appear
    /// next to each other.
    pub keywords: Vec<String>,
    /// Type given to option-bearing drafts that arrived typed as `text`.
    pub default_type: QuestionType,
}

impl DomainRule {
    pub fn new(domain: &str, keywords: &[&str], default_type: QuestionType) -> Self {
        Self {
            domain: domain.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            default_type,
        }
    }

    fn matches(&self, words: &[&str]) -> bool {
        self.keywords.iter().any(|keyword| {
            let pattern = tokenize(keyword);
            !pattern.is_empty()
                && words
                    .windows(pattern.len())
                    .any(|window| window.iter().zip(&pattern).all(|(w, k)| word_matches(w, k)))
        })
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '*'))
        .filter(|w| !w.is_empty())
        .collect()
}

fn word_matches(word: &str, keyword: &str) -> bool {
    match keyword.strip_suffix('*') {
        Some(stem) => word.starts_with(stem),
        None => {
            word == keyword
                || word
                    .strip_prefix(keyword)
                    .is_some_and(|rest| rest == "s" || rest == "es")
        }
    }
}

/// Ordered keyword table; the first matching rule wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainPolicy {
    rules: Vec<DomainRule>,
}

impl DomainPolicy {
    pub fn new(rules: Vec<DomainRule>) -> Self {
        Self { rules }
    }

    /// Append a rule with the lowest priority.
    pub fn with_rule(mut self, rule: DomainRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Infer the domain of a free-text prompt.
    pub fn infer(&self, prompt: &str) -> Option<&DomainRule> {
        let haystack = prompt.to_lowercase().replace('*', " ");
        let words = tokenize(&haystack);
        self.rules.iter().find(|rule| rule.matches(&words))
    }

    pub fn rules(&self) -> &[DomainRule] {
        &self.rules
    }
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self::new(vec![
            DomainRule::new(
                "employment",
                &[
                    "employ*", "job", "occupation*", "labour", "labor", "wage", "salary", "work",
                    "worker",
                ],
                QuestionType::Radio,
            ),
            DomainRule::new(
                "agriculture",
                &["agri*", "farm*", "crop", "harvest*", "irrigat*", "livestock", "land", "landholding"],
                QuestionType::MultipleChoice,
            ),
            DomainRule::new(
                "prices",
                &["price", "inflation", "cost of", "expense", "market rate"],
                QuestionType::Text,
            ),
            DomainRule::new(
                "health",
                &["health*", "clinic", "hospital*", "disease", "medical", "illness"],
                QuestionType::Checkbox,
            ),
            DomainRule::new(
                "transport",
                &["transport*", "commut*", "bus", "train", "metro", "vehicle"],
                QuestionType::Radio,
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_default_domains() {
        let policy = DomainPolicy::default();
        let domain = |p: &str| policy.infer(p).map(|r| r.domain.as_str());

        assert_eq!(domain("Household EMPLOYMENT status"), Some("employment"));
        assert_eq!(domain("Survey of crop yields"), Some("agriculture"));
        assert_eq!(domain("Retail price collection"), Some("prices"));
        assert_eq!(domain("Access to hospital care"), Some("health"));
        assert_eq!(domain("Daily commute patterns"), Some("transport"));
        assert_eq!(domain("Favourite colours"), None);
    }

    #[test]
    fn test_keywords_match_whole_words() {
        let policy = DomainPolicy::default();
        let domain = |p: &str| policy.infer(p).map(|r| r.domain.as_str());

        assert_eq!(domain("Survey of small business owners"), None);
        assert_eq!(domain("Vocational training outcomes"), None);
        assert_eq!(domain("Island households in England"), None);
        assert_eq!(domain("Home network and homework"), None);

        assert_eq!(domain("Buses and trains in the city"), Some("transport"));
        assert_eq!(domain("Irrigation coverage"), Some("agriculture"));
        assert_eq!(domain("Agricultural land use"), Some("agriculture"));
        assert_eq!(domain("Work hours per week"), Some("employment"));
        assert_eq!(domain("Household cost-of living"), Some("prices"));
    }

    #[test]
    fn test_default_types() {
        let policy = DomainPolicy::default();
        assert_eq!(
            policy.infer("jobs").unwrap().default_type,
            QuestionType::Radio
        );
        assert_eq!(
            policy.infer("farmers").unwrap().default_type,
            QuestionType::MultipleChoice
        );
    }

    #[test]
    fn test_policy_is_extensible() {
        let policy = DomainPolicy::default().with_rule(DomainRule::new(
            "education",
            &["school", "literacy"],
            QuestionType::Radio,
        ));
        assert_eq!(
            policy.infer("literacy rates").map(|r| r.domain.as_str()),
            Some("education")
        );

        let empty = DomainPolicy::new(Vec::new());
        assert!(empty.infer("employment").is_none());
    }
}
