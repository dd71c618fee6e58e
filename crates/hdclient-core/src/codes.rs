use regex::Regex;

use hdclient_key::CodeKind;

use crate::error::HdClientError;

/// One validated entry of the codes table: a compiled match pattern plus
/// the code parameters it selects.
#[derive(Debug)]
pub struct CodeRule {
    pub pattern: String,
    regex: Regex,
    pub code: CodeKind,
    pub data_parts: u32,
    pub coding_parts: u32,
}

impl CodeRule {
    pub(crate) fn new(pattern: String, regex: Regex, code: CodeKind, data_parts: u32, coding_parts: u32) -> Self {
        CodeRule {
            pattern,
            regex,
            code,
            data_parts,
            coding_parts,
        }
    }

    fn matches(&self, subject: &str) -> bool {
        self.regex.is_match(subject)
    }
}

/// Ordered list of code rules, matched against `"{bucket}/{objectKey}"`.
/// First match wins; read-only once built.
#[derive(Debug)]
pub struct CodesTable {
    rules: Vec<CodeRule>,
}

impl CodesTable {
    pub(crate) fn new(rules: Vec<CodeRule>) -> Self {
        CodesTable { rules }
    }

    pub fn match_for(&self, bucket_name: &str, object_key: &str) -> Result<&CodeRule, HdClientError> {
        let subject = format!("{bucket_name}/{object_key}");
        self.rules
            .iter()
            .find(|rule| rule.matches(&subject))
            .ok_or(HdClientError::ConfigError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, code: CodeKind, k: u32, m: u32) -> CodeRule {
        CodeRule::new(pattern.to_string(), Regex::new(pattern).unwrap(), code, k, m)
    }

    #[test]
    fn first_matching_pattern_wins() {
        let table = CodesTable::new(vec![
            rule("^logs/", CodeKind::Cp, 1, 0),
            rule("^.*$", CodeKind::Rs, 4, 2),
        ]);
        let rule = table.match_for("bucket", "logs/app.log").unwrap();
        assert_eq!(rule.code, CodeKind::Cp);
    }

    #[test]
    fn no_match_is_config_error() {
        let table = CodesTable::new(vec![rule("^logs/", CodeKind::Cp, 1, 0)]);
        let err = table.match_for("bucket", "images/cat.png").unwrap_err();
        assert_eq!(err, HdClientError::ConfigError);
    }
}
