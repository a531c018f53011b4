//! Record codec - the `name:value` line format of a service file
//!
//! One record per line, split on the first `:` so values may contain colons.
//! Blank lines are skipped. A non-blank line without a `:` cannot be mapped to a
//! record and is dropped; [`RecordSet::parse_lenient`] reports those lines so
//! callers can warn about them instead of losing them silently.

use crate::error::{Error, Result};
use std::fmt;

/// Field separator between name and value
pub const SEPARATOR: char = ':';

/// One `name -> value` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub value: String,
}

impl Record {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A line dropped during parsing because it had no separator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number
    pub line_no: usize,
    pub text: String,
}

impl fmt::Display for MalformedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: no '{}' separator", self.line_no, SEPARATOR)
    }
}

/// Ordered records of one service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse file content, silently dropping malformed lines
    pub fn parse(content: &str) -> Self {
        Self::parse_lenient(content).0
    }

    /// Parse file content, returning the dropped lines alongside the records
    ///
    /// Duplicate names are kept as-is; deduplication happens on write.
    pub fn parse_lenient(content: &str) -> (Self, Vec<MalformedLine>) {
        let mut records = Vec::new();
        let mut malformed = Vec::new();

        for (idx, line) in content.split('\n').enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.trim().is_empty() {
                continue;
            }

            match line.split_once(SEPARATOR) {
                Some((name, value)) => records.push(Record::new(name, value)),
                None => malformed.push(MalformedLine {
                    line_no: idx + 1,
                    text: line.to_string(),
                }),
            }
        }

        (Self { records }, malformed)
    }

    /// Render as `name:value` lines, each terminated by `\n`
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&record.name);
            out.push(SEPARATOR);
            out.push_str(&record.value);
            out.push('\n');
        }
        out
    }

    /// Replace every record named `name` with one new record at the end
    pub fn upsert(&mut self, name: &str, value: impl Into<String>) {
        self.records.retain(|r| r.name != name && !r.name.trim().is_empty());
        self.records.push(Record::new(name, value));
    }

    /// Collapse repeated names the way successive writes would: last value wins
    pub fn deduplicated(&self) -> Self {
        let mut out = Self::new();
        for record in &self.records {
            out.upsert(&record.name, record.value.clone());
        }
        out
    }

    /// Remove every record named `name`; returns whether anything was removed
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.name != name);
        self.records.len() != before
    }

    /// First value stored under `name`
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.value.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Check that a name can be written as the first field of a line
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidName("Key cannot be empty".to_string()));
    }

    if let Some(c) = name.chars().find(|c| matches!(c, ':' | '\n' | '\r')) {
        return Err(Error::InvalidName(format!(
            "Invalid character {:?} in key",
            c
        )));
    }

    Ok(())
}

/// Check that a value fits on one line once written in plaintext
pub fn validate_value(value: &str) -> Result<()> {
    if value.contains(['\n', '\r']) {
        return Err(Error::InvalidValue(
            "Value cannot contain line breaks".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> RecordSet {
        pairs.iter().map(|(n, v)| Record::new(*n, *v)).collect()
    }

    #[test]
    fn test_parse_basic() {
        let rs = RecordSet::parse("user:alice\npass:s3cret\n");
        assert_eq!(rs, set(&[("user", "alice"), ("pass", "s3cret")]));
    }

    #[test]
    fn test_parse_splits_on_first_separator() {
        let rs = RecordSet::parse("url:https://example.com:8443/login\n");
        assert_eq!(rs.lookup("url"), Some("https://example.com:8443/login"));
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let rs = RecordSet::parse("\n  \na:1\n\t\nb:2\n\n");
        assert_eq!(rs, set(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_parse_drops_malformed_lines() {
        let rs = RecordSet::parse("noseparatorhere\nk:v\n");
        assert_eq!(rs, set(&[("k", "v")]));
    }

    #[test]
    fn test_parse_lenient_reports_malformed_lines() {
        let (rs, malformed) = RecordSet::parse_lenient("k:v\nnoseparatorhere\n\nbroken too\n");
        assert_eq!(rs.len(), 1);
        assert_eq!(
            malformed,
            vec![
                MalformedLine {
                    line_no: 2,
                    text: "noseparatorhere".to_string()
                },
                MalformedLine {
                    line_no: 4,
                    text: "broken too".to_string()
                },
            ]
        );
        assert_eq!(malformed[0].to_string(), "line 2: no ':' separator");
    }

    #[test]
    fn test_parse_keeps_duplicates() {
        let rs = RecordSet::parse("u:a\nu:b\n");
        assert_eq!(rs.len(), 2);
        assert_eq!(rs.lookup("u"), Some("a"));
    }

    #[test]
    fn test_parse_strips_carriage_returns() {
        let rs = RecordSet::parse("a:1\r\nb:2\r\n");
        assert_eq!(rs, set(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_parse_empty_value() {
        let rs = RecordSet::parse("empty:\n");
        assert_eq!(rs.lookup("empty"), Some(""));
    }

    #[test]
    fn test_serialize() {
        let rs = set(&[("github", "AAA"), ("gitlab", "BBB")]);
        assert_eq!(rs.serialize(), "github:AAA\ngitlab:BBB\n");
        assert_eq!(RecordSet::new().serialize(), "");
    }

    #[test]
    fn test_parse_serialize_roundtrip() {
        let rs = set(&[("z", "last:first"), ("a", "x"), ("m", "")]);
        assert_eq!(RecordSet::parse(&rs.serialize()), rs);
    }

    #[test]
    fn test_upsert_moves_to_end() {
        let mut rs = RecordSet::new();
        rs.upsert("u", "a");
        rs.upsert("other", "x");
        rs.upsert("u", "b");

        assert_eq!(rs.iter().filter(|r| r.name == "u").count(), 1);
        assert_eq!(rs.lookup("u"), Some("b"));
        assert_eq!(rs.names().last(), Some("u"));
        assert_eq!(rs.names().collect::<Vec<_>>(), vec!["other", "u"]);
    }

    #[test]
    fn test_upsert_collapses_duplicates() {
        let mut rs = RecordSet::parse("u:a\nk:1\nu:b\n");
        rs.upsert("u", "c");
        assert_eq!(rs, set(&[("k", "1"), ("u", "c")]));
    }

    #[test]
    fn test_upsert_drops_blank_names() {
        let mut rs = RecordSet::parse(":orphan\nk:1\n");
        rs.upsert("n", "v");
        assert_eq!(rs, set(&[("k", "1"), ("n", "v")]));
    }

    #[test]
    fn test_deduplicated_last_wins() {
        let rs = RecordSet::parse("user:old\npass:x\nuser:new\n");
        let deduped = rs.deduplicated();

        assert_eq!(deduped, set(&[("pass", "x"), ("user", "new")]));
        assert_eq!(rs.len(), 3);
    }

    #[test]
    fn test_remove() {
        let mut rs = RecordSet::parse("github:AAA\ngitlab:BBB\n");
        assert!(rs.remove("github"));
        assert_eq!(rs.serialize(), "gitlab:BBB\n");
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut rs = RecordSet::parse("gitlab:BBB\n");
        assert!(!rs.remove("github"));
        assert_eq!(rs.serialize(), "gitlab:BBB\n");
    }

    #[test]
    fn test_remove_is_exact_match() {
        let mut rs = RecordSet::parse("git:1\ngithub:2\n");
        rs.remove("git");
        assert_eq!(rs.serialize(), "github:2\n");
    }

    #[test]
    fn test_lookup_empty() {
        let rs = RecordSet::parse("");
        assert_eq!(rs.lookup("x"), None);
        assert!(rs.is_empty());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("username").is_ok());
        assert!(validate_name("api key-2.prod").is_ok());

        assert!(matches!(validate_name(""), Err(Error::InvalidName(_))));
        assert!(matches!(validate_name("   "), Err(Error::InvalidName(_))));
        assert!(matches!(validate_name("a:b"), Err(Error::InvalidName(_))));
        assert!(matches!(validate_name("a\nb"), Err(Error::InvalidName(_))));
        assert!(matches!(validate_name("a\r"), Err(Error::InvalidName(_))));
    }

    #[test]
    fn test_validate_value() {
        assert!(validate_value("s3cret:with:colons").is_ok());
        assert!(validate_value("").is_ok());

        assert!(matches!(validate_value("a\nb"), Err(Error::InvalidValue(_))));
        assert!(matches!(validate_value("a\r"), Err(Error::InvalidValue(_))));
    }
}
