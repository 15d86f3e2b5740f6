//! Front-matter parsing

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;

use super::PostDate;

/// A scalar header value coerced to a string. Numbers and booleans are
/// stringified; null becomes `None`.
struct Scalar(Option<String>);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ScalarVisitor;

        impl<'de> Visitor<'de> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string, number or boolean")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Scalar, E> {
                Ok(Scalar(Some(value.to_string())))
            }

            fn visit_string<E: de::Error>(self, value: String) -> Result<Scalar, E> {
                Ok(Scalar(Some(value)))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Scalar, E> {
                Ok(Scalar(Some(value.to_string())))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Scalar, E> {
                Ok(Scalar(Some(value.to_string())))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Scalar, E> {
                Ok(Scalar(Some(value.to_string())))
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<Scalar, E> {
                Ok(Scalar(Some(value.to_string())))
            }

            fn visit_none<E: de::Error>(self) -> Result<Scalar, E> {
                Ok(Scalar(None))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Scalar, E> {
                Ok(Scalar(None))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(|s| s.0)
}

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(Scalar(item)) = seq.next_element::<Scalar>()? {
                if let Some(item) = item {
                    vec.push(item);
                }
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Header fields as deserialized, before the date is classified.
/// `D` is the header format's own value type.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawHeader<D> {
    #[serde(deserialize_with = "scalar_string")]
    title: Option<String>,
    date: Option<D>,
    #[serde(deserialize_with = "string_or_vec")]
    tags: Vec<String>,
    #[serde(deserialize_with = "scalar_string")]
    excerpt: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    author: Option<String>,
}

impl<D> Default for RawHeader<D> {
    fn default() -> Self {
        Self {
            title: None,
            date: None,
            tags: Vec::new(),
            excerpt: None,
            author: None,
        }
    }
}

impl<D> RawHeader<D> {
    fn into_front_matter(self, classify: impl FnOnce(Option<&D>) -> PostDate) -> FrontMatter {
        FrontMatter {
            date: classify(self.date.as_ref()),
            title: self.title,
            tags: self.tags,
            excerpt: self.excerpt,
            author: self.author,
        }
    }
}

/// Front-matter data from a post. Unrecognized keys are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: PostDate,
    pub tags: Vec<String>,
    pub excerpt: Option<String>,
    pub author: Option<String>,
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            title: None,
            date: PostDate::Absent,
            tags: Vec::new(),
            excerpt: None,
            author: None,
        }
    }
}

impl FrontMatter {
    /// Parse front-matter from content string.
    /// Returns (front_matter, remaining_content). A missing or malformed
    /// header yields the default front-matter.
    pub fn parse(content: &str) -> (Self, &str) {
        let content = content.trim_start();

        // YAML front-matter (---)
        if content.starts_with("---") {
            return Self::parse_yaml(content);
        }

        // TOML front-matter (+++)
        if content.starts_with("+++") {
            return Self::parse_toml(content);
        }

        // JSON front-matter (;;; or {"key":)
        if content.starts_with(";;;") || content.starts_with('{') {
            return Self::parse_json(content);
        }

        // No front-matter found
        (FrontMatter::default(), content)
    }

    fn parse_yaml(content: &str) -> (Self, &str) {
        let Some((yaml_content, remaining)) = split_block(content, "---") else {
            // No closing ---, treat as no front-matter
            return (FrontMatter::default(), content);
        };

        if yaml_content.trim().is_empty() {
            return (FrontMatter::default(), remaining);
        }

        // A leading `---` is also a markdown thematic break. Only treat the block
        // as front-matter if some line looks like `key: value`.
        if !has_yaml_structure(yaml_content) {
            return (FrontMatter::default(), content);
        }

        // serde_yaml drops scalar style, and a quoted date is never a timestamp
        let date_quoted = has_quoted_date(yaml_content);

        match serde_yaml::from_str::<RawHeader<serde_yaml::Value>>(yaml_content) {
            Ok(raw) => {
                let fm = raw.into_front_matter(|value| match value {
                    Some(serde_yaml::Value::String(s)) if date_quoted => PostDate::Raw(s.clone()),
                    value => PostDate::from_yaml(value),
                });
                (fm, remaining)
            }
            Err(e) => {
                tracing::warn!("Failed to parse YAML front-matter, using defaults: {}", e);
                (FrontMatter::default(), remaining)
            }
        }
    }

    fn parse_toml(content: &str) -> (Self, &str) {
        let Some((toml_content, remaining)) = split_block(content, "+++") else {
            return (FrontMatter::default(), content);
        };

        match toml::from_str::<RawHeader<toml::Value>>(toml_content) {
            Ok(raw) => (raw.into_front_matter(PostDate::from_toml), remaining),
            Err(e) => {
                tracing::warn!("Failed to parse TOML front-matter, using defaults: {}", e);
                (FrontMatter::default(), remaining)
            }
        }
    }

    fn parse_json(content: &str) -> (Self, &str) {
        // JSON front-matter wrapped in ;;;
        if let Some(rest) = content.strip_prefix(";;;") {
            let Some(end_pos) = rest.find(";;;") else {
                return (FrontMatter::default(), content);
            };
            let json_content = rest[..end_pos].trim();
            let remaining = rest[end_pos + 3..].trim_start_matches(['\n', '\r']);
            // The wrapped form may omit the outer braces
            let json_content = if json_content.starts_with('{') {
                json_content.to_string()
            } else {
                format!("{{{}}}", json_content)
            };
            let fm = Self::from_json(&json_content).unwrap_or_default();
            return (fm, remaining);
        }

        // A JSON object at the start of the file; find the matching closing brace
        let mut depth = 0;
        let mut in_string = false;
        let mut escaped = false;
        let mut end_pos = 0;
        for (i, c) in content.char_indices() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end_pos = i + 1;
                        break;
                    }
                }
                _ => {}
            }
        }

        if end_pos == 0 {
            return (FrontMatter::default(), content);
        }

        // A body that merely starts with `{` is kept intact
        match Self::from_json(&content[..end_pos]) {
            Some(fm) => (fm, content[end_pos..].trim_start_matches(['\n', '\r'])),
            None => (FrontMatter::default(), content),
        }
    }

    fn from_json(json_content: &str) -> Option<Self> {
        match serde_json::from_str::<RawHeader<serde_json::Value>>(json_content) {
            Ok(raw) => Some(raw.into_front_matter(PostDate::from_json)),
            Err(e) => {
                tracing::warn!("Failed to parse JSON front-matter, using defaults: {}", e);
                None
            }
        }
    }
}

/// Split `<delim>\n...\n<delim>\nbody` into the header text and the body
fn split_block<'a>(content: &'a str, delim: &str) -> Option<(&'a str, &'a str)> {
    let rest = content.strip_prefix(delim)?;
    let rest = rest.trim_start_matches(['\n', '\r']);

    // An empty header closes immediately
    if let Some(body) = rest.strip_prefix(delim) {
        return Some(("", body.trim_start_matches(['\n', '\r'])));
    }

    let closing = format!("\n{}", delim);
    let end_pos = rest.find(&closing)?;
    let header = &rest[..end_pos];
    let remaining = rest[end_pos + closing.len()..].trim_start_matches(['\n', '\r']);
    Some((header, remaining))
}

/// Whether the top-level `date:` value is a single or double quoted scalar
fn has_quoted_date(yaml_content: &str) -> bool {
    yaml_content.lines().any(|line| {
        line.strip_prefix("date")
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(str::trim_start)
            .is_some_and(|value| value.starts_with(['"', '\'']))
    })
}

fn has_yaml_structure(yaml_content: &str) -> bool {
    yaml_content.lines().any(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }
        // `key:` followed by a space or end of line, where the key is a simple
        // identifier and not a URL scheme
        let Some(colon_pos) = trimmed.find(':') else {
            return false;
        };
        let before_colon = &trimmed[..colon_pos];
        let is_valid_key = !before_colon.is_empty()
            && before_colon
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !matches!(before_colon, "http" | "https" | "ftp");
        let after_colon = &trimmed[colon_pos + 1..];
        is_valid_key && (after_colon.is_empty() || after_colon.starts_with(' '))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Hello World
date: 2024-01-15 10:30:00
tags:
  - rust
  - blog
author: Jane
excerpt: A first post
layout: post
---

This is the content.
"#;

        let (fm, remaining) = FrontMatter::parse(content);
        assert_eq!(fm.title, Some("Hello World".to_string()));
        assert_eq!(fm.tags, vec!["rust", "blog"]);
        assert_eq!(fm.author, Some("Jane".to_string()));
        assert_eq!(fm.excerpt, Some("A first post".to_string()));
        assert_eq!(fm.date.canonical(), "2024-01-15T10:30:00");
        assert_eq!(remaining, "This is the content.\n");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let (fm, remaining) = FrontMatter::parse("---\ntitle: Only a title\n---\nBody");
        assert_eq!(fm.title, Some("Only a title".to_string()));
        assert_eq!(fm.date, PostDate::Absent);
        assert!(fm.tags.is_empty());
        assert_eq!(fm.author, None);
        assert_eq!(remaining, "Body");
    }

    #[test]
    fn test_no_frontmatter() {
        let (fm, remaining) = FrontMatter::parse("# Just markdown\n\nText.");
        assert_eq!(fm, FrontMatter::default());
        assert_eq!(remaining, "# Just markdown\n\nText.");
    }

    #[test]
    fn test_malformed_yaml_uses_defaults() {
        let content = "---\ntitle: [unclosed\ntags: x\n---\nBody text";
        let (fm, remaining) = FrontMatter::parse(content);
        assert_eq!(fm, FrontMatter::default());
        assert_eq!(remaining, "Body text");
    }

    #[test]
    fn test_unclosed_yaml_is_not_frontmatter() {
        let content = "---\ntitle: Never closed\n\nBody";
        let (fm, remaining) = FrontMatter::parse(content);
        assert_eq!(fm.title, None);
        assert_eq!(remaining, content);
    }

    #[test]
    fn test_scalar_coercion() {
        let content = "---\ntitle: 2024\nauthor: true\ntags: [1, rust, ~]\n---\n";
        let (fm, _) = FrontMatter::parse(content);
        assert_eq!(fm.title, Some("2024".to_string()));
        assert_eq!(fm.author, Some("true".to_string()));
        assert_eq!(fm.tags, vec!["1", "rust"]);
    }

    #[test]
    fn test_quoted_date_stays_raw() {
        let (fm, _) = FrontMatter::parse("---\ndate: \"2024-01-15 10:30:00\"\n---\n");
        assert_eq!(fm.date, PostDate::Raw("2024-01-15 10:30:00".to_string()));
        assert_eq!(fm.date.canonical(), "2024-01-15 10:30:00");

        let (fm, _) = FrontMatter::parse("---\ndate: '2024-01-05'\n---\n");
        assert_eq!(fm.date, PostDate::Raw("2024-01-05".to_string()));

        // Only the top-level key counts
        let (fm, _) = FrontMatter::parse(
            "---\ndate: 2024-01-15 10:30:00\nextra:\n  date: \"x\"\n---\n",
        );
        assert_eq!(fm.date.canonical(), "2024-01-15T10:30:00");
    }

    #[test]
    fn test_parse_single_string_tags() {
        let content = r#"---
title: Single Tag Post
date: 2024-01-15
tags: Notes
---

Content here.
"#;

        let (fm, _) = FrontMatter::parse(content);
        assert_eq!(fm.tags, vec!["Notes"]);
        assert_eq!(
            fm.date,
            PostDate::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
    }

    #[test]
    fn test_parse_toml_frontmatter() {
        let content = "+++\ntitle = \"Toml Post\"\ndate = 2024-03-01T08:00:00\ntags = [\"infra\"]\n+++\n\nBody";
        let (fm, remaining) = FrontMatter::parse(content);
        assert_eq!(fm.title, Some("Toml Post".to_string()));
        assert_eq!(fm.date.canonical(), "2024-03-01T08:00:00");
        assert_eq!(fm.tags, vec!["infra"]);
        assert_eq!(remaining, "Body");
    }

    #[test]
    fn test_parse_json_frontmatter() {
        let content = r#"{"title": "Test {Post}", "tags": ["a", "b"], "date": "2024-02-01"}

This is content.
"#;

        let (fm, remaining) = FrontMatter::parse(content);
        assert_eq!(fm.title, Some("Test {Post}".to_string()));
        assert_eq!(fm.tags, vec!["a", "b"]);
        assert_eq!(fm.date, PostDate::Raw("2024-02-01".to_string()));
        assert!(remaining.starts_with("This is content."));
    }

    #[test]
    fn test_parse_wrapped_json_frontmatter() {
        let content = ";;;\n\"title\": \"Wrapped\"\n;;;\nBody";
        let (fm, remaining) = FrontMatter::parse(content);
        assert_eq!(fm.title, Some("Wrapped".to_string()));
        assert_eq!(remaining, "Body");
    }

    #[test]
    fn test_brace_body_is_not_frontmatter() {
        let content = "{not json} at the start of a paragraph";
        let (fm, remaining) = FrontMatter::parse(content);
        assert_eq!(fm, FrontMatter::default());
        assert_eq!(remaining, content);
    }

    #[test]
    fn test_markdown_separator_not_yaml() {
        // Content that uses --- as a thematic break, not front-matter
        let content = r#"
---

Some random text with markdown lists:
- Item 1
- Item 2

---
More content here.
"#;

        let (fm, remaining) = FrontMatter::parse(content);
        assert_eq!(fm.title, None);
        assert!(remaining.contains("Some random text"));
    }

    #[test]
    fn test_content_with_url_not_yaml() {
        let content = r#"
---

Check out https://example.com/path and http://test.com

---
More content.
"#;

        let (fm, remaining) = FrontMatter::parse(content);
        assert_eq!(fm.title, None);
        assert!(remaining.contains("https://example.com"));
    }
}
