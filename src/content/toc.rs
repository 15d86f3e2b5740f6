//! Table of contents accumulated while rendering a post

use std::collections::HashSet;

use super::markdown::html_escape;

/// A heading recorded for the table of contents
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Per-render heading state: the ids handed out so far and the TOC entries.
/// A fresh builder is created for every render so nothing carries over
/// between posts.
#[derive(Debug)]
pub struct TocBuilder {
    max_depth: u8,
    used_ids: HashSet<String>,
    entries: Vec<TocEntry>,
}

impl TocBuilder {
    pub fn new(max_depth: u8) -> Self {
        Self {
            max_depth,
            used_ids: HashSet::new(),
            entries: Vec::new(),
        }
    }

    /// Reserve a document-unique anchor id derived from `text`
    pub fn unique_id(&mut self, text: &str) -> String {
        let mut base = slug::slugify(text);
        if base.is_empty() {
            base = "section".to_string();
        }
        self.reserve(base)
    }

    /// Reserve an id, appending `_1`, `_2`, ... if it is taken
    pub fn reserve(&mut self, base: String) -> String {
        let mut candidate = base.clone();
        let mut n = 1;
        while self.used_ids.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        self.used_ids.insert(candidate.clone());
        candidate
    }

    /// Record a heading; headings deeper than `max_depth` are not listed
    pub fn push(&mut self, level: u8, id: &str, text: &str) {
        if level <= self.max_depth {
            self.entries.push(TocEntry {
                level,
                id: id.to_string(),
                text: text.trim().to_string(),
            });
        }
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    /// Render nested lists mirroring heading levels. Empty if no headings.
    pub fn to_html(&self) -> String {
        let Some(first) = self.entries.first() else {
            return String::new();
        };

        let mut html = String::from("<div class=\"toc\">\n<ul>\n");
        // Levels of the currently open lists
        let mut open: Vec<u8> = vec![first.level];

        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                let current = open.last().copied().unwrap_or(entry.level);
                if entry.level > current {
                    html.push_str("\n<ul>\n");
                    open.push(entry.level);
                } else {
                    html.push_str("</li>\n");
                    while open.len() > 1 && open.last().is_some_and(|&l| entry.level < l) {
                        // Shallower than this list but deeper than its parent:
                        // the entry joins this list
                        if entry.level > open[open.len() - 2] {
                            if let Some(last) = open.last_mut() {
                                *last = entry.level;
                            }
                            break;
                        }
                        open.pop();
                        html.push_str("</ul>\n</li>\n");
                    }
                }
            }
            html.push_str(&format!(
                "<li><a href=\"#{}\">{}</a>",
                html_escape(&entry.id),
                html_escape(&entry.text)
            ));
        }

        html.push_str("</li>\n");
        while open.len() > 1 {
            open.pop();
            html.push_str("</ul>\n</li>\n");
        }
        html.push_str("</ul>\n</div>\n");
        html
    }
}
