//! Markdown rendering with syntax highlighting and heading anchors

use anyhow::Result;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use super::toc::TocBuilder;
use crate::config::{HighlightConfig, TocConfig};

/// Output of rendering one post body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    pub html: String,
    /// Table of contents, empty when the body has no headings
    pub toc: String,
}

/// A markdown rendering capability.
///
/// Implementations are shared across concurrent requests, so `render` must not
/// keep state from one call to the next.
pub trait Renderer: Send + Sync {
    fn render(&self, markdown: &str) -> Result<Rendered>;
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme: Theme,
    css_class: String,
    line_numbers: bool,
    toc_depth: u8,
}

/// A heading whose inline events are being collected
struct OpenHeading<'a> {
    level: HeadingLevel,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    events: Vec<Event<'a>>,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options(&HighlightConfig::default(), &TocConfig::default())
    }

    /// Create with custom settings
    pub fn with_options(highlight: &HighlightConfig, toc: &TocConfig) -> Self {
        let mut theme_set = ThemeSet::load_defaults();
        let theme = match theme_set.themes.remove(&highlight.theme) {
            Some(theme) => theme,
            None => {
                tracing::warn!(
                    "Unknown highlight theme {:?}, using a bundled default",
                    highlight.theme
                );
                theme_set.themes.into_values().next().unwrap_or_default()
            }
        };

        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
            css_class: highlight.css_class.clone(),
            line_numbers: highlight.line_number,
            toc_depth: toc.max_depth,
        }
    }

    fn options() -> Options {
        // Front-matter is stripped before rendering, so no metadata blocks
        Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_DEFINITION_LIST
            | Options::ENABLE_GFM
    }

    fn render_markdown(&self, markdown: &str) -> Rendered {
        let mut toc = TocBuilder::new(self.toc_depth);
        let mut events: Vec<Event> = Vec::new();
        let mut heading: Option<OpenHeading> = None;
        let mut code_block: Option<Option<String>> = None;
        let mut code_block_content = String::new();

        for event in Parser::new_ext(markdown, Self::options()) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    code_block = Some(match kind {
                        CodeBlockKind::Fenced(lang) => {
                            // Only the first word of the info string names the language
                            let lang = lang.split_whitespace().next().unwrap_or("");
                            (!lang.is_empty()).then(|| lang.to_string())
                        }
                        CodeBlockKind::Indented => None,
                    });
                    code_block_content.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let lang = code_block.take().flatten();
                    let block = match lang {
                        Some(lang) => self.highlight_code(&code_block_content, &lang),
                        None => format!(
                            r#"<div class="{}"><pre><code>{}</code></pre></div>"#,
                            self.css_class,
                            html_escape(&code_block_content)
                        ),
                    };
                    events.push(Event::Html(CowStr::from(block)));
                }
                Event::Text(text) if code_block.is_some() => {
                    code_block_content.push_str(&text);
                }
                Event::Start(Tag::Heading {
                    level, id, classes, ..
                }) => {
                    heading = Some(OpenHeading {
                        level,
                        id,
                        classes,
                        events: Vec::new(),
                    });
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(open) = heading.take() {
                        events.push(Event::Html(CowStr::from(Self::finish_heading(
                            open, &mut toc,
                        ))));
                    }
                }
                event => match heading.as_mut() {
                    Some(open) => open.events.push(event),
                    None => events.push(event),
                },
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Rendered {
            html: html_output,
            toc: toc.to_html(),
        }
    }

    /// Emit a heading with an anchor id and record it in the TOC
    fn finish_heading(open: OpenHeading, toc: &mut TocBuilder) -> String {
        let level = open.level as u8;

        let text: String = open
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Text(t) | Event::Code(t) => Some(t.as_ref()),
                Event::SoftBreak | Event::HardBreak => Some(" "),
                _ => None,
            })
            .collect();

        let id = match open.id {
            Some(explicit) => toc.reserve(explicit.to_string()),
            None => toc.unique_id(&text),
        };
        toc.push(level, &id, &text);

        let mut inner = String::new();
        html::push_html(&mut inner, open.events.into_iter());

        let class_attr = if open.classes.is_empty() {
            String::new()
        } else {
            let classes: Vec<&str> = open.classes.iter().map(|c| c.as_ref()).collect();
            format!(r#" class="{}""#, html_escape(&classes.join(" ")))
        };

        format!(
            "<h{level} id=\"{}\"{class_attr}>{inner}</h{level}>\n",
            html_escape(&id)
        )
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        match highlighted_html_for_string(code, &self.syntax_set, syntax, &self.theme) {
            Ok(highlighted) => {
                if self.line_numbers {
                    self.add_line_numbers(&highlighted, lang)
                } else {
                    format!(
                        r#"<div class="{} language-{}">{}</div>"#,
                        self.css_class,
                        html_escape(lang),
                        highlighted
                    )
                }
            }
            Err(e) => {
                tracing::debug!("Highlighting failed for {:?}: {}", lang, e);
                format!(
                    r#"<div class="{} language-{}"><pre><code>{}</code></pre></div>"#,
                    self.css_class,
                    html_escape(lang),
                    html_escape(code)
                )
            }
        }
    }

    /// Add line numbers to highlighted code
    fn add_line_numbers(&self, code: &str, lang: &str) -> String {
        let lines: Vec<&str> = code.lines().collect();

        let gutter = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"<div class="{} language-{}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table></div>"#,
            self.css_class,
            html_escape(lang),
            gutter,
            lines.join("\n")
        )
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> Result<Rendered> {
        Ok(self.render_markdown(markdown))
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple HTML escaping
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
