//! Rendering of search results.
//!
//! `ResultView` is the one view model; the terminal, HTML and JSON outputs
//! are all derived from it. The answer is always treated as plain text.

use serde::Serialize;

use crate::api::SearchResult;
use crate::orchestrator::RequestState;

pub const LINK_TARGET: &str = "_blank";
pub const LINK_REL: &str = "noopener noreferrer";
pub const LOADING_MESSAGE: &str = "Searching...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLink {
    pub href: String,
    pub target: &'static str,
    pub rel: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultView {
    pub answer: String,
    /// None rather than an empty list when there is nothing to cite.
    pub sources: Option<Vec<SourceLink>>,
}

impl ResultView {
    pub fn new(result: &SearchResult) -> Self {
        let sources = if result.sources.is_empty() {
            None
        } else {
            Some(
                result
                    .sources
                    .iter()
                    .map(|href| SourceLink {
                        href: href.clone(),
                        target: LINK_TARGET,
                        rel: LINK_REL,
                    })
                    .collect(),
            )
        };
        Self {
            answer: result.answer.clone(),
            sources,
        }
    }

    pub fn link_count(&self) -> usize {
        self.sources.as_ref().map_or(0, Vec::len)
    }

    pub fn to_terminal(&self) -> String {
        let mut output = String::new();
        output.push_str(&self.answer);
        output.push('\n');

        if let Some(sources) = &self.sources {
            output.push_str("\nSources:\n");
            for (i, link) in sources.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, link.href));
            }
        }
        output
    }

    pub fn to_html(&self) -> String {
        let mut html = String::new();
        html.push_str(r#"<div class="result-card">"#);
        html.push_str(&format!(
            r#"<div class="answer">{}</div>"#,
            escape_html(&self.answer)
        ));

        if let Some(sources) = &self.sources {
            html.push_str(r#"<div class="sources"><h4>Sources:</h4><ol>"#);
            for link in sources {
                let href = escape_html(&link.href);
                html.push_str(&format!(
                    r#"<li><a href="{href}" target="{}" rel="{}">{href}</a></li>"#,
                    link.target, link.rel
                ));
            }
            html.push_str("</ol></div>");
        }
        html.push_str("</div>");
        html
    }

    pub fn to_json(&self, query: &str) -> String {
        #[derive(Serialize)]
        struct JsonOutput<'a> {
            query: &'a str,
            answer: &'a str,
            sources: Vec<&'a str>,
        }

        let output = JsonOutput {
            query,
            answer: &self.answer,
            sources: self
                .sources
                .iter()
                .flatten()
                .map(|l| l.href.as_str())
                .collect(),
        };
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Terminal rendering of whatever the orchestrator currently holds.
pub fn render_state_terminal(state: &RequestState) -> Option<String> {
    match state {
        RequestState::Idle => None,
        RequestState::Loading => Some(LOADING_MESSAGE.to_string()),
        RequestState::Succeeded(result) => Some(ResultView::new(result).to_terminal()),
        RequestState::Failed(message) => Some(format!("Error: {message}")),
    }
}

/// HTML fragment for the result area below the search form.
pub fn render_state_html(state: &RequestState) -> String {
    match state {
        RequestState::Idle => String::new(),
        RequestState::Loading => {
            format!(r#"<div class="loading-message">{LOADING_MESSAGE}</div>"#)
        }
        RequestState::Succeeded(result) => ResultView::new(result).to_html(),
        RequestState::Failed(message) => format!(
            r#"<div class="error-message">{}</div>"#,
            escape_html(message)
        ),
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
