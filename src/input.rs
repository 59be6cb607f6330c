pub const PLACEHOLDER: &str = "Ask your question...";

/// Text buffer plus submit rule for the search box.
///
/// `submit` only fires the callback when the buffer has something besides
/// whitespace, and passes the trimmed text. The buffer is left as typed so
/// the user can tweak and resubmit. While `busy` is set every edit and submit
/// is ignored.
pub struct QueryInput<F>
where
    F: FnMut(String),
{
    buffer: String,
    busy: bool,
    on_search: F,
}

impl<F> QueryInput<F>
where
    F: FnMut(String),
{
    pub fn new(on_search: F) -> Self {
        Self {
            buffer: String::new(),
            busy: false,
            on_search,
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Driven by whoever owns the request state, never by the user.
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// Replace the buffer. Returns false when the input is disabled.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        if self.busy {
            return false;
        }
        self.buffer = text.into();
        true
    }

    pub fn push_char(&mut self, c: char) -> bool {
        if self.busy {
            return false;
        }
        self.buffer.push(c);
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.buffer.pop().is_some()
    }

    /// Returns whether the callback fired.
    pub fn submit(&mut self) -> bool {
        if self.busy {
            return false;
        }
        match normalize_query(&self.buffer) {
            Some(query) => {
                (self.on_search)(query.to_string());
                true
            }
            None => false,
        }
    }

    pub fn submit_label(&self) -> &'static str {
        submit_label(self.busy)
    }
}

/// The trimmed query, or None if there is nothing to search for.
pub fn normalize_query(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

pub fn submit_label(busy: bool) -> &'static str {
    if busy { "Searching..." } else { "Search" }
}
