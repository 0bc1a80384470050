//! Line-oriented builder for generated shell scripts.
//!
//! Sections are assembled as an ordered list of lines, so the ordering
//! rules of the environment and teardown sections stay independently
//! testable instead of being buried in one format string.

/// Ordered list of script lines.
#[derive(Debug, Default)]
pub struct Script {
    lines: Vec<String>,
}

impl Script {
    /// Empty script section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line.
    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    /// Append a blank separator line.
    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    /// Append every line of an iterator, in order.
    pub fn extend<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Number of lines collected so far.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no line has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render as newline-separated text with a trailing newline.
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}
