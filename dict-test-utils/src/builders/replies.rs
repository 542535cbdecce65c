//! Builder for DICT server reply transcripts

/// Builds the lines a DICT server sends for one reply
///
/// Text blocks are dot-stuffed and terminated with a lone `.`.
///
/// # Examples
///
/// ```rust
/// use dict_test_utils::ReplyBuilder;
///
/// let lines = ReplyBuilder::new()
///     .status(150, "1 definitions retrieved")
///     .definition("cat", "wn", "WordNet", ["cat", "  n 1: feline mammal"])
///     .ok()
///     .build();
/// assert_eq!(lines.len(), 6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReplyBuilder {
    lines: Vec<String>,
}

impl ReplyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a status line
    pub fn status(mut self, code: u16, text: &str) -> Self {
        self.lines.push(format!("{code:03} {text}"));
        self
    }

    /// Append a raw line without any processing
    pub fn raw(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    /// Append a dot-stuffed text block and its terminator
    pub fn text<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            let line = line.as_ref();
            if line.starts_with('.') {
                self.lines.push(format!(".{line}"));
            } else {
                self.lines.push(line.to_string());
            }
        }
        self.lines.push(".".to_string());
        self
    }

    /// Append a `151` header followed by its text block
    pub fn definition<I, S>(self, word: &str, database: &str, description: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.status(151, &format!("\"{word}\" {database} \"{description}\""))
            .text(lines)
    }

    /// Append the `250` completion line
    pub fn ok(self) -> Self {
        self.status(250, "ok")
    }

    pub fn build(self) -> Vec<String> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_dot_stuffed() {
        let lines = ReplyBuilder::new()
            .status(112, "database information follows")
            .text([".hidden", "plain", "."])
            .ok()
            .build();
        assert_eq!(
            lines,
            [
                "112 database information follows",
                "..hidden",
                "plain",
                "..",
                ".",
                "250 ok",
            ]
        );
    }

    #[test]
    fn test_definition_header() {
        let lines = ReplyBuilder::new()
            .definition("cat", "eng-lat", "English-Latin", ["cat", "feles"])
            .build();
        assert_eq!(lines[0], "151 \"cat\" eng-lat \"English-Latin\"");
        assert_eq!(lines.last().map(String::as_str), Some("."));
    }
}
