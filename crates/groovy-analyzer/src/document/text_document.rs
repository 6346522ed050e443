use tower_lsp::lsp_types::Url;

/// Snapshot of one open Groovy source document.
///
/// The server negotiates full-content sync, so a document is nothing more
/// than the latest complete text plus the version the client stamped on it.
/// All position work happens downstream on the program tree; the snapshot
/// only has to answer "what is the current text to compile?".
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: Url,
    pub text: String,
    pub version: i32,
}

impl Document {
    pub fn new(uri: Url, text: String, version: i32) -> Self {
        Self { uri, text, version }
    }

    /// Swap in a full replacement text from the client.
    pub fn set_content(&mut self, text: String, version: i32) {
        self.text = text;
        self.version = version;
    }

    /// Whether there is anything worth compiling. Blank sources produce no
    /// diagnostics publication at all.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::new(
            Url::parse("file:///test.groovy").unwrap(),
            text.to_string(),
            1,
        )
    }

    #[test]
    fn set_content_replaces_text_and_version() {
        let mut d = doc("def x = 10");
        d.set_content("def x = 42".to_string(), 7);
        assert_eq!(d.text, "def x = 42");
        assert_eq!(d.version, 7);
    }

    #[test]
    fn blank_detection_ignores_whitespace() {
        assert!(doc("").is_blank());
        assert!(doc("   \n\t \n").is_blank());
        assert!(!doc("def x = 1").is_blank());
    }
}
