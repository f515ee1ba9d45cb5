/// One element of a message reported via [`crate::Report::message`].
///
/// The original `report.py`/`reporter.py` pair passes `*msg_elements`,
/// documented as "strings or lists (e.g. of targets), which can be
/// specially formatted". Target rendering is out of this crate's scope
/// (§1's "target-graph loading" is an external collaborator), so this
/// stays a two-variant enum rather than inventing a target type: plain
/// text, or a named list of opaque labels a caller already rendered to
/// strings (e.g. target ids).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageElement {
    /// Plain text.
    Text(String),
    /// A labelled list of opaque strings, e.g. target ids.
    List(Vec<String>),
}

impl MessageElement {
    /// Render to plain text the way `ConsoleReporter` formats a message.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(", "),
        }
    }
}

impl From<&str> for MessageElement {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MessageElement {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}
