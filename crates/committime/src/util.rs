/// Pluralized count expressions for log messages, e.g., "1 namespace" or "7 namespaces".
pub struct Counted<'a> {
    singular: &'a str,
    count: usize,
}

impl<'a> Counted<'a> {
    /// Create a new `Counted` value with the given count and singular form, which is pluralized by
    /// adding an `s`.
    pub fn regular(count: usize, singular: &'a str) -> Self {
        Counted { singular, count }
    }
}

impl<'a> std::fmt::Display for Counted<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 1 {
            write!(f, "1 {}", self.singular)
        } else {
            write!(f, "{} {}s", self.count, self.singular)
        }
    }
}

/// An error followed by each of its causes, e.g. "lookup failed: connect error: refused".
///
/// A cause whose message already appears in the text so far is skipped, since many errors
/// repeat their source in their own message.
pub struct ErrorChain<'a>(pub &'a dyn std::error::Error);

impl<'a> std::fmt::Display for ErrorChain<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut text = self.0.to_string();
        let mut cause = self.0.source();
        while let Some(e) = cause {
            let message = e.to_string();
            if !text.contains(&message) {
                text.push_str(": ");
                text.push_str(&message);
            }
            cause = e.source();
        }
        f.write_str(&text)
    }
}
