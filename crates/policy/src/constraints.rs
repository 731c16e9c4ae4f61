pub use dicesched_core::models::{Constraint, ConstraintOp};

/// `.*\b<tag>\b.*` — the tag as a whole word anywhere in the attribute.
pub fn tag_word(tag: &str) -> String {
    format!(r".*\b{}\b.*", regex::escape(tag))
}

/// `.*\b<prefix>[^,]+\b.*` — any tag of the prefix's family. `[^,]+`
/// keeps the match inside one comma-separated entry.
pub fn tag_prefix(prefix: &str) -> String {
    format!(r".*\b{}[^,]+\b.*", regex::escape(prefix))
}
