/// The field labels a definition block can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLabel {
    Type,
    Default,
    Example,
    DeclaredBy,
}

/// Classify a marker by its trimmed text. Matching is exact.
pub fn classify(marker: &str) -> Option<FieldLabel> {
    match marker.trim() {
        "Type:" => Some(FieldLabel::Type),
        "Default:" => Some(FieldLabel::Default),
        "Example:" => Some(FieldLabel::Example),
        "Declared by:" => Some(FieldLabel::DeclaredBy),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_labels() {
        assert_eq!(classify("Type:"), Some(FieldLabel::Type));
        assert_eq!(classify("Default:"), Some(FieldLabel::Default));
        assert_eq!(classify("Example:"), Some(FieldLabel::Example));
        assert_eq!(classify("Declared by:"), Some(FieldLabel::DeclaredBy));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(classify("  Type:\n"), Some(FieldLabel::Type));
    }

    #[test]
    fn no_fuzzy_matching() {
        assert_eq!(classify("Type"), None);
        assert_eq!(classify("type:"), None);
        assert_eq!(classify("Declared By:"), None);
        assert_eq!(classify("Note:"), None);
        assert_eq!(classify(""), None);
    }
}
