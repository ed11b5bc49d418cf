//! Cross-system scenarios
