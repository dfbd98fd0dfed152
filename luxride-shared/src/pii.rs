use serde::{Deserialize, Serialize};
use std::fmt;

/// Wrapper for contact details (email, phone) that must not show up in logs.
///
/// `Debug` and `Display` only reveal the last two characters. Serialization is
/// transparent because the profile store needs the real value.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T: AsRef<str>> Masked<T> {
    /// Masked rendering, e.g. `***om` for `jane@example.com`
    pub fn hint(&self) -> String {
        let value = self.0.as_ref();
        let chars: Vec<char> = value.chars().collect();
        if chars.len() <= 4 {
            return "***".to_string();
        }
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("***{}", tail)
    }

    pub fn is_empty(&self) -> bool {
        self.0.as_ref().trim().is_empty()
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Masked({})", self.hint())
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hint())
    }
}

impl<T> Masked<T> {
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl From<&str> for Masked<String> {
    fn from(value: &str) -> Self {
        Masked(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_does_not_leak() {
        let email = Masked::from("jane.doe@example.com");
        let rendered = format!("{:?} {}", email, email);

        assert!(!rendered.contains("jane"));
        assert_eq!(rendered, "Masked(***om) ***om");
    }

    #[test]
    fn test_short_values_fully_masked() {
        assert_eq!(Masked::from("555").hint(), "***");
    }

    #[test]
    fn test_serialization_is_transparent() {
        let phone = Masked::from("+1 555 0100");
        let json = serde_json::to_string(&phone).unwrap();
        assert_eq!(json, "\"+1 555 0100\"");

        let back: Masked<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.expose(), "+1 555 0100");
    }
}
