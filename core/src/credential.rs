use std::fmt;

/// Opaque bearer credential handed to an executor at construction.
///
/// The engine never inspects it; `Debug` output is redacted so the token cannot
/// leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let c = Credential::new("ya29.secret");
        assert_eq!(format!("{:?}", c), "Credential(***)");
        assert_eq!(c.expose(), "ya29.secret");
    }

    #[test]
    fn whitespace_token_counts_as_empty() {
        assert!(Credential::new("  ").is_empty());
        assert!(!Credential::new("t").is_empty());
    }
}
