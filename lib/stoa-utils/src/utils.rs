use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaseInsensitiveString(String);

impl From<&str> for CaseInsensitiveString {
    fn from(value: &str) -> Self {
        Self(value.to_lowercase())
    }
}

impl From<String> for CaseInsensitiveString {
    fn from(value: String) -> Self {
        Self(value.to_lowercase())
    }
}

impl std::fmt::Display for CaseInsensitiveString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn log_internal_error(error: impl std::fmt::Display) {
    tracing::error!("{:#}", error);
}

#[cfg(test)]
mod tests {
    use super::CaseInsensitiveString;

    #[test]
    fn compares_ignoring_case() {
        let a = CaseInsensitiveString::from("Content-Length");
        let b = CaseInsensitiveString::from("content-length");
        assert_eq!(a, b);
    }
}
