#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeminiModel {
    Flash15,
    Flash20,
    Custom(String),
}

impl Default for GeminiModel {
    fn default() -> Self {
        Self::Flash15
    }
}

impl GeminiModel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Flash15 => "gemini-1.5-flash",
            Self::Flash20 => "gemini-2.0-flash",
            Self::Custom(name) => name,
        }
    }

    /// Accepts bare ids and the `models/` resource form.
    pub fn parse(s: &str) -> Self {
        let name = s.trim();
        let name = name.strip_prefix("models/").unwrap_or(name);
        match name {
            "gemini-1.5-flash" => Self::Flash15,
            "gemini-2.0-flash" => Self::Flash20,
            other => Self::Custom(other.to_string()),
        }
    }
}
