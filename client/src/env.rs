use std::collections::HashMap;

/// Source of ambient configuration values.
///
/// The process environment is the normal source; tests hand in a map so they
/// never touch global state.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;

    /// Trimmed value, with blank treated as absent.
    fn get_optional(&self, name: &str) -> Option<String> {
        self.var(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Positive integer value, or `fallback` when absent or unparsable.
    fn get_positive_u32(&self, name: &str, fallback: u32) -> u32 {
        self.get_optional(name)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(fallback)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Builds an in-memory env from `(name, value)` pairs.
pub fn env_map<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_count_as_absent() {
        let env = env_map([("A", "  "), ("B", " value ")]);
        assert_eq!(env.get_optional("A"), None);
        assert_eq!(env.get_optional("B").as_deref(), Some("value"));
        assert_eq!(env.get_optional("C"), None);
    }

    #[test]
    fn positive_u32_falls_back() {
        let env = env_map([("R1", "25"), ("R2", "0"), ("R3", "abc")]);
        assert_eq!(env.get_positive_u32("R1", 10), 25);
        assert_eq!(env.get_positive_u32("R2", 10), 10);
        assert_eq!(env.get_positive_u32("R3", 10), 10);
        assert_eq!(env.get_positive_u32("R4", 7), 7);
    }
}
