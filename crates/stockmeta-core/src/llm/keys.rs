//! API key sorting and rotation.
//!
//! Keys pasted by the user are sorted to a provider by prefix. The active
//! provider's keys form a ring that advances whenever a key is rejected or
//! rate limited.

use crate::config::LlmConfig;
use crate::error::ConfigError;
use crate::types::ProviderKind;

use super::provider::resolve_env_var;

/// Keys grouped by provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    pub gemini: Vec<String>,
    pub openai: Vec<String>,
}

impl KeySet {
    /// Parse one key per line, sorting each by prefix.
    ///
    /// `sk-` keys go to OpenAI, `AIza` keys to Gemini. Blank lines are
    /// skipped; unrecognized keys are logged (first 10 characters only) and
    /// dropped.
    pub fn from_lines(text: &str) -> Self {
        let mut set = Self::default();
        for line in text.lines() {
            set.add(line);
        }
        set
    }

    /// Start from the keys listed in the config.
    ///
    /// `${ENV}` references are resolved first. Each key is then sorted by
    /// prefix like any other key, whichever section it was listed under.
    pub fn from_config(config: &LlmConfig) -> Self {
        let mut set = Self::default();
        for raw in config.gemini.api_keys.iter().chain(&config.openai.api_keys) {
            if let Some(key) = resolve_env_var(raw) {
                set.add(&key);
            }
        }
        set
    }

    /// Add one key by prefix. Returns false when the key was not recognized.
    pub fn add(&mut self, raw: &str) -> bool {
        let key = raw.trim();
        if key.is_empty() {
            return false;
        }
        let target = match classify_key(key) {
            Some(ProviderKind::OpenAi) => &mut self.openai,
            Some(ProviderKind::Gemini) => &mut self.gemini,
            None => {
                let shown: String = key.chars().take(10).collect();
                tracing::warn!(
                    "Key '{shown}...' is not recognized as a Gemini or OpenAI key; ignoring it"
                );
                return false;
            }
        };
        if !target.iter().any(|k| k == key) {
            target.push(key.to_string());
        }
        true
    }

    /// Append all keys from another set, skipping duplicates.
    pub fn extend(&mut self, other: KeySet) {
        for key in other.gemini {
            if !self.gemini.contains(&key) {
                self.gemini.push(key);
            }
        }
        for key in other.openai {
            if !self.openai.contains(&key) {
                self.openai.push(key);
            }
        }
    }

    /// The keys for one provider.
    pub fn for_provider(&self, kind: ProviderKind) -> &[String] {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::OpenAi => &self.openai,
        }
    }

    /// Build the rotating ring for the selected provider.
    pub fn into_ring(self, kind: ProviderKind) -> Result<KeyRing, ConfigError> {
        let keys = match kind {
            ProviderKind::Gemini => self.gemini,
            ProviderKind::OpenAi => self.openai,
        };
        KeyRing::new(keys).ok_or_else(|| ConfigError::NoApiKeys {
            provider: kind.display_name().to_string(),
        })
    }
}

/// Provider a key belongs to, by prefix.
pub fn classify_key(key: &str) -> Option<ProviderKind> {
    if key.starts_with("sk-") {
        Some(ProviderKind::OpenAi)
    } else if key.starts_with("AIza") {
        Some(ProviderKind::Gemini)
    } else {
        None
    }
}

/// Short, log-safe form of a key.
pub fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(5).collect();
    format!("{prefix}...")
}

/// Non-empty list of keys with a cursor.
///
/// The cursor survives across images, so a key that was rotated out while
/// annotating one image is not tried first on the next.
#[derive(Debug, Clone)]
pub struct KeyRing {
    keys: Vec<String>,
    cursor: usize,
}

impl KeyRing {
    /// Returns `None` for an empty list.
    pub fn new(keys: Vec<String>) -> Option<Self> {
        if keys.is_empty() {
            None
        } else {
            Some(Self { keys, cursor: 0 })
        }
    }

    pub fn current(&self) -> &str {
        &self.keys[self.cursor]
    }

    pub fn index(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Advance to the next key, wrapping around. Returns the new index.
    pub fn rotate(&mut self) -> usize {
        self.cursor = (self.cursor + 1) % self.keys.len();
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lines_sorts_by_prefix() {
        let set = KeySet::from_lines("AIzaFirst\n\n  sk-second  \nAIzaThird\nxyz-unknown\n");
        assert_eq!(set.gemini, vec!["AIzaFirst", "AIzaThird"]);
        assert_eq!(set.openai, vec!["sk-second"]);
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let mut set = KeySet::from_lines("AIzaOne\nAIzaOne\n");
        set.extend(KeySet::from_lines("AIzaOne\nAIzaTwo"));
        assert_eq!(set.gemini, vec!["AIzaOne", "AIzaTwo"]);
    }

    #[test]
    fn test_add_reports_unrecognized() {
        let mut set = KeySet::default();
        assert!(!set.add("hello"));
        assert!(!set.add("   "));
        assert!(set.add("sk-abc"));
        assert_eq!(set.for_provider(ProviderKind::OpenAi), ["sk-abc".to_string()]);
    }

    #[test]
    fn test_from_config_skips_unset_env() {
        let mut config = LlmConfig::default();
        config.gemini.api_keys = vec![
            "${STOCKMETA_TEST_UNSET_KEY_VAR}".to_string(),
            "AIzaLiteral".to_string(),
        ];
        config.openai.api_keys = vec![];
        let set = KeySet::from_config(&config);
        assert_eq!(set.gemini, vec!["AIzaLiteral"]);
        assert!(set.openai.is_empty());
    }

    #[test]
    fn test_from_config_sorts_by_prefix() {
        let mut config = LlmConfig::default();
        config.gemini.api_keys = vec![
            "sk-misplaced".to_string(),
            "AIzaGood".to_string(),
            "not-a-key".to_string(),
        ];
        config.openai.api_keys = vec!["AIzaAlsoMisplaced".to_string(), "AIzaGood".to_string()];
        let set = KeySet::from_config(&config);
        assert_eq!(set.gemini, vec!["AIzaGood", "AIzaAlsoMisplaced"]);
        assert_eq!(set.openai, vec!["sk-misplaced"]);
    }

    #[test]
    fn test_into_ring_empty_is_error() {
        let set = KeySet::from_lines("AIzaOnly");
        let err = set.into_ring(ProviderKind::OpenAi).unwrap_err();
        assert!(err.to_string().contains("OpenAI"));
    }

    #[test]
    fn test_ring_rotation_wraps() {
        let mut ring = KeyRing::new(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        assert_eq!(ring.current(), "a");
        assert_eq!(ring.rotate(), 1);
        assert_eq!(ring.current(), "b");
        ring.rotate();
        assert_eq!(ring.rotate(), 0);
        assert_eq!(ring.current(), "a");
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_single_key_ring_rotates_to_itself() {
        let mut ring = KeyRing::new(vec!["only".into()]).unwrap();
        assert_eq!(ring.rotate(), 0);
        assert_eq!(ring.current(), "only");
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("AIzaSyD-secret"), "AIzaS...");
        assert_eq!(mask_key("sk"), "sk...");
    }
}
