//! Terminal prompts for API keys, and saving keys to the config file.

use console::{style, Style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Password};
use stockmeta_core::{Config, KeySet, ProviderKind};

/// Dialoguer theme used by every prompt.
pub fn stockmeta_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("?".to_string()).for_stderr().cyan(),
        prompt_style: Style::new().for_stderr().bold(),
        success_prefix: style("✓".to_string()).for_stderr().green(),
        error_prefix: style("✗".to_string()).for_stderr().red(),
        error_style: Style::new().for_stderr().red(),
        ..ColorfulTheme::default()
    }
}

/// Map a Ctrl+C/Esc during a prompt to `None`.
fn handle_interrupt<T>(result: dialoguer::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Ask for API keys until an empty answer. Offers to save them afterwards.
///
/// Keys for either provider are accepted; they are sorted by prefix.
pub fn prompt_for_keys(kind: ProviderKind) -> anyhow::Result<KeySet> {
    let theme = stockmeta_theme();
    let warn = Style::new().for_stderr().yellow();
    let dim = Style::new().for_stderr().dim();

    eprintln!(
        "  {}",
        warn.apply_to(format!("No {} API key configured.", kind.display_name()))
    );
    eprintln!(
        "  {}",
        dim.apply_to("Paste one key per prompt; leave empty to finish.")
    );

    let mut keys = KeySet::default();
    loop {
        let entered = handle_interrupt(
            Password::with_theme(&theme)
                .with_prompt(format!("API key #{}", keys.for_provider(kind).len() + 1))
                .allow_empty_password(true)
                .interact(),
        )?;
        match entered {
            Some(key) if !key.trim().is_empty() => {
                if !keys.add(&key) {
                    eprintln!(
                        "  {}",
                        warn.apply_to("Not a Gemini (AIza...) or OpenAI (sk-...) key; skipped.")
                    );
                }
            }
            _ => break,
        }
    }

    if keys.gemini.is_empty() && keys.openai.is_empty() {
        return Ok(keys);
    }

    let save = handle_interrupt(
        Confirm::with_theme(&theme)
            .with_prompt("Save these keys to the config file?")
            .default(false)
            .interact(),
    )?;
    if save == Some(true) {
        let path = Config::default_path();
        match save_keys_to_config(&keys) {
            Ok(()) => eprintln!(
                "  {}",
                dim.apply_to(format!("Keys saved to {}", path.display()))
            ),
            Err(e) => eprintln!(
                "  {}",
                warn.apply_to(format!("Could not save to config: {e}"))
            ),
        }
    }

    Ok(keys)
}

/// Append keys to the config file, preserving its comments and layout.
pub fn save_keys_to_config(keys: &KeySet) -> anyhow::Result<()> {
    let path = Config::default_path();
    let content = if path.exists() {
        std::fs::read_to_string(&path)?
    } else {
        String::new()
    };
    let updated = merge_keys_into_toml(&content, keys)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, updated)?;
    Ok(())
}

/// Add `keys` to `[llm.gemini].api_keys` / `[llm.openai].api_keys`, skipping
/// keys already listed.
pub fn merge_keys_into_toml(content: &str, keys: &KeySet) -> anyhow::Result<String> {
    let mut doc: toml_edit::DocumentMut = content.parse()?;

    for (section, new_keys) in [("gemini", &keys.gemini), ("openai", &keys.openai)] {
        if new_keys.is_empty() {
            continue;
        }
        if !doc.contains_key("llm") {
            doc["llm"] = toml_edit::Item::Table(toml_edit::Table::new());
        }
        if !doc["llm"]
            .as_table()
            .is_some_and(|t| t.contains_key(section))
        {
            doc["llm"][section] = toml_edit::Item::Table(toml_edit::Table::new());
        }

        let item = &mut doc["llm"][section]["api_keys"];
        if item.as_array().is_none() {
            *item = toml_edit::value(toml_edit::Array::new());
        }
        if let Some(array) = item.as_array_mut() {
            for key in new_keys {
                if !array.iter().any(|v| v.as_str() == Some(key.as_str())) {
                    array.push(key.as_str());
                }
            }
        }
    }

    Ok(doc.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_into_empty_document() {
        let keys = KeySet::from_lines("AIzaOne\nsk-two");
        let out = merge_keys_into_toml("", &keys).unwrap();
        let config: Config = toml::from_str(&out).unwrap();
        assert_eq!(config.llm.gemini.api_keys, vec!["AIzaOne"]);
        assert_eq!(config.llm.openai.api_keys, vec!["sk-two"]);
    }

    #[test]
    fn test_merge_preserves_comments_and_existing_keys() {
        let existing = "# my settings\n[llm]\nprovider = \"openai\"\n\n[llm.openai]\n# keys\napi_keys = [\"sk-old\"]\n";
        let keys = KeySet::from_lines("sk-old\nsk-new");
        let out = merge_keys_into_toml(existing, &keys).unwrap();
        assert!(out.contains("# my settings"));
        assert!(out.contains("# keys"));
        let config: Config = toml::from_str(&out).unwrap();
        assert_eq!(config.llm.openai.api_keys, vec!["sk-old", "sk-new"]);
        assert_eq!(config.llm.provider, ProviderKind::OpenAi);
        // Gemini section was not touched
        assert!(!out.contains("[llm.gemini]"));
    }

    #[test]
    fn test_merge_rejects_invalid_toml() {
        let keys = KeySet::from_lines("AIzaOne");
        assert!(merge_keys_into_toml("[llm\nbroken", &keys).is_err());
    }
}
