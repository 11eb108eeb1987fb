use std::collections::HashMap;

use fluent_templates::{
    fluent_bundle::{FluentArgs, FluentValue},
    static_loader, Loader,
};
use once_cell::sync::Lazy;
use unic_langid::LanguageIdentifier;

static_loader! {
    static LOCALES = {
        locales: "./locales",
        fallback_language: "uz",
    };
}

/// Supported languages (code, human-readable name).
pub static SUPPORTED_LANGS: &[(&str, &str)] = &[("uz", "O'zbekcha"), ("ru", "Русский")];

/// Default language identifier used as a fallback.
static DEFAULT_LANG: Lazy<LanguageIdentifier> = Lazy::new(|| "uz".parse().unwrap());

/// Normalizes a language code into a LanguageIdentifier (falls back to default).
pub fn lang_from_code(code: &str) -> LanguageIdentifier {
    let code_normalized = code.to_lowercase();
    let normalized = match code_normalized.as_str() {
        "uz" | "uz-uz" => "uz",
        "ru" | "ru-ru" => "ru",
        other => other,
    };

    match normalized.parse::<LanguageIdentifier>() {
        Ok(lang) if SUPPORTED_LANGS.iter().any(|(c, _)| *c == lang.language.as_str()) => lang,
        _ => DEFAULT_LANG.clone(),
    }
}

/// Resolves the language from the Telegram locale of the sender.
pub fn lang_from_telegram(code: Option<&str>) -> LanguageIdentifier {
    code.map(lang_from_code).unwrap_or_else(|| DEFAULT_LANG.clone())
}

/// Returns a localized string for the given key.
/// Converts literal `\n` sequences to actual newlines for proper Telegram formatting.
pub fn t(lang: &LanguageIdentifier, key: &str) -> String {
    let text = LOCALES
        .lookup(lang, key)
        .unwrap_or_else(|| LOCALES.lookup(&DEFAULT_LANG, key).unwrap_or_else(|| key.to_string()));
    text.replace("\\n", "\n")
}

/// Returns a localized string with arguments for interpolation.
pub fn t_args(lang: &LanguageIdentifier, key: &str, args: &FluentArgs) -> String {
    let args_map: HashMap<String, FluentValue> = args.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();

    let text = LOCALES.lookup_with_args(lang, key, &args_map).unwrap_or_else(|| {
        LOCALES
            .lookup_with_args(&DEFAULT_LANG, key, &args_map)
            .unwrap_or_else(|| key.to_string())
    });
    text.replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluent_templates::fluent_bundle::FluentArgs;

    #[test]
    fn unknown_code_falls_back_to_uzbek() {
        assert_eq!(lang_from_code("de").language.as_str(), "uz");
        assert_eq!(lang_from_code("ru-RU").language.as_str(), "ru");
        assert_eq!(lang_from_telegram(None).language.as_str(), "uz");
    }

    #[test]
    fn lookup_replaces_literal_newlines() {
        let lang = lang_from_code("uz");
        let help = t(&lang, "help");
        assert!(help.contains('\n'));
        assert!(!help.contains("\\n"));
    }

    #[test]
    fn lookup_with_args_interpolates() {
        let lang = lang_from_code("ru");
        let mut args = FluentArgs::new();
        args.set("id", 17);
        let text = t_args(&lang, "ticket-created", &args);
        assert!(text.contains("17"));
    }

    #[test]
    fn missing_key_returns_key_itself() {
        let lang = lang_from_code("uz");
        assert_eq!(t(&lang, "no-such-key"), "no-such-key");
    }
}
