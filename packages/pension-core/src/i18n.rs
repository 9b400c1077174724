//! Localised labels for table headers, units, chart titles and exports.

use serde_json::Value;
use std::collections::HashMap;
use std::env;

const EN_MESSAGES: &str = include_str!("../i18n/en.json");
const ZH_MESSAGES: &str = include_str!("../i18n/zh.json");

#[derive(Clone, Debug)]
pub struct I18n {
    locale: String,
    messages: HashMap<String, String>,
}

impl I18n {
    /// Catalog for a locale such as `en`, `zh_CN` or `zh-Hans`. Unknown
    /// locales fall back to English.
    pub fn new(locale: &str) -> Self {
        let locale = normalize(locale).unwrap_or_else(|| "en".to_string());
        let messages = load_messages(&locale);
        Self { locale, messages }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn t(&self, key: &str) -> String {
        self.messages
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    pub fn format(&self, key: &str, params: &[(&str, &str)]) -> String {
        let mut value = self.t(key);
        for (param, replacement) in params {
            value = value.replace(&format!("{{{param}}}"), replacement);
        }
        value
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("en")
    }
}

fn normalize(locale: &str) -> Option<String> {
    let trimmed = locale.trim();
    let normalized = trimmed
        .split('.')
        .next()
        .unwrap_or(trimmed)
        .replace('-', "_")
        .to_lowercase();
    (!normalized.is_empty()).then_some(normalized)
}

/// Locale from `LC_ALL`, `LC_MESSAGES` or `LANG`, defaulting to `en`.
pub fn detect_locale() -> String {
    let candidates = ["LC_ALL", "LC_MESSAGES", "LANG"];
    for key in candidates {
        if let Ok(value) = env::var(key) {
            if let Some(normalized) = normalize(&value) {
                return normalized;
            }
        }
    }
    "en".to_string()
}

fn load_messages(locale: &str) -> HashMap<String, String> {
    let raw = if locale.starts_with("zh") {
        ZH_MESSAGES
    } else {
        EN_MESSAGES
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
            .collect(),
        _ => HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogs_share_keys() {
        let en = load_messages("en");
        let zh = load_messages("zh");
        assert!(!en.is_empty());
        let mut en_keys: Vec<&String> = en.keys().collect();
        let mut zh_keys: Vec<&String> = zh.keys().collect();
        en_keys.sort();
        zh_keys.sort();
        assert_eq!(en_keys, zh_keys);
    }

    #[test]
    fn test_locale_selection() {
        assert_eq!(I18n::new("zh-CN").locale(), "zh_cn");
        assert_eq!(I18n::new("zh_CN.UTF-8").t("column.manager"), "管理人");
        assert_eq!(I18n::new("fr_FR").t("column.manager"), "Manager");
        assert_eq!(I18n::new("").locale(), "en");
    }

    #[test]
    fn test_unknown_key_and_params() {
        let i18n = I18n::new("zh");
        assert_eq!(i18n.t("missing.key"), "missing.key");
        assert_eq!(
            i18n.format("label.return", &[("category", "固定收益类")]),
            "收益率(固定收益类%)"
        );
    }
}
