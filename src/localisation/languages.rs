use lazy_static::lazy_static;

use crate::localisation::models::LangType;

/// Code of the language selected when nothing valid is stored.
pub const DEFAULT_LANGUAGE_CODE: &str = "en";

const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("ar", "العربية"),
    ("ca", "Català"),
    ("zh-CN", "简体中文"),
    ("zh-TW", "繁體中文"),
    ("cs", "Čeština"),
    ("da", "Dansk"),
    ("de", "Deutsch"),
    ("nl", "Nederlands"),
    ("fi", "Suomi"),
    ("fil", "Filipino"),
    ("fr", "Français"),
    ("el", "Ελληνικά"),
    ("hi", "हिंदी"),
    ("hu", "Magyar"),
    ("id", "Bahasa Indonesia"),
    ("it", "Italiano"),
    ("ja", "日本語"),
    ("ko", "한국어"),
    ("pt-BR", "Português"),
    ("ro", "Română"),
    ("ru", "Русский язык"),
    ("sr", "Српски"),
    ("es-ES", "Español"),
    ("sv-SE", "Svenska"),
    ("tr", "Türkçe"),
    ("uk", "Українська"),
    ("vi", "Tiếng Việt"),
];

lazy_static! {
    pub static ref ALL_LANGUAGES: Vec<LangType> = LANGUAGES
        .iter()
        .map(|(code, language)| LangType::new(code, language))
        .collect();
}

/// Looks up a known language by its code. Codes are matched exactly.
pub fn language_by_code(code: &str) -> Option<&'static LangType> {
    ALL_LANGUAGES
        .iter()
        .find(|language| language.code == code)
}

pub fn default_language() -> LangType {
    LangType::new(DEFAULT_LANGUAGE_CODE, "English")
}
