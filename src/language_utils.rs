use isolang::Language;

/// Language utilities for translation endpoint language codes
///
/// The endpoint speaks mostly ISO 639-1 codes with a few regional or
/// ISO 639-2 extras (`zh-CN`, `mni-Mtei`, `haw`, ...). This module holds the
/// fixed list used to pick random hops and maps host culture names onto it.
/// Source language that asks the endpoint to detect the language itself
pub const AUTO_DETECT: &str = "auto";

/// Fallback when a culture name matches no supported language
pub const FALLBACK_LANGUAGE: &str = "en";

/// Every destination language the endpoint accepts, in lookup order
pub static SUPPORTED_LANGUAGES: &[&str] = &[
    "af", "ak", "am", "ar", "as", "ay", "az", "be", "bg", "bho", "bm", "bn", "bs", "ca", "ceb",
    "ckb", "co", "cs", "cy", "da", "de", "doi", "dv", "ee", "el", "en", "eo", "es", "et", "eu",
    "fa", "fi", "fr", "fy", "ga", "gd", "gl", "gn", "gom", "gu", "ha", "haw", "hi", "hmn", "hr",
    "ht", "hu", "hy", "id", "ig", "ilo", "is", "it", "iw", "ja", "jw", "ka", "kk", "km", "kn",
    "ko", "kri", "ku", "ky", "la", "lb", "lg", "ln", "lo", "lt", "lus", "lv", "mai", "mg", "mi",
    "mk", "ml", "mn", "mni-Mtei", "mr", "ms", "mt", "my", "ne", "nl", "no", "nso", "ny", "om",
    "or", "pa", "pl", "ps", "pt", "qu", "ro", "ru", "rw", "sa", "sd", "si", "sk", "sl", "sm", "sn",
    "so", "sq", "sr", "st", "su", "sv", "sw", "ta", "te", "tg", "th", "ti", "tk", "tl", "tr", "ts",
    "tt", "ug", "uk", "ur", "uz", "vi", "xh", "yi", "yo", "zh-CN", "zh-TW", "zu",
];

/// Check whether a code is one of the supported destination languages
pub fn is_supported(code: &str) -> bool {
    let code = code.trim();
    SUPPORTED_LANGUAGES.iter().any(|l| l.eq_ignore_ascii_case(code))
}

/// Map a host culture name (e.g. `fr-FR`, `pt-BR`) to a supported language code
///
/// The first supported code that equals the culture name or is a prefix of it
/// wins, compared case-insensitively. Unknown cultures fall back to English.
pub fn resolve_target_language(culture: &str) -> String {
    let culture = culture.trim().to_lowercase();

    SUPPORTED_LANGUAGES
        .iter()
        .find(|l| {
            let l = l.to_lowercase();
            culture == l || culture.starts_with(&l)
        })
        .map(|l| l.to_string())
        .unwrap_or_else(|| FALLBACK_LANGUAGE.to_string())
}

/// Get a human readable language name for logging
///
/// Only the primary subtag is looked up, so `zh-TW` reads as `Chinese`.
/// Codes isolang doesn't know are returned unchanged.
pub fn get_language_name(code: &str) -> String {
    let primary = code.split('-').next().unwrap_or(code).trim().to_lowercase();

    let language = match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => Language::from_639_3(&primary),
        _ => None,
    };

    match language {
        Some(lang) => lang.to_name().to_string(),
        None => code.to_string(),
    }
}
