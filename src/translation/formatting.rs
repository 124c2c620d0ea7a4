/*!
 * Placeholder preservation for translated text.
 *
 * Machine translation mangles `{0}`-style placeholders and edge whitespace.
 * This module puts the original placeholder contents back into the
 * translated string and cleans up the braces the translation broke.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;

/// A `{...}` region; the capture is the content between the braces
static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^}]*)\}").unwrap());

/// Fixes up a translated string against the text it was translated from
pub struct PlaceholderFixer;

impl PlaceholderFixer {
    /// Apply every fix-up step to a translation of `original`
    pub fn fix(original: &str, translated: &str) -> String {
        let result = Self::restore_placeholders(original, translated);
        let result = Self::restore_padding(original, result);
        Self::strip_orphan_braces(&result)
    }

    /// Replace the content of each `{...}` region in `translated` with the
    /// content of the matching region of `original`, in order
    ///
    /// Text around the regions is left untouched. Regions beyond the number
    /// of original placeholders keep their translated content, and original
    /// placeholders without a region to land in are dropped.
    pub fn restore_placeholders(original: &str, translated: &str) -> String {
        let mut keys: VecDeque<&str> = PLACEHOLDER_REGEX
            .captures_iter(original)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .collect();

        if keys.is_empty() {
            return translated.to_string();
        }

        let mut result = String::with_capacity(translated.len());
        let mut pos = 0;

        for region in PLACEHOLDER_REGEX.find_iter(translated) {
            let Some(key) = keys.pop_front() else {
                break;
            };

            result.push_str(&translated[pos..region.start()]);
            result.push('{');
            result.push_str(key);
            result.push('}');
            pos = region.end();
        }

        result.push_str(&translated[pos..]);
        result
    }

    /// Put back a single leading/trailing space the translation dropped
    pub fn restore_padding(original: &str, mut translated: String) -> String {
        if original.starts_with(' ') && !translated.starts_with(' ') {
            translated.insert(0, ' ');
        }

        if original.ends_with(' ') && !translated.ends_with(' ') {
            translated.push(' ');
        }

        translated
    }

    /// Remove braces that no longer delimit a placeholder
    ///
    /// In a single pass over the input this drops `{` followed by whitespace
    /// and whitespace followed by `}` (both characters), a `{` with no `}`
    /// at least two characters later on the same line, and a `}` with no `{`
    /// at least two characters earlier on the same line.
    pub fn strip_orphan_braces(text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut result = String::with_capacity(text.len());
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();

            if c == '{' && next.is_some_and(char::is_whitespace) {
                i += 2;
                continue;
            }

            if c.is_whitespace() && next == Some('}') {
                i += 2;
                continue;
            }

            if c == '{' && !has_close_ahead(&chars, i) {
                i += 1;
                continue;
            }

            if c == '}' && !has_open_behind(&chars, i) {
                i += 1;
                continue;
            }

            result.push(c);
            i += 1;
        }

        result
    }
}

/// Whether a `}` sits at `i + 2` or later before the next line break
fn has_close_ahead(chars: &[char], i: usize) -> bool {
    chars
        .iter()
        .skip(i + 1)
        .take_while(|c| **c != '\n')
        .enumerate()
        .any(|(offset, c)| offset >= 1 && *c == '}')
}

/// Whether a `{` sits at `i - 2` or earlier after the previous line break
fn has_open_behind(chars: &[char], i: usize) -> bool {
    chars[..i]
        .iter()
        .rev()
        .take_while(|c| **c != '\n')
        .enumerate()
        .any(|(offset, c)| offset >= 1 && *c == '{')
}
