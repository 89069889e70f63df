//! Emoji detection shared by the per-message flag and the emoji tally.

use once_cell::sync::Lazy;
use regex::Regex;

/// Emoticons, misc symbols and pictographs, transport symbols, regional
/// indicator (flag) letters, misc symbols and dingbats.
static EMOJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"[\x{1F600}-\x{1F64F}\x{1F300}-\x{1F5FF}\x{1F680}-\x{1F6FF}",
        r"\x{1F1E0}-\x{1F1FF}\x{2600}-\x{26FF}\x{2700}-\x{27BF}]",
    ))
    .expect("emoji pattern is valid")
});

/// Every emoji glyph in `text`, in order of appearance.
///
/// Each match is a single code point, so a flag made of two regional
/// indicators yields two entries.
pub fn find_emojis(text: &str) -> Vec<&str> {
    EMOJI_RE.find_iter(text).map(|m| m.as_str()).collect()
}
