use std::{
    collections::HashSet,
    sync::OnceLock,
};

use regex::Regex;
use wana_kana::IsJapaneseChar;

/// Matches `漢字[かんじ]` pairs in a bracket furigana annotation
fn furigana_pattern() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"\p{Han}+\[([^\]]*)\]").ok()).as_ref()
}

/// Kanji characters of a word in order of first appearance, without repeats.
pub fn extract_kanji(word: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    word.chars()
        .filter(|c| c.is_kanji())
        .filter(|c| seen.insert(*c))
        .map(|c| c.to_string())
        .collect()
}

//食[た]べる -> たべる, お 茶[ちゃ] -> おちゃ
pub fn furigana_to_reading(furigana: &str) -> String {
    let replaced = match furigana_pattern() {
        Some(re) => re.replace_all(furigana, "$1").into_owned(),
        None => furigana.to_string(),
    };
    replaced.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Answer comparison form: lowercase, no periods, trimmed.
pub fn normalize_answer(text: &str) -> String {
    text.to_lowercase().replace(['.', '。'], "").trim().to_string()
}

/// Percentage of `part` in `total`, 0 when there is nothing to count.
pub fn percentage(part: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    part as f32 / total as f32 * 100.0
}

pub fn is_single_character(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some() && chars.next().is_none()
}
