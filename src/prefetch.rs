//! Sizing of the glyph prefetch done before a session starts.
//!
//! A local scheduler interleaves reviews due elsewhere in the account into the
//! session, so their glyphs are fetched along with the module's own. The numbers
//! here are an estimate for a cache warm-up and nothing depends on them being exact.

use std::collections::HashSet;

use crate::{
    core::utils::is_single_character,
    hierarchy::VocabHierarchy,
    scheduling::DueItem,
};

/// Share of a session given over to interleaved reviews.
pub const INTERLEAVE_RATIO: f64 = 0.33;
/// Over-fetch factor on top of the interleaved share.
pub const PREFETCH_SAFETY_MARGIN: f64 = 1.5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphPrefetch {
    /// Hierarchy glyphs first, then due review glyphs, no repeats
    pub characters: Vec<String>,
    pub reviews_to_fetch: usize,
}

/// Reviews a session of `module_item_count` items makes room for.
pub fn interleave_capacity(module_item_count: usize) -> usize {
    (module_item_count as f64 * INTERLEAVE_RATIO).ceil() as usize
}

pub fn reviews_to_fetch(module_item_count: usize, due_count: usize) -> usize {
    let estimate =
        (interleave_capacity(module_item_count) as f64 * PREFETCH_SAFETY_MARGIN).ceil() as usize;
    due_count.min(estimate)
}

pub fn size_glyph_prefetch(
    hierarchy: &VocabHierarchy,
    global_due: &[DueItem],
    is_local_scheduler: bool,
) -> GlyphPrefetch {
    let mut seen = HashSet::new();
    let mut characters = Vec::new();

    let kanji = hierarchy.unique_kanji().iter().map(|k| k.character.as_str());
    let radicals = hierarchy
        .unique_radicals()
        .iter()
        .filter_map(|r| r.character.as_deref())
        .filter(|glyph| is_single_character(glyph));
    for glyph in kanji.chain(radicals) {
        if !glyph.trim().is_empty() && seen.insert(glyph.to_string()) {
            characters.push(glyph.to_string());
        }
    }

    if !is_local_scheduler || global_due.is_empty() {
        return GlyphPrefetch { characters, reviews_to_fetch: 0 };
    }

    let reviews_to_fetch = reviews_to_fetch(hierarchy.item_count(), global_due.len());

    let mut by_due: Vec<&DueItem> = global_due.iter().collect();
    by_due.sort_by_key(|item| item.due_date);

    let before = characters.len();
    for item in by_due.into_iter().take(reviews_to_fetch) {
        let glyph = item.identifier();
        if item.item_type.is_prerequisite()
            && is_single_character(glyph)
            && seen.insert(glyph.to_string())
        {
            characters.push(glyph.to_string());
        }
    }

    tracing::debug!(
        hierarchy = before,
        reviews = characters.len() - before,
        reviews_to_fetch,
        "Sized glyph prefetch"
    );

    GlyphPrefetch { characters, reviews_to_fetch }
}
