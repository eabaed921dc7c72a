use std::{
    collections::{
        HashMap,
        HashSet,
    },
    time::Instant,
};

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};

use crate::core::{
    utils::extract_kanji,
    Kanji,
    Radical,
    VocabularyItem,
};

pub mod resolver;

pub use resolver::{
    CharacterResolver,
    DictionaryFile,
    DictionaryResolver,
};

/// A vocabulary word and the characters of the kanji it is written with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    pub word: String,
    pub kanji: Vec<String>,
}

/// Vocabulary → kanji → radicals. Every kanji and radical is stored once no matter
/// how many words share it, and entries refer to them by identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabHierarchy {
    entries: Vec<HierarchyEntry>,
    unique_kanji: Vec<Kanji>,
    unique_radicals: Vec<Radical>,
    /// Character → position in `unique_kanji`
    #[serde(skip)]
    kanji_index: HashMap<String, usize>,
    /// Identifier → position in `unique_radicals`
    #[serde(skip)]
    radical_index: HashMap<String, usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HierarchyParts {
    #[serde(default)]
    entries: Vec<HierarchyEntry>,
    #[serde(default)]
    unique_kanji: Vec<Kanji>,
    #[serde(default)]
    unique_radicals: Vec<Radical>,
}

impl<'de> Deserialize<'de> for VocabHierarchy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parts = HierarchyParts::deserialize(deserializer)?;
        Ok(Self::indexed(parts.entries, parts.unique_kanji, parts.unique_radicals))
    }
}

impl VocabHierarchy {
    /// Assembles a hierarchy from already resolved records. Duplicate keys keep their
    /// first record, and records no entry can reach are dropped.
    pub fn from_parts(
        entries: Vec<HierarchyEntry>,
        kanji: Vec<Kanji>,
        radicals: Vec<Radical>,
    ) -> Self {
        let mut seen_words = HashSet::new();
        let entries: Vec<HierarchyEntry> =
            entries.into_iter().filter(|e| seen_words.insert(e.word.clone())).collect();

        let referenced_kanji: HashSet<&str> =
            entries.iter().flat_map(|e| e.kanji.iter().map(String::as_str)).collect();
        let mut seen_kanji = HashSet::new();
        let unique_kanji: Vec<Kanji> = kanji
            .into_iter()
            .filter(|k| referenced_kanji.contains(k.character.as_str()))
            .filter(|k| seen_kanji.insert(k.character.clone()))
            .collect();

        let referenced_radicals: HashSet<&str> =
            unique_kanji.iter().flat_map(|k| k.radicals.iter().map(String::as_str)).collect();
        let mut seen_radicals = HashSet::new();
        let unique_radicals: Vec<Radical> = radicals
            .into_iter()
            .filter(|r| referenced_radicals.contains(r.identifier().as_str()))
            .filter(|r| seen_radicals.insert(r.identifier()))
            .collect();

        Self::indexed(entries, unique_kanji, unique_radicals)
    }

    /// Records must already be deduplicated.
    fn indexed(
        entries: Vec<HierarchyEntry>,
        unique_kanji: Vec<Kanji>,
        unique_radicals: Vec<Radical>,
    ) -> Self {
        let kanji_index =
            unique_kanji.iter().enumerate().map(|(i, k)| (k.character.clone(), i)).collect();
        let radical_index =
            unique_radicals.iter().enumerate().map(|(i, r)| (r.identifier(), i)).collect();
        Self { entries, unique_kanji, unique_radicals, kanji_index, radical_index }
    }

    pub fn entries(&self) -> &[HierarchyEntry] {
        &self.entries
    }

    pub fn unique_kanji(&self) -> &[Kanji] {
        &self.unique_kanji
    }

    pub fn unique_radicals(&self) -> &[Radical] {
        &self.unique_radicals
    }

    pub fn kanji(&self, character: &str) -> Option<&Kanji> {
        self.kanji_index.get(character).map(|&i| &self.unique_kanji[i])
    }

    pub fn radical(&self, identifier: &str) -> Option<&Radical> {
        self.radical_index.get(identifier).map(|&i| &self.unique_radicals[i])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vocabulary, kanji and radical counts added together.
    pub fn item_count(&self) -> usize {
        self.entries.len() + self.unique_kanji.len() + self.unique_radicals.len()
    }
}

/// Resolves each vocabulary word into its kanji and their radicals.
///
/// Lookup failures never abort the build: a character the resolver cannot supply
/// becomes a placeholder with no meanings, and a resolver error is treated as if
/// nothing had been found.
pub async fn build_hierarchy<R>(resolver: &R, vocabulary: &[VocabularyItem]) -> VocabHierarchy
where
    R: CharacterResolver + ?Sized,
{
    let start = Instant::now();

    let mut seen_words = HashSet::new();
    let entries: Vec<HierarchyEntry> = vocabulary
        .iter()
        .filter(|item| seen_words.insert(item.word.as_str()))
        .map(|item| HierarchyEntry { word: item.word.clone(), kanji: extract_kanji(&item.word) })
        .collect();

    let mut seen_kanji = HashSet::new();
    let kanji_chars: Vec<String> = entries
        .iter()
        .flat_map(|e| e.kanji.iter())
        .filter(|c| seen_kanji.insert(c.as_str()))
        .cloned()
        .collect();

    let unique_kanji = if kanji_chars.is_empty() {
        Vec::new()
    } else {
        let found = match resolver.resolve_kanji(&kanji_chars).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Kanji lookup failed, using placeholders: {}", e);
                Vec::new()
            }
        };
        fill_kanji(&kanji_chars, found)
    };

    let mut seen_radicals = HashSet::new();
    let radical_ids: Vec<String> = unique_kanji
        .iter()
        .flat_map(|k| k.radicals.iter())
        .filter(|id| !id.trim().is_empty())
        .filter(|id| seen_radicals.insert(id.as_str()))
        .cloned()
        .collect();

    let unique_radicals = if radical_ids.is_empty() {
        Vec::new()
    } else {
        let found = match resolver.resolve_radicals(&radical_ids).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Radical lookup failed, using placeholders: {}", e);
                Vec::new()
            }
        };
        fill_radicals(&radical_ids, found)
    };

    tracing::debug!(
        words = entries.len(),
        kanji = unique_kanji.len(),
        radicals = unique_radicals.len(),
        "Built vocabulary hierarchy ({:.2}s)",
        start.elapsed().as_secs_f32()
    );

    VocabHierarchy::indexed(entries, unique_kanji, unique_radicals)
}

fn fill_kanji(requested: &[String], found: Vec<Kanji>) -> Vec<Kanji> {
    let mut by_character: HashMap<String, Kanji> =
        found.into_iter().map(|k| (k.character.clone(), k)).collect();

    requested
        .iter()
        .map(|character| {
            by_character.remove(character).unwrap_or_else(|| {
                tracing::warn!("No kanji data for {}, using placeholder", character);
                Kanji::placeholder(character)
            })
        })
        .collect()
}

fn fill_radicals(requested: &[String], found: Vec<Radical>) -> Vec<Radical> {
    let mut by_identifier: HashMap<String, Radical> =
        found.into_iter().map(|r| (r.identifier(), r)).collect();

    requested
        .iter()
        .map(|identifier| {
            by_identifier.remove(identifier).unwrap_or_else(|| {
                tracing::warn!("No radical data for {}, using placeholder", identifier);
                Radical::placeholder(identifier)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        core::KeikoError,
        prefetch::size_glyph_prefetch,
    };

    fn kanji(character: &str, meaning: &str, radicals: &[&str]) -> Kanji {
        Kanji {
            character: character.into(),
            meanings: vec![meaning.into()],
            readings: Vec::new(),
            mnemonic: None,
            radicals: radicals.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn radical(character: &str, meaning: &str) -> Radical {
        Radical {
            character: Some(character.into()),
            meanings: vec![meaning.into()],
            mnemonic: None,
            name: None,
        }
    }

    fn sample_resolver() -> DictionaryResolver {
        DictionaryResolver::new(
            vec![
                kanji("日", "Sun", &["日"]),
                kanji("本", "Book", &["木", "一"]),
                kanji("語", "Language", &["言", "五", "口"]),
                kanji("食", "Eat", &["人", "良"]),
            ],
            vec![
                radical("日", "Sun"),
                radical("木", "Tree"),
                radical("一", "Ground"),
                radical("言", "Say"),
                radical("五", "Five"),
                radical("口", "Mouth"),
                radical("人", "Person"),
                radical("良", "Good"),
            ],
        )
    }

    struct FailingResolver;

    #[async_trait]
    impl CharacterResolver for FailingResolver {
        async fn resolve_kanji(&self, _: &[String]) -> Result<Vec<Kanji>, KeikoError> {
            Err(KeikoError::Lookup("offline".into()))
        }

        async fn resolve_radicals(&self, _: &[String]) -> Result<Vec<Radical>, KeikoError> {
            Err(KeikoError::Lookup("offline".into()))
        }
    }

    #[tokio::test]
    async fn test_shared_kanji_stored_once() {
        let vocabulary = vec![
            VocabularyItem::new("日本", "日本[にほん]", &["Japan"]),
            VocabularyItem::new("日本語", "日本語[にほんご]", &["Japanese"]),
            VocabularyItem::new("日", "日[ひ]", &["day"]),
        ];

        let hierarchy = build_hierarchy(&sample_resolver(), &vocabulary).await;

        assert_eq!(hierarchy.entries().len(), 3);
        assert_eq!(hierarchy.entries()[1].kanji, vec!["日", "本", "語"]);
        let characters: Vec<&str> =
            hierarchy.unique_kanji().iter().map(|k| k.character.as_str()).collect();
        assert_eq!(characters, vec!["日", "本", "語"]);

        let radical_ids: Vec<String> =
            hierarchy.unique_radicals().iter().map(|r| r.identifier()).collect();
        assert_eq!(radical_ids, vec!["日", "木", "一", "言", "五", "口"]);
        assert_eq!(hierarchy.item_count(), 12);
    }

    #[tokio::test]
    async fn test_kana_word_has_empty_kanji_list() {
        let vocabulary = vec![
            VocabularyItem::new("これ", "", &["this"]),
            VocabularyItem::new("テレビ", "", &["television"]),
        ];

        let hierarchy = build_hierarchy(&sample_resolver(), &vocabulary).await;

        assert_eq!(hierarchy.entries().len(), 2);
        assert!(hierarchy.entries().iter().all(|e| e.kanji.is_empty()));
        assert!(hierarchy.unique_kanji().is_empty());
        assert!(hierarchy.unique_radicals().is_empty());
    }

    #[tokio::test]
    async fn test_missing_kanji_becomes_placeholder() {
        let vocabulary = vec![
            VocabularyItem::new("飲食", "飲食[いんしょく]", &["food and drink"]),
            VocabularyItem::new("日", "日[ひ]", &["day"]),
        ];

        let hierarchy = build_hierarchy(&sample_resolver(), &vocabulary).await;

        let placeholder = hierarchy.kanji("飲").unwrap();
        assert!(placeholder.meanings.is_empty());
        assert!(placeholder.mnemonic.is_none());
        assert!(placeholder.radicals.is_empty());
        assert_eq!(hierarchy.kanji("食").unwrap().meanings, vec!["Eat"]);
        assert_eq!(hierarchy.kanji("日").unwrap().meanings, vec!["Sun"]);
    }

    #[tokio::test]
    async fn test_missing_radical_becomes_placeholder() {
        let resolver = DictionaryResolver::new(vec![kanji("休", "Rest", &["人", "木"])], vec![
            radical("木", "Tree"),
        ]);
        let vocabulary = vec![VocabularyItem::new("休み", "休[やす]み", &["holiday"])];

        let hierarchy = build_hierarchy(&resolver, &vocabulary).await;

        let person = hierarchy.radical("人").unwrap();
        assert_eq!(person.character.as_deref(), Some("人"));
        assert!(person.meanings.is_empty());
        assert_eq!(hierarchy.radical("木").unwrap().meanings, vec!["Tree"]);
    }

    #[tokio::test]
    async fn test_named_radical_placeholder_is_not_a_glyph() {
        let resolver = DictionaryResolver::new(vec![kanji("本", "Book", &["木", "stick"])], vec![
            radical("木", "Tree"),
        ]);
        let vocabulary = vec![VocabularyItem::new("本", "本[ほん]", &["book"])];

        let hierarchy = build_hierarchy(&resolver, &vocabulary).await;

        let stick = hierarchy.radical("stick").unwrap();
        assert!(stick.character.is_none());
        assert!(stick.meanings.is_empty());
        assert_eq!(stick.identifier(), "stick");

        let prefetch = size_glyph_prefetch(&hierarchy, &[], true);
        assert_eq!(prefetch.characters, vec!["本", "木"]);
    }

    #[tokio::test]
    async fn test_resolver_failure_degrades_to_placeholders() {
        let vocabulary = vec![VocabularyItem::new("本", "本[ほん]", &["book"])];

        let hierarchy = build_hierarchy(&FailingResolver, &vocabulary).await;

        assert_eq!(hierarchy.unique_kanji().len(), 1);
        assert!(hierarchy.unique_kanji()[0].meanings.is_empty());
        assert!(hierarchy.unique_radicals().is_empty());
    }

    #[tokio::test]
    async fn test_empty_vocabulary() {
        let hierarchy = build_hierarchy(&FailingResolver, &[]).await;
        assert!(hierarchy.is_empty());
        assert_eq!(hierarchy.item_count(), 0);
    }

    #[test]
    fn test_from_parts_dedups_and_drops_unreachable() {
        let hierarchy = VocabHierarchy::from_parts(
            vec![
                HierarchyEntry { word: "日本".into(), kanji: vec!["日".into(), "本".into()] },
                HierarchyEntry { word: "日本".into(), kanji: vec!["日".into(), "本".into()] },
            ],
            vec![
                kanji("日", "Sun", &["日"]),
                kanji("日", "Day", &[]),
                kanji("本", "Book", &[]),
                kanji("月", "Moon", &[]),
            ],
            vec![radical("日", "Sun"), radical("月", "Moon")],
        );

        assert_eq!(hierarchy.entries().len(), 1);
        assert_eq!(hierarchy.unique_kanji().len(), 2);
        assert_eq!(hierarchy.kanji("日").unwrap().meanings, vec!["Sun"]);
        assert_eq!(hierarchy.unique_radicals().len(), 1);
    }

    #[tokio::test]
    async fn test_lookups_survive_json() {
        let vocabulary = vec![
            VocabularyItem::new("日本語", "日本語[にほんご]", &["Japanese"]),
            VocabularyItem::new("休み", "休[やす]み", &["holiday"]),
        ];
        let hierarchy = build_hierarchy(&sample_resolver(), &vocabulary).await;
        assert_eq!(hierarchy.kanji("語").unwrap().meanings, vec!["Language"]);
        assert_eq!(hierarchy.radical("口").unwrap().meanings, vec!["Mouth"]);
        assert!(hierarchy.kanji("口").is_none());

        let json = serde_json::to_string(&hierarchy).unwrap();
        assert!(!json.contains("kanjiIndex"));
        let restored: VocabHierarchy = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, hierarchy);
        assert_eq!(restored.kanji("休").unwrap().character, "休");
        assert_eq!(restored.radical("五").unwrap().meanings, vec!["Five"]);
    }
}
