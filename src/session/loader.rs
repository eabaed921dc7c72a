use std::{
    collections::HashSet,
    time::Instant,
};

use super::{
    initialize_session,
    CardKey,
    SessionOptions,
    SessionState,
};
use crate::{
    core::{
        utils::extract_kanji,
        VocabularyItem,
    },
    hierarchy::{
        build_hierarchy,
        CharacterResolver,
        VocabHierarchy,
    },
    prefetch::{
        size_glyph_prefetch,
        GlyphPrefetch,
    },
    scheduling::{
        source::SchedulingSource,
        DueItem,
        ScheduleSnapshot,
    },
};

#[derive(Debug, Clone)]
pub struct LoadedSession {
    pub hierarchy: VocabHierarchy,
    pub session: SessionState,
    pub prefetch: GlyphPrefetch,
    /// Everything due in the account, before interleaving picks from it
    pub due: Vec<DueItem>,
}

/// Gathers what a session needs from its collaborators and builds it.
///
/// Lookups that do not depend on each other run together; radical records wait
/// for the hierarchy since only it knows which radicals are involved.
pub struct SessionLoader<'a, R: ?Sized, S: ?Sized> {
    resolver: &'a R,
    source: &'a S,
}

impl<'a, R, S> SessionLoader<'a, R, S>
where
    R: CharacterResolver + ?Sized,
    S: SchedulingSource + ?Sized,
{
    pub fn new(resolver: &'a R, source: &'a S) -> Self {
        Self { resolver, source }
    }

    pub async fn load(
        &self,
        user_id: &str,
        vocabulary: &[VocabularyItem],
        options: &SessionOptions,
    ) -> LoadedSession {
        let start = Instant::now();
        let keys = local_keys(vocabulary);

        let (hierarchy, due, records) = futures::join!(
            build_hierarchy(self.resolver, vocabulary),
            self.source.fetch_due(user_id),
            self.source.fetch_records(user_id, &keys),
        );

        let due = due.unwrap_or_else(|e| {
            tracing::warn!("Could not fetch due reviews: {}", e);
            Vec::new()
        });
        let mut snapshot = records.unwrap_or_else(|e| {
            tracing::warn!("Could not fetch scheduling records, starting fresh: {}", e);
            ScheduleSnapshot::new()
        });

        let radical_keys: Vec<String> = hierarchy
            .unique_radicals()
            .iter()
            .map(|r| CardKey::radical(&r.identifier()).to_string())
            .collect();
        if options.prerequisites_enabled && !radical_keys.is_empty() {
            match self.source.fetch_records(user_id, &radical_keys).await {
                Ok(records) => snapshot.extend(records),
                Err(e) => tracing::warn!("Could not fetch radical records: {}", e),
            }
        }

        let prefetch = size_glyph_prefetch(&hierarchy, &due, options.local_scheduler);
        let session = initialize_session(&hierarchy, &snapshot, &due, vocabulary, options);

        tracing::info!(
            records = snapshot.len(),
            due = due.len(),
            "Loaded session for {} ({:.2}s)",
            user_id,
            start.elapsed().as_secs_f32()
        );

        LoadedSession { hierarchy, session, prefetch, due }
    }
}

/// Vocabulary and kanji keys, which are known before any lookup.
fn local_keys(vocabulary: &[VocabularyItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    let vocabulary_keys = vocabulary.iter().map(|item| CardKey::vocabulary(&item.word).to_string());
    let kanji_keys = vocabulary
        .iter()
        .flat_map(|item| extract_kanji(&item.word))
        .map(|character| CardKey::kanji(&character).to_string());

    vocabulary_keys.chain(kanji_keys).filter(|key| seen.insert(key.clone())).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Duration;

    use super::*;
    use crate::{
        core::{
            ItemType,
            Kanji,
            KeikoError,
            PracticeMode,
            Radical,
        },
        hierarchy::DictionaryResolver,
        scheduling::{
            source::SnapshotSource,
            ScheduleRecord,
        },
        session::tests::{
            now,
            sample_vocabulary,
        },
    };

    fn resolver() -> DictionaryResolver {
        let kanji = |character: &str, meaning: &str, radicals: &[&str]| Kanji {
            character: character.into(),
            meanings: vec![meaning.into()],
            readings: Vec::new(),
            mnemonic: None,
            radicals: radicals.iter().map(|r| r.to_string()).collect(),
        };
        let radical = |character: &str, meaning: &str| Radical {
            character: Some(character.into()),
            meanings: vec![meaning.into()],
            mnemonic: None,
            name: None,
        };
        DictionaryResolver::new(
            vec![kanji("日", "Sun", &["日"]), kanji("本", "Book", &["木", "一"])],
            vec![radical("日", "Sun"), radical("木", "Tree"), radical("一", "Ground")],
        )
    }

    fn reviewed() -> ScheduleRecord {
        let mut record = ScheduleRecord::fresh(now() - Duration::days(1));
        record.state.reps = 2;
        record
    }

    fn options() -> SessionOptions {
        SessionOptions { now: now(), ..SessionOptions::default() }
    }

    struct RecordingSource {
        inner: SnapshotSource,
        requests: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl SchedulingSource for RecordingSource {
        async fn fetch_records(
            &self,
            user_id: &str,
            keys: &[String],
        ) -> Result<ScheduleSnapshot, KeikoError> {
            self.requests.lock().unwrap().push(keys.to_vec());
            self.inner.fetch_records(user_id, keys).await
        }

        async fn fetch_due(&self, user_id: &str) -> Result<Vec<DueItem>, KeikoError> {
            self.inner.fetch_due(user_id).await
        }
    }

    struct FailingSource;

    #[async_trait]
    impl SchedulingSource for FailingSource {
        async fn fetch_records(
            &self,
            _user_id: &str,
            _keys: &[String],
        ) -> Result<ScheduleSnapshot, KeikoError> {
            Err(KeikoError::Lookup("scheduler offline".into()))
        }

        async fn fetch_due(&self, _user_id: &str) -> Result<Vec<DueItem>, KeikoError> {
            Err(KeikoError::Lookup("scheduler offline".into()))
        }
    }

    #[test]
    fn test_local_keys() {
        let keys = local_keys(&sample_vocabulary());
        assert_eq!(keys, vec![
            "vocabulary:日本",
            "vocabulary:本",
            "vocabulary:食べる",
            "vocabulary:これ",
            "kanji:日",
            "kanji:本",
            "kanji:食",
        ]);
    }

    #[tokio::test]
    async fn test_load_fetches_radicals_after_hierarchy() {
        let mut snapshot = ScheduleSnapshot::new();
        snapshot.insert("vocabulary:本".into(), reviewed());
        snapshot.insert("radical:一".into(), reviewed());
        let source = RecordingSource {
            inner: SnapshotSource::new(None, snapshot, Vec::new()),
            requests: Mutex::new(Vec::new()),
        };
        let resolver = resolver();

        let loaded =
            SessionLoader::new(&resolver, &source).load("learner-1", &sample_vocabulary(), &options()).await;

        let requests = source.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].contains(&"kanji:食".to_string()));
        assert_eq!(requests[1], vec!["radical:日", "radical:木", "radical:一"]);

        let session = &loaded.session;
        assert!(!session.is_locked("kanji:本"));
        assert!(session.is_locked("radical:木"));
        assert!(!session.is_locked("radical:一"));
        // 食 is not in the dictionary and comes back as a placeholder
        assert!(session.card("kanji:食").unwrap().answers.is_empty());
        assert_eq!(loaded.hierarchy.unique_kanji().len(), 3);
    }

    #[tokio::test]
    async fn test_load_degrades_when_source_fails() {
        let resolver = resolver();
        let loaded = SessionLoader::new(&resolver, &FailingSource)
            .load("learner-1", &sample_vocabulary(), &options())
            .await;

        assert!(loaded.due.is_empty());
        assert_eq!(loaded.session.len(), 4 + 3 + 3);
        assert!(loaded.session.cards().all(|card| !card.has_history()));
        assert_eq!(loaded.session.locked_keys().len(), 6);
    }

    #[tokio::test]
    async fn test_load_interleaves_and_prefetches_due_reviews() {
        let due = vec![DueItem {
            key: "kanji:月".into(),
            item_type: ItemType::Kanji,
            due_date: now() - Duration::hours(3),
            mode: PracticeMode::Meanings,
        }];
        let source = SnapshotSource::new(Some("learner-1".into()), ScheduleSnapshot::new(), due);
        let resolver = resolver();

        let loaded =
            SessionLoader::new(&resolver, &source).load("learner-1", &sample_vocabulary(), &options()).await;
        assert_eq!(loaded.session.interleaved_reviews().len(), 1);
        assert!(loaded.prefetch.characters.contains(&"月".to_string()));
        assert_eq!(loaded.prefetch.reviews_to_fetch, 1);

        // Another learner sees nothing from this source
        let loaded =
            SessionLoader::new(&resolver, &source).load("learner-2", &sample_vocabulary(), &options()).await;
        assert!(loaded.due.is_empty());
        assert!(loaded.session.interleaved_reviews().is_empty());
    }

    #[tokio::test]
    async fn test_load_empty_vocabulary() {
        let resolver = resolver();
        let source = SnapshotSource::default();
        let loaded = SessionLoader::new(&resolver, &source).load("learner-1", &[], &options()).await;

        assert!(loaded.session.is_empty());
        assert!(loaded.hierarchy.is_empty());
        assert!(loaded.prefetch.characters.is_empty());
    }
}
