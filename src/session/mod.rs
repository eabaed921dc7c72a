//! Practice session graph: cards, dependency edges and the lock set.
//!
//! A session is built once from a hierarchy and a scheduling snapshot, then
//! mutated in place while the learner answers. Nothing here is persisted; the
//! scheduler owns whatever outlives the session.

use std::{
    collections::{
        BTreeMap,
        BTreeSet,
        HashMap,
        HashSet,
    },
    time::Instant,
};

use chrono::{
    DateTime,
    Utc,
};
use rand::{
    seq::SliceRandom,
    Rng,
};
use uuid::Uuid;

use crate::{
    core::{
        utils::percentage,
        ItemType,
        PracticeMode,
        VocabularyItem,
    },
    hierarchy::VocabHierarchy,
    prefetch::interleave_capacity,
    scheduling::{
        DueItem,
        Rating,
        ScheduleSnapshot,
        Scheduler,
    },
    validation::validate_particles,
};

pub mod card;
pub mod graph;
pub mod loader;
pub mod transport;

pub use card::{
    CardKey,
    PracticeCard,
};
pub use graph::DependencyGraph;
pub use loader::{
    LoadedSession,
    SessionLoader,
};
pub use transport::SessionTransport;

use card::{
    kanji_card,
    radical_card,
    vocabulary_card,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub mode: PracticeMode,
    pub flip_vocab_qa: bool,
    pub flip_prereq_qa: bool,
    pub prerequisites_enabled: bool,
    pub shuffle: bool,
    /// Reviews are scheduled by this app rather than an external SRS service
    pub local_scheduler: bool,
    pub now: DateTime<Utc>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mode: PracticeMode::Meanings,
            flip_vocab_qa: false,
            flip_prereq_qa: false,
            prerequisites_enabled: true,
            shuffle: false,
            local_scheduler: true,
            now: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub rating: Rating,
    /// Lower-tier keys that left the lock set because of this answer
    pub unlocked: Vec<String>,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleOutcome {
    pub slots: Vec<bool>,
    pub outcome: AnswerOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionProgress {
    pub total: usize,
    pub presentable: usize,
    pub locked: usize,
    pub disabled: usize,
    pub answered: usize,
    pub percent_answered: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    id: Uuid,
    mode: PracticeMode,
    prerequisites_enabled: bool,
    cards: HashMap<String, PracticeCard>,
    /// Presentation order of every card key
    order: Vec<String>,
    graph: DependencyGraph,
    locked: BTreeSet<String>,
    answered: BTreeSet<String>,
    interleaved_reviews: Vec<DueItem>,
}

impl SessionState {
    fn empty(options: &SessionOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: options.mode,
            prerequisites_enabled: options.prerequisites_enabled,
            cards: HashMap::new(),
            order: Vec::new(),
            graph: DependencyGraph::new(),
            locked: BTreeSet::new(),
            answered: BTreeSet::new(),
            interleaved_reviews: Vec::new(),
        }
    }

    fn insert_card(&mut self, card: PracticeCard) {
        if self.cards.contains_key(&card.key) {
            return;
        }
        self.order.push(card.key.clone());
        self.cards.insert(card.key.clone(), card);
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> PracticeMode {
        self.mode
    }

    pub fn prerequisites_enabled(&self) -> bool {
        self.prerequisites_enabled
    }

    pub fn card(&self, key: &str) -> Option<&PracticeCard> {
        self.cards.get(key)
    }

    pub fn card_map(&self) -> &HashMap<String, PracticeCard> {
        &self.cards
    }

    /// Cards in presentation order.
    pub fn cards(&self) -> impl Iterator<Item = &PracticeCard> {
        self.order.iter().filter_map(|key| self.cards.get(key))
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn dependency_map(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.graph.dependency_map()
    }

    pub fn unlocks_map(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.graph.unlocks_map()
    }

    pub fn locked_keys(&self) -> &BTreeSet<String> {
        &self.locked
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.locked.contains(key)
    }

    /// Neither locked nor disabled. A locked card stays hidden whatever its due date.
    pub fn is_presentable(&self, key: &str) -> bool {
        !self.is_locked(key) && self.cards.get(key).is_some_and(|c| !c.disabled)
    }

    pub fn presentable_keys(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).filter(|key| self.is_presentable(key)).collect()
    }

    /// First presentable card not yet answered in this session.
    pub fn next_card(&self) -> Option<&PracticeCard> {
        self.order
            .iter()
            .filter(|key| !self.answered.contains(*key))
            .find(|key| self.is_presentable(key))
            .and_then(|key| self.cards.get(key))
    }

    pub fn interleaved_reviews(&self) -> &[DueItem] {
        &self.interleaved_reviews
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn progress(&self) -> SessionProgress {
        let total = self.cards.len();
        let answered = self.answered.len();
        SessionProgress {
            total,
            presentable: self.presentable_keys().len(),
            locked: self.locked.len(),
            disabled: self.cards.values().filter(|c| c.disabled).count(),
            answered,
            percent_answered: percentage(answered, total),
        }
    }

    /// Grades a written answer and forwards it to the scheduler.
    /// Returns `None` for unknown or locked keys.
    pub fn record_answer<S>(
        &mut self,
        key: &str,
        input: &str,
        scheduler: &S,
        now: DateTime<Utc>,
    ) -> Option<AnswerOutcome>
    where
        S: Scheduler + ?Sized,
    {
        let correct = self.cards.get(key)?.check(input);
        let rating = if correct { Rating::Good } else { Rating::Again };
        self.record_rating(key, rating, scheduler, now)
    }

    /// Grades the particle blanks of a vocabulary card. Every slot has to be
    /// filled correctly for the card to count as correct.
    pub fn record_particles<S, P>(
        &mut self,
        key: &str,
        submitted: &[P],
        scheduler: &S,
        now: DateTime<Utc>,
    ) -> Option<ParticleOutcome>
    where
        S: Scheduler + ?Sized,
        P: AsRef<str>,
    {
        let expected = self.cards.get(key)?.particles.as_ref().filter(|p| !p.is_empty())?;
        let slots = validate_particles(submitted, expected);
        let correct = slots.len() == expected.len() && slots.iter().all(|ok| *ok);
        let rating = if correct { Rating::Good } else { Rating::Again };

        let outcome = self.record_rating(key, rating, scheduler, now)?;
        Some(ParticleOutcome { slots, outcome })
    }

    /// Applies a rating decided elsewhere. The card gains history, so every
    /// prerequisite it unlocks leaves the lock set.
    pub fn record_rating<S>(
        &mut self,
        key: &str,
        rating: Rating,
        scheduler: &S,
        now: DateTime<Utc>,
    ) -> Option<AnswerOutcome>
    where
        S: Scheduler + ?Sized,
    {
        if self.locked.contains(key) {
            tracing::debug!("Ignoring answer for locked card {}", key);
            return None;
        }
        let card = self.cards.get_mut(key)?;

        let (state, log) = scheduler.review(&card.schedule, rating, now);
        card.schedule = state;
        card.review_log.push(log);
        if self.prerequisites_enabled && card.item_type.is_prerequisite() {
            card.disabled = card.schedule.due > now;
        }
        let disabled = card.disabled;
        self.answered.insert(key.to_string());

        let unlocked: Vec<String> = self
            .graph
            .unlocks(key)
            .into_iter()
            .filter(|lower| self.locked.remove(*lower))
            .map(str::to_string)
            .collect();

        if !unlocked.is_empty() {
            tracing::debug!("{} unlocked {:?}", key, unlocked);
        }

        Some(AnswerOutcome { correct: rating != Rating::Again, rating, unlocked, disabled })
    }
}

/// Builds a session from a hierarchy and the learner's scheduling records.
///
/// An empty vocabulary yields an empty session. Missing or malformed scheduling
/// records give fresh cards. Shuffling only changes the presentation order.
pub fn initialize_session(
    hierarchy: &VocabHierarchy,
    module_snapshot: &ScheduleSnapshot,
    global_due: &[DueItem],
    vocabulary: &[VocabularyItem],
    options: &SessionOptions,
) -> SessionState {
    initialize_session_with_rng(
        hierarchy,
        module_snapshot,
        global_due,
        vocabulary,
        options,
        &mut rand::rng(),
    )
}

pub fn initialize_session_with_rng<R>(
    hierarchy: &VocabHierarchy,
    module_snapshot: &ScheduleSnapshot,
    global_due: &[DueItem],
    vocabulary: &[VocabularyItem],
    options: &SessionOptions,
    rng: &mut R,
) -> SessionState
where
    R: Rng + ?Sized,
{
    let start = Instant::now();
    let mut session = SessionState::empty(options);
    if vocabulary.is_empty() {
        tracing::debug!("No vocabulary, returning an empty session");
        return session;
    }

    let now = options.now;
    let mut items: HashMap<&str, &VocabularyItem> = HashMap::with_capacity(vocabulary.len());
    for item in vocabulary {
        items.entry(item.word.as_str()).or_insert(item);
    }

    for entry in hierarchy.entries() {
        let Some(item) = items.get(entry.word.as_str()) else {
            tracing::warn!("No vocabulary data for {}, skipping its card", entry.word);
            continue;
        };
        let key = CardKey::vocabulary(&entry.word).to_string();
        session.insert_card(vocabulary_card(
            item,
            options.mode,
            options.flip_vocab_qa,
            module_snapshot.get(&key),
            now,
        ));
    }

    if options.prerequisites_enabled {
        for kanji in hierarchy.unique_kanji() {
            let key = CardKey::kanji(&kanji.character).to_string();
            session.insert_card(kanji_card(
                kanji,
                options.mode,
                options.flip_prereq_qa,
                module_snapshot.get(&key),
                now,
            ));
        }
        for radical in hierarchy.unique_radicals() {
            let key = CardKey::radical(&radical.identifier()).to_string();
            session.insert_card(radical_card(
                radical,
                options.mode,
                options.flip_prereq_qa,
                module_snapshot.get(&key),
                now,
            ));
        }
    }

    session.graph = DependencyGraph::from_hierarchy(hierarchy);
    session.locked = session
        .graph
        .locked_keys(options.prerequisites_enabled, |key| module_snapshot.has_history(key));

    // Vocabulary is never held back by its due date
    if options.prerequisites_enabled {
        for card in session.cards.values_mut() {
            if card.item_type.is_prerequisite() && card.schedule.due > now {
                card.disabled = true;
            }
        }
    }

    if options.local_scheduler {
        session.interleaved_reviews =
            select_interleaved(global_due, &session.cards, options, hierarchy.item_count());
    }

    if options.shuffle {
        session.order.shuffle(rng);
    }

    let progress = session.progress();
    tracing::info!(
        cards = progress.total,
        presentable = progress.presentable,
        locked = progress.locked,
        disabled = progress.disabled,
        reviews = session.interleaved_reviews.len(),
        "Session initialized ({:.2}s)",
        start.elapsed().as_secs_f32()
    );

    session
}

/// Due reviews from outside the module, oldest first, sized to the interleaving share.
fn select_interleaved(
    global_due: &[DueItem],
    cards: &HashMap<String, PracticeCard>,
    options: &SessionOptions,
    module_item_count: usize,
) -> Vec<DueItem> {
    let mut due: Vec<&DueItem> = global_due
        .iter()
        .filter(|d| d.due_date <= options.now)
        .filter(|d| d.mode == options.mode)
        .filter(|d| d.item_type == ItemType::Vocabulary || options.prerequisites_enabled)
        .filter(|d| !cards.contains_key(&d.key))
        .collect();
    due.sort_by_key(|d| d.due_date);

    let mut seen = HashSet::new();
    due.into_iter()
        .filter(|d| seen.insert(d.key.as_str()))
        .take(interleave_capacity(module_item_count))
        .cloned()
        .collect()
}
