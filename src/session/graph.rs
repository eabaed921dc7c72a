use std::collections::{
    BTreeMap,
    BTreeSet,
    HashMap,
};

use super::card::CardKey;
use crate::{
    core::{
        ItemType,
        KeikoError,
    },
    hierarchy::VocabHierarchy,
};

type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
struct GraphNode {
    key: String,
    item_type: ItemType,
    /// Upper-tier nodes built from this one
    dependents: BTreeSet<NodeId>,
    /// Lower-tier nodes this one is built from
    unlocks: BTreeSet<NodeId>,
}

/// Vocabulary → kanji → radical edges held in one arena, indexed by card key.
/// Both edge directions are stored on the nodes so each is always the exact
/// complement of the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<String, NodeId>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_hierarchy(hierarchy: &VocabHierarchy) -> Self {
        let mut graph = Self::new();

        for entry in hierarchy.entries() {
            let word = CardKey::vocabulary(&entry.word);
            graph.add_node(&word);
            for character in &entry.kanji {
                if hierarchy.kanji(character).is_some() {
                    graph.add_edge(&word, &CardKey::kanji(character));
                }
            }
        }

        for kanji in hierarchy.unique_kanji() {
            let upper = CardKey::kanji(&kanji.character);
            graph.add_node(&upper);
            for identifier in &kanji.radicals {
                if hierarchy.radical(identifier).is_some() {
                    graph.add_edge(&upper, &CardKey::radical(identifier));
                }
            }
        }

        for radical in hierarchy.unique_radicals() {
            graph.add_node(&CardKey::radical(&radical.identifier()));
        }

        graph
    }

    /// Rebuilds a graph from `lower → uppers` pairs.
    pub fn from_dependency_pairs(pairs: &[(String, Vec<String>)]) -> Result<Self, KeikoError> {
        let mut graph = Self::new();
        for (lower, uppers) in pairs {
            let lower = CardKey::parse(lower)?;
            graph.add_node(&lower);
            for upper in uppers {
                graph.add_edge(&CardKey::parse(upper)?, &lower);
            }
        }
        Ok(graph)
    }

    pub fn add_node(&mut self, key: &CardKey) -> NodeId {
        let key_string = key.to_string();
        if let Some(&id) = self.index.get(&key_string) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(GraphNode {
            key: key_string.clone(),
            item_type: key.item_type,
            dependents: BTreeSet::new(),
            unlocks: BTreeSet::new(),
        });
        self.index.insert(key_string, id);
        id
    }

    /// Records that `upper` is built from `lower`.
    pub fn add_edge(&mut self, upper: &CardKey, lower: &CardKey) {
        let upper_id = self.add_node(upper);
        let lower_id = self.add_node(lower);
        self.nodes[upper_id].unlocks.insert(lower_id);
        self.nodes[lower_id].dependents.insert(upper_id);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn dependents(&self, key: &str) -> Vec<&str> {
        self.node(key).map(|n| self.keys_of(&n.dependents)).unwrap_or_default()
    }

    pub fn unlocks(&self, key: &str) -> Vec<&str> {
        self.node(key).map(|n| self.keys_of(&n.unlocks)).unwrap_or_default()
    }

    /// Lower-tier key → upper-tier keys depending on it.
    pub fn dependency_map(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.edge_map(|n| &n.dependents)
    }

    /// Upper-tier key → lower-tier keys it unlocks.
    pub fn unlocks_map(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.edge_map(|n| &n.unlocks)
    }

    /// Prerequisites withheld until one of their dependents has been reviewed.
    ///
    /// A node is locked when it has dependents, none of them has history, and it
    /// has no history itself. Anything the learner has already reviewed stays
    /// unlocked even if its dependents are still new.
    pub fn locked_keys<F>(&self, prerequisites_enabled: bool, has_history: F) -> BTreeSet<String>
    where
        F: Fn(&str) -> bool,
    {
        if !prerequisites_enabled {
            return BTreeSet::new();
        }

        self.nodes
            .iter()
            .filter(|n| n.item_type.is_prerequisite())
            .filter(|n| !n.dependents.is_empty())
            .filter(|n| !n.dependents.iter().any(|&d| has_history(&self.nodes[d].key)))
            .filter(|n| !has_history(&n.key))
            .map(|n| n.key.clone())
            .collect()
    }

    fn node(&self, key: &str) -> Option<&GraphNode> {
        self.index.get(key).map(|&id| &self.nodes[id])
    }

    fn keys_of(&self, ids: &BTreeSet<NodeId>) -> Vec<&str> {
        ids.iter().map(|&id| self.nodes[id].key.as_str()).collect()
    }

    fn edge_map<F>(&self, edges: F) -> BTreeMap<String, BTreeSet<String>>
    where
        F: Fn(&GraphNode) -> &BTreeSet<NodeId>,
    {
        self.nodes
            .iter()
            .filter(|n| !edges(*n).is_empty())
            .map(|n| {
                let targets = edges(n).iter().map(|&id| self.nodes[id].key.clone()).collect();
                (n.key.clone(), targets)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{
        core::{
            Kanji,
            Radical,
        },
        hierarchy::HierarchyEntry,
    };

    fn kanji(character: &str, radicals: &[&str]) -> Kanji {
        let mut kanji = Kanji::placeholder(character);
        kanji.radicals = radicals.iter().map(|r| r.to_string()).collect();
        kanji
    }

    fn sample_hierarchy() -> VocabHierarchy {
        VocabHierarchy::from_parts(
            vec![
                HierarchyEntry { word: "日本".into(), kanji: vec!["日".into(), "本".into()] },
                HierarchyEntry { word: "日曜日".into(), kanji: vec!["日".into(), "曜".into()] },
                HierarchyEntry { word: "これ".into(), kanji: Vec::new() },
            ],
            vec![kanji("日", &["日"]), kanji("本", &["木"]), kanji("曜", &["日", "ヨ"])],
            vec![Radical::placeholder("日"), Radical::placeholder("木")],
        )
    }

    #[test]
    fn test_edges_from_hierarchy() {
        let graph = DependencyGraph::from_hierarchy(&sample_hierarchy());

        assert_eq!(graph.dependents("kanji:日"), vec!["vocabulary:日本", "vocabulary:日曜日"]);
        assert_eq!(graph.dependents("radical:日"), vec!["kanji:日", "kanji:曜"]);
        assert_eq!(graph.unlocks("kanji:曜"), vec!["radical:日"]);
        assert!(graph.contains("vocabulary:これ"));
        assert!(graph.unlocks("vocabulary:これ").is_empty());
        // ヨ has no radical record, so no edge
        assert!(!graph.contains("radical:ヨ"));
    }

    #[test]
    fn test_unlocks_map_is_exact_complement() {
        let graph = DependencyGraph::from_hierarchy(&sample_hierarchy());
        let dependency = graph.dependency_map();
        let unlocks = graph.unlocks_map();

        let forward: HashSet<(String, String)> = unlocks
            .iter()
            .flat_map(|(upper, lowers)| lowers.iter().map(move |l| (upper.clone(), l.clone())))
            .collect();
        let reverse: HashSet<(String, String)> = dependency
            .iter()
            .flat_map(|(lower, uppers)| uppers.iter().map(move |u| (u.clone(), lower.clone())))
            .collect();
        assert_eq!(forward, reverse);
        assert_eq!(forward.len(), 7);
    }

    #[test]
    fn test_locked_keys() {
        let graph = DependencyGraph::from_hierarchy(&sample_hierarchy());

        let locked = graph.locked_keys(true, |_| false);
        let expected: BTreeSet<String> =
            ["kanji:日", "kanji:本", "kanji:曜", "radical:日", "radical:木"]
                .iter()
                .map(|k| k.to_string())
                .collect();
        assert_eq!(locked, expected);

        // 日本 reviewed: its kanji open up, the radicals wait on the kanji
        let locked = graph.locked_keys(true, |key| key == "vocabulary:日本");
        assert!(!locked.contains("kanji:日"));
        assert!(!locked.contains("kanji:本"));
        assert!(locked.contains("kanji:曜"));
        assert!(locked.contains("radical:日"));

        assert!(graph.locked_keys(false, |_| false).is_empty());
    }

    #[test]
    fn test_seen_prerequisite_never_locked() {
        let graph = DependencyGraph::from_hierarchy(&sample_hierarchy());
        let locked = graph.locked_keys(true, |key| key == "radical:木");
        assert!(!locked.contains("radical:木"));
        assert!(locked.contains("kanji:本"));
    }

    #[test]
    fn test_rebuild_from_dependency_pairs() {
        let graph = DependencyGraph::from_hierarchy(&sample_hierarchy());
        let pairs: Vec<(String, Vec<String>)> = graph
            .dependency_map()
            .into_iter()
            .map(|(lower, uppers)| (lower, uppers.into_iter().collect()))
            .collect();

        let rebuilt = DependencyGraph::from_dependency_pairs(&pairs).unwrap();
        assert_eq!(rebuilt.dependency_map(), graph.dependency_map());
        assert_eq!(rebuilt.unlocks_map(), graph.unlocks_map());

        let bad = vec![("kanji:日".to_string(), vec!["nonsense".to_string()])];
        assert!(DependencyGraph::from_dependency_pairs(&bad).is_err());
    }
}
