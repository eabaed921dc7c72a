use std::collections::{
    BTreeMap,
    BTreeSet,
    HashMap,
};

use serde::{
    Deserialize,
    Serialize,
};
use uuid::Uuid;

use super::{
    CardKey,
    DependencyGraph,
    PracticeCard,
    SessionState,
};
use crate::{
    core::{
        KeikoError,
        PracticeMode,
    },
    scheduling::DueItem,
};

/// Wire form of a [`SessionState`]. Maps travel as `[key, value]` pairs and sets
/// as arrays so the payload survives consumers without native map or set types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTransport {
    pub id: Uuid,
    pub mode: PracticeMode,
    pub prerequisites_enabled: bool,
    /// In presentation order
    pub card_map: Vec<(String, PracticeCard)>,
    pub dependency_map: Vec<(String, Vec<String>)>,
    pub unlocks_map: Vec<(String, Vec<String>)>,
    pub locked_keys: Vec<String>,
    #[serde(default)]
    pub answered: Vec<String>,
    #[serde(default)]
    pub interleaved_reviews: Vec<DueItem>,
}

fn to_pairs(map: BTreeMap<String, BTreeSet<String>>) -> Vec<(String, Vec<String>)> {
    map.into_iter().map(|(key, values)| (key, values.into_iter().collect())).collect()
}

fn from_pairs(pairs: &[(String, Vec<String>)]) -> BTreeMap<String, BTreeSet<String>> {
    let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (key, values) in pairs {
        map.entry(key.clone()).or_default().extend(values.iter().cloned());
    }
    map.retain(|_, values| !values.is_empty());
    map
}

impl SessionState {
    pub fn to_transport(&self) -> SessionTransport {
        SessionTransport {
            id: self.id,
            mode: self.mode,
            prerequisites_enabled: self.prerequisites_enabled,
            card_map: self
                .cards()
                .map(|card| (card.key.clone(), card.clone()))
                .collect(),
            dependency_map: to_pairs(self.dependency_map()),
            unlocks_map: to_pairs(self.unlocks_map()),
            locked_keys: self.locked.iter().cloned().collect(),
            answered: self.answered.iter().cloned().collect(),
            interleaved_reviews: self.interleaved_reviews.clone(),
        }
    }

    /// Rebuilds the native session, refusing payloads whose parts disagree.
    pub fn from_transport(transport: SessionTransport) -> Result<Self, KeikoError> {
        let mut cards = HashMap::with_capacity(transport.card_map.len());
        let mut order = Vec::with_capacity(transport.card_map.len());
        for (key, card) in transport.card_map {
            if key != card.key {
                return Err(KeikoError::Transport(format!(
                    "card stored under {} carries key {}",
                    key, card.key
                )));
            }
            CardKey::parse(&key)?;
            if cards.contains_key(&key) {
                return Err(KeikoError::Transport(format!("duplicate card {}", key)));
            }
            order.push(key.clone());
            cards.insert(key, card);
        }

        let mut graph = DependencyGraph::from_dependency_pairs(&transport.dependency_map)?;
        if graph.unlocks_map() != from_pairs(&transport.unlocks_map) {
            return Err(KeikoError::Transport(
                "unlocksMap is not the complement of dependencyMap".to_string(),
            ));
        }
        for key in &order {
            graph.add_node(&CardKey::parse(key)?);
        }

        let locked: BTreeSet<String> = transport.locked_keys.into_iter().collect();
        if let Some(unknown) = locked.iter().find(|key| !graph.contains(key)) {
            return Err(KeikoError::Transport(format!("locked key {} is not in the graph", unknown)));
        }

        let answered: BTreeSet<String> = transport.answered.into_iter().collect();
        if let Some(unknown) = answered.iter().find(|key| !cards.contains_key(*key)) {
            return Err(KeikoError::Transport(format!("answered key {} has no card", unknown)));
        }

        Ok(Self {
            id: transport.id,
            mode: transport.mode,
            prerequisites_enabled: transport.prerequisites_enabled,
            cards,
            order,
            graph,
            locked,
            answered,
            interleaved_reviews: transport.interleaved_reviews,
        })
    }

    pub fn to_json(&self) -> Result<String, KeikoError> {
        Ok(serde_json::to_string_pretty(&self.to_transport())?)
    }

    pub fn from_json(json: &str) -> Result<Self, KeikoError> {
        let transport: SessionTransport = serde_json::from_str(json)?;
        Self::from_transport(transport)
    }
}
