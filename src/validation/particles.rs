use std::collections::HashMap;

use crate::core::{
    utils::normalize_answer,
    ParticleSlot,
};

/// Label group for slots that do not name one.
pub const DEFAULT_LABEL: &str = "default";

/// Checks each submitted particle against the pool of its slot's label group.
///
/// Submissions are consumed in slot order and a matched particle is removed from
/// its pool. With duplicate values in a pool the outcome can therefore depend on
/// which blank was filled with what; this greedy behavior is kept on purpose and
/// is not a bipartite matching.
pub fn validate_particles<S: AsRef<str>>(submitted: &[S], correct: &[ParticleSlot]) -> Vec<bool> {
    let mut pools: HashMap<&str, Vec<String>> = HashMap::new();
    for slot in correct {
        pools.entry(slot_label(slot)).or_default().push(normalize_answer(&slot.particle));
    }

    submitted
        .iter()
        .enumerate()
        .map(|(index, submission)| {
            let label = correct.get(index).map(slot_label).unwrap_or(DEFAULT_LABEL);
            let normalized = normalize_answer(submission.as_ref());
            if normalized.is_empty() {
                return false;
            }

            match pools.get_mut(label) {
                Some(pool) => match pool.iter().position(|p| *p == normalized) {
                    Some(found) => {
                        pool.swap_remove(found);
                        true
                    }
                    None => false,
                },
                None => false,
            }
        })
        .collect()
}

fn slot_label(slot: &ParticleSlot) -> &str {
    slot.label.as_deref().unwrap_or(DEFAULT_LABEL)
}
