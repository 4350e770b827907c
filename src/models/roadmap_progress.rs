use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db::models::Roadmap;

/// Checklist state sent by a client: key -> ticked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChecklistState {
    #[serde(default)]
    pub checked: HashMap<String, bool>,
}

/// Completion of a roadmap checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapProgress {
    pub done: usize,
    pub total: usize,
    /// `done / total` as a whole percentage, rounded half up.
    pub percent: u32,
}

/// Every checklist key of a roadmap, in document order.
///
/// A key is `"{step}.{group}.{item}"` using zero-based indices over
/// `steps[].topics[].items[]`.
pub fn checklist_keys(roadmap: &Roadmap) -> Vec<String> {
    roadmap
        .steps
        .iter()
        .enumerate()
        .flat_map(|(si, step)| {
            step.topics.iter().enumerate().flat_map(move |(gi, group)| {
                (0..group.items.len()).map(move |ii| format!("{si}.{gi}.{ii}"))
            })
        })
        .collect()
}

/// Compute progress. Keys that do not belong to the roadmap are ignored.
pub fn compute_progress(roadmap: &Roadmap, state: &ChecklistState) -> RoadmapProgress {
    let keys = checklist_keys(roadmap);
    let total = keys.len();
    let done = keys
        .iter()
        .filter(|k| state.checked.get(k.as_str()).copied().unwrap_or(false))
        .count();

    let percent = if total == 0 {
        0
    } else {
        ((done * 200 + total) / (2 * total)) as u32
    };

    RoadmapProgress { done, total, percent }
}
