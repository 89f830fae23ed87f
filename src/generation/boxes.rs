use std::collections::BTreeSet;

use crate::types::identifiers::{BoxKey, Straight};

pub fn normalize(straight: &Straight) -> BoxKey {
    straight.to_box()
}

/// Collapse straights to their boxes, sorted ascending.
pub fn dedup_boxes<'a, I>(straights: I) -> Vec<BoxKey>
where
    I: IntoIterator<Item = &'a Straight>,
{
    straights
        .into_iter()
        .map(normalize)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
