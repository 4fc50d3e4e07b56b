//! Registry merge: catalog + custom links + preferred order → display list.

use std::collections::{HashMap, HashSet};

use crate::model::link::LinkEntry;
use crate::persistence::types::StoredLink;

/// Combine the built-in catalog, the custom links and the preferred order.
///
/// Ids named in `order` come first, in that sequence; everything else follows
/// in base order (catalog, then customs in insertion order). Unknown ids in
/// `order` are skipped. Repeated ids keep their first occurrence.
pub fn compute(catalog: &[LinkEntry], custom: &[StoredLink], order: &[String]) -> Vec<LinkEntry> {
    let mut seen = HashSet::new();
    let base: Vec<LinkEntry> = catalog
        .iter()
        .cloned()
        .chain(
            custom
                .iter()
                .map(|link| LinkEntry::custom(link.label.clone(), link.href.clone())),
        )
        .filter(|entry| seen.insert(entry.id.clone()))
        .collect();

    if order.is_empty() {
        return base;
    }

    let positions: HashMap<&str, usize> = base
        .iter()
        .enumerate()
        .map(|(index, entry)| (entry.id.as_str(), index))
        .collect();

    let mut taken = vec![false; base.len()];
    let mut merged = Vec::with_capacity(base.len());
    for id in order {
        let Some(&index) = positions.get(id.as_str()) else {
            continue;
        };
        if !taken[index] {
            taken[index] = true;
            merged.push(base[index].clone());
        }
    }
    merged.extend(
        base.iter()
            .zip(taken)
            .filter(|(_, taken)| !taken)
            .map(|(entry, _)| entry.clone()),
    );
    merged
}

/// Ids of a registry, in display order.
pub fn order_of(registry: &[LinkEntry]) -> Vec<String> {
    registry.iter().map(|entry| entry.id.clone()).collect()
}
