// group.rs — Partition occurrences by symbol identity
//
// Groups are keyed by (declaring scope, name); the blank identifier never
// forms a group. The result is an explicitly sorted sequence, by first
// position and then name, so reporting never depends on map iteration order.

use std::collections::BTreeMap;

use crate::matcher::{Occurrence, SymbolKey};
use crate::source::Pos;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolGroup {
    pub key: SymbolKey,
    /// Occurrences in program order; never empty.
    pub occurrences: Vec<Occurrence>,
    pub first_pos: Pos,
}

pub fn group_occurrences(occurrences: Vec<Occurrence>) -> Vec<SymbolGroup> {
    let mut by_key: BTreeMap<SymbolKey, Vec<Occurrence>> = BTreeMap::new();
    for occ in occurrences {
        if occ.symbol.name == "_" {
            continue;
        }
        by_key.entry(occ.symbol.clone()).or_default().push(occ);
    }

    let mut groups: Vec<SymbolGroup> = by_key
        .into_iter()
        .filter_map(|(key, mut occurrences)| {
            occurrences.sort_by_key(|o| o.pos);
            let first_pos = occurrences.first()?.pos;
            Some(SymbolGroup {
                key,
                occurrences,
                first_pos,
            })
        })
        .collect();
    groups.sort_by(|a, b| {
        a.first_pos
            .cmp(&b.first_pos)
            .then_with(|| a.key.name.cmp(&b.key.name))
    });
    groups
}
