// detect.rs — Overwrite hazard rules
//
// Per symbol group, the assignment events are the occurrences that re-bind
// the existing variable.
//
//   Rule A: two or more events        → hazard listing every event
//   Rule B: exactly one event, strictly after the group's first position
//                                     → hazard listing that event
//
// Anything else is clean. The detector has no failure mode.

use serde::Serialize;

use crate::group::SymbolGroup;
use crate::matcher::SymbolKey;
use crate::source::Pos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HazardKind {
    Overwrite,
}

impl HazardKind {
    pub fn label(self) -> &'static str {
        match self {
            HazardKind::Overwrite => "Overwrite",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hazard {
    pub kind: HazardKind,
    pub symbol: SymbolKey,
    pub first_pos: Pos,
    /// Event positions in program order; never empty.
    pub positions: Vec<Pos>,
}

pub fn detect(group: &SymbolGroup) -> Option<Hazard> {
    let mut events: Vec<Pos> = group
        .occurrences
        .iter()
        .filter(|o| o.is_assign)
        .map(|o| o.pos)
        .collect();
    events.sort();

    let flagged = match events.as_slice() {
        [] => false,
        [only] => *only > group.first_pos,
        _ => true,
    };
    flagged.then(|| Hazard {
        kind: HazardKind::Overwrite,
        symbol: group.key.clone(),
        first_pos: group.first_pos,
        positions: events,
    })
}

/// Hazards of all groups, ordered by first position then name.
pub fn detect_all(groups: &[SymbolGroup]) -> Vec<Hazard> {
    let mut hazards: Vec<Hazard> = groups.iter().filter_map(detect).collect();
    hazards.sort_by(|a, b| {
        a.first_pos
            .cmp(&b.first_pos)
            .then_with(|| a.symbol.name.cmp(&b.symbol.name))
    });
    hazards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{FileId, ObjId, ScopeId};
    use crate::matcher::Occurrence;

    fn group(events: &[(usize, bool)]) -> SymbolGroup {
        let key = SymbolKey {
            scope: ScopeId(1),
            name: "ctx".into(),
        };
        let occurrences: Vec<Occurrence> = events
            .iter()
            .map(|&(offset, is_assign)| Occurrence {
                symbol: key.clone(),
                obj: ObjId(0),
                pos: Pos::new(FileId(0), offset),
                is_assign,
            })
            .collect();
        SymbolGroup {
            first_pos: occurrences[0].pos,
            key,
            occurrences,
        }
    }

    fn offsets(h: &Hazard) -> Vec<u32> {
        h.positions.iter().map(|p| p.offset).collect()
    }

    #[test]
    fn rule_a_two_events() {
        let h = detect(&group(&[(10, false), (20, true), (30, true)])).expect("hazard");
        assert_eq!(h.kind, HazardKind::Overwrite);
        assert_eq!(offsets(&h), vec![20, 30]);
    }

    #[test]
    fn rule_a_applies_even_when_first_event_is_first_position() {
        let h = detect(&group(&[(10, true), (30, true)])).expect("hazard");
        assert_eq!(offsets(&h), vec![10, 30]);
    }

    #[test]
    fn rule_b_single_event_after_first_position() {
        let h = detect(&group(&[(10, false), (25, false), (40, true)])).expect("hazard");
        assert_eq!(offsets(&h), vec![40]);
    }

    #[test]
    fn single_event_at_first_position_is_clean() {
        assert_eq!(detect(&group(&[(10, true), (20, false)])), None);
    }

    #[test]
    fn no_events_is_clean() {
        assert_eq!(detect(&group(&[(10, false), (20, false)])), None);
    }
}
