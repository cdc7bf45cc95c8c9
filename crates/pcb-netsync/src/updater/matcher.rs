use crate::board::Footprint;
use crate::netlist::Component;

/// Result of looking up a component among the board footprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FootprintMatch {
    None,
    Unique(usize),
    /// Several footprints match; `first` is the earliest in board order.
    Ambiguous { first: usize, count: usize },
}

impl FootprintMatch {
    /// Footprint to synchronize with, if any.
    pub fn index(self) -> Option<usize> {
        match self {
            FootprintMatch::None => None,
            FootprintMatch::Unique(i) | FootprintMatch::Ambiguous { first: i, .. } => Some(i),
        }
    }
}

fn matches(footprint: &Footprint, component: &Component, by_path: bool) -> bool {
    if by_path {
        !component.path.is_empty() && footprint.path == component.path
    } else {
        footprint.reference.eq_ignore_ascii_case(&component.reference)
    }
}

/// Match `component` against the first `boundary` footprints only, so that
/// footprints added earlier in the same pass are never candidates.
pub fn match_component(
    footprints: &[Footprint],
    boundary: usize,
    component: &Component,
    by_path: bool,
) -> FootprintMatch {
    let mut found = footprints
        .iter()
        .take(boundary)
        .enumerate()
        .filter(|(_, fp)| matches(fp, component, by_path))
        .map(|(i, _)| i);

    let Some(first) = found.next() else {
        return FootprintMatch::None;
    };
    match found.count() {
        0 => FootprintMatch::Unique(first),
        more => FootprintMatch::Ambiguous {
            first,
            count: more + 1,
        },
    }
}
