//! Collapses raw begin/end transitions into contact intervals, ignoring
//! separations shorter than a slop window.
//!
//! Engine solvers report spurious micro-separations while an object sits
//! or slides on another. A separation followed by a new begin for the
//! same pair within `slop_time` seconds is treated as one continuous
//! contact.

use std::collections::HashMap;

use super::{CollisionEvent, CollisionPhase, ContactInfo, ContactInterval};

#[derive(Default)]
struct PairState {
    /// Start time and opening contact info of the currently open interval
    open: Option<(f32, ContactInfo)>,
    /// Time of the last separation not yet committed as an interval end
    pending_end: Option<f32>,
}

fn canonical_pair(first: &str, second: &str) -> (String, String) {
    if first <= second {
        (first.to_owned(), second.to_owned())
    } else {
        (second.to_owned(), first.to_owned())
    }
}

/// The event's contact info with the normal re-oriented to the
/// canonical name order.
fn oriented_info(event: &CollisionEvent) -> ContactInfo {
    let mut info = event.info.clone();
    if event.first > event.second {
        info.normal = [-info.normal[0], -info.normal[1]];
    }
    info
}

/// Merges a time-ordered event log into contact intervals.
///
/// Intervals for pairs still in contact at the end of the log carry
/// `end: None`. The result is sorted by start time, ties broken by the
/// pair names.
pub fn filter_collision_events(
    events: &[CollisionEvent],
    slop_time: f32,
) -> Vec<ContactInterval> {
    let mut states: HashMap<(String, String), PairState> = HashMap::new();
    let mut intervals = Vec::new();

    for event in events {
        let key = canonical_pair(&event.first, &event.second);
        let state = states.entry(key.clone()).or_default();
        match event.phase {
            CollisionPhase::Begin => {
                match state.pending_end {
                    // Re-contact within the slop window: same interval.
                    Some(sep) if event.time - sep < slop_time => {
                        state.pending_end = None;
                    }
                    Some(sep) => {
                        if let Some((start, info)) = state.open.take() {
                            intervals.push(ContactInterval {
                                first: key.0.clone(),
                                second: key.1.clone(),
                                start,
                                end: Some(sep),
                                info,
                            });
                        }
                        state.pending_end = None;
                        state.open = Some((event.time, oriented_info(event)));
                    }
                    None => {
                        if state.open.is_none() {
                            state.open = Some((event.time, oriented_info(event)));
                        }
                    }
                }
            }
            CollisionPhase::End => {
                if state.open.is_some() {
                    state.pending_end = Some(event.time);
                }
            }
        }
    }

    for ((first, second), state) in states {
        if let Some((start, info)) = state.open {
            intervals.push(ContactInterval {
                first,
                second,
                start,
                end: state.pending_end,
                info,
            });
        }
    }

    intervals.sort_by(|a, b| {
        a.start
            .total_cmp(&b.start)
            .then_with(|| a.first.cmp(&b.first))
            .then_with(|| a.second.cmp(&b.second))
    });
    intervals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ContactInfo;

    fn ev(first: &str, second: &str, time: f32, phase: CollisionPhase) -> CollisionEvent {
        CollisionEvent::new(first, second, time, phase, ContactInfo::default())
    }

    fn ev_with_normal(
        first: &str,
        second: &str,
        time: f32,
        phase: CollisionPhase,
        normal: [f32; 2],
    ) -> CollisionEvent {
        let info = ContactInfo {
            normal,
            ..ContactInfo::default()
        };
        CollisionEvent::new(first, second, time, phase, info)
    }

    #[test]
    fn short_separation_is_merged() {
        let events = vec![
            ev("Ball", "Floor", 1.0, CollisionPhase::Begin),
            ev("Ball", "Floor", 1.5, CollisionPhase::End),
            ev("Ball", "Floor", 1.6, CollisionPhase::Begin),
            ev("Ball", "Floor", 3.0, CollisionPhase::End),
        ];
        let intervals = filter_collision_events(&events, 0.2001);
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].start, 1.0);
        assert_eq!(intervals[0].end, Some(3.0));
    }

    #[test]
    fn long_separation_splits_intervals() {
        let events = vec![
            ev("Ball", "Floor", 1.0, CollisionPhase::Begin),
            ev("Ball", "Floor", 1.5, CollisionPhase::End),
            ev("Ball", "Floor", 2.5, CollisionPhase::Begin),
        ];
        let intervals = filter_collision_events(&events, 0.2001);
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].end, Some(1.5));
        assert_eq!(intervals[1].start, 2.5);
        assert_eq!(intervals[1].end, None);
    }

    #[test]
    fn swapped_order_is_one_pair() {
        let events = vec![
            ev("Floor", "Ball", 1.0, CollisionPhase::Begin),
            ev("Ball", "Floor", 1.5, CollisionPhase::End),
        ];
        let intervals = filter_collision_events(&events, 0.2001);
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].first, "Ball");
        assert_eq!(intervals[0].second, "Floor");
        assert_eq!(intervals[0].end, Some(1.5));
    }

    #[test]
    fn unended_contact_stays_open() {
        let events = vec![ev("A", "B", 0.4, CollisionPhase::Begin)];
        let intervals = filter_collision_events(&events, 0.2001);
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].end, None);
    }

    #[test]
    fn interval_keeps_opening_contact_info() {
        let events = vec![
            ev_with_normal("Ball", "Floor", 1.0, CollisionPhase::Begin, [0.0, 1.0]),
            ev("Ball", "Floor", 1.5, CollisionPhase::End),
            // Merged re-contact must not overwrite the opening snapshot.
            ev_with_normal("Ball", "Floor", 1.6, CollisionPhase::Begin, [1.0, 0.0]),
        ];
        let intervals = filter_collision_events(&events, 0.2001);
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].info.normal, [0.0, 1.0]);
    }

    #[test]
    fn swapped_pair_flips_the_stored_normal() {
        let events = vec![ev_with_normal(
            "Floor",
            "Ball",
            1.0,
            CollisionPhase::Begin,
            [0.0, 1.0],
        )];
        let intervals = filter_collision_events(&events, 0.2001);
        assert_eq!(intervals[0].first, "Ball");
        assert_eq!(intervals[0].info.normal, [0.0, -1.0]);
    }

    #[test]
    fn independent_pairs_sorted_by_start() {
        let events = vec![
            ev("C", "D", 2.0, CollisionPhase::Begin),
            ev("A", "B", 1.0, CollisionPhase::Begin),
            ev("A", "B", 1.2, CollisionPhase::End),
        ];
        let intervals = filter_collision_events(&events, 0.2001);
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].first, "A");
        assert_eq!(intervals[1].first, "C");
    }
}
