use std::cmp::Ordering;

use crate::response::Journey;

/// A pareto front of journeys on (arrival time, number of transfers).
///
/// A journey is kept only if no other journey is at least as good on both
/// criteria and strictly better on one. Journeys equal on both criteria
/// are settled by total walking time, then by departure time, the
/// earlier departure winning.
#[derive(Debug, Default)]
pub struct JourneysFront {
    elements: Vec<Journey>,
}

impl JourneysFront {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn add(&mut self, journey: Journey) {
        for old in &self.elements {
            if beats(old, &journey) {
                return;
            }
        }
        self.elements.retain(|old| !beats(&journey, old));
        self.elements.push(journey);
    }

    pub fn into_journeys(self) -> Vec<Journey> {
        self.elements
    }
}

// Returns `true` if keeping `a` makes `b` useless.
fn beats(a: &Journey, b: &Journey) -> bool {
    let arrival_cmp = a.arrival_time.cmp(&b.arrival_time);
    let transfers_cmp = a.nb_of_transfers.cmp(&b.nb_of_transfers);
    match (arrival_cmp, transfers_cmp) {
        (Ordering::Greater, _) | (_, Ordering::Greater) => false,
        (Ordering::Less, _) | (_, Ordering::Less) => true,
        (Ordering::Equal, Ordering::Equal) => {
            // same criteria : tie-break on walking time, then departure
            let walk_cmp = a
                .total_walk_duration()
                .cmp(&b.total_walk_duration());
            let departure_cmp = a.departure_time.cmp(&b.departure_time);
            match (walk_cmp, departure_cmp) {
                (Ordering::Less, _) => true,
                (Ordering::Greater, _) => false,
                (Ordering::Equal, Ordering::Less) => true,
                (Ordering::Equal, _) => false,
            }
        }
    }
}
