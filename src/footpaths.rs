use std::collections::{BTreeMap, HashMap};

use log::warn;

use crate::config::ModelParams;
use crate::feed::TransferRecord;
use crate::geometry::{distance_coord_to_coord, StopGrid};
use crate::time::PositiveDuration;
use crate::transit_data::{Stop, StopData};

/// Walkable edges between nearby stops, in compressed neighbour lists :
/// the neighbours of stop `s` are
/// `neighbours[first_neighbour[s.idx] .. first_neighbour[s.idx + 1]]`.
///
/// The graph is symmetric. Walking times are crow-fly estimates from the
/// stop coordinates, except for pairs covered by a feed transfer, which
/// takes precedence.
#[derive(Debug)]
pub struct FootPaths {
    first_neighbour: Vec<usize>,
    neighbours: Vec<(Stop, PositiveDuration)>,
}

impl FootPaths {
    pub(crate) fn new(
        stop_datas: &[StopData],
        grid: &StopGrid,
        transfers: &[TransferRecord],
        stop_id_to_stop: &HashMap<String, Stop>,
        params: &ModelParams,
    ) -> Self {
        let max_walk_duration = params.max_walk_duration();

        let mut edges: BTreeMap<(usize, usize), PositiveDuration> = BTreeMap::new();
        for (idx, stop_data) in stop_datas.iter().enumerate() {
            for neighbour in
                grid.candidates_within(&stop_data.coord, params.max_walk_radius_meters)
            {
                if neighbour.idx == idx {
                    continue;
                }
                let distance = distance_coord_to_coord(
                    &stop_data.coord,
                    &stop_datas[neighbour.idx].coord,
                );
                if distance <= params.max_walk_radius_meters {
                    edges.insert((idx, neighbour.idx), params.walk_duration(distance));
                }
            }
        }

        for transfer in transfers {
            let from = stop_id_to_stop.get(&transfer.from_stop_id);
            let to = stop_id_to_stop.get(&transfer.to_stop_id);
            let (from, to) = match (from, to) {
                (Some(from), Some(to)) => (*from, *to),
                _ => {
                    warn!(
                        "Skipping transfer between `{}` and `{}` : unknown stop",
                        transfer.from_stop_id, transfer.to_stop_id
                    );
                    continue;
                }
            };
            if from == to {
                continue;
            }
            if transfer.duration > max_walk_duration {
                warn!(
                    "Skipping transfer between `{}` and `{}` : {} is longer than the maximum walk of {}",
                    transfer.from_stop_id, transfer.to_stop_id, transfer.duration, max_walk_duration
                );
                continue;
            }
            edges.insert((from.idx, to.idx), transfer.duration);
            edges.insert((to.idx, from.idx), transfer.duration);
        }

        let mut first_neighbour = Vec::with_capacity(stop_datas.len() + 1);
        let mut neighbours = Vec::with_capacity(edges.len());
        first_neighbour.push(0);
        for idx in 0..stop_datas.len() {
            for ((_, to_idx), duration) in edges.range((idx, 0)..(idx + 1, 0)) {
                neighbours.push((Stop { idx: *to_idx }, *duration));
            }
            first_neighbour.push(neighbours.len());
        }

        Self {
            first_neighbour,
            neighbours,
        }
    }

    pub fn neighbours(&self, stop: &Stop) -> &[(Stop, PositiveDuration)] {
        let begin = self.first_neighbour[stop.idx];
        let end = self.first_neighbour[stop.idx + 1];
        &self.neighbours[begin..end]
    }

    pub fn nb_of_footpaths(&self) -> usize {
        self.neighbours.len()
    }
}
