//! Grand Prix scoring
//!
//! A fixed number of races with points awarded by finishing place and
//! accumulated per vehicle (indexed by grid slot).

use serde::{Deserialize, Serialize};

/// Points for 1st through 8th
pub const POINTS_TABLE: [u32; 8] = [10, 8, 6, 5, 4, 3, 2, 1];

/// Races in a Grand Prix
pub const GRAND_PRIX_RACES: u32 = 4;

/// Points for a 1-based place; zero beyond the table (or for place 0)
pub fn points_for_place(place: u32) -> u32 {
    place
        .checked_sub(1)
        .and_then(|i| POINTS_TABLE.get(i as usize))
        .copied()
        .unwrap_or(0)
}

/// One row of the standings table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub vehicle: usize,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrandPrix {
    /// Points per vehicle slot
    pub points: Vec<u32>,
    /// 0-based index of the current race
    pub race_index: u32,
    pub total_races: u32,
    pub finished: bool,
}

impl GrandPrix {
    pub fn new(vehicle_count: usize) -> Self {
        Self::with_races(vehicle_count, GRAND_PRIX_RACES)
    }

    pub fn with_races(vehicle_count: usize, total_races: u32) -> Self {
        Self {
            points: vec![0; vehicle_count],
            race_index: 0,
            total_races: total_races.max(1),
            finished: false,
        }
    }

    /// Add points for one race, given each slot's 1-based place
    pub fn award(&mut self, places: &[u32]) {
        for (slot, &place) in places.iter().enumerate() {
            if let Some(total) = self.points.get_mut(slot) {
                *total += points_for_place(place);
            }
        }
    }

    /// Move to the next race. Returns false (and marks the tournament
    /// finished) once the last race has been run.
    pub fn advance(&mut self) -> bool {
        if self.finished {
            return false;
        }
        if self.race_index + 1 >= self.total_races {
            self.finished = true;
            log::info!("Grand Prix finished after {} races", self.total_races);
            return false;
        }
        self.race_index += 1;
        log::info!("Grand Prix race {}/{}", self.race_index + 1, self.total_races);
        true
    }

    pub fn is_last_race(&self) -> bool {
        self.race_index + 1 >= self.total_races
    }

    /// Standings sorted by points, highest first; ties keep slot order
    pub fn standings(&self) -> Vec<Standing> {
        let mut table: Vec<Standing> = self
            .points
            .iter()
            .enumerate()
            .map(|(vehicle, &points)| Standing { vehicle, points })
            .collect();
        table.sort_by(|a, b| b.points.cmp(&a.points));
        table
    }

    /// Slot currently leading, if any vehicle is entered
    pub fn leader(&self) -> Option<Standing> {
        self.standings().first().copied()
    }
}
