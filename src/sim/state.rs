//! Race session state
//!
//! One explicitly owned [`RaceSession`] holds everything a race needs:
//! vehicles, AI drivers, countdown, timers and Grand Prix standings.
//! Render, menu and input layers read from it and drive it through the
//! command methods here plus [`super::tick`].

use serde::{Deserialize, Serialize};

use super::ai::AiDriver;
use super::grand_prix::{GrandPrix, Standing};
use super::vehicle::{MeshHandle, VEHICLE_COLORS, Vehicle, VehicleClass};
use crate::consts::*;
use crate::settings::RaceSettings;
use crate::track::TrackQuery;
use crate::{heading_of, right_from_yaw};

/// Lateral distance between the two grid columns
pub const GRID_COLUMN_SPACING: f32 = 6.0;
/// Distance between grid rows
pub const GRID_ROW_SPACING: f32 = 6.0;

/// Distance of a grid slot behind pole: two columns, the right one staggered half a row
fn grid_depth(slot: usize) -> f32 {
    let row = (slot / 2) as f32;
    let column = (slot % 2) as f32;
    row * GRID_ROW_SPACING + column * GRID_ROW_SPACING * 0.5
}

/// Top-level race state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceState {
    Init,
    Menu,
    /// Grid built, countdown starts next tick
    Loading,
    Countdown,
    Racing,
    Paused,
    /// Finish condition met; results are tallied next tick
    Finished,
    Results,
}

/// Race mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RaceMode {
    /// Player against AI
    #[default]
    SingleRace,
    /// Player alone
    TimeTrial,
    /// Player against AI over several races
    GrandPrix,
    /// AI only
    Spectator,
}

impl RaceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RaceMode::SingleRace => "Single Race",
            RaceMode::TimeTrial => "Time Trial",
            RaceMode::GrandPrix => "Grand Prix",
            RaceMode::Spectator => "Spectator",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace([' ', '_', '-'], "").as_str() {
            "singlerace" | "race" => Some(RaceMode::SingleRace),
            "timetrial" => Some(RaceMode::TimeTrial),
            "grandprix" | "gp" => Some(RaceMode::GrandPrix),
            "spectator" | "demo" => Some(RaceMode::Spectator),
            _ => None,
        }
    }

    pub fn has_player(&self) -> bool {
        !matches!(self, RaceMode::Spectator)
    }
}

/// Place for each vehicle: 1 + number of others strictly further along.
/// Equal progress shares a place.
pub fn compute_places(vehicles: &[Vehicle]) -> Vec<u32> {
    vehicles
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let progress = v.composite_progress();
            let ahead = vehicles
                .iter()
                .enumerate()
                .filter(|&(j, other)| j != i && other.composite_progress() > progress)
                .count();
            1 + ahead as u32
        })
        .collect()
}

/// Everything owned by one race session
#[derive(Debug, Clone)]
pub struct RaceSession {
    pub state: RaceState,
    /// State to return to when unpausing
    pub(crate) paused_from: Option<RaceState>,
    pub settings: RaceSettings,
    /// Seconds left in the countdown
    pub countdown: f32,
    /// Number shown on the countdown (3, 2, 1, 0)
    pub countdown_display: u32,
    /// Seconds since the start of the race
    pub race_time: f32,
    pub vehicles: Vec<Vehicle>,
    pub drivers: Vec<AiDriver>,
    /// Slot of the human player, if any
    pub player: Option<usize>,
    pub grand_prix: Option<GrandPrix>,
}

impl Default for RaceSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RaceSession {
    pub fn new() -> Self {
        Self {
            state: RaceState::Init,
            paused_from: None,
            settings: RaceSettings::default(),
            countdown: COUNTDOWN_TIME,
            countdown_display: COUNTDOWN_TIME as u32,
            race_time: 0.0,
            vehicles: Vec::new(),
            drivers: Vec::new(),
            player: None,
            grand_prix: None,
        }
    }

    pub fn state(&self) -> RaceState {
        self.state
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn player_vehicle(&self) -> Option<&Vehicle> {
        self.player.and_then(|p| self.vehicles.get(p))
    }

    pub fn countdown_display(&self) -> u32 {
        self.countdown_display
    }

    /// Grand Prix standings, when a tournament is running
    pub fn standings(&self) -> Option<Vec<Standing>> {
        self.grand_prix.as_ref().map(GrandPrix::standings)
    }

    /// Start a race (or a whole Grand Prix) with fresh vehicles and drivers
    pub fn start_race(&mut self, settings: RaceSettings, track: &dyn TrackQuery) {
        self.settings = settings;
        self.settings.laps = self.settings.laps.max(1);

        let has_player = self.settings.mode.has_player();
        let ai_count = match self.settings.mode {
            RaceMode::TimeTrial => 0,
            RaceMode::Spectator => self.settings.opponents.clamp(1, MAX_VEHICLES),
            _ => self.settings.opponents.min(MAX_VEHICLES - 1),
        };

        self.vehicles.clear();
        self.player = None;
        if has_player {
            self.player = Some(0);
            self.vehicles
                .push(Vehicle::new(self.settings.player_class, VEHICLE_COLORS[0], true));
        }
        for _ in 0..ai_count {
            let slot = self.vehicles.len();
            let class = VehicleClass::ALL[slot % VehicleClass::ALL.len()];
            self.vehicles
                .push(Vehicle::new(class, VEHICLE_COLORS[slot], false));
        }

        self.grand_prix = match self.settings.mode {
            RaceMode::GrandPrix => Some(GrandPrix::new(self.vehicles.len())),
            _ => None,
        };

        log::info!(
            "Starting {} ({} laps, {} vehicles, {} AI)",
            self.settings.mode.as_str(),
            self.settings.laps,
            self.vehicles.len(),
            self.settings.difficulty.as_str()
        );
        self.load_race(track);
    }

    /// Reset the grid and drivers for the current (or next) race
    fn load_race(&mut self, track: &dyn TrackQuery) {
        // The back of the grid sits on the line so nobody starts a lap behind
        let back_slot = self.vehicles.len().saturating_sub(1);
        let depth = grid_depth(back_slot);

        for (slot, vehicle) in self.vehicles.iter_mut().enumerate() {
            let column = (slot % 2) as f32;
            let (center, dir) = track.position_and_direction_at(depth - grid_depth(slot));
            let yaw = heading_of(dir);
            let pos = center + right_from_yaw(yaw) * ((column - 0.5) * GRID_COLUMN_SPACING);
            let height = track.surface_at(pos).height;
            vehicle.reset(pos.with_y(height), yaw, self.settings.laps);
            vehicle.track_progress =
                track.progress_fraction(vehicle.position, track.nearest_segment(vehicle.position));
        }
        self.update_places();

        let race_index = self.grand_prix.as_ref().map_or(0, |gp| gp.race_index) as u64;
        self.drivers = self
            .vehicles
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_player)
            .map(|(slot, _)| {
                let seed = self
                    .settings
                    .seed
                    .wrapping_add((slot as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
                    .wrapping_add(race_index);
                AiDriver::new(slot, self.settings.difficulty, seed)
            })
            .collect();

        self.race_time = 0.0;
        self.countdown = COUNTDOWN_TIME;
        self.countdown_display = COUNTDOWN_TIME as u32;
        self.paused_from = None;
        self.state = RaceState::Loading;
    }

    /// Attach a render handle to a vehicle slot. Unknown slots are ignored.
    pub fn attach_mesh(&mut self, slot: usize, mesh: MeshHandle) {
        match self.vehicles.get_mut(slot) {
            Some(vehicle) => vehicle.mesh = Some(mesh),
            None => log::warn!("Ignoring mesh for unknown vehicle slot {}", slot),
        }
    }

    /// Run the current race again from the grid. Grand Prix points are kept,
    /// so a Grand Prix race that has already been scored can't be rerun.
    pub fn restart(&mut self, track: &dyn TrackQuery) {
        if self.vehicles.is_empty() {
            return;
        }
        if self.state == RaceState::Results && self.grand_prix.is_some() {
            log::warn!("Grand Prix race already scored, not restarting");
            return;
        }
        log::info!("Restarting race");
        self.load_race(track);
    }

    /// Drop the race and go back to the menu
    pub fn return_to_menu(&mut self) {
        self.vehicles.clear();
        self.drivers.clear();
        self.player = None;
        self.grand_prix = None;
        self.paused_from = None;
        self.state = RaceState::Menu;
    }

    pub fn pause(&mut self) {
        if matches!(self.state, RaceState::Countdown | RaceState::Racing) {
            self.paused_from = Some(self.state);
            self.state = RaceState::Paused;
            log::info!("Paused");
        }
    }

    pub fn resume(&mut self) {
        if self.state == RaceState::Paused {
            self.state = self.paused_from.take().unwrap_or(RaceState::Racing);
            log::info!("Resumed");
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.state == RaceState::Paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// From the results screen, load the next Grand Prix race.
    /// Returns false when there is no next race (not a Grand Prix, not on
    /// results, or the tournament just ended).
    pub fn advance_tournament_race(&mut self, track: &dyn TrackQuery) -> bool {
        if self.state != RaceState::Results {
            return false;
        }
        let Some(gp) = self.grand_prix.as_mut() else {
            return false;
        };
        if !gp.advance() {
            return false;
        }
        self.load_race(track);
        true
    }

    /// Whether the race has met its finish condition: the player is done,
    /// or with no player, every vehicle is done
    pub fn race_complete(&self) -> bool {
        match self.player.and_then(|p| self.vehicles.get(p)) {
            Some(player) => player.finished,
            None => !self.vehicles.is_empty() && self.vehicles.iter().all(|v| v.finished),
        }
    }

    /// Recompute every vehicle's place from composite progress
    pub fn update_places(&mut self) {
        let places = compute_places(&self.vehicles);
        for (vehicle, place) in self.vehicles.iter_mut().zip(places) {
            vehicle.place = place;
        }
    }

    /// Vehicle slots ordered by place, then by finish time
    pub fn results(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.vehicles.len()).collect();
        order.sort_by(|&a, &b| {
            let (va, vb) = (&self.vehicles[a], &self.vehicles[b]);
            va.place.cmp(&vb.place).then_with(|| {
                let ta = va.finish_time.unwrap_or(f32::INFINITY);
                let tb = vb.finish_time.unwrap_or(f32::INFINITY);
                ta.total_cmp(&tb)
            })
        });
        order
    }
}
