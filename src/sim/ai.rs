//! AI driver controller
//!
//! A reactive, skill-scaled heuristic: aim at a point ahead on the
//! centerline, add a little decaying wander, nudge away from nearby
//! vehicles, and shape throttle for corners. No planning.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::vehicle::{Controls, Vehicle};
use crate::track::TrackQuery;
use crate::{heading_of, horizontal, normalize_angle, right_from_yaw};

/// Largest wander offset drawn on an error roll
pub const WANDER_MAX: f32 = 0.15;
/// Per-tick wander retention
pub const WANDER_DECAY: f32 = 0.95;
/// Vehicles closer than this push the steering away
pub const AVOID_RADIUS: f32 = 8.0;
/// Seconds in any behavior state before reverting to Racing
pub const STATE_TIMEOUT: f32 = 2.0;

/// AI difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    /// Tier for a menu index; `None` when out of range
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            "expert" => Some(Difficulty::Expert),
            _ => None,
        }
    }

    pub fn params(&self) -> DriverParams {
        match self {
            Difficulty::Easy => DriverParams {
                skill: 0.6,
                aggression: 0.2,
                error_rate: 0.15,
                speed_factor: 0.85,
                look_ahead: 15.0,
            },
            Difficulty::Medium => DriverParams {
                skill: 0.75,
                aggression: 0.4,
                error_rate: 0.08,
                speed_factor: 0.9,
                look_ahead: 20.0,
            },
            Difficulty::Hard => DriverParams {
                skill: 0.88,
                aggression: 0.6,
                error_rate: 0.04,
                speed_factor: 0.95,
                look_ahead: 25.0,
            },
            Difficulty::Expert => DriverParams {
                skill: 0.98,
                aggression: 0.8,
                error_rate: 0.01,
                speed_factor: 1.0,
                look_ahead: 30.0,
            },
        }
    }
}

/// Scalars a difficulty tier expands into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverParams {
    /// Steering responsiveness
    pub skill: f32,
    /// Avoidance strength
    pub aggression: f32,
    /// Chance per tick of drawing a new wander offset
    pub error_rate: f32,
    /// Fraction of the vehicle's max speed to aim for
    pub speed_factor: f32,
    /// Base look-ahead distance along the centerline
    pub look_ahead: f32,
}

/// Behavior state.
///
/// Informational only: it records what the driver is reacting to and
/// times out to `Racing` after [`STATE_TIMEOUT`]. Steering and throttle
/// don't branch on it (the off-track override is keyed on the vehicle,
/// not on this state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Behavior {
    #[default]
    Racing,
    Overtaking,
    Recovering,
}

/// Drives one AI vehicle, referenced by its index in the race's vehicle list
#[derive(Debug, Clone)]
pub struct AiDriver {
    /// Index of the controlled vehicle
    pub vehicle: usize,
    difficulty: Difficulty,
    params: DriverParams,
    rng: Pcg32,
    wander: f32,
    behavior: Behavior,
    state_time: f32,
    /// Last look-ahead target (diagnostic)
    pub target: Vec3,
    /// Last look-ahead distance along the track (diagnostic)
    pub target_distance: f32,
}

impl AiDriver {
    pub fn new(vehicle: usize, difficulty: Difficulty, seed: u64) -> Self {
        Self {
            vehicle,
            difficulty,
            params: difficulty.params(),
            rng: Pcg32::seed_from_u64(seed),
            wander: 0.0,
            behavior: Behavior::Racing,
            state_time: 0.0,
            target: Vec3::ZERO,
            target_distance: 0.0,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn params(&self) -> DriverParams {
        self.params
    }

    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    pub fn wander(&self) -> f32 {
        self.wander
    }

    /// Switch tier; all derived parameters change together
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.params = difficulty.params();
    }

    /// Switch tier by menu index. Out-of-range indices are ignored.
    pub fn set_difficulty_index(&mut self, index: usize) {
        match Difficulty::from_index(index) {
            Some(difficulty) => self.set_difficulty(difficulty),
            None => log::warn!("Ignoring out-of-range difficulty index {}", index),
        }
    }

    fn enter(&mut self, behavior: Behavior) {
        if self.behavior != behavior {
            self.behavior = behavior;
            self.state_time = 0.0;
        }
    }

    /// Compute and apply this tick's controls to the owned vehicle
    pub fn update(&mut self, vehicles: &mut [Vehicle], track: &dyn TrackQuery, dt: f32) {
        let Some(me) = vehicles.get(self.vehicle) else {
            return;
        };

        // Wander appears at random and always fades
        if self.rng.random::<f32>() < self.params.error_rate {
            self.wander = self.rng.random_range(-WANDER_MAX..=WANDER_MAX);
        }
        self.wander *= WANDER_DECAY;

        // Look further ahead when going faster
        let distance =
            me.track_progress * track.total_length() + self.params.look_ahead + me.speed * 0.5;
        let (target, _) = track.position_and_direction_at(distance);
        self.target = target;
        self.target_distance = distance;

        let to_target = horizontal(target - me.position);
        let desired_yaw = heading_of(to_target);
        let angle_diff = normalize_angle(desired_yaw - me.yaw);

        let mut steering = (angle_diff * 2.0 * self.params.skill).clamp(-1.0, 1.0);
        steering = (steering + self.wander).clamp(-1.0, 1.0);

        // Local avoidance
        let right = right_from_yaw(me.yaw);
        let forward = me.forward();
        let mut overtaking = false;
        for (i, other) in vehicles.iter().enumerate() {
            if i == self.vehicle {
                continue;
            }
            let rel = horizontal(other.position - me.position);
            let dist = rel.length();
            if dist >= AVOID_RADIUS {
                continue;
            }
            let lateral = rel.dot(right);
            let push = self.params.aggression * (1.0 - dist / AVOID_RADIUS);
            steering -= lateral.signum() * push;

            let ahead = rel.dot(forward);
            if ahead > 0.0 && ahead < 10.0 && dist < 5.0 {
                overtaking = true;
            }
        }
        steering = steering.clamp(-1.0, 1.0);
        if overtaking {
            self.enter(Behavior::Overtaking);
        }

        // Throttle shaping
        let mut throttle = 1.0;
        let mut brake = 0.0;
        if steering.abs() > 0.5 {
            throttle = 0.7 - 0.3 * steering.abs();
        }
        if me.speed > self.params.speed_factor * me.tuning.max_speed {
            throttle = 0.0;
        }
        if me.speed > 50.0 && steering.abs() > 0.7 {
            brake = 0.5;
            throttle = 0.0;
        }

        // Off the track: head straight back, whatever else was decided
        if !me.on_track {
            self.enter(Behavior::Recovering);
            steering = (angle_diff * 3.0).clamp(-1.0, 1.0);
            throttle = 0.5;
            brake = 0.0;
        }

        vehicles[self.vehicle].set_controls(Controls::new(steering, throttle, brake));

        self.state_time += dt;
        if self.state_time >= STATE_TIMEOUT {
            self.behavior = Behavior::Racing;
            self.state_time = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::vehicle::VehicleClass;
    use crate::track::RingTrack;

    fn grid(positions: &[Vec3]) -> Vec<Vehicle> {
        positions
            .iter()
            .map(|&p| {
                let mut v = Vehicle::new(VehicleClass::Standard, 0, false);
                v.reset(p, 0.0, 3);
                v
            })
            .collect()
    }

    #[test]
    fn test_difficulty_table_bounds() {
        for d in Difficulty::ALL {
            let p = d.params();
            assert!((0.6..=0.98).contains(&p.skill));
            assert!((0.2..=0.8).contains(&p.aggression));
            assert!((0.01..=0.15).contains(&p.error_rate));
            assert!((0.85..=1.0).contains(&p.speed_factor));
            assert!((15.0..=30.0).contains(&p.look_ahead));
        }
    }

    #[test]
    fn test_set_difficulty_rederives_params() {
        let mut ai = AiDriver::new(0, Difficulty::Easy, 1);
        ai.set_difficulty(Difficulty::Expert);
        assert_eq!(ai.params(), Difficulty::Expert.params());

        ai.set_difficulty_index(99);
        assert_eq!(ai.difficulty(), Difficulty::Expert);
        assert_eq!(ai.params(), Difficulty::Expert.params());

        ai.set_difficulty_index(1);
        assert_eq!(ai.difficulty(), Difficulty::Medium);
        assert_eq!(ai.params(), Difficulty::Medium.params());
    }

    #[test]
    fn test_missing_vehicle_is_a_no_op() {
        let track = RingTrack::default();
        let mut vehicles = grid(&[track.start_position()]);
        let mut ai = AiDriver::new(5, Difficulty::Medium, 1);
        ai.update(&mut vehicles, &track, SIM_DT);
        assert_eq!(vehicles[0].controls, Controls::default());
    }

    #[test]
    fn test_steers_toward_track_and_accelerates() {
        let track = RingTrack::default();
        let mut vehicles = grid(&[track.start_position()]);
        let mut ai = AiDriver::new(0, Difficulty::Expert, 7);
        ai.update(&mut vehicles, &track, SIM_DT);

        let c = vehicles[0].controls;
        // The ring bends toward -X, which is left of a vehicle facing +Z
        assert!(c.steering < 0.0);
        assert!(c.throttle > 0.0);
        assert_eq!(c.brake, 0.0);
        assert_eq!(ai.behavior(), Behavior::Racing);
    }

    #[test]
    fn test_off_track_recovery_override() {
        let track = RingTrack::default();
        let mut vehicles = grid(&[Vec3::new(track.radius + 30.0, 0.0, 0.0)]);
        vehicles[0].on_track = false;
        let mut ai = AiDriver::new(0, Difficulty::Medium, 3);
        ai.update(&mut vehicles, &track, SIM_DT);

        assert_eq!(ai.behavior(), Behavior::Recovering);
        assert_eq!(vehicles[0].controls.throttle, 0.5);
        assert_eq!(vehicles[0].controls.brake, 0.0);

        // Fast and pointing the wrong way: no corner braking while recovering
        vehicles[0].speed = 60.0;
        vehicles[0].yaw = 1.5;
        ai.update(&mut vehicles, &track, SIM_DT);
        let c = vehicles[0].controls;
        assert_eq!(c.steering.abs(), 1.0);
        assert_eq!(c.throttle, 0.5);
        assert_eq!(c.brake, 0.0);
    }

    #[test]
    fn test_recovering_times_out_after_two_seconds() {
        let track = RingTrack::default();
        let mut vehicles = grid(&[Vec3::new(track.radius + 30.0, 0.0, 0.0)]);
        vehicles[0].on_track = false;
        let mut ai = AiDriver::new(0, Difficulty::Medium, 3);
        ai.update(&mut vehicles, &track, SIM_DT);
        assert_eq!(ai.behavior(), Behavior::Recovering);

        // Back on the track
        vehicles[0].reset(track.start_position(), 0.0, 3);
        vehicles[0].on_track = true;
        for _ in 1..119 {
            ai.update(&mut vehicles, &track, SIM_DT);
        }
        assert_eq!(ai.behavior(), Behavior::Recovering);
        for _ in 0..2 {
            ai.update(&mut vehicles, &track, SIM_DT);
        }
        assert_eq!(ai.behavior(), Behavior::Racing);
    }

    #[test]
    fn test_avoidance_pushes_away_from_neighbor() {
        let track = RingTrack::default();
        let start = track.start_position();
        // Neighbor 3 units to the right (+X is right at yaw 0)
        let mut alone = grid(&[start]);
        let mut crowded = grid(&[start, start + Vec3::new(3.0, 0.0, 0.0)]);

        let mut ai_a = AiDriver::new(0, Difficulty::Expert, 11);
        let mut ai_b = AiDriver::new(0, Difficulty::Expert, 11);
        ai_a.update(&mut alone, &track, SIM_DT);
        ai_b.update(&mut crowded, &track, SIM_DT);

        assert!(crowded[0].controls.steering < alone[0].controls.steering);
    }

    #[test]
    fn test_vehicle_ahead_triggers_overtaking() {
        let track = RingTrack::default();
        let start = track.start_position();
        let mut vehicles = grid(&[start, start + Vec3::new(0.5, 0.0, 3.0)]);
        let mut ai = AiDriver::new(0, Difficulty::Medium, 5);
        ai.update(&mut vehicles, &track, SIM_DT);
        assert_eq!(ai.behavior(), Behavior::Overtaking);
    }

    #[test]
    fn test_overtaking_times_out_after_two_seconds() {
        let track = RingTrack::default();
        let start = track.start_position();
        let mut vehicles = grid(&[start, start + Vec3::new(0.5, 0.0, 3.0)]);
        let mut ai = AiDriver::new(0, Difficulty::Medium, 5);
        ai.update(&mut vehicles, &track, SIM_DT);
        assert_eq!(ai.behavior(), Behavior::Overtaking);

        // Remove the trigger
        vehicles.truncate(1);
        for _ in 1..119 {
            ai.update(&mut vehicles, &track, SIM_DT);
        }
        assert_eq!(ai.behavior(), Behavior::Overtaking);
        for _ in 0..2 {
            ai.update(&mut vehicles, &track, SIM_DT);
        }
        assert_eq!(ai.behavior(), Behavior::Racing);
    }

    #[test]
    fn test_throttle_cut_above_target_speed() {
        let track = RingTrack::default();
        let mut vehicles = grid(&[track.start_position()]);
        vehicles[0].speed = vehicles[0].tuning.max_speed;
        let mut ai = AiDriver::new(0, Difficulty::Easy, 2);
        ai.update(&mut vehicles, &track, SIM_DT);
        assert_eq!(vehicles[0].controls.throttle, 0.0);
    }

    #[test]
    fn test_wander_decays() {
        let mut ai = AiDriver::new(0, Difficulty::Easy, 2);
        ai.wander = 0.1;
        ai.params.error_rate = 0.0;
        let track = RingTrack::default();
        let mut vehicles = grid(&[track.start_position()]);
        ai.update(&mut vehicles, &track, SIM_DT);
        assert!((ai.wander() - 0.095).abs() < 1e-6);
    }

    #[test]
    fn test_same_seed_same_controls() {
        let track = RingTrack::default();
        let mut a = grid(&[track.start_position()]);
        let mut b = a.clone();
        let mut ai_a = AiDriver::new(0, Difficulty::Easy, 42);
        let mut ai_b = AiDriver::new(0, Difficulty::Easy, 42);
        for _ in 0..100 {
            ai_a.update(&mut a, &track, SIM_DT);
            ai_b.update(&mut b, &track, SIM_DT);
            assert_eq!(a[0].controls, b[0].controls);
        }
    }
}
