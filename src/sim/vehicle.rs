//! Vehicle dynamics
//!
//! Arcade kinematics, not rigid-body physics: heading is driven directly by
//! steering input and the velocity direction is blended toward the heading
//! by the class's grip. All tuning assumes the fixed 60 Hz tick; drag is a
//! per-tick multiplier, not a continuous law.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::track::TrackQuery;
use crate::{forward_from_yaw, horizontal, normalize_angle};

/// Vehicle class, selecting a row of the tuning table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VehicleClass {
    #[default]
    Standard,
    Speedster,
    Heavy,
    Nimble,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 4] = [
        VehicleClass::Standard,
        VehicleClass::Speedster,
        VehicleClass::Heavy,
        VehicleClass::Nimble,
    ];

    /// Class for a menu index; `None` when out of range
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::Standard => "Standard",
            VehicleClass::Speedster => "Speedster",
            VehicleClass::Heavy => "Heavy",
            VehicleClass::Nimble => "Nimble",
        }
    }

    pub fn tuning(&self) -> VehicleTuning {
        match self {
            VehicleClass::Standard => VehicleTuning {
                max_speed: 80.0,
                accel_rate: 25.0,
                brake_rate: 40.0,
                steer_rate: 2.5,
                drag: 0.99,
                grip: 0.85,
            },
            VehicleClass::Speedster => VehicleTuning {
                max_speed: 95.0,
                accel_rate: 22.0,
                brake_rate: 35.0,
                steer_rate: 2.2,
                drag: 0.99,
                grip: 0.7,
            },
            VehicleClass::Heavy => VehicleTuning {
                max_speed: 75.0,
                accel_rate: 18.0,
                brake_rate: 45.0,
                steer_rate: 2.0,
                drag: 0.99,
                grip: 0.95,
            },
            VehicleClass::Nimble => VehicleTuning {
                max_speed: 70.0,
                accel_rate: 30.0,
                brake_rate: 40.0,
                steer_rate: 3.2,
                drag: 0.99,
                grip: 0.6,
            },
        }
    }
}

/// Per-class handling constants, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleTuning {
    pub max_speed: f32,
    pub accel_rate: f32,
    pub brake_rate: f32,
    /// Yaw rate at full steering lock (rad/s)
    pub steer_rate: f32,
    /// Per-tick velocity retention on the track surface
    pub drag: f32,
    /// 0..1, how strongly velocity direction snaps toward heading
    pub grip: f32,
}

/// Steering/throttle/brake written each tick by the player or an AI driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    /// -1 (left) ..= 1 (right)
    pub steering: f32,
    /// 0..=1
    pub throttle: f32,
    /// 0..=1
    pub brake: f32,
}

impl Controls {
    pub fn new(steering: f32, throttle: f32, brake: f32) -> Self {
        Self {
            steering,
            throttle,
            brake,
        }
        .clamped()
    }

    pub fn clamped(self) -> Self {
        Self {
            steering: self.steering.clamp(-1.0, 1.0),
            throttle: self.throttle.clamp(0.0, 1.0),
            brake: self.brake.clamp(0.0, 1.0),
        }
    }
}

/// Opaque render handle, passed through untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshHandle(pub u32);

/// Livery colors handed out by grid slot (0xRRGGBB)
pub const VEHICLE_COLORS: [u32; MAX_VEHICLES] = [
    0xE53935, 0x1E88E5, 0x43A047, 0xFDD835, 0x8E24AA, 0xFB8C00, 0x00ACC1, 0xF5F5F5,
];

/// One racer, player or AI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    /// Horizontal speed (vertical motion excluded)
    pub speed: f32,

    pub controls: Controls,
    pub tuning: VehicleTuning,

    pub current_lap: u32,
    pub total_laps: u32,
    /// Last checkpoint passed
    pub checkpoint: u32,
    pub lap_time: f32,
    pub best_lap_time: Option<f32>,
    pub total_time: f32,
    /// Fraction of the current lap completed, [0, 1)
    pub track_progress: f32,
    pub finished: bool,
    /// Total time at the tick `finished` was first set
    pub finish_time: Option<f32>,
    /// 1-based race position
    pub place: u32,

    pub is_player: bool,
    pub mesh: Option<MeshHandle>,
    pub color: u32,
    pub class: VehicleClass,

    /// Recomputed every tick
    pub on_track: bool,
    /// Recomputed every tick
    pub airborne: bool,
}

impl Vehicle {
    pub fn new(class: VehicleClass, color: u32, is_player: bool) -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            speed: 0.0,
            controls: Controls::default(),
            tuning: class.tuning(),
            current_lap: 0,
            total_laps: 3,
            checkpoint: 0,
            lap_time: 0.0,
            best_lap_time: None,
            total_time: 0.0,
            track_progress: 0.0,
            finished: false,
            finish_time: None,
            place: 1,
            is_player,
            mesh: None,
            color,
            class,
            on_track: true,
            airborne: false,
        }
    }

    pub fn with_mesh(mut self, mesh: MeshHandle) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Put the vehicle on the grid and clear all motion and race progress
    pub fn reset(&mut self, position: Vec3, yaw: f32, total_laps: u32) {
        self.position = position;
        self.velocity = Vec3::ZERO;
        self.acceleration = Vec3::ZERO;
        self.yaw = yaw;
        self.pitch = 0.0;
        self.roll = 0.0;
        self.speed = 0.0;
        self.controls = Controls::default();
        self.current_lap = 0;
        self.total_laps = total_laps;
        self.checkpoint = 0;
        self.lap_time = 0.0;
        self.best_lap_time = None;
        self.total_time = 0.0;
        self.track_progress = 0.0;
        self.finished = false;
        self.finish_time = None;
        self.place = 1;
        self.on_track = true;
        self.airborne = false;
    }

    pub fn set_controls(&mut self, controls: Controls) {
        self.controls = controls.clamped();
    }

    #[inline]
    pub fn forward(&self) -> Vec3 {
        forward_from_yaw(self.yaw)
    }

    /// `lap count + lap fraction`, used for ranking
    #[inline]
    pub fn composite_progress(&self) -> f32 {
        self.current_lap as f32 + self.track_progress
    }

    /// Advance one fixed tick
    pub fn update(&mut self, track: &dyn TrackQuery, dt: f32) {
        let start_velocity = self.velocity;

        // Ground / air
        let surface = track.surface_at(self.position);
        self.on_track = surface.on_track;
        if self.position.y > surface.height + AIRBORNE_EPSILON {
            self.velocity.y += GRAVITY * dt;
            self.airborne = true;
        } else {
            self.position.y = surface.height;
            self.velocity.y = 0.0;
            self.airborne = false;
        }

        self.speed = horizontal(self.velocity).length();

        if !self.airborne {
            self.apply_steering(dt);
            self.apply_throttle(dt);
            self.apply_brake(dt);
        }

        let retention = if self.on_track {
            self.tuning.drag
        } else {
            OFF_TRACK_RETENTION
        };
        self.velocity *= retention;

        self.position += self.velocity * dt;
        self.acceleration = if dt > 0.0 {
            (self.velocity - start_velocity) / dt
        } else {
            Vec3::ZERO
        };

        self.update_checkpoint(track);

        self.lap_time += dt;
        self.total_time += dt;

        let segment = track.nearest_segment(self.position);
        self.track_progress = track.progress_fraction(self.position, segment);

        if self.current_lap >= self.total_laps && !self.finished {
            self.finished = true;
            self.finish_time = Some(self.total_time);
            log::info!(
                "{} vehicle finished in {:.2}s",
                if self.is_player { "Player" } else { "AI" },
                self.total_time
            );
        }

        self.speed = horizontal(self.velocity).length();
        self.roll = -self.controls.steering * ROLL_FACTOR;
    }

    fn apply_steering(&mut self, dt: f32) {
        if self.speed <= STEER_MIN_SPEED {
            return;
        }
        let damping = if self.tuning.max_speed > 0.0 {
            1.0 - 0.5 * self.speed / self.tuning.max_speed
        } else {
            1.0
        };
        self.yaw = normalize_angle(
            self.yaw + self.controls.steering * self.tuning.steer_rate * dt * damping,
        );

        // Blend travel direction toward the new heading; speed is unchanged
        let current_dir = horizontal(self.velocity) / self.speed;
        let desired_dir = self.forward();
        let blended = current_dir
            .lerp(desired_dir, self.tuning.grip)
            .try_normalize()
            .unwrap_or(current_dir);
        let vertical = self.velocity.y;
        self.velocity = blended * self.speed;
        self.velocity.y = vertical;
    }

    fn apply_throttle(&mut self, dt: f32) {
        if self.speed >= self.tuning.max_speed {
            return;
        }
        let mut accel = self.tuning.accel_rate;
        if !self.on_track {
            accel *= 0.5;
        }
        self.velocity += self.forward() * accel * self.controls.throttle * dt;
    }

    fn apply_brake(&mut self, dt: f32) {
        if self.controls.brake <= 0.0 {
            return;
        }
        let flat = horizontal(self.velocity);
        let speed = flat.length();
        let reduced = (speed - self.tuning.brake_rate * self.controls.brake * dt).max(0.0);
        if reduced < STOP_SPEED {
            self.velocity = Vec3::ZERO;
            return;
        }
        let vertical = self.velocity.y;
        self.velocity = flat / speed * reduced;
        self.velocity.y = vertical;
    }

    /// Any transition onto checkpoint 0 completes a lap
    fn update_checkpoint(&mut self, track: &dyn TrackQuery) {
        let next = track.next_checkpoint(self.position, self.checkpoint);
        if next == self.checkpoint {
            return;
        }
        self.checkpoint = next;
        if self.checkpoint != 0 {
            return;
        }

        self.current_lap += 1;
        let lap = self.lap_time;
        if lap > MIN_BEST_LAP && self.best_lap_time.is_none_or(|best| lap < best) {
            self.best_lap_time = Some(lap);
        }
        log::debug!(
            "Lap {} complete in {:.2}s (best {:?})",
            self.current_lap,
            lap,
            self.best_lap_time
        );
        self.lap_time = 0.0;
    }
}
