//! Kart Sim - real-time arcade race simulation core
//!
//! Core modules:
//! - `sim`: Fixed-timestep simulation (vehicles, AI drivers, collisions, race state)
//! - `track`: Track query interface consumed by the simulation
//! - `settings`: Race configuration

pub mod settings;
pub mod sim;
pub mod track;

pub use settings::RaceSettings;
pub use track::{RingTrack, SurfaceSample, TrackQuery};

use glam::Vec3;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz). Drag and countdown display are tuned for it.
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Real frame time is clamped to this before feeding the accumulator
    pub const MAX_FRAME_TIME: f32 = 0.1;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Maximum simultaneous vehicles in a race
    pub const MAX_VEHICLES: usize = 8;

    /// Vertical acceleration applied while airborne (units/s²)
    pub const GRAVITY: f32 = -30.0;
    /// Height above the surface before a vehicle counts as airborne
    pub const AIRBORNE_EPSILON: f32 = 0.05;
    /// Minimum horizontal speed for steering to have any effect
    pub const STEER_MIN_SPEED: f32 = 1.0;
    /// Below this speed, braking stops the vehicle outright
    pub const STOP_SPEED: f32 = 0.1;
    /// Per-tick velocity retention when off the track surface
    pub const OFF_TRACK_RETENTION: f32 = 0.95;
    /// Shortest lap time accepted as a best lap (rejects the first post-reset tick)
    pub const MIN_BEST_LAP: f32 = 1.0;
    /// Visual lean per unit of steering (radians)
    pub const ROLL_FACTOR: f32 = 0.15;

    /// Vehicle-vehicle collision radius (point circle)
    pub const VEHICLE_RADIUS: f32 = 2.0;

    /// Countdown length before the start (seconds)
    pub const COUNTDOWN_TIME: f32 = 3.0;
}

/// Normalize an angle into (-π, π]
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

/// Horizontal forward vector for a yaw angle. Yaw 0 faces +Z, positive yaw turns toward +X.
#[inline]
pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Horizontal right-hand vector for a yaw angle
#[inline]
pub fn right_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.cos(), 0.0, -yaw.sin())
}

/// Yaw angle of a horizontal direction (inverse of `forward_from_yaw`)
#[inline]
pub fn heading_of(dir: Vec3) -> f32 {
    dir.x.atan2(dir.z)
}

/// Drop the vertical component
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
