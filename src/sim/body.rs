//! Generic rigid bodies
//!
//! Point-mass boxes with force/impulse accumulation and semi-implicit Euler
//! integration. Used for props and anything else that wants honest
//! mass-weighted motion; vehicles have their own arcade model.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::BoxShape;
use crate::consts::GRAVITY;
use crate::track::TrackQuery;

/// Restitution given to new bodies
pub const DEFAULT_RESTITUTION: f32 = 0.3;
/// Per-tick velocity retention
pub const BODY_FRICTION: f32 = 0.98;
/// Distance above the surface still treated as resting on it
pub const GROUND_EPSILON: f32 = 0.05;
/// Surface friction coefficient on the track
pub const TRACK_FRICTION: f32 = 0.8;
/// Surface friction coefficient off the track
pub const OFF_TRACK_FRICTION: f32 = 0.4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBody {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Accumulated this tick, cleared by `step`
    pub acceleration: Vec3,
    pub angular_velocity: Vec3,
    pub mass: f32,
    /// 0 means immovable
    pub inverse_mass: f32,
    pub restitution: f32,
    pub shape: BoxShape,
    pub grounded: bool,
}

impl RigidBody {
    /// A body at `position`. A non-positive mass makes it immovable.
    pub fn new(position: Vec3, mass: f32, half_extents: Vec3) -> Self {
        let inverse_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
        Self {
            position,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: mass.max(0.0),
            inverse_mass,
            restitution: DEFAULT_RESTITUTION,
            shape: BoxShape::new(position, half_extents),
            grounded: false,
        }
    }

    pub fn is_static(&self) -> bool {
        self.inverse_mass <= 0.0
    }

    /// Bounding sphere radius
    pub fn radius(&self) -> f32 {
        self.shape.radius
    }

    /// Continuous force, integrated at the next `step`
    pub fn apply_force(&mut self, force: Vec3) {
        self.acceleration += force * self.inverse_mass;
    }

    /// Instantaneous velocity change
    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.velocity += impulse * self.inverse_mass;
    }

    /// Advance one tick
    pub fn step(&mut self, dt: f32) {
        if self.is_static() {
            self.acceleration = Vec3::ZERO;
            return;
        }
        if !self.grounded {
            self.velocity.y += GRAVITY * dt;
        }
        self.velocity *= BODY_FRICTION;
        self.angular_velocity *= BODY_FRICTION;
        self.velocity += self.acceleration * dt;
        self.position += self.velocity * dt;
        self.shape.center = self.position;
        self.acceleration = Vec3::ZERO;
    }

    /// Settle onto the track surface when within reach of it
    pub fn probe_ground(&mut self, track: &dyn TrackQuery) {
        let surface = track.surface_at(self.position);
        let bottom = self.position.y - self.shape.half_extents.y;
        if bottom - surface.height <= GROUND_EPSILON {
            self.position.y = surface.height + self.shape.half_extents.y;
            self.shape.center = self.position;
            if self.velocity.y < 0.0 {
                self.velocity.y = 0.0;
            }
            self.grounded = true;
        } else {
            self.grounded = false;
        }
    }

    /// Friction coefficient of the surface under the body
    pub fn surface_friction(&self, track: &dyn TrackQuery) -> f32 {
        surface_friction(track, self.position)
    }
}

/// Straight-down ray against the track surface.
/// Returns the distance to the surface if it is within `max_distance` below `origin`.
pub fn raycast_down(track: &dyn TrackQuery, origin: Vec3, max_distance: f32) -> Option<f32> {
    let surface = track.surface_at(origin);
    let drop = origin.y - surface.height;
    (drop >= 0.0 && drop <= max_distance).then_some(drop)
}

/// Friction coefficient at a position: on-track vs off-track
pub fn surface_friction(track: &dyn TrackQuery, pos: Vec3) -> f32 {
    if track.surface_at(pos).on_track {
        TRACK_FRICTION
    } else {
        OFF_TRACK_FRICTION
    }
}
