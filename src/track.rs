//! Track query interface
//!
//! The simulation never sees track geometry directly. Everything it needs
//! (centerline sampling, surface tests, checkpoints, lap progress) goes
//! through [`TrackQuery`]. Geometry generation lives outside this crate.

use glam::Vec3;
use std::f32::consts::TAU;

/// Result of a surface test at a horizontal position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    /// Whether the position is on the drivable track surface
    pub on_track: bool,
    /// Ground height under the position (valid on and off the track)
    pub height: f32,
}

/// Queries the simulation makes against the track
pub trait TrackQuery {
    /// Centerline position and unit direction at a distance along the track.
    /// Distances wrap around the lap.
    fn position_and_direction_at(&self, distance: f32) -> (Vec3, Vec3);

    /// Surface test and ground height at a position
    fn surface_at(&self, pos: Vec3) -> SurfaceSample;

    /// Index of the track segment nearest to a position
    fn nearest_segment(&self, pos: Vec3) -> usize;

    /// Checkpoint id after testing `pos` against the gate following `last`.
    /// Returns `last` unchanged when the next gate has not been passed.
    fn next_checkpoint(&self, pos: Vec3, last: u32) -> u32;

    /// Lap-normalized progress in [0, 1)
    fn progress_fraction(&self, pos: Vec3, segment: usize) -> f32;

    /// Length of one lap along the centerline
    fn total_length(&self) -> f32;

    fn start_position(&self) -> Vec3;

    fn start_direction(&self) -> Vec3;
}

/// Flat circular track centered on the origin. Driven in the direction of
/// increasing polar angle `atan2(z, x)`, starting at `(radius, 0, 0)` facing +Z.
#[derive(Debug, Clone)]
pub struct RingTrack {
    pub radius: f32,
    pub width: f32,
    pub segments: usize,
    pub checkpoints: u32,
}

impl Default for RingTrack {
    fn default() -> Self {
        Self::new(120.0, 16.0, 64, 8)
    }
}

impl RingTrack {
    pub fn new(radius: f32, width: f32, segments: usize, checkpoints: u32) -> Self {
        Self {
            radius: radius.max(1.0),
            width: width.max(0.0),
            segments: segments.max(1),
            checkpoints: checkpoints.max(2),
        }
    }

    /// Lap fraction of a position's polar angle, in [0, 1)
    pub fn angle_fraction(&self, pos: Vec3) -> f32 {
        let angle = pos.z.atan2(pos.x).rem_euclid(TAU);
        (angle / TAU).rem_euclid(1.0)
    }

    /// World position at a lap fraction and lateral offset from the centerline
    pub fn point_at_fraction(&self, fraction: f32, lateral: f32) -> Vec3 {
        let theta = fraction * TAU;
        let r = self.radius + lateral;
        Vec3::new(r * theta.cos(), 0.0, r * theta.sin())
    }
}

impl TrackQuery for RingTrack {
    fn position_and_direction_at(&self, distance: f32) -> (Vec3, Vec3) {
        let theta = (distance / self.radius).rem_euclid(TAU);
        let pos = Vec3::new(self.radius * theta.cos(), 0.0, self.radius * theta.sin());
        let dir = Vec3::new(-theta.sin(), 0.0, theta.cos());
        (pos, dir)
    }

    fn surface_at(&self, pos: Vec3) -> SurfaceSample {
        let r = Vec3::new(pos.x, 0.0, pos.z).length();
        SurfaceSample {
            on_track: (r - self.radius).abs() <= self.width / 2.0,
            height: 0.0,
        }
    }

    fn nearest_segment(&self, pos: Vec3) -> usize {
        let seg = (self.angle_fraction(pos) * self.segments as f32) as usize;
        seg.min(self.segments - 1)
    }

    fn next_checkpoint(&self, pos: Vec3, last: u32) -> u32 {
        let next = (last + 1) % self.checkpoints;
        let gate = next as f32 / self.checkpoints as f32;
        let window = 0.5 / self.checkpoints as f32;
        let past_gate = (self.angle_fraction(pos) - gate).rem_euclid(1.0);
        if past_gate < window { next } else { last }
    }

    fn progress_fraction(&self, pos: Vec3, segment: usize) -> f32 {
        let n = self.segments as f32;
        let local = (self.angle_fraction(pos) * n - segment as f32).clamp(0.0, 1.0);
        ((segment as f32 + local) / n).rem_euclid(1.0)
    }

    fn total_length(&self) -> f32 {
        self.radius * TAU
    }

    fn start_position(&self) -> Vec3 {
        Vec3::new(self.radius, 0.0, 0.0)
    }

    fn start_direction(&self) -> Vec3 {
        Vec3::Z
    }
}
