//! Collision detection and response
//!
//! Two resolution strategies share one [`ContactResolver`] capability:
//! - [`ArcadeBump`]: vehicles. Equal-mass push-apart and half exchange of the
//!   closing velocity. Forgiving, ignores mass and restitution.
//! - [`ImpulseResolver`]: generic bodies. Mass-weighted positional correction
//!   plus a restitution impulse.
//!
//! Pairs are processed in ascending index order, one at a time. Three-way
//! contacts are therefore resolved sequentially and are not guaranteed to
//! conserve energy.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::body::RigidBody;
use super::vehicle::Vehicle;
use crate::consts::VEHICLE_RADIUS;
use crate::horizontal;

/// Normal used when two centers coincide
pub const FALLBACK_NORMAL: Vec3 = Vec3::X;

/// Axis-aligned box with a cached bounding-sphere radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxShape {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub radius: f32,
}

impl BoxShape {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        let half_extents = half_extents.abs();
        Self {
            center,
            half_extents,
            radius: half_extents.length(),
        }
    }

    /// Per-axis extents overlap
    pub fn overlaps(&self, other: &BoxShape) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        d.x <= reach.x && d.y <= reach.y && d.z <= reach.z
    }
}

/// Bounding-sphere overlap without a square root
#[inline]
pub fn spheres_overlap(a: Vec3, radius_a: f32, b: Vec3, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    a.distance_squared(b) <= reach * reach
}

/// Contact between two bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal pointing from the first body toward the second
    pub normal: Vec3,
    /// Overlap depth along the normal
    pub penetration: f32,
}

/// Contact for two spheres, if they overlap
pub fn sphere_contact(a: Vec3, radius_a: f32, b: Vec3, radius_b: f32) -> Option<Contact> {
    if !spheres_overlap(a, radius_a, b, radius_b) {
        return None;
    }
    let delta = b - a;
    let dist = delta.length();
    let normal = if dist > f32::EPSILON {
        delta / dist
    } else {
        FALLBACK_NORMAL
    };
    Some(Contact {
        normal,
        penetration: radius_a + radius_b - dist,
    })
}

/// Contact for two boxes along the axis of least penetration, if they overlap
pub fn box_contact(a: &BoxShape, b: &BoxShape) -> Option<Contact> {
    if !a.overlaps(b) {
        return None;
    }
    let delta = b.center - a.center;
    let overlap = a.half_extents + b.half_extents - delta.abs();

    let (axis, penetration) = if overlap.x <= overlap.y && overlap.x <= overlap.z {
        (Vec3::X * delta.x, overlap.x)
    } else if overlap.y <= overlap.z {
        (Vec3::Y * delta.y, overlap.y)
    } else {
        (Vec3::Z * delta.z, overlap.z)
    };
    let normal = axis.try_normalize().unwrap_or(FALLBACK_NORMAL);
    Some(Contact {
        normal,
        penetration,
    })
}

/// What a resolver needs to see and move on a body
pub trait ContactBody {
    fn velocity(&self) -> Vec3;
    fn translate(&mut self, delta: Vec3);
    fn add_velocity(&mut self, delta: Vec3);
    /// 0 means immovable
    fn inverse_mass(&self) -> f32;
    fn restitution(&self) -> f32;
}

/// A contact response strategy
pub trait ContactResolver {
    fn resolve(&self, a: &mut dyn ContactBody, b: &mut dyn ContactBody, contact: &Contact);
}

/// Mass-agnostic arcade bump
#[derive(Debug, Clone, Copy, Default)]
pub struct ArcadeBump;

impl ContactResolver for ArcadeBump {
    fn resolve(&self, a: &mut dyn ContactBody, b: &mut dyn ContactBody, contact: &Contact) {
        let n = contact.normal;
        let half = contact.penetration * 0.5;
        a.translate(-n * half);
        b.translate(n * half);

        let closing = (b.velocity() - a.velocity()).dot(n);
        if closing < 0.0 {
            let exchange = n * (closing * 0.5);
            a.add_velocity(exchange);
            b.add_velocity(-exchange);
        }
    }
}

/// Mass and restitution weighted response
#[derive(Debug, Clone, Copy, Default)]
pub struct ImpulseResolver;

impl ContactResolver for ImpulseResolver {
    fn resolve(&self, a: &mut dyn ContactBody, b: &mut dyn ContactBody, contact: &Contact) {
        let inv_a = a.inverse_mass();
        let inv_b = b.inverse_mass();
        let inv_sum = inv_a + inv_b;
        if inv_sum <= 0.0 {
            return;
        }
        let n = contact.normal;

        // Heavier body moves less
        a.translate(-n * (contact.penetration * inv_a / inv_sum));
        b.translate(n * (contact.penetration * inv_b / inv_sum));

        let closing = (b.velocity() - a.velocity()).dot(n);
        if closing >= 0.0 {
            return;
        }
        let e = a.restitution().min(b.restitution());
        let j = -(1.0 + e) * closing / inv_sum;
        a.add_velocity(-n * (j * inv_a));
        b.add_velocity(n * (j * inv_b));
    }
}

impl ContactBody for Vehicle {
    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    fn add_velocity(&mut self, delta: Vec3) {
        self.velocity += delta;
    }

    fn inverse_mass(&self) -> f32 {
        1.0
    }

    fn restitution(&self) -> f32 {
        0.0
    }
}

impl ContactBody for RigidBody {
    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn translate(&mut self, delta: Vec3) {
        self.position += delta;
        self.shape.center = self.position;
    }

    fn add_velocity(&mut self, delta: Vec3) {
        self.velocity += delta;
    }

    fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    fn restitution(&self) -> f32 {
        self.restitution
    }
}

/// Contact between two vehicles treated as flat circles of [`VEHICLE_RADIUS`]
pub fn vehicle_contact(a: &Vehicle, b: &Vehicle) -> Option<Contact> {
    let delta = horizontal(b.position - a.position);
    let min_dist = VEHICLE_RADIUS * 2.0;
    let dist_sq = delta.length_squared();
    if dist_sq >= min_dist * min_dist {
        return None;
    }
    let dist = dist_sq.sqrt();
    let normal = if dist > f32::EPSILON {
        delta / dist
    } else {
        FALLBACK_NORMAL
    };
    Some(Contact {
        normal,
        penetration: min_dist - dist,
    })
}

/// Resolve every overlapping vehicle pair. Returns the number of contacts.
pub fn resolve_vehicle_collisions(vehicles: &mut [Vehicle]) -> usize {
    resolve_pairs(vehicles, &ArcadeBump, vehicle_contact)
}

/// Contact for two generic bodies: coarse sphere test, then boxes
pub fn body_contact(a: &RigidBody, b: &RigidBody) -> Option<Contact> {
    if !spheres_overlap(a.position, a.radius(), b.position, b.radius()) {
        return None;
    }
    let box_a = BoxShape {
        center: a.position,
        ..a.shape
    };
    let box_b = BoxShape {
        center: b.position,
        ..b.shape
    };
    box_contact(&box_a, &box_b)
}

/// Resolve every overlapping body pair. Returns the number of contacts.
pub fn resolve_body_collisions(bodies: &mut [RigidBody]) -> usize {
    resolve_pairs(bodies, &ImpulseResolver, body_contact)
}

/// Ascending (i, j) pair sweep, resolving each contact immediately
fn resolve_pairs<T, R, F>(items: &mut [T], resolver: &R, detect: F) -> usize
where
    T: ContactBody,
    R: ContactResolver,
    F: Fn(&T, &T) -> Option<Contact>,
{
    let mut contacts = 0;
    for i in 0..items.len() {
        let (head, tail) = items.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            if let Some(contact) = detect(&*a, &*b) {
                resolver.resolve(&mut *a, &mut *b, &contact);
                contacts += 1;
            }
        }
    }
    contacts
}
