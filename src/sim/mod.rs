//! Race simulation module
//!
//! All race logic lives here:
//! - Fixed timestep only (drag and countdown are tuned for 60 Hz)
//! - Seeded RNG only
//! - Stable iteration order (by grid slot)
//! - No rendering, audio or platform dependencies

pub mod ai;
pub mod body;
pub mod collision;
pub mod grand_prix;
pub mod state;
pub mod tick;
pub mod vehicle;

pub use ai::{AiDriver, Behavior, Difficulty, DriverParams};
pub use body::{RigidBody, raycast_down, surface_friction};
pub use collision::{
    ArcadeBump, BoxShape, Contact, ContactBody, ContactResolver, ImpulseResolver,
    resolve_body_collisions, resolve_vehicle_collisions, spheres_overlap,
};
pub use grand_prix::{GrandPrix, Standing, points_for_place};
pub use state::{RaceMode, RaceSession, RaceState, compute_places};
pub use tick::{FixedStepper, TickInput, tick};
pub use vehicle::{Controls, MeshHandle, Vehicle, VehicleClass, VehicleTuning};
