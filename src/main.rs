//! Kart Sim entry point
//!
//! Headless demo: runs a race (or a whole Grand Prix) on a ring track
//! through the fixed-timestep loop and logs the results.
//!
//! Usage: `kart-sim [settings.json]`

use kart_sim::consts::*;
use kart_sim::sim::{FixedStepper, RaceMode, RaceSession, RaceState, TickInput, tick};
use kart_sim::{RaceSettings, RingTrack, TrackQuery, heading_of, normalize_angle};

/// Simulated frame times (seconds), cycled to mimic an uneven render loop
const FRAME_TIMES: [f32; 4] = [0.016, 0.017, 0.018, 0.033];

/// Give up on a race after this many simulated seconds
const RACE_TIME_LIMIT: f32 = 600.0;

fn load_settings() -> RaceSettings {
    let Some(path) = std::env::args().nth(1) else {
        log::info!("No settings file given, using defaults");
        return RaceSettings::for_mode(RaceMode::Spectator);
    };

    match std::fs::read_to_string(&path) {
        Ok(json) => match RaceSettings::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path);
                settings
            }
            Err(e) => {
                log::warn!("Invalid settings in {}: {}", path, e);
                RaceSettings::default()
            }
        },
        Err(e) => {
            log::warn!("Can't read {}: {}", path, e);
            RaceSettings::default()
        }
    }
}

/// Run frames until the session reaches the results screen
fn run_race(session: &mut RaceSession, track: &RingTrack, stepper: &mut FixedStepper) -> bool {
    // The demo player holds the throttle and chases a point down the centerline
    let mut input = TickInput::default();
    input.player.throttle = 1.0;

    let mut frame = 0usize;
    let mut sim_time = 0.0f32;
    while session.state() != RaceState::Results {
        if sim_time > RACE_TIME_LIMIT + COUNTDOWN_TIME {
            log::warn!("Race did not finish within {}s", RACE_TIME_LIMIT);
            return false;
        }
        let frame_dt = FRAME_TIMES[frame % FRAME_TIMES.len()];
        frame += 1;

        stepper.advance(frame_dt, |dt| {
            if let Some(player) = session.player_vehicle() {
                let (target, _) = track.position_and_direction_at(
                    player.track_progress * track.total_length() + 20.0,
                );
                let desired = heading_of(target - player.position);
                let diff = normalize_angle(desired - player.yaw);
                input.player.steering = (diff * 2.0).clamp(-1.0, 1.0);
            }
            tick(session, track, &input, dt);
            sim_time += dt;
        });
    }
    true
}

fn report(session: &RaceSession) {
    for (rank, &slot) in session.results().iter().enumerate() {
        let v = &session.vehicles()[slot];
        log::info!(
            "{}. slot {} ({}{}) place {} laps {} time {} best lap {}",
            rank + 1,
            slot,
            v.class.as_str(),
            if v.is_player { ", player" } else { "" },
            v.place,
            v.current_lap,
            v.finish_time
                .map_or_else(|| "DNF".to_string(), |t| format!("{:.2}s", t)),
            v.best_lap_time
                .map_or_else(|| "-".to_string(), |t| format!("{:.2}s", t)),
        );
    }
}

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Kart Sim (headless) starting...");

    let settings = load_settings();
    let track = RingTrack::default();
    let mut session = RaceSession::new();
    let mut stepper = FixedStepper::new();

    // Init -> Menu
    tick(&mut session, &track, &TickInput::default(), SIM_DT);
    session.start_race(settings, &track);

    loop {
        if !run_race(&mut session, &track, &mut stepper) {
            break;
        }
        report(&session);
        if !session.advance_tournament_race(&track) {
            break;
        }
    }

    if let Some(standings) = session.standings() {
        log::info!("Final standings:");
        for (rank, s) in standings.iter().enumerate() {
            log::info!("{}. slot {} - {} pts", rank + 1, s.vehicle, s.points);
        }
    }
}
