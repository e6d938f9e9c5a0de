//! Fixed timestep simulation tick
//!
//! Per-tick order: player input, AI drivers, vehicle integration,
//! collisions, race bookkeeping. Nothing here blocks or allocates per
//! vehicle beyond the placement pass.

use super::collision::resolve_vehicle_collisions;
use super::state::{RaceSession, RaceState};
use super::vehicle::Controls;
use crate::consts::*;
use crate::track::TrackQuery;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Human player's controls (ignored when there is no player)
    pub player: Controls,
    /// Pause toggle (edge, not level)
    pub pause: bool,
}

/// Advance the race session by one fixed timestep
pub fn tick(session: &mut RaceSession, track: &dyn TrackQuery, input: &TickInput, dt: f32) {
    if input.pause {
        session.toggle_pause();
    }

    match session.state {
        RaceState::Init => {
            session.state = RaceState::Menu;
        }
        RaceState::Menu | RaceState::Paused | RaceState::Results => {}
        RaceState::Loading => {
            session.state = RaceState::Countdown;
        }
        RaceState::Countdown => tick_countdown(session, dt),
        RaceState::Racing => tick_racing(session, track, input, dt),
        RaceState::Finished => finish_race(session),
    }
}

/// The displayed number steps down at fixed remaining-time thresholds.
/// A long frame can skip a number but never the expiry.
fn tick_countdown(session: &mut RaceSession, dt: f32) {
    session.countdown -= dt;
    if session.countdown <= 0.0 {
        session.countdown_display = 0;
        session.state = RaceState::Racing;
        log::info!("Go!");
    } else if session.countdown <= 1.0 {
        session.countdown_display = 1;
    } else if session.countdown <= 2.0 {
        session.countdown_display = 2;
    }
}

fn tick_racing(session: &mut RaceSession, track: &dyn TrackQuery, input: &TickInput, dt: f32) {
    if let Some(player) = session.player.and_then(|p| session.vehicles.get_mut(p)) {
        player.set_controls(input.player);
    }

    for driver in &mut session.drivers {
        driver.update(&mut session.vehicles, track, dt);
    }

    for vehicle in &mut session.vehicles {
        vehicle.update(track, dt);
    }

    resolve_vehicle_collisions(&mut session.vehicles);

    session.race_time += dt;
    session.update_places();

    if session.race_complete() {
        session.state = RaceState::Finished;
        log::info!("Race finished at {:.2}s", session.race_time);
    }
}

/// Final placement, Grand Prix points, then the results screen
fn finish_race(session: &mut RaceSession) {
    session.update_places();
    if let Some(gp) = session.grand_prix.as_mut() {
        let places: Vec<u32> = session.vehicles.iter().map(|v| v.place).collect();
        gp.award(&places);
        log::info!(
            "Grand Prix race {}/{} scored: {:?}",
            gp.race_index + 1,
            gp.total_races,
            gp.points
        );
    }
    session.state = RaceState::Results;
}

/// Fixed-timestep accumulator.
///
/// Frame time is clamped to [`MAX_FRAME_TIME`] so a long stall can't
/// trigger a runaway catch-up; leftover time carries to the next frame.
#[derive(Debug, Clone, Default)]
pub struct FixedStepper {
    accumulator: f32,
}

impl FixedStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame's elapsed time and run `step(SIM_DT)` for each whole
    /// tick it covers. Returns the number of ticks run.
    pub fn advance<F: FnMut(f32)>(&mut self, frame_dt: f32, mut step: F) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_TIME);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            step(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    /// Time carried into the next frame
    pub fn remainder(&self) -> f32 {
        self.accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RaceSettings;
    use crate::sim::RaceMode;
    use crate::sim::ai::Difficulty;
    use crate::track::RingTrack;

    fn run_until(
        session: &mut RaceSession,
        track: &RingTrack,
        input: &TickInput,
        state: RaceState,
        max_ticks: usize,
    ) -> usize {
        for n in 0..max_ticks {
            if session.state() == state {
                return n;
            }
            tick(session, track, input, SIM_DT);
        }
        panic!("never reached {:?}", state);
    }

    #[test]
    fn test_init_goes_to_menu() {
        let track = RingTrack::default();
        let mut session = RaceSession::new();
        tick(&mut session, &track, &TickInput::default(), SIM_DT);
        assert_eq!(session.state(), RaceState::Menu);
    }

    #[test]
    fn test_countdown_steps_and_starts_race() {
        let track = RingTrack::default();
        let mut session = RaceSession::new();
        session.start_race(RaceSettings::default(), &track);
        let input = TickInput::default();

        tick(&mut session, &track, &input, SIM_DT);
        assert_eq!(session.state(), RaceState::Countdown);
        assert_eq!(session.countdown_display(), 3);

        let mut seen = vec![session.countdown_display()];
        let mut ticks = 0;
        while session.state() == RaceState::Countdown {
            tick(&mut session, &track, &input, SIM_DT);
            ticks += 1;
            if seen.last() != Some(&session.countdown_display()) {
                seen.push(session.countdown_display());
            }
        }
        assert_eq!(seen, vec![3, 2, 1, 0]);
        assert_eq!(session.state(), RaceState::Racing);
        assert!((179..=181).contains(&ticks));
        // Nobody moved during the countdown
        assert_eq!(session.race_time, 0.0);
    }

    #[test]
    fn test_long_hitch_skips_display_not_expiry() {
        let track = RingTrack::default();
        let mut session = RaceSession::new();
        session.start_race(RaceSettings::default(), &track);
        let input = TickInput::default();
        tick(&mut session, &track, &input, SIM_DT);

        // 3.0 -> 0.5 in one step: "2" is never shown
        tick(&mut session, &track, &input, 2.5);
        assert_eq!(session.countdown_display(), 1);
        tick(&mut session, &track, &input, 1.5);
        assert_eq!(session.countdown_display(), 0);
        assert_eq!(session.state(), RaceState::Racing);
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let track = RingTrack::default();
        let mut session = RaceSession::new();
        session.start_race(RaceSettings::default(), &track);
        let drive = TickInput {
            player: Controls::new(0.0, 1.0, 0.0),
            pause: false,
        };
        run_until(&mut session, &track, &drive, RaceState::Racing, 400);
        for _ in 0..30 {
            tick(&mut session, &track, &drive, SIM_DT);
        }

        let pause = TickInput {
            pause: true,
            ..drive.clone()
        };
        tick(&mut session, &track, &pause, SIM_DT);
        assert_eq!(session.state(), RaceState::Paused);
        let frozen: Vec<_> = session.vehicles().iter().map(|v| v.position).collect();
        let frozen_time = session.race_time;

        for _ in 0..60 {
            tick(&mut session, &track, &drive, SIM_DT);
        }
        let after: Vec<_> = session.vehicles().iter().map(|v| v.position).collect();
        assert_eq!(frozen, after);
        assert_eq!(session.race_time, frozen_time);

        tick(&mut session, &track, &pause, SIM_DT);
        assert_eq!(session.state(), RaceState::Racing);
        assert!(session.race_time > frozen_time);
    }

    #[test]
    fn test_pole_sitter_is_first_on_first_racing_tick() {
        let track = RingTrack::default();
        let mut session = RaceSession::new();
        session.start_race(RaceSettings::default(), &track);
        let input = TickInput::default();
        run_until(&mut session, &track, &input, RaceState::Racing, 400);

        tick(&mut session, &track, &input, SIM_DT);
        let places: Vec<u32> = session.vehicles().iter().map(|v| v.place).collect();
        assert_eq!(places, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_grand_prix_race_is_scored_once() {
        let track = RingTrack::default();
        let mut session = RaceSession::new();
        session.start_race(
            RaceSettings {
                mode: RaceMode::GrandPrix,
                laps: 1,
                opponents: 3,
                ..RaceSettings::default()
            },
            &track,
        );
        let input = TickInput::default();
        run_until(&mut session, &track, &input, RaceState::Racing, 400);
        session.vehicles[0].current_lap = 1;
        run_until(&mut session, &track, &input, RaceState::Results, 10);
        let scored = session.grand_prix.as_ref().unwrap().points.clone();
        assert_eq!(scored[0], 10);

        // Rerunning the scored race is refused
        session.restart(&track);
        assert_eq!(session.state(), RaceState::Results);
        for _ in 0..10 {
            tick(&mut session, &track, &input, SIM_DT);
        }
        let gp = session.grand_prix.as_ref().unwrap();
        assert_eq!(gp.points, scored);
        assert_eq!(gp.race_index, 0);
    }

    #[test]
    fn test_player_finish_ends_race() {
        let track = RingTrack::default();
        let mut session = RaceSession::new();
        session.start_race(
            RaceSettings {
                laps: 1,
                ..RaceSettings::default()
            },
            &track,
        );
        let input = TickInput::default();
        run_until(&mut session, &track, &input, RaceState::Racing, 400);

        // Force the player over the line
        session.vehicles[0].current_lap = 1;
        tick(&mut session, &track, &input, SIM_DT);
        assert!(session.vehicles()[0].finished);
        assert_eq!(session.state(), RaceState::Finished);
        assert!(session.vehicles()[1..].iter().all(|v| !v.finished));

        tick(&mut session, &track, &input, SIM_DT);
        assert_eq!(session.state(), RaceState::Results);
        assert_eq!(session.vehicles()[0].place, 1);
    }

    #[test]
    fn test_spectator_race_runs_to_results() {
        let track = RingTrack::default();
        let mut session = RaceSession::new();
        session.start_race(
            RaceSettings {
                mode: RaceMode::Spectator,
                laps: 1,
                opponents: 4,
                difficulty: Difficulty::Expert,
                ..RaceSettings::default()
            },
            &track,
        );
        let input = TickInput::default();
        // One lap of a 120-radius ring is ~754 units; give it a couple of minutes
        run_until(&mut session, &track, &input, RaceState::Results, 60 * 180);

        assert!(session.vehicles().iter().all(|v| v.finished));
        assert!(session.vehicles().iter().all(|v| v.current_lap >= 1));
        let results = session.results();
        assert_eq!(results.len(), 4);
        assert_eq!(session.vehicles()[results[0]].place, 1);
    }

    #[test]
    fn test_grand_prix_awards_and_advances() {
        let track = RingTrack::default();
        let mut session = RaceSession::new();
        session.start_race(
            RaceSettings {
                mode: RaceMode::GrandPrix,
                laps: 1,
                opponents: 3,
                ..RaceSettings::default()
            },
            &track,
        );
        let input = TickInput::default();

        for race in 0..4 {
            run_until(&mut session, &track, &input, RaceState::Racing, 400);
            assert_eq!(session.vehicles()[0].current_lap, 0);
            session.vehicles[0].current_lap = 1;
            run_until(&mut session, &track, &input, RaceState::Results, 10);

            let gp = session.grand_prix.as_ref().unwrap();
            assert_eq!(gp.race_index, race);
            assert_eq!(gp.points[0], 10 * (race + 1));

            let advanced = session.advance_tournament_race(&track);
            assert_eq!(advanced, race < 3);
        }
        let gp = session.grand_prix.as_ref().unwrap();
        assert!(gp.finished);
        assert_eq!(session.state(), RaceState::Results);
        assert_eq!(session.standings().unwrap()[0].vehicle, 0);
    }

    #[test]
    fn test_restart_resets_progress() {
        let track = RingTrack::default();
        let mut session = RaceSession::new();
        session.start_race(RaceSettings::default(), &track);
        let drive = TickInput {
            player: Controls::new(0.0, 1.0, 0.0),
            pause: false,
        };
        run_until(&mut session, &track, &drive, RaceState::Racing, 400);
        for _ in 0..120 {
            tick(&mut session, &track, &drive, SIM_DT);
        }
        assert!(session.vehicles()[0].total_time > 0.0);

        session.restart(&track);
        assert_eq!(session.state(), RaceState::Loading);
        assert!(session.vehicles().iter().all(|v| v.total_time == 0.0 && v.speed == 0.0));
    }

    #[test]
    fn test_fixed_stepper_clamps_and_carries() {
        let mut stepper = FixedStepper::new();
        let mut ticks = 0;
        assert_eq!(stepper.advance(SIM_DT * 2.5, |_| ticks += 1), 2);
        assert_eq!(ticks, 2);
        assert!((stepper.remainder() - SIM_DT * 0.5).abs() < 1e-5);

        // A two second stall only counts as MAX_FRAME_TIME
        let n = stepper.advance(2.0, |dt| assert_eq!(dt, SIM_DT));
        assert_eq!(n, 6);
        assert!(stepper.remainder() < SIM_DT);
    }
}
