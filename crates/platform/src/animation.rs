//! Drive [`Ramp`]s against a clock.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use corelib::animate::Ramp;
use corelib::chain::Chain;
use corelib::link::DhField;
use parking_lot::Mutex;

use crate::clock::{CancelToken, Clock, SystemClock};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RampReport {
    /// Sub-steps applied.
    pub applied: u32,
    pub cancelled: bool,
    pub elapsed: Duration,
    /// Field value after the last applied step.
    pub final_value: f64,
}

/// Apply each step, then wait one interval; stops early when cancelled.
fn drive<C, F>(ramp: &Ramp, clock: &C, cancel: &CancelToken, mut apply: F) -> Result<RampReport>
where
    C: Clock + ?Sized,
    F: FnMut(f64) -> Result<f64>,
{
    let start = clock.now();
    let interval = ramp.interval();
    let mut report = RampReport {
        applied: 0,
        cancelled: false,
        elapsed: Duration::ZERO,
        final_value: f64::NAN,
    };
    for step in ramp.steps() {
        if cancel.is_cancelled() {
            log::warn!(
                "ramp of {} cancelled after {}/{} steps",
                ramp.field,
                report.applied,
                ramp.step_count()
            );
            report.cancelled = true;
            break;
        }
        report.final_value = apply(step.delta)?;
        report.applied += 1;
        clock.sleep(interval);
    }
    report.elapsed = clock.now().saturating_sub(start);
    Ok(report)
}

pub fn run_ramp<C: Clock + ?Sized>(
    chain: &mut Chain,
    index: usize,
    ramp: &Ramp,
    clock: &C,
    cancel: &CancelToken,
) -> Result<RampReport> {
    let start = chain.link(index)?.get(ramp.field);
    log::info!(
        "ramp link {index} {}: {start} -> {} in {} steps over {:?}",
        ramp.field,
        ramp.end_value(start),
        ramp.step_count(),
        ramp.duration
    );
    let mut report = drive(ramp, clock, cancel, |delta| {
        chain
            .nudge(index, ramp.field, delta)
            .with_context(|| format!("stepping {} of link {index}", ramp.field))?;
        Ok(chain.link(index)?.get(ramp.field))
    })?;
    if report.applied == 0 {
        report.final_value = start;
    }
    log::info!(
        "ramp link {index} {} done: {} steps, value {}",
        ramp.field,
        report.applied,
        report.final_value
    );
    Ok(report)
}

/// Blocking ramp on the wall clock: add `increment` to `field` in `steps`
/// equal parts spread over `duration`.
pub fn set_delayed(
    chain: &mut Chain,
    index: usize,
    field: DhField,
    increment: f64,
    duration: Duration,
    steps: u32,
) -> Result<RampReport> {
    let ramp = Ramp::new(field, increment, duration, steps);
    run_ramp(chain, index, &ramp, &SystemClock::new(), &CancelToken::new())
}

/// Run a ramp on a worker thread with the wall clock.
pub fn spawn_ramp(
    chain: Arc<Mutex<Chain>>,
    index: usize,
    ramp: Ramp,
    cancel: CancelToken,
) -> Result<JoinHandle<Result<RampReport>>> {
    spawn_ramp_with(chain, index, ramp, cancel, Arc::new(SystemClock::new()))
}

/// Like [`spawn_ramp`] with a caller-provided clock. The chain is locked only
/// while a step is applied.
pub fn spawn_ramp_with<C: Clock + 'static>(
    chain: Arc<Mutex<Chain>>,
    index: usize,
    ramp: Ramp,
    cancel: CancelToken,
    clock: Arc<C>,
) -> Result<JoinHandle<Result<RampReport>>> {
    chain.lock().link(index)?;
    std::thread::Builder::new()
        .name(format!("ramp-link-{index}"))
        .spawn(move || -> Result<RampReport> {
            log::info!("worker ramp of link {index} {} started", ramp.field);
            let report = drive(&ramp, clock.as_ref(), &cancel, |delta| {
                let mut chain = chain.lock();
                chain.nudge(index, ramp.field, delta)?;
                Ok(chain.link(index)?.get(ramp.field))
            })?;
            log::info!(
                "worker ramp of link {index} finished after {} steps",
                report.applied
            );
            Ok(report)
        })
        .context("failed to spawn ramp worker")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use corelib::DVec3;
    use corelib::link::{DhParams, LinkConfig};

    fn planar() -> Chain {
        let mut chain = Chain::new("0");
        chain
            .push(LinkConfig::revolute(DhParams::new(1.0, -90.0, 0.0, 0.0), 45.0))
            .unwrap();
        chain
            .push(LinkConfig::prismatic(DhParams::new(1.0, 0.0, 0.0, 0.0), 0.5))
            .unwrap();
        chain
    }

    #[test]
    fn ramp_applies_every_step_and_waits() {
        let mut chain = planar();
        let clock = ManualClock::new();
        let ramp = Ramp::new(DhField::Q, 90.0, Duration::from_millis(900), 90);
        let report = run_ramp(&mut chain, 0, &ramp, &clock, &CancelToken::new()).unwrap();
        assert_eq!(report.applied, 90);
        assert!(!report.cancelled);
        assert_eq!(report.elapsed, Duration::from_millis(900));
        assert!((report.final_value - 135.0).abs() < 1e-9);
        assert_eq!(chain.link(0).unwrap().revision(), 90);
    }

    #[test]
    fn ramp_is_relative_to_current_value() {
        let mut chain = planar();
        let clock = ManualClock::new();
        let ramp = Ramp::new(DhField::Q, 1.0, Duration::ZERO, 4);
        run_ramp(&mut chain, 1, &ramp, &clock, &CancelToken::new()).unwrap();
        chain.update(1, DhField::Q, chain.link(1).unwrap().q() + 0.25).unwrap();
        let report = run_ramp(&mut chain, 1, &ramp, &clock, &CancelToken::new()).unwrap();
        assert!((report.final_value - 2.75).abs() < 1e-12);
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn cancelled_ramp_stops_before_next_step() {
        let mut chain = planar();
        let cancel = CancelToken::new();
        cancel.cancel();
        let ramp = Ramp::new(DhField::Q, 10.0, Duration::from_secs(10), 10);
        let report = run_ramp(&mut chain, 0, &ramp, &ManualClock::new(), &cancel).unwrap();
        assert!(report.cancelled);
        assert_eq!(report.applied, 0);
        assert_eq!(report.final_value, 45.0);
        assert_eq!(chain.link(0).unwrap().revision(), 0);
    }

    #[test]
    fn unknown_link_fails_before_stepping() {
        let mut chain = planar();
        let ramp = Ramp::immediate(DhField::Q, 1.0);
        assert!(run_ramp(&mut chain, 9, &ramp, &ManualClock::new(), &CancelToken::new()).is_err());
    }

    #[test]
    fn set_delayed_without_duration_does_not_block() {
        let mut chain = planar();
        let report = set_delayed(&mut chain, 0, DhField::Theta, 30.0, Duration::ZERO, 3).unwrap();
        assert_eq!(report.applied, 3);
        assert!((chain.link(0).unwrap().params().theta - 30.0).abs() < 1e-12);
    }

    #[test]
    fn set_delayed_waits_on_the_wall_clock() {
        let mut chain = planar();
        let duration = Duration::from_millis(40);
        let started = std::time::Instant::now();
        let report = set_delayed(&mut chain, 1, DhField::Q, 0.5, duration, 4).unwrap();
        assert_eq!(report.applied, 4);
        assert!(report.elapsed >= duration);
        assert!(started.elapsed() >= duration);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!((chain.link(1).unwrap().q() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn worker_ramp_moves_the_shared_chain() {
        let chain = Arc::new(Mutex::new(planar()));
        let ramp = Ramp::new(DhField::Q, -45.0, Duration::from_millis(450), 45);
        let clock = Arc::new(ManualClock::new());
        let handle = spawn_ramp_with(
            Arc::clone(&chain),
            0,
            ramp,
            CancelToken::new(),
            Arc::clone(&clock),
        )
        .unwrap();
        let report = handle.join().unwrap().unwrap();
        assert_eq!(report.applied, 45);
        assert_eq!(clock.now(), Duration::from_millis(450));

        let chain = chain.lock();
        assert!(chain.link(0).unwrap().q().abs() < 1e-9);
        // q = 0: the arm lies along world x
        let tip = chain
            .tree()
            .world_translation(chain.end_effector(), DVec3::ZERO)
            .unwrap();
        assert!((tip - DVec3::new(2.0, 0.5, 0.0)).length() < 1e-9);
    }

    #[test]
    fn worker_rejects_bad_index_up_front() {
        let chain = Arc::new(Mutex::new(planar()));
        let ramp = Ramp::immediate(DhField::Q, 1.0);
        assert!(spawn_ramp(chain, 3, ramp, CancelToken::new()).is_err());
    }
}
