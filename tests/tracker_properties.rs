//! Property tests for round aggregation and convergence tracking

mod common;

use captcha_lab::analysis::{ConfidenceAggregator, ConvergenceTracker, RunningAverage};
use captcha_lab::refinement::{CancelToken, RefinementController, SessionConfig};
use captcha_lab::types::Difficulty;
use common::{CountingProvider, ScriptedClassifier};
use quickcheck_macros::quickcheck;

fn unit(values: &[u8]) -> Vec<f64> {
    values.iter().map(|v| f64::from(*v) / 255.0).collect()
}

fn fold(values: &[f64]) -> RunningAverage {
    let mut average = RunningAverage::new();
    for value in values {
        average.fold(*value);
    }
    average
}

#[quickcheck]
fn running_average_ignores_fold_order(raw: Vec<u8>) -> bool {
    let values = unit(&raw);
    let mut reversed = values.clone();
    reversed.reverse();

    (fold(&values).value() - fold(&reversed).value()).abs() < 1e-9
}

#[quickcheck]
fn running_average_is_arithmetic_mean(raw: Vec<u8>) -> bool {
    let values = unit(&raw);
    let average = fold(&values);
    if values.is_empty() {
        return average.value() == 0.0 && average.count() == 0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (average.value() - mean).abs() < 1e-9 && average.count() == values.len() as u64
}

#[quickcheck]
fn round_mean_lies_within_grid_bounds(raw: Vec<u8>) -> bool {
    let size = ((raw.len() as f64).sqrt() as usize).max(1);
    let mut values = unit(&raw);
    values.resize(size * size, 0.5);

    let aggregator = match ConfidenceAggregator::new(size) {
        Ok(aggregator) => aggregator,
        Err(_) => return false,
    };
    let outcome = aggregator.run_round(
        1,
        Difficulty::Medium,
        &mut CountingProvider::default(),
        &mut ScriptedClassifier::cycle(values),
        &CancelToken::new(),
    );

    match outcome {
        Ok(outcome) => {
            outcome.mean >= outcome.grid.min() - 1e-12 && outcome.mean <= outcome.grid.max() + 1e-12
        }
        Err(_) => false,
    }
}

#[quickcheck]
fn history_tracks_completed_rounds(rounds: u8, fail_at: u8) -> bool {
    let rounds = usize::from(rounds % 6) + 1;
    let grid_size = 2;
    // Fail somewhere in the session, or never when past the last draw
    let fail_call = usize::from(fail_at % 30) + 1;

    let classifier = ScriptedClassifier::constant(0.4).failing_on(fail_call);
    let mut ctl = RefinementController::new(CountingProvider::default(), classifier);
    let result = ctl.run_session(
        SessionConfig::new(Difficulty::Easy, grid_size, rounds),
        &mut (),
        &CancelToken::new(),
    );

    let cells = grid_size * grid_size;
    let expected = if fail_call <= rounds * cells {
        (fail_call - 1) / cells
    } else {
        rounds
    };
    let history_ok = ctl.tracker().history().len() == expected;
    let samples_ok = ctl.tracker().samples_seen() == (expected * cells) as u64;
    history_ok && samples_ok && result.is_ok() == (expected == rounds)
}

#[test]
fn empty_tracker_reports_zero() {
    let tracker = ConvergenceTracker::new();
    assert_eq!(tracker.current_average(), 0.0);
    assert!(tracker.history().is_empty());
}
