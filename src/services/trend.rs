//! Linear trend projection of approach distance over time.

use crate::domain::{CloseApproachEvent, ProjectedSample, Projection, TrendModel};
use crate::utils::{mean, ordinal_day, sample_std_dev};
use chrono::{Duration, NaiveDateTime};
use tracing::debug;

/// Fewer observations than this and projection is skipped
pub const MIN_POINTS: usize = 5;
pub const PROJECTION_STEPS: i64 = 6;
pub const STEP_DAYS: i64 = 30;

const BAND_NOTE: &str =
    "Band is half the sample standard deviation of observed distances; it is not a statistical confidence interval.";

/// Ordinary least squares of distance against ordinal day.
///
/// Callers must supply at least [`MIN_POINTS`] points; [`project_events`]
/// enforces this. When every point shares the same day the slope is zero and
/// the intercept is the mean distance.
pub fn fit_linear(points: &[(i64, f64)]) -> TrendModel {
    let xs: Vec<f64> = points.iter().map(|(x, _)| *x as f64).collect();
    let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
    let mean_x = mean(&xs).unwrap_or(f64::NAN);
    let mean_y = mean(&ys).unwrap_or(f64::NAN);

    let (sxy, sxx) = xs
        .iter()
        .zip(&ys)
        .fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
            let dx = x - mean_x;
            (sxy + dx * (y - mean_y), sxx + dx * dx)
        });

    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };

    TrendModel {
        slope,
        intercept: mean_y - slope * mean_x,
        error_band: sample_std_dev(&ys).unwrap_or(0.0) / 2.0,
        point_count: points.len(),
    }
}

/// Six samples, 30 days apart, starting 30 days after `last_observed`.
/// The band width is the same for every sample.
pub fn project(model: &TrendModel, last_observed: NaiveDateTime) -> Vec<ProjectedSample> {
    (1..=PROJECTION_STEPS)
        .map(|i| {
            let date = last_observed + Duration::days(STEP_DAYS * i);
            let predicted = model.predict(ordinal_day(date.date()));
            ProjectedSample {
                date,
                predicted_distance: predicted,
                lower_bound: predicted - model.error_band,
                upper_bound: predicted + model.error_band,
            }
        })
        .collect()
}

/// Fit and project over events with a valid date and a known distance.
/// Returns `None` when there are too few such events.
pub fn project_events(events: &[CloseApproachEvent]) -> Option<Projection> {
    let observed: Vec<(NaiveDateTime, f64)> = events
        .iter()
        .filter_map(|e| {
            let t = e.close_approach_time.valid()?;
            e.distance_au.is_finite().then_some((t, e.distance_au))
        })
        .collect();

    if observed.len() < MIN_POINTS {
        debug!(points = observed.len(), "not enough data for projection");
        return None;
    }

    let last_observed = observed.iter().map(|(t, _)| *t).max()?;
    let points: Vec<(i64, f64)> = observed
        .iter()
        .map(|(t, d)| (ordinal_day(t.date()), *d))
        .collect();

    let model = fit_linear(&points);
    Some(Projection {
        model,
        last_observed,
        samples: project(&model, last_observed),
        note: BAND_NOTE,
    })
}
