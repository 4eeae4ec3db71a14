//! Detection-sensitivity search.
//!
//! Drives a [`MarkerSource`] through the default threshold, a threshold
//! sweep and the circle fallback, stopping at the first configuration whose
//! marker count equals the expected verse count.

use crate::calibration::config::PipelineConfig;
use crate::coords::RawPoint;
use crate::detection::MarkerSource;

/// Which detector configuration produced a candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DetectionMethod {
    Template { threshold: f32 },
    Circles { sensitivity: u32 },
}

/// Best-effort detection result for one page.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationOutcome {
    /// Ordered markers in raw pixel space.
    pub points: Vec<RawPoint>,
    /// True when `points.len()` equals the expected count.
    pub exact: bool,
    pub method: DetectionMethod,
}

/// Search state: either still looking (tracking the closest candidate) or done.
enum SearchState {
    Searching {
        best: Vec<RawPoint>,
        best_diff: usize,
        method: DetectionMethod,
    },
    Matched {
        points: Vec<RawPoint>,
        method: DetectionMethod,
    },
}

impl SearchState {
    fn start(expected: usize, points: Vec<RawPoint>, method: DetectionMethod) -> Self {
        let diff = points.len().abs_diff(expected);
        if diff == 0 {
            Self::Matched { points, method }
        } else {
            Self::Searching {
                best: points,
                best_diff: diff,
                method,
            }
        }
    }

    /// Offers a candidate. Replaces the best only when strictly closer.
    fn offer(self, expected: usize, points: Vec<RawPoint>, method: DetectionMethod) -> Self {
        match self {
            Self::Searching { best_diff, .. } if points.len().abs_diff(expected) < best_diff => {
                Self::start(expected, points, method)
            }
            other => other,
        }
    }

    fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    fn finish(self) -> CalibrationOutcome {
        match self {
            Self::Matched { points, method } => CalibrationOutcome {
                points,
                exact: true,
                method,
            },
            Self::Searching { best, method, .. } => CalibrationOutcome {
                points: best,
                exact: false,
                method,
            },
        }
    }
}

/// Finds the detector configuration whose output count matches `expected`.
///
/// Order: default threshold, threshold sweep, circle sensitivities. If no
/// configuration matches, returns the candidate closest to `expected`
/// (earliest wins ties) with `exact == false`.
pub fn calibrate<S: MarkerSource>(
    source: &S,
    expected: usize,
    default_threshold: f32,
    config: &PipelineConfig,
) -> CalibrationOutcome {
    let method = DetectionMethod::Template {
        threshold: default_threshold,
    };
    let mut state = SearchState::start(expected, source.detect_template(default_threshold), method);

    for threshold in config.sweep.thresholds() {
        if state.is_matched() {
            break;
        }
        let points = source.detect_template(threshold);
        state = state.offer(expected, points, DetectionMethod::Template { threshold });
    }

    for &sensitivity in &config.circles.sensitivities {
        if state.is_matched() {
            break;
        }
        let points = source.detect_circles(sensitivity);
        state = state.offer(expected, points, DetectionMethod::Circles { sensitivity });
    }

    state.finish()
}
