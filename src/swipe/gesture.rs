use std::time::{Duration, Instant};

/// Outcome of one swipe or tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Keep,
    Delete,
    /// Released below both thresholds; the card snaps back.
    None,
}

/// Distances (in logical pixels) a drag must pass to count as a decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub translation: f32,
    pub velocity: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            translation: 100.0,
            velocity: 200.0,
        }
    }
}

/// Inputs beyond this magnitude are clamped before comparison.
const MAX_MAGNITUDE: f32 = 100_000.0;

/// Look-ahead used to turn pointer velocity into a projected travel distance.
const PREDICTION_WINDOW: Duration = Duration::from_millis(250);

/// A pointer held still this long before release is no longer flicking.
const STILL_AFTER: Duration = Duration::from_millis(100);

fn sanitize(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-MAX_MAGNITUDE, MAX_MAGNITUDE)
    }
}

/// Classify a released drag. Positive x is right (keep), negative is left (delete).
///
/// `predicted_velocity_x` is the projected additional travel after release
/// (predicted end translation minus current translation). Either quantity
/// crossing its threshold is enough. NaN and infinite inputs are clamped,
/// never rejected.
pub fn classify(translation_x: f32, predicted_velocity_x: f32, thresholds: Thresholds) -> Decision {
    let x = sanitize(translation_x);
    let v = sanitize(predicted_velocity_x);
    let t = sanitize(thresholds.translation).abs();
    let vt = sanitize(thresholds.velocity).abs();

    if x < -t || v < -vt {
        Decision::Delete
    } else if x > t || v > vt {
        Decision::Keep
    } else {
        Decision::None
    }
}

/// Overlay label shown while dragging, with its opacity in `0.0..=1.0`.
///
/// Appears once the card has moved past `show_at` and is fully opaque at
/// `full_at`.
pub fn hint(translation_x: f32, show_at: f32, full_at: f32) -> Option<(Decision, f32)> {
    let x = sanitize(translation_x);
    let decision = if x > show_at {
        Decision::Keep
    } else if x < -show_at {
        Decision::Delete
    } else {
        return None;
    };

    let opacity = if full_at > 0.0 {
        (x.abs() / full_at).min(1.0)
    } else {
        1.0
    };
    Some((decision, opacity))
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    x: f32,
    at: Instant,
}

/// Accumulates pointer samples for one drag.
///
/// The first sample is the drag origin. `release` reports the translation
/// and the projected travel the classifier expects.
#[derive(Debug, Clone, Default)]
pub struct DragTracker {
    origin: Option<Sample>,
    previous: Option<Sample>,
    latest: Option<Sample>,
}

impl DragTracker {
    pub fn begin(&mut self, x: f32, at: Instant) {
        let sample = Sample { x, at };
        self.origin = Some(sample);
        self.previous = None;
        self.latest = Some(sample);
    }

    /// Record a pointer move. Ignored when no drag is active.
    pub fn update(&mut self, x: f32, at: Instant) {
        if self.origin.is_none() {
            return;
        }
        self.previous = self.latest;
        self.latest = Some(Sample { x, at });
    }

    pub fn is_active(&self) -> bool {
        self.origin.is_some()
    }

    /// Current horizontal offset from the drag origin.
    pub fn translation(&self) -> f32 {
        match (self.origin, self.latest) {
            (Some(origin), Some(latest)) => latest.x - origin.x,
            _ => 0.0,
        }
    }

    /// Projected travel beyond the current position.
    pub fn predicted_velocity(&self) -> f32 {
        let (Some(previous), Some(latest)) = (self.previous, self.latest) else {
            return 0.0;
        };
        let dt = latest.at.saturating_duration_since(previous.at).as_secs_f32();
        if dt <= f32::EPSILON {
            return 0.0;
        }
        (latest.x - previous.x) / dt * PREDICTION_WINDOW.as_secs_f32()
    }

    /// End the drag at `at`, returning `(translation_x, predicted_velocity_x)`.
    ///
    /// The projection drops to zero when the pointer rested for longer than
    /// `STILL_AFTER` before letting go.
    pub fn release(&mut self, at: Instant) -> Option<(f32, f32)> {
        let latest = self.latest?;
        let resting = at.saturating_duration_since(latest.at);
        let predicted = if resting > STILL_AFTER {
            0.0
        } else {
            self.predicted_velocity()
        };

        let result = (self.translation(), predicted);
        *self = Self::default();
        Some(result)
    }

    /// Abandon the drag without a decision.
    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Thresholds = Thresholds {
        translation: 100.0,
        velocity: 200.0,
    };

    #[test]
    fn test_translation_thresholds() {
        assert_eq!(classify(150.0, 0.0, T), Decision::Keep);
        assert_eq!(classify(-150.0, 0.0, T), Decision::Delete);
        assert_eq!(classify(100.0, 0.0, T), Decision::None);
        assert_eq!(classify(-100.0, 0.0, T), Decision::None);
        assert_eq!(classify(40.0, -20.0, T), Decision::None);
    }

    #[test]
    fn test_velocity_alone_decides() {
        assert_eq!(classify(10.0, 250.0, T), Decision::Keep);
        assert_eq!(classify(-10.0, -250.0, T), Decision::Delete);
    }

    #[test]
    fn test_delete_wins_on_conflicting_signals() {
        // Dragged right but flung hard left
        assert_eq!(classify(120.0, -300.0, T), Decision::Delete);
    }

    #[test]
    fn test_malformed_input_is_clamped() {
        assert_eq!(classify(f32::NAN, f32::NAN, T), Decision::None);
        assert_eq!(classify(f32::INFINITY, 0.0, T), Decision::Keep);
        assert_eq!(classify(f32::NEG_INFINITY, 0.0, T), Decision::Delete);
        let negative = Thresholds {
            translation: -100.0,
            velocity: -200.0,
        };
        assert_eq!(classify(150.0, 0.0, negative), Decision::Keep);
    }

    #[test]
    fn test_hint_labels_and_opacity() {
        assert_eq!(hint(30.0, 60.0, 120.0), None);
        assert_eq!(hint(90.0, 60.0, 120.0), Some((Decision::Keep, 0.75)));
        assert_eq!(hint(-240.0, 60.0, 120.0), Some((Decision::Delete, 1.0)));
    }

    #[test]
    fn test_tracker_reports_translation_and_projection() {
        let start = Instant::now();
        let mut tracker = DragTracker::default();
        tracker.begin(200.0, start);
        tracker.update(180.0, start + Duration::from_millis(50));
        tracker.update(130.0, start + Duration::from_millis(100));

        let (translation, predicted) = tracker
            .release(start + Duration::from_millis(110))
            .unwrap();
        assert_eq!(translation, -70.0);
        // 50px in 50ms = 1000 px/s, projected over 250ms
        assert!((predicted + 250.0).abs() < 0.01);
        assert_eq!(classify(translation, predicted, T), Decision::Delete);
        assert!(!tracker.is_active());
    }

    #[test]
    fn test_tracker_ignores_moves_without_drag() {
        let mut tracker = DragTracker::default();
        tracker.update(50.0, Instant::now());
        assert_eq!(tracker.release(Instant::now()), None);
    }

    #[test]
    fn test_nudge_then_hold_is_not_a_flick() {
        let start = Instant::now();
        let mut tracker = DragTracker::default();
        tracker.begin(0.0, start);
        tracker.update(15.0, start + Duration::from_millis(10));

        // Held still for half a second before letting go
        let (translation, predicted) = tracker
            .release(start + Duration::from_millis(510))
            .unwrap();
        assert_eq!(translation, 15.0);
        assert_eq!(predicted, 0.0);
        assert_eq!(classify(translation, predicted, T), Decision::None);
    }

    #[test]
    fn test_quick_release_keeps_the_flick() {
        let start = Instant::now();
        let mut tracker = DragTracker::default();
        tracker.begin(0.0, start);
        tracker.update(15.0, start + Duration::from_millis(10));

        let (_, predicted) = tracker.release(start + Duration::from_millis(30)).unwrap();
        assert!(predicted > T.velocity);
    }

    #[test]
    fn test_cancel_drops_the_drag() {
        let start = Instant::now();
        let mut tracker = DragTracker::default();
        tracker.begin(0.0, start);
        tracker.update(180.0, start + Duration::from_millis(40));
        tracker.cancel();

        assert!(!tracker.is_active());
        assert_eq!(tracker.translation(), 0.0);
        assert_eq!(tracker.release(start + Duration::from_millis(50)), None);
    }
}
