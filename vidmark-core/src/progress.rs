// ============================================================================
// vidmark-core/src/progress.rs
// ============================================================================
//
// PROGRESS REPORTING: Throttled, monotonic progress events
//
// Progress is a pure function of the frame index, the (possibly unknown)
// total frame count and the last value reported. The mutable pair lives in an
// explicit JobState owned by the job driver.
//
// Guarantees:
// - nothing is reported when the total frame count is zero
// - at most one event per `step` percentage points
// - reported values never decrease and never exceed 100

use crate::status::StatusEvent;

/// Per-job progress counters, mutated only by the job driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobState {
    /// Frames consumed from the input so far (written or skipped)
    pub frame_index: u64,
    /// Last progress value sent on the status channel
    pub last_reported_progress: u8,
}

impl JobState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one more consumed frame and returns the progress event to emit, if any.
    pub fn advance(&mut self, total_frames: u64, step: u8) -> Option<StatusEvent> {
        self.frame_index += 1;
        let event = report_progress(
            self.frame_index,
            total_frames,
            self.last_reported_progress,
            step,
        )?;
        if let Some(progress) = event.progress_value() {
            self.last_reported_progress = progress;
        }
        Some(event)
    }
}

/// Integer percentage of `frame_index` over `total_frames`, rounded down.
///
/// Returns `None` when the total is unknown (zero). Containers sometimes report
/// fewer frames than they hold, so the result is clamped to 100.
pub fn percent_complete(frame_index: u64, total_frames: u64) -> Option<u8> {
    if total_frames == 0 {
        return None;
    }
    let done = u128::from(frame_index.min(total_frames));
    Some((done * 100 / u128::from(total_frames)) as u8)
}

/// Decides whether a progress event is due.
///
/// An event is produced when the current percentage is at least `step` points
/// above `last_reported`.
pub fn report_progress(
    frame_index: u64,
    total_frames: u64,
    last_reported: u8,
    step: u8,
) -> Option<StatusEvent> {
    let progress = percent_complete(frame_index, total_frames)?;
    let gain = progress.checked_sub(last_reported)?;
    if gain < step.max(1) {
        return None;
    }
    Some(StatusEvent::progress(
        progress,
        format!("Processing frame {frame_index}/{total_frames}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_job(total: u64, frames: u64, step: u8) -> Vec<u8> {
        let mut state = JobState::new();
        (0..frames)
            .filter_map(|_| state.advance(total, step))
            .filter_map(|e| e.progress_value())
            .collect()
    }

    #[test]
    fn zero_total_never_reports() {
        assert_eq!(percent_complete(5, 0), None);
        assert!(report_progress(5, 0, 0, 10).is_none());
        assert!(run_job(0, 50, 10).is_empty());
    }

    #[test]
    fn reports_every_ten_percent() {
        assert_eq!(run_job(100, 100, 10), vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    }

    #[test]
    fn floors_the_percentage() {
        // 3 frames: 33, 66, 100
        assert_eq!(run_job(3, 3, 10), vec![33, 66, 100]);
        assert_eq!(percent_complete(2, 3), Some(66));
    }

    #[test]
    fn message_names_frame_and_total() {
        let event = report_progress(25, 100, 10, 10).unwrap();
        assert_eq!(event, StatusEvent::progress(25, "Processing frame 25/100"));
    }

    #[test]
    fn small_gain_is_throttled() {
        assert!(report_progress(19, 100, 10, 10).is_none());
        assert!(report_progress(20, 100, 10, 10).is_some());
    }

    #[test]
    fn overrunning_total_is_clamped() {
        // Container under-reported its frame count.
        let values = run_job(10, 25, 10);
        assert_eq!(values.last(), Some(&100));
        assert!(values.iter().all(|&p| p <= 100));
    }

    #[test]
    fn never_decreases_and_respects_bound() {
        for total in [1u64, 2, 7, 9, 10, 11, 99, 101, 997, 30_000] {
            for step in [1u8, 5, 10, 33, 100] {
                let values = run_job(total, total + 3, step);
                assert!(values.windows(2).all(|w| w[0] <= w[1]), "total={total} step={step}");
                assert!(values.len() <= usize::from(100 / step) + 1, "total={total} step={step}");
            }
        }
    }

    #[test]
    fn zero_step_behaves_like_one() {
        let values = run_job(1000, 1000, 0);
        assert_eq!(values.len(), 100);
    }
}
