use crate::definitions::DEFAULT_FPS;

/// The frame rate the engines actually use: `reported` if it is a positive, finite number,
/// otherwise [`DEFAULT_FPS`].
#[must_use]
pub fn effective_fps(reported: f64) -> f64 {
    if reported.is_finite() && reported > 0.0 {
        reported
    } else {
        DEFAULT_FPS
    }
}

/// Format the timestamp of frame `index` as `H:MM:SS`. Fractions of a second are truncated.
///
/// ```
/// use vid_loop_finder_lib::time_label;
/// assert_eq!(time_label(0, 30.0), "0:00:00");
/// assert_eq!(time_label(90, 30.0), "0:00:03");
/// assert_eq!(time_label(108_000, 30.0), "1:00:00");
/// ```
#[must_use]
pub fn time_label(index: u64, fps: f64) -> String {
    let fps = effective_fps(fps);
    let total_secs = (index as f64 / fps).floor() as u64;

    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    format!("{hours}:{mins:02}:{secs:02}")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_time_label() {
        assert_eq!(time_label(0, 30.0), "0:00:00");
        assert_eq!(time_label(29, 30.0), "0:00:00");
        assert_eq!(time_label(30, 30.0), "0:00:01");
        assert_eq!(time_label(1830, 30.0), "0:01:01");
        assert_eq!(time_label(25 * 3725, 25.0), "1:02:05");
    }

    #[test]
    fn test_bad_fps_falls_back() {
        assert_eq!(effective_fps(0.0), DEFAULT_FPS);
        assert_eq!(effective_fps(-5.0), DEFAULT_FPS);
        assert_eq!(effective_fps(f64::NAN), DEFAULT_FPS);
        assert_eq!(effective_fps(24.0), 24.0);

        assert_eq!(time_label(300, 0.0), "0:00:10");
    }
}
