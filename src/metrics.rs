use std::time::Duration;

/// Average word length used to turn characters into words.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Minimum accuracy (percent) required to pass a level.
pub const PASS_ACCURACY: f64 = 95.0;

/// Words per minute from correctly typed characters. Zero when no time has elapsed.
pub fn wpm(correct_chars: usize, elapsed: Duration) -> f64 {
    let elapsed_minutes = elapsed.as_secs_f64() / 60.0;
    if elapsed_minutes == 0.0 {
        return 0.0;
    }

    (correct_chars as f64 / CHARS_PER_WORD) / elapsed_minutes
}

/// Percentage of keystrokes that matched. 100 before any keystroke.
pub fn accuracy(correct_chars: usize, total_keystrokes: usize) -> f64 {
    if total_keystrokes == 0 {
        return 100.0;
    }

    (correct_chars as f64 / total_keystrokes as f64) * 100.0
}

pub fn passes(wpm: f64, accuracy: f64, target_wpm: f64) -> bool {
    wpm >= target_wpm && accuracy >= PASS_ACCURACY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wpm_one_minute() {
        assert_eq!(wpm(50, Duration::from_secs(60)), 10.0);
    }

    #[test]
    fn test_wpm_half_minute() {
        assert_eq!(wpm(25, Duration::from_secs(30)), 10.0);
    }

    #[test]
    fn test_wpm_zero_elapsed() {
        assert_eq!(wpm(100, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_accuracy_no_keystrokes() {
        assert_eq!(accuracy(0, 0), 100.0);
    }

    #[test]
    fn test_accuracy_partial() {
        assert_eq!(accuracy(1, 2), 50.0);
        assert_eq!(accuracy(0, 1), 0.0);
        assert_eq!(accuracy(3, 4), 75.0);
    }

    #[test]
    fn test_passes_requires_both_thresholds() {
        assert!(passes(50.0, 95.0, 50.0));
        assert!(!passes(49.9, 100.0, 50.0));
        assert!(!passes(80.0, 94.9, 50.0));
        assert!(passes(0.0, 100.0, 0.0));
    }
}
