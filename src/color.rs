use crate::note::PressedNote;

/// Color and brightness to show on the light for one chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightState {
    pub rgb: [u8; 3],
    pub brightness: u8,
}

impl LightState {
    pub fn from_notes(notes: &[PressedNote]) -> Self {
        Self {
            rgb: compute_color(notes),
            brightness: compute_brightness(notes),
        }
    }
}

/// Hashes the chord onto the chromatic circle: the floored mean pitch class
/// `a` becomes `[a*21, a*42, a*84]`, each wrapped to a byte.
pub fn compute_color(notes: &[PressedNote]) -> [u8; 3] {
    if notes.is_empty() {
        return [0, 0, 0];
    }

    let class_sum: usize = notes.iter().map(|n| usize::from(n.pitch % 12)).sum();
    let avg = class_sum / notes.len();

    [
        ((avg * 21) % 256) as u8,
        ((avg * 42) % 256) as u8,
        ((avg * 84) % 256) as u8,
    ]
}

/// Mean velocity scaled to 0-255, boosted by `count / 1.5` so that big
/// chords saturate around six keys.
pub fn compute_brightness(notes: &[PressedNote]) -> u8 {
    if notes.is_empty() {
        return 0;
    }

    let total_velocity: u32 = notes.iter().map(|n| u32::from(n.velocity)).sum();
    let count = notes.len() as f64;
    let brightness = (f64::from(total_velocity) / (count * 127.0)) * 255.0 * (count / 1.5);

    // `as` truncates toward zero and saturates, matching int() then min(255).
    (brightness as i64).clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn chord(keys: &[(u8, u8)]) -> Vec<PressedNote> {
        let now = Instant::now();
        keys.iter()
            .map(|&(pitch, velocity)| PressedNote {
                pitch,
                velocity,
                pressed_at: now,
            })
            .collect()
    }

    #[test]
    fn test_empty_chord_is_dark() {
        assert_eq!(compute_color(&[]), [0, 0, 0]);
        assert_eq!(compute_brightness(&[]), 0);
        assert_eq!(
            LightState::from_notes(&[]),
            LightState {
                rgb: [0, 0, 0],
                brightness: 0
            }
        );
    }

    #[test]
    fn test_major_third_at_full_velocity() {
        let notes = chord(&[(60, 127), (64, 127)]);
        assert_eq!(compute_color(&notes), [42, 84, 168]);
        // 340 before clamping
        assert_eq!(compute_brightness(&notes), 255);
    }

    #[test]
    fn test_single_soft_note() {
        let notes = chord(&[(60, 10)]);
        assert_eq!(compute_color(&notes), [0, 0, 0]);
        assert_eq!(compute_brightness(&notes), 13);
    }

    #[test]
    fn test_mean_pitch_class_is_floored() {
        // (0 + 4 + 7) / 3 = 3
        let notes = chord(&[(60, 64), (64, 64), (67, 64)]);
        assert_eq!(compute_color(&notes), [63, 126, 252]);
    }

    #[test]
    fn test_color_wraps_past_a_byte() {
        // Pitch class 11 (B): 11*42 = 462 -> 206, 11*84 = 924 -> 156
        let notes = chord(&[(71, 100)]);
        assert_eq!(compute_color(&notes), [231, 206, 156]);
    }

    #[test]
    fn test_brightness_grows_with_chord_size() {
        let one = compute_brightness(&chord(&[(60, 64)]));
        let three = compute_brightness(&chord(&[(60, 64), (64, 64), (67, 64)]));
        assert_eq!(one, 85);
        assert_eq!(three, 255);
        assert!(three > one);
    }

    #[test]
    fn test_brightness_extremes() {
        assert_eq!(compute_brightness(&chord(&[(21, 1)])), 1);

        let keys: Vec<(u8, u8)> = (48..60).map(|pitch| (pitch, 127)).collect();
        assert_eq!(compute_brightness(&chord(&keys)), 255);
    }
}
