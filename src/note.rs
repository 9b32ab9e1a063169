use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Scientific pitch name for a MIDI note number, e.g. 60 -> "C4".
pub fn note_name(pitch: u8) -> String {
    let octave = i16::from(pitch) / 12 - 1;
    format!("{}{}", NOTE_NAMES[usize::from(pitch % 12)], octave)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressedNote {
    pub pitch: u8,
    pub velocity: u8,
    pub pressed_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEvent {
    NoteOn(u8, u8), // (midi number, velocity)
    NoteOff(u8),    // (midi number)
}

/// The keys currently held down, at most one entry per pitch.
#[derive(Debug)]
pub struct NoteMap {
    notes: BTreeMap<u8, PressedNote>,
    // Whether the light may still be showing a chord. Starts set so the
    // first empty sweep after startup switches the light off.
    lit: bool,
}

impl Default for NoteMap {
    fn default() -> Self {
        Self {
            notes: BTreeMap::new(),
            lit: true,
        }
    }
}

impl NoteMap {
    /// Records a key press. Pressing an already-held pitch refreshes its
    /// velocity and timestamp instead of adding a second entry.
    pub fn insert_or_update(&mut self, pitch: u8, velocity: u8, now: Instant) {
        self.notes.insert(
            pitch,
            PressedNote {
                pitch,
                velocity,
                pressed_at: now,
            },
        );
        self.lit = true;
    }

    /// Releases a key. Unknown pitches are ignored.
    pub fn remove(&mut self, pitch: u8) {
        self.notes.remove(&pitch);
    }

    /// Drops every note held for at least `max_age`.
    ///
    /// Returns `true` when the map has just gone dark: it is empty and has
    /// held notes since the last time `prune` returned `true`. Repeated
    /// prunes of an already-dark map return `false`.
    pub fn prune(&mut self, now: Instant, max_age: Duration) -> bool {
        self.notes
            .retain(|_, note| now.saturating_duration_since(note.pressed_at) < max_age);

        if self.notes.is_empty() && self.lit {
            self.lit = false;
            true
        } else {
            false
        }
    }

    /// Copy of the held notes, ordered by pitch.
    pub fn snapshot(&self) -> Vec<PressedNote> {
        self.notes.values().copied().collect()
    }
}

/// Process-wide handle to the [`NoteMap`], shared by the event router and
/// the expiry sweeper. The lock is only held for the map operation itself.
#[derive(Debug, Clone, Default)]
pub struct SharedNotes {
    inner: Arc<Mutex<NoteMap>>,
}

impl SharedNotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_or_update(&self, pitch: u8, velocity: u8, now: Instant) {
        self.inner.lock().await.insert_or_update(pitch, velocity, now);
    }

    pub async fn remove(&self, pitch: u8) {
        self.inner.lock().await.remove(pitch);
    }

    /// Prunes stale notes. When the map goes dark, `on_dark` runs before the
    /// lock is released, so anything it queues is ordered against presses.
    pub async fn prune_then(
        &self,
        now: Instant,
        max_age: Duration,
        on_dark: impl FnOnce(),
    ) -> bool {
        let mut notes = self.inner.lock().await;
        let went_dark = notes.prune(now, max_age);
        if went_dark {
            on_dark();
        }
        went_dark
    }

    /// Hands the current snapshot to `f` while the lock is still held.
    pub async fn snapshot_then<R>(&self, f: impl FnOnce(&[PressedNote]) -> R) -> R {
        let notes = self.inner.lock().await;
        f(&notes.snapshot())
    }

    #[cfg(test)]
    pub async fn snapshot(&self) -> Vec<PressedNote> {
        self.inner.lock().await.snapshot()
    }
}
