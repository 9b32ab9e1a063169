use log::{debug, error, info};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::color::LightState;
use crate::error::RouterError;
use crate::light::LightDispatcher;
use crate::note::{note_name, NoteEvent, SharedNotes};

/// Applies note events to the shared notes and pushes chord colors out.
///
/// Presses update the light straight away. Releases only touch the notes;
/// switching the light off is left to the sweeper so a chord let go one key
/// at a time does not flicker.
pub struct EventRouter {
    notes: SharedNotes,
    lights: LightDispatcher,
}

impl EventRouter {
    pub fn new(notes: SharedNotes, lights: LightDispatcher) -> Self {
        Self { notes, lights }
    }

    /// Returns the light state sent for this event, if any.
    pub async fn handle(&self, event: NoteEvent, now: Instant) -> Option<LightState> {
        match event {
            NoteEvent::NoteOn(pitch, velocity) if velocity > 0 => {
                self.notes.insert_or_update(pitch, velocity, now).await;
                // Queued under the lock so it cannot overtake a sweep's turn-off.
                let (state, current_notes) = self
                    .notes
                    .snapshot_then(|current_notes| {
                        let state = LightState::from_notes(current_notes);
                        self.lights.set_color(state);
                        (state, current_notes.to_vec())
                    })
                    .await;

                let names: Vec<String> =
                    current_notes.iter().map(|n| note_name(n.pitch)).collect();
                let velocities: Vec<u8> = current_notes.iter().map(|n| n.velocity).collect();
                info!(
                    "Pressed notes: {:?} with velocities {:?} (color: {:?}, brightness: {})",
                    names, velocities, state.rgb, state.brightness
                );

                Some(state)
            }
            // Zero velocity note-on is a release.
            NoteEvent::NoteOn(pitch, _) | NoteEvent::NoteOff(pitch) => {
                self.notes.remove(pitch).await;
                None
            }
        }
    }

    /// Handles events until the source goes away, which is always an error.
    pub async fn run(&self, mut events: mpsc::Receiver<NoteEvent>) -> Result<(), RouterError> {
        while let Some(event) = events.recv().await {
            debug!("Note event {:?}", event);
            self.handle(event, Instant::now()).await;
        }

        error!("MIDI event stream ended, no more notes will arrive");
        Err(RouterError::SourceExhausted)
    }
}
