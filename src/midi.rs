use log::{debug, error, info, warn};
use midir::{Ignore, MidiInput, MidiInputConnection};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use crate::error::MidiError;
use crate::note::NoteEvent;

const CLIENT_NAME: &str = "chord-lights";
const PORT_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Decodes a raw MIDI message into a note event. Everything other than
/// note-on and note-off is dropped.
pub fn decode_message(message: &[u8]) -> Option<NoteEvent> {
    if message.len() < 3 {
        return None;
    }

    let status = message[0] & 0xF0;
    let note = message[1] & 0x7F;
    let velocity = message[2] & 0x7F;

    match status {
        0x90 if velocity > 0 => Some(NoteEvent::NoteOn(note, velocity)),
        0x90 | 0x80 => Some(NoteEvent::NoteOff(note)),
        _ => None,
    }
}

/// Picks the first port whose name contains `filter`, or the first port.
pub fn select_port(names: &[String], filter: Option<&str>) -> Result<usize, MidiError> {
    if names.is_empty() {
        return Err(MidiError::NoPorts);
    }
    match filter {
        Some(filter) => names
            .iter()
            .position(|name| name.contains(filter))
            .ok_or_else(|| MidiError::PortNotFound(filter.to_string())),
        None => Ok(0),
    }
}

/// Opens the MIDI input on its own thread and forwards note events to `tx`.
///
/// Resolves to the connected port name once the connection is up. When the
/// device disappears the thread exits and drops `tx`, which closes the
/// event stream.
pub async fn start_midi_listener(
    port_filter: Option<String>,
    tx: mpsc::Sender<NoteEvent>,
) -> Result<String, MidiError> {
    let (ready_tx, ready_rx) = oneshot::channel();

    std::thread::spawn(move || {
        let (conn, port_name) = match connect(port_filter.as_deref(), tx) {
            Ok(connected) => connected,
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };
        let _ = ready_tx.send(Ok(port_name.clone()));

        loop {
            std::thread::sleep(PORT_CHECK_INTERVAL);
            if !port_present(&port_name) {
                error!("MIDI device {port_name} disconnected");
                break;
            }
        }

        conn.close();
    });

    ready_rx
        .await
        .unwrap_or_else(|_| Err(MidiError::Connect("MIDI thread exited".to_string())))
}

fn connect(
    port_filter: Option<&str>,
    tx: mpsc::Sender<NoteEvent>,
) -> Result<(MidiInputConnection<()>, String), MidiError> {
    let mut midi_in = MidiInput::new(CLIENT_NAME)?;
    midi_in.ignore(Ignore::None);

    let ports = midi_in.ports();
    let names: Vec<String> = ports
        .iter()
        .map(|p| midi_in.port_name(p).unwrap_or_else(|_| "<unknown>".to_string()))
        .collect();
    for (i, name) in names.iter().enumerate() {
        info!("Port {i}: {name}");
    }

    let index = select_port(&names, port_filter).inspect_err(|e| {
        if let MidiError::PortNotFound(filter) = e {
            warn!("No MIDI port matching '{filter}', available: {names:?}");
        }
    })?;
    let port_name = names[index].clone();
    info!("Connecting to MIDI device: {port_name}");

    let conn = midi_in
        .connect(
            &ports[index],
            "chord-lights-read",
            move |_, message, _| {
                if let Some(event) = decode_message(message) {
                    if tx.blocking_send(event).is_err() {
                        debug!("Note event dropped, router has stopped");
                    }
                }
            },
            (),
        )
        .map_err(|e| MidiError::Connect(format!("{port_name}: {e}")))?;

    Ok((conn, port_name))
}

fn port_present(port_name: &str) -> bool {
    let checker = match MidiInput::new(CLIENT_NAME) {
        Ok(checker) => checker,
        Err(e) => {
            warn!("Couldn't check MIDI ports: {e}");
            return true;
        }
    };
    checker
        .ports()
        .iter()
        .any(|p| checker.port_name(p).is_ok_and(|name| name == port_name))
}
