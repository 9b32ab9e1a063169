use anyhow::Context;
use env_logger::Env;
use log::info;
use tokio::sync::mpsc;

mod color;
mod config;
mod error;
mod home_assistant;
mod light;
mod midi;
mod note;
mod router;
mod sweeper;

use config::Config;
use home_assistant::HomeAssistantClient;
use light::{log_reports, LightDispatcher};
use midi::start_midi_listener;
use note::SharedNotes;
use router::EventRouter;
use sweeper::ExpirySweeper;

const EVENT_QUEUE_SIZE: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::load().context("loading configuration")?;
    let notes = SharedNotes::new();

    let (report_tx, report_rx) = mpsc::unbounded_channel();
    tokio::spawn(log_reports(report_rx));
    let client = HomeAssistantClient::new(&config).context("building light client")?;
    let (lights, _light_worker) = LightDispatcher::spawn(client, report_tx);

    // Channel for all the notes
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_SIZE);
    let port_name = start_midi_listener(config.midi_port.clone(), tx)
        .await
        .context("opening MIDI input")?;
    info!("Listening to MIDI input on {port_name}");

    let sweeper = ExpirySweeper::new(
        notes.clone(),
        lights.clone(),
        config.sweep_interval(),
        config.max_note_age(),
    )
    .spawn();

    let router = EventRouter::new(notes, lights);
    let result = router.run(rx).await;

    sweeper.stop().await;
    result.context("MIDI input stopped")
}
