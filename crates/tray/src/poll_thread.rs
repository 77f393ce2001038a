//! Thread de polling: dona do [`Controller`], recebe ticks do timer e
//! comandos da UI por channels e devolve atualizações para a UI.
//!
//! Um único consumidor processa tudo em sequência, então dois ticks nunca
//! rodam ao mesmo tempo e um fetch lento só atrasa o próximo.

use crossbeam_channel::{Receiver, Sender, select, tick, unbounded};
use image::RgbaImage;
use nightscout_core::client::EntrySource;
use nightscout_core::controller::{Command, Controller, Frontend};
use nightscout_core::Entry;
use std::time::Duration;
use tracing::{debug, info};

/// Mensagem enviada da thread de polling para a UI.
#[derive(Debug, Clone)]
pub enum UiMessage {
    Icon { image: RgbaImage, entry: Entry },
    Warning { title: String, message: String },
    Alarm(Entry),
    DiagramOpened { image: RgbaImage, entries: Vec<Entry> },
    DiagramUpdated { image: RgbaImage, entries: Vec<Entry> },
}

/// Implementação de [`Frontend`] que encaminha tudo para a UI.
pub struct UiBridge {
    tx: Sender<UiMessage>,
    ctx: egui::Context,
}

impl UiBridge {
    fn send(&self, msg: UiMessage) {
        if self.tx.send(msg).is_err() {
            debug!("UI encerrada, mensagem descartada");
            return;
        }
        self.ctx.request_repaint();
    }
}

impl Frontend for UiBridge {
    fn set_icon(&mut self, image: RgbaImage, entry: &Entry) {
        self.send(UiMessage::Icon { image, entry: *entry });
    }

    fn show_warning(&mut self, title: &str, message: &str) {
        self.send(UiMessage::Warning {
            title: title.into(),
            message: message.into(),
        });
    }

    fn play_alarm(&mut self, entry: &Entry) {
        self.send(UiMessage::Alarm(*entry));
    }

    fn open_diagram(&mut self, image: RgbaImage, entries: &[Entry]) {
        self.send(UiMessage::DiagramOpened {
            image,
            entries: entries.to_vec(),
        });
    }

    fn update_diagram(&mut self, image: RgbaImage, entries: &[Entry]) {
        self.send(UiMessage::DiagramUpdated {
            image,
            entries: entries.to_vec(),
        });
    }
}

/// Canais da UI para a thread de polling.
pub struct PollHandle {
    pub commands: Sender<Command>,
    pub updates: Receiver<UiMessage>,
}

/// Inicia a thread de polling. O primeiro tick é imediato.
pub fn spawn_poll_thread<S>(
    build: impl FnOnce(UiBridge) -> Controller<S, UiBridge> + Send + 'static,
    update_interval_minutes: u32,
    ctx: egui::Context,
) -> std::io::Result<PollHandle>
where
    S: EntrySource + 'static,
{
    let (cmd_tx, cmd_rx) = unbounded::<Command>();
    let (ui_tx, ui_rx) = unbounded::<UiMessage>();
    let interval = Duration::from_secs(60 * u64::from(update_interval_minutes.max(1)));

    std::thread::Builder::new()
        .name("nightscout-poll".into())
        .spawn(move || {
            let controller = build(UiBridge { tx: ui_tx, ctx });
            poll_loop(controller, &cmd_rx, interval);
        })?;

    Ok(PollHandle {
        commands: cmd_tx,
        updates: ui_rx,
    })
}

fn poll_loop<S: EntrySource, F: Frontend>(
    mut controller: Controller<S, F>,
    commands: &Receiver<Command>,
    interval: Duration,
) {
    info!("Polling a cada {}s", interval.as_secs());
    let ticker = tick(interval);

    let mut command = Command::Tick;
    while controller.handle(command, chrono::Utc::now()) {
        command = select! {
            recv(ticker) -> _ => Command::Tick,
            // UI fechou o channel: encerra
            recv(commands) -> msg => msg.unwrap_or(Command::Shutdown),
        };
        debug!("Comando: {command:?}");
    }

    info!("Thread de polling encerrada");
}
