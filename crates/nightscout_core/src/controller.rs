//! Controlador de polling.
//!
//! Cada tick: fetch → ícone → alarme → (gráfico aberto) janela + redesenho.
//! Falhas de rede nunca passam daqui; viram aviso de conectividade com
//! debounce. Todo o estado mutável vive em [`ControllerState`], escrito
//! apenas por este controlador, num único contexto de execução.

use crate::alerts::{
    CONNECTIVITY_TITLE, connectivity_message, root_cause, should_alarm,
    should_notify_connectivity,
};
use crate::client::EntrySource;
use crate::config::AppConfig;
use crate::error::FetchError;
use crate::icon::GlyphAtlas;
use crate::theme::{Style, get_style, style_names};
use crate::types::Entry;
use crate::window::window;
use chrono::{DateTime, Utc};
use image::RgbaImage;
use tracing::{debug, info, warn};

/// Colaboradores de apresentação (ícone de bandeja, avisos, janela do gráfico).
pub trait Frontend {
    fn set_icon(&mut self, icon: RgbaImage, entry: &Entry);
    fn show_warning(&mut self, title: &str, message: &str);
    fn play_alarm(&mut self, entry: &Entry);
    fn open_diagram(&mut self, image: RgbaImage, entries: &[Entry]);
    fn update_diagram(&mut self, image: RgbaImage, entries: &[Entry]);
}

/// Comandos aceitos pelo loop de polling (timer e eventos de UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Tick,
    OpenDiagram,
    RefreshDiagram,
    DiagramClosed,
    Shutdown,
}

/// Resultado de um tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Rendered,
    ConnectivityFailure,
}

/// Estado do controlador durante toda a vida do processo.
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    pub last_alarm: Option<DateTime<Utc>>,
    /// Atualizado somente quando um aviso é de fato exibido
    pub last_connectivity_notification: Option<DateTime<Utc>>,
    pub diagram_open: bool,
    /// Algum ícone (real ou sentinela) já foi exibido
    pub icon_shown: bool,
}

pub struct Controller<S, F> {
    config: AppConfig,
    atlas: GlyphAtlas,
    style: Box<dyn Style>,
    source: S,
    frontend: F,
    state: ControllerState,
}

impl<S: EntrySource, F: Frontend> Controller<S, F> {
    pub fn new(config: AppConfig, atlas: GlyphAtlas, source: S, frontend: F) -> Self {
        let style = get_style(&config.display.style);
        if !style_names().contains(&config.display.style.to_lowercase().as_str()) {
            warn!(
                "Estilo desconhecido '{}', usando '{}'",
                config.display.style,
                style.name()
            );
        }
        info!("Estilo: {}", style.name());
        Self {
            config,
            atlas,
            style,
            source,
            frontend,
            state: ControllerState::default(),
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    /// Despacha um comando. Retorna `false` em [`Command::Shutdown`].
    pub fn handle(&mut self, command: Command, now: DateTime<Utc>) -> bool {
        match command {
            Command::Tick => {
                self.tick(now);
            }
            Command::OpenDiagram => {
                self.open_diagram(now);
            }
            Command::RefreshDiagram => self.refresh_diagram(now),
            Command::DiagramClosed => self.diagram_closed(),
            Command::Shutdown => return false,
        }
        true
    }

    /// Um ciclo de polling.
    ///
    /// Com o gráfico fechado pede só a leitura mais recente; aberto, pede o
    /// histórico inteiro e usa a primeira leitura para o ícone.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let count = if self.state.diagram_open {
            self.config.diagram.entry_count()
        } else {
            1
        };

        let entries = match self.fetch(count) {
            Ok(entries) => entries,
            Err(e) => {
                if !self.state.icon_shown {
                    let sentinel = Entry::sentinel(self.config.display.unit, now);
                    self.show_icon(&sentinel);
                }
                self.handle_connectivity_issue(&e, now);
                return TickOutcome::ConnectivityFailure;
            }
        };

        let latest = entries[0];
        info!(
            "← {} {} {:?} ({})",
            latest.display_value(),
            latest.unit.label(),
            latest.trend,
            latest.timestamp.format("%H:%M")
        );

        self.show_icon(&latest);
        self.check_alarm(&latest, now);
        if self.state.diagram_open {
            let slice = window(&entries, self.config.diagram.time_range);
            let image = self.style.draw_diagram(&self.config, &slice);
            self.frontend.update_diagram(image, &slice);
        }

        TickOutcome::Rendered
    }

    /// Abre o gráfico com um fetch imediato. Falha de rede cancela a
    /// abertura. Retorna `true` se a janela foi aberta.
    pub fn open_diagram(&mut self, now: DateTime<Utc>) -> bool {
        if self.state.diagram_open {
            debug!("Gráfico já aberto");
            return false;
        }

        match self.fetch(self.config.diagram.entry_count()) {
            Ok(entries) => {
                let slice = window(&entries, self.config.diagram.time_range);
                let image = self.style.draw_diagram(&self.config, &slice);
                self.state.diagram_open = true;
                self.frontend.open_diagram(image, &slice);
                info!("Gráfico aberto ({} leituras)", slice.len());
                true
            }
            Err(e) => {
                self.handle_connectivity_issue(&e, now);
                false
            }
        }
    }

    /// Atualização pedida pela própria janela do gráfico.
    pub fn refresh_diagram(&mut self, now: DateTime<Utc>) {
        if !self.state.diagram_open {
            return;
        }

        match self.fetch(self.config.diagram.entry_count()) {
            Ok(entries) => {
                let slice = window(&entries, self.config.diagram.time_range);
                let image = self.style.draw_diagram(&self.config, &slice);
                self.frontend.update_diagram(image, &slice);
            }
            Err(e) => self.handle_connectivity_issue(&e, now),
        }
    }

    /// A janela do gráfico foi fechada pelo usuário.
    pub fn diagram_closed(&mut self) {
        if self.state.diagram_open {
            info!("Gráfico fechado");
        }
        self.state.diagram_open = false;
    }

    /// Fetch com garantia de lista não vazia.
    fn fetch(&self, count: usize) -> Result<Vec<Entry>, FetchError> {
        let entries = self.source.fetch_entries(count)?;
        if entries.is_empty() {
            return Err(FetchError::NoEntries);
        }
        Ok(entries)
    }

    fn show_icon(&mut self, entry: &Entry) {
        let icon = self.style.draw_icon(&self.atlas, &self.config, entry);
        self.frontend.set_icon(icon, entry);
        self.state.icon_shown = true;
    }

    fn check_alarm(&mut self, entry: &Entry, now: DateTime<Utc>) {
        if should_alarm(&self.config.alarm, entry.value, self.state.last_alarm, now) {
            warn!(
                "Alarme: {} {} fora de [{}, {}]",
                entry.display_value(),
                entry.unit.label(),
                self.config.alarm.low,
                self.config.alarm.high
            );
            self.frontend.play_alarm(entry);
            self.state.last_alarm = Some(now);
        }
    }

    fn handle_connectivity_issue(&mut self, err: &FetchError, now: DateTime<Utc>) {
        warn!("Falha ao buscar leituras: {err}");

        if !should_notify_connectivity(
            self.state.last_connectivity_notification,
            self.config.display.update_interval,
            now,
        ) {
            debug!("Aviso de conectividade suprimido (debounce)");
            return;
        }

        let message = connectivity_message(&root_cause(err));
        self.frontend.show_warning(CONNECTIVITY_TITLE, &message);
        self.state.last_connectivity_notification = Some(now);
    }
}
