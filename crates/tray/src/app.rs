//! App eframe/egui: ícone de status, avisos, alarme e janela do gráfico.

use crate::poll_thread::{self, PollHandle, UiMessage};
use egui::{Color32, ColorImage, FontFamily, FontId, RichText, TextureHandle, TextureOptions};
use image::RgbaImage;
use nightscout_core::alerts::{GlucoseLevel, level_for_value};
use nightscout_core::controller::{Command, Controller};
use nightscout_core::icon::GlyphAtlas;
use nightscout_core::{AppConfig, Entry, NightscoutClient};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

const TOAST_DURATION: Duration = Duration::from_millis(5000);
const ICON_SCALE: f32 = 6.0;

struct Toast {
    title: String,
    message: String,
    shown_at: Instant,
}

struct DiagramView {
    texture: TextureHandle,
    size: [usize; 2],
    entries: usize,
    newest: Option<Entry>,
}

/// Estado da janela principal.
pub struct TrayApp {
    config: AppConfig,
    poll: PollHandle,

    icon: Option<TextureHandle>,
    latest: Option<Entry>,
    toast: Option<Toast>,
    alarm: Option<Entry>,

    diagram: Option<DiagramView>,
    diagram_open: bool,
}

impl TrayApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        atlas: GlyphAtlas,
        client: NightscoutClient,
    ) -> std::io::Result<Self> {
        let controller_config = config.clone();
        let poll = poll_thread::spawn_poll_thread(
            move |bridge| Controller::new(controller_config, atlas, client, bridge),
            config.display.update_interval,
            cc.egui_ctx.clone(),
        )?;

        Ok(Self {
            config,
            poll,
            icon: None,
            latest: None,
            toast: None,
            alarm: None,
            diagram: None,
            diagram_open: false,
        })
    }

    fn send(&self, command: Command) {
        if self.poll.commands.send(command).is_err() {
            warn!("Thread de polling encerrada, comando {command:?} ignorado");
        }
    }

    /// Processa mensagens pendentes da thread de polling.
    fn poll_updates(&mut self, ctx: &egui::Context) {
        while let Ok(msg) = self.poll.updates.try_recv() {
            match msg {
                UiMessage::Icon { image, entry } => self.set_icon(ctx, image, entry),
                UiMessage::Warning { title, message } => {
                    self.toast = Some(Toast {
                        title,
                        message,
                        shown_at: Instant::now(),
                    });
                }
                UiMessage::Alarm(entry) => {
                    warn!("Alarme: {} {}", entry.display_value(), entry.unit.label());
                    self.alarm = Some(entry);
                    ctx.send_viewport_cmd(egui::ViewportCommand::RequestUserAttention(
                        egui::UserAttentionType::Critical,
                    ));
                }
                UiMessage::DiagramOpened { image, entries } => {
                    self.diagram = Some(diagram_view(ctx, &image, &entries));
                    self.diagram_open = true;
                }
                UiMessage::DiagramUpdated { image, entries } => {
                    // Atualização atrasada depois do fechamento é descartada
                    if self.diagram_open {
                        self.diagram = Some(diagram_view(ctx, &image, &entries));
                    }
                }
            }
        }
    }

    fn set_icon(&mut self, ctx: &egui::Context, image: RgbaImage, entry: Entry) {
        let color = to_color_image(&image);
        match self.icon.as_mut() {
            Some(texture) => texture.set(color, TextureOptions::NEAREST),
            None => self.icon = Some(ctx.load_texture("status-icon", color, TextureOptions::NEAREST)),
        }

        let (width, height) = image.dimensions();
        ctx.send_viewport_cmd(egui::ViewportCommand::Icon(Some(Arc::new(egui::IconData {
            rgba: image.into_raw(),
            width,
            height,
        }))));
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(caption(&entry)));

        self.latest = Some(entry);
    }

    fn level_color(&self, entry: &Entry) -> Color32 {
        match level_for_value(entry.value, self.config.alarm.low, self.config.alarm.high) {
            GlucoseLevel::NoData => Color32::GRAY,
            GlucoseLevel::InRange => Color32::from_rgb(0, 160, 0),
            GlucoseLevel::Low | GlucoseLevel::High => Color32::from_rgb(224, 0, 0),
        }
    }

    fn caption_font(&self) -> FontId {
        let family = self.config.diagram.font_family.to_lowercase();
        let family = if ["mono", "consol", "courier"].iter().any(|m| family.contains(m)) {
            FontFamily::Monospace
        } else {
            FontFamily::Proportional
        };
        FontId::new(self.config.diagram.font_size, family)
    }

    fn render_diagram_window(&mut self, ctx: &egui::Context) {
        if !self.diagram_open {
            return;
        }

        let mut open = true;
        let mut refresh = false;
        let font = self.caption_font();

        if let Some(view) = &self.diagram {
            let title = format!("Últimas {}h", self.config.diagram.time_range);
            egui::Window::new(title)
                .open(&mut open)
                .resizable(false)
                .collapsible(false)
                .show(ctx, |ui: &mut egui::Ui| {
                    let size = egui::vec2(view.size[0] as f32, view.size[1] as f32);
                    ui.image((view.texture.id(), size));

                    ui.horizontal(|ui: &mut egui::Ui| {
                        if let Some(newest) = &view.newest {
                            ui.label(RichText::new(caption(newest)).font(font.clone()));
                        }
                        ui.label(
                            RichText::new(format!("{} leituras", view.entries))
                                .font(font.clone())
                                .weak(),
                        );
                        if ui.button("Atualizar").clicked() {
                            refresh = true;
                        }
                    });
                });
        }

        if refresh {
            self.send(Command::RefreshDiagram);
        }
        if !open {
            self.diagram_open = false;
            self.diagram = None;
            self.send(Command::DiagramClosed);
        }
    }
}

impl eframe::App for TrayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ── Mensagens da thread de polling ──
        self.poll_updates(ctx);

        // Expiração do aviso
        if self.toast.as_ref().is_some_and(|t| t.shown_at.elapsed() >= TOAST_DURATION) {
            self.toast = None;
        }
        if self.toast.is_some() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        // ── Atalhos de teclado ──
        let (refresh, quit) = ctx.input(|i: &egui::InputState| {
            (
                i.key_pressed(egui::Key::R),
                i.key_pressed(egui::Key::Q) || i.key_pressed(egui::Key::Escape),
            )
        });
        if refresh {
            self.send(Command::Tick);
        }
        if quit {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        // ── Painel central ──
        egui::CentralPanel::default().show(ctx, |ui: &mut egui::Ui| {
            ui.vertical_centered(|ui: &mut egui::Ui| {
                match &self.icon {
                    Some(texture) => {
                        let side = nightscout_core::icon::ICON_SIZE as f32 * ICON_SCALE;
                        let response = ui
                            .add(
                                egui::Image::new(texture)
                                    .fit_to_exact_size(egui::vec2(side, side))
                                    .sense(egui::Sense::click()),
                            )
                            .on_hover_text("Clique para abrir o gráfico");
                        if response.clicked() {
                            self.send(Command::OpenDiagram);
                        }
                    }
                    None => {
                        ui.spinner();
                    }
                }

                if let Some(entry) = &self.latest {
                    ui.label(
                        RichText::new(caption(entry))
                            .color(self.level_color(entry))
                            .font(self.caption_font()),
                    );
                    let local = entry.timestamp.with_timezone(&chrono::Local);
                    ui.label(RichText::new(local.format("%H:%M").to_string()).weak().monospace());
                }
            });

            // ── Alarme ──
            if let Some(entry) = self.alarm {
                ui.add_space(6.0);
                let mut dismiss = false;
                egui::Frame::new()
                    .fill(Color32::from_rgb(120, 0, 0))
                    .inner_margin(6.0)
                    .show(ui, |ui: &mut egui::Ui| {
                        ui.horizontal(|ui: &mut egui::Ui| {
                            ui.label(
                                RichText::new(format!("⚠ Glicose fora da faixa: {}", caption(&entry)))
                                    .color(Color32::WHITE)
                                    .strong(),
                            );
                            dismiss = ui.button("OK").clicked();
                        });
                    });
                if dismiss {
                    self.alarm = None;
                }
            }

            // ── Aviso de conectividade ──
            if let Some(toast) = &self.toast {
                ui.add_space(6.0);
                ui.group(|ui: &mut egui::Ui| {
                    ui.label(RichText::new(&toast.title).strong());
                    ui.label(&toast.message);
                });
            }

            ui.with_layout(egui::Layout::bottom_up(egui::Align::Center), |ui: &mut egui::Ui| {
                ui.label(
                    RichText::new("[Clique] Gráfico | [R] Atualizar | [Q/Esc] Sair")
                        .weak()
                        .monospace()
                        .size(10.0),
                );
            });
        });

        self.render_diagram_window(ctx);
    }
}

impl Drop for TrayApp {
    fn drop(&mut self) {
        let _ = self.poll.commands.send(Command::Shutdown);
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn to_color_image(image: &RgbaImage) -> ColorImage {
    let (width, height) = image.dimensions();
    ColorImage::from_rgba_unmultiplied([width as usize, height as usize], image.as_raw())
}

fn diagram_view(ctx: &egui::Context, image: &RgbaImage, entries: &[Entry]) -> DiagramView {
    let color = to_color_image(image);
    DiagramView {
        size: color.size,
        texture: ctx.load_texture("diagram", color, TextureOptions::LINEAR),
        entries: entries.len(),
        newest: entries.first().copied(),
    }
}

/// Legenda curta: valor, unidade e seta.
fn caption(entry: &Entry) -> String {
    if entry.value == 0.0 {
        return "sem dados".into();
    }
    format!(
        "{} {} {}",
        entry.display_value(),
        entry.unit.label(),
        entry.trend.arrow()
    )
    .trim_end()
    .to_string()
}
