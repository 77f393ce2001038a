//! # Nightscout Tray
//!
//! Monitor de glicose: consulta o Nightscout periodicamente, mostra o
//! valor atual num ícone 16×16 e abre o gráfico de histórico ao clicar.
//!
//! ## Atalhos
//! - Clique no ícone: gráfico
//! - `R`: Atualizar agora
//! - `Q` / `Esc`: Sair

mod app;
mod poll_thread;

use app::TrayApp;
use nightscout_core::icon::GlyphAtlas;
use nightscout_core::{AppConfig, NightscoutClient, StartupError};
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Config, atlas e cliente ──
    let (config, atlas, client) = match startup() {
        Ok(parts) => parts,
        Err(e) => {
            error!("Falha na inicialização: {e}");
            eprintln!("Erro: {e}");
            return ExitCode::FAILURE;
        }
    };

    // ── Janela eframe ──
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Nightscout")
            .with_inner_size([280.0, 240.0])
            .with_resizable(false),
        ..Default::default()
    };

    let result = eframe::run_native(
        "Nightscout Tray",
        options,
        Box::new(move |cc| Ok(Box::new(TrayApp::new(cc, config, atlas, client)?))),
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Erro na janela: {e}");
            ExitCode::FAILURE
        }
    }
}

fn startup() -> Result<(AppConfig, GlyphAtlas, NightscoutClient), StartupError> {
    let config = AppConfig::load(&AppConfig::default_path())?;
    let atlas = GlyphAtlas::load(&AppConfig::resolve_path(&config.display.symbols_path))?;
    let client = NightscoutClient::new(&config)?;
    info!("Nightscout: {}", client.entries_url());
    Ok((config, atlas, client))
}
