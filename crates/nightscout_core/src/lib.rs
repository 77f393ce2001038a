//! # Nightscout Core
//!
//! Núcleo do monitor de glicose na bandeja: busca leituras na API do
//! Nightscout, compõe o ícone 16×16 de status, recorta o histórico para o
//! gráfico e decide alarmes e avisos de conectividade.
//!
//! ## Módulos
//! - [`types`] – Leituras, unidade e tendência
//! - [`protocol`] – Parse do formato texto da API `entries`
//! - [`icon`] – Atlas de glifos e composição do ícone
//! - [`window`] – Recorte temporal para o gráfico
//! - [`diagram`] – Renderização do gráfico de histórico
//! - [`theme`] – Estilos nomeados (paletas + estratégias de desenho)
//! - [`alerts`] – Políticas de alarme e de aviso de conectividade
//! - [`config`] – Configuração unificada via TOML
//! - [`client`] – Cliente HTTP do Nightscout
//! - [`controller`] – Loop de polling e sua máquina de estados
//! - [`error`] – Taxonomia de erros

pub mod types;
pub mod protocol;
pub mod icon;
pub mod window;
pub mod diagram;
pub mod theme;
pub mod alerts;
pub mod config;
pub mod client;
pub mod controller;
pub mod error;

// Re-exports convenientes
pub use types::{Entry, Trend, Unit};
pub use protocol::{parse_entries, parse_line};
pub use config::AppConfig;
pub use client::{EntrySource, NightscoutClient};
pub use controller::{Command, Controller, Frontend};
pub use error::{FetchError, ParseError, StartupError};
