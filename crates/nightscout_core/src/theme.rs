//! Estilos visuais do ícone e do gráfico.
//!
//! Cada estilo é uma paleta nomeada mais as estratégias de desenho
//! ([`Style`]). Selecionado por `display.style` na configuração.

use crate::alerts::{GlucoseLevel, level_for_value};
use crate::config::AppConfig;
use crate::diagram;
use crate::icon::{GlyphAtlas, compose_icon};
use crate::types::Entry;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Cores de um estilo, em hex "#RRGGBB".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette {
    pub name: String,
    /// Dígitos e pontos dentro do alvo
    pub in_range: String,
    /// Dígitos e pontos fora do alvo (ou sem dados)
    pub out_of_range: String,
    // Gráfico
    pub background: String,
    pub band: String,
    pub grid: String,
    pub line: String,
}

impl Palette {
    pub fn color(hex: &str) -> Rgba<u8> {
        let (r, g, b) = hex_to_rgb(hex);
        Rgba([r, g, b, 255])
    }

    /// Cor de status de um nível.
    pub fn level_color(&self, level: GlucoseLevel) -> Rgba<u8> {
        match level {
            GlucoseLevel::InRange => Self::color(&self.in_range),
            _ => Self::color(&self.out_of_range),
        }
    }
}

/// Converte uma string hex "#RRGGBB" para tupla (r, g, b).
pub fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return (255, 255, 255); // fallback branco
    }
    let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(255);
    let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(255);
    let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(255);
    (r, g, b)
}

/// Estratégias de desenho de um estilo.
pub trait Style: Send + Sync {
    fn palette(&self) -> &Palette;

    fn name(&self) -> &str {
        &self.palette().name
    }

    /// Cor dos glifos para o valor atual; `None` mantém as cores do atlas.
    fn symbol_tint(&self, use_color: bool, low: f64, high: f64, value: f64) -> Option<Rgba<u8>> {
        use_color.then(|| self.palette().level_color(level_for_value(value, low, high)))
    }

    /// Ícone 16×16 de uma leitura.
    fn draw_icon(&self, atlas: &GlyphAtlas, config: &AppConfig, entry: &Entry) -> RgbaImage {
        let tint = self.symbol_tint(
            config.display.use_color,
            config.alarm.low,
            config.alarm.high,
            entry.value,
        );
        compose_icon(atlas, entry, tint)
    }

    /// Gráfico de histórico.
    fn draw_diagram(&self, config: &AppConfig, entries: &[Entry]) -> RgbaImage {
        diagram::draw_diagram(config, self.palette(), entries)
    }
}

/// Estilo guiado apenas pela paleta.
#[derive(Debug, Clone)]
pub struct ThemedStyle {
    palette: Palette,
}

impl ThemedStyle {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }
}

impl Style for ThemedStyle {
    fn palette(&self) -> &Palette {
        &self.palette
    }
}

/// Estilo Clássico (padrão).
pub fn classic_palette() -> Palette {
    Palette {
        name: "classic".into(),
        in_range: "#00a000".into(),
        out_of_range: "#e00000".into(),
        background: "#ffffff".into(),
        band: "#e0f4e0".into(),
        grid: "#d8d8d8".into(),
        line: "#404040".into(),
    }
}

/// Estilo Escuro.
pub fn dark_palette() -> Palette {
    Palette {
        name: "dark".into(),
        in_range: "#00ff88".into(),
        out_of_range: "#ff3333".into(),
        background: "#1a1a1a".into(),
        band: "#1f3a2a".into(),
        grid: "#333333".into(),
        line: "#cccccc".into(),
    }
}

/// Estilo High Contrast (acessibilidade).
pub fn high_contrast_palette() -> Palette {
    Palette {
        name: "high_contrast".into(),
        in_range: "#00ff00".into(),
        out_of_range: "#ff0000".into(),
        background: "#000000".into(),
        band: "#003300".into(),
        grid: "#ffffff".into(),
        line: "#ffff00".into(),
    }
}

/// Retorna estilo pelo nome; nomes desconhecidos caem no clássico.
pub fn get_style(name: &str) -> Box<dyn Style> {
    let palette = match name.to_lowercase().as_str() {
        "dark" => dark_palette(),
        "high_contrast" => high_contrast_palette(),
        _ => classic_palette(),
    };
    Box::new(ThemedStyle::new(palette))
}

/// Nomes de estilos disponíveis.
pub fn style_names() -> Vec<&'static str> {
    vec!["classic", "dark", "high_contrast"]
}
