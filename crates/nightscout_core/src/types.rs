//! Modelo de leituras de glicose.
//!
//! Uma [`Entry`] é construída uma vez por linha da API e nunca é mutada;
//! subconjuntos (janela do gráfico) são cópias.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fator de conversão mg/dL → mmol/L.
pub const MGDL_PER_MMOL: f64 = 18.0;

// ──────────────────────────────────────────────
// Unidade
// ──────────────────────────────────────────────

/// Unidade de exibição, constante para todas as leituras da execução.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    #[serde(rename = "mgdl", alias = "mg/dL", alias = "MgDl")]
    MgDl,
    #[serde(rename = "mmol", alias = "mmol/L", alias = "MmolL")]
    MmolL,
}

impl Unit {
    /// Converte o valor bruto do dispositivo (sempre mg/dL) para esta unidade.
    pub fn from_mg_dl(self, raw: f64) -> f64 {
        match self {
            Unit::MgDl => raw,
            Unit::MmolL => (raw / MGDL_PER_MMOL * 10.0).round() / 10.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Unit::MgDl => "mg/dL",
            Unit::MmolL => "mmol/L",
        }
    }
}

// ──────────────────────────────────────────────
// Tendência
// ──────────────────────────────────────────────

/// Largura da faixa de dígitos no atlas (10 glifos de 4 px).
pub const DIGIT_STRIP_WIDTH: u32 = 40;
/// Largura de um glifo de tendência.
pub const TREND_GLYPH_WIDTH: u32 = 5;

/// Classificação de taxa de variação enviada pelo dispositivo.
///
/// A ordem dos membros é o vocabulário do Nightscout (códigos 0–9) e
/// também define a posição do glifo no atlas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Trend {
    #[default]
    None,
    DoubleUp,
    SingleUp,
    FortyFiveUp,
    Flat,
    FortyFiveDown,
    SingleDown,
    DoubleDown,
    NotComputable,
    OutOfRange,
}

impl Trend {
    pub const ALL: [Trend; 10] = [
        Trend::None,
        Trend::DoubleUp,
        Trend::SingleUp,
        Trend::FortyFiveUp,
        Trend::Flat,
        Trend::FortyFiveDown,
        Trend::SingleDown,
        Trend::DoubleDown,
        Trend::NotComputable,
        Trend::OutOfRange,
    ];

    /// Código numérico do Nightscout (0 = None … 9 = OutOfRange).
    pub fn ordinal(self) -> u8 {
        match self {
            Trend::None => 0,
            Trend::DoubleUp => 1,
            Trend::SingleUp => 2,
            Trend::FortyFiveUp => 3,
            Trend::Flat => 4,
            Trend::FortyFiveDown => 5,
            Trend::SingleDown => 6,
            Trend::DoubleDown => 7,
            Trend::NotComputable => 8,
            Trend::OutOfRange => 9,
        }
    }

    /// Converte o token do dispositivo. Tokens desconhecidos viram `None`
    /// para que sempre exista um ícone desenhável.
    pub fn from_token(token: &str) -> Trend {
        let token = token.trim().trim_matches('"');
        if let Ok(code) = token.parse::<u8>() {
            return Trend::ALL
                .get(usize::from(code))
                .copied()
                .unwrap_or(Trend::None);
        }

        let normalized: String = token
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "doubleup" => Trend::DoubleUp,
            "singleup" => Trend::SingleUp,
            "fortyfiveup" => Trend::FortyFiveUp,
            "flat" => Trend::Flat,
            "fortyfivedown" => Trend::FortyFiveDown,
            "singledown" => Trend::SingleDown,
            "doubledown" => Trend::DoubleDown,
            "notcomputable" => Trend::NotComputable,
            "rateoutofrange" | "outofrange" => Trend::OutOfRange,
            _ => Trend::None,
        }
    }

    /// Offset horizontal do glifo no atlas; `None` não tem glifo.
    pub fn atlas_offset(self) -> Option<u32> {
        match self {
            Trend::None => None,
            other => Some(DIGIT_STRIP_WIDTH + (u32::from(other.ordinal()) - 1) * TREND_GLYPH_WIDTH),
        }
    }

    /// Variantes desenhadas com seta dupla.
    pub fn is_double(self) -> bool {
        matches!(self, Trend::DoubleUp | Trend::DoubleDown)
    }

    /// Seta textual para legendas.
    pub fn arrow(self) -> &'static str {
        match self {
            Trend::None => "",
            Trend::DoubleUp => "⇈",
            Trend::SingleUp => "↑",
            Trend::FortyFiveUp => "↗",
            Trend::Flat => "→",
            Trend::FortyFiveDown => "↘",
            Trend::SingleDown => "↓",
            Trend::DoubleDown => "⇊",
            Trend::NotComputable => "?",
            Trend::OutOfRange => "⚠",
        }
    }
}

// ──────────────────────────────────────────────
// Leitura
// ──────────────────────────────────────────────

/// Uma medição de glicose com timestamp e tendência.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub timestamp: DateTime<Utc>,
    /// Valor já convertido para [`Entry::unit`]
    pub value: f64,
    pub unit: Unit,
    pub trend: Trend,
}

impl Entry {
    pub fn new(timestamp: DateTime<Utc>, value: f64, unit: Unit, trend: Trend) -> Self {
        Self {
            timestamp,
            value,
            unit,
            trend,
        }
    }

    /// Leitura sintética "sem dados" usada antes do primeiro fetch bem-sucedido.
    pub fn sentinel(unit: Unit, now: DateTime<Utc>) -> Self {
        Self::new(now, 0.0, unit, Trend::None)
    }

    /// Dígitos (0–9) do valor na precisão natural da unidade, mais
    /// significativo primeiro. Nunca vazio.
    pub fn digits(&self) -> Vec<u8> {
        let scaled = match self.unit {
            Unit::MgDl => self.value,
            Unit::MmolL => self.value * 10.0,
        };
        let integer = if scaled.is_finite() && scaled > 0.0 {
            scaled.round() as u64
        } else {
            0
        };

        integer
            .to_string()
            .bytes()
            .map(|b| b - b'0')
            .collect()
    }

    /// Valor formatado para legendas ("123" ou "6.8").
    pub fn display_value(&self) -> String {
        match self.unit {
            Unit::MgDl => format!("{:.0}", self.value),
            Unit::MmolL => format!("{:.1}", self.value),
        }
    }
}

/// Duas leituras são iguais quando timestamp, valor e tendência coincidem.
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp && self.value == other.value && self.trend == other.trend
    }
}
