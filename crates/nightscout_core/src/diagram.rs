//! Renderização do gráfico de histórico.
//!
//! Eixo X: `time_range` horas terminando na leitura mais recente (leituras
//! da folga da janela ficam à esquerda, recortadas). Eixo Y: ajustado aos
//! dados e aos limites de alarme, com a faixa alvo sombreada.

use crate::alerts::level_for_value;
use crate::config::AppConfig;
use crate::theme::Palette;
use crate::types::Entry;
use chrono::{DateTime, Duration, Utc};
use image::RgbaImage;
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

/// Margem interna (px) nos quatro lados.
const MARGIN: f32 = 6.0;
/// Raio dos marcadores de leitura.
const POINT_RADIUS: i32 = 2;
/// Folga vertical relativa à amplitude dos dados.
const VALUE_PADDING: f64 = 0.1;

/// Mapeamento valor/tempo → pixel.
struct Projection {
    start: DateTime<Utc>,
    span_secs: f32,
    lower: f64,
    upper: f64,
    width: f32,
    height: f32,
}

impl Projection {
    fn new(config: &AppConfig, entries: &[Entry], width: u32, height: u32) -> Self {
        let low = config.alarm.low;
        let high = config.alarm.high;
        let (min_v, max_v) = entries.iter().fold((low, high), |(lo, hi), e| {
            (lo.min(e.value), hi.max(e.value))
        });
        let pad = ((max_v - min_v) * VALUE_PADDING).max(1.0);

        let span = Duration::hours(i64::from(config.diagram.time_range.max(1)));
        let end = entries
            .iter()
            .map(|e| e.timestamp)
            .max()
            .unwrap_or_else(Utc::now);

        Self {
            start: end - span,
            span_secs: span.num_seconds() as f32,
            lower: (min_v - pad).max(0.0),
            upper: max_v + pad,
            width: width as f32,
            height: height as f32,
        }
    }

    fn x(&self, ts: DateTime<Utc>) -> f32 {
        let offset = (ts - self.start).num_seconds() as f32;
        MARGIN + offset / self.span_secs * (self.width - 2.0 * MARGIN)
    }

    fn y(&self, value: f64) -> f32 {
        let t = ((self.upper - value) / (self.upper - self.lower)) as f32;
        MARGIN + t * (self.height - 2.0 * MARGIN)
    }
}

/// Desenha o gráfico `diagram.width × diagram.height`.
///
/// `entries` pode vir em qualquer ordem; lista vazia produz só o fundo e
/// a faixa alvo.
pub fn draw_diagram(config: &AppConfig, palette: &Palette, entries: &[Entry]) -> RgbaImage {
    let width = config.diagram.width.max(16);
    let height = config.diagram.height.max(16);
    let mut img = RgbaImage::from_pixel(width, height, Palette::color(&palette.background));
    let proj = Projection::new(config, entries, width, height);

    // ── Faixa alvo ──
    let band_top = proj.y(config.alarm.high).round() as i32;
    let band_bottom = proj.y(config.alarm.low).round() as i32;
    let band_height = (band_bottom - band_top).max(1) as u32;
    draw_filled_rect_mut(
        &mut img,
        Rect::at(0, band_top).of_size(width, band_height),
        Palette::color(&palette.band),
    );

    if entries.is_empty() {
        return img;
    }

    // ── Grade horária ──
    let grid = Palette::color(&palette.grid);
    for hour in 0..=config.diagram.time_range {
        let x = proj.x(proj.start + Duration::hours(i64::from(hour)));
        draw_line_segment_mut(&mut img, (x, 0.0), (x, height as f32 - 1.0), grid);
    }

    // ── Série (antiga → recente) ──
    let mut series: Vec<&Entry> = entries.iter().collect();
    series.sort_by_key(|e| e.timestamp);

    let line = Palette::color(&palette.line);
    for pair in series.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        draw_line_segment_mut(
            &mut img,
            (proj.x(a.timestamp), proj.y(a.value)),
            (proj.x(b.timestamp), proj.y(b.value)),
            line,
        );
    }

    for entry in series {
        let level = level_for_value(entry.value, config.alarm.low, config.alarm.high);
        let center = (
            proj.x(entry.timestamp).round() as i32,
            proj.y(entry.value).round() as i32,
        );
        draw_filled_circle_mut(&mut img, center, POINT_RADIUS, palette.level_color(level));
    }

    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::classic_palette;
    use crate::types::{Trend, Unit};
    use chrono::TimeZone;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.diagram.width = 200;
        config.diagram.height = 100;
        config.diagram.time_range = 2;
        config
    }

    fn newest() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_diagram_has_background_and_band() {
        let palette = classic_palette();
        let img = draw_diagram(&config(), &palette, &[]);
        assert_eq!(img.dimensions(), (200, 100));
        assert_eq!(*img.get_pixel(0, 0), Palette::color(&palette.background));

        let proj = Projection::new(&config(), &[], 200, 100);
        let mid = proj.y(125.0).round() as u32;
        assert_eq!(*img.get_pixel(100, mid), Palette::color(&palette.band));
    }

    #[test]
    fn newest_reading_lands_on_right_edge() {
        let cfg = config();
        let entries = [Entry::new(newest(), 120.0, Unit::MgDl, Trend::Flat)];
        let proj = Projection::new(&cfg, &entries, 200, 100);
        assert!((proj.x(newest()) - (200.0 - MARGIN)).abs() < 0.01);
        assert!((proj.x(newest() - Duration::hours(2)) - MARGIN).abs() < 0.01);
    }

    #[test]
    fn points_colored_by_level() {
        let cfg = config();
        let palette = classic_palette();
        let entries = [
            Entry::new(newest(), 250.0, Unit::MgDl, Trend::SingleUp),
            Entry::new(newest() - Duration::hours(1), 120.0, Unit::MgDl, Trend::Flat),
        ];
        let img = draw_diagram(&cfg, &palette, &entries);
        let proj = Projection::new(&cfg, &entries, 200, 100);

        let high = (
            proj.x(entries[0].timestamp).round() as u32,
            proj.y(250.0).round() as u32,
        );
        assert_eq!(*img.get_pixel(high.0, high.1), Palette::color(&palette.out_of_range));

        let in_range = (
            proj.x(entries[1].timestamp).round() as u32,
            proj.y(120.0).round() as u32,
        );
        assert_eq!(*img.get_pixel(in_range.0, in_range.1), Palette::color(&palette.in_range));
    }

    #[test]
    fn value_axis_covers_thresholds_and_data() {
        let entries = [Entry::new(newest(), 320.0, Unit::MgDl, Trend::DoubleUp)];
        let proj = Projection::new(&config(), &entries, 200, 100);
        assert!(proj.upper > 320.0);
        assert!(proj.lower < 70.0);
        assert!(proj.y(320.0) >= MARGIN);
    }
}
