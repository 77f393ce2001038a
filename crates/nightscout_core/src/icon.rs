//! Atlas de glifos e composição do ícone 16×16.
//!
//! Layout do atlas (altura ≥ 8 px):
//!
//! ```text
//! x:  0    4    8   ...  36   40    45    50   ...  80   85
//!     │ 0  │ 1  │ 2 ... │ 9  │ ⇈   │ ↑   │ ↗  ... │ ⚠  │
//!     └─ dígitos 4×8 ───────┘└─ tendências 5×8 ────────┘
//! ```
//!
//! O atlas é imutável; a cor de status é aplicada a cada cópia de glifo
//! durante o blit (RGB substituído, alfa preservado).

use crate::error::StartupError;
use crate::types::{DIGIT_STRIP_WIDTH, Entry, TREND_GLYPH_WIDTH, Trend};
use image::{Pixel, Rgba, RgbaImage};
use std::path::Path;
use tracing::info;

/// Lado do ícone final.
pub const ICON_SIZE: u32 = 16;
/// Largura de um glifo de dígito.
pub const DIGIT_WIDTH: u32 = 4;
/// Altura de todos os glifos.
pub const GLYPH_HEIGHT: u32 = 8;
/// Linha dos dígitos no ícone.
pub const DIGIT_ROW_Y: i64 = 8;
/// Posição da seta de tendência.
pub const TREND_X: i64 = 10;
/// Posição da segunda seta nas tendências duplas.
pub const DOUBLE_TREND_X: i64 = 5;
/// Dígitos que cabem alinhados à direita (com 1 px de espaçamento).
const MAX_ALIGNED_DIGITS: usize = 3;

/// Bitmap com os glifos de dígitos e de tendência.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    image: RgbaImage,
}

impl GlyphAtlas {
    /// Largura mínima: 10 dígitos + 9 setas.
    pub const MIN_WIDTH: u32 = DIGIT_STRIP_WIDTH + 9 * TREND_GLYPH_WIDTH;

    /// Carrega o atlas de um PNG. Ausência ou dimensão errada é fatal.
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        if !path.exists() {
            return Err(StartupError::MissingFile(path.to_path_buf()));
        }
        let image = image::open(path)
            .map_err(|e| StartupError::InvalidAtlas(format!("{}: {e}", path.display())))?
            .into_rgba8();

        let atlas = Self::from_image(image)?;
        info!(
            "Atlas de glifos carregado de {} ({}x{})",
            path.display(),
            atlas.image.width(),
            atlas.image.height()
        );
        Ok(atlas)
    }

    pub fn from_image(image: RgbaImage) -> Result<Self, StartupError> {
        let (w, h) = image.dimensions();
        if w < Self::MIN_WIDTH || h < GLYPH_HEIGHT {
            return Err(StartupError::InvalidAtlas(format!(
                "{w}x{h} (mínimo {}x{GLYPH_HEIGHT})",
                Self::MIN_WIDTH
            )));
        }
        Ok(Self { image })
    }

    /// Copia um glifo do atlas, opcionalmente tingido.
    pub fn glyph(&self, src_x: u32, width: u32, tint: Option<Rgba<u8>>) -> RgbaImage {
        let mut glyph = image::imageops::crop_imm(&self.image, src_x, 0, width, GLYPH_HEIGHT).to_image();
        if let Some(color) = tint {
            for px in glyph.pixels_mut() {
                if px[3] > 0 {
                    px[0] = color[0];
                    px[1] = color[1];
                    px[2] = color[2];
                }
            }
        }
        glyph
    }
}

/// O que um blit desenha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphKind {
    Digit(u8),
    Trend(Trend),
}

/// Uma cópia de retângulo atlas → ícone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blit {
    pub kind: GlyphKind,
    pub src_x: u32,
    pub width: u32,
    pub dest_x: i64,
    pub dest_y: i64,
}

/// Plano de desenho do ícone de uma leitura.
///
/// Dígitos alinhados à direita na faixa de 15 px da linha inferior, com
/// 1 px extra após cada dígito quando há no máximo 3. A seta fica em
/// (10, 0); tendências duplas ganham uma segunda cópia em (5, 0).
pub fn icon_blits(entry: &Entry) -> Vec<Blit> {
    let digits = entry.digits();
    let mut blits = Vec::with_capacity(digits.len() + 2);

    let slots = MAX_ALIGNED_DIGITS.saturating_sub(digits.len()) as i64;
    let mut dest_x = slots * i64::from(DIGIT_WIDTH + 1);
    let use_gap = digits.len() <= MAX_ALIGNED_DIGITS;

    for digit in digits {
        blits.push(Blit {
            kind: GlyphKind::Digit(digit),
            src_x: u32::from(digit) * DIGIT_WIDTH,
            width: DIGIT_WIDTH,
            dest_x,
            dest_y: DIGIT_ROW_Y,
        });
        dest_x += i64::from(DIGIT_WIDTH);
        if use_gap {
            dest_x += 1;
        }
    }

    if let Some(src_x) = entry.trend.atlas_offset() {
        let trend_blit = |dest_x| Blit {
            kind: GlyphKind::Trend(entry.trend),
            src_x,
            width: TREND_GLYPH_WIDTH,
            dest_x,
            dest_y: 0,
        };
        blits.push(trend_blit(TREND_X));
        if entry.trend.is_double() {
            blits.push(trend_blit(DOUBLE_TREND_X));
        }
    }

    blits
}

/// Desenha o ícone 16×16 (fundo transparente) de uma leitura.
pub fn compose_icon(atlas: &GlyphAtlas, entry: &Entry, tint: Option<Rgba<u8>>) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(ICON_SIZE, ICON_SIZE, Rgba([0, 0, 0, 0]));
    for blit in icon_blits(entry) {
        let glyph = atlas.glyph(blit.src_x, blit.width, tint);
        blit_over(&mut canvas, &glyph, blit.dest_x, blit.dest_y);
    }
    canvas
}

/// Source-over com recorte nas bordas. Pixels opacos são copiados
/// diretamente para manter o resultado exato.
fn blit_over(canvas: &mut RgbaImage, glyph: &RgbaImage, x: i64, y: i64) {
    let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));
    for (gx, gy, px) in glyph.enumerate_pixels() {
        let (dx, dy) = (x + i64::from(gx), y + i64::from(gy));
        if dx < 0 || dy < 0 || dx >= cw || dy >= ch {
            continue;
        }
        let dest = canvas.get_pixel_mut(dx as u32, dy as u32);
        match px[3] {
            0 => {}
            255 => *dest = *px,
            _ => dest.blend(px),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::Unit;
    use chrono::{TimeZone, Utc};

    /// Atlas sintético: cada pixel codifica sua própria coordenada.
    pub(crate) fn coded_atlas() -> GlyphAtlas {
        let img = RgbaImage::from_fn(GlyphAtlas::MIN_WIDTH, GLYPH_HEIGHT, |x, y| {
            Rgba([x as u8, y as u8, 200, 255])
        });
        GlyphAtlas::from_image(img).unwrap()
    }

    fn entry(value: f64, trend: Trend) -> Entry {
        let ts = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        Entry::new(ts, value, Unit::MgDl, trend)
    }

    fn digit_xs(blits: &[Blit]) -> Vec<i64> {
        blits
            .iter()
            .filter(|b| matches!(b.kind, GlyphKind::Digit(_)))
            .map(|b| b.dest_x)
            .collect()
    }

    fn trend_xs(blits: &[Blit]) -> Vec<i64> {
        blits
            .iter()
            .filter(|b| matches!(b.kind, GlyphKind::Trend(_)))
            .map(|b| b.dest_x)
            .collect()
    }

    #[test]
    fn one_digit_starts_at_ten() {
        let blits = icon_blits(&entry(7.0, Trend::None));
        assert_eq!(digit_xs(&blits), vec![10]);
        assert_eq!(blits[0].src_x, 28);
    }

    #[test]
    fn three_digits_start_at_zero_with_gap() {
        let blits = icon_blits(&entry(120.0, Trend::None));
        assert_eq!(digit_xs(&blits), vec![0, 5, 10]);
        let srcs: Vec<u32> = blits.iter().map(|b| b.src_x).collect();
        assert_eq!(srcs, vec![4, 8, 0]);
        assert!(blits.iter().all(|b| b.dest_y == DIGIT_ROW_Y));
    }

    #[test]
    fn two_digits_right_aligned() {
        let blits = icon_blits(&entry(85.0, Trend::None));
        assert_eq!(digit_xs(&blits), vec![5, 10]);
    }

    #[test]
    fn trend_blit_counts() {
        assert!(trend_xs(&icon_blits(&entry(120.0, Trend::None))).is_empty());
        assert_eq!(trend_xs(&icon_blits(&entry(120.0, Trend::Flat))), vec![10]);
        assert_eq!(
            trend_xs(&icon_blits(&entry(120.0, Trend::DoubleUp))),
            vec![10, 5]
        );
        assert_eq!(
            trend_xs(&icon_blits(&entry(120.0, Trend::DoubleDown))),
            vec![10, 5]
        );
    }

    #[test]
    fn composed_pixels_match_atlas() {
        let atlas = coded_atlas();
        let icon = compose_icon(&atlas, &entry(120.0, Trend::Flat), None);
        assert_eq!(icon.dimensions(), (16, 16));

        // Dígito "2" em x=5: origem x=8..12 no atlas
        assert_eq!(*icon.get_pixel(5, 8), Rgba([8, 0, 200, 255]));
        assert_eq!(*icon.get_pixel(8, 15), Rgba([11, 7, 200, 255]));
        // Coluna de espaçamento fica transparente
        assert_eq!(icon.get_pixel(4, 8)[3], 0);
        // Seta Flat (offset 55) em (10, 0)
        assert_eq!(*icon.get_pixel(10, 0), Rgba([55, 0, 200, 255]));
        assert_eq!(*icon.get_pixel(14, 7), Rgba([59, 7, 200, 255]));
        // Sem seta dupla
        assert_eq!(icon.get_pixel(5, 0)[3], 0);
    }

    #[test]
    fn double_trend_draws_second_arrow() {
        let atlas = coded_atlas();
        let icon = compose_icon(&atlas, &entry(250.0, Trend::DoubleUp), None);
        assert_eq!(*icon.get_pixel(5, 0), Rgba([40, 0, 200, 255]));
        assert_eq!(*icon.get_pixel(10, 0), Rgba([40, 0, 200, 255]));
    }

    #[test]
    fn tint_replaces_rgb_keeps_alpha() {
        let mut img = RgbaImage::from_pixel(GlyphAtlas::MIN_WIDTH, GLYPH_HEIGHT, Rgba([0, 0, 0, 0]));
        img.put_pixel(0, 0, Rgba([10, 10, 10, 255]));
        img.put_pixel(1, 0, Rgba([10, 10, 10, 128]));
        let atlas = GlyphAtlas::from_image(img).unwrap();

        let red = Rgba([255, 0, 0, 255]);
        let glyph = atlas.glyph(0, DIGIT_WIDTH, Some(red));
        assert_eq!(*glyph.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*glyph.get_pixel(1, 0), Rgba([255, 0, 0, 128]));
        assert_eq!(*glyph.get_pixel(2, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn sentinel_icon_is_single_zero() {
        let atlas = coded_atlas();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let icon = compose_icon(&atlas, &Entry::sentinel(Unit::MgDl, now), None);
        assert_eq!(*icon.get_pixel(10, 8), Rgba([0, 0, 200, 255]));
        assert_eq!(icon.get_pixel(0, 8)[3], 0);
        assert_eq!(icon.get_pixel(10, 0)[3], 0);
    }

    #[test]
    fn rejects_undersized_atlas() {
        let img = RgbaImage::new(40, 8);
        assert!(matches!(
            GlyphAtlas::from_image(img),
            Err(StartupError::InvalidAtlas(_))
        ));
    }
}
