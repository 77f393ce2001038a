// Fluxo completo sem rede: parse → janela → ícone.

use image::{Rgba, RgbaImage};
use nightscout_core::icon::GlyphAtlas;
use nightscout_core::theme::get_style;
use nightscout_core::window::window;
use nightscout_core::{AppConfig, Trend, Unit, parse_entries};

fn atlas() -> GlyphAtlas {
    let img = RgbaImage::from_fn(GlyphAtlas::MIN_WIDTH, 8, |x, y| Rgba([x as u8, y as u8, 200, 255]));
    GlyphAtlas::from_image(img).unwrap()
}

#[test]
fn two_valid_lines_survive_to_the_icon() {
    let body = concat!(
        "\"2024-03-10T11:55:00.000Z\"\t1710071700000\t95\t\"SingleDown\"\t\"xDrip\"\r\n",
        "\"2024-03-10T12:00:00.000Z\"\t1710072000000\t88\t\"DoubleDown\"\t\"xDrip\"\r\n",
        "\"2024-03-10T12:05:00.000Z\"\t1710072300000\t\t\r\n",
    );

    let entries = parse_entries(body, Unit::MgDl);
    assert_eq!(entries.len(), 2);

    let slice = window(&entries, 1);
    assert_eq!(slice, entries);

    let freshest = slice[0];
    assert_eq!(freshest.value, 88.0);
    assert_eq!(freshest.trend, Trend::DoubleDown);

    let mut config = AppConfig::default();
    config.display.use_color = false;
    let icon = get_style("classic").draw_icon(&atlas(), &config, &freshest);

    // Dois dígitos alinhados à direita: "8" em x=5 e x=10 (origem 32 no atlas)
    assert_eq!(*icon.get_pixel(5, 8), Rgba([32, 0, 200, 255]));
    assert_eq!(*icon.get_pixel(10, 8), Rgba([32, 0, 200, 255]));
    assert_eq!(icon.get_pixel(0, 8)[3], 0);
    // DoubleDown (offset 70) desenhada duas vezes
    assert_eq!(*icon.get_pixel(5, 0), Rgba([70, 0, 200, 255]));
    assert_eq!(*icon.get_pixel(10, 0), Rgba([70, 0, 200, 255]));
}

#[test]
fn colored_icon_for_low_reading() {
    let body = "\"2024-03-10T12:00:00.000Z\"\t1710072000000\t62\t\"Flat\"\n";
    let entries = parse_entries(body, Unit::MgDl);

    let mut config = AppConfig::default();
    config.display.use_color = true;
    let icon = get_style("classic").draw_icon(&atlas(), &config, &entries[0]);

    // Vermelho do estilo clássico, alfa do atlas preservado
    assert_eq!(*icon.get_pixel(5, 8), Rgba([0xe0, 0, 0, 255]));
}

#[test]
fn bundled_atlas_draws_every_trend() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../tray/assets/symbols.png");
    let atlas = GlyphAtlas::load(&path).unwrap();

    for trend in Trend::ALL {
        let entry = nightscout_core::Entry::new(chrono::Utc::now(), 142.0, Unit::MgDl, trend);
        let icon = get_style("classic").draw_icon(&atlas, &AppConfig::default(), &entry);
        assert_eq!(icon.dimensions(), (16, 16));
        // A linha dos dígitos sempre tem algum pixel opaco
        assert!((8..16).any(|y| (0..16).any(|x| icon.get_pixel(x, y)[3] > 0)));
    }
}
