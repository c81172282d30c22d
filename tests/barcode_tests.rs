#[cfg(test)]
mod barcode_proptests {
    use std::io::Cursor;

    use prop::string::string_regex;
    use proptest::prelude::*;

    use isbnbar::builder::symbol::{EAN13_PARITY, G_CODES, L_CODES, R_CODES};
    use isbnbar::builder::{encode, encode2, encode5, Parity};
    use isbnbar::common::checksum::{check_digit, validate13};
    use isbnbar::render::{render_with_typeface, tiff::read_tiff_info, RasterBuffer, Typeface};
    use isbnbar::*;

    const NOMINAL_RATIO: f64 = 37.29 / 25.93;

    pub fn prefix_strategy() -> BoxedStrategy<String> {
        string_regex("97[89][0-9]{9}").unwrap().boxed()
    }

    pub fn isbn_strategy() -> impl Strategy<Value = String> {
        prefix_strategy().prop_map(|p| {
            let check = check_digit(&p).unwrap();
            format!("{p}{check}")
        })
    }

    pub fn color_mode_strategy() -> BoxedStrategy<ColorMode> {
        prop_oneof![
            Just(ColorMode::Bitmap),
            Just(ColorMode::Grayscale),
            Just(ColorMode::Rgb),
            Just(ColorMode::Cmyk)
        ]
        .boxed()
    }

    pub fn alignment_strategy() -> BoxedStrategy<TextAlignment> {
        prop_oneof![Just(TextAlignment::Left), Just(TextAlignment::Center), Just(TextAlignment::Right)]
            .boxed()
    }

    pub fn options_strategy() -> impl Strategy<Value = RenderOptions> {
        (
            (100u32..2400, proptest::option::of(10.0f64..80.0), proptest::option::of(50u32..4000)),
            (any::<bool>(), color_mode_strategy(), any::<[u8; 3]>(), any::<[u8; 3]>()),
            (1u32..200, -5.0f64..10.0, -10i32..20, -10i32..20),
            (alignment_strategy(), any::<bool>(), "[A-Za-z ]{1,12}"),
        )
            .prop_map(|(size, look, text, misc)| {
                let mut opts = RenderOptions::new();
                opts.dpi(size.0)
                    .lock_aspect_ratio(look.0)
                    .color_mode(look.1)
                    .colors(look.2, look.3)
                    .font(&misc.2, text.0)
                    .letter_spacing(text.1)
                    .text_offsets(text.2, text.3)
                    .text_alignment(misc.0)
                    .quiet_zone_indicator(misc.1);
                opts.width_mm = size.1;
                opts.height_px = size.2;
                opts
            })
    }

    fn decode_digit(bars: &[u8], table: &[u8; 10]) -> Option<u8> {
        let code = bars.iter().fold(0u8, |acc, &b| (acc << 1) | b);
        table.iter().position(|&c| c == code).map(|d| d as u8)
    }

    fn render_builtin(barcode: &Barcode, opts: &RenderOptions) -> RasterImage {
        let face = Typeface::builtin(opts.font_size);
        render_with_typeface(&RenderConfig::new(barcode, opts), &face).unwrap()
    }

    proptest! {
        #[test]
        fn proptest_check_digit(prefix in prefix_strategy(), wrong in 0u8..10) {
            let check = check_digit(&prefix).unwrap();
            let valid = format!("{prefix}{check}");
            prop_assert_eq!(validate13(&valid).unwrap().to_string(), valid);

            prop_assume!(wrong != check);
            let invalid = format!("{prefix}{wrong}");
            prop_assert_eq!(
                validate13(&invalid).unwrap_err(),
                BarcodeError::ChecksumMismatch { expected: check, found: wrong }
            );
        }

        #[test]
        fn proptest_symbol_structure(isbn in isbn_strategy()) {
            let p = encode(&isbn).unwrap();
            let bars = p.bars();
            prop_assert_eq!(p.module_count(), 95);
            prop_assert_eq!(&bars[..3], &[1, 0, 1]);
            prop_assert_eq!(&bars[45..50], &[0, 1, 0, 1, 0]);
            prop_assert_eq!(&bars[92..], &[1, 0, 1]);
            prop_assert!(bars.iter().all(|&b| b <= 1));
        }

        #[test]
        fn proptest_symbol_decodes(isbn in isbn_strategy()) {
            let digits = isbn.bytes().map(|b| b - b'0').collect::<Vec<_>>();
            let p = encode(&isbn).unwrap();
            let bars = p.bars();

            let parity = EAN13_PARITY[digits[0] as usize];
            for (i, side) in parity.iter().enumerate() {
                let start = 3 + i * 7;
                let table = match side {
                    Parity::L => &L_CODES,
                    Parity::G => &G_CODES,
                };
                prop_assert_eq!(decode_digit(&bars[start..start + 7], table), Some(digits[1 + i]));
            }
            for i in 0..6 {
                let start = 50 + i * 7;
                prop_assert_eq!(decode_digit(&bars[start..start + 7], &R_CODES), Some(digits[7 + i]));
            }
        }

        #[test]
        fn proptest_addons(two in "[0-9]{2}", five in "[0-9]{5}") {
            let p2 = encode2(&two).unwrap();
            prop_assert_eq!(p2.module_count(), 20);
            prop_assert_eq!(&p2.bars()[..4], &[1, 0, 1, 1]);

            let p5 = encode5(&five).unwrap();
            prop_assert_eq!(p5.module_count(), 47);
            prop_assert_eq!(&p5.bars()[..4], &[1, 0, 1, 1]);
        }

        #[test]
        fn proptest_options_document(opts in options_strategy()) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("options.json");
            opts.save(&path).unwrap();
            let loaded = RenderOptions::load(&path).unwrap();

            prop_assert_eq!(loaded.dpi, opts.dpi);
            prop_assert_eq!(loaded.width_px, opts.width_px);
            prop_assert_eq!(loaded.height_px, opts.height_px);
            prop_assert_eq!(loaded.height_mm, opts.height_mm);
            prop_assert_eq!(loaded.width_mm.is_some(), opts.width_mm.is_some());
            if let (Some(a), Some(b)) = (loaded.width_mm, opts.width_mm) {
                prop_assert!((a - b).abs() < 1e-9);
            }
            prop_assert_eq!(loaded.lock_aspect_ratio, opts.lock_aspect_ratio);
            prop_assert_eq!(loaded.color_mode, opts.color_mode);
            prop_assert_eq!(loaded.foreground_color, opts.foreground_color);
            prop_assert_eq!(loaded.background_color, opts.background_color);
            prop_assert_eq!(&loaded.font_family, &opts.font_family);
            prop_assert_eq!(loaded.font_size, opts.font_size);
            prop_assert!((loaded.letter_spacing - opts.letter_spacing).abs() < 1e-9);
            prop_assert_eq!(loaded.isbn_text_offset_y, opts.isbn_text_offset_y);
            prop_assert_eq!(loaded.digits_offset_y, opts.digits_offset_y);
            prop_assert_eq!(loaded.text_alignment, opts.text_alignment);
            prop_assert_eq!(loaded.show_quiet_zone_indicator, opts.show_quiet_zone_indicator);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn proptest_dpi_tag(isbn in isbn_strategy(), dpi in 300u32..1200) {
            let barcode = BarcodeBuilder::new(&isbn).build().unwrap();
            let mut opts = RenderOptions::new();
            opts.dpi(dpi).width_px(400);
            let img = render_builtin(&barcode, &opts);

            let mut buf = Cursor::new(Vec::new());
            img.write_tiff(&mut buf).unwrap();
            buf.set_position(0);
            let info = read_tiff_info(buf).unwrap();
            prop_assert!((info.dpi.unwrap() - dpi as f64).abs() <= 1.0);
        }

        #[test]
        fn proptest_exact_pixels(w in 60u32..1200, h in 60u32..800) {
            let barcode = BarcodeBuilder::new("9787564922351").build().unwrap();
            let mut opts = RenderOptions::new();
            opts.lock_aspect_ratio(false).width_px(w).height_px(h);
            let img = render_builtin(&barcode, &opts);
            prop_assert_eq!(img.dimensions(), (w, h));
        }

        #[test]
        fn proptest_locked_ratio(len in 200u32..1500, by_width in any::<bool>()) {
            let barcode = BarcodeBuilder::new("9787564922351").build().unwrap();
            let mut opts = RenderOptions::new();
            if by_width {
                opts.width_px(len);
            } else {
                opts.height_px(len);
            }
            let img = render_builtin(&barcode, &opts);
            let ratio = img.width() as f64 / img.height() as f64;
            prop_assert!((ratio / NOMINAL_RATIO - 1.0).abs() < 0.03);
        }

        #[test]
        fn proptest_color_modes(mode in color_mode_strategy(), fg in any::<[u8; 3]>()) {
            let barcode = BarcodeBuilder::new("9787564922351").addon("02").build().unwrap();
            let mut opts = RenderOptions::new();
            opts.color_mode(mode).colors(fg, [255, 255, 255]);
            let img = render_builtin(&barcode, &opts);
            prop_assert_eq!(img.color_mode(), mode);

            let pixels = (img.width() * img.height()) as usize;
            match img.buffer() {
                RasterBuffer::Bitmap(buf) => {
                    prop_assert!(buf.as_raw().iter().all(|&v| v <= 1));
                }
                RasterBuffer::Grayscale(buf) => {
                    prop_assert_eq!(buf.as_raw().len(), pixels);
                }
                RasterBuffer::Rgb(buf) => {
                    prop_assert_eq!(buf.as_raw().len(), pixels * 3);
                }
                RasterBuffer::Cmyk(buf) => {
                    prop_assert_eq!(buf.as_raw().len(), pixels * 4);
                }
            }

            let mut out = Cursor::new(Vec::new());
            img.write_tiff(&mut out).unwrap();
            out.set_position(0);
            prop_assert_eq!(read_tiff_info(out).unwrap().channels, mode.channels());
        }
    }
}

#[cfg(test)]
mod barcode_tests {
    use rayon::prelude::*;
    use test_case::test_case;

    use isbnbar::render::tiff::read_tiff_info_file;
    use isbnbar::{
        BarcodeBuilder, BarcodeError, BatchProcessor, ColorMode, PixelValue, Preset, RenderOptions,
        TemplateStore,
    };

    #[test]
    fn test_end_to_end_quiet_zones() {
        let barcode = BarcodeBuilder::new("9787564922351").build().unwrap();
        let bars = barcode.pattern().bars();
        assert_eq!(bars.len(), 95);
        assert_eq!(&bars[..3], &[1, 0, 1]);
        assert_eq!(&bars[92..], &[1, 0, 1]);

        let img = barcode.render(&RenderOptions::default()).unwrap();
        assert_eq!(img.color_mode(), ColorMode::Bitmap);
        assert_eq!(img.dpi(), 300);

        let mw = img.width() as f64 / 113.0;
        let row = img.height() / 2;
        let dark = (0..img.width())
            .filter(|&x| img.pixel(x, row) == PixelValue::Bit(0))
            .collect::<Vec<_>>();
        let first = *dark.first().unwrap() as f64;
        let trailing = (img.width() - 1 - dark.last().unwrap()) as f64;
        assert!(first >= 11.0 * mw * 0.97, "left quiet zone {first}px");
        assert!(trailing >= 7.0 * mw * 0.97, "right quiet zone {trailing}px");
    }

    #[test]
    fn test_end_to_end_file() {
        let dir = tempfile::tempdir().unwrap();
        let barcode = BarcodeBuilder::new("9787564922351").addon("52495").build().unwrap();
        let mut opts = Preset::WithAddon.options();
        opts.dpi(600).color_mode(ColorMode::Cmyk);

        let path = dir.path().join(barcode.file_name());
        barcode.render(&opts).unwrap().save_tiff(&path).unwrap();

        let info = read_tiff_info_file(&path).unwrap();
        assert_eq!(info.channels, 4);
        assert_eq!(info.dpi, Some(600.0));
        // Width is fixed at 32.5 mm even with the supplement
        assert_eq!(info.width, (32.5f64 * 600.0 / 25.4).round() as u32);
    }

    #[test]
    fn test_batch_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let batch = BatchProcessor::new(RenderOptions::default());
        let items = ["9787564922351", "0000000000000"];
        let res = batch.process_list(&items, dir.path(), |_, _, _| {}).unwrap();

        assert_eq!((res.total, res.success, res.failed), (2, 1, 1));
        assert_eq!(res.errors.len(), 1);
        assert_eq!(res.errors[0].input, "0000000000000");
        assert_eq!(res.errors[0].message, BarcodeError::InvalidPrefix.to_string());
    }

    #[test]
    fn test_template_drives_batch() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path().join("templates"));
        let mut opts = RenderOptions::default();
        opts.color_mode(ColorMode::Grayscale).width_px(500);
        store.save("gray", &opts).unwrap();

        let batch = BatchProcessor::new(store.load("gray").unwrap());
        let out = dir.path().join("out");
        let res = batch.process_list(&["978-7-5649-2235-1"], &out, |_, _, _| {}).unwrap();
        assert_eq!(res.success, 1);

        let info = read_tiff_info_file(out.join("9787564922351.tif")).unwrap();
        assert_eq!((info.width, info.channels), (500, 1));
    }

    #[test_case("9787564922351", None)]
    #[test_case("9790000000001", Some("02"))]
    #[test_case("9780000000002", Some("90000"))]
    fn test_parallel_renders_match(isbn: &str, addon: Option<&str>) {
        let mut builder = BarcodeBuilder::new(isbn);
        if let Some(a) = addon {
            builder.addon(a);
        }
        let barcode = builder.build().unwrap();
        let modes = [ColorMode::Bitmap, ColorMode::Grayscale, ColorMode::Rgb, ColorMode::Cmyk];
        let options = modes
            .iter()
            .map(|&m| {
                let mut opts = RenderOptions::default();
                opts.color_mode(m).font("builtin", 12);
                opts
            })
            .collect::<Vec<_>>();

        let sequential = options.iter().map(|o| barcode.render(o).unwrap()).collect::<Vec<_>>();
        let parallel = options.par_iter().map(|o| barcode.render(o).unwrap()).collect::<Vec<_>>();
        assert_eq!(sequential, parallel);
    }
}
