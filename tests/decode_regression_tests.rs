//! Regression tests that push a real QR code through the rqrr backend
//!
//! The fixture is a version 1-M symbol encoding "4376471154038", drawn into a
//! white VGA frame inside the scan window. These tests protect the
//! coordinate hand-off: outlines have to land on the code in frame space
//! whether the decoder saw the cropped window or the whole frame.

use image::{Rgba, RgbaImage};
use rust_qr_scan::decode::decode_frame;
use rust_qr_scan::{
    CancelToken, CanvasOverlay, DecodeInvoker, Extraction, Frame, Point, RqrrDecoder, ScanLoop,
    ScannerConfig, StillFrameSource, Symbology, VideoDimensions, Viewport, ViewportMapping,
    WindowConfig, viewport_channel,
};

const PAYLOAD: &str = "4376471154038";

const GOLDEN: [&str; 21] = [
    "#######.....#.#######",
    "#.....#..#....#.....#",
    "#.###.#...##..#.###.#",
    "#.###.#...#...#.###.#",
    "#.###.#..####.#.###.#",
    "#.....#.#.#...#.....#",
    "#######.#.#.#.#######",
    ".........#...........",
    "#..#.##.######.#.....",
    "###.#..##..#.#.#.##..",
    "#..#.####.##..###...#",
    "..#.#..#....#####....",
    "..#...##.#.#.###.##..",
    "........#.#..####.##.",
    "#######...###.#.####.",
    "#.....#.#.....##....#",
    "#.###.#..##.###..#.##",
    "#.###.#.#.#..####..##",
    "#.###.#..###.###.#..#",
    "#.....#..####..##..#.",
    "#######.###..#.###...",
];

const MODULE_PX: u32 = 6;
const CODE_LEFT: u32 = 260;
const CODE_TOP: u32 = 180;
const CODE_SIDE: f32 = (21 * MODULE_PX) as f32;

/// Allowed distance between a reported corner and the drawn one
const CORNER_TOLERANCE: f32 = MODULE_PX as f32;

fn golden_frame() -> RgbaImage {
    let mut frame = RgbaImage::from_pixel(640, 480, Rgba([255, 255, 255, 255]));
    for (row, line) in GOLDEN.iter().enumerate() {
        for (col, module) in line.bytes().enumerate() {
            if module != b'#' {
                continue;
            }
            let x0 = CODE_LEFT + col as u32 * MODULE_PX;
            let y0 = CODE_TOP + row as u32 * MODULE_PX;
            for y in y0..y0 + MODULE_PX {
                for x in x0..x0 + MODULE_PX {
                    frame.put_pixel(x, y, Rgba([0, 0, 0, 255]));
                }
            }
        }
    }
    frame
}

/// Viewport equal to the frame with a window half of it in each direction,
/// so the scan window is (160, 120) 320x240 and holds the code plus its
/// quiet zone.
fn window() -> WindowConfig {
    WindowConfig {
        percent_wide: 50.0,
        percent_tall: 50.0,
    }
}

fn mapping() -> ViewportMapping {
    ViewportMapping::compute(Viewport::new(640.0, 480.0), VideoDimensions::new(640, 480), &window())
        .unwrap()
}

fn drawn_corners() -> [Point; 4] {
    let (l, t) = (CODE_LEFT as f32, CODE_TOP as f32);
    [
        Point::new(l, t),
        Point::new(l + CODE_SIDE, t),
        Point::new(l + CODE_SIDE, t + CODE_SIDE),
        Point::new(l, t + CODE_SIDE),
    ]
}

fn dist(a: Point, b: Point) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn assert_outline_on_code(outline: &[Point]) {
    assert_eq!(outline.len(), 4, "outline: {outline:?}");
    for corner in drawn_corners() {
        let nearest = outline
            .iter()
            .map(|p| dist(*p, corner))
            .fold(f32::INFINITY, f32::min);
        assert!(
            nearest <= CORNER_TOLERANCE,
            "no outline point near {corner:?} (nearest {nearest:.1}px): {outline:?}"
        );
    }
}

#[test]
fn test_fixture_sits_inside_the_scan_window() {
    let w = mapping().pixel_window();
    assert_eq!((w.x, w.y, w.width, w.height), (160, 120, 320, 240));
    assert!(CODE_LEFT - w.x >= 4 * MODULE_PX);
    assert!(w.x + w.width - (CODE_LEFT + 21 * MODULE_PX) >= 4 * MODULE_PX);
}

#[test]
fn test_cropped_decode_finds_the_payload() {
    let frame = golden_frame();
    let (symbols, origin) = decode_frame(&frame, &mapping(), Extraction::CropToWindow).unwrap();

    assert_eq!(origin, Point::new(160.0, 120.0));
    assert_eq!(symbols.len(), 1, "expected one symbol, got {symbols:?}");
    let symbol = &symbols[0];
    assert_eq!(symbol.symbology(), Symbology::QrCode);
    assert_eq!(symbol.type_name(), "QR-Code");
    assert_eq!(symbol.decode(), PAYLOAD);
    assert_eq!(
        rust_qr_scan::overlay::list_row(0, symbol),
        format!("#0: Type: QR-Code; Value: \"{PAYLOAD}\"")
    );
}

#[test]
fn test_cropped_outline_lands_on_the_code_in_frame_space() {
    let frame = golden_frame();
    let (symbols, origin) = decode_frame(&frame, &mapping(), Extraction::CropToWindow).unwrap();
    assert_eq!(symbols.len(), 1);

    // decoder-local points sit relative to the window, not the frame
    let local = symbols[0].polygon();
    assert!(local.iter().all(|p| p.x < 320.0 && p.y < 240.0));

    assert_outline_on_code(&symbols[0].translated_polygon(origin));
}

#[test]
fn test_crop_and_full_frame_outlines_agree() {
    let frame = golden_frame();
    let m = mapping();
    let (cropped, crop_origin) = decode_frame(&frame, &m, Extraction::CropToWindow).unwrap();
    let (full, full_origin) = decode_frame(&frame, &m, Extraction::FullFrame).unwrap();

    assert_eq!(full_origin, Point::default());
    assert_eq!(cropped.len(), 1);
    assert_eq!(full.len(), 1);
    assert_eq!(cropped[0].decode(), full[0].decode());

    let from_crop = cropped[0].translated_polygon(crop_origin);
    let from_full = full[0].translated_polygon(full_origin);
    assert_outline_on_code(&from_full);
    assert_eq!(from_crop.len(), from_full.len());
    for (a, b) in from_crop.iter().zip(&from_full) {
        assert!(dist(*a, *b) <= 1.0, "crop {from_crop:?} vs full {from_full:?}");
    }
}

#[test]
fn test_code_outside_the_window_is_missed_when_cropping() {
    let frame = golden_frame();
    let narrow = ViewportMapping::compute(
        Viewport::new(640.0, 480.0),
        VideoDimensions::new(640, 480),
        &WindowConfig::default(),
    )
    .unwrap();

    // the default 8% band is 38px tall, too short for a 126px code
    let (cropped, _) = decode_frame(&frame, &narrow, Extraction::CropToWindow).unwrap();
    assert!(cropped.is_empty());
    let (full, _) = decode_frame(&frame, &narrow, Extraction::FullFrame).unwrap();
    assert_eq!(full.len(), 1);
}

#[tokio::test]
async fn test_invoker_decodes_on_the_blocking_pool() {
    let frame = Frame {
        index: 0,
        image: golden_frame(),
    };
    let mut invoker = DecodeInvoker::new(RqrrDecoder::new(), Extraction::CropToWindow);
    let outcome = invoker.invoke(&frame, &mapping()).await.unwrap();

    assert_eq!(outcome.origin(), Point::new(160.0, 120.0));
    assert_eq!(outcome.symbols.len(), 1);
    assert_eq!(outcome.symbols[0].decode(), PAYLOAD);
    assert_outline_on_code(&outcome.symbols[0].translated_polygon(outcome.origin()));
}

#[tokio::test]
async fn test_scan_loop_outlines_the_code_on_the_canvas() {
    let config = ScannerConfig {
        window: window(),
        cycle_delay_ms: 0,
        max_cycles: Some(1),
        ..ScannerConfig::cropped()
    };
    let (_resize, viewport) = viewport_channel(Viewport::new(640.0, 480.0));
    let mut scan = ScanLoop::new(
        StillFrameSource::new(vec![golden_frame()]),
        RqrrDecoder::new(),
        CanvasOverlay::default(),
        viewport,
        config,
    );

    let report = scan.run(&CancelToken::new()).await.unwrap();

    assert_eq!(report.cycles, 1);
    assert_eq!(report.symbols_seen, 1);
    let canvas = scan.overlay();
    assert_eq!(canvas.rows(), [format!("#0: Type: QR-Code; Value: \"{PAYLOAD}\"")]);
    assert_outline_on_code(&canvas.outlines()[0]);

    let layer = canvas.symbol_layer().unwrap();
    let stroked = |p: Point| {
        layer
            .pixel(p.x.round() as u32, p.y.round() as u32)
            .is_some_and(|c| c.alpha() > 0)
    };
    assert!(canvas.outlines()[0].iter().all(|p| stroked(*p)));
}
