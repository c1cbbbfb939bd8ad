//! Integration tests for Gerber layer ingestion and rendering (IT-101 through IT-107).

use std::path::PathBuf;

use pcb_transform::{CsvSinks, PcbTransform, RenderOptions};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/gerber/ruler")
        .join(name)
}

fn loaded(layers: &[(&str, &str)]) -> PcbTransform {
    let mut pcb = PcbTransform::new();
    let result = pcb.load_gerber_layers(layers.iter().map(|(id, file)| (*id, fixture(file))));
    assert!(
        result.is_ok(),
        "expected Ok, got Err: {:?}",
        result.as_ref().err()
    );
    pcb
}

fn csv(pcb: &PcbTransform) -> (Vec<String>, Vec<String>) {
    let mut pads = Vec::new();
    let mut holes = Vec::new();
    let result = pcb.render_csv(CsvSinks {
        smdpads: Some(&mut pads),
        holes: Some(&mut holes),
    });
    assert!(result.is_ok(), "{:?}", result.err());
    let lines = |bytes: &[u8]| -> Vec<String> {
        String::from_utf8_lossy(bytes)
            .lines()
            .map(str::to_string)
            .collect()
    };
    (lines(&pads), lines(&holes))
}

/// IT-101: Paste flashes become pads in inch-converted millimeters.
#[test]
fn it_101_paste_pads() {
    let pcb = loaded(&[("GKO", "Ruler.GKO"), ("GTP", "Ruler.GTP")]);
    let (pads, holes) = csv(&pcb);
    assert_eq!(pads.len(), 4);
    assert_eq!(
        pads.get(1).map(String::as_str),
        Some("1,,,D10, 44.449999999999996, 35.564826, 0.3048, 0.3048, 0, 0")
    );
    assert_eq!(
        pads.get(3).map(String::as_str),
        Some("3,,,D11, 76.19999999999999, 12.7, 0.508, 0.7619999999999999, 0, 0")
    );
    assert_eq!(holes, ["#,ELEMENT,PACKAGE,HOLE,X,Y,DRILL"]);
}

/// IT-102: Holes appear once the solder mask layer is loaded.
#[test]
fn it_102_mask_openings_without_paste_are_holes() {
    let pcb = loaded(&[
        ("GKO", "Ruler.GKO"),
        ("GTP", "Ruler.GTP"),
        ("GTS", "Ruler.GTS"),
    ]);
    let (pads, holes) = csv(&pcb);
    assert_eq!(pads.len(), 4);
    assert_eq!(
        holes,
        [
            "#,ELEMENT,PACKAGE,HOLE,X,Y,DRILL",
            "1,,,D61, 161.23919999999998, 43.789092, 2.0574",
        ]
    );
}

/// IT-103: Drill hits come before mask openings.
#[test]
fn it_103_drill_layer_holes_lead() {
    let pcb = loaded(&[
        ("GTS", "Ruler.GTS"),
        ("GTP", "Ruler.GTP"),
        ("drl", "Ruler.DRL"),
    ]);
    let (_, holes) = csv(&pcb);
    assert_eq!(
        holes.get(1).map(String::as_str),
        Some("1,,,T1, 25.4, 12.7, 0.889")
    );
    assert_eq!(holes.len(), 3);
}

/// IT-104: Bounds and outline wires come from the GKO layer.
#[test]
fn it_104_outline_bounds() {
    let pcb = loaded(&[("gko", "Ruler.GKO"), ("gtp", "Ruler.GTP")]);
    let bounds = pcb.bounds();
    assert_eq!((bounds.left, bounds.top), (0.0, 0.0));
    assert_eq!(bounds.right.to_string(), "154.93999999999997");
    assert_eq!(bounds.bottom.to_string(), "25.4");

    let wires = pcb.wires(Some("GKO"));
    assert_eq!(wires.len(), 4);
    assert_eq!(wires.first().map(|wire| wire.width), Some(0.254));
    assert_eq!(pcb.summary().layers, ["GKO", "GTP"]);
}

/// IT-105: Gerber SVG draws the outline and every paste pad.
#[test]
fn it_105_svg_outline_and_pads() {
    let pcb = loaded(&[("GKO", "Ruler.GKO"), ("GTP", "Ruler.GTP")]);
    let mut out = Vec::new();
    let result = pcb.render_svg(&RenderOptions::default(), &mut out);
    assert!(result.is_ok(), "{:?}", result.err());
    let svg = String::from_utf8_lossy(&out);
    let lines: Vec<&str> = svg.lines().collect();
    assert_eq!(lines.len(), 13);
    assert_eq!(
        lines.get(4).copied(),
        Some(r##"<line x1="0" y1="0" x2="154.93999999999997" y2="0" width="0.254" stroke="#f0f"/><!--dimension-->"##)
    );
    assert_eq!(lines.iter().filter(|line| line.ends_with("<!--smd-->")).count(), 3);
}

/// IT-106: Loading the same layers twice yields the same tables.
#[test]
fn it_106_reload_is_deterministic() {
    let layers = [("GKO", "Ruler.GKO"), ("GTP", "Ruler.GTP"), ("GTS", "Ruler.GTS")];
    assert_eq!(csv(&loaded(&layers)), csv(&loaded(&layers)));
}

/// IT-107: An Eagle board takes priority over loaded Gerber layers.
#[test]
fn it_107_eagle_wins_when_both_are_loaded() {
    let mut pcb = loaded(&[("GTP", "Ruler.GTP")]);
    assert_eq!(pcb.pads(None).len(), 3);
    let brd = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/eagle/test.brd");
    assert!(pcb.load_eagle_brd(brd).is_ok());
    let pads = pcb.pads(None);
    assert_eq!(pads.len(), 4);
    assert_eq!(pads.first().map(|pad| pad.element.as_str()), Some("E$16"));
}
