//! Eagle `.brd` XML reader.
//!
//! Walks `drawing/board` once, placing every package pad, hole, wire and
//! label at its element's origin so later queries are plain filters.

use std::collections::{HashMap, HashSet};

use roxmltree::{Document, Node, ParsingOptions};

use crate::error::ParseError;
use crate::geometry::{Bounds, Hole, Pad, Placement, Point, Text, Wire};

use super::board::{EagleBoard, PadLayers, PlacedPad};
use super::layers::{mirror_layer, LayerTable, DIMENSION};

/// Roundness Eagle uses for non-square through-hole pads.
const ROUND: f64 = 100.0;

/// Parse an Eagle board file.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is empty, not UTF-8, not well-formed
/// XML, or is missing the `eagle/drawing/board` structure or a required
/// attribute.
pub fn parse(data: &[u8]) -> Result<EagleBoard, ParseError> {
    if data.is_empty() {
        return Err(ParseError::Empty);
    }
    let content = std::str::from_utf8(data)
        .map_err(|err| ParseError::Syntax(format!("invalid UTF-8 input: {err}")))?;
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(content, options)?;

    let root = doc.root_element();
    if root.tag_name().name() != "eagle" {
        return Err(ParseError::MissingElement("eagle"));
    }
    let drawing = child(root, "drawing").ok_or(ParseError::MissingElement("drawing"))?;
    let board_node = child(drawing, "board").ok_or(ParseError::MissingElement("board"))?;

    let mut board = EagleBoard {
        layers: parse_layer_table(drawing)?,
        ..EagleBoard::default()
    };

    let packages = collect_packages(board_node)?;

    if let Some(plain) = child(board_node, "plain") {
        parse_plain(plain, &mut board)?;
    }

    let plain_holes = std::mem::take(&mut board.holes);

    if let Some(elements) = child(board_node, "elements") {
        for element in children(elements, "element") {
            parse_element(element, &packages, &mut board)?;
        }
    }

    board.holes.extend(plain_holes);

    if let Some(signals) = child(board_node, "signals") {
        for signal in children(signals, "signal") {
            parse_signal(signal, &mut board)?;
        }
    }

    board.bounds = Bounds::of_wires(
        board
            .wires
            .iter()
            .filter(|(layer, _)| *layer == DIMENSION)
            .map(|(_, wire)| wire),
    )
    .unwrap_or_default();

    Ok(board)
}

fn parse_layer_table(drawing: Node<'_, '_>) -> Result<LayerTable, ParseError> {
    let mut declared = Vec::new();
    if let Some(layers) = child(drawing, "layers") {
        for layer in children(layers, "layer") {
            let number = required_u32(layer, "layer", "number")?;
            let name = required(layer, "layer", "name")?;
            declared.push((number, name.to_string()));
        }
    }
    Ok(LayerTable::new(declared))
}

type PackageKey = (String, String);

fn collect_packages<'a, 'input>(
    board: Node<'a, 'input>,
) -> Result<HashMap<PackageKey, Node<'a, 'input>>, ParseError> {
    let mut packages = HashMap::new();
    let Some(libraries) = child(board, "libraries") else {
        return Ok(packages);
    };
    for library in children(libraries, "library") {
        let library_name = required(library, "library", "name")?;
        let Some(package_list) = child(library, "packages") else {
            continue;
        };
        for package in children(package_list, "package") {
            let package_name = required(package, "package", "name")?;
            packages.insert((library_name.to_string(), package_name.to_string()), package);
        }
    }
    Ok(packages)
}

fn parse_plain(plain: Node<'_, '_>, board: &mut EagleBoard) -> Result<(), ParseError> {
    for node in plain.children().filter(Node::is_element) {
        match node.tag_name().name() {
            "wire" => board.wires.push(parse_wire(node, &Placement::IDENTITY)?),
            "text" => board
                .texts
                .push(parse_text(node, "text", &Placement::IDENTITY, None)?),
            "hole" => board.holes.push(parse_hole(node, &Placement::IDENTITY, "", "", "")?),
            _ => {}
        }
    }
    Ok(())
}

struct ElementInfo<'a> {
    name: &'a str,
    package: &'a str,
    value: &'a str,
    placement: Placement,
}

fn parse_element(
    element: Node<'_, '_>,
    packages: &HashMap<PackageKey, Node<'_, '_>>,
    board: &mut EagleBoard,
) -> Result<(), ParseError> {
    let name = required(element, "element", "name")?;
    let library = required(element, "element", "library")?;
    let package_name = required(element, "element", "package")?;
    let (angle, mirror) = parse_rotation(element.attribute("rot"))?;
    let info = ElementInfo {
        name,
        package: package_name,
        value: element.attribute("value").unwrap_or_default(),
        placement: Placement {
            origin: Point::new(
                required_f64(element, "element", "x")?,
                required_f64(element, "element", "y")?,
            ),
            angle,
            mirror,
        },
    };

    let package = packages
        .get(&(library.to_string(), package_name.to_string()))
        .ok_or_else(|| {
            ParseError::InvalidAttribute(format!(
                "element {name} references unknown package {library}/{package_name}"
            ))
        })?;

    let smashed = parse_attributes(element, &info, board)?;

    for node in package.children().filter(Node::is_element) {
        match node.tag_name().name() {
            "smd" => board.pads.push(parse_smd(node, &info)?),
            "pad" => {
                let (pad, hole) = parse_through_hole_pad(node, &info)?;
                board.pads.push(pad);
                board.holes.push(hole);
            }
            "hole" => board.holes.push(parse_hole(
                node,
                &info.placement,
                info.name,
                info.package,
                "",
            )?),
            "wire" => board.wires.push(parse_wire(node, &info.placement)?),
            "text" => {
                if let Some(text) = placeholder_text(node, &info, &smashed)? {
                    board.texts.push(text);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Emits smashed `<attribute>` labels and returns the placeholder names
/// (`NAME`, `VALUE`) they replace.
fn parse_attributes(
    element: Node<'_, '_>,
    info: &ElementInfo<'_>,
    board: &mut EagleBoard,
) -> Result<HashSet<String>, ParseError> {
    let mut smashed = HashSet::new();
    for attribute in children(element, "attribute") {
        let Some(key) = attribute.attribute("name") else {
            continue;
        };
        let key = key.to_ascii_uppercase();
        if attribute.attribute("x").is_none() || attribute.attribute("layer").is_none() {
            continue;
        }
        if attribute.attribute("display") != Some("off") {
            let content = match key.as_str() {
                "NAME" => info.name.to_string(),
                "VALUE" => info.value.to_string(),
                _ => attribute.attribute("value").unwrap_or_default().to_string(),
            };
            let (layer, mut text) =
                parse_text(attribute, "attribute", &Placement::IDENTITY, None)?;
            text.text = content;
            board.texts.push((layer, text));
        }
        smashed.insert(key);
    }
    Ok(smashed)
}

fn placeholder_text(
    node: Node<'_, '_>,
    info: &ElementInfo<'_>,
    smashed: &HashSet<String>,
) -> Result<Option<(u32, Text)>, ParseError> {
    let raw = node.text().unwrap_or_default();
    let content = match raw.strip_prefix('>') {
        Some(key) => {
            let key = key.to_ascii_uppercase();
            if smashed.contains(&key) {
                return Ok(None);
            }
            match key.as_str() {
                "NAME" => info.name.to_string(),
                "VALUE" => info.value.to_string(),
                _ => raw.to_string(),
            }
        }
        None => raw.to_string(),
    };
    parse_text(node, "text", &info.placement, Some(content)).map(Some)
}

fn parse_smd(node: Node<'_, '_>, info: &ElementInfo<'_>) -> Result<PlacedPad, ParseError> {
    let center = info.placement.apply(Point::new(
        required_f64(node, "smd", "x")?,
        required_f64(node, "smd", "y")?,
    ));
    let (local_angle, _) = parse_rotation(node.attribute("rot"))?;
    let mut layer = required_u32(node, "smd", "layer")?;
    if info.placement.mirror {
        layer = mirror_layer(layer);
    }
    Ok(PlacedPad {
        layers: PadLayers::Single(layer),
        pad: Pad {
            element: info.name.to_string(),
            package: info.package.to_string(),
            name: required(node, "smd", "name")?.to_string(),
            x: center.x,
            y: center.y,
            width: required_f64(node, "smd", "dx")?,
            height: required_f64(node, "smd", "dy")?,
            angle: info.placement.angle_of(local_angle),
            roundness: optional_f64(node, "roundness")?.unwrap_or(0.0),
        },
    })
}

fn parse_through_hole_pad(
    node: Node<'_, '_>,
    info: &ElementInfo<'_>,
) -> Result<(PlacedPad, Hole), ParseError> {
    let center = info.placement.apply(Point::new(
        required_f64(node, "pad", "x")?,
        required_f64(node, "pad", "y")?,
    ));
    let drill = required_f64(node, "pad", "drill")?;
    let diameter = optional_f64(node, "diameter")?
        .filter(|diameter| *diameter > 0.0)
        .unwrap_or_else(|| default_pad_diameter(drill));
    let (local_angle, _) = parse_rotation(node.attribute("rot"))?;
    let name = required(node, "pad", "name")?;
    let roundness = if node.attribute("shape") == Some("square") {
        0.0
    } else {
        ROUND
    };

    let pad = PlacedPad {
        layers: PadLayers::AllCopper,
        pad: Pad {
            element: info.name.to_string(),
            package: info.package.to_string(),
            name: name.to_string(),
            x: center.x,
            y: center.y,
            width: diameter,
            height: diameter,
            angle: info.placement.angle_of(local_angle),
            roundness,
        },
    };
    let hole = Hole {
        element: info.name.to_string(),
        package: info.package.to_string(),
        name: name.to_string(),
        x: center.x,
        y: center.y,
        r: drill / 2.0,
    };
    Ok((pad, hole))
}

/// Eagle's default restring: a quarter of the drill, clamped to 10..20 mil.
fn default_pad_diameter(drill: f64) -> f64 {
    let restring = (drill * 0.25).clamp(0.254, 0.508);
    restring.mul_add(2.0, drill)
}

fn parse_hole(
    node: Node<'_, '_>,
    placement: &Placement,
    element: &str,
    package: &str,
    name: &str,
) -> Result<Hole, ParseError> {
    let center = placement.apply(Point::new(
        required_f64(node, "hole", "x")?,
        required_f64(node, "hole", "y")?,
    ));
    Ok(Hole {
        element: element.to_string(),
        package: package.to_string(),
        name: name.to_string(),
        x: center.x,
        y: center.y,
        r: required_f64(node, "hole", "drill")? / 2.0,
    })
}

fn parse_wire(node: Node<'_, '_>, placement: &Placement) -> Result<(u32, Wire), ParseError> {
    let start = placement.apply(Point::new(
        required_f64(node, "wire", "x1")?,
        required_f64(node, "wire", "y1")?,
    ));
    let end = placement.apply(Point::new(
        required_f64(node, "wire", "x2")?,
        required_f64(node, "wire", "y2")?,
    ));
    let mut layer = required_u32(node, "wire", "layer")?;
    if placement.mirror {
        layer = mirror_layer(layer);
    }
    Ok((
        layer,
        Wire {
            x1: start.x,
            y1: start.y,
            x2: end.x,
            y2: end.y,
            width: optional_f64(node, "width")?.unwrap_or(0.0),
        },
    ))
}

/// Reads a `<text>` label or a smashed `<attribute>`; `element` names the
/// tag in errors.
fn parse_text(
    node: Node<'_, '_>,
    element: &'static str,
    placement: &Placement,
    content: Option<String>,
) -> Result<(u32, Text), ParseError> {
    let anchor = placement.apply(Point::new(
        required_f64(node, element, "x")?,
        required_f64(node, element, "y")?,
    ));
    let (local_angle, _) = parse_rotation(node.attribute("rot"))?;
    let mut layer = required_u32(node, element, "layer")?;
    if placement.mirror {
        layer = mirror_layer(layer);
    }
    Ok((
        layer,
        Text {
            x: anchor.x,
            y: anchor.y,
            size: optional_f64(node, "size")?.unwrap_or(0.0),
            angle: placement.angle_of(local_angle),
            text: content.unwrap_or_else(|| node.text().unwrap_or_default().to_string()),
            layer: layer.to_string(),
        },
    ))
}

fn parse_signal(signal: Node<'_, '_>, board: &mut EagleBoard) -> Result<(), ParseError> {
    let name = signal.attribute("name").unwrap_or_default();
    for node in signal.children().filter(Node::is_element) {
        match node.tag_name().name() {
            "wire" => board.wires.push(parse_wire(node, &Placement::IDENTITY)?),
            "via" => board.holes.push(Hole {
                name: name.to_string(),
                x: required_f64(node, "via", "x")?,
                y: required_f64(node, "via", "y")?,
                r: required_f64(node, "via", "drill")? / 2.0,
                ..Hole::default()
            }),
            _ => {}
        }
    }
    Ok(())
}

/// Parses an Eagle rotation such as `R90`, `MR180` or `SMR45` into
/// `(degrees, mirrored)`.
fn parse_rotation(raw: Option<&str>) -> Result<(f64, bool), ParseError> {
    let Some(raw) = raw else {
        return Ok((0.0, false));
    };
    let flags = raw.trim_start_matches(['S', 'M']);
    let prefix_len = raw.len() - flags.len();
    let mirror = raw.get(..prefix_len).is_some_and(|prefix| prefix.contains('M'));
    let degrees = flags
        .strip_prefix('R')
        .ok_or_else(|| ParseError::InvalidAttribute(format!("invalid rotation `{raw}`")))?;
    let angle = degrees
        .parse::<f64>()
        .map_err(|err| ParseError::InvalidAttribute(format!("invalid rotation `{raw}`: {err}")))?;
    Ok((angle, mirror))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn required<'a>(
    node: Node<'a, '_>,
    element: &'static str,
    attr: &'static str,
) -> Result<&'a str, ParseError> {
    node.attribute(attr)
        .ok_or(ParseError::MissingAttribute { element, attr })
}

fn required_f64(
    node: Node<'_, '_>,
    element: &'static str,
    attr: &'static str,
) -> Result<f64, ParseError> {
    parse_f64(required(node, element, attr)?, attr)
}

fn required_u32(
    node: Node<'_, '_>,
    element: &'static str,
    attr: &'static str,
) -> Result<u32, ParseError> {
    let raw = required(node, element, attr)?;
    raw.parse::<u32>()
        .map_err(|err| ParseError::InvalidAttribute(format!("invalid {attr} `{raw}`: {err}")))
}

fn optional_f64(node: Node<'_, '_>, attr: &'static str) -> Result<Option<f64>, ParseError> {
    node.attribute(attr).map(|raw| parse_f64(raw, attr)).transpose()
}

fn parse_f64(raw: &str, label: &str) -> Result<f64, ParseError> {
    let value = raw
        .parse::<f64>()
        .map_err(|err| ParseError::InvalidAttribute(format!("invalid {label} `{raw}`: {err}")))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParseError::InvalidAttribute(format!(
            "{label} must be finite, got `{raw}`"
        )))
    }
}
