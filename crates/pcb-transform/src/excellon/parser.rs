//! Excellon drill parser for Gerber drill layers.
//!
//! Lines are split into letter/value fields. The header (`M48` up to `%`)
//! declares units and tools; the body selects tools and places hits.

use std::collections::BTreeMap;

use crate::error::ParseError;

use super::types::{DrillFile, DrillHit, ExcellonUnits, ToolDefinition};

/// Body commands that carry no hit information.
const IGNORED_COMMANDS: [&str; 12] = [
    "G00", "G01", "G02", "G03", "G05", "G85", "G90", "M15", "M16", "M17", "M71", "M72",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zeros {
    /// Leading zeros are kept; trailing ones may be dropped.
    Leading,
    /// Trailing zeros are kept; leading ones may be dropped.
    Trailing,
}

/// Digit layout of coordinates written without a decimal point.
#[derive(Debug, Clone, Copy)]
struct CoordinateFormat {
    integer: usize,
    decimal: usize,
    zeros: Zeros,
}

impl CoordinateFormat {
    const INCH: Self = Self {
        integer: 2,
        decimal: 4,
        zeros: Zeros::Leading,
    };

    const METRIC: Self = Self {
        integer: 3,
        decimal: 3,
        zeros: Zeros::Leading,
    };

    const fn for_units(units: ExcellonUnits, zeros: Zeros) -> Self {
        let base = match units {
            ExcellonUnits::Imperial => Self::INCH,
            ExcellonUnits::Metric => Self::METRIC,
        };
        Self { zeros, ..base }
    }

    /// Decodes `raw` into file units.
    fn decode(self, raw: &str) -> Result<f64, ParseError> {
        if raw.contains('.') {
            return number(raw, "coordinate");
        }
        let (negative, digits) = match raw.as_bytes().first() {
            Some(b'-') => (true, raw.get(1..).unwrap_or_default()),
            Some(b'+') => (false, raw.get(1..).unwrap_or_default()),
            _ => (false, raw),
        };
        if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(ParseError::Syntax(format!("invalid coordinate `{raw}`")));
        }
        if self.decimal == 0 {
            let value = number(digits, "coordinate")?;
            return Ok(if negative { -value } else { value });
        }

        let width = self.integer + self.decimal;
        let padded = match self.zeros {
            _ if digits.len() >= width => digits.to_string(),
            Zeros::Leading => format!("{digits:0>width$}"),
            Zeros::Trailing => format!("{digits:0<width$}"),
        };
        let (whole, fraction) = padded.split_at(padded.len().saturating_sub(self.decimal));
        let value = number(&format!("{whole}.{fraction}"), "coordinate")?;
        Ok(if negative { -value } else { value })
    }
}

struct Reader {
    units: Option<ExcellonUnits>,
    format: CoordinateFormat,
    tools: BTreeMap<u32, f64>,
    tool: Option<u32>,
    position: (f64, f64),
    hits: Vec<DrillHit>,
    warnings: Vec<String>,
}

impl Reader {
    const fn new() -> Self {
        Self {
            units: None,
            format: CoordinateFormat::INCH,
            tools: BTreeMap::new(),
            tool: None,
            position: (0.0, 0.0),
            hits: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn header_line(&mut self, line: &str) -> Result<(), ParseError> {
        if self.units_directive(line) {
            return Ok(());
        }
        if is_tool_line(line) {
            let fields = split_fields(line)?;
            if let Some((tool, diameter)) = tool_definition(&fields, line)? {
                self.define_tool(tool, diameter);
            }
        }
        Ok(())
    }

    fn body_line(&mut self, line: &str) -> Result<(), ParseError> {
        if self.units_directive(line)
            || IGNORED_COMMANDS.iter().any(|command| line.starts_with(command))
        {
            return Ok(());
        }
        match line.as_bytes().first() {
            Some(b'T') if is_tool_line(line) => {
                let fields = split_fields(line)?;
                match tool_definition(&fields, line)? {
                    Some((tool, diameter)) => self.define_tool(tool, diameter),
                    None => self.select_tool(&fields, line)?,
                }
            }
            Some(b'X' | b'Y') => {
                let fields = split_fields(line)?;
                self.hit(&fields, line)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Handles `INCH[,LZ|TZ][,00.0000]` and `METRIC[...]`.
    fn units_directive(&mut self, line: &str) -> bool {
        let (units, options) = if let Some(rest) = line.strip_prefix("METRIC") {
            (ExcellonUnits::Metric, rest)
        } else if let Some(rest) = line.strip_prefix("INCH") {
            (ExcellonUnits::Imperial, rest)
        } else {
            return false;
        };

        if self.units.is_some_and(|declared| declared != units) {
            self.warnings
                .push("units declared twice with different values; using the last".to_string());
        }
        self.units = Some(units);
        self.format = CoordinateFormat::for_units(units, self.format.zeros);

        for option in options.split(',').map(str::trim) {
            match option {
                "LZ" => self.format.zeros = Zeros::Leading,
                "TZ" => self.format.zeros = Zeros::Trailing,
                template => {
                    if let Some((whole, fraction)) = template.split_once('.') {
                        let zeros_only =
                            |part: &str| !part.is_empty() && part.bytes().all(|b| b == b'0');
                        if zeros_only(whole) && zeros_only(fraction) {
                            self.format.integer = whole.len();
                            self.format.decimal = fraction.len();
                        }
                    }
                }
            }
        }
        true
    }

    fn define_tool(&mut self, tool: u32, diameter: f64) {
        if diameter <= 0.0 {
            self.warnings
                .push(format!("T{tool} ignored: diameter {diameter} is not positive"));
        } else if self.tools.insert(tool, diameter).is_some() {
            self.warnings
                .push(format!("T{tool} defined twice; using the last diameter"));
        }
    }

    fn select_tool(&mut self, fields: &[(char, &str)], line: &str) -> Result<(), ParseError> {
        let Some(&('T', raw)) = fields.first() else {
            return Ok(());
        };
        if fields.len() > 1 {
            return Ok(());
        }
        let tool = integer(raw, line)?;
        self.tool = None;
        if tool != 0 {
            if self.tools.contains_key(&tool) {
                self.tool = Some(tool);
            } else {
                self.warnings.push(format!("T{tool} selected but never defined"));
            }
        }
        Ok(())
    }

    /// Places a hit; a missing axis keeps its previous value.
    fn hit(&mut self, fields: &[(char, &str)], line: &str) -> Result<(), ParseError> {
        let (mut x, mut y) = self.position;
        for &(letter, raw) in fields {
            match letter {
                'X' => x = self.format.decode(raw)?,
                'Y' => y = self.format.decode(raw)?,
                _ => {
                    return Err(ParseError::Syntax(format!(
                        "unexpected field {letter}{raw} in drill hit `{line}`"
                    )))
                }
            }
        }
        self.position = (x, y);

        match self.tool.and_then(|tool| Some((tool, *self.tools.get(&tool)?))) {
            Some((tool, diameter)) => self.hits.push(DrillHit {
                tool,
                x,
                y,
                diameter,
            }),
            None => self
                .warnings
                .push(format!("hit at ({x}, {y}) dropped: no tool selected")),
        }
        Ok(())
    }

    fn finish(self) -> DrillFile {
        DrillFile {
            hits: self.hits,
            tools: self
                .tools
                .into_iter()
                .map(|(number, diameter)| ToolDefinition { number, diameter })
                .collect(),
            units: self.units.unwrap_or(ExcellonUnits::Imperial),
            warnings: self.warnings,
        }
    }
}

/// Parses an Excellon drill file.
///
/// Coordinates stay in file units; [`DrillFile::holes`] converts them.
///
/// # Errors
///
/// [`ParseError::Empty`] for empty input and [`ParseError::Syntax`] for
/// invalid UTF-8 or malformed tool and coordinate fields.
pub fn parse(data: &[u8]) -> Result<DrillFile, ParseError> {
    if data.is_empty() {
        return Err(ParseError::Empty);
    }
    let text = std::str::from_utf8(data)
        .map_err(|err| ParseError::Syntax(format!("drill file is not UTF-8: {err}")))?;

    let mut reader = Reader::new();
    let mut in_header = false;
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with([';', '#']) {
            continue;
        }
        let line = line.to_ascii_uppercase();
        match line.as_str() {
            "M48" => in_header = true,
            "%" | "M95" => in_header = false,
            "M30" | "M00" => break,
            _ if in_header => reader.header_line(&line)?,
            _ => reader.body_line(&line)?,
        }
    }
    Ok(reader.finish())
}

fn is_tool_line(line: &str) -> bool {
    let mut bytes = line.bytes();
    bytes.next() == Some(b'T') && bytes.next().is_some_and(|byte| byte.is_ascii_digit())
}

/// Splits `T01F00S00C0.800` into `[('T', "01"), ('F', "00"), ...]`.
fn split_fields(line: &str) -> Result<Vec<(char, &str)>, ParseError> {
    let mut fields = Vec::new();
    let mut rest = line;
    while let Some(letter) = rest.chars().next() {
        if !letter.is_ascii_uppercase() {
            return Err(ParseError::Syntax(format!("unexpected `{letter}` in `{line}`")));
        }
        let tail = rest.get(1..).unwrap_or_default();
        let end = tail
            .find(|ch: char| !(ch.is_ascii_digit() || matches!(ch, '.' | '+' | '-')))
            .unwrap_or(tail.len());
        let (value, next) = tail.split_at(end);
        fields.push((letter, value));
        rest = next;
    }
    Ok(fields)
}

/// Reads `T<n>...C<diameter>`; `None` when the line carries no diameter.
fn tool_definition(
    fields: &[(char, &str)],
    line: &str,
) -> Result<Option<(u32, f64)>, ParseError> {
    let Some(&('T', tool)) = fields.first() else {
        return Ok(None);
    };
    let Some(&(_, diameter)) = fields.iter().find(|(letter, _)| *letter == 'C') else {
        return Ok(None);
    };
    if diameter.is_empty() {
        return Err(ParseError::Syntax(format!("tool definition without diameter `{line}`")));
    }
    Ok(Some((integer(tool, line)?, number(diameter, "tool diameter")?)))
}

fn integer(raw: &str, line: &str) -> Result<u32, ParseError> {
    raw.parse()
        .map_err(|_| ParseError::Syntax(format!("invalid tool number `{raw}` in `{line}`")))
}

fn number(raw: &str, what: &str) -> Result<f64, ParseError> {
    raw.parse()
        .map_err(|err| ParseError::Syntax(format!("invalid {what} `{raw}`: {err}")))
}
