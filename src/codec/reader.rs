//! Decoding workbook packages into raw sheet data.

use crate::codec::reference::reference_to_index;
use crate::codec::xml::ArchiveExt;
use crate::codec::xml::XmlNodeExt;
use crate::codec::xml::XmlReader;
use crate::codec::xml::XmlTextExt;
use crate::codec::CodecError;
use crate::codec::RawCell;
use crate::codec::RawCellKind;
use crate::codec::RawSheet;
use crate::xml_events;
use log::debug;
use log::warn;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::ZipArchive;

// XML tag names of the package parts the reader visits
const TAG_RELATIONSHIP: &[u8] = b"Relationship"; // Worksheet relationship entry
const TAG_SHEET: QName = QName(b"sheet");        // Worksheet definition
const TAG_SHARED_STRING_ITEM: QName = QName(b"si"); // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");  // Phonetic annotation inside strings
const TAG_TEXT: QName = QName(b"t");             // Text content within strings
const TAG_ROW: QName = QName(b"row");            // Row in worksheet
const TAG_CELL: QName = QName(b"c");             // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");   // Inline string value
const TAG_VALUE: QName = QName(b"v");            // Cell value content

/// Decodes a workbook package into `(sheet name, raw sheet)` pairs in
/// workbook order.
///
/// The package must carry the workbook part and its relationships; sheets
/// whose relationship target is absent fail with `MissingPart`. A workbook
/// that declares no sheets decodes to an empty list; rejecting that is the
/// caller's policy, not the codec's.
///
/// # Arguments
/// * `bytes` - The full workbook package
///
/// # Returns
/// One `(sheet name, raw sheet)` entry per declared worksheet
pub fn decode(bytes: &[u8]) -> Result<Vec<(String, RawSheet)>, CodecError> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))?;
    let relationships = load_relationships(&mut zip)?;
    let catalog = load_sheet_catalog(&mut zip, &relationships)?;
    let shared_strings = load_shared_strings(&mut zip)?;

    let mut sheets = Vec::with_capacity(catalog.len());
    for (name, path) in catalog {
        let cells = read_sheet_cells(&mut zip, &path, &shared_strings)?;
        let sheet = assemble_sheet(&name, cells);
        debug!(
            "decoded sheet '{}': {} columns, {} rows",
            name,
            sheet.columns.len(),
            sheet.rows.len()
        );
        sheets.push((name, sheet));
    }
    Ok(sheets)
}

/// Loads the workbook relationship map (relationship id to part path).
fn load_relationships<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
) -> Result<HashMap<String, String>, CodecError> {
    let mut reader = zip
        .xml_part("xl/_rels/workbook.xml.rels")?
        .ok_or_else(|| CodecError::MissingPart("xl/_rels/workbook.xml.rels".to_owned()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.attribute_value("Id")?;
            let target = event.attribute_value("Target")?;
            if let Some((id, target)) = id.zip(target) {
                relationships.insert(id.to_string(), to_part_path(target));
            }
        }
    });
    Ok(relationships)
}

/// Reads the workbook part and resolves each sheet to its part path,
/// preserving workbook order.
fn load_sheet_catalog<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    relationships: &HashMap<String, String>,
) -> Result<Vec<(String, String)>, CodecError> {
    let mut reader = zip
        .xml_part("xl/workbook.xml")?
        .ok_or_else(|| CodecError::MissingPart("xl/workbook.xml".to_owned()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<'_, str>>;
            let mut id = None::<Cow<'_, str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.unescape_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.unescape_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
    });
    Ok(sheets)
}

/// Loads the shared string table; packages without one yield an empty table.
fn load_shared_strings<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
) -> Result<Vec<String>, CodecError> {
    let mut strings = Vec::<String>::new();
    let mut reader = match zip.xml_part("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(strings),
    };
    xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            let string = read_text(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
            strings.push(string);
        }
    });
    Ok(strings)
}

/// Kind tag of the cell currently being read, from the `t` attribute.
enum CellTag {
    Skip,
    Number,
    Date,
    Bool,
    Inline,
    Shared,
}

/// Streams one worksheet part into positioned cells. Explicit `r`
/// references win; row/cell counters fill in when they are absent.
fn read_sheet_cells<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    path: &str,
    shared_strings: &[String],
) -> Result<Vec<(usize, usize, RawCell)>, CodecError> {
    let mut reader = zip
        .xml_part(path)?
        .ok_or_else(|| CodecError::MissingPart(path.to_owned()))?;

    let mut cells = Vec::<(usize, usize, RawCell)>::new();
    let mut row_count = 0usize;
    let mut col_count = 0usize;
    let mut row = 0usize;
    let mut col = 0usize;
    let mut tag = CellTag::Skip;
    let mut value = String::new();
    xml_events!(reader => {
        Event::End(event) if event.name() == TAG_ROW => {
            row_count += 1;
            col_count = 0;
        }
        Event::Start(event) if event.name() == TAG_CELL => {
            (row, col) = event.attribute_value("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((row_count, col_count));
            col_count += 1;
            tag = match event.attribute_value("t")?.as_deref() {
                Some("inlineStr") | Some("str") => CellTag::Inline,
                Some("s") => CellTag::Shared,
                Some("b") => CellTag::Bool,
                Some("d") => CellTag::Date,
                Some("e") => CellTag::Skip,
                _ => CellTag::Number,
            };
        }
        Event::Start(event) if event.name() == TAG_INLINE_STRING => {
            value = read_text(&mut reader, TAG_INLINE_STRING, false)?;
        }
        Event::Start(event) if event.name() == TAG_VALUE => {
            value = read_text(&mut reader, TAG_VALUE, true)?;
        }
        Event::End(event) if event.name() == TAG_CELL => {
            if !value.is_empty() {
                let cell = finish_cell(&tag, &value, shared_strings)?;
                if !cell.is_empty() {
                    cells.push((row, col, cell));
                }
                value.clear();
            }
        }
    });
    Ok(cells)
}

/// Builds a raw cell from the accumulated tag and payload.
fn finish_cell(
    tag: &CellTag,
    value: &str,
    shared_strings: &[String],
) -> Result<RawCell, CodecError> {
    Ok(match tag {
        CellTag::Skip => RawCell::empty(),
        CellTag::Inline => RawCell::text(value),
        CellTag::Shared => {
            let index = value.trim().parse::<usize>()?;
            match shared_strings.get(index) {
                Some(string) => RawCell::text(string),
                None => RawCell::empty(),
            }
        }
        CellTag::Bool => {
            RawCell::text(if value == "1" || value.eq_ignore_ascii_case("true") {
                "true"
            } else {
                "false"
            })
        }
        CellTag::Date => RawCell {
            kind: RawCellKind::Date,
            value: value.to_owned(),
        },
        CellTag::Number => RawCell {
            kind: RawCellKind::Number,
            value: value.to_owned(),
        },
    })
}

/// Assembles positioned cells into header plus aligned data rows.
///
/// The first occupied row is the header; gaps in it get generated names.
/// Rows with no occupied cells are dropped, and cells to the right of the
/// header are dropped with a warning.
fn assemble_sheet(name: &str, mut cells: Vec<(usize, usize, RawCell)>) -> RawSheet {
    let Some(col_lower) = cells.iter().map(|(_, col, _)| *col).min() else {
        return RawSheet::default();
    };
    let header_row = cells
        .iter()
        .map(|(row, _, _)| *row)
        .min()
        .unwrap_or_default();
    // Deterministic assembly regardless of part order
    cells.sort_by_key(|(row, col, _)| (*row, *col));

    let width = cells
        .iter()
        .filter(|(row, _, _)| *row == header_row)
        .map(|(_, col, _)| col - col_lower + 1)
        .max()
        .unwrap_or_default();
    let mut columns = vec![String::new(); width];
    let mut rows = Vec::<Vec<RawCell>>::new();
    let mut current_row = None::<usize>;
    for (row, col, cell) in cells {
        let offset = col - col_lower;
        if row == header_row {
            columns[offset] = cell.value;
            continue;
        }
        if offset >= width {
            warn!(
                "sheet '{}': cell at row {} column {} is outside the header, dropped",
                name,
                row + 1,
                col + 1
            );
            continue;
        }
        if current_row != Some(row) {
            rows.push(vec![RawCell::empty(); width]);
            current_row = Some(row);
        }
        if let Some(last) = rows.last_mut() {
            last[offset] = cell;
        }
    }
    for (index, column) in columns.iter_mut().enumerate() {
        if column.is_empty() {
            *column = format!("column{}", index + 1);
        }
    }
    RawSheet { columns, rows }
}

/// Normalizes a relationship target into a package part path.
fn to_part_path(path: Cow<'_, str>) -> String {
    if let Some(absolute) = path.strip_prefix('/') {
        absolute.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Reads string content up to `end_tag`, skipping phonetic annotations.
/// With `bare` set the payload is text from the start rather than wrapped
/// in `<t>` elements.
fn read_text<RS: Read + Seek>(
    reader: &mut XmlReader<BufReader<ZipFile<'_, RS>>>,
    end_tag: QName,
    bare: bool,
) -> Result<String, CodecError> {
    let mut is_phonetic = false;
    let mut is_text = bare;
    let mut text = String::new();
    xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic = false,
        Event::Start(event) if !is_phonetic && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_reference(&event)?,
    });
    Ok(text)
}
