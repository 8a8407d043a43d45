//! Encoding raw sheet data into a deterministic workbook package.

use crate::codec::reference::index_to_reference;
use crate::codec::CodecError;
use crate::codec::RawCell;
use crate::codec::RawCellKind;
use crate::codec::RawSheet;
use log::debug;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Writer;
use std::io::Cursor;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_DOCUMENT_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PACKAGE_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const TYPE_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const TYPE_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const CONTENT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CONTENT_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CONTENT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

/// Encodes `(sheet name, raw sheet)` pairs into a workbook package.
///
/// The output is deterministic: fixed part order, fixed compression, and
/// text written as inline strings, so equal input always yields equal
/// bytes and decoding restores exactly the encoded data.
///
/// # Arguments
/// * `sheets` - Sheets to write, in workbook order
///
/// # Returns
/// The complete workbook package
pub fn encode(sheets: &[(String, RawSheet)]) -> Result<Vec<u8>, CodecError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    // Entry timestamps are fixed, not wall clock
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(&content_types_part(sheets.len())?)?;
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(&package_relationships_part()?)?;
    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(&workbook_part(sheets)?)?;
    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(&workbook_relationships_part(sheets.len())?)?;
    for (index, (name, sheet)) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options)?;
        zip.write_all(&sheet_part(sheet)?)?;
        debug!(
            "encoded sheet '{}': {} columns, {} rows",
            name,
            sheet.columns.len(),
            sheet.rows.len()
        );
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Creates an XML writer primed with the document declaration.
fn xml_writer() -> Result<Writer<Vec<u8>>, CodecError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(writer)
}

fn content_types_part(sheet_count: usize) -> Result<Vec<u8>, CodecError> {
    let mut writer = xml_writer()?;
    let mut root = BytesStart::new("Types");
    root.push_attribute(("xmlns", NS_CONTENT_TYPES));
    writer.write_event(Event::Start(root))?;

    let mut default = BytesStart::new("Default");
    default.push_attribute(("Extension", "rels"));
    default.push_attribute(("ContentType", CONTENT_RELATIONSHIPS));
    writer.write_event(Event::Empty(default))?;

    let mut workbook = BytesStart::new("Override");
    workbook.push_attribute(("PartName", "/xl/workbook.xml"));
    workbook.push_attribute(("ContentType", CONTENT_WORKBOOK));
    writer.write_event(Event::Empty(workbook))?;

    for index in 0..sheet_count {
        let mut sheet = BytesStart::new("Override");
        let part_name = format!("/xl/worksheets/sheet{}.xml", index + 1);
        sheet.push_attribute(("PartName", part_name.as_str()));
        sheet.push_attribute(("ContentType", CONTENT_WORKSHEET));
        writer.write_event(Event::Empty(sheet))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Types")))?;
    Ok(writer.into_inner())
}

fn package_relationships_part() -> Result<Vec<u8>, CodecError> {
    let mut writer = xml_writer()?;
    let mut root = BytesStart::new("Relationships");
    root.push_attribute(("xmlns", NS_PACKAGE_RELATIONSHIPS));
    writer.write_event(Event::Start(root))?;

    let mut relationship = BytesStart::new("Relationship");
    relationship.push_attribute(("Id", "rId1"));
    relationship.push_attribute(("Type", TYPE_OFFICE_DOCUMENT));
    relationship.push_attribute(("Target", "xl/workbook.xml"));
    writer.write_event(Event::Empty(relationship))?;

    writer.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(writer.into_inner())
}

fn workbook_part(sheets: &[(String, RawSheet)]) -> Result<Vec<u8>, CodecError> {
    let mut writer = xml_writer()?;
    let mut root = BytesStart::new("workbook");
    root.push_attribute(("xmlns", NS_MAIN));
    root.push_attribute(("xmlns:r", NS_DOCUMENT_RELATIONSHIPS));
    writer.write_event(Event::Start(root))?;
    writer.write_event(Event::Start(BytesStart::new("sheets")))?;

    for (index, (name, _)) in sheets.iter().enumerate() {
        let mut sheet = BytesStart::new("sheet");
        sheet.push_attribute(("name", name.as_str()));
        let sheet_id = (index + 1).to_string();
        sheet.push_attribute(("sheetId", sheet_id.as_str()));
        let relationship_id = format!("rId{}", index + 1);
        sheet.push_attribute(("r:id", relationship_id.as_str()));
        writer.write_event(Event::Empty(sheet))?;
    }

    writer.write_event(Event::End(BytesEnd::new("sheets")))?;
    writer.write_event(Event::End(BytesEnd::new("workbook")))?;
    Ok(writer.into_inner())
}

fn workbook_relationships_part(sheet_count: usize) -> Result<Vec<u8>, CodecError> {
    let mut writer = xml_writer()?;
    let mut root = BytesStart::new("Relationships");
    root.push_attribute(("xmlns", NS_PACKAGE_RELATIONSHIPS));
    writer.write_event(Event::Start(root))?;

    for index in 0..sheet_count {
        let mut relationship = BytesStart::new("Relationship");
        let id = format!("rId{}", index + 1);
        relationship.push_attribute(("Id", id.as_str()));
        relationship.push_attribute(("Type", TYPE_WORKSHEET));
        let target = format!("worksheets/sheet{}.xml", index + 1);
        relationship.push_attribute(("Target", target.as_str()));
        writer.write_event(Event::Empty(relationship))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(writer.into_inner())
}

fn sheet_part(sheet: &RawSheet) -> Result<Vec<u8>, CodecError> {
    let mut writer = xml_writer()?;
    let mut root = BytesStart::new("worksheet");
    root.push_attribute(("xmlns", NS_MAIN));
    writer.write_event(Event::Start(root))?;
    writer.write_event(Event::Start(BytesStart::new("sheetData")))?;

    let header: Vec<RawCell> = sheet.columns.iter().map(|name| RawCell::text(name)).collect();
    write_row(&mut writer, 0, &header)?;
    for (index, cells) in sheet.rows.iter().enumerate() {
        write_row(&mut writer, index + 1, cells)?;
    }

    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
    writer.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(writer.into_inner())
}

fn write_row(writer: &mut Writer<Vec<u8>>, row: usize, cells: &[RawCell]) -> Result<(), CodecError> {
    let mut element = BytesStart::new("row");
    let reference = (row + 1).to_string();
    element.push_attribute(("r", reference.as_str()));
    writer.write_event(Event::Start(element))?;
    for (col, cell) in cells.iter().enumerate() {
        write_cell(writer, row, col, cell)?;
    }
    writer.write_event(Event::End(BytesEnd::new("row")))?;
    Ok(())
}

/// Writes one cell; empty cells are omitted and restored by position when
/// the package is decoded.
fn write_cell(
    writer: &mut Writer<Vec<u8>>,
    row: usize,
    col: usize,
    cell: &RawCell,
) -> Result<(), CodecError> {
    if cell.is_empty() {
        return Ok(());
    }
    let mut element = BytesStart::new("c");
    let reference = index_to_reference(row, col);
    element.push_attribute(("r", reference.as_str()));
    match cell.kind {
        RawCellKind::Empty => return Ok(()),
        RawCellKind::Text => {
            element.push_attribute(("t", "inlineStr"));
            writer.write_event(Event::Start(element))?;
            writer.write_event(Event::Start(BytesStart::new("is")))?;
            writer.write_event(Event::Start(BytesStart::new("t")))?;
            writer.write_event(Event::Text(BytesText::new(&cell.value)))?;
            writer.write_event(Event::End(BytesEnd::new("t")))?;
            writer.write_event(Event::End(BytesEnd::new("is")))?;
        }
        RawCellKind::Number => {
            writer.write_event(Event::Start(element))?;
            write_value(writer, &cell.value)?;
        }
        RawCellKind::Date => {
            element.push_attribute(("t", "d"));
            writer.write_event(Event::Start(element))?;
            write_value(writer, &cell.value)?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

fn write_value(writer: &mut Writer<Vec<u8>>, value: &str) -> Result<(), CodecError> {
    writer.write_event(Event::Start(BytesStart::new("v")))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new("v")))?;
    Ok(())
}
