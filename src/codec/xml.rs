//! XML and zip helpers for workbook package parts.

use crate::codec::CodecError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

/// XML reader wrapper with a reusable event buffer. Empty elements are
/// expanded so `<c/>` and `<c></c>` take the same code path, and strict
/// well-formedness checks are relaxed to accept what spreadsheet
/// producers actually emit.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    scratch: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(input: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(input);
        let config = reader.config_mut();
        config.expand_empty_elements = true;
        config.check_end_names = false;
        config.check_comments = false;
        config.trim_text(false);
        XmlReader {
            reader,
            scratch: Vec::with_capacity(1024),
        }
    }

    /// Reads the next XML event, mapping end-of-file to `None`.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, CodecError> {
        self.scratch.clear();
        match self.reader.read_event_into(&mut self.scratch) {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(error) => Err(CodecError::Xml(error)),
        }
    }
}

/// Attribute access on start tags.
pub(crate) trait XmlNodeExt<'a> {
    /// Gets the unescaped value of an attribute by name.
    fn attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, CodecError>;
}

impl<'a> XmlNodeExt<'a> for BytesStart<'a> {
    fn attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, CodecError> {
        self.try_get_attribute(name)?
            .map(|attribute: Attribute<'_>| Ok(attribute.unescape_value()?))
            .transpose()
    }
}

/// Builds text content from XML events, resolving character and entity
/// references.
pub(crate) trait XmlTextExt {
    fn push_text(&mut self, event: &BytesText) -> Result<(), CodecError>;

    fn push_reference(&mut self, event: &BytesRef) -> Result<(), CodecError>;
}

impl XmlTextExt for String {
    fn push_text(&mut self, event: &BytesText) -> Result<(), CodecError> {
        self.push_str(&event.xml_content()?);
        Ok(())
    }

    fn push_reference(&mut self, event: &BytesRef) -> Result<(), CodecError> {
        let raw = event.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = if let Some(hex) = number.strip_prefix('x') {
                u32::from_str_radix(hex, 16)?
            } else {
                number.parse::<u32>()?
            };
            if let Some(character) = std::char::from_u32(code) {
                self.push(character);
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(CodecError::UnknownEntity(raw.to_string()))?;
        }

        Ok(())
    }
}

/// Part access on workbook archives: case-insensitive names, backslash
/// separators tolerated.
pub(crate) trait ArchiveExt<RS: Read + Seek> {
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, CodecError>;

    fn xml_part(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, CodecError>;
}

impl<RS: Read + Seek> ArchiveExt<RS> for ZipArchive<RS> {
    fn part(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, CodecError> {
        let wanted = name.replace('\\', "/");
        let entry = self
            .file_names()
            .find(|candidate| wanted.eq_ignore_ascii_case(candidate))
            .map(str::to_owned);
        match entry.map(|candidate| self.by_name(&candidate)).transpose() {
            Ok(Some(file)) => Ok(Some(file)),
            Ok(None) | Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_part(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, CodecError> {
        let reader = self
            .part(name)?
            .map(|file| XmlReader::new(BufReader::new(file)));
        Ok(reader)
    }
}

#[macro_export]
macro_rules! xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}
