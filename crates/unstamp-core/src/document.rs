//! In-memory PDF under edit.
//!
//! Thin wrapper over `lopdf::Document`: page enumeration, content-stream
//! access with mandatory `Length` recomputation, XObject resource handling
//! and Info dictionary writes. lopdf keeps all objects in a table keyed by
//! `ObjectId`, so pages hold references rather than graph pointers and
//! serialization order stays deterministic.

use chrono::{DateTime, FixedOffset};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

use crate::error::UnstampError;
use crate::metadata::pdf_date;

/// A parsed, decompressed PDF.
pub struct PdfFile {
    doc: Document,
}

/// One page, in reading order. `number` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRef {
    pub number: u32,
    pub id: ObjectId,
}

fn malformed(err: lopdf::Error) -> UnstampError {
    UnstampError::Malformed(err.to_string())
}

/// Content streams are edited as Latin-1 text: every byte maps to the char
/// of the same code point, so the round trip is lossless.
pub(crate) fn latin1_str(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

pub(crate) fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars().map(|c| c as u8).collect()
}

/// Encodes a text string the way PDF readers expect: plain literal for
/// ASCII, UTF-16BE with BOM otherwise.
pub(crate) fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        Object::string_literal(value)
    } else {
        let mut bytes = vec![0xfe, 0xff];
        for unit in value.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Literal)
    }
}

impl PdfFile {
    pub fn parse(bytes: &[u8]) -> Result<Self, UnstampError> {
        let doc = Document::load_mem(bytes).map_err(malformed)?;
        Ok(PdfFile { doc })
    }

    pub fn pages(&self) -> Vec<PageRef> {
        self.doc
            .get_pages()
            .into_iter()
            .map(|(number, id)| PageRef { number, id })
            .collect()
    }

    fn content_stream_id(&self, page: PageRef) -> Result<ObjectId, UnstampError> {
        let dict = self.doc.get_dictionary(page.id).map_err(malformed)?;
        match dict.get(b"Contents") {
            Ok(Object::Reference(id)) => Ok(*id),
            Ok(Object::Array(_)) => Err(UnstampError::Malformed(format!(
                "page {}: multi-part Contents are not supported",
                page.number
            ))),
            _ => Err(UnstampError::Malformed(format!(
                "page {} has no Contents stream",
                page.number
            ))),
        }
    }

    /// The page's content stream as Latin-1 text. The stream must already
    /// be decompressed by the codec; a remaining filter is an error.
    pub fn page_content(&self, page: PageRef) -> Result<String, UnstampError> {
        let id = self.content_stream_id(page)?;
        match self.doc.get_object(id).map_err(malformed)? {
            Object::Stream(stream) => {
                if stream.dict.has(b"Filter") {
                    return Err(UnstampError::Malformed(format!(
                        "page {}: content stream is still filtered",
                        page.number
                    )));
                }
                Ok(latin1_str(&stream.content))
            }
            _ => Err(UnstampError::Malformed(format!(
                "page {}: Contents does not point at a stream",
                page.number
            ))),
        }
    }

    /// Replaces the page's content stream. `Length` must match the stored
    /// bytes exactly or the file is unreadable, so it is recomputed here on
    /// every mutation.
    pub fn set_page_content(&mut self, page: PageRef, text: &str) -> Result<(), UnstampError> {
        let id = self.content_stream_id(page)?;
        match self.doc.get_object_mut(id).map_err(malformed)? {
            Object::Stream(stream) => {
                let bytes = latin1_bytes(text);
                stream.dict.set("Length", bytes.len() as i64);
                stream.content = bytes;
                Ok(())
            }
            _ => Err(UnstampError::Malformed(format!(
                "page {}: Contents does not point at a stream",
                page.number
            ))),
        }
    }

    fn resolved<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    /// Names and attribute dictionaries of the page's XObjects, in
    /// resource-dictionary order. The dictionary is `None` when the entry
    /// cannot be resolved.
    pub fn xobjects(&self, page: PageRef) -> Result<Vec<(String, Option<Dictionary>)>, UnstampError> {
        let page_dict = self.doc.get_dictionary(page.id).map_err(malformed)?;
        let Ok(resources) = page_dict.get(b"Resources") else {
            return Ok(Vec::new());
        };
        let Some(resources) = self.resolved(resources).and_then(|o| o.as_dict().ok()) else {
            return Ok(Vec::new());
        };
        let Ok(xobjects) = resources.get(b"XObject") else {
            return Ok(Vec::new());
        };
        let Some(xobjects) = self.resolved(xobjects).and_then(|o| o.as_dict().ok()) else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for (name, value) in xobjects.iter() {
            let dict = self.resolved(value).and_then(|o| match o {
                Object::Stream(stream) => Some(stream.dict.clone()),
                Object::Dictionary(dict) => Some(dict.clone()),
                _ => None,
            });
            entries.push((latin1_str(name), dict));
        }
        Ok(entries)
    }

    /// Drops the named XObject from the page's resource dictionary,
    /// whether Resources and XObject are inline or behind references.
    /// Returns `false` when the entry was not present.
    pub fn remove_xobject(&mut self, page: PageRef, name: &str) -> Result<bool, UnstampError> {
        enum Holder {
            XObject(ObjectId),
            Resources(ObjectId),
            Page,
        }

        let holder = {
            let page_dict = self.doc.get_dictionary(page.id).map_err(malformed)?;
            match page_dict.get(b"Resources") {
                Ok(Object::Reference(rid)) => {
                    let resources = self.doc.get_dictionary(*rid).map_err(malformed)?;
                    match resources.get(b"XObject") {
                        Ok(Object::Reference(xid)) => Holder::XObject(*xid),
                        _ => Holder::Resources(*rid),
                    }
                }
                Ok(Object::Dictionary(resources)) => match resources.get(b"XObject") {
                    Ok(Object::Reference(xid)) => Holder::XObject(*xid),
                    _ => Holder::Page,
                },
                _ => return Ok(false),
            }
        };

        fn remove_inline(resources: &mut Dictionary, name: &[u8]) -> bool {
            match resources.get_mut(b"XObject") {
                Ok(Object::Dictionary(xobjects)) => xobjects.remove(name).is_some(),
                _ => false,
            }
        }

        let name = latin1_bytes(name);
        let removed = match holder {
            Holder::XObject(id) => match self.doc.get_object_mut(id).map_err(malformed)? {
                Object::Dictionary(dict) => dict.remove(&name).is_some(),
                _ => false,
            },
            Holder::Resources(id) => match self.doc.get_object_mut(id).map_err(malformed)? {
                Object::Dictionary(dict) => remove_inline(dict, &name),
                _ => false,
            },
            Holder::Page => match self.doc.get_object_mut(page.id).map_err(malformed)? {
                Object::Dictionary(dict) => match dict.get_mut(b"Resources") {
                    Ok(Object::Dictionary(resources)) => remove_inline(resources, &name),
                    _ => false,
                },
                _ => false,
            },
        };
        Ok(removed)
    }

    fn info_dict_mut(&mut self) -> Result<&mut Dictionary, UnstampError> {
        let existing = match self.doc.trailer.get(b"Info") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };
        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.doc.add_object(Dictionary::new());
                self.doc.trailer.set("Info", Object::Reference(id));
                id
            }
        };
        match self.doc.get_object_mut(id).map_err(malformed)? {
            Object::Dictionary(dict) => Ok(dict),
            _ => Err(UnstampError::Malformed("Info is not a dictionary".into())),
        }
    }

    pub fn set_info(&mut self, key: &str, value: Object) -> Result<(), UnstampError> {
        self.info_dict_mut()?.set(key, value);
        Ok(())
    }

    pub fn set_info_date(
        &mut self,
        key: &str,
        value: &DateTime<FixedOffset>,
    ) -> Result<(), UnstampError> {
        let date = pdf_date(value);
        self.set_info(key, Object::String(date.into_bytes(), StringFormat::Literal))
    }

    /// Drops the catalog's XMP metadata reference so readers fall back to
    /// the Info dictionary.
    pub fn clear_metadata_reference(&mut self) -> Result<(), UnstampError> {
        let root_id = self
            .doc
            .trailer
            .get(b"Root")
            .and_then(|o| o.as_reference())
            .map_err(malformed)?;
        match self.doc.get_object_mut(root_id).map_err(malformed)? {
            Object::Dictionary(dict) => {
                dict.remove(b"Metadata");
                Ok(())
            }
            _ => Err(UnstampError::Malformed("catalog is not a dictionary".into())),
        }
    }

    pub fn save(&mut self) -> Result<Vec<u8>, UnstampError> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| UnstampError::Malformed(format!("save failed: {e}")))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_latin1_round_trip() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(latin1_bytes(&latin1_str(&bytes)), bytes);
    }

    #[test]
    fn test_ascii_text_string_is_literal() {
        match text_string("OffeneGesetze.de") {
            Object::String(bytes, StringFormat::Literal) => {
                assert_eq!(bytes, b"OffeneGesetze.de".to_vec());
            }
            other => panic!("unexpected object: {other:?}"),
        }
    }

    #[test]
    fn test_non_ascii_text_string_is_utf16be_with_bom() {
        match text_string("§5") {
            Object::String(bytes, StringFormat::Literal) => {
                assert_eq!(bytes, vec![0xfe, 0xff, 0x00, 0xa7, 0x00, 0x35]);
            }
            other => panic!("unexpected object: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            PdfFile::parse(b"not a pdf"),
            Err(UnstampError::Malformed(_))
        ));
    }
}
