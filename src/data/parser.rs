//! Parser for the acronym server's XML responses
//!
//! The server answers with a document of the form:
//!
//! ```xml
//! <acronym>
//!   <found n="1">
//!     <acro nym="FAQ" dewey="000" added="Wed Jan 01 00:00:00 GMT 1992">
//!       <expan>Frequently Asked Questions</expan>
//!       <comment>optional</comment>
//!     </acro>
//!   </found>
//! </acronym>
//! ```
//!
//! Parsing is a single forward pass over pull events; only the item being
//! read is held in memory besides the output list.

use std::io::BufRead;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use quick_xml::events::{attributes::AttrError, BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

use super::AcronymRecord;

const ITEM_ELEMENT: &[u8] = b"acro";
const EXPANSION_ELEMENT: &[u8] = b"expan";
const COMMENT_ELEMENT: &[u8] = b"comment";
const NAME_ATTRIBUTE: &[u8] = b"nym";
const DEWEY_ATTRIBUTE: &[u8] = b"dewey";
const ADDED_ATTRIBUTE: &[u8] = b"added";

/// Errors for documents that are not well-formed
#[derive(Debug, Error)]
pub enum ParseError {
    /// The XML reader rejected the input
    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An attribute could not be read
    #[error("Malformed XML attribute: {0}")]
    Attribute(#[from] AttrError),

    /// The input ended inside an element
    #[error("Document ended with {0} unclosed element(s)")]
    Unterminated(usize),

    /// The input contained no element at all
    #[error("Document has no root element")]
    NoRoot,
}

/// Fields collected for the item currently being read
#[derive(Debug, Default)]
struct PendingItem {
    name: Option<String>,
    classification_code: Option<String>,
    added_at: Option<DateTime<Utc>>,
    expansion: Option<String>,
    comment: Option<String>,
}

impl PendingItem {
    /// Reads the attributes that are only available on the start tag
    fn from_start(start: &BytesStart<'_>) -> Result<Self, ParseError> {
        let mut item = PendingItem::default();
        for attr in start.attributes() {
            let attr = attr?;
            let value = attr
                .unescape_value()
                .map_err(quick_xml::Error::from)?
                .trim()
                .to_string();
            match attr.key.as_ref() {
                NAME_ATTRIBUTE => item.name = Some(value),
                DEWEY_ATTRIBUTE => item.classification_code = non_empty(value),
                ADDED_ATTRIBUTE => item.added_at = parse_added(&value),
                _ => {}
            }
        }
        Ok(item)
    }

    /// Builds the record, or `None` when a required field is missing
    fn finish(self) -> Option<AcronymRecord> {
        let name = self.name.filter(|n| !n.is_empty())?;
        let expansion = self.expansion.filter(|e| !e.is_empty())?;
        Some(
            AcronymRecord::new(name, expansion)
                .with_comment(self.comment)
                .with_classification_code(self.classification_code)
                .with_added_at(self.added_at),
        )
    }
}

/// Parses a server response into acronym records
///
/// Items missing a name or an expansion are skipped; only a document that is
/// not well-formed makes the whole parse fail.
pub fn parse<R: BufRead>(input: R) -> Result<Vec<AcronymRecord>, ParseError> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut records = Vec::new();
    let mut current: Option<PendingItem> = None;
    let mut text = String::new();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut dropped = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => {
                depth += 1;
                seen_root = true;
                text.clear();
                if start.name().as_ref() == ITEM_ELEMENT {
                    current = Some(PendingItem::from_start(&start)?);
                }
            }
            Event::Empty(empty) => {
                seen_root = true;
                text.clear();
                // A self-closing item has no expansion; still validate its attributes
                if empty.name().as_ref() == ITEM_ELEMENT {
                    PendingItem::from_start(&empty)?;
                    dropped += 1;
                }
            }
            Event::Text(t) => {
                text = t.unescape().map_err(quick_xml::Error::from)?.trim().to_string();
            }
            Event::CData(c) => {
                text = reader
                    .decoder()
                    .decode(&c)
                    .map_err(quick_xml::Error::from)?
                    .trim()
                    .to_string();
            }
            Event::End(end) => {
                depth = depth.saturating_sub(1);
                match end.name().as_ref() {
                    EXPANSION_ELEMENT => {
                        if let Some(item) = current.as_mut() {
                            item.expansion = Some(std::mem::take(&mut text));
                        }
                    }
                    COMMENT_ELEMENT => {
                        if let Some(item) = current.as_mut() {
                            item.comment = non_empty(std::mem::take(&mut text));
                        }
                    }
                    ITEM_ELEMENT => {
                        if let Some(item) = current.take() {
                            match item.finish() {
                                Some(record) => records.push(record),
                                None => dropped += 1,
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if depth > 0 {
        return Err(ParseError::Unterminated(depth));
    }
    if !seen_root {
        return Err(ParseError::NoRoot);
    }
    if dropped > 0 {
        debug!("Skipped {} incomplete item(s)", dropped);
    }

    Ok(records)
}

/// Parses the server's `added` attribute
///
/// The format is `"Wed Jan 01 00:00:00 GMT 1992"` (English names). Returns
/// `None` when the value does not match or the zone is unknown.
pub fn parse_added(value: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    let [weekday, month, day, time, zone, year] = parts.as_slice() else {
        return None;
    };

    let offset = zone_offset(zone)?;
    let without_zone = format!("{} {} {} {} {}", weekday, month, day, time, year);
    let naive = NaiveDateTime::parse_from_str(&without_zone, "%a %b %d %H:%M:%S %Y").ok()?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Maps a time zone abbreviation to its UTC offset
fn zone_offset(zone: &str) -> Option<FixedOffset> {
    let minutes = match zone {
        "GMT" | "UT" | "UTC" | "Z" | "WET" => 0,
        "BST" | "CET" | "WEST" => 60,
        "CEST" | "EET" => 120,
        "EEST" => 180,
        "IST" => 330,
        "EST" => -300,
        "EDT" | "AST" => -240,
        "CST" => -360,
        "CDT" => -300,
        "MST" => -420,
        "MDT" => -360,
        "PST" => -480,
        "PDT" => -420,
        _ => return None,
    };
    FixedOffset::east_opt(minutes * 60)
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse_str(xml: &str) -> Result<Vec<AcronymRecord>, ParseError> {
        parse(xml.as_bytes())
    }

    #[test]
    fn test_parse_single_item() {
        let xml = r#"<acronym><found n="1"><acro nym="FAQ" dewey="000" added="Wed Jan 01 00:00:00 GMT 1992"><expan>Frequently Asked Questions</expan></acro></found></acronym>"#;

        let records = parse_str(xml).expect("Should parse");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "FAQ");
        assert_eq!(record.expansion, "Frequently Asked Questions");
        assert!(record.comment.is_none());
        assert_eq!(record.classification_code.as_deref(), Some("000"));
        assert_eq!(
            record.added_at,
            Some(Utc.with_ymd_and_hms(1992, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_multiple_items_with_comment() {
        let xml = r#"<?xml version="1.0"?>
            <acronym>
              <found n="2">
                <acro nym="RTFM" dewey="004">
                  <expan>Read The Fine Manual</expan>
                  <comment>  polite version  </comment>
                </acro>
                <acro nym="RTFM">
                  <expan>Read The Flipping Manual</expan>
                </acro>
              </found>
            </acronym>"#;

        let records = parse_str(xml).expect("Should parse");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].expansion, "Read The Fine Manual");
        assert_eq!(records[0].comment.as_deref(), Some("polite version"));
        assert_eq!(records[1].expansion, "Read The Flipping Manual");
        assert!(records[1].comment.is_none());
        assert!(records[1].classification_code.is_none());
    }

    #[test]
    fn test_item_missing_expansion_is_dropped() {
        let xml = r#"<acronym>
              <acro nym="BAD"><comment>no expansion here</comment></acro>
              <acro nym="OK"><expan>Still parsed</expan></acro>
            </acronym>"#;

        let records = parse_str(xml).expect("Should parse");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "OK");
        assert_eq!(records[0].expansion, "Still parsed");
    }

    #[test]
    fn test_item_missing_name_is_dropped() {
        let xml = r#"<acronym><acro><expan>Nameless</expan></acro></acronym>"#;
        let records = parse_str(xml).expect("Should parse");
        assert!(records.is_empty());
    }

    #[test]
    fn test_empty_expansion_does_not_inherit_previous_text() {
        let xml = r#"<acronym>
              <acro nym="A"><expan>First</expan></acro>
              <acro nym="B"><expan></expan></acro>
              <acro nym="C"><expan/></acro>
            </acronym>"#;

        let records = parse_str(xml).expect("Should parse");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "A");
    }

    #[test]
    fn test_no_results_document() {
        let xml = r#"<acronym><found n="0"/></acronym>"#;
        let records = parse_str(xml).expect("Should parse");
        assert!(records.is_empty());
    }

    #[test]
    fn test_entities_and_cdata_are_decoded() {
        let xml = r#"<acronym>
              <acro nym="AT&amp;T"><expan>American Telephone &amp; Telegraph</expan></acro>
              <acro nym="CD"><expan><![CDATA[Compact <Disc>]]></expan></acro>
            </acronym>"#;

        let records = parse_str(xml).expect("Should parse");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "AT&T");
        assert_eq!(records[0].expansion, "American Telephone & Telegraph");
        assert_eq!(records[1].expansion, "Compact <Disc>");
    }

    #[test]
    fn test_mismatched_tags_fail() {
        let xml = r#"<acronym><acro nym="X"><expan>Oops</acro></acronym>"#;
        assert!(parse_str(xml).is_err());
    }

    #[test]
    fn test_truncated_document_fails() {
        let xml = r#"<acronym><acro nym="X"><expan>Cut off"#;
        let result = parse_str(xml);
        assert!(matches!(result, Err(ParseError::Unterminated(_))), "{:?}", result);
    }

    #[test]
    fn test_plain_text_fails() {
        let result = parse_str("Service temporarily unavailable");
        assert!(matches!(result, Err(ParseError::NoRoot)), "{:?}", result);
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(parse_str(""), Err(ParseError::NoRoot)));
    }

    #[test]
    fn test_bad_date_yields_absent_added_at() {
        let xml = r#"<acronym><acro nym="X" added="sometime in 1992"><expan>Ex</expan></acro></acronym>"#;

        let records = parse_str(xml).expect("Should parse");

        assert_eq!(records.len(), 1);
        assert!(records[0].added_at.is_none());
    }

    #[test]
    fn test_parse_added_with_offset_zone() {
        let added = parse_added("Mon Mar 04 10:30:00 EST 2002").expect("Should parse");
        assert_eq!(added, Utc.with_ymd_and_hms(2002, 3, 4, 15, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_added_unknown_zone() {
        assert!(parse_added("Wed Jan 01 00:00:00 XYZ 1992").is_none());
    }

    #[test]
    fn test_parse_added_wrong_field_count() {
        assert!(parse_added("Wed Jan 01 00:00:00 1992").is_none());
        assert!(parse_added("").is_none());
    }

    #[test]
    fn test_parse_added_invalid_time() {
        assert!(parse_added("Wed Jan 01 25:00:00 GMT 1992").is_none());
    }
}
