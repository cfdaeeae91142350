//! Info dictionary rewriting and PDF date encoding.

use chrono::{DateTime, FixedOffset, Local};

use crate::document::{text_string, PdfFile};
use crate::error::UnstampError;

pub const CREATOR: &str = "OffeneGesetze.de";
pub const KEYWORDS: &str = "Amtliches Werk nach §5 UrhG https://offenegesetze.de";

/// Formats a timestamp as a PDF date string, e.g. `D:20190102150405+01'00`.
///
/// `%z` renders the UTC offset as `+HHMM`; PDF wants an apostrophe between
/// the offset hours and minutes, inserted at the fixed position when the
/// formatted value has the expected width.
pub fn pdf_date(value: &DateTime<FixedOffset>) -> String {
    let mut formatted = value.format("%Y%m%d%H%M%S%z").to_string();
    if formatted.len() == 19 {
        formatted.insert(17, '\'');
    }
    format!("D:{formatted}")
}

/// Clears stale embedded metadata and writes fresh Info entries.
///
/// The catalog's XMP metadata reference is dropped so readers fall back to
/// the Info dictionary instead of the vendor's cached values.
pub fn fix_metadata(
    pdf: &mut PdfFile,
    title: Option<&str>,
    creation_date: Option<DateTime<FixedOffset>>,
) -> Result<(), UnstampError> {
    pdf.clear_metadata_reference()?;

    pdf.set_info("Creator", text_string(CREATOR))?;
    pdf.set_info("Keywords", text_string(KEYWORDS))?;
    pdf.set_info_date("ModDate", &Local::now().fixed_offset())?;
    if let Some(title) = title {
        pdf.set_info("Title", text_string(title))?;
    }
    if let Some(date) = creation_date {
        pdf.set_info_date("CreationDate", &date)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pdf_date_inserts_offset_separator() {
        let date = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2019, 1, 2, 15, 4, 5)
            .unwrap();
        assert_eq!(pdf_date(&date), "D:20190102150405+01'00");
    }

    #[test]
    fn test_pdf_date_utc() {
        let date = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2020, 12, 31, 23, 59, 59)
            .unwrap();
        assert_eq!(pdf_date(&date), "D:20201231235959+00'00");
    }

    #[test]
    fn test_pdf_date_negative_offset() {
        let date = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2021, 6, 1, 0, 0, 0)
            .unwrap();
        assert_eq!(pdf_date(&date), "D:20210601000000-05'00");
    }

    #[test]
    fn test_pdf_date_half_hour_offset() {
        let date = FixedOffset::east_opt(5 * 3600 + 1800)
            .unwrap()
            .with_ymd_and_hms(2021, 6, 1, 12, 0, 0)
            .unwrap();
        assert_eq!(pdf_date(&date), "D:20210601120000+05'30");
    }
}
