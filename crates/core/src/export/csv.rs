use crate::session::Entry;

use super::ExportError;

pub const CSV_HEADER: [&str; 3] = ["title", "keywords", "paragraph"];

/// UTF-8 CSV with a header row and one row per entry, in save order.
pub fn entries_to_csv(entries: &[Entry]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for entry in entries {
        writer.write_record([entry.title(), entry.keywords(), entry.paragraph()])?;
    }
    writer
        .into_inner()
        .map_err(|err| ExportError::Buffer(err.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(bytes: &[u8]) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes)
            .records()
            .map(|record| record.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn empty_session_is_header_only() {
        let bytes = entries_to_csv(&[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "title,keywords,paragraph\n");
    }

    #[test]
    fn one_line_per_entry_plus_header() {
        let entries = vec![
            Entry::new("Intro", "k1,k2", "First paragraph."),
            Entry::new("Body", "", "Second one; with \"quotes\"."),
            Entry::new("Café", "ünïcode", "Third."),
        ];
        let bytes = entries_to_csv(&entries).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert_eq!(text.lines().count(), entries.len() + 1);

        let rows = parse(&bytes);
        assert_eq!(rows[0], CSV_HEADER);
        for (row, entry) in rows[1..].iter().zip(&entries) {
            assert_eq!(row[0], entry.title());
            assert_eq!(row[1], entry.keywords());
            assert_eq!(row[2], entry.paragraph());
        }
    }

    #[test]
    fn embedded_newlines_survive_quoting() {
        let entries = [Entry::new("t", "a, b", "line one\nline two")];
        let rows = parse(&entries_to_csv(&entries).unwrap());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], "a, b");
        assert_eq!(rows[1][2], "line one\nline two");
    }
}
