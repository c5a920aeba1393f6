use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::session::Entry;

use super::ExportError;

pub const KEYWORDS_LABEL: &str = "Keywords:";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:rPr><w:sz w:val="22"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style>
</w:styles>"#;

const DOCUMENT_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;

const DOCUMENT_CLOSE: &str = "<w:sectPr/></w:body></w:document>";

/// A minimal WordprocessingML package. Each entry becomes a `Heading1`
/// title, a bold `Keywords:` label followed by the keywords, the paragraph
/// body and an empty separator paragraph.
pub fn entries_to_docx(entries: &[Entry]) -> Result<Vec<u8>, ExportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", PACKAGE_RELS.to_string()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
        ("word/styles.xml", STYLES.to_string()),
        ("word/document.xml", document_xml(entries)),
    ];
    for (name, body) in parts {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

fn document_xml(entries: &[Entry]) -> String {
    let mut xml = String::from(DOCUMENT_OPEN);
    for entry in entries {
        xml.push_str(r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr>"#);
        push_run(&mut xml, entry.title(), false);
        xml.push_str("</w:p>");

        xml.push_str("<w:p>");
        push_run(&mut xml, KEYWORDS_LABEL, true);
        push_run(&mut xml, &format!(" {}", entry.keywords()), false);
        xml.push_str("</w:p>");

        xml.push_str("<w:p>");
        push_run(&mut xml, entry.paragraph(), false);
        xml.push_str("</w:p>");

        xml.push_str("<w:p/>");
    }
    xml.push_str(DOCUMENT_CLOSE);
    xml
}

/// Line breaks inside `text` become `<w:br/>` within the same run.
fn push_run(xml: &mut String, text: &str, bold: bool) {
    xml.push_str("<w:r>");
    if bold {
        xml.push_str("<w:rPr><w:b/></w:rPr>");
    }
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            xml.push_str("<w:br/>");
        }
        xml.push_str(r#"<w:t xml:space="preserve">"#);
        xml.push_str(&escape_xml(line.trim_end_matches('\r')));
        xml.push_str("</w:t>");
    }
    xml.push_str("</w:r>");
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // Outside the XML 1.0 Char production. Line breaks are split out
            // before escaping, so tab is the only C0 control kept.
            c if c < ' ' && c != '\t' => {}
            '\u{FFFE}' | '\u{FFFF}' => {}
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut text = String::new();
        part.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn empty_session_has_an_empty_body() {
        let bytes = entries_to_docx(&[]).unwrap();
        let document = read_part(&bytes, "word/document.xml");
        assert!(document.ends_with("<w:body><w:sectPr/></w:body></w:document>"));
        assert!(read_part(&bytes, "[Content_Types].xml").contains("/word/document.xml"));
    }

    #[test]
    fn one_block_per_entry_in_order() {
        let entries = [
            Entry::new("First", "a,b", "Alpha body."),
            Entry::new("Second", "c", "Beta body."),
        ];
        let document = read_part(&entries_to_docx(&entries).unwrap(), "word/document.xml");

        assert_eq!(document.matches(r#"<w:pStyle w:val="Heading1"/>"#).count(), 2);
        assert_eq!(
            document
                .matches(r#"<w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Keywords:</w:t>"#)
                .count(),
            2
        );

        let order = [
            "First", " a,b", "Alpha body.", "Second", " c", "Beta body.",
        ];
        let mut cursor = 0;
        for needle in order {
            let tagged = format!(r#"<w:t xml:space="preserve">{needle}</w:t>"#);
            let found = document[cursor..]
                .find(&tagged)
                .unwrap_or_else(|| panic!("`{needle}` missing or out of order"));
            cursor += found + tagged.len();
        }
    }

    #[test]
    fn escapes_markup_and_keeps_line_breaks() {
        let entries = [Entry::new("<R&D>", "\"q\"", "one\r\ntwo")];
        let document = read_part(&entries_to_docx(&entries).unwrap(), "word/document.xml");
        assert!(document.contains("&lt;R&amp;D&gt;"));
        assert!(document.contains("&quot;q&quot;"));
        assert!(document.contains(
            r#"one</w:t><w:br/><w:t xml:space="preserve">two</w:t>"#
        ));
    }

    #[test]
    fn drops_characters_xml_cannot_carry() {
        let entries = [Entry::new(
            "t\u{0}",
            "k\u{85}",
            "bad \u{FFFF} char \u{FFFE}\u{1}\tend",
        )];
        let document = read_part(&entries_to_docx(&entries).unwrap(), "word/document.xml");
        for forbidden in ['\u{FFFF}', '\u{FFFE}', '\u{0}', '\u{1}'] {
            assert!(!document.contains(forbidden), "{forbidden:?} leaked");
        }
        assert!(document.contains("bad  char \tend"));
        assert!(document.contains(" k\u{85}"));
        assert!(document.contains(r#"<w:t xml:space="preserve">t</w:t>"#));
    }
}
