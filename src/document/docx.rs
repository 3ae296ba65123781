use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::DocumentError;

use super::{Block, OutputDocument, RunStyle};

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const DOCUMENT_PART: &str = "word/document.xml";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Packs the document into `.docx` bytes. Entry timestamps are fixed, so equal
/// documents give equal bytes.
pub fn write_docx(document: &OutputDocument) -> Result<Vec<u8>, DocumentError> {
    let body = document_xml(document)?;
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let parts: [(&str, &[u8]); 3] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
        ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
        (DOCUMENT_PART, body.as_slice()),
    ];
    for (name, content) in parts {
        writer
            .start_file(name, options)
            .map_err(|err| DocumentError::Package(format!("failed to add {}: {}", name, err)))?;
        writer.write_all(content)?;
    }

    let bytes = writer
        .finish()
        .map_err(|err| DocumentError::Package(format!("failed to finalize docx: {}", err)))?
        .into_inner();
    Ok(bytes)
}

/// Paragraph texts of a `.docx`, one entry per `w:p`, runs concatenated.
pub fn read_docx_paragraphs(bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| DocumentError::Package(format!("failed to read docx: {}", err)))?;
    let mut xml = Vec::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|err| DocumentError::Package(format!("missing {}: {}", DOCUMENT_PART, err)))?
        .read_to_end(&mut xml)?;

    let mut reader = Reader::from_reader(xml.as_slice());
    reader.trim_text(false);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => current = Some(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"w:p" {
                    paragraphs.push(String::new());
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(text) = current.take() {
                        paragraphs.push(text);
                    }
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|err| DocumentError::Xml(err.to_string()))?;
                if let Some(paragraph) = current.as_mut() {
                    paragraph.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(DocumentError::Xml(err.to_string())),
        }
        buf.clear();
    }
    Ok(paragraphs)
}

fn document_xml(document: &OutputDocument) -> Result<Vec<u8>, DocumentError> {
    let mut writer = Writer::new(Vec::new());
    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))),
    )?;
    emit(
        &mut writer,
        Event::Start(BytesStart::new("w:document").with_attributes([("xmlns:w", WORDML_NS)])),
    )?;
    emit(&mut writer, Event::Start(BytesStart::new("w:body")))?;
    for block in document.blocks() {
        write_block(&mut writer, block)?;
    }
    write_section(&mut writer)?;
    emit(&mut writer, Event::End(BytesEnd::new("w:body")))?;
    emit(&mut writer, Event::End(BytesEnd::new("w:document")))?;
    Ok(writer.into_inner())
}

fn write_block(writer: &mut Writer<Vec<u8>>, block: &Block) -> Result<(), DocumentError> {
    let (text, style) = match block {
        Block::Paragraph { text, style } if !text.is_empty() => (text, style),
        _ => return emit(writer, Event::Empty(BytesStart::new("w:p"))),
    };

    emit(writer, Event::Start(BytesStart::new("w:p")))?;
    emit(writer, Event::Start(BytesStart::new("w:r")))?;
    write_run_properties(writer, style)?;
    emit(
        writer,
        Event::Start(BytesStart::new("w:t").with_attributes([("xml:space", "preserve")])),
    )?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new("w:t")))?;
    emit(writer, Event::End(BytesEnd::new("w:r")))?;
    emit(writer, Event::End(BytesEnd::new("w:p")))
}

// eastAsia and cs must carry the font too, or Word falls back for Khmer script.
fn write_run_properties(
    writer: &mut Writer<Vec<u8>>,
    style: &RunStyle,
) -> Result<(), DocumentError> {
    let font = style.font_name.as_str();
    let size = ((style.size_pt * 2.0).round() as u32).to_string();

    emit(writer, Event::Start(BytesStart::new("w:rPr")))?;
    emit(
        writer,
        Event::Empty(BytesStart::new("w:rFonts").with_attributes([
            ("w:ascii", font),
            ("w:hAnsi", font),
            ("w:eastAsia", font),
            ("w:cs", font),
        ])),
    )?;
    emit(
        writer,
        Event::Empty(BytesStart::new("w:color").with_attributes([("w:val", style.color.as_str())])),
    )?;
    emit(
        writer,
        Event::Empty(BytesStart::new("w:sz").with_attributes([("w:val", size.as_str())])),
    )?;
    emit(
        writer,
        Event::Empty(BytesStart::new("w:szCs").with_attributes([("w:val", size.as_str())])),
    )?;
    emit(writer, Event::End(BytesEnd::new("w:rPr")))
}

fn write_section(writer: &mut Writer<Vec<u8>>) -> Result<(), DocumentError> {
    emit(writer, Event::Start(BytesStart::new("w:sectPr")))?;
    emit(
        writer,
        Event::Empty(
            BytesStart::new("w:pgSz").with_attributes([("w:w", "11906"), ("w:h", "16838")]),
        ),
    )?;
    emit(
        writer,
        Event::Empty(BytesStart::new("w:pgMar").with_attributes([
            ("w:top", "1440"),
            ("w:right", "1440"),
            ("w:bottom", "1440"),
            ("w:left", "1440"),
            ("w:header", "708"),
            ("w:footer", "708"),
            ("w:gutter", "0"),
        ])),
    )?;
    emit(writer, Event::End(BytesEnd::new("w:sectPr")))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), DocumentError> {
    writer
        .write_event(event)
        .map_err(|err| DocumentError::Xml(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_xml(block: &Block) -> String {
        let mut writer = Writer::new(Vec::new());
        write_block(&mut writer, block).expect("write block");
        String::from_utf8(writer.into_inner()).expect("utf8")
    }

    #[test]
    fn paragraph_run_carries_font_size_and_color() {
        let block = Block::Paragraph {
            text: "hello".to_string(),
            style: RunStyle::default(),
        };
        insta::assert_snapshot!(
            block_xml(&block),
            @r#"<w:p><w:r><w:rPr><w:rFonts w:ascii="Khmer OS Battambang" w:hAnsi="Khmer OS Battambang" w:eastAsia="Khmer OS Battambang" w:cs="Khmer OS Battambang"/><w:color w:val="000000"/><w:sz w:val="24"/><w:szCs w:val="24"/></w:rPr><w:t xml:space="preserve">hello</w:t></w:r></w:p>"#
        );
    }

    #[test]
    fn empty_paragraph_and_separator_are_bare() {
        assert_eq!(block_xml(&Block::Separator), "<w:p/>");
        let empty = Block::Paragraph {
            text: String::new(),
            style: RunStyle::default(),
        };
        assert_eq!(block_xml(&empty), "<w:p/>");
    }

    #[test]
    fn written_paragraphs_read_back_in_order() {
        let mut doc = OutputDocument::new(RunStyle::default());
        doc.push_page_text("សួស្តី ពិភពលោក");
        doc.push_separator();
        doc.push_page_text("Tom & Jerry <2>");
        let bytes = doc.to_docx_bytes().expect("docx bytes");

        let paragraphs = read_docx_paragraphs(&bytes).expect("read back");
        assert_eq!(
            paragraphs,
            vec![
                "សួស្តី ពិភពលោក".to_string(),
                String::new(),
                "Tom & Jerry <2>".to_string()
            ]
        );
    }

    #[test]
    fn identical_documents_give_identical_bytes() {
        let mut doc = OutputDocument::new(RunStyle::default());
        doc.push_page_text("page one");
        doc.push_page_text("page two");
        assert_eq!(
            doc.to_docx_bytes().expect("first"),
            doc.clone().to_docx_bytes().expect("second")
        );
    }

    #[test]
    fn garbage_is_not_a_docx() {
        assert!(matches!(
            read_docx_paragraphs(b"not a zip"),
            Err(DocumentError::Package(_))
        ));
    }
}
