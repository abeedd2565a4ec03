//! Text extraction from Office Open XML packages (`.docx`, `.pptx`).
//!
//! Both formats keep visible text in `t` run elements (`w:t`, `a:t`). Runs are
//! concatenated in document order; paragraph, cell and shape boundaries
//! become whitespace so words from adjacent blocks never fuse.

use crate::error::ExtractionError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::trace;
use zip::result::ZipError;
use zip::ZipArchive;

const WORD_BODY_PART: &str = "word/document.xml";
const PRESENTATION_PART: &str = "ppt/presentation.xml";
const SLIDE_PREFIX: &str = "ppt/slides/slide";

pub fn word_text(path: &Path) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut text = String::new();
    read_part(&mut archive, WORD_BODY_PART, &mut text)?;
    trace!("Extracted {} chars from {}", text.len(), path.display());
    Ok(text.trim().to_string())
}

pub fn presentation_text(path: &Path) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    if archive.index_for_name(PRESENTATION_PART).is_none() {
        return Err(ExtractionError::MissingPart(PRESENTATION_PART.to_string()));
    }

    let mut text = String::new();
    for slide in slide_parts(&archive) {
        read_part(&mut archive, &slide, &mut text)?;
        text.push(' ');
    }
    trace!("Extracted {} chars from {}", text.len(), path.display());
    Ok(text.trim().to_string())
}

/// Slide part names ordered by slide number (`slide2.xml` before `slide10.xml`).
fn slide_parts(archive: &ZipArchive<File>) -> Vec<String> {
    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name.strip_prefix(SLIDE_PREFIX)?.strip_suffix(".xml")?;
            number.parse::<u32>().ok().map(|n| (n, name.to_string()))
        })
        .collect();
    slides.sort();
    slides.into_iter().map(|(_, name)| name).collect()
}

fn read_part(
    archive: &mut ZipArchive<File>,
    name: &str,
    out: &mut String,
) -> Result<(), ExtractionError> {
    let part = match archive.by_name(name) {
        Ok(part) => part,
        Err(ZipError::FileNotFound) => return Err(ExtractionError::MissingPart(name.to_string())),
        Err(e) => return Err(e.into()),
    };
    collect_runs(BufReader::new(part), out)
}

fn collect_runs<R: BufRead>(xml: R, out: &mut String) -> Result<(), ExtractionError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_run = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_run = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_run = false,
                b"p" => out.push('\n'),
                b"tc" | b"sp" => out.push(' '),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_run => out.push_str(&e.unescape()?),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(xml: &str) -> String {
        let mut out = String::new();
        collect_runs(xml.as_bytes(), &mut out).unwrap();
        out
    }

    #[test]
    fn test_word_paragraphs_and_cells_are_separated() {
        let xml = r#"<w:document xmlns:w="w"><w:body>
            <w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t xml:space="preserve"> world</w:t></w:r></w:p>
            <w:p><w:r><w:t>second</w:t></w:r></w:p>
            <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc>
            <w:tc><w:p><w:r><w:t>two</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
        </w:body></w:document>"#;
        let text = runs(xml);
        let words: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(words, vec!["Hello", "world", "second", "cell", "two"]);
    }

    #[test]
    fn test_text_outside_runs_is_ignored() {
        let xml = r#"<w:document xmlns:w="w"><w:body><w:p>
            <w:r><w:instrText>PAGE</w:instrText><w:t>kept</w:t></w:r>
        </w:p></w:body></w:document>"#;
        assert_eq!(runs(xml).trim(), "kept");
    }

    #[test]
    fn test_entities_are_unescaped() {
        let xml = r#"<a:p xmlns:a="a"><a:r><a:t>Fish &amp; Chips</a:t></a:r></a:p>"#;
        assert_eq!(runs(xml).trim(), "Fish & Chips");
    }

    #[test]
    fn test_tabs_and_breaks_become_whitespace() {
        let xml = r#"<w:p xmlns:w="w"><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p>"#;
        let text = runs(xml);
        assert_eq!(text.split_whitespace().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
}
