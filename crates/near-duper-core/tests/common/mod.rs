#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const P_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

fn write_archive(path: &Path, parts: &[(String, String)]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, body) in parts {
        zip.start_file(name.as_str(), SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// A minimal .docx with one paragraph per entry.
pub fn write_docx(path: &Path, paragraphs: &[&str]) -> PathBuf {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}"><w:body>{}</w:body></w:document>"#,
        W_NS, body
    );
    write_archive(path, &[("word/document.xml".to_string(), document)]);
    path.to_path_buf()
}

/// A minimal .pptx with one text shape per slide.
pub fn write_pptx(path: &Path, slides: &[&str]) -> PathBuf {
    let mut parts = vec![(
        "ppt/presentation.xml".to_string(),
        format!(r#"<?xml version="1.0"?><p:presentation xmlns:p="{}"/>"#, P_NS),
    )];
    for (i, text) in slides.iter().enumerate() {
        parts.push((
            format!("ppt/slides/slide{}.xml", i + 1),
            format!(
                r#"<?xml version="1.0"?><p:sld xmlns:p="{}" xmlns:a="{}"><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
                P_NS, A_NS, text
            ),
        ));
    }
    write_archive(path, &parts);
    path.to_path_buf()
}

pub fn write_file(path: &Path, contents: &str) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
    path.to_path_buf()
}

/// Cell written into an .xlsx fixture.
pub enum XlsxCell<'a> {
    Text(&'a str),
    Number(f64),
    Bool(bool),
}

fn column_letter(col: usize) -> char {
    (b'A' + col as u8) as char
}

fn sheet_xml(rows: &[(usize, Vec<XlsxCell>)]) -> String {
    let mut body = String::new();
    for (row_number, cells) in rows {
        body.push_str(&format!(r#"<row r="{}">"#, row_number));
        for (col, cell) in cells.iter().enumerate() {
            let reference = format!("{}{}", column_letter(col), row_number);
            match cell {
                XlsxCell::Text(s) => body.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    reference, s
                )),
                XlsxCell::Number(n) => {
                    body.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, n))
                }
                XlsxCell::Bool(b) => body.push_str(&format!(
                    r#"<c r="{}" t="b"><v>{}</v></c>"#,
                    reference,
                    u8::from(*b)
                )),
            }
        }
        body.push_str("</row>");
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        body
    )
}

/// A minimal .xlsx; each sheet lists `(1-based row number, cells)` so rows
/// can be skipped to leave blank lines.
pub fn write_xlsx(path: &Path, sheets: &[(&str, Vec<(usize, Vec<XlsxCell>)>)]) -> PathBuf {
    const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
    const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

    let mut sheet_entries = String::new();
    let mut rel_entries = String::new();
    let mut overrides = String::new();
    let mut parts = Vec::new();
    for (i, (name, rows)) in sheets.iter().enumerate() {
        let n = i + 1;
        sheet_entries.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            name, n, n
        ));
        rel_entries.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            n, REL_NS, n
        ));
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            n
        ));
        parts.push((format!("xl/worksheets/sheet{}.xml", n), sheet_xml(rows)));
    }

    parts.push((
        "[Content_Types].xml".to_string(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{}</Types>"#,
            overrides
        ),
    ));
    parts.push((
        "_rels/.rels".to_string(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
            PKG_REL_NS, REL_NS
        ),
    ));
    parts.push((
        "xl/workbook.xml".to_string(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="{}" xmlns:r="{}"><sheets>{}</sheets></workbook>"#,
            MAIN_NS, REL_NS, sheet_entries
        ),
    ));
    parts.push((
        "xl/_rels/workbook.xml.rels".to_string(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}">{}</Relationships>"#,
            PKG_REL_NS, rel_entries
        ),
    ));

    write_archive(path, &parts);
    path.to_path_buf()
}
