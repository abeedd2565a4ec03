//! Line protocol of the external duplicate scanner.
//!
//! ```text
//! EXACT|1.0
//! /photos/a.docx
//! /backup/a.docx
//! ---GROUP---
//! SIMILAR|0.85
//! /docs/report.docx|1.00
//! /docs/report-v2.docx|0.70
//! ---GROUP---
//! ```

use crate::error::Error;
use crate::grouping::{Classification, Group, GroupMember};
use std::io::{BufRead, Write};
use tracing::{debug, warn};

pub const GROUP_BOUNDARY: &str = "---GROUP---";

/// A line the parser skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedLine {
    pub line_number: usize,
    pub content: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ParsedStream {
    pub groups: Vec<Group>,
    pub malformed: Vec<MalformedLine>,
}

#[derive(Debug)]
enum ParserState {
    AwaitingHeader,
    AccumulatingMembers(Group),
    /// After a header that failed to parse; its members are rejected too.
    SkippingGroup,
}

/// Incremental parser; feed lines, then [`StreamParser::finish`].
#[derive(Debug)]
pub struct StreamParser {
    state: ParserState,
    parsed: ParsedStream,
    line_number: usize,
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::AwaitingHeader,
            parsed: ParsedStream::default(),
            line_number: 0,
        }
    }

    pub fn feed_line(&mut self, raw: &str) {
        self.line_number += 1;
        let line = raw.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return;
        }

        if line == GROUP_BOUNDARY {
            self.flush();
            return;
        }

        match parse_header(line) {
            Some(Ok((classification, similarity))) => {
                self.flush();
                self.state = ParserState::AccumulatingMembers(Group {
                    classification,
                    similarity,
                    members: Vec::new(),
                });
                return;
            }
            Some(Err(reason)) => {
                self.flush();
                self.state = ParserState::SkippingGroup;
                self.reject(line, reason);
                return;
            }
            None => {}
        }

        let member = match &self.state {
            ParserState::AwaitingHeader => Err("member line outside of a group".to_string()),
            ParserState::SkippingGroup => Err("member of a group with a malformed header".to_string()),
            ParserState::AccumulatingMembers(group) => parse_member(line, group),
        };
        match (member, &mut self.state) {
            (Ok(member), ParserState::AccumulatingMembers(group)) => group.members.push(member),
            (Err(reason), _) => self.reject(line, reason),
            (Ok(_), _) => {}
        }
    }

    /// Feed one raw line. A line that is not UTF-8 is recorded as malformed;
    /// it is never decoded lossily since the path would not exist on disk.
    pub fn feed_bytes(&mut self, raw: &[u8]) {
        match std::str::from_utf8(raw) {
            Ok(line) => self.feed_line(line),
            Err(e) => {
                self.line_number += 1;
                let shown = String::from_utf8_lossy(raw);
                let shown = shown.trim_end_matches(['\r', '\n']);
                self.reject(shown, format!("not valid UTF-8: {}", e));
            }
        }
    }

    pub fn finish(mut self) -> ParsedStream {
        self.flush();
        self.parsed
    }

    fn flush(&mut self) {
        if let ParserState::AccumulatingMembers(group) =
            std::mem::replace(&mut self.state, ParserState::AwaitingHeader)
        {
            if group.is_actionable() {
                self.parsed.groups.push(group);
            } else {
                debug!(
                    "Dropping {} group ending at line {} with {} member(s)",
                    group.classification,
                    self.line_number,
                    group.members.len()
                );
            }
        }
    }

    fn reject(&mut self, line: &str, reason: String) {
        warn!("Skipping scanner line {}: {} ({})", self.line_number, line, reason);
        self.parsed.malformed.push(MalformedLine {
            line_number: self.line_number,
            content: line.to_string(),
            reason,
        });
    }
}

/// `None` when the line is not a header at all.
fn parse_header(line: &str) -> Option<Result<(Classification, f64), String>> {
    let (class, value) = line.split_once('|')?;
    let classification = class.parse::<Classification>().ok()?;
    Some(parse_similarity(value).map(|similarity| (classification, similarity)))
}

fn parse_member(line: &str, group: &Group) -> Result<GroupMember, String> {
    let (path, value) = match line.rsplit_once('|') {
        Some((path, value)) if value.trim().parse::<f64>().is_ok() => (path, Some(value)),
        _ => (line, None),
    };
    if path.trim().is_empty() {
        return Err("empty path".to_string());
    }

    match (group.classification, value) {
        (Classification::Exact, _) => Ok(GroupMember::new(path, 1.0)),
        (Classification::Similar, Some(value)) => {
            parse_similarity(value).map(|similarity| GroupMember::new(path, similarity))
        }
        (Classification::Similar, None) => Ok(GroupMember::new(path, group.similarity)),
    }
}

fn parse_similarity(value: &str) -> Result<f64, String> {
    let similarity: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("similarity '{}' is not a number", value.trim()))?;
    if !(0.0..=1.0).contains(&similarity) {
        return Err(format!("similarity {} is outside 0..=1", similarity));
    }
    Ok(similarity)
}

pub fn parse_stream<R: BufRead>(mut reader: R) -> Result<ParsedStream, Error> {
    let mut parser = StreamParser::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        parser.feed_bytes(&buf);
    }
    Ok(parser.finish())
}

pub fn parse_str(input: &str) -> ParsedStream {
    let mut parser = StreamParser::new();
    for line in input.lines() {
        parser.feed_line(line);
    }
    parser.finish()
}

/// Write groups back in the scanner's line format.
pub fn write_groups<W: Write>(groups: &[Group], mut out: W) -> std::io::Result<()> {
    for group in groups {
        match group.classification {
            Classification::Exact => {
                writeln!(out, "{}|1.0", Classification::Exact)?;
                for member in &group.members {
                    writeln!(out, "{}", member.path.display())?;
                }
            }
            Classification::Similar => {
                writeln!(out, "{}|{:.2}", Classification::Similar, group.similarity)?;
                for member in &group.members {
                    writeln!(out, "{}|{:.2}", member.path.display(), member.similarity)?;
                }
            }
        }
        writeln!(out, "{}", GROUP_BOUNDARY)?;
    }
    Ok(())
}
