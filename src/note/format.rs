//! Rendering notes as text, markdown, JSON and YAML.

use std::collections::BTreeSet;
use std::io::Write;

use super::container::Note;
use super::error::NoteError;
use super::paragraph::ParagraphFactory;
use super::section::Section;
use crate::models::enums::NoteFormat;
use crate::models::NoteEvent;
use crate::write::{write_block, write_divider, write_empty, write_line, write_wrap};

/// Options for [`write_full`].
#[derive(Debug, Clone)]
pub struct FullWriteOptions {
    pub note_line_limit: Option<usize>,
    pub section_line_limit: Option<usize>,
    pub include_section_header: bool,
    /// Only write sections with these names.
    pub sections: Option<BTreeSet<String>>,
    pub include_fields: bool,
    pub include_note_divider: bool,
    pub include_section_divider: bool,
}

impl Default for FullWriteOptions {
    fn default() -> Self {
        Self {
            note_line_limit: None,
            section_line_limit: None,
            include_section_header: true,
            sections: None,
            include_fields: true,
            include_note_divider: true,
            include_section_divider: true,
        }
    }
}

/// Note event fields followed by a divider and (up to `line_limit` lines of)
/// the note text.
pub fn write_note_event<W: Write + ?Sized>(
    event: &NoteEvent,
    w: &mut W,
    depth: usize,
    line_limit: Option<usize>,
    include_fields: bool,
) -> Result<(), NoteError> {
    if include_fields {
        write_line(w, depth, &format!("row_id: {}", event.row_id))?;
        write_line(w, depth, &format!("subject_id: {}", event.subject_id))?;
        if let Some(d) = event.chartdate {
            write_line(w, depth, &format!("chartdate: {d}"))?;
        }
        if let Some(t) = event.charttime {
            write_line(w, depth, &format!("charttime: {t}"))?;
        }
        write_line(w, depth, &format!("category: {}", event.category))?;
        write_line(w, depth, &format!("description: {}", event.description.as_deref().unwrap_or("")))?;
        if let Some(cgid) = event.cgid {
            write_line(w, depth, &format!("cgid: {cgid}"))?;
        }
    }
    if line_limit != Some(0) {
        write_divider(w, depth, '-', None)?;
        write_block(w, depth, &event.text, line_limit)?;
    }
    Ok(())
}

pub fn write_fields<W: Write + ?Sized>(note: &Note, w: &mut W, depth: usize) -> Result<(), NoteError> {
    write_line(w, depth, &format!("row_id: {}", note.row_id()))?;
    write_line(w, depth, &format!("category: {}", note.category()))?;
    write_line(
        w,
        depth,
        &format!("description: {}", note.event.description.as_deref().unwrap_or("")),
    )?;
    write_line(w, depth, &format!("annotator: {}", note.annotator))?;
    Ok(())
}

fn write_paragraphs<W: Write + ?Sized>(
    note: &Note,
    sec: &Section,
    w: &mut W,
    depth: usize,
    paragraphs: &dyn ParagraphFactory,
) -> Result<(), NoteError> {
    for (i, para) in paragraphs.create(note.text(), sec).iter().enumerate() {
        if i > 0 {
            write_empty(w)?;
        }
        write_wrap(w, depth, &para.norm)?;
    }
    Ok(())
}

/// Each section in text order under a divider naming it. With `paragraphs`
/// the normalized paragraphs are written instead of the raw body.
pub fn write_sections<W: Write + ?Sized>(
    note: &Note,
    w: &mut W,
    depth: usize,
    paragraphs: Option<&dyn ParagraphFactory>,
) -> Result<(), NoteError> {
    let text = note.text();
    for sec in note.iter() {
        let header = sec.header(text);
        let mut div_text = format!("{}:{}", sec.id, sec.name);
        if !header.is_empty() {
            div_text.push_str(&format!(" ({header})"));
        }
        write_divider(w, depth, '-', Some(&div_text))?;
        match paragraphs {
            Some(pf) => write_paragraphs(note, sec, w, depth, pf)?,
            None => {
                let body = sec.body(text);
                if !body.is_empty() {
                    write_block(w, depth, body, None)?;
                }
            }
        }
    }
    Ok(())
}

/// Fields then sections.
pub fn write_human<W: Write + ?Sized>(
    note: &Note,
    w: &mut W,
    depth: usize,
    paragraphs: Option<&dyn ParagraphFactory>,
) -> Result<(), NoteError> {
    write_fields(note, w, depth)?;
    write_sections(note, w, depth, paragraphs)
}

pub fn write_markdown<W: Write + ?Sized>(
    note: &Note,
    w: &mut W,
    depth: usize,
    paragraphs: Option<&dyn ParagraphFactory>,
) -> Result<(), NoteError> {
    let text = note.text();
    write_line(w, depth, &format!("# {} ({})", note.category(), note.row_id()))?;
    for sec in note.sections.values() {
        write_empty(w)?;
        write_empty(w)?;
        write_line(w, depth, &format!("## {}", sec.header(text)))?;
        write_empty(w)?;
        match paragraphs {
            Some(pf) => write_paragraphs(note, sec, w, depth, pf)?,
            None => {
                let body = sec.body(text);
                if !body.is_empty() {
                    write_block(w, depth, body, None)?;
                }
            }
        }
    }
    Ok(())
}

fn write_section_detail<W: Write + ?Sized>(
    note: &Note,
    sec: &Section,
    w: &mut W,
    depth: usize,
    body_line_limit: Option<usize>,
    include_header: bool,
) -> Result<(), NoteError> {
    let text = note.text();
    if include_header {
        write_line(w, depth, &format!("header: {}", sec.header(text)))?;
    }
    let body = sec.body(text);
    if !body.is_empty() && body_line_limit != Some(0) {
        write_line(w, depth, "body:")?;
        write_block(w, depth + 1, body, body_line_limit)?;
    }
    Ok(())
}

/// Note event fields and text followed by every (selected) section.
pub fn write_full<W: Write + ?Sized>(
    note: &Note,
    w: &mut W,
    depth: usize,
    opts: &FullWriteOptions,
) -> Result<(), NoteError> {
    write_note_event(&note.event, w, depth, opts.note_line_limit, opts.include_fields)?;
    let secs: Vec<&Section> = note
        .sections
        .values()
        .filter(|s| opts.sections.as_ref().map(|names| names.contains(&s.name)).unwrap_or(true))
        .collect();
    if !secs.is_empty() {
        write_line(w, depth + 1, "sections:")?;
        for sec in secs {
            let aft = if opts.section_line_limit == Some(0) && opts.include_section_header {
                ":"
            } else {
                ""
            };
            write_line(w, depth + 2, &format!("{}{aft}", sec.name))?;
            write_section_detail(note, sec, w, depth + 3, opts.section_line_limit, opts.include_section_header)?;
            if opts.include_section_divider {
                write_divider(w, depth + 3, '-', None)?;
            }
        }
    }
    if opts.include_note_divider {
        write_divider(w, depth, '=', None)?;
    }
    Ok(())
}

/// One line per section: description, header spans and length.
pub fn summary(note: &Note) -> Vec<String> {
    let text = note.text();
    note.sections
        .values()
        .map(|s| {
            let spans = s.header_spans.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
            format!("{} ({spans}) {}", s.describe(text), s.len())
        })
        .collect()
}

pub fn write_by_format<W: Write + ?Sized>(
    note: &Note,
    w: &mut W,
    depth: usize,
    format: NoteFormat,
    paragraphs: Option<&dyn ParagraphFactory>,
) -> Result<(), NoteError> {
    match format {
        NoteFormat::Text => write_human(note, w, depth, paragraphs)?,
        NoteFormat::Verbose => write_full(note, w, depth, &FullWriteOptions::default())?,
        NoteFormat::Raw => w.write_all(note.text().as_bytes())?,
        NoteFormat::Json => {
            serde_json::to_writer_pretty(&mut *w, note)?;
            writeln!(w)?;
        }
        NoteFormat::Yaml => w.write_all(serde_yaml::to_string(note)?.as_bytes())?,
        NoteFormat::Markdown => write_markdown(note, w, depth, paragraphs)?,
        NoteFormat::Summary => {
            for line in summary(note) {
                write_line(w, depth, &line)?;
            }
        }
    }
    Ok(())
}
