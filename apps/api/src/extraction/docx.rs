use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};

use crate::extraction::{DocumentFormat, ExtractError};

/// Visible running text of a DOCX body: one line per paragraph, one line per
/// table row with cells separated by tabs. Drawings and embedded objects are
/// skipped.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|e| ExtractError::failed(DocumentFormat::Docx, e.to_string()))?;

    let mut text = String::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => {
                text.push_str(&paragraph_text(p));
                text.push('\n');
            }
            DocumentChild::Table(t) => text.push_str(&table_text(t)),
            _ => {}
        }
    }

    Ok(text)
}

fn paragraph_text(p: &Paragraph) -> String {
    let mut text = String::new();
    for child in &p.children {
        match child {
            ParagraphChild::Run(r) => push_run(&mut text, &r.children),
            ParagraphChild::Hyperlink(h) => {
                for link_child in &h.children {
                    if let ParagraphChild::Run(r) = link_child {
                        push_run(&mut text, &r.children);
                    }
                }
            }
            _ => {}
        }
    }
    text
}

fn push_run(text: &mut String, children: &[RunChild]) {
    for run_child in children {
        match run_child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

fn table_text(t: &Table) -> String {
    let mut text = String::new();
    for row in &t.rows {
        let TableChild::TableRow(r) = row;
        let cells: Vec<String> = r
            .cells
            .iter()
            .map(|cell| {
                let TableRowChild::TableCell(c) = cell;
                c.children
                    .iter()
                    .filter_map(|content| match content {
                        TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        text.push_str(&cells.join("\t"));
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use docx_rs::{Docx, Run, TableCell, TableRow};

    use super::*;

    fn build(docx: Docx) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        docx.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_paragraphs_become_lines() {
        let bytes = build(
            Docx::new()
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Jane Roe")))
                .add_paragraph(
                    Paragraph::new().add_run(Run::new().add_text("Skills: Rust, SQL")),
                ),
        );
        let text = extract(&bytes).unwrap();
        assert!(text.contains("Jane Roe\n"));
        assert!(text.contains("Skills: Rust, SQL\n"));
    }

    #[test]
    fn test_table_cells_are_tab_separated() {
        let table = Table::new(vec![TableRow::new(vec![
            TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("2019"))),
            TableCell::new()
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Acme Corp"))),
        ])]);
        let bytes = build(Docx::new().add_table(table));
        let text = extract(&bytes).unwrap();
        assert!(text.contains("2019\tAcme Corp"));
    }

    #[test]
    fn test_empty_document_is_empty_text() {
        let text = extract(&build(Docx::new())).unwrap();
        assert!(text.trim().is_empty());
    }

    #[test]
    fn test_non_zip_fails() {
        assert!(extract(b"plain text pretending to be docx").is_err());
    }
}
