use docx_rs::{DocumentChild, InsertChild, ParagraphChild, Run, RunChild};

use super::{DocumentFormat, ExtractError};

/// Joins the text of every body paragraph in document order, one paragraph per line.
pub(super) fn docx_to_text(bytes: &[u8]) -> Result<String, ExtractError> {
    if bytes.is_empty() {
        return Err(corrupt("empty file"));
    }

    let docx = docx_rs::read_docx(bytes).map_err(|e| corrupt(&e.to_string()))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(paragraph_text(&p.children)),
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

fn paragraph_text(children: &[ParagraphChild]) -> String {
    let mut text = String::new();
    push_paragraph_children(&mut text, children);
    text
}

/// Hyperlinks and tracked insertions hold runs of their own.
fn push_paragraph_children(text: &mut String, children: &[ParagraphChild]) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run(text, run),
            ParagraphChild::Hyperlink(link) => push_paragraph_children(text, &link.children),
            ParagraphChild::Insert(insert) => {
                for insert_child in &insert.children {
                    if let InsertChild::Run(run) = insert_child {
                        push_run(text, run);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run(text: &mut String, run: &Run) {
    for run_child in &run.children {
        match run_child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            _ => {}
        }
    }
}

fn corrupt(reason: &str) -> ExtractError {
    ExtractError::CorruptDocument {
        format: DocumentFormat::Docx,
        reason: reason.to_string(),
    }
}
