//! Parser del formato antiguo basado en cabeceras `#### **Day N–M: Area**`.
//!
//! Máquina de estados sobre las líneas clasificadas: cada cabecera cierra la
//! sección abierta y abre una nueva, de modo que el tramo de una sección va
//! desde su cabecera hasta la siguiente cabecera (exclusive) o el final.

use super::inline;
use super::lines::{DayHeading, Line, LineKind};
use crate::models::Section;

struct OpenSection<'a> {
    heading: DayHeading<'a>,
    heading_line: &'a str,
    body: Vec<&'a str>,
}

impl OpenSection<'_> {
    fn close(self) -> Section {
        let body = self.body.join("\n");
        let content = format!("{}\n{}", self.heading_line, body).trim().to_string();

        // La negrita de la propia cabecera es el título, no un tema.
        Section::new(
            self.heading.day_range(),
            self.heading.focus_area.to_string(),
            content,
            inline::bold_phrases(&body),
            inline::links(&body),
        )
    }
}

/// Sin cabeceras reconocibles devuelve una secuencia vacía.
pub fn parse_legacy(lines: &[Line<'_>]) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<OpenSection<'_>> = None;

    for line in lines {
        match line.kind {
            LineKind::DayHeading(heading) => {
                if let Some(open) = current.take() {
                    sections.push(open.close());
                }
                current = Some(OpenSection {
                    heading,
                    heading_line: line.text.trim(),
                    body: Vec::new(),
                });
            }
            LineKind::TableRow | LineKind::Text => {
                if let Some(open) = current.as_mut() {
                    open.body.push(line.text);
                }
            }
        }
    }

    if let Some(open) = current {
        sections.push(open.close());
    }

    sections
}
