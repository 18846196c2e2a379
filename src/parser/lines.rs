//! Clasificación línea a línea del markdown generado por el modelo.
//!
//! Cada línea se etiqueta una sola vez como fila de tabla, cabecera de rango
//! de días o texto plano. Los parsers de tabla y de formato antiguo trabajan
//! sobre esta secuencia en lugar de buscar patrones sobre el documento entero.

use regex::Regex;
use std::sync::OnceLock;

/// Cabecera del formato antiguo: `#### **Day 1–15: Fundamentos**`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayHeading<'a> {
    pub start: &'a str,
    pub end: &'a str,
    pub focus_area: &'a str,
}

impl DayHeading<'_> {
    /// Etiqueta normalizada del rango, siempre con guion largo.
    pub fn day_range(&self) -> String {
        format!("Day {}–{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    TableRow,
    DayHeading(DayHeading<'a>),
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub text: &'a str,
    pub kind: LineKind<'a>,
}

fn day_heading_regex() -> &'static Regex {
    static DAY_HEADING: OnceLock<Regex> = OnceLock::new();
    DAY_HEADING.get_or_init(|| {
        Regex::new(r"^####\s+\*\*Day\s+(\d+)\s*[–-]\s*(\d+):\s*([^*]+)\*\*")
            .expect("Invalid day heading regex")
    })
}

/// Clasifica una única línea.
pub fn classify(text: &str) -> Line<'_> {
    let trimmed = text.trim();

    if trimmed.starts_with('|') {
        return Line {
            text,
            kind: LineKind::TableRow,
        };
    }

    if let Some(caps) = day_heading_regex().captures(trimmed) {
        if let (Some(start), Some(end), Some(focus)) = (caps.get(1), caps.get(2), caps.get(3)) {
            return Line {
                text,
                kind: LineKind::DayHeading(DayHeading {
                    start: start.as_str(),
                    end: end.as_str(),
                    focus_area: focus.as_str().trim(),
                }),
            };
        }
    }

    Line {
        text,
        kind: LineKind::Text,
    }
}

/// Clasifica todas las líneas del documento, en orden.
pub fn classify_lines(markdown: &str) -> Vec<Line<'_>> {
    markdown.lines().map(classify).collect()
}
