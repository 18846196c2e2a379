//! Conversión del markdown generado por el modelo en secciones del roadmap.
//!
//! Se intenta primero el formato de tabla y, si no hay tabla, se recurre al
//! formato antiguo de cabeceras por rango de días.

mod inline;
mod legacy;
mod lines;
mod table;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::Section;

/// Formato del markdown de un roadmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadmapFormat {
    Table,
    Legacy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRoadmap {
    pub format: RoadmapFormat,
    pub sections: Vec<Section>,
    /// Filas de tabla descartadas (siempre 0 en formato antiguo).
    pub dropped_rows: usize,
}

/// Parsea `markdown` en secciones.
///
/// Con `hint` se fuerza un formato; sin él se usa la tabla si existe y el
/// formato antiguo en caso contrario. Un documento sin nada reconocible
/// produce una secuencia vacía, no un error.
pub fn parse_roadmap(markdown: &str, hint: Option<RoadmapFormat>) -> ParsedRoadmap {
    let lines = lines::classify_lines(markdown);

    let parsed = match hint {
        Some(RoadmapFormat::Legacy) => legacy_roadmap(&lines),
        Some(RoadmapFormat::Table) => table_roadmap(&lines).unwrap_or(ParsedRoadmap {
            format: RoadmapFormat::Table,
            sections: Vec::new(),
            dropped_rows: 0,
        }),
        None => table_roadmap(&lines).unwrap_or_else(|| {
            debug!("No se encontró tabla markdown, usando el formato de cabeceras");
            legacy_roadmap(&lines)
        }),
    };

    if parsed.dropped_rows > 0 {
        warn!(
            "Se descartaron {} filas de la tabla con menos de 4 celdas",
            parsed.dropped_rows
        );
    }
    debug!(
        "Markdown parseado ({:?}): {} secciones",
        parsed.format,
        parsed.sections.len()
    );

    parsed
}

fn table_roadmap(lines: &[lines::Line<'_>]) -> Option<ParsedRoadmap> {
    table::parse_table(lines).map(|t| ParsedRoadmap {
        format: RoadmapFormat::Table,
        sections: t.sections,
        dropped_rows: t.dropped_rows,
    })
}

fn legacy_roadmap(lines: &[lines::Line<'_>]) -> ParsedRoadmap {
    ParsedRoadmap {
        format: RoadmapFormat::Legacy,
        sections: legacy::parse_legacy(lines),
        dropped_rows: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const TABLE: &str = "\
Here is your roadmap:

| Day Range | Focus Area | Topics Covered | Resource |
|-----------|------------|----------------|----------|
| Day 1–5 | Arrays | Basics | [A](http://a) |
| Day 6–10 | Hashing | Maps | [H](http://h) |
";

    const LEGACY: &str = "\
#### **Day 1–3: X**
**Alpha** [First](http://first)
#### **Day 4–6: Y**
**Beta** [Second](http://second)
";

    #[test]
    fn table_wins_when_present() {
        let parsed = parse_roadmap(TABLE, None);
        assert_eq!(parsed.format, RoadmapFormat::Table);
        assert_eq!(parsed.sections.len(), 2);
    }

    #[test]
    fn falls_back_to_legacy_without_table() {
        let parsed = parse_roadmap(LEGACY, None);
        assert_eq!(parsed.format, RoadmapFormat::Legacy);
        assert_eq!(parsed.sections.len(), 2);
    }

    #[rstest]
    #[case(TABLE, RoadmapFormat::Legacy, 0)]
    #[case(LEGACY, RoadmapFormat::Table, 0)]
    #[case(LEGACY, RoadmapFormat::Legacy, 2)]
    fn hint_forces_format(
        #[case] markdown: &str,
        #[case] hint: RoadmapFormat,
        #[case] expected: usize,
    ) {
        let parsed = parse_roadmap(markdown, Some(hint));
        assert_eq!(parsed.format, hint);
        assert_eq!(parsed.sections.len(), expected);
    }

    #[test]
    fn nothing_recognisable_is_empty_not_error() {
        let parsed = parse_roadmap("Sorry, I cannot help with that.", None);
        assert_eq!(parsed.format, RoadmapFormat::Legacy);
        assert!(parsed.sections.is_empty());
        assert_eq!(parsed.dropped_rows, 0);
    }

    #[test]
    fn format_hint_deserializes_lowercase() {
        let hint: RoadmapFormat = serde_json::from_str("\"legacy\"").unwrap();
        assert_eq!(hint, RoadmapFormat::Legacy);
    }
}
