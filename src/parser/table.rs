//! Parser de la tabla markdown `Day Range | Focus Area | Topics | Resource`.

use super::inline;
use super::lines::{Line, LineKind};
use crate::models::Section;

/// Cabecera + separador + al menos una fila de datos.
const MIN_TABLE_LINES: usize = 3;
const HEADER_LINES: usize = 2;
const REQUIRED_CELLS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct TableParse {
    pub sections: Vec<Section>,
    /// Filas de datos descartadas por tener menos de cuatro celdas.
    pub dropped_rows: usize,
}

/// Devuelve `None` si el documento no contiene una tabla reconocible.
///
/// Todas las filas con `|` del documento se tratan como una sola tabla: si el
/// modelo devuelve varias, las secciones se concatenan sin separación.
pub fn parse_table(lines: &[Line<'_>]) -> Option<TableParse> {
    let rows: Vec<&str> = lines
        .iter()
        .filter(|line| line.kind == LineKind::TableRow)
        .map(|line| line.text)
        .collect();

    if rows.len() < MIN_TABLE_LINES {
        return None;
    }

    let mut sections = Vec::new();
    let mut dropped_rows = 0;

    for row in rows.into_iter().skip(HEADER_LINES) {
        match parse_row(row) {
            Some(section) => sections.push(section),
            None => dropped_rows += 1,
        }
    }

    Some(TableParse {
        sections,
        dropped_rows,
    })
}

fn parse_row(row: &str) -> Option<Section> {
    let cells: Vec<&str> = row
        .split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .collect();

    if cells.len() < REQUIRED_CELLS {
        return None;
    }

    let (day_range, focus_area, topics, resource) = (cells[0], cells[1], cells[2], cells[3]);
    let resources = inline::first_link(resource).into_iter().collect();

    Some(Section::new(
        day_range.to_string(),
        focus_area.to_string(),
        format!("{focus_area}: {topics}"),
        vec![topics.to_string()],
        resources,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Resource;
    use crate::parser::lines::classify_lines;
    use pretty_assertions::assert_eq;

    const TABLE: &str = "\
| Day Range | Focus Area | Topics Covered | Resource |
|---|---|---|---|
| Day 1–3 | Arrays | Traversal, insertion | [Array Basics](https://gfg.org/arrays) |
| Day 4–6 | Strings | Substrings, search | [Strings](https://gfg.org/strings) |
| Day 7–9 | Linked Lists | Singly, doubly | Any good textbook |
";

    fn parse(markdown: &str) -> Option<TableParse> {
        parse_table(&classify_lines(markdown))
    }

    #[test]
    fn well_formed_table_yields_one_section_per_row_in_order() {
        let parsed = parse(TABLE).unwrap();
        let titles: Vec<_> = parsed.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Day 1–3: Arrays",
                "Day 4–6: Strings",
                "Day 7–9: Linked Lists"
            ]
        );
        assert_eq!(parsed.dropped_rows, 0);
    }

    #[test]
    fn row_fields_map_positionally() {
        let parsed = parse(TABLE).unwrap();
        let first = &parsed.sections[0];
        assert_eq!(first.day_range, "Day 1–3");
        assert_eq!(first.focus_area, "Arrays");
        assert_eq!(first.content, "Arrays: Traversal, insertion");
        assert_eq!(first.topics, vec!["Traversal, insertion".to_string()]);
        assert_eq!(
            first.resources,
            vec![Resource {
                title: "Array Basics".into(),
                url: "https://gfg.org/arrays".into()
            }]
        );
        assert!(!first.completed);
    }

    #[test]
    fn resource_cell_without_link_yields_no_resources() {
        let parsed = parse(TABLE).unwrap();
        assert!(parsed.sections[2].resources.is_empty());
    }

    #[test]
    fn short_rows_are_dropped_and_counted() {
        let markdown = "\
| Day | Focus | Topics | Resource |
|---|---|---|---|
| Day 1 | Arrays | | |
| Day 2 | Strings | Basics | [S](http://s) |
";
        let parsed = parse(markdown).unwrap();
        assert_eq!(parsed.sections.len(), 1);
        assert_eq!(parsed.sections[0].focus_area, "Strings");
        assert_eq!(parsed.dropped_rows, 1);
    }

    #[test]
    fn extra_cells_are_ignored() {
        let markdown = "\
| a | b | c | d |
|---|---|---|---|
| Day 1 | Graphs | BFS | [A](http://x) | extra | more |
";
        let parsed = parse(markdown).unwrap();
        assert_eq!(parsed.sections.len(), 1);
        assert_eq!(parsed.sections[0].resources[0].url, "http://x");
    }

    #[test]
    fn fewer_than_three_pipe_lines_is_not_a_table() {
        assert_eq!(parse("| a | b | c | d |\n|---|---|---|---|\n"), None);
        assert_eq!(parse("no tables here"), None);
    }

    #[test]
    fn multiple_tables_are_flattened() {
        let markdown = "\
### DSA
| Day | Focus | Topics | Resource |
|---|---|---|---|
| Day 1 | Arrays | Basics | [A](http://a) |

### System Design
| Day | Focus | Topics | Resource |
|---|---|---|---|
| Day 2 | Caching | LRU | [C](http://c) |
";
        let parsed = parse(markdown).unwrap();
        // La cabecera y el separador de la segunda tabla cuentan como filas.
        let focus: Vec<_> = parsed.sections.iter().map(|s| s.focus_area.as_str()).collect();
        assert_eq!(focus, vec!["Arrays", "Focus", "---", "Caching"]);
    }
}
