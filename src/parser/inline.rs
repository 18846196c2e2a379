//! Patrones en línea: enlaces `[titulo](url)` y frases en negrita `**texto**`.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::Resource;

fn link_regex() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("Invalid link regex"))
}

fn bold_regex() -> &'static Regex {
    static BOLD: OnceLock<Regex> = OnceLock::new();
    BOLD.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").expect("Invalid bold regex"))
}

/// Primer enlace markdown del texto, si lo hay.
pub fn first_link(text: &str) -> Option<Resource> {
    link_regex().captures(text).map(|caps| Resource {
        title: caps[1].to_string(),
        url: caps[2].to_string(),
    })
}

/// Todos los enlaces del texto, en orden y con duplicados.
pub fn links(text: &str) -> Vec<Resource> {
    link_regex()
        .captures_iter(text)
        .map(|caps| Resource {
            title: caps[1].to_string(),
            url: caps[2].to_string(),
        })
        .collect()
}

/// Todas las frases en negrita, recortadas, en orden y con duplicados.
pub fn bold_phrases(text: &str) -> Vec<String> {
    bold_regex()
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_link_takes_only_the_first_match() {
        let text = "[A](http://x) and [B](http://y)";
        assert_eq!(
            first_link(text),
            Some(Resource {
                title: "A".into(),
                url: "http://x".into()
            })
        );
    }

    #[test]
    fn plain_text_has_no_link() {
        assert_eq!(first_link("GeeksforGeeks arrays tutorial"), None);
        assert!(links("https://example.com bare url").is_empty());
    }

    #[test]
    fn links_keep_order_and_duplicates() {
        let text = "- [Docs](https://d) - [Docs](https://d) - [Video](https://v)";
        let titles: Vec<_> = links(text).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Docs", "Docs", "Video"]);
    }

    #[test]
    fn bold_phrases_are_trimmed() {
        assert_eq!(
            bold_phrases("1. ** Learn Arrays **\n   - **Description**: basics"),
            vec!["Learn Arrays".to_string(), "Description".to_string()]
        );
    }
}
