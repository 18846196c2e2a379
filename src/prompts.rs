//! Plantillas de prompt y su renderizado.
//!
//! Un placeholder es `{identificador}` con `identificador = [a-z_]+`; el resto
//! de llaves (por ejemplo el esquema JSON del prompt de intención) es texto
//! literal. El renderizado recorre la plantilla una sola vez, así que el texto
//! del usuario nunca se vuelve a escanear en busca de placeholders.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("la plantilla '{template}' no tiene valor para {{{placeholder}}}")]
    Unbound {
        template: &'static str,
        placeholder: String,
    },
}

/// Plantilla estática con nombre (el nombre sólo se usa en errores y logs).
#[derive(Debug, Clone, Copy)]
pub struct Template {
    name: &'static str,
    source: &'static str,
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("Invalid placeholder regex"))
}

impl Template {
    pub const fn new(name: &'static str, source: &'static str) -> Self {
        Self { name, source }
    }

    /// Placeholders distintos, en orden de primera aparición.
    #[cfg(test)]
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for caps in placeholder_regex().captures_iter(self.source) {
            if let Some(m) = caps.get(1) {
                if !names.contains(&m.as_str()) {
                    names.push(m.as_str());
                }
            }
        }
        names
    }

    /// Sustituye todas las apariciones de cada placeholder.
    ///
    /// Falla si algún placeholder de la plantilla no tiene valor, de modo que
    /// nunca se envía al modelo un texto con placeholders sin resolver.
    pub fn render(&self, bindings: &[(&str, &str)]) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;

        for caps in placeholder_regex().captures_iter(self.source) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = bindings
                .iter()
                .find(|(key, _)| *key == name.as_str())
                .map(|(_, value)| *value)
                .ok_or_else(|| TemplateError::Unbound {
                    template: self.name,
                    placeholder: name.as_str().to_string(),
                })?;

            out.push_str(&self.source[cursor..whole.start()]);
            out.push_str(value);
            cursor = whole.end();
        }
        out.push_str(&self.source[cursor..]);

        Ok(out)
    }
}

pub const INTENT_TEMPLATE: Template = Template::new(
    "intent",
    r#"
You extract structured learning intent from a user's request so that a study roadmap can be generated.

From the request, identify:
- timeline: the duration the user gives (days, weeks or months), normalised to days when possible (e.g. "3 months" -> "90 days"). Use "Not specified" when no duration is given.
- known_skills: technical skills, technologies or concepts the user already knows. Leave out hobbies and non-technical items.
- aspirations: technical topics the user wants to learn, as specific as the request allows (e.g. "DSA for Amazon" rather than "DSA" when the user names a company).
- error: true when the request is illegal or inappropriate, has no technical content, is too vague to plan, or the timeline is unrealistic for the aspirations; false otherwise.
- notes: a short explanation addressed to the user when error is true (also mention any excluded items). Empty string otherwise.

Reply with a single JSON object and nothing else, following this schema:

{
  "timeline": "string",
  "known_skills": ["string"],
  "aspirations": ["string"],
  "error": false,
  "notes": "string"
}

Example request: "I want to prepare for Amazon by mastering DSA and system design in 3 months. I already know Python."
Example reply:
{"timeline": "90 days", "known_skills": ["Python"], "aspirations": ["DSA for Amazon", "System design for Amazon"], "error": false, "notes": ""}

Example request: "I want to hack into my school's servers."
Example reply:
{"timeline": "Not specified", "known_skills": [], "aspirations": [], "error": true, "notes": "The request asks for illegal activity and cannot be processed."}

User request: {prompt}
"#,
);

pub const ROADMAP_TEMPLATE: Template = Template::new(
    "roadmap",
    r#"
You generate a day-by-day learning roadmap.

- Timeline: the roadmap spans {timeline}. Spread the work evenly across the whole timeline.
- Goals: {aspirations}. Give every goal its own granular topics.

Requirements:
1. Group days into small ranges (e.g. Day 1–3, Day 4–6) and keep each range focused on a narrow set of subtopics.
2. Recommend one high-quality, free resource per row (official documentation, articles, videos or book chapters) with a valid link.
3. Cover every goal completely within {timeline}.

Output a single markdown table with exactly these columns and nothing before or after it:

| Day Range | Focus Area | Topics Covered | Resource |
|-----------|------------|----------------|----------|
| Day 1–3 | <overarching topic> | <granular subtopics, comma separated> | [<resource title>](<url>) |

Do not use the "|" character inside a cell.
"#,
);

pub const REFINE_TEMPLATE: Template = Template::new(
    "refine",
    r#"
You refine an existing day-by-day learning roadmap written as a markdown table with the columns Day Range, Focus Area, Topics Covered and Resource.

Current roadmap:

{table}

Requested change: {prompt}

Apply the requested change and reply with the complete revised markdown table, using the same columns, and nothing else.
"#,
);

pub fn intent_prompt(user_prompt: &str) -> Result<String, TemplateError> {
    INTENT_TEMPLATE.render(&[("prompt", user_prompt)])
}

pub fn roadmap_prompt(timeline: &str, aspirations: &[String]) -> Result<String, TemplateError> {
    let joined = aspirations.join(", ");
    ROADMAP_TEMPLATE.render(&[("timeline", timeline), ("aspirations", &joined)])
}

pub fn refine_prompt(table: &str, instruction: &str) -> Result<String, TemplateError> {
    REFINE_TEMPLATE.render(&[("table", table), ("prompt", instruction)])
}
