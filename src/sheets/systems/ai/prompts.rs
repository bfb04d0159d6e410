// src/sheets/systems/ai/prompts.rs
//! Prompt templates for the prompt-backed collaborators.

use super::collaborator::AggregateRequest;

/// Placeholder substituted by the row text in LLM-pipe instructions.
pub const INPUT_PLACEHOLDER: &str = "{input}";

pub fn find_prompt(query: &str, sheet_level: bool) -> String {
    let scope = if sheet_level {
        format!(
            "List the individual items that belong to \"{}\" (its members, products, parts or sub-entities).",
            query
        )
    } else {
        format!("List real-world entities that match the search: \"{}\".", query)
    };
    format!(
        "{}\nRespond with a JSON array of strings, one entity name per element, \
         no commentary and no duplicates.",
        scope
    )
}

pub fn run_cells_prompt(input: &str, columns: &[String]) -> String {
    let keys = columns
        .iter()
        .map(|c| format!("\"{}\": \"\"", c.replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Entity: \"{}\"\n\
         Fill in the following fields for this entity. Respond with a single JSON object \
         using exactly these keys: {{{}}}. Use an empty string when a value is unknown.",
        input, keys
    )
}

pub fn aggregate_prompt(request: &AggregateRequest) -> String {
    let table = std::iter::once(request.prev_headers.join(" | "))
        .chain(request.cells.iter().map(|row| row.join(" | ")))
        .collect::<Vec<_>>()
        .join("\n");
    let keys = request
        .columns
        .iter()
        .map(|c| format!("\"{}\"", c.replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(", ");
    let instruction = if request.instruction.trim().is_empty() {
        "Summarise the table into one row."
    } else {
        request.instruction.trim()
    };
    format!(
        "Sheet \"{}\" was generated from \"{}\".\n\
         Table:\n{}\n\n\
         {}\n\
         Respond with a JSON object {{\"sheetName\": \"{}\", \"aggregatedInsights\": {{...}}}} \
         where aggregatedInsights has exactly these keys: [{}].",
        request.sheet_name, request.origin_row, table, instruction, request.sheet_name, keys
    )
}

/// Renders an LLM-pipe instruction for one input row.
pub fn render_instruction(template: &str, input: &str) -> String {
    if template.contains(INPUT_PLACEHOLDER) {
        template.replace(INPUT_PLACEHOLDER, input)
    } else if template.trim().is_empty() {
        input.to_string()
    } else {
        format!("{}\n\n{}", template.trim_end(), input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_instruction_placeholder() {
        assert_eq!(render_instruction("Summarise: {input}!", "Name: A"), "Summarise: Name: A!");
    }

    #[test]
    fn test_render_instruction_appends_without_placeholder() {
        assert_eq!(render_instruction("Summarise", "Name: A"), "Summarise\n\nName: A");
        assert_eq!(render_instruction("", "Name: A"), "Name: A");
    }

    #[test]
    fn test_run_cells_prompt_lists_columns() {
        let prompt = run_cells_prompt("Acme", &["CEO".to_string(), "HQ".to_string()]);
        assert!(prompt.contains("\"Acme\""));
        assert!(prompt.contains("{\"CEO\": \"\", \"HQ\": \"\"}"));
    }

    #[test]
    fn test_aggregate_prompt_includes_table() {
        let request = AggregateRequest {
            cells: vec![vec!["Widget".into(), "10".into()]],
            origin_row: "Acme".into(),
            columns: vec!["Name".into(), "Total".into()],
            prev_headers: vec!["Item".into(), "Price".into()],
            instruction: String::new(),
            sheet_name: "Acme".into(),
        };
        let prompt = aggregate_prompt(&request);
        assert!(prompt.contains("Item | Price\nWidget | 10"));
        assert!(prompt.contains("[\"Name\", \"Total\"]"));
    }
}
