//! Prompts for the structured allergen / nutrition request.
//!
//! Every string the model sees lives here so prompt changes never touch the
//! request or error-handling code, and tests can inspect the exact bytes.

/// System message sent ahead of every extraction prompt.
pub const JSON_ONLY_DIRECTIVE: &str =
    "You are a food-label data extractor. Respond with a single valid JSON object and nothing else.";

/// The six nutrition keys, in the order they appear in the output object.
pub const NUTRITION_FIELDS: [&str; 6] = ["Energy", "Fat", "Carbohydrate", "Sugar", "Protein", "Sodium"];

/// Instruction block placed before the document text.
///
/// The extracted text is appended directly after the trailing `Text:` line.
pub const EXTRACTION_PROMPT: &str = r#"Extract allergens and nutritional values from the following text. Convert all allergens to English.
Much of the data will be in tables, in units such as kJ/100g or g/100g, or in the form of checked boxes,
mixed in with highly technical information. Be sure to extract all of it.

Output only valid JSON with exactly this format:

{
  "allergens": ["list of found allergens"],
  "nutritional_values": {
    "Energy": "...",
    "Fat": "...",
    "Carbohydrate": "...",
    "Sugar": "...",
    "Protein": "...",
    "Sodium": "..."
  }
}

Rules:
1. ALLERGENS
   - If no allergens are found, the list contains the single value "none".
   - If an allergen was written in another language, put its English name followed by the
     original word in parentheses, e.g. "milk (tej)".
2. NUTRITIONAL VALUES
   - If a value is not specified, use "not specified" for Energy and "none" for every other field.
   - If a field label appeared in another language, append that original label in parentheses
     to the key itself, e.g. "Fat (Zsír)".
3. The object must have exactly the two top-level keys "allergens" and "nutritional_values".

Text:
"#;

/// Build the user prompt for `text`.
///
/// Deterministic: the same text always yields byte-identical output, with
/// the text inserted verbatim after the instruction block.
pub fn extraction_prompt(text: &str) -> String {
    let mut prompt = String::with_capacity(EXTRACTION_PROMPT.len() + text.len());
    prompt.push_str(EXTRACTION_PROMPT);
    prompt.push_str(text);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_deterministic() {
        let text = "Ingredients: milk, wheat. Energy 250kJ/100g.";
        assert_eq!(extraction_prompt(text), extraction_prompt(text));
    }

    #[test]
    fn text_is_embedded_verbatim_at_the_end() {
        let text = "Zutaten: Milch, Weizen\n  Brennwert 250kJ ";
        let prompt = extraction_prompt(text);
        assert!(prompt.ends_with(text));
        assert_eq!(&prompt[..EXTRACTION_PROMPT.len()], EXTRACTION_PROMPT);
    }

    #[test]
    fn template_names_every_field_and_placeholder() {
        for field in NUTRITION_FIELDS {
            assert!(
                EXTRACTION_PROMPT.contains(&format!("\"{field}\"")),
                "missing {field}"
            );
        }
        assert!(EXTRACTION_PROMPT.contains("\"allergens\""));
        assert!(EXTRACTION_PROMPT.contains("\"nutritional_values\""));
        assert!(EXTRACTION_PROMPT.contains("\"not specified\""));
        assert!(EXTRACTION_PROMPT.contains("\"none\""));
    }

    #[test]
    fn directive_demands_json() {
        assert!(JSON_ONLY_DIRECTIVE.contains("JSON"));
    }
}
