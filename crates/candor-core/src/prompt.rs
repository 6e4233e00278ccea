//! The classification prompt.

/// Template for one classification call. Placeholders are substituted
/// with trimmed row text; the output rules pin the model to a single
/// JSON object so the parser has a fighting chance.
const PROMPT_TEMPLATE: &str = "\
Investor question:
{question}

Manager response:
{answer}

A research assistant has marked the above response as including a
statement that reflects unwillingness or inability to answer (part) of the
analysts' question, because of the following comment(s):
> {comments}

Based on the question and full response above, provide a detailed
assessment whether the manager's response includes a statement,
explanation, or justification indicating an inability or unwillingness to
answer the question. If you classify the response as reflecting inability
or unwillingness to answer, justify your classification with specific
phrases or sentences from the manager's response. If there's no such
indication, explain why not.

IMPORTANT OUTPUT RULES:
1) Output MUST be exactly ONE valid JSON object.
2) Do NOT include markdown code fences.
3) Do NOT include any extra text before or after the JSON.

Return JSON in this exact format:
{
  \"assessment\": \"a detailed assessment unique to this evaluation\",
  \"your_classification\": 1
}
";

/// Build the prompt for one row. Empty comments fall back to "N/A".
pub fn make_prompt(question: &str, answer: &str, comments: &str) -> String {
    let comments = if comments.trim().is_empty() {
        "N/A"
    } else {
        comments.trim()
    };
    PROMPT_TEMPLATE
        .replace("{question}", question.trim())
        .replace("{answer}", answer.trim())
        .replace("{comments}", comments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_trimmed_fields() {
        let prompt = make_prompt("  Why?  ", "  Because.  ", "flagged by RA");
        assert!(prompt.contains("Investor question:\nWhy?"));
        assert!(prompt.contains("Manager response:\nBecause."));
        assert!(prompt.contains("> flagged by RA"));
    }

    #[test]
    fn empty_comments_fall_back_to_na() {
        let prompt = make_prompt("q", "a", "   ");
        assert!(prompt.contains("> N/A"));
    }

    #[test]
    fn output_rules_survive_substitution() {
        let prompt = make_prompt("q", "a", "N/A");
        assert!(prompt.contains("exactly ONE valid JSON object"));
        assert!(prompt.contains("\"your_classification\": 1"));
        // No unexpanded placeholders left behind.
        assert!(!prompt.contains("{question}"));
        assert!(!prompt.contains("{answer}"));
        assert!(!prompt.contains("{comments}"));
    }
}
