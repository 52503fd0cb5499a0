// Prompt builders for the seq2seq model. The `summarize:` prefix is the
// instruction format flan-t5 checkpoints were tuned on; the analysis prompt
// frames the resume text and the caller's query as a reading-comprehension
// question.

pub fn build_summarize_prompt(text: &str) -> String {
    format!("summarize: {text}")
}

pub fn build_analysis_prompt(resume_text: &str, query: &str) -> String {
    format!(
        "Based on the following resume text, answer the question. \
         Resume text: \"{resume_text}\". Question: \"{query}\""
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_prompt_prefix() {
        assert_eq!(
            build_summarize_prompt("five years of Rust"),
            "summarize: five years of Rust"
        );
    }

    #[test]
    fn test_analysis_prompt_embeds_text_and_query() {
        let prompt = build_analysis_prompt("five years of Rust", "Does this person know Rust?");
        assert_eq!(
            prompt,
            "Based on the following resume text, answer the question. \
             Resume text: \"five years of Rust\". Question: \"Does this person know Rust?\""
        );
    }

    #[test]
    fn test_analysis_prompt_keeps_quotes_in_query() {
        let prompt = build_analysis_prompt("text", "knows \"C++\"?");
        assert!(prompt.ends_with("Question: \"knows \"C++\"?\""));
    }
}
