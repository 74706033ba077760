use super::*;

#[test]
fn default_options() {
    let options = GenerationOptions::default();

    assert!((options.temperature - 0.1).abs() < f32::EPSILON);
    assert!((options.top_p - 0.95).abs() < f32::EPSILON);
}

#[test]
fn answer_prompt_contains_both_parts() {
    let prompt = answer_prompt("When was it founded?", "Document: History\nFounded in 1901.");

    assert!(prompt.starts_with("Context:\n"));
    assert!(prompt.contains("Founded in 1901."));
    assert!(prompt.contains("Question: When was it founded?"));
}
