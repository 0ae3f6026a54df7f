use super::*;

pub fn classify<'c>(
    contexts: &'c [ParameterContext],
    observation: &NumericObservation,
    text: &str,
) -> Vec<&'c ParameterContext> {
    contexts
        .iter()
        .filter(|context| context.accepts_unit(&observation.unit))
        .filter(|context| mentions_context(context, observation, text))
        .collect()
}

fn mentions_context(context: &ParameterContext, observation: &NumericObservation, text: &str) -> bool {
    let haystack = match context.proximity_chars {
        Some(radius) => &text[char_window(text, observation.start..observation.end, radius)],
        None => text,
    };
    context
        .patterns
        .iter()
        .any(|pattern| pattern.is_match(haystack))
}
