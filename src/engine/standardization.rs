use super::*;

pub fn check_unit_standardization(
    observations: &[NormalizedObservation],
    contexts: &[ParameterContext],
    settings: &AnalysisSettings,
) -> Vec<UnitIssue> {
    let mut by_context = BTreeMap::<&str, BTreeMap<&str, Vec<&NormalizedObservation>>>::new();
    for observation in observations {
        by_context
            .entry(observation.context.as_str())
            .or_default()
            .entry(observation.observation.unit.as_str())
            .or_default()
            .push(observation);
    }

    by_context
        .into_iter()
        .filter(|(_, units)| units.len() > 1)
        .map(|(context, units)| {
            let definition = contexts.iter().find(|definition| definition.name == context);
            let usages = units
                .iter()
                .map(|(unit, members)| UnitUsage {
                    unit: unit.to_string(),
                    base_unit: members[0].base_unit.clone(),
                    occurrences: members.len(),
                    examples: unit_examples(members, settings.unit_issue_examples),
                })
                .collect::<Vec<UnitUsage>>();

            UnitIssue {
                context: context.to_string(),
                label: definition
                    .map(|definition| definition.label.clone())
                    .unwrap_or_else(|| context.to_string()),
                distinct_units: units.keys().map(|unit| unit.to_string()).collect(),
                recommended_unit: definition
                    .map(|definition| definition.preferred_unit.clone())
                    .unwrap_or_default(),
                usages,
            }
        })
        .collect()
}

fn unit_examples(members: &[&NormalizedObservation], limit: usize) -> Vec<UnitExample> {
    let mut seen_fragments = HashSet::<usize>::new();
    members
        .iter()
        .filter(|member| seen_fragments.insert(member.observation.fragment_index))
        .take(limit)
        .map(|member| UnitExample {
            page: member.observation.page,
            fragment_index: member.observation.fragment_index,
            value: member.observation.value,
            excerpt: member.observation.excerpt.clone(),
        })
        .collect()
}
