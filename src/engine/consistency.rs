use super::*;

const RELATIVE_EPSILON: f64 = 1e-9;

pub fn check_consistency(
    observations: &[NormalizedObservation],
    contexts: &[ParameterContext],
    settings: &AnalysisSettings,
) -> Vec<ParameterComparison> {
    let mut groups = BTreeMap::<(&str, &str), Vec<&NormalizedObservation>>::new();
    for observation in observations {
        groups
            .entry((observation.context.as_str(), observation.base_unit.as_str()))
            .or_default()
            .push(observation);
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|((context, base_unit), members)| {
            compare_group(context, base_unit, members, contexts, settings)
        })
        .collect()
}

// Zero minimum with a positive maximum counts as a full (100%) divergence.
pub fn relative_difference(min: f64, max: f64) -> f64 {
    if min > 0.0 {
        (max - min) / min
    } else if max > 0.0 {
        1.0
    } else {
        0.0
    }
}

pub fn severity_for(relative: f64, settings: &AnalysisSettings) -> Option<Severity> {
    if exceeds(relative, settings.high_severity_threshold) {
        Some(Severity::High)
    } else if exceeds(relative, settings.significance_threshold) {
        Some(Severity::Medium)
    } else {
        None
    }
}

// A difference within rounding noise of a threshold counts as sitting on it.
fn exceeds(relative: f64, threshold: f64) -> bool {
    relative > threshold + RELATIVE_EPSILON
}

fn compare_group(
    context: &str,
    base_unit: &str,
    mut members: Vec<&NormalizedObservation>,
    contexts: &[ParameterContext],
    settings: &AnalysisSettings,
) -> ParameterComparison {
    members.sort_by(|left, right| {
        left.observation
            .page
            .cmp(&right.observation.page)
            .then(left.observation.fragment_index.cmp(&right.observation.fragment_index))
            .then(left.observation.start.cmp(&right.observation.start))
    });

    let values = members
        .iter()
        .map(|member| ComparedValue {
            page: member.observation.page,
            fragment_index: member.observation.fragment_index,
            value: member.observation.value,
            raw_unit: member.observation.raw_unit.clone(),
            normalized_value: member.normalized_value,
            excerpt: member.observation.excerpt.clone(),
        })
        .collect::<Vec<ComparedValue>>();

    let min_value = values
        .iter()
        .map(|value| value.normalized_value)
        .fold(f64::INFINITY, f64::min);
    let max_value = values
        .iter()
        .map(|value| value.normalized_value)
        .fold(f64::NEG_INFINITY, f64::max);

    let identical_raw = values.iter().all(|value| value.value == values[0].value);
    let identical_normalized = approx_equal(min_value, max_value);

    let (percent_difference, severity) = if identical_normalized {
        (0.0, None)
    } else {
        let relative = relative_difference(min_value, max_value);
        let severity = if identical_raw {
            None
        } else {
            severity_for(relative, settings)
        };
        (relative * 100.0, severity)
    };

    let label = contexts
        .iter()
        .find(|definition| definition.name == context)
        .map(|definition| definition.label.clone())
        .unwrap_or_else(|| context.to_string());

    ParameterComparison {
        context: context.to_string(),
        label,
        base_unit: base_unit.to_string(),
        member_count: values.len(),
        min_value,
        max_value,
        min_pages: pages_at(&values, min_value),
        max_pages: pages_at(&values, max_value),
        percent_difference,
        severity,
        values,
    }
}

fn pages_at(values: &[ComparedValue], target: f64) -> Vec<u32> {
    values
        .iter()
        .filter(|value| approx_equal(value.normalized_value, target))
        .map(|value| value.page)
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect()
}

fn approx_equal(left: f64, right: f64) -> bool {
    left == right || (left - right).abs() <= RELATIVE_EPSILON * left.abs().max(right.abs())
}
