use super::*;

const NUMBER_PATTERN: &str = r"(?P<number>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)";
const SCALE_PATTERN: &str = r"(?:\s*(?P<scale>million|billion|thousand|mn|bn)\b)?";
const BARE_RULE: &str = "bare";
const UNREGISTERED_RULE: &str = "unregistered";

const REFERENCE_WORDS: &[&str] = &[
    "annex", "appendix", "article", "chapter", "clause", "fig", "figure", "item", "no", "page",
    "para", "paragraph", "part", "phase", "schedule", "section", "stage", "step", "table",
    "volume",
];

const MONTH_WORDS: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep",
    "sept", "oct", "nov", "dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    Prefix,
    Suffix,
    Bare,
}

#[derive(Debug, Clone)]
struct ExtractionRule {
    name: String,
    kind: RuleKind,
    regex: Regex,
}

#[derive(Debug, Clone)]
pub struct ValueExtractor {
    rules: Vec<ExtractionRule>,
    excerpt_chars: usize,
}

impl ValueExtractor {
    pub fn new(
        registry: &UnitRegistry,
        contexts: &[ParameterContext],
        excerpt_chars: usize,
    ) -> Result<Self> {
        let mut rules = Vec::new();

        for quantity in registry.quantities().iter().filter(|quantity| quantity.prefix) {
            if let Some(rule) = unit_rule(
                &format!("{}_prefix", quantity.name),
                RuleKind::Prefix,
                &quantity.units,
            )? {
                rules.push(rule);
            }
        }

        for quantity in registry.quantities() {
            if let Some(rule) = unit_rule(&quantity.name, RuleKind::Suffix, &quantity.units)? {
                rules.push(rule);
            }
        }

        let unregistered = contexts
            .iter()
            .flat_map(|context| context.valid_units.iter())
            .filter(|unit| !unit.is_empty() && !registry.contains(unit))
            .cloned()
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect::<Vec<String>>();
        if let Some(rule) = unit_rule(UNREGISTERED_RULE, RuleKind::Suffix, &unregistered)? {
            rules.push(rule);
        }

        let bare = Regex::new(&format!("(?i){NUMBER_PATTERN}{SCALE_PATTERN}"))
            .context("failed to compile bare number rule")?;
        rules.push(ExtractionRule {
            name: BARE_RULE.to_string(),
            kind: RuleKind::Bare,
            regex: bare,
        });

        debug!(rules = rules.len(), "built extraction rules");

        Ok(Self {
            rules,
            excerpt_chars,
        })
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name.as_str()).collect()
    }

    pub fn extract(&self, fragment: &FactFragment) -> Vec<NumericObservation> {
        let text = fragment.text.as_str();
        let mut claimed = ClaimedSpans::new();
        let mut observations = Vec::new();

        for rule in &self.rules {
            let mut position = 0;
            while position < text.len() {
                let Some(captures) = rule.regex.captures_at(text, position) else {
                    break;
                };
                let Some(whole) = captures.get(0) else {
                    break;
                };

                match self.accept(rule, &captures, fragment, &mut claimed) {
                    Some(observation) => {
                        observations.push(observation);
                        position = whole.end().max(next_char_boundary(text, whole.start()));
                    }
                    None => position = next_char_boundary(text, whole.start()),
                }
            }
        }

        observations.sort_by(|left, right| {
            left.start
                .cmp(&right.start)
                .then(left.end.cmp(&right.end))
        });
        debug!(
            fragment = fragment.index,
            claimed_spans = claimed.len(),
            "extracted numeric observations"
        );
        observations
    }

    fn accept(
        &self,
        rule: &ExtractionRule,
        captures: &Captures<'_>,
        fragment: &FactFragment,
        claimed: &mut ClaimedSpans,
    ) -> Option<NumericObservation> {
        let text = fragment.text.as_str();
        let number = captures.name("number")?;
        let scale = captures.name("scale");
        let unit = captures.name("unit");
        let numeric_end = scale.map(|value| value.end()).unwrap_or(number.end());

        let (start, end) = match rule.kind {
            RuleKind::Suffix => (number.start(), unit?.end()),
            RuleKind::Prefix => (unit?.start(), numeric_end),
            RuleKind::Bare => (number.start(), numeric_end),
        };

        if !starts_cleanly(text, start) || !ends_cleanly(text, end, rule.kind != RuleKind::Suffix)
        {
            return None;
        }

        if rule.kind == RuleKind::Bare
            && scale.is_none()
            && (looks_like_year(number.as_str())
                || follows_word(text, start, REFERENCE_WORDS)
                || follows_word(text, start, MONTH_WORDS)
                || precedes_word(text, end, MONTH_WORDS)
                || within_numeric_range(text, start, end))
        {
            return None;
        }

        let magnitude = number
            .as_str()
            .replace(',', "")
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())?;
        let multiplier = scale
            .map(|value| scale_multiplier(value.as_str()))
            .unwrap_or(1.0);

        if !claimed.claim(start..end) {
            return None;
        }

        let raw_unit = unit
            .map(|value| value.as_str().to_string())
            .unwrap_or_default();

        Some(NumericObservation {
            fragment_index: fragment.index,
            page: fragment.page,
            value: magnitude * multiplier,
            number_text: number.as_str().to_string(),
            scale: scale.map(|value| value.as_str().to_ascii_lowercase()),
            unit: normalize_unit(&raw_unit),
            raw_unit,
            start,
            end,
            matched_text: text[start..end].to_string(),
            rule: rule.name.clone(),
            excerpt: excerpt_around(text, start..end, self.excerpt_chars),
        })
    }
}

fn unit_rule(name: &str, kind: RuleKind, units: &[String]) -> Result<Option<ExtractionRule>> {
    let mut forms = units
        .iter()
        .map(String::as_str)
        .filter(|unit| !unit.is_empty())
        .collect::<Vec<&str>>();
    if forms.is_empty() {
        return Ok(None);
    }

    forms.sort_by(|left, right| right.len().cmp(&left.len()).then(left.cmp(right)));
    forms.dedup();

    let alternation = forms
        .iter()
        .map(|unit| unit_surface_pattern(unit))
        .collect::<Vec<String>>()
        .join("|");

    let pattern = match kind {
        RuleKind::Prefix => {
            format!(r"(?i)(?P<unit>{alternation})\s*{NUMBER_PATTERN}{SCALE_PATTERN}")
        }
        RuleKind::Suffix | RuleKind::Bare => {
            format!(r"(?i){NUMBER_PATTERN}{SCALE_PATTERN}\s*(?P<unit>{alternation})")
        }
    };

    let regex = Regex::new(&pattern)
        .with_context(|| format!("failed to compile extraction rule '{name}'"))?;

    Ok(Some(ExtractionRule {
        name: name.to_string(),
        kind,
        regex,
    }))
}

pub fn unit_surface_pattern(unit: &str) -> String {
    let plural = pluralizable_suffix(unit);
    let stem = match plural {
        Some("y") => &unit[..unit.len() - 1],
        _ => unit,
    };

    let characters = stem.chars().collect::<Vec<char>>();
    let mut pattern = String::new();
    for (position, character) in characters.iter().copied().enumerate() {
        let previous = position
            .checked_sub(1)
            .and_then(|index| characters.get(index))
            .copied();
        let next = characters.get(position + 1).copied();
        let after_letter = previous.is_some_and(|value| value.is_ascii_alphabetic());

        match character {
            ' ' => pattern.push_str(r"\s+"),
            '2' if after_letter => pattern.push_str("[2²]"),
            '3' if after_letter => pattern.push_str("[3³]"),
            'u' if next == Some('g') && !after_letter => pattern.push_str("[uµμ]"),
            '°' => pattern.push_str("[°º]"),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }

    match plural {
        Some("y") => pattern.push_str("(?:ys?|ies)"),
        Some(_) => pattern.push_str("s?"),
        None => {}
    }
    pattern
}

fn scale_multiplier(scale: &str) -> f64 {
    match scale.to_ascii_lowercase().as_str() {
        "thousand" => 1e3,
        "million" | "mn" => 1e6,
        "billion" | "bn" => 1e9,
        _ => 1.0,
    }
}

fn next_char_boundary(text: &str, index: usize) -> usize {
    text[index..]
        .chars()
        .next()
        .map(|character| index + character.len_utf8())
        .unwrap_or(text.len())
}

fn starts_cleanly(text: &str, start: usize) -> bool {
    let mut before = text[..start].chars().rev();
    match before.next() {
        None => true,
        Some(character) if character.is_alphanumeric() => false,
        Some('.' | ',') => !before.next().is_some_and(|value| value.is_ascii_digit()),
        Some(_) => true,
    }
}

fn ends_cleanly(text: &str, end: usize, numeric_tail: bool) -> bool {
    let mut after = text[end..].chars();
    match after.next() {
        None => true,
        Some(character) if character.is_alphanumeric() => false,
        Some('.' | ',') if numeric_tail => !after.next().is_some_and(|value| value.is_ascii_digit()),
        Some(_) => true,
    }
}

fn looks_like_year(number: &str) -> bool {
    number.len() == 4
        && number.chars().all(|character| character.is_ascii_digit())
        && number
            .parse::<u32>()
            .map(|year| (1900..=2100).contains(&year))
            .unwrap_or(false)
}

fn follows_word(text: &str, start: usize, words: &[&str]) -> bool {
    let before = text[..start].trim_end_matches([' ', '\t', '#']);
    if before.len() == text[..start].len() {
        return false;
    }
    let word = before
        .trim_end_matches('.')
        .rsplit(|character: char| !character.is_alphabetic())
        .next()
        .unwrap_or_default()
        .to_lowercase();
    words.contains(&word.as_str())
}

fn within_numeric_range(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].trim_end_matches(' ');
    let mut previous = before.chars().rev();
    if matches!(previous.next(), Some('-' | '–'))
        && previous
            .find(|character| *character != ' ')
            .is_some_and(|character| character.is_ascii_digit())
    {
        return true;
    }

    let after = text[end..].trim_start_matches(' ');
    let mut next = after.chars();
    matches!(next.next(), Some('-' | '–'))
        && next
            .find(|character| *character != ' ')
            .is_some_and(|character| character.is_ascii_digit())
}

fn precedes_word(text: &str, end: usize, words: &[&str]) -> bool {
    let after = &text[end..];
    let trimmed = after.trim_start_matches([' ', '\t']);
    if trimmed.len() == after.len() {
        return false;
    }
    let word = trimmed
        .split(|character: char| !character.is_alphabetic())
        .next()
        .unwrap_or_default()
        .to_lowercase();
    words.contains(&word.as_str())
}
