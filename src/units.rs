use std::collections::{BTreeMap, HashSet};

use anyhow::{Result, bail};
use serde::Serialize;

use crate::config::UnitRegistryFile;

const FACTOR_ONE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitEntry {
    pub unit: String,
    pub quantity: String,
    pub base_unit: String,
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantity {
    pub name: String,
    pub base_unit: String,
    pub prefix: bool,
    pub units: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized<'a> {
    pub base_unit: &'a str,
    pub factor: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    quantities: Vec<Quantity>,
    entries: BTreeMap<String, UnitEntry>,
}

impl UnitRegistry {
    pub fn from_file(file: &UnitRegistryFile) -> Result<Self> {
        if file.quantities.is_empty() {
            bail!("unit registry declares no quantities");
        }

        let mut quantities = Vec::with_capacity(file.quantities.len());
        let mut entries = BTreeMap::<String, UnitEntry>::new();
        let mut quantity_names = HashSet::<String>::new();

        for definition in &file.quantities {
            let name = definition.quantity.trim().to_string();
            if name.is_empty() {
                bail!("unit registry contains a quantity without a name");
            }
            if !quantity_names.insert(name.clone()) {
                bail!("unit registry declares quantity '{name}' more than once");
            }
            if definition.units.is_empty() {
                bail!("unit registry quantity '{name}' declares no units");
            }

            let base_unit = normalize_unit(&definition.base_unit);
            let mut units = Vec::with_capacity(definition.units.len());
            for unit_definition in &definition.units {
                let unit = normalize_unit(&unit_definition.unit);
                let factor = unit_definition.factor;
                if !factor.is_finite() || factor <= 0.0 {
                    bail!(
                        "unit '{}' in quantity '{name}' has invalid factor {factor}",
                        unit_definition.unit
                    );
                }
                if let Some(existing) = entries.get(&unit) {
                    bail!(
                        "unit '{unit}' is declared in both '{}' and '{name}'",
                        existing.quantity
                    );
                }

                entries.insert(
                    unit.clone(),
                    UnitEntry {
                        unit: unit.clone(),
                        quantity: name.clone(),
                        base_unit: base_unit.clone(),
                        factor,
                    },
                );
                units.push(unit);
            }

            match entries.get(&base_unit) {
                Some(entry) if entry.quantity == name => {
                    if (entry.factor - 1.0).abs() > FACTOR_ONE_TOLERANCE {
                        bail!(
                            "base unit '{base_unit}' of quantity '{name}' must have factor 1, found {}",
                            entry.factor
                        );
                    }
                }
                _ => bail!("base unit '{base_unit}' is not declared within quantity '{name}'"),
            }

            quantities.push(Quantity {
                name,
                base_unit,
                prefix: definition.prefix,
                units,
            });
        }

        Ok(Self {
            quantities,
            entries,
        })
    }

    pub fn lookup(&self, raw_unit: &str) -> Option<&UnitEntry> {
        self.entries.get(&normalize_unit(raw_unit))
    }

    pub fn contains(&self, raw_unit: &str) -> bool {
        self.lookup(raw_unit).is_some()
    }

    pub fn normalize(&self, raw_unit: &str, value: f64) -> Option<Normalized<'_>> {
        let entry = self.lookup(raw_unit)?;
        Some(Normalized {
            base_unit: &entry.base_unit,
            factor: entry.factor,
            value: value * entry.factor,
        })
    }

    pub fn convert(&self, value: f64, from: &str, to: &str) -> Option<f64> {
        let from = self.lookup(from)?;
        let to = self.lookup(to)?;
        if from.quantity != to.quantity {
            return None;
        }
        Some(value * from.factor / to.factor)
    }

    pub fn quantities(&self) -> &[Quantity] {
        &self.quantities
    }

    pub fn entries(&self) -> impl Iterator<Item = &UnitEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

pub fn normalize_unit(raw: &str) -> String {
    let mapped = raw
        .chars()
        .map(|character| match character {
            '²' => '2',
            '³' => '3',
            'µ' | 'μ' => 'u',
            'º' => '°',
            other => other,
        })
        .collect::<String>()
        .to_lowercase();

    let collapsed = mapped.split_whitespace().collect::<Vec<&str>>().join(" ");
    singularize_last_word(&collapsed)
}

fn singularize_last_word(unit: &str) -> String {
    let split_at = unit
        .rfind(|character: char| character == ' ' || character == '/')
        .map(|index| index + 1)
        .unwrap_or(0);
    let (head, word) = unit.split_at(split_at);

    if !word.chars().all(|character| character.is_ascii_alphabetic()) {
        return unit.to_string();
    }

    let singular = if word.len() >= 5 && word.ends_with("ies") {
        format!("{}y", &word[..word.len() - 3])
    } else if word.len() >= 4 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    };

    format!("{head}{singular}")
}

// Plural forms accepted by the extractor mirror `singularize_last_word`.
pub fn pluralizable_suffix(unit: &str) -> Option<&'static str> {
    let word = unit
        .rsplit(|character: char| character == ' ' || character == '/')
        .next()
        .unwrap_or(unit);
    if word.len() < 3 || !word.chars().all(|character| character.is_ascii_alphabetic()) {
        return None;
    }
    if word.ends_with('s') {
        return None;
    }
    if word.ends_with('y') {
        Some("y")
    } else {
        Some("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{QuantityDefinition, UnitDefinition};

    fn registry_file(quantities: Vec<QuantityDefinition>) -> UnitRegistryFile {
        UnitRegistryFile { quantities }
    }

    fn quantity(name: &str, base: &str, units: &[(&str, f64)]) -> QuantityDefinition {
        QuantityDefinition {
            quantity: name.to_string(),
            base_unit: base.to_string(),
            prefix: false,
            units: units
                .iter()
                .map(|(unit, factor)| UnitDefinition {
                    unit: unit.to_string(),
                    factor: *factor,
                })
                .collect(),
        }
    }

    #[test]
    fn normalize_unit_folds_case_superscripts_and_plurals() {
        assert_eq!(normalize_unit("Hectares"), "hectare");
        assert_eq!(normalize_unit("km²"), "km2");
        assert_eq!(normalize_unit("µg/m³"), "ug/m3");
        assert_eq!(normalize_unit("sq   m"), "sq m");
        assert_eq!(normalize_unit("Families"), "family");
        assert_eq!(normalize_unit("persons"), "person");
        assert_eq!(normalize_unit("m3/days"), "m3/day");
        assert_eq!(normalize_unit("ha"), "ha");
        assert_eq!(normalize_unit(""), "");
    }

    #[test]
    fn pluralizable_suffix_matches_singularization() {
        assert_eq!(pluralizable_suffix("hectare"), Some(""));
        assert_eq!(pluralizable_suffix("family"), Some("y"));
        assert_eq!(pluralizable_suffix("m3/day"), Some("y"));
        assert_eq!(pluralizable_suffix("ha"), None);
        assert_eq!(pluralizable_suffix("km2"), None);
    }

    #[test]
    fn registry_rejects_duplicate_units_across_quantities() {
        let file = registry_file(vec![
            quantity("length", "m", &[("m", 1.0)]),
            quantity("other", "m", &[("m", 1.0)]),
        ]);
        let error = UnitRegistry::from_file(&file).expect_err("duplicate unit must fail");
        assert!(error.to_string().contains("declared in both"));
    }

    #[test]
    fn registry_rejects_missing_base_unit_and_bad_factor() {
        let missing_base = registry_file(vec![quantity("area", "sq m", &[("ha", 10000.0)])]);
        assert!(UnitRegistry::from_file(&missing_base).is_err());

        let bad_factor = registry_file(vec![quantity("area", "sq m", &[("sq m", 1.0), ("ha", 0.0)])]);
        let error = UnitRegistry::from_file(&bad_factor).expect_err("zero factor must fail");
        assert!(error.to_string().contains("invalid factor"));
    }

    #[test]
    fn registry_normalizes_into_base_unit() {
        let file = registry_file(vec![quantity(
            "area",
            "sq m",
            &[("sq m", 1.0), ("ha", 10000.0), ("km2", 1_000_000.0)],
        )]);
        let registry = UnitRegistry::from_file(&file).expect("registry loads");

        let normalized = registry.normalize("ha", 5000.0).expect("ha is known");
        assert_eq!(normalized.base_unit, "sq m");
        assert_eq!(normalized.value, 50_000_000.0);
        assert!(registry.normalize("furlong", 1.0).is_none());
        assert_eq!(registry.convert(2.0, "km²", "ha"), Some(200.0));
    }
}
