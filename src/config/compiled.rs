use super::*;

#[derive(Debug, Clone)]
pub struct ParameterContext {
    pub name: String,
    pub label: String,
    pub patterns: Vec<Regex>,
    pub valid_units: BTreeSet<String>,
    pub preferred_unit: String,
    pub proximity_chars: Option<usize>,
}

impl ParameterContext {
    pub fn accepts_unit(&self, unit: &str) -> bool {
        self.valid_units.contains(&normalize_unit(unit))
    }
}

#[derive(Debug, Clone)]
pub struct FactCategory {
    pub name: String,
    pub label: String,
    pub keywords: Vec<Regex>,
}

#[derive(Debug, Clone)]
pub struct ChecklistItem {
    pub id: String,
    pub name: String,
    pub patterns: Vec<Regex>,
}

#[derive(Debug, Clone)]
pub struct ChecklistSection {
    pub id: String,
    pub title: String,
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone)]
pub struct Checklist {
    pub sections: Vec<ChecklistSection>,
}

impl Checklist {
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|section| section.items.len()).sum()
    }
}

pub fn compile_pattern(pattern: &str, owner: &str) -> Result<Regex> {
    if pattern.trim().is_empty() {
        bail!("{owner} contains an empty pattern");
    }
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("{owner} has an invalid pattern: {pattern}"))
}

fn label_or_name(label: Option<&String>, name: &str) -> String {
    label
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| name.to_string())
}

pub fn compile_contexts(
    file: &ContextsFile,
    registry: &UnitRegistry,
) -> Result<Vec<ParameterContext>> {
    if file.contexts.is_empty() {
        bail!("context table declares no contexts");
    }

    let mut names = HashSet::<String>::new();
    let mut contexts = Vec::with_capacity(file.contexts.len());

    for definition in &file.contexts {
        let name = definition.name.trim().to_string();
        if name.is_empty() {
            bail!("context table contains a context without a name");
        }
        if !names.insert(name.clone()) {
            bail!("context '{name}' is declared more than once");
        }
        if definition.patterns.is_empty() {
            bail!("context '{name}' declares no recognition patterns");
        }
        if definition.valid_units.is_empty() {
            bail!("context '{name}' declares no valid units");
        }

        let owner = format!("context '{name}'");
        let patterns = definition
            .patterns
            .iter()
            .map(|pattern| compile_pattern(pattern, &owner))
            .collect::<Result<Vec<Regex>>>()?;

        let valid_units = definition
            .valid_units
            .iter()
            .map(|unit| normalize_unit(unit))
            .collect::<BTreeSet<String>>();
        for unit in &valid_units {
            if !registry.contains(unit) {
                warn!(
                    context = %name,
                    unit = %unit,
                    "context unit is not in the unit registry; its observations cannot be normalized"
                );
            }
        }

        let preferred_unit = normalize_unit(&definition.preferred_unit);
        if !valid_units.contains(&preferred_unit) {
            bail!(
                "preferred unit '{}' of context '{name}' is not one of its valid units",
                definition.preferred_unit
            );
        }

        if definition.proximity_chars == Some(0) {
            bail!("context '{name}' sets proximity_chars to 0");
        }

        contexts.push(ParameterContext {
            label: label_or_name(definition.label.as_ref(), &name),
            name,
            patterns,
            valid_units,
            preferred_unit,
            proximity_chars: definition.proximity_chars,
        });
    }

    Ok(contexts)
}

pub fn compile_categories(file: &CategoriesFile) -> Result<Vec<FactCategory>> {
    if file.categories.is_empty() {
        bail!("category table declares no categories");
    }

    let mut names = HashSet::<String>::new();
    let mut categories = Vec::with_capacity(file.categories.len());

    for definition in &file.categories {
        let name = definition.name.trim().to_string();
        if name.is_empty() {
            bail!("category table contains a category without a name");
        }
        if !names.insert(name.clone()) {
            bail!("category '{name}' is declared more than once");
        }
        if definition.keywords.is_empty() {
            bail!("category '{name}' declares no keywords");
        }

        let owner = format!("category '{name}'");
        let keywords = definition
            .keywords
            .iter()
            .map(|keyword| compile_pattern(keyword, &owner))
            .collect::<Result<Vec<Regex>>>()?;

        categories.push(FactCategory {
            label: label_or_name(definition.label.as_ref(), &name),
            name,
            keywords,
        });
    }

    Ok(categories)
}

pub fn compile_checklist(file: &ChecklistFile) -> Result<Checklist> {
    if file.sections.is_empty() {
        bail!("checklist declares no sections");
    }

    let mut section_ids = HashSet::<String>::new();
    let mut item_ids = HashSet::<String>::new();
    let mut sections = Vec::with_capacity(file.sections.len());

    for section in &file.sections {
        let section_id = section.id.trim().to_string();
        if section_id.is_empty() {
            bail!("checklist contains a section without an id");
        }
        if !section_ids.insert(section_id.clone()) {
            bail!("checklist section '{section_id}' is declared more than once");
        }
        if section.items.is_empty() {
            bail!("checklist section '{section_id}' declares no items");
        }

        let mut items = Vec::with_capacity(section.items.len());
        for item in &section.items {
            let item_id = item.id.trim().to_string();
            if item_id.is_empty() {
                bail!("checklist section '{section_id}' contains an item without an id");
            }
            if !item_ids.insert(item_id.clone()) {
                bail!("checklist item '{item_id}' is declared more than once");
            }
            if item.patterns.is_empty() {
                bail!("checklist item '{item_id}' declares no patterns");
            }

            let owner = format!("checklist item '{item_id}'");
            let patterns = item
                .patterns
                .iter()
                .map(|pattern| compile_pattern(pattern, &owner))
                .collect::<Result<Vec<Regex>>>()?;

            items.push(ChecklistItem {
                id: item_id,
                name: item.name.trim().to_string(),
                patterns,
            });
        }

        sections.push(ChecklistSection {
            id: section_id,
            title: section.title.trim().to_string(),
            items,
        });
    }

    Ok(Checklist { sections })
}
