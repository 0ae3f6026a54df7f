use super::*;

pub fn categorize<'c>(categories: &'c [FactCategory], text: &str) -> Vec<&'c FactCategory> {
    categories
        .iter()
        .filter(|category| category.keywords.iter().any(|keyword| keyword.is_match(text)))
        .collect()
}

#[derive(Debug)]
pub struct CategoryScan<'a> {
    categories: &'a [FactCategory],
    assignments: Vec<CategoryAssignment>,
    counts: BTreeMap<&'a str, usize>,
    pages: BTreeMap<&'a str, BTreeSet<u32>>,
    uncategorized: usize,
}

impl<'a> CategoryScan<'a> {
    pub fn new(categories: &'a [FactCategory]) -> Self {
        Self {
            categories,
            assignments: Vec::new(),
            counts: BTreeMap::new(),
            pages: BTreeMap::new(),
            uncategorized: 0,
        }
    }

    pub fn observe(&mut self, fragment: &FactFragment) {
        let matched = categorize(self.categories, &fragment.text);
        if matched.is_empty() {
            self.uncategorized += 1;
            return;
        }

        for category in matched.iter().copied() {
            *self.counts.entry(category.name.as_str()).or_default() += 1;
            self.pages
                .entry(category.name.as_str())
                .or_default()
                .insert(fragment.page);
        }

        self.assignments.push(CategoryAssignment {
            fragment_index: fragment.index,
            page: fragment.page,
            categories: matched
                .iter()
                .map(|category| category.name.clone())
                .collect(),
        });
    }

    pub fn finish(self) -> CategoryReport {
        let breakdown = self
            .categories
            .iter()
            .map(|category| CategoryBreakdown {
                name: category.name.clone(),
                label: category.label.clone(),
                fragment_count: self
                    .counts
                    .get(category.name.as_str())
                    .copied()
                    .unwrap_or(0),
                pages: self
                    .pages
                    .get(category.name.as_str())
                    .map(|pages| pages.iter().copied().collect())
                    .unwrap_or_default(),
            })
            .collect();

        CategoryReport {
            assignments: self.assignments,
            breakdown,
            uncategorized_fragments: self.uncategorized,
        }
    }
}
