use super::*;

#[derive(Debug, Default)]
struct ItemProgress {
    matching_fragments: usize,
    evidence: Vec<GapEvidence>,
    seen_excerpts: HashSet<String>,
}

#[derive(Debug)]
pub struct GapScan<'a> {
    checklist: &'a Checklist,
    settings: &'a AnalysisSettings,
    progress: Vec<Vec<ItemProgress>>,
}

impl<'a> GapScan<'a> {
    pub fn new(checklist: &'a Checklist, settings: &'a AnalysisSettings) -> Self {
        let progress = checklist
            .sections
            .iter()
            .map(|section| {
                section
                    .items
                    .iter()
                    .map(|_| ItemProgress::default())
                    .collect()
            })
            .collect();

        Self {
            checklist,
            settings,
            progress,
        }
    }

    pub fn observe(&mut self, fragment: &FactFragment) {
        for (section, section_progress) in self.checklist.sections.iter().zip(&mut self.progress) {
            for (item, progress) in section.items.iter().zip(section_progress.iter_mut()) {
                let Some(found) = first_match(&item.patterns, &fragment.text) else {
                    continue;
                };
                progress.matching_fragments += 1;
                if progress.evidence.len() >= self.settings.max_evidence {
                    continue;
                }

                let excerpt =
                    excerpt_around(&fragment.text, found, self.settings.evidence_excerpt_chars);
                if progress.seen_excerpts.insert(excerpt_key(&excerpt)) {
                    progress.evidence.push(GapEvidence {
                        page: fragment.page,
                        fragment_index: fragment.index,
                        location: fragment.location_label().map(ToOwned::to_owned),
                        excerpt,
                    });
                }
            }
        }
    }

    pub fn finish(self) -> GapReport {
        let mut present = 0;
        let mut total = 0;
        let mut sections = Vec::with_capacity(self.checklist.sections.len());

        for (section, section_progress) in self.checklist.sections.iter().zip(self.progress) {
            let findings = section
                .items
                .iter()
                .zip(section_progress)
                .map(|(item, progress)| GapFinding {
                    id: item.id.clone(),
                    name: item.name.clone(),
                    status: if progress.matching_fragments > 0 {
                        GapStatus::Present
                    } else {
                        GapStatus::Missing
                    },
                    matching_fragments: progress.matching_fragments,
                    evidence: progress.evidence,
                })
                .collect::<Vec<GapFinding>>();

            let section_present = findings
                .iter()
                .filter(|finding| finding.status == GapStatus::Present)
                .count();
            present += section_present;
            total += findings.len();

            sections.push(GapSection {
                id: section.id.clone(),
                title: section.title.clone(),
                present: section_present,
                total: findings.len(),
                coverage: coverage(section_present, findings.len()),
                findings,
            });
        }

        GapReport {
            present,
            total,
            coverage: coverage(present, total),
            sections,
        }
    }
}

pub fn coverage(present: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        present as f64 / total as f64
    }
}

// Earliest hit across all of an item's patterns.
fn first_match(patterns: &[Regex], text: &str) -> Option<Range<usize>> {
    patterns
        .iter()
        .filter_map(|pattern| pattern.find(text))
        .min_by_key(|found| (found.start(), found.end()))
        .map(|found| found.range())
}

fn excerpt_key(excerpt: &str) -> String {
    normalize_whitespace(excerpt.trim_matches('.')).to_lowercase()
}
