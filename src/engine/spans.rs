use super::*;

#[derive(Debug, Clone, Default)]
pub struct ClaimedSpans {
    spans: Vec<Range<usize>>,
}

impl ClaimedSpans {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlaps(&self, span: &Range<usize>) -> bool {
        let candidate = self.spans.partition_point(|claimed| claimed.end <= span.start);
        self.spans
            .get(candidate)
            .map(|claimed| claimed.start < span.end)
            .unwrap_or(false)
    }

    pub fn claim(&mut self, span: Range<usize>) -> bool {
        if span.is_empty() || self.overlaps(&span) {
            return false;
        }
        let position = self.spans.partition_point(|claimed| claimed.start < span.start);
        self.spans.insert(position, span);
        true
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }
}
