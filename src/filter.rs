use crate::flatten::FlatExample;

/// What survives a [`NameFilter`].
#[derive(Debug)]
pub struct FilteredExamples {
    pub examples: Vec<FlatExample>,
    pub filtered: usize,
}

/// Selects examples by their full name.
///
/// Without any `filter` entries every name is included. Names matching a
/// `skip` entry are always dropped. By default entries match as substrings.
#[derive(Debug, Default, Clone)]
pub struct NameFilter {
    exact: bool,
    filter: Vec<String>,
    skip: Vec<String>,
}

impl NameFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exact(self, exact: bool) -> Self {
        Self { exact, ..self }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter.push(filter.into());
        self
    }

    pub fn with_skip(mut self, skip: impl Into<String>) -> Self {
        self.skip.push(skip.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_empty() && self.skip.is_empty()
    }

    fn matches(&self, name: &str, pattern: &str) -> bool {
        match self.exact {
            true => name == pattern,
            false => name.contains(pattern),
        }
    }

    pub fn includes(&self, name: &str) -> bool {
        let in_filter =
            self.filter.is_empty() || self.filter.iter().any(|filter| self.matches(name, filter));
        in_filter && !self.skip.iter().any(|skip| self.matches(name, skip))
    }

    pub fn filter(&self, examples: Vec<FlatExample>) -> FilteredExamples {
        if self.is_empty() {
            return FilteredExamples {
                examples,
                filtered: 0,
            };
        }

        let total = examples.len();
        let examples: Vec<_> = examples
            .into_iter()
            .filter(|example| self.includes(example.name()))
            .collect();
        FilteredExamples {
            filtered: total - examples.len(),
            examples,
        }
    }
}
