use std::collections::BTreeMap;

/// Maps an identifying code to a category tag, or `None` if the code carries no tag
/// this rule understands.
pub trait ClassificationRule {
    fn classify(&self, code: &str) -> Option<String>;
}

impl<F> ClassificationRule for F
where
    F: Fn(&str) -> Option<String>,
{
    fn classify(&self, code: &str) -> Option<String> {
        self(code)
    }
}

/// Reads the character at a fixed position of the code and looks it up in a table.
#[derive(Debug, Clone)]
pub struct CharAtRule {
    position: usize,
    tags: BTreeMap<char, String>,
}

impl CharAtRule {
    pub fn new(position: usize, tags: impl IntoIterator<Item = (char, String)>) -> Self {
        Self {
            position,
            tags: tags.into_iter().collect(),
        }
    }
}

impl ClassificationRule for CharAtRule {
    fn classify(&self, code: &str) -> Option<String> {
        let marker = code.chars().nth(self.position)?;
        self.tags.get(&marker).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Index into the classifier's category list.
    Known(usize),
    Unrecognized,
}

/// A rule bound to the closed set of categories the pipeline counts.
///
/// Tags returned by the rule that are not in the set are unrecognized.
#[derive(Debug, Clone)]
pub struct Classifier<R> {
    rule: R,
    categories: Vec<String>,
}

impl<R: ClassificationRule> Classifier<R> {
    pub fn new(rule: R, categories: Vec<String>) -> Self {
        Self { rule, categories }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn classify(&self, code: &str) -> Classification {
        match self.rule.classify(code) {
            Some(tag) => self
                .categories
                .iter()
                .position(|c| *c == tag)
                .map_or(Classification::Unrecognized, Classification::Known),
            None => Classification::Unrecognized,
        }
    }
}
