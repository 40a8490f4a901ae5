//! Options and accumulated results of a comparison.

use log::{info, warn};

/// Which fields a comparison looks at, and how.
///
/// Fields are addressed either by bare name (`nrows`, matching the field in
/// every record) or qualified by record tag (`RSMGGA.deltaz`).
/// An `include` entry wins over an `exclude` entry for the same field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffOptions {
    exclude: Vec<String>,
    include: Vec<String>,
    case_insensitive: Vec<String>,
}

impl DiffOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips the field when comparing.
    pub fn exclude(mut self, field: &str) -> Self {
        self.exclude.push(field.to_owned());
        self
    }

    /// Compares the field even if an `exclude` entry matches it.
    pub fn include(mut self, field: &str) -> Self {
        self.include.push(field.to_owned());
        self
    }

    /// Compares the field's string values ignoring case.
    pub fn case_insensitive(mut self, field: &str) -> Self {
        self.case_insensitive.push(field.to_owned());
        self
    }

    pub fn is_compared(&self, tag: &str, field: &str) -> bool {
        matches_any(&self.include, tag, field) || !matches_any(&self.exclude, tag, field)
    }

    pub fn ignores_case(&self, tag: &str, field: &str) -> bool {
        matches_any(&self.case_insensitive, tag, field)
    }
}

fn matches_any(patterns: &[String], tag: &str, field: &str) -> bool {
    patterns.iter().any(|pattern| match pattern.split_once('.') {
        Some((pattern_tag, pattern_field)) => pattern_tag == tag && pattern_field == field,
        None => pattern == field,
    })
}

/// State threaded through one comparison: options plus the differences found so far.
#[derive(Debug, Default)]
pub struct DiffContext {
    options: DiffOptions,
    differences: usize,
}

impl DiffContext {
    pub fn new(options: DiffOptions) -> Self {
        Self {
            options,
            differences: 0,
        }
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Number of differences reported so far.
    pub fn differences(&self) -> usize {
        self.differences
    }

    /// Records a difference at `location`.
    pub fn report(&mut self, location: &str, message: &str) {
        self.differences += 1;
        warn!("{location}: {message}");
    }

    /// Whether `field` of record `tag` is compared; logs the skip otherwise.
    pub fn is_compared(&self, tag: &str, field: &str) -> bool {
        let compared = self.options.is_compared(tag, field);
        if !compared {
            info!("Skipping excluded field {tag}.{field}");
        }
        compared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::not_listed("RSMGGA", "deltaz", true)]
    #[case::bare_name("RSMGGA", "iid", false)]
    #[case::other_tag_qualified("RSMECB", "nrg", true)]
    #[case::qualified("RSMGGA", "nrg", false)]
    #[case::included_over_excluded("RSMGGA", "edition", true)]
    fn field_filters(#[case] tag: &str, #[case] field: &str, #[case] compared: bool) {
        let options = DiffOptions::new()
            .exclude("iid")
            .exclude("RSMGGA.nrg")
            .exclude("edition")
            .include("RSMGGA.edition");
        assert_eq!(options.is_compared(tag, field), compared);
    }

    #[test]
    fn reports_are_counted() {
        let mut context = DiffContext::default();
        context.report("TRE ABC", "bodies differ");
        context.report("TRE DEF", "bodies differ");
        assert_eq!(context.differences(), 2);
    }
}
