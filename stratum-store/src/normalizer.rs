/// Identifier normalization policy.
///
/// Every identifier comparison in the engine goes through one configured
/// policy and byte-wise string comparison, never locale-aware collation,
/// so ordering is stable regardless of host locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalizer {
    /// Trim surrounding whitespace and uppercase.
    #[default]
    Uppercase,
    /// Trim surrounding whitespace, preserve case.
    TrimOnly,
}

impl Normalizer {
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();

        match self {
            Normalizer::Uppercase => trimmed.to_uppercase(),
            Normalizer::TrimOnly => trimmed.to_owned(),
        }
    }

    pub fn normalize_opt(&self, raw: Option<&str>) -> Option<String> {
        raw.map(|raw| self.normalize(raw))
    }
}
