/// Conjunctive criteria applied before sampling
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFilters {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub min_score: f64,
}

impl Default for SampleFilters {
    fn default() -> Self {
        Self {
            category: None,
            tag: None,
            min_score: 0.0,
        }
    }
}

impl SampleFilters {
    /// Builds filters from raw request parameters.
    ///
    /// Empty strings count as "not supplied", and `min_score` goes through
    /// [`parse_min_score`] so bad input never becomes an error.
    pub fn from_params(
        category: Option<String>,
        tag: Option<String>,
        min_score: Option<&str>,
    ) -> Self {
        Self {
            category: category.filter(|c| !c.is_empty()),
            tag: tag.filter(|t| !t.is_empty()),
            min_score: parse_min_score(min_score),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }
}

/// Parses the minimum score threshold, falling back to 0 when the value is
/// absent or unparseable.
///
/// `nan` parses like any other float; since no score compares `>=` NaN, such
/// a threshold matches nothing.
pub fn parse_min_score(raw: Option<&str>) -> f64 {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}
