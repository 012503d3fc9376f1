use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One catalogued tool used as filler data for generated content.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    pub description: String,
    pub category: String,
    pub pricing: String,
    pub use_case: String,
    pub income_estimate: String,
    #[serde(default)]
    pub url: String,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category: String::new(),
            pricing: String::new(),
            use_case: String::new(),
            income_estimate: String::new(),
            url: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_pricing(mut self, pricing: impl Into<String>) -> Self {
        self.pricing = pricing.into();
        self
    }

    pub fn with_use_case(mut self, use_case: impl Into<String>) -> Self {
        self.use_case = use_case.into();
        self
    }

    pub fn with_income_estimate(mut self, income_estimate: impl Into<String>) -> Self {
        self.income_estimate = income_estimate.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

/// Drop blank names and duplicates, keeping the first occurrence of each name.
pub fn dedup_by_name(resources: Vec<Resource>) -> Vec<Resource> {
    let mut seen = HashSet::new();
    resources
        .into_iter()
        .filter(|r| !r.name.trim().is_empty())
        .filter(|r| seen.insert(r.name.clone()))
        .collect()
}
