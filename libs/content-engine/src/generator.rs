//! Template filling with rotation and duplicate rejection.
//!
//! One generation picks a template, picks fresh resources, samples the
//! template's variables, renders, and asks the [`UniquenessGuard`] whether
//! the body is new. Repeats are retried up to a fixed budget; the history
//! is committed exactly once, after acceptance.

use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

use crate::catalog::ResourceCatalog;
use crate::error::{EngineError, TemplateError};
use crate::guard::{fingerprint, UniquenessGuard};
use crate::history::GenerationHistory;
use crate::picker::Picker;
use crate::resource::Resource;
use crate::template::{render_pattern, ContactFooter, Template, TemplateKind, TemplateRegistry};

/// Attempts per generation before giving up on duplicates
pub const DEFAULT_RETRY_BUDGET: usize = 10;
/// Date format used in titles, e.g. "March 04, 2025"
pub const DATE_FORMAT: &str = "%B %d, %Y";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedPost {
    pub title: String,
    pub body: String,
    pub template: TemplateKind,
    pub resources: Vec<String>,
    pub fingerprint: String,
}

pub struct ContentGenerator<P: Picker> {
    registry: TemplateRegistry,
    footer: ContactFooter,
    guard: UniquenessGuard,
    picker: P,
    retry_budget: usize,
}

impl<P: Picker> ContentGenerator<P> {
    pub fn new(registry: TemplateRegistry, picker: P) -> Self {
        Self {
            registry,
            footer: ContactFooter::default(),
            guard: UniquenessGuard::default(),
            picker,
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }

    pub fn with_footer(mut self, footer: ContactFooter) -> Self {
        self.footer = footer;
        self
    }

    pub fn with_guard(mut self, guard: UniquenessGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_retry_budget(mut self, retry_budget: usize) -> Self {
        self.retry_budget = retry_budget.max(1);
        self
    }

    /// Refresh the catalog and generate one post dated today.
    ///
    /// An empty catalog gets one forced refresh before
    /// [`EngineError::NoResourcesAvailable`] is returned.
    pub async fn generate(
        &mut self,
        catalog: &mut ResourceCatalog,
        history: &mut GenerationHistory,
        max_age_hours: u64,
    ) -> Result<GeneratedPost, EngineError> {
        if catalog.refresh(max_age_hours).await.is_empty() {
            warn!("Catalog is empty, forcing refresh");
            if catalog.force_refresh().await.is_empty() {
                return Err(EngineError::NoResourcesAvailable);
            }
        }

        let today = Local::now().date_naive();
        self.generate_from(catalog.resources(), history, today)
    }

    /// Generate from an already loaded resource list.
    #[instrument(skip(self, resources, history), fields(catalog = resources.len()))]
    pub fn generate_from(
        &mut self,
        resources: &[Resource],
        history: &mut GenerationHistory,
        date: NaiveDate,
    ) -> Result<GeneratedPost, EngineError> {
        if resources.is_empty() {
            return Err(EngineError::NoResourcesAvailable);
        }

        // Restored if the accepted post cannot be recorded
        let before = history.clone();

        for attempt in 1..=self.retry_budget {
            let post = self.draft(resources, history, date)?;

            if self.guard.check_and_record(history, &post.body) {
                if let Err(e) = history.commit() {
                    *history = before;
                    warn!(error = %e, "Failed to commit history, discarding generated content");
                    return Err(e.into());
                }
                info!(
                    template = %post.template,
                    resources = ?post.resources,
                    attempt,
                    "Generated unique content"
                );
                return Ok(post);
            }

            debug!(attempt, template = %post.template, "Duplicate content, retrying");
        }

        warn!(attempts = self.retry_budget, "Content space exhausted for this history window");
        Err(EngineError::GenerationExhausted {
            attempts: self.retry_budget,
        })
    }

    fn draft(
        &mut self,
        resources: &[Resource],
        history: &mut GenerationHistory,
        date: NaiveDate,
    ) -> Result<GeneratedPost, EngineError> {
        let templates = self.registry.all();
        if templates.is_empty() {
            return Err(EngineError::NoResourcesAvailable);
        }
        let mut template = &templates[self.picker.pick_template(templates.len())];

        let fresh = history.fresh_resources(resources);

        if fresh.len() < template.resources_required() {
            let singles = self.registry.single_resource();
            if singles.is_empty() {
                return Err(EngineError::NoResourcesAvailable);
            }
            debug!(template = %template.kind, "Not enough resources, falling back to single-resource template");
            template = singles[self.picker.pick_template(singles.len())];
        }

        let chosen: Vec<&Resource> = self
            .picker
            .pick_resources(fresh.len(), template.resources_required())
            .into_iter()
            .map(|i| fresh[i])
            .collect();

        let mut variables = BTreeMap::new();
        for (key, pool) in &template.variable_pools {
            let value = pool
                .get(self.picker.pick_value(pool.len()))
                .ok_or_else(|| TemplateError::EmptyPool {
                    template: template.kind.to_string(),
                    placeholder: key.clone(),
                })?;
            variables.insert(key.clone(), value.clone());
        }

        let (title, body) = render_post(template, &chosen, &variables, date, &self.footer)?;

        for resource in &chosen {
            history.mark_used(&resource.name);
        }

        Ok(GeneratedPost {
            title,
            fingerprint: fingerprint(&body),
            body,
            template: template.kind,
            resources: chosen.iter().map(|r| r.name.clone()).collect(),
        })
    }
}

/// Render a template with fixed choices. Pure: the same inputs give the same output.
pub fn render_post(
    template: &Template,
    resources: &[&Resource],
    variables: &BTreeMap<String, String>,
    date: NaiveDate,
    footer: &ContactFooter,
) -> Result<(String, String), TemplateError> {
    let mut values = resource_values(resources);

    // Variables may reference resource fields, so fill them first
    let mut rendered_vars = Vec::with_capacity(variables.len());
    for (key, value) in variables {
        rendered_vars.push((key.clone(), render_pattern(template.kind, value, &values)?));
    }
    values.extend(rendered_vars);
    values.insert("date".to_string(), date.format(DATE_FORMAT).to_string());

    let title = render_pattern(template.kind, &template.title_pattern, &values)?;

    let sections = template
        .content_sections
        .iter()
        .map(|section| render_pattern(template.kind, section, &values))
        .collect::<Result<Vec<_>, _>>()?;

    let body = format!(
        "{}\n\n---\n\n{}\n\n{}\n\n{}",
        sections.join("\n\n"),
        render_pattern(template.kind, &template.call_to_action, &values)?,
        footer.render(),
        render_pattern(template.kind, &template.signoff, &values)?,
    );

    Ok((title, body))
}

fn resource_values(resources: &[&Resource]) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();

    if let Some(first) = resources.first() {
        values.insert("tool_name".to_string(), first.name.clone());
        values.insert("description".to_string(), first.description.clone());
        values.insert("category".to_string(), first.category.clone());
        values.insert("pricing".to_string(), first.pricing.clone());
        values.insert("use_case".to_string(), first.use_case.clone());
        values.insert("income_estimate".to_string(), first.income_estimate.clone());
    }
    for (i, resource) in resources.iter().enumerate() {
        values.insert(format!("tool{}", i + 1), resource.name.clone());
    }

    values
}
