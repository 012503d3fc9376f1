//! Built-in content templates and placeholder rendering.
//!
//! Patterns use `{name}` placeholders. Values come from three places:
//! the chosen resources, the generation date, and one value sampled from
//! each of the template's variable pools. Pool values may themselves
//! reference resource placeholders such as `{tool_name}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::TemplateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    ToolSpotlight,
    ComboStrategy,
    OpportunityAnalysis,
}

impl TemplateKind {
    /// Number of distinct resources the template is filled with.
    pub fn resources_required(&self) -> usize {
        match self {
            TemplateKind::ComboStrategy => 2,
            TemplateKind::ToolSpotlight | TemplateKind::OpportunityAnalysis => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::ToolSpotlight => "tool_spotlight",
            TemplateKind::ComboStrategy => "combo_strategy",
            TemplateKind::OpportunityAnalysis => "opportunity_analysis",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub kind: TemplateKind,
    pub title_pattern: String,
    pub content_sections: Vec<String>,
    /// Keyed by placeholder; ordered so that sampling consumes picks in a stable order.
    pub variable_pools: BTreeMap<String, Vec<String>>,
    pub call_to_action: String,
    pub signoff: String,
}

impl Template {
    pub fn resources_required(&self) -> usize {
        self.kind.resources_required()
    }
}

/// Contact lines appended to every generated body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFooter {
    pub email: String,
    pub instagram: String,
}

impl Default for ContactFooter {
    fn default() -> Self {
        Self {
            email: "your.email@example.com".to_string(),
            instagram: "https://instagram.com/youraccount".to_string(),
        }
    }
}

impl ContactFooter {
    pub fn render(&self) -> String {
        format!("📧 Email: {}\n📱 Instagram: {}", self.email, self.instagram)
    }
}

/// The fixed set of templates available to the generator.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateRegistry {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn builtin() -> Self {
        Self::new(vec![tool_spotlight(), combo_strategy(), opportunity_analysis()])
    }

    pub fn all(&self) -> &[Template] {
        &self.templates
    }

    pub fn single_resource(&self) -> Vec<&Template> {
        self.templates.iter().filter(|t| t.resources_required() == 1).collect()
    }
}

/// Substitute every `{placeholder}` in `pattern`.
///
/// Unknown placeholders and blank values are errors: a half-filled post is
/// worse than none.
pub fn render_pattern(
    template: TemplateKind,
    pattern: &str,
    values: &BTreeMap<String, String>,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| TemplateError::Unterminated {
            template: template.to_string(),
        })?;
        let placeholder = &after[..end];

        let value = values.get(placeholder).ok_or_else(|| TemplateError::UnknownPlaceholder {
            template: template.to_string(),
            placeholder: placeholder.to_string(),
        })?;
        if value.trim().is_empty() {
            return Err(TemplateError::BlankValue {
                template: template.to_string(),
                placeholder: placeholder.to_string(),
            });
        }

        out.push_str(value);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

fn pool(key: &str, values: &[&str]) -> (String, Vec<String>) {
    (key.to_string(), lines(values))
}

fn lines(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|s| s.to_string()).collect()
}

fn tool_spotlight() -> Template {
    Template {
        kind: TemplateKind::ToolSpotlight,
        title_pattern: "🛠️ {tool_name}: {benefit} - {date}".to_string(),
        content_sections: lines(&[
            "## Tool Spotlight: **{tool_name}**",
            "**What it does:** {description}",
            "**Income Potential:** {income_estimate}",
            "**Cost:** {pricing}",
            "**Implementation:** {implementation_steps}",
            "**Why it works:** {market_timing}",
            "**Pro tip:** {pro_tip}",
            "**🔥 Current Opportunity:**\n{current_opportunity}",
        ]),
        variable_pools: BTreeMap::from([
            pool(
                "benefit",
                &[
                    "Build Passive Income",
                    "Automate Everything",
                    "Scale Your Business",
                    "Generate Revenue",
                    "Save 10+ Hours/Week",
                ],
            ),
            pool(
                "market_timing",
                &[
                    "AI adoption is at tipping point",
                    "Competition is still low",
                    "Technology just reached reliability threshold",
                    "Market demand is exploding",
                ],
            ),
            pool(
                "implementation_steps",
                &["1. Sign up for {tool_name} and explore the interface\n2. Identify your most time-consuming manual process\n3. Design automation workflow using {tool_name}'s features\n4. Test with small-scale implementation\n5. Scale successful automations and monitor performance"],
            ),
            pool(
                "pro_tip",
                &[
                    "Start with {tool_name}'s templates - they're battle-tested workflows",
                    "Set up monitoring alerts so you know when {tool_name} automations need attention",
                    "Document your {tool_name} setups - you'll want to replicate successful configurations",
                    "Join {tool_name}'s community - users share incredible automation ideas",
                    "Use {tool_name}'s free trial to test everything before committing",
                ],
            ),
            pool(
                "current_opportunity",
                &[
                    "{tool_name} just released new features that most users haven't discovered yet",
                    "Market demand for {tool_name} automation services is outpacing supply",
                    "Early adopters of {tool_name} are reporting significant competitive advantages",
                    "The learning curve for {tool_name} keeps competition low while you scale",
                    "{tool_name}'s integration capabilities opened up new revenue possibilities",
                ],
            ),
        ]),
        call_to_action: "**Ready to implement {tool_name}?**\nI can walk you through the exact setup process.".to_string(),
        signoff: "*Building automated income streams, one tool at a time* 🤖".to_string(),
    }
}

fn combo_strategy() -> Template {
    Template {
        kind: TemplateKind::ComboStrategy,
        title_pattern: "💰 {tool1} + {tool2} = ${income} Passive Income - {date}".to_string(),
        content_sections: lines(&[
            "## The {tool1} + {tool2} Automation Stack",
            "**The Strategy:** {strategy_description}",
            "**Monthly Income:** ${income}/month",
            "**Setup Time:** {setup_time}",
            "**Tools:** {tool1} + {tool2}",
            "**Step-by-step:** {combo_steps}",
            "**Why this combo works:** {synergy_explanation}",
            "**🎯 Implementation Timeline:**\n{timeline}",
        ]),
        variable_pools: BTreeMap::from([
            pool("income", &["1,200", "2,500", "1,800", "3,200", "2,800", "4,500"]),
            pool("setup_time", &["1-2 weeks", "2-3 weeks", "3-4 weeks", "1 week"]),
            pool(
                "strategy_description",
                &[
                    "Leverage AI content generation with automated distribution",
                    "Combine visual creation with systematic marketing",
                    "Merge data automation with customer acquisition",
                ],
            ),
            pool(
                "combo_steps",
                &["1. Set up {tool1} for core automation\n2. Configure {tool2} for complementary processes\n3. Connect the tools via API or Zapier integration\n4. Test the combined workflow with small data set\n5. Scale the system and add monitoring"],
            ),
            pool(
                "synergy_explanation",
                &[
                    "{tool1} handles the heavy lifting while {tool2} optimizes the results",
                    "{tool1} creates the content and {tool2} distributes it automatically",
                    "{tool1} gathers the data and {tool2} turns it into actionable insights",
                    "{tool1} manages the workflow and {tool2} handles customer communication",
                ],
            ),
            pool(
                "timeline",
                &["Week 1: Master {tool1} basics\nWeek 2: Implement {tool2} integration\nWeek 3: Test combined workflow\nWeek 4: Scale and optimize"],
            ),
        ]),
        call_to_action: "**Need help setting up this combo?**\nI've implemented {tool1} + {tool2} systems before.".to_string(),
        signoff: "*Two tools, infinite possibilities* 🚀".to_string(),
    }
}

fn opportunity_analysis() -> Template {
    Template {
        kind: TemplateKind::OpportunityAnalysis,
        title_pattern: "🚀 {opportunity_type} Opportunity: {tool_name} - {date}".to_string(),
        content_sections: lines(&[
            "## Market Opportunity: {opportunity_type}",
            "**The Gap:** {market_gap}",
            "**The Solution:** {tool_name}",
            "**Revenue Model:** {revenue_model}",
            "**Implementation:** {implementation}",
            "**Market Timing:** {timing_analysis}",
            "**Getting Started:** {action_steps}",
            "**📊 Market Data:**\n{market_data}",
        ]),
        variable_pools: BTreeMap::from([
            pool(
                "opportunity_type",
                &[
                    "Emerging AI Niche",
                    "Automation Gap",
                    "Content Scalability",
                    "Workflow Optimization",
                    "Revenue Generation",
                ],
            ),
            pool(
                "market_gap",
                &[
                    "Most people don't know this exists",
                    "Complex setup prevents adoption",
                    "High demand, low competition",
                    "Perfect timing for early adopters",
                ],
            ),
            pool(
                "revenue_model",
                &[
                    "Subscription automation services",
                    "Content-as-a-Service model",
                    "Automated affiliate income",
                    "SaaS tool reselling",
                ],
            ),
            pool(
                "implementation",
                &["Phase 1: {tool_name} Foundation Setup\nPhase 2: Process Identification and Mapping\nPhase 3: Automation Design and Testing\nPhase 4: Full Deployment and Monitoring\nPhase 5: Optimization and Scaling"],
            ),
            pool(
                "timing_analysis",
                &[
                    "{tool_name} adoption is still in early stages - perfect time to establish expertise",
                    "Market conditions favor {tool_name} implementations right now",
                    "Technology maturity of {tool_name} just reached the reliability threshold",
                    "Competition is low while demand for {tool_name} services is growing rapidly",
                ],
            ),
            pool(
                "action_steps",
                &["1. Research {tool_name} case studies in your industry\n2. Identify highest-impact automation opportunities\n3. Design pilot implementation plan\n4. Execute small-scale test\n5. Document results and scale successful processes"],
            ),
            pool(
                "market_data",
                &["- {tool_name} market growing at 40-60% annually\n- 85% of businesses still using manual processes\n- Early adopters reporting 300-500% ROI\n- Implementation complexity keeps competition manageable"],
            ),
        ]),
        call_to_action: "**Want to capitalize on this opportunity?**\nI can show you the exact implementation strategy.".to_string(),
        signoff: "*Spotting opportunities before they become obvious* 👁️".to_string(),
    }
}
