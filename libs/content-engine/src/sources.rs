use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use select::document::Document;
use select::predicate::{Name, Predicate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{ConfigError, SourceError};
use crate::extract_domain;
use crate::resource::Resource;

/// Maximum number of tools taken from a link page
const MAX_LINKS_PER_SOURCE: usize = 20;
/// Maximum number of tools taken from a mention page
const MAX_MENTIONS_PER_SOURCE: usize = 15;
/// Names this short are navigation noise, not products
const MIN_NAME_CHARS: usize = 4;

const LINK_KEYWORDS: [&str; 6] = ["ai", "automation", "machine learning", "bot", "workflow", "api"];

const MENTION_PATTERNS: [&str; 4] = [
    r"([A-Z][a-zA-Z]+\.ai)",
    r"([A-Z][a-zA-Z]+AI)",
    r"(GPT-\d+)",
    r"([A-Z][a-zA-Z]+ AI)",
];

const LINK_INCOME: [&str; 3] = ["$500-2K/month", "$1-3K/month", "$800-2.5K/month"];
const MENTION_PRICING: [&str; 4] = ["$29/month", "$49/month", "$19/month", "Free + Premium"];
const MENTION_INCOME: [&str; 4] = ["$1.2K/month", "$2.8K/month", "$1.8K/month", "$3.5K/month"];

/// Configuration for a catalog source
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub url: String,
}

impl SourceConfig {
    pub fn new(name: &str, source_type: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            source_type: source_type.to_string(),
            url: url.to_string(),
        }
    }
}

/// The sources used when no sources file is configured.
pub fn default_source_configs() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new("free-for.dev", "links", "https://free-for.dev/"),
        SourceConfig::new("Pareto AI blog", "mentions", "https://blog.pareto.io/es/melhores-ias/"),
        SourceConfig::new("Curated directory", "directory", ""),
    ]
}

pub fn load_source_configs(path: &Path) -> Result<Vec<SourceConfig>, ConfigError> {
    let data = std::fs::read(path).map_err(|e| ConfigError::SourcesFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_slice(&data).map_err(|e| ConfigError::SourcesFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// A producer of catalog resources. Failures are per source.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<Resource>, SourceError>;
}

pub fn build_sources(
    configs: &[SourceConfig],
    fetcher: &PageFetcher,
) -> Result<Vec<Box<dyn ResourceSource>>, ConfigError> {
    let mut sources: Vec<Box<dyn ResourceSource>> = Vec::with_capacity(configs.len());
    for config in configs {
        match config.source_type.as_str() {
            "links" => sources.push(Box::new(LinkSource::new(&config.name, &config.url, fetcher.clone()))),
            "mentions" => sources.push(Box::new(MentionSource::new(&config.name, &config.url, fetcher.clone())?)),
            "directory" => sources.push(Box::new(DirectorySource::curated(&config.name))),
            other => {
                return Err(ConfigError::UnknownSourceType {
                    name: config.name.clone(),
                    source_type: other.to_string(),
                })
            }
        }
    }
    Ok(sources)
}

// --- HTTP ---

/// Create a shared HTTP client with configured timeout
pub fn create_http_client(timeout_secs: u64) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36")
        .build()
        .map_err(ConfigError::from)
}

/// Page downloads with exponential backoff on transient failures.
#[derive(Clone, Debug)]
pub struct PageFetcher {
    client: reqwest::Client,
    max_retry_elapsed: Duration,
}

impl PageFetcher {
    pub fn new(client: reqwest::Client, max_retry_elapsed: Duration) -> Self {
        Self { client, max_retry_elapsed }
    }

    #[instrument(skip(self, url), fields(url_domain = %extract_domain(url)))]
    pub async fn fetch_with_retry(&self, url: &str) -> Result<String, SourceError> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_retry_elapsed),
            ..Default::default()
        };

        retry(backoff, || async move {
            match self.fetch(url).await {
                Ok(body) => Ok(body),
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "Transient fetch error, retrying");
                    Err(backoff::Error::transient(e))
                }
                Err(e) => {
                    warn!(error = %e, "Permanent fetch error, not retrying");
                    Err(backoff::Error::permanent(e))
                }
            }
        })
        .await
    }

    async fn fetch(&self, url: &str) -> Result<String, SourceError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!(status = %status, "Page response received");

        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response.text().await?)
    }
}

// --- Link pages ---

/// Tools linked from a curated "free for developers" style page.
pub struct LinkSource {
    name: String,
    url: String,
    fetcher: PageFetcher,
}

impl LinkSource {
    pub fn new(name: &str, url: &str, fetcher: PageFetcher) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            fetcher,
        }
    }
}

#[async_trait]
impl ResourceSource for LinkSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<Resource>, SourceError> {
        let html = self.fetcher.fetch_with_retry(&self.url).await?;
        let resources = extract_link_resources(&html, &mut rand::thread_rng());
        debug!(source = %self.name, count = resources.len(), "Extracted linked tools");
        Ok(resources)
    }
}

pub fn extract_link_resources<R: Rng>(html: &str, rng: &mut R) -> Vec<Resource> {
    let document = Document::from(html);
    let mut names = BTreeSet::new();
    let mut resources = Vec::new();

    for node in document.find(Name("a")) {
        let href = match node.attr("href") {
            Some(href) if !href.is_empty() => href,
            _ => continue,
        };
        let text = node.text();
        let lowered = text.to_lowercase();
        if !LINK_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            continue;
        }

        let tool_name = text.trim().to_string();
        if tool_name.chars().count() < MIN_NAME_CHARS || !names.insert(tool_name.clone()) {
            continue;
        }

        let topic = lowered.trim();
        resources.push(
            Resource::new(tool_name)
                .with_description(format!("Free tier AI/automation tool for {}", topic))
                .with_category("automation")
                .with_pricing("Free tier available")
                .with_use_case(format!("Automate {} processes", topic))
                .with_income_estimate(choose(&LINK_INCOME, rng))
                .with_url(href),
        );

        if resources.len() >= MAX_LINKS_PER_SOURCE {
            break;
        }
    }

    resources
}

// --- Mention pages ---

/// Product names mentioned in the prose of a review/blog page.
pub struct MentionSource {
    name: String,
    url: String,
    fetcher: PageFetcher,
    patterns: Vec<Regex>,
}

impl MentionSource {
    pub fn new(name: &str, url: &str, fetcher: PageFetcher) -> Result<Self, ConfigError> {
        Ok(Self {
            name: name.to_string(),
            url: url.to_string(),
            fetcher,
            patterns: compile_mention_patterns()?,
        })
    }
}

pub fn compile_mention_patterns() -> Result<Vec<Regex>, ConfigError> {
    MENTION_PATTERNS
        .iter()
        .map(|p| Regex::new(p).map_err(ConfigError::from))
        .collect()
}

#[async_trait]
impl ResourceSource for MentionSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<Resource>, SourceError> {
        let html = self.fetcher.fetch_with_retry(&self.url).await?;
        let mut rng = rand::thread_rng();
        let resources: Vec<Resource> = extract_mentions(&html, &self.patterns)
            .into_iter()
            .map(|name| {
                let use_case = use_case_for(&name, &mut rng);
                Resource::new(name)
                    .with_description("Advanced AI tool for content and automation")
                    .with_category("ai_generation")
                    .with_pricing(choose(&MENTION_PRICING, &mut rng))
                    .with_use_case(use_case)
                    .with_income_estimate(choose(&MENTION_INCOME, &mut rng))
                    .with_url(&self.url)
            })
            .collect();
        debug!(source = %self.name, count = resources.len(), "Extracted mentioned tools");
        Ok(resources)
    }
}

/// Distinct product mentions in paragraph, heading and list text, sorted.
pub fn extract_mentions(html: &str, patterns: &[Regex]) -> Vec<String> {
    let document = Document::from(html);
    let mut mentioned = BTreeSet::new();

    for node in document.find(Name("p").or(Name("h2")).or(Name("h3")).or(Name("li"))) {
        let text = node.text();
        for pattern in patterns {
            for m in pattern.find_iter(&text) {
                mentioned.insert(m.as_str().to_string());
            }
        }
    }

    mentioned
        .into_iter()
        .filter(|name| name.chars().count() >= MIN_NAME_CHARS)
        .take(MAX_MENTIONS_PER_SOURCE)
        .collect()
}

// --- Curated directory ---

/// A fixed list of well-known tools; never touches the network.
pub struct DirectorySource {
    name: String,
    entries: Vec<Resource>,
}

impl DirectorySource {
    pub fn new(name: &str, entries: Vec<Resource>) -> Self {
        Self {
            name: name.to_string(),
            entries,
        }
    }

    pub fn curated(name: &str) -> Self {
        Self::new(name, curated_directory())
    }
}

#[async_trait]
impl ResourceSource for DirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<Resource>, SourceError> {
        Ok(self.entries.clone())
    }
}

// (name, description, category, pricing, use case, income)
const CURATED: [(&str, &str, &str, &str, &str, &str); 14] = [
    ("ChatGPT-4 Turbo", "Most advanced conversational AI with 128k context window", "content_generation", "$20/month", "Content writing, code generation, analysis", "$2,000-8,000/month"),
    ("Claude 3.5 Sonnet", "Superior reasoning and coding capabilities", "content_generation", "$20/month", "Complex analysis, coding, creative writing", "$1,500-6,000/month"),
    ("Gemini Advanced", "Google's multimodal AI with real-time capabilities", "content_generation", "$20/month", "Research, analysis, multimodal content", "$1,200-5,000/month"),
    ("Midjourney V6", "Photorealistic image generation with incredible detail", "image_video", "$30/month", "Digital art, marketing visuals, product design", "$3,000-12,000/month"),
    ("Runway Gen-2", "AI video generation from text and images", "image_video", "$95/month", "Video content, advertising, social media", "$5,000-20,000/month"),
    ("Zapier", "Connect 6,000+ apps with no-code automation", "automation", "$29.99/month", "Workflow automation, data sync, notifications", "$1,500-10,000/month"),
    ("Make (Integromat)", "Visual automation platform with advanced logic", "automation", "$29/month", "Complex workflows, data processing, API integration", "$2,000-12,000/month"),
    ("Vercept", "Natural language automation for e-commerce", "automation", "$47/month", "E-commerce automation, inventory management", "$3,000-15,000/month"),
    ("Notion AI", "AI-powered workspace for notes, docs, and databases", "productivity", "$10/month", "Knowledge management, content planning, project management", "$800-3,000/month"),
    ("Motion", "AI calendar and task management that plans your day", "productivity", "$34/month", "Time management, scheduling, productivity optimization", "$1,000-4,000/month"),
    ("Otter.ai", "AI meeting transcription and note-taking", "productivity", "$16.99/month", "Meeting notes, interview transcription, content creation", "$500-2,500/month"),
    ("Copy.ai", "AI copywriting for marketing and sales", "marketing", "$49/month", "Ad copy, email marketing, sales pages", "$2,500-10,000/month"),
    ("Jasper AI", "Enterprise-grade AI content marketing platform", "marketing", "$59/month", "Long-form content, brand voice, marketing campaigns", "$3,000-15,000/month"),
    ("Synthesia", "AI video creation with digital avatars", "marketing", "$90/month", "Training videos, marketing content, presentations", "$4,000-18,000/month"),
];

const DIRECTORY_NAMES: [&str; 16] = [
    "Make.com", "Bubble", "Webflow", "Airtable", "Monday.com", "ConvertKit", "Mailchimp", "HubSpot",
    "Canva", "Figma", "Todoist", "Reclaim", "Loom", "Calendly", "Riverside", "Descript",
];
const DIRECTORY_CATEGORIES: [&str; 4] = ["productivity", "automation", "design", "marketing"];
const DIRECTORY_PRICING: [&str; 4] = ["$39/month", "$67/month", "$29/month", "Free + Paid tiers"];
const DIRECTORY_INCOME: [&str; 4] = ["$1.5K/month", "$2.2K/month", "$3.8K/month", "$1.8K/month"];

pub fn curated_directory() -> Vec<Resource> {
    let curated = CURATED.iter().map(|(name, description, category, pricing, use_case, income)| {
        Resource::new(*name)
            .with_description(*description)
            .with_category(*category)
            .with_pricing(*pricing)
            .with_use_case(*use_case)
            .with_income_estimate(*income)
    });

    let listed = DIRECTORY_NAMES.iter().enumerate().map(|(i, name)| {
        Resource::new(*name)
            .with_description("Professional automation platform for modern businesses")
            .with_category(DIRECTORY_CATEGORIES[i % DIRECTORY_CATEGORIES.len()])
            .with_pricing(DIRECTORY_PRICING[i % DIRECTORY_PRICING.len()])
            .with_use_case(format!("Scale business operations with {}", name))
            .with_income_estimate(DIRECTORY_INCOME[i % DIRECTORY_INCOME.len()])
            .with_url(format!("https://{}.com", name.to_lowercase().replace('.', "")))
    });

    curated.chain(listed).collect()
}

fn choose<R: Rng>(pool: &[&str], rng: &mut R) -> String {
    pool.choose(rng).copied().unwrap_or_default().to_string()
}

fn use_case_for<R: Rng>(tool_name: &str, rng: &mut R) -> String {
    let phrasings = [
        format!("Automate content creation with {}", tool_name),
        format!("Build passive income streams using {}", tool_name),
        format!("Scale business operations with {}", tool_name),
        format!("Generate revenue through {} automation", tool_name),
        format!("Create systematic workflows with {}", tool_name),
    ];
    phrasings.choose(rng).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_extract_link_resources_filters_by_keyword() {
        let html = r#"<html><body>
            <a href="https://a.example">Workflow Builder</a>
            <a href="https://b.example">Pricing</a>
            <a href="https://c.example">AI</a>
            <a href="">Chatbot Kit</a>
            <a href="https://d.example">Chatbot Kit</a>
            <a href="https://e.example">Workflow Builder</a>
        </body></html>"#;

        let mut rng = StdRng::seed_from_u64(7);
        let resources = extract_link_resources(html, &mut rng);
        let names: Vec<&str> = resources.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, vec!["Workflow Builder", "Chatbot Kit"]);
        assert_eq!(resources[0].url, "https://a.example");
        assert_eq!(resources[1].url, "https://d.example");
        assert_eq!(resources[0].category, "automation");
        assert!(LINK_INCOME.contains(&resources[0].income_estimate.as_str()));
    }

    #[test]
    fn test_extract_link_resources_caps_per_source() {
        let links: String = (0..40)
            .map(|i| format!(r#"<a href="https://x{i}.example">Automation Tool {i}</a>"#))
            .collect();
        let html = format!("<html><body>{}</body></html>", links);

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(extract_link_resources(&html, &mut rng).len(), MAX_LINKS_PER_SOURCE);
    }

    #[test]
    fn test_extract_mentions_matches_product_patterns() {
        let html = r#"<html><body>
            <h2>Best tools</h2>
            <p>We compared Jasper AI, Otter.ai and OpenAI models like GPT-4.</p>
            <li>Also try Copy.ai</li>
            <div>Hidden.ai is not scanned</div>
        </body></html>"#;

        let patterns = compile_mention_patterns().unwrap();
        let mentions = extract_mentions(html, &patterns);

        assert!(mentions.contains(&"Jasper AI".to_string()));
        assert!(mentions.contains(&"Otter.ai".to_string()));
        assert!(mentions.contains(&"OpenAI".to_string()));
        assert!(mentions.contains(&"GPT-4".to_string()));
        assert!(mentions.contains(&"Copy.ai".to_string()));
        assert!(!mentions.iter().any(|m| m.starts_with("Hidden")));

        let mut sorted = mentions.clone();
        sorted.sort();
        assert_eq!(mentions, sorted);
    }

    #[test]
    fn test_curated_directory_has_unique_complete_entries() {
        let directory = curated_directory();
        let names: BTreeSet<&str> = directory.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names.len(), directory.len());
        for resource in &directory {
            assert!(!resource.description.is_empty());
            assert!(!resource.pricing.is_empty());
            assert!(!resource.income_estimate.is_empty());
            assert!(!resource.use_case.is_empty());
        }
    }

    #[test]
    fn test_build_sources_rejects_unknown_type() {
        let fetcher = PageFetcher::new(reqwest::Client::new(), Duration::from_secs(1));
        let configs = vec![SourceConfig::new("feed", "rss", "https://example.com/feed")];

        match build_sources(&configs, &fetcher) {
            Err(ConfigError::UnknownSourceType { name, source_type }) => {
                assert_eq!(name, "feed");
                assert_eq!(source_type, "rss");
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("expected unknown source type error"),
        }
    }

    #[test]
    fn test_build_default_sources() {
        let fetcher = PageFetcher::new(reqwest::Client::new(), Duration::from_secs(1));
        let sources = build_sources(&default_source_configs(), &fetcher).unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["free-for.dev", "Pareto AI blog", "Curated directory"]);
    }

    #[test]
    fn test_source_config_deserialization() {
        let json = r#"[
            {"name": "Links", "type": "links", "url": "https://free-for.dev/"},
            {"name": "Directory", "type": "directory"}
        ]"#;

        let configs: Vec<SourceConfig> = serde_json::from_str(json).unwrap();
        assert_eq!(configs[0].source_type, "links");
        assert_eq!(configs[1].url, "");
    }
}
