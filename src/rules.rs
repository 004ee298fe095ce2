//! Site dialects described as data.
//!
//! Each news site is a [`SiteProfile`]: where its listing entries live, where
//! each field sits inside an entry, and where the body text lives on a
//! detail page. One generic scanner and one body extractor serve every
//! profile, so adding a site means adding a profile, either to the built-in
//! table below or to a YAML file passed with `--rules`.
//!
//! # Built-in sites
//!
//! | Name | Listing | Timestamps | Body quirk |
//! |------|---------|------------|------------|
//! | `bbc` | promo cards in the top-stories block | `<time datetime>` with a 5 char zone suffix | none |
//! | `sky` | site tiles | none (always in window) | falls back to `.content` |

use crate::document::{Query, compile_selector};
use crate::error::{NewsError, Result};
use once_cell::sync::Lazy;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};
use url::Url;

fn default_link_attribute() -> String {
    "href".to_string()
}

fn default_timestamp_attribute() -> Option<String> {
    Some("datetime".to_string())
}

fn default_paragraph_selector() -> String {
    "p".to_string()
}

fn default_title_selector() -> String {
    "h1".to_string()
}

fn default_category_limit() -> usize {
    15
}

/// Where each listing field lives in one site's markup. All selectors are CSS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub container_selector: String,
    pub entry_selector: String,
    pub title_selector: String,
    #[serde(default)]
    pub summary_selector: Option<String>,
    pub link_selector: String,
    #[serde(default = "default_link_attribute")]
    pub link_attribute: String,
    #[serde(default)]
    pub timestamp_selector: Option<String>,
    /// Attribute holding the raw timestamp; `None` reads the element text.
    #[serde(default = "default_timestamp_attribute")]
    pub timestamp_attribute: Option<String>,
    /// `chrono` format string; RFC 3339 is assumed when absent.
    #[serde(default)]
    pub timestamp_format: Option<String>,
    /// Fixed-length zone suffix to cut off the raw value before parsing.
    #[serde(default)]
    pub timestamp_suffix_len: usize,
}

/// An [`ExtractionRule`] with its selectors compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub container: Selector,
    pub entry: Selector,
    pub title: Selector,
    pub summary: Option<Selector>,
    pub link: Selector,
    pub link_attribute: String,
    pub timestamp: Option<Selector>,
    pub timestamp_attribute: Option<String>,
    pub timestamp_format: Option<String>,
    pub timestamp_suffix_len: usize,
}

impl ExtractionRule {
    /// Compile all selectors, optionally swapping in another container.
    pub fn compile(&self, container_override: Option<&str>) -> Result<CompiledRule> {
        let container = container_override.unwrap_or(&self.container_selector);
        Ok(CompiledRule {
            container: compile_selector(container)?,
            entry: compile_selector(&self.entry_selector)?,
            title: compile_selector(&self.title_selector)?,
            summary: self.summary_selector.as_deref().map(compile_selector).transpose()?,
            link: compile_selector(&self.link_selector)?,
            link_attribute: self.link_attribute.clone(),
            timestamp: self
                .timestamp_selector
                .as_deref()
                .map(compile_selector)
                .transpose()?,
            timestamp_attribute: self.timestamp_attribute.clone(),
            timestamp_format: self.timestamp_format.clone(),
            timestamp_suffix_len: self.timestamp_suffix_len,
        })
    }
}

/// Where the title and body paragraphs live on a detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyRule {
    pub container_selector: String,
    /// Tried when the primary containers yield no paragraphs.
    #[serde(default)]
    pub fallback_container_selector: Option<String>,
    #[serde(default = "default_paragraph_selector")]
    pub paragraph_selector: String,
    #[serde(default = "default_title_selector")]
    pub title_selector: String,
}

#[derive(Debug, Clone)]
pub struct CompiledBodyRule {
    pub container: Selector,
    pub fallback_container: Option<Selector>,
    pub paragraph: Selector,
    pub title: Selector,
}

impl BodyRule {
    pub fn compile(&self) -> Result<CompiledBodyRule> {
        Ok(CompiledBodyRule {
            container: compile_selector(&self.container_selector)?,
            fallback_container: self
                .fallback_container_selector
                .as_deref()
                .map(compile_selector)
                .transpose()?,
            paragraph: compile_selector(&self.paragraph_selector)?,
            title: compile_selector(&self.title_selector)?,
        })
    }
}

/// Everything the pipeline needs to know about one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    pub name: String,
    pub base_url: String,
    pub listing: ExtractionRule,
    /// Container used instead of `listing.container_selector` on category pages.
    #[serde(default)]
    pub category_container_selector: Option<String>,
    pub body: BodyRule,
    #[serde(default)]
    pub category_link_selector: Option<String>,
    #[serde(default = "default_category_limit")]
    pub category_limit: usize,
}

impl SiteProfile {
    /// URL of the listing page, with the category appended as a path segment.
    pub fn listing_url(&self, category: Option<&str>) -> Result<Url> {
        let raw = match category {
            Some(category) => format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                urlencoding::encode(&category.to_lowercase())
            ),
            None => self.base_url.clone(),
        };
        Ok(Url::parse(&raw)?)
    }

    /// Compile the listing rule for the given page kind.
    pub fn listing_rule(&self, category: Option<&str>) -> Result<CompiledRule> {
        let container = category.and(self.category_container_selector.as_deref());
        self.listing.compile(container)
    }
}

fn classed(tag: &str, class: &str) -> String {
    Query::tag(tag).with_class(class).to_css()
}

fn text_blocks() -> String {
    Query::tag("div").with_attr("data-component", "text-block").to_css()
}

static BUILTIN_PROFILES: Lazy<Vec<SiteProfile>> = Lazy::new(|| {
    vec![
        SiteProfile {
            name: "bbc".to_string(),
            base_url: "https://www.bbc.com/news".to_string(),
            listing: ExtractionRule {
                container_selector: Query::tag("div").with_id("news-top-stories-container").to_css(),
                entry_selector: classed("div", "nw-c-promo"),
                title_selector: classed("h3", "gs-c-promo-heading__title"),
                summary_selector: Some(classed("p", "gs-c-promo-summary")),
                link_selector: classed("a", "gs-c-promo-heading"),
                link_attribute: default_link_attribute(),
                timestamp_selector: Some("time".to_string()),
                timestamp_attribute: default_timestamp_attribute(),
                timestamp_format: Some("%Y-%m-%dT%H:%M:%S".to_string()),
                timestamp_suffix_len: 5,
            },
            category_container_selector: Some(Query::tag("div").with_id("topos-component").to_css()),
            body: BodyRule {
                container_selector: text_blocks(),
                fallback_container_selector: None,
                paragraph_selector: default_paragraph_selector(),
                title_selector: default_title_selector(),
            },
            category_link_selector: Some(classed("a", "nw-o-link")),
            category_limit: default_category_limit(),
        },
        SiteProfile {
            name: "sky".to_string(),
            base_url: "https://news.sky.com/".to_string(),
            listing: ExtractionRule {
                container_selector: classed("div", "sdc-site-tiles__group"),
                entry_selector: classed("div", "sdc-site-tile"),
                title_selector: classed("h3", "sdc-site-tile__headline"),
                summary_selector: None,
                link_selector: classed("a", "sdc-site-tile__headline-link"),
                link_attribute: default_link_attribute(),
                timestamp_selector: None,
                timestamp_attribute: None,
                timestamp_format: None,
                timestamp_suffix_len: 0,
            },
            category_container_selector: None,
            body: BodyRule {
                container_selector: text_blocks(),
                fallback_container_selector: Some(classed("div", "content")),
                paragraph_selector: default_paragraph_selector(),
                title_selector: default_title_selector(),
            },
            category_link_selector: Some(classed("a", "ui-news-header-nav-items-link")),
            category_limit: default_category_limit(),
        },
    ]
});

/// The set of known site profiles.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    profiles: Vec<SiteProfile>,
}

impl SiteRegistry {
    pub fn builtin() -> Self {
        Self {
            profiles: BUILTIN_PROFILES.clone(),
        }
    }

    /// Add profiles, replacing any existing profile with the same name.
    pub fn merge(&mut self, extra: Vec<SiteProfile>) {
        for profile in extra {
            match self.profiles.iter_mut().find(|p| p.name == profile.name) {
                Some(existing) => {
                    debug!(site = %profile.name, "Overriding site profile");
                    *existing = profile;
                }
                None => self.profiles.push(profile),
            }
        }
    }

    pub fn get(&self, name: &str) -> Result<&SiteProfile> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                NewsError::Config(format!(
                    "unknown site `{}` (known: {})",
                    name,
                    self.names().join(", ")
                ))
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Parse site profiles from YAML and check that every selector compiles.
pub fn parse_profiles(yaml: &str) -> Result<Vec<SiteProfile>> {
    let profiles: Vec<SiteProfile> = serde_yaml::from_str(yaml)?;
    for profile in &profiles {
        Url::parse(&profile.base_url)?;
        profile.listing.compile(profile.category_container_selector.as_deref())?;
        profile.listing.compile(None)?;
        profile.body.compile()?;
        if let Some(css) = &profile.category_link_selector {
            compile_selector(css)?;
        }
    }
    Ok(profiles)
}

/// Load extra site profiles from a YAML file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_profiles(path: &Path) -> Result<Vec<SiteProfile>> {
    let yaml = tokio::fs::read_to_string(path).await?;
    let profiles = parse_profiles(&yaml)?;
    info!(count = profiles.len(), "Loaded site profiles");
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
- name: example
  base_url: https://news.example.com
  listing:
    container_selector: main
    entry_selector: article
    title_selector: h2
    link_selector: a
    timestamp_selector: time
  body:
    container_selector: div.story
"#;

    #[test]
    fn test_builtin_profiles_compile() {
        let registry = SiteRegistry::builtin();
        assert_eq!(registry.names(), vec!["bbc", "sky"]);
        for name in registry.names() {
            let profile = registry.get(name).unwrap();
            assert!(profile.listing_rule(None).is_ok());
            assert!(profile.listing_rule(Some("world")).is_ok());
            assert!(profile.body.compile().is_ok());
        }
    }

    #[test]
    fn test_listing_url_with_category() {
        let registry = SiteRegistry::builtin();
        let bbc = registry.get("bbc").unwrap();
        assert_eq!(bbc.listing_url(None).unwrap().as_str(), "https://www.bbc.com/news");
        assert_eq!(
            bbc.listing_url(Some("World")).unwrap().as_str(),
            "https://www.bbc.com/news/world"
        );

        let sky = registry.get("SKY").unwrap();
        assert_eq!(sky.listing_url(None).unwrap().as_str(), "https://news.sky.com/");
        assert_eq!(
            sky.listing_url(Some("UK")).unwrap().as_str(),
            "https://news.sky.com/uk"
        );
    }

    #[test]
    fn test_unknown_site_lists_known_names() {
        let err = SiteRegistry::builtin().get("cnn").unwrap_err();
        assert!(err.to_string().contains("bbc, sky"));
    }

    #[test]
    fn test_parse_profiles_applies_defaults() {
        let profiles = parse_profiles(YAML).unwrap();
        assert_eq!(profiles.len(), 1);
        let p = &profiles[0];
        assert_eq!(p.listing.link_attribute, "href");
        assert_eq!(p.listing.timestamp_attribute.as_deref(), Some("datetime"));
        assert_eq!(p.listing.timestamp_suffix_len, 0);
        assert_eq!(p.body.paragraph_selector, "p");
        assert_eq!(p.body.title_selector, "h1");
        assert_eq!(p.category_limit, 15);
    }

    #[test]
    fn test_parse_profiles_rejects_bad_selector() {
        let bad = YAML.replace("entry_selector: article", "entry_selector: \"a[[\"");
        assert!(matches!(
            parse_profiles(&bad),
            Err(NewsError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_merge_overrides_by_name() {
        let mut registry = SiteRegistry::builtin();
        let mut replacement = registry.get("bbc").unwrap().clone();
        replacement.base_url = "https://www.bbc.co.uk/news".to_string();
        registry.merge(vec![replacement]);
        registry.merge(parse_profiles(YAML).unwrap());

        assert_eq!(registry.names(), vec!["bbc", "sky", "example"]);
        assert_eq!(
            registry.get("bbc").unwrap().base_url,
            "https://www.bbc.co.uk/news"
        );
    }

    #[tokio::test]
    async fn test_load_profiles_missing_file() {
        let err = load_profiles(Path::new("/nonexistent/rules.yaml")).await.unwrap_err();
        assert!(matches!(err, NewsError::Io(_)));
    }
}
