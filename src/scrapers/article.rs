//! Detail page body extraction.
//!
//! Body text lives in one or more container blocks; paragraphs are gathered
//! container by container in the order given, each paragraph at most once
//! even when containers nest.

use crate::document::{Document, Element};
use crate::models::ArticleBody;
use crate::rules::CompiledBodyRule;
use scraper::Selector;
use std::collections::HashSet;
use tracing::debug;

/// Extract title and paragraphs using the rule's primary containers.
pub fn extract_body(document: &Document, rule: &CompiledBodyRule) -> ArticleBody {
    let containers = document.find_all(&rule.container);
    extract_body_from(document, &containers, rule)
}

/// Extract from caller-chosen containers instead of the rule's own selector.
///
/// Lets a caller retry against a different block of an already parsed page.
pub fn extract_body_from(
    document: &Document,
    containers: &[Element<'_>],
    rule: &CompiledBodyRule,
) -> ArticleBody {
    ArticleBody {
        title: extract_title(document, &rule.title),
        paragraphs: collect_paragraphs(containers, &rule.paragraph),
    }
}

/// Primary extraction, then the rule's fallback containers if that came up empty.
pub fn extract_article(document: &Document, rule: &CompiledBodyRule) -> ArticleBody {
    let body = extract_body(document, rule);
    if !body.is_empty() {
        return body;
    }
    match &rule.fallback_container {
        Some(fallback) => {
            let containers = document.find_all(fallback);
            debug!(containers = containers.len(), "Primary body empty; using fallback containers");
            extract_body_from(document, &containers, rule)
        }
        None => body,
    }
}

/// Trimmed text of the first heading, or an empty string.
pub fn extract_title(document: &Document, heading: &Selector) -> String {
    document
        .find(heading)
        .map(|el| el.trimmed_text())
        .unwrap_or_default()
}

fn collect_paragraphs(containers: &[Element<'_>], paragraph: &Selector) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut paragraphs = Vec::new();
    for container in containers {
        for p in container.find_all(paragraph) {
            if seen.insert(p.inner().id()) {
                paragraphs.push(p.trimmed_text());
            }
        }
    }
    paragraphs
}
