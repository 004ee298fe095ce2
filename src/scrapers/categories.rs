//! Section links advertised in a site's navigation.

use crate::document::{Document, compile_selector};
use crate::error::Result;
use crate::models::CategoryLink;
use crate::rules::SiteProfile;
use itertools::Itertools;
use tracing::{info, warn};
use url::Url;

/// Navigation links matched by the profile's category selector.
///
/// Names are trimmed, hrefs resolved against `page_url`, repeats (by URL)
/// dropped, and at most `profile.category_limit` links returned.
pub fn list_categories(
    document: &Document,
    profile: &SiteProfile,
    page_url: &Url,
) -> Result<Vec<CategoryLink>> {
    let Some(css) = profile.category_link_selector.as_deref() else {
        warn!(site = %profile.name, "Profile has no category selector");
        return Ok(Vec::new());
    };
    let selector = compile_selector(css)?;

    let links: Vec<CategoryLink> = document
        .find_all(&selector)
        .into_iter()
        .filter_map(|anchor| {
            let name = anchor.trimmed_text();
            let href = anchor.attr("href")?;
            let url = page_url.join(href).ok()?;
            (!name.is_empty()).then(|| CategoryLink {
                name,
                url: url.to_string(),
            })
        })
        .unique_by(|link| link.url.clone())
        .take(profile.category_limit)
        .collect();

    info!(site = %profile.name, count = links.len(), "Listed categories");
    Ok(links)
}
