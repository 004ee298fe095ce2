//! Read-only query layer over parsed markup.
//!
//! Extractors never touch `scraper` directly; they go through [`Document`]
//! and [`Element`], which answer "find by tag/attribute/class" questions and
//! return `Option`/empty results instead of failing when markup is missing.
//!
//! Selectors come from two places:
//! - CSS strings in site rules, compiled with [`compile_selector`]
//! - a [`Query`] built from a tag plus attribute constraints

use crate::error::{NewsError, Result};
use scraper::{ElementRef, Html, Selector};

/// Compile a CSS selector, surfacing the parser's complaint on failure.
pub fn compile_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| NewsError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// A tag name plus attribute constraints, e.g. `div[data-component="text-block"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
}

impl Query {
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Require a class token (like `class_=` matching a single class).
    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    /// Require an exact attribute value.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    /// Render as a CSS selector string.
    pub fn to_css(&self) -> String {
        let mut css = self.tag.clone().unwrap_or_default();
        if let Some(id) = &self.id {
            css.push_str(&format!("[id=\"{}\"]", escape_css_string(id)));
        }
        for class in &self.classes {
            css.push_str(&format!("[class~=\"{}\"]", escape_css_string(class)));
        }
        for (name, value) in &self.attrs {
            css.push_str(&format!("[{}=\"{}\"]", name, escape_css_string(value)));
        }
        css
    }
}

fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// A parsed markup document.
pub struct Document {
    html: Html,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document").finish_non_exhaustive()
    }
}

impl Document {
    /// Parse raw bytes as an HTML document.
    ///
    /// # Errors
    ///
    /// [`NewsError::Parse`] when the bytes are not UTF-8 or contain no markup.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| NewsError::Parse(format!("markup is not valid UTF-8: {}", e)))?;
        Self::parse_str(text)
    }

    pub fn parse_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(NewsError::Parse("document is empty".to_string()));
        }
        Ok(Self {
            html: Html::parse_document(text),
        })
    }

    /// All elements matching `selector`, in document order.
    pub fn find_all(&self, selector: &Selector) -> Vec<Element<'_>> {
        self.html.select(selector).map(Element::new).collect()
    }

    /// First element matching `selector`.
    pub fn find(&self, selector: &Selector) -> Option<Element<'_>> {
        self.html.select(selector).next().map(Element::new)
    }
}

/// A borrowed element inside a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    inner: ElementRef<'a>,
}

impl<'a> Element<'a> {
    fn new(inner: ElementRef<'a>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> ElementRef<'a> {
        self.inner
    }

    /// Concatenated text of all descendant text nodes, untrimmed.
    pub fn text(&self) -> String {
        self.inner.text().collect()
    }

    /// Text with leading and trailing whitespace removed.
    pub fn trimmed_text(&self) -> String {
        self.text().trim().to_string()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.inner.value().attr(name)
    }

    /// Whether this element itself matches `selector`.
    pub fn matches(&self, selector: &Selector) -> bool {
        selector.matches(&self.inner)
    }

    /// Descendants matching `selector`, in document order.
    pub fn find_all(&self, selector: &Selector) -> Vec<Element<'a>> {
        self.inner.select(selector).map(Element::new).collect()
    }

    pub fn find(&self, selector: &Selector) -> Option<Element<'a>> {
        self.inner.select(selector).next().map(Element::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div id="main">
            <div class="promo card" data-kind="lead">
              <h3 class="title">  First  </h3>
              <a class="link" href="/news/1">Read</a>
            </div>
            <div class="promo">
              <h3 class="title">Second</h3>
            </div>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_query_renders_css() {
        let q = Query::tag("div")
            .with_id("main")
            .with_class("promo")
            .with_attr("data-component", "text-block");
        assert_eq!(
            q.to_css(),
            r#"div[id="main"][class~="promo"][data-component="text-block"]"#
        );
        assert_eq!(Query::tag("p").with_class("x").to_css(), r#"p[class~="x"]"#);
    }

    #[test]
    fn test_query_escapes_quotes() {
        let q = Query::tag("a").with_attr("title", r#"say "hi""#);
        assert!(compile_selector(&q.to_css()).is_ok());
    }

    #[test]
    fn test_find_all_in_document_order() {
        let doc = Document::parse_str(PAGE).unwrap();
        let query = Query::tag("div").with_class("promo");
        let promos = doc.find_all(&compile_selector(&query.to_css()).unwrap());
        assert_eq!(promos.len(), 2);
        assert_eq!(promos[0].attr("data-kind"), Some("lead"));
        assert_eq!(promos[1].attr("data-kind"), None);
    }

    #[test]
    fn test_nested_find_tolerates_absence() {
        let doc = Document::parse_str(PAGE).unwrap();
        let link = compile_selector("a.link").unwrap();
        let promos = doc.find_all(&compile_selector(".promo").unwrap());

        let first = promos[0].find(&link).unwrap();
        assert_eq!(first.attr("href"), Some("/news/1"));
        assert!(promos[1].find(&link).is_none());
        assert!(first.matches(&link));
        assert!(!promos[0].matches(&link));
    }

    #[test]
    fn test_text_and_trimmed_text() {
        let doc = Document::parse_str(PAGE).unwrap();
        let title = doc.find(&compile_selector("h3.title").unwrap()).unwrap();
        assert_eq!(title.text(), "  First  ");
        assert_eq!(title.trimmed_text(), "First");
    }

    #[test]
    fn test_parse_rejects_empty_and_invalid_utf8() {
        assert!(matches!(Document::parse(b"   \n"), Err(NewsError::Parse(_))));
        assert!(matches!(
            Document::parse(&[0xff, 0xfe, 0x3c]),
            Err(NewsError::Parse(_))
        ));
        assert!(Document::parse(b"<p>ok</p>").is_ok());
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let err = compile_selector("div[[").unwrap_err();
        assert!(matches!(err, NewsError::InvalidSelector { .. }));
    }
}
