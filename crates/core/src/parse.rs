//! HTML parsing and structural queries.
//!
//! This module provides the [`Document`] and [`Element`] types. They are the
//! structural-query capability the extraction code runs against: first-match
//! queries over the whole document, per-node selector tests, ancestor lookups
//! and rendered text.
//!
//! # Example
//!
//! ```rust
//! use precis_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let first = doc.query_first("p.content").unwrap().unwrap();
//! assert_eq!(first.rendered_text(), "Paragraph");
//! ```

use scraper::{ElementRef, Html, Node, Selector};

use crate::{PrecisError, Result};

/// Elements whose contents never contribute to rendered text.
const NON_RENDERED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head", "title", "svg"];

/// Elements that break text into separate paragraphs.
const PARAGRAPH_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "ul", "ol", "dl", "table", "figure",
];

/// Elements that start a new line.
const BLOCK_TAGS: &[&str] = &[
    "div", "article", "section", "main", "header", "footer", "nav", "aside", "li", "dt", "dd", "tr", "figcaption",
    "address", "form", "fieldset", "hr", "br", "details", "summary",
];

/// Compiles a CSS selector, mapping failures to [`PrecisError::HtmlParseError`].
pub fn compile_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| PrecisError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// Represents a parsed HTML document.
///
/// # Example
///
/// ```rust
/// use precis_core::parse::Document;
///
/// let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
/// let doc = Document::parse(html).unwrap();
/// assert_eq!(doc.title(), Some("Test".to_string()));
/// ```
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// Parsing is lenient: malformed markup is repaired the way browsers do,
    /// so this only fails if the input cannot be represented at all.
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html })
    }

    /// Selects all elements matching a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PrecisError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = compile_selector(selector)?;
        Ok(self.html.select(&sel).map(Element::new).collect())
    }

    /// Returns the first element in document order matching a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PrecisError::HtmlParseError`] if the selector is invalid.
    pub fn query_first(&'_ self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = compile_selector(selector)?;
        Ok(self.query_first_compiled(&sel))
    }

    /// Returns the first element in document order matching a compiled selector.
    pub fn query_first_compiled(&'_ self, selector: &Selector) -> Option<Element<'_>> {
        self.html.select(selector).next().map(Element::new)
    }

    /// Gets the content of the `<title>` element if present.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
    }

    /// The `<body>` element, or the root element for fragments without one.
    pub fn body(&'_ self) -> Element<'_> {
        Selector::parse("body")
            .ok()
            .and_then(|sel| self.html.select(&sel).next())
            .map(Element::new)
            .unwrap_or_else(|| Element::new(self.html.root_element()))
    }

    /// Rendered text of the whole document body.
    pub fn text_content(&self) -> String {
        self.body().rendered_text()
    }
}

/// A single element of a [`Document`].
///
/// Elements are cheap to copy and compare by node identity.
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.element.id() == other.element.id()
    }
}

impl Eq for Element<'_> {}

impl<'a> Element<'a> {
    fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// Concatenation of every text node below this element, unnormalized.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name of this element.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Tests this element against a compiled selector.
    pub fn matches(&self, selector: &Selector) -> bool {
        selector.matches(&self.element)
    }

    /// The parent element, if any.
    pub fn parent(&self) -> Option<Element<'a>> {
        self.element.parent().and_then(ElementRef::wrap).map(Element::new)
    }

    /// Ancestor elements from the parent up to the document root.
    pub fn ancestors(&self) -> impl Iterator<Item = Element<'a>> + use<'a> {
        self.element.ancestors().filter_map(ElementRef::wrap).map(Element::new)
    }

    /// Whether this element is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &Element<'_>) -> bool {
        let id = self.element.id();
        other.element.ancestors().any(|node| node.id() == id)
    }

    /// Whether `other` is this element or one of its descendants.
    pub fn contains(&self, other: &Element<'_>) -> bool {
        self.element.id() == other.element.id() || self.is_ancestor_of(other)
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PrecisError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = compile_selector(selector)?;
        Ok(self.element.select(&sel).map(Element::new).collect())
    }

    /// Text as a reader would see it: scripts and styles dropped, whitespace
    /// collapsed, block elements on their own lines and paragraphs separated
    /// by a blank line.
    pub fn rendered_text(&self) -> String {
        self.rendered_text_without(|_| false)
    }

    /// Like [`Element::rendered_text`], but descendants for which `skip`
    /// returns `true` are dropped together with their subtrees.
    ///
    /// The element itself is never tested against `skip`.
    pub fn rendered_text_without<F>(&self, skip: F) -> String
    where
        F: Fn(&Element<'a>) -> bool,
    {
        let mut raw = String::new();
        collect_text(self.element, &skip, &mut raw);
        normalize_rendered(&raw)
    }
}

fn collect_text<'a, F>(element: ElementRef<'a>, skip: &F, out: &mut String)
where
    F: Fn(&Element<'a>) -> bool,
{
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_collapsed(out, text),
            Node::Element(el) => {
                let name = el.name();
                if NON_RENDERED_TAGS.contains(&name) {
                    continue;
                }
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                if skip(&Element::new(child_ref)) {
                    continue;
                }

                let separator = if PARAGRAPH_TAGS.contains(&name) {
                    "\n\n"
                } else if BLOCK_TAGS.contains(&name) {
                    "\n"
                } else {
                    ""
                };

                out.push_str(separator);
                collect_text(child_ref, skip, out);
                out.push_str(separator);
            }
            _ => {}
        }
    }
}

fn push_collapsed(out: &mut String, text: &str) {
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
}

/// Trims every line and keeps at most one blank line between blocks.
fn normalize_rendered(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in raw.split('\n').map(str::trim) {
        if line.is_empty() && lines.last().is_none_or(|last| last.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
