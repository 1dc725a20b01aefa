//! Browsing-context seam.
//!
//! The pipeline never talks to a site directly; it drives a [`PageSession`],
//! which owns one current document at a time (the whole run is sequential,
//! one shared context). `HttpSession` in `services::fetch` is the live
//! implementation; [`MemorySession`] replays canned documents for tests and
//! offline work.

use crate::error::*;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// An owned element snapshot. Handles stay valid across reloads precisely
/// because they copy text, attributes and markup out of the document, but
/// that also means they go stale: after any reload, re-query the session.
#[derive(Debug, Clone)]
pub struct Element {
    text: String,
    attrs: BTreeMap<String, String>,
    inner_html: String,
}

impl Element {
    pub(crate) fn from_ref(el: &ElementRef<'_>) -> Self {
        Self {
            text: el.text().collect::<String>().trim().to_string(),
            attrs: el
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            inner_html: el.inner_html(),
        }
    }

    /// Concatenated descendant text, trimmed at the ends.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Nested lookup inside this element's markup.
    pub fn find_all(&self, sel: &Selector) -> Vec<Element> {
        let fragment = Html::parse_fragment(&self.inner_html);
        fragment
            .select(sel)
            .map(|el| Element::from_ref(&el))
            .collect()
    }

    pub fn find_one(&self, sel: &Selector) -> Option<Element> {
        let fragment = Html::parse_fragment(&self.inner_html);
        fragment.select(sel).next().map(|el| Element::from_ref(&el))
    }
}

/// One browsing context: navigate, reload, query the current document.
pub trait PageSession {
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Re-fetch the current page. Invalidates previously obtained handles.
    fn reload(&mut self) -> Result<()>;

    fn current_url(&self) -> Option<&str>;

    /// Is the marker present in the current document?
    fn has(&self, sel: &Selector) -> bool;

    fn find_all(&self, sel: &Selector) -> Vec<Element>;

    fn find_one(&self, sel: &Selector) -> Option<Element>;
}

pub(crate) fn select_all(doc: Option<&Html>, sel: &Selector) -> Vec<Element> {
    doc.map(|d| d.select(sel).map(|el| Element::from_ref(&el)).collect())
        .unwrap_or_default()
}

pub(crate) fn select_one(doc: Option<&Html>, sel: &Selector) -> Option<Element> {
    doc.and_then(|d| d.select(sel).next().map(|el| Element::from_ref(&el)))
}

/// In-memory session backed by canned documents. A URL may carry a sequence
/// of bodies; each load serves the next one and the last repeats, which is
/// how tests model a page that only renders fully after a reload.
#[derive(Default)]
pub struct MemorySession {
    pages: BTreeMap<String, Vec<String>>,
    served: BTreeMap<String, usize>,
    visits: Vec<String>,
    url: Option<String>,
    doc: Option<Html>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: &str, html: &str) {
        self.pages.insert(url.to_string(), vec![html.to_string()]);
    }

    pub fn insert_sequence(&mut self, url: &str, bodies: &[&str]) {
        self.pages
            .insert(url.to_string(), bodies.iter().map(|b| b.to_string()).collect());
    }

    /// How many times a URL was loaded (navigations and reloads both count).
    pub fn visit_count(&self, url: &str) -> usize {
        self.visits.iter().filter(|v| v.as_str() == url).count()
    }

    pub fn visits(&self) -> &[String] {
        &self.visits
    }
}

impl PageSession for MemorySession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        let body = {
            let bodies = self
                .pages
                .get(url)
                .ok_or_else(|| ScrapeError::fetch(url, "no canned document"))?;
            let idx = self.served.get(url).copied().unwrap_or(0);
            bodies
                .get(idx)
                .or_else(|| bodies.last())
                .cloned()
                .ok_or_else(|| ScrapeError::fetch(url, "empty document sequence"))?
        };
        *self.served.entry(url.to_string()).or_insert(0) += 1;
        self.visits.push(url.to_string());
        self.doc = Some(Html::parse_document(&body));
        self.url = Some(url.to_string());
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        let url = self
            .url
            .clone()
            .ok_or_else(|| ScrapeError::fetch("", "reload before first navigation"))?;
        self.navigate(&url)
    }

    fn current_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn has(&self, sel: &Selector) -> bool {
        self.doc
            .as_ref()
            .map(|d| d.select(sel).next().is_some())
            .unwrap_or(false)
    }

    fn find_all(&self, sel: &Selector) -> Vec<Element> {
        select_all(self.doc.as_ref(), sel)
    }

    fn find_one(&self, sel: &Selector) -> Option<Element> {
        select_one(self.doc.as_ref(), sel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(css: &str) -> Selector {
        Selector::parse(css).unwrap()
    }

    #[test]
    fn nested_lookup_on_owned_handles() {
        let mut s = MemorySession::new();
        s.insert(
            "http://t/page",
            r#"<html><body>
                <div class="row"><span class="a">one</span><a href="/x">go</a></div>
                <div class="row"><span class="a">two</span></div>
            </body></html>"#,
        );
        s.navigate("http://t/page").unwrap();

        let rows = s.find_all(&sel(".row"));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].find_one(&sel(".a")).unwrap().text(), "one");
        assert_eq!(
            rows[0].find_one(&sel("a[href]")).unwrap().attr("href"),
            Some("/x")
        );
        assert!(rows[1].find_one(&sel("a[href]")).is_none());
    }

    #[test]
    fn sequences_advance_per_load_and_last_repeats() {
        let mut s = MemorySession::new();
        s.insert_sequence(
            "http://t/slow",
            &[
                "<html><body><p>buffering</p></body></html>",
                "<html><body><p class='ready'>done</p></body></html>",
            ],
        );
        s.navigate("http://t/slow").unwrap();
        assert!(!s.has(&sel(".ready")));
        s.reload().unwrap();
        assert!(s.has(&sel(".ready")));
        s.reload().unwrap();
        assert!(s.has(&sel(".ready")));
        assert_eq!(s.visit_count("http://t/slow"), 3);
    }

    #[test]
    fn unknown_url_is_a_fetch_error() {
        let mut s = MemorySession::new();
        assert!(matches!(
            s.navigate("http://t/missing"),
            Err(ScrapeError::Fetch { .. })
        ));
    }
}
