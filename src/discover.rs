//! Event discovery: enumerate completed events newest-first, truncated at
//! the checkpoint, plus the per-event header scrape.

use crate::error::*;
use crate::navigate::{Navigator, OnExhaust};
use crate::normalize::strip_label;
use crate::selectors::{EVENT_INFO_ITEMS, EVENT_LINKS, FIGHT_LINKS};
use crate::session::PageSession;
use crate::types::{EventHeader, EventRef};

/// Collect event URLs from the listing page in site order (newest first),
/// stopping just before `checkpoint` when one is set; the checkpointed
/// event itself was covered by the previous run. `None` means full backfill.
///
/// The first element of the returned list is the next checkpoint.
pub fn list_events(
    session: &mut dyn PageSession,
    navigator: &Navigator,
    listing_url: &str,
    checkpoint: Option<&str>,
) -> Result<Vec<EventRef>> {
    navigator.navigate_and_wait(session, listing_url, &EVENT_LINKS, OnExhaust::Fail)?;

    let mut events = Vec::new();
    for link in session.find_all(&EVENT_LINKS.selector) {
        let Some(href) = link.attr("href") else {
            continue;
        };
        if checkpoint == Some(href) {
            break;
        }
        events.push(EventRef(href.to_string()));
    }
    Ok(events)
}

/// Scrape the shared header of one event: date, location and the fight
/// links, in card order. A page whose fight list never renders is skipped
/// (`Ok(None)`) rather than failing the run.
pub fn event_header(
    session: &mut dyn PageSession,
    navigator: &Navigator,
    event_url: &str,
) -> Result<Option<(EventHeader, Vec<String>)>> {
    if !navigator.navigate_and_wait(session, event_url, &FIGHT_LINKS, OnExhaust::Skip)? {
        return Ok(None);
    }

    let fight_links: Vec<String> = session
        .find_all(&FIGHT_LINKS.selector)
        .iter()
        .filter_map(|f| f.attr("href").map(str::to_string))
        .collect();

    // Date and location share one class; they are the first two items.
    let info = session.find_all(&EVENT_INFO_ITEMS.selector);
    let header = EventHeader {
        date: info.first().map(|i| strip_label(i.text())).unwrap_or_default(),
        location: info.get(1).map(|i| strip_label(i.text())).unwrap_or_default(),
    };
    Ok(Some((header, fight_links)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySession;
    use std::time::Duration;

    const LISTING: &str = "http://stats.test/events";

    fn nav() -> Navigator {
        Navigator {
            max_attempts: 3,
            retry_delay: Duration::ZERO,
        }
    }

    fn listing_page(hrefs: &[&str]) -> String {
        let links: String = hrefs
            .iter()
            .map(|h| format!(r#"<a class="b-link_style_black" href="{h}">ev</a>"#))
            .collect();
        format!("<html><body>{links}</body></html>")
    }

    #[test]
    fn full_backfill_without_checkpoint() {
        let mut s = MemorySession::new();
        s.insert(
            LISTING,
            &listing_page(&["http://e/3", "http://e/2", "http://e/1"]),
        );
        let events = list_events(&mut s, &nav(), LISTING, None).unwrap();
        assert_eq!(
            events,
            vec![
                EventRef("http://e/3".into()),
                EventRef("http://e/2".into()),
                EventRef("http://e/1".into()),
            ]
        );
    }

    #[test]
    fn truncation_at_checkpoint_is_exclusive() {
        let mut s = MemorySession::new();
        s.insert(
            LISTING,
            &listing_page(&["http://e/3", "http://e/2", "http://e/1"]),
        );
        let events = list_events(&mut s, &nav(), LISTING, Some("http://e/2")).unwrap();
        assert_eq!(events, vec![EventRef("http://e/3".into())]);
    }

    #[test]
    fn checkpoint_at_head_yields_nothing() {
        let mut s = MemorySession::new();
        s.insert(LISTING, &listing_page(&["http://e/3", "http://e/2"]));
        let events = list_events(&mut s, &nav(), LISTING, Some("http://e/3")).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn header_strips_labels_and_collects_fight_links() {
        let mut s = MemorySession::new();
        s.insert(
            "http://e/1",
            r#"<html><body>
                <a class="b-flag" href="http://f/1">x</a>
                <a class="b-flag" href="http://f/2">x</a>
                <li class="b-list__box-list-item">Date: April 13, 2024</li>
                <li class="b-list__box-list-item">Location: Las Vegas, Nevada, USA</li>
            </body></html>"#,
        );
        let (header, fights) = event_header(&mut s, &nav(), "http://e/1").unwrap().unwrap();
        assert_eq!(header.date, "April 13, 2024");
        assert_eq!(header.location, "Las Vegas, Nevada, USA");
        assert_eq!(fights, vec!["http://f/1", "http://f/2"]);
    }

    #[test]
    fn unrendered_event_page_is_skipped() {
        let mut s = MemorySession::new();
        s.insert("http://e/1", "<html><body><p>spinner</p></body></html>");
        assert!(event_header(&mut s, &nav(), "http://e/1").unwrap().is_none());
    }
}
