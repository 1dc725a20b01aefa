//! Markers and entry points for the two source sites.
//!
//! Every element the pipeline touches is named here once, so a site layout
//! change is a one-file fix. Selectors are parsed lazily and reused.

use once_cell::sync::Lazy;
use scraper::Selector;

/// Completed-events listing on the origin stats site, newest first.
pub const EVENTS_LISTING_URL: &str = "http://ufcstats.com/statistics/events/completed?page=all";

/// Search-engine endpoint used for cross-site fighter resolution.
pub const SEARCH_URL: &str = "https://www.bing.com/search";

/// Domain restriction baked into every cross-site search query.
pub const BIO_SITE: &str = "espn.com";

/// A named element marker. The name shows up in timeout errors and the
/// activity log; the selector is what gets evaluated.
pub struct Marker {
    pub name: &'static str,
    pub selector: Lazy<Selector>,
}

macro_rules! marker {
    ($(#[$doc:meta])* $ident:ident, $name:expr, $css:expr) => {
        $(#[$doc])*
        pub static $ident: Marker = Marker {
            name: $name,
            selector: Lazy::new(|| Selector::parse($css).expect("valid selector")),
        };
    };
}

/* ------------ origin stats site ------------ */

marker!(EVENT_LINKS, "event link", "a.b-link_style_black");
marker!(
    /// Date and location rows in an event header (same class for both).
    EVENT_INFO_ITEMS,
    "event info item",
    "li.b-list__box-list-item"
);
marker!(FIGHT_LINKS, "fight link", "a.b-flag");
marker!(PERSON_LINKS, "fighter link", ".b-fight-details__person-link");
marker!(PERSON_STATUS, "result status", ".b-fight-details__person-status");
marker!(PERSON_TEXT, "fighter name block", ".b-fight-details__person-text");
marker!(PERSON_TITLE, "fighter nickname", ".b-fight-details__person-title");
marker!(EVENT_NAME, "event name", "a.b-link");
marker!(FIGHT_HEADLINE, "bout headline", ".b-fight-details__fight-title");
marker!(DETAIL_ITEMS, "fight detail item", ".b-fight-details__text-item");
marker!(
    DETAIL_FIRST,
    "fight method item",
    ".b-fight-details__text-item_first"
);
marker!(PROFILE_NAME, "profile name", ".b-content__title-highlight");
marker!(PROFILE_NICKNAME, "profile nickname", ".b-content__Nickname");
marker!(PROFILE_RECORD, "profile record", ".b-content__title-record");
marker!(
    /// Height/weight/reach/stance/birth-date blocks, in page order.
    PROFILE_BIO_BLOCKS,
    "profile bio block",
    ".b-list__box-list-item_type_block"
);

/* ------------ bio site ------------ */

marker!(STAT_VALUES, "stat block value", ".StatBlockInner__Value");
marker!(SECONDARY_NAV, "secondary nav link", ".Nav__Secondary__Menu__Link");
marker!(BIO_ITEMS, "bio item", ".Bio__Item");
marker!(BIO_LABEL, "bio label", ".Bio__Label");
marker!(BIO_VALUE, "bio value", ".mr3");
marker!(PLAYER_NAME_SPANS, "header name", ".PlayerHeader__Name span");
marker!(
    PORTRAIT_WRAPPERS,
    "portrait wrapper",
    ".PlayerHeader__Image .Image__Wrapper"
);

/* ------------ search engine ------------ */

marker!(SEARCH_RESULTS, "organic search result", ".b_algo");

/* ------------ generic ------------ */

marker!(ANY_LINK, "link", "a[href]");
marker!(ITALIC, "italic", "i");
marker!(SPAN, "span", "span");
marker!(IMG, "image", "img");
