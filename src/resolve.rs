//! Fighter resolution: turn a [`FighterRef`] into a full [`FighterRecord`],
//! fetching each identity at most once per run.

use crate::error::*;
use crate::navigate::{Navigator, OnExhaust};
use crate::normalize::{split_name, split_record, strip_label, titlecase_words};
use crate::selectors::{
    ANY_LINK, BIO_ITEMS, BIO_LABEL, BIO_SITE, BIO_VALUE, IMG, PLAYER_NAME_SPANS,
    PORTRAIT_WRAPPERS, PROFILE_BIO_BLOCKS, PROFILE_NAME, PROFILE_NICKNAME, PROFILE_RECORD,
    SEARCH_RESULTS, SEARCH_URL, SECONDARY_NAV, STAT_VALUES,
};
use crate::services::log;
use crate::session::PageSession;
use crate::types::{name_key, FighterRecord, FighterRef, Gender};
use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};

/// Sentinel for fighters whose portrait cannot be located.
const NO_IMAGE: &str = "n/a";

/// Position of the "Bio" tab among the profile's secondary nav links.
const BIO_TAB_INDEX: usize = 3;

/// Fighters fetched so far. `seen` is this run's working set; `persisted`
/// holds the identity keys already sitting in the fighters store from
/// previous runs. Either kind of hit suppresses a fetch.
#[derive(Default)]
pub struct FighterCache {
    seen: BTreeMap<String, FighterRecord>,
    persisted: HashSet<String>,
}

impl FighterCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preload_persisted(&mut self, keys: impl IntoIterator<Item = String>) {
        self.persisted.extend(keys);
    }

    pub fn is_known(&self, key: &str) -> bool {
        self.seen.contains_key(key) || self.persisted.contains(key)
    }

    pub fn is_persisted(&self, key: &str) -> bool {
        self.persisted.contains(key)
    }

    /// Mark a key as covered without queueing a record for export.
    pub fn mark_known(&mut self, key: String) {
        self.persisted.insert(key);
    }

    pub fn insert(&mut self, key: String, record: FighterRecord) {
        self.seen.insert(key, record);
    }

    /// Drain the records resolved this run, in key order, for export.
    pub fn take_records(&mut self) -> Vec<FighterRecord> {
        std::mem::take(&mut self.seen).into_values().collect()
    }
}

pub struct Resolver<'a> {
    navigator: &'a Navigator,
    parse_retries: u32,
    parse_retry_delay: Duration,
    settle_delay: Duration,
}

impl<'a> Resolver<'a> {
    pub fn new(
        navigator: &'a Navigator,
        parse_retries: u32,
        parse_retry_delay: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            navigator,
            parse_retries,
            parse_retry_delay,
            settle_delay,
        }
    }

    /// Resolve `fref` unless its identity key is already known. Idempotent
    /// per run: the second call for a key performs no navigation.
    pub fn resolve(
        &self,
        session: &mut dyn PageSession,
        cache: &mut FighterCache,
        fref: &FighterRef,
        gender: Gender,
    ) -> Result<()> {
        let key = fref.identity_key();
        if cache.is_known(&key) {
            return Ok(());
        }
        let start = Instant::now();
        let record = match fref {
            FighterRef::Profile(url) => self.resolve_direct(session, url, gender),
            FighterRef::Name {
                first,
                last,
                nickname,
            } => self.resolve_via_search(session, first, last, nickname, gender),
        }?;
        log::info(
            Some(&key),
            "resolve_fighter",
            Some(&format!("succeeded in {}ms", start.elapsed().as_millis())),
        );
        // Profile refs are keyed by URL, but earlier runs persisted name
        // triples. Once the page told us the name, a persisted triple means
        // this fighter is already exported: remember the URL, export nothing.
        let triple = name_key(&record.first_name, &record.last_name, &record.nickname);
        if cache.is_persisted(&triple) {
            cache.mark_known(key);
            return Ok(());
        }
        cache.insert(key, record);
        Ok(())
    }

    /// Direct strategy: the ref already points at a profile on the origin
    /// site. The nickname element is the render marker.
    fn resolve_direct(
        &self,
        session: &mut dyn PageSession,
        url: &str,
        gender: Gender,
    ) -> Result<FighterRecord> {
        self.navigator
            .navigate_and_wait(session, url, &PROFILE_NICKNAME, OnExhaust::Fail)?;

        let (first_name, last_name) = session
            .find_one(&PROFILE_NAME.selector)
            .map(|e| split_name(e.text()))
            .unwrap_or_default();
        let nickname = session
            .find_one(&PROFILE_NICKNAME.selector)
            .map(|e| titlecase_words(e.text()))
            .unwrap_or_default();

        // "Record: 19-13-0 (1 NC)": the counts are the second whitespace
        // token; a no-contest suffix is dropped.
        let (wins, losses, draws) = self.read_record(session, url, |s| {
            s.find_one(&PROFILE_RECORD.selector)
                .map(|e| {
                    strip_label(e.text())
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .to_string()
                })
                .unwrap_or_default()
        })?;

        // Height, weight, reach, stance, birth date sit in five positional
        // blocks. A profile missing any of them loses all five rather than
        // shifting values into the wrong fields.
        let blocks = session.find_all(&PROFILE_BIO_BLOCKS.selector);
        let mut values: Vec<String> = blocks.iter().take(5).map(|b| strip_label(b.text())).collect();
        if values.len() < 5 {
            log::info(Some(url), "missing_bio_blocks", None);
            values = vec![String::new(); 5];
        }
        let mut extra = BTreeMap::new();
        extra.insert("weight".to_string(), values[1].clone());
        extra.insert("reach".to_string(), values[2].clone());
        extra.insert("stance".to_string(), values[3].clone());

        Ok(FighterRecord {
            first_name,
            last_name,
            nickname,
            gender,
            wins,
            losses,
            draws,
            height: values[0].clone(),
            birth_date: values[4].clone(),
            image: NO_IMAGE.to_string(),
            extra,
        })
    }

    /// Cross-site strategy: no profile link exists, so locate the fighter
    /// on the bio site through a domain-restricted search, then follow the
    /// profile's "Bio" tab for the labeled biography fields.
    ///
    /// The first organic hit is trusted without verification, a known
    /// accuracy risk; the matched URL is logged so bad matches are
    /// auditable.
    fn resolve_via_search(
        &self,
        session: &mut dyn PageSession,
        first: &str,
        last: &str,
        nickname: &str,
        gender: Gender,
    ) -> Result<FighterRecord> {
        let who = format!("{first} {last}");
        let query = search_query_url(first, last, nickname);
        self.navigator
            .navigate_and_wait(session, &query, &SEARCH_RESULTS, OnExhaust::Fail)
            .map_err(|e| resolution_err(e, &format!("search results never loaded for {who}")))?;
        std::thread::sleep(self.settle_delay);

        let profile_url = session
            .find_one(&SEARCH_RESULTS.selector)
            .and_then(|hit| hit.find_one(&ANY_LINK.selector))
            .and_then(|a| a.attr("href").map(str::to_string))
            .ok_or_else(|| {
                ScrapeError::Resolution(format!("no organic search result for {who}"))
            })?;
        log::info(Some(&profile_url), "search_match", Some(&who));

        self.navigator
            .navigate_and_wait(session, &profile_url, &STAT_VALUES, OnExhaust::Fail)
            .map_err(|e| resolution_err(e, &format!("profile never loaded for {who}")))?;

        let bio_url = session
            .find_all(&SECONDARY_NAV.selector)
            .get(BIO_TAB_INDEX)
            .and_then(|l| l.attr("href").map(str::to_string))
            .ok_or_else(|| ScrapeError::Resolution(format!("bio tab missing for {who}")))?;

        self.navigator
            .navigate_and_wait(session, &bio_url, &BIO_ITEMS, OnExhaust::Fail)
            .map_err(|e| resolution_err(e, &format!("bio page never loaded for {who}")))?;
        std::thread::sleep(self.settle_delay * 2);

        let spans = session.find_all(&PLAYER_NAME_SPANS.selector);
        let first_name = spans
            .first()
            .map(|s| titlecase_words(s.text()))
            .unwrap_or_else(|| first.to_string());
        let last_name = spans
            .get(1)
            .map(|s| titlecase_words(s.text()))
            .unwrap_or_default();

        let (wins, losses, draws) = self.read_record(session, &bio_url, |s| {
            s.find_all(&STAT_VALUES.selector)
                .first()
                .map(|e| e.text().to_string())
                .unwrap_or_default()
        })?;

        let image = session
            .find_all(&PORTRAIT_WRAPPERS.selector)
            .get(1)
            .and_then(|w| w.find_one(&IMG.selector))
            .and_then(|img| img.attr("src").map(str::to_string))
            .unwrap_or_else(|| NO_IMAGE.to_string());

        // Label-driven biography fields with label-specific transforms.
        let mut height = String::new();
        let mut birth_date = String::new();
        let mut extra = BTreeMap::new();
        for item in session.find_all(&BIO_ITEMS.selector) {
            let label = item
                .find_one(&BIO_LABEL.selector)
                .map(|l| l.text().to_string())
                .unwrap_or_default();
            let value = item
                .find_one(&BIO_VALUE.selector)
                .map(|v| v.text().to_string())
                .unwrap_or_default();
            match label.as_str() {
                // "6' 4", 205 lbs": keep the height segment only.
                "HT/WT" => {
                    height = value.split(',').next().unwrap_or_default().trim().to_string();
                }
                // "Women's Strawweight": the gendered prefix duplicates
                // the gender field.
                "WT CLASS" => {
                    let class = if value.contains("Women") {
                        value.split_whitespace().nth(1).unwrap_or_default().to_string()
                    } else {
                        value
                    };
                    extra.insert("weightclass".to_string(), class);
                }
                // "7/19/1987 (38)": drop the age suffix.
                "BIRTHDATE" => {
                    birth_date = value
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .to_string();
                }
                _ => {
                    extra.insert(label.replace(' ', "_").to_lowercase(), value);
                }
            }
        }

        Ok(FighterRecord {
            first_name,
            last_name,
            nickname: titlecase_words(nickname),
            gender,
            wins,
            losses,
            draws,
            height,
            birth_date,
            image,
            extra,
        })
    }

    /// The bio site occasionally renders a truncated record string; re-read
    /// it after a short delay and a reload, a bounded number of times,
    /// before treating the malformed value as fatal.
    fn read_record<F>(
        &self,
        session: &mut dyn PageSession,
        url: &str,
        read: F,
    ) -> Result<(u32, u32, u32)>
    where
        F: Fn(&dyn PageSession) -> String,
    {
        let mut attempt = 1;
        loop {
            let raw = read(&*session);
            match split_record(&raw) {
                Ok(counts) => return Ok(counts),
                Err(e) if attempt >= self.parse_retries => return Err(e),
                Err(_) => {
                    log::info(
                        Some(url),
                        "record_retry",
                        Some(&format!(
                            "incomplete record {:?} (attempt {}/{})",
                            raw, attempt, self.parse_retries
                        )),
                    );
                    std::thread::sleep(self.parse_retry_delay);
                    session.reload()?;
                    attempt += 1;
                }
            }
        }
    }
}

/// Fixed search query: site restriction, the name tokens, and a qualifier
/// that keeps results on fighter profiles. Tokens are form-urlencoded, so
/// reserved characters in names cannot corrupt the query string.
fn search_query_url(first: &str, last: &str, nickname: &str) -> String {
    let terms: Vec<String> = [
        format!("+site:{BIO_SITE}"),
        first.trim().to_string(),
        last.trim().to_string(),
        nickname.trim().to_string(),
        "mma fighter profile".to_string(),
    ]
    .into_iter()
    .filter(|t| !t.is_empty())
    .collect();
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("q", &terms.join(" "))
        .finish();
    format!("{SEARCH_URL}?{query}")
}

fn resolution_err(e: ScrapeError, context: &str) -> ScrapeError {
    match e {
        ScrapeError::Timeout { .. } => ScrapeError::Resolution(context.to_string()),
        other => other,
    }
}
