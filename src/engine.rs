//! Run orchestration: discovery, per-fight extraction, fighter resolution
//! and export, in that order, with the checkpoint written last.

use crate::checkpoint::CheckpointStore;
use crate::discover;
use crate::error::*;
use crate::extract::extract_fight;
use crate::navigate::Navigator;
use crate::resolve::{FighterCache, Resolver};
use crate::selectors::EVENTS_LISTING_URL;
use crate::services::export::CsvExporter;
use crate::services::log;
use crate::session::PageSession;
use crate::types::{FightRecord, RunSummary};
use chrono::Utc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub listing_url: String,
    /// Page loads per URL before a marker wait is exhausted.
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    /// Re-reads of a malformed career record before giving up.
    pub parse_retries: u32,
    pub parse_retry_delay_ms: u64,
    /// Pause after cross-site pages report ready, for late content.
    pub settle_delay_ms: u64,
    /// Cap on events processed this run; `None` means all new events.
    /// The oldest pending events run first, so repeated limited runs walk
    /// the backlog forward instead of stranding it behind the checkpoint.
    pub event_limit: Option<usize>,
    /// Backfill everything, disregarding any stored checkpoint.
    pub ignore_checkpoint: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            listing_url: EVENTS_LISTING_URL.to_string(),
            max_attempts: 3,
            retry_delay_ms: 5_000,
            parse_retries: 5,
            parse_retry_delay_ms: 2_000,
            settle_delay_ms: 1_000,
            event_limit: None,
            ignore_checkpoint: false,
        }
    }
}

pub struct Pipeline<S: PageSession, C: CheckpointStore> {
    session: S,
    checkpoint: C,
    exporter: CsvExporter,
    options: PipelineOptions,
}

impl<S: PageSession, C: CheckpointStore> Pipeline<S, C> {
    pub fn new(session: S, checkpoint: C, exporter: CsvExporter, options: PipelineOptions) -> Self {
        Self {
            session,
            checkpoint,
            exporter,
            options,
        }
    }

    pub fn options_mut(&mut self) -> &mut PipelineOptions {
        &mut self.options
    }

    /// Recover the session, mainly so tests can inspect visit counts.
    pub fn into_session(self) -> S {
        self.session
    }

    /// One incremental run. Events whose pages never render are skipped;
    /// everything else that fails, fails the run before any checkpoint or
    /// row is written.
    pub fn run(&mut self) -> Result<RunSummary> {
        let start = Instant::now();
        let previous = if self.options.ignore_checkpoint {
            None
        } else {
            self.checkpoint.load()?
        };

        let navigator = Navigator {
            max_attempts: self.options.max_attempts,
            retry_delay: Duration::from_millis(self.options.retry_delay_ms),
        };
        let resolver = Resolver::new(
            &navigator,
            self.options.parse_retries,
            Duration::from_millis(self.options.parse_retry_delay_ms),
            Duration::from_millis(self.options.settle_delay_ms),
        );

        let mut events = discover::list_events(
            &mut self.session,
            &navigator,
            &self.options.listing_url,
            previous.as_deref(),
        )?;
        if let Some(limit) = self.options.event_limit {
            // The list is newest-first and the checkpoint advances to the
            // newest processed event, so the cap must keep the oldest
            // entries or everything beyond it would fall below the
            // checkpoint unscraped.
            if events.len() > limit {
                events.drain(..events.len() - limit);
            }
        }
        log::info(
            Some(&self.options.listing_url),
            "discover",
            Some(&format!("{} new event(s)", events.len())),
        );

        let mut cache = FighterCache::new();
        cache.preload_persisted(self.exporter.persisted_fighter_keys()?);

        let mut fights: Vec<FightRecord> = Vec::new();
        let mut skipped = 0usize;
        for event in &events {
            let event_start = Instant::now();
            let Some((header, fight_urls)) =
                discover::event_header(&mut self.session, &navigator, &event.0)?
            else {
                skipped += 1;
                continue;
            };
            for fight_url in &fight_urls {
                let (record, refs) =
                    extract_fight(&mut self.session, &navigator, fight_url, &header)?;
                for fref in &refs {
                    resolver.resolve(&mut self.session, &mut cache, fref, record.gender)?;
                }
                fights.push(record);
            }
            log::info(
                Some(&event.0),
                "scrape_event",
                Some(&format!(
                    "{} fight(s) in {}ms",
                    fight_urls.len(),
                    event_start.elapsed().as_millis()
                )),
            );
        }

        let fighters = cache.take_records();
        let new_fighters = self.exporter.append_fighters(&fighters)?;
        self.exporter.append_fights(&fights)?;

        // The newest discovered event becomes the next checkpoint. With no
        // new events the stored checkpoint stays as it is.
        let checkpoint = match events.first() {
            Some(newest) => {
                self.checkpoint.save(&newest.0)?;
                Some(newest.0.clone())
            }
            None => previous,
        };

        let summary = RunSummary {
            events_discovered: events.len(),
            events_skipped: skipped,
            fights: fights.len(),
            new_fighters,
            checkpoint,
            finished_at: Utc::now(),
        };
        log::info(
            None,
            "run",
            Some(&format!(
                "{} event(s), {} fight(s), {} new fighter(s) in {}ms",
                summary.events_discovered,
                summary.fights,
                summary.new_fighters,
                start.elapsed().as_millis()
            )),
        );
        Ok(summary)
    }
}
