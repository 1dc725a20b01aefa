//! Fight-page extraction: one [`FightRecord`] plus the two fighter
//! references to resolve.

use crate::error::*;
use crate::navigate::{Navigator, OnExhaust};
use crate::normalize::{infer_gender_title, split_name, strip_label, titlecase_words, weight_class};
use crate::selectors::{
    DETAIL_FIRST, DETAIL_ITEMS, EVENT_NAME, FIGHT_HEADLINE, ITALIC, PERSON_LINKS, PERSON_STATUS,
    PERSON_TEXT, PERSON_TITLE, SPAN,
};
use crate::session::{Element, PageSession};
use crate::types::{EventHeader, FightRecord, FighterRef, Outcome};

/// Parse one fight page. The fighter links are the required marker: without
/// them nothing else on the page can be read, so exhausted retries fail the
/// run. Every detail slot below them is optional: an absent slot leaves its
/// field empty and extraction carries on.
pub fn extract_fight(
    session: &mut dyn PageSession,
    navigator: &Navigator,
    fight_url: &str,
    header: &EventHeader,
) -> Result<(FightRecord, [FighterRef; 2])> {
    navigator.navigate_and_wait(session, fight_url, &PERSON_LINKS, OnExhaust::Fail)?;

    let persons = session.find_all(&PERSON_LINKS.selector);
    if persons.len() < 2 {
        return Err(ScrapeError::parse("fighter pair", fight_url));
    }

    let (f0_first, f0_last) = split_name(persons[0].text());
    let (f1_first, f1_last) = split_name(persons[1].text());

    let winner = derive_outcome(&session.find_all(&PERSON_STATUS.selector));

    let event = session
        .find_one(&EVENT_NAME.selector)
        .map(|e| e.text().to_string())
        .unwrap_or_default();

    // The method value is the second <i> of the first detail item; the
    // first <i> is its label.
    let method = session
        .find_one(&DETAIL_FIRST.selector)
        .map(|w| {
            w.find_all(&ITALIC.selector)
                .get(1)
                .map(|v| v.text().to_string())
                .unwrap_or_else(|| strip_label(w.text()))
        })
        .unwrap_or_default();

    // Remaining details are label-driven so slot reordering or absence
    // cannot silently shift values into the wrong field.
    let mut rounds = String::new();
    let mut fight_time = String::new();
    let mut referee = String::new();
    for item in session.find_all(&DETAIL_ITEMS.selector) {
        let text = item.text();
        if let Some(rest) = text.strip_prefix("Round:") {
            rounds = rest.trim().to_string();
        } else if let Some(rest) = text.strip_prefix("Time:") {
            fight_time = rest
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();
        } else if text.starts_with("Referee:") {
            // The referee name sits in a nested span.
            referee = item
                .find_one(&SPAN.selector)
                .map(|s| s.text().to_string())
                .unwrap_or_default();
        }
    }

    let bout = session
        .find_one(&FIGHT_HEADLINE.selector)
        .map(|e| e.text().to_string())
        .unwrap_or_default();
    let (gender, title) = infer_gender_title(&bout);

    let name_blocks = session.find_all(&PERSON_TEXT.selector);
    let refs = [
        fighter_ref(&persons[0], name_blocks.first()),
        fighter_ref(&persons[1], name_blocks.get(1)),
    ];

    let record = FightRecord {
        fighter_0_first_name: f0_first,
        fighter_0_last_name: f0_last,
        fighter_1_first_name: f1_first,
        fighter_1_last_name: f1_last,
        winner,
        event,
        date: header.date.clone(),
        location: header.location.clone(),
        gender,
        weight_class: weight_class(&bout),
        title,
        method,
        rounds,
        fight_time,
        referee,
    };
    Ok((record, refs))
}

/// Exactly one side carries a "W" status when there is a winner; both carry
/// "D" on a draw. No distinguishable win marker on either side also means
/// draw; some draw layouts omit the markers entirely.
fn derive_outcome(statuses: &[Element]) -> Outcome {
    let status = |i: usize| statuses.get(i).map(Element::text).unwrap_or_default();
    if status(0) == "W" {
        Outcome::Fighter0
    } else if status(1) == "W" {
        Outcome::Fighter1
    } else {
        Outcome::Draw
    }
}

/// Prefer the profile link; fall back to the name triple, picking the
/// nickname out of the quoted person-title element.
fn fighter_ref(person: &Element, name_block: Option<&Element>) -> FighterRef {
    if let Some(href) = person.attr("href") {
        return FighterRef::Profile(href.to_string());
    }
    let (first, last) = split_name(person.text());
    let nickname = name_block
        .and_then(|b| b.find_one(&PERSON_TITLE.selector))
        .map(|t| titlecase_words(t.text().trim_matches('"')))
        .unwrap_or_default();
    FighterRef::Name {
        first,
        last,
        nickname,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySession;
    use crate::types::Gender;
    use std::time::Duration;

    const FIGHT_URL: &str = "http://stats.test/fight/1";

    fn nav() -> Navigator {
        Navigator {
            max_attempts: 3,
            retry_delay: Duration::ZERO,
        }
    }

    fn header() -> EventHeader {
        EventHeader {
            date: "April 13, 2024".into(),
            location: "Las Vegas, Nevada, USA".into(),
        }
    }

    struct FightPage {
        status_0: &'static str,
        status_1: &'static str,
        headline: &'static str,
        referee_item: &'static str,
        person_links: bool,
    }

    impl Default for FightPage {
        fn default() -> Self {
            Self {
                status_0: "W",
                status_1: "L",
                headline: "UFC LIGHT HEAVYWEIGHT TITLE BOUT",
                referee_item: r#"<p class="b-fight-details__text-item">Referee: <span>Herb Dean</span></p>"#,
                person_links: true,
            }
        }
    }

    impl FightPage {
        fn render(&self) -> String {
            let href = if self.person_links {
                r#" href="http://stats.test/fighter/a""#
            } else {
                ""
            };
            let href_b = if self.person_links {
                r#" href="http://stats.test/fighter/b""#
            } else {
                ""
            };
            format!(
                r#"<html><body>
                <i class="b-fight-details__person-status">{s0}</i>
                <div class="b-fight-details__person-text">
                  <a class="b-fight-details__person-link"{href}>Jon Jones</a>
                  <p class="b-fight-details__person-title">"BONES"</p>
                </div>
                <i class="b-fight-details__person-status">{s1}</i>
                <div class="b-fight-details__person-text">
                  <a class="b-fight-details__person-link"{href_b}>Cyborg</a>
                </div>
                <h2><a class="b-link">UFC 300</a></h2>
                <i class="b-fight-details__fight-title">{headline}</i>
                <p class="b-fight-details__text-item_first"><i>Method:</i> <i>KO/TKO</i></p>
                <p class="b-fight-details__text-item">Round: 2</p>
                <p class="b-fight-details__text-item">Time: 4:29</p>
                <p class="b-fight-details__text-item">Time format: 5 Rnd (5-5-5-5-5)</p>
                {referee}
                </body></html>"#,
                s0 = self.status_0,
                s1 = self.status_1,
                headline = self.headline,
                referee = self.referee_item,
            )
        }
    }

    fn run(page: &FightPage) -> (FightRecord, [FighterRef; 2]) {
        let mut s = MemorySession::new();
        s.insert(FIGHT_URL, &page.render());
        extract_fight(&mut s, &nav(), FIGHT_URL, &header()).unwrap()
    }

    #[test]
    fn extracts_a_full_record() {
        let (rec, refs) = run(&FightPage::default());
        assert_eq!(rec.fighter_0_first_name, "Jon");
        assert_eq!(rec.fighter_0_last_name, "Jones");
        assert_eq!(rec.fighter_1_first_name, "Cyborg");
        assert_eq!(rec.fighter_1_last_name, "");
        assert_eq!(rec.winner, Outcome::Fighter0);
        assert_eq!(rec.event, "UFC 300");
        assert_eq!(rec.date, "April 13, 2024");
        assert_eq!(rec.gender, Gender::Male);
        assert!(rec.title);
        assert_eq!(rec.weight_class, "Light Heavyweight");
        assert_eq!(rec.method, "KO/TKO");
        assert_eq!(rec.rounds, "2");
        assert_eq!(rec.fight_time, "4:29");
        assert_eq!(rec.referee, "Herb Dean");
        assert_eq!(
            refs[0],
            FighterRef::Profile("http://stats.test/fighter/a".into())
        );
    }

    #[test]
    fn second_side_win_marker() {
        let page = FightPage {
            status_0: "L",
            status_1: "W",
            ..Default::default()
        };
        assert_eq!(run(&page).0.winner, Outcome::Fighter1);
    }

    #[test]
    fn draw_markers_and_missing_markers_both_mean_draw() {
        let page = FightPage {
            status_0: "D",
            status_1: "D",
            ..Default::default()
        };
        assert_eq!(run(&page).0.winner, Outcome::Draw);

        let page = FightPage {
            status_0: "",
            status_1: "",
            ..Default::default()
        };
        assert_eq!(run(&page).0.winner, Outcome::Draw);
    }

    #[test]
    fn womens_headline_sets_gender_and_class() {
        let page = FightPage {
            headline: "UFC WOMEN'S FLYWEIGHT TITLE BOUT",
            ..Default::default()
        };
        let rec = run(&page).0;
        assert_eq!(rec.gender, Gender::Female);
        assert!(rec.title);
        assert_eq!(rec.weight_class, "Flyweight");
    }

    #[test]
    fn missing_referee_slot_leaves_field_empty() {
        let page = FightPage {
            referee_item: "",
            ..Default::default()
        };
        let rec = run(&page).0;
        assert_eq!(rec.referee, "");
        assert_eq!(rec.rounds, "2");
        assert_eq!(rec.method, "KO/TKO");
    }

    #[test]
    fn linkless_fighters_become_name_triples() {
        let page = FightPage {
            person_links: false,
            ..Default::default()
        };
        let (_, refs) = run(&page);
        assert_eq!(
            refs[0],
            FighterRef::Name {
                first: "Jon".into(),
                last: "Jones".into(),
                nickname: "Bones".into(),
            }
        );
        assert_eq!(
            refs[1],
            FighterRef::Name {
                first: "Cyborg".into(),
                last: "".into(),
                nickname: "".into(),
            }
        );
    }
}
