//! Shared text-normalization rules.
//!
//! Both extraction paths run through these functions so a fighter scraped
//! from the origin site and one resolved cross-site normalize identically.
//! Pure functions, no navigation side effects.

use crate::error::*;
use crate::types::Gender;

/// Split a display name at the first whitespace. Mononyms keep everything
/// in the first slot: `("Cyborg", "")`.
pub fn split_name(full: &str) -> (String, String) {
    let full = full.trim();
    match full.split_once(char::is_whitespace) {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (full.to_string(), String::new()),
    }
}

/// Parse a `"W-L-D"` career record token into counts. Anything but exactly
/// three integer segments is a parse failure.
pub fn split_record(text: &str) -> Result<(u32, u32, u32)> {
    let parts: Vec<&str> = text.trim().split('-').collect();
    if parts.len() != 3 {
        return Err(ScrapeError::parse("career record", text));
    }
    let mut nums = [0u32; 3];
    for (slot, part) in nums.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse()
            .map_err(|_| ScrapeError::parse("career record", text))?;
    }
    Ok((nums[0], nums[1], nums[2]))
}

/// Derive gender and title-bout flag from the bout headline by substring
/// presence, tolerant of either site's casing.
pub fn infer_gender_title(bout: &str) -> (Gender, bool) {
    let upper = bout.to_uppercase();
    let gender = if upper.contains("WOMEN") {
        Gender::Female
    } else {
        Gender::Male
    };
    (gender, upper.contains("TITLE"))
}

/// Capitalize each whitespace-delimited word independently, lowering the
/// rest of the word. Output is single-space joined.
pub fn titlecase_words(text: &str) -> String {
    text.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Drop the leading label token of a `"Label: value"` detail string and
/// return the trimmed remainder. No whitespace means no value.
pub fn strip_label(text: &str) -> String {
    text.trim()
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim().to_string())
        .unwrap_or_default()
}

/// Reduce a bout headline to the weight class: strip organization, bout,
/// title and gender tokens, then title-case what remains.
pub fn weight_class(bout: &str) -> String {
    let kept: Vec<&str> = bout
        .split_whitespace()
        .filter(|w| {
            !matches!(
                w.to_uppercase().as_str(),
                "BOUT" | "UFC" | "TITLE" | "WOMEN'S" | "WOMEN"
            )
        })
        .collect();
    titlecase_words(&kept.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_name_two_words() {
        assert_eq!(split_name("Jon Jones"), ("Jon".into(), "Jones".into()));
    }

    #[test]
    fn split_name_mononym() {
        assert_eq!(split_name("Cyborg"), ("Cyborg".into(), "".into()));
    }

    #[test]
    fn split_name_multiword_last() {
        assert_eq!(
            split_name("Jan Van Der Berg"),
            ("Jan".into(), "Van Der Berg".into())
        );
    }

    #[test]
    fn split_record_well_formed() {
        assert_eq!(split_record("27-1-0").unwrap(), (27, 1, 0));
    }

    #[test]
    fn split_record_two_segments_fails() {
        let err = split_record("27-1").unwrap_err();
        assert!(matches!(err, ScrapeError::Parse { .. }));
    }

    #[test]
    fn split_record_non_numeric_fails() {
        assert!(split_record("27-one-0").is_err());
    }

    #[test]
    fn gender_and_title_from_headline() {
        assert_eq!(
            infer_gender_title("UFC 300 WOMEN'S TITLE BOUT"),
            (Gender::Female, true)
        );
        assert_eq!(infer_gender_title("UFC 300 BOUT"), (Gender::Male, false));
        assert_eq!(
            infer_gender_title("Women's Flyweight Title Bout"),
            (Gender::Female, true)
        );
    }

    #[test]
    fn titlecase_lowers_the_tail() {
        assert_eq!(titlecase_words("LIGHT HEAVYWEIGHT"), "Light Heavyweight");
        assert_eq!(titlecase_words("  the  axe murderer "), "The Axe Murderer");
        assert_eq!(titlecase_words(""), "");
    }

    #[test]
    fn strip_label_keeps_the_value() {
        assert_eq!(strip_label("Date: April 13, 2024"), "April 13, 2024");
        assert_eq!(strip_label("Stance:"), "");
        assert_eq!(strip_label("orphan"), "");
    }

    #[test]
    fn weight_class_strips_noise_tokens() {
        assert_eq!(weight_class("UFC WOMEN'S FLYWEIGHT TITLE BOUT"), "Flyweight");
        assert_eq!(
            weight_class("LIGHT HEAVYWEIGHT BOUT"),
            "Light Heavyweight"
        );
        assert_eq!(
            weight_class("UFC INTERIM HEAVYWEIGHT TITLE BOUT"),
            "Interim Heavyweight"
        );
    }
}
