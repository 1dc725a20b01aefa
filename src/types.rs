use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

/// Who won the bout, in the order the fighters appear on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Fighter0,
    Fighter1,
    Draw,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Fighter0 => "fighter_0",
            Outcome::Fighter1 => "fighter_1",
            Outcome::Draw => "draw",
        }
    }
}

/// One completed event, identified by its listing URL. Ephemeral: only the
/// most recent value survives a run, as the checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRef(pub String);

/// Date and location shared by every fight of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHeader {
    pub date: String,
    pub location: String,
}

/// A fighter pending resolution: either a direct profile URL on the origin
/// site, or a name triple to be located through cross-site search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FighterRef {
    Profile(String),
    Name {
        first: String,
        last: String,
        nickname: String,
    },
}

impl FighterRef {
    /// Cache key. Profile URLs are stable identifiers on their own; name
    /// triples are flattened into one underscore token.
    pub fn identity_key(&self) -> String {
        match self {
            FighterRef::Profile(url) => url.clone(),
            FighterRef::Name {
                first,
                last,
                nickname,
            } => name_key(first, last, nickname),
        }
    }
}

/// Composite identity key for fighters without a stable URL.
pub fn name_key(first: &str, last: &str, nickname: &str) -> String {
    format!("{first}_{last}_{nickname}").replace(' ', "_")
}

/// One completed bout. Created once per fight page, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FightRecord {
    pub fighter_0_first_name: String,
    pub fighter_0_last_name: String,
    pub fighter_1_first_name: String,
    pub fighter_1_last_name: String,
    pub winner: Outcome,
    pub event: String,
    pub date: String,
    pub location: String,
    pub gender: Gender,
    pub weight_class: String,
    pub title: bool,
    pub method: String,
    pub rounds: String,
    pub fight_time: String,
    pub referee: String,
}

/// Biography snapshot taken the first time a fighter is encountered.
/// Fields both source sites provide are explicit; everything else lands in
/// `extra` (normalized label -> value), which also absorbs the columns only
/// one site has (weight/reach/stance vs weightclass).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FighterRecord {
    pub first_name: String,
    pub last_name: String,
    pub nickname: String,
    pub gender: Gender,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub height: String,
    pub birth_date: String,
    pub image: String,
    pub extra: BTreeMap<String, String>,
}

/// What one run did, printed by the CLI as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub events_discovered: usize,
    pub events_skipped: usize,
    pub fights: usize,
    pub new_fighters: usize,
    pub checkpoint: Option<String>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}
impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_key_for_profile_is_the_url() {
        let r = FighterRef::Profile("http://stats.test/fighter/1".into());
        assert_eq!(r.identity_key(), "http://stats.test/fighter/1");
    }

    #[test]
    fn identity_key_for_name_triple_flattens_spaces() {
        let r = FighterRef::Name {
            first: "Jon".into(),
            last: "Jones".into(),
            nickname: "Bones".into(),
        };
        assert_eq!(r.identity_key(), "Jon_Jones_Bones");

        let r = FighterRef::Name {
            first: "Jan".into(),
            last: "Van Der Berg".into(),
            nickname: String::new(),
        };
        assert_eq!(r.identity_key(), "Jan_Van_Der_Berg_");
    }
}
