//! CSV persistence: append-only stores for fight and fighter rows.

use crate::error::*;
use crate::types::{name_key, FightRecord, FighterRecord};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const FIGHTS_FILE: &str = "fights.csv";
pub const FIGHTERS_FILE: &str = "fighters.csv";

const FIGHT_COLUMNS: &[&str] = &[
    "fighter_0_first_name",
    "fighter_0_last_name",
    "fighter_1_first_name",
    "fighter_1_last_name",
    "winner",
    "event",
    "date",
    "location",
    "gender",
    "weight_class",
    "title",
    "method",
    "rounds",
    "fight_time",
    "referee",
];

const FIGHTER_BASE_COLUMNS: &[&str] = &[
    "first_name",
    "last_name",
    "nickname",
    "gender",
    "wins",
    "losses",
    "draws",
    "height",
    "birth_date",
    "image",
];

/// Writes rows into `fights.csv` and `fighters.csv` under one data
/// directory. Each file gets its header exactly once, on first creation;
/// later runs append rows only. A header or column-count mismatch against an
/// existing file is tolerated, never fatal.
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn fights_path(&self) -> PathBuf {
        self.dir.join(FIGHTS_FILE)
    }

    pub fn fighters_path(&self) -> PathBuf {
        self.dir.join(FIGHTERS_FILE)
    }

    pub fn append_fights(&self, records: &[FightRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let rows: Vec<Vec<String>> = records.iter().map(fight_row).collect();
        self.append(&self.fights_path(), FIGHT_COLUMNS.to_vec(), &rows)?;
        Ok(rows.len())
    }

    /// Fighter columns are the fixed base set plus the sorted union of the
    /// batch's extra keys, so site-specific fields land in stable columns
    /// within one run.
    pub fn append_fighters(&self, records: &[FighterRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let extra_keys: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.extra.keys().map(String::as_str))
            .collect();
        let mut columns: Vec<&str> = FIGHTER_BASE_COLUMNS.to_vec();
        columns.extend(extra_keys.iter().copied());

        let rows: Vec<Vec<String>> = records
            .iter()
            .map(|r| {
                let mut row = vec![
                    r.first_name.clone(),
                    r.last_name.clone(),
                    r.nickname.clone(),
                    r.gender.as_str().to_string(),
                    r.wins.to_string(),
                    r.losses.to_string(),
                    r.draws.to_string(),
                    r.height.clone(),
                    r.birth_date.clone(),
                    r.image.clone(),
                ];
                for key in &extra_keys {
                    row.push(r.extra.get(*key).cloned().unwrap_or_default());
                }
                row
            })
            .collect();
        self.append(&self.fighters_path(), columns, &rows)?;
        Ok(rows.len())
    }

    /// Identity keys of every fighter already sitting in `fighters.csv`,
    /// for cross-run deduplication. Missing file means first run.
    pub fn persisted_fighter_keys(&self) -> Result<Vec<String>> {
        let path = self.fighters_path();
        if !path.exists() {
            return Ok(vec![]);
        }
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(&path)?;
        let headers = reader.headers()?.clone();
        let idx = |name: &str| headers.iter().position(|h| h == name);
        let (Some(first), Some(last), Some(nick)) =
            (idx("first_name"), idx("last_name"), idx("nickname"))
        else {
            return Ok(vec![]);
        };

        let mut keys = Vec::new();
        for record in reader.records() {
            let record = record?;
            keys.push(name_key(
                record.get(first).unwrap_or_default(),
                record.get(last).unwrap_or_default(),
                record.get(nick).unwrap_or_default(),
            ));
        }
        Ok(keys)
    }

    fn append(&self, path: &Path, columns: Vec<&str>, rows: &[Vec<String>]) -> Result<()> {
        let write_header = match fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };
        let file = fs::OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);
        if write_header {
            writer.write_record(&columns)?;
        }
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn fight_row(r: &FightRecord) -> Vec<String> {
    vec![
        r.fighter_0_first_name.clone(),
        r.fighter_0_last_name.clone(),
        r.fighter_1_first_name.clone(),
        r.fighter_1_last_name.clone(),
        r.winner.as_str().to_string(),
        r.event.clone(),
        r.date.clone(),
        r.location.clone(),
        r.gender.as_str().to_string(),
        r.weight_class.clone(),
        r.title.to_string(),
        r.method.clone(),
        r.rounds.clone(),
        r.fight_time.clone(),
        r.referee.clone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Gender, Outcome};
    use std::collections::BTreeMap;

    fn fight(event: &str) -> FightRecord {
        FightRecord {
            fighter_0_first_name: "Jon".into(),
            fighter_0_last_name: "Jones".into(),
            fighter_1_first_name: "Stipe".into(),
            fighter_1_last_name: "Miocic".into(),
            winner: Outcome::Fighter0,
            event: event.into(),
            date: "Nov 16, 2024".into(),
            location: "New York, USA".into(),
            gender: Gender::Male,
            weight_class: "Heavyweight".into(),
            title: true,
            method: "KO/TKO".into(),
            rounds: "3".into(),
            fight_time: "4:29".into(),
            referee: "Herb Dean".into(),
        }
    }

    fn fighter(first: &str, extra: &[(&str, &str)]) -> FighterRecord {
        FighterRecord {
            first_name: first.into(),
            last_name: "Jones".into(),
            nickname: "Bones".into(),
            gender: Gender::Male,
            wins: 27,
            losses: 1,
            draws: 0,
            height: "6' 4\"".into(),
            birth_date: "7/19/1987".into(),
            image: "n/a".into(),
            extra: extra
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn fight_header_is_written_exactly_once_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();

        exporter.append_fights(&[fight("UFC 309")]).unwrap();
        exporter.append_fights(&[fight("UFC 310")]).unwrap();

        let lines = lines(&exporter.fights_path());
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("fighter_0_first_name,"));
        assert!(lines[1].contains("UFC 309"));
        assert!(lines[2].contains("UFC 310"));
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("fighter_0_")).count(),
            1
        );
    }

    #[test]
    fn fighter_columns_are_base_plus_sorted_extra_union() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();

        exporter
            .append_fighters(&[
                fighter("Jon", &[("stance", "Orthodox"), ("reach", "84\"")]),
                fighter("Jan", &[("weightclass", "Light Heavyweight")]),
            ])
            .unwrap();

        let lines = lines(&exporter.fighters_path());
        assert_eq!(
            lines[0],
            "first_name,last_name,nickname,gender,wins,losses,draws,height,\
             birth_date,image,reach,stance,weightclass"
        );
        // absent extras serialize as empty cells
        assert!(lines[2].ends_with(",,,Light Heavyweight"));
    }

    #[test]
    fn mismatched_extra_keys_across_runs_still_append() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();

        exporter
            .append_fighters(&[fighter("Jon", &[("stance", "Orthodox")])])
            .unwrap();
        exporter
            .append_fighters(&[fighter("Jan", &[("team", "KSW")])])
            .unwrap();

        let lines = lines(&exporter.fighters_path());
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.iter().filter(|l| l.starts_with("first_name")).count(), 1);
    }

    #[test]
    fn empty_batches_write_nothing_at_all() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();
        assert_eq!(exporter.append_fights(&[]).unwrap(), 0);
        assert_eq!(exporter.append_fighters(&[]).unwrap(), 0);
        assert!(!exporter.fights_path().exists());
        assert!(!exporter.fighters_path().exists());
    }

    #[test]
    fn persisted_keys_round_trip_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();
        assert!(exporter.persisted_fighter_keys().unwrap().is_empty());

        exporter
            .append_fighters(&[fighter("Jon", &[]), fighter("Jan", &[])])
            .unwrap();
        let keys = exporter.persisted_fighter_keys().unwrap();
        assert_eq!(keys, vec!["Jon_Jones_Bones", "Jan_Jones_Bones"]);
    }
}
