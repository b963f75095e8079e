use std::fs;

use chrono::NaiveDate;
use countmein::grid::GridPreset;
use countmein::hall_of_fame::{self, MonthKey};
use countmein::leaderboard::{self, source_path};
use countmein::submission::Category;

const PRIMARY_12: &str = "\
Timestamp,Student Name,School,Email,Time
1/15/2026 14:03:22,Ada,Hilltop,ada@example.com,01:12.40
1/16/2026 09:00:00,Grace,Hilltop,,00:58.10
2/02/2026 10:30:00,Linus,Valley,,01:05.00
,Nameless,,,00:10.00
2/03/2026 11:00:00,Ken,Valley,,
";

const SECONDARY_12: &str = "\
Timestamp,Name,Time
2026-01-20 08:15:00,Barbara,00:49.90
2026-02-11 08:15:00,Edsger,00:51.20
";

fn populated_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        source_path(dir.path(), GridPreset::TwelveByTwelve, Category::Primary),
        PRIMARY_12,
    )
    .unwrap();
    fs::write(
        source_path(dir.path(), GridPreset::TwelveByTwelve, Category::Secondary),
        SECONDARY_12,
    )
    .unwrap();
    dir
}

#[test]
fn loads_every_source_and_skips_incomplete_rows() {
    let dir = populated_dir();
    let entries = leaderboard::load_dir(dir.path());

    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert!(names.contains(&"Ada"));
    assert!(names.contains(&"Edsger"));
    assert!(!names.contains(&"Ken"));
}

#[test]
fn top_players_per_category() {
    let dir = populated_dir();
    let entries = leaderboard::load_dir(dir.path());

    let top = leaderboard::top_players(&entries, GridPreset::TwelveByTwelve);
    assert_eq!(top[&Category::Secondary].name, "Barbara");
    assert!(!top.contains_key(&Category::NoSchool));
    assert!(leaderboard::top_players(&entries, GridPreset::FiveByFive).is_empty());
}

#[test]
fn hall_of_fame_months_and_winners() {
    let dir = populated_dir();
    let entries = leaderboard::load_dir(dir.path());
    let winners = hall_of_fame::winners(&entries);

    let jan: MonthKey = "2026-01".parse().unwrap();
    let january = hall_of_fame::for_month(&winners, jan);
    assert_eq!(january.len(), 2);
    assert_eq!(january[0].category, Category::Primary);
    assert_eq!(january[0].name, "Grace");
    assert_eq!(january[1].name, "Barbara");

    let feb = hall_of_fame::for_month(&winners, "2026-02".parse().unwrap());
    assert!(feb.iter().any(|w| w.name == "Linus"));
    assert!(feb.iter().any(|w| w.name == "Edsger"));

    let months = hall_of_fame::months(&entries, NaiveDate::from_ymd_opt(2026, 3, 5).unwrap());
    assert!(months.contains(&jan));
}

#[test]
fn missing_directory_is_empty_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let entries = leaderboard::load_dir(&dir.path().join("nope"));
    assert!(entries.is_empty());
}
