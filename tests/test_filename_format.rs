/// Saved snips are named minisnip_YYYYMMDD-HHMMSS-fff.png
use chrono::{Local, TimeZone, Timelike};
use minisnip::encode::{default_output_path, file_name};
use regex::Regex;

#[test]
fn test_filename_format() {
    let filename = file_name(Local::now());

    let re = Regex::new(r"^minisnip_\d{8}-\d{6}-\d{3}\.png$").unwrap();
    assert!(
        re.is_match(&filename),
        "Filename '{}' does not match minisnip_YYYYMMDD-HHMMSS-fff.png",
        filename
    );

    let year: u32 = filename[9..13].parse().expect("Failed to parse year");
    assert!((2020..=2100).contains(&year), "Year {} is out of range", year);

    let month: u32 = filename[13..15].parse().expect("Failed to parse month");
    assert!((1..=12).contains(&month), "Month {} is invalid", month);
}

#[test]
fn test_filenames_differ_within_a_second() {
    let t = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    let a = file_name(t.with_nanosecond(1_000_000).unwrap());
    let b = file_name(t.with_nanosecond(2_000_000).unwrap());
    assert_ne!(a, b);
    assert!(a.ends_with("-001.png"), "{}", a);
    assert!(b.ends_with("-002.png"), "{}", b);
}

#[test]
fn test_default_path_lands_in_temp_dir() {
    let path = default_output_path(None);
    assert_eq!(path.parent(), Some(std::env::temp_dir().as_path()));

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("minisnip_"), "{}", name);
}
