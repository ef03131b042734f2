//! Integration tests for saving the calendar spreadsheet

use chrono::NaiveDate;
use deploycal_core::{DeployRules, Issue, Labels, RawIssue, ReleaseVersion, ReleaseWindow};
use deploycal_render::{build, calendar_header, CalendarTable, ReportNaming};

fn rows(labels: &Labels) -> Vec<deploycal_core::CalendarRow> {
    let rules = DeployRules::default();
    [
        RawIssue::new("ERP-101")
            .summary("Invoice numbering fix")
            .fix_version(ReleaseVersion::new("10001", "ERP 2024.1.0").released_on("2024-03-10"))
            .assignee("Jane Doe (Ops)")
            .priority("Critical"),
        RawIssue::new("WMS-7")
            .summary("Label printer timeout")
            .fix_version(ReleaseVersion::new("10002", "WMS 5.2").released_on("2024-03-08"))
            .reporter("Ann Lee")
            .priority("Trivial"),
    ]
    .into_iter()
    .map(|raw| Issue::new(raw, &rules, labels).to_row().unwrap())
    .collect()
}

fn window() -> ReleaseWindow {
    ReleaseWindow::new(
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
    )
    .unwrap()
}

#[test]
fn save_creates_directory_and_file() {
    let labels = Labels::english();
    let table = build(calendar_header(&labels), rows(&labels)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = ReportNaming::from_labels(&labels).path(dir.path().join("cache"), &window());
    table.save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..2], b"PK");
    assert!(path.ends_with("cache/Deployment_calendar_04.03-10.03.xlsx"));
    assert_eq!(table.body_range().as_deref(), Some("A2:K3"));
}

#[test]
fn empty_calendar_still_saves_header() {
    let labels = Labels::russian();
    let table = CalendarTable::new(calendar_header(&labels)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.xlsx");
    table.save(&path).unwrap();

    assert!(path.exists());
    assert!(table.is_empty());
    assert_eq!(table.body_range(), None);
}

#[test]
fn save_below_a_regular_file_fails() {
    let labels = Labels::english();
    let table = build(calendar_header(&labels), rows(&labels)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"file").unwrap();

    let err = table.save(blocker.join("calendar.xlsx")).unwrap_err();
    assert!(matches!(err, deploycal_core::RenderError::Io(_)));
}
