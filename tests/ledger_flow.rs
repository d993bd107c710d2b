use assert_cmd::Command;
use predicates::prelude::*;

const NBSP: char = '\u{a0}';

fn thuchi_cmd(home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("thuchi"));
    cmd.env("THUCHI_HOME", home.path());
    cmd.env_remove("THUCHI_BOT_TOKEN");
    cmd.env_remove("THUCHI_STORE_ID");
    cmd
}

fn say(home: &tempfile::TempDir, at: &str, line: &[&str]) -> String {
    let mut cmd = thuchi_cmd(home);
    cmd.args(["say", "--at", at, "--"]);
    cmd.args(line);
    let out = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(out).expect("utf8 stdout")
}

fn vnd(amount: &str) -> String {
    format!("{amount}{NBSP}₫")
}

#[test]
fn record_then_report_all_time() {
    let home = tempfile::tempdir().expect("tempdir");
    let t = "2024-03-15T05:00:00Z";

    let out = say(&home, t, &["+500k", "Lương", "tháng", "3"]);
    assert!(out.contains("✅ Đã thêm giao dịch:"));
    assert!(out.contains(&format!("💰 Số tiền: {}", vnd("500.000"))));
    assert!(out.contains("📂 Loại: Thu nhập"));
    assert!(out.contains("📝 Mô tả: Lương tháng 3"));

    let out = say(&home, t, &["-2tr", "Tiền nhà"]);
    assert!(out.contains("📂 Loại: Chi tiêu"));

    let report = say(&home, t, &["/report"]);
    assert!(report.starts_with("📊 Báo cáo (Tổng):"));
    assert!(report.contains(&format!("- Tổng thu: {}", vnd("500.000"))));
    assert!(report.contains(&format!("- Tổng chi: {}", vnd("2.000.000"))));
    assert!(report.contains(&format!("- Cân đối: -{}", vnd("1.500.000"))));
    assert!(report.contains(&format!("1. {}: Lương tháng 3 (12:00 15/03/2024)", vnd("500.000"))));
    assert!(report.contains(&format!("1. {}: Tiền nhà (12:00 15/03/2024)", vnd("2.000.000"))));
}

#[test]
fn report_windows_filter_by_month_and_week() {
    let home = tempfile::tempdir().expect("tempdir");
    say(&home, "2024-03-11T05:00:00Z", &["-100k", "monday"]);
    say(&home, "2024-03-17T15:00:00Z", &["-200k", "sunday night"]);
    say(&home, "2024-03-18T05:00:00Z", &["-300k", "next monday"]);
    say(&home, "2024-04-02T05:00:00Z", &["+1tr", "april"]);

    let week = say(&home, "2024-05-01T00:00:00Z", &["/r", "13/03/2024"]);
    assert!(week.starts_with("📊 Báo cáo (tuần từ 11/3/2024 đến 17/3/2024):"));
    assert!(week.contains("monday"));
    assert!(week.contains("sunday night"));
    assert!(!week.contains("next monday"));
    assert!(!week.contains("april"));

    let march = say(&home, "2024-05-01T00:00:00Z", &["/report", "03/2024"]);
    assert!(march.contains("next monday"));
    assert!(!march.contains("april"));

    let empty = say(&home, "2024-05-01T00:00:00Z", &["/report", "06/2024"]);
    assert_eq!(empty.trim_end(), "Không có giao dịch cho tháng được yêu cầu.");
}

#[test]
fn report_sorts_by_amount() {
    let home = tempfile::tempdir().expect("tempdir");
    let t = "2024-03-15T05:00:00Z";
    say(&home, t, &["-300", "a"]);
    say(&home, t, &["-100", "b"]);
    say(&home, t, &["-200", "c"]);

    let asc = say(&home, t, &["/r", "az"]);
    let pos = |s: &str, needle: &str| s.find(needle).expect(needle);
    assert!(pos(&asc, "1. 100") < pos(&asc, "2. 200"));
    assert!(pos(&asc, "2. 200") < pos(&asc, "3. 300"));

    let desc = say(&home, t, &["/r", "03/2024", "za"]);
    assert!(desc.contains(&format!("1. {}: a", vnd("300"))));
    assert!(desc.contains(&format!("3. {}: b", vnd("100"))));
}

#[test]
fn undo_and_reset_manage_rows() {
    let home = tempfile::tempdir().expect("tempdir");
    let t = "2024-03-15T05:00:00Z";

    let out = say(&home, t, &["/undo"]);
    assert_eq!(out.trim_end(), "Không có giao dịch nào để xóa.");

    say(&home, t, &["+10k", "first"]);
    say(&home, t, &["+20k", "second"]);
    let out = say(&home, t, &["/u"]);
    assert_eq!(out.trim_end(), "Đã xóa giao dịch gần nhất.");

    let report = say(&home, t, &["/r"]);
    assert!(report.contains("first"));
    assert!(!report.contains("second"));

    let out = say(&home, t, &["/reset"]);
    assert_eq!(out.trim_end(), "Đã xóa toàn bộ dữ liệu.");
    let out = say(&home, t, &["/report"]);
    assert_eq!(out.trim_end(), "Hiện không có giao dịch nào trong bảng tính.");
    let out = say(&home, t, &["/x"]);
    assert_eq!(out.trim_end(), "Hiện không có giao dịch nào trong bảng tính.");
}

#[test]
fn stores_are_isolated_by_identifier() {
    let home = tempfile::tempdir().expect("tempdir");
    let t = "2024-03-15T05:00:00Z";
    say(&home, t, &["+10k", "default store"]);

    let mut cmd = thuchi_cmd(&home);
    cmd.args(["--store-id", "other", "say", "/report"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Hiện không có giao dịch nào"));

    assert!(home.path().join("data/stores/default.sqlite3").exists());
    assert!(home.path().join("data/stores/other.sqlite3").exists());
}

#[test]
fn webhook_payload_is_handled_in_dry_run() {
    let home = tempfile::tempdir().expect("tempdir");
    let payload = home.path().join("update.json");
    std::fs::write(
        &payload,
        r#"{"update_id":7,"message":{"message_id":1,"chat":{"id":42,"type":"private"},"text":"-45k Phở"}}"#,
    )
    .expect("write payload");

    let mut cmd = thuchi_cmd(&home);
    cmd.args(["handle", "--dry-run", "--payload"]);
    cmd.arg(&payload);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("📝 Mô tả: Phở"));

    let report = say(&home, "2024-03-15T05:00:00Z", &["/report"]);
    assert!(report.contains(&format!("- Tổng chi: {}", vnd("45.000"))));
}
