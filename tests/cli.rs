use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const BALANCED: &str = "\
Code,Account Name,Current Year,Prior Year,Grouping 1,Grouping 2,Grouping 3,Grouping 4
1000,Bank,\"1,000\",800,Assets,Current,Cash,
1500,Plant,500,500,Assets,Non-current,Property,
2000,Creditors,700,600,Liabilities,Current,Payables,
3000,Share capital,800,700,Equity,Capital,Ordinary,
4000,Sales,2500,2000,Revenue,Trading,Sales,
5000,Wages,1200,1100,Expenses,Staff,Wages,
,,0,0,,,,
";

fn etb(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("etb").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

fn setup(home: &Path) -> std::path::PathBuf {
    let data = home.join("data");
    etb(home)
        .args(["init", "--data-dir", data.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized etb"));
    etb(home)
        .args(["engagement", "add", "Acme FY24", "--client", "Acme Ltd"])
        .assert()
        .success();
    data
}

#[test]
fn test_import_and_balance_sheet_json() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    let file = home.path().join("tb.csv");
    std::fs::write(&file, BALANCED).unwrap();

    etb(home.path())
        .args(["import", file.to_str().unwrap(), "--engagement", "Acme FY24"])
        .assert()
        .success()
        .stdout(predicate::str::contains("6 rows committed"));

    let out = etb(home.path())
        .args(["report", "balance-sheet", "--engagement", "Acme FY24", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let cy = &json["current_year"];
    assert_eq!(cy["total_assets"], 1500);
    assert_eq!(cy["total_liabilities"], 700);
    assert_eq!(cy["total_equity"], 800);
    assert!(cy["warning"].is_null());
    assert_eq!(json["prior_year"]["total_assets"], 1300);
    assert_eq!(cy["assets"][0]["name"], "Non-current Assets");
}

#[test]
fn test_income_statement_json_net_result() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    let file = home.path().join("tb.csv");
    std::fs::write(&file, BALANCED).unwrap();
    etb(home.path())
        .args(["import", file.to_str().unwrap(), "--engagement", "Acme FY24"])
        .assert()
        .success();

    let out = etb(home.path())
        .args(["report", "income-statement", "--engagement", "Acme FY24", "--json"])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["current_year"]["net_result"], 1300);
    assert_eq!(json["prior_year"]["net_result"], 900);
}

#[test]
fn test_bad_file_lists_every_failing_row() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    let file = home.path().join("bad.csv");
    std::fs::write(
        &file,
        "Code,Account Name,Current Year,Prior Year\n1000,Bank,N/A,5\n2000,Creditors,5,abc\n",
    )
    .unwrap();

    etb(home.path())
        .args(["import", file.to_str().unwrap(), "--engagement", "Acme FY24"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("2 row(s) failed validation"))
        .stderr(predicate::str::contains("Row 2: Current Year"))
        .stderr(predicate::str::contains("Row 3: Prior Year"));

    etb(home.path())
        .args(["report", "rows", "--engagement", "Acme FY24"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No trial balance uploaded"));
}

#[test]
fn test_missing_columns_reported_together() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    let file = home.path().join("cols.csv");
    std::fs::write(&file, "Code,Account Name\n1000,Bank\n").unwrap();

    etb(home.path())
        .args(["import", file.to_str().unwrap(), "--engagement", "Acme FY24"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Current Year, Prior Year"));
}

#[test]
fn test_export_writes_csv() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    let file = home.path().join("tb.csv");
    std::fs::write(&file, BALANCED).unwrap();
    etb(home.path())
        .args(["import", file.to_str().unwrap(), "--engagement", "Acme FY24"])
        .assert()
        .success();

    let out = home.path().join("bs.csv");
    etb(home.path())
        .args([
            "export",
            "balance-sheet",
            "--engagement",
            "Acme FY24",
            "--output",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));
    let content = std::fs::read_to_string(&out).unwrap();
    assert!(content.contains("Assets,,Total Assets,1500,1300"));
}

#[test]
fn test_unknown_engagement_fails() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    let file = home.path().join("tb.csv");
    std::fs::write(&file, BALANCED).unwrap();

    etb(home.path())
        .args(["import", file.to_str().unwrap(), "--engagement", "Nobody"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn test_link_and_unclassified_rows() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    let file = home.path().join("tb.csv");
    std::fs::write(
        &file,
        "Code,Account Name,Current Year,Prior Year,Grouping 1\n1000,Bank,10,10,Assets\n9999,Suspense,5,0,\n",
    )
    .unwrap();
    etb(home.path())
        .args(["import", file.to_str().unwrap(), "--engagement", "Acme FY24"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 rows have no classification"));

    etb(home.path())
        .args(["link", "--engagement", "Acme FY24", "--code", "1000", "--file", "bank-rec.pdf"])
        .assert()
        .success();

    let out = etb(home.path())
        .args(["report", "rows", "--engagement", "Acme FY24", "--json"])
        .output()
        .unwrap();
    let rows: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(rows[0]["linked_files"][0], "bank-rec.pdf");

    let out = etb(home.path())
        .args(["report", "rows", "--engagement", "Acme FY24", "--unclassified", "--json"])
        .output()
        .unwrap();
    let rows: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["code"], "9999");
}

#[test]
fn test_status_reports_engagements_and_uploads() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    let file = home.path().join("tb.csv");
    std::fs::write(&file, BALANCED).unwrap();
    etb(home.path())
        .args(["import", file.to_str().unwrap(), "--engagement", "Acme FY24"])
        .assert()
        .success();

    etb(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Engagements:   1"))
        .stdout(predicate::str::contains("Uploaded:      1"))
        .stdout(predicate::str::contains("Rows:          6"))
        .stdout(predicate::str::contains("Acme FY24: tb.csv [csv]"));
}

#[test]
fn test_classifications_with_no_classified_rows() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    let file = home.path().join("tb.csv");
    std::fs::write(&file, "Code,Account Name,Current Year,Prior Year\n9999,Suspense,5,0\n").unwrap();
    etb(home.path())
        .args(["import", file.to_str().unwrap(), "--engagement", "Acme FY24"])
        .assert()
        .success();

    etb(home.path())
        .args(["classifications", "--engagement", "Acme FY24"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No classified rows in Acme FY24."));
}
