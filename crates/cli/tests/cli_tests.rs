// End-to-end tests running the `twofile` binary.
//
// Run with: cargo test -p twofile-cli --test cli_tests -- --nocapture

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::tempdir;

fn twofile() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_twofile"));
    cmd.env_remove("RUST_LOG").env_remove("TWOFILE_BASE_DIR");
    cmd
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Minimal config over `a.csv` / `b.csv` keyed by `id`, comparing `v`.
fn write_case(dir: &Path, a: &str, b: &str, extra: &str) -> PathBuf {
    fs::write(dir.join("a.csv"), a).unwrap();
    fs::write(dir.join("b.csv"), b).unwrap();
    let config = format!(
        r#"name = "case"
{extra}
[file_a]
file = "a.csv"
keys = "id"

[file_b]
file = "b.csv"
keys = "id"

[[rules]]
keys_a = "v"
keys_b = "v"
"#
    );
    let path = dir.join("case.toml");
    fs::write(&path, config).unwrap();
    path
}

// ===========================================================================
// twofile run
// ===========================================================================

#[test]
fn clients_fixture_report() {
    let out = tempdir().unwrap();
    let report = out.path().join("report.csv");
    let output = twofile()
        .arg("run")
        .arg(fixtures_dir().join("clients/clients.toml"))
        .arg("--report")
        .arg(&report)
        .output()
        .expect("twofile run");

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    let text = fs::read_to_string(&report).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "#, reason, primaryKeyA, valueA, titleColumnA, fileA, primaryKeyB, valueB, titleColumnB, fileB, testFolder",
            "1,values are not the expected,134123333,Alice.Jame,[name, surname],fileA.csv,134123333,Alice.James,[Full Name],fileV.csv,",
            "2,values are not the expected,23412323123,Max.Kooks,[name, surname],fileA.csv,23412323123,Max.Kook,[Full Name],fileV.csv,",
            "3,values are not the expected,23412323123,staff,[title],fileA.csv,23412323123,NULL,[position],fileV.csv,",
            "4,primary key is not found in file B,99034234234,,[phone],fileA.csv,,,[Mobile Phone],fileV.csv,",
            "5,primary key is not found in file A,,,[phone],fileA.csv,11111111111,,[Mobile Phone],fileV.csv,",
            "6,primary key is not found in file A,,,[phone],fileA.csv,99034234233,,[Mobile Phone],fileV.csv,",
        ]
    );
    assert!(stderr(&output).contains("6 difference(s)"));
}

#[test]
fn clean_run_exits_zero_without_report() {
    let dir = tempdir().unwrap();
    let config = write_case(dir.path(), "id,v\n1,x\n", "id,v\n1,x\n", "");
    let output = twofile().arg("run").arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(!dir.path().join("report.csv").exists());
    assert!(stderr(&output).contains("No differences were found"));
}

#[test]
fn report_lands_in_test_folder() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("run1")).unwrap();
    fs::write(dir.path().join("run1/a.csv"), "id,v\n1,x\n").unwrap();
    fs::write(dir.path().join("run1/b.csv"), "id,v\n1,y\n").unwrap();
    let config = dir.path().join("case.toml");
    fs::write(
        &config,
        "test_folder = \"run1\"\n[file_a]\nfile = \"a.csv\"\nkeys = \"id\"\n[file_b]\nfile = \"b.csv\"\nkeys = \"id\"\n[[rules]]\nkeys_a = \"v\"\nkeys_b = \"v\"\n",
    )
    .unwrap();

    let output = twofile().arg("run").arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    let report = fs::read_to_string(dir.path().join("run1/report.csv")).unwrap();
    assert!(report.lines().nth(1).unwrap().ends_with(",a.csv,1,y,[v],b.csv,run1"));
}

#[test]
fn base_dir_flag_overrides_config_dir() {
    let data = tempdir().unwrap();
    let conf = tempdir().unwrap();
    write_case(data.path(), "id,v\n1,x\n", "id,v\n1,x\n", "");
    fs::copy(data.path().join("case.toml"), conf.path().join("case.toml")).unwrap();

    let output = twofile()
        .arg("run")
        .arg(conf.path().join("case.toml"))
        .arg("--base-dir")
        .arg(data.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
}

#[test]
fn json_summary_on_stdout() {
    let dir = tempdir().unwrap();
    let config = write_case(dir.path(), "id,v\n1,x\n2,y\n", "id,v\n1,z\n", "");
    let output = twofile().arg("run").arg(&config).arg("--json").output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let val: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is one JSON value");
    assert_eq!(val["name"], "case");
    assert_eq!(val["status"], "differences");
    assert_eq!(val["summary"]["value_mismatches"], 1);
    assert_eq!(val["summary"]["missing_in_b"], 1);
    assert_eq!(val["errors"][0]["kind"], "value_mismatch");
    assert_eq!(val["errors"][1]["kind"], "missing_in_b");
    assert_eq!(val["errors"][1]["primary_key_a"], "2");
    assert!(val["run_at"].as_str().is_some());
    assert!(val["report"].as_str().unwrap().ends_with("report.csv"));
}

#[test]
fn duplicate_stop_exits_three_with_report() {
    let dir = tempdir().unwrap();
    let config = write_case(
        dir.path(),
        "id,v\n1,x\n1,y\n",
        "id,v\n2,x\n",
        "[policy]\nstop_on_duplicates = true\n",
    );
    let output = twofile().arg("run").arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
    let report = fs::read_to_string(dir.path().join("report.csv")).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "1,Duplication is found: value is ignored,,[1],[id],a.csv,,,,,");
    assert_eq!(lines[2], "2,Duplication is found: value is ignored,,[1],[id],a.csv,,,,,");
}

#[test]
fn duplicates_in_file_b_use_a_columns() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("run1")).unwrap();
    fs::write(dir.path().join("run1/a.csv"), "id,v\n1,x\n1,y\n").unwrap();
    fs::write(dir.path().join("run1/b.csv"), "id,v\n9,x\n9,y\n").unwrap();
    let config = dir.path().join("case.toml");
    fs::write(
        &config,
        "test_folder = \"run1/\"\n[policy]\nstop_on_duplicates = true\n[file_a]\nfile = \"a.csv\"\nkeys = \"id\"\n[file_b]\nfile = \"b.csv\"\nkeys = \"id\"\n[[rules]]\nkeys_a = \"v\"\nkeys_b = \"v\"\n",
    )
    .unwrap();

    let output = twofile().arg("run").arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr(&output));
    let report = fs::read_to_string(dir.path().join("run1/report.csv")).unwrap();
    let lines: Vec<&str> = report.lines().skip(1).collect();
    assert_eq!(
        lines,
        vec![
            "1,Duplication is found: value is ignored,,[1],[id],run1/a.csv,,,,,",
            "2,Duplication is found: value is ignored,,[1],[id],run1/a.csv,,,,,",
            "3,Duplication is found: value is ignored,,[9],[id],run1/b.csv,,,,,",
            "4,Duplication is found: value is ignored,,[9],[id],run1/b.csv,,,,,",
        ]
    );
}

#[test]
fn duplicates_without_stop_are_reported_with_join_results() {
    let dir = tempdir().unwrap();
    let config = write_case(dir.path(), "id,v\n1,x\n1,y\n", "id,v\n1,x\n", "");
    let output = twofile().arg("run").arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let report = fs::read_to_string(dir.path().join("report.csv")).unwrap();
    let reasons: Vec<&str> = report.lines().skip(1).map(|l| l.split(',').nth(1).unwrap()).collect();
    assert_eq!(
        reasons,
        vec![
            "Duplication is found: value is ignored",
            "Duplication is found: value is ignored",
            "primary key is not found in file A",
        ]
    );
}

#[test]
fn column_missing_escalates_with_exit_four() {
    let dir = tempdir().unwrap();
    let config = write_case(dir.path(), "id,v\n1,x\n", "id,w\n1,x\n", "");
    let output = twofile().arg("run").arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("key [v] is not found"));
    assert!(!dir.path().join("report.csv").exists());
}

#[test]
fn column_missing_reported_by_policy() {
    let dir = tempdir().unwrap();
    let config = write_case(
        dir.path(),
        "id,v\n1,x\n",
        "id,w\n1,x\n",
        "[policy]\ncolumn_missing = \"report\"\n",
    );
    let output = twofile().arg("run").arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let report = fs::read_to_string(dir.path().join("report.csv")).unwrap();
    assert_eq!(report.lines().nth(1).unwrap(), "1,column is not found,1,,[v],a.csv,1,,[v],b.csv,");
}

#[test]
fn missing_source_exits_five() {
    let dir = tempdir().unwrap();
    let config = write_case(dir.path(), "id,v\n", "id,v\n", "");
    fs::remove_file(dir.path().join("b.csv")).unwrap();
    let output = twofile().arg("run").arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("b.csv] is not found"));
}

#[test]
fn key_column_missing_exits_eight() {
    let dir = tempdir().unwrap();
    let config = write_case(dir.path(), "id,v\n1,x\n", "code,v\n1,x\n", "");
    let output = twofile().arg("run").arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(8));
    assert!(stderr(&output).contains("key column 'id' is not found"));
}

#[test]
fn unknown_charset_is_invalid_config() {
    let dir = tempdir().unwrap();
    let config = write_case(dir.path(), "id,v\n", "id,v\n", "report_charset = \"klingon\"\n");
    let output = twofile().arg("run").arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(6));
    assert!(stderr(&output).contains("hint:"));
}

#[test]
fn unreadable_config_is_usage_error() {
    let output = twofile().args(["run", "/nonexistent/twofile.toml"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn quiet_suppresses_info_logs() {
    let dir = tempdir().unwrap();
    let config = write_case(dir.path(), "id,v\n1,x\n", "id,v\n1,x\n", "");
    let output = twofile().arg("-q").arg("run").arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(!stderr(&output).contains("No differences were found"));
}

// ===========================================================================
// twofile validate
// ===========================================================================

#[test]
fn validate_prints_description() {
    let output = twofile()
        .arg("validate")
        .arg(fixtures_dir().join("clients/clients.toml"))
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        "clients: fileA.csv [phone] vs fileV.csv [Mobile Phone], 2 rule(s), report report.csv"
    );
}

#[test]
fn validate_rejects_bad_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[file_a]\nfile = \"a.csv\"\nkeys = []\n[file_b]\nfile = \"b.csv\"\nkeys = \"id\"\n").unwrap();
    let output = twofile().arg("validate").arg(&config).output().unwrap();

    assert_eq!(output.status.code(), Some(6));
    assert!(stderr(&output).contains("file_a.keys"));
}
