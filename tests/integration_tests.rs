use serde_json::Value;
use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

/// Run the autoviz binary with `args`, feeding `stdin` if given.
/// Returns (success, stdout, stderr).
fn run_autoviz(args: &[&str], stdin: Option<&str>) -> (bool, String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_autoviz"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn autoviz");

    if let Some(mut handle) = child.stdin.take() {
        if let Some(input) = stdin {
            handle
                .write_all(input.as_bytes())
                .expect("Failed to write to stdin");
        }
    }

    let output = child.wait_with_output().expect("Failed to wait for autoviz");
    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

fn render_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("autoviz-{}-{}", name, std::process::id()));
    fs::remove_dir_all(&dir).ok();
    dir
}

fn run_json(args: &[&str], stdin: Option<&str>) -> Value {
    let (ok, stdout, stderr) = run_autoviz(args, stdin);
    assert!(ok, "autoviz failed: {}", stderr);
    serde_json::from_str(&stdout).expect("stdout is not JSON")
}

fn chart_summary(charts: &Value) -> Vec<(String, String, String)> {
    charts
        .as_array()
        .expect("expected an array of descriptors")
        .iter()
        .map(|d| {
            (
                d["chartType"].as_str().unwrap().to_string(),
                d["xAxisKey"].as_str().unwrap().to_string(),
                d["yAxisKey"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

fn triple(a: &str, b: &str, c: &str) -> (String, String, String) {
    (a.to_string(), b.to_string(), c.to_string())
}

#[test]
fn test_end_to_end_sales() {
    let charts = run_json(&["recommend", "test/sales.csv"], None);
    assert_eq!(
        chart_summary(&charts),
        vec![
            triple("bar", "region", "revenue"),
            triple("bar", "bin", "count"),
            triple("bar", "order_id", "revenue"),
            triple("scatter", "x", "y"),
        ]
    );
    // Top 20 identifiers, highest revenue first
    let ranked = charts[2]["data"].as_array().unwrap();
    assert_eq!(ranked.len(), 20);
    assert_eq!(ranked[0]["order_id"], "1040");
}

#[test]
fn test_end_to_end_timeseries() {
    let csv = fs::read_to_string("test/timeseries.csv").expect("Failed to read test CSV");
    let charts = run_json(&["recommend"], Some(&csv));
    assert_eq!(
        chart_summary(&charts),
        vec![triple("line", "date", "temperature"), triple("bar", "bin", "count")]
    );
    let line = charts[0]["data"].as_array().unwrap();
    assert_eq!(line[0]["date"], "2024-01-01");
    assert_eq!(line[29]["date"], "2024-01-30");
}

#[test]
fn test_end_to_end_categories_only() {
    let charts = run_json(&["recommend", "test/categories.csv"], None);
    assert_eq!(chart_summary(&charts), vec![triple("bar", "color", "count")]);
    let data = charts[0]["data"].as_array().unwrap();
    assert_eq!(data[0]["color"], "red");
    assert_eq!(data[0]["count"], 7.0);
    assert_eq!(data[1]["color"], "blue");
}

#[test]
fn test_end_to_end_json_input() {
    let charts = run_json(&["recommend", "test/players.json"], None);
    assert_eq!(
        chart_summary(&charts),
        vec![
            triple("line", "joined", "goals"),
            triple("bar", "team", "goals"),
            triple("bar", "name", "goals"),
        ]
    );
    let means = charts[1]["data"].as_array().unwrap();
    assert_eq!(means.len(), 2);
    assert_eq!(means[0]["team"], "Blue");
    assert_eq!(means[1]["goals"], 10.5);
}

#[test]
fn test_end_to_end_roles() {
    let json = fs::read_to_string("test/players.json").expect("Failed to read test JSON");
    let roles = run_json(&["roles", "--format", "json"], Some(&json));
    assert_eq!(roles["name"], "identifier");
    assert_eq!(roles["team"], "categorical");
    assert_eq!(roles["goals"], "numeric");
    assert_eq!(roles["joined"], "temporal");
}

#[test]
fn test_end_to_end_scatter_cap_and_paging() {
    // Default page holds 100 rows
    let charts = run_json(&["recommend", "test/scatter.csv"], None);
    assert_eq!(charts[1]["data"].as_array().unwrap().len(), 100);

    let charts = run_json(&["recommend", "test/scatter.csv", "--page-size", "1000"], None);
    assert_eq!(charts[1]["chartType"], "scatter");
    assert_eq!(charts[1]["data"].as_array().unwrap().len(), 500);
}

#[test]
fn test_end_to_end_config_override() {
    let dir = std::env::temp_dir().join(format!("autoviz-config-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let config = dir.join("config.json");
    fs::write(&config, r#"{"scatter_limit": 25}"#).unwrap();

    let charts = run_json(
        &["recommend", "test/scatter.csv", "--config", config.to_str().unwrap()],
        None,
    );
    assert_eq!(charts[1]["data"].as_array().unwrap().len(), 25);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_end_to_end_empty_csv() {
    let (ok, stdout, stderr) = run_autoviz(&["recommend"], Some("x,y\n"));
    assert!(ok, "empty input should not be an error: {}", stderr);
    assert_eq!(stdout.trim(), "[]");
    assert!(stderr.contains("No suitable visualization"));
}

#[test]
fn test_end_to_end_render_without_charts() {
    let dir = std::env::temp_dir().join(format!("autoviz-render-{}", std::process::id()));
    let (ok, stdout, _) = run_autoviz(
        &["render", "--out-dir", dir.to_str().unwrap()],
        Some("x,y\n"),
    );
    assert!(ok);
    assert!(stdout.is_empty());
}

#[test]
fn test_end_to_end_summary() {
    let summary = run_json(&["summary", "test/sales.csv"], None);
    assert_eq!(summary["total_rows"], 40);
    assert_eq!(summary["columns"].as_array().unwrap().len(), 4);
    assert_eq!(summary["column_types"]["region"], "string");
    assert_eq!(summary["column_roles"]["order_id"], "identifier");
    assert_eq!(summary["sample_data"].as_array().unwrap().len(), 10);
    assert_eq!(summary["source_filename"], "sales.csv");
}

#[test]
fn test_end_to_end_inconsistent_keys() {
    let (ok, _, stderr) = run_autoviz(&["recommend", "test/inconsistent.json"], None);
    assert!(!ok, "mismatched keys should fail");
    assert!(stderr.contains("expected [a, b]"));
}

#[test]
fn test_end_to_end_invalid_page_size() {
    let (ok, _, stderr) = run_autoviz(&["recommend", "test/sales.csv", "--page-size", "5000"], None);
    assert!(!ok);
    assert!(stderr.contains("page_size"));
}

#[test]
fn test_end_to_end_unknown_sort_column() {
    let (ok, _, stderr) = run_autoviz(&["recommend", "test/sales.csv", "--sort-by", "nope"], None);
    assert!(!ok);
    assert!(stderr.contains("nope"));
}

#[test]
fn test_end_to_end_missing_key_reads_as_null() {
    let json = r#"[{"a": 1, "b": 2}, {"a": 3}, {"a": 5, "b": 6}]"#;
    let charts = run_json(&["recommend", "--format", "json"], Some(json));
    assert_eq!(chart_summary(&charts), vec![triple("scatter", "x", "y")]);
    assert_eq!(charts[0]["data"].as_array().unwrap().len(), 2);
}

#[test]
fn test_end_to_end_render_sales_png() {
    let dir = render_dir("render-sales");
    let (ok, stdout, stderr) = run_autoviz(
        &["render", "test/sales.csv", "--out-dir", dir.to_str().unwrap()],
        None,
    );
    assert!(ok, "render failed: {}", stderr);
    assert_eq!(stdout.lines().count(), 4);

    for name in ["01-bar.png", "02-bar.png", "03-bar.png", "04-scatter.png"] {
        let bytes = fs::read(dir.join(name)).expect("chart file missing");
        assert!(is_valid_png(&bytes), "{} is not a valid PNG", name);
    }
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_end_to_end_render_timeseries_png() {
    let dir = render_dir("render-timeseries");
    let (ok, _, stderr) = run_autoviz(
        &["render", "test/timeseries.csv", "--out-dir", dir.to_str().unwrap()],
        None,
    );
    assert!(ok, "render failed: {}", stderr);

    let line = fs::read(dir.join("01-line.png")).expect("line chart missing");
    assert!(is_valid_png(&line));
    let hist = fs::read(dir.join("02-bar.png")).expect("histogram missing");
    assert!(is_valid_png(&hist));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_end_to_end_render_svg() {
    let dir = render_dir("render-svg");
    let (ok, _, stderr) = run_autoviz(
        &["render", "test/timeseries.csv", "--svg", "--out-dir", dir.to_str().unwrap()],
        None,
    );
    assert!(ok, "render failed: {}", stderr);

    let svg = fs::read_to_string(dir.join("01-line.svg")).expect("svg chart missing");
    assert!(svg.contains("<svg"));
    assert!(!dir.join("01-line.png").exists());
    fs::remove_dir_all(&dir).ok();
}
