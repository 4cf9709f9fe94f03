use std::path::Path;
use std::process::{Command, Output};

fn cityslug_cmd(fixture: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cityslug"));
    cmd.current_dir(Path::new("tests/fixtures").join(fixture));
    cmd.env("RUST_LOG", "off");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn resolve_road_disruption_from_fixture_feed() {
    let out = cityslug_cmd("london")
        .args(["resolve", "road-disruption", "lambeth-bridge-TIMS-204461"])
        .output()
        .unwrap();
    assert!(out.status.success(), "resolve failed: {}", stderr(&out));

    let text = stdout(&out);
    assert!(text.starts_with("Lambeth Bridge\n"), "unexpected output: {text}");
    assert!(text.contains("path: /routes/road-disruption/lambeth-bridge-TIMS-204461"));
    assert!(text.contains("roads: A3036, Lambeth Bridge, Millbank"));
    assert!(text.contains("severity: Serious"));
}

#[test]
fn resolve_json_reports_entity_and_path() {
    let out = cityslug_cmd("london")
        .args(["resolve", "transport-disruption", "king-s-cross-st-pancras-940GZZLUKSX", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success(), "resolve failed: {}", stderr(&out));

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["path"], "/routes/transport-disruption/king-s-cross-st-pancras-940GZZLUKSX");
    assert_eq!(report["entity"]["kind"], "transport-disruption");
    assert_eq!(report["entity"]["status"], "Closure");
    assert_eq!(report["entity"]["coordinates"], serde_json::json!([-0.1238, 51.5308]));
    assert_eq!(report["freshness"]["live"], false);
}

#[test]
fn unknown_slug_exits_one() {
    let out = cityslug_cmd("london")
        .args(["resolve", "road-disruption", "westminster-bridge-TIMS-204461"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1), "stdout: {}", stdout(&out));

    let err = stderr(&out);
    assert!(err.contains("Not Found"), "stderr: {err}");
    assert!(err.contains("lambeth-bridge-TIMS-204461"), "stderr: {err}");
}

#[test]
fn unreachable_feed_exits_two() {
    let out = cityslug_cmd("offline")
        .args(["resolve", "event", "bbc-proms-8812"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2), "stdout: {}", stdout(&out));
    assert!(stderr(&out).contains("Feed Unavailable"));
}

#[test]
fn roads_prints_sorted_references() {
    let out = cityslug_cmd("london")
        .args(["roads", "[A40] Western Avenue; [M25], [A9] (northbound), Mill Lane"])
        .output()
        .unwrap();
    assert!(out.status.success(), "roads failed: {}", stderr(&out));
    assert_eq!(stdout(&out), "M25\nA9\nA40\nMill Lane\nWestern Avenue\n");
}

#[test]
fn slug_keeps_feed_id_verbatim() {
    let out = cityslug_cmd("london")
        .args(["slug", "road-disruption", "Oxford Street", "TIMS-12345"])
        .output()
        .unwrap();
    assert!(out.status.success(), "slug failed: {}", stderr(&out));
    assert_eq!(stdout(&out), "oxford-street-TIMS-12345\n");
}

#[test]
fn every_listed_item_resolves() {
    let out = cityslug_cmd("london").arg("list").output().unwrap();
    assert!(out.status.success(), "list failed: {}", stderr(&out));

    let text = stdout(&out);
    let paths: Vec<&str> = text
        .lines()
        .filter(|line| line.starts_with("/routes/"))
        .filter_map(|line| line.split('\t').next())
        .collect();
    assert_eq!(paths.len(), 5, "list output: {text}");

    for path in paths {
        let (category, slug) = path.trim_start_matches("/routes/").split_once('/').unwrap();
        let resolved = cityslug_cmd("london").args(["resolve", category, slug]).output().unwrap();
        assert!(resolved.status.success(), "{path} did not resolve: {}", stderr(&resolved));
    }
}

#[test]
fn list_json_reports_items_per_category() {
    let out = cityslug_cmd("london").args(["list", "road-disruption", "--json"]).output().unwrap();
    assert!(out.status.success(), "list failed: {}", stderr(&out));

    let report: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    let sections = report.as_array().unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0]["category"], "road-disruption");

    let items = sections[0]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    for item in items {
        assert_eq!(item["category"], "road-disruption");
        assert!(item["path"].as_str().unwrap().starts_with("/routes/road-disruption/"));
    }
}
