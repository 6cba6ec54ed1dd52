//! Integration tests for the authorship engine.

use authorship_engine::types::{ReportStatus, Verdict};
use authorship_engine::{AnalysisRequest, Config, Engine, Report};
use serde_json::{json, Value};

fn analyze(request: Value) -> Report {
  let request: AnalysisRequest = serde_json::from_value(request).unwrap();
  Engine::with_defaults().analyze(&request)
}

fn signals_in(report: &Report) -> Vec<&str> {
  report.contributions.iter().map(|c| c.signal.as_str()).collect()
}

/// One author, five 600-line commits ten minutes apart, same message each time.
fn agent_session() -> Vec<Value> {
  (0..5)
    .map(|i| {
      json!({
        "sha": format!("a{:039}", i),
        "author_login": "solo-dev",
        "timestamp": format!("2025-02-10T10:{:02}:00Z", i * 10),
        "message": "Update files",
        "additions": 600,
        "deletions": 0,
      })
    })
    .collect()
}

/// Four added lines of mixed ASCII and two-byte UTF-8 text, about 7.5 bits/byte.
///
/// Printable ASCII appears five times per line; the two-byte characters cycle
/// every lead byte (0xC2..=0xDF) against every continuation byte.
fn varied_patch() -> String {
  let ascii: String = (33u8..127).map(char::from).collect();
  let mut patch = String::new();
  for line in 0..4u32 {
    patch.push('+');
    patch.push_str(&ascii.repeat(5));
    for j in 0..240u32 {
      let k = line * 240 + j;
      let lead = 0xC2 + k % 30;
      let cont = 0x80 + k % 64;
      patch.push(char::from_u32(((lead & 0x1F) << 6) | (cont & 0x3F)).unwrap());
    }
    patch.push('\n');
  }
  patch
}

/// Six authors over eighteen months with erratic sizes and varied code.
fn human_history() -> Value {
  let authors = ["ana", "ben", "chloe", "dev", "emil", "fatima"];
  let sizes = [3, 8, 1200, 15, 40, 2, 600, 9, 25, 5, 1500, 12, 70, 4, 30, 800, 6, 20];
  let messages = ["wip", "typo", "oops", "tweak header css", "more tests", "merge branch 'main'"];
  let patch = varied_patch();

  let start = chrono::DateTime::parse_from_rfc3339("2024-01-02T14:00:00Z").unwrap();
  let commits: Vec<Value> = sizes
    .iter()
    .enumerate()
    .map(|(i, size)| {
      let ts = start + chrono::Duration::days(32 * i as i64);
      json!({
        "sha": format!("h{:039}", i),
        "author_login": authors[i % authors.len()],
        "timestamp": ts.to_rfc3339(),
        "message": format!("{} ({})", messages[i % messages.len()], i),
        "additions": size,
        "deletions": 0,
        "files": [{ "filename": format!("src/mod_{}.rs", i), "additions": size, "deletions": 0, "patch": patch }],
      })
    })
    .collect();

  json!({
    "repository": { "full_name": "acme/ledger", "created_at": "2023-12-01T00:00:00Z", "default_branch": "main" },
    "commits": commits,
  })
}

#[test]
fn rapid_uniform_solo_history_scores_high() {
  let report = analyze(json!({ "commits": agent_session() }));

  assert_eq!(report.status, ReportStatus::Scored);
  let score = report.score.unwrap();
  assert!(score >= 75.0, "score was {}", score);
  assert_eq!(report.verdict, Some(Verdict::VeryLikelyAgent));

  let signals = signals_in(&report);
  assert!(signals.contains(&"velocity"));
  assert!(signals.contains(&"size_uniformity"));
  assert!(signals.contains(&"message_patterns"));
  let solo = report.author_adjustment.as_ref().unwrap();
  assert_eq!(solo.points, 5.0);

  // Author adjustment is the last reason.
  assert!(report.reasons.last().unwrap().contains("Single author"));
  assert_eq!(report.reasons.len(), report.contributions.len() + 1);
}

#[test]
fn varied_multi_author_history_scores_low() {
  let report = analyze(human_history());

  let score = report.score.unwrap();
  assert!(score <= 0.0, "score was {}", score);
  assert_eq!(report.verdict, Some(Verdict::AlmostCertainlyHuman));

  let discount = report.author_adjustment.as_ref().unwrap();
  assert_eq!(discount.points, -12.0);
  let uniformity = report
    .contributions
    .iter()
    .find(|c| c.signal == "size_uniformity")
    .unwrap();
  assert_eq!(uniformity.points, -8.0);
  let entropy = report.signals.iter().find(|s| s.name == "diff_entropy").unwrap();
  let bits = entropy.evidence["mean_bits_per_byte"].as_f64().unwrap();
  assert!(bits > 7.3 && bits < 7.7, "mean entropy was {}", bits);
  assert!(signals_in(&report).contains(&"diff_entropy"));
  assert!(!signals_in(&report).contains(&"velocity"));

  assert_eq!(report.stats.authors, 6);
  assert_eq!(report.stats.repository.as_deref(), Some("acme/ledger"));
  assert_eq!(report.stats.default_branch.as_deref(), Some("main"));
  assert!(report.stats.time_span_days > 500);
}

#[test]
fn bot_commits_add_nothing() {
  let mut commits = agent_session();
  let baseline = analyze(json!({ "commits": commits.clone() }));

  commits.insert(
    2,
    json!({
      "sha": "b0000000000000000000000000000000000000000",
      "author_login": "renovate[bot]",
      "timestamp": "2025-02-10T10:15:00Z",
      "message": "chore(deps): update all dependencies",
      "additions": 5000,
      "deletions": 4000,
    }),
  );
  let with_bot = analyze(json!({ "commits": commits }));

  assert_eq!(with_bot.score, baseline.score);
  assert_eq!(with_bot.contributions, baseline.contributions);
  assert_eq!(with_bot.author_adjustment.as_ref().unwrap().points, 5.0);
  assert_eq!(with_bot.stats.bot_commits, 1);
  assert_eq!(with_bot.stats.authors, 1);
  assert_eq!(with_bot.totals.bot_lines, 9000);
  assert_eq!(with_bot.totals.authored_total, baseline.totals.authored_total);
}

#[test]
fn generated_files_are_excluded_from_authored_lines() {
  let report = analyze(json!({
    "commits": [{
      "sha": "g1",
      "author_login": "ana",
      "timestamp": "2025-02-10T10:00:00Z",
      "message": "add lockfile",
      "files": [
        { "filename": "package-lock.json", "additions": 8000, "deletions": 0 },
        { "filename": "src/index.ts", "additions": 40, "deletions": 2 }
      ]
    }]
  }));

  assert_eq!(report.totals.total_changes, 8042);
  assert_eq!(report.totals.authored_total, 42);
  assert_eq!(report.totals.generated_lines, 8000);
  assert!(report.totals.authored_total <= report.totals.total_changes);
}

#[test]
fn history_of_only_generated_files_is_insufficient_data() {
  let lockfile_commit = |sha: &str, ts: &str, path: &str| {
    json!({
      "sha": sha,
      "author_login": "ana",
      "timestamp": ts,
      "message": "refresh lockfile",
      "files": [{ "filename": path, "additions": 2400, "deletions": 1800 }]
    })
  };
  let report = analyze(json!({
    "commits": [
      lockfile_commit("l1", "2025-02-10T10:00:00Z", "package-lock.json"),
      lockfile_commit("l2", "2025-02-10T10:20:00Z", "web/yarn.lock"),
    ]
  }));

  assert_eq!(report.totals.authored_total, 0);
  assert_eq!(report.totals.generated_lines, 8400);
  assert_eq!(report.status, ReportStatus::InsufficientData);
  assert!(report.score.is_none());
  assert!(report.reasons.is_empty());
  assert!(report.author_adjustment.is_none());
}

#[test]
fn zero_commits_is_insufficient_data() {
  let report = analyze(json!({ "commits": [] }));
  assert_eq!(report.status, ReportStatus::InsufficientData);
  assert!(report.score.is_none());

  let out = serde_json::to_value(&report).unwrap();
  assert_eq!(out["status"], "insufficient_data");
  assert!(out.get("score").is_none());
  assert!(!out["disclaimer"].as_str().unwrap().is_empty());
}

#[test]
fn malformed_and_empty_commits_are_reported() {
  let mut commits = agent_session();
  commits.push(json!({ "sha": "nodate", "author_login": "solo-dev", "additions": 10 }));
  commits.push(json!({ "sha": "noauthor", "timestamp": "2025-02-10T12:00:00Z", "additions": 10 }));
  commits.push(json!({ "sha": "bare", "author_login": "solo-dev", "timestamp": "2025-02-10T10:45:00Z" }));
  let report = analyze(json!({ "commits": commits }));

  assert_eq!(report.status, ReportStatus::Scored);
  let skipped: Vec<&str> = report.skipped.iter().map(|s| s.sha.as_str()).collect();
  assert_eq!(skipped.len(), 3);
  assert!(skipped.contains(&"nodate"));
  assert!(skipped.contains(&"noauthor"));
  assert!(skipped.contains(&"bare"));
  assert_eq!(report.stats.commits_received, 8);
  assert_eq!(report.stats.commits_analyzed, 5);
}

#[test]
fn deterministic_output_across_runs() {
  let r1 = analyze(human_history());
  let r2 = analyze(human_history());
  let json1 = serde_json::to_string(&r1).unwrap();
  let json2 = serde_json::to_string(&r2).unwrap();
  assert_eq!(json1, json2, "Same inputs must produce identical JSON output");
}

#[test]
fn unknown_fields_are_ignored() {
  let mut commits = agent_session();
  for c in commits.iter_mut() {
    c["verification"] = json!({ "verified": false });
    c["parents"] = json!(["deadbeef"]);
  }
  let report = analyze(json!({ "commits": commits, "requested_by": "ci", "page": 3 }));
  let baseline = analyze(json!({ "commits": agent_session() }));
  assert_eq!(report.score, baseline.score);
}

#[test]
fn request_config_extends_bot_deny_list() {
  let mut request = json!({ "commits": agent_session() });
  request["config"] = serde_json::to_value(Config {
    bot_deny_list: vec!["solo-dev".into()],
    ..Config::default()
  })
  .unwrap();
  let report = analyze(request);
  assert_eq!(report.status, ReportStatus::InsufficientData);
  assert_eq!(report.stats.bot_commits, 5);
}

#[test]
fn every_signal_stays_in_its_bounds() {
  for request in [json!({ "commits": agent_session() }), human_history()] {
    let report = analyze(request);
    for s in &report.signals {
      assert!(s.points >= s.min - 1e-9 && s.points <= s.max + 1e-9, "{} out of bounds", s.name);
    }
    let score = report.score.unwrap();
    assert!((-50.0..=100.0).contains(&score));
  }
}
