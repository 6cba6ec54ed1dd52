//! Author & content filter: drops bot commits and generated/vendored files
//! from line counts, producing `authored_total` next to `total_changes`.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::Config;
use crate::types::{AuthoredTotals, CommitRecord};

/// Known automation identities (matched case-insensitively).
static BOT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
  [
    r"\[bot\]$",
    r"^dependabot",
    r"^renovate",
    r"^github-actions",
    r"^greenkeeper",
    r"^snyk-",
    r"^imgbot",
    r"^codecov",
    r"^mergify",
    r"^pre-commit-ci",
    r"^allcontributors",
    r"^semantic-release",
    r"^web-flow$",
    r"[-_.]bot$",
    r"^bot[-_.]",
    r"^(ci|build|deploy|release)[-_.]?(user|agent|robot)$",
  ]
  .iter()
  .filter_map(|p| Regex::new(&format!("(?i){}", p)).ok())
  .collect()
});

/// Exact file names of lockfiles and other tool-written manifests.
const GENERATED_FILE_NAMES: &[&str] = &[
  "package-lock.json",
  "npm-shrinkwrap.json",
  "yarn.lock",
  "pnpm-lock.yaml",
  "bun.lockb",
  "cargo.lock",
  "go.sum",
  "gemfile.lock",
  "poetry.lock",
  "pipfile.lock",
  "composer.lock",
  "podfile.lock",
  "packages.lock.json",
  "flake.lock",
  "mix.lock",
  "pubspec.lock",
  "uv.lock",
];

/// Directory segments holding build output, vendored code or IDE state.
const GENERATED_DIRS: &[&str] = &[
  "node_modules",
  "vendor",
  "third_party",
  "thirdparty",
  "dist",
  "build",
  "target",
  "out",
  ".next",
  ".nuxt",
  "__pycache__",
  "coverage",
  ".gradle",
  ".idea",
  ".vscode",
  "pods",
  "generated",
  "__generated__",
  "__snapshots__",
];

/// Suffixes of generated code, minified bundles, IDE project files and binary assets.
const GENERATED_SUFFIXES: &[&str] = &[
  // generated code markers
  ".pb.go",
  "_pb2.py",
  "_pb2_grpc.py",
  ".pb.cc",
  ".pb.h",
  ".g.dart",
  ".freezed.dart",
  ".designer.cs",
  ".generated.ts",
  ".generated.js",
  ".generated.cs",
  "_generated.go",
  ".snap",
  // minified / maps
  ".min.js",
  ".min.css",
  ".js.map",
  ".css.map",
  // IDE project files
  ".pbxproj",
  ".xcworkspacedata",
  ".iml",
  ".suo",
  ".csproj.user",
  // binary assets
  ".png",
  ".jpg",
  ".jpeg",
  ".gif",
  ".ico",
  ".webp",
  ".pdf",
  ".zip",
  ".gz",
  ".jar",
  ".woff",
  ".woff2",
  ".ttf",
  ".eot",
  ".otf",
  ".so",
  ".dll",
  ".dylib",
  ".exe",
  ".class",
  ".pyc",
  ".wasm",
];

/// Matches a known automation identity or the configured deny-list.
pub fn is_bot_author(identity: &str, deny_list: &[String]) -> bool {
  let id = identity.trim();
  if id.is_empty() {
    return false;
  }
  deny_list.iter().any(|d| d.trim().eq_ignore_ascii_case(id))
    || BOT_PATTERNS.iter().any(|re| re.is_match(id))
}

/// Classifies a path as generated or vendored.
pub fn is_generated(path: &str) -> bool {
  let p = path.to_ascii_lowercase();
  let mut segments: Vec<&str> = p.split('/').filter(|s| !s.is_empty()).collect();
  let Some(file_name) = segments.pop() else {
    return false;
  };
  GENERATED_FILE_NAMES.contains(&file_name)
    || segments.iter().any(|seg| GENERATED_DIRS.contains(seg))
    || GENERATED_SUFFIXES.iter().any(|s| file_name.ends_with(s))
}

/// Mark bot commits and generated files in place and total up the lines.
pub fn apply(records: &mut [CommitRecord], config: &Config) -> AuthoredTotals {
  let mut totals = AuthoredTotals::default();

  for record in records.iter_mut() {
    record.is_bot = is_bot_author(&record.author, &config.bot_deny_list);
    for file in record.files.iter_mut() {
      file.is_generated = is_generated(&file.path);
    }

    let total = record.total_lines();
    let authored = record.authored_lines();
    totals.total_changes += total;
    totals.authored_total += authored;
    if record.is_bot {
      totals.bot_lines += total;
    } else if record.countable {
      totals.generated_lines += record
        .files
        .iter()
        .filter(|f| f.is_generated)
        .map(|f| f.lines())
        .sum::<u64>();
    }
  }

  totals.generated_ratio = if totals.total_changes > 0 {
    totals.generated_lines as f64 / totals.total_changes as f64
  } else {
    0.0
  };

  debug!(
    total_changes = totals.total_changes,
    authored_total = totals.authored_total,
    bot_lines = totals.bot_lines,
    generated_lines = totals.generated_lines,
    "filtered commit set"
  );
  totals
}
