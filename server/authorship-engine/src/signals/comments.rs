//! Comment density of added lines, classified per language by file extension.

use serde_json::json;

use crate::config::{Bounds, Config};
use crate::error::EngineError;
use crate::signals::{round2, AnalysisContext, Evaluation, Signal};
use crate::types::{FileChange, SignalContribution};

/// Comment syntax of one language family.
#[derive(Debug)]
pub struct CommentSyntax {
  pub line: &'static [&'static str],
  pub block: &'static [(&'static str, &'static str)],
}

const C_LIKE: CommentSyntax = CommentSyntax {
  line: &["//"],
  block: &[("/*", "*/")],
};
const CSS: CommentSyntax = CommentSyntax {
  line: &[],
  block: &[("/*", "*/")],
};
const HASH: CommentSyntax = CommentSyntax {
  line: &["#"],
  block: &[],
};
const PYTHON: CommentSyntax = CommentSyntax {
  line: &["#"],
  block: &[("\"\"\"", "\"\"\""), ("'''", "'''")],
};
const RUBY: CommentSyntax = CommentSyntax {
  line: &["#"],
  block: &[("=begin", "=end")],
};
const PHP: CommentSyntax = CommentSyntax {
  line: &["//", "#"],
  block: &[("/*", "*/")],
};
const DASH: CommentSyntax = CommentSyntax {
  line: &["--"],
  block: &[("/*", "*/")],
};
const LUA: CommentSyntax = CommentSyntax {
  line: &["--"],
  block: &[("--[[", "]]")],
};
const HASKELL: CommentSyntax = CommentSyntax {
  line: &["--"],
  block: &[("{-", "-}")],
};
const SEMICOLON: CommentSyntax = CommentSyntax {
  line: &[";"],
  block: &[],
};
const PERCENT: CommentSyntax = CommentSyntax {
  line: &["%"],
  block: &[],
};
const MARKUP: CommentSyntax = CommentSyntax {
  line: &[],
  block: &[("<!--", "-->")],
};
const VUE: CommentSyntax = CommentSyntax {
  line: &["//"],
  block: &[("/*", "*/"), ("<!--", "-->")],
};
const POWERSHELL: CommentSyntax = CommentSyntax {
  line: &["#"],
  block: &[("<#", "#>")],
};
const HCL: CommentSyntax = CommentSyntax {
  line: &["#", "//"],
  block: &[("/*", "*/")],
};

/// Extension (or bare file name) → comment syntax.
const SYNTAX_TABLE: &[(&[&str], &CommentSyntax)] = &[
  (
    &[
      "rs", "c", "h", "cc", "cpp", "cxx", "hpp", "hh", "cs", "java", "kt", "kts", "scala", "go", "js",
      "jsx", "mjs", "cjs", "ts", "tsx", "swift", "dart", "zig", "groovy", "gradle", "m", "mm", "proto",
      "scss", "less", "sol",
    ],
    &C_LIKE,
  ),
  (&["css"], &CSS),
  (
    &[
      "sh", "bash", "zsh", "fish", "pl", "pm", "r", "yaml", "yml", "toml", "ex", "exs", "cmake", "nim",
      "jl", "cfg", "conf", "dockerfile", "makefile", "mk",
    ],
    &HASH,
  ),
  (&["py", "pyi"], &PYTHON),
  (&["rb", "rake", "gemspec"], &RUBY),
  (&["php"], &PHP),
  (&["sql", "ada", "adb", "elm"], &DASH),
  (&["lua"], &LUA),
  (&["hs"], &HASKELL),
  (&["clj", "cljs", "lisp", "el", "scm", "asm", "ini"], &SEMICOLON),
  (&["tex", "erl", "hrl"], &PERCENT),
  (&["html", "htm", "xml", "svg"], &MARKUP),
  (&["vue", "svelte"], &VUE),
  (&["ps1", "psm1"], &POWERSHELL),
  (&["tf", "hcl"], &HCL),
];

/// Comment syntax for a path, keyed by extension or bare file name.
pub fn syntax_for(path: &str) -> Option<&'static CommentSyntax> {
  let name = path.rsplit('/').next().unwrap_or(path).to_ascii_lowercase();
  let key = match name.rsplit_once('.') {
    Some((stem, ext)) if !stem.is_empty() => ext.to_string(),
    _ => name,
  };
  SYNTAX_TABLE
    .iter()
    .find(|(keys, _)| keys.contains(&key.as_str()))
    .map(|(_, syntax)| *syntax)
}

/// (comment lines, classified lines) over added lines; blank lines are ignored.
pub fn count_comment_lines<'a, I>(syntax: &CommentSyntax, lines: I) -> (usize, usize)
where
  I: IntoIterator<Item = &'a str>,
{
  let mut open_block: Option<&str> = None;
  let mut comments = 0;
  let mut total = 0;
  for line in lines {
    let t = line.trim();
    if t.is_empty() {
      continue;
    }
    total += 1;

    if let Some(close) = open_block {
      if t.contains(close) {
        open_block = None;
      }
      comments += 1;
      continue;
    }

    if let Some((open, close)) = syntax.block.iter().find(|(open, _)| t.starts_with(open)) {
      if !t[open.len()..].contains(close) {
        open_block = Some(*close);
      }
      comments += 1;
    } else if syntax.line.iter().any(|p| t.starts_with(p)) {
      comments += 1;
    }
  }
  (comments, total)
}

/// (comment lines, classified lines) of a file's added lines, `None` for
/// unknown languages.
pub fn file_comment_counts(file: &FileChange) -> Option<(usize, usize)> {
  let syntax = syntax_for(&file.path)?;
  Some(count_comment_lines(syntax, file.added_lines()))
}

pub struct CommentDensitySignal;

impl Signal for CommentDensitySignal {
  fn name(&self) -> &'static str {
    "comment_density"
  }

  fn bounds(&self, config: &Config) -> Bounds {
    config.comment_bounds
  }

  fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Result<Evaluation, EngineError> {
    let config = ctx.config;
    let (mut comments, mut total) = (0usize, 0usize);
    for file in ctx.commits.iter().flat_map(|c| c.authored_files()) {
      if let Some((c, t)) = file_comment_counts(file) {
        comments += c;
        total += t;
      }
    }
    if total < config.comment_min_lines {
      return Err(EngineError::insufficient(
        self.name(),
        format!("{} classified added lines, need {}", total, config.comment_min_lines),
      ));
    }

    let ratio = comments as f64 / total as f64;
    let evidence = json!({ "comment_lines": comments, "classified_lines": total, "ratio": round2(ratio) });
    let mut eval = Evaluation::new(evidence.clone());

    if let Some(&(floor, points)) = config.comment_tiers.iter().find(|(floor, _)| ratio >= *floor) {
      eval.push(
        SignalContribution::new(
          self.name(),
          points,
          format!(
            "{:.0}% of added code lines are comments (≥{:.0}%)",
            ratio * 100.0,
            floor * 100.0
          ),
        )
        .with_evidence(evidence),
      );
    } else if ratio < config.comment_sparse_ratio {
      eval.push(
        SignalContribution::new(
          self.name(),
          config.comment_sparse_points,
          format!("Only {:.1}% of added code lines are comments", ratio * 100.0),
        )
        .with_evidence(evidence),
      );
    }
    Ok(eval)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::signals::fixtures::{commit, with_patch};
  use crate::types::{AuthoredTotals, CommitRecord};

  fn evaluate(records: &[CommitRecord]) -> Result<Evaluation, EngineError> {
    let config = Config::default();
    let commits: Vec<&CommitRecord> = records.iter().collect();
    let totals = AuthoredTotals::default();
    let ctx = AnalysisContext {
      config: &config,
      commits: &commits,
      sessions: &[],
      samples: &[],
      totals: &totals,
      repository: None,
    };
    CommentDensitySignal.evaluate(&ctx)
  }

  fn comment_density(path: &str, patch: &str) -> Option<f64> {
    let file = FileChange {
      path: path.into(),
      additions: 0,
      deletions: 0,
      patch: patch.into(),
      is_generated: false,
    };
    let (comments, total) = file_comment_counts(&file)?;
    (total > 0).then(|| comments as f64 / total as f64)
  }

  fn patch_of(lines: &[&str], repeat: usize) -> String {
    let mut out = String::from("@@ -0,0 +1 @@\n");
    for _ in 0..repeat {
      for l in lines {
        out.push('+');
        out.push_str(l);
        out.push('\n');
      }
    }
    out
  }

  #[test]
  fn all_comment_file_is_one() {
    let patch = patch_of(&["// one", "/* two", " * three", " */", "/// four"], 1);
    assert_eq!(comment_density("src/lib.rs", &patch), Some(1.0));
  }

  #[test]
  fn comment_free_file_is_zero() {
    let patch = patch_of(&["fn main() {", "    let x = 1;", "}"], 1);
    assert_eq!(comment_density("src/main.rs", &patch), Some(0.0));
  }

  #[test]
  fn removed_lines_are_ignored() {
    let patch = "--- a/app.py\n+++ b/app.py\n-# old comment\n-# another\n+x = 1\n";
    assert_eq!(comment_density("app.py", patch), Some(0.0));
  }

  #[test]
  fn python_docstring_block() {
    let patch = patch_of(&["def f():", "    \"\"\"", "    Docs.", "    \"\"\"", "    return 1"], 1);
    assert_eq!(comment_density("pkg/mod.py", &patch), Some(0.6));
  }

  #[test]
  fn unknown_extension_is_unclassified() {
    assert!(syntax_for("notes.txt").is_none());
    assert!(syntax_for("Dockerfile").is_some());
    assert!(syntax_for("web/App.TSX").is_some());
  }

  #[test]
  fn heavily_commented_history_scores_max() {
    let patch = patch_of(&["// explain the next line", "let x = compute();"], 30);
    let records = vec![with_patch(commit("alice", 0, 0, "x"), "src/a.rs", &patch)];
    let eval = evaluate(&records).unwrap();
    assert_eq!(eval.points(), 10.0);
  }

  #[test]
  fn comment_free_history_is_negative() {
    let patch = patch_of(&["let x = compute();"], 60);
    let records = vec![with_patch(commit("alice", 0, 0, "x"), "src/a.rs", &patch)];
    assert_eq!(evaluate(&records).unwrap().points(), -5.0);
  }

  #[test]
  fn generated_files_are_excluded() {
    let patch = patch_of(&["// generated"], 60);
    let mut record = with_patch(commit("alice", 0, 0, "x"), "gen/api.pb.go", &patch);
    record.files[0].is_generated = true;
    assert!(evaluate(&[record]).is_err());
  }
}
