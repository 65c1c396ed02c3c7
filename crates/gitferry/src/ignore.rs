//! Path classification for transfer operations.
//!
//! Decides whether a repository path should be skipped before any network
//! work is attempted: build artifacts, dependency directories, VCS
//! internals, OS metadata, and local secret files never travel.

use std::sync::LazyLock;

use regex::Regex;

/// Directory names skipped wherever they appear in a path.
const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "target",
    "dist",
    "build",
    ".next",
    ".nuxt",
    "__pycache__",
    ".venv",
    "venv",
    ".idea",
    ".vscode",
    "coverage",
    ".cache",
    ".gradle",
    "vendor/bundle",
];

/// Glob-style suffix patterns, translated to anchored regexes at startup.
const IGNORED_GLOBS: &[&str] = &[
    "*.log",
    "*.tmp",
    "*.swp",
    "*.swo",
    "*.pyc",
    "*.pyo",
    "*.class",
    "*.o",
    "*.obj",
    "*.orig",
    "*.rej",
];

/// Exact file names skipped regardless of location.
const IGNORED_FILES: &[&str] = &[
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    ".env",
    ".env.local",
    ".env.development",
    ".env.production",
    "npm-debug.log",
    "yarn-error.log",
];

static GLOB_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    IGNORED_GLOBS
        .iter()
        .map(|glob| {
            Regex::new(&glob_to_regex(glob)).unwrap_or_else(|e| {
                // The pattern list is fixed at compile time, so a bad
                // translation is a programming error, not a runtime one.
                panic!("invalid ignore pattern {glob:?}: {e}")
            })
        })
        .collect()
});

/// Translate a glob pattern into an anchored regex.
///
/// Only `*` (any run of characters) and `?` (single character) are
/// supported; everything else is escaped literally.
fn glob_to_regex(glob: &str) -> String {
    let mut regex = String::with_capacity(glob.len() + 8);
    regex.push('^');
    for ch in glob.chars() {
        match ch {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');
    regex
}

/// Returns true when `path` should be excluded from transfer.
///
/// `path` is repository-relative with forward-slash separators. The check
/// is a pure function of the path: directory components are matched
/// against [`IGNORED_DIRS`], the file name against [`IGNORED_FILES`] and
/// the glob patterns. Unmatched paths are transferred.
pub fn should_ignore(path: &str) -> bool {
    for dir in IGNORED_DIRS {
        if path.starts_with(&format!("{dir}/")) || path.contains(&format!("/{dir}/")) {
            return true;
        }
    }

    let file_name = path.rsplit('/').next().unwrap_or(path);

    if IGNORED_FILES.contains(&file_name) {
        return true;
    }

    GLOB_PATTERNS.iter().any(|re| re.is_match(file_name))
}
