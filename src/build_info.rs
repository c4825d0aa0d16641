//! Build metadata baked in by `build.rs`.

/// Semver package version from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// VCS commit hash captured at build time.
pub const GIT_COMMIT: &str = env!("ERRAND_BUILD_GIT_HASH");

/// Build timestamp captured at compile time.
pub const BUILD_TIMESTAMP: &str = env!("ERRAND_BUILD_TIMESTAMP");

/// Appended to `errand --help`.
pub const HELP_BUILD_METADATA: &str = concat!(
    "Build metadata:\n  commit: ",
    env!("ERRAND_BUILD_GIT_HASH"),
    "\n  built: ",
    env!("ERRAND_BUILD_TIMESTAMP")
);

/// One-line build identity written to the log at startup.
pub fn build_line() -> String {
    format!("errand v{VERSION} ({GIT_COMMIT}, built {BUILD_TIMESTAMP})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_line_names_version_commit_and_time() {
        let text = build_line();
        assert!(text.starts_with(&format!("errand v{VERSION}")));
        assert!(text.contains(GIT_COMMIT));
        assert!(text.contains(BUILD_TIMESTAMP));
    }

    #[test]
    fn help_trailer_lists_commit() {
        assert!(HELP_BUILD_METADATA.contains("commit: "));
    }
}
