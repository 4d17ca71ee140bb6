//! Build descriptor (Dockerfile) edits.
//!
//! The only mutation the jobs ever make: pin the first `FROM` line of a
//! Dockerfile to `<image>@<digest>`. A raw substitution on the first
//! matching line; every other byte of the file is preserved.

use std::sync::OnceLock;

use regex::Regex;

/// File name of the build descriptor inside each repository.
pub const BUILD_DESCRIPTOR: &str = "Dockerfile";

fn from_line() -> &'static Regex {
    static FROM_LINE: OnceLock<Regex> = OnceLock::new();
    FROM_LINE.get_or_init(|| Regex::new(r"FROM(.*)\n").expect("FROM pattern is valid"))
}

/// Replace the first `FROM` line with a digest-pinned image reference.
///
/// Applying the same pin twice is a no-op the second time.
pub fn pin_base_image(content: &str, image: &str, digest: &str) -> String {
    let replacement = format!("FROM {image}@{digest}\n");
    from_line()
        .replace(content, regex::NoExpand(&replacement))
        .into_owned()
}

/// The first `FROM` line of a descriptor, if any.
pub fn first_from_line(content: &str) -> Option<&str> {
    from_line()
        .find(content)
        .map(|m| m.as_str().trim_end_matches('\n'))
}

/// Whether a descriptor's first `FROM` line mentions the image.
///
/// A plain substring test, not a structured image-reference parse; a
/// digest-pinned reference to the same image still matches.
pub fn references_image(content: &str, image: &str) -> bool {
    first_from_line(content).is_some_and(|line| line.contains(image))
}
