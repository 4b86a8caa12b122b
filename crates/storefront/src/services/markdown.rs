//! Markdown rendering for blog posts.

use comrak::{Options, markdown_to_html};

/// Render markdown to HTML with GitHub Flavored Markdown extensions.
///
/// Raw HTML in the source is not passed through.
#[must_use]
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;

    markdown_to_html(content, &options)
}

/// Estimated reading time at 200 words per minute, at least one minute.
#[must_use]
pub fn reading_time_minutes(content: &str) -> u32 {
    let words = u32::try_from(content.split_whitespace().count()).unwrap_or(u32::MAX);
    words.div_ceil(200).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_gfm() {
        let html = render_markdown("# Hello\n\n~~old~~ **new**\n\n| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<del>old</del>"));
        assert!(html.contains("<strong>new</strong>"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_raw_html_is_not_passed_through() {
        let html = render_markdown("hi <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(200)), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(201)), 2);
    }
}
