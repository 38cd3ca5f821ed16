//! Turns stored lesson content into HTML that is safe to embed.
//!
//! Lessons may be authored as HTML (the sample lessons are) or as Markdown.

use std::collections::{HashMap, HashSet};

/// Render lesson content to sanitized HTML, converting Markdown first when the
/// content looks like Markdown.
#[must_use]
pub fn render_lesson_content(content: &str) -> String {
    if looks_like_markdown(content) {
        markdown_to_html(content)
    } else {
        sanitize_html(content)
    }
}

#[must_use]
pub fn markdown_to_html(input: &str) -> String {
    let mut options = pulldown_cmark::Options::empty();
    options.insert(pulldown_cmark::Options::ENABLE_STRIKETHROUGH);
    options.insert(pulldown_cmark::Options::ENABLE_TABLES);

    let parser = pulldown_cmark::Parser::new_ext(input, options);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    sanitize_html(&html)
}

#[must_use]
pub fn sanitize_html(html: &str) -> String {
    let tags: HashSet<&str> = [
        "h1", "h2", "h3", "h4", "p", "div", "span", "br", "em", "strong", "b", "i", "code",
        "pre", "blockquote", "ul", "ol", "li", "a", "table", "thead", "tbody", "tr", "th", "td",
        "del",
    ]
    .into_iter()
    .collect();

    let mut attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    attributes.insert("a", ["href"].into_iter().collect());

    ammonia::Builder::new()
        .tags(tags)
        .tag_attributes(attributes)
        .clean(html)
        .to_string()
}

/// Content that starts with a tag is treated as HTML.
#[must_use]
pub fn looks_like_markdown(input: &str) -> bool {
    let trimmed = input.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('<') {
        return false;
    }
    if trimmed.contains("```") || trimmed.contains("**") || trimmed.contains("](") {
        return true;
    }
    trimmed.lines().any(|line| {
        let line = line.trim_start();
        line.starts_with("# ")
            || line.starts_with("## ")
            || line.starts_with("### ")
            || line.starts_with("- ")
            || line.starts_with("* ")
            || line.starts_with("> ")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_lessons_keep_structure_but_lose_scripts() {
        let html = render_lesson_content(
            "<h2>Les variables</h2><script>alert(1)</script><p onclick=\"x()\">Texte</p>",
        );
        assert!(html.contains("<h2>Les variables</h2>"));
        assert!(html.contains("<p>Texte</p>"));
        assert!(!html.contains("script"));
        assert!(!html.contains("onclick"));
    }

    #[test]
    fn markdown_lessons_are_converted() {
        let html = render_lesson_content("## Boucles\n\n- for\n- while\n");
        assert!(html.contains("<h2>Boucles</h2>"));
        assert!(html.contains("<li>for</li>"));
    }

    #[test]
    fn plain_text_is_not_markdown() {
        assert!(!looks_like_markdown("Une phrase simple."));
        assert!(!looks_like_markdown("   "));
        assert!(looks_like_markdown("**gras**"));
    }
}
