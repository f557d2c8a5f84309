use scraper::{ElementRef, Node};

/// Elements whose content never counts as text: scripts, styles, embedded
/// objects and frames.
const STRIPPED: &[&str] = &[
    "script", "style", "noscript", "object", "embed", "applet", "iframe", "frame", "frameset",
    "link", "meta", "template",
];

fn is_stripped(element: &ElementRef) -> bool {
    STRIPPED.contains(&element.value().name())
}

/// Flattened text of `element` with style and embedded markup removed.
///
/// Text nodes are concatenated as they appear; markup between them adds
/// nothing, the way `textContent` behaves.
pub fn clean_text(element: ElementRef) -> String {
    let mut text = String::new();
    if !is_stripped(&element) {
        collect(element, &mut text);
    }
    text
}

fn collect(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    if !is_stripped(&child) {
                        collect(child, out);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn first(html: &str, selector: &str) -> String {
        let document = Html::parse_fragment(html);
        let selector = Selector::parse(selector).unwrap();
        let element = document.select(&selector).next().unwrap();
        clean_text(element)
    }

    #[test]
    fn test_strips_style_and_script() {
        let text = first(
            r#"<div><style>p { color: red; }</style><p style="font-weight: bold">Hello <b>world</b></p><script>track();</script></div>"#,
            "div",
        );
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn test_comments_are_not_text() {
        let text = first("<div>One<!-- hidden --> two</div>", "div");
        assert_eq!(text, "One two");
    }

    #[test]
    fn test_stripped_root_is_empty() {
        assert_eq!(first("<style>body {}</style>", "style"), "");
    }
}
