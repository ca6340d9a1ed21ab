//! Plain-text views of rendered markup: statistics for the preview pane and
//! the line list the PDF text fallback lays out.

use scraper::{ElementRef, Html, Node, Selector};

const BLOCK_ELEMENTS: &[&str] = &[
    "div", "p", "h1", "h2", "h3", "h4", "section", "header", "footer", "nav", "ul", "li",
];

/// Counts whitespace-delimited words over all text nodes. Nodes are joined
/// with a separator because composed markup carries no whitespace between
/// elements.
pub fn word_count(markup: &str) -> usize {
    let fragment = Html::parse_fragment(markup);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().count()
}

/// Number of elements matching `selector`; zero for a malformed selector.
pub fn count_matching(markup: &str, selector: &str) -> usize {
    let fragment = Html::parse_fragment(markup);
    Selector::parse(selector)
        .map(|sel| fragment.select(&sel).count())
        .unwrap_or(0)
}

/// Rendered text split into display lines: block elements and `<br>` start a
/// new line, inline elements flow into the current one as separate words.
/// Blank lines are dropped and inner whitespace is collapsed.
pub fn text_lines(markup: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(markup);
    let mut raw = String::new();
    collect_text(fragment.root_element(), &mut raw);
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = child.value().name();
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let sep = if BLOCK_ELEMENTS.contains(&name) { '\n' } else { ' ' };
                out.push(sep);
                collect_text(child, out);
                out.push(sep);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_separates_adjacent_elements() {
        let markup = "<div><h1>Ada Lovelace</h1><h2>Analyst</h2></div>";
        assert_eq!(word_count(markup), 3);
    }

    #[test]
    fn test_word_count_decodes_entities() {
        assert_eq!(word_count("<p>Tom &amp; Jerry</p>"), 3);
    }

    #[test]
    fn test_count_matching_sections() {
        let markup = r#"<div class="portfolio-section"></div><div class="portfolio-section x"></div><p></p>"#;
        assert_eq!(count_matching(markup, ".portfolio-section"), 2);
        assert_eq!(count_matching(markup, "div["), 0);
    }

    #[test]
    fn test_text_lines_follow_blocks_and_breaks() {
        let markup = "<div><h3><i></i> Skills</h3><span>Go</span><span>Rust</span>\
                      <p>line one<br>line  two</p></div>";
        assert_eq!(text_lines(markup), ["Skills", "Go Rust", "line one", "line two"]);
    }
}
