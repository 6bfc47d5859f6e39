//! Lead wikitext extraction.
//!
//! The lead of an article is the text before its first section heading. Raw
//! wikitext interleaves that prose with infoboxes, hatnote templates, file
//! links and comments, so the scanner walks the lines once, tracks how deep
//! it is inside `{{ ... }}` templates, and keeps only the lines that are
//! neither inside a template nor a single-line fenced construct.
//!
//! # Example
//!
//! ```rust
//! use wikipage_core::extract_lead;
//!
//! let wikitext = "{{Short description|Mathematician}}\n{{Infobox person\n| name = Ada\n}}\n'''Ada''' was a mathematician.\n== Life ==\nBorn 1815.";
//! assert_eq!(extract_lead(wikitext), "'''Ada''' was a mathematician.");
//! ```

use std::fmt;

/// How the scanner classified one line of wikitext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMark {
    /// Lead prose, emitted.
    Kept,
    /// A whole-line template, wikilink or comment.
    Fenced,
    /// Inside a multi-line template, at the given brace depth.
    Template(usize),
    /// The line that closes the outermost open template.
    Exited,
}

impl LineMark {
    pub fn is_kept(self) -> bool {
        self == LineMark::Kept
    }
}

impl fmt::Display for LineMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineMark::Kept => write!(f, ">"),
            LineMark::Fenced => write!(f, "*"),
            LineMark::Template(depth) => write!(f, "{}", depth),
            LineMark::Exited => write!(f, "0"),
        }
    }
}

/// Line-at-a-time classifier holding the template depth between lines.
#[derive(Debug, Clone, Default)]
pub struct LeadScanner {
    depth: i64,
    in_template: bool,
}

impl LeadScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current `{{` minus `}}` balance. Negative after stray closers.
    pub fn depth(&self) -> i64 {
        self.depth
    }

    /// Classify the next line and advance the brace depth.
    ///
    /// Headings are not handled here; callers stop before them.
    pub fn mark(&mut self, line: &str) -> LineMark {
        let fenced = is_fenced(line, "{{", "}}") || is_fenced(line, "[[", "]]") || is_fenced(line, "<!--", "-->");

        self.depth += line.matches("{{").count() as i64;
        self.depth -= line.matches("}}").count() as i64;

        let mut exited = false;
        if self.depth > 0 {
            self.in_template = true;
        }
        if self.in_template && self.depth == 0 {
            self.in_template = false;
            exited = true;
        }

        if exited {
            LineMark::Exited
        } else if fenced {
            LineMark::Fenced
        } else if self.depth > 0 {
            LineMark::Template(self.depth as usize)
        } else {
            LineMark::Kept
        }
    }
}

/// A whole line wrapped in `open ... close`, with the delimiters not overlapping.
fn is_fenced(line: &str, open: &str, close: &str) -> bool {
    line.len() >= open.len() + close.len() && line.starts_with(open) && line.ends_with(close)
}

fn is_heading(line: &str) -> bool {
    line.starts_with('=')
}

/// Lines of the lead with their marks, up to the first heading.
pub fn classify(wikitext: &str) -> Vec<(LineMark, &str)> {
    let mut scanner = LeadScanner::new();

    wikitext
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .take_while(|line| !is_heading(line))
        .map(|line| (scanner.mark(line), line))
        .collect()
}

/// Wikitext of the lead with templates, fenced lines and leading
/// indentation removed.
pub fn extract_lead(wikitext: &str) -> String {
    classify(wikitext)
        .into_iter()
        .filter(|(mark, _)| mark.is_kept())
        .map(|(_, line)| line.trim_start())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render each classified line as `[mark] line`, for inspecting decisions.
pub fn render_marks(wikitext: &str) -> String {
    classify(wikitext)
        .into_iter()
        .map(|(mark, line)| format!("[{}] {}", mark, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("{{Use dmy dates}}", LineMark::Fenced)]
    #[case("[[File:Ada.jpg|thumb]]", LineMark::Fenced)]
    #[case("<!-- editors: see talk -->", LineMark::Fenced)]
    #[case("'''Ada''' was a [[mathematician]].", LineMark::Kept)]
    #[case("{{Infobox person", LineMark::Template(1))]
    #[case("", LineMark::Kept)]
    #[case("{{}", LineMark::Template(1))]
    #[case("<!--->", LineMark::Kept)]
    fn test_single_line_marks(#[case] line: &str, #[case] expected: LineMark) {
        let mut scanner = LeadScanner::new();
        assert_eq!(scanner.mark(line), expected);
    }

    #[test]
    fn test_multiline_template_dropped() {
        let wikitext = "{{Infobox scientist\n| name = Ada\n| image = {{Image|Ada.jpg}}\n}}\nAda was a writer.";
        let marks: Vec<LineMark> = classify(wikitext).into_iter().map(|(m, _)| m).collect();

        assert_eq!(
            marks,
            vec![
                LineMark::Template(1),
                LineMark::Template(1),
                LineMark::Template(1),
                LineMark::Exited,
                LineMark::Kept
            ]
        );
        assert_eq!(extract_lead(wikitext), "Ada was a writer.");
    }

    #[test]
    fn test_nested_depth_reported() {
        let mut scanner = LeadScanner::new();
        assert_eq!(scanner.mark("{{Outer"), LineMark::Template(1));
        assert_eq!(scanner.mark("| x = {{Inner"), LineMark::Template(2));
        assert_eq!(scanner.mark("}}"), LineMark::Template(1));
        assert_eq!(scanner.mark("}}"), LineMark::Exited);
        assert_eq!(scanner.depth(), 0);
    }

    #[test]
    fn test_single_line_template_closing_is_fenced_not_exit() {
        let mut scanner = LeadScanner::new();
        assert_eq!(scanner.mark("{{Short description|Poet}}"), LineMark::Fenced);
        assert_eq!(scanner.mark("Text"), LineMark::Kept);
    }

    #[test]
    fn test_inline_template_in_prose_kept() {
        let lead = extract_lead("Born {{birth date|1815|12|10}} in London.");
        assert_eq!(lead, "Born {{birth date|1815|12|10}} in London.");
    }

    #[test]
    fn test_stops_at_first_heading() {
        let lead = extract_lead("Intro line.\n\nSecond para.\n== History ==\nLater text.");
        assert_eq!(lead, "Intro line.\n\nSecond para.");
    }

    #[test]
    fn test_heading_first_gives_empty() {
        assert_eq!(extract_lead("== Only a heading ==\ntext"), "");
    }

    #[test]
    fn test_leading_whitespace_stripped() {
        assert_eq!(extract_lead("   indented prose"), "indented prose");
    }

    #[test]
    fn test_stray_closer_goes_negative_and_keeps_lines() {
        let mut scanner = LeadScanner::new();
        assert_eq!(scanner.mark("oops }}"), LineMark::Kept);
        assert_eq!(scanner.depth(), -1);
        assert_eq!(scanner.mark("still prose"), LineMark::Kept);
        assert_eq!(scanner.mark("{{x"), LineMark::Kept);
        assert_eq!(scanner.mark("{{y"), LineMark::Template(1));
    }

    #[test]
    fn test_triple_braces_count_once() {
        let mut scanner = LeadScanner::new();
        assert_eq!(scanner.mark("{{{param"), LineMark::Template(1));
    }

    #[test]
    fn test_crlf_lines() {
        let lead = extract_lead("{{Hatnote|x}}\r\nProse.\r\n== H ==\r\n");
        assert_eq!(lead, "Prose.");
    }

    #[test]
    fn test_render_marks() {
        let rendered = render_marks("{{a}}\n{{b\n}}\ntext");
        assert_eq!(rendered, "[*] {{a}}\n[1] {{b\n[0] }}\n[>] text");
    }
}
