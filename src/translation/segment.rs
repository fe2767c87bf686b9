/*!
 * Paragraph segmentation for translation.
 *
 * A paragraph is cut into runs of lines that should be translated and runs
 * that must be kept verbatim (display equations, html, tables, images).
 */

use crate::paragraphs::split_lines;

/// Consecutive lines sharing one translate/keep decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub lines: Vec<String>,
    pub translatable: bool,
}

impl Segment {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Tracks multi-line constructs that span several lines
#[derive(Default)]
struct LineClassifier {
    in_equation: bool,
    in_html: bool,
}

impl LineClassifier {
    fn is_translatable(&mut self, line: &str) -> bool {
        let stripped = line.trim();

        if self.in_equation {
            if stripped.ends_with("$$") {
                self.in_equation = false;
            }
            return false;
        }

        if self.in_html {
            if stripped.starts_with("</") && stripped.ends_with('>') {
                self.in_html = false;
            }
            return false;
        }

        if stripped.is_empty() {
            return true;
        }

        if stripped.starts_with("$$") {
            if stripped == "$$" || !stripped.ends_with("$$") {
                self.in_equation = true;
            }
            return false;
        }

        if stripped.starts_with('<') {
            if !stripped.starts_with("</") && !stripped.ends_with("/>") && !stripped.contains("</") {
                self.in_html = true;
            }
            return false;
        }

        if stripped.starts_with('|') || stripped.starts_with("+-") {
            return false;
        }

        if line.contains("![") && line.contains("](") {
            return false;
        }

        true
    }
}

/// Split a paragraph into translatable and verbatim segments
pub fn segment_paragraph(paragraph: &str) -> Vec<Segment> {
    let lines = split_lines(paragraph);
    if lines.is_empty() {
        return vec![Segment { lines: Vec::new(), translatable: true }];
    }

    let mut classifier = LineClassifier::default();
    let mut segments: Vec<Segment> = Vec::new();

    for line in lines {
        let translatable = classifier.is_translatable(line);
        match segments.last_mut() {
            Some(current) if current.translatable == translatable => {
                current.lines.push(line.to_string());
            }
            _ => segments.push(Segment {
                lines: vec![line.to_string()],
                translatable,
            }),
        }
    }

    segments
}
