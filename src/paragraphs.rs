/*!
 * Paragraph and block extraction for Markdown text.
 *
 * Two views are offered:
 * - `collect_paragraphs`: blank-line separated paragraphs, fenced code blocks
 *   kept whole. Used by the split and translate stages.
 * - `ParagraphExtractor`: a line classifier that groups lines into typed
 *   blocks (text, fences, tables, equations, html, images, references). Used
 *   by the format-newlines stage to decide where spacing may change.
 */

use once_cell::sync::Lazy;
use regex::Regex;

static TABLE_RULE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[|:+\-=_ ]+$").expect("table rule pattern"));

static REFERENCE_DEFINITION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[.*?\]:").expect("reference definition pattern"));

/// Detect the dominant newline sequence: `\r\n`, then `\r`, then `\n`
pub fn detect_newline(text: &str) -> &'static str {
    if text.contains("\r\n") {
        "\r\n"
    } else if text.contains('\r') {
        "\r"
    } else {
        "\n"
    }
}

/// Split on any newline convention without keeping terminators
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                lines.push(&text[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }

    lines
}

fn is_fence_marker(stripped: &str) -> bool {
    stripped.starts_with("```") || stripped.starts_with("~~~")
}

/// Collect blank-line separated paragraphs, each joined with `\n`.
///
/// Leading and trailing blank lines are ignored. Blank lines inside fenced
/// code blocks stay inside their paragraph.
pub fn collect_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in split_lines(text) {
        let stripped = line.trim_start();

        if is_fence_marker(stripped) {
            in_fence = !in_fence;
            current.push(line);
            continue;
        }

        if in_fence || !stripped.is_empty() {
            current.push(line);
            continue;
        }

        if !current.is_empty() {
            paragraphs.push(current.join("\n"));
            current.clear();
        }
    }

    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
}

/// Convert `\n` inside each paragraph to the requested newline
pub fn normalise_paragraph_newlines(paragraphs: &[String], newline: &str) -> Vec<String> {
    if newline == "\n" {
        return paragraphs.to_vec();
    }
    paragraphs.iter().map(|p| p.replace('\n', newline)).collect()
}

/// Collapse `\r\n` and `\r` into `\n`
pub fn normalise_to_lf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Kind of a classified block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Blank,
    Text,
    CodeFence,
    Equation,
    EquationSingle,
    Html,
    HtmlSingle,
    Table,
    ImageBlock,
    Reference,
}

impl BlockKind {
    pub fn is_blank(&self) -> bool {
        matches!(self, BlockKind::Blank)
    }
}

/// A run of lines sharing one classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub lines: Vec<String>,
    /// Index of the first line, 0-based
    pub line_start: usize,
    /// Index of the last line, inclusive
    pub line_end: usize,
}

impl Block {
    pub fn text(&self, newline: &str) -> String {
        self.lines.join(newline)
    }
}

fn equation_delimiters(stripped: &str) -> usize {
    stripped.matches("$$").count()
}

fn is_equation_single_line(stripped: &str) -> bool {
    stripped != "$$"
        && equation_delimiters(stripped) >= 2
        && stripped.starts_with("$$")
        && stripped.ends_with("$$")
}

pub(crate) fn is_table_line(stripped: &str) -> bool {
    if stripped.is_empty() {
        return false;
    }
    if stripped.starts_with('|') || stripped.starts_with("+-") {
        return true;
    }
    stripped.contains('|') && TABLE_RULE_REGEX.is_match(stripped)
}

pub(crate) fn is_image_line(line: &str) -> bool {
    let stripped = line.trim_start();
    stripped.starts_with("![") && (stripped.contains("](") || stripped.contains("] ["))
}

fn is_reference_definition(stripped: &str) -> bool {
    REFERENCE_DEFINITION_REGEX.is_match(stripped)
}

fn is_html_block_start(stripped: &str) -> bool {
    stripped.starts_with('<') && stripped.ends_with('>') && !stripped.starts_with("</")
}

fn is_html_block_end(stripped: &str) -> bool {
    (stripped.starts_with("</") && stripped.ends_with('>'))
        || stripped.ends_with("/>")
        || (stripped.starts_with("<!") && stripped.ends_with("-->"))
}

/// Multi-line construct currently being collected
#[derive(Debug, Clone, PartialEq, Eq)]
enum OpenBlock {
    Equation { parity: usize },
    Html,
    Table,
    Image,
    Fence { marker: String },
}

impl OpenBlock {
    fn kind(&self) -> BlockKind {
        match self {
            OpenBlock::Equation { .. } => BlockKind::Equation,
            OpenBlock::Html => BlockKind::Html,
            OpenBlock::Table => BlockKind::Table,
            OpenBlock::Image => BlockKind::ImageBlock,
            OpenBlock::Fence { .. } => BlockKind::CodeFence,
        }
    }
}

/// Classifies the lines of a document into structural blocks
pub struct ParagraphExtractor {
    newline: String,
}

impl ParagraphExtractor {
    pub fn new(newline: &str) -> Self {
        let newline = if newline.is_empty() { "\n" } else { newline };
        Self { newline: newline.to_string() }
    }

    pub fn collect(&self, text: &str) -> Vec<Block> {
        let lines: Vec<&str> = text.split(self.newline.as_str()).collect();
        let mut blocks = Vec::new();
        let mut open: Option<(OpenBlock, usize)> = None;
        let mut buffer: Vec<String> = Vec::new();
        let mut i = 0;

        let mut push = |kind: BlockKind, lines: Vec<String>, start: usize, end: usize| {
            blocks.push(Block { kind, lines, line_start: start, line_end: end });
        };

        while i < lines.len() {
            let line = lines[i];
            let stripped = line.trim();

            if let Some((state, start)) = open.take() {
                match state {
                    OpenBlock::Equation { parity } => {
                        buffer.push(line.to_string());
                        let parity = (parity + equation_delimiters(stripped)) % 2;
                        if parity == 0 {
                            push(BlockKind::Equation, std::mem::take(&mut buffer), start, i);
                        } else {
                            open = Some((OpenBlock::Equation { parity }, start));
                        }
                        i += 1;
                    }
                    OpenBlock::Html => {
                        buffer.push(line.to_string());
                        if is_html_block_end(stripped) {
                            push(BlockKind::Html, std::mem::take(&mut buffer), start, i);
                        } else {
                            open = Some((OpenBlock::Html, start));
                        }
                        i += 1;
                    }
                    OpenBlock::Table => {
                        if is_table_line(stripped) {
                            buffer.push(line.to_string());
                            open = Some((OpenBlock::Table, start));
                            i += 1;
                        } else {
                            push(BlockKind::Table, std::mem::take(&mut buffer), start, i - 1);
                        }
                    }
                    OpenBlock::Image => {
                        if is_reference_definition(stripped) {
                            buffer.push(line.to_string());
                            open = Some((OpenBlock::Image, start));
                            i += 1;
                        } else {
                            push(BlockKind::ImageBlock, std::mem::take(&mut buffer), start, i - 1);
                        }
                    }
                    OpenBlock::Fence { marker } => {
                        buffer.push(line.to_string());
                        if stripped.starts_with(marker.as_str()) {
                            push(BlockKind::CodeFence, std::mem::take(&mut buffer), start, i);
                        } else {
                            open = Some((OpenBlock::Fence { marker }, start));
                        }
                        i += 1;
                    }
                }
                continue;
            }

            if stripped.is_empty() {
                push(BlockKind::Blank, vec![line.to_string()], i, i);
            } else if is_image_line(line) {
                buffer = vec![line.to_string()];
                open = Some((OpenBlock::Image, i));
            } else if is_fence_marker(stripped) {
                buffer = vec![line.to_string()];
                open = Some((OpenBlock::Fence { marker: stripped[..3].to_string() }, i));
            } else if equation_delimiters(stripped) > 0 {
                let parity = equation_delimiters(stripped) % 2;
                if is_equation_single_line(stripped) || parity == 0 {
                    push(BlockKind::EquationSingle, vec![line.to_string()], i, i);
                } else {
                    buffer = vec![line.to_string()];
                    open = Some((OpenBlock::Equation { parity }, i));
                }
            } else if is_html_block_start(stripped) {
                let opens = stripped.matches('<').count();
                if (stripped.contains("</") && opens > 1) || is_html_block_end(stripped) {
                    push(BlockKind::HtmlSingle, vec![line.to_string()], i, i);
                } else {
                    buffer = vec![line.to_string()];
                    open = Some((OpenBlock::Html, i));
                }
            } else if is_table_line(stripped) {
                buffer = vec![line.to_string()];
                open = Some((OpenBlock::Table, i));
            } else if is_reference_definition(stripped) {
                push(BlockKind::Reference, vec![line.to_string()], i, i);
            } else {
                push(BlockKind::Text, vec![line.to_string()], i, i);
            }
            i += 1;
        }

        if let Some((state, start)) = open {
            if !buffer.is_empty() {
                push(state.kind(), buffer, start, lines.len() - 1);
            }
        }

        blocks
    }
}
