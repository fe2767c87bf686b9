/*!
 * Tests for paragraph and block extraction
 */

use md_tools::paragraphs::{collect_paragraphs, detect_newline, BlockKind, ParagraphExtractor};

#[test]
fn test_detect_newline_shouldPreferCrLf() {
    assert_eq!(detect_newline("a\r\nb\nc"), "\r\n");
    assert_eq!(detect_newline("a\rb"), "\r");
    assert_eq!(detect_newline("a\nb"), "\n");
    assert_eq!(detect_newline("plain"), "\n");
}

#[test]
fn test_collect_paragraphs_withSurroundingBlanks_shouldIgnoreThem() {
    let paragraphs = collect_paragraphs("\n\nFirst line\nsecond line\n\n\n\nNext\n\n");

    assert_eq!(paragraphs, vec!["First line\nsecond line".to_string(), "Next".to_string()]);
}

#[test]
fn test_collect_paragraphs_withTildeFence_shouldKeepFenceWhole() {
    let paragraphs = collect_paragraphs("Intro\n\n~~~\ncode\n\nmore code\n~~~\n\nOutro");

    assert_eq!(paragraphs.len(), 3);
    assert_eq!(paragraphs[1], "~~~\ncode\n\nmore code\n~~~");
}

#[test]
fn test_paragraph_extractor_shouldClassifyStructuralBlocks() {
    let text = "# Title\n$$\nx = 1\n$$\n<div>\ntext\n</div>\n![img](a.png)\n[a]: http://example.com\nPlain";
    let kinds: Vec<BlockKind> = ParagraphExtractor::new("\n")
        .collect(text)
        .into_iter()
        .map(|b| b.kind)
        .collect();

    assert_eq!(
        kinds,
        vec![BlockKind::Text, BlockKind::Equation, BlockKind::Html, BlockKind::ImageBlock, BlockKind::Text]
    );
}

#[test]
fn test_paragraph_extractor_singleLineConstructs_shouldBeSingleBlocks() {
    let text = "$$E = mc^2$$\n<br/>\n[ref]: http://example.com";
    let kinds: Vec<BlockKind> = ParagraphExtractor::new("\n")
        .collect(text)
        .into_iter()
        .map(|b| b.kind)
        .collect();

    assert_eq!(kinds, vec![BlockKind::EquationSingle, BlockKind::HtmlSingle, BlockKind::Reference]);
}
