use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for the translation stage
///
/// Codes are accepted in ISO 639-1 (2-letter) or ISO 639-2 (3-letter) form,
/// optionally followed by a region or script suffix (`zh-CN`, `pt_BR`).
/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// Source language detection requested
    Auto,
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// ISO 639-2/B codes that differ from their 639-2/T form
fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    let mapped = match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        _ => return None,
    };
    Some(mapped)
}

/// Strip a region or script suffix: `zh-CN` -> `zh`
fn primary_subtag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Validate a language code as accepted by the translation stage.
///
/// `auto` is only valid when `allow_auto` is set (source languages).
pub fn validate_language_code(code: &str, allow_auto: bool) -> Result<LanguageCodeType> {
    let primary = primary_subtag(code);

    if primary == "auto" && code.trim().len() == 4 {
        if allow_auto {
            return Ok(LanguageCodeType::Auto);
        }
        return Err(anyhow!("'auto' is only allowed as a source language"));
    }

    if primary.len() == 2 {
        if Language::from_639_1(&primary).is_some() {
            return Ok(LanguageCodeType::Part1);
        }
    } else if primary.len() == 3 {
        if Language::from_639_3(&primary).is_some() {
            return Ok(LanguageCodeType::Part2T);
        }
        if bibliographic_to_terminology(&primary).is_some() {
            return Ok(LanguageCodeType::Part2B);
        }
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let primary = primary_subtag(code);

    if primary.len() == 2 {
        if let Some(lang) = Language::from_639_1(&primary) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if primary.len() == 3 {
        if Language::from_639_3(&primary).is_some() {
            return Ok(primary);
        }
        if let Some(part2t) = bibliographic_to_terminology(&primary) {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    if primary_subtag(code) == "auto" {
        return Ok("auto-detected".to_string());
    }
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}
