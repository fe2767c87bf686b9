/*!
 * Tests for language code utilities
 */

use md_tools::language_utils::{get_language_name, normalize_to_part2t, validate_language_code, LanguageCodeType};

#[test]
fn test_validate_language_code_withPart1Code_shouldAccept() {
    assert_eq!(validate_language_code("en", false).unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code("FR", false).unwrap(), LanguageCodeType::Part1);
}

#[test]
fn test_validate_language_code_withThreeLetterCodes_shouldDistinguishForms() {
    assert_eq!(validate_language_code("deu", false).unwrap(), LanguageCodeType::Part2T);
    assert_eq!(validate_language_code("ger", false).unwrap(), LanguageCodeType::Part2B);
}

#[test]
fn test_validate_language_code_withUnknownCode_shouldFail() {
    assert!(validate_language_code("xx", false).is_err());
    assert!(validate_language_code("", true).is_err());
    assert!(validate_language_code("automatic", true).is_err());
}

#[test]
fn test_normalize_to_part2t_shouldMapAllForms() {
    assert_eq!(normalize_to_part2t("es").unwrap(), "spa");
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("zh-TW").unwrap(), "zho");
}

#[test]
fn test_get_language_name_shouldReturnEnglishName() {
    assert_eq!(get_language_name("de").unwrap(), "German");
    assert_eq!(get_language_name("auto").unwrap(), "auto-detected");
    assert!(get_language_name("qq").is_err());
}
