use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static BRANCH_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*-\s*(chi nhanh|branch).*$").unwrap());

/// Lowercase, strip diacritics, drop a trailing "- branch ..." qualifier,
/// replace punctuation with spaces and collapse whitespace.
pub fn normalize_place_name(name: &str) -> String {
    if name.trim().is_empty() {
        return String::new();
    }
    let folded = fold_diacritics(&name.to_lowercase());
    let without_branch = BRANCH_SUFFIX_RE.replace(&folded, "");
    without_branch
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c.is_whitespace() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// NFD + drop combining marks. `đ` has no decomposition, so it is mapped by hand.
pub fn fold_diacritics(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .collect()
}

/// Collapse any run of whitespace into a single space and trim.
pub fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_branch_suffix_vietnamese() {
        assert_eq!(normalize_place_name("Cafe Sữa Đá - Chi nhánh 2"), "cafe sua da");
    }

    #[test]
    fn strips_branch_suffix_english() {
        assert_eq!(normalize_place_name("Highlands Coffee - Branch Tran Phu"), "highlands coffee");
    }

    #[test]
    fn punctuation_and_spacing() {
        assert_eq!(normalize_place_name("  Phở   Hòa (Pasteur)!! "), "pho hoa pasteur");
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize_place_name(""), "");
        assert_eq!(normalize_place_name("   "), "");
    }

    #[test]
    fn folds_vietnamese_letters() {
        assert_eq!(fold_diacritics("Đường Lê Lợi"), "Duong Le Loi");
    }

    #[test]
    fn deterministic() {
        let a = normalize_place_name("Bảo tàng Hải dương học");
        assert_eq!(a, normalize_place_name("Bảo tàng Hải dương học"));
        assert_eq!(a, "bao tang hai duong hoc");
    }
}
