//! Province name normalization
//!
//! Event records carry free-form province names ("浙江省", "广西壮族自治区",
//! "Guangdong Province") while the boundary dataset uses its own spelling.
//! Both sides are reduced to the same key by stripping administrative tokens.
//!
//! Distinct names that reduce to the same key are treated as one province.

/// Administrative tokens removed wherever they occur
const CJK_TOKENS: [&str; 6] = ["特别行政区", "自治区", "维吾尔", "回族", "壮族", "省"];

/// English administrative words removed when they end the name (case-insensitive)
const ENGLISH_SUFFIXES: [&str; 7] = [
    "special administrative region",
    "autonomous region",
    "province",
    "uyghur",
    "uygur",
    "zhuang",
    "hui",
];

/// Reduce a province name to its join key.
///
/// Stripping repeats until nothing changes, so the result is a fixed point:
/// `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(name: &str) -> String {
    let mut current = name.trim().to_string();
    loop {
        let mut next = current.clone();
        for token in CJK_TOKENS {
            next = next.replace(token, "");
        }
        let next = strip_english_suffix(next.trim()).trim().to_string();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_english_suffix(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    for suffix in ENGLISH_SUFFIXES {
        if !lower.ends_with(suffix) {
            continue;
        }
        // ASCII lowercasing keeps byte offsets, and the suffix is ASCII
        let head = &name[..name.len() - suffix.len()];
        if head.ends_with(char::is_whitespace) && !head.trim().is_empty() {
            return head.trim_end().to_string();
        }
    }
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_province_suffix() {
        assert_eq!(normalize("浙江省"), "浙江");
        assert_eq!(normalize("四川省"), "四川");
    }

    #[test]
    fn test_strips_autonomous_region_qualifiers() {
        assert_eq!(normalize("新疆维吾尔自治区"), "新疆");
        assert_eq!(normalize("广西壮族自治区"), "广西");
        assert_eq!(normalize("宁夏回族自治区"), "宁夏");
        assert_eq!(normalize("西藏自治区"), "西藏");
        assert_eq!(normalize("内蒙古自治区"), "内蒙古");
    }

    #[test]
    fn test_strips_special_administrative_region() {
        assert_eq!(normalize("香港特别行政区"), "香港");
        assert_eq!(normalize("澳门特别行政区"), "澳门");
    }

    #[test]
    fn test_municipalities_are_left_alone() {
        assert_eq!(normalize("北京市"), "北京市");
        assert_eq!(normalize("上海"), "上海");
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        assert_eq!(normalize("  浙江省 "), "浙江");
    }

    #[test]
    fn test_english_suffixes() {
        assert_eq!(normalize("Guangdong Province"), "Guangdong");
        assert_eq!(normalize("Xinjiang Uygur Autonomous Region"), "Xinjiang");
        assert_eq!(normalize("Hong Kong Special Administrative Region"), "Hong Kong");
        assert_eq!(normalize("guangxi zhuang autonomous region"), "guangxi");
    }

    #[test]
    fn test_english_suffix_requires_word_boundary() {
        // "Chui" ends with "hui" but not as a separate word
        assert_eq!(normalize("Chui"), "Chui");
        // A bare suffix is not stripped down to nothing
        assert_eq!(normalize("Province"), "Province");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let names = [
            "浙江省",
            "新疆维吾尔自治区",
            "香港特别行政区",
            "自治自治区区",
            "省省",
            "Guangdong Province Province",
            "Ningxia Hui Autonomous Region",
            "北京市",
            "",
            "   ",
        ];
        for name in names {
            let once = normalize(name);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", name);
        }
    }

    #[test]
    fn test_nested_tokens_reach_fixed_point() {
        // Removing the inner token exposes an outer one
        assert_eq!(normalize("自治自治区区"), "");
    }

    #[test]
    fn test_distinct_names_can_share_a_key() {
        assert_eq!(normalize("广西壮族自治区"), normalize("广西"));
    }
}
