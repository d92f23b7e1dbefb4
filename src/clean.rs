use std::sync::LazyLock;

use regex::{Regex, RegexSet};
use url::Url;

use crate::text::squash_whitespace;

const MIN_ADDRESS_CHARS: usize = 5;
const MIN_KEYWORDLESS_ADDRESS_CHARS: usize = 15;

/// Text that lands in address slots but is not an address: ratings, open/closed
/// labels, sponsored markers and amenity snippets from neighbouring widgets.
static NOT_AN_ADDRESS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"\d+[,.]?\d*\s*\(\d",
        r"·",
        r"(?i)Điểm thu hút",
        r"(?i)Điểm mốc",
        r"(?i)Đường đi",
        r"(?i)Mở cửa",
        r"(?i)Đóng cửa",
        r"(?i)Sắp đóng",
        r"(?i)Sắp mở",
        r"(?i)\bsao\b",
        r"(?i)\bstar\b",
        r"(?i)Khách sạn nghỉ",
        r"(?i)Bể bơi",
        r"(?i)Wi-Fi",
        r"(?i)Được tài trợ",
        r"(?i)Của Agoda",
        r"(?i)Booking\.com",
        r"(?i)Đại lý du lịch",
        r"(?i)Công viên xe",
        r"(?i)Phòng cho thuê",
    ])
    .unwrap()
});

const ADDRESS_KEYWORDS: &[&str] = &[
    "đường", "phố", "quận", "huyện", "tỉnh", "thành phố", "tp", "phường", "xã", "thị trấn",
    "ấp", "thôn", "số", "ngõ", "ngách", "street", "road", "district", "city", "province",
    "ward", "việt nam", "vietnam", "vn", "khánh hòa", "nha trang",
];

static HAS_DIGIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").unwrap());

/// Accept `text` as an address only if it passes the denylist and either names an
/// administrative unit or is long enough and carries a house number.
pub fn clean_address(text: &str) -> Option<String> {
    let addr = squash_whitespace(text);
    let len = addr.chars().count();
    if len < MIN_ADDRESS_CHARS || NOT_AN_ADDRESS.is_match(&addr) {
        return None;
    }

    let lower = addr.to_lowercase();
    let has_keyword = ADDRESS_KEYWORDS.iter().any(|kw| lower.contains(kw));
    let has_number = HAS_DIGIT_RE.is_match(&addr);

    if has_keyword || (has_number && len > MIN_KEYWORDLESS_ADDRESS_CHARS) {
        Some(addr)
    } else {
        None
    }
}

/// Unwrap `google.com/url?q=<target>` redirects and drop links back into the map itself.
pub fn clean_website(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    let target = if url.contains("google.com/url") && url.contains("q=") {
        redirect_target(url)?
    } else {
        url.to_string()
    };

    if target.contains("google.com/maps") {
        return None;
    }
    Some(target)
}

fn redirect_target(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let target = parsed
        .query_pairs()
        .find(|(k, _)| k == "q")
        .map(|(_, v)| v.into_owned())?;
    if target.is_empty() {
        None
    } else {
        Some(target)
    }
}
