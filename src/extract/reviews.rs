use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Local};
use regex::Regex;
use scraper::Selector;
use tracing::debug;

use super::dates::resolve_relative_date;
use super::{activate_tab, scroll_containers, soft, with_snapshot};
use crate::config::{pause, Delays};
use crate::driver::PageDriver;
use crate::model::Review;
use crate::snapshot::{attr, find_in, text_of, Snapshot};

const TAB_LABELS: &[&str] = &["đánh giá", "review"];
const SCROLLABLE: &str = "div[role='main']";
const SCROLL_SIGNALS: usize = 3;
const MIN_TEXT_CHARS: usize = 5;
const ANONYMOUS: &str = "Anonymous";

/// Truncated-review expanders: (selector, accepted button texts).
const EXPANDERS: &[(&str, &[&str])] = &[
    (
        "button.w8nwRe.kyuRq, button[aria-label='Xem thêm'], button[jsaction*='review.expandReview']",
        &["thêm", "more", "see more", "xem thêm"],
    ),
    ("button.w8nwRe", &["thêm", "more"]),
];

static REVIEW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div[data-review-id]").unwrap());
static AUTHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div[class*='d4r55']").unwrap());
static STARS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span[role='img'][aria-label]").unwrap());
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span[class*='wiI7pd']").unwrap());
static WHEN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span[class*='rsqaWe']").unwrap());
static FIRST_INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").unwrap());

pub fn extract(driver: &mut dyn PageDriver, delays: &Delays, limit: usize, now: DateTime<Local>) -> Vec<Review> {
    if limit == 0 {
        return Vec::new();
    }
    activate_tab(driver, "reviews", TAB_LABELS, delays.tab_ms);
    scroll_containers(driver, "reviews", SCROLLABLE, SCROLL_SIGNALS, delays.review_scroll_ms);
    let expanded = expand_truncated(driver, delays.expand_click_ms);
    debug!(expanded, "review bodies expanded");
    pause(delays.expand_settle_ms);
    with_snapshot(driver, "reviews", |snap| Some(parse(snap, limit, now))).unwrap_or_default()
}

/// Click every visible "more" control so bodies are captured in full. Returns the click count.
fn expand_truncated(driver: &mut dyn PageDriver, click_ms: u64) -> usize {
    let mut clicks = 0;
    for (css, texts) in EXPANDERS {
        let buttons = soft("reviews", "find expanders", driver.find_elements(css)).unwrap_or_default();
        for button in &buttons {
            if !soft("reviews", "expander visible", driver.is_displayed(button)).unwrap_or(false) {
                continue;
            }
            let Some(text) = soft("reviews", "expander text", driver.text(button)) else {
                continue;
            };
            let text = text.trim().to_lowercase();
            if !texts.contains(&text.as_str()) {
                continue;
            }
            if soft("reviews", "click expander", driver.click(button)).is_some() {
                clicks += 1;
                pause(click_ms);
            }
        }
    }
    clicks
}

/// Reviews in page order, first occurrence per review id, at most `limit`.
pub fn parse(snap: &Snapshot, limit: usize, now: DateTime<Local>) -> Vec<Review> {
    let mut seen = HashSet::new();
    snap.select(&REVIEW)
        .filter(|div| attr(div, "data-review-id").is_some_and(|id| !id.is_empty() && seen.insert(id)))
        .filter_map(|div| {
            let text = find_in(&div, &BODY).map(|b| text_of(&b)).unwrap_or_default();
            if text.chars().count() <= MIN_TEXT_CHARS {
                return None;
            }
            let author = find_in(&div, &AUTHOR)
                .map(|a| text_of(&a))
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| ANONYMOUS.to_string());
            let rating = find_in(&div, &STARS)
                .and_then(|s| attr(&s, "aria-label"))
                .and_then(|label| FIRST_INT.captures(label))
                .and_then(|c| c[1].parse::<f32>().ok())
                .unwrap_or(0.0);
            let date = find_in(&div, &WHEN).and_then(|w| resolve_relative_date(&text_of(&w), now));
            Some(Review {
                author,
                rating,
                text,
                date,
            })
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{FakeDriver, FakeElement};
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 12, 3, 9, 0, 0).unwrap()
    }

    const REVIEWS: &str = r#"
      <div data-review-id="r1"><div class="d4r55 fontTitleSmall">Nguyễn An</div>
        <span role="img" aria-label="5 sao"></span><span class="rsqaWe">2 tháng trước</span>
        <span class="wiI7pd">Bảo tàng rất đẹp, nhiều hiện vật thú vị.</span></div>
      <div data-review-id="r1"><span class="wiI7pd">Bản lặp của r1 trong khung khác</span></div>
      <div data-review-id="r2"><span role="img" aria-label="4 stars"></span>
        <span class="wiI7pd">Tốt</span></div>
      <div data-review-id="r3"><span role="img" aria-label="không rõ"></span>
        <span class="rsqaWe">vừa xong</span><span class="wiI7pd">Sạch sẽ và yên tĩnh</span></div>
      <div data-review-id="r4"><span class="wiI7pd">Không được đến lượt</span></div>"#;

    #[test]
    fn parses_dedups_and_caps() {
        let reviews = parse(&Snapshot::parse(REVIEWS), 2, now());
        assert_eq!(reviews.len(), 2);

        assert_eq!(reviews[0].author, "Nguyễn An");
        assert_eq!(reviews[0].rating, 5.0);
        assert_eq!(reviews[0].date, NaiveDate::from_ymd_opt(2024, 10, 4));

        // r2's body is too short; r3 has no author, no number, unknown date.
        assert_eq!(reviews[1].author, ANONYMOUS);
        assert_eq!(reviews[1].rating, 0.0);
        assert_eq!(reviews[1].text, "Sạch sẽ và yên tĩnh");
        assert_eq!(reviews[1].date, None);
    }

    #[test]
    fn clicks_only_visible_expanders_with_known_text() {
        let mut driver = FakeDriver::with_page("u", REVIEWS);
        driver.add("button[role='tab']", FakeElement::new("Bài đánh giá"));
        let (primary, _) = EXPANDERS[0];
        driver.add(primary, FakeElement::new(" Thêm "));
        driver.add(primary, FakeElement::new("Thêm").hidden());
        driver.add(primary, FakeElement::new("Chia sẻ"));
        driver.add("button.w8nwRe", FakeElement::new("More"));

        let reviews = extract(&mut driver, &Delays::none(), 3, now());
        assert_eq!(reviews.len(), 3);
        assert_eq!(driver.clicked_texts(), vec!["Bài đánh giá", " Thêm ", "More"]);
    }

    #[test]
    fn zero_limit_touches_nothing() {
        let mut driver = FakeDriver::with_page("u", REVIEWS);
        driver.add("button[role='tab']", FakeElement::new("Đánh giá"));
        assert!(extract(&mut driver, &Delays::none(), 0, now()).is_empty());
        assert!(driver.clicks.is_empty());
    }
}
