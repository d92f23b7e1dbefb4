use std::sync::LazyLock;

use scraper::Selector;

use super::{first_match, Strategy};
use crate::snapshot::{text_of, Snapshot};

static CATEGORY_BUTTON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("button[jsaction*='category']").unwrap());
static CATEGORY_CLASS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("button.DkEaL").unwrap());

const STRATEGIES: &[(&str, Strategy<String>)] = &[
    ("category_action", category_action),
    ("category_class", category_class),
];

pub fn extract(snap: &Snapshot) -> Option<String> {
    first_match("category", snap, STRATEGIES)
}

fn category_action(snap: &Snapshot) -> Option<String> {
    snap.select(&CATEGORY_BUTTON).map(|b| text_of(&b)).find(|t| {
        let n = t.chars().count();
        n > 3 && n < 50
    })
}

fn category_class(snap: &Snapshot) -> Option<String> {
    snap.select(&CATEGORY_CLASS)
        .map(|b| text_of(&b))
        .find(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_button_with_sane_length() {
        let snap = Snapshot::parse(
            r#"<button jsaction="pane.rating.category">Bảo tàng</button><button class="DkEaL">Khác</button>"#,
        );
        assert_eq!(extract(&snap).as_deref(), Some("Bảo tàng"));
    }

    #[test]
    fn short_action_text_falls_back_to_class() {
        let snap = Snapshot::parse(
            r#"<button jsaction="pane.category">Ok</button><button class="DkEaL">Quán cà phê</button>"#,
        );
        assert_eq!(extract(&snap).as_deref(), Some("Quán cà phê"));
    }
}
