//! Reply/inline keyboards and the fixed menu label set.
//!
//! Menu labels are matched by exact string equality, emoji included; any
//! client-side variant falls through to the free-text branch of the router.

use teloxide::types::{InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::telegram::cb;

/// Main reply-keyboard labels.
pub const LABEL_SUPPORT: &str = "✍️ Murojaat yuborish";
pub const LABEL_VACANCIES: &str = "📄 Vakansiyalar";
pub const LABEL_MY_CHATS: &str = "💬 Mening chatlarim";
pub const LABEL_ORDER: &str = "📦 Buyurtma berish";
pub const LABEL_CATALOG: &str = "📂 Katalog";

/// Support topics: (callback key, display title).
pub const TOPICS: &[(&str, &str)] = &[
    ("buyurtma", "📦 Buyurtma holati"),
    ("texnik", "⚙️ Texnik yordam"),
    ("hamkorlik", "🤝 Hamkorlik"),
    ("taklif", "💡 Taklif va shikoyat"),
];

/// Topic key used for tickets synthesized from the web contact form.
pub const WEB_ORDER_TOPIC: &str = "buyurtma";

/// Display title for a topic key; unknown keys fall back to the key itself.
pub fn topic_title(key: &str) -> &str {
    TOPICS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, title)| *title)
        .unwrap_or(key)
}

/// True when a topic key is one of the fixed set.
pub fn is_known_topic(key: &str) -> bool {
    TOPICS.iter().any(|(k, _)| *k == key)
}

/// The persistent main menu keyboard.
pub fn main_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(LABEL_SUPPORT), KeyboardButton::new(LABEL_VACANCIES)],
        vec![KeyboardButton::new(LABEL_MY_CHATS), KeyboardButton::new(LABEL_ORDER)],
        vec![KeyboardButton::new(LABEL_CATALOG)],
    ])
    .resize_keyboard()
}

/// Inline keyboard with one button per support topic.
pub fn topic_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        TOPICS
            .iter()
            .map(|(key, title)| vec![cb(*title, format!("topic_{key}"))])
            .collect::<Vec<_>>(),
    )
}

/// 1..5 rating keyboard sent after a ticket is closed.
pub fn rating_keyboard(ticket_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![(1..=5usize)
        .map(|n| cb("⭐".repeat(n), format!("rate_{ticket_id}_{n}")))
        .collect::<Vec<_>>()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn main_keyboard_contains_all_five_labels() {
        let keyboard = main_keyboard();
        let labels: Vec<&str> = keyboard
            .keyboard
            .iter()
            .flatten()
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(
            labels,
            vec![LABEL_SUPPORT, LABEL_VACANCIES, LABEL_MY_CHATS, LABEL_ORDER, LABEL_CATALOG]
        );
    }

    #[test]
    fn topic_keyboard_callback_data_uses_topic_prefix() {
        let keyboard = topic_keyboard();
        let rows = &keyboard.inline_keyboard;
        assert_eq!(rows.len(), TOPICS.len());
        for (row, (key, title)) in rows.iter().zip(TOPICS) {
            assert_eq!(row.len(), 1);
            assert_eq!(row[0].text, *title);
            match &row[0].kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                    assert_eq!(data, &format!("topic_{key}"));
                }
                other => panic!("unexpected button kind: {:?}", other),
            }
        }
    }

    #[test]
    fn rating_keyboard_has_five_buttons_in_one_row() {
        let keyboard = rating_keyboard(42);
        assert_eq!(keyboard.inline_keyboard.len(), 1);
        assert_eq!(keyboard.inline_keyboard[0].len(), 5);
        match &keyboard.inline_keyboard[0][4].kind {
            teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                assert_eq!(data, "rate_42_5");
            }
            other => panic!("unexpected button kind: {:?}", other),
        }
    }

    #[test]
    fn topic_title_falls_back_to_key() {
        assert_eq!(topic_title("texnik"), "⚙️ Texnik yordam");
        assert_eq!(topic_title("boshqa"), "boshqa");
        assert!(is_known_topic("buyurtma"));
        assert!(!is_known_topic("boshqa"));
    }
}
