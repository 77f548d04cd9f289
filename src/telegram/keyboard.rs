//! Quality prompt keyboard and its callback payloads.
//!
//! Payloads look like `fmt:<generation>:<format_id>` or `fmt:<generation>:auto`.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::download::formats::{Choice, PresentedChoice};

pub const CALLBACK_PREFIX: &str = "fmt";

const AUTO_TOKEN: &str = "auto";

/// Telegram rejects callback data longer than this
const MAX_CALLBACK_DATA_BYTES: usize = 64;

pub fn encode_choice(generation: u64, choice: &Choice) -> String {
    match choice {
        Choice::Format(id) => format!("{}:{}:{}", CALLBACK_PREFIX, generation, id),
        Choice::Auto => format!("{}:{}:{}", CALLBACK_PREFIX, generation, AUTO_TOKEN),
    }
}

/// Parses a payload produced by [`encode_choice`]. Anything else is `None`.
pub fn parse_choice(data: &str) -> Option<(u64, Choice)> {
    let mut parts = data.splitn(3, ':');
    if parts.next()? != CALLBACK_PREFIX {
        return None;
    }
    let generation = parts.next()?.parse().ok()?;
    let choice = match parts.next()? {
        "" => return None,
        AUTO_TOKEN => Choice::Auto,
        id => Choice::Format(id.to_string()),
    };
    Some((generation, choice))
}

/// One button per row, in presentation order.
pub fn build_choice_keyboard(choices: &[PresentedChoice], generation: u64) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = choices
        .iter()
        .filter_map(|choice| {
            let data = encode_choice(generation, &choice.choice());
            if data.len() > MAX_CALLBACK_DATA_BYTES {
                log::warn!("Skipping button with oversized callback data: {}", data);
                return None;
            }
            Some(vec![InlineKeyboardButton::callback(choice.label(), data)])
        })
        .collect();

    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::formats::{CandidateFormat, MediaKind};
    use pretty_assertions::assert_eq;
    use teloxide::types::InlineKeyboardButtonKind;

    fn video(id: &str, label: &str) -> PresentedChoice {
        PresentedChoice::Format(CandidateFormat {
            id: id.to_string(),
            kind: MediaKind::Video,
            label: label.to_string(),
            size: Some(1),
            ext: Some("mp4".to_string()),
        })
    }

    #[test]
    fn test_encode_and_parse() {
        assert_eq!(encode_choice(12, &Choice::Auto), "fmt:12:auto");
        assert_eq!(encode_choice(12, &Choice::Format("22".into())), "fmt:12:22");
        assert_eq!(parse_choice("fmt:12:auto"), Some((12, Choice::Auto)));
        assert_eq!(
            parse_choice("fmt:3:hls-720p:1"),
            Some((3, Choice::Format("hls-720p:1".to_string())))
        );
    }

    #[test]
    fn test_parse_rejects_foreign_payloads() {
        assert_eq!(parse_choice("format_auto"), None);
        assert_eq!(parse_choice("fmt:x:22"), None);
        assert_eq!(parse_choice("fmt:1:"), None);
        assert_eq!(parse_choice("fmt:1"), None);
        assert_eq!(parse_choice("dl:mp4:1"), None);
    }

    #[test]
    fn test_keyboard_has_one_button_per_row() {
        let keyboard = build_choice_keyboard(&[video("22", "720p"), PresentedChoice::Auto], 9);
        assert_eq!(keyboard.inline_keyboard.len(), 2);

        let last = &keyboard.inline_keyboard[1][0];
        assert_eq!(last.text, "⚡ Auto Select Best");
        match &last.kind {
            InlineKeyboardButtonKind::CallbackData(data) => assert_eq!(data, "fmt:9:auto"),
            other => panic!("unexpected button kind: {:?}", other),
        }
    }

    #[test]
    fn test_oversized_payload_is_skipped() {
        let long_id = "x".repeat(80);
        let keyboard = build_choice_keyboard(&[video(&long_id, "720p"), PresentedChoice::Auto], 1);
        assert_eq!(keyboard.inline_keyboard.len(), 1);
    }
}
