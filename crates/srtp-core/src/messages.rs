//! Rendering of message templates into player-facing notices.

use srtp_types::{MessageDelivery, Outcome, Requester, RtpSettings};

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub key: String,
    /// Final text with color codes translated.
    pub text: String,
    pub channel: MessageDelivery,
}

/// Read-only view over the configured templates.
pub struct MessageCatalog<'a> {
    settings: &'a RtpSettings,
}

impl<'a> MessageCatalog<'a> {
    pub fn new(settings: &'a RtpSettings) -> Self {
        Self { settings }
    }

    /// Renders `key` for `to`, substituting `%name%` placeholders from `vars`.
    ///
    /// Unknown keys render as `&7[key]`. The console always receives chat.
    pub fn render(&self, key: &str, vars: &[(&str, String)], to: Requester) -> Notice {
        let mut raw = self
            .settings
            .messages
            .get(key)
            .cloned()
            .unwrap_or_else(|| format!("&7[{key}]"));
        for (name, value) in vars {
            raw = raw.replace(&format!("%{name}%"), value);
        }

        let channel = match to {
            Requester::Console => MessageDelivery::Chat,
            Requester::Player(_) => self.settings.message_delivery.channel_for(key),
        };

        if channel == MessageDelivery::Chat && !self.settings.prefix.is_empty() {
            raw.insert_str(0, &self.settings.prefix);
        }

        Notice {
            key: key.to_string(),
            text: translate_color_codes(&raw),
            channel,
        }
    }

    /// Renders the message for a resolved outcome.
    pub fn for_outcome(&self, outcome: &Outcome, to: Requester) -> Notice {
        let vars = match outcome {
            Outcome::WorldNotAllowed { allowed } => vec![("worlds", allowed.join(", "))],
            Outcome::InsufficientFunds { cost } => vec![("cost", format_amount(*cost))],
            Outcome::OnCooldown { remaining_seconds } => {
                vec![("seconds", remaining_seconds.to_string())]
            }
            _ => Vec::new(),
        };
        self.render(outcome.message_key(), &vars, to)
    }
}

/// Replaces `&` color codes with the section sign.
pub fn translate_color_codes(text: &str) -> String {
    text.replace('&', "§")
}

/// Shortest decimal form that keeps at least one fractional digit, so
/// templates written for the plugin render `250.0`, not `250` or `250.00`.
fn format_amount(amount: f64) -> String {
    format!("{amount:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use srtp_types::SubjectId;

    fn player() -> Requester {
        Requester::Player(SubjectId::new_v4())
    }

    #[test]
    fn missing_key_renders_placeholder() {
        let settings = RtpSettings::default();
        let notice = MessageCatalog::new(&settings).render("nope", &[], player());
        assert_eq!(notice.text, "§7[nope]");
    }

    #[test]
    fn placeholders_and_colors_are_substituted() {
        let settings = RtpSettings::default();
        let catalog = MessageCatalog::new(&settings);

        let notice = catalog.for_outcome(
            &Outcome::OnCooldown {
                remaining_seconds: 20,
            },
            player(),
        );
        assert_eq!(notice.key, "cooldown");
        assert!(notice.text.contains("20s"));
        assert!(notice.text.starts_with('§'));
        assert!(!notice.text.contains('&'));

        let notice = catalog.for_outcome(
            &Outcome::WorldNotAllowed {
                allowed: vec!["world".to_string(), "lobby".to_string()],
            },
            player(),
        );
        assert!(notice.text.contains("world, lobby"));

        let notice = catalog.for_outcome(&Outcome::InsufficientFunds { cost: 250.0 }, player());
        assert!(notice.text.contains("250.0"));
        assert!(!notice.text.contains("250.00"));

        let notice = catalog.for_outcome(&Outcome::InsufficientFunds { cost: 12.75 }, player());
        assert!(notice.text.contains("12.75"));
    }

    #[test]
    fn prefix_applies_to_chat_only() {
        let settings = RtpSettings {
            prefix: "&8[RTP] ".to_string(),
            message_delivery: MessageDelivery::ActionBar,
            ..Default::default()
        };
        let catalog = MessageCatalog::new(&settings);

        let bar = catalog.render("success", &[], player());
        assert_eq!(bar.channel, MessageDelivery::ActionBar);
        assert!(!bar.text.starts_with("§8[RTP]"));

        let chat = catalog.render("no-permission", &[], player());
        assert_eq!(chat.channel, MessageDelivery::Chat);
        assert!(chat.text.starts_with("§8[RTP] "));
    }

    #[test]
    fn console_always_gets_chat() {
        let settings = RtpSettings {
            message_delivery: MessageDelivery::ActionBar,
            ..Default::default()
        };
        let notice = MessageCatalog::new(&settings).render("success", &[], Requester::Console);
        assert_eq!(notice.channel, MessageDelivery::Chat);
    }
}
