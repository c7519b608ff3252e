//! Random-teleport settings read by the orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where the search square is centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RtpFrom {
    /// The world origin `(0, 0)`.
    #[default]
    Center,
    /// The target's current block position.
    Player,
}

impl From<String> for RtpFrom {
    /// Anything other than `player` (case-insensitive) selects the origin.
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("player") {
            Self::Player
        } else {
            Self::Center
        }
    }
}

impl From<RtpFrom> for String {
    fn from(value: RtpFrom) -> Self {
        match value {
            RtpFrom::Center => "center".to_string(),
            RtpFrom::Player => "player".to_string(),
        }
    }
}

/// Channel used to deliver outcome notices to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageDelivery {
    #[default]
    Chat,
    ActionBar,
}

impl MessageDelivery {
    /// Message keys eligible for the action bar; everything else stays in chat.
    pub const ACTION_BAR_KEYS: [&'static str; 4] = ["success", "failed", "used-once", "cooldown"];

    /// Resolves the channel for a given message key under this mode.
    pub fn channel_for(self, key: &str) -> Self {
        match self {
            Self::ActionBar if Self::ACTION_BAR_KEYS.contains(&key) => Self::ActionBar,
            _ => Self::Chat,
        }
    }
}

impl From<String> for MessageDelivery {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("action_bar") || value.eq_ignore_ascii_case("action-bar") {
            Self::ActionBar
        } else {
            Self::Chat
        }
    }
}

impl From<MessageDelivery> for String {
    fn from(value: MessageDelivery) -> Self {
        match value {
            MessageDelivery::Chat => "chat".to_string(),
            MessageDelivery::ActionBar => "action_bar".to_string(),
        }
    }
}

/// The `[rtp]` configuration table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RtpSettings {
    /// Restrict the command to the worlds listed in `worlds`.
    #[serde(default)]
    pub world_filter_enabled: bool,
    /// Allow-list of world names used when filtering is enabled.
    #[serde(default)]
    pub worlds: Vec<String>,
    /// Charge self-teleports `cost_amount`.
    #[serde(default)]
    pub cost_enabled: bool,
    #[serde(default)]
    pub cost_amount: f64,
    /// Minimum seconds between self-teleports; 0 disables.
    #[serde(default)]
    pub cooldown: u64,
    /// Half-width of the search square.
    #[serde(default = "default_radius")]
    pub radius: i32,
    #[serde(default)]
    pub rtp_from: RtpFrom,
    #[serde(default)]
    pub message_delivery: MessageDelivery,
    /// Play `sound` on a successful teleport.
    #[serde(default)]
    pub makesound: bool,
    #[serde(default = "default_sound")]
    pub sound: String,
    /// Prepended to chat messages.
    #[serde(default)]
    pub prefix: String,
    /// Message templates keyed by message key.
    #[serde(default = "default_messages")]
    pub messages: BTreeMap<String, String>,
}

impl RtpSettings {
    /// The cost charged for a self-teleport, if one applies.
    pub fn effective_cost(&self) -> Option<f64> {
        (self.cost_enabled && self.cost_amount > 0.0).then_some(self.cost_amount)
    }
}

fn default_radius() -> i32 {
    1000
}

fn default_sound() -> String {
    "entity.enderman.teleport".to_string()
}

fn default_messages() -> BTreeMap<String, String> {
    [
        ("player-only", "&cOnly players can use this command."),
        ("no-permission", "&cYou do not have permission to use this command."),
        ("no-permission-others", "&cYou do not have permission to teleport other players."),
        ("player-not-found", "&cThat player is not online."),
        ("world-not-allowed", "&cRandom teleport is only available in: &e%worlds%"),
        ("world-not-found", "&cCould not determine your world."),
        ("cost-no-vault", "&cNo economy is available to pay for the teleport."),
        ("cost-insufficient", "&cYou need &e%cost% &cto teleport."),
        ("used-once", "&cYou have already used your random teleport."),
        ("cooldown", "&cPlease wait &e%seconds%s &cbefore teleporting again."),
        ("teleporting", "&7Searching for a safe location..."),
        ("failed", "&cCould not find a safe location. Try again."),
        ("success", "&aTeleported!"),
        ("reload-success", "&aConfiguration reloaded."),
        ("reload-no-permission", "&cYou do not have permission to reload."),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for RtpSettings {
    fn default() -> Self {
        Self {
            world_filter_enabled: false,
            worlds: Vec::new(),
            cost_enabled: false,
            cost_amount: 0.0,
            cooldown: 0,
            radius: default_radius(),
            rtp_from: RtpFrom::Center,
            message_delivery: MessageDelivery::Chat,
            makesound: false,
            sound: default_sound(),
            prefix: String::new(),
            messages: default_messages(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_values() {
        let settings = RtpSettings::default();
        assert!(!settings.world_filter_enabled);
        assert!(settings.worlds.is_empty());
        assert_eq!(settings.radius, 1000);
        assert_eq!(settings.cooldown, 0);
        assert_eq!(settings.rtp_from, RtpFrom::Center);
        assert_eq!(settings.message_delivery, MessageDelivery::Chat);
        assert_eq!(settings.sound, "entity.enderman.teleport");
        assert_eq!(settings.effective_cost(), None);
        assert!(settings.messages.contains_key("success"));
    }

    #[test]
    fn parses_kebab_case_toml() {
        let settings: RtpSettings = toml::from_str(
            r#"
            world-filter-enabled = true
            worlds = ["world", "world_nether"]
            cost-enabled = true
            cost-amount = 250.0
            cooldown = 30
            radius = 500
            rtp-from = "PLAYER"
            message-delivery = "action-bar"
            "#,
        )
        .expect("should parse");

        assert!(settings.world_filter_enabled);
        assert_eq!(settings.worlds, vec!["world", "world_nether"]);
        assert_eq!(settings.effective_cost(), Some(250.0));
        assert_eq!(settings.cooldown, 30);
        assert_eq!(settings.radius, 500);
        assert_eq!(settings.rtp_from, RtpFrom::Player);
        assert_eq!(settings.message_delivery, MessageDelivery::ActionBar);
        // Omitted tables fall back to the built-in catalog.
        assert!(settings.messages.contains_key("teleporting"));
    }

    #[test]
    fn unknown_rtp_from_falls_back_to_center() {
        assert_eq!(RtpFrom::from("spawn".to_string()), RtpFrom::Center);
    }

    #[test]
    fn zero_cost_is_not_charged() {
        let settings = RtpSettings {
            cost_enabled: true,
            cost_amount: 0.0,
            ..Default::default()
        };
        assert_eq!(settings.effective_cost(), None);
    }

    #[test]
    fn action_bar_only_for_eligible_keys() {
        let mode = MessageDelivery::ActionBar;
        assert_eq!(mode.channel_for("success"), MessageDelivery::ActionBar);
        assert_eq!(mode.channel_for("cooldown"), MessageDelivery::ActionBar);
        assert_eq!(mode.channel_for("no-permission"), MessageDelivery::Chat);
        assert_eq!(
            MessageDelivery::Chat.channel_for("success"),
            MessageDelivery::Chat
        );
    }
}
