use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::betting::BetKind;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub betting: BettingConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub game: GameConfig,
}

/// The wager table. Entries are matched against message prefixes in listed
/// order, so keep more specific labels (庄对) ahead of labels they start
/// with (庄). Operators own this list; it is product data, not code.
#[derive(Debug, Deserialize, Clone)]
pub struct BettingConfig {
    #[serde(default = "default_bet_entries")]
    pub entries: Vec<BetEntryConfig>,
}

impl Default for BettingConfig {
    fn default() -> Self {
        Self {
            entries: default_bet_entries(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BetEntryConfig {
    pub label: String,
    pub kind: BetKind,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplyConfig {
    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            max_text_len: default_max_text_len(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    /// Round identifier stamped into bet confirmations. In production this
    /// comes from the game backend per shoe; here it is static.
    #[serde(default = "default_round")]
    pub round: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round: default_round(),
        }
    }
}

fn default_bet_entries() -> Vec<BetEntryConfig> {
    [
        ("庄对", BetKind::BankerPair),
        ("闲对", BetKind::PlayerPair),
        ("闲龙宝", BetKind::PlayerDragon),
        ("任意对子", BetKind::AnyPair),
        ("完美对子", BetKind::PerfectPair),
        ("超級六", BetKind::SuperSix),
        ("超級6", BetKind::SuperSix),
        ("庄", BetKind::Banker),
        ("闲", BetKind::Player),
        ("和", BetKind::Tie),
        ("大", BetKind::Big),
        ("小", BetKind::Small),
    ]
    .into_iter()
    .map(|(label, kind)| BetEntryConfig {
        label: label.to_string(),
        kind,
    })
    .collect()
}

fn default_max_text_len() -> usize {
    1000
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloaded")
}

fn default_base_url() -> String {
    "https://bot.example.com".to_string()
}

fn default_round() -> String {
    "1234".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if !config.media.download_dir.exists() {
            std::fs::create_dir_all(&config.media.download_dir).with_context(|| {
                format!(
                    "Failed to create download directory: {}",
                    config.media.download_dir.display()
                )
            })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.reply.max_text_len, 1000);
        assert_eq!(config.game.round, "1234");
        assert_eq!(config.betting.entries.len(), 12);
        assert_eq!(config.betting.entries[0].label, "庄对");
    }

    #[test]
    fn test_bet_entries_can_be_overridden() {
        let config: Config = toml::from_str(
            r#"
            [[betting.entries]]
            label = "庄"
            kind = "banker"

            [[betting.entries]]
            label = "闲"
            kind = "player"
            "#,
        )
        .unwrap();
        assert_eq!(config.betting.entries.len(), 2);
        assert_eq!(config.betting.entries[0].kind, BetKind::Banker);
        assert_eq!(config.betting.entries[1].kind, BetKind::Player);
    }

    #[test]
    fn test_reply_and_game_sections() {
        let config: Config = toml::from_str(
            r#"
            [reply]
            max_text_len = 500

            [game]
            round = "777"

            [media]
            base_url = "https://cdn.example.net"
            "#,
        )
        .unwrap();
        assert_eq!(config.reply.max_text_len, 500);
        assert_eq!(config.game.round, "777");
        assert_eq!(config.media.base_url, "https://cdn.example.net");
    }
}
