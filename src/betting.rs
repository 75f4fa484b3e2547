use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::BetEntryConfig;

/// Wager types accepted at the table. Pure tags — per-bet amounts live in
/// [`BetInstruction`], never on the kind itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetKind {
    Banker,
    Player,
    Tie,
    BankerPair,
    PlayerPair,
    PlayerDragon,
    Big,
    Small,
    AnyPair,
    PerfectPair,
    SuperSix,
}

impl BetKind {
    /// Canonical display label, as shown in bet confirmations.
    pub fn label(&self) -> &'static str {
        match self {
            BetKind::Banker => "庄",
            BetKind::Player => "闲",
            BetKind::Tie => "和",
            BetKind::BankerPair => "庄对",
            BetKind::PlayerPair => "闲对",
            BetKind::PlayerDragon => "闲龙宝",
            BetKind::Big => "大",
            BetKind::Small => "小",
            BetKind::AnyPair => "任意对子",
            BetKind::PerfectPair => "完美对子",
            BetKind::SuperSix => "超級六",
        }
    }
}

/// A recognized betting instruction, one value per parsed message.
#[derive(Debug, Clone, PartialEq)]
pub struct BetInstruction {
    pub kind: BetKind,
    pub amount: Decimal,
    pub raw_text: String,
}

/// Ordered bet-label table. Entries are tried in declaration order and the
/// first match wins, so more specific labels (庄对) must be listed before
/// labels they start with (庄). Duplicate labels are legal; only the first
/// declared entry for a label is ever produced.
#[derive(Debug, Clone)]
pub struct BetTable {
    entries: Vec<(String, BetKind)>,
}

impl Default for BetTable {
    fn default() -> Self {
        Self {
            entries: vec![
                ("庄对".to_string(), BetKind::BankerPair),
                ("闲对".to_string(), BetKind::PlayerPair),
                ("闲龙宝".to_string(), BetKind::PlayerDragon),
                ("任意对子".to_string(), BetKind::AnyPair),
                ("完美对子".to_string(), BetKind::PerfectPair),
                ("超級六".to_string(), BetKind::SuperSix),
                ("超級6".to_string(), BetKind::SuperSix),
                ("庄".to_string(), BetKind::Banker),
                ("闲".to_string(), BetKind::Player),
                ("和".to_string(), BetKind::Tie),
                ("大".to_string(), BetKind::Big),
                ("小".to_string(), BetKind::Small),
            ],
        }
    }
}

impl BetTable {
    pub fn new(entries: Vec<(String, BetKind)>) -> Self {
        Self { entries }
    }

    pub fn from_config(entries: &[BetEntryConfig]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|e| (e.label.clone(), e.kind))
                .collect(),
        }
    }

    /// Parse a betting instruction out of free-form user text.
    ///
    /// A message is a bet when some declared label is a prefix of the text and
    /// the remainder after that label contains a run of ASCII digits. The
    /// amount is taken from the first such run only: a fractional tail like
    /// the ".3" in "庄abc100.3元" is dropped, not rounded. This matches the
    /// reference behavior and is a documented precision caveat.
    pub fn parse(&self, text: &str) -> Option<BetInstruction> {
        self.lookup(text).map(|(kind, amount)| BetInstruction {
            kind,
            amount,
            raw_text: text.to_string(),
        })
    }

    /// Yes/no classification without building the instruction. Agrees with
    /// `parse(text).is_some()` for every input.
    pub fn is_bet_instruction(&self, text: &str) -> bool {
        self.lookup(text).is_some()
    }

    fn lookup(&self, text: &str) -> Option<(BetKind, Decimal)> {
        for (label, kind) in &self.entries {
            if let Some(rest) = text.strip_prefix(label.as_str()) {
                if let Some(digits) = digit_run(rest) {
                    if let Ok(amount) = Decimal::from_str(digits) {
                        return Some((*kind, amount));
                    }
                }
            }
        }
        None
    }
}

/// First maximal run of ASCII digits in `text`, if any.
fn digit_run(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}
