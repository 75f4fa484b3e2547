use crate::betting::BetInstruction;
use crate::dispatch::{
    ActionSpec, ButtonsSpec, CarouselColumnSpec, ConfirmSpec, DispatchAction, ImageColumnSpec,
    MenuSpec,
};

/// Default visible-length cap for outbound text.
pub const DEFAULT_MAX_TEXT_LEN: usize = 1000;

/// Two-character marker appended to truncated text.
pub const ELLIPSIS: &str = "……";

/// Fixed reply when a recognized bet cannot be confirmed because the profile
/// lookup failed.
pub const BET_FORMAT_ERROR_REPLY: &str = "** 下注格式有誤，請檢視下注格式 **";

/// Fixed reply when the event carries no resolvable user id.
pub const NO_USER_REPLY: &str = "** 無法取得用戶資訊 **";

/// Fixed reply for text that matched neither a bet nor a command.
pub const UNMATCHED_REPLY: &str = "查無此指令, 請輸入「快速查詢」查看可用指令";

/// An outbound message payload. The wire encoding belongs to the gateway;
/// this is the structured form the interpreter hands over.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyPayload {
    Text {
        text: String,
        quick_reply: Option<Vec<QuickReplyItem>>,
    },
    Template {
        alt_text: String,
        body: TemplateBody,
    },
    Flex {
        alt_text: String,
        bubble: FlexBubble,
    },
    Sticker {
        package_id: String,
        sticker_id: String,
    },
    Location {
        title: String,
        address: String,
        latitude: f64,
        longitude: f64,
    },
    Image {
        original_url: String,
        preview_url: String,
    },
    Audio {
        url: String,
        duration_ms: u64,
    },
    Video {
        url: String,
        preview_url: String,
    },
}

impl ReplyPayload {
    /// Plain text reply, truncated to the default cap.
    pub fn text(text: impl Into<String>) -> Self {
        Self::text_capped(text, DEFAULT_MAX_TEXT_LEN)
    }

    pub fn text_capped(text: impl Into<String>, max_len: usize) -> Self {
        ReplyPayload::Text {
            text: truncate_visible(&text.into(), max_len),
            quick_reply: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuickReplyItem {
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateBody {
    Confirm {
        text: String,
        yes: Action,
        no: Action,
    },
    Buttons {
        thumbnail_url: String,
        title: String,
        text: String,
        actions: Vec<Action>,
    },
    Carousel {
        columns: Vec<CarouselColumn>,
    },
    ImageCarousel {
        columns: Vec<ImageCarouselColumn>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarouselColumn {
    pub thumbnail_url: String,
    pub title: String,
    pub text: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageCarouselColumn {
    pub image_url: String,
    pub action: Action,
}

/// User-facing actions attached to templates and quick-reply menus.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Message {
        label: String,
        text: String,
    },
    Uri {
        label: String,
        uri: String,
    },
    Postback {
        label: String,
        data: String,
        text: Option<String>,
    },
    DatetimePicker {
        label: String,
        data: String,
        mode: String,
        initial: String,
        min: String,
        max: String,
    },
    Camera {
        label: String,
    },
    CameraRoll {
        label: String,
    },
    Location {
        label: String,
    },
}

/// Minimal flex-message bubble: a vertical body box of components.
#[derive(Debug, Clone, PartialEq)]
pub struct FlexBubble {
    pub body: FlexBox,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlexBox {
    pub layout: FlexLayout,
    pub contents: Vec<FlexComponent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexLayout {
    Vertical,
    Baseline,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlexComponent {
    Text(FlexText),
    Box(FlexBox),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlexText {
    pub text: String,
    pub bold: bool,
    pub color: Option<String>,
    pub flex: Option<u32>,
}

impl FlexText {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            bold: false,
            color: None,
            flex: None,
        }
    }
}

/// Everything the composer needs besides the action itself. The profile
/// fields are filled by the caller when the selected action is personalized;
/// the composer itself never talks to the gateway.
#[derive(Debug, Clone, Default)]
pub struct ComposeContext<'a> {
    pub base_url: &'a str,
    pub max_text_len: usize,
    pub display_name: Option<&'a str>,
    pub balance: Option<&'a str>,
}

impl<'a> ComposeContext<'a> {
    pub fn new(base_url: &'a str, max_text_len: usize) -> Self {
        Self {
            base_url,
            max_text_len,
            display_name: None,
            balance: None,
        }
    }

    fn resolve_url(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{}", self.base_url.trim_end_matches('/'), url)
        } else {
            url.to_string()
        }
    }
}

/// Cut `text` down to `max_len` visible characters. Longer text is cut to
/// `max_len - 2` characters with the two-character ellipsis appended, so the
/// result never exceeds `max_len`.
pub fn truncate_visible(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_len.saturating_sub(2)).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Confirmation text for an accepted bet: round id, player display name,
/// wager label and integer amount.
pub fn compose_bet_confirmation(
    round: &str,
    display_name: &str,
    instruction: &BetInstruction,
    max_text_len: usize,
) -> ReplyPayload {
    ReplyPayload::text_capped(
        format!(
            "第{}局 {} | {}{} | 投注成功",
            round,
            display_name,
            instruction.kind.label(),
            instruction.amount.trunc()
        ),
        max_text_len,
    )
}

/// Build the outbound payload for a dispatched command. Static actions are
/// composed unchanged from their descriptors; `BalanceFlex` draws the display
/// name and balance from the context; `Unmatched` becomes the fixed
/// "no matching command" text.
pub fn compose_action(action: DispatchAction, ctx: &ComposeContext) -> ReplyPayload {
    match action {
        DispatchAction::StaticText(text) => ReplyPayload::text_capped(text, ctx.max_text_len),
        DispatchAction::ConfirmTemplate(spec) => compose_confirm(spec, ctx),
        DispatchAction::ButtonsTemplate(spec) => compose_buttons(spec, ctx),
        DispatchAction::QuickReplyMenu(spec) => compose_menu(spec, ctx),
        DispatchAction::Carousel(spec) => compose_carousel(spec, ctx),
        DispatchAction::ImageCarousel(spec) => compose_image_carousel(spec, ctx),
        DispatchAction::BalanceFlex => compose_balance_flex(
            ctx.display_name.unwrap_or("玩家"),
            ctx.balance.unwrap_or("0"),
        ),
        DispatchAction::Unmatched => ReplyPayload::text_capped(UNMATCHED_REPLY, ctx.max_text_len),
    }
}

fn compose_confirm(spec: &ConfirmSpec, ctx: &ComposeContext) -> ReplyPayload {
    ReplyPayload::Template {
        alt_text: spec.alt_text.to_string(),
        body: TemplateBody::Confirm {
            text: spec.text.to_string(),
            yes: compose_action_spec(&spec.yes, ctx),
            no: compose_action_spec(&spec.no, ctx),
        },
    }
}

fn compose_buttons(spec: &ButtonsSpec, ctx: &ComposeContext) -> ReplyPayload {
    ReplyPayload::Template {
        alt_text: spec.alt_text.to_string(),
        body: TemplateBody::Buttons {
            thumbnail_url: ctx.resolve_url(spec.thumbnail_url),
            title: spec.title.to_string(),
            text: spec.text.to_string(),
            actions: spec
                .actions
                .iter()
                .map(|a| compose_action_spec(a, ctx))
                .collect(),
        },
    }
}

fn compose_menu(spec: &MenuSpec, ctx: &ComposeContext) -> ReplyPayload {
    ReplyPayload::Text {
        text: truncate_visible(spec.text, ctx.max_text_len),
        quick_reply: Some(
            spec.items
                .iter()
                .map(|a| QuickReplyItem {
                    action: compose_action_spec(a, ctx),
                })
                .collect(),
        ),
    }
}

fn compose_carousel(columns: &[CarouselColumnSpec], ctx: &ComposeContext) -> ReplyPayload {
    ReplyPayload::Template {
        alt_text: "Carousel alt text".to_string(),
        body: TemplateBody::Carousel {
            columns: columns
                .iter()
                .map(|col| CarouselColumn {
                    thumbnail_url: ctx.resolve_url(col.thumbnail_url),
                    title: col.title.to_string(),
                    text: col.text.to_string(),
                    actions: col
                        .actions
                        .iter()
                        .map(|a| compose_action_spec(a, ctx))
                        .collect(),
                })
                .collect(),
        },
    }
}

fn compose_image_carousel(columns: &[ImageColumnSpec], ctx: &ComposeContext) -> ReplyPayload {
    ReplyPayload::Template {
        alt_text: "ImageCarousel alt text".to_string(),
        body: TemplateBody::ImageCarousel {
            columns: columns
                .iter()
                .map(|col| ImageCarouselColumn {
                    image_url: ctx.resolve_url(col.image_url),
                    action: compose_action_spec(&col.action, ctx),
                })
                .collect(),
        },
    }
}

/// Balance bubble: bold title plus baseline label/value rows.
pub fn compose_balance_flex(display_name: &str, balance: &str) -> ReplyPayload {
    let title = FlexText {
        text: "餘額查詢".to_string(),
        bold: true,
        color: None,
        flex: None,
    };
    let rows = FlexBox {
        layout: FlexLayout::Vertical,
        contents: vec![
            FlexComponent::Box(baseline_row("玩家", display_name)),
            FlexComponent::Box(baseline_row("餘額", balance)),
        ],
    };
    ReplyPayload::Flex {
        alt_text: "餘額查詢".to_string(),
        bubble: FlexBubble {
            body: FlexBox {
                layout: FlexLayout::Vertical,
                contents: vec![FlexComponent::Text(title), FlexComponent::Box(rows)],
            },
        },
    }
}

fn baseline_row(label: &str, value: &str) -> FlexBox {
    FlexBox {
        layout: FlexLayout::Baseline,
        contents: vec![
            FlexComponent::Text(FlexText {
                color: Some("#aaaaaa".to_string()),
                flex: Some(1),
                ..FlexText::plain(label)
            }),
            FlexComponent::Text(FlexText {
                color: Some("#666666".to_string()),
                flex: Some(5),
                ..FlexText::plain(value)
            }),
        ],
    }
}

fn compose_action_spec(spec: &ActionSpec, _ctx: &ComposeContext) -> Action {
    match spec {
        ActionSpec::Message { label, text } => Action::Message {
            label: label.to_string(),
            text: text.to_string(),
        },
        ActionSpec::Uri { label, uri } => Action::Uri {
            label: label.to_string(),
            uri: uri.to_string(),
        },
        ActionSpec::Postback { label, data, text } => Action::Postback {
            label: label.to_string(),
            data: data.to_string(),
            text: text.map(str::to_string),
        },
        ActionSpec::DatetimePicker {
            label,
            data,
            mode,
            initial,
            min,
            max,
        } => Action::DatetimePicker {
            label: label.to_string(),
            data: data.to_string(),
            mode: mode.to_string(),
            initial: initial.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        },
        ActionSpec::Camera { label } => Action::Camera {
            label: label.to_string(),
        },
        ActionSpec::CameraRoll { label } => Action::CameraRoll {
            label: label.to_string(),
        },
        ActionSpec::Location { label } => Action::Location {
            label: label.to_string(),
        },
    }
}
