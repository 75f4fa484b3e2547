//! Static command table. Lookup is exact string match only — prefix forms
//! like "充值extra" do not dispatch (the betting parser is the only place
//! prefix matching happens).

/// What a recognized command resolves to. Every descriptor is a
/// compile-time-constructible value; nothing here derives from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchAction {
    StaticText(&'static str),
    ConfirmTemplate(&'static ConfirmSpec),
    ButtonsTemplate(&'static ButtonsSpec),
    QuickReplyMenu(&'static MenuSpec),
    Carousel(&'static [CarouselColumnSpec]),
    ImageCarousel(&'static [ImageColumnSpec]),
    BalanceFlex,
    Unmatched,
}

impl DispatchAction {
    /// Whether composing this action needs a gateway profile lookup first.
    pub fn needs_profile(&self) -> bool {
        matches!(self, DispatchAction::BalanceFlex)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ConfirmSpec {
    pub alt_text: &'static str,
    pub text: &'static str,
    pub yes: ActionSpec,
    pub no: ActionSpec,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ButtonsSpec {
    pub alt_text: &'static str,
    pub thumbnail_url: &'static str,
    pub title: &'static str,
    pub text: &'static str,
    pub actions: &'static [ActionSpec],
}

#[derive(Debug, PartialEq, Eq)]
pub struct MenuSpec {
    pub text: &'static str,
    pub items: &'static [ActionSpec],
}

#[derive(Debug, PartialEq, Eq)]
pub struct CarouselColumnSpec {
    pub thumbnail_url: &'static str,
    pub title: &'static str,
    pub text: &'static str,
    pub actions: &'static [ActionSpec],
}

#[derive(Debug, PartialEq, Eq)]
pub struct ImageColumnSpec {
    pub image_url: &'static str,
    pub action: ActionSpec,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ActionSpec {
    Message {
        label: &'static str,
        text: &'static str,
    },
    Uri {
        label: &'static str,
        uri: &'static str,
    },
    Postback {
        label: &'static str,
        data: &'static str,
        text: Option<&'static str>,
    },
    DatetimePicker {
        label: &'static str,
        data: &'static str,
        mode: &'static str,
        initial: &'static str,
        min: &'static str,
        max: &'static str,
    },
    Camera {
        label: &'static str,
    },
    CameraRoll {
        label: &'static str,
    },
    Location {
        label: &'static str,
    },
}

const DEPOSIT_CONFIRM: ConfirmSpec = ConfirmSpec {
    alt_text: "確認",
    text: "充值?",
    yes: ActionSpec::Message {
        label: "Yes",
        text: "是",
    },
    no: ActionSpec::Message {
        label: "No",
        text: "否",
    },
};

const GAME_MENU: ButtonsSpec = ButtonsSpec {
    alt_text: "Game alter text",
    thumbnail_url: "/static/buttons/logo.png",
    title: "遊戲攻略",
    text: "相關",
    actions: &[
        ActionSpec::Uri {
            label: "進入遊戲",
            uri: "https://www.yabothai.com/",
        },
        ActionSpec::Postback {
            label: "餘額",
            data: "餘額",
            text: Some("餘額"),
        },
        ActionSpec::Message {
            label: "客服",
            text: "客服",
        },
        ActionSpec::Uri {
            label: "常見問題",
            uri: "https://www.w686.net/info/commonProblem",
        },
    ],
};

/// The nine help entries behind 快速查詢, in fixed order.
const HELP_MENU: MenuSpec = MenuSpec {
    text: "請選擇查詢項目",
    items: &[
        ActionSpec::Message {
            label: "投注指令",
            text: "您好, 投注指令格式为玩法＋金额, 例如庄100\n\n\
                   如果投注成功, 系统会回传讯息；如果投注不成功, \
                   请确认投注格式是否有误, 或余额是否不足, 如有任何问题均可联系客服询问",
        },
        ActionSpec::Message {
            label: "打赏指令",
            text: "您好, 打赏指令格式为打赏＋金额, 例如打赏10",
        },
        ActionSpec::Message {
            label: "平台登錄",
            text: "开启 https://www.yabothai.com/",
        },
        ActionSpec::Message {
            label: "最新优惠",
            text: "机器人丢出优惠活动",
        },
        ActionSpec::Message {
            label: "如何注册",
            text: "您好, 请点击「选单-会员注册」, 或联系客服询问",
        },
        ActionSpec::Message {
            label: "如何充值",
            text: "您好, 请点击「选单-会员充值」, 或联系客服询问",
        },
        ActionSpec::Message {
            label: "如何提现",
            text: "您好, 提现请至娱乐城申请(https://yabothai.com),或联系客服询问",
        },
        ActionSpec::Message {
            label: "如何查询余额",
            text: "您好, 请点击「选单-馀额查询」, 或联系客服询问",
        },
        ActionSpec::Message {
            label: "如何查询战绩",
            text: "您好, 请点击「选单-战绩查询」, 或联系客服询问",
        },
    ],
};

const DEMO_QUICK_MENU: MenuSpec = MenuSpec {
    text: "快速查詢指令",
    items: &[
        ActionSpec::Message {
            label: "MessageAction",
            text: "MessageAction",
        },
        ActionSpec::Camera {
            label: "CameraAction",
        },
        ActionSpec::CameraRoll {
            label: "CemeraRollAction",
        },
        ActionSpec::Location { label: "Location" },
        ActionSpec::Postback {
            label: "PostbackAction",
            data: "{PostbackAction: true}",
            text: Some("PostbackAction clicked"),
        },
    ],
};

const PROMO_CAROUSEL: &[CarouselColumnSpec] = &[
    CarouselColumnSpec {
        thumbnail_url: "/static/buttons/1040.jpg",
        title: "hoge",
        text: "fuga",
        actions: &[
            ActionSpec::Uri {
                label: "Go to line.me",
                uri: "https://line.me",
            },
            ActionSpec::Uri {
                label: "Go to line.me",
                uri: "https://line.me",
            },
            ActionSpec::Postback {
                label: "Say hello1",
                data: "hello こんにちは",
                text: None,
            },
        ],
    },
    CarouselColumnSpec {
        thumbnail_url: "/static/buttons/1040.jpg",
        title: "hoge",
        text: "fuga",
        actions: &[
            ActionSpec::Postback {
                label: "言 hello2",
                data: "hello こんにちは",
                text: Some("hello こんにちは"),
            },
            ActionSpec::Postback {
                label: "言 hello2",
                data: "hello こんにちは",
                text: Some("hello こんにちは"),
            },
            ActionSpec::Message {
                label: "Say message",
                text: "Rice=米",
            },
        ],
    },
    CarouselColumnSpec {
        thumbnail_url: "/static/buttons/1040.jpg",
        title: "Datetime Picker",
        text: "Please select a date, time or datetime",
        actions: &[
            ActionSpec::DatetimePicker {
                label: "Datetime",
                data: "action=sel",
                mode: "datetime",
                initial: "2017-06-18T06:15",
                min: "1900-01-01T00:00",
                max: "2100-12-31T23:59",
            },
            ActionSpec::DatetimePicker {
                label: "Date",
                data: "action=sel&only=date",
                mode: "date",
                initial: "2017-06-18",
                min: "1900-01-01",
                max: "2100-12-31",
            },
            ActionSpec::DatetimePicker {
                label: "Time",
                data: "action=sel&only=time",
                mode: "time",
                initial: "06:15",
                min: "00:00",
                max: "23:59",
            },
        ],
    },
];

const PROMO_IMAGE_CAROUSEL: &[ImageColumnSpec] = &[
    ImageColumnSpec {
        image_url: "/static/buttons/1040.jpg",
        action: ActionSpec::Uri {
            label: "Goto line.me",
            uri: "https://line.me",
        },
    },
    ImageColumnSpec {
        image_url: "/static/buttons/1040.jpg",
        action: ActionSpec::Message {
            label: "Say message",
            text: "Rice=米",
        },
    },
    ImageColumnSpec {
        image_url: "/static/buttons/1040.jpg",
        action: ActionSpec::Postback {
            label: "言 hello2",
            data: "hello こんにちは",
            text: Some("hello こんにちは"),
        },
    },
];

/// Command string → action, in table order.
const COMMAND_TABLE: &[(&str, DispatchAction)] = &[
    ("liff", DispatchAction::StaticText("https://liff.line.me/1654461388-Z7R62D0z")),
    ("注册", DispatchAction::StaticText("https://www.yabothai.com/signup")),
    ("注冊", DispatchAction::StaticText("https://www.yabothai.com/signup")),
    ("充值", DispatchAction::ConfirmTemplate(&DEPOSIT_CONFIRM)),
    ("遊戲", DispatchAction::ButtonsTemplate(&GAME_MENU)),
    ("快速查詢", DispatchAction::QuickReplyMenu(&HELP_MENU)),
    ("余额查询", DispatchAction::BalanceFlex),
    ("余额", DispatchAction::BalanceFlex),
    ("quick_reply", DispatchAction::QuickReplyMenu(&DEMO_QUICK_MENU)),
    ("carousel", DispatchAction::Carousel(PROMO_CAROUSEL)),
    ("image_carousel", DispatchAction::ImageCarousel(PROMO_IMAGE_CAROUSEL)),
];

/// Look up `text` in the command table. Unknown strings yield `Unmatched`.
pub fn dispatch(text: &str) -> DispatchAction {
    COMMAND_TABLE
        .iter()
        .find(|(command, _)| *command == text)
        .map(|(_, action)| *action)
        .unwrap_or(DispatchAction::Unmatched)
}
