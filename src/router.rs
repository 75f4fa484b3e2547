use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::betting::{BetInstruction, BetTable};
use crate::config::Config;
use crate::dispatch::dispatch;
use crate::event::{ContentProvider, EventKind, EventSource, InboundEvent};
use crate::gateway::{GatewayError, MessagingGateway};
use crate::media::{MediaError, MediaStore};
use crate::reply::{
    compose_action, compose_bet_confirmation, ComposeContext, ReplyPayload, BET_FORMAT_ERROR_REPLY,
    NO_USER_REPLY,
};

/// Failures that abort handling of a single event. Parse misses and unknown
/// commands never land here; they degrade to fixed textual replies.
#[derive(Debug, Error)]
pub enum HandleError {
    #[error("failed to send reply: {0}")]
    GatewaySend(#[from] GatewayError),
    #[error("failed to fetch media content: {0}")]
    MediaFetch(GatewayError),
    #[error("failed to store media: {0}")]
    MediaStore(#[from] MediaError),
}

/// Routes classified events to replies. Stateless across events: every
/// `handle` call runs to completion on its own, so events may be processed
/// concurrently without coordination.
pub struct Router {
    gateway: Arc<dyn MessagingGateway>,
    media: Arc<dyn MediaStore>,
    bets: BetTable,
    round: String,
    base_url: String,
    max_text_len: usize,
}

impl Router {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        media: Arc<dyn MediaStore>,
        config: &Config,
    ) -> Self {
        Self {
            gateway,
            media,
            bets: BetTable::from_config(&config.betting.entries),
            round: config.game.round.clone(),
            base_url: config.media.base_url.clone(),
            max_text_len: config.reply.max_text_len,
        }
    }

    pub async fn handle(&self, event: InboundEvent) -> Result<(), HandleError> {
        let token = event.reply_token.as_str();
        match event.kind {
            EventKind::Text { text } => self.handle_text(token, &event.source, &text).await,
            EventKind::Sticker {
                package_id,
                sticker_id,
            } => {
                self.reply(
                    token,
                    ReplyPayload::Sticker {
                        package_id,
                        sticker_id,
                    },
                )
                .await
            }
            EventKind::Location {
                title,
                address,
                latitude,
                longitude,
            } => {
                self.reply(
                    token,
                    ReplyPayload::Location {
                        title: title.unwrap_or_default(),
                        address: address.unwrap_or_default(),
                        latitude,
                        longitude,
                    },
                )
                .await
            }
            EventKind::Image {
                message_id,
                provider,
            } => {
                let (original_url, preview_url) = match provider {
                    ContentProvider::External {
                        original_url,
                        preview_url,
                    } => {
                        let preview = preview_url.unwrap_or_else(|| original_url.clone());
                        (original_url, preview)
                    }
                    ContentProvider::Platform => {
                        let uri = self.fetch_and_store(token, &message_id, "jpg").await?;
                        (uri.clone(), uri)
                    }
                };
                self.reply(
                    token,
                    ReplyPayload::Image {
                        original_url,
                        preview_url,
                    },
                )
                .await
            }
            EventKind::Audio {
                message_id,
                provider,
            } => {
                let url = match provider {
                    ContentProvider::External { original_url, .. } => original_url,
                    ContentProvider::Platform => {
                        self.fetch_and_store(token, &message_id, "mp4").await?
                    }
                };
                self.reply(
                    token,
                    ReplyPayload::Audio {
                        url,
                        duration_ms: 100,
                    },
                )
                .await
            }
            EventKind::Video {
                message_id,
                provider,
            } => {
                let (url, preview_url) = match provider {
                    ContentProvider::External {
                        original_url,
                        preview_url,
                    } => {
                        let preview = preview_url.unwrap_or_else(|| original_url.clone());
                        (original_url, preview)
                    }
                    ContentProvider::Platform => {
                        let uri = self.fetch_and_store(token, &message_id, "mp4").await?;
                        (uri.clone(), uri)
                    }
                };
                self.reply(token, ReplyPayload::Video { url, preview_url })
                    .await
            }
            EventKind::File {
                file_name,
                file_size,
            } => {
                self.reply_text(token, format!("Received '{file_name}'({file_size} bytes)"))
                    .await
            }
            EventKind::Follow => self.reply_text(token, "Got followed event").await,
            EventKind::Unfollow => {
                info!("unfollowed by {:?}", event.source);
                Ok(())
            }
            EventKind::Join => {
                let sender = event.source.sender_id.as_deref().unwrap_or("unknown");
                self.reply_text(token, format!("Joined {sender}")).await
            }
            EventKind::Postback { data, params } => {
                let params = params.map(|p| p.to_string()).unwrap_or_default();
                self.reply_text(token, format!("Got postback data {data}, param {params}"))
                    .await
            }
            EventKind::Beacon { hwid } => {
                self.reply_text(token, format!("Got beacon message {hwid}"))
                    .await
            }
            EventKind::MemberJoined { user_ids } => {
                self.reply_text(
                    token,
                    format!("Got memberJoined message {}", user_ids.join(",")),
                )
                .await
            }
            EventKind::MemberLeft { user_ids } => {
                info!("Got memberLeft message: {}", user_ids.join(","));
                Ok(())
            }
            EventKind::Other => {
                info!("Received event(Ignored): {:?}", event.source);
                Ok(())
            }
        }
    }

    /// Text messages try the betting parser first; everything else goes
    /// through the command table.
    async fn handle_text(
        &self,
        token: &str,
        source: &EventSource,
        text: &str,
    ) -> Result<(), HandleError> {
        info!(
            "Got text message from userId:{:?} replyToken:{}: text:{}",
            source.user_id, token, text
        );

        if let Some(instruction) = self.bets.parse(text) {
            return self.handle_bet(token, source, instruction).await;
        }

        let action = dispatch(text);
        if action.needs_profile() {
            let Some(user_id) = source.user_id.as_deref() else {
                return self.reply_text(token, NO_USER_REPLY).await;
            };
            match self.gateway.get_profile(user_id).await {
                Ok(profile) => {
                    // TODO: pull the real balance from the account service.
                    let balance = "123.456";
                    let ctx = ComposeContext {
                        base_url: &self.base_url,
                        max_text_len: self.max_text_len,
                        display_name: Some(&profile.display_name),
                        balance: Some(balance),
                    };
                    self.reply(token, compose_action(action, &ctx)).await
                }
                Err(e) => {
                    warn!("profile lookup failed for {user_id}: {e}");
                    self.reply_text(token, NO_USER_REPLY).await
                }
            }
        } else {
            let ctx = ComposeContext::new(&self.base_url, self.max_text_len);
            self.reply(token, compose_action(action, &ctx)).await
        }
    }

    /// Profile lookup strictly precedes composition: the confirmation embeds
    /// the player's display name, and a failed lookup degrades to the fixed
    /// format-error reply instead of a half-composed confirmation.
    async fn handle_bet(
        &self,
        token: &str,
        source: &EventSource,
        instruction: BetInstruction,
    ) -> Result<(), HandleError> {
        let Some(user_id) = source.user_id.as_deref() else {
            return self.reply_text(token, NO_USER_REPLY).await;
        };

        match self.gateway.get_profile(user_id).await {
            Ok(profile) => {
                // TODO: forward the accepted instruction to the wagering backend.
                let payload = compose_bet_confirmation(
                    &self.round,
                    &profile.display_name,
                    &instruction,
                    self.max_text_len,
                );
                self.reply(token, payload).await
            }
            Err(e) => {
                warn!("profile lookup failed for {user_id}: {e}");
                self.reply_text(token, BET_FORMAT_ERROR_REPLY).await
            }
        }
    }

    /// Download platform-hosted media and persist it, replying with an
    /// apology before surfacing a fetch failure.
    async fn fetch_and_store(
        &self,
        token: &str,
        message_id: &str,
        extension: &str,
    ) -> Result<String, HandleError> {
        let blob = match self.gateway.get_media_blob(message_id).await {
            Ok(blob) => blob,
            Err(e) => {
                self.reply_text(token, format!("Cannot get content: {e}"))
                    .await?;
                return Err(HandleError::MediaFetch(e));
            }
        };
        let saved = self.media.save(extension, blob).await?;
        Ok(saved.uri)
    }

    async fn reply(&self, token: &str, payload: ReplyPayload) -> Result<(), HandleError> {
        self.gateway.reply(token, payload).await?;
        Ok(())
    }

    async fn reply_text(&self, token: &str, text: impl Into<String>) -> Result<(), HandleError> {
        self.reply(token, ReplyPayload::text_capped(text, self.max_text_len))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::UserProfile;
    use crate::media::SavedMedia;
    use crate::reply::UNMATCHED_REPLY;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeGateway {
        replies: Mutex<Vec<(String, ReplyPayload)>>,
        fail_profile: bool,
        fail_send: bool,
        fail_blob: bool,
    }

    impl FakeGateway {
        fn sent(&self) -> Vec<(String, ReplyPayload)> {
            self.replies.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessagingGateway for FakeGateway {
        async fn reply(
            &self,
            reply_token: &str,
            payload: ReplyPayload,
        ) -> Result<(), GatewayError> {
            if self.fail_send {
                return Err(GatewayError::Transport("connection reset".to_string()));
            }
            self.replies
                .lock()
                .unwrap()
                .push((reply_token.to_string(), payload));
            Ok(())
        }

        async fn push(&self, _to: &str, _payload: ReplyPayload) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn multicast(
            &self,
            _to: &[String],
            _payload: ReplyPayload,
        ) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn broadcast(&self, _payload: ReplyPayload) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn get_profile(&self, user_id: &str) -> Result<UserProfile, GatewayError> {
            if self.fail_profile {
                return Err(GatewayError::Api {
                    status: 500,
                    message: "profile backend down".to_string(),
                });
            }
            assert_eq!(user_id, "U1");
            Ok(UserProfile {
                display_name: "test1234".to_string(),
            })
        }

        async fn get_media_blob(&self, _message_id: &str) -> Result<Bytes, GatewayError> {
            if self.fail_blob {
                return Err(GatewayError::Transport("timeout".to_string()));
            }
            Ok(Bytes::from_static(b"blob"))
        }
    }

    struct FakeMediaStore;

    #[async_trait]
    impl MediaStore for FakeMediaStore {
        async fn save(&self, extension: &str, _content: Bytes) -> Result<SavedMedia, MediaError> {
            Ok(SavedMedia {
                uri: format!("https://bot.example.com/downloaded/fixed.{extension}"),
            })
        }
    }

    fn router_with(gateway: Arc<FakeGateway>) -> Router {
        let mut config = Config::default();
        config.game.round = "123".to_string();
        Router::new(gateway, Arc::new(FakeMediaStore), &config)
    }

    fn text_event(text: &str) -> InboundEvent {
        InboundEvent {
            reply_token: "rt".to_string(),
            source: EventSource {
                user_id: Some("U1".to_string()),
                sender_id: Some("U1".to_string()),
            },
            kind: EventKind::Text {
                text: text.to_string(),
            },
        }
    }

    fn sent_text(gateway: &FakeGateway) -> String {
        let sent = gateway.sent();
        assert_eq!(sent.len(), 1);
        match &sent[0].1 {
            ReplyPayload::Text { text, .. } => text.clone(),
            other => panic!("expected text reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bet_gets_confirmation_with_profile_name() {
        let gateway = Arc::new(FakeGateway::default());
        let router = router_with(gateway.clone());

        router.handle(text_event("庄100元")).await.unwrap();

        assert_eq!(sent_text(&gateway), "第123局 test1234 | 庄100 | 投注成功");
    }

    #[tokio::test]
    async fn test_profile_failure_degrades_to_format_error() {
        let gateway = Arc::new(FakeGateway {
            fail_profile: true,
            ..Default::default()
        });
        let router = router_with(gateway.clone());

        router.handle(text_event("庄100元")).await.unwrap();

        assert_eq!(sent_text(&gateway), BET_FORMAT_ERROR_REPLY);
    }

    #[tokio::test]
    async fn test_bet_without_user_id_gets_apology() {
        let gateway = Arc::new(FakeGateway::default());
        let router = router_with(gateway.clone());

        let mut event = text_event("庄100元");
        event.source = EventSource {
            user_id: None,
            sender_id: Some("G1".to_string()),
        };
        router.handle(event).await.unwrap();

        assert_eq!(sent_text(&gateway), NO_USER_REPLY);
    }

    #[tokio::test]
    async fn test_unknown_text_gets_unmatched_reply() {
        let gateway = Arc::new(FakeGateway::default());
        let router = router_with(gateway.clone());

        router.handle(text_event("hello there")).await.unwrap();

        assert_eq!(sent_text(&gateway), UNMATCHED_REPLY);
    }

    #[tokio::test]
    async fn test_command_with_trailing_junk_is_unmatched() {
        let gateway = Arc::new(FakeGateway::default());
        let router = router_with(gateway.clone());

        router.handle(text_event("充值extra")).await.unwrap();

        assert_eq!(sent_text(&gateway), UNMATCHED_REPLY);
    }

    #[tokio::test]
    async fn test_help_command_replies_with_quick_reply_menu() {
        let gateway = Arc::new(FakeGateway::default());
        let router = router_with(gateway.clone());

        router.handle(text_event("快速查詢")).await.unwrap();

        let sent = gateway.sent();
        match &sent[0].1 {
            ReplyPayload::Text {
                quick_reply: Some(items),
                ..
            } => assert_eq!(items.len(), 9),
            other => panic!("expected quick-reply menu, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_balance_command_fetches_profile_and_replies_flex() {
        let gateway = Arc::new(FakeGateway::default());
        let router = router_with(gateway.clone());

        router.handle(text_event("余额")).await.unwrap();

        let sent = gateway.sent();
        match &sent[0].1 {
            ReplyPayload::Flex { bubble, .. } => {
                assert!(format!("{bubble:?}").contains("test1234"));
            }
            other => panic!("expected flex reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_balance_profile_failure_gets_apology() {
        let gateway = Arc::new(FakeGateway {
            fail_profile: true,
            ..Default::default()
        });
        let router = router_with(gateway.clone());

        router.handle(text_event("余额查询")).await.unwrap();

        assert_eq!(sent_text(&gateway), NO_USER_REPLY);
    }

    #[tokio::test]
    async fn test_sticker_is_echoed() {
        let gateway = Arc::new(FakeGateway::default());
        let router = router_with(gateway.clone());

        let event = InboundEvent {
            reply_token: "rt".to_string(),
            source: EventSource::default(),
            kind: EventKind::Sticker {
                package_id: "1".to_string(),
                sticker_id: "2".to_string(),
            },
        };
        router.handle(event).await.unwrap();

        assert_eq!(
            gateway.sent()[0].1,
            ReplyPayload::Sticker {
                package_id: "1".to_string(),
                sticker_id: "2".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_platform_image_is_stored_then_echoed() {
        let gateway = Arc::new(FakeGateway::default());
        let router = router_with(gateway.clone());

        let event = InboundEvent {
            reply_token: "rt".to_string(),
            source: EventSource::default(),
            kind: EventKind::Image {
                message_id: "m1".to_string(),
                provider: ContentProvider::Platform,
            },
        };
        router.handle(event).await.unwrap();

        assert_eq!(
            gateway.sent()[0].1,
            ReplyPayload::Image {
                original_url: "https://bot.example.com/downloaded/fixed.jpg".to_string(),
                preview_url: "https://bot.example.com/downloaded/fixed.jpg".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_external_image_skips_the_store() {
        let gateway = Arc::new(FakeGateway {
            fail_blob: true,
            ..Default::default()
        });
        let router = router_with(gateway.clone());

        let event = InboundEvent {
            reply_token: "rt".to_string(),
            source: EventSource::default(),
            kind: EventKind::Image {
                message_id: "m1".to_string(),
                provider: ContentProvider::External {
                    original_url: "https://cdn.example.com/a.jpg".to_string(),
                    preview_url: None,
                },
            },
        };
        router.handle(event).await.unwrap();

        assert_eq!(
            gateway.sent()[0].1,
            ReplyPayload::Image {
                original_url: "https://cdn.example.com/a.jpg".to_string(),
                preview_url: "https://cdn.example.com/a.jpg".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_media_fetch_failure_apologizes_then_fails() {
        let gateway = Arc::new(FakeGateway {
            fail_blob: true,
            ..Default::default()
        });
        let router = router_with(gateway.clone());

        let event = InboundEvent {
            reply_token: "rt".to_string(),
            source: EventSource::default(),
            kind: EventKind::Video {
                message_id: "m1".to_string(),
                provider: ContentProvider::Platform,
            },
        };
        let err = router.handle(event).await.unwrap_err();

        assert!(matches!(err, HandleError::MediaFetch(_)));
        assert!(sent_text(&gateway).starts_with("Cannot get content:"));
    }

    #[tokio::test]
    async fn test_gateway_send_failure_propagates() {
        let gateway = Arc::new(FakeGateway {
            fail_send: true,
            ..Default::default()
        });
        let router = router_with(gateway.clone());

        let err = router.handle(text_event("快速查詢")).await.unwrap_err();
        assert!(matches!(err, HandleError::GatewaySend(_)));
    }

    #[tokio::test]
    async fn test_file_message_reports_name_and_size() {
        let gateway = Arc::new(FakeGateway::default());
        let router = router_with(gateway.clone());

        let event = InboundEvent {
            reply_token: "rt".to_string(),
            source: EventSource::default(),
            kind: EventKind::File {
                file_name: "odds.xlsx".to_string(),
                file_size: 4096,
            },
        };
        router.handle(event).await.unwrap();

        assert_eq!(sent_text(&gateway), "Received 'odds.xlsx'(4096 bytes)");
    }

    #[tokio::test]
    async fn test_silent_kinds_send_nothing() {
        let gateway = Arc::new(FakeGateway::default());
        let router = router_with(gateway.clone());

        for kind in [
            EventKind::Unfollow,
            EventKind::MemberLeft {
                user_ids: vec!["U9".to_string()],
            },
            EventKind::Other,
        ] {
            let event = InboundEvent {
                reply_token: String::new(),
                source: EventSource::default(),
                kind,
            };
            router.handle(event).await.unwrap();
        }

        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_long_reply_is_truncated() {
        let gateway = Arc::new(FakeGateway::default());
        let mut config = Config::default();
        config.reply.max_text_len = 10;
        let router = Router::new(gateway.clone(), Arc::new(FakeMediaStore), &config);

        let event = InboundEvent {
            reply_token: "rt".to_string(),
            source: EventSource::default(),
            kind: EventKind::File {
                file_name: "a-very-long-file-name-indeed.bin".to_string(),
                file_size: 1,
            },
        };
        router.handle(event).await.unwrap();

        let text = sent_text(&gateway);
        assert_eq!(text.chars().count(), 10);
        assert!(text.ends_with("……"));
    }
}
