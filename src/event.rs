use serde::Deserialize;

/// A webhook event as delivered by the messaging platform. Unknown event and
/// message types deserialize to the catch-all variants instead of failing, so
/// platform additions degrade to logged no-ops.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RawEvent {
    #[serde(rename_all = "camelCase")]
    Message {
        #[serde(default)]
        reply_token: String,
        source: RawSource,
        message: RawMessage,
    },
    #[serde(rename_all = "camelCase")]
    Follow {
        #[serde(default)]
        reply_token: String,
        source: RawSource,
    },
    Unfollow { source: RawSource },
    #[serde(rename_all = "camelCase")]
    Join {
        #[serde(default)]
        reply_token: String,
        source: RawSource,
    },
    #[serde(rename_all = "camelCase")]
    Postback {
        #[serde(default)]
        reply_token: String,
        source: RawSource,
        postback: RawPostback,
    },
    #[serde(rename_all = "camelCase")]
    Beacon {
        #[serde(default)]
        reply_token: String,
        source: RawSource,
        beacon: RawBeacon,
    },
    #[serde(rename_all = "camelCase")]
    MemberJoined {
        #[serde(default)]
        reply_token: String,
        source: RawSource,
        joined: RawMembers,
    },
    #[serde(rename_all = "camelCase")]
    MemberLeft {
        source: RawSource,
        left: RawMembers,
    },
    #[serde(other)]
    Other,
}

/// The chat context an event originated from: a single user, a group, or a
/// multi-person room.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawSource {
    #[serde(rename_all = "camelCase")]
    User { user_id: String },
    #[serde(rename_all = "camelCase")]
    Group {
        group_id: String,
        #[serde(default)]
        user_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Room {
        room_id: String,
        #[serde(default)]
        user_id: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RawMessage {
    Text { text: String },
    #[serde(rename_all = "camelCase")]
    Sticker {
        package_id: String,
        sticker_id: String,
    },
    Location {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        address: Option<String>,
        latitude: f64,
        longitude: f64,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        id: String,
        #[serde(default)]
        content_provider: Option<RawContentProvider>,
    },
    #[serde(rename_all = "camelCase")]
    Audio {
        id: String,
        #[serde(default)]
        content_provider: Option<RawContentProvider>,
    },
    #[serde(rename_all = "camelCase")]
    Video {
        id: String,
        #[serde(default)]
        content_provider: Option<RawContentProvider>,
    },
    #[serde(rename_all = "camelCase")]
    File {
        file_name: String,
        file_size: u64,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContentProvider {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub original_content_url: Option<String>,
    #[serde(default)]
    pub preview_image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPostback {
    pub data: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBeacon {
    pub hwid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMembers {
    pub members: Vec<RawSource>,
}

/// Where media bytes live: hosted by the platform (fetch through the
/// gateway) or already on an external URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentProvider {
    Platform,
    External {
        original_url: String,
        preview_url: Option<String>,
    },
}

/// Identity a message came from. `sender_id` is the pushable chat context
/// (user, group, or room id); `user_id` is the individual user when known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSource {
    pub user_id: Option<String>,
    pub sender_id: Option<String>,
}

impl From<&RawSource> for EventSource {
    fn from(raw: &RawSource) -> Self {
        match raw {
            RawSource::User { user_id } => EventSource {
                user_id: Some(user_id.clone()),
                sender_id: Some(user_id.clone()),
            },
            RawSource::Group { group_id, user_id } => EventSource {
                user_id: user_id.clone(),
                sender_id: Some(group_id.clone()),
            },
            RawSource::Room { room_id, user_id } => EventSource {
                user_id: user_id.clone(),
                sender_id: Some(room_id.clone()),
            },
        }
    }
}

/// A classified inbound event: reply token (empty for non-repliable kinds),
/// source identity, and the per-kind payload.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub reply_token: String,
    pub source: EventSource,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Text {
        text: String,
    },
    Sticker {
        package_id: String,
        sticker_id: String,
    },
    Location {
        title: Option<String>,
        address: Option<String>,
        latitude: f64,
        longitude: f64,
    },
    Image {
        message_id: String,
        provider: ContentProvider,
    },
    Audio {
        message_id: String,
        provider: ContentProvider,
    },
    Video {
        message_id: String,
        provider: ContentProvider,
    },
    File {
        file_name: String,
        file_size: u64,
    },
    Follow,
    Unfollow,
    Join,
    Postback {
        data: String,
        params: Option<serde_json::Value>,
    },
    Beacon {
        hwid: String,
    },
    MemberJoined {
        user_ids: Vec<String>,
    },
    MemberLeft {
        user_ids: Vec<String>,
    },
    Other,
}

/// Map a raw webhook event onto the closed [`InboundEvent`] union. Total:
/// anything the platform adds in the future lands in `EventKind::Other`.
pub fn classify(raw: RawEvent) -> InboundEvent {
    match raw {
        RawEvent::Message {
            reply_token,
            source,
            message,
        } => InboundEvent {
            reply_token,
            source: EventSource::from(&source),
            kind: classify_message(message),
        },
        RawEvent::Follow {
            reply_token,
            source,
        } => InboundEvent {
            reply_token,
            source: EventSource::from(&source),
            kind: EventKind::Follow,
        },
        RawEvent::Unfollow { source } => InboundEvent {
            reply_token: String::new(),
            source: EventSource::from(&source),
            kind: EventKind::Unfollow,
        },
        RawEvent::Join {
            reply_token,
            source,
        } => InboundEvent {
            reply_token,
            source: EventSource::from(&source),
            kind: EventKind::Join,
        },
        RawEvent::Postback {
            reply_token,
            source,
            postback,
        } => InboundEvent {
            reply_token,
            source: EventSource::from(&source),
            kind: EventKind::Postback {
                data: postback.data,
                params: postback.params,
            },
        },
        RawEvent::Beacon {
            reply_token,
            source,
            beacon,
        } => InboundEvent {
            reply_token,
            source: EventSource::from(&source),
            kind: EventKind::Beacon { hwid: beacon.hwid },
        },
        RawEvent::MemberJoined {
            reply_token,
            source,
            joined,
        } => InboundEvent {
            reply_token,
            source: EventSource::from(&source),
            kind: EventKind::MemberJoined {
                user_ids: member_user_ids(&joined),
            },
        },
        RawEvent::MemberLeft { source, left } => InboundEvent {
            reply_token: String::new(),
            source: EventSource::from(&source),
            kind: EventKind::MemberLeft {
                user_ids: member_user_ids(&left),
            },
        },
        RawEvent::Other => InboundEvent {
            reply_token: String::new(),
            source: EventSource::default(),
            kind: EventKind::Other,
        },
    }
}

fn classify_message(message: RawMessage) -> EventKind {
    match message {
        RawMessage::Text { text } => EventKind::Text { text },
        RawMessage::Sticker {
            package_id,
            sticker_id,
        } => EventKind::Sticker {
            package_id,
            sticker_id,
        },
        RawMessage::Location {
            title,
            address,
            latitude,
            longitude,
        } => EventKind::Location {
            title,
            address,
            latitude,
            longitude,
        },
        RawMessage::Image {
            id,
            content_provider,
        } => EventKind::Image {
            message_id: id,
            provider: classify_provider(content_provider),
        },
        RawMessage::Audio {
            id,
            content_provider,
        } => EventKind::Audio {
            message_id: id,
            provider: classify_provider(content_provider),
        },
        RawMessage::Video {
            id,
            content_provider,
        } => EventKind::Video {
            message_id: id,
            provider: classify_provider(content_provider),
        },
        RawMessage::File {
            file_name,
            file_size,
        } => EventKind::File {
            file_name,
            file_size,
        },
        RawMessage::Unknown => EventKind::Other,
    }
}

fn classify_provider(provider: Option<RawContentProvider>) -> ContentProvider {
    match provider {
        Some(p) if p.kind == "external" => match p.original_content_url {
            Some(original_url) => ContentProvider::External {
                original_url,
                preview_url: p.preview_image_url,
            },
            // External provider without a URL is unusable; fetch instead.
            None => ContentProvider::Platform,
        },
        _ => ContentProvider::Platform,
    }
}

fn member_user_ids(members: &RawMembers) -> Vec<String> {
    members
        .members
        .iter()
        .filter_map(|source| EventSource::from(source).user_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_json(json: &str) -> InboundEvent {
        classify(serde_json::from_str::<RawEvent>(json).unwrap())
    }

    #[test]
    fn test_classifies_text_message() {
        let event = classify_json(
            r#"{
                "type": "message",
                "replyToken": "rt-1",
                "source": { "type": "user", "userId": "U1" },
                "message": { "type": "text", "id": "m1", "text": "遊戲" }
            }"#,
        );
        assert_eq!(event.reply_token, "rt-1");
        assert_eq!(event.source.user_id.as_deref(), Some("U1"));
        assert_eq!(event.source.sender_id.as_deref(), Some("U1"));
        assert_eq!(
            event.kind,
            EventKind::Text {
                text: "遊戲".to_string()
            }
        );
    }

    #[test]
    fn test_group_source_keeps_group_as_sender() {
        let event = classify_json(
            r#"{
                "type": "message",
                "replyToken": "rt-2",
                "source": { "type": "group", "groupId": "G1", "userId": "U2" },
                "message": { "type": "text", "id": "m2", "text": "hi" }
            }"#,
        );
        assert_eq!(event.source.sender_id.as_deref(), Some("G1"));
        assert_eq!(event.source.user_id.as_deref(), Some("U2"));
    }

    #[test]
    fn test_classifies_image_with_external_provider() {
        let event = classify_json(
            r#"{
                "type": "message",
                "replyToken": "rt-3",
                "source": { "type": "user", "userId": "U1" },
                "message": {
                    "type": "image",
                    "id": "m3",
                    "contentProvider": {
                        "type": "external",
                        "originalContentUrl": "https://cdn.example.com/a.jpg",
                        "previewImageUrl": "https://cdn.example.com/a-s.jpg"
                    }
                }
            }"#,
        );
        assert_eq!(
            event.kind,
            EventKind::Image {
                message_id: "m3".to_string(),
                provider: ContentProvider::External {
                    original_url: "https://cdn.example.com/a.jpg".to_string(),
                    preview_url: Some("https://cdn.example.com/a-s.jpg".to_string()),
                },
            }
        );
    }

    #[test]
    fn test_platform_hosted_image_defaults_to_fetch() {
        let event = classify_json(
            r#"{
                "type": "message",
                "replyToken": "rt-4",
                "source": { "type": "user", "userId": "U1" },
                "message": { "type": "image", "id": "m4", "contentProvider": { "type": "line" } }
            }"#,
        );
        assert_eq!(
            event.kind,
            EventKind::Image {
                message_id: "m4".to_string(),
                provider: ContentProvider::Platform,
            }
        );
    }

    #[test]
    fn test_unknown_event_type_maps_to_other() {
        let event = classify_json(r#"{ "type": "videoPlayComplete", "whatever": 1 }"#);
        assert_eq!(event.kind, EventKind::Other);
        assert!(event.reply_token.is_empty());
    }

    #[test]
    fn test_unknown_message_type_maps_to_other() {
        let event = classify_json(
            r#"{
                "type": "message",
                "replyToken": "rt-5",
                "source": { "type": "user", "userId": "U1" },
                "message": { "type": "imagemap", "id": "m5" }
            }"#,
        );
        assert_eq!(event.kind, EventKind::Other);
    }

    #[test]
    fn test_member_joined_collects_user_ids() {
        let event = classify_json(
            r#"{
                "type": "memberJoined",
                "replyToken": "rt-6",
                "source": { "type": "group", "groupId": "G1" },
                "joined": { "members": [
                    { "type": "user", "userId": "U5" },
                    { "type": "user", "userId": "U6" }
                ] }
            }"#,
        );
        assert_eq!(
            event.kind,
            EventKind::MemberJoined {
                user_ids: vec!["U5".to_string(), "U6".to_string()]
            }
        );
    }

    #[test]
    fn test_unfollow_has_no_reply_token() {
        let event = classify_json(
            r#"{ "type": "unfollow", "source": { "type": "user", "userId": "U1" } }"#,
        );
        assert_eq!(event.kind, EventKind::Unfollow);
        assert!(event.reply_token.is_empty());
    }
}
