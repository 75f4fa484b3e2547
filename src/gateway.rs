use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

use crate::reply::ReplyPayload;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("reply token is empty")]
    EmptyReplyToken,
    #[error("gateway api error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("gateway transport error: {0}")]
    Transport(String),
}

/// Profile of a chat user, as resolved by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub display_name: String,
}

/// Outbound side of the messaging platform. The interpreter core only ever
/// talks to this trait; the HTTP client behind it lives elsewhere.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send a reply bound to a single-use reply token.
    async fn reply(&self, reply_token: &str, payload: ReplyPayload) -> Result<(), GatewayError>;

    /// Push a message to a user, group, or room id.
    async fn push(&self, to: &str, payload: ReplyPayload) -> Result<(), GatewayError>;

    /// Push the same message to several targets.
    async fn multicast(&self, to: &[String], payload: ReplyPayload) -> Result<(), GatewayError>;

    /// Push a message to every chat the bot is in.
    async fn broadcast(&self, payload: ReplyPayload) -> Result<(), GatewayError>;

    /// Resolve a user's profile.
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, GatewayError>;

    /// Download the binary content of a media message.
    async fn get_media_blob(&self, message_id: &str) -> Result<Bytes, GatewayError>;
}

/// Gateway that logs every outbound call instead of hitting a network.
/// Backs the console binary so the interpreter can be driven end to end
/// without platform credentials.
pub struct ConsoleGateway;

impl ConsoleGateway {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagingGateway for ConsoleGateway {
    async fn reply(&self, reply_token: &str, payload: ReplyPayload) -> Result<(), GatewayError> {
        if reply_token.is_empty() {
            return Err(GatewayError::EmptyReplyToken);
        }
        info!("reply[{}]: {:?}", reply_token, payload);
        Ok(())
    }

    async fn push(&self, to: &str, payload: ReplyPayload) -> Result<(), GatewayError> {
        info!("push[{}]: {:?}", to, payload);
        Ok(())
    }

    async fn multicast(&self, to: &[String], payload: ReplyPayload) -> Result<(), GatewayError> {
        info!("multicast[{}]: {:?}", to.join(","), payload);
        Ok(())
    }

    async fn broadcast(&self, payload: ReplyPayload) -> Result<(), GatewayError> {
        info!("broadcast: {:?}", payload);
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, GatewayError> {
        Ok(UserProfile {
            display_name: user_id.to_string(),
        })
    }

    async fn get_media_blob(&self, message_id: &str) -> Result<Bytes, GatewayError> {
        Err(GatewayError::Api {
            status: 404,
            message: format!("no media content for {message_id} on the console"),
        })
    }
}
