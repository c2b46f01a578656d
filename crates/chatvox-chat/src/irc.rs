//! Anonymous Twitch IRC transport.
//!
//! Twitch chat is plain IRC with tag extensions. Reading a channel's
//! messages requires no credentials: the server accepts a `justinfan`
//! nickname with a throwaway password. This module implements that
//! handshake over TCP and parses `PRIVMSG` lines into [`ChatMessage`]s.
//!
//! The [`ChatSource`]/[`ChatStream`] traits are the seam between the
//! protocol and the [`ConnectionSupervisor`](crate::supervisor):
//! production uses [`TwitchChatSource`], tests use scripted sources.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::error::ChatError;

const SERVER: &str = "irc.chat.twitch.tv";
const PORT: u16 = 6667;
const DEFAULT_NICKNAME: &str = "justinfan12345";

static DISPLAY_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"display-name=([^;]+)").expect("valid regex"));
static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([^!]+)!").expect("valid regex"));
static MESSAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PRIVMSG [^:]+:(.+)").expect("valid regex"));

// ── Messages ───────────────────────────────────────────────────────

/// One chat message, extracted from a `PRIVMSG` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Sender's display name (or IRC username as fallback).
    pub username: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Create a message value.
    pub fn new(username: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            content: content.into(),
        }
    }

    /// The text handed to speech synthesis for this message.
    #[must_use]
    pub fn speech_text(&self) -> String {
        format!("user {} said {}", self.username, self.content)
    }
}

/// Parse a raw IRC line into a chat message.
///
/// Prefers the `display-name` tag; falls back to the username from the
/// IRC prefix. Returns `None` for anything that is not a complete chat
/// message (server notices, JOIN/PART traffic, malformed lines).
#[must_use]
pub fn parse_message(line: &str) -> Option<ChatMessage> {
    let username = DISPLAY_NAME_REGEX
        .captures(line)
        .and_then(|cap| cap.get(1))
        .or_else(|| USERNAME_REGEX.captures(line).and_then(|cap| cap.get(1)))
        .map(|m| m.as_str().to_owned())?;

    let content = MESSAGE_REGEX
        .captures(line)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_owned())?;

    Some(ChatMessage { username, content })
}

// ── Ports ──────────────────────────────────────────────────────────

/// Factory for chat connections.
///
/// One implementation per transport; the supervisor only ever sees
/// this trait, which keeps its state machine testable without sockets.
#[async_trait]
pub trait ChatSource: Send + Sync {
    /// Open a connection and join the given channel.
    async fn connect(&self, channel: &str) -> Result<Box<dyn ChatStream>, ChatError>;
}

/// An open, joined chat connection.
#[async_trait]
pub trait ChatStream: Send {
    /// Receive the next chat message.
    ///
    /// Protocol keepalives are handled internally and never surface.
    /// Returns `Ok(None)` when the server closed the connection.
    async fn next_message(&mut self) -> Result<Option<ChatMessage>, ChatError>;
}

// ── Twitch implementation ──────────────────────────────────────────

/// [`ChatSource`] for the public Twitch IRC endpoint.
#[derive(Debug, Clone)]
pub struct TwitchChatSource {
    server: String,
    port: u16,
    nickname: String,
}

impl Default for TwitchChatSource {
    fn default() -> Self {
        Self {
            server: SERVER.to_owned(),
            port: PORT,
            nickname: DEFAULT_NICKNAME.to_owned(),
        }
    }
}

impl TwitchChatSource {
    /// Source for the default public endpoint with an anonymous nick.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the server endpoint (tests point this at a local
    /// listener).
    #[must_use]
    pub fn with_endpoint(mut self, server: impl Into<String>, port: u16) -> Self {
        self.server = server.into();
        self.port = port;
        self
    }
}

#[async_trait]
impl ChatSource for TwitchChatSource {
    async fn connect(&self, channel: &str) -> Result<Box<dyn ChatStream>, ChatError> {
        let mut stream = TcpStream::connect((self.server.as_str(), self.port)).await?;

        // Anonymous login: any "justinfan" nickname is accepted, the
        // password is ignored.
        stream.write_all(b"PASS SCHMOOPIIE\r\n").await?;
        stream
            .write_all(format!("NICK {}\r\n", self.nickname).as_bytes())
            .await?;
        stream
            .write_all(format!("JOIN #{}\r\n", channel.trim_start_matches('#')).as_bytes())
            .await?;
        stream
            .write_all(b"CAP REQ :twitch.tv/tags twitch.tv/commands twitch.tv/membership\r\n")
            .await?;
        stream.flush().await?;

        tracing::info!(
            channel = channel.trim_start_matches('#'),
            "joined Twitch chat as anonymous viewer"
        );

        Ok(Box::new(TwitchChatStream {
            reader: BufReader::new(stream),
            line: String::new(),
        }))
    }
}

struct TwitchChatStream {
    reader: BufReader<TcpStream>,
    line: String,
}

#[async_trait]
impl ChatStream for TwitchChatStream {
    async fn next_message(&mut self) -> Result<Option<ChatMessage>, ChatError> {
        loop {
            self.line.clear();
            let read = self.reader.read_line(&mut self.line).await?;
            if read == 0 {
                tracing::info!("chat connection closed by server");
                return Ok(None);
            }

            // Answer keepalives so the server doesn't drop us.
            if self.line.starts_with("PING") {
                self.reader.get_mut().write_all(b"PONG\r\n").await?;
                self.reader.get_mut().flush().await?;
                tracing::trace!("PONG sent");
                continue;
            }

            if let Some(message) = parse_message(&self.line) {
                tracing::debug!(from = %message.username, "chat message received");
                return Ok(Some(message));
            }
            // Not a chat message (JOIN traffic, notices) — keep reading.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_privmsg_with_display_name_tag() {
        let line = "@badge-info=;display-name=StreamFan;color=#FF0000 :streamfan!streamfan@streamfan.tmi.twitch.tv PRIVMSG #somechannel :hello world";
        let message = parse_message(line).unwrap();
        assert_eq!(message.username, "StreamFan");
        assert_eq!(message.content, "hello world");
    }

    #[test]
    fn falls_back_to_prefix_username_without_tags() {
        let line = ":streamfan!streamfan@streamfan.tmi.twitch.tv PRIVMSG #somechannel :no tags here";
        let message = parse_message(line).unwrap();
        assert_eq!(message.username, "streamfan");
        assert_eq!(message.content, "no tags here");
    }

    #[test]
    fn non_chat_lines_are_skipped() {
        assert!(parse_message("PING :tmi.twitch.tv").is_none());
        assert!(parse_message(":tmi.twitch.tv 376 justinfan12345 :>").is_none());
        assert!(
            parse_message(":streamfan!streamfan@streamfan.tmi.twitch.tv JOIN #somechannel")
                .is_none()
        );
        assert!(parse_message("").is_none());
    }

    #[test]
    fn message_content_is_trimmed() {
        let line = ":a!a@a.tmi.twitch.tv PRIVMSG #c :  padded  \r";
        let message = parse_message(line).unwrap();
        assert_eq!(message.content, "padded");
    }

    #[test]
    fn speech_text_phrasing() {
        let message = ChatMessage::new("alice", "hello");
        assert_eq!(message.speech_text(), "user alice said hello");
    }
}
