//! Line-oriented command shell over the auth and chat services.
//!
//! Every command produces exactly one JSON line on the output:
//! `{"ok":true,"result":...}` or `{"ok":false,"error":{"kind":...,"message":...}}`.

use anyhow::Context;
use parley_chats::{ChatError, ChatService};
use parley_common::ErrorKind;
use parley_users::{AuthError, AuthService, AuthSession, Identity};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

pub const USAGE: &[&str] = &[
    "register <username> <email> <password>",
    "login <username> <password>",
    "refresh",
    "whoami",
    "create chat <name> [--with <user_id>,<user_id>...]",
    "connect <chat_id>",
    "send <chat_id> <message>",
    "messages <chat_id> [limit] [offset]",
    "chats",
    "help",
    "quit",
];

#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("{0}")]
    Usage(String),

    #[error("not logged in")]
    NotLoggedIn,
}

impl ShellError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShellError::Auth(err) => err.kind(),
            ShellError::Chat(err) => err.kind(),
            ShellError::Usage(_) => ErrorKind::Invalid,
            ShellError::NotLoggedIn => ErrorKind::InvalidCredentials,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Register {
        username: String,
        email: String,
        password: String,
    },
    Login {
        username: String,
        password: String,
    },
    Refresh,
    Whoami,
    CreateChat {
        name: String,
        participants: Vec<String>,
    },
    Connect {
        chat_id: String,
    },
    Send {
        chat_id: String,
        content: String,
    },
    Messages {
        chat_id: String,
        limit: Option<usize>,
        offset: Option<usize>,
    },
    Chats,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ShellError> {
        let mut words = line.split_whitespace();
        let name = words
            .next()
            .ok_or_else(|| ShellError::Usage("empty command".to_string()))?;
        let args: Vec<&str> = words.collect();

        match (name, args.as_slice()) {
            ("register", [username, email, password]) => Ok(Command::Register {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            }),
            ("login", [username, password]) => Ok(Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            }),
            ("refresh", []) => Ok(Command::Refresh),
            ("whoami", []) => Ok(Command::Whoami),
            ("create", ["chat", rest @ ..]) if !rest.is_empty() => parse_create(rest),
            ("connect", [chat_id]) => Ok(Command::Connect {
                chat_id: chat_id.to_string(),
            }),
            ("send", [chat_id, words @ ..]) if !words.is_empty() => Ok(Command::Send {
                chat_id: chat_id.to_string(),
                content: rest_after(line, 2).to_string(),
            }),
            ("messages", [chat_id, rest @ ..]) if rest.len() <= 2 => Ok(Command::Messages {
                chat_id: chat_id.to_string(),
                limit: parse_number(rest.first().copied(), "limit")?,
                offset: parse_number(rest.get(1).copied(), "offset")?,
            }),
            ("chats", []) => Ok(Command::Chats),
            ("help", _) => Ok(Command::Help),
            ("quit" | "exit", _) => Ok(Command::Quit),
            (other, _) => match USAGE.iter().find(|usage| usage.split(' ').next() == Some(other)) {
                Some(usage) => Err(ShellError::Usage(format!("usage: {}", usage))),
                None => Err(ShellError::Usage(format!("unknown command: {}", other))),
            },
        }
    }
}

fn parse_create(rest: &[&str]) -> Result<Command, ShellError> {
    let (name_words, participants) = match rest.iter().position(|word| *word == "--with") {
        Some(at) => {
            let participants = rest[at + 1..]
                .iter()
                .flat_map(|word| word.split(','))
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
            (&rest[..at], participants)
        }
        None => (rest, Vec::new()),
    };

    if name_words.is_empty() {
        return Err(ShellError::Usage(
            "usage: create chat <name> [--with <user_id>,<user_id>...]".to_string(),
        ));
    }

    Ok(Command::CreateChat {
        name: name_words.join(" "),
        participants,
    })
}

/// The remainder of `line` after its first `words` words, inner whitespace intact.
fn rest_after(line: &str, words: usize) -> &str {
    let mut rest = line.trim_start();
    for _ in 0..words {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest
}

fn parse_number(word: Option<&str>, what: &str) -> Result<Option<usize>, ShellError> {
    word.map(|word| {
        word.parse::<usize>()
            .map_err(|_| ShellError::Usage(format!("{} must be a non-negative integer", what)))
    })
    .transpose()
}

#[derive(Debug, Clone)]
struct Session {
    access_token: String,
    refresh_token: String,
}

/// Shell state: the services plus the tokens of the current login.
pub struct Shell {
    auth: Arc<AuthService>,
    chats: Arc<ChatService>,
    session: Option<Session>,
}

impl Shell {
    pub fn new(auth: Arc<AuthService>, chats: Arc<ChatService>) -> Self {
        Self {
            auth,
            chats,
            session: None,
        }
    }

    /// Read commands until end of input or `quit`, writing one JSON line each.
    pub async fn run<I, O>(&mut self, input: I, mut output: O) -> anyhow::Result<()>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        while let Some(line) = lines.next_line().await.context("failed to read command")? {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let command = Command::parse(line);
            let quit = matches!(command, Ok(Command::Quit));
            let result = match command {
                Ok(command) => self.execute(command).await,
                Err(err) => Err(err),
            };

            let mut rendered = serde_json::to_vec(&render(result)).context("failed to encode response")?;
            rendered.push(b'\n');
            output
                .write_all(&rendered)
                .await
                .context("failed to write response")?;
            output.flush().await.context("failed to flush output")?;

            if quit {
                break;
            }
        }

        info!("shell finished");
        Ok(())
    }

    pub async fn execute(&mut self, command: Command) -> Result<Value, ShellError> {
        match command {
            Command::Register {
                username,
                email,
                password,
            } => {
                let session = self.auth.register(&username, &email, &password).await?;
                Ok(self.remember(session))
            }
            Command::Login { username, password } => {
                let session = self.auth.login(&username, &password).await?;
                Ok(self.remember(session))
            }
            Command::Refresh => {
                let refresh_token = self
                    .session
                    .as_ref()
                    .map(|session| session.refresh_token.clone())
                    .ok_or(ShellError::NotLoggedIn)?;

                let grant = match self.auth.refresh(&refresh_token).await {
                    Ok(grant) => grant,
                    Err(err) => {
                        self.session = None;
                        return Err(err.into());
                    }
                };

                let expires_in = grant.expires_in;
                if let Some(session) = self.session.as_mut() {
                    session.access_token = grant.access_token;
                }
                Ok(json!({ "token_type": grant.token_type, "expires_in": expires_in }))
            }
            Command::Whoami => {
                let identity = self.identity().await?;
                let user = self.auth.get_profile(&identity.user_id).await?;
                Ok(json!({ "user": user }))
            }
            Command::CreateChat { name, participants } => {
                let identity = self.identity().await?;
                let chat = self
                    .chats
                    .create_chat(&identity.user_id, &name, &participants)
                    .await?;
                Ok(json!(chat))
            }
            Command::Connect { chat_id } => {
                let identity = self.identity().await?;
                let chat = self.chats.connect(&chat_id, &identity.user_id).await?;
                Ok(json!(chat))
            }
            Command::Send { chat_id, content } => {
                let identity = self.identity().await?;
                let message = self
                    .chats
                    .send_message(&chat_id, &identity.user_id, &content)
                    .await?;
                Ok(json!(message))
            }
            Command::Messages {
                chat_id,
                limit,
                offset,
            } => {
                let identity = self.identity().await?;
                let messages = self
                    .chats
                    .get_messages(&chat_id, &identity.user_id, limit, offset)
                    .await?;
                Ok(json!(messages))
            }
            Command::Chats => {
                let identity = self.identity().await?;
                let chats = self.chats.list_chats(&identity.user_id).await?;
                Ok(json!(chats))
            }
            Command::Help => Ok(json!(USAGE)),
            Command::Quit => Ok(json!("bye")),
        }
    }

    fn remember(&mut self, session: AuthSession) -> Value {
        self.session = Some(Session {
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
        });

        json!({
            "user": session.user,
            "token_type": session.tokens.token_type,
            "expires_in": session.tokens.expires_in,
        })
    }

    /// The caller behind the current access token, refreshing it once if it
    /// has expired. A failed refresh ends the session.
    async fn identity(&mut self) -> Result<Identity, ShellError> {
        let (access_token, refresh_token) = match &self.session {
            Some(session) => (session.access_token.clone(), session.refresh_token.clone()),
            None => return Err(ShellError::NotLoggedIn),
        };

        match self.auth.resolve_identity(&access_token) {
            Err(AuthError::TokenExpired) => {}
            other => return Ok(other?),
        }

        debug!("access token expired, refreshing");
        let grant = match self.auth.refresh(&refresh_token).await {
            Ok(grant) => grant,
            Err(err) => {
                self.session = None;
                return Err(err.into());
            }
        };

        let identity = self.auth.resolve_identity(&grant.access_token)?;
        if let Some(session) = self.session.as_mut() {
            session.access_token = grant.access_token;
        }
        Ok(identity)
    }
}

fn render(result: Result<Value, ShellError>) -> Value {
    match result {
        Ok(value) => json!({ "ok": true, "result": value }),
        Err(err) => json!({
            "ok": false,
            "error": { "kind": err.kind(), "message": err.to_string() },
        }),
    }
}
