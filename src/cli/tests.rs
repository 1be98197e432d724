use super::*;
use crate::api::ChatRequest;
use crate::cli::model_list::render_model_list;
use crate::cli::parse::write_messages;
use crate::cli::prompt::{effective_model, stream_reply, ReplyError};
use crate::cli::provider_list::render_provider_table;
use crate::cli::save::{read_transcript, save_exchange, SaveError};
use crate::core::chat_stream::{CompletionEngine, CompletionTransport, FragmentStream};
use crate::core::message::{Message, Role};
use crate::core::providers::{Credentials, Provider, ProviderBinding};
use crate::core::reframe::{FramingMode, ReplyFramer};
use crate::core::settings::Settings;
use crate::core::transcript::Document;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

mod test_helpers {
    use super::*;

    pub(super) fn parse_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv)
            .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
    }

    /// Replays a fixed list of fragments and records every request.
    #[derive(Clone, Default)]
    pub(super) struct CannedTransport {
        pub(super) items: Vec<Result<&'static str, &'static str>>,
        pub(super) requests: Arc<Mutex<Vec<ChatRequest>>>,
    }

    impl CannedTransport {
        pub(super) fn replying(fragments: &[&'static str]) -> Self {
            Self {
                items: fragments.iter().map(|f| Ok(*f)).collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl CompletionTransport for CannedTransport {
        async fn open(
            &self,
            _binding: &ProviderBinding,
            request: &ChatRequest,
        ) -> Result<FragmentStream, CompletionError> {
            self.requests.lock().unwrap().push(request.clone());
            let items: Vec<Result<String, CompletionError>> = self
                .items
                .iter()
                .map(|item| match item {
                    Ok(text) => Ok(text.to_string()),
                    Err(message) => Err(CompletionError::Transport(message.to_string())),
                })
                .collect();
            Ok(stream::iter(items).boxed())
        }
    }

    pub(super) fn engine(transport: CannedTransport) -> CompletionEngine<CannedTransport> {
        CompletionEngine::with_transport(
            transport,
            Credentials::new().with_key(Provider::Xai, "test-key"),
        )
    }
}

use test_helpers::{engine, parse_args, CannedTransport};

#[test]
fn test_prompt_flag_parsing() {
    let args = parse_args(&[
        "codey",
        "prompt",
        "hello",
        "--model",
        "gpt-4o",
        "--chunk",
        "--add-delimiters",
    ]);
    match args.command {
        Commands::Prompt {
            input,
            model,
            chunk,
            add_delimiters,
        } => {
            assert_eq!(input.as_deref(), Some("hello"));
            assert_eq!(model.as_deref(), Some("gpt-4o"));
            assert!(chunk);
            assert!(add_delimiters);
        }
        _ => panic!("expected prompt subcommand"),
    }

    let args = parse_args(&["codey", "prompt"]);
    match args.command {
        Commands::Prompt {
            input,
            model,
            chunk,
            add_delimiters,
        } => {
            assert_eq!(input, None, "stdin is used when input is omitted");
            assert_eq!(model, None);
            assert!(!chunk);
            assert!(!add_delimiters);
        }
        _ => panic!("expected prompt subcommand"),
    }
}

#[test]
fn test_save_flag_parsing() {
    let cases: [(&[&str], Option<&str>); 3] = [
        (&["codey", "save", "hi"], None),
        (&["codey", "save", "hi", "--file", "notes.md"], Some("notes.md")),
        (&["codey", "save", "-f", "chat.md", "hi"], Some("chat.md")),
    ];

    for (argv, expected_file) in cases {
        match parse_args(argv).command {
            Commands::Save { input, file } => {
                assert_eq!(input.as_deref(), Some("hi"), "argv={argv:?}");
                assert_eq!(
                    file.as_deref(),
                    expected_file.map(std::path::Path::new),
                    "argv={argv:?}"
                );
            }
            _ => panic!("expected save subcommand for argv={argv:?}"),
        }
    }
}

#[test]
fn test_verbose_is_global() {
    assert!(parse_args(&["codey", "-v", "models"]).verbose);
    assert!(parse_args(&["codey", "parse", "--verbose", "x"]).verbose);
    assert!(!parse_args(&["codey", "providers"]).verbose);
}

#[test]
fn test_subcommand_is_required() {
    assert!(Args::try_parse_from(["codey"]).is_err());
    assert!(Args::try_parse_from(["codey", "chat"]).is_err());
}

#[test]
fn test_set_and_unset_parsing() {
    match parse_args(&["codey", "set", "default-model", "o3"]).command {
        Commands::Set { key, value } => {
            assert_eq!(key, "default-model");
            assert_eq!(value.as_deref(), Some("o3"));
        }
        _ => panic!("expected set subcommand"),
    }
    match parse_args(&["codey", "unset", "default-file"]).command {
        Commands::Unset { key } => assert_eq!(key, "default-file"),
        _ => panic!("expected unset subcommand"),
    }
}

#[test]
fn test_model_precedence() {
    let with_front_matter = "+++\nmodel = \"o3\"\n+++\nHello";
    let plain = "Hello";
    let configured = Config {
        default_model: Some("claude-opus-4-0".to_string()),
        ..Default::default()
    };
    let unconfigured = Config::default();

    // --model beats everything
    let doc = Document::parse_with(with_front_matter, configured.base_settings());
    assert_eq!(effective_model(Some("gpt-4o"), &doc.settings), "gpt-4o");

    // front matter beats config
    assert_eq!(effective_model(None, &doc.settings), "o3");

    // config beats built-in default
    let doc = Document::parse_with(plain, configured.base_settings());
    assert_eq!(effective_model(None, &doc.settings), "claude-opus-4-0");

    let doc = Document::parse_with(plain, unconfigured.base_settings());
    assert_eq!(effective_model(None, &doc.settings), "grok-3");
    assert_eq!(effective_model(Some(""), &doc.settings), "grok-3");
}

#[test]
fn test_apply_and_clear_settings() {
    let mut config = Config::default();

    let message = apply_setting(&mut config, "default-model", "gpt-4.1").unwrap();
    assert!(message.contains("gpt-4.1"));
    assert_eq!(config.default_model.as_deref(), Some("gpt-4.1"));

    let err = apply_setting(&mut config, "default-model", "gpt-99").unwrap_err();
    assert!(err.contains("Unknown model 'gpt-99'"));
    assert_eq!(config.default_model.as_deref(), Some("gpt-4.1"), "unchanged");

    apply_setting(&mut config, "default-file", "log.md").unwrap();
    assert_eq!(config.default_file.as_deref(), Some("log.md"));

    assert!(apply_setting(&mut config, "theme", "dark").is_err());

    clear_setting(&mut config, "default-model").unwrap();
    assert_eq!(config.default_model, None);
    assert!(clear_setting(&mut config, "theme").is_err());
}

#[test]
fn test_model_list_marks_default_and_filters() {
    let listing = render_model_list(None, "grok-3");
    assert!(listing.contains("xAI (xai)"));
    assert!(listing.contains("OpenAI (openai)"));
    assert!(listing.contains("Anthropic (anthropic)"));
    assert!(listing.contains("  * grok-3\n"));
    assert!(listing.contains("    grok-3-beta\n"));

    let listing = render_model_list(Some(Provider::Anthropic), "claude-sonnet-4-0");
    assert!(!listing.contains("grok-3"));
    assert!(listing.contains("  * claude-sonnet-4-0\n"));
}

#[test]
fn test_provider_table_reports_key_status() {
    let credentials = Credentials::new().with_key(Provider::OpenAi, "sk-test");
    let table = render_provider_table(&credentials);

    assert!(table.contains("| openai | OpenAI | https://api.openai.com/v1 | ✅ |"));
    assert!(table.contains("| xai | xAI | https://api.x.ai/v1 | ❌ XAI_API_KEY |"));
    assert!(table.contains("❌ ANTHROPIC_API_KEY"));
    assert!(!table.contains("sk-test"));
}

#[test]
fn test_parse_prints_json_lines() {
    let document = Document::parse("Hi\n\n# === ASSISTANT ===\n\n  Hello.");
    let mut out = Vec::new();
    write_messages(&document, &mut out).unwrap();

    let lines: Vec<serde_json::Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(
        lines,
        vec![
            serde_json::json!({"role": "user", "content": "Hi"}),
            serde_json::json!({"role": "assistant", "content": "  Hello."}),
        ]
    );
}

#[tokio::test]
async fn test_stream_reply_writes_raw_output() {
    let engine = engine(CannedTransport::replying(&["Hel", "", "lo"]));
    let mut framer = ReplyFramer::new(Vec::new(), FramingMode::Raw);

    let reply = stream_reply(&engine, &[Message::user("hi")], "grok-3", &mut framer)
        .await
        .expect("reply");
    assert_eq!(reply, "Hello");
    assert_eq!(String::from_utf8(framer.into_inner()).unwrap(), "Hello\n");
}

#[tokio::test]
async fn test_stream_reply_with_delimiters_in_chunk_mode() {
    let engine = engine(CannedTransport::replying(&["Hi"]));
    let mut framer =
        ReplyFramer::new(Vec::new(), FramingMode::Chunked).with_delimiters(&Settings::default());

    stream_reply(&engine, &[Message::user("hi")], "grok-3", &mut framer)
        .await
        .expect("reply");

    let output = String::from_utf8(framer.into_inner()).unwrap();
    let chunks: Vec<String> = output
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["chunk"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        chunks,
        vec![
            "\n\n# === ASSISTANT ===\n\n".to_string(),
            "Hi".to_string(),
            "\n\n# === USER ===\n\n".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_stream_reply_keeps_fragments_written_before_a_failure() {
    let transport = CannedTransport {
        items: vec![Ok("partial "), Err("connection reset"), Ok("never")],
        ..CannedTransport::default()
    };
    let engine = engine(transport);
    let mut framer = ReplyFramer::new(Vec::new(), FramingMode::Raw);

    let err = stream_reply(&engine, &[Message::user("hi")], "grok-3", &mut framer)
        .await
        .expect_err("stream fails");
    assert!(matches!(
        err,
        ReplyError::Completion(CompletionError::Transport(ref m)) if m == "connection reset"
    ));
    assert_eq!(
        String::from_utf8(framer.into_inner()).unwrap(),
        "partial ",
        "no closing newline after a failure"
    );
}

#[tokio::test]
async fn test_save_creates_missing_transcript() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("codey.md");
    let transport = CannedTransport::replying(&["Hi ", "there"]);
    let requests = transport.requests.clone();
    let engine = engine(transport);
    let mut framer = ReplyFramer::new(Vec::new(), FramingMode::Raw);

    let reply = save_exchange(&engine, &path, "Hello", Settings::default(), &mut framer)
        .await
        .expect("save");
    assert_eq!(reply, "Hi there");

    let saved = fs::read_to_string(&path).unwrap();
    assert_eq!(
        saved,
        "Hello\n\n# === ASSISTANT ===\n\nHi there\n\n# === USER ===\n\n"
    );

    let sent = requests.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let contents: Vec<&str> = sent[0].messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["Hello"], "the prompt is sent exactly once");
}

#[tokio::test]
async fn test_save_appends_to_existing_transcript() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("chat.md");
    let existing = "First\n\n# === ASSISTANT ===\n\nReply one\n\n# === USER ===\n\n";
    fs::write(&path, existing).unwrap();

    let transport = CannedTransport::replying(&["Reply two"]);
    let requests = transport.requests.clone();
    let engine = engine(transport);
    let mut framer = ReplyFramer::new(Vec::new(), FramingMode::Raw);

    save_exchange(&engine, &path, "Second", Settings::default(), &mut framer)
        .await
        .expect("save");

    let saved = fs::read_to_string(&path).unwrap();
    assert!(saved.starts_with(existing), "history is preserved verbatim");
    assert_eq!(
        Document::parse(&format!("{saved}Third")).messages,
        vec![
            Message::user("First"),
            Message::assistant("Reply one"),
            Message::user("Second"),
            Message::assistant("Reply two"),
            Message::user("Third"),
        ]
    );

    let sent = requests.lock().unwrap();
    assert_eq!(
        sent_turns(&sent[0]),
        vec![
            (Role::User, "First"),
            (Role::Assistant, "Reply one"),
            (Role::User, "Second"),
        ]
    );
}

#[tokio::test]
async fn test_save_uses_front_matter_of_the_transcript() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("chat.md");
    let existing = "+++\nmodel = \"gpt-4o\"\n+++\nFirst";
    fs::write(&path, existing).unwrap();

    // Only an xAI key is configured, so the gpt-4o request cannot be sent.
    let engine = engine(CannedTransport::replying(&["unused"]));
    let mut framer = ReplyFramer::new(Vec::new(), FramingMode::Raw);

    let err = save_exchange(&engine, &path, "Second", Settings::default(), &mut framer)
        .await
        .expect_err("missing OpenAI key");
    assert!(matches!(
        err,
        SaveError::Reply(ReplyError::Completion(CompletionError::MissingCredential {
            var: "OPENAI_API_KEY",
            ..
        }))
    ));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        existing,
        "file untouched on failure"
    );

    // With the key present the request goes to gpt-4o, and the prompt is a
    // separate user turn rather than a continuation of "First".
    let transport = CannedTransport::replying(&["ok"]);
    let requests = transport.requests.clone();
    let engine = CompletionEngine::with_transport(
        transport,
        Credentials::new().with_key(Provider::OpenAi, "sk-test"),
    );
    save_exchange(&engine, &path, "Second", Settings::default(), &mut framer)
        .await
        .expect("save");

    let sent = requests.lock().unwrap();
    assert_eq!(sent[0].model, "gpt-4o");
    assert_eq!(
        sent_turns(&sent[0]),
        vec![(Role::User, "First"), (Role::User, "Second")]
    );
}

fn sent_turns(request: &ChatRequest) -> Vec<(Role, &str)> {
    request
        .messages
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect()
}

#[tokio::test]
async fn test_save_after_assistant_turn_opens_a_user_turn() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("chat.md");
    let existing = "Q\n\n# === ASSISTANT ===\n\nA";
    fs::write(&path, existing).unwrap();

    let transport = CannedTransport::replying(&["B"]);
    let requests = transport.requests.clone();
    let engine = engine(transport);
    let mut framer = ReplyFramer::new(Vec::new(), FramingMode::Raw);

    save_exchange(&engine, &path, "Next", Settings::default(), &mut framer)
        .await
        .expect("save");

    let sent = requests.lock().unwrap();
    assert_eq!(
        sent_turns(&sent[0]),
        vec![
            (Role::User, "Q"),
            (Role::Assistant, "A"),
            (Role::User, "Next"),
        ]
    );

    let saved = fs::read_to_string(&path).unwrap();
    assert_eq!(
        saved,
        "Q\n\n# === ASSISTANT ===\n\nA\n\n# === USER ===\n\nNext\n\n# === ASSISTANT ===\n\nB\n\n# === USER ===\n\n"
    );
}

#[tokio::test]
async fn test_save_after_bare_user_text_keeps_turns_apart() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("chat.md");
    fs::write(&path, "First").unwrap();

    let transport = CannedTransport::replying(&["Reply"]);
    let requests = transport.requests.clone();
    let engine = engine(transport);
    let mut framer = ReplyFramer::new(Vec::new(), FramingMode::Raw);

    save_exchange(&engine, &path, "Second", Settings::default(), &mut framer)
        .await
        .expect("save");

    let sent = requests.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent_turns(&sent[0]),
        vec![(Role::User, "First"), (Role::User, "Second")]
    );
    assert!(fs::read_to_string(&path)
        .unwrap()
        .starts_with("First\n\n# === USER ===\n\nSecond\n\n# === ASSISTANT ===\n\n"));
}

#[tokio::test]
async fn test_save_leaves_file_alone_when_stream_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("chat.md");

    let transport = CannedTransport {
        items: vec![Ok("half a rep"), Err("stream closed")],
        ..CannedTransport::default()
    };
    let engine = engine(transport);
    let mut framer = ReplyFramer::new(Vec::new(), FramingMode::Raw);

    assert!(save_exchange(&engine, &path, "Hello", Settings::default(), &mut framer)
        .await
        .is_err());
    assert!(!path.exists(), "no transcript is created for a failed reply");
}

#[test]
fn test_read_transcript_missing_file_is_empty() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let missing = temp_dir.path().join("missing.md");
    assert_eq!(read_transcript(&missing).unwrap(), "");

    // A directory exists but cannot be read as text.
    assert!(matches!(
        read_transcript(temp_dir.path()),
        Err(SaveError::Read { .. })
    ));
}
