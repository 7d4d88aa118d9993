//! Integration tests for the session state machine
//!
//! The session is driven directly with messages; background work is either
//! simulated by feeding its result back or run inline on the test runtime.

use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use futures::future::BoxFuture;
use kodegen_shell::{
    CaptureWriter, CommandRouter, CompletionOption, CompletionRequest, CompletionResult, Directive,
    Effect, ExecutionRequest, HistoryItem, ItemKind, ItemStatus, Message, ModeKind, Overlay,
    ShellOptions, ShellSession,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Helpers
// ============================================================================

fn key(code: KeyCode) -> Message {
    Message::key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn ctrl(c: char) -> Message {
    Message::key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
}

fn new_session(options: ShellOptions) -> ShellSession {
    let mut session = ShellSession::new(options);
    let _ = session.init();
    let _ = session.update(Message::resize(80, 24));
    session
}

fn no_history() -> ShellSession {
    new_session(ShellOptions::builder().no_history().build())
}

fn type_text(session: &mut ShellSession, text: &str) {
    for c in text.chars() {
        let _ = session.update(key(KeyCode::Char(c)));
    }
}

fn execute_request(effects: Vec<Effect>) -> ExecutionRequest {
    effects
        .into_iter()
        .find_map(|effect| match effect {
            Effect::Execute(request) => Some(request),
            _ => None,
        })
        .expect("an execute effect")
}

fn completion_request(effects: &[Effect]) -> CompletionRequest {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::Complete(request) => Some(request.clone()),
            _ => None,
        })
        .expect("a completion effect")
}

/// Submit `line` and report it finished successfully
fn run_line(session: &mut ShellSession, line: &str) -> Vec<Effect> {
    type_text(session, line);
    let request = execute_request(session.update(key(KeyCode::Enter)));

    let mut item = request.item().clone();
    item.finished = Some(Utc::now());
    item.status = ItemStatus::Success;
    session.update(Message::CommandFinished {
        id: session.id(),
        item,
    })
}

fn options(names: &[(&str, Option<&str>)]) -> CompletionResult {
    CompletionResult {
        directive: Directive::NO_FILE_COMP,
        options: names
            .iter()
            .map(|(name, description)| CompletionOption {
                name: (*name).to_string(),
                description: description.map(ToString::to_string),
            })
            .collect(),
    }
}

struct HelpRouter;

impl CommandRouter for HelpRouter {
    fn dispatch<'a>(
        &'a self,
        args: Vec<String>,
        _cancel: CancellationToken,
        mut out: CaptureWriter,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            match args[0].as_str() {
                "help" => {
                    writeln!(out, "Available commands: help")?;
                    Ok(())
                }
                "boom" => panic!("router bug"),
                other => anyhow::bail!("unknown command {other}"),
            }
        })
    }
}

async fn drive(session: &mut ShellSession, request: ExecutionRequest) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    request.run(Arc::new(HelpRouter), tx).await;
    while let Ok(message) = rx.try_recv() {
        let _ = session.update(message);
    }
}

// ============================================================================
// Command entry and execution
// ============================================================================

#[tokio::test]
async fn test_help_command_runs_and_is_recorded() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut session = no_history();
    assert_eq!(session.mode(), Some(ModeKind::CommandEntry));

    type_text(&mut session, "help");
    assert_eq!(session.input(), "help");

    let effects = session.update(key(KeyCode::Enter));
    assert_eq!(session.mode(), Some(ModeKind::CommandRunning));
    assert!(session.is_executing());
    assert_eq!(session.input(), "");
    assert!(
        !effects.iter().any(|effect| matches!(effect, Effect::SaveHistory { .. })),
        "persistence is disabled"
    );

    let request = execute_request(effects);
    assert_eq!(request.item().status, ItemStatus::Running);
    drive(&mut session, request).await;

    assert_eq!(session.mode(), Some(ModeKind::CommandEntry));
    assert!(!session.is_executing());
    let item = session.history().lookback(1).unwrap();
    assert_eq!(item.line, "help");
    assert_eq!(item.status, ItemStatus::Success);
    assert_eq!(item.output, "Available commands: help");
    assert!(item.streaming_output.is_empty());

    let view = session.view();
    let lines = view.lines(false);
    assert!(lines.iter().any(|line| line.starts_with("> help")));
    assert!(lines.iter().any(|line| line == "Available commands: help"));
}

#[tokio::test]
async fn test_failures_and_panics_become_error_items() {
    let mut session = no_history();

    type_text(&mut session, "nope");
    let request = execute_request(session.update(key(KeyCode::Enter)));
    drive(&mut session, request).await;
    let item = session.history().lookback(1).unwrap();
    assert_eq!(item.status, ItemStatus::Error);
    assert!(item.error.as_ref().unwrap().to_string().contains("unknown command nope"));

    type_text(&mut session, "boom");
    let request = execute_request(session.update(key(KeyCode::Enter)));
    drive(&mut session, request).await;
    let item = session.history().lookback(1).unwrap();
    assert_eq!(item.status, ItemStatus::Error);
    assert!(item.error.as_ref().unwrap().to_string().contains("router bug"));
    assert_eq!(session.mode(), Some(ModeKind::CommandEntry));
}

#[test]
fn test_blank_lines_are_ignored() {
    let mut session = no_history();
    type_text(&mut session, "   ");
    let effects = session.update(key(KeyCode::Enter));
    assert!(effects.is_empty());
    assert_eq!(session.mode(), Some(ModeKind::CommandEntry));
    assert!(session.history().is_empty());
}

#[test]
fn test_exit_shuts_down() {
    let mut session = no_history();
    type_text(&mut session, "exit");
    let effects = session.update(key(KeyCode::Enter));
    assert!(effects.iter().any(|effect| matches!(effect, Effect::Quit)));
    assert!(session.is_shutting_down());
    assert!(session.history().is_empty());

    // input after shutdown is ignored
    type_text(&mut session, "x");
    assert!(!session.view().show_input);
}

#[test]
fn test_cancel_clears_then_quits() {
    let mut session = no_history();
    type_text(&mut session, "partial");

    let effects = session.update(ctrl('c'));
    assert!(effects.is_empty());
    assert_eq!(session.input(), "");
    assert!(!session.is_shutting_down());

    let effects = session.update(key(KeyCode::Esc));
    assert!(effects.iter().any(|effect| matches!(effect, Effect::Quit)));
    assert!(session.is_shutting_down());
}

#[test]
fn test_cancel_while_running_stops_the_command() {
    let mut session = no_history();
    type_text(&mut session, "sleep 10");
    let request = execute_request(session.update(key(KeyCode::Enter)));
    let token = request.cancel_token().clone();

    let effects = session.update(ctrl('c'));
    assert!(effects.is_empty());
    assert!(token.is_cancelled());
    assert!(!session.is_shutting_down());
    assert_eq!(session.mode(), Some(ModeKind::CommandRunning));

    // nothing left to cancel: quit
    let effects = session.update(ctrl('c'));
    assert!(effects.iter().any(|effect| matches!(effect, Effect::Quit)));
}

#[test]
fn test_output_streams_into_the_running_item() {
    let mut session = no_history();
    type_text(&mut session, "count");
    let request = execute_request(session.update(key(KeyCode::Enter)));
    let item_id = request.item().id;

    for chunk in ["1\n", "2\n"] {
        let _ = session.update(Message::CommandOutput {
            id: session.id(),
            item_id,
            chunk: chunk.to_string(),
        });
    }

    assert_eq!(session.history().get(item_id).unwrap().streaming_output, "1\n2\n");
    let lines = session.view().lines(false);
    assert!(lines.iter().any(|line| line == "2"));
}

#[test]
fn test_history_saves_follow_commands_only() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("history").to_string_lossy().into_owned();
    let mut session = ShellSession::new(ShellOptions::builder().history_file(file).build());

    let effects = session.init();
    let load_id = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::LoadHistory { id } => Some(*id),
            _ => None,
        })
        .expect("a load effect");
    let _ = session.update(Message::resize(80, 24));

    type_text(&mut session, "ls");
    let effects = session.update(key(KeyCode::Enter));
    let saves: Vec<usize> = effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::SaveHistory { snapshot, .. } => Some(snapshot.len()),
            _ => None,
        })
        .collect();
    assert_eq!(saves, [1]);

    let failure = HistoryItem::internal_error("error saving history file", anyhow::anyhow!("denied"));
    let effects = session.update(Message::HistoryItemAdded {
        id: load_id,
        item: failure,
    });
    assert!(effects.is_empty(), "internal errors are not saved");
    assert_eq!(session.history().lookback(1).unwrap().kind, ItemKind::InternalError);
}

#[test]
fn test_loaded_history_goes_before_the_session() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("history").to_string_lossy().into_owned();
    let mut session = ShellSession::new(ShellOptions::builder().history_file(file).build());
    let load_id = match session.init().pop() {
        Some(Effect::LoadHistory { id }) => id,
        other => panic!("expected a load effect, got {other:?}"),
    };

    let mut old = HistoryItem::new("> ", "old command", ItemStatus::Success);
    old.loaded = true;
    let _ = session.update(Message::HistoryLoaded {
        id: session.id(),
        items: vec![old.clone()],
    });
    assert!(session.history().is_empty(), "addressed to the wrong instance");

    let _ = session.update(Message::HistoryLoaded {
        id: load_id,
        items: vec![old, HistoryItem::restored_marker()],
    });
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.history().line_at(2), "old command");
}

#[test]
fn test_view_waits_for_size() {
    let mut session = ShellSession::new(ShellOptions::builder().no_history().build());
    let _ = session.init();
    assert_eq!(session.view().lines(false), ["Waiting for window size..."]);

    let _ = session.update(Message::resize(40, 10));
    let view = session.view();
    assert!(view.ready);
    assert_eq!(view.lines(false).last().unwrap(), "> Enter your command here...");
    assert_eq!(view.cursor_column(), 2);
}

#[test]
fn test_inline_prints_finished_commands() {
    let mut session = new_session(ShellOptions::builder().no_history().inline().build());
    type_text(&mut session, "ls");
    let request = execute_request(session.update(key(KeyCode::Enter)));
    assert!(!session.view().show_input, "input hidden while the command runs");

    let mut item = request.item().clone();
    item.finished = Some(Utc::now());
    item.status = ItemStatus::Success;
    let effects = session.update(Message::CommandFinished {
        id: session.id(),
        item,
    });

    let printed = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::Print(text) => Some(text.clone()),
            _ => None,
        })
        .expect("a print effect");
    assert!(printed.starts_with("> ls"));
    assert!(session.view().history.is_empty(), "printed items leave the view");
    assert!(session.view().show_input);
}

// ============================================================================
// History lookback
// ============================================================================

#[test]
fn test_lookback_skips_repeated_lines() {
    let mut session = no_history();
    for line in ["a", "b", "a"] {
        let _ = run_line(&mut session, line);
    }
    type_text(&mut session, "dra");

    let _ = session.update(key(KeyCode::Up));
    assert_eq!(session.mode(), Some(ModeKind::HistoryLookback));
    assert_eq!(session.input(), "a");

    let _ = session.update(key(KeyCode::Up));
    assert_eq!(session.input(), "b");
    let _ = session.update(key(KeyCode::Up));
    assert_eq!(session.input(), "a");
    let _ = session.update(key(KeyCode::Up));
    assert_eq!(session.input(), "a", "oldest entry stays shown");

    let _ = session.update(key(KeyCode::Down));
    assert_eq!(session.input(), "b");
    let _ = session.update(key(KeyCode::Down));
    assert_eq!(session.input(), "a");
    let _ = session.update(key(KeyCode::Down));
    assert_eq!(session.mode(), Some(ModeKind::CommandEntry));
    assert_eq!(session.input(), "dra", "draft restored");
}

#[test]
fn test_lookback_left_edits_the_shown_line() {
    let mut session = no_history();
    let _ = run_line(&mut session, "echo hello");

    let _ = session.update(key(KeyCode::Up));
    let _ = session.update(key(KeyCode::Left));
    assert_eq!(session.mode(), Some(ModeKind::CommandEntry));
    assert_eq!(session.input(), "echo hello");
    assert_eq!(session.cursor(), "echo hello".len() - 1);

    type_text(&mut session, "!");
    assert_eq!(session.input(), "echo hell!o");
}

#[test]
fn test_lookback_enter_runs_the_shown_line() {
    let mut session = no_history();
    let _ = run_line(&mut session, "pwd");

    let _ = session.update(key(KeyCode::Up));
    let request = execute_request(session.update(key(KeyCode::Enter)));
    assert_eq!(request.item().line, "pwd");
    assert_eq!(session.history().len(), 2);
}

#[test]
fn test_up_without_history_stays_in_entry() {
    let mut session = no_history();
    let _ = session.update(key(KeyCode::Up));
    assert_eq!(session.mode(), Some(ModeKind::CommandEntry));
}

// ============================================================================
// History search
// ============================================================================

#[test]
fn test_incremental_search() {
    let mut session = no_history();
    for line in ["git status", "ls", "git log"] {
        let _ = run_line(&mut session, line);
    }
    type_text(&mut session, "draft");

    let _ = session.update(ctrl('r'));
    assert_eq!(session.mode(), Some(ModeKind::HistorySearch));
    assert_eq!(session.input(), "draft");

    type_text(&mut session, "git");
    assert_eq!(session.input(), "git log");
    match session.view().overlay {
        Some(Overlay::Search { prompt, query, .. }) => {
            assert_eq!(prompt, "bck-i-search: ");
            assert_eq!(query, "git");
        }
        other => panic!("expected the search overlay, got {other:?}"),
    }

    let _ = session.update(ctrl('r'));
    assert_eq!(session.input(), "git status");

    let _ = session.update(ctrl('s'));
    assert_eq!(session.input(), "git log");

    type_text(&mut session, "zzz");
    assert_eq!(session.input(), "git log", "a failed search keeps the shown line");
    match session.view().overlay {
        Some(Overlay::Search { prompt, .. }) => assert_eq!(prompt, "failing fwd-i-search: "),
        other => panic!("expected the search overlay, got {other:?}"),
    }

    let _ = session.update(key(KeyCode::Esc));
    assert_eq!(session.mode(), Some(ModeKind::CommandEntry));
    assert_eq!(session.input(), "draft");
}

#[test]
fn test_search_enter_runs_the_match() {
    let mut session = no_history();
    for line in ["cargo build", "ls"] {
        let _ = run_line(&mut session, line);
    }

    let _ = session.update(ctrl('r'));
    type_text(&mut session, "carg");
    let request = execute_request(session.update(key(KeyCode::Enter)));
    assert_eq!(request.item().line, "cargo build");
    assert_eq!(session.mode(), Some(ModeKind::CommandRunning));
}

// ============================================================================
// Autocomplete
// ============================================================================

#[test]
fn test_single_option_is_accepted() {
    let mut session = no_history();
    type_text(&mut session, "he");

    let effects = session.update(key(KeyCode::Tab));
    assert_eq!(session.mode(), Some(ModeKind::AutoComplete));
    let request = completion_request(&effects);
    assert_eq!(request.line, "he");

    let effects = session.update(Message::CompletionReady {
        id: request.target,
        seq: request.seq,
        result: options(&[("help", Some("Show help"))]),
    });
    let follow_up = effects
        .into_iter()
        .find_map(|effect| match effect {
            Effect::Emit(message) => Some(message),
            _ => None,
        })
        .expect("single completion follow-up");

    let _ = session.update(follow_up);
    assert_eq!(session.mode(), Some(ModeKind::CommandEntry));
    assert_eq!(session.input(), "help ");
    assert_eq!(session.cursor(), 5);
}

#[test]
fn test_choosing_between_options() {
    let mut session = no_history();
    type_text(&mut session, "git st");

    let request = completion_request(&session.update(key(KeyCode::Tab)));
    assert_eq!(request.line, "git st");
    let _ = session.update(Message::CompletionReady {
        id: request.target,
        seq: request.seq,
        result: CompletionResult {
            directive: Directive::NO_SPACE,
            ..options(&[("stash", Some("Stash changes")), ("status", Some("Show status"))])
        },
    });

    match session.view().overlay {
        Some(Overlay::Suggestions(list)) => {
            assert!(list.annotated);
            assert_eq!(list.rows.len(), 2);
            assert!(list.rows[0][0].selected);
        }
        other => panic!("expected suggestions, got {other:?}"),
    }

    let _ = session.update(key(KeyCode::Tab));
    let _ = session.update(key(KeyCode::Enter));
    assert_eq!(session.mode(), Some(ModeKind::CommandEntry));
    assert_eq!(session.input(), "git status", "no space added");
}

#[test]
fn test_no_options_returns_to_entry() {
    let mut session = no_history();
    type_text(&mut session, "zz");

    let request = completion_request(&session.update(key(KeyCode::Tab)));
    let _ = session.update(Message::CompletionReady {
        id: request.target,
        seq: request.seq,
        result: CompletionResult::default(),
    });
    assert_eq!(session.mode(), Some(ModeKind::CommandEntry));
    assert_eq!(session.input(), "zz");
}

#[test]
fn test_stale_completion_is_dropped() {
    let mut session = no_history();
    type_text(&mut session, "he");

    let request = completion_request(&session.update(key(KeyCode::Tab)));
    let _ = session.update(key(KeyCode::Esc));
    assert_eq!(session.mode(), Some(ModeKind::CommandEntry));
    assert_eq!(session.input(), "he");

    let effects = session.update(Message::CompletionReady {
        id: request.target,
        seq: request.seq,
        result: options(&[("help", None)]),
    });
    assert!(effects.is_empty());
    assert_eq!(session.input(), "he");
}

#[test]
fn test_single_completion_for_an_abandoned_query_is_dropped() {
    let mut session = no_history();
    type_text(&mut session, "he");

    let first = completion_request(&session.update(key(KeyCode::Tab)));
    let (held_id, held_seq) = session
        .update(Message::CompletionReady {
            id: first.target,
            seq: first.seq,
            result: options(&[("help", None)]),
        })
        .into_iter()
        .find_map(|effect| match effect {
            Effect::Emit(Message::SingleCompletion { id, seq }) => Some((id, seq)),
            _ => None,
        })
        .expect("single completion follow-up");
    let held = || Message::SingleCompletion {
        id: held_id,
        seq: held_seq,
    };

    let _ = session.update(key(KeyCode::Esc));
    type_text(&mut session, "l");
    let second = completion_request(&session.update(key(KeyCode::Tab)));
    assert_eq!(second.line, "hel");

    assert!(session.update(held()).is_empty());
    assert_eq!(session.mode(), Some(ModeKind::AutoComplete));
    assert_eq!(session.input(), "hel");

    let effects = session.update(Message::CompletionReady {
        id: second.target,
        seq: second.seq,
        result: options(&[("hello", None), ("helm", None)]),
    });
    assert!(effects.is_empty());

    let _ = session.update(held());
    assert_eq!(session.mode(), Some(ModeKind::AutoComplete));
    assert_eq!(session.input(), "hel");
    assert!(matches!(session.view().overlay, Some(Overlay::Suggestions(_))));
}

#[test]
fn test_escape_from_suggestions_keeps_the_cursor() {
    let mut session = no_history();
    type_text(&mut session, "ec world");
    for _ in 0.."world".len() + 1 {
        let _ = session.update(key(KeyCode::Left));
    }

    let _ = completion_request(&session.update(key(KeyCode::Tab)));
    let _ = session.update(key(KeyCode::Esc));
    assert_eq!(session.mode(), Some(ModeKind::CommandEntry));
    assert_eq!(session.input(), "ec world");
    assert_eq!(session.cursor(), 2);
}

#[test]
fn test_typing_through_suggestions() {
    let mut session = no_history();
    type_text(&mut session, "s");

    let request = completion_request(&session.update(key(KeyCode::Tab)));
    let _ = session.update(Message::CompletionReady {
        id: request.target,
        seq: request.seq,
        result: options(&[("sleep", None), ("status", None)]),
    });

    type_text(&mut session, "l");
    assert_eq!(session.mode(), Some(ModeKind::CommandEntry));
    assert_eq!(session.input(), "sl");
}

#[test]
fn test_completion_keeps_text_after_the_cursor() {
    let mut session = no_history();
    type_text(&mut session, "ec world");
    for _ in 0.."world".len() + 1 {
        let _ = session.update(key(KeyCode::Left));
    }

    let request = completion_request(&session.update(key(KeyCode::Tab)));
    assert_eq!(request.line, "ec");
    let effects = session.update(Message::CompletionReady {
        id: request.target,
        seq: request.seq,
        result: options(&[("echo", None)]),
    });
    for effect in effects {
        if let Effect::Emit(message) = effect {
            let _ = session.update(message);
        }
    }

    assert_eq!(session.input(), "echo  world");
    assert_eq!(session.cursor(), 5);
}
