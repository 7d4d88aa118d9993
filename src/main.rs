// Demo terminal host for the shell engine
//
// Runs a shell with a handful of built-in commands on the current terminal.
// Pass `--inline` to keep finished commands in the terminal scrollback
// instead of taking over the screen. Set KODEGEN_SHELL_LOG to a file path to
// capture logs.

use std::fs::File;
use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use crossterm::event::{Event, EventStream};
use crossterm::terminal::{
    self, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{cursor, execute, queue};
use futures::StreamExt;
use futures::future::BoxFuture;
use kodegen_shell::{
    COMPLETE_REQUEST_CMD, CaptureWriter, CommandRouter, Directive, HostOutput, ShellOptions,
    ViewModel, spawn_shell,
};
use tokio_util::sync::CancellationToken;

const COMMANDS: &[(&str, &str)] = &[
    ("help", "List the available commands"),
    ("echo", "Print the arguments"),
    ("sleep", "Wait for a number of seconds"),
    ("count", "Count up to a number, slowly"),
    ("fail", "Return an error"),
    ("exit", "Leave the shell"),
];

// ============================================================================
// Built-in commands
// ============================================================================

struct DemoRouter;

impl DemoRouter {
    fn complete(args: &[String], out: &mut CaptureWriter) -> Result<()> {
        if let [word] = args {
            for (name, description) in COMMANDS {
                if name.starts_with(word.as_str()) {
                    writeln!(out, "{name}\t{description}")?;
                }
            }
        }
        writeln!(out, ":{}", Directive::NO_FILE_COMP.bits())?;
        Ok(())
    }

    fn parse_number(args: &[String], default: u64) -> Result<u64> {
        match args.first() {
            Some(arg) => arg
                .parse()
                .with_context(|| format!("expected a number, got {arg:?}")),
            None => Ok(default),
        }
    }

    async fn sleep(args: &[String], cancel: &CancellationToken) -> Result<()> {
        let seconds = Self::parse_number(args, 1)?;
        tokio::select! {
            () = tokio::time::sleep(Duration::from_secs(seconds)) => Ok(()),
            () = cancel.cancelled() => Err(anyhow!("interrupted")),
        }
    }

    async fn count(args: &[String], cancel: &CancellationToken, out: &mut CaptureWriter) -> Result<()> {
        let limit = Self::parse_number(args, 10)?;
        for n in 1..=limit {
            if cancel.is_cancelled() {
                bail!("interrupted at {n}");
            }
            writeln!(out, "{n}")?;
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        Ok(())
    }
}

impl CommandRouter for DemoRouter {
    fn dispatch<'a>(
        &'a self,
        args: Vec<String>,
        cancel: CancellationToken,
        mut out: CaptureWriter,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let Some((command, rest)) = args.split_first() else {
                return Ok(());
            };

            match command.as_str() {
                COMPLETE_REQUEST_CMD => Self::complete(rest, &mut out),
                "help" => {
                    for (name, description) in COMMANDS {
                        writeln!(out, "{name:<8}{description}")?;
                    }
                    Ok(())
                }
                "echo" => {
                    writeln!(out, "{}", rest.join(" "))?;
                    Ok(())
                }
                "sleep" => Self::sleep(rest, &cancel).await,
                "count" => Self::count(rest, &cancel, &mut out).await,
                "fail" => Err(anyhow!("the command failed as requested")),
                other => Err(anyhow!("unknown command {other:?}, try help")),
            }
        })
    }
}

// ============================================================================
// Terminal host
// ============================================================================

/// Owns the terminal modes and restores them on drop
struct Terminal {
    stdout: Stdout,
    inline: bool,
    /// Rows of the managed region painted last (inline mode)
    painted: u16,
}

impl Terminal {
    fn open(inline: bool) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if !inline {
            execute!(stdout, EnterAlternateScreen)?;
        }
        Ok(Self {
            stdout,
            inline,
            painted: 0,
        })
    }

    fn clear_managed(&mut self) -> Result<()> {
        if self.inline {
            if self.painted > 0 {
                queue!(self.stdout, cursor::MoveToPreviousLine(self.painted))?;
            } else {
                queue!(self.stdout, cursor::MoveToColumn(0))?;
            }
            queue!(self.stdout, terminal::Clear(ClearType::FromCursorDown))?;
        } else {
            queue!(
                self.stdout,
                terminal::Clear(ClearType::All),
                cursor::MoveTo(0, 0)
            )?;
        }
        self.painted = 0;
        Ok(())
    }

    fn paint(&mut self, view: &ViewModel) -> Result<()> {
        self.clear_managed()?;

        let width = usize::from(view.width.max(1));
        let lines = view.lines(self.inline);
        let last = lines.len().saturating_sub(1);
        for (index, line) in lines.iter().enumerate() {
            let visible: String = line.chars().take(width).collect();
            write!(self.stdout, "{visible}")?;
            if index < last {
                write!(self.stdout, "\r\n")?;
            }
        }
        self.painted = u16::try_from(last).unwrap_or(u16::MAX);

        // Park the cursor on the input line
        if view.show_input && !view.shutting_down && view.ready {
            let below = view.overlay.as_ref().map_or(0, |overlay| overlay.lines().len());
            let column = u16::try_from(view.cursor_column()).unwrap_or(u16::MAX);
            let up = u16::try_from(below).unwrap_or(u16::MAX);
            if up > 0 {
                queue!(self.stdout, cursor::MoveToPreviousLine(up))?;
                self.painted = self.painted.saturating_sub(up);
            }
            queue!(self.stdout, cursor::MoveToColumn(column), cursor::Show)?;
        } else {
            queue!(self.stdout, cursor::Hide)?;
        }

        self.stdout.flush()?;
        Ok(())
    }

    fn print(&mut self, text: &str) -> Result<()> {
        self.clear_managed()?;
        for line in text.split('\n') {
            write!(self.stdout, "{line}\r\n")?;
        }
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if !self.inline {
            let _ = execute!(self.stdout, LeaveAlternateScreen);
        }
        let _ = execute!(self.stdout, cursor::Show);
        let _ = disable_raw_mode();
    }
}

fn init_logging() -> Result<()> {
    let Ok(path) = std::env::var("KODEGEN_SHELL_LOG") else {
        return Ok(());
    };
    let file = File::create(&path).with_context(|| format!("unable to create log file {path}"))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let inline = std::env::args().skip(1).any(|arg| arg == "--inline");
    let mut builder = ShellOptions::builder()
        .history_file(".kodegen-shell-history")
        .placeholder("Type help and press enter");
    if inline {
        builder = builder.inline();
    }

    let mut term = Terminal::open(inline)?;
    let mut shell = spawn_shell(Arc::new(DemoRouter), builder.build());
    let (width, height) = terminal::size()?;
    shell.resize(width, height)?;

    let mut events = EventStream::new();
    loop {
        tokio::select! {
            output = shell.next_output() => match output {
                Some(HostOutput::Redraw(view)) => term.paint(&view)?,
                Some(HostOutput::Print(text)) => term.print(&text)?,
                Some(HostOutput::Quit) | None => break,
            },
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => shell.send_key(key)?,
                Some(Ok(Event::Resize(width, height))) => shell.resize(width, height)?,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    log::error!("Terminal event error: {e}");
                    shell.shutdown()?;
                }
                None => shell.shutdown()?,
            },
        }
    }

    drop(term);
    shell.wait().await?;
    Ok(())
}
