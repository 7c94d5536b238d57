use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::error;

use dualpane::{Commander, Side};

const HELP: &str = "\
Commands act on the focused pane (local or remote).

  ls              show both panes
  local | remote  focus a pane
  select <n>      select entry number <n>
  open [name]     open the selected or named entry:
                  a directory is entered, a file is copied to the
                  other pane (local uploads, remote downloads)
  rm              delete the selected file
  exec <code>     run PHP code on the remote host
  pwd             show both current directories
  help            show this text
  quit            leave

There is NO overwrite or delete confirmation.
Whole directories cannot be uploaded or downloaded.";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    List,
    Focus(Side),
    Select(usize),
    Open(Option<String>),
    Delete,
    Execute(String),
    Pwd,
    Quit,
    Empty,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word {
        "" => Command::Empty,
        "help" | "?" => Command::Help,
        "ls" => Command::List,
        "local" => Command::Focus(Side::Local),
        "remote" => Command::Focus(Side::Remote),
        "select" => match rest.parse() {
            Ok(index) => Command::Select(index),
            Err(_) => Command::Unknown(line.to_string()),
        },
        "open" if rest.is_empty() => Command::Open(None),
        "open" => Command::Open(Some(rest.to_string())),
        "rm" => Command::Delete,
        "exec" if !rest.is_empty() => Command::Execute(rest.to_string()),
        "pwd" => Command::Pwd,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

fn render_pane(commander: &Commander, side: Side) -> String {
    let pane = commander.pane(side);
    let marker = if commander.focus() == side { "*" } else { " " };
    let mut out = format!(
        "{} {} [{}]\n",
        marker,
        side,
        pane.source().current_directory()
    );

    for (index, entry) in pane.listing().entries.iter().enumerate() {
        let cursor = if index == pane.selected() { ">" } else { " " };
        out.push_str(&format!(
            "{} {:>3}  {:<40} {:>10}\n",
            cursor, index, entry.name, entry.display_size
        ));
    }

    out
}

/// Read commands from stdin until `quit` or end of input
pub async fn run(mut commander: Commander) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout.write_all(HELP.as_bytes()).await?;
    stdout.write_all(b"\n\n").await?;

    loop {
        let prompt = format!("[{}] {}> ", commander.status(), commander.focus());
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let output = match parse_command(&line) {
            Command::Quit => break,
            Command::Empty => continue,
            Command::Help => HELP.to_string(),
            Command::List => format!(
                "{}\n{}",
                render_pane(&commander, Side::Local),
                render_pane(&commander, Side::Remote)
            ),
            Command::Focus(side) => {
                commander.set_focus(side);
                render_pane(&commander, side)
            }
            Command::Select(index) => {
                let side = commander.focus();
                commander.select(side, index);
                render_pane(&commander, side)
            }
            Command::Open(name) => {
                let side = commander.focus();
                let entry = match name {
                    Some(name) => commander.pane(side).listing().find(&name).cloned(),
                    None => commander.selected_entry(side).cloned(),
                };
                match entry {
                    Some(entry) => match commander.handle_activate(side, entry).await {
                        Ok(()) => format!(
                            "{}\n{}",
                            render_pane(&commander, Side::Local),
                            render_pane(&commander, Side::Remote)
                        ),
                        Err(e) => failure(&e),
                    },
                    None => "no such entry".to_string(),
                }
            }
            Command::Delete => match commander.handle_delete().await {
                Ok(()) => render_pane(&commander, commander.focus()),
                Err(e) => failure(&e),
            },
            Command::Execute(code) => match commander.execute_code(&code).await {
                Ok(result) => result,
                Err(e) => failure(&e),
            },
            Command::Pwd => format!(
                "local:  {}\nremote: {}",
                commander.pane(Side::Local).source().current_directory(),
                commander.pane(Side::Remote).source().current_directory()
            ),
            Command::Unknown(line) => format!("unknown command: {} (try help)", line),
        };

        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }

    Ok(())
}

fn failure(e: &dualpane::BrowserError) -> String {
    error!("{}", e);
    format!("error: {}", e)
}
