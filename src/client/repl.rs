use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::{Dashboard, View};

const HELP: &str = "\
commands:
  add <title> [| <description>]   create a todo
  toggle <n>                      flip done/pending for item n
  delete <n>                      delete item n (asks first)
  refresh                         reload the list
  logout                          end the session
  quit                            leave, staying logged in
";

/// Why the interactive loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Quit,
    LoggedOut,
    /// The server no longer accepts the session.
    SessionExpired,
}

enum Command {
    Add { title: String, description: String },
    Toggle(usize),
    Delete(usize),
    Refresh,
    Logout,
    Quit,
    Help,
}

fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let index = |rest: &str| -> Result<usize, String> {
        match rest.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n - 1),
            _ => Err(format!("expected an item number, got {rest:?}")),
        }
    };

    match word {
        "add" | "a" => {
            let (title, description) = rest.split_once('|').unwrap_or((rest, ""));
            Ok(Command::Add {
                title: title.trim().to_string(),
                description: description.trim().to_string(),
            })
        }
        "toggle" | "t" => index(rest).map(Command::Toggle),
        "delete" | "d" | "rm" => index(rest).map(Command::Delete),
        "refresh" | "list" | "ls" | "" => Ok(Command::Refresh),
        "logout" => Ok(Command::Logout),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        "help" | "?" => Ok(Command::Help),
        other => Err(format!("unknown command {other:?}, try `help`")),
    }
}

/// Drives a mounted dashboard from line-oriented input until the user
/// leaves or the session ends.
pub async fn run<R, W>(dashboard: &mut Dashboard, input: R, mut output: W) -> std::io::Result<Exit>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    output.write_all(dashboard.render().as_bytes()).await?;

    loop {
        output.write_all(b"> ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            return Ok(Exit::Quit);
        };

        let command = match parse(&line) {
            Ok(command) => command,
            Err(message) => {
                output.write_all(format!("{message}\n").as_bytes()).await?;
                continue;
            }
        };

        match command {
            Command::Add { title, description } => {
                dashboard.form.title = title;
                dashboard.form.description = description;
                dashboard.add().await;
            }
            Command::Toggle(n) => {
                let Some((id, done)) = dashboard.todos().get(n).map(|t| (t.id, t.is_done)) else {
                    output.write_all(b"no such item\n").await?;
                    continue;
                };
                dashboard.toggle(id, done).await;
            }
            Command::Delete(n) => {
                let Some(todo) = dashboard.todos().get(n) else {
                    output.write_all(b"no such item\n").await?;
                    continue;
                };
                let id = todo.id;
                let prompt = format!(
                    "Are you sure you want to delete \"{}\"? [y/N] ",
                    todo.title
                );
                output.write_all(prompt.as_bytes()).await?;
                output.flush().await?;

                let answer = lines.next_line().await?.unwrap_or_default();
                let confirmed = matches!(answer.trim(), "y" | "Y" | "yes");
                dashboard.delete(id, || confirmed).await;
            }
            Command::Refresh => dashboard.refresh().await,
            Command::Logout => {
                dashboard.logout().await;
                output.write_all(b"Logged out.\n").await?;
                return Ok(Exit::LoggedOut);
            }
            Command::Quit => return Ok(Exit::Quit),
            Command::Help => {
                output.write_all(HELP.as_bytes()).await?;
                continue;
            }
        }

        if dashboard.view() == View::RedirectToLogin {
            output
                .write_all(b"Session expired. Log in again with `todo-dashboard login`.\n")
                .await?;
            return Ok(Exit::SessionExpired);
        }
        output.write_all(dashboard.render().as_bytes()).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_description() {
        let Ok(Command::Add { title, description }) = parse("add Buy milk | 2 litres") else {
            panic!("expected add");
        };
        assert_eq!(title, "Buy milk");
        assert_eq!(description, "2 litres");
    }

    #[test]
    fn item_numbers_are_one_based() {
        assert!(matches!(parse("toggle 1"), Ok(Command::Toggle(0))));
        assert!(matches!(parse("delete 3"), Ok(Command::Delete(2))));
        assert!(parse("toggle 0").is_err());
        assert!(parse("delete x").is_err());
    }

    #[test]
    fn rejects_unknown_commands() {
        assert!(parse("frobnicate").is_err());
    }
}
