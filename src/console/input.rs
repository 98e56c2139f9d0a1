use std::io::{self, IsTerminal, Write};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::types::{MAX_PAPERS, MIN_PAPERS};

/// Prompt the user with a custom message and return the entered line (trimmed)
pub async fn prompt_user(prompt_text: &str) -> Result<String> {
    let prompt_text = prompt_text.to_string();
    tokio::task::spawn_blocking(move || -> Result<String> {
        print!("{prompt_text}");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line).context("failed to read from stdin")?;
        Ok(line.trim().to_string())
    })
    .await?
}

/// Prompt for a secret without echoing it; each typed character shows as `*`.
///
/// Falls back to a plain line read when stdin is not a terminal.
pub async fn prompt_secret(prompt_text: &str) -> Result<String> {
    if !io::stdin().is_terminal() {
        return prompt_user(prompt_text).await;
    }
    let prompt_text = prompt_text.to_string();
    tokio::task::spawn_blocking(move || -> Result<String> {
        print!("{prompt_text}");
        io::stdout().flush()?;
        terminal::enable_raw_mode()?;
        let secret = read_masked();
        terminal::disable_raw_mode()?;
        println!();
        secret
    })
    .await?
}

fn read_masked() -> Result<String> {
    let mut secret = String::new();
    let mut stdout = io::stdout();
    loop {
        let Event::Key(KeyEvent { code, modifiers, kind, .. }) = event::read()? else {
            continue;
        };
        if kind != KeyEventKind::Press {
            continue;
        }
        match code {
            KeyCode::Enter => break,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                anyhow::bail!("input cancelled");
            }
            KeyCode::Backspace => {
                if secret.pop().is_some() {
                    write!(stdout, "\u{8} \u{8}")?;
                }
            }
            KeyCode::Char(c) => {
                secret.push(c);
                write!(stdout, "*")?;
            }
            _ => {}
        }
        stdout.flush()?;
    }
    Ok(secret.trim().to_string())
}

/// Check if the input is a quit command
pub fn is_quit_command(input_text: &str) -> bool {
    matches!(input_text.trim().to_lowercase().as_str(), "/quit" | "/exit")
}

/// Parse a paper count, keeping `current` for blank or unparseable input and
/// clamping into the allowed range.
pub fn parse_paper_count(raw: &str, current: u8) -> u8 {
    let raw = raw.trim();
    if raw.is_empty() {
        return current;
    }
    match raw.parse::<i64>() {
        Ok(n) => n.clamp(i64::from(MIN_PAPERS), i64::from(MAX_PAPERS)) as u8,
        Err(_) => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_quit_commands() {
        assert!(is_quit_command("/quit"));
        assert!(is_quit_command(" /EXIT "));
        assert!(!is_quit_command("quit"));
    }

    #[test]
    fn paper_count_is_clamped() {
        assert_eq!(parse_paper_count("", 5), 5);
        assert_eq!(parse_paper_count("3", 5), 3);
        assert_eq!(parse_paper_count("0", 5), 1);
        assert_eq!(parse_paper_count("42", 5), 10);
        assert_eq!(parse_paper_count("many", 7), 7);
    }
}
