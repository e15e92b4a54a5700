//! Shell-style command line tokenization
//!
//! Splits one command line into an argument vector using POSIX-like word
//! rules. No expansion happens: `$VAR`, globs, and redirections are passed
//! through as literal text.

use thiserror::Error;

/// Tokenization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("unterminated single quote starting at byte {0}")]
    UnterminatedSingleQuote(usize),

    #[error("unterminated double quote starting at byte {0}")]
    UnterminatedDoubleQuote(usize),

    #[error("trailing backslash at end of command")]
    TrailingBackslash,

    #[error("empty command")]
    EmptyCommand,
}

/// Turns a command line into an argument vector
pub trait CommandTokenizer: Send + Sync {
    /// Split `line` into program and arguments. The result is never empty.
    fn parse(&self, line: &str) -> Result<Vec<String>, TokenizeError>;
}

/// Word splitting with single quotes, double quotes and backslash escapes
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellTokenizer;

impl CommandTokenizer for ShellTokenizer {
    fn parse(&self, line: &str) -> Result<Vec<String>, TokenizeError> {
        split(line)
    }
}

/// Characters a backslash escapes inside double quotes
fn escapable_in_double_quotes(c: char) -> bool {
    matches!(c, '"' | '\\' | '$' | '`' | '\n')
}

/// Split a command line into words.
pub fn split(line: &str) -> Result<Vec<String>, TokenizeError> {
    let mut words = Vec::new();
    let mut current = String::new();
    // A word can be empty (`''`), so track whether one has started.
    let mut in_word = false;
    let mut chars = line.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some((_, '\'')) => break,
                        Some((_, c)) => current.push(c),
                        None => return Err(TokenizeError::UnterminatedSingleQuote(pos)),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => match chars.peek() {
                            Some(&(_, next)) if escapable_in_double_quotes(next) => {
                                chars.next();
                                // backslash-newline is a line continuation
                                if next != '\n' {
                                    current.push(next);
                                }
                            }
                            Some(_) => current.push('\\'),
                            None => return Err(TokenizeError::UnterminatedDoubleQuote(pos)),
                        },
                        Some((_, c)) => current.push(c),
                        None => return Err(TokenizeError::UnterminatedDoubleQuote(pos)),
                    }
                }
            }
            '\\' => match chars.next() {
                Some((_, '\n')) => {}
                Some((_, next)) => {
                    in_word = true;
                    current.push(next);
                }
                None => return Err(TokenizeError::TrailingBackslash),
            },
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }

    if words.is_empty() {
        return Err(TokenizeError::EmptyCommand);
    }

    Ok(words)
}
