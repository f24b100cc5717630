//! Structural validation of a reconstructed descriptor before it is published.

use super::detect::source_text;
use super::model::{ScriptDescriptor, ScriptLanguage};
use crate::error::ScriptError;

/// Check that a descriptor is worth sending to the remote service.
pub fn validate_descriptor(descriptor: &ScriptDescriptor) -> Result<(), ScriptError> {
    let mut reasons = Vec::new();

    if descriptor.name.trim().is_empty() {
        reasons.push("Script name cannot be empty".to_string());
    }

    match source_text(descriptor) {
        Ok(source) => {
            if source.trim().is_empty() {
                reasons.push("Script source cannot be empty".to_string());
            } else if let Err(reason) = check_delimiters(&source, descriptor.language) {
                reasons.push(reason);
            }
        }
        Err(e) => reasons.push(e.to_string()),
    }

    if reasons.is_empty() {
        Ok(())
    } else {
        Err(ScriptError::ValidationRejected {
            name: descriptor.name.clone(),
            reasons,
        })
    }
}

/// What the scanner last saw, used to tell a regex or slashy-string `/` from division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preceding {
    Start,
    Operator,
    Operand,
}

/// Keywords after which an expression, and so a regex literal, may start.
const EXPRESSION_KEYWORDS: [&str; 14] = [
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

/// Bracket balance over code, skipping string, regex and slashy literals and comments.
fn check_delimiters(source: &str, language: ScriptLanguage) -> Result<(), String> {
    let mut scanner = Scanner::new(source, language);
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut preceding = Preceding::Start;

    while let Some(c) = scanner.bump() {
        let line = scanner.line;
        match c {
            c if c.is_whitespace() => {}
            '/' if scanner.peek(0) == Some('/') => scanner.skip_line_comment(),
            '/' if scanner.peek(0) == Some('*') => {
                scanner.bump();
                scanner.skip_block_comment(line)?;
            }
            '$' if language == ScriptLanguage::Groovy && scanner.peek(0) == Some('/') => {
                scanner.bump();
                scanner.skip_dollar_slashy(line)?;
                preceding = Preceding::Operand;
            }
            '/' if preceding != Preceding::Operand => {
                scanner.skip_slashed(line)?;
                preceding = Preceding::Operand;
            }
            '\'' | '"'
                if language == ScriptLanguage::Groovy
                    && scanner.peek(0) == Some(c)
                    && scanner.peek(1) == Some(c) =>
            {
                scanner.bump();
                scanner.bump();
                scanner.skip_triple_quoted(c, line)?;
                preceding = Preceding::Operand;
            }
            '"' | '\'' | '`' => {
                scanner.skip_quoted(c, line)?;
                preceding = Preceding::Operand;
            }
            '(' | '[' | '{' => {
                stack.push((c, line));
                preceding = Preceding::Operator;
            }
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {}
                    Some((open, open_line)) => {
                        return Err(format!(
                            "Mismatched '{}' on line {} closes '{}' from line {}",
                            c, line, open, open_line
                        ))
                    }
                    None => return Err(format!("Unexpected '{}' on line {}", c, line)),
                }
                preceding = if c == '}' {
                    Preceding::Operator
                } else {
                    Preceding::Operand
                };
            }
            c if is_word_char(c) => {
                let word = scanner.take_word(c);
                preceding = if EXPRESSION_KEYWORDS.contains(&word.as_str()) {
                    Preceding::Operator
                } else {
                    Preceding::Operand
                };
            }
            _ => preceding = Preceding::Operator,
        }
    }

    match stack.pop() {
        Some((open, open_line)) => Err(format!("Unclosed '{}' from line {}", open, open_line)),
        None => Ok(()),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Character cursor that keeps the current line number.
struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    language: ScriptLanguage,
}

impl Scanner {
    fn new(source: &str, language: ScriptLanguage) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            language,
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn take_word(&mut self, first: char) -> String {
        let mut word = String::from(first);
        while let Some(c) = self.peek(0).filter(|c| is_word_char(*c)) {
            word.push(c);
            self.bump();
        }
        word
    }

    /// Stops before the newline so the caller sees it.
    fn skip_line_comment(&mut self) {
        while self.peek(0).is_some_and(|c| c != '\n') {
            self.bump();
        }
    }

    fn skip_block_comment(&mut self, start: usize) -> Result<(), String> {
        while let Some(c) = self.bump() {
            if c == '*' && self.peek(0) == Some('/') {
                self.bump();
                return Ok(());
            }
        }
        Err(format!("Unterminated block comment (line {})", start))
    }

    /// `'...'` and `"..."` end at the line; template literals may span lines.
    fn skip_quoted(&mut self, quote: char, start: usize) -> Result<(), String> {
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    self.bump();
                }
                '\n' if quote != '`' => break,
                c if c == quote => return Ok(()),
                _ => {}
            }
        }
        Err(format!("Unterminated string literal (line {})", start))
    }

    /// Groovy `'''...'''` and `"""..."""`, which may span lines.
    fn skip_triple_quoted(&mut self, quote: char, start: usize) -> Result<(), String> {
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    self.bump();
                }
                c if c == quote && self.peek(0) == Some(quote) && self.peek(1) == Some(quote) => {
                    self.bump();
                    self.bump();
                    return Ok(());
                }
                _ => {}
            }
        }
        Err(format!("Unterminated string literal (line {})", start))
    }

    /// A JavaScript regex literal (single line, `/` allowed inside a class, trailing
    /// flags) or a Groovy slashy string (may span lines).
    fn skip_slashed(&mut self, start: usize) -> Result<(), String> {
        let javascript = self.language == ScriptLanguage::Javascript;
        let mut in_class = false;
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    self.bump();
                }
                '[' if javascript => in_class = true,
                ']' if javascript => in_class = false,
                '/' if !in_class => {
                    if javascript {
                        while self.peek(0).is_some_and(|f| f.is_ascii_alphabetic()) {
                            self.bump();
                        }
                    }
                    return Ok(());
                }
                '\n' if javascript => break,
                _ => {}
            }
        }
        Err(if javascript {
            format!("Unterminated regular expression (line {})", start)
        } else {
            format!("Unterminated slashy string (line {})", start)
        })
    }

    /// Groovy `$/.../$`; `$/` and `$$` are escapes inside it.
    fn skip_dollar_slashy(&mut self, start: usize) -> Result<(), String> {
        while let Some(c) = self.bump() {
            match c {
                '$' if matches!(self.peek(0), Some('/') | Some('$')) => {
                    self.bump();
                }
                '/' if self.peek(0) == Some('$') => {
                    self.bump();
                    return Ok(());
                }
                _ => {}
            }
        }
        Err(format!("Unterminated dollar-slashy string (line {})", start))
    }
}
