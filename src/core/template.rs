// src/core/template.rs

use crate::core::symbols::SymbolTable;

const OPEN_TAG: &str = "[#";
const CLOSE_TAG: &str = "#]";

/// Number of previously-read characters retained for position diagnostics.
const HISTORY_SIZE: usize = 20;

/// A lazy, single-pass character reader over a string.
///
/// Tracks line and column and keeps a short window of the characters already
/// read so parse failures can report where they happened.
#[derive(Debug)]
pub struct StringParser {
    chars: Vec<char>,
    next: usize,
    line: usize,
    column: usize,
    last_char: Option<char>,
    history: Vec<char>,
}

impl StringParser {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            next: 0,
            line: 1,
            column: 0,
            last_char: None,
            history: Vec::with_capacity(HISTORY_SIZE),
        }
    }

    /// True when every character has been consumed.
    pub fn eof(&self) -> bool {
        self.next >= self.chars.len()
    }

    /// The character the next `read` will return, without advancing.
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.next).copied()
    }

    /// Read and return the next character, updating position tracking.
    pub fn read(&mut self) -> Option<char> {
        if self.last_char == Some('\n') {
            self.line += 1;
            self.column = 0;
        }

        let ch = self.chars.get(self.next).copied()?;
        self.next += 1;
        self.column += 1;
        self.last_char = Some(ch);

        if self.history.len() == HISTORY_SIZE {
            self.history.remove(0);
        }
        self.history.push(ch);

        Some(ch)
    }

    /// Consume the given number of characters.
    pub fn skip(&mut self, count: usize) {
        for _ in 0..count {
            if self.read().is_none() {
                break;
            }
        }
    }

    /// Read every character up to, but not including, the given pattern.
    ///
    /// Stops at the pattern or at EOF, whichever comes first. Returns `None`
    /// when nothing was read before the stop condition.
    pub fn read_to_pattern(&mut self, pattern: &str) -> Option<String> {
        let pattern: Vec<char> = pattern.chars().collect();
        let first = *pattern.first()?;
        let mut buffer = String::new();

        loop {
            let Some(next) = self.peek() else {
                return if buffer.is_empty() { None } else { Some(buffer) };
            };

            if next == first && self.lookahead_matches(&pattern) {
                return if buffer.is_empty() { None } else { Some(buffer) };
            }

            // move on
            if let Some(ch) = self.read() {
                buffer.push(ch);
            }
        }
    }

    fn lookahead_matches(&self, pattern: &[char]) -> bool {
        pattern
            .iter()
            .enumerate()
            .all(|(i, &p)| self.chars.get(self.next + i) == Some(&p))
    }

    /// A diagnostic string describing where the parser currently is.
    ///
    /// The history window shows the characters read since the last newline,
    /// capped at the retained window size.
    pub fn position(&self) -> String {
        let window: String = self
            .history
            .iter()
            .rev()
            .take_while(|&&c| c != '\n')
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        let next = match self.peek() {
            Some(c) => format!("'{}'", c),
            None => "EOF".to_string(),
        };

        format!(
            "line {}, char {}: ...{}... next char: {}",
            self.line, self.column, window, next
        )
    }
}

/// Expands a template string against a symbol table.
///
/// The engine searches for tags delimited by `[#` and `#]` and replaces the
/// tokens inside them; text outside tags is passed through verbatim. A token
/// starting with `$` is a symbol lookup (an unknown symbol resolves to the
/// literal `"null"`); bare tokens produce no output. The output of a
/// substitution is never re-scanned.
#[derive(Debug)]
pub struct Template<'a> {
    parser: StringParser,
    symbols: &'a SymbolTable,
}

impl<'a> Template<'a> {
    pub fn new(source: &str, symbols: &'a SymbolTable) -> Self {
        Self {
            parser: StringParser::new(source),
            symbols,
        }
    }

    /// Resolve the tokens of a single tag body.
    fn resolve(tag: &str, symbols: &SymbolTable) -> String {
        let mut retval = String::new();
        for token in tag.split_whitespace() {
            if let Some(key) = token.strip_prefix('$') {
                retval.push_str(&symbols.get(key));
            }
            // Bare tokens are reserved and expand to nothing.
        }
        retval
    }

    /// Expand the template into its final string.
    ///
    /// An unterminated tag is not an error: the output is closed with an
    /// in-band diagnostic marker and expansion stops, so callers always see
    /// the partial expansion.
    pub fn expand(mut self) -> String {
        let mut buffer = String::new();

        while !self.parser.eof() {
            if let Some(text) = self.parser.read_to_pattern(OPEN_TAG) {
                buffer.push_str(&text);
            }

            if self.parser.eof() {
                break;
            }

            self.parser.skip(OPEN_TAG.len());
            let tag = self.parser.read_to_pattern(CLOSE_TAG);

            if self.parser.eof() {
                buffer.push_str(&format!(
                    "TEMPLATE ERROR: reached EOF before finding closing delimiter '{}' at {}",
                    CLOSE_TAG,
                    self.parser.position()
                ));
                return buffer;
            }

            self.parser.skip(CLOSE_TAG.len());

            if let Some(tag) = tag {
                buffer.push_str(&Self::resolve(&tag, self.symbols));
            }
        }

        buffer
    }
}

/// Convenience wrapper: expand `source` against `symbols` in one call.
pub fn expand(source: &str, symbols: &SymbolTable) -> String {
    Template::new(source, symbols).expand()
}
