//! Token classification.
//!
//! The lexer only looks at the shape of each raw string. Whether `-cfast` is a
//! cluster of flags or `-c` with a glued value is decided later by the matcher,
//! which knows each letter's arity.

/// Shape of a single raw argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `--name` or `--name=value`.
    LongFlag,
    /// `-c` or `-c=value`.
    ShortFlag,
    /// `-abc` / `-cfast`.
    ShortCluster,
    /// The literal `--`.
    Separator,
    /// Anything else, and everything after a separator.
    Bare,
}

/// A classified raw argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// The raw argument as it appeared in argv.
    pub raw: &'a str,
    /// Value after `=` for `--name=value` and `-c=value`.
    pub inline_value: Option<&'a str>,
    /// Index of the raw argument in argv.
    pub index: usize,
}

impl<'a> Token<'a> {
    /// Long name without the leading dashes (`LongFlag` only).
    pub fn long_name(&self) -> Option<&'a str> {
        if self.kind != TokenKind::LongFlag {
            return None;
        }
        let body = &self.raw[2..];
        Some(body.split_once('=').map_or(body, |(name, _)| name))
    }

    /// Letter of a `ShortFlag`.
    pub fn short_letter(&self) -> Option<char> {
        if self.kind != TokenKind::ShortFlag {
            return None;
        }
        self.raw[1..].chars().next()
    }

    /// Everything after the leading `-` of a `ShortCluster`.
    pub fn cluster(&self) -> Option<&'a str> {
        (self.kind == TokenKind::ShortCluster).then(|| &self.raw[1..])
    }

    /// Whether this token ends a greedy multi-value run.
    pub fn is_flag_like(&self) -> bool {
        !matches!(self.kind, TokenKind::Bare)
    }

    /// Display form of the flag this token names (`--out`, `-o`), or the raw
    /// text for bare tokens.
    pub fn flag_text(&self) -> &'a str {
        match self.kind {
            TokenKind::LongFlag | TokenKind::ShortFlag => self
                .raw
                .split_once('=')
                .map_or(self.raw, |(flag, _)| flag),
            _ => self.raw,
        }
    }
}

/// Lazy classifier over a borrowed argv.
///
/// Cloning a lexer restarts iteration from the clone's position.
#[derive(Debug, Clone)]
pub struct Lexer<'a, S> {
    args: &'a [S],
    pos: usize,
    after_separator: bool,
}

impl<'a, S: AsRef<str>> Lexer<'a, S> {
    pub fn new(args: &'a [S]) -> Self {
        Self {
            args,
            pos: 0,
            after_separator: false,
        }
    }

    /// Whether a `--` separator has been produced.
    pub fn after_separator(&self) -> bool {
        self.after_separator
    }
}

impl<'a, S: AsRef<str>> Iterator for Lexer<'a, S> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.args.get(self.pos)?.as_ref();
        let index = self.pos;
        self.pos += 1;

        let token = if self.after_separator {
            bare(raw, index)
        } else if raw == "--" {
            self.after_separator = true;
            Token {
                kind: TokenKind::Separator,
                raw,
                inline_value: None,
                index,
            }
        } else {
            classify(raw, index)
        };
        tracing::trace!(index, raw, kind = ?token.kind, "classified token");
        Some(token)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.args.len().saturating_sub(self.pos);
        (left, Some(left))
    }
}

fn bare(raw: &str, index: usize) -> Token<'_> {
    Token {
        kind: TokenKind::Bare,
        raw,
        inline_value: None,
        index,
    }
}

fn classify(raw: &str, index: usize) -> Token<'_> {
    if let Some(body) = raw.strip_prefix("--") {
        return Token {
            kind: TokenKind::LongFlag,
            raw,
            inline_value: body.split_once('=').map(|(_, value)| value),
            index,
        };
    }

    let Some(body) = raw.strip_prefix('-') else {
        return bare(raw, index);
    };
    let mut chars = body.chars();
    let Some(letter) = chars.next() else {
        // A lone `-` conventionally means stdin.
        return bare(raw, index);
    };
    let rest = &body[letter.len_utf8()..];

    if rest.is_empty() {
        Token {
            kind: TokenKind::ShortFlag,
            raw,
            inline_value: None,
            index,
        }
    } else if let Some(value) = rest.strip_prefix('=') {
        Token {
            kind: TokenKind::ShortFlag,
            raw,
            inline_value: Some(value),
            index,
        }
    } else {
        Token {
            kind: TokenKind::ShortCluster,
            raw,
            inline_value: None,
            index,
        }
    }
}

/// Classify every raw argument eagerly.
pub fn tokenize<S: AsRef<str>>(args: &[S]) -> Vec<Token<'_>> {
    Lexer::new(args).collect()
}
