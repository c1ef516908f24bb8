use std::ops::Range;

use logos::Logos;

use crate::{
    ast::Constant,
    interpreter::{evaluator::function::core::is_builtin, timezone, units},
};

/// Raw lexical shapes recognized by the scanner.
///
/// The raw scan only decides where tokens begin and end. Whether digits form a
/// date or a number, and whether an identifier is a unit, a timezone or a
/// variable, is settled afterwards by [`tokenize`].
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Raw {
    /// `DD.MM.YYYYTHH:MM` or `DD/MM/YYYYTHH:MM`
    #[regex(r"[0-9]{1,2}[./][0-9]{1,2}[./][0-9]{4}T[0-9]{1,2}:[0-9]{2}")]
    DateTime,
    /// `DD.MM.YYYY` or `DD/MM/YYYY`
    #[regex(r"[0-9]{1,2}[./][0-9]{1,2}[./][0-9]{4}")]
    Date,
    /// `HH:MM`
    #[regex(r"[0-9]{1,2}:[0-9]{2}")]
    Time,
    /// Numeric literals such as `42`, `3.14` or `2.1e-10`.
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,
    #[regex(r#""([^"\\]|\\.)*""#, allow_greedy = true)]
    DoubleQuoted,
    #[regex(r"'([^'\\]|\\.)*'", allow_greedy = true)]
    SingleQuoted,
    /// Backtick strings, the only kind that interpolates `${...}`.
    #[regex(r"`([^`\\]|\\.)*`", allow_greedy = true)]
    Template,
    #[regex(r"[\p{L}_][\p{L}\p{N}_]*")]
    Identifier,
    #[regex(r"[$€£¥]")]
    CurrencySymbol,
    /// `# Comments.`
    #[regex(r"#[^\n]*", logos::skip, allow_greedy = true)]
    Comment,
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Whitespace,
    #[regex(r"&&+")]
    AndAnd,
    #[regex(r"\|\|+")]
    OrOr,
    #[token("&")]
    Ampersand,
    #[token("|")]
    Pipe,
    #[token("<<")]
    ShiftLeft,
    #[token(">>")]
    ShiftRight,
    #[token("**")]
    StarStar,
    #[token("=>")]
    Arrow,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    BangEqual,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,
    #[token("%")]
    Percent,
    #[token("=")]
    Equals,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
}

/// Pieces a rejected date or time literal falls back to.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Fragment {
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,
    #[token(".")]
    Dot,
    #[token("/")]
    Slash,
    #[token(":")]
    Colon,
}

/// Reserved words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    To,
    In,
    As,
    Of,
    Is,
    True,
    False,
    Null,
    Now,
    Today,
    Tomorrow,
    Yesterday,
    Total,
    Sum,
    Average,
    Avg,
}

impl Keyword {
    /// Looks up a keyword by its exact spelling.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "to" => Self::To,
            "in" => Self::In,
            "as" => Self::As,
            "of" => Self::Of,
            "is" => Self::Is,
            "true" => Self::True,
            "false" => Self::False,
            "null" => Self::Null,
            "now" => Self::Now,
            "today" => Self::Today,
            "tomorrow" => Self::Tomorrow,
            "yesterday" => Self::Yesterday,
            "total" => Self::Total,
            "sum" => Self::Sum,
            "average" => Self::Average,
            "avg" => Self::Avg,
            _ => return None,
        })
    }

    /// Source spelling.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::To => "to",
            Self::In => "in",
            Self::As => "as",
            Self::Of => "of",
            Self::Is => "is",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::Now => "now",
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::Yesterday => "yesterday",
            Self::Total => "total",
            Self::Sum => "sum",
            Self::Average => "average",
            Self::Avg => "avg",
        }
    }

    /// `to`, `in` and `as`.
    #[must_use]
    pub const fn is_conversion(self) -> bool {
        matches!(self, Self::To | Self::In | Self::As)
    }
}

/// Which quote delimited a string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    /// `"..."`
    Double,
    /// `'...'`
    Single,
    /// `` `...` ``, with `${...}` interpolation.
    Template,
}

/// A piece of a string literal as scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text with escapes resolved.
    Text(String),
    /// Source of an interpolated expression and the offset where it starts.
    Interpolation {
        source: String,
        offset: usize,
    },
}

/// A scanned string literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    pub kind:     StringKind,
    pub segments: Vec<Segment>,
}

/// A classified token. Every token is paired with its byte offset in the
/// source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Numeric literal text.
    Number(String),
    /// Validated date literal text (`15.03.2024`).
    Date(String),
    /// Validated time literal text (`14:30`).
    Time(String),
    /// Validated datetime literal text (`15.03.2024T14:30`).
    DateTime(String),
    Str(StringLiteral),
    Variable(String),
    /// Name of a built-in function.
    Function(String),
    Keyword(Keyword),
    Unit(String),
    /// Currency code; symbols are already mapped to their code.
    Currency(String),
    Timezone(String),
    /// Mathematical constant spelling (`pi`, `π`, `e`, ...).
    Constant(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    /// `mod`; always modulo, never a percent sign.
    Mod,
    Ampersand,
    Pipe,
    ShiftLeft,
    ShiftRight,
    And,
    Or,
    Not,
    Equals,
    PlusAssign,
    MinusAssign,
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Question,
    Colon,
    Arrow,
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Eof,
}

impl Token {
    /// Name carried by tokens that may be used as a binding name.
    ///
    /// Units, timezones and constants are accepted so that `d = 3`,
    /// `tokyo = ...` or `e => e * 2` work; the binding shadows the builtin
    /// meaning when looked up as a variable.
    #[must_use]
    pub fn binding_name(&self) -> Option<&str> {
        match self {
            Self::Variable(name) | Self::Unit(name) | Self::Timezone(name) | Self::Constant(name) => {
                Some(name)
            },
            _ => None,
        }
    }

    /// Returns `true` for tokens that can name a unit in a unit position.
    ///
    /// Builtin function names that are also units (`min`) qualify; the caller
    /// decides whether a following `(` makes them a call instead.
    #[must_use]
    pub fn unit_name(&self) -> Option<&str> {
        match self {
            Self::Unit(name) | Self::Currency(name) => Some(name),
            Self::Function(name) if units::lookup(name).is_some() => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Number(text)
            | Self::Date(text)
            | Self::Time(text)
            | Self::DateTime(text)
            | Self::Variable(text)
            | Self::Function(text)
            | Self::Unit(text)
            | Self::Currency(text)
            | Self::Timezone(text)
            | Self::Constant(text) => return write!(f, "'{text}'"),
            Self::Keyword(keyword) => return write!(f, "'{}'", keyword.name()),
            Self::Str(_) => "string literal",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Slash => "'/'",
            Self::Caret => "'^'",
            Self::Percent => "'%'",
            Self::Mod => "'mod'",
            Self::Ampersand => "'&'",
            Self::Pipe => "'|'",
            Self::ShiftLeft => "'<<'",
            Self::ShiftRight => "'>>'",
            Self::And => "'and'",
            Self::Or => "'or'",
            Self::Not => "'not'",
            Self::Equals => "'='",
            Self::PlusAssign => "'+='",
            Self::MinusAssign => "'-='",
            Self::EqualEqual => "'=='",
            Self::BangEqual => "'!='",
            Self::Less => "'<'",
            Self::LessEqual => "'<='",
            Self::Greater => "'>'",
            Self::GreaterEqual => "'>='",
            Self::Question => "'?'",
            Self::Colon => "':'",
            Self::Arrow => "'=>'",
            Self::Dot => "'.'",
            Self::Comma => "','",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::Eof => "end of input",
        };
        write!(f, "{text}")
    }
}

/// Turns source text into classified tokens, terminated by [`Token::Eof`].
///
/// Never fails: characters the scanner does not recognize are skipped.
///
/// # Example
/// ```
/// use tally::interpreter::lexer::{Token, tokenize};
///
/// let tokens: Vec<Token> = tokenize("5 km in miles").into_iter().map(|(t, _)| t).collect();
/// assert_eq!(tokens[1], Token::Unit("km".to_string()));
/// assert_eq!(tokens.last(), Some(&Token::Eof));
/// ```
#[must_use]
pub fn tokenize(source: &str) -> Vec<(Token, usize)> {
    let mut out = Vec::new();
    refine(source, 0, &mut out);
    out.push((Token::Eof, source.len()));
    out
}

fn refine(source: &str, base: usize, out: &mut Vec<(Token, usize)>) {
    let raw: Vec<(Raw, Range<usize>)> = Raw::lexer(source).spanned()
                                                          .filter_map(|(raw, span)| {
                                                              raw.ok().map(|raw| (raw, span))
                                                          })
                                                          .collect();
    let mut refiner = Refiner { source,
                                base,
                                raw: &raw,
                                pos: 0,
                                out };
    refiner.run();
}

struct Refiner<'s, 'o> {
    source: &'s str,
    base:   usize,
    raw:    &'s [(Raw, Range<usize>)],
    pos:    usize,
    out:    &'o mut Vec<(Token, usize)>,
}

impl Refiner<'_, '_> {
    fn run(&mut self) {
        let source = self.source;
        while let Some((raw, span)) = self.raw.get(self.pos).cloned() {
            self.pos += 1;
            let text = &source[span.clone()];
            let offset = self.base + span.start;
            match raw {
                Raw::DateTime => self.datetime(text, offset),
                Raw::Date => self.date(text, offset),
                Raw::Time => self.time(text, offset),
                Raw::Number => self.push(Token::Number(text.to_string()), offset),
                Raw::DoubleQuoted => self.push(Token::Str(quoted(text, StringKind::Double)), offset),
                Raw::SingleQuoted => self.push(Token::Str(quoted(text, StringKind::Single)), offset),
                Raw::Template => self.push(Token::Str(template(text, offset)), offset),
                Raw::Identifier => self.identifier(text, span),
                Raw::CurrencySymbol => {
                    if let Some(code) = units::currency_for_symbol(text) {
                        self.push(Token::Currency(code.to_string()), offset);
                    }
                },
                Raw::Comment | Raw::Whitespace => {},
                _ => {
                    if let Some(token) = punctuation(raw) {
                        self.push(token, offset);
                    }
                },
            }
        }
    }

    fn push(&mut self, token: Token, offset: usize) {
        self.out.push((token, offset));
    }

    fn peek(&self, ahead: usize) -> Option<&(Raw, Range<usize>)> {
        self.raw.get(self.pos + ahead)
    }

    fn datetime(&mut self, text: &str, offset: usize) {
        let Some(split) = text.find('T') else {
            return;
        };
        let (date, time) = (&text[..split], &text[split + 1..]);
        if valid_date(date) && valid_time(time) {
            self.push(Token::DateTime(text.to_string()), offset);
        } else {
            self.date(date, offset);
            refine(&text[split..], offset + split, self.out);
        }
    }

    fn date(&mut self, text: &str, offset: usize) {
        if valid_date(text) {
            self.push(Token::Date(text.to_string()), offset);
        } else {
            self.fragments(text, offset);
        }
    }

    fn time(&mut self, text: &str, offset: usize) {
        if valid_time(text) {
            self.push(Token::Time(text.to_string()), offset);
        } else {
            self.fragments(text, offset);
        }
    }

    fn fragments(&mut self, text: &str, offset: usize) {
        for (fragment, span) in Fragment::lexer(text).spanned() {
            let token = match fragment {
                Ok(Fragment::Number) => Token::Number(text[span.clone()].to_string()),
                Ok(Fragment::Dot) => Token::Dot,
                Ok(Fragment::Slash) => Token::Slash,
                Ok(Fragment::Colon) => Token::Colon,
                Err(()) => continue,
            };
            self.push(token, offset + span.start);
        }
    }

    fn identifier(&mut self, text: &str, span: Range<usize>) {
        let offset = self.base + span.start;
        if let Some(zone) = self.utc_offset(text, &span)
                                .or_else(|| self.region(&span))
                                .or_else(|| self.two_word_city(text))
        {
            self.push(Token::Timezone(zone), offset);
            return;
        }
        let token = classify(text);
        self.push(token, offset);
    }

    /// `UTC+5`, `GMT-3:30`: a sign and an offset glued to `UTC`/`GMT`.
    fn utc_offset(&mut self, text: &str, span: &Range<usize>) -> Option<String> {
        if !matches!(text.to_uppercase().as_str(), "UTC" | "GMT") {
            return None;
        }
        let source = self.source;
        if let (Some((sign, sign_span)), Some((amount, amount_span))) = (self.peek(0), self.peek(1))
           && matches!(sign, Raw::Plus | Raw::Minus)
           && matches!(amount, Raw::Number | Raw::Time)
           && sign_span.start == span.end
           && amount_span.start == sign_span.end
        {
            let candidate = &source[span.start..amount_span.end];
            if timezone::parse(candidate).is_some() {
                self.pos += 2;
                return Some(candidate.to_string());
            }
        }
        Some(text.to_string())
    }

    /// IANA `Area/City` names, glued together with `/`.
    fn region(&mut self, span: &Range<usize>) -> Option<String> {
        let source = self.source;
        let mut end = span.end;
        let mut consumed = 0;
        let mut best = None;
        while let (Some((Raw::Slash, slash)), Some((Raw::Identifier, part))) =
            (self.peek(consumed), self.peek(consumed + 1))
        {
            if slash.start != end || part.start != slash.end {
                break;
            }
            end = part.end;
            consumed += 2;
            let candidate = &source[span.start..end];
            if timezone::parse(candidate).is_some() {
                best = Some((candidate.to_string(), consumed));
            }
        }
        best.map(|(name, consumed)| {
                self.pos += consumed;
                name
            })
    }

    /// `new york`, `hong kong`: speculative two-word read after a known prefix.
    fn two_word_city(&mut self, text: &str) -> Option<String> {
        if !timezone::MULTI_WORD_PREFIXES.contains(&text.to_lowercase().as_str()) {
            return None;
        }
        let (Raw::Identifier, next) = self.peek(0)? else {
            return None;
        };
        let second = &self.source[next.start..next.end];
        if timezone::is_two_word_city(text, second) {
            self.pos += 1;
            return Some(format!("{text} {second}"));
        }
        None
    }
}

/// Classifies a single identifier: timezone, keyword, builtin function,
/// constant, unit, currency code, word operator, and otherwise a variable.
fn classify(text: &str) -> Token {
    if timezone::parse(text).is_some() {
        return Token::Timezone(text.to_string());
    }
    if let Some(keyword) = Keyword::from_name(text) {
        return Token::Keyword(keyword);
    }
    if is_builtin(text) {
        return Token::Function(text.to_string());
    }
    if Constant::from_name(text).is_some() {
        return Token::Constant(text.to_string());
    }
    if units::lookup(text).is_some() {
        return Token::Unit(text.to_string());
    }
    if units::is_currency_code(text) {
        return Token::Currency(text.to_string());
    }
    match text {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "mod" => Token::Mod,
        "plus" => Token::Plus,
        "minus" => Token::Minus,
        "times" => Token::Star,
        _ => Token::Variable(text.to_string()),
    }
}

fn punctuation(raw: Raw) -> Option<Token> {
    Some(match raw {
        Raw::AndAnd => Token::And,
        Raw::OrOr => Token::Or,
        Raw::Ampersand => Token::Ampersand,
        Raw::Pipe => Token::Pipe,
        Raw::ShiftLeft => Token::ShiftLeft,
        Raw::ShiftRight => Token::ShiftRight,
        Raw::StarStar | Raw::Caret => Token::Caret,
        Raw::Arrow => Token::Arrow,
        Raw::EqualEqual => Token::EqualEqual,
        Raw::BangEqual => Token::BangEqual,
        Raw::LessEqual => Token::LessEqual,
        Raw::GreaterEqual => Token::GreaterEqual,
        Raw::PlusAssign => Token::PlusAssign,
        Raw::MinusAssign => Token::MinusAssign,
        Raw::Plus => Token::Plus,
        Raw::Minus => Token::Minus,
        Raw::Star => Token::Star,
        Raw::Slash => Token::Slash,
        Raw::Percent => Token::Percent,
        Raw::Equals => Token::Equals,
        Raw::Less => Token::Less,
        Raw::Greater => Token::Greater,
        Raw::Bang => Token::Not,
        Raw::Question => Token::Question,
        Raw::Colon => Token::Colon,
        Raw::Dot => Token::Dot,
        Raw::Comma => Token::Comma,
        Raw::LParen => Token::LParen,
        Raw::RParen => Token::RParen,
        Raw::LBracket => Token::LBracket,
        Raw::RBracket => Token::RBracket,
        Raw::LBrace => Token::LBrace,
        Raw::RBrace => Token::RBrace,
        _ => return None,
    })
}

/// Day 1-31, month 1-12, year 1900-2100, and both separators equal.
fn valid_date(text: &str) -> bool {
    let Some(separator) = text.chars().find(|c| *c == '.' || *c == '/') else {
        return false;
    };
    let parts: Vec<&str> = text.split(separator).collect();
    let [day, month, year] = parts.as_slice() else {
        return false;
    };
    matches!((day.parse::<u32>(), month.parse::<u32>(), year.parse::<u32>()),
             (Ok(1..=31), Ok(1..=12), Ok(1900..=2100)))
}

/// Hour 0-23, minute 0-59.
fn valid_time(text: &str) -> bool {
    let Some((hour, minute)) = text.split_once(':') else {
        return false;
    };
    matches!((hour.parse::<u32>(), minute.parse::<u32>()), (Ok(0..=23), Ok(0..=59)))
}

fn quoted(text: &str, kind: StringKind) -> StringLiteral {
    let inner = &text[1..text.len() - 1];
    StringLiteral { kind,
                    segments: vec![Segment::Text(unescape(inner))] }
}

/// Splits a backtick literal into text and `${...}` segments. Braces nest,
/// so `${ {a: 1}.a }` interpolates the whole object access.
fn template(text: &str, offset: usize) -> StringLiteral {
    let inner = &text[1..text.len() - 1];
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = inner;
    let mut consumed = 1;
    while let Some(start) = rest.find("${") {
        if rest[..start].ends_with('\\') {
            literal.push_str(&rest[..start - 1]);
            literal.push_str("${");
            consumed += start + 2;
            rest = &rest[start + 2..];
            continue;
        }
        literal.push_str(&rest[..start]);
        let body = &rest[start + 2..];
        let mut depth = 1usize;
        let mut close = None;
        for (index, ch) in body.char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(index);
                        break;
                    }
                },
                _ => {},
            }
        }
        let Some(close) = close else {
            literal.push_str(&rest[start..]);
            rest = "";
            break;
        };
        if !literal.is_empty() {
            segments.push(Segment::Text(unescape(&std::mem::take(&mut literal))));
        }
        segments.push(Segment::Interpolation { source: body[..close].to_string(),
                                               offset: offset + consumed + start + 2 });
        consumed += start + 2 + close + 1;
        rest = &body[close + 1..];
    }
    literal.push_str(rest);
    if !literal.is_empty() || segments.is_empty() {
        segments.push(Segment::Text(unescape(&literal)));
    }
    StringLiteral { kind: StringKind::Template,
                    segments }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).into_iter().map(|(token, _)| token).collect()
    }

    #[test]
    fn dates_times_and_numbers() {
        assert_eq!(kinds("15.03.2024 14:30 3.14"),
                   vec![Token::Date("15.03.2024".into()),
                        Token::Time("14:30".into()),
                        Token::Number("3.14".into()),
                        Token::Eof]);
        assert_eq!(kinds("15.03.2024T09:05"),
                   vec![Token::DateTime("15.03.2024T09:05".into()), Token::Eof]);
    }

    #[test]
    fn invalid_dates_fall_back_to_numbers() {
        assert_eq!(kinds("1/2/3000"),
                   vec![Token::Number("1".into()),
                        Token::Slash,
                        Token::Number("2".into()),
                        Token::Slash,
                        Token::Number("3000".into()),
                        Token::Eof]);
        assert_eq!(kinds("15.03/2024")[0], Token::Number("15.03".into()));
        assert_eq!(kinds("25:00")[0], Token::Number("25".into()));
    }

    #[test]
    fn identifier_classification() {
        assert_eq!(kinds("x km USD sqrt pi to EST and"),
                   vec![Token::Variable("x".into()),
                        Token::Unit("km".into()),
                        Token::Currency("USD".into()),
                        Token::Function("sqrt".into()),
                        Token::Constant("pi".into()),
                        Token::Keyword(Keyword::To),
                        Token::Timezone("EST".into()),
                        Token::And,
                        Token::Eof]);
    }

    #[test]
    fn timezone_merging() {
        assert_eq!(kinds("UTC+5:30")[0], Token::Timezone("UTC+5:30".into()));
        assert_eq!(kinds("new york")[0], Token::Timezone("new york".into()));
        assert_eq!(kinds("Europe/Berlin")[0], Token::Timezone("Europe/Berlin".into()));
        assert_eq!(kinds("new x"),
                   vec![Token::Variable("new".into()), Token::Variable("x".into()), Token::Eof]);
        assert_eq!(kinds("UTC + 5")[1], Token::Plus);
    }

    #[test]
    fn operators_collapse_and_comments_skip() {
        assert_eq!(kinds("a &&& b || c # trailing"),
                   vec![Token::Variable("a".into()),
                        Token::And,
                        Token::Variable("b".into()),
                        Token::Or,
                        Token::Variable("c".into()),
                        Token::Eof]);
        assert_eq!(kinds("2 ** 3 << 1")[1], Token::Caret);
    }

    #[test]
    fn unknown_characters_are_skipped() {
        assert_eq!(kinds("1 @ 2"),
                   vec![Token::Number("1".into()), Token::Number("2".into()), Token::Eof]);
    }

    #[test]
    fn template_segments() {
        let tokens = tokenize("`a ${x + 1} b`");
        let Token::Str(literal) = &tokens[0].0 else {
            panic!("expected string");
        };
        assert_eq!(literal.segments,
                   vec![Segment::Text("a ".into()),
                        Segment::Interpolation { source: "x + 1".into(),
                                                 offset: 5 },
                        Segment::Text(" b".into())]);
    }

    #[test]
    fn currency_symbols() {
        assert_eq!(kinds("$100")[0], Token::Currency("USD".into()));
        assert_eq!(kinds("5 €")[1], Token::Currency("EUR".into()));
    }
}
