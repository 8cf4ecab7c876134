// src/parser.rs
use serde_json::Value;

#[derive(Debug)]
pub enum ParseError {
    InvalidSyntax(String),
}

impl From<String> for ParseError {
    fn from(msg: String) -> Self {
        ParseError::InvalidSyntax(msg)
    }
}

/// Character cursor over template source. Byte offsets, char-boundary safe.
pub struct Parser<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    pub fn pos(&self) -> usize {
        self.i
    }

    pub fn rest(&self) -> &'a str {
        &self.s[self.i..]
    }

    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.s[start..end]
    }

    pub fn advance(&mut self, n: usize) {
        self.i = (self.i + n).min(self.s.len());
    }

    pub fn seek(&mut self, pos: usize) {
        self.i = pos.min(self.s.len());
    }

    /// 1-based line of the cursor, for diagnostics.
    pub fn line(&self) -> usize {
        self.s[..self.i].matches('\n').count() + 1
    }

    pub fn parse_identifier(&mut self) -> Result<String, ParseError> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == '_' || c.is_alphanumeric() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
        if self.i == start {
            return Err(ParseError::InvalidSyntax("identifier expected".into()));
        }
        Ok(self.s[start..self.i].to_string())
    }

    /// Integer (decimal, `0x`, `0o`, `0b`, `_` separators) or float with
    /// optional fraction and exponent.
    pub fn parse_number_literal(&mut self) -> Result<Value, ParseError> {
        let start = self.i;
        let negative = self.peek_char() == Some('-');
        if matches!(self.peek_char(), Some('-' | '+')) {
            self.i += 1;
        }
        let radix = match (self.peek_char(), self.peek_nth(1)) {
            (Some('0'), Some('x' | 'X')) => 16,
            (Some('0'), Some('o' | 'O')) => 8,
            (Some('0'), Some('b' | 'B')) => 2,
            _ => 10,
        };
        if radix != 10 {
            self.i += 2;
            let digits_start = self.i;
            self.skip_digits(radix);
            let digits: String =
                self.s[digits_start..self.i].chars().filter(|c| *c != '_').collect();
            let n = i64::from_str_radix(&digits, radix)
                .map_err(|_| bad_number(&self.s[start..self.i]))?;
            return Ok(Value::from(if negative { -n } else { n }));
        }

        self.skip_digits(10);
        let mut float = false;
        if self.peek_char() == Some('.') {
            float = true;
            self.i += 1;
            self.skip_digits(10);
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let mark = self.i;
            self.i += 1;
            if matches!(self.peek_char(), Some('-' | '+')) {
                self.i += 1;
            }
            if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                float = true;
                self.skip_digits(10);
            } else {
                self.i = mark;
            }
        }
        let s = &self.s[start..self.i];
        let digits: String = s.chars().filter(|c| *c != '_' && *c != '+').collect();
        if digits.is_empty() || digits == "-" {
            return Err(ParseError::InvalidSyntax("number expected".into()));
        }
        if float {
            let f: f64 = digits.parse().map_err(|_| bad_number(s))?;
            serde_json::Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| bad_number(s))
        } else {
            let i: i64 = digits.parse().map_err(|_| bad_number(s))?;
            Ok(Value::from(i))
        }
    }

    fn skip_digits(&mut self, radix: u32) {
        while let Some(c) = self.peek_char() {
            if c.is_digit(radix) || c == '_' {
                self.i += 1;
            } else {
                break;
            }
        }
    }

    /// Double-quoted string with escapes, or a backquoted raw string.
    pub fn parse_quoted_string(&mut self) -> Result<String, ParseError> {
        let quote = self
            .peek_char()
            .ok_or_else(|| ParseError::InvalidSyntax("string".into()))?;
        if quote == '`' {
            self.i += 1;
            let body = self.capture_until('`')?;
            self.i += 1;
            return Ok(body.to_string());
        }
        if quote != '"' {
            return Err(ParseError::InvalidSyntax("expected quoted string".into()));
        }
        self.i += 1;
        let mut out = String::new();
        while let Some(c) = self.peek_char() {
            self.i += c.len_utf8();
            if c == quote {
                return Ok(out);
            }
            if c == '\n' {
                break;
            }
            if c == '\\' {
                if let Some(nc) = self.peek_char() {
                    self.i += nc.len_utf8();
                    match nc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'a' => out.push('\u{07}'),
                        'b' => out.push('\u{08}'),
                        'f' => out.push('\u{0c}'),
                        'v' => out.push('\u{0b}'),
                        '\\' => out.push('\\'),
                        '"' => out.push('"'),
                        'x' => out.push(self.parse_escape_code(16, 2)?),
                        'u' => out.push(self.parse_escape_code(16, 4)?),
                        'U' => out.push(self.parse_escape_code(16, 8)?),
                        '0'..='7' => {
                            self.i -= 1;
                            out.push(self.parse_escape_code(8, 3)?);
                        }
                        other => {
                            return Err(ParseError::InvalidSyntax(format!(
                                "unknown escape sequence: \\{other}"
                            )))
                        }
                    }
                } else {
                    break;
                }
            } else {
                out.push(c);
            }
        }
        Err(ParseError::InvalidSyntax("unterminated quoted string".into()))
    }

    // Exactly `len` digits of `radix` naming one char.
    fn parse_escape_code(&mut self, radix: u32, len: usize) -> Result<char, ParseError> {
        let digits = self.s[self.i..].get(..len).unwrap_or_default();
        if digits.len() != len || !digits.chars().all(|c| c.is_digit(radix)) {
            return Err(ParseError::InvalidSyntax("invalid escape sequence".into()));
        }
        self.i += len;
        u32::from_str_radix(digits, radix)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| ParseError::InvalidSyntax(format!("invalid escape code: {digits}")))
    }

    pub fn capture_until(&mut self, end: char) -> Result<&'a str, ParseError> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == end {
                break;
            }
            self.i += c.len_utf8();
        }
        if self.peek_char() != Some(end) {
            return Err(ParseError::InvalidSyntax(format!("expected '{end}'")));
        }
        Ok(&self.s[start..self.i])
    }

    pub fn capture_until_str(&mut self, end: &str) -> Result<&'a str, ParseError> {
        let start = self.i;
        match self.s[start..].find(end) {
            Some(offset) => {
                self.i = start + offset;
                Ok(&self.s[start..self.i])
            }
            None => {
                self.i = self.s.len();
                Err(ParseError::InvalidSyntax(format!("unclosed {end:?}")))
            }
        }
    }

    pub fn expect(&mut self, c: char) -> Result<(), ParseError> {
        if self.consume_char(c) {
            Ok(())
        } else {
            Err(ParseError::InvalidSyntax(format!("expected '{}'", c)))
        }
    }

    pub fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.i += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn consume_str(&mut self, lit: &str) -> bool {
        if self.peek_str(lit) {
            self.i += lit.len();
            true
        } else {
            false
        }
    }

    pub fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.s[self.i..].chars().nth(n)
    }

    pub fn peek_str(&self, lit: &str) -> bool {
        self.s[self.i..].starts_with(lit)
    }

    /// True when `word` sits at the cursor and is not the prefix of a longer identifier.
    pub fn peek_keyword(&self, word: &str) -> bool {
        self.peek_str(word)
            && !self.s[self.i + word.len()..]
                .chars()
                .next()
                .is_some_and(|c| c == '_' || c.is_alphanumeric())
    }

    pub fn skip_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }
}

fn bad_number(s: &str) -> ParseError {
    ParseError::InvalidSyntax(format!("bad number syntax: {s:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quoted_and_raw_strings() {
        let mut p = Parser::new(r#""a\"b\n" rest"#);
        assert_eq!(p.parse_quoted_string().unwrap(), "a\"b\n");
        p.skip_ws();
        assert_eq!(p.rest(), "rest");

        let mut raw = Parser::new("`x\\ny`");
        assert_eq!(raw.parse_quoted_string().unwrap(), "x\\ny");
        assert!(Parser::new("\"open").parse_quoted_string().is_err());
    }

    #[test]
    fn escape_codes() {
        let mut p = Parser::new(r#""caf\u00e9 \x41\101\U0001F600""#);
        assert_eq!(p.parse_quoted_string().unwrap(), "café AA\u{1F600}");
        assert!(Parser::new(r#""\q""#).parse_quoted_string().is_err());
        assert!(Parser::new(r#""\u12""#).parse_quoted_string().is_err());
    }

    #[test]
    fn numbers() {
        assert_eq!(Parser::new("42}}").parse_number_literal().unwrap(), Value::from(42));
        assert_eq!(Parser::new("-3").parse_number_literal().unwrap(), Value::from(-3));
        assert_eq!(Parser::new("1.5").parse_number_literal().unwrap(), Value::from(1.5));
        assert!(Parser::new("-").parse_number_literal().is_err());
        assert_eq!(Parser::new("1e3").parse_number_literal().unwrap(), Value::from(1000.0));
        assert_eq!(Parser::new("2.5E-1").parse_number_literal().unwrap(), Value::from(0.25));
        assert_eq!(Parser::new("0x10").parse_number_literal().unwrap(), Value::from(16));
        assert_eq!(Parser::new("-0b101").parse_number_literal().unwrap(), Value::from(-5));
        assert_eq!(Parser::new("0o17").parse_number_literal().unwrap(), Value::from(15));
        assert_eq!(Parser::new("1_000").parse_number_literal().unwrap(), Value::from(1000));
        assert!(Parser::new("0xZZ").parse_number_literal().is_err());
    }

    #[test]
    fn keywords_need_a_boundary() {
        assert!(Parser::new("if .X").peek_keyword("if"));
        assert!(!Parser::new("iffy").peek_keyword("if"));
        assert!(Parser::new("end").peek_keyword("end"));
    }
}
