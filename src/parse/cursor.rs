/// Position-tracking scanner shared by the page tokenizers.
///
/// Each `eat_*`/`take_*` method either consumes the construct it names and
/// reports success, or leaves the position untouched. That keeps grammar
/// code in the parsers a flat sequence of `?` steps.

/// Sign rule for a numeric token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Optional,
    Required,
}

/// Fractional-part rule for a numeric token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fraction {
    /// `\d+(\.\d+)?`
    Optional,
    /// `\d+\.\d+` or `\.\d+`
    Required,
}

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Cursor { text, pos: 0 }
    }

    /// Starts at byte offset `pos`, which must be a char boundary.
    pub fn at(text: &'a str, pos: usize) -> Self {
        Cursor { text, pos }
    }

    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consumes `word` compared without ASCII case.
    pub fn eat_ignore_case(&mut self, word: &str) -> bool {
        let matched = self
            .rest()
            .get(..word.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(word));
        if matched {
            self.pos += word.len();
        }
        matched
    }

    /// Skips any run of whitespace, returning how many chars were skipped.
    pub fn skip_ws(&mut self) -> usize {
        let mut count = 0;
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
            count += 1;
        }
        count
    }

    /// Requires at least one whitespace char.
    pub fn eat_ws1(&mut self) -> bool {
        self.skip_ws() > 0
    }

    /// Takes between `min` and `max` ASCII digits, as many as available.
    pub fn take_digits(&mut self, min: usize, max: usize) -> Option<&'a str> {
        let rest = self.rest();
        let len = rest
            .bytes()
            .take(max)
            .take_while(|b| b.is_ascii_digit())
            .count();
        if len < min {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    /// Takes a non-empty run of ASCII letters.
    pub fn take_letters(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let len = rest.bytes().take_while(|b| b.is_ascii_alphabetic()).count();
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    /// Takes everything up to `stop` and consumes `stop` itself.
    pub fn take_until(&mut self, stop: char) -> Option<&'a str> {
        let rest = self.rest();
        let idx = rest.find(stop)?;
        self.pos += idx + stop.len_utf8();
        Some(&rest[..idx])
    }

    /// Reads a decimal number following the given sign and fraction rules.
    pub fn take_number(&mut self, sign: Sign, fraction: Fraction) -> Option<f64> {
        let start = self.pos;
        let parsed = self.number_body(sign, fraction);
        if parsed.is_none() {
            self.pos = start;
        }
        parsed
    }

    fn number_body(&mut self, sign: Sign, fraction: Fraction) -> Option<f64> {
        let start = self.pos;
        let signed = self.eat('+') || self.eat('-');
        if sign == Sign::Required && !signed {
            return None;
        }
        let int_len = self.take_digits(0, usize::MAX).map_or(0, str::len);
        let mut has_fraction = false;
        if self.peek() == Some('.') {
            let dot = self.pos;
            self.pos += 1;
            if self.take_digits(1, usize::MAX).is_some() {
                has_fraction = true;
            } else {
                self.pos = dot;
            }
        }
        let ok = match fraction {
            Fraction::Optional => int_len > 0,
            Fraction::Required => has_fraction,
        };
        if !ok {
            return None;
        }
        self.text[start..self.pos].parse().ok()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
