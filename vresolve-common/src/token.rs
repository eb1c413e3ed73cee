/*
 * vSMTP mail transfer agent
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 *  This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/

/// characters that form a token of their own.
const SPECIALS: &str = "@.,;:!%<>()[]";

/// characters that force quoting of a local part when externalizing.
///
/// `@` is deliberately absent so that extra `@` characters survive
/// requoting and stay visible to the routing loop.
const NEEDS_QUOTING: &str = " \t\"\\(),;:<>[]";

/// a single lexical element of an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// a run of ordinary characters.
    Atom(String),
    /// a double-quoted string, stored without the surrounding quotes.
    QuotedString(String),
    /// a parenthesized comment, stored without the parentheses.
    Comment(String),
    /// a bracketed domain literal, stored without the brackets.
    DomainLiteral(String),
    /// one of `@ . , ; : ! % < >` or an unbalanced `) ]`.
    Special(char),
}

impl Token {
    /// true when the token is the given special character.
    #[must_use]
    pub fn is_special(&self, ch: char) -> bool {
        matches!(self, Self::Special(c) if *c == ch)
    }

    /// true when the token is a routing operator (`@`, `!` or `%`).
    #[must_use]
    pub fn is_routing_operator(&self) -> bool {
        matches!(self, Self::Special('@' | '!' | '%'))
    }
}

/// an ordered token sequence representing a single address.
///
/// created by parsing, mutated by the resolver engine, and emitted back
/// in internal (unquoted) form before the request completes. after every
/// transformation the tree is either empty or re-emittable as an address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenTree {
    tokens: Vec<Token>,
}

impl TokenTree {
    /// lex an address string into a token tree.
    ///
    /// double-quoted strings are one token preserving their contents,
    /// `[...]` is a domain-literal token, `(...)` a comment token, and
    /// whitespace outside quoted strings is insignificant.
    #[must_use]
    pub fn scan(input: &str) -> Self {
        let mut tokens = vec![];
        let mut chars = input.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                c if c.is_whitespace() => {}
                '"' => tokens.push(Token::QuotedString(scan_quoted(&mut chars))),
                '(' => tokens.push(Token::Comment(scan_comment(&mut chars))),
                '[' => tokens.push(Token::DomainLiteral(scan_literal(&mut chars))),
                c if SPECIALS.contains(c) => tokens.push(Token::Special(c)),
                c => {
                    let mut atom = String::new();
                    atom.push(c);
                    while let Some(next) = chars.peek() {
                        if next.is_whitespace() || *next == '"' || SPECIALS.contains(*next) {
                            break;
                        }
                        atom.push(*next);
                        chars.next();
                    }
                    tokens.push(Token::Atom(atom));
                }
            }
        }

        Self { tokens }
    }

    /// externalize an internal-form address, then lex it.
    ///
    /// the local part is re-quoted when it holds characters that rfc 822
    /// reserves, but `@` is not treated as special so that source-routed
    /// submissions keep their extra `@` visible after the round trip.
    #[must_use]
    pub fn scan_requoted(addr: &str) -> Self {
        Self::scan(&quote_local(addr))
    }

    /// number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// true when no token is left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// the last token, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Token> {
        self.tokens.last()
    }

    /// the token at `idx`.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&Token> {
        self.tokens.get(idx)
    }

    /// index of the rightmost token equal to the special `ch`.
    #[must_use]
    pub fn rfind_special(&self, ch: char) -> Option<usize> {
        self.tokens.iter().rposition(|token| token.is_special(ch))
    }

    /// index of the leftmost token equal to the special `ch`.
    #[must_use]
    pub fn find_special(&self, ch: char) -> Option<usize> {
        self.tokens.iter().position(|token| token.is_special(ch))
    }

    /// true when any token before `end` is a routing operator.
    #[must_use]
    pub fn has_routing_operator_before(&self, end: usize) -> bool {
        self.tokens[..end]
            .iter()
            .any(Token::is_routing_operator)
    }

    /// detach every token from `idx` (inclusive) onwards.
    ///
    /// the remainder stays in place; the detached range is returned as a
    /// free-standing tree so it can be re-attached later.
    pub fn sub_keep_before(&mut self, idx: usize) -> Self {
        Self {
            tokens: self.tokens.split_off(idx),
        }
    }

    /// re-attach a previously detached sub-range at the tail.
    pub fn sub_append(&mut self, sub: Self) {
        self.tokens.extend(sub.tokens);
    }

    /// append a single token at the tail.
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// remove and return the head token.
    pub fn split_off_first(&mut self) -> Option<Token> {
        if self.tokens.is_empty() {
            None
        } else {
            Some(self.tokens.remove(0))
        }
    }

    /// overwrite the token at `idx`.
    ///
    /// # Panics
    ///
    /// * `idx` is out of bounds
    pub fn set(&mut self, idx: usize, token: Token) {
        self.tokens[idx] = token;
    }

    /// replace the whole tree with another one.
    pub fn replace(&mut self, other: Self) {
        self.tokens = other.tokens;
    }

    /// emit the internal (unquoted) form of the whole tree.
    #[must_use]
    pub fn internalize(&self) -> String {
        self.internalize_from(0)
    }

    /// emit the internal form of the tokens from `start` onwards.
    ///
    /// quoted strings lose their quotes, domain syntax is untouched.
    #[must_use]
    pub fn internalize_from(&self, start: usize) -> String {
        let mut out = String::new();
        for token in &self.tokens[start..] {
            match token {
                Token::Atom(text) | Token::QuotedString(text) => out.push_str(text),
                Token::Comment(text) => {
                    out.push('(');
                    out.push_str(text);
                    out.push(')');
                }
                Token::DomainLiteral(text) => {
                    out.push('[');
                    out.push_str(text);
                    out.push(']');
                }
                Token::Special(ch) => out.push(*ch),
            }
        }
        out
    }
}

/// consume a quoted string up to the closing quote, honoring backslash
/// escapes. an unterminated string runs to the end of input.
fn scan_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => break,
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            c => out.push(c),
        }
    }
    out
}

/// consume a comment up to the balancing parenthesis (comments nest).
fn scan_comment(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    let mut depth = 1;
    for ch in chars.by_ref() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        out.push(ch);
    }
    out
}

/// consume a domain literal up to the closing bracket.
fn scan_literal(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    for ch in chars.by_ref() {
        if ch == ']' {
            break;
        }
        out.push(ch);
    }
    out
}

/// quote the local part of an internal-form address.
///
/// the domain is everything after the rightmost `@`; an address without
/// `@` is all local part. `%` and `!` never force quoting, and neither
/// does `@`, so routing operators stay visible to the caller's lexer.
#[must_use]
pub fn quote_local(addr: &str) -> String {
    let (local, rest) = addr
        .rfind('@')
        .map_or((addr, ""), |at| (&addr[..at], &addr[at..]));

    if !local_needs_quoting(local) {
        return addr.to_string();
    }

    let mut out = String::with_capacity(addr.len() + 2);
    out.push('"');
    for ch in local.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out.push_str(rest);
    out
}

fn local_needs_quoting(local: &str) -> bool {
    local.is_empty()
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
        || local
            .chars()
            .any(|ch| ch.is_control() || NEEDS_QUOTING.contains(ch))
}
