//! Tokenized documents.
//!
//! The matcher never tokenizes on its own: it works on a [`Doc`] produced by an
//! upstream pipeline. A `Doc` is the original text plus a sequence of
//! [`Token`]s, each carrying its byte offset into that text. All match
//! coordinates (`start`, `end`) are token indices into `Doc::tokens`.
//!
//! ```text
//! text:   "No history of CHF."
//! tokens:  No  history  of  CHF  .
//! index:   0   1        2   3    4
//! ```
//!
//! [`Tokenize`] is the seam for plugging in a real tokenizer. [`SimpleTokenizer`]
//! is a word/punctuation splitter that is good enough for rule phrases, the
//! CLI and tests.

use crate::error::MatchError;
use std::borrow::Cow;
use std::str::FromStr;

/// Token attribute used for comparisons (phrase matching and token patterns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenAttr {
    /// Verbatim token text.
    Orth,
    /// Lowercased token text.
    #[default]
    Lower,
    /// Uppercased token text.
    Upper,
    /// Lemma, when the upstream pipeline supplied one.
    Lemma,
    /// Coarse part-of-speech, when supplied.
    Pos,
    /// Fine-grained tag, when supplied.
    Tag,
}

impl TokenAttr {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenAttr::Orth => "ORTH",
            TokenAttr::Lower => "LOWER",
            TokenAttr::Upper => "UPPER",
            TokenAttr::Lemma => "LEMMA",
            TokenAttr::Pos => "POS",
            TokenAttr::Tag => "TAG",
        }
    }
}

impl FromStr for TokenAttr {
    type Err = MatchError;

    /// Parse an attribute name case-insensitively. `TEXT` is an alias for `ORTH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ORTH" | "TEXT" => Ok(TokenAttr::Orth),
            "LOWER" => Ok(TokenAttr::Lower),
            "UPPER" => Ok(TokenAttr::Upper),
            "LEMMA" => Ok(TokenAttr::Lemma),
            "POS" => Ok(TokenAttr::Pos),
            "TAG" => Ok(TokenAttr::Tag),
            _ => Err(MatchError::UnknownAttribute(s.to_string())),
        }
    }
}

/// Boolean lexical flag of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenFlag {
    IsAlpha,
    IsDigit,
    IsPunct,
    IsTitle,
    IsUpper,
    IsLower,
    LikeNum,
}

const NUMBER_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven", "twelve",
    "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen", "nineteen", "twenty", "thirty", "forty",
    "fifty", "sixty", "seventy", "eighty", "ninety", "hundred", "thousand", "million", "billion", "trillion",
];

/// How a character span that does not sit on token boundaries maps to tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Both ends must fall exactly on token boundaries.
    Strict,
    /// Keep only tokens entirely inside the span.
    Contract,
    /// Keep every token the span touches.
    #[default]
    Expand,
}

/// A single token of a [`Doc`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    text: String,
    idx: usize,
    whitespace: bool,
    lemma: Option<String>,
    pos: Option<String>,
    tag: Option<String>,
}

impl Token {
    /// Create a token with surface `text` starting at byte offset `idx`.
    pub fn new(text: impl Into<String>, idx: usize) -> Self {
        Token { text: text.into(), idx, whitespace: false, lemma: None, pos: None, tag: None }
    }

    /// Set whether the token is followed by whitespace.
    pub fn with_whitespace(mut self, whitespace: bool) -> Self {
        self.whitespace = whitespace;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of the token in the document text.
    pub fn idx(&self) -> usize {
        self.idx
    }

    /// Byte offset one past the end of the token.
    pub fn end(&self) -> usize {
        self.idx + self.text.len()
    }

    /// True when whitespace follows the token in the document text.
    pub fn whitespace(&self) -> bool {
        self.whitespace
    }

    pub fn lemma(&self) -> Option<&str> {
        self.lemma.as_deref()
    }

    pub fn pos(&self) -> Option<&str> {
        self.pos.as_deref()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn set_lemma(&mut self, lemma: impl Into<String>) {
        self.lemma = Some(lemma.into());
    }

    pub fn set_pos(&mut self, pos: impl Into<String>) {
        self.pos = Some(pos.into());
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = Some(tag.into());
    }

    /// Value of `attr` for this token, or `None` if it was never annotated.
    pub fn attr(&self, attr: TokenAttr) -> Option<Cow<'_, str>> {
        match attr {
            TokenAttr::Orth => Some(Cow::Borrowed(self.text.as_str())),
            TokenAttr::Lower => Some(Cow::Owned(self.text.to_lowercase())),
            TokenAttr::Upper => Some(Cow::Owned(self.text.to_uppercase())),
            TokenAttr::Lemma => self.lemma.as_deref().map(Cow::Borrowed),
            TokenAttr::Pos => self.pos.as_deref().map(Cow::Borrowed),
            TokenAttr::Tag => self.tag.as_deref().map(Cow::Borrowed),
        }
    }

    pub fn flag(&self, flag: TokenFlag) -> bool {
        let text = self.text.as_str();
        if text.is_empty() {
            return false;
        }
        match flag {
            TokenFlag::IsAlpha => text.chars().all(char::is_alphabetic),
            TokenFlag::IsDigit => text.chars().all(|c| c.is_ascii_digit()),
            TokenFlag::IsPunct => text.chars().all(|c| !c.is_alphanumeric() && !c.is_whitespace()),
            TokenFlag::IsTitle => {
                let mut chars = text.chars();
                chars.next().is_some_and(char::is_uppercase) && !chars.any(char::is_uppercase)
            }
            TokenFlag::IsUpper => text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase),
            TokenFlag::IsLower => text.chars().any(char::is_lowercase) && !text.chars().any(char::is_uppercase),
            TokenFlag::LikeNum => like_num(text),
        }
    }
}

fn like_num(text: &str) -> bool {
    let text = text.strip_prefix(['+', '-', '~', '±']).unwrap_or(text);
    let stripped: String = text.chars().filter(|c| *c != ',' && *c != '.').collect();
    if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    if let Some((num, denom)) = text.split_once('/') {
        let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
        if digits(num) && digits(denom) {
            return true;
        }
    }
    NUMBER_WORDS.contains(&text.to_lowercase().as_str())
}

/// A tokenized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doc {
    text: String,
    tokens: Vec<Token>,
}

impl Doc {
    /// Create a document from its text and tokens.
    ///
    /// Tokens must be ordered by offset, must not overlap, and their text must
    /// be the slice of `text` at their offset.
    pub fn new(text: impl Into<String>, tokens: Vec<Token>) -> Self {
        Doc { text: text.into(), tokens }
    }

    /// Build a document from `(word, trailing_space)` pairs.
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        let mut tokens = Vec::new();
        for (word, space) in parts {
            let word = word.as_ref();
            tokens.push(Token::new(word, text.len()).with_whitespace(space));
            text.push_str(word);
            if space {
                text.push(' ');
            }
        }
        Doc { text, tokens }
    }

    /// Build a document from words separated by single spaces.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut doc = Doc::from_parts(words.into_iter().map(|w| (w, true)));
        if doc.text.ends_with(' ') {
            doc.text.pop();
        }
        if let Some(last) = doc.tokens.last_mut() {
            last.whitespace = false;
        }
        doc
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, i: usize) -> Option<&Token> {
        self.tokens.get(i)
    }

    /// Mutable access for attaching annotations (lemma, pos, tag).
    pub fn token_mut(&mut self, i: usize) -> Option<&mut Token> {
        self.tokens.get_mut(i)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Text covered by tokens `[start, end)`, or `""` for an empty or
    /// out-of-range interval.
    pub fn span_text(&self, start: usize, end: usize) -> &str {
        if start >= end || end > self.tokens.len() {
            return "";
        }
        let from = self.tokens[start].idx();
        let to = self.tokens[end - 1].end();
        self.text.get(from..to).unwrap_or("")
    }

    /// Map the byte range `[start, end)` of the text to a token interval.
    ///
    /// Returns `None` when the range is empty or covers no token under `alignment`.
    pub fn token_span(&self, start: usize, end: usize, alignment: Alignment) -> Option<(usize, usize)> {
        if start >= end {
            return None;
        }
        let (first, last) = match alignment {
            Alignment::Expand => {
                (self.tokens.partition_point(|t| t.end() <= start), self.tokens.partition_point(|t| t.idx() < end))
            }
            Alignment::Contract | Alignment::Strict => {
                (self.tokens.partition_point(|t| t.idx() < start), self.tokens.partition_point(|t| t.end() <= end))
            }
        };
        if first >= last {
            return None;
        }
        if alignment == Alignment::Strict && (self.tokens[first].idx() != start || self.tokens[last - 1].end() != end)
        {
            return None;
        }
        Some((first, last))
    }
}

/// Turns text into a [`Doc`].
pub trait Tokenize: Send + Sync {
    fn tokenize(&self, text: &str) -> Doc;
}

/// Splits text into runs of word characters and single punctuation marks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTokenizer;

impl Tokenize for SimpleTokenizer {
    fn tokenize(&self, text: &str) -> Doc {
        let tokens = crate::regex!(r"\w+|[^\w\s]")
            .find_iter(text)
            .map(|m| {
                let followed_by_space = text[m.end()..].chars().next().is_some_and(char::is_whitespace);
                Token::new(m.as_str(), m.start()).with_whitespace(followed_by_space)
            })
            .collect();
        Doc::new(text, tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_tokenizer_splits_words_and_punctuation() {
        let doc = SimpleTokenizer.tokenize("No  history of CHF.");
        let words: Vec<&str> = doc.tokens().iter().map(Token::text).collect();
        assert_eq!(words, vec!["No", "history", "of", "CHF", "."]);
        assert_eq!(doc.token(1).map(Token::idx), Some(4));
        assert_eq!(doc.text(), "No  history of CHF.");
        let spaces: Vec<bool> = doc.tokens().iter().map(Token::whitespace).collect();
        assert_eq!(spaces, vec![true, true, true, false, false]);
    }

    #[test]
    fn from_parts_keeps_trailing_space_flags() {
        let doc = Doc::from_parts([("chest", true), ("pain", false), (".", false)]);
        assert_eq!(doc.text(), "chest pain.");
        let spaces: Vec<bool> = doc.tokens().iter().map(Token::whitespace).collect();
        assert_eq!(spaces, vec![true, false, false]);
        assert_eq!(doc.token(2).map(Token::idx), Some(10));
    }

    #[test]
    fn from_words_joins_with_single_spaces() {
        let doc = Doc::from_words(["left", "lower", "lobe"]);
        assert_eq!(doc.text(), "left lower lobe");
        assert!(doc.token(1).is_some_and(Token::whitespace));
        assert!(!doc.token(2).is_some_and(Token::whitespace));
        assert_eq!(doc.span_text(1, 3), "lower lobe");
        assert_eq!(doc.span_text(2, 2), "");
        assert_eq!(doc.span_text(2, 9), "");
    }

    #[test]
    fn token_span_respects_alignment() {
        let doc = Doc::from_words(["chest", "pain", "today"]);
        // "st pain to" cuts into "chest" and "today"
        assert_eq!(doc.token_span(3, 13, Alignment::Expand), Some((0, 3)));
        assert_eq!(doc.token_span(3, 13, Alignment::Contract), Some((1, 2)));
        assert_eq!(doc.token_span(3, 13, Alignment::Strict), None);
        assert_eq!(doc.token_span(6, 10, Alignment::Strict), Some((1, 2)));
        // only whitespace
        assert_eq!(doc.token_span(5, 6, Alignment::Expand), None);
        assert_eq!(doc.token_span(4, 4, Alignment::Expand), None);
    }

    #[test]
    fn attributes_and_flags() {
        let mut doc = Doc::from_words(["Denies", "FEVER", "3,000", "twelve", "?"]);
        if let Some(tok) = doc.token_mut(0) {
            tok.set_lemma("deny");
            tok.set_pos("VERB");
        }
        let t0 = doc.token(0).unwrap();
        assert_eq!(t0.attr(TokenAttr::Lower).as_deref(), Some("denies"));
        assert_eq!(t0.attr(TokenAttr::Lemma).as_deref(), Some("deny"));
        assert_eq!(t0.attr(TokenAttr::Pos).as_deref(), Some("VERB"));
        assert!(t0.flag(TokenFlag::IsTitle));
        assert!(doc.token(1).unwrap().flag(TokenFlag::IsUpper));
        assert_eq!(doc.token(1).unwrap().attr(TokenAttr::Tag), None);
        assert!(doc.token(2).unwrap().flag(TokenFlag::LikeNum));
        assert!(!doc.token(2).unwrap().flag(TokenFlag::IsDigit));
        assert!(doc.token(3).unwrap().flag(TokenFlag::LikeNum));
        assert!(doc.token(4).unwrap().flag(TokenFlag::IsPunct));
    }

    #[test]
    fn token_attr_parses_case_insensitively() {
        assert_eq!("lower".parse::<TokenAttr>().unwrap(), TokenAttr::Lower);
        assert_eq!("TEXT".parse::<TokenAttr>().unwrap(), TokenAttr::Orth);
        assert!(matches!("SHAPE".parse::<TokenAttr>(), Err(MatchError::UnknownAttribute(_))));
    }
}
