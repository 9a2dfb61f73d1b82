use phf::{phf_map, Map};

use crate::token::{NativeFn, Token, Type};

#[derive(Copy, Clone)]
struct Keyword {
    ty: Type,
    value: f64,
    func: Option<NativeFn>,
}

impl Keyword {
    const fn reserved(ty: Type) -> Self {
        Keyword {
            ty,
            value: 0.0,
            func: None,
        }
    }

    const fn constant(value: f64) -> Self {
        Keyword {
            ty: Type::ConstId,
            value,
            func: None,
        }
    }

    const fn func(f: NativeFn) -> Self {
        Keyword {
            ty: Type::Func,
            value: 0.0,
            func: Some(f),
        }
    }
}

pub struct Scanner;

impl Scanner {
    // Identifiers are upper-cased before lookup, which is what makes the
    // keyword set case-insensitive.
    const KEYWORDS: Map<&'static str, Keyword> = phf_map! {
        "ORIGIN" => Keyword::reserved(Type::Origin),
        "SCALE" => Keyword::reserved(Type::Scale),
        "ROT" => Keyword::reserved(Type::Rot),
        "IS" => Keyword::reserved(Type::Is),
        "FOR" => Keyword::reserved(Type::For),
        "FROM" => Keyword::reserved(Type::From),
        "TO" => Keyword::reserved(Type::To),
        "STEP" => Keyword::reserved(Type::Step),
        "DRAW" => Keyword::reserved(Type::Draw),
        "PI" => Keyword::constant(3.1415926),
        "E" => Keyword::constant(2.71828),
        "SIN" => Keyword::func(f64::sin),
        "COS" => Keyword::func(f64::cos),
        "TAN" => Keyword::func(f64::tan),
        "LN" => Keyword::func(f64::ln),
        "EXP" => Keyword::func(f64::exp),
        "SQRT" => Keyword::func(f64::sqrt),
    };

    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Scanner
    }

    pub fn scan_tokens<'a, 'b>(&'a mut self, src: &'b str) -> TokenStream
    where
        'b: 'a,
    {
        TokenStream::new(src)
    }
}

pub struct TokenStream<'a> {
    src: &'a str,
    line: usize,

    // `start` and `current` points to the start and end of the token being scanned
    start: usize,
    current: usize,

    // Set by `close()`. A closed stream only ever produces `Eof`, which lets
    // a caller deep inside recursive descent force every in-flight call to
    // unwind without scanning further.
    closed: bool,

    // This flag is set to `true` once the eof token has been emitted, so the
    // iterator knows to stop after yielding it exactly once.
    eof: bool,
}

impl<'a> TokenStream<'a> {
    pub fn new(src: &'a str) -> Self {
        TokenStream {
            src,
            line: 1,
            start: 0,
            current: 0,
            closed: false,
            eof: false,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Returns the next token, consuming input. Never fails: unclassifiable
    /// characters come back as `Type::Error` tokens carrying the offending
    /// character as their lexeme, and exhausted (or closed) input comes back
    /// as `Type::Eof`.
    pub fn get_token(&mut self) -> Token {
        if self.closed {
            return Token::eof(self.line);
        }

        while !self.is_at_end() {
            self.start = self.current;
            let c = self.advance();

            match c {
                ' ' | '\t' => continue,
                '\n' => {
                    self.line += 1;
                    continue;
                }
                '\r' => {
                    // CR immediately followed by LF counts as one break
                    self.match_char('\n');
                    self.line += 1;
                    continue;
                }

                ';' => return self.make_token(Type::SemiColon),
                '(' => return self.make_token(Type::LeftParen),
                ')' => return self.make_token(Type::RightParen),
                ',' => return self.make_token(Type::Comma),
                '*' => return self.make_token(Type::Star),
                '/' => return self.make_token(Type::Slash),
                '^' => return self.make_token(Type::Caret),
                '%' => return self.make_token(Type::Percent),

                '+' => {
                    return if self.match_char('+') {
                        self.make_token(Type::Increment)
                    } else {
                        self.make_token(Type::Plus)
                    }
                }

                '-' => {
                    return if self.match_char('-') {
                        self.make_token(Type::Decrement)
                    } else {
                        self.make_token(Type::Minus)
                    }
                }

                _ => {
                    return if c.is_ascii_digit() {
                        self.number()
                    } else if c.is_ascii_alphabetic() {
                        self.identifier()
                    } else {
                        self.make_token(Type::Error)
                    }
                }
            }
        }

        Token::eof(self.line)
    }

    fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let value = self.src[self.start..self.current].parse::<f64>().unwrap();

        // The lexeme is the canonical decimal form, not the raw spelling,
        // so "007" and "7" scan identically.
        Token::new(Type::ConstId, value.to_string(), value, None, self.line)
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.src[self.start..self.current].to_ascii_uppercase();

        match Scanner::KEYWORDS.get(&text) {
            Some(keyword) => Token::new(keyword.ty, text, keyword.value, keyword.func, self.line),
            None => Token::new(Type::Var, text, 0.0, None, self.line),
        }
    }

    fn current(&self) -> char {
        self.src.chars().nth(self.current).unwrap()
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.current()
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.src.len() {
            '\0'
        } else {
            self.src.chars().nth(self.current + 1).unwrap()
        }
    }

    fn advance(&mut self) -> char {
        let res = self.current();
        self.current += 1;
        res
    }

    fn match_char(&mut self, c: char) -> bool {
        if self.is_at_end() || self.current() != c {
            false
        } else {
            self.current += 1;
            true
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.src.len()
    }

    fn make_token(&mut self, ty: Type) -> Token {
        let lexeme = String::from(&self.src[self.start..self.current]);
        Token::new(ty, lexeme, 0.0, None, self.line)
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof {
            return None;
        }

        let token = self.get_token();
        if token.ty == Type::Eof {
            self.eof = true;
        }

        Some(token)
    }
}
