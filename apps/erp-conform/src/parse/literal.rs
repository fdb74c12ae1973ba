//! A small reader for JavaScript/TypeScript object-literal call arguments.
//!
//! Model and migration declarations are plain object literals passed to ORM
//! calls. This reader understands strings, numbers, booleans, arrays and
//! objects; anything else (member access, calls, arrow functions) is kept as
//! raw [`Lit::Expr`] text. It never evaluates code.

#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Str(String),
    Num(String),
    Bool(bool),
    Null,
    Array(Vec<Lit>),
    Object(Vec<(String, Lit)>),
    Expr(String),
}

impl Lit {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Lit::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Lit::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Lit]> {
        match self {
            Lit::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Lit)]> {
        match self {
            Lit::Object(v) => Some(v),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Lit> {
        self.as_object()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Source-ish text for display (used for field types).
    pub fn text(&self) -> String {
        match self {
            Lit::Str(s) => s.clone(),
            Lit::Num(n) => n.clone(),
            Lit::Bool(b) => b.to_string(),
            Lit::Null => "null".to_string(),
            Lit::Array(_) => "[..]".to_string(),
            Lit::Object(_) => "{..}".to_string(),
            Lit::Expr(e) => e.clone(),
        }
    }
}

/// Parse the comma-separated arguments of a call whose `(` is at byte
/// `open`. Returns the arguments and the byte index just past `)`.
pub fn parse_call_args(src: &str, open: usize) -> Result<(Vec<Lit>, usize), String> {
    let mut r = Reader { src: src.as_bytes(), text: src, pos: open };
    r.expect(b'(')?;
    let mut args = Vec::new();
    loop {
        r.skip_trivia();
        match r.peek() {
            Some(b')') => {
                r.pos += 1;
                return Ok((args, r.pos));
            }
            Some(_) => {
                args.push(r.value()?);
                r.skip_trivia();
                match r.peek() {
                    Some(b',') => r.pos += 1,
                    Some(b')') => {}
                    Some(c) => return Err(r.error(&format!("unexpected '{}'", c as char))),
                    None => return Err(r.error("unterminated argument list")),
                }
            }
            None => return Err(r.error("unterminated argument list")),
        }
    }
}

/// Byte index just past the bracketed group opening at `open`.
pub fn balanced_end(src: &str, open: usize) -> Result<usize, String> {
    let mut r = Reader { src: src.as_bytes(), text: src, pos: open };
    r.skip_balanced()?;
    Ok(r.pos)
}

/// 1-based line number of byte offset `pos`.
pub fn line_of(src: &str, pos: usize) -> usize {
    src.as_bytes()[..pos.min(src.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}

struct Reader<'a> {
    src: &'a [u8],
    text: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, off: usize) -> Option<u8> {
        self.src.get(self.pos + off).copied()
    }

    fn error(&self, msg: &str) -> String {
        format!("line {}: {}", line_of(self.text, self.pos), msg)
    }

    fn expect(&mut self, c: u8) -> Result<(), String> {
        self.skip_trivia();
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c as char)))
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
                self.pos += 1;
            }
            if self.peek() == Some(b'/') && self.peek_at(1) == Some(b'/') {
                while !matches!(self.peek(), None | Some(b'\n')) {
                    self.pos += 1;
                }
            } else if self.peek() == Some(b'/') && self.peek_at(1) == Some(b'*') {
                self.pos += 2;
                while self.peek().is_some()
                    && !(self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/'))
                {
                    self.pos += 1;
                }
                self.pos = (self.pos + 2).min(self.src.len());
            } else {
                return;
            }
        }
    }

    fn value(&mut self) -> Result<Lit, String> {
        self.skip_trivia();
        let start = self.pos;
        let lit = match self.peek() {
            Some(b'{') => return self.object(),
            Some(b'[') => return self.array(),
            Some(q @ (b'\'' | b'"' | b'`')) => Lit::Str(self.string(q)?),
            Some(c) if c.is_ascii_digit() => Lit::Num(self.number()),
            Some(b'-') if matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) => {
                self.pos += 1;
                Lit::Num(format!("-{}", self.number()))
            }
            Some(_) => return self.expr(),
            None => return Err(self.error("unexpected end of input")),
        };
        // `'a' + b` and similar are expressions, not literals.
        self.skip_trivia();
        match self.peek() {
            Some(b',') | Some(b'}') | Some(b']') | Some(b')') | None => Ok(lit),
            _ => {
                self.pos = start;
                self.expr()
            }
        }
    }

    fn object(&mut self) -> Result<Lit, String> {
        self.expect(b'{')?;
        let mut entries = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Lit::Object(entries));
                }
                Some(b',') => {
                    self.pos += 1;
                    continue;
                }
                None => return Err(self.error("unterminated object")),
                _ => {}
            }
            if self.peek() == Some(b'.') && self.peek_at(1) == Some(b'.') {
                // spread entry
                self.pos += 3;
                let e = self.expr()?;
                entries.push(("...".to_string(), e));
                continue;
            }
            let key = match self.peek() {
                Some(q @ (b'\'' | b'"' | b'`')) => self.string(q)?,
                Some(b'[') => {
                    let s = self.pos;
                    self.skip_balanced()?;
                    self.text[s..self.pos].to_string()
                }
                _ => self.ident(),
            };
            if key.is_empty() {
                return Err(self.error("expected property name"));
            }
            self.skip_trivia();
            match self.peek() {
                Some(b':') => {
                    self.pos += 1;
                    let v = self.value()?;
                    entries.push((key, v));
                }
                Some(b'(') => {
                    // method shorthand: name(args) { body }
                    let s = self.pos;
                    self.skip_balanced()?;
                    self.skip_trivia();
                    if self.peek() == Some(b'{') {
                        self.skip_balanced()?;
                    }
                    entries.push((key, Lit::Expr(self.text[s..self.pos].to_string())));
                }
                _ => {
                    // shorthand property `{ sequelize }`
                    let v = Lit::Expr(key.clone());
                    entries.push((key, v));
                }
            }
        }
    }

    fn array(&mut self) -> Result<Lit, String> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Lit::Array(items));
                }
                Some(b',') => self.pos += 1,
                None => return Err(self.error("unterminated array")),
                _ => items.push(self.value()?),
            }
        }
    }

    fn string(&mut self, quote: u8) -> Result<String, String> {
        self.pos += 1;
        let mut out = Vec::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == b'\\' {
                if let Some(n) = self.peek() {
                    out.push(n);
                    self.pos += 1;
                }
            } else if c == quote {
                return Ok(String::from_utf8_lossy(&out).to_string());
            } else {
                out.push(c);
            }
        }
        Err(self.error("unterminated string"))
    }

    fn number(&mut self) -> String {
        let s = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'.' || c == b'_')
        {
            self.pos += 1;
        }
        self.text[s..self.pos].to_string()
    }

    fn ident(&mut self) -> String {
        let s = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_' || c == b'$')
        {
            self.pos += 1;
        }
        self.text[s..self.pos].to_string()
    }

    /// Skip one bracketed group starting at the current `(`, `[` or `{`.
    fn skip_balanced(&mut self) -> Result<(), String> {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                b'\'' | b'"' | b'`' => {
                    self.string(c)?;
                    continue;
                }
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.pos += 1;
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        Err(self.error("unbalanced brackets"))
    }

    /// Raw expression up to the next top-level separator.
    fn expr(&mut self) -> Result<Lit, String> {
        let s = self.pos;
        while let Some(c) = self.peek() {
            match c {
                b',' | b'}' | b']' | b')' => break,
                b'(' | b'[' | b'{' => self.skip_balanced()?,
                b'\'' | b'"' | b'`' => {
                    self.string(c)?;
                }
                _ => self.pos += 1,
            }
        }
        let raw = self.text[s..self.pos].trim();
        Ok(match raw {
            "true" => Lit::Bool(true),
            "false" => Lit::Bool(false),
            "null" | "undefined" => Lit::Null,
            _ => Lit::Expr(raw.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(src: &str) -> Vec<Lit> {
        let open = src.find('(').unwrap();
        parse_call_args(src, open).unwrap().0
    }

    #[test]
    fn test_parses_nested_objects_and_expressions() {
        let a = args(
            r#"init({
                id: { type: DataTypes.INTEGER, primaryKey: true },
                // trailing comment
                name: { type: DataTypes.STRING(50), allowNull: false },
                kind: DataTypes.ENUM('A', 'B'),
            }, { sequelize, tableName: 'items', indexes: [{ fields: ['name'], unique: true }] })"#,
        );
        assert_eq!(a.len(), 2);
        let fields = &a[0];
        assert_eq!(
            fields.get("name").and_then(|f| f.get("type")),
            Some(&Lit::Expr("DataTypes.STRING(50)".into()))
        );
        assert_eq!(
            fields.get("name").and_then(|f| f.get("allowNull")),
            Some(&Lit::Bool(false))
        );
        assert_eq!(fields.get("kind"), Some(&Lit::Expr("DataTypes.ENUM('A', 'B')".into())));
        let opts = &a[1];
        assert_eq!(opts.get("tableName").and_then(Lit::as_str), Some("items"));
        assert_eq!(opts.get("sequelize"), Some(&Lit::Expr("sequelize".into())));
        let ix = opts.get("indexes").and_then(Lit::as_array).unwrap();
        assert_eq!(ix[0].get("unique"), Some(&Lit::Bool(true)));
    }

    #[test]
    fn test_string_followed_by_operator_is_expression() {
        let a = args("f('a' + b, -3, \"x,y\")");
        assert_eq!(a[0], Lit::Expr("'a' + b".into()));
        assert_eq!(a[1], Lit::Num("-3".into()));
        assert_eq!(a[2], Lit::Str("x,y".into()));
    }

    #[test]
    fn test_unterminated_input_is_error() {
        assert!(parse_call_args("f({ a: 1", 1).is_err());
        assert!(parse_call_args("f('abc", 1).is_err());
    }

    #[test]
    fn test_line_of_counts_newlines() {
        assert_eq!(line_of("a\nb\nc", 0), 1);
        assert_eq!(line_of("a\nb\nc", 4), 3);
    }
}
