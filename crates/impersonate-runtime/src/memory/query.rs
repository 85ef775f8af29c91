//! Minimal node-pattern queries.
//!
//! Supported form (keywords case-insensitive):
//!
//! ```text
//! MATCH (var[:Label][ {key: $param | 'text' | 123 | true, ...}]) RETURN item[, item...]
//! item := var | var.property
//! ```
//!
//! ```
//! use impersonate_runtime::memory::{Filter, Projection, Query};
//!
//! let query = Query::parse("MATCH (p:Person{name:$name}) RETURN p, p.age").unwrap();
//! assert_eq!(query.label.as_deref(), Some("Person"));
//! assert_eq!(query.filters, vec![("name".to_string(), Filter::Param("name".to_string()))]);
//! assert_eq!(query.returns, vec![Projection::Node, Projection::Property("age".to_string())]);
//! ```

use crate::host::SessionError;
use impersonate_types::{Params, Value};

/// A property filter's right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Param(String),
    Literal(Value),
}

impl Filter {
    /// Resolves the filter value against `params`.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidQuery`] if a referenced parameter is missing.
    pub fn resolve<'a>(&'a self, params: &'a Params) -> Result<&'a Value, SessionError> {
        match self {
            Self::Literal(value) => Ok(value),
            Self::Param(name) => params
                .get(name)
                .ok_or_else(|| SessionError::InvalidQuery(format!("missing parameter: ${name}"))),
        }
    }
}

/// One returned column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Node,
    Property(String),
}

/// A parsed query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub variable: String,
    pub label: Option<String>,
    pub filters: Vec<(String, Filter)>,
    pub returns: Vec<Projection>,
}

impl Query {
    /// # Errors
    ///
    /// [`SessionError::InvalidQuery`] describing the first problem found.
    pub fn parse(input: &str) -> Result<Self, SessionError> {
        let mut cursor = Cursor::new(input);

        cursor.keyword("MATCH")?;
        cursor.expect('(')?;
        let variable = cursor.identifier()?;

        let label = if cursor.eat(':') {
            Some(cursor.identifier()?)
        } else {
            None
        };

        let mut filters = Vec::new();
        if cursor.eat('{') {
            loop {
                let key = cursor.identifier()?;
                cursor.expect(':')?;
                filters.push((key, cursor.filter()?));
                if !cursor.eat(',') {
                    break;
                }
            }
            cursor.expect('}')?;
        }
        cursor.expect(')')?;

        cursor.keyword("RETURN")?;
        let mut returns = Vec::new();
        loop {
            let name = cursor.identifier()?;
            if name != variable {
                return Err(invalid(format!("unknown variable: {name}")));
            }
            if cursor.eat('.') {
                returns.push(Projection::Property(cursor.identifier()?));
            } else {
                returns.push(Projection::Node);
            }
            if !cursor.eat(',') {
                break;
            }
        }

        cursor.end()?;
        Ok(Self {
            variable,
            label,
            filters,
            returns,
        })
    }

    /// Column name for one projection.
    #[must_use]
    pub fn column(&self, projection: &Projection) -> String {
        match projection {
            Projection::Node => self.variable.clone(),
            Projection::Property(key) => format!("{}.{key}", self.variable),
        }
    }
}

fn invalid(message: impl Into<String>) -> SessionError {
    SessionError::InvalidQuery(message.into())
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn expect(&mut self, c: char) -> Result<(), SessionError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(invalid(format!("expected '{c}' near '{}'", self.snippet())))
        }
    }

    fn keyword(&mut self, word: &str) -> Result<(), SessionError> {
        self.skip_ws();
        let matches = self
            .rest
            .get(..word.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(word));
        if !matches {
            return Err(invalid(format!("expected {word} near '{}'", self.snippet())));
        }
        self.rest = &self.rest[word.len()..];
        Ok(())
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let end = self
            .rest
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(self.rest.len(), |(i, _)| i);
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        head
    }

    fn identifier(&mut self) -> Result<String, SessionError> {
        self.skip_ws();
        let ident = self.take_while(|c| c.is_alphanumeric() || c == '_');
        if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid(format!(
                "expected identifier near '{}'",
                self.snippet()
            )));
        }
        Ok(ident.to_string())
    }

    fn filter(&mut self) -> Result<Filter, SessionError> {
        self.skip_ws();
        if self.eat('$') {
            return Ok(Filter::Param(self.identifier()?));
        }
        if let Some(quote) = self.rest.chars().next().filter(|c| *c == '\'' || *c == '"') {
            self.rest = &self.rest[quote.len_utf8()..];
            let text = self.take_while(|c| c != quote);
            let text = text.to_string();
            self.expect(quote)?;
            return Ok(Filter::Literal(Value::String(text)));
        }

        let token = self.take_while(|c| c.is_alphanumeric() || c == '-' || c == '.' || c == '_');
        if token.eq_ignore_ascii_case("true") {
            Ok(Filter::Literal(Value::Bool(true)))
        } else if token.eq_ignore_ascii_case("false") {
            Ok(Filter::Literal(Value::Bool(false)))
        } else if let Ok(i) = token.parse::<i64>() {
            Ok(Filter::Literal(Value::Int(i)))
        } else if let Ok(f) = token.parse::<f64>() {
            Ok(Filter::Literal(Value::Float(f)))
        } else {
            Err(invalid(format!("unsupported filter value '{token}'")))
        }
    }

    fn end(&mut self) -> Result<(), SessionError> {
        self.skip_ws();
        let rest = self.rest.strip_suffix(';').unwrap_or(self.rest).trim();
        if rest.is_empty() {
            Ok(())
        } else {
            Err(invalid(format!("unexpected input '{rest}'")))
        }
    }

    fn snippet(&self) -> &'a str {
        let end = self
            .rest
            .char_indices()
            .nth(16)
            .map_or(self.rest.len(), |(i, _)| i);
        &self.rest[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_match_all() {
        let query = Query::parse("match (n) return n").expect("parse");
        assert_eq!(query.variable, "n");
        assert_eq!(query.label, None);
        assert!(query.filters.is_empty());
        assert_eq!(query.returns, vec![Projection::Node]);
    }

    #[test]
    fn parse_literal_filters() {
        let query =
            Query::parse("MATCH (p:Person {name: 'John', salary: 1000, active: true}) RETURN p.name;")
                .expect("parse");
        assert_eq!(
            query.filters,
            vec![
                ("name".into(), Filter::Literal(Value::from("John"))),
                ("salary".into(), Filter::Literal(Value::Int(1000))),
                ("active".into(), Filter::Literal(Value::Bool(true))),
            ]
        );
        assert_eq!(query.column(&query.returns[0]), "p.name");
    }

    #[test]
    fn parameter_resolution() {
        let query = Query::parse("MATCH (p:Person{name:$name}) RETURN p").expect("parse");
        let mut params = Params::new();
        assert!(query.filters[0].1.resolve(&params).is_err());
        params.insert("name".into(), Value::from("John"));
        assert_eq!(
            query.filters[0].1.resolve(&params).expect("resolve"),
            &Value::from("John")
        );
    }

    #[test]
    fn rejects_unsupported_queries() {
        for input in [
            "",
            "CREATE (p:Person) RETURN p",
            "MATCH (p:Person RETURN p",
            "MATCH (p) RETURN q",
            "MATCH (p) RETURN p LIMIT 1",
            "MATCH (p {name: ?}) RETURN p",
        ] {
            let err = Query::parse(input).expect_err(input);
            assert!(matches!(err, SessionError::InvalidQuery(_)), "{input}");
        }
    }
}
