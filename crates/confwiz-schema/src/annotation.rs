//! Type annotations
//!
//! [`TypeExpr`] is the raw, unnormalized annotation attached to a field.
//! Schema files spell annotations the usual way (`list[str]`,
//! `dict[str, Decimal]`, `Optional[InnerModel]`, `A | B | None`,
//! `Literal["a", "b"]`); [`FromStr`] parses that text and [`Display`]
//! renders the human display name shown in prompts and schema tables.

use crate::error::ParseAnnotationError;
use crate::value::Scalar;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Unnormalized type annotation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// The "nothing" type
    NoneType,
    /// Unconstrained
    Any,
    /// Primitive, temporal, enumeration or structure name
    Named(String),
    /// Ordered sequence, element type optional
    List(Option<Box<TypeExpr>>),
    /// Unique unordered collection, element type optional
    Set(Option<Box<TypeExpr>>),
    /// Key-value map, key and value types optional
    Dict(Option<Box<(TypeExpr, TypeExpr)>>),
    /// Alternatives, possibly including [`TypeExpr::NoneType`]
    Union(Vec<TypeExpr>),
    /// Closed set of literal values
    Literal(Vec<Scalar>),
}

impl TypeExpr {
    /// Named type
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// `list[element]`
    #[inline]
    #[must_use]
    pub fn list_of(element: TypeExpr) -> Self {
        Self::List(Some(Box::new(element)))
    }

    /// `set[element]`
    #[inline]
    #[must_use]
    pub fn set_of(element: TypeExpr) -> Self {
        Self::Set(Some(Box::new(element)))
    }

    /// `dict[key, value]`
    #[inline]
    #[must_use]
    pub fn dict_of(key: TypeExpr, value: TypeExpr) -> Self {
        Self::Dict(Some(Box::new((key, value))))
    }

    /// `inner | None`
    #[inline]
    #[must_use]
    pub fn optional(inner: TypeExpr) -> Self {
        Self::Union(vec![inner, Self::NoneType])
    }

    /// `Literal[...]` over string choices
    #[must_use]
    pub fn literal_str(choices: &[&str]) -> Self {
        Self::Literal(choices.iter().map(|c| Scalar::from(*c)).collect())
    }

    /// Check whether absence is one of the alternatives
    #[must_use]
    pub fn admits_none(&self) -> bool {
        match self {
            Self::NoneType | Self::Any => true,
            Self::Union(alts) => alts.iter().any(TypeExpr::admits_none),
            _ => false,
        }
    }

    /// Maximum nesting depth of this annotation
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::List(Some(e)) | Self::Set(Some(e)) => 1 + e.depth(),
            Self::Dict(Some(kv)) => 1 + kv.0.depth().max(kv.1.depth()),
            Self::Union(alts) => 1 + alts.iter().map(TypeExpr::depth).max().unwrap_or(0),
            _ => 1,
        }
    }
}

/// Built-in scalar and temporal type names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    /// `str`
    Str,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `bool`
    Bool,
    /// `Decimal`
    Decimal,
    /// `datetime`
    DateTime,
    /// `time`
    Time,
    /// `timedelta`
    Duration,
}

impl BuiltinType {
    /// Recognize a built-in name (exact spelling, a few common aliases)
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "str" | "string" => Some(Self::Str),
            "int" | "integer" => Some(Self::Int),
            "float" => Some(Self::Float),
            "bool" | "boolean" => Some(Self::Bool),
            "Decimal" | "decimal" => Some(Self::Decimal),
            "datetime" | "datetime.datetime" => Some(Self::DateTime),
            "time" | "datetime.time" => Some(Self::Time),
            "timedelta" | "datetime.timedelta" => Some(Self::Duration),
            _ => None,
        }
    }
}

impl Display for TypeExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoneType => f.write_str("None"),
            Self::Any => f.write_str("Any"),
            Self::Named(name) => f.write_str(name),
            Self::List(elem) => match elem {
                Some(e) => write!(f, "list[{e}]"),
                None => f.write_str("list[Any]"),
            },
            Self::Set(elem) => match elem {
                Some(e) => write!(f, "set[{e}]"),
                None => f.write_str("set[Any]"),
            },
            Self::Dict(kv) => match kv {
                Some(kv) => write!(f, "dict[{}, {}]", kv.0, kv.1),
                None => f.write_str("dict[str, Any]"),
            },
            Self::Union(alts) => {
                for (i, alt) in alts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{alt}")?;
                }
                Ok(())
            }
            Self::Literal(choices) => {
                let parts: Vec<String> = choices.iter().map(Scalar::repr).collect();
                write!(f, "Literal[{}]", parts.join(", "))
            }
        }
    }
}

impl FromStr for TypeExpr {
    type Err = ParseAnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser { input: s, pos: 0 };
        let expr = parser.union()?;
        parser.skip_ws();
        if parser.pos < s.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(expr)
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &str) -> ParseAnnotationError {
        ParseAnnotationError::new(self.input, self.pos, message)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseAnnotationError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{expected}'")))
        }
    }

    fn union(&mut self) -> Result<TypeExpr, ParseAnnotationError> {
        let mut alts = vec![self.term()?];
        while self.eat('|') {
            alts.push(self.term()?);
        }
        Ok(if alts.len() == 1 {
            alts.remove(0)
        } else {
            TypeExpr::Union(alts)
        })
    }

    fn ident(&mut self) -> Result<&'a str, ParseAnnotationError> {
        let input = self.input;
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("expected type name"));
        }
        Ok(&input[start..self.pos])
    }

    fn args(&mut self) -> Result<Vec<TypeExpr>, ParseAnnotationError> {
        let mut args = vec![self.union()?];
        while self.eat(',') {
            args.push(self.union()?);
        }
        self.expect(']')?;
        Ok(args)
    }

    fn term(&mut self) -> Result<TypeExpr, ParseAnnotationError> {
        let head = self.ident()?.to_string();
        if !self.eat('[') {
            return Ok(match head.as_str() {
                "None" | "NoneType" => TypeExpr::NoneType,
                "Any" => TypeExpr::Any,
                "list" | "List" => TypeExpr::List(None),
                "set" | "Set" | "frozenset" | "FrozenSet" => TypeExpr::Set(None),
                "dict" | "Dict" | "Mapping" => TypeExpr::Dict(None),
                _ => TypeExpr::Named(head),
            });
        }
        if head == "Literal" {
            return self.literal();
        }
        let start = self.pos;
        let mut args = self.args()?;
        let arity_error = |expected: &str| {
            ParseAnnotationError::new(self.input, start, format!("{head} expects {expected}"))
        };
        match head.as_str() {
            "list" | "List" => match args.len() {
                1 => Ok(TypeExpr::list_of(args.remove(0))),
                _ => Err(arity_error("one argument")),
            },
            "set" | "Set" | "frozenset" | "FrozenSet" => match args.len() {
                1 => Ok(TypeExpr::set_of(args.remove(0))),
                _ => Err(arity_error("one argument")),
            },
            "dict" | "Dict" | "Mapping" => match args.len() {
                2 => {
                    let value = args.remove(1);
                    Ok(TypeExpr::dict_of(args.remove(0), value))
                }
                _ => Err(arity_error("two arguments")),
            },
            "Optional" => match args.len() {
                1 => Ok(TypeExpr::optional(args.remove(0))),
                _ => Err(arity_error("one argument")),
            },
            "Union" => Ok(if args.len() == 1 {
                args.remove(0)
            } else {
                TypeExpr::Union(args)
            }),
            _ => {
                // Unknown generic: kept under its full spelling
                let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
                Ok(TypeExpr::Named(format!("{head}[{}]", parts.join(", "))))
            }
        }
    }

    fn literal(&mut self) -> Result<TypeExpr, ParseAnnotationError> {
        let mut choices = vec![self.scalar()?];
        while self.eat(',') {
            choices.push(self.scalar()?);
        }
        self.expect(']')?;
        Ok(TypeExpr::Literal(choices))
    }

    fn scalar(&mut self) -> Result<Scalar, ParseAnnotationError> {
        self.skip_ws();
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                let len = self.input[start..]
                    .find(quote)
                    .ok_or_else(|| self.error("unterminated string literal"))?;
                self.pos = start + len + 1;
                Ok(Scalar::Str(self.input[start..start + len].to_string()))
            }
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let start = self.pos;
                self.pos += 1;
                while matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
                    self.pos += 1;
                }
                self.input[start..self.pos]
                    .parse()
                    .map(Scalar::Int)
                    .map_err(|_| ParseAnnotationError::new(self.input, start, "invalid integer literal"))
            }
            _ => match self.ident()? {
                "True" | "true" => Ok(Scalar::Bool(true)),
                "False" | "false" => Ok(Scalar::Bool(false)),
                _ => Err(self.error("expected literal value")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(s: &str) -> TypeExpr {
        s.parse().unwrap()
    }

    #[test]
    fn parses_primitives_and_names() {
        assert_eq!(parse("str"), TypeExpr::named("str"));
        assert_eq!(parse("demo.InnerModel"), TypeExpr::named("demo.InnerModel"));
        assert_eq!(parse("None"), TypeExpr::NoneType);
        assert_eq!(parse("Any"), TypeExpr::Any);
    }

    #[test]
    fn parses_generics() {
        assert_eq!(parse("list[str]"), TypeExpr::list_of(TypeExpr::named("str")));
        assert_eq!(parse("set"), TypeExpr::Set(None));
        assert_eq!(
            parse("dict[str, list[int]]"),
            TypeExpr::dict_of(
                TypeExpr::named("str"),
                TypeExpr::list_of(TypeExpr::named("int"))
            )
        );
    }

    #[test]
    fn optional_and_pipe_forms_agree() {
        assert_eq!(parse("Optional[int]"), parse("int | None"));
        assert_eq!(
            parse("Union[A, B, None]"),
            TypeExpr::Union(vec![
                TypeExpr::named("A"),
                TypeExpr::named("B"),
                TypeExpr::NoneType
            ])
        );
    }

    #[test]
    fn parses_literals() {
        assert_eq!(
            parse(r#"Literal["aggressive", 'passive', 3, True]"#),
            TypeExpr::Literal(vec![
                Scalar::from("aggressive"),
                Scalar::from("passive"),
                Scalar::Int(3),
                Scalar::Bool(true),
            ])
        );
    }

    #[test]
    fn unknown_generic_keeps_spelling() {
        assert_eq!(parse("tuple[int, str]"), TypeExpr::named("tuple[int, str]"));
    }

    #[test]
    fn rejects_malformed_text() {
        let err = "list[str".parse::<TypeExpr>().unwrap_err();
        assert_eq!(err.offset, 8);
        assert!("dict[str]".parse::<TypeExpr>().is_err());
        assert!("Literal[".parse::<TypeExpr>().is_err());
        assert!("int str".parse::<TypeExpr>().is_err());
    }

    #[test]
    fn display_names() {
        assert_eq!(parse("int | None").to_string(), "int | None");
        assert_eq!(TypeExpr::List(None).to_string(), "list[Any]");
        assert_eq!(TypeExpr::Dict(None).to_string(), "dict[str, Any]");
        assert_eq!(
            parse("Literal['a', 'b']").to_string(),
            "Literal['a', 'b']"
        );
        assert_eq!(parse("Optional[dict[str, Decimal]]").to_string(), "dict[str, Decimal] | None");
    }

    #[test]
    fn admits_none_and_depth() {
        assert!(parse("int | None").admits_none());
        assert!(!parse("list[int]").admits_none());
        assert_eq!(parse("list[dict[str, int]]").depth(), 3);
    }
}
