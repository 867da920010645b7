//! Parser for textual type annotations
//!
//! Grammar:
//!
//! ```text
//! expr  := term ('|' term)*
//! term  := NAME ('[' args ']')?
//! args  := expr (',' expr)* | '...'
//! ```

use std::sync::Arc;

use thiserror::Error;

use super::{ContainerKind, EnumType, ScalarKind, TupleShape, TypeExpr};
use crate::schema::RecordSchema;

/// Resolves names that are not built-in types
pub trait TypeResolver {
    fn resolve_record(&self, name: &str) -> Option<Arc<RecordSchema>>;

    fn resolve_enum(&self, name: &str) -> Option<Arc<EnumType>> {
        let _ = name;
        None
    }
}

/// Resolver that knows no user types
pub struct NoResolver;

impl TypeResolver for NoResolver {
    fn resolve_record(&self, _name: &str) -> Option<Arc<RecordSchema>> {
        None
    }
}

/// Annotation parse failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown type name '{0}'")]
    Unresolved(String),

    #[error("invalid type annotation '{input}': {reason}")]
    Syntax { input: String, reason: String },
}

/// Parses annotation text into a [`TypeExpr`]
pub fn parse_type_expr(src: &str, resolver: &dyn TypeResolver) -> Result<TypeExpr, ParseError> {
    let mut parser = Parser {
        src,
        tokens: tokenize(src)?,
        pos: 0,
        resolver,
    };
    let expr = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.syntax("unexpected trailing input"));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Open,
    Close,
    Comma,
    Pipe,
    Ellipsis,
}

fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '[' => tokens.push(Token::Open),
            ']' => tokens.push(Token::Close),
            ',' => tokens.push(Token::Comma),
            '|' => tokens.push(Token::Pipe),
            '.' => {
                if src[i..].starts_with("...") {
                    chars.next();
                    chars.next();
                    tokens.push(Token::Ellipsis);
                } else {
                    return Err(ParseError::Syntax {
                        input: src.to_string(),
                        reason: format!("unexpected '.' at {}", i),
                    });
                }
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut end = i + c.len_utf8();
                while let Some(&(j, next)) = chars.peek() {
                    // dotted paths such as typing.List keep only the last segment
                    if next.is_alphanumeric() || next == '_' || (next == '.' && !src[j..].starts_with("...")) {
                        end = j + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let word = &src[i..end];
                let name = word.rsplit('.').next().unwrap_or(word);
                tokens.push(Token::Name(name.to_string()));
            }
            other => {
                return Err(ParseError::Syntax {
                    input: src.to_string(),
                    reason: format!("unexpected character '{}'", other),
                })
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    resolver: &'a dyn TypeResolver,
}

impl<'a> Parser<'a> {
    fn syntax(&self, reason: &str) -> ParseError {
        ParseError::Syntax {
            input: self.src.to_string(),
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), ParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.syntax(&format!("expected {}", what)))
        }
    }

    fn expr(&mut self) -> Result<TypeExpr, ParseError> {
        let mut members = vec![self.term()?];
        while self.eat(&Token::Pipe) {
            members.push(self.term()?);
        }
        Ok(collapse_union(members))
    }

    fn args(&mut self) -> Result<Vec<Option<TypeExpr>>, ParseError> {
        self.expect(&Token::Open, "'['")?;
        let mut args = Vec::new();
        loop {
            if self.eat(&Token::Ellipsis) {
                args.push(None);
            } else {
                args.push(Some(self.expr()?));
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::Close, "']'")?;
        Ok(args)
    }

    fn skip_brackets(&mut self) -> Result<(), ParseError> {
        if !self.eat(&Token::Open) {
            return Ok(());
        }
        let mut depth = 1;
        while depth > 0 {
            match self.tokens.get(self.pos) {
                Some(Token::Open) => depth += 1,
                Some(Token::Close) => depth -= 1,
                Some(_) => {}
                None => return Err(self.syntax("unbalanced brackets")),
            }
            self.pos += 1;
        }
        Ok(())
    }

    fn single(&mut self, name: &str) -> Result<TypeExpr, ParseError> {
        let mut args = self.args()?;
        if args.len() != 1 {
            return Err(self.syntax(&format!("{} takes exactly one parameter", name)));
        }
        args.pop()
            .flatten()
            .ok_or_else(|| self.syntax("'...' is only valid in Tuple"))
    }

    fn term(&mut self) -> Result<TypeExpr, ParseError> {
        let name = match self.peek() {
            Some(Token::Name(name)) => name.clone(),
            _ => return Err(self.syntax("expected a type name")),
        };
        self.pos += 1;
        let has_args = self.peek() == Some(&Token::Open);

        let expr = match name.as_str() {
            "Any" | "object" => TypeExpr::Any,
            "None" | "NoneType" => return Ok(TypeExpr::optional(TypeExpr::Any)),
            "Optional" => TypeExpr::optional(self.single("Optional")?),
            "Union" => {
                let members = self
                    .args()?
                    .into_iter()
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| self.syntax("'...' is only valid in Tuple"))?;
                collapse_union(members)
            }
            "List" | "list" | "Sequence" if has_args => TypeExpr::list(self.single("List")?),
            "Set" | "set" if has_args => TypeExpr::set(self.single("Set")?),
            "FrozenSet" | "frozenset" if has_args => TypeExpr::frozenset(self.single("FrozenSet")?),
            "Tuple" | "tuple" if has_args => {
                let args = self.args()?;
                let homogeneous = matches!(args.as_slice(), [Some(_), None]);
                if homogeneous {
                    let mut items: Vec<TypeExpr> = args.into_iter().flatten().collect();
                    TypeExpr::tuple_of(items.remove(0))
                } else {
                    let items = args
                        .into_iter()
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| self.syntax("'...' must follow a single element type"))?;
                    TypeExpr::Tuple(TupleShape::Fixed(items))
                }
            }
            "Dict" | "dict" | "Mapping" if has_args => {
                let args = self.args()?;
                match args.as_slice() {
                    [Some(k), Some(v)] => TypeExpr::mapping(k.clone(), v.clone()),
                    _ => return Err(self.syntax("Dict takes a key and a value type")),
                }
            }
            "List" | "list" | "Sequence" => TypeExpr::Bare(ContainerKind::List),
            "Set" | "set" => TypeExpr::Bare(ContainerKind::Set),
            "FrozenSet" | "frozenset" => TypeExpr::Bare(ContainerKind::FrozenSet),
            "Tuple" | "tuple" => TypeExpr::Bare(ContainerKind::Tuple),
            "Dict" | "dict" | "Mapping" => TypeExpr::Bare(ContainerKind::Dict),
            "Callable" => {
                self.skip_brackets()?;
                TypeExpr::Callable
            }
            "Awaitable" | "Coroutine" => {
                self.skip_brackets()?;
                TypeExpr::Awaitable
            }
            other => {
                if let Some(kind) = ScalarKind::from_name(other) {
                    TypeExpr::Scalar(kind)
                } else if let Some(schema) = self.resolver.resolve_record(other) {
                    TypeExpr::Record(schema)
                } else if let Some(ty) = self.resolver.resolve_enum(other) {
                    TypeExpr::Enum(ty)
                } else {
                    return Err(ParseError::Unresolved(other.to_string()));
                }
            }
        };
        Ok(expr)
    }
}

/// Folds `None` members into `Optional` and unwraps one-member unions
fn collapse_union(members: Vec<TypeExpr>) -> TypeExpr {
    let none = TypeExpr::optional(TypeExpr::Any);
    let nullable = members.iter().any(|m| *m == none);
    let mut rest: Vec<TypeExpr> = members.into_iter().filter(|m| *m != none).collect();

    let inner = match rest.len() {
        0 => TypeExpr::Any,
        1 => rest.remove(0),
        _ => TypeExpr::Union(rest),
    };
    if nullable && !inner.accepts_null() {
        TypeExpr::optional(inner)
    } else {
        inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> TypeExpr {
        parse_type_expr(src, &NoResolver).unwrap()
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse("int"), TypeExpr::int());
        assert_eq!(parse("datetime"), TypeExpr::Scalar(ScalarKind::DateTime));
        assert_eq!(parse("typing.Any"), TypeExpr::Any);
    }

    #[test]
    fn test_parse_nested() {
        assert_eq!(
            parse("Optional[List[int]]"),
            TypeExpr::optional(TypeExpr::list(TypeExpr::int()))
        );
        assert_eq!(
            parse("Dict[str, Union[int, str]]"),
            TypeExpr::mapping(TypeExpr::str(), TypeExpr::union(vec![TypeExpr::int(), TypeExpr::str()]))
        );
    }

    #[test]
    fn test_parse_tuples() {
        assert_eq!(
            parse("Tuple[str, int]"),
            TypeExpr::tuple(vec![TypeExpr::str(), TypeExpr::int()])
        );
        assert_eq!(parse("Tuple[float, ...]"), TypeExpr::tuple_of(TypeExpr::float()));
        assert_eq!(parse("tuple"), TypeExpr::Bare(ContainerKind::Tuple));
    }

    #[test]
    fn test_none_in_union_becomes_optional() {
        assert_eq!(parse("Union[int, None]"), TypeExpr::optional(TypeExpr::int()));
        assert_eq!(parse("int | None"), TypeExpr::optional(TypeExpr::int()));
        assert_eq!(
            parse("Union[str, List[str]]"),
            TypeExpr::union(vec![TypeExpr::str(), TypeExpr::list(TypeExpr::str())])
        );
    }

    #[test]
    fn test_callable_parameters_ignored() {
        assert_eq!(parse("Callable[[int], str]"), TypeExpr::Callable);
        assert_eq!(parse("Awaitable"), TypeExpr::Awaitable);
    }

    #[test]
    fn test_unresolved_name() {
        let err = parse_type_expr("List[Animal]", &NoResolver).unwrap_err();
        assert_eq!(err, ParseError::Unresolved("Animal".to_string()));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(
            parse_type_expr("List[int", &NoResolver),
            Err(ParseError::Syntax { .. })
        ));
        assert!(matches!(
            parse_type_expr("int]", &NoResolver),
            Err(ParseError::Syntax { .. })
        ));
        assert!(matches!(
            parse_type_expr("Dict[str]", &NoResolver),
            Err(ParseError::Syntax { .. })
        ));
    }
}
