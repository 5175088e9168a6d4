//! Lexer for template text using logos
//!
//! A template is plain text with `$` directives. `$$` is a literal dollar
//! sign, `$Name` or `${Name}` a macro or keyword, and `$if(pred)` a keyword
//! with an argument. Line breaks are their own tokens so the engine can
//! rewrite them.

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    #[token("$$")]
    Dollar,

    /// Directive name plus its optional `(argument)`, without the `$`
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*(\([^)\r\n]*\))?", |lex| lex.slice()[1..].to_string())]
    #[regex(r"\$\{[A-Za-z_][A-Za-z0-9_]*\}", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].to_string()
    })]
    Directive(String),

    #[regex(r"\r\n|\n|\r")]
    Newline,

    #[regex(r"[^$\r\n]+", |lex| lex.slice().to_string())]
    Text(String),
}

/// Lex template text into tokens with spans
///
/// A `$` that starts no valid directive comes back as `Err(())`.
pub fn lex(input: &str) -> impl Iterator<Item = (Result<Token, ()>, Span)> + '_ {
    Token::lexer(input).spanned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lex(input).map(|(t, _)| t.unwrap()).collect()
    }

    #[test]
    fn test_text_and_macros() {
        assert_eq!(
            tokens("create table $ClassName ("),
            vec![
                Token::Text("create table ".to_string()),
                Token::Directive("ClassName".to_string()),
                Token::Text(" (".to_string()),
            ]
        );
    }

    #[test]
    fn test_adjacent_directives() {
        assert_eq!(
            tokens("$foreach$if(!owning)x$endif$endfor"),
            vec![
                Token::Directive("foreach".to_string()),
                Token::Directive("if(!owning)".to_string()),
                Token::Text("x".to_string()),
                Token::Directive("endif".to_string()),
                Token::Directive("endfor".to_string()),
            ]
        );
    }

    #[test]
    fn test_braced_directive() {
        assert_eq!(
            tokens("kflid${ClassName}_$FieldName"),
            vec![
                Token::Text("kflid".to_string()),
                Token::Directive("ClassName".to_string()),
                Token::Text("_".to_string()),
                Token::Directive("FieldName".to_string()),
            ]
        );
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(
            tokens("a\r\nb\nc\rd"),
            vec![
                Token::Text("a".to_string()),
                Token::Newline,
                Token::Text("b".to_string()),
                Token::Newline,
                Token::Text("c".to_string()),
                Token::Newline,
                Token::Text("d".to_string()),
            ]
        );
    }

    #[test]
    fn test_escaped_dollar() {
        assert_eq!(
            tokens("Class$$"),
            vec![Token::Text("Class".to_string()), Token::Dollar]
        );
    }

    #[test]
    fn test_stray_dollar_is_an_error() {
        let results: Vec<_> = lex("a $ b").collect();
        assert_eq!(results[0].0, Ok(Token::Text("a ".to_string())));
        assert_eq!(results[1].0, Err(()));
        assert_eq!(results[1].1.start, 2);
    }

    #[test]
    fn test_spans() {
        let spans: Vec<Span> = lex("ab$Guid\n").map(|(_, s)| s).collect();
        assert_eq!(spans, vec![0..2, 2..7, 7..8]);
    }
}
