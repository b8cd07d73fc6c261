//! 谓词查询语言的词法分析器
//!
//! 分词分两步完成：
//!
//! 1. 使用一个由符号运算符、逻辑关键字、括号、空白和引号字符串组成的正则表达式切分输入，
//!    分隔符本身也作为片段保留；
//! 2. 遍历片段，丢弃空白，并把不属于逻辑分组的括号区间（例如方法参数 `("miller")`
//!    或值表达式 `(1==2 ? 3 : 5)`）折叠成一个不透明的文本 token。

use regex::Regex;
use tracing::debug;

use crate::config::{ConfigError, OperatorList};
use crate::token::{Span, Token, TokenKind};

/// 正则切分得到的原始片段
#[derive(Debug, Clone, Copy, PartialEq)]
struct Fragment {
    /// `None` 表示空白
    kind: Option<TokenKind>,
    span: Span,
}

impl Fragment {
    fn new(kind: Option<TokenKind>, start: usize, end: usize) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }
}

/// 分词器，在创建时捕获运算符配置
#[derive(Debug, Clone)]
pub struct Tokenizer {
    pattern: Regex,
}

impl Tokenizer {
    /// 根据运算符列表构建切分用的正则表达式
    ///
    /// 运算符按列表顺序参与匹配，因此列表必须按长度降序排列。
    /// 方法风格运算符（以字母开头）不参与切分。
    pub fn new(operators: &OperatorList) -> Result<Self, ConfigError> {
        let mut alternatives = vec![
            r#"(?P<quoted>"[^"]*")"#.to_string(),
            r"(?P<blank>\s+)".to_string(),
        ];

        let symbolic: Vec<String> = operators.symbolic().map(regex::escape).collect();
        if !symbolic.is_empty() {
            alternatives.push(format!("(?P<op>{})", symbolic.join("|")));
        }

        alternatives.push(r"(?P<keyword>\b(?:not|and|or)\b)".to_string());
        alternatives.push(r"(?P<paren>[()])".to_string());

        let pattern = Regex::new(&alternatives.join("|"))?;
        Ok(Self { pattern })
    }

    /// 将查询字符串切分为 token 序列
    pub fn tokenize<'a>(&self, query: &'a str) -> Vec<Token<'a>> {
        let fragments = self.split(query);
        let mut tokens: Vec<Token<'a>> = Vec::with_capacity(fragments.len());
        let mut index = 0;

        while index < fragments.len() {
            let fragment = fragments[index];
            index += 1;

            let Some(kind) = fragment.kind else {
                continue; // 跳过空白
            };

            // 左括号前面不是逻辑关键字或左括号时，尝试折叠为值表达式
            if kind == TokenKind::LParen && opens_value(tokens.last()) {
                if let Some(close) = matching_close(&fragments, index) {
                    let span = Span::new(fragment.span.start, fragments[close].span.end);
                    tokens.push(Token::new(TokenKind::Text, &query[span.start..span.end], span));
                    index = close + 1;
                    continue;
                }
            }

            if let Some(token) = trimmed(query, kind, fragment.span) {
                tokens.push(token);
            }
        }

        debug!(query, tokens = tokens.len(), "tokenized query");
        tokens
    }

    /// 按正则切分输入，保留分隔符，相邻的文本片段合并
    fn split(&self, query: &str) -> Vec<Fragment> {
        let mut fragments: Vec<Fragment> = Vec::new();
        let mut last = 0;

        for caps in self.pattern.captures_iter(query) {
            let Some(m) = caps.get(0) else {
                continue;
            };
            if m.start() > last {
                push_fragment(&mut fragments, Fragment::new(Some(TokenKind::Text), last, m.start()));
            }

            let kind = if caps.name("quoted").is_some() {
                Some(TokenKind::Text)
            } else if caps.name("blank").is_some() {
                None
            } else if caps.name("op").is_some() {
                Some(TokenKind::Operator)
            } else if caps.name("keyword").is_some() {
                Some(match m.as_str() {
                    "and" => TokenKind::And,
                    "or" => TokenKind::Or,
                    _ => TokenKind::Not,
                })
            } else if m.as_str() == "(" {
                Some(TokenKind::LParen)
            } else {
                Some(TokenKind::RParen)
            };

            push_fragment(&mut fragments, Fragment::new(kind, m.start(), m.end()));
            last = m.end();
        }

        if last < query.len() {
            push_fragment(&mut fragments, Fragment::new(Some(TokenKind::Text), last, query.len()));
        }

        fragments
    }
}

/// 文本片段紧邻上一个文本片段时合并，例如 `a"b c"d`
fn push_fragment(fragments: &mut Vec<Fragment>, fragment: Fragment) {
    if fragment.kind == Some(TokenKind::Text) {
        if let Some(previous) = fragments.last_mut() {
            if previous.kind == Some(TokenKind::Text) && previous.span.end == fragment.span.start {
                previous.span.end = fragment.span.end;
                return;
            }
        }
    }
    fragments.push(fragment);
}

/// 左括号是否开启一个值表达式而不是逻辑分组
fn opens_value(previous: Option<&Token<'_>>) -> bool {
    previous.is_some_and(|token| !token.kind.is_keyword() && token.kind != TokenKind::LParen)
}

/// 从 `from` 开始查找与已消费的左括号匹配的右括号
///
/// 遇到 `and`/`or` 说明这是一个逻辑分组，放弃折叠；输入结束仍未闭合同样放弃。
fn matching_close(fragments: &[Fragment], from: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (offset, fragment) in fragments[from..].iter().enumerate() {
        match fragment.kind {
            Some(TokenKind::And) | Some(TokenKind::Or) => return None,
            Some(TokenKind::LParen) => depth += 1,
            Some(TokenKind::RParen) => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// 去除片段两端空白，空片段返回 `None`
fn trimmed<'a>(query: &'a str, kind: TokenKind, span: Span) -> Option<Token<'a>> {
    let raw = &query[span.start..span.end];
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    let start = span.start + (raw.len() - raw.trim_start().len());
    Some(Token::new(kind, text, Span::new(start, start + text.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        let tokenizer = Tokenizer::new(&OperatorList::default()).unwrap();
        tokenizer
            .tokenize(input)
            .into_iter()
            .map(|t| t.text.to_string())
            .collect()
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        let tokenizer = Tokenizer::new(&OperatorList::default()).unwrap();
        tokenizer.tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_conjunction() {
        assert_eq!(texts("a and b"), vec!["a", "and", "b"]);
        assert_eq!(kinds("a and b"), vec![TokenKind::Text, TokenKind::And, TokenKind::Text]);
    }

    #[test]
    fn test_method_call_arguments_are_folded() {
        assert_eq!(texts("a.Contains(x)"), vec!["a.Contains", "(x)"]);
        assert_eq!(
            texts(r#"name.StartsWith("J")"#),
            vec!["name.StartsWith", r#"("J")"#]
        );
    }

    #[test]
    fn test_value_expression_is_folded() {
        assert_eq!(
            texts("x == (1==2 ? 3 : 5)"),
            vec!["x", "==", "(1==2 ? 3 : 5)"]
        );
        assert_eq!(
            kinds("x == (1==2 ? 3 : 5)"),
            vec![TokenKind::Text, TokenKind::Operator, TokenKind::Text]
        );
    }

    #[test]
    fn test_nested_value_parentheses() {
        assert_eq!(texts("f((a)(b)) == 1"), vec!["f", "((a)(b))", "==", "1"]);
    }

    #[test]
    fn test_logical_group_is_not_folded() {
        assert_eq!(texts("(a and b)"), vec!["(", "a", "and", "b", ")"]);
        assert_eq!(texts("not (a)"), vec!["not", "(", "a", ")"]);
        assert_eq!(texts("((a) or b)"), vec!["(", "(", "a", ")", "or", "b", ")"]);
    }

    #[test]
    fn test_fold_aborts_on_logical_keyword() {
        assert_eq!(
            texts("x == (a and b)"),
            vec!["x", "==", "(", "a", "and", "b", ")"]
        );
    }

    #[test]
    fn test_parenthesis_after_close_is_folded() {
        assert_eq!(texts("(a) (b)"), vec!["(", "a", ")", "(b)"]);
        assert_eq!(
            kinds("(a) (b)"),
            vec![TokenKind::LParen, TokenKind::Text, TokenKind::RParen, TokenKind::Text]
        );
    }

    #[test]
    fn test_quoted_parenthesis_inside_fold() {
        assert_eq!(texts(r#"f("a)b")"#), vec!["f", r#"("a)b")"#]);
        assert_eq!(
            texts(r#"name.Contains("x or (y") and z"#),
            vec!["name.Contains", r#"("x or (y")"#, "and", "z"]
        );
    }

    #[test]
    fn test_fold_aborts_on_unclosed_parenthesis() {
        assert_eq!(texts("f(x"), vec!["f", "(", "x"]);
    }

    #[test]
    fn test_longest_operator_wins() {
        assert_eq!(texts("a<=b"), vec!["a", "<=", "b"]);
        assert_eq!(texts("a != b"), vec!["a", "!=", "b"]);
    }

    #[test]
    fn test_unsorted_operators_shadow_longer_ones() {
        let ops = OperatorList::new(["<", "<="]).unwrap();
        let tokenizer = Tokenizer::new(&ops).unwrap();
        let tokens: Vec<_> = tokenizer.tokenize("a<=b").into_iter().map(|t| t.text).collect();
        assert_eq!(tokens, vec!["a", "<", "=b"]);
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        assert_eq!(texts("android or notes"), vec!["android", "or", "notes"]);
        assert_eq!(kinds("not x"), vec![TokenKind::Not, TokenKind::Text]);
    }

    #[test]
    fn test_method_style_operators_are_not_delimiters() {
        assert_eq!(texts("a Contains b"), vec!["a", "Contains", "b"]);
        assert_eq!(texts("a.EndsWith"), vec!["a.EndsWith"]);
    }

    #[test]
    fn test_quoted_literal_is_one_token() {
        assert_eq!(
            texts(r#"name == "a and b""#),
            vec!["name", "==", r#""a and b""#]
        );
        assert_eq!(texts(r#"a"b c"d"#), vec![r#"a"b c"d"#]);
    }

    #[test]
    fn test_whitespace_only_input() {
        assert!(texts("").is_empty());
        assert!(texts("   \t ").is_empty());
    }

    #[test]
    fn test_spans_point_into_input() {
        let input = "  age >= 18";
        let tokenizer = Tokenizer::new(&OperatorList::default()).unwrap();
        let tokens = tokenizer.tokenize(input);
        assert_eq!(tokens[0].span, Span::new(2, 5));
        assert_eq!(tokens[1].span, Span::new(6, 8));
        assert_eq!(&input[tokens[2].span.start..tokens[2].span.end], "18");
    }
}
