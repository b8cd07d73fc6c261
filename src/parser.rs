//! 谓词查询语言的语法分析器
//!
//! ## 解析流程图
//!
//! ```text
//! parse()
//!   └─ parse_disjunct()                Conjunct ("or" Conjunct)*   右结合
//!        └─ parse_conjunct()           Term ("and" Term)*          右结合
//!             └─ parse_term()
//!                  ├─ "not" → parse_term()                         一元节点
//!                  ├─ "("   → parse_disjunct(), 期望 ")"
//!                  └─ 其他  → parse_predicate()
//!                               ├─ 向前扫描直到 ")" / "and" / "or" / 输入结束
//!                               └─ add_expression() 按 token 数量提取谓词
//! ```
//!
//! ## 谓词提取
//!
//! | token 数 | 形式                         | 结果                              |
//! |----------|------------------------------|-----------------------------------|
//! | 0        | (空)                         | 错误, 占位符 `?`                  |
//! | 1        | `active`                     | `active == true`                  |
//! | 2        | `name.StartsWith` `("J")`    | `name StartsWith J`               |
//! | 2        | `a` `b`                      | 错误, `a <第一个运算符> b`         |
//! | ≥3       | `age` `>` `18`               | `age > 18`, 未知运算符记录错误     |
//! | ≥3       | `first` `name` `==` `J` `S`  | `first name == J S`, 保留原文空白  |
//!
//! ## 错误恢复
//!
//! 解析从不中断: 每个错误都被记录到错误列表中, 解析继续进行直到输入结束,
//! 最终返回尽可能完整的解析树。调用者应在使用解析树之前检查错误列表。
//!
//! 解析树与 logic 字符串在同一次遍历中构建, logic 字符串使用谓词标识符代替谓词文本,
//! 例如 `age > 18 and not (x or y)` 的 logic 字符串为 `A and not (B or C)`。

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::ast::{predicate_id, Node, Predicate};
use crate::config::OperatorList;
use crate::token::{Token, TokenKind};

/// 默认的最大嵌套深度
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// 可恢复的解析错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum ParseErrorKind {
    #[error("Expected attribute expression")]
    MissingAttributeExpression,
    #[error("Expected comparison value")]
    MissingComparisonValue,
    #[error("Unknown operator")]
    UnknownOperator,
    #[error("Expected close parenthesis")]
    MissingCloseParenthesis,
    #[error("Parser stopped unexpectedly")]
    UnexpectedTrailingInput,
    #[error("Expression nested too deeply")]
    NestingTooDeep,
}

/// 一条解析错误, `context` 为完整的 token 序列, 出错位置用方括号标出
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind} at token {position}: {context}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: usize,
    pub context: String,
}

impl ParseError {
    fn new(kind: ParseErrorKind, position: usize, tokens: &[Token<'_>]) -> Self {
        Self {
            kind,
            position,
            context: render_context(tokens, position),
        }
    }
}

/// 一次解析的完整结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    /// 解析树的根节点
    pub tree: Node,
    /// 使用谓词标识符的逻辑表达式, 例如 `A and (B or C)`
    pub logic: String,
    /// 按文本顺序提取的谓词
    pub predicates: Vec<Predicate>,
    /// 按出现顺序记录的错误
    pub errors: Vec<ParseError>,
    /// 本次解析的 token 序列
    pub tokens: Vec<String>,
}

impl ParseResult {
    /// 没有任何错误时, 解析树、logic 字符串与谓词才可以放心使用
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// 按标识符查找谓词
    pub fn predicate(&self, id: &str) -> Option<&Predicate> {
        self.predicates.iter().find(|p| p.id == id)
    }
}

pub struct Parser<'a> {
    /// 原始查询, token 的 span 指向其中
    source: &'a str,
    tokens: &'a [Token<'a>],
    operators: &'a OperatorList,
    position: usize,
    max_depth: usize,
    depth: usize,
    /// 超过嵌套深度后停止解析
    halted: bool,
    logic: String,
    predicates: Vec<Predicate>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: &'a [Token<'a>], operators: &'a OperatorList) -> Self {
        Self {
            source,
            tokens,
            operators,
            position: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
            halted: false,
            logic: String::new(),
            predicates: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// 设置 `not` 与括号的最大嵌套深度
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 返回当前 token 的类型，不推进位置
    fn peek_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.position).map(|token| token.kind)
    }

    /// 推进位置一个 token
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    /// 检查当前 token 是否匹配给定类型
    fn match_token(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn error(&mut self, kind: ParseErrorKind, position: usize) {
        trace!(?kind, position, "recorded parse error");
        self.errors.push(ParseError::new(kind, position, self.tokens));
    }

    /// 解析全部 token, 从不失败
    pub fn parse(mut self) -> ParseResult {
        let tree = self.parse_disjunct();

        if !self.halted && self.position < self.tokens.len() {
            self.error(ParseErrorKind::UnexpectedTrailingInput, self.position);
        }

        ParseResult {
            tree,
            logic: self.logic,
            predicates: self.predicates,
            errors: self.errors,
            tokens: self.tokens.iter().map(|t| t.text.to_string()).collect(),
        }
    }

    /// 解析OR表达式 (最低优先级)
    ///
    /// 语法: `conjunct ("or" disjunct)?`
    /// 用循环收集操作数再从右向左合并, 结果与递归写法相同: `a or b or c` → `(a or (b or c))`
    fn parse_disjunct(&mut self) -> Node {
        let mut operands = vec![self.parse_conjunct()];

        while self.match_token(TokenKind::Or) {
            self.advance(); // 消费 or
            self.logic.push_str(" or ");
            operands.push(self.parse_conjunct());
        }

        fold_right(operands, Node::or)
    }

    /// 解析AND表达式
    ///
    /// 语法: `term ("and" conjunct)?`
    fn parse_conjunct(&mut self) -> Node {
        let mut operands = vec![self.parse_term()];

        while self.match_token(TokenKind::And) {
            self.advance(); // 消费 and
            self.logic.push_str(" and ");
            operands.push(self.parse_term());
        }

        fold_right(operands, Node::and)
    }

    /// 解析基础表达式 (最高优先级)
    ///
    /// - `not term` - 一元取反
    /// - `(disjunct)` - 分组, 缺少右括号时记录错误并返回已构建的子树
    /// - 其他 - 谓词
    fn parse_term(&mut self) -> Node {
        match self.peek_kind() {
            Some(TokenKind::Not) => {
                if !self.enter() {
                    return Node::Placeholder;
                }
                self.advance(); // 消费 not
                self.logic.push_str("not ");
                let operand = self.parse_term();
                self.depth -= 1;
                Node::not(operand)
            }
            Some(TokenKind::LParen) => {
                if !self.enter() {
                    return Node::Placeholder;
                }
                self.advance(); // 消费 (
                self.logic.push('(');
                let inner = self.parse_disjunct();
                if self.match_token(TokenKind::RParen) {
                    self.advance(); // 消费 )
                    self.logic.push(')');
                } else if !self.halted {
                    self.error(ParseErrorKind::MissingCloseParenthesis, self.position);
                }
                self.depth -= 1;
                inner
            }
            _ => self.parse_predicate(),
        }
    }

    /// 一段连续 token 在原始查询中覆盖的文本, 保留 token 之间的空白
    fn source_text(&self, tokens: &[Token<'_>]) -> String {
        let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
            return String::new();
        };
        match self.source.get(first.span.start..last.span.end) {
            Some(text) => text.to_string(),
            None => tokens
                .iter()
                .map(|token| token.text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// 进入一层嵌套; 超过最大深度时记录错误并停止解析
    fn enter(&mut self) -> bool {
        if self.depth >= self.max_depth {
            self.error(ParseErrorKind::NestingTooDeep, self.position);
            self.logic.push('?');
            self.halted = true;
            self.position = self.tokens.len();
            return false;
        }
        self.depth += 1;
        true
    }

    /// 扫描谓词 token 直到 `)`、`and`、`or` 或输入结束
    fn parse_predicate(&mut self) -> Node {
        let start = self.position;
        while let Some(kind) = self.peek_kind() {
            if kind.ends_predicate() {
                break;
            }
            self.advance();
        }
        self.add_expression(start, self.position - start)
    }

    /// 从 `[start, start + count)` 区间的 token 中提取一个谓词
    fn add_expression(&mut self, start: usize, count: usize) -> Node {
        let tokens = self.tokens;
        let span = &tokens[start..start + count];

        let (attribute, operator, value) = match span {
            [] => {
                self.error(ParseErrorKind::MissingAttributeExpression, start);
                self.logic.push('?');
                return Node::Placeholder;
            }
            // 单独的属性名表示 "属性为真"
            [attribute] => (attribute.text.to_string(), "==".to_string(), "true".to_string()),
            [first, second] => match method_call(first.text, second.text) {
                Some((attribute, operator, value)) => {
                    (attribute.to_string(), operator.to_string(), value.to_string())
                }
                None => {
                    self.error(ParseErrorKind::MissingComparisonValue, start + 1);
                    (
                        first.text.to_string(),
                        self.operators.first().to_string(),
                        second.text.to_string(),
                    )
                }
            },
            _ => {
                // 属性是首个符号运算符之前的全部 token; 该运算符不在首尾时才生效, 否则按位置取第二个 token
                let split = span[1..span.len() - 1]
                    .iter()
                    .position(|token| token.kind == TokenKind::Operator)
                    .map_or(1, |offset| offset + 1);
                let operator = span[split].text;
                if !self.operators.contains(operator) {
                    self.error(ParseErrorKind::UnknownOperator, start + split);
                }
                (
                    self.source_text(&span[..split]),
                    operator.to_string(),
                    self.source_text(&span[split + 1..]),
                )
            }
        };

        let predicate = Predicate::new(
            predicate_id(self.predicates.len()),
            attribute,
            operator,
            value,
        );
        self.logic.push_str(&predicate.id);

        let node = Node::Predicate {
            id: predicate.id.clone(),
            label: predicate.label(),
        };
        self.predicates.push(predicate);
        node
    }
}

/// 将操作数从右向左合并为右倾树
fn fold_right(operands: Vec<Node>, join: fn(Node, Node) -> Node) -> Node {
    let mut iter = operands.into_iter().rev();
    let Some(mut tree) = iter.next() else {
        return Node::Placeholder;
    };
    for left in iter {
        tree = join(left, tree);
    }
    tree
}

/// 识别 `attribute.Method` `(value)` 形式
///
/// 最后一个 `.` 不能位于开头或结尾, 第二个 token 必须被括号包围。
fn method_call<'t>(target: &'t str, arguments: &'t str) -> Option<(&'t str, &'t str, &'t str)> {
    let dot = target.rfind('.')?;
    if dot == 0 || dot == target.len() - 1 {
        return None;
    }
    let inner = arguments.strip_prefix('(')?.strip_suffix(')')?;
    Some((&target[..dot], &target[dot + 1..], unquote(inner.trim())))
}

/// 去掉一层成对的引号
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// 渲染 token 序列, 出错位置用方括号标出; 位置在输入末尾时追加 `[]`
fn render_context(tokens: &[Token<'_>], position: usize) -> String {
    let mut parts: Vec<String> = tokens
        .iter()
        .enumerate()
        .map(|(index, token)| {
            if index == position {
                format!("[{}]", token.text)
            } else {
                token.text.to_string()
            }
        })
        .collect();
    if position >= tokens.len() {
        parts.push("[]".to_string());
    }
    parts.join(" ")
}
