use serde::{Serialize, Serializer};
use std::{fmt, mem};

/// 解析树的节点, 逻辑连接词为内部节点, 谓词为叶子
///
/// 长的 and/or 链会生成与链长同样深的右倾树, 下面的 `Display`、`Clone`、
/// `PartialEq` 与 `Drop` 都用显式栈遍历。
pub enum Node {
    /// 逻辑或运算 (or)
    Or(Box<Node>, Box<Node>),
    /// 逻辑与运算 (and)
    And(Box<Node>, Box<Node>),
    /// 逻辑非运算 (not), 只有一个子节点
    Not(Box<Node>),
    /// 指向已提取谓词的叶子节点
    Predicate { id: String, label: String },
    /// 谓词缺失时的占位叶子, 显示为 `?`
    Placeholder,
}

impl Node {
    pub fn or(left: Node, right: Node) -> Self {
        Node::Or(Box::new(left), Box::new(right))
    }

    pub fn and(left: Node, right: Node) -> Self {
        Node::And(Box::new(left), Box::new(right))
    }

    pub fn not(child: Node) -> Self {
        Node::Not(Box::new(child))
    }

    /// 节点名称: 连接词本身, 或叶子的显示文本
    pub fn name(&self) -> &str {
        match self {
            Node::Or(..) => "or",
            Node::And(..) => "and",
            Node::Not(_) => "not",
            Node::Predicate { label, .. } => label,
            Node::Placeholder => "?",
        }
    }

    pub fn left(&self) -> Option<&Node> {
        match self {
            Node::Or(left, _) | Node::And(left, _) | Node::Not(left) => Some(left),
            _ => None,
        }
    }

    pub fn right(&self) -> Option<&Node> {
        match self {
            Node::Or(_, right) | Node::And(_, right) => Some(right),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Predicate { .. } | Node::Placeholder)
    }

    /// 叶子数量（包括占位叶子）
    ///
    /// 长的 and/or 链会生成很深的右倾树, 这里用显式栈遍历。
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                count += 1;
            }
            stack.extend(node.left());
            stack.extend(node.right());
        }
        count
    }
}

/// 显示时待输出的片段
enum Piece<'a> {
    Tree(&'a Node),
    Text(&'static str),
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![Piece::Tree(self)];
        while let Some(piece) = pending.pop() {
            match piece {
                Piece::Text(text) => f.write_str(text)?,
                Piece::Tree(node) => match node {
                    Node::Or(left, right) | Node::And(left, right) => {
                        let separator = if matches!(node, Node::Or(..)) {
                            " or "
                        } else {
                            " and "
                        };
                        f.write_str("(")?;
                        pending.push(Piece::Text(")"));
                        pending.push(Piece::Tree(right));
                        pending.push(Piece::Text(separator));
                        pending.push(Piece::Tree(left));
                    }
                    Node::Not(child) => {
                        f.write_str("not (")?;
                        pending.push(Piece::Text(")"));
                        pending.push(Piece::Tree(child));
                    }
                    leaf => f.write_str(leaf.name())?,
                },
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({self})")
    }
}

/// 序列化为显示文本; 叶子的详细内容由谓词列表提供
impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        enum Step<'a> {
            Visit(&'a Node),
            Build(&'a Node),
        }

        let mut steps = vec![Step::Visit(self)];
        let mut built: Vec<Node> = Vec::new();

        while let Some(step) = steps.pop() {
            match step {
                Step::Visit(node) => match node {
                    Node::Or(left, right) | Node::And(left, right) => {
                        steps.push(Step::Build(node));
                        steps.push(Step::Visit(right));
                        steps.push(Step::Visit(left));
                    }
                    Node::Not(child) => {
                        steps.push(Step::Build(node));
                        steps.push(Step::Visit(child));
                    }
                    Node::Predicate { id, label } => built.push(Node::Predicate {
                        id: id.clone(),
                        label: label.clone(),
                    }),
                    Node::Placeholder => built.push(Node::Placeholder),
                },
                // 子节点已按先左后右的顺序压入 built
                Step::Build(node) => {
                    let last = built.pop().unwrap_or(Node::Placeholder);
                    let rebuilt = match node {
                        Node::Or(..) => Node::or(built.pop().unwrap_or(Node::Placeholder), last),
                        Node::And(..) => Node::and(built.pop().unwrap_or(Node::Placeholder), last),
                        _ => Node::not(last),
                    };
                    built.push(rebuilt);
                }
            }
        }

        built.pop().unwrap_or(Node::Placeholder)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let mut pairs = vec![(self, other)];
        while let Some(pair) = pairs.pop() {
            match pair {
                (Node::Or(a, b), Node::Or(c, d)) | (Node::And(a, b), Node::And(c, d)) => {
                    pairs.push((&**a, &**c));
                    pairs.push((&**b, &**d));
                }
                (Node::Not(a), Node::Not(b)) => pairs.push((&**a, &**b)),
                (
                    Node::Predicate { id, label },
                    Node::Predicate {
                        id: other_id,
                        label: other_label,
                    },
                ) => {
                    if id != other_id || label != other_label {
                        return false;
                    }
                }
                (Node::Placeholder, Node::Placeholder) => {}
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Node {}

impl Drop for Node {
    fn drop(&mut self) {
        let mut detached = Vec::new();
        detach_children(self, &mut detached);
        while let Some(mut node) = detached.pop() {
            detach_children(&mut node, &mut detached);
        }
    }
}

/// 把子节点移出到 `detached`, 原位置留下占位叶子
fn detach_children(node: &mut Node, detached: &mut Vec<Node>) {
    match node {
        Node::Or(left, right) | Node::And(left, right) => {
            detached.push(mem::replace(&mut **left, Node::Placeholder));
            detached.push(mem::replace(&mut **right, Node::Placeholder));
        }
        Node::Not(child) => detached.push(mem::replace(&mut **child, Node::Placeholder)),
        Node::Predicate { .. } | Node::Placeholder => {}
    }
}

/// 一个被提取的比较谓词, 例如 `age > 18`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Predicate {
    /// 按创建顺序分配的标识符: A, B, ..., Z, AA, AB, ...
    pub id: String,
    pub attribute: String,
    pub operator: String,
    pub value: String,
}

impl Predicate {
    pub fn new(
        id: String,
        attribute: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id,
            attribute: attribute.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// 单独的属性名会被合成为 `attribute == true`
    pub fn is_truth_test(&self) -> bool {
        self.operator == "==" && self.value == "true"
    }

    /// 解析树叶子使用的显示文本
    pub fn label(&self) -> String {
        if self.is_truth_test() {
            self.attribute.clone()
        } else {
            format!("{} {} {}", self.attribute, self.operator, self.value)
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}: {}, {}, {}]",
            self.id, self.attribute, self.operator, self.value
        )
    }
}

/// 第 `index` 个谓词的标识符, 超过 Z 之后使用多字母 (AA, AB, ...)
pub fn predicate_id(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}
