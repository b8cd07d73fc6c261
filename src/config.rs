//! 配置模块，负责运算符列表以及JSON配置文件的加载

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::parser::DEFAULT_MAX_DEPTH;

/// 默认运算符列表，已按长度降序排列
pub const DEFAULT_OPERATORS: [&str; 10] = [
    "==", "!=", "<=", ">=", "<", ">", "in", "Contains", "StartsWith", "EndsWith",
];

/// 不能作为运算符使用的保留词
const RESERVED: [&str; 5] = ["and", "or", "not", "(", ")"];

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse JSON config {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("operator list must not be empty")]
    EmptyOperatorList,

    #[error("operator list contains an empty operator")]
    EmptyOperator,

    #[error("'{0}' is reserved and cannot be used as an operator")]
    ReservedOperator(String),

    #[error("cannot build tokenizer pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// 有序的运算符列表
///
/// 调用者负责按长度降序排列（较长的运算符必须先于它的前缀匹配，例如 `<=` 先于 `<`），
/// 这里不做校验。以字母开头的运算符被视为方法风格运算符（如 `Contains`），
/// 其余为符号比较运算符。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorList(Vec<String>);

impl OperatorList {
    /// 按给定顺序创建运算符列表，拒绝空列表、空运算符和保留词
    pub fn new<I, S>(operators: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let operators: Vec<String> = operators.into_iter().map(Into::into).collect();
        if operators.is_empty() {
            return Err(ConfigError::EmptyOperatorList);
        }
        for op in &operators {
            if op.is_empty() {
                return Err(ConfigError::EmptyOperator);
            }
            if RESERVED.contains(&op.as_str()) {
                return Err(ConfigError::ReservedOperator(op.clone()));
            }
        }
        Ok(Self(operators))
    }

    /// 创建运算符列表，并按长度降序稳定排序
    pub fn sorted_by_length<I, S>(operators: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::new(operators)?;
        list.0.sort_by(|a, b| b.len().cmp(&a.len()));
        Ok(list)
    }

    /// 方法风格运算符以字母开头
    pub fn is_method_style(operator: &str) -> bool {
        operator.chars().next().is_some_and(char::is_alphabetic)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// 参与分词的符号运算符，保持原有顺序
    pub fn symbolic(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|op| !Self::is_method_style(op))
    }

    pub fn contains(&self, operator: &str) -> bool {
        self.0.iter().any(|op| op == operator)
    }

    /// 列表中的第一个运算符，两段式谓词缺少运算符时使用
    pub fn first(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or(DEFAULT_OPERATORS[0])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for OperatorList {
    fn default() -> Self {
        Self(DEFAULT_OPERATORS.iter().map(|op| op.to_string()).collect())
    }
}

/// 查询解析的配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// 运算符列表
    pub operators: Vec<String>,
    /// 加载时是否按长度降序重新排列运算符
    pub sort_operators: bool,
    /// `not` 与括号的最大嵌套深度
    pub max_depth: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            operators: DEFAULT_OPERATORS.iter().map(|op| op.to_string()).collect(),
            sort_operators: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl QueryConfig {
    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        // 检查文件是否存在
        if !path_ref.exists() {
            return Err(ConfigError::NotFound(path_ref.to_path_buf()));
        }

        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            origin: path_ref.display().to_string(),
            source,
        })
    }

    /// 从JSON字符串加载配置
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Json {
            origin: "<inline>".to_string(),
            source,
        })
    }

    /// 校验并构建运算符列表
    pub fn operator_list(&self) -> Result<OperatorList, ConfigError> {
        if self.sort_operators {
            OperatorList::sorted_by_length(self.operators.iter().cloned())
        } else {
            OperatorList::new(self.operators.iter().cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_operator_list() {
        let ops = OperatorList::default();
        assert_eq!(ops.len(), 10);
        assert_eq!(ops.first(), "==");
        assert!(ops.contains("StartsWith"));
        assert!(!ops.contains("~~"));
    }

    #[test]
    fn test_symbolic_operators_skip_method_style() {
        let ops = OperatorList::default();
        let symbolic: Vec<_> = ops.symbolic().collect();
        assert_eq!(symbolic, vec!["==", "!=", "<=", ">=", "<", ">"]);
        assert!(OperatorList::is_method_style("Contains"));
        assert!(OperatorList::is_method_style("in"));
        assert!(!OperatorList::is_method_style("=~"));
    }

    #[test]
    fn test_sorted_by_length_is_stable() {
        let ops = OperatorList::sorted_by_length(["<", "==", "<=", "=~", "Like"]).unwrap();
        let ordered: Vec<_> = ops.iter().collect();
        assert_eq!(ordered, vec!["Like", "==", "<=", "=~", "<"]);
    }

    #[test]
    fn test_reserved_and_empty_operators_rejected() {
        assert!(matches!(
            OperatorList::new(["==", "and"]),
            Err(ConfigError::ReservedOperator(op)) if op == "and"
        ));
        assert!(matches!(
            OperatorList::new(["("]),
            Err(ConfigError::ReservedOperator(_))
        ));
        assert!(matches!(
            OperatorList::new(["==", ""]),
            Err(ConfigError::EmptyOperator)
        ));
        assert!(matches!(
            OperatorList::new(Vec::<String>::new()),
            Err(ConfigError::EmptyOperatorList)
        ));
    }

    #[test]
    fn test_load_valid_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query_config.json");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"{{
                "operators": ["=", "=~", "<>"],
                "sort_operators": true,
                "max_depth": 32
            }}"#
        )
        .unwrap();

        let config = QueryConfig::from_json_file(&path).unwrap();
        assert_eq!(config.max_depth, 32);

        let ops = config.operator_list().unwrap();
        assert_eq!(ops.iter().collect::<Vec<_>>(), vec!["=~", "<>", "="]);
    }

    #[test]
    fn test_invalid_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "invalid json").unwrap();

        let result = QueryConfig::from_json_file(&path);
        assert!(matches!(result, Err(ConfigError::Json { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = QueryConfig::from_json_file("non_existent_query_config.json");
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = QueryConfig::from_json_str(r#"{ "max_depth": 4 }"#).unwrap();
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.operators.len(), DEFAULT_OPERATORS.len());

        let config = QueryConfig::from_json_str("{}").unwrap();
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.operator_list().unwrap(), OperatorList::default());
    }
}
