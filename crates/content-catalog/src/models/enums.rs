//! 内容目录枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use serde::{Deserialize, Serialize};

/// 属性选择模式
///
/// 决定内容项在同一属性下最多能选几个值
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum Cardinality {
    /// 单选 - 每个内容项最多一个值
    #[default]
    Single,
    /// 多选 - 可同时选择多个值
    Multiple,
}

impl Cardinality {
    pub fn is_single(self) -> bool {
        matches!(self, Self::Single)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multiple => "multiple",
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Cardinality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "multiple" => Ok(Self::Multiple),
            other => Err(format!("未知的属性类型: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinality_serde() {
        assert_eq!(
            serde_json::to_string(&Cardinality::Multiple).unwrap(),
            "\"multiple\""
        );
        let parsed: Cardinality = serde_json::from_str("\"single\"").unwrap();
        assert_eq!(parsed, Cardinality::Single);
    }

    #[test]
    fn test_cardinality_from_str() {
        assert_eq!("multiple".parse::<Cardinality>(), Ok(Cardinality::Multiple));
        assert!("MULTI".parse::<Cardinality>().is_err());
    }
}
