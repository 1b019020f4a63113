//! 内容目录领域模型
//!
//! 包含属性、内容模型、分类与内容项的实体定义

pub mod attribute;
pub mod category;
pub mod content;
pub mod content_model;
pub mod enums;

// 重新导出常用类型
pub use attribute::{Attribute, AttributeValue};
pub use category::{Category, CategoryNode};
pub use content::{AttributeSelection, ContentItem, SelectionSet};
pub use content_model::{
    ContentModel, ModelAttributeBinding, ModelAttributeValueRef, ModelAttributeView, ModelDetail,
    ModelSummary, ModelValueView,
};
pub use enums::Cardinality;
