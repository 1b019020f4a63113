//! 内容管理后台服务
//!
//! 为内容目录提供 REST API。
//!
//! ## 核心功能
//!
//! - **属性管理**：可复用属性及其单选/多选属性值
//! - **内容模型**：从属性库中挑选属性与属性值组成模型
//! - **内容分类**：分类树的增删改、移动与同级排序，分类可绑定内容模型
//! - **内容管理**：内容项 CRUD 及按分类模型进行的属性值选择
//!
//! ## 模块结构
//!
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: 错误类型与 HTTP 映射
//! - `handlers`: HTTP 请求处理器
//! - `routes`: 路由配置
//! - `state`: 应用状态
//!
//! 所有业务规则在 `content_catalog` 中实现，本 crate 只做协议转换。

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use dto::{ApiResponse, PageResponse};
pub use error::{AdminError, Result};
pub use routes::build_router;
pub use state::AppState;
