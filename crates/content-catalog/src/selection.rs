//! 模型属性选择状态机
//!
//! 编辑内容模型时对属性和属性值的勾选操作。所有转换都保持
//! "绑定至少有一个允许值" 的不变量：最后一个值被取消时绑定随之移除。

use std::collections::BTreeSet;

use crate::error::{CatalogError, Result};
use crate::models::{Attribute, ModelAttributeBinding};

/// 模型的属性选择
///
/// 绑定按勾选顺序保存
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSelection {
    bindings: Vec<ModelAttributeBinding>,
}

impl ModelSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从已有绑定恢复，空绑定会被丢弃
    pub fn from_bindings(bindings: Vec<ModelAttributeBinding>) -> Self {
        Self {
            bindings: bindings
                .into_iter()
                .filter(|b| !b.allowed_value_ids.is_empty())
                .collect(),
        }
    }

    /// 勾选 / 取消勾选属性
    ///
    /// 勾选时允许该属性当前的全部值，取消时移除整条绑定
    pub fn toggle_attribute(&mut self, attribute: &Attribute, on: bool) {
        if !on {
            self.remove_attribute(attribute.id);
            return;
        }

        let all: BTreeSet<i64> = attribute.values.iter().map(|v| v.id).collect();
        if all.is_empty() {
            self.remove_attribute(attribute.id);
            return;
        }

        match self.position(attribute.id) {
            Some(idx) => self.bindings[idx].allowed_value_ids = all,
            None => self.bindings.push(ModelAttributeBinding {
                attribute_id: attribute.id,
                allowed_value_ids: all,
            }),
        }
    }

    /// 勾选 / 取消勾选属性值
    ///
    /// 单选属性勾选时替换为仅含该值；多选属性勾选时追加。
    /// 取消勾选后若绑定为空则移除绑定。
    pub fn toggle_value(&mut self, attribute: &Attribute, value_id: i64, on: bool) -> Result<()> {
        if !attribute.has_value(value_id) {
            return Err(CatalogError::validation(format!(
                "属性值 {value_id} 不属于属性 {}",
                attribute.id
            )));
        }

        match (on, self.position(attribute.id)) {
            (true, Some(idx)) => {
                let allowed = &mut self.bindings[idx].allowed_value_ids;
                if attribute.cardinality.is_single() {
                    allowed.clear();
                }
                allowed.insert(value_id);
            }
            (true, None) => self.bindings.push(ModelAttributeBinding {
                attribute_id: attribute.id,
                allowed_value_ids: BTreeSet::from([value_id]),
            }),
            (false, Some(idx)) => {
                let allowed = &mut self.bindings[idx].allowed_value_ids;
                allowed.remove(&value_id);
                if allowed.is_empty() {
                    self.bindings.remove(idx);
                }
            }
            (false, None) => {}
        }

        Ok(())
    }

    /// 整体设置某属性的允许值（表单提交时使用）
    ///
    /// 值必须都属于该属性；空集合等同于取消勾选属性
    pub fn set_values(&mut self, attribute: &Attribute, value_ids: &[i64]) -> Result<()> {
        if let Some(foreign) = value_ids.iter().find(|id| !attribute.has_value(**id)) {
            return Err(CatalogError::validation(format!(
                "属性值 {foreign} 不属于属性 {}",
                attribute.id
            )));
        }

        let allowed: BTreeSet<i64> = value_ids.iter().copied().collect();
        if allowed.is_empty() {
            self.remove_attribute(attribute.id);
            return Ok(());
        }

        match self.position(attribute.id) {
            Some(idx) => self.bindings[idx].allowed_value_ids = allowed,
            None => self.bindings.push(ModelAttributeBinding {
                attribute_id: attribute.id,
                allowed_value_ids: allowed,
            }),
        }
        Ok(())
    }

    /// 按条件修剪某属性的允许值，返回是否有变化
    pub fn retain_values(&mut self, attribute_id: i64, keep: impl Fn(i64) -> bool) -> bool {
        let Some(idx) = self.position(attribute_id) else {
            return false;
        };

        let allowed = &mut self.bindings[idx].allowed_value_ids;
        let before = allowed.len();
        allowed.retain(|id| keep(*id));
        let changed = before != allowed.len();
        if allowed.is_empty() {
            self.bindings.remove(idx);
        }
        changed
    }

    /// 移除整条绑定，返回是否存在过
    pub fn remove_attribute(&mut self, attribute_id: i64) -> bool {
        match self.position(attribute_id) {
            Some(idx) => {
                self.bindings.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn is_selected(&self, attribute_id: i64) -> bool {
        self.position(attribute_id).is_some()
    }

    pub fn allowed_values(&self, attribute_id: i64) -> Option<&BTreeSet<i64>> {
        self.position(attribute_id)
            .map(|idx| &self.bindings[idx].allowed_value_ids)
    }

    pub fn bindings(&self) -> &[ModelAttributeBinding] {
        &self.bindings
    }

    pub fn into_bindings(self) -> Vec<ModelAttributeBinding> {
        self.bindings
    }

    fn position(&self, attribute_id: i64) -> Option<usize> {
        self.bindings
            .iter()
            .position(|b| b.attribute_id == attribute_id)
    }
}
