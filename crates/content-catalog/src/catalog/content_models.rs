//! 内容模型表操作

use std::collections::HashSet;

use tracing::debug;

use super::dto::{ModelPatch, NewModel};
use super::{Catalog, EntityKey, bump, now, require_text};
use crate::error::{CatalogError, Result};
use crate::models::{
    ContentModel, ModelAttributeValueRef, ModelAttributeView, ModelDetail, ModelValueView,
};
use crate::selection::ModelSelection;

impl Catalog {
    pub fn create_model(&mut self, input: NewModel) -> Result<ContentModel> {
        let name = require_text("模型名称", &input.name)?;
        let selection = self.build_selection(&input.attribute_ids, &input.value_selections)?;

        let id = bump(&mut self.ids.model);
        let timestamp = now();
        let model = ContentModel {
            id,
            name,
            description: input.description.trim().to_string(),
            sort: input.sort,
            is_active: input.is_active,
            bindings: selection.into_bindings(),
            created_at: timestamp,
            updated_at: timestamp,
        };

        self.models.insert(id, model.clone());
        self.touch(EntityKey::Model(id));
        Ok(model)
    }

    /// 更新模型，收窄绑定时清理不再被允许的内容选择
    pub fn update_model(&mut self, id: i64, patch: ModelPatch) -> Result<ContentModel> {
        let mut model = self.model_ref(id)?.clone();

        if let Some(name) = &patch.name {
            model.name = require_text("模型名称", name)?;
        }
        if let Some(description) = &patch.description {
            model.description = description.trim().to_string();
        }
        if let Some(sort) = patch.sort {
            model.sort = sort;
        }
        if let Some(is_active) = patch.is_active {
            model.is_active = is_active;
        }

        let rebind = patch.touches_bindings();
        if rebind {
            let attribute_ids = patch
                .attribute_ids
                .unwrap_or_else(|| model.attribute_ids());
            let value_selections = patch
                .value_selections
                .unwrap_or_else(|| value_refs(&model));
            model.bindings = self
                .build_selection(&attribute_ids, &value_selections)?
                .into_bindings();
        }

        model.updated_at = now();
        self.models.insert(id, model.clone());
        self.touch(EntityKey::Model(id));

        if rebind {
            let bound: HashSet<i64> = self
                .categories
                .values()
                .filter(|c| c.model_id == Some(id))
                .map(|c| c.id)
                .collect();
            let repaired = self.reconcile_contents(|item| {
                item.category_id.is_some_and(|c| bound.contains(&c))
            });
            debug!(model_id = id, repaired, "Content selections reconciled");
        }

        Ok(model)
    }

    /// 删除模型
    ///
    /// 绑定该模型的分类解除绑定，这些分类下内容项的属性值选择被清空
    pub fn delete_model(&mut self, id: i64) -> Result<()> {
        self.model_ref(id)?;
        self.models.remove(&id);
        self.touch(EntityKey::Model(id));

        let timestamp = now();
        let mut unbound = HashSet::new();
        for category in self.categories.values_mut() {
            if category.model_id == Some(id) {
                category.model_id = None;
                category.updated_at = timestamp;
                unbound.insert(category.id);
            }
        }
        for category_id in &unbound {
            self.touch(EntityKey::Category(*category_id));
        }

        self.reconcile_contents(|item| item.category_id.is_some_and(|c| unbound.contains(&c)));
        Ok(())
    }

    /// 模型联合视图
    pub fn get_model(&self, id: i64) -> Result<ModelDetail> {
        let model = self.model_ref(id)?;
        Ok(self.model_detail(model))
    }

    /// 全部模型（联合视图），按 (sort, id) 升序
    pub fn list_models(&self) -> Vec<ModelDetail> {
        let mut models: Vec<&ContentModel> = self.models.values().collect();
        models.sort_by_key(|m| (m.sort, m.id));
        models.into_iter().map(|m| self.model_detail(m)).collect()
    }

    /// 模型绑定的属性 id，按绑定顺序
    pub fn get_model_attributes(&self, id: i64) -> Result<Vec<i64>> {
        Ok(self.model_ref(id)?.attribute_ids())
    }

    /// 模型允许的 (属性, 属性值) 列表
    pub fn get_model_attribute_values(&self, id: i64) -> Result<Vec<ModelAttributeValueRef>> {
        Ok(value_refs(self.model_ref(id)?))
    }

    pub(crate) fn model_detail(&self, model: &ContentModel) -> ModelDetail {
        let attributes = model
            .bindings
            .iter()
            .filter_map(|binding| {
                let attribute = self.attributes.get(&binding.attribute_id)?;
                Some(ModelAttributeView {
                    attribute_id: attribute.id,
                    attribute_name: attribute.name.clone(),
                    attribute_type: attribute.cardinality,
                    values: attribute
                        .values
                        .iter()
                        .map(|v| ModelValueView {
                            id: v.id,
                            value: v.value.clone(),
                            sort: v.sort,
                            is_active: v.is_active,
                            is_selected: binding.allowed_value_ids.contains(&v.id),
                        })
                        .collect(),
                })
            })
            .collect();

        ModelDetail {
            id: model.id,
            name: model.name.clone(),
            description: model.description.clone(),
            sort: model.sort,
            is_active: model.is_active,
            attributes,
        }
    }

    /// 由表单提交构建模型选择
    ///
    /// 未勾选属性的值被忽略；勾选属性但未提交值时视为全选
    fn build_selection(
        &self,
        attribute_ids: &[i64],
        value_selections: &[ModelAttributeValueRef],
    ) -> Result<ModelSelection> {
        let mut selection = ModelSelection::new();
        let mut seen = HashSet::new();

        for attribute_id in attribute_ids {
            if !seen.insert(*attribute_id) {
                continue;
            }
            let attribute = self
                .attributes
                .get(attribute_id)
                .ok_or_else(|| CatalogError::validation(format!("属性不存在: {attribute_id}")))?;

            let submitted: Vec<i64> = value_selections
                .iter()
                .filter(|r| r.attribute_id == *attribute_id)
                .map(|r| r.attribute_value_id)
                .collect();

            if submitted.is_empty() {
                selection.toggle_attribute(attribute, true);
            } else {
                selection.set_values(attribute, &submitted)?;
            }
        }

        Ok(selection)
    }
}

fn value_refs(model: &ContentModel) -> Vec<ModelAttributeValueRef> {
    model
        .bindings
        .iter()
        .flat_map(|binding| {
            binding
                .allowed_value_ids
                .iter()
                .map(move |value_id| ModelAttributeValueRef {
                    attribute_id: binding.attribute_id,
                    attribute_value_id: *value_id,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::dto::*;
    use super::super::fixtures::*;
    use super::*;
    use crate::models::Cardinality;

    #[test]
    fn test_create_model_applies_form_rules() {
        let mut seeded = seeded();
        let catalog = &mut seeded.catalog;

        let model = catalog
            .create_model(NewModel {
                name: "M2".to_string(),
                attribute_ids: vec![seeded.size, seeded.color],
                value_selections: vec![
                    ModelAttributeValueRef {
                        attribute_id: seeded.size,
                        attribute_value_id: seeded.m,
                    },
                    // Color 未提交值 -> 全选；此条属于未勾选的属性 -> 忽略
                    ModelAttributeValueRef {
                        attribute_id: 999,
                        attribute_value_id: 1,
                    },
                ],
                ..Default::default()
            })
            .unwrap();

        assert_eq!(model.attribute_ids(), vec![seeded.size, seeded.color]);
        assert!(model.allows(seeded.size, seeded.m));
        assert!(!model.allows(seeded.size, seeded.s));
        assert!(model.allows(seeded.color, seeded.red));
        assert!(model.allows(seeded.color, seeded.blue));
    }

    #[test]
    fn test_create_model_rejects_unknown_references() {
        let mut seeded = seeded();
        let catalog = &mut seeded.catalog;
        let cases = [
            NewModel {
                name: "bad attr".to_string(),
                attribute_ids: vec![404],
                ..Default::default()
            },
            NewModel {
                name: "foreign value".to_string(),
                attribute_ids: vec![seeded.size],
                value_selections: vec![ModelAttributeValueRef {
                    attribute_id: seeded.size,
                    attribute_value_id: seeded.red,
                }],
                ..Default::default()
            },
            NewModel {
                name: "   ".to_string(),
                ..Default::default()
            },
        ];

        for input in cases {
            let err = catalog.create_model(input).unwrap_err();
            assert!(matches!(err, CatalogError::Validation(_)));
        }
        assert_eq!(catalog.model_count(), 1);
    }

    #[test]
    fn test_get_model_joined_view() {
        let seeded = seeded();

        let detail = seeded.catalog.get_model(seeded.model).unwrap();

        assert_eq!(detail.attributes.len(), 2);
        let size = &detail.attributes[1];
        assert_eq!(size.attribute_name, "Size");
        assert_eq!(size.attribute_type, Cardinality::Single);
        let values: Vec<&str> = size.values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(values, vec!["S", "M", "L"]);
        assert!(size.values.iter().all(|v| v.is_selected));
    }

    #[test]
    fn test_model_attribute_queries() {
        let seeded = seeded();
        let catalog = &seeded.catalog;

        assert_eq!(
            catalog.get_model_attributes(seeded.model).unwrap(),
            vec![seeded.color, seeded.size]
        );
        let refs = catalog.get_model_attribute_values(seeded.model).unwrap();
        assert_eq!(refs.len(), 5);
        assert_eq!(
            refs[0],
            ModelAttributeValueRef {
                attribute_id: seeded.color,
                attribute_value_id: seeded.red
            }
        );
        assert!(matches!(
            catalog.get_model_attributes(404),
            Err(CatalogError::ModelNotFound(404))
        ));
    }

    /// 收窄模型绑定后，使用该模型的内容项选择被清理
    #[test]
    fn test_narrowing_model_purges_selections() {
        let mut seeded = seeded();
        let catalog = &mut seeded.catalog;
        let item = catalog
            .create_content(NewContent {
                title: "tee".to_string(),
                category_id: Some(seeded.category),
                attribute_value_ids: vec![seeded.red, seeded.l],
                ..Default::default()
            })
            .unwrap();

        catalog
            .update_model(
                seeded.model,
                ModelPatch {
                    attribute_ids: Some(vec![seeded.color]),
                    ..Default::default()
                },
            )
            .unwrap();

        let content = catalog.get_content(item.id).unwrap();
        assert_eq!(content.selections.value_ids(), vec![seeded.red]);
        assert_eq!(
            catalog.get_model_attribute_values(seeded.model).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_update_metadata_keeps_bindings() {
        let mut seeded = seeded();
        let catalog = &mut seeded.catalog;

        let model = catalog
            .update_model(
                seeded.model,
                ModelPatch {
                    name: Some("Apparel".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(model.name, "Apparel");
        assert_eq!(model.attribute_ids(), vec![seeded.color, seeded.size]);
    }

    /// 删除模型：分类解除绑定，内容选择清空
    #[test]
    fn test_delete_model_nulls_categories() {
        let mut seeded = seeded();
        let catalog = &mut seeded.catalog;
        let item = catalog
            .create_content(NewContent {
                title: "tee".to_string(),
                category_id: Some(seeded.category),
                attribute_value_ids: vec![seeded.m],
                ..Default::default()
            })
            .unwrap();

        catalog.delete_model(seeded.model).unwrap();

        assert_eq!(catalog.get_category(seeded.category).unwrap().model_id, None);
        assert!(catalog.get_content(item.id).unwrap().selections.is_empty());
        assert!(catalog.list_models().is_empty());
    }
}
