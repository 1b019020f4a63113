//! 属性表操作
//!
//! 属性值被删除或属性被删除时，级联修剪模型绑定与内容选择；
//! 多选改单选时，内容项在该属性下只保留排序最靠前的值。

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use super::dto::{AttributePatch, NewAttribute, NewAttributeValue};
use super::{Catalog, EntityKey, bump, now, require_text};
use crate::error::{CatalogError, Result};
use crate::models::{Attribute, AttributeValue, Cardinality};
use crate::selection::ModelSelection;

impl Catalog {
    pub fn create_attribute(&mut self, input: NewAttribute) -> Result<Attribute> {
        let name = require_text("属性名称", &input.name)?;
        let values = self.normalize_values(input.values, &[])?;

        let id = bump(&mut self.ids.attribute);
        let timestamp = now();
        let mut attribute = Attribute {
            id,
            name,
            cardinality: input.cardinality,
            values,
            is_active: input.is_active,
            sort: input.sort,
            created_at: timestamp,
            updated_at: timestamp,
        };
        attribute.sort_values();

        self.attributes.insert(id, attribute.clone());
        self.touch(EntityKey::Attribute(id));
        Ok(attribute)
    }

    pub fn update_attribute(&mut self, id: i64, patch: AttributePatch) -> Result<Attribute> {
        let mut attribute = self.attribute_ref(id)?.clone();

        if let Some(name) = &patch.name {
            attribute.name = require_text("属性名称", name)?;
        }
        if let Some(is_active) = patch.is_active {
            attribute.is_active = is_active;
        }
        if let Some(sort) = patch.sort {
            attribute.sort = sort;
        }

        let mut removed = BTreeSet::new();
        if let Some(values) = patch.values {
            let values = self.normalize_values(values, &attribute.values)?;
            let kept: HashSet<i64> = values.iter().map(|v| v.id).collect();
            removed = attribute
                .value_ids()
                .into_iter()
                .filter(|v| !kept.contains(v))
                .collect();
            attribute.values = values;
            attribute.sort_values();
        }

        let narrowed = patch.cardinality == Some(Cardinality::Single)
            && attribute.cardinality == Cardinality::Multiple;
        if let Some(cardinality) = patch.cardinality {
            attribute.cardinality = cardinality;
        }

        attribute.updated_at = now();
        self.attributes.insert(id, attribute.clone());
        self.touch(EntityKey::Attribute(id));

        if !removed.is_empty() {
            self.prune_model_values(id, &removed);
        }
        if !removed.is_empty() || narrowed {
            let repaired = self.reconcile_contents(|item| {
                item.selections.iter().any(|s| s.attribute_id == id)
            });
            debug!(attribute_id = id, repaired, "Content selections reconciled");
        }

        Ok(attribute)
    }

    /// 删除属性，级联移除模型绑定和内容选择
    pub fn delete_attribute(&mut self, id: i64) -> Result<()> {
        self.attribute_ref(id)?;
        self.attributes.remove(&id);
        self.touch(EntityKey::Attribute(id));

        let timestamp = now();
        let mut pruned = Vec::new();
        for model in self.models.values_mut() {
            let mut selection = ModelSelection::from_bindings(std::mem::take(&mut model.bindings));
            if selection.remove_attribute(id) {
                model.updated_at = timestamp;
                pruned.push(model.id);
            }
            model.bindings = selection.into_bindings();
        }
        for model_id in pruned {
            self.touch(EntityKey::Model(model_id));
        }

        self.reconcile_contents(|item| item.selections.iter().any(|s| s.attribute_id == id));
        Ok(())
    }

    pub fn get_attribute(&self, id: i64) -> Result<Attribute> {
        self.attribute_ref(id).cloned()
    }

    /// 全部属性，按 (sort, id) 升序
    pub fn list_attributes(&self) -> Vec<Attribute> {
        let mut attributes: Vec<Attribute> = self.attributes.values().cloned().collect();
        attributes.sort_by_key(|a| (a.sort, a.id));
        attributes
    }

    /// 按名称搜索属性（不区分大小写的子串匹配）
    pub fn search_attributes(&self, query: &str) -> Vec<Attribute> {
        let query = query.trim().to_lowercase();
        self.list_attributes()
            .into_iter()
            .filter(|a| query.is_empty() || a.name.to_lowercase().contains(&query))
            .collect()
    }

    /// 按给定顺序重排属性值，顺序必须是当前值 id 的一个排列
    pub fn reorder_attribute_values(&mut self, id: i64, ordered: &[i64]) -> Result<Attribute> {
        let mut attribute = self.attribute_ref(id)?.clone();

        let current: BTreeSet<i64> = attribute.value_ids().into_iter().collect();
        let submitted: BTreeSet<i64> = ordered.iter().copied().collect();
        if submitted.len() != ordered.len() || submitted != current {
            return Err(CatalogError::validation(
                "排序列表必须恰好包含该属性的全部属性值",
            ));
        }

        for value in &mut attribute.values {
            if let Some(index) = ordered.iter().position(|v| *v == value.id) {
                value.sort = index as i32;
            }
        }
        attribute.sort_values();
        attribute.updated_at = now();

        self.attributes.insert(id, attribute.clone());
        self.touch(EntityKey::Attribute(id));
        Ok(attribute)
    }

    /// 规范化提交的属性值
    ///
    /// 去空白、丢弃空行、拒绝重复值和重复 id，带 id 的条目必须属于 `existing`。
    /// 整个列表校验通过后才分配新 id。
    fn normalize_values(
        &mut self,
        submitted: Vec<NewAttributeValue>,
        existing: &[AttributeValue],
    ) -> Result<Vec<AttributeValue>> {
        let submitted: Vec<NewAttributeValue> = submitted
            .into_iter()
            .filter(|v| !v.value.trim().is_empty())
            .collect();
        if submitted.is_empty() {
            return Err(CatalogError::validation("属性值不能为空"));
        }

        let mut seen_values = HashSet::new();
        let mut seen_ids = HashSet::new();
        let mut checked = Vec::with_capacity(submitted.len());
        for input in submitted {
            let value = input.value.trim().to_string();
            if !seen_values.insert(value.clone()) {
                return Err(CatalogError::validation(format!("属性值重复: {value}")));
            }

            let previous = match input.id {
                Some(value_id) => {
                    if !seen_ids.insert(value_id) {
                        return Err(CatalogError::validation(format!("属性值重复: {value_id}")));
                    }
                    let previous = existing.iter().find(|v| v.id == value_id).ok_or_else(|| {
                        CatalogError::validation(format!("属性值 {value_id} 不属于该属性"))
                    })?;
                    Some(previous)
                }
                None => None,
            };
            checked.push((input, value, previous));
        }

        let values = checked
            .into_iter()
            .enumerate()
            .map(|(index, (input, value, previous))| AttributeValue {
                id: match previous {
                    Some(p) => p.id,
                    None => bump(&mut self.ids.value),
                },
                value,
                sort: input.sort.unwrap_or(index as i32),
                is_active: input
                    .is_active
                    .or(previous.map(|p| p.is_active))
                    .unwrap_or(true),
            })
            .collect();

        Ok(values)
    }

    /// 从所有模型绑定中移除已删除的属性值，绑定为空时整条移除
    fn prune_model_values(&mut self, attribute_id: i64, removed: &BTreeSet<i64>) {
        let timestamp = now();
        let mut pruned = Vec::new();

        for model in self.models.values_mut() {
            let mut selection = ModelSelection::from_bindings(std::mem::take(&mut model.bindings));
            if selection.retain_values(attribute_id, |v| !removed.contains(&v)) {
                model.updated_at = timestamp;
                pruned.push(model.id);
            }
            model.bindings = selection.into_bindings();
        }

        for model_id in pruned {
            self.touch(EntityKey::Model(model_id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::dto::*;
    use super::super::fixtures::*;
    use super::*;
    use crate::models::ModelAttributeValueRef;

    #[test]
    fn test_create_trims_and_drops_blank_values() {
        let mut catalog = Catalog::new();
        let mut input = attribute("  Color ", Cardinality::Multiple, &[" Red ", "", "  "]);
        input.values.push(NewAttributeValue::new("Blue"));

        let color = catalog.create_attribute(input).unwrap();

        assert_eq!(color.name, "Color");
        let values: Vec<&str> = color.values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(values, vec!["Red", "Blue"]);
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let mut catalog = Catalog::new();
        let cases = [
            attribute(" ", Cardinality::Single, &["a"]),
            attribute("Size", Cardinality::Single, &[" ", ""]),
            attribute("Size", Cardinality::Single, &["M", " M"]),
        ];
        for input in cases {
            let err = catalog.create_attribute(input).unwrap_err();
            assert!(matches!(err, CatalogError::Validation(_)));
        }
        assert_eq!(catalog.attribute_count(), 0);
    }

    #[test]
    fn test_value_ids_are_globally_unique() {
        let mut catalog = Catalog::new();
        let a = catalog
            .create_attribute(attribute("A", Cardinality::Single, &["x", "y"]))
            .unwrap();
        let b = catalog
            .create_attribute(attribute("B", Cardinality::Single, &["x"]))
            .unwrap();

        let mut ids = a.value_ids();
        ids.extend(b.value_ids());
        let unique: BTreeSet<i64> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
    }

    /// 删除属性值后，模型绑定被修剪，绑定为空时整条移除，内容选择同步清理
    #[test]
    fn test_removing_value_prunes_bindings_and_selections() {
        let mut seeded = seeded();
        let catalog = &mut seeded.catalog;
        let model = catalog
            .create_model(NewModel {
                name: "red-only".to_string(),
                attribute_ids: vec![seeded.color],
                value_selections: vec![ModelAttributeValueRef {
                    attribute_id: seeded.color,
                    attribute_value_id: seeded.red,
                }],
                ..Default::default()
            })
            .unwrap();
        let item = catalog
            .create_content(NewContent {
                title: "shirt".to_string(),
                category_id: Some(seeded.category),
                attribute_value_ids: vec![seeded.red, seeded.blue],
                ..Default::default()
            })
            .unwrap();

        catalog
            .update_attribute(
                seeded.color,
                AttributePatch {
                    values: Some(vec![NewAttributeValue {
                        id: Some(seeded.blue),
                        ..NewAttributeValue::new("Blue")
                    }]),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(catalog.get_model_attributes(model.id).unwrap().is_empty());
        assert_eq!(
            catalog.get_model(seeded.model).unwrap().attributes[0].values.len(),
            1
        );
        assert_eq!(catalog.selections(item.id).unwrap().len(), 1);
        assert!(catalog.get_content(item.id).unwrap().selections.contains(seeded.color, seeded.blue));
    }

    #[test]
    fn test_update_keeps_value_ids_and_allocates_new() {
        let mut seeded = seeded();
        let catalog = &mut seeded.catalog;

        let updated = catalog
            .update_attribute(
                seeded.size,
                AttributePatch {
                    values: Some(vec![
                        NewAttributeValue { id: Some(seeded.s), ..NewAttributeValue::new("S") },
                        NewAttributeValue { id: Some(seeded.m), ..NewAttributeValue::new("M") },
                        NewAttributeValue { id: Some(seeded.l), ..NewAttributeValue::new("L") },
                        NewAttributeValue::new("XL"),
                    ]),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.values.len(), 4);
        assert_eq!(&updated.value_ids()[..3], &[seeded.s, seeded.m, seeded.l]);
        assert!(updated.values[3].id > seeded.l);
    }

    #[test]
    fn test_update_rejects_foreign_value_id() {
        let mut seeded = seeded();
        let err = seeded
            .catalog
            .update_attribute(
                seeded.size,
                AttributePatch {
                    values: Some(vec![NewAttributeValue {
                        id: Some(seeded.red),
                        ..NewAttributeValue::new("Red")
                    }]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn test_update_rejects_repeated_value_id() {
        let mut seeded = seeded();
        let err = seeded
            .catalog
            .update_attribute(
                seeded.color,
                AttributePatch {
                    values: Some(vec![
                        NewAttributeValue { id: Some(seeded.red), ..NewAttributeValue::new("Red") },
                        NewAttributeValue { id: Some(seeded.red), ..NewAttributeValue::new("Green") },
                    ]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        let color = seeded.catalog.get_attribute(seeded.color).unwrap();
        let unique: BTreeSet<i64> = color.value_ids().into_iter().collect();
        assert_eq!(unique.len(), color.values.len());
    }

    /// 校验失败的创建不消耗属性值 id
    #[test]
    fn test_rejected_create_keeps_value_sequence() {
        let mut catalog = Catalog::new();
        catalog
            .create_attribute(attribute("Size", Cardinality::Single, &["M", "L", "M"]))
            .unwrap_err();

        let size = catalog
            .create_attribute(attribute("Size", Cardinality::Single, &["M"]))
            .unwrap();
        assert_eq!(size.value_ids(), vec![1]);
    }

    /// 多选改单选后，内容项只保留排序最靠前的值
    #[test]
    fn test_multiple_to_single_trims_selections() {
        let mut seeded = seeded();
        let catalog = &mut seeded.catalog;
        let item = catalog
            .create_content(NewContent {
                title: "shirt".to_string(),
                category_id: Some(seeded.category),
                attribute_value_ids: vec![seeded.blue, seeded.red],
                ..Default::default()
            })
            .unwrap();

        catalog
            .update_attribute(
                seeded.color,
                AttributePatch {
                    cardinality: Some(Cardinality::Single),
                    ..Default::default()
                },
            )
            .unwrap();

        let content = catalog.get_content(item.id).unwrap();
        assert_eq!(content.selections.values_for(seeded.color), vec![seeded.red]);
    }

    #[test]
    fn test_delete_attribute_cascades() {
        let mut seeded = seeded();
        let catalog = &mut seeded.catalog;
        let item = catalog
            .create_content(NewContent {
                title: "shirt".to_string(),
                category_id: Some(seeded.category),
                attribute_value_ids: vec![seeded.red, seeded.m],
                ..Default::default()
            })
            .unwrap();

        catalog.delete_attribute(seeded.color).unwrap();

        assert_eq!(
            catalog.get_model_attributes(seeded.model).unwrap(),
            vec![seeded.size]
        );
        assert_eq!(catalog.get_content(item.id).unwrap().selections.value_ids(), vec![seeded.m]);
        assert!(matches!(
            catalog.get_attribute(seeded.color),
            Err(CatalogError::AttributeNotFound(_))
        ));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let seeded = seeded();
        let found = seeded.catalog.search_attributes("COL");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Color");
        assert_eq!(seeded.catalog.search_attributes("").len(), 2);
    }

    #[test]
    fn test_reorder_values() {
        let mut seeded = seeded();
        let catalog = &mut seeded.catalog;

        let reordered = catalog
            .reorder_attribute_values(seeded.size, &[seeded.l, seeded.s, seeded.m])
            .unwrap();
        assert_eq!(reordered.value_ids(), vec![seeded.l, seeded.s, seeded.m]);

        for bad in [vec![seeded.l, seeded.s], vec![seeded.l, seeded.l, seeded.m]] {
            let err = catalog.reorder_attribute_values(seeded.size, &bad).unwrap_err();
            assert!(matches!(err, CatalogError::Validation(_)));
        }
    }
}
