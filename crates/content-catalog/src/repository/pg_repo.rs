//! PostgreSQL 仓储
//!
//! 启动时整表加载组装快照；每个变更集在一个事务内写入。
//! 子表（属性值、模型绑定、内容选择）采用"先删后插"整体替换。

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use super::traits::CatalogRepositoryTrait;
use crate::catalog::{CatalogChange, CatalogSnapshot};
use crate::error::Result;
use crate::models::{
    Attribute, AttributeValue, Cardinality, Category, ContentItem, ContentModel,
    ModelAttributeBinding, SelectionSet,
};

#[derive(sqlx::FromRow)]
struct AttributeRow {
    id: i64,
    name: String,
    cardinality: Cardinality,
    sort: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AttributeValueRow {
    id: i64,
    attribute_id: i64,
    value: String,
    sort: i32,
    is_active: bool,
}

#[derive(sqlx::FromRow)]
struct ModelRow {
    id: i64,
    name: String,
    description: String,
    sort: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct BindingRow {
    model_id: i64,
    attribute_id: i64,
}

#[derive(sqlx::FromRow)]
struct BindingValueRow {
    model_id: i64,
    attribute_id: i64,
    attribute_value_id: i64,
}

#[derive(sqlx::FromRow)]
struct ContentRow {
    id: i64,
    title: String,
    description: String,
    sort: i32,
    is_active: bool,
    category_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SelectionRow {
    content_id: i64,
    attribute_id: i64,
    attribute_value_id: i64,
}

/// PostgreSQL 目录仓储
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_attributes(&self) -> Result<Vec<Attribute>> {
        let rows = sqlx::query_as::<_, AttributeRow>(
            r#"
            SELECT id, name, cardinality, sort, is_active, created_at, updated_at
            FROM content_attributes
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let value_rows = sqlx::query_as::<_, AttributeValueRow>(
            r#"
            SELECT id, attribute_id, value, sort, is_active
            FROM content_attribute_values
            ORDER BY attribute_id, sort, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut values: HashMap<i64, Vec<AttributeValue>> = HashMap::new();
        for row in value_rows {
            values.entry(row.attribute_id).or_default().push(AttributeValue {
                id: row.id,
                value: row.value,
                sort: row.sort,
                is_active: row.is_active,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| Attribute {
                values: values.remove(&row.id).unwrap_or_default(),
                id: row.id,
                name: row.name,
                cardinality: row.cardinality,
                is_active: row.is_active,
                sort: row.sort,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }

    async fn load_models(&self) -> Result<Vec<ContentModel>> {
        let rows = sqlx::query_as::<_, ModelRow>(
            r#"
            SELECT id, name, description, sort, is_active, created_at, updated_at
            FROM content_models
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let binding_rows = sqlx::query_as::<_, BindingRow>(
            r#"
            SELECT model_id, attribute_id
            FROM content_model_attributes
            ORDER BY model_id, position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let value_rows = sqlx::query_as::<_, BindingValueRow>(
            r#"
            SELECT model_id, attribute_id, attribute_value_id
            FROM content_model_attribute_values
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut bindings: HashMap<i64, Vec<ModelAttributeBinding>> = HashMap::new();
        for row in binding_rows {
            bindings.entry(row.model_id).or_default().push(ModelAttributeBinding {
                attribute_id: row.attribute_id,
                allowed_value_ids: Default::default(),
            });
        }
        for row in value_rows {
            if let Some(binding) = bindings
                .get_mut(&row.model_id)
                .and_then(|list| list.iter_mut().find(|b| b.attribute_id == row.attribute_id))
            {
                binding.allowed_value_ids.insert(row.attribute_value_id);
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut model_bindings = bindings.remove(&row.id).unwrap_or_default();
                model_bindings.retain(|b| !b.allowed_value_ids.is_empty());
                ContentModel {
                    id: row.id,
                    name: row.name,
                    description: row.description,
                    sort: row.sort,
                    is_active: row.is_active,
                    bindings: model_bindings,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                }
            })
            .collect())
    }

    async fn load_categories(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, sort, is_active, parent_id, model_id,
                   created_at, updated_at
            FROM content_categories
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn load_contents(&self) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query_as::<_, ContentRow>(
            r#"
            SELECT id, title, description, sort, is_active, category_id, created_at, updated_at
            FROM contents
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let selection_rows = sqlx::query_as::<_, SelectionRow>(
            r#"
            SELECT content_id, attribute_id, attribute_value_id
            FROM content_attribute_selections
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut selections: HashMap<i64, SelectionSet> = HashMap::new();
        for row in selection_rows {
            selections
                .entry(row.content_id)
                .or_default()
                .insert(row.attribute_id, row.attribute_value_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| ContentItem {
                selections: selections.remove(&row.id).unwrap_or_default(),
                id: row.id,
                title: row.title,
                description: row.description,
                sort: row.sort,
                is_active: row.is_active,
                category_id: row.category_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }
}

#[async_trait]
impl CatalogRepositoryTrait for PgCatalogRepository {
    #[instrument(skip(self))]
    async fn load_snapshot(&self) -> Result<CatalogSnapshot> {
        let snapshot = CatalogSnapshot {
            attributes: self.load_attributes().await?,
            models: self.load_models().await?,
            categories: self.load_categories().await?,
            contents: self.load_contents().await?,
        };

        debug!(
            attributes = snapshot.attributes.len(),
            models = snapshot.models.len(),
            categories = snapshot.categories.len(),
            contents = snapshot.contents.len(),
            "Catalog snapshot loaded"
        );

        Ok(snapshot)
    }

    #[instrument(skip(self, changes), fields(changes = changes.len()))]
    async fn apply_changes(&self, changes: &[CatalogChange]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for change in changes {
            match change {
                CatalogChange::UpsertAttribute(a) => upsert_attribute(&mut tx, a).await?,
                CatalogChange::DeleteAttribute(id) => {
                    sqlx::query("DELETE FROM content_attributes WHERE id = $1")
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }
                CatalogChange::UpsertModel(m) => upsert_model(&mut tx, m).await?,
                CatalogChange::DeleteModel(id) => {
                    sqlx::query("DELETE FROM content_models WHERE id = $1")
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }
                CatalogChange::UpsertCategory(c) => upsert_category(&mut tx, c).await?,
                CatalogChange::DeleteCategory(id) => {
                    sqlx::query("DELETE FROM content_categories WHERE id = $1")
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }
                CatalogChange::UpsertContent(c) => upsert_content(&mut tx, c).await?,
                CatalogChange::DeleteContent(id) => {
                    sqlx::query("DELETE FROM contents WHERE id = $1")
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

async fn upsert_attribute(tx: &mut Transaction<'_, Postgres>, attribute: &Attribute) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO content_attributes (id, name, cardinality, sort, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            cardinality = EXCLUDED.cardinality,
            sort = EXCLUDED.sort,
            is_active = EXCLUDED.is_active,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(attribute.id)
    .bind(&attribute.name)
    .bind(attribute.cardinality)
    .bind(attribute.sort)
    .bind(attribute.is_active)
    .bind(attribute.created_at)
    .bind(attribute.updated_at)
    .execute(&mut **tx)
    .await?;

    // 被移除的属性值级联删除模型绑定值与内容选择
    sqlx::query(
        "DELETE FROM content_attribute_values WHERE attribute_id = $1 AND NOT (id = ANY($2))",
    )
    .bind(attribute.id)
    .bind(attribute.value_ids())
    .execute(&mut **tx)
    .await?;

    for value in &attribute.values {
        sqlx::query(
            r#"
            INSERT INTO content_attribute_values (id, attribute_id, value, sort, is_active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                value = EXCLUDED.value,
                sort = EXCLUDED.sort,
                is_active = EXCLUDED.is_active
            "#,
        )
        .bind(value.id)
        .bind(attribute.id)
        .bind(&value.value)
        .bind(value.sort)
        .bind(value.is_active)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

async fn upsert_model(tx: &mut Transaction<'_, Postgres>, model: &ContentModel) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO content_models (id, name, description, sort, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            description = EXCLUDED.description,
            sort = EXCLUDED.sort,
            is_active = EXCLUDED.is_active,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(model.id)
    .bind(&model.name)
    .bind(&model.description)
    .bind(model.sort)
    .bind(model.is_active)
    .bind(model.created_at)
    .bind(model.updated_at)
    .execute(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM content_model_attributes WHERE model_id = $1")
        .bind(model.id)
        .execute(&mut **tx)
        .await?;

    for (position, binding) in model.bindings.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO content_model_attributes (model_id, attribute_id, position)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(model.id)
        .bind(binding.attribute_id)
        .bind(position as i32)
        .execute(&mut **tx)
        .await?;

        for value_id in &binding.allowed_value_ids {
            sqlx::query(
                r#"
                INSERT INTO content_model_attribute_values (model_id, attribute_id, attribute_value_id)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(model.id)
            .bind(binding.attribute_id)
            .bind(value_id)
            .execute(&mut **tx)
            .await?;
        }
    }

    Ok(())
}

async fn upsert_category(tx: &mut Transaction<'_, Postgres>, category: &Category) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO content_categories
            (id, name, description, sort, is_active, parent_id, model_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            description = EXCLUDED.description,
            sort = EXCLUDED.sort,
            is_active = EXCLUDED.is_active,
            parent_id = EXCLUDED.parent_id,
            model_id = EXCLUDED.model_id,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(category.id)
    .bind(&category.name)
    .bind(&category.description)
    .bind(category.sort)
    .bind(category.is_active)
    .bind(category.parent_id)
    .bind(category.model_id)
    .bind(category.created_at)
    .bind(category.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn upsert_content(tx: &mut Transaction<'_, Postgres>, item: &ContentItem) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO contents
            (id, title, description, sort, is_active, category_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (id) DO UPDATE SET
            title = EXCLUDED.title,
            description = EXCLUDED.description,
            sort = EXCLUDED.sort,
            is_active = EXCLUDED.is_active,
            category_id = EXCLUDED.category_id,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(item.id)
    .bind(&item.title)
    .bind(&item.description)
    .bind(item.sort)
    .bind(item.is_active)
    .bind(item.category_id)
    .bind(item.created_at)
    .bind(item.updated_at)
    .execute(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM content_attribute_selections WHERE content_id = $1")
        .bind(item.id)
        .execute(&mut **tx)
        .await?;

    for selection in item.selections.iter() {
        sqlx::query(
            r#"
            INSERT INTO content_attribute_selections (content_id, attribute_id, attribute_value_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(item.id)
        .bind(selection.attribute_id)
        .bind(selection.value_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
