//! Generic resource controller.
//!
//! One [`ResourceController`] serves every REST resource. Resource-specific
//! behaviour lives behind [`ResourceStore`] (how documents are created,
//! merged, deleted and queried) and [`RelationResolver`] (how whitelisted
//! references are expanded). The caller's [`RestrictionContext`] is an
//! argument of each call and is applied before every data access.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::access::RestrictionContext;
use crate::error::{BungalowError, BungalowResult};
use crate::query::directives::{parse_expansions, parse_projection};
use crate::query::projection::{expand, project, reference_ids, select_fields};
use crate::query::{
    Expansion, ID_FIELD, ListDirectives, Predicate, Projection, QueryParams, ResourceSchema,
    SortKey,
};
use crate::repository::Pagination;

/// Storage plus write rules of one resource type.
pub trait ResourceStore: Send + Sync {
    type Doc: Serialize + Send + Sync;
    /// Strict create input; unknown fields fail deserialization.
    type Create: DeserializeOwned + Send;
    /// Strict partial update input.
    type Patch: DeserializeOwned + Send;

    fn schema(&self) -> &'static ResourceSchema;

    fn create(&self, input: Self::Create)
    -> impl Future<Output = BungalowResult<Self::Doc>> + Send;

    /// Merge `patch` into `current` and persist the result.
    fn update(
        &self,
        current: Self::Doc,
        patch: Self::Patch,
    ) -> impl Future<Output = BungalowResult<Self::Doc>> + Send;

    fn delete(&self, current: Self::Doc) -> impl Future<Output = BungalowResult<()>> + Send;

    fn find(
        &self,
        filter: &Predicate,
        sort: &[SortKey],
        pagination: Pagination,
    ) -> impl Future<Output = BungalowResult<Vec<Self::Doc>>> + Send;

    fn find_one(
        &self,
        filter: &Predicate,
    ) -> impl Future<Output = BungalowResult<Option<Self::Doc>>> + Send;

    fn count(&self, filter: &Predicate) -> impl Future<Output = BungalowResult<u64>> + Send;

    fn delete_all(&self) -> impl Future<Output = BungalowResult<u64>> + Send;
}

/// Loads the documents behind a whitelisted reference path.
pub trait RelationResolver: Send + Sync {
    /// Returns serialized related documents keyed by id, already narrowed
    /// to `expansion.fields`.
    fn resolve(
        &self,
        expansion: &Expansion,
        ids: &[String],
    ) -> impl Future<Output = BungalowResult<HashMap<String, Value>>> + Send;
}

/// Resolver for resources without expandable references.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRelations;

impl RelationResolver for NoRelations {
    async fn resolve(
        &self,
        _expansion: &Expansion,
        _ids: &[String],
    ) -> BungalowResult<HashMap<String, Value>> {
        Ok(HashMap::new())
    }
}

/// Helper for resolvers: index serialized documents by id, keeping only
/// `fields`.
pub fn index_related<T: Serialize>(
    docs: impl IntoIterator<Item = (Uuid, T)>,
    fields: &[&str],
) -> BungalowResult<HashMap<String, Value>> {
    docs.into_iter()
        .map(|(id, doc)| Ok((id.to_string(), select_fields(to_document(&doc)?, fields))))
        .collect()
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub all_docs_number: u64,
    pub results: usize,
    pub docs: Vec<Value>,
}

pub struct ResourceController<S, X = NoRelations> {
    store: Arc<S>,
    relations: X,
}

impl<S, X: Clone> Clone for ResourceController<S, X> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            relations: self.relations.clone(),
        }
    }
}

impl<S: ResourceStore, X: RelationResolver> ResourceController<S, X> {
    pub fn new(store: Arc<S>, relations: X) -> Self {
        Self { store, relations }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn schema(&self) -> &'static ResourceSchema {
        self.store.schema()
    }

    /// Create one document, or each element of an array body in order.
    /// The route-nesting field, if any, overrides the body's value.
    pub async fn create(&self, body: Value, ctx: &RestrictionContext) -> BungalowResult<Value> {
        match body {
            Value::Array(items) => {
                let mut created = Vec::with_capacity(items.len());
                for item in items {
                    created.push(self.create_one(item, ctx).await?);
                }
                Ok(Value::Array(created))
            }
            single => self.create_one(single, ctx).await,
        }
    }

    async fn create_one(&self, mut body: Value, ctx: &RestrictionContext) -> BungalowResult<Value> {
        let Value::Object(map) = &mut body else {
            return Err(BungalowError::validation("Request body must be an object."));
        };
        if let Some((field, parent)) = ctx.nesting() {
            map.insert(field.to_string(), Value::String(parent.to_string()));
        }

        let input: S::Create = serde_json::from_value(body)?;
        let doc = self.store.create(input).await?;
        debug!(entity = self.schema().entity, "document created");
        Ok(project(to_document(&doc)?, &Projection::Default, self.schema()))
    }

    pub async fn list(
        &self,
        params: &QueryParams,
        ctx: &RestrictionContext,
    ) -> BungalowResult<Listing> {
        let directives = ListDirectives::parse(params, self.schema())?;
        let filter = ctx.restrict(directives.filter);

        let docs = self
            .store
            .find(&filter, &directives.sort, directives.pagination)
            .await?;
        let all_docs_number = self.store.count(&filter).await?;

        let docs = docs
            .iter()
            .map(to_document)
            .collect::<BungalowResult<Vec<_>>>()?;
        let docs = self
            .render(docs, &directives.expansions, &directives.projection)
            .await?;

        Ok(Listing {
            all_docs_number,
            results: docs.len(),
            docs,
        })
    }

    pub async fn get_one(
        &self,
        id: Uuid,
        params: &QueryParams,
        ctx: &RestrictionContext,
    ) -> BungalowResult<Value> {
        let expansions = parse_expansions(params.get("populate"), self.schema());
        let projection = parse_projection(params.get("fields"), self.schema())?;
        let doc = self.fetch(id, ctx).await?;
        let mut rendered = self
            .render(vec![to_document(&doc)?], &expansions, &projection)
            .await?;
        rendered
            .pop()
            .ok_or_else(|| BungalowError::not_found(self.schema().entity, id))
    }

    pub async fn update(
        &self,
        id: Uuid,
        patch: Value,
        ctx: &RestrictionContext,
    ) -> BungalowResult<Value> {
        let patch: S::Patch = serde_json::from_value(patch)?;
        let current = self.fetch(id, ctx).await?;
        let updated = self.store.update(current, patch).await?;
        debug!(entity = self.schema().entity, %id, "document updated");
        Ok(project(to_document(&updated)?, &Projection::Default, self.schema()))
    }

    pub async fn delete(&self, id: Uuid, ctx: &RestrictionContext) -> BungalowResult<()> {
        let current = self.fetch(id, ctx).await?;
        self.store.delete(current).await?;
        debug!(entity = self.schema().entity, %id, "document deleted");
        Ok(())
    }

    /// Unrestricted wipe of the collection; callers gate it by role.
    pub async fn delete_all(&self) -> BungalowResult<u64> {
        self.store.delete_all().await
    }

    /// The document with `id`, if the restrictions let the caller see it.
    async fn fetch(&self, id: Uuid, ctx: &RestrictionContext) -> BungalowResult<S::Doc> {
        let filter = ctx.restrict(Predicate::eq_text(&ID_FIELD, id));
        self.store
            .find_one(&filter)
            .await?
            .ok_or_else(|| BungalowError::not_found(self.schema().entity, id))
    }

    async fn render(
        &self,
        mut docs: Vec<Value>,
        expansions: &[Expansion],
        projection: &Projection,
    ) -> BungalowResult<Vec<Value>> {
        for expansion in expansions {
            let ids = reference_ids(&docs, expansion.path);
            if ids.is_empty() {
                continue;
            }
            let related = self.relations.resolve(expansion, &ids).await?;
            for doc in &mut docs {
                expand(doc, expansion.path, &related);
            }
        }
        Ok(docs
            .into_iter()
            .map(|doc| project(doc, projection, self.schema()))
            .collect())
    }
}

pub fn to_document<T: Serialize>(doc: &T) -> BungalowResult<Value> {
    serde_json::to_value(doc).map_err(|e| BungalowError::Internal(e.to_string()))
}
