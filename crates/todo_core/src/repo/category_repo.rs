//! Category repository contracts and store-backed implementation.
//!
//! # Invariants
//! - The "General" sentinel is merged into reads when no stored record
//!   carries its identifier, and is never written.
//! - Insert/update/delete with the sentinel identifier fail before any store
//!   request is issued.
//! - Deleting a category never touches tasks that reference it.

use super::{from_record, to_record, ListResult, RepoError, RepoResult};
use crate::db::{Collection, StoreConnector};
use crate::model::category::{is_reserved_category_id, Category, GENERAL_CATEGORY_ID};
use std::sync::Arc;

const COLLECTION: Collection = Collection::Categories;

/// Partial-match filter; every populated field must equal the record's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    pub category_id: Option<String>,
    pub category_name: Option<String>,
}

impl CategoryFilter {
    pub fn matches(&self, category: &Category) -> bool {
        self.category_id
            .as_ref()
            .map_or(true, |id| *id == category.category_id)
            && self
                .category_name
                .as_ref()
                .map_or(true, |name| *name == category.category_name)
    }
}

/// Repository interface for category CRUD.
pub trait CategoryRepository {
    /// Linear scan returning every category accepted by `predicate`.
    fn list_by(&self, predicate: &dyn Fn(&Category) -> bool) -> RepoResult<ListResult<Category>>;
    fn get_by_id(&self, id: &str) -> RepoResult<Category>;
    fn insert(&self, category: &Category) -> RepoResult<Category>;
    fn update(&self, category: &Category) -> RepoResult<Category>;
    fn delete(&self, id: &str) -> RepoResult<()>;

    fn list(&self, filter: &CategoryFilter) -> RepoResult<ListResult<Category>> {
        self.list_by(&|category| filter.matches(category))
    }

    fn list_all(&self) -> RepoResult<ListResult<Category>> {
        self.list(&CategoryFilter::default())
    }
}

/// Category repository over the shared record store.
#[derive(Clone)]
pub struct StoreCategoryRepository {
    connector: Arc<StoreConnector>,
}

impl StoreCategoryRepository {
    pub fn new(connector: Arc<StoreConnector>) -> Self {
        Self { connector }
    }
}

impl CategoryRepository for StoreCategoryRepository {
    fn list_by(&self, predicate: &dyn Fn(&Category) -> bool) -> RepoResult<ListResult<Category>> {
        let records = self.connector.open_collection(COLLECTION)?.get_all()?;
        let mut stored = records
            .into_iter()
            .map(|record| from_record::<Category>(COLLECTION, record))
            .collect::<RepoResult<Vec<_>>>()?;

        if !stored
            .iter()
            .any(|category| category.category_id == GENERAL_CATEGORY_ID)
        {
            stored.insert(0, Category::general());
        }

        stored.retain(|category| predicate(category));
        Ok(ListResult::new(stored))
    }

    fn get_by_id(&self, id: &str) -> RepoResult<Category> {
        let record = self.connector.open_collection(COLLECTION)?.get(id)?;
        match record {
            Some(record) => from_record(COLLECTION, record),
            None if is_reserved_category_id(id) => Ok(Category::general()),
            None => Err(RepoError::NotFound {
                collection: COLLECTION,
                id: id.to_string(),
            }),
        }
    }

    fn insert(&self, category: &Category) -> RepoResult<Category> {
        reject_reserved(&category.category_id)?;
        category.validate()?;
        self.connector
            .open_collection(COLLECTION)?
            .add(to_record(category)?)?;
        Ok(category.clone())
    }

    fn update(&self, category: &Category) -> RepoResult<Category> {
        reject_reserved(&category.category_id)?;
        category.validate()?;
        self.connector
            .open_collection(COLLECTION)?
            .put(to_record(category)?)?;
        Ok(category.clone())
    }

    fn delete(&self, id: &str) -> RepoResult<()> {
        reject_reserved(id)?;
        self.connector.open_collection(COLLECTION)?.delete(id)?;
        Ok(())
    }
}

fn reject_reserved(id: &str) -> RepoResult<()> {
    if is_reserved_category_id(id) {
        return Err(RepoError::ReservedCategory(id.to_string()));
    }
    Ok(())
}
