//! User service: staff accounts and the principal behind each token.

use std::sync::Arc;

use chrono::Utc;

use crate::access::Principal;
use crate::controller::ResourceStore;
use crate::error::{BungalowError, BungalowResult};
use crate::models::user::{self, CreateUser, UpdateUser, User};
use crate::query::{Predicate, ResourceSchema, SortKey};
use crate::repository::{Pagination, UserRepository};

pub struct UserService<U> {
    users: Arc<U>,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }

    /// Resolve a verified token subject to an active staff member.
    pub async fn principal(&self, user_id: uuid::Uuid) -> BungalowResult<Principal> {
        let user = self.users.get(user_id).await?.ok_or_else(|| {
            BungalowError::denied("the user belonging to this token no longer exists")
        })?;
        if !user.is_active {
            return Err(BungalowError::Locked {
                reason: format!("user {} is not active", user.email),
            });
        }
        Ok(Principal::from_user(&user))
    }

    pub async fn me(&self, principal: &Principal) -> BungalowResult<User> {
        self.users
            .get(principal.user_id)
            .await?
            .ok_or_else(|| BungalowError::not_found("user", principal.user_id))
    }
}

impl<U: UserRepository> ResourceStore for UserService<U> {
    type Doc = User;
    type Create = CreateUser;
    type Patch = UpdateUser;

    fn schema(&self) -> &'static ResourceSchema {
        &user::SCHEMA
    }

    async fn create(&self, input: CreateUser) -> BungalowResult<User> {
        let user = User::new(input, Utc::now())?;
        self.users.insert(&user).await
    }

    async fn update(&self, mut current: User, patch: UpdateUser) -> BungalowResult<User> {
        current.apply(patch)?;
        current.updated_at = Utc::now();
        self.users.replace(&current).await
    }

    async fn delete(&self, current: User) -> BungalowResult<()> {
        self.users.delete(current.id).await
    }

    async fn find(
        &self,
        filter: &Predicate,
        sort: &[SortKey],
        pagination: Pagination,
    ) -> BungalowResult<Vec<User>> {
        self.users.find(filter, sort, pagination).await
    }

    async fn find_one(&self, filter: &Predicate) -> BungalowResult<Option<User>> {
        self.users.find_one(filter).await
    }

    async fn count(&self, filter: &Predicate) -> BungalowResult<u64> {
        self.users.count(filter).await
    }

    async fn delete_all(&self) -> BungalowResult<u64> {
        self.users.delete_where(&Predicate::all()).await
    }
}
