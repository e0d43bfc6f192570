//! InMemory User Repository 実装

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RepositoryError, User, UserId, UserRepository};

/// インメモリ User Repository 実装
///
/// ユーザー管理は外部コラボレーターの責務のため、シード用の `insert_user` のみ提供します。
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.users.lock().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_user(&self, user_id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.lock().await.get(&user_id).cloned())
    }
}
