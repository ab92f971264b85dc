// src/store/users.rs

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use super::{read, write};
use crate::{
    error::AppError,
    models::user::{Role, User},
};

#[derive(Default)]
struct UserTable {
    last_id: i64,
    rows: BTreeMap<i64, User>,
}

impl UserTable {
    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }
}

/// The `users` table.
#[derive(Clone, Default)]
pub struct UserStore {
    table: Arc<RwLock<UserTable>>,
}

impl UserStore {
    /// Inserts a user. Usernames are unique.
    pub fn insert(&self, username: &str, password_hash: String, role: Role) -> Result<User, AppError> {
        let mut table = write(&self.table);
        if table.username_taken(username, None) {
            return Err(AppError::Conflict(format!("Username '{}' already exists", username)));
        }
        table.last_id += 1;
        let user = User {
            id: table.last_id,
            username: username.to_string(),
            password: password_hash,
            role,
            skill_confidence: BTreeMap::new(),
            created_at: Some(Utc::now()),
        };
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn find_by_username(&self, username: &str) -> Option<User> {
        read(&self.table)
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned()
    }

    pub fn get(&self, id: i64) -> Result<User, AppError> {
        read(&self.table)
            .rows
            .get(&id)
            .cloned()
            .ok_or(AppError::NotFound("User not found".to_string()))
    }

    pub fn username_of(&self, id: i64) -> Option<String> {
        read(&self.table).rows.get(&id).map(|u| u.username.clone())
    }

    /// All users, newest first.
    pub fn list(&self) -> Vec<User> {
        read(&self.table).rows.values().rev().cloned().collect()
    }

    /// Applies the present fields of an admin edit.
    pub fn update(
        &self,
        id: i64,
        username: Option<String>,
        role: Option<Role>,
        password_hash: Option<String>,
    ) -> Result<User, AppError> {
        let mut table = write(&self.table);
        if let Some(name) = username.as_deref()
            && table.username_taken(name, Some(id))
        {
            return Err(AppError::Conflict(format!("Username '{}' already exists", name)));
        }
        let user = table
            .rows
            .get_mut(&id)
            .ok_or(AppError::NotFound("User not found".to_string()))?;
        if let Some(name) = username {
            user.username = name;
        }
        if let Some(role) = role {
            user.role = role;
        }
        if let Some(hash) = password_hash {
            user.password = hash;
        }
        Ok(user.clone())
    }

    pub fn set_confidence(&self, id: i64, skill: &str, confidence: u32) -> Result<(), AppError> {
        let mut table = write(&self.table);
        let user = table
            .rows
            .get_mut(&id)
            .ok_or(AppError::NotFound("User not found".to_string()))?;
        user.skill_confidence.insert(skill.to_lowercase(), confidence);
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<User, AppError> {
        write(&self.table)
            .rows
            .remove(&id)
            .ok_or(AppError::NotFound("User not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usernames_are_unique() {
        let store = UserStore::default();
        let first = store.insert("ada", "hash".to_string(), Role::Candidate).unwrap();
        assert_eq!(first.id, 1);
        assert!(matches!(
            store.insert("ada", "hash".to_string(), Role::Admin),
            Err(AppError::Conflict(_))
        ));

        let second = store.insert("grace", "hash".to_string(), Role::Candidate).unwrap();
        assert!(matches!(
            store.update(second.id, Some("ada".to_string()), None, None),
            Err(AppError::Conflict(_))
        ));
        let renamed = store.update(second.id, Some("hopper".to_string()), Some(Role::Admin), None).unwrap();
        assert_eq!(renamed.username, "hopper");
        assert_eq!(renamed.role, Role::Admin);
    }

    #[test]
    fn test_list_newest_first_and_delete() {
        let store = UserStore::default();
        store.insert("ada", "h".to_string(), Role::Candidate).unwrap();
        store.insert("grace", "h".to_string(), Role::Candidate).unwrap();
        let names: Vec<String> = store.list().into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["grace", "ada"]);

        store.delete(1).unwrap();
        assert!(store.find_by_username("ada").is_none());
        assert!(matches!(store.get(1), Err(AppError::NotFound(_))));
    }
}
