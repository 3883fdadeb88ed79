//! In-memory account directory.

use std::collections::BTreeMap;

use campus_types::{NewUser, User, UserId};
use tokio::sync::RwLock;

use crate::error::RegistryError;

/// User accounts keyed by id. Student numbers are unique.
#[derive(Debug, Default)]
pub struct AccountDirectory {
    users: RwLock<BTreeMap<UserId, User>>,
}

impl AccountDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `input` and add the account.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Validation`] for malformed input or
    /// [`RegistryError::DuplicateStudentNo`] if the student number is
    /// already taken.
    pub async fn create(&self, input: NewUser) -> Result<User, RegistryError> {
        let user = input.into_user()?;

        let mut users = self.users.write().await;
        if users.values().any(|u| u.student_no == user.student_no) {
            return Err(RegistryError::DuplicateStudentNo(user.student_no));
        }
        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "Account created");
        Ok(user)
    }

    /// Fetch one account.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UserNotFound`] if there is no such account.
    pub async fn get(&self, user_id: UserId) -> Result<User, RegistryError> {
        self.users
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(RegistryError::UserNotFound(user_id))
    }

    /// Fetch the account holding `student_no`. Surrounding whitespace is
    /// ignored, as it is when the account is created.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::StudentNotFound`] if no account has it.
    pub async fn find_by_student_no(&self, student_no: &str) -> Result<User, RegistryError> {
        let wanted = student_no.trim();
        self.users
            .read()
            .await
            .values()
            .find(|u| u.student_no == wanted)
            .cloned()
            .ok_or_else(|| RegistryError::StudentNotFound(wanted.to_owned()))
    }

    /// Every account, ordered by name, then id.
    pub async fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        users
    }
}

#[cfg(test)]
mod tests {
    use campus_types::Role;

    use super::*;

    fn student(name: &str, number: &str) -> NewUser {
        NewUser {
            name: name.to_owned(),
            student_no: number.to_owned(),
            phone_no: None,
            role: Role::Student,
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let dir = AccountDirectory::new();
        let created = dir.create(student("Mert Kaya", "2021001")).await;
        assert!(created.is_ok());
        if let Ok(user) = created {
            assert_eq!(dir.get(user.id).await.ok(), Some(user));
        }
    }

    #[tokio::test]
    async fn student_number_is_unique() {
        let dir = AccountDirectory::new();
        assert!(dir.create(student("Mert Kaya", "2021001")).await.is_ok());
        let clash = dir.create(student("Zeynep Acar", " 2021001 ")).await;
        assert!(matches!(clash, Err(RegistryError::DuplicateStudentNo(n)) if n == "2021001"));
        assert_eq!(dir.list().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let dir = AccountDirectory::new();
        let result = dir.get(UserId::new()).await;
        assert!(matches!(result, Err(RegistryError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn lookup_by_student_number() {
        let dir = AccountDirectory::new();
        let created = dir.create(student("Mert Kaya", "2021001")).await;
        assert!(created.is_ok());
        let found = dir.find_by_student_no(" 2021001").await;
        assert_eq!(found.ok().map(|u| u.name), Some(String::from("Mert Kaya")));

        let missing = dir.find_by_student_no("1999999").await;
        assert!(matches!(missing, Err(RegistryError::StudentNotFound(n)) if n == "1999999"));
    }

    #[tokio::test]
    async fn list_is_sorted_by_name() {
        let dir = AccountDirectory::new();
        let _ = dir.create(student("Zeynep Acar", "2")).await;
        let _ = dir.create(student("Ali Demir", "1")).await;
        let names: Vec<String> = dir.list().await.into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Ali Demir", "Zeynep Acar"]);
    }
}
