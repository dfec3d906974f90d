//! JSON document store for users and departments.
//!
//! One file, read into memory at startup and rewritten on every mutation.
//! Reads hand out cloned snapshots; mutations take the write lock, apply a
//! single-record change, and persist before releasing it. Last-write-wins is
//! an accepted race for the rare mutations this store sees (password hashes,
//! reset codes). Authorization reads never block each other.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::models::{Department, Identity, IdentityKind};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Documents {
    #[serde(default)]
    users: Vec<Identity>,

    #[serde(default)]
    departments: Vec<Department>,
}

#[derive(Clone)]
pub struct Store {
    path: PathBuf,
    docs: Arc<RwLock<Documents>>,
}

impl Store {
    /// Opens the document file, creating an empty one if missing.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create data dir for {}", path.display()))?;
        }

        let docs = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read data file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse data file: {}", path.display()))?
        } else {
            Documents::default()
        };

        let store = Self {
            path,
            docs: Arc::new(RwLock::new(docs)),
        };

        // Make sure the file exists and is writable before serving requests.
        let snapshot = store.docs.read().await;
        store.persist(&snapshot).await?;
        drop(snapshot);

        Ok(store)
    }

    async fn persist(&self, docs: &Documents) -> Result<()> {
        let content = serde_json::to_string_pretty(docs)?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write data file: {}", self.path.display()))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn list_users(&self) -> Vec<Identity> {
        self.docs.read().await.users.clone()
    }

    pub async fn get_user(&self, id: &str) -> Option<Identity> {
        self.docs
            .read()
            .await
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
    }

    /// Case-insensitive email lookup; emails are stored lowercase but input
    /// is normalized here as well so mixed-case records never hide a match.
    pub async fn find_user_by_email(&self, email: &str) -> Option<Identity> {
        let needle = email.trim().to_lowercase();
        self.docs
            .read()
            .await
            .users
            .iter()
            .find(|u| u.email.to_lowercase() == needle)
            .cloned()
    }

    pub async fn email_taken(&self, email: &str, exclude_id: Option<&str>) -> bool {
        let needle = email.trim().to_lowercase();
        self.docs
            .read()
            .await
            .users
            .iter()
            .any(|u| u.email.to_lowercase() == needle && Some(u.id.as_str()) != exclude_id)
    }

    /// CPF uniqueness applies to EFETIVO identities only.
    pub async fn cpf_taken(&self, cpf: &str, exclude_id: Option<&str>) -> bool {
        self.docs
            .read()
            .await
            .users
            .iter()
            .any(|u| {
                u.kind == IdentityKind::Efetivo
                    && u.cpf == cpf
                    && Some(u.id.as_str()) != exclude_id
            })
    }

    pub async fn insert_user(&self, user: Identity) -> Result<()> {
        let mut docs = self.docs.write().await;
        docs.users.push(user);
        self.persist(&docs).await
    }

    pub async fn update_user(&self, user: Identity) -> Result<()> {
        let mut docs = self.docs.write().await;
        let slot = docs
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| anyhow::anyhow!("User not found: {}", user.id))?;
        *slot = user;
        self.persist(&docs).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<bool> {
        let mut docs = self.docs.write().await;
        let before = docs.users.len();
        docs.users.retain(|u| u.id != id);
        let removed = docs.users.len() != before;
        if removed {
            self.persist(&docs).await?;
        }
        Ok(removed)
    }

    pub async fn set_password_hash(&self, id: &str, hash: String) -> Result<()> {
        let mut docs = self.docs.write().await;
        let user = docs
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;
        user.password_hash = hash;
        self.persist(&docs).await
    }

    /// Stores or clears the admin-issued reset code hash. Passing `None`
    /// invalidates any outstanding code.
    pub async fn set_reset_code(
        &self,
        id: &str,
        code_hash: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut docs = self.docs.write().await;
        let user = docs
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;
        user.reset_code_hash = code_hash;
        user.reset_code_expires_at = expires_at;
        self.persist(&docs).await
    }

    /// Sets the new password hash and clears any outstanding reset code in
    /// one mutation, so a consumed code can never survive the password
    /// change it authorized.
    pub async fn consume_reset_code(&self, id: &str, password_hash: String) -> Result<()> {
        let mut docs = self.docs.write().await;
        let user = docs
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;
        user.password_hash = password_hash;
        user.reset_code_hash = None;
        user.reset_code_expires_at = None;
        self.persist(&docs).await
    }

    // ------------------------------------------------------------------
    // Departments
    // ------------------------------------------------------------------

    pub async fn list_departments(&self) -> Vec<Department> {
        self.docs.read().await.departments.clone()
    }

    pub async fn get_department(&self, id: &str) -> Option<Department> {
        self.docs
            .read()
            .await
            .departments
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    pub async fn insert_department(&self, department: Department) -> Result<()> {
        let mut docs = self.docs.write().await;
        docs.departments.push(department);
        self.persist(&docs).await
    }

    pub async fn update_department(&self, department: Department) -> Result<()> {
        let mut docs = self.docs.write().await;
        let slot = docs
            .departments
            .iter_mut()
            .find(|d| d.id == department.id)
            .ok_or_else(|| anyhow::anyhow!("Department not found: {}", department.id))?;
        *slot = department;
        self.persist(&docs).await
    }

    /// Deletes a department and cascades by removing its id from every
    /// identity's membership list, so no new dangling references are left.
    pub async fn delete_department(&self, id: &str) -> Result<bool> {
        let mut docs = self.docs.write().await;
        let before = docs.departments.len();
        docs.departments.retain(|d| d.id != id);
        let removed = docs.departments.len() != before;
        if removed {
            for user in &mut docs.users {
                user.department_ids.retain(|d| d != id);
            }
            self.persist(&docs).await?;
        }
        Ok(removed)
    }
}
