//! Capabilities a task backend can offer
//!
//! Every backend implements [`TaskBackend`]. The other traits are optional, so that backends that have no notion
//! of publication, subscription or sharing do not have to implement them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::calendar::TaskList;
use crate::error::Error;
use crate::ocs::Share;
use crate::task::Task;

/// Read and write tasks and task lists.
///
/// Creations, updates and deletions of tasks are idempotent, so that they can be replayed safely.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Returns the lists that can hold tasks
    async fn list_calendars(&self) -> Result<Vec<TaskList>, Error>;
    /// Returns a single list, or [`Error::ListNotFound`]
    async fn get_list(&self, list_id: &str) -> Result<TaskList, Error>;

    /// Returns every task of a list. An empty list is not an error
    async fn list_tasks(&self, list_id: &str) -> Result<Vec<Task>, Error>;
    /// Returns a single task, or [`Error::TaskNotFound`]
    async fn get_task(&self, list_id: &str, task_id: &str) -> Result<Task, Error>;

    /// Store a new task. A random ID is picked if `task` has none. Returns the task as it has been stored
    async fn create_task(&self, list_id: &str, task: &Task) -> Result<Task, Error>;
    /// Store an existing task (that must have an ID)
    async fn update_task(&self, list_id: &str, task: &Task) -> Result<Task, Error>;
    /// Delete a task. Deleting a task that does not exist is not an error
    async fn delete_task(&self, list_id: &str, task_id: &str) -> Result<(), Error>;

    async fn create_list(&self, name: &str) -> Result<TaskList, Error>;
    async fn delete_list(&self, list_id: &str) -> Result<(), Error>;

    /// Lists in the server trash
    async fn deleted_lists(&self) -> Result<Vec<TaskList>, Error>;
    async fn restore_list(&self, list_id: &str) -> Result<(), Error>;
    async fn purge_list(&self, list_id: &str) -> Result<(), Error>;
}

/// Give public, read-only access to lists
#[async_trait]
pub trait PublishBackend: Send + Sync {
    /// Create a public link to a list, and return its URL.
    /// Fails with [`Error::AlreadyPublished`] in case the list already has one
    async fn publish_list(&self, list_id: &str) -> Result<String, Error>;
    /// Remove the public link of a list.
    /// Fails with [`Error::NotPublished`] in case there is none
    async fn unpublish_list(&self, list_id: &str) -> Result<(), Error>;
    /// Public links of a list
    async fn public_shares(&self, list_id: &str) -> Result<Vec<Share>, Error>;
}

/// Mirror external calendar feeds as read-only lists
#[async_trait]
pub trait SubscriptionBackend: Send + Sync {
    async fn subscribe_list(&self, source_url: &str) -> Result<TaskList, Error>;
    /// Remove a subscription. Fails with [`Error::ListNotFound`] if it does not exist
    async fn unsubscribe_list(&self, list_id: &str) -> Result<(), Error>;
}

/// What another user may do with a shared list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SharePermission {
    Read,
    ReadWrite,
}

/// Share lists with other users of the same server
#[async_trait]
pub trait ShareBackend: Send + Sync {
    async fn share_list(&self, list_id: &str, user: &str, permission: SharePermission) -> Result<(), Error>;
    async fn unshare_list(&self, list_id: &str, user: &str) -> Result<(), Error>;
    async fn list_shares(&self, list_id: &str) -> Result<Vec<Share>, Error>;
}
