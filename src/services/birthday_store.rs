/// Birthday store - owns the in-memory record tables and their persistence
use dashmap::DashMap;
use poise::serenity_prelude::UserId;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::database::{
    CONFIG_PATH, DATA_PATH, NodeStore, REMINDERS_PATH, StoreError, child_path,
};
use crate::models::{BirthdayRecord, Configuration, ReminderRecord};

/// Records every handler and sweep reads and mutates.
///
/// Snapshots are clones; DashMap guards never outlive a single method call.
pub struct BirthdayStore {
    nodes: Arc<dyn NodeStore>,
    config: RwLock<Configuration>,
    birthdays: DashMap<UserId, BirthdayRecord>,
    reminders: DashMap<String, ReminderRecord>,
}

impl BirthdayStore {
    pub fn new(nodes: Arc<dyn NodeStore>) -> Self {
        Self {
            nodes,
            config: RwLock::new(Configuration::default()),
            birthdays: DashMap::new(),
            reminders: DashMap::new(),
        }
    }

    /// Replace every in-memory table with what persistence holds.
    ///
    /// A community without configuration gets [`Configuration::initial`] written back.
    pub async fn load(&self, current_year: i32) -> Result<(), StoreError> {
        let config = match self.nodes.get(CONFIG_PATH).await? {
            Some(value) => serde_json::from_value(value)?,
            None => {
                let config = Configuration::initial(current_year);
                self.nodes
                    .set(CONFIG_PATH, serde_json::to_value(&config)?)
                    .await?;
                info!("No configuration found, wrote defaults");
                config
            }
        };
        *self.config.write().await = config;

        let mut birthdays = Vec::new();
        for (key, value) in self.nodes.children(DATA_PATH).await? {
            match serde_json::from_value::<BirthdayRecord>(value) {
                Ok(record) => birthdays.push(record),
                Err(e) => warn!("Skipping unreadable birthday record {}: {}", key, e),
            }
        }

        let mut reminders = Vec::new();
        for (key, value) in self.nodes.children(REMINDERS_PATH).await? {
            match serde_json::from_value::<ReminderRecord>(value) {
                Ok(reminder) => reminders.push((key, reminder)),
                Err(e) => warn!("Skipping unreadable reminder {}: {}", key, e),
            }
        }

        self.birthdays.clear();
        for record in birthdays {
            self.birthdays.insert(record.user_id, record);
        }
        self.reminders.clear();
        for (id, reminder) in reminders {
            self.reminders.insert(id, reminder);
        }

        info!(
            "Loaded {} birthday records and {} reminders",
            self.birthdays.len(),
            self.reminders.len()
        );
        Ok(())
    }

    /// Write every in-memory record to persistence
    pub async fn save_all(&self) -> Result<(), StoreError> {
        self.save_config().await?;
        for user_id in self.birthday_ids() {
            self.save_birthday(user_id).await?;
        }
        let reminder_ids: Vec<String> = self.reminders.iter().map(|r| r.key().clone()).collect();
        for id in reminder_ids {
            self.save_reminder(&id).await?;
        }
        Ok(())
    }

    // Configuration

    pub async fn config(&self) -> Configuration {
        self.config.read().await.clone()
    }

    /// Mutate the configuration in memory and return the result
    pub async fn update_config<F>(&self, mutate: F) -> Configuration
    where
        F: FnOnce(&mut Configuration),
    {
        let mut config = self.config.write().await;
        mutate(&mut config);
        config.clone()
    }

    pub async fn save_config(&self) -> Result<(), StoreError> {
        let value = serde_json::to_value(self.config().await)?;
        self.nodes.update(CONFIG_PATH, value).await
    }

    // Birthdays

    pub fn birthday(&self, user_id: UserId) -> Option<BirthdayRecord> {
        self.birthdays.get(&user_id).map(|r| r.value().clone())
    }

    pub fn birthday_ids(&self) -> Vec<UserId> {
        self.birthdays.iter().map(|r| *r.key()).collect()
    }

    pub fn birthdays(&self) -> Vec<BirthdayRecord> {
        self.birthdays.iter().map(|r| r.value().clone()).collect()
    }

    pub fn insert_birthday(&self, record: BirthdayRecord) {
        self.birthdays.insert(record.user_id, record);
    }

    /// Mutate one record in memory, returning the updated snapshot if it exists
    pub fn update_birthday<F>(&self, user_id: UserId, mutate: F) -> Option<BirthdayRecord>
    where
        F: FnOnce(&mut BirthdayRecord),
    {
        let mut record = self.birthdays.get_mut(&user_id)?;
        mutate(record.value_mut());
        Some(record.value().clone())
    }

    pub async fn save_birthday(&self, user_id: UserId) -> Result<(), StoreError> {
        let Some(record) = self.birthday(user_id) else {
            return Ok(());
        };
        let value = serde_json::to_value(&record)?;
        self.nodes
            .set(&child_path(DATA_PATH, &user_id.to_string()), value)
            .await
    }

    pub async fn delete_birthday(&self, user_id: UserId) -> Result<(), StoreError> {
        self.birthdays.remove(&user_id);
        self.nodes
            .delete(&child_path(DATA_PATH, &user_id.to_string()))
            .await
    }

    // Reminders

    pub fn reminders(&self) -> Vec<(String, ReminderRecord)> {
        self.reminders
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Store a new reminder under a fresh id and persist it
    pub async fn add_reminder(&self, reminder: ReminderRecord) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.reminders.insert(id.clone(), reminder);
        self.save_reminder(&id).await?;
        Ok(id)
    }

    pub fn update_reminder<F>(&self, id: &str, mutate: F) -> Option<ReminderRecord>
    where
        F: FnOnce(&mut ReminderRecord),
    {
        let mut reminder = self.reminders.get_mut(id)?;
        mutate(reminder.value_mut());
        Some(reminder.value().clone())
    }

    pub async fn save_reminder(&self, id: &str) -> Result<(), StoreError> {
        let Some(reminder) = self.reminders.get(id).map(|r| r.value().clone()) else {
            return Ok(());
        };
        let value = serde_json::to_value(&reminder)?;
        self.nodes.set(&child_path(REMINDERS_PATH, id), value).await
    }

    pub async fn delete_reminder(&self, id: &str) -> Result<(), StoreError> {
        self.reminders.remove(id);
        self.nodes.delete(&child_path(REMINDERS_PATH, id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::OnboardingState;
    use poise::serenity_prelude::ChannelId;
    use serde_json::json;

    fn store() -> (Arc<MemoryStore>, BirthdayStore) {
        let nodes = Arc::new(MemoryStore::new());
        let store = BirthdayStore::new(nodes.clone());
        (nodes, store)
    }

    #[tokio::test]
    async fn test_load_writes_initial_configuration() {
        let (nodes, store) = store();
        store.load(2026).await.unwrap();

        let config = store.config().await;
        assert!(config.enabled);
        assert_eq!(config.last_calculated_year, Some(2026));
        assert!(nodes.get(CONFIG_PATH).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_load_reads_records_and_skips_garbage() {
        let (nodes, store) = store();
        let mut record = BirthdayRecord::new(UserId::new(7));
        record.onboarding = OnboardingState::Done;
        nodes
            .set("data/7", serde_json::to_value(&record).unwrap())
            .await
            .unwrap();
        nodes.set("data/8", json!("not a record")).await.unwrap();
        nodes
            .set("config", json!({ "enabled": false, "lastRoleIndexUsed": 2 }))
            .await
            .unwrap();

        store.load(2026).await.unwrap();

        assert_eq!(store.birthday(UserId::new(7)), Some(record));
        assert_eq!(store.birthday_ids(), vec![UserId::new(7)]);
        let config = store.config().await;
        assert!(!config.enabled);
        assert_eq!(config.last_role_index_used, 2);
    }

    #[tokio::test]
    async fn test_update_and_save_birthday() {
        let (nodes, store) = store();
        store.insert_birthday(BirthdayRecord::new(UserId::new(3)));

        let updated = store
            .update_birthday(UserId::new(3), |r| r.announced = true)
            .unwrap();
        assert!(updated.announced);
        assert!(store.update_birthday(UserId::new(4), |_| {}).is_none());

        store.save_birthday(UserId::new(3)).await.unwrap();
        let saved = nodes.get("data/3").await.unwrap().unwrap();
        assert_eq!(saved["announced"], json!(true));

        store.delete_birthday(UserId::new(3)).await.unwrap();
        assert!(store.birthday(UserId::new(3)).is_none());
        assert!(nodes.get("data/3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_config_update_is_persisted_on_save() {
        let (nodes, store) = store();
        store.load(2026).await.unwrap();

        store.update_config(|c| c.enabled = false).await;
        assert_eq!(nodes.get(CONFIG_PATH).await.unwrap().unwrap()["enabled"], json!(true));

        store.save_config().await.unwrap();
        assert_eq!(nodes.get(CONFIG_PATH).await.unwrap().unwrap()["enabled"], json!(false));
    }

    #[tokio::test]
    async fn test_reminder_lifecycle() {
        let (nodes, store) = store();
        let id = store
            .add_reminder(ReminderRecord {
                text: "stretch".to_string(),
                trigger_at: 1_000,
                author_id: UserId::new(1),
                channel_id: ChannelId::new(2),
                is_periodic: false,
                offset: None,
            })
            .await
            .unwrap();

        assert_eq!(store.reminders().len(), 1);
        assert!(nodes.get(&format!("reminders/{}", id)).await.unwrap().is_some());

        store.update_reminder(&id, |r| r.trigger_at = 2_000);
        store.save_reminder(&id).await.unwrap();
        let saved = nodes.get(&format!("reminders/{}", id)).await.unwrap().unwrap();
        assert_eq!(saved["triggerAt"], json!(2_000));

        store.delete_reminder(&id).await.unwrap();
        assert!(store.reminders().is_empty());
        assert!(nodes.children(REMINDERS_PATH).await.unwrap().is_empty());
    }
}
