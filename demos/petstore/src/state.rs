use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::{NewPet, Pet};

#[derive(Clone, Default)]
pub struct AppState {
    pets: Arc<RwLock<BTreeMap<u64, Pet>>>,
    next_id: Arc<AtomicU64>,
}

impl AppState {
    pub async fn list(&self, tag: Option<&str>, limit: usize) -> Vec<Pet> {
        let pets = self.pets.read().await;
        pets.values()
            .filter(|pet| tag.is_none() || pet.tag.as_deref() == tag)
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn get(&self, id: u64) -> Option<Pet> {
        self.pets.read().await.get(&id).cloned()
    }

    pub async fn insert(&self, new: &NewPet) -> Pet {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let pet = Pet {
            id,
            name: new.name.clone(),
            tag: new.tag.clone(),
        };
        self.pets.write().await.insert(id, pet.clone());
        pet
    }

    pub async fn remove(&self, id: u64) -> bool {
        self.pets.write().await.remove(&id).is_some()
    }
}
