//! Hub de diffusion : registre des abonnés et fan-out des instantanés
//!
//! Chaque abonné dispose d'une boîte aux lettres bornée. La publication ne
//! bloque jamais : un abonné dont la boîte est pleine est considéré comme
//! mort et désinscrit d'office. Il devra se reconnecter pour recevoir un
//! nouvel instantané complet.

use crate::state::PlaybackSnapshot;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

type Mailbox = mpsc::Sender<Arc<PlaybackSnapshot>>;

struct HubInner {
    subscribers: RwLock<HashMap<u64, Mailbox>>,
    counter: AtomicU64,
}

impl HubInner {
    fn remove(&self, id: u64) -> bool {
        let mut guard = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        guard.remove(&id).is_some()
    }
}

/// Registre thread-safe des abonnés
#[derive(Clone)]
pub struct SubscriberHub {
    inner: Arc<HubInner>,
}

impl Default for SubscriberHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriberHub {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                subscribers: RwLock::new(HashMap::new()),
                counter: AtomicU64::new(1),
            }),
        }
    }

    /// Inscrit un abonné avec une boîte de `capacity` messages
    pub fn subscribe(&self, capacity: usize) -> Subscription {
        self.register(capacity, None)
    }

    /// Inscrit un abonné dont la boîte contient déjà `initial`
    ///
    /// L'instantané initial est déposé avant l'inscription : aucune
    /// publication ne peut le précéder.
    pub fn subscribe_with(&self, capacity: usize, initial: PlaybackSnapshot) -> Subscription {
        self.register(capacity, Some(Arc::new(initial)))
    }

    fn register(&self, capacity: usize, initial: Option<Arc<PlaybackSnapshot>>) -> Subscription {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        if let Some(snapshot) = initial {
            // Boîte neuve et capacité >= 1 : ne peut pas échouer
            let _ = tx.try_send(snapshot);
        }

        let id = self.inner.counter.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, tx);
        debug!(subscriber = id, "Subscriber registered");

        Subscription {
            id,
            rx,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Désinscrit un abonné ; sa boîte est fermée. Retourne false s'il était déjà parti.
    pub fn unsubscribe(&self, id: u64) -> bool {
        let removed = self.inner.remove(id);
        if removed {
            debug!(subscriber = id, "Subscriber unregistered");
        }
        removed
    }

    /// Diffuse un instantané à tous les abonnés sans bloquer
    ///
    /// Retourne le nombre d'abonnés ayant reçu l'instantané.
    pub fn publish(&self, snapshot: PlaybackSnapshot) -> usize {
        let snapshot = Arc::new(snapshot);
        let mut delivered = 0;
        let mut dropped = Vec::new();

        {
            let guard = self.inner.subscribers.read().unwrap_or_else(|e| e.into_inner());
            for (id, tx) in guard.iter() {
                match tx.try_send(snapshot.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        warn!(subscriber = id, "Subscriber mailbox full, dropping subscriber");
                        dropped.push(*id);
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!(subscriber = id, "Subscriber gone, removing");
                        dropped.push(*id);
                    }
                }
            }
        }

        if !dropped.is_empty() {
            let mut guard = self.inner.subscribers.write().unwrap_or_else(|e| e.into_inner());
            for id in dropped {
                guard.remove(&id);
            }
        }

        delivered
    }

    /// Nombre d'abonnés vivants
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_subscribed(&self, id: u64) -> bool {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&id)
    }
}

/// Poignée d'un abonné : reçoit les instantanés, se désinscrit au `Drop`
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<Arc<PlaybackSnapshot>>,
    hub: Weak<HubInner>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Prochain instantané ; `None` quand le hub a fermé la boîte (abonné éjecté)
    pub async fn recv(&mut self) -> Option<Arc<PlaybackSnapshot>> {
        self.rx.recv().await
    }

    /// Variante non bloquante de [`Subscription::recv`]
    pub fn try_recv(&mut self) -> Option<Arc<PlaybackSnapshot>> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.hub.upgrade() {
            if inner.remove(self.id) {
                debug!(subscriber = self.id, "Subscription dropped");
            }
        }
    }
}
