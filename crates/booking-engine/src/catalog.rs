//! Collaborator seams: workshop catalog and client provisioning.
//!
//! The engine does not own specialists, services, or client identities — it
//! consumes them through these traits. In-memory implementations are provided
//! for tests and the CLI snapshot format.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{BookingError, Result};
use crate::model::{
    ClientId, ClientProfile, Service, ServiceId, Specialist, SpecialistId, WorkshopId,
};

/// Workshop catalog: specialist and service lookup.
pub trait Catalog {
    fn specialist(&self, id: SpecialistId) -> Result<Option<Specialist>>;

    fn service(&self, id: ServiceId) -> Result<Option<Service>>;

    /// Services owned by one workshop, in display order.
    fn services_for_workshop(
        &self,
        workshop: WorkshopId,
    ) -> Result<Vec<Service>>;
}

/// Client-identity provisioning, keyed by phone number.
pub trait ClientDirectory {
    fn client(&self, id: ClientId) -> Result<Option<ClientProfile>>;

    /// Look a client up by phone; create a profile with the given name and
    /// city when none exists.
    fn find_or_create_by_phone(&self, phone: &str, name: &str, city: &str)
        -> Result<ClientProfile>;
}

impl<T: Catalog + ?Sized> Catalog for std::sync::Arc<T> {
    fn specialist(&self, id: SpecialistId) -> Result<Option<Specialist>> {
        (**self).specialist(id)
    }

    fn service(&self, id: ServiceId) -> Result<Option<Service>> {
        (**self).service(id)
    }

    fn services_for_workshop(
        &self,
        workshop: WorkshopId,
    ) -> Result<Vec<Service>> {
        (**self).services_for_workshop(workshop)
    }
}

impl<T: ClientDirectory + ?Sized> ClientDirectory for std::sync::Arc<T> {
    fn client(&self, id: ClientId) -> Result<Option<ClientProfile>> {
        (**self).client(id)
    }

    fn find_or_create_by_phone(
        &self,
        phone: &str,
        name: &str,
        city: &str,
    ) -> Result<ClientProfile> {
        (**self).find_or_create_by_phone(phone, name, city)
    }
}

/// In-memory [`Catalog`].
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    specialists: BTreeMap<SpecialistId, Specialist>,
    services: BTreeMap<ServiceId, Service>,
}

impl MemoryCatalog {
    pub fn new(specialists: Vec<Specialist>, services: Vec<Service>) -> Self {
        Self {
            specialists: specialists.into_iter().map(|s| (s.id, s)).collect(),
            services: services.into_iter().map(|s| (s.id, s)).collect(),
        }
    }
}

impl Catalog for MemoryCatalog {
    fn specialist(&self, id: SpecialistId) -> Result<Option<Specialist>> {
        Ok(self.specialists.get(&id).cloned())
    }

    fn service(&self, id: ServiceId) -> Result<Option<Service>> {
        Ok(self.services.get(&id).cloned())
    }

    fn services_for_workshop(
        &self,
        workshop: WorkshopId,
    ) -> Result<Vec<Service>> {
        Ok(self
            .services
            .values()
            .filter(|s| s.workshop == workshop)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
struct DirectoryInner {
    clients: BTreeMap<ClientId, ClientProfile>,
    next_id: u64,
}

/// In-memory [`ClientDirectory`].
#[derive(Debug, Default)]
pub struct MemoryClientDirectory {
    inner: Mutex<DirectoryInner>,
}

impl MemoryClientDirectory {
    pub fn new(clients: Vec<ClientProfile>) -> Self {
        let next_id = clients.iter().map(|c| c.id.0 + 1).max().unwrap_or(1);
        Self {
            inner: Mutex::new(DirectoryInner {
                clients: clients.into_iter().map(|c| (c.id, c)).collect(),
                next_id,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, DirectoryInner>> {
        self.inner
            .lock()
            .map_err(|_| BookingError::Storage("client directory lock poisoned".into()))
    }

    /// Every profile, ordered by id. Used for snapshot export.
    pub fn snapshot(&self) -> Result<Vec<ClientProfile>> {
        Ok(self.lock()?.clients.values().cloned().collect())
    }
}

impl ClientDirectory for MemoryClientDirectory {
    fn client(&self, id: ClientId) -> Result<Option<ClientProfile>> {
        Ok(self.lock()?.clients.get(&id).cloned())
    }

    fn find_or_create_by_phone(
        &self,
        phone: &str,
        name: &str,
        city: &str,
    ) -> Result<ClientProfile> {
        let mut inner = self.lock()?;
        if let Some(existing) = inner.clients.values().find(|c| c.phone == phone) {
            return Ok(existing.clone());
        }
        let id = ClientId(inner.next_id);
        inner.next_id += 1;
        let profile = ClientProfile {
            id,
            name: name.to_string(),
            phone: phone.to_string(),
            city: city.to_string(),
        };
        inner.clients.insert(id, profile.clone());
        Ok(profile)
    }
}
