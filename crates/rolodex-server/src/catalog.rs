//! The immutable agency/contact snapshot served by the listing endpoints.

use std::collections::BTreeSet;

use tracing::{info, warn};

use rolodex_shared::error::RecordError;
use rolodex_shared::projector::{project, ContactView};
use rolodex_shared::protocol::Page;
use rolodex_shared::records::{self, Agency, Contact};

use crate::config::ServerConfig;

#[derive(Debug, Clone, Default)]
pub struct RecordCatalog {
    agencies: Vec<Agency>,
    contacts: Vec<Contact>,
}

impl RecordCatalog {
    pub fn new(agencies: Vec<Agency>, contacts: Vec<Contact>) -> Self {
        Self { agencies, contacts }
    }

    /// Load both CSV exports named in the config. An unset path yields an
    /// empty list; a configured path that cannot be read is an error.
    pub fn load(config: &ServerConfig) -> Result<Self, RecordError> {
        let agencies = match &config.agencies_csv {
            Some(path) => records::load_agencies(path)?,
            None => {
                warn!("AGENCIES_CSV not set, serving no agencies");
                Vec::new()
            }
        };
        let contacts = match &config.contacts_csv {
            Some(path) => records::load_contacts(path)?,
            None => {
                warn!("CONTACTS_CSV not set, serving no contacts");
                Vec::new()
            }
        };

        info!(
            agencies = agencies.len(),
            contacts = contacts.len(),
            "Record catalog loaded"
        );
        Ok(Self::new(agencies, contacts))
    }

    pub fn agencies(&self) -> &[Agency] {
        &self.agencies
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn agencies_page(&self, page: usize, per_page: usize) -> Page<Agency> {
        Page::slice(&self.agencies, page, per_page)
    }

    /// A page of contacts with personal fields masked unless revealed.
    pub fn contacts_page(
        &self,
        page: usize,
        per_page: usize,
        viewed_ids: &BTreeSet<String>,
    ) -> Page<ContactView> {
        Page::slice(&self.contacts, page, per_page)
            .map(|contact| project(&contact, viewed_ids).into_view())
    }
}
