//! Record visibility projection.
//!
//! A contact's personal fields are shown only once its id is in the
//! caller's revealed set; otherwise they are replaced by fixed masking
//! tokens. Pure and allocation-free for revealed contacts.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::records::Contact;

pub const MASK_NAME: &str = "•••••";
pub const MASK_EMAIL: &str = "•••••••@••••••.com";
pub const MASK_PHONE: &str = "•••-•••-••••";
pub const MASK_TEXT: &str = "•••••••";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection<'a> {
    Revealed(&'a Contact),
    Masked(Contact),
}

impl Projection<'_> {
    pub fn is_revealed(&self) -> bool {
        matches!(self, Projection::Revealed(_))
    }

    pub fn contact(&self) -> &Contact {
        match self {
            Projection::Revealed(contact) => contact,
            Projection::Masked(contact) => contact,
        }
    }

    pub fn into_view(self) -> ContactView {
        let revealed = self.is_revealed();
        let contact = match self {
            Projection::Revealed(contact) => contact.clone(),
            Projection::Masked(contact) => contact,
        };
        ContactView { revealed, contact }
    }
}

/// Serialized form of a projected contact.
#[derive(Debug, Clone, Serialize)]
pub struct ContactView {
    pub revealed: bool,
    #[serde(flatten)]
    pub contact: Contact,
}

pub fn project<'a>(contact: &'a Contact, viewed_ids: &BTreeSet<String>) -> Projection<'a> {
    if viewed_ids.contains(&contact.id) {
        return Projection::Revealed(contact);
    }

    Projection::Masked(Contact {
        first_name: MASK_NAME.to_string(),
        last_name: MASK_NAME.to_string(),
        email: MASK_EMAIL.to_string(),
        phone: MASK_PHONE.to_string(),
        title: MASK_TEXT.to_string(),
        department: MASK_TEXT.to_string(),
        ..contact.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> Contact {
        Contact {
            id: "c1".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.org".into(),
            phone: "555-010-2000".into(),
            title: "Superintendent".into(),
            department: "Administration".into(),
            agency_id: "a9".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_unviewed_contact_is_masked() {
        let contact = contact();
        let projection = project(&contact, &BTreeSet::new());

        assert!(!projection.is_revealed());
        let shown = projection.contact();
        assert_eq!(shown.first_name, MASK_NAME);
        assert_eq!(shown.email, MASK_EMAIL);
        assert_eq!(shown.phone, MASK_PHONE);
        assert_eq!(shown.department, MASK_TEXT);
        // Non-personal fields pass through.
        assert_eq!(shown.id, "c1");
        assert_eq!(shown.agency_id, "a9");
    }

    #[test]
    fn test_viewed_contact_is_unmodified() {
        let contact = contact();
        let viewed: BTreeSet<String> = ["c1".to_string()].into_iter().collect();

        let projection = project(&contact, &viewed);
        assert_eq!(projection, Projection::Revealed(&contact));

        let view = projection.into_view();
        assert!(view.revealed);
        assert_eq!(view.contact, contact);
    }
}
