// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! vCard contacts (RFC 6350, vCard 3.0 and 4.0)
//!
//! Contact groups are vCards with `KIND:group` whose members are listed as
//! `MEMBER:urn:uuid:<uid>`. Apple-style `X-ADDRESSBOOKSERVER-KIND` and
//! `X-ADDRESSBOOKSERVER-MEMBER` are understood as well. Members may arrive
//! before or after their group, so memberships are only written to the store
//! in [`post_process`](super::ResourceAdapter::post_process).

use std::collections::BTreeMap;

use tracing::debug;

use super::text::Component;
use super::{apply_record, AdapterError, Applied, Record, ResourceAdapter};
use crate::model::{CollectionType, SyncAction};
use crate::resource::LocalResourceStore;

const MEMBER_URN_PREFIX: &str = "urn:uuid:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VCard {
    component: Component,
}

impl VCard {
    /// A minimal vCard 4.0 with a formatted name and uid.
    pub fn new(uid: &str, formatted_name: &str) -> Self {
        let mut component = Component::new("VCARD");
        component.set_text("VERSION", "4.0");
        component.set_text("UID", uid);
        component.set_text("FN", formatted_name);
        VCard { component }
    }

    /// A contact group with the given member uids.
    pub fn group(uid: &str, name: &str, members: &[&str]) -> Self {
        let mut card = Self::new(uid, name);
        card.component.set_text("KIND", "group");
        for member in members {
            card.component.properties.push(super::text::Property::new(
                "MEMBER",
                &format!("{}{}", MEMBER_URN_PREFIX, member),
            ));
        }
        card
    }

    pub fn parse(text: &str) -> Result<Self, AdapterError> {
        let component = Component::parse(text)?;
        if component.name != "VCARD" {
            return Err(AdapterError::WrongKind {
                expected: "VCARD",
                found: component.name,
            });
        }
        Ok(VCard { component })
    }

    pub fn uid(&self) -> Option<String> {
        self.component
            .property("UID")
            .map(|p| p.text_value())
            .filter(|uid| !uid.is_empty())
    }

    pub fn set_uid(&mut self, uid: &str) {
        self.component.set_text("UID", uid);
    }

    pub fn formatted_name(&self) -> Option<String> {
        self.component.property("FN").map(|p| p.text_value())
    }

    pub fn is_group(&self) -> bool {
        ["KIND", "X-ADDRESSBOOKSERVER-KIND"].iter().any(|name| {
            self.component
                .property(name)
                .is_some_and(|p| p.text_value().eq_ignore_ascii_case("group"))
        })
    }

    /// Uids of the group members, in listed order.
    pub fn members(&self) -> Vec<String> {
        self.component
            .properties
            .iter()
            .filter(|p| matches!(p.base_name(), "MEMBER" | "X-ADDRESSBOOKSERVER-MEMBER"))
            .map(|p| {
                let value = p.value.trim();
                value
                    .strip_prefix(MEMBER_URN_PREFIX)
                    .unwrap_or(value)
                    .to_string()
            })
            .filter(|uid| !uid.is_empty())
            .collect()
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn to_text(&self) -> String {
        self.component.to_text()
    }
}

/// Adapter for address books.
#[derive(Debug, Default)]
pub struct ContactsAdapter {
    /// Group uid -> member uids, collected while applying.
    pending_groups: BTreeMap<String, Vec<String>>,
}

impl ContactsAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceAdapter for ContactsAdapter {
    fn kind(&self) -> CollectionType {
        CollectionType::Contacts
    }

    fn decode(&self, content: &str) -> Result<Record, AdapterError> {
        Ok(Record::Contact(VCard::parse(content)?))
    }

    fn apply(
        &mut self,
        store: &mut dyn LocalResourceStore,
        action: SyncAction,
        record: &Record,
        entry_uid: &str,
    ) -> Result<Applied, AdapterError> {
        let Record::Contact(card) = record else {
            return Err(AdapterError::WrongKind {
                expected: "VCARD",
                found: "VCALENDAR".to_string(),
            });
        };

        let applied = apply_record(store, action, record, &card.to_text(), entry_uid)?;

        if let Some(uid) = card.uid() {
            match applied {
                Applied::Created | Applied::Updated if card.is_group() => {
                    self.pending_groups.insert(uid, card.members());
                }
                Applied::Deleted => {
                    self.pending_groups.remove(&uid);
                }
                _ => {}
            }
        }
        Ok(applied)
    }

    fn post_process(&mut self, store: &mut dyn LocalResourceStore) -> Result<(), AdapterError> {
        for (group_uid, members) in std::mem::take(&mut self.pending_groups) {
            let mut resolved = Vec::with_capacity(members.len());
            for member in members {
                if store.get_by_uid(&member)?.is_some() {
                    resolved.push(member);
                } else {
                    debug!(group = %group_uid, member = %member, "group member not in store");
                }
            }
            store.set_group_members(&group_uid, &resolved)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = "BEGIN:VCARD\r\nVERSION:3.0\r\nUID:abc\r\nFN:Jane\\, Doe\r\nX-CUSTOM;TYPE=x:keep me\r\nEND:VCARD\r\n";

    #[test]
    fn test_parse_reads_uid_and_name() {
        let card = VCard::parse(CARD).unwrap();
        assert_eq!(card.uid().as_deref(), Some("abc"));
        assert_eq!(card.formatted_name().as_deref(), Some("Jane, Doe"));
        assert!(!card.is_group());
    }

    #[test]
    fn test_unknown_properties_survive() {
        let card = VCard::parse(CARD).unwrap();
        assert_eq!(card.to_text(), CARD);
    }

    #[test]
    fn test_group_members_both_styles() {
        let text = "BEGIN:VCARD\r\nVERSION:3.0\r\nUID:g\r\nFN:Team\r\n\
                    X-ADDRESSBOOKSERVER-KIND:group\r\n\
                    X-ADDRESSBOOKSERVER-MEMBER:urn:uuid:m1\r\nMEMBER:m2\r\nEND:VCARD\r\n";
        let card = VCard::parse(text).unwrap();
        assert!(card.is_group());
        assert_eq!(card.members(), vec!["m1", "m2"]);
    }

    #[test]
    fn test_wrong_component_is_rejected() {
        let err = VCard::parse("BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n").unwrap_err();
        assert!(matches!(err, AdapterError::WrongKind { .. }));
    }
}
