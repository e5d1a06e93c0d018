// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! iCalendar events and tasks (RFC 5545)

use super::text::Component;
use super::{AdapterError, Record, ResourceAdapter};
use crate::model::CollectionType;

/// A VCALENDAR object carrying one VEVENT or VTODO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ICalendar {
    calendar: Component,
    /// `VEVENT` or `VTODO`.
    item: &'static str,
}

fn item_name(kind: CollectionType) -> &'static str {
    match kind {
        CollectionType::Tasks => "VTODO",
        _ => "VEVENT",
    }
}

impl ICalendar {
    pub fn new(kind: CollectionType, uid: &str, summary: &str) -> Self {
        let item = item_name(kind);
        let mut calendar = Component::new("VCALENDAR");
        calendar.set_text("VERSION", "2.0");
        calendar.set_text("PRODID", "-//Chainsync//EN");

        let mut child = Component::new(item);
        child.set_text("UID", uid);
        child.set_text("SUMMARY", summary);
        calendar.children.push(child);

        ICalendar { calendar, item }
    }

    /// Parses a VCALENDAR that must contain an item of `kind`.
    pub fn parse(kind: CollectionType, text: &str) -> Result<Self, AdapterError> {
        let calendar = Component::parse(text)?;
        if calendar.name != "VCALENDAR" {
            return Err(AdapterError::WrongKind {
                expected: "VCALENDAR",
                found: calendar.name,
            });
        }

        let item = item_name(kind);
        if calendar.child(item).is_none() {
            let found = calendar
                .children
                .iter()
                .map(|c| c.name.clone())
                .collect::<Vec<_>>()
                .join(",");
            return Err(AdapterError::WrongKind {
                expected: item,
                found: if found.is_empty() { "nothing".to_string() } else { found },
            });
        }
        Ok(ICalendar { calendar, item })
    }

    fn item(&self) -> Option<&Component> {
        self.calendar.child(self.item)
    }

    pub fn uid(&self) -> Option<String> {
        self.item()
            .and_then(|c| c.property("UID"))
            .map(|p| p.text_value())
            .filter(|uid| !uid.is_empty())
    }

    /// Sets the UID of every item, including recurrence overrides.
    pub fn set_uid(&mut self, uid: &str) {
        let item = self.item;
        for child in self.calendar.children.iter_mut().filter(|c| c.name == item) {
            child.set_text("UID", uid);
        }
    }

    pub fn summary(&self) -> Option<String> {
        self.item()
            .and_then(|c| c.property("SUMMARY"))
            .map(|p| p.text_value())
    }

    pub fn to_text(&self) -> String {
        self.calendar.to_text()
    }
}

/// Adapter for calendars (VEVENT) and task lists (VTODO).
#[derive(Debug)]
pub struct CalendarAdapter {
    kind: CollectionType,
}

impl CalendarAdapter {
    pub fn new(kind: CollectionType) -> Self {
        CalendarAdapter { kind }
    }
}

impl ResourceAdapter for CalendarAdapter {
    fn kind(&self) -> CollectionType {
        self.kind
    }

    fn decode(&self, content: &str) -> Result<Record, AdapterError> {
        Ok(Record::Calendar(ICalendar::parse(self.kind, content)?))
    }
}
