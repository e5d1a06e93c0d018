// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Content lines (RFC 6350 / RFC 5545)
//!
//! vCard and iCalendar share one text syntax: folded content lines of the
//! form `NAME;PARAM=value:VALUE`, grouped into `BEGIN:X` / `END:X`
//! components. Property values are kept in their escaped wire form so that
//! unknown properties survive a round trip byte for byte.

use super::AdapterError;

/// Lines are folded at this many octets.
const FOLD_WIDTH: usize = 75;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Upper-cased property name, including any `group.` prefix.
    pub name: String,
    pub params: Vec<(String, String)>,
    /// Raw (escaped) value.
    pub value: String,
}

impl Property {
    pub fn new(name: &str, value: &str) -> Self {
        Property {
            name: name.to_ascii_uppercase(),
            params: Vec::new(),
            value: value.to_string(),
        }
    }

    /// A property holding `text`, escaped.
    pub fn text(name: &str, text: &str) -> Self {
        Self::new(name, &escape_text(text))
    }

    /// Property name without the `group.` prefix.
    pub fn base_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The value unescaped as TEXT.
    pub fn text_value(&self) -> String {
        unescape_text(&self.value)
    }

    fn parse(line: &str) -> Result<Self, AdapterError> {
        let mut in_quotes = false;
        let mut split = None;
        for (i, c) in line.char_indices() {
            match c {
                '"' => in_quotes = !in_quotes,
                ':' if !in_quotes => {
                    split = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let colon = split
            .ok_or_else(|| AdapterError::Parse(format!("content line without ':': {}", line)))?;
        let (head, value) = (&line[..colon], &line[colon + 1..]);

        let mut parts = split_params(head).into_iter();
        let name = parts
            .next()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AdapterError::Parse(format!("content line without name: {}", line)))?;

        let params = parts
            .map(|p| match p.split_once('=') {
                Some((k, v)) => (k.to_ascii_uppercase(), v.to_string()),
                // vCard 2.1 style bare parameter, e.g. `TEL;CELL:`
                None => ("TYPE".to_string(), p.to_string()),
            })
            .collect();

        Ok(Property {
            name: name.to_ascii_uppercase(),
            params,
            value: value.to_string(),
        })
    }

    fn write(&self, out: &mut String) {
        let mut line = self.name.clone();
        for (k, v) in &self.params {
            line.push(';');
            line.push_str(k);
            line.push('=');
            line.push_str(v);
        }
        line.push(':');
        line.push_str(&self.value);
        fold_into(&line, out);
    }
}

/// Splits `NAME;A=1;B="x;y"` on semicolons outside quotes.
fn split_params(head: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in head.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ';' if !in_quotes => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Upper-cased component name, e.g. `VCARD` or `VEVENT`.
    pub name: String,
    pub properties: Vec<Property>,
    pub children: Vec<Component>,
}

impl Component {
    pub fn new(name: &str) -> Self {
        Component {
            name: name.to_ascii_uppercase(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Parses exactly one top-level component.
    pub fn parse(input: &str) -> Result<Self, AdapterError> {
        let lines = unfold(input);
        let mut stack: Vec<Component> = Vec::new();
        let mut root = None;

        for line in lines.iter().filter(|l| !l.trim().is_empty()) {
            let property = Property::parse(line)?;
            match property.name.as_str() {
                "BEGIN" => {
                    if root.is_some() {
                        return Err(AdapterError::Parse("content after END of root".into()));
                    }
                    stack.push(Component::new(property.value.trim()));
                }
                "END" => {
                    let done = stack
                        .pop()
                        .ok_or_else(|| AdapterError::Parse("END without BEGIN".into()))?;
                    if !done.name.eq_ignore_ascii_case(property.value.trim()) {
                        return Err(AdapterError::Parse(format!(
                            "END:{} closes BEGIN:{}",
                            property.value.trim(),
                            done.name
                        )));
                    }
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(done),
                        None => root = Some(done),
                    }
                }
                _ => match stack.last_mut() {
                    Some(current) => current.properties.push(property),
                    None => {
                        return Err(AdapterError::Parse(format!(
                            "property {} outside of a component",
                            property.name
                        )))
                    }
                },
            }
        }

        if let Some(open) = stack.last() {
            return Err(AdapterError::Parse(format!("missing END:{}", open.name)));
        }
        root.ok_or_else(|| AdapterError::Parse("no component found".into()))
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.base_name() == name)
    }

    pub fn properties_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> {
        self.properties.iter().filter(move |p| p.base_name() == name)
    }

    /// Replaces every `name` property with a single TEXT property.
    pub fn set_text(&mut self, name: &str, text: &str) {
        let position = self.properties.iter().position(|p| p.base_name() == name);
        self.properties.retain(|p| p.base_name() != name);
        let property = Property::text(name, text);
        match position {
            Some(i) => self.properties.insert(i.min(self.properties.len()), property),
            None => self.properties.push(property),
        }
    }

    pub fn child(&self, name: &str) -> Option<&Component> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Serializes with CRLF line endings and folded lines.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut String) {
        fold_into(&format!("BEGIN:{}", self.name), out);
        for property in &self.properties {
            property.write(out);
        }
        for child in &self.children {
            child.write(out);
        }
        fold_into(&format!("END:{}", self.name), out);
    }
}

/// Joins folded lines: a line starting with a space or tab continues the
/// previous one.
pub fn unfold(input: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in input.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        match raw.strip_prefix(|c| c == ' ' || c == '\t') {
            Some(rest) if !lines.is_empty() => {
                if let Some(last) = lines.last_mut() {
                    last.push_str(rest);
                }
            }
            _ => lines.push(raw.to_string()),
        }
    }
    lines
}

/// Appends `line` folded at [`FOLD_WIDTH`] octets, never splitting a
/// UTF-8 sequence.
fn fold_into(line: &str, out: &mut String) {
    let mut width = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > FOLD_WIDTH {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(c);
        width += len;
    }
    out.push_str("\r\n");
}

pub fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(';', "\\;")
        .replace('\n', "\\n")
}

pub fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
