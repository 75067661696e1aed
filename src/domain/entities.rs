//! Domain entities: content groups and the raw descriptor shapes

use std::fmt;
use std::str::FromStr;

use serde::de::{self, IgnoredAny, MapAccess, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Typed identity of a content group: the document object it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId {
    pub num: u32,
    pub generation: u16,
}

impl GroupId {
    pub fn new(num: u32, generation: u16) -> Self {
        Self { num, generation }
    }
}

impl From<u32> for GroupId {
    fn from(num: u32) -> Self {
        Self::new(num, 0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.num, self.generation)
    }
}

// Only integers and `{ num, gen }` tables are ids. Sequences must stay
// available for nested order lists.
impl<'de> Deserialize<'de> for GroupId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(GroupIdVisitor)
    }
}

struct GroupIdVisitor;

impl<'de> Visitor<'de> for GroupIdVisitor {
    type Value = GroupId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object number or a { num, gen } table")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<GroupId, E> {
        u32::try_from(v)
            .map(GroupId::from)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<GroupId, E> {
        u32::try_from(v)
            .map(GroupId::from)
            .map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<GroupId, A::Error> {
        let mut num = None;
        let mut generation = 0u16;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "num" => num = Some(map.next_value::<u32>()?),
                "gen" => generation = map.next_value()?,
                other => return Err(de::Error::unknown_field(other, &["num", "gen"])),
            }
        }
        let num = num.ok_or_else(|| de::Error::missing_field("num"))?;
        Ok(GroupId::new(num, generation))
    }
}

/// Visibility of a content group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    On,
    Off,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::On => write!(f, "on"),
            Visibility::Off => write!(f, "off"),
        }
    }
}

/// State of a tree node. Headings are fixed at `HeadingOnly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    On,
    Off,
    HeadingOnly,
}

impl From<Visibility> for NodeState {
    fn from(v: Visibility) -> Self {
        match v {
            Visibility::On => NodeState::On,
            Visibility::Off => NodeState::Off,
        }
    }
}

impl NodeState {
    /// The group visibility this state carries, `None` for headings.
    pub fn visibility(self) -> Option<Visibility> {
        match self {
            NodeState::On => Some(Visibility::On),
            NodeState::Off => Some(Visibility::Off),
            NodeState::HeadingOnly => None,
        }
    }
}

/// A named, independently togglable unit of document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentGroup {
    pub id: GroupId,
    pub name: String,
    pub initial_state: Visibility,
}

impl ContentGroup {
    pub fn new(id: impl Into<GroupId>, name: impl Into<String>, initial_state: Visibility) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            initial_state,
        }
    }
}

/// One position of the nested display order.
///
/// Anything that is neither a reference, a caption nor a list lands in
/// `Unsupported` and is skipped by the decoder.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OrderEntry {
    Reference(GroupId),
    Caption(String),
    Nested(Vec<OrderEntry>),
    Unsupported(IgnoredAny),
}

impl OrderEntry {
    pub fn reference(id: impl Into<GroupId>) -> Self {
        OrderEntry::Reference(id.into())
    }

    pub fn caption(text: impl Into<String>) -> Self {
        OrderEntry::Caption(text.into())
    }
}

/// One member slot of a radio (exclusion) group specification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RadioEntry {
    Reference(GroupId),
    Unsupported(IgnoredAny),
}

impl From<u32> for RadioEntry {
    fn from(num: u32) -> Self {
        RadioEntry::Reference(GroupId::from(num))
    }
}

/// What to do with registry groups a present display order never names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnreferencedGroups {
    /// Leave them out of the tree; they stay resolvable by id.
    #[default]
    Omit,
    /// Append them under root after the decoded entries, in registry order.
    AppendToRoot,
}

impl fmt::Display for UnreferencedGroups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnreferencedGroups::Omit => write!(f, "omit"),
            UnreferencedGroups::AppendToRoot => write!(f, "append-to-root"),
        }
    }
}

impl FromStr for UnreferencedGroups {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "omit" => Ok(UnreferencedGroups::Omit),
            "append-to-root" | "append" => Ok(UnreferencedGroups::AppendToRoot),
            other => Err(format!(
                "unknown unreferenced-groups policy '{}', expected omit or append-to-root",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        order: Vec<OrderEntry>,
    }

    #[test]
    fn given_mixed_toml_array_when_deserializing_then_maps_each_shape() {
        let holder: Holder =
            toml::from_str(r#"order = [1, "Cap", [2, { num = 3, gen = 1 }], true]"#).unwrap();
        assert_eq!(
            holder.order,
            vec![
                OrderEntry::reference(1),
                OrderEntry::caption("Cap"),
                OrderEntry::Nested(vec![
                    OrderEntry::reference(2),
                    OrderEntry::Reference(GroupId::new(3, 1)),
                ]),
                OrderEntry::Unsupported(IgnoredAny),
            ]
        );
    }

    #[test]
    fn given_two_number_list_when_deserializing_then_stays_nested() {
        let holder: Holder = toml::from_str("order = [[2, 3], { name = 4 }]").unwrap();
        assert_eq!(
            holder.order,
            vec![
                OrderEntry::Nested(vec![OrderEntry::reference(2), OrderEntry::reference(3)]),
                OrderEntry::Unsupported(IgnoredAny),
            ]
        );
    }

    #[test]
    fn given_group_id_when_displayed_then_uses_reference_form() {
        assert_eq!(GroupId::new(12, 0).to_string(), "12 0 R");
    }
}
