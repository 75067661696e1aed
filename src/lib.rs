//! Optional content (layer) visibility model.
//!
//! Turns a document's content groups, its nested display order and its radio
//! groups into a tree with at-most-one-on exclusion, addressable by
//! (parent, row) for list and tree widgets.
//!
//! ```
//! use layertree::domain::{ContentGroup, OrderEntry, TreeBuilder, Visibility};
//!
//! let groups = vec![
//!     ContentGroup::new(1, "Streets", Visibility::On),
//!     ContentGroup::new(2, "Labels", Visibility::Off),
//! ];
//! let order = vec![OrderEntry::caption("Map"), OrderEntry::reference(1), OrderEntry::reference(2)];
//! let model = TreeBuilder::new().build(groups, Some(order.as_slice()), None);
//!
//! let caption = model.child_at(model.root(), 0).unwrap();
//! assert_eq!(model.name(caption).unwrap(), "Map");
//! assert_eq!(model.child_count(caption).unwrap(), 2);
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
