//! Package extraction with file, node, property and mixin filters.

pub mod docview;
pub mod namespace;
pub mod rules;
pub mod unpacker;

pub use docview::ReplicationMarker;
pub use namespace::{decode_segment, get_namespace_prefix, repository_path};
pub use rules::ExclusionRuleSet;
pub use unpacker::{ContentUnpacker, UnpackReport};
