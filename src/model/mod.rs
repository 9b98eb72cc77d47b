//! Wire-level data structures for every console resource.
//!
//! Field names follow the backend's camelCase JSON. Optional fields default so that
//! older backends that omit them still decode.

pub mod activity_log;
pub mod audit;
pub mod compliance_rule;
pub mod deleted_document;
pub mod invoice;
pub mod notification_template;
pub mod system_setting;
pub mod tenant;

pub use activity_log::*;
pub use audit::*;
pub use compliance_rule::*;
pub use deleted_document::*;
pub use invoice::*;
pub use notification_template::*;
pub use system_setting::*;
pub use tenant::*;
