pub mod payload;
pub mod resource;
pub mod share;
pub mod user;

pub use payload::{ClipboardPayload, CommandPayload, LinkEntry, LinkSetPayload};
pub use resource::{
    PublicResourceView, Resource, ResourceKind, ResourceView, ShareGrant, SharedItemPatch,
};
pub use share::{ShareActionKind, ShareOutcome, ShareRequest};
pub use user::User;
