//! Resource property trees.
//!
//! Input: structured (JSON) property payloads as the transport delivers them.
//! Output: a closed value model ([`PropertyValue`]) plus two read interposers:
//! - [`Guarded`] turns reads of not-yet-known values into [`UnknownValueError`]
//! - [`SecretView`] hides secret wrapping on read and re-applies it on write
//!
//! The codec is symmetric: [`encode`] emits exactly the discriminant maps [`decode`] accepts.

#![forbid(unsafe_code)]

mod codec;
mod error;
mod guard;
mod pending;
mod secret;
mod value;

#[cfg(test)]
mod proptest;

pub use codec::{
    ARCHIVE_SIG, ASSET_SIG, DecodeOptions, SECRET_SIG, SIG_KEY, decode, decode_properties,
    encode, encode_properties,
};
pub use error::{CodecError, ViewError};
pub use guard::{Guarded, GuardedEntries, GuardedIter, UnknownValueError, guard};
pub use pending::{PendingMap, PendingValue, resolve, resolve_properties};
pub use secret::SecretView;
pub use value::{Archive, ArchiveMember, Asset, PropertyMap, PropertyValue, UnknownKind};
