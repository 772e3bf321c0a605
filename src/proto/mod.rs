// MIT/Apache2 License

//! Protocol bindings.
//!
//! [`xproto`] covers the core protocol, whose opcodes are fixed. [`xinput`]
//! is an extension whose events and errors start at offsets assigned by the
//! server, and shows how a runtime-offset protocol plugs into the same
//! dispatch machinery.

pub mod xinput;
pub mod xproto;
