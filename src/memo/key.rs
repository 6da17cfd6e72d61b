//! Key Derivation Module
//!
//! Turns a producer name and an argument tuple into the two halves of a store key.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::digest::digest;

// == Producer Id ==
/// Stable identity of a wrapped producer: the digest of its registered name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProducerId(String);

impl ProducerId {
    /// Derives the identity for a producer registered as `name`.
    pub fn new(name: &str) -> Self {
        Self(digest(name.as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Args Digest ==
/// Digest of the canonical serialization of one argument tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgsDigest(String);

impl ArgsDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArgsDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Arguments ==
/// A positional argument list.
///
/// Implemented for tuples of up to eight [`Serialize`] elements; `()` is the empty list and
/// `(x,)` a single argument.
pub trait Arguments: Send + 'static {
    /// Renders every argument to canonical JSON, in order.
    fn canonical(&self) -> serde_json::Result<Vec<String>>;
}

/// Canonical JSON for one argument.
///
/// Going through [`Value`] sorts object keys, so maps with equal contents render equally no
/// matter their iteration order.
fn canonical_json<T: Serialize + ?Sized>(arg: &T) -> serde_json::Result<String> {
    let value: Value = serde_json::to_value(arg)?;
    serde_json::to_string(&value)
}

macro_rules! impl_arguments {
    ($($name:ident),*) => {
        impl<$($name),*> Arguments for ($($name,)*)
        where
            $($name: Serialize + Send + 'static,)*
        {
            #[allow(non_snake_case)]
            fn canonical(&self) -> serde_json::Result<Vec<String>> {
                let ($($name,)*) = self;
                Ok(vec![$(canonical_json($name)?),*])
            }
        }
    };
}

impl_arguments!();
impl_arguments!(A1);
impl_arguments!(A1, A2);
impl_arguments!(A1, A2, A3);
impl_arguments!(A1, A2, A3, A4);
impl_arguments!(A1, A2, A3, A4, A5);
impl_arguments!(A1, A2, A3, A4, A5, A6);
impl_arguments!(A1, A2, A3, A4, A5, A6, A7);
impl_arguments!(A1, A2, A3, A4, A5, A6, A7, A8);

// == Derive Call Key ==
/// Digests an argument tuple.
///
/// Each argument is framed as `<byte length>:<json>` so no argument boundary is ambiguous. The
/// empty tuple digests the empty string.
pub fn derive_call_key<A: Arguments + ?Sized>(args: &A) -> serde_json::Result<ArgsDigest> {
    let mut framed = String::new();
    for arg in args.canonical()? {
        framed.push_str(&arg.len().to_string());
        framed.push(':');
        framed.push_str(&arg);
    }
    Ok(ArgsDigest(digest(framed.as_bytes())))
}

/// Formats the full store key `<prefix>:<producer>:<args>`.
pub fn store_key(prefix: &str, producer: &ProducerId, args: &ArgsDigest) -> String {
    format!("{}:{}:{}", prefix, producer, args)
}
