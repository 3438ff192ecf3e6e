//! Typed argument lists for calls and replies.

use crate::decoder::{Decoder, DecoderConfig};
use crate::encoder::encode_args;
use crate::error::Error;
use crate::idl_type::{IdlType, TypeBuilder};
use crate::types::Type;
use crate::value::Value;

/// Collects typed call arguments and encodes them as one message.
///
/// # Example
///
/// ```
/// use ironidl_core::ArgBuilder;
///
/// let bytes = ArgBuilder::new()
///     .arg(&42u128)
///     .arg(&"hello".to_string())
///     .encode()
///     .unwrap();
/// assert!(bytes.starts_with(b"DIDL"));
/// ```
#[derive(Debug, Default)]
pub struct ArgBuilder {
    types: TypeBuilder,
    args: Vec<(Type, Value)>,
}

impl ArgBuilder {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg<T: IdlType>(mut self, value: &T) -> Self {
        let ty = T::idl_type(&mut self.types);
        self.args.push((ty, value.to_value()));
        self
    }

    /// Encodes the arguments.
    ///
    /// # Errors
    /// Returns [`Error`] if a value does not conform to its type.
    pub fn encode(self) -> Result<Vec<u8>, Error> {
        encode_args(self.types.table(), &self.args)
    }
}

/// Reads typed values out of a reply message.
#[derive(Debug)]
pub struct ReplyDecoder<'a> {
    decoder: Decoder<'a>,
    types: TypeBuilder,
}

impl<'a> ReplyDecoder<'a> {
    /// Parses the reply header.
    ///
    /// # Errors
    /// Returns [`Error`] for a malformed header.
    pub fn new(bytes: &'a [u8]) -> Result<Self, Error> {
        Self::with_config(bytes, DecoderConfig::default())
    }

    /// Parses the reply header with explicit limits.
    ///
    /// # Errors
    /// Returns [`Error`] for a malformed header.
    pub fn with_config(bytes: &'a [u8], config: DecoderConfig) -> Result<Self, Error> {
        Ok(Self {
            decoder: Decoder::with_config(bytes, config)?,
            types: TypeBuilder::new(),
        })
    }

    /// Decodes the next value as `T`.
    ///
    /// # Errors
    /// Returns [`Error`] if the wire type is not a subtype of `T`'s type or
    /// the bytes are malformed.
    pub fn read<T: IdlType>(&mut self) -> Result<T, Error> {
        let ty = T::idl_type(&mut self.types);
        let value = self.decoder.next_value(self.types.table(), &ty)?;
        Ok(T::from_value(value)?)
    }

    /// Checks that the reply holds no trailing bytes.
    ///
    /// # Errors
    /// Returns [`Error`] for trailing or malformed bytes.
    pub fn finish(self) -> Result<(), Error> {
        self.decoder.finish().map(|_| ())
    }
}
