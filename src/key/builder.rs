//! Key Builder Module
//!
//! Normalizes call-site arguments into the kwargs of a [`CacheKey`], so a
//! parameter supplied positionally in one call and by name in another always
//! produces the same key.
//!
//! Reflection over arbitrary signatures is not portable, so the declared
//! parameter names are supplied explicitly at binding time as a [`Signature`].

use std::collections::BTreeMap;

use crate::error::{CacheError, Result};
use crate::key::{CacheKey, KeyPart};

// == Signature ==
/// The declared parameter list of a wrapped callable.
///
/// Declared once at binding time; normalization aligns positional call
/// arguments against it. A receiver (the `self` of a method) is tracked as a
/// flag rather than a parameter name, so it never enters key material.
#[derive(Debug, Clone)]
pub struct Signature {
    params: Vec<String>,
    has_receiver: bool,
    variadic: bool,
}

impl Signature {
    // == Function Constructor ==
    /// Declares a free function signature with the given parameter names.
    pub fn function<S: Into<String>>(params: impl IntoIterator<Item = S>) -> Self {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            has_receiver: false,
            variadic: false,
        }
    }

    // == Method Constructor ==
    /// Declares a method signature: a leading receiver plus the given
    /// value parameter names. The receiver is implied, not listed.
    pub fn method<S: Into<String>>(params: impl IntoIterator<Item = S>) -> Self {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            has_receiver: true,
            variadic: false,
        }
    }

    // == Variadic Marker ==
    /// Marks the signature as taking variable-length positional parameters.
    ///
    /// Normalization requires a fixed, known arity, so builders reject
    /// variadic signatures with a `Signature` error.
    pub fn with_variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    // == Accessors ==
    /// Declared value parameter names, in order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Whether the callable takes a receiver.
    pub fn has_receiver(&self) -> bool {
        self.has_receiver
    }

    /// Whether the callable declares variadic positional parameters.
    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    // == Alignment ==
    /// Aligns a call's positional and keyword arguments against the declared
    /// parameters: positional args first, in declared order, then keyword
    /// args merged on top (keyword wins on duplicates).
    fn align(&self, call: &CallArgs) -> Result<BTreeMap<String, KeyPart>> {
        if self.variadic {
            return Err(CacheError::Signature(
                "variadic positional parameters cannot be normalized".to_string(),
            ));
        }
        if call.args.len() > self.params.len() {
            return Err(CacheError::Signature(format!(
                "{} positional args for {} declared parameters",
                call.args.len(),
                self.params.len()
            )));
        }

        let mut normalized = BTreeMap::new();
        for (name, value) in self.params.iter().zip(call.args.iter()) {
            normalized.insert(name.clone(), value.clone());
        }
        for (name, value) in &call.kwargs {
            normalized.insert(name.clone(), value.clone());
        }
        Ok(normalized)
    }
}

// == Call Args ==
/// The positional and keyword arguments of one invocation.
///
/// Built fresh at every call site; reserved invocation kwargs are popped out
/// of `kwargs` by the wrapper before the args reach the target or the key.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    /// Positional argument values, in call order
    pub args: Vec<KeyPart>,
    /// Keyword argument values by parameter name
    pub kwargs: BTreeMap<String, KeyPart>,
}

impl CallArgs {
    // == Constructor ==
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    // == Arg ==
    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<KeyPart>) -> Self {
        self.args.push(value.into());
        self
    }

    // == Kwarg ==
    /// Adds a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<KeyPart>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    // == Pop Flag ==
    /// Removes a reserved boolean kwarg and returns whether it was set.
    ///
    /// The entry is removed regardless of its value, so reserved names are
    /// never forwarded to the wrapped computation or the key.
    pub fn pop_flag(&mut self, name: &str) -> bool {
        self.kwargs
            .remove(name)
            .and_then(|p| p.as_bool())
            .unwrap_or(false)
    }
}

// == Attr Source ==
/// Read access to named attributes of a receiver instance.
///
/// The portable stand-in for attribute reflection: integrators expose the
/// attributes that participate in key material.
pub trait AttrSource {
    /// Returns the value of the named attribute, or None when absent.
    fn attr(&self, name: &str) -> Option<KeyPart>;
}

// == Key Builder Trait ==
/// Normalizes one invocation into the kwargs of a [`CacheKey`].
pub trait KeyBuilder: Send + Sync {
    /// Produces the normalized name-to-value mapping for a call.
    fn normalized(
        &self,
        signature: &Signature,
        call: &CallArgs,
        receiver: Option<&dyn AttrSource>,
    ) -> Result<BTreeMap<String, KeyPart>>;

    /// Builds a key with `key_type = key_prefix` and the normalized mapping
    /// as kwargs. Reserved kwargs (`timeout`, `key_version`) present in the
    /// call are popped into the key's own fields.
    fn build_key(
        &self,
        key_prefix: &str,
        signature: &Signature,
        call: &CallArgs,
        receiver: Option<&dyn AttrSource>,
    ) -> Result<CacheKey> {
        let kwargs = self.normalized(signature, call, receiver)?;
        Ok(CacheKey::from_args(key_prefix, Vec::new(), kwargs))
    }
}

// == Function Key Builder ==
/// Normalizes free function calls: every declared parameter is key material.
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionKeyBuilder;

impl KeyBuilder for FunctionKeyBuilder {
    fn normalized(
        &self,
        signature: &Signature,
        call: &CallArgs,
        _receiver: Option<&dyn AttrSource>,
    ) -> Result<BTreeMap<String, KeyPart>> {
        if signature.has_receiver() {
            return Err(CacheError::Signature(
                "signature declares a receiver, use MethodKeyBuilder".to_string(),
            ));
        }
        signature.align(call)
    }
}

// == Method Key Builder ==
/// Normalizes method calls: the receiver parameter is dropped from key
/// material, value parameters align as for functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodKeyBuilder;

impl KeyBuilder for MethodKeyBuilder {
    fn normalized(
        &self,
        signature: &Signature,
        call: &CallArgs,
        _receiver: Option<&dyn AttrSource>,
    ) -> Result<BTreeMap<String, KeyPart>> {
        if !signature.has_receiver() {
            return Err(CacheError::Signature(
                "signature does not declare a receiver, use FunctionKeyBuilder".to_string(),
            ));
        }
        signature.align(call)
    }
}

// == Attrs Method Key Builder ==
/// Method normalization plus a fixed set of receiver attributes, each read
/// off the bound receiver and inserted into the mapping, overwriting any
/// same-named parameter.
#[derive(Debug, Clone)]
pub struct AttrsMethodKeyBuilder {
    attrs: Vec<String>,
}

impl AttrsMethodKeyBuilder {
    // == Constructor ==
    /// Creates a builder that includes the named receiver attributes.
    pub fn new<S: Into<String>>(attrs: impl IntoIterator<Item = S>) -> Self {
        Self {
            attrs: attrs.into_iter().map(Into::into).collect(),
        }
    }
}

impl KeyBuilder for AttrsMethodKeyBuilder {
    fn normalized(
        &self,
        signature: &Signature,
        call: &CallArgs,
        receiver: Option<&dyn AttrSource>,
    ) -> Result<BTreeMap<String, KeyPart>> {
        let mut normalized = MethodKeyBuilder.normalized(signature, call, receiver)?;
        let source = receiver.ok_or_else(|| {
            CacheError::Configuration(
                "attribute key builder requires a bound receiver".to_string(),
            )
        })?;
        for name in &self.attrs {
            let value = source.attr(name).ok_or_else(|| {
                CacheError::Configuration(format!("receiver has no attribute '{}'", name))
            })?;
            normalized.insert(name.clone(), value);
        }
        Ok(normalized)
    }
}
