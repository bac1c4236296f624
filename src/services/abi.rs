//! ABI dispatch: function lookup, argument parsing and output decoding.
//!
//! Lookups are plain table lookups over the interface description. Overloaded
//! names are not distinguished; the first declared overload wins.

use alloy::{
    dyn_abi::{DynSolValue, FunctionExt, Specifier},
    hex,
    json_abi::{Function, JsonAbi, Param},
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, Result},
    types::FunctionSelector,
};

/// Resolves human-readable function names against a contract ABI.
pub struct AbiResolver;

impl AbiResolver {
    /// Every function name in the ABI.
    pub fn function_names(abi: &JsonAbi) -> Vec<String> {
        abi.functions.keys().cloned().collect()
    }

    /// The function called exactly `name`.
    pub fn resolve<'a>(abi: &'a JsonAbi, name: &str) -> Result<&'a Function> {
        Self::lookup(abi, name).ok_or_else(|| AppError::FunctionNotFound {
            requested: vec![name.to_string()],
            available: Self::function_names(abi),
        })
    }

    /// The first of `candidates`, in the given order, that the ABI exposes.
    pub fn resolve_any<'a>(abi: &'a JsonAbi, candidates: &[&str]) -> Result<&'a Function> {
        candidates.iter().find_map(|name| Self::lookup(abi, name)).ok_or_else(|| {
            AppError::FunctionNotFound {
                requested: candidates.iter().map(|c| c.to_string()).collect(),
                available: Self::function_names(abi),
            }
        })
    }

    /// Resolve according to `selector`.
    pub fn select<'a>(abi: &'a JsonAbi, selector: FunctionSelector<'_>) -> Result<&'a Function> {
        match selector {
            FunctionSelector::Exact(name) => Self::resolve(abi, name),
            FunctionSelector::FirstOf(candidates) => Self::resolve_any(abi, candidates),
        }
    }

    fn lookup<'a>(abi: &'a JsonAbi, name: &str) -> Option<&'a Function> {
        abi.function(name).and_then(|overloads| overloads.first())
    }

    /// Coerce string arguments into values of the declared input types.
    pub fn parse_args(inputs: &[Param], raw: &[String]) -> Result<Vec<DynSolValue>> {
        check_arity("arguments", inputs.len(), raw.len())?;

        inputs
            .iter()
            .zip(raw)
            .enumerate()
            .map(|(index, (param, value))| {
                let ty = param.resolve().map_err(|e| {
                    AppError::Abi(format!("unsupported type {} for input {}: {}", param.ty, index, e))
                })?;
                ty.coerce_str(value).map_err(|e| {
                    AppError::Validation(format!(
                        "argument {} ({}) is not a valid {}: {}",
                        index,
                        display_name(param, index),
                        param.ty,
                        e
                    ))
                })
            })
            .collect()
    }

    /// Decode the return data of `function`.
    pub fn decode_output(function: &Function, data: &[u8]) -> Result<Vec<DynSolValue>> {
        function.abi_decode_output(data).map_err(|e| {
            AppError::Abi(format!("cannot decode output of {}: {}", function.name, e))
        })
    }
}

/// Fail unless `got` equals `expected`.
pub(crate) fn check_arity(what: &str, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(AppError::Validation(format!(
            "{} count mismatch: expected {}, got {}",
            what, expected, got
        )));
    }
    Ok(())
}

fn display_name(param: &Param, index: usize) -> String {
    if param.name.is_empty() {
        format!("#{}", index)
    } else {
        param.name.clone()
    }
}

/// Render a decoded value as JSON. Integers become decimal strings so large
/// values survive intact.
pub fn value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => json!(b),
        DynSolValue::Int(i, _) => json!(i.to_string()),
        DynSolValue::Uint(u, _) => json!(u.to_string()),
        DynSolValue::Address(a) => json!(a.to_checksum(None)),
        DynSolValue::FixedBytes(word, size) => json!(hex::encode_prefixed(&word[..*size])),
        DynSolValue::Bytes(bytes) => json!(hex::encode_prefixed(bytes)),
        DynSolValue::String(s) => json!(s),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(value_to_json).collect())
        }
        other => json!(format!("{:?}", other)),
    }
}
