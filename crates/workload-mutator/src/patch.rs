use json_patch::{Patch, PatchOperation};

use crate::{admission_response::PatchType, errors::EncodeError};

/// A serialized JSONPatch document, tagged with the patch type the API server
/// expects to find next to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedPatch {
    document: Vec<u8>,
    patch_type: PatchType,
}

impl EncodedPatch {
    pub fn document(&self) -> &[u8] {
        &self.document
    }

    pub fn patch_type(&self) -> PatchType {
        self.patch_type
    }
}

/// Serialize the operations into a single JSONPatch array, keeping their order.
///
/// An empty list of operations yields `None`: the response must then omit
/// both the patch and its type instead of carrying an empty array.
pub fn encode(operations: Vec<PatchOperation>) -> Result<Option<EncodedPatch>, EncodeError> {
    if operations.is_empty() {
        return Ok(None);
    }

    let document = serde_json::to_vec(&Patch(operations)).map_err(EncodeError::Document)?;

    Ok(Some(EncodedPatch {
        document,
        patch_type: PatchType::JSONPatch,
    }))
}

/// Convert a typed value into the JSON carried by a patch operation.
pub(crate) fn patch_value<T: serde::Serialize>(
    path: &jsonptr::Pointer,
    value: &T,
) -> Result<serde_json::Value, EncodeError> {
    serde_json::to_value(value).map_err(|source| EncodeError::Value {
        path: path.to_string(),
        source,
    })
}
