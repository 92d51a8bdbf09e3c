//! Template file format with versioned migration
//! Documents are JSON with an explicit `version` field. Old versions are
//! upgraded in-place on the JSON value, one version per step, before the
//! final deserialize; writers always emit the latest version.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::constants::LATEST_TEMPLATE_VERSION;
use crate::matcher::{ExpressionCache, ExpressionError};
use crate::template::gen_info::GenerationInfo;
use crate::template::payload::TemplatePayload;
use crate::template::transformer::Transformer;
use crate::template::{Metadata, PayloadStorage, StructureTemplate};

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template '{id}' is malformed: {message}")]
    Malformed { id: String, message: String },

    #[error("template '{id}' has version {version}, newer than supported version {LATEST_TEMPLATE_VERSION}")]
    UnsupportedVersion { id: String, version: u64 },

    #[error("template '{id}' has a bad expression: {source}")]
    Expression {
        id: String,
        #[source]
        source: ExpressionError,
    },

    #[error("template '{id}' could not be encoded: {message}")]
    Encode { id: String, message: String },
}

/// On-disk shape of a version-3 template document. The template id is not
/// part of the document; it is the registry name the file was loaded under.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateDocument {
    version: u64,
    #[serde(default)]
    generation_infos: Vec<GenerationInfo>,
    #[serde(default)]
    transformers: Vec<Transformer>,
    #[serde(default)]
    rotatable: bool,
    #[serde(default)]
    mirrorable: bool,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    custom_data: Value,
    /// Inline payload, parsed leniently so a corrupt payload does not take
    /// the rest of the template down with it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload_base64: Option<String>,
}

/// Parses `json` as a template document, upgrading old versions on the fly.
///
/// Errors are reserved for documents that cannot be understood at all;
/// recoverable damage (a corrupt payload) is logged and patched with an
/// empty substitute.
pub fn read_template(
    id: &str,
    json: &str,
    cache: &ExpressionCache,
) -> Result<StructureTemplate, TemplateError> {
    let mut value: Value = serde_json::from_str(json).map_err(|e| TemplateError::Malformed {
        id: id.to_string(),
        message: e.to_string(),
    })?;

    let object = value.as_object_mut().ok_or_else(|| TemplateError::Malformed {
        id: id.to_string(),
        message: "expected a JSON object".to_string(),
    })?;

    let mut version = match object.get("version").and_then(Value::as_u64) {
        Some(version) => version,
        None => {
            warn!(template = %id, "template declares no version, assuming latest");
            LATEST_TEMPLATE_VERSION
        }
    };
    if version > LATEST_TEMPLATE_VERSION {
        return Err(TemplateError::UnsupportedVersion {
            id: id.to_string(),
            version,
        });
    }

    while version < LATEST_TEMPLATE_VERSION {
        match version {
            1 => upgrade_v1_to_v2(object),
            2 => upgrade_v2_to_v3(object),
            _ => {}
        }
        version += 1;
    }
    object.insert("version".to_string(), json!(version));

    let document: TemplateDocument =
        serde_json::from_value(value).map_err(|e| TemplateError::Malformed {
            id: id.to_string(),
            message: e.to_string(),
        })?;

    let (payload, payload_storage) = match (document.payload, document.payload_base64) {
        (Some(inline), _) => match serde_json::from_value::<TemplatePayload>(inline) {
            Ok(payload) => (payload, PayloadStorage::Inline),
            Err(e) => {
                error!(
                    template = %id,
                    error = %e,
                    "corrupt inline payload, substituting an empty one"
                );
                (TemplatePayload::empty(), PayloadStorage::Inline)
            }
        },
        (None, Some(encoded)) => match decode_payload(&encoded) {
            Ok(payload) => (payload, PayloadStorage::Base64),
            Err(message) => {
                error!(
                    template = %id,
                    error = %message,
                    "corrupt base64 payload, substituting an empty one"
                );
                (TemplatePayload::empty(), PayloadStorage::Base64)
            }
        },
        (None, None) => (TemplatePayload::empty(), PayloadStorage::External),
    };

    let template = StructureTemplate {
        id: id.to_string(),
        transformers: document.transformers,
        generation_infos: document.generation_infos,
        dependencies: document.dependencies,
        rotatable: document.rotatable,
        mirrorable: document.mirrorable,
        metadata: document.metadata,
        custom_data: document.custom_data,
        payload,
        payload_storage,
    };

    template
        .validate_expressions(cache)
        .map_err(|source| TemplateError::Expression {
            id: id.to_string(),
            source,
        })?;

    Ok(template)
}

/// Serializes a template as a latest-version document, honoring its payload
/// storage mode.
pub fn write_template(template: &StructureTemplate) -> Result<String, TemplateError> {
    let encode_err = |message: String| TemplateError::Encode {
        id: template.id.clone(),
        message,
    };

    let (payload, payload_base64) = match template.payload_storage {
        PayloadStorage::Inline => {
            let value =
                serde_json::to_value(&template.payload).map_err(|e| encode_err(e.to_string()))?;
            (Some(value), None)
        }
        PayloadStorage::Base64 => {
            let bytes =
                bincode::serialize(&template.payload).map_err(|e| encode_err(e.to_string()))?;
            (None, Some(BASE64.encode(bytes)))
        }
        PayloadStorage::External => (None, None),
    };

    let document = TemplateDocument {
        version: LATEST_TEMPLATE_VERSION,
        generation_infos: template.generation_infos.clone(),
        transformers: template.transformers.clone(),
        rotatable: template.rotatable,
        mirrorable: template.mirrorable,
        dependencies: template.dependencies.clone(),
        metadata: template.metadata.clone(),
        custom_data: template.custom_data.clone(),
        payload,
        payload_base64,
    };

    serde_json::to_string_pretty(&document).map_err(|e| encode_err(e.to_string()))
}

fn decode_payload(encoded: &str) -> Result<TemplatePayload, String> {
    let bytes = BASE64.decode(encoded).map_err(|e| e.to_string())?;
    bincode::deserialize(&bytes).map_err(|e| e.to_string())
}

/// Version 1 carried a single implicit natural-generation policy as loose
/// top-level fields; fold them into the version-2 `naturalGenerationInfo`
/// object.
fn upgrade_v1_to_v2(object: &mut Map<String, Value>) {
    let category = object
        .remove("generationCategory")
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "decoration".to_string());
    let weight = object
        .remove("generationWeight")
        .and_then(|v| v.as_f64())
        .unwrap_or(1.0);
    let biomes = object
        .remove("generationBiomes")
        .and_then(|v| {
            v.as_array().map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
        })
        .unwrap_or_default();

    object.insert(
        "naturalGenerationInfo".to_string(),
        json!({
            "generationCategory": category,
            "generationWeight": weight,
            "biomes": biomes,
        }),
    );
}

/// Version 2 kept the natural and maze policies as dedicated fields and
/// block transformers in their own list; version 3 unifies both into the
/// tagged `generationInfos` and `transformers` lists.
fn upgrade_v2_to_v3(object: &mut Map<String, Value>) {
    let mut infos = object
        .remove("generationInfos")
        .and_then(|v| v.as_array().cloned())
        .unwrap_or_default();

    if let Some(Value::Object(mut info)) = object.remove("naturalGenerationInfo") {
        info.insert("type".to_string(), json!("natural"));
        infos.push(Value::Object(info));
    }
    if let Some(Value::Object(mut info)) = object.remove("mazeGenerationInfo") {
        info.insert("type".to_string(), json!("mazeComponent"));
        infos.push(Value::Object(info));
    }
    object.insert("generationInfos".to_string(), Value::Array(infos));

    if let Some(Value::Array(legacy)) = object.remove("blockTransformers") {
        let transformers = object
            .entry("transformers")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(transformers) = transformers {
            transformers.extend(legacy);
        }
    }
}
