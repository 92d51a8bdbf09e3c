//! Structure templates and their placement policies
//! A template owns a block/tile-entity/entity payload plus the transformers
//! and generation infos describing how and where it may be placed.

pub mod format;
pub mod gen_info;
pub mod payload;
pub mod transformer;

use serde::{Deserialize, Serialize};

use crate::core::{BlockPos, BlockState, BlockType};
use crate::matcher::{BlockMatcher, ExpressionCache, ExpressionError};

pub use format::{read_template, write_template, TemplateError};
pub use gen_info::{
    Facing, GenerationInfo, MazeGenerationInfo, NaturalGenerationInfo, StaticGenerationInfo,
    StructureListGenerationInfo, VanillaGenerationInfo,
};
pub use payload::{BlockCollection, TemplatePayload};
pub use transformer::{Phase, Transformer, WeightedBlockState};

/// Authorship and bookkeeping attached to a template file.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub comment: String,
}

/// How the block payload was stored in the template file. Preserved so a
/// re-serialized template keeps its storage mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PayloadStorage {
    /// Embedded as a JSON tag tree.
    #[default]
    Inline,
    /// Embedded as a base64 blob.
    Base64,
    /// Stored out-of-band, e.g. packaged alongside in an archive.
    External,
}

/// A reusable, serializable voxel layout plus placement metadata.
#[derive(Clone, PartialEq, Debug)]
pub struct StructureTemplate {
    pub id: String,
    pub transformers: Vec<Transformer>,
    pub generation_infos: Vec<GenerationInfo>,
    pub dependencies: Vec<String>,
    pub rotatable: bool,
    pub mirrorable: bool,
    pub metadata: Metadata,
    pub custom_data: serde_json::Value,
    pub payload: TemplatePayload,
    pub payload_storage: PayloadStorage,
}

impl StructureTemplate {
    pub fn new(id: impl Into<String>, payload: TemplatePayload) -> Self {
        Self {
            id: id.into(),
            transformers: Vec::new(),
            generation_infos: Vec::new(),
            dependencies: Vec::new(),
            rotatable: false,
            mirrorable: false,
            metadata: Metadata::default(),
            custom_data: serde_json::Value::Object(Default::default()),
            payload,
            payload_storage: PayloadStorage::Inline,
        }
    }

    /// The stock transformer and generation set new templates start with:
    /// marker blocks resolve to air/terrain and the template generates
    /// naturally anywhere.
    pub fn default_template(id: impl Into<String>, payload: TemplatePayload) -> Self {
        let mut template = Self::new(id, payload);
        template.transformers = vec![
            Transformer::NaturalAir {
                matcher: BlockMatcher::of(BlockType::NegativeSpace, 1),
            },
            Transformer::NegativeSpace {
                matcher: BlockMatcher::of(BlockType::NegativeSpace, 0),
            },
            Transformer::Natural {
                matcher: BlockMatcher::of(BlockType::NaturalFloor, 0),
            },
            Transformer::Replace {
                matcher: BlockMatcher::of(BlockType::NaturalFloor, 1),
                replace_with: vec![WeightedBlockState {
                    weight: 1.0,
                    state: BlockState::of(BlockType::Air),
                }],
            },
        ];
        template.generation_infos = vec![GenerationInfo::Natural(NaturalGenerationInfo::default())];
        template
    }

    /// Size of the stored block layout; zero if the payload is absent.
    pub fn bounding_box_size(&self) -> BlockPos {
        self.payload.blocks.size()
    }

    pub fn is_rotatable(&self) -> bool {
        self.rotatable
    }

    pub fn is_mirrorable(&self) -> bool {
        self.mirrorable
    }

    /// Generation is skipped, not failed, when a declared dependency is
    /// missing from the host.
    pub fn dependencies_resolved(&self, features: &dyn crate::engine::FeatureIndex) -> bool {
        self.dependencies
            .iter()
            .all(|id| features.is_feature_loaded(id))
    }

    /// Fails fast on any malformed matcher expression in this template,
    /// naming the offending expression. Called during load.
    pub fn validate_expressions(&self, cache: &ExpressionCache) -> Result<(), ExpressionError> {
        for transformer in &self.transformers {
            transformer.validate(cache)?;
        }
        for info in &self.generation_infos {
            info.validate(cache)?;
        }
        Ok(())
    }

    pub fn generation_infos_natural(&self) -> impl Iterator<Item = &NaturalGenerationInfo> {
        self.generation_infos.iter().filter_map(|info| match info {
            GenerationInfo::Natural(natural) => Some(natural),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_template_marker_handling() {
        let template = StructureTemplate::default_template("test", TemplatePayload::empty());
        assert_eq!(template.transformers.len(), 4);
        assert_eq!(template.generation_infos.len(), 1);
        assert!(template
            .validate_expressions(&ExpressionCache::new())
            .is_ok());
    }

    #[test]
    fn test_dependencies_gate_generation() {
        let mut template = StructureTemplate::new("test", TemplatePayload::empty());
        template.dependencies = vec!["decocraft".to_string()];

        let none: HashSet<String> = HashSet::new();
        assert!(!template.dependencies_resolved(&none));

        let loaded: HashSet<String> = ["decocraft".to_string()].into_iter().collect();
        assert!(template.dependencies_resolved(&loaded));
    }

    #[test]
    fn test_validate_names_bad_expression() {
        let mut template = StructureTemplate::new("test", TemplatePayload::empty());
        template.transformers.push(Transformer::NegativeSpace {
            matcher: BlockMatcher::new("stone & ("),
        });
        let err = template
            .validate_expressions(&ExpressionCache::new())
            .unwrap_err();
        assert!(err.to_string().contains("stone & ("));
    }
}
