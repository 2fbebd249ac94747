// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # USDA-Lite Core
//!
//! Tolerant USDA text parsing built with [nom](https://docs.rs/nom), plus the
//! literal codec and text writer used by the inspector.
//!
//! ## Overview
//!
//! - **Literal Codec**: Parse and format booleans, numbers, vectors, quaternions,
//!   4x4 matrices, strings, tokens, asset paths and relationship targets
//! - **Document Parser**: Brace-balanced reconstruction of the prim forest,
//!   including layer header, prim metadata and variant set bodies
//! - **Writer**: Render a parsed layer back to text that re-parses to the same tree
//! - **Naming**: Sanitized prim names for synthesized prims
//!
//! ## Quick Start
//!
//! ```rust
//! use usda_lite_core::{parse_document, parse_vec3};
//!
//! let roots = parse_document(r#"def Xform "Root" { def Sphere "Ball" {} }"#);
//! assert_eq!(roots[0].children[0].path, "/Root/Ball");
//! assert_eq!(parse_vec3("(1, 2, 3)"), Some([1.0, 2.0, 3.0]));
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for the scene model

pub mod error;
pub mod literal;
pub mod metadata;
pub mod naming;
pub mod parser;
pub mod scene;
pub mod writer;

pub use error::{Error, Result};
pub use literal::{
    format_asset, format_asset_reference, format_bool, format_float, format_int, format_matrix4,
    format_relationship, format_relationship_array, format_string, format_string_array,
    format_uint, format_vec3, format_vec4, parse_asset, parse_asset_reference, parse_bool,
    parse_matrix4, parse_number, parse_quat, parse_relationship_target,
    parse_relationship_targets, parse_scalar_array, parse_string, parse_string_array,
    parse_token, parse_vec3, parse_vec4, Components, MatrixRows,
};
pub use metadata::{parse_metadata_block, LayerMetadata, MetadataEntry};
pub use naming::{
    prim_name_for_file, sanitize_prim_name, unique_name, validate_prim_name, ResourceKind,
};
pub use parser::{parse_attribute, parse_document, parse_layer, ParsedLayer};
pub use scene::{
    find_attribute, find_node, find_node_mut, index_paths, is_descendant_path,
    is_valid_prim_name, join_path, last_component, parent_path, validate_prim_path,
    walk_nodes, AuthoredAttribute, PrimMetadata, ReferenceSpec, SceneNode, Specifier,
    VariantOption, VariantSetSpec, Walk,
};
pub use writer::{write_layer, write_prim};
