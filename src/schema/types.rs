// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! The schema tree: primitive/group nodes, flattened leaf descriptors, and the
//! structural LIST/MAP recognition the nested reconstruction engine relies on.

use std::fmt;
use std::rc::Rc;

use crate::basic::{LogicalType, Repetition, Type};
use crate::errors::{ParquetError, Result};

/// A node in the schema tree: either a primitive (leaf) column, or a group of
/// child fields. Two- and three-level LIST/MAP encodings are ordinary group
/// nodes with a `LIST`/`MAP` logical type annotation; they are recognized
/// structurally by [`ParquetType::is_list`]/[`is_map`] rather than being a
/// distinct variant, since the on-disk shape has no dedicated node kind for them.
#[derive(Debug, Clone)]
pub enum ParquetType {
  Primitive {
    basic_info: BasicTypeInfo,
    physical_type: Type,
    type_length: i32,
  },
  Group {
    basic_info: BasicTypeInfo,
    fields: Vec<Rc<ParquetType>>,
  },
}

/// Fields shared by every schema node.
#[derive(Debug, Clone)]
pub struct BasicTypeInfo {
  name: String,
  repetition: Repetition,
  logical_type: LogicalType,
  id: Option<i32>,
}

impl BasicTypeInfo {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn repetition(&self) -> Repetition {
    self.repetition
  }

  pub fn logical_type(&self) -> LogicalType {
    self.logical_type
  }

  pub fn id(&self) -> Option<i32> {
    self.id
  }
}

impl ParquetType {
  pub fn new_primitive(
    name: &str,
    repetition: Repetition,
    physical_type: Type,
    logical_type: LogicalType,
    type_length: i32,
  ) -> Self {
    ParquetType::Primitive {
      basic_info: BasicTypeInfo { name: name.to_owned(), repetition, logical_type, id: None },
      physical_type,
      type_length,
    }
  }

  pub fn new_group(
    name: &str,
    repetition: Repetition,
    logical_type: LogicalType,
    fields: Vec<Rc<ParquetType>>,
  ) -> Self {
    ParquetType::Group {
      basic_info: BasicTypeInfo { name: name.to_owned(), repetition, logical_type, id: None },
      fields,
    }
  }

  pub fn basic_info(&self) -> &BasicTypeInfo {
    match self {
      ParquetType::Primitive { basic_info, .. } => basic_info,
      ParquetType::Group { basic_info, .. } => basic_info,
    }
  }

  pub fn name(&self) -> &str {
    self.basic_info().name()
  }

  pub fn repetition(&self) -> Repetition {
    self.basic_info().repetition()
  }

  pub fn is_primitive(&self) -> bool {
    matches!(self, ParquetType::Primitive { .. })
  }

  pub fn is_group(&self) -> bool {
    matches!(self, ParquetType::Group { .. })
  }

  pub fn get_fields(&self) -> &[Rc<ParquetType>] {
    match self {
      ParquetType::Group { fields, .. } => fields,
      ParquetType::Primitive { .. } => &[],
    }
  }

  /// A group is a LIST per the three-level convention if it is annotated
  /// `LIST` and has exactly one repeated child group, which in turn has
  /// exactly one child (the element). Accepts the common name variants
  /// (`list`/`array`, `element`/`array`/`{name}_tuple`) rather than requiring
  /// the canonical spelling, matching how real-world writers vary.
  pub fn is_list(&self) -> bool {
    match self {
      ParquetType::Group { basic_info, fields } => {
        basic_info.logical_type.is_list()
          && fields.len() == 1
          && fields[0].repetition() == Repetition::REPEATED
      },
      ParquetType::Primitive { .. } => false,
    }
  }

  /// The repeated middle group of a LIST, i.e. `fields()[0]` when [`is_list`] holds.
  pub fn list_repeated_group(&self) -> Option<&Rc<ParquetType>> {
    if self.is_list() {
      self.get_fields().first()
    } else {
      None
    }
  }

  /// A group is a MAP per the three-level convention if it is annotated
  /// `MAP`/`MAP_KEY_VALUE` and has exactly one repeated child group with
  /// exactly two fields (key, value).
  pub fn is_map(&self) -> bool {
    match self {
      ParquetType::Group { basic_info, fields } => {
        basic_info.logical_type.is_map()
          && fields.len() == 1
          && fields[0].repetition() == Repetition::REPEATED
          && fields[0].get_fields().len() == 2
      },
      ParquetType::Primitive { .. } => false,
    }
  }

  pub fn map_key_value_group(&self) -> Option<&Rc<ParquetType>> {
    if self.is_map() {
      self.get_fields().first()
    } else {
      None
    }
  }
}

impl fmt::Display for ParquetType {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// A leaf-level primitive column, flattened out of the schema tree, carrying
/// the maximum definition/repetition levels any value at this path can take.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
  primitive_type: Rc<ParquetType>,
  max_def_level: i16,
  max_rep_level: i16,
  /// `repeated_ancestor_def_levels[k-1]` is the definition level at which the
  /// k-th repeated ancestor (counted from the root, 1-indexed) is non-empty.
  /// Indexed by list nesting depth when reconstructing multi-level lists.
  repeated_ancestor_def_levels: Vec<i16>,
  path: ColumnPath,
}

impl ColumnDescriptor {
  pub fn new(
    primitive_type: Rc<ParquetType>,
    max_def_level: i16,
    max_rep_level: i16,
    repeated_ancestor_def_levels: Vec<i16>,
    path: ColumnPath,
  ) -> Self {
    ColumnDescriptor { primitive_type, max_def_level, max_rep_level, repeated_ancestor_def_levels, path }
  }

  pub fn max_def_level(&self) -> i16 {
    self.max_def_level
  }

  pub fn max_rep_level(&self) -> i16 {
    self.max_rep_level
  }

  /// `repeated_ancestor_def_level` for the innermost repeated ancestor, used
  /// by the primary leaf decoder.
  pub fn repeated_ancestor_def_level(&self) -> i16 {
    self.repeated_ancestor_def_levels.last().copied().unwrap_or(0)
  }

  /// The full per-depth array; `[k - 1]` for list nesting depth `k`.
  pub fn repeated_ancestor_def_levels(&self) -> &[i16] {
    &self.repeated_ancestor_def_levels
  }

  pub fn path(&self) -> &ColumnPath {
    &self.path
  }

  pub fn self_type(&self) -> &ParquetType {
    &self.primitive_type
  }

  pub fn name(&self) -> &str {
    self.primitive_type.name()
  }

  pub fn physical_type(&self) -> Type {
    match self.primitive_type.as_ref() {
      ParquetType::Primitive { physical_type, .. } => *physical_type,
      ParquetType::Group { .. } => unreachable!("column descriptor leaf must be primitive"),
    }
  }

  /// Declared length in bytes for `FIXED_LEN_BYTE_ARRAY` leaves, `-1` otherwise.
  pub fn type_length(&self) -> i32 {
    match self.primitive_type.as_ref() {
      ParquetType::Primitive { type_length, .. } => *type_length,
      ParquetType::Group { .. } => unreachable!("column descriptor leaf must be primitive"),
    }
  }
}

/// Dot-joined path of field names from the message root to a leaf column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ColumnPath {
  parts: Vec<String>,
}

impl ColumnPath {
  pub fn new(parts: Vec<String>) -> Self {
    ColumnPath { parts }
  }

  pub fn parts(&self) -> &[String] {
    &self.parts
  }
}

impl fmt::Display for ColumnPath {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.parts.join("."))
  }
}

/// Owns the schema's root message type plus the flattened, DFS-ordered leaf
/// column descriptors used to address individual column chunks.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
  root: Rc<ParquetType>,
  leaves: Vec<ColumnDescriptor>,
}

impl SchemaDescriptor {
  pub fn new(root: Rc<ParquetType>) -> Self {
    let mut leaves = Vec::new();
    let mut path = Vec::new();
    let mut repeated_ancestor_def_levels = Vec::new();
    build_leaves(&root, 0, 0, &mut path, &mut repeated_ancestor_def_levels, &mut leaves);
    SchemaDescriptor { root, leaves }
  }

  pub fn root_schema(&self) -> &ParquetType {
    &self.root
  }

  pub fn num_columns(&self) -> usize {
    self.leaves.len()
  }

  pub fn column(&self, i: usize) -> &ColumnDescriptor {
    &self.leaves[i]
  }

  pub fn columns(&self) -> &[ColumnDescriptor] {
    &self.leaves
  }

  /// Looks up a leaf column by its dot-joined path, e.g. `"a.b.c"`.
  pub fn column_by_path(&self, path: &str) -> Option<&ColumnDescriptor> {
    self.leaves.iter().find(|c| c.path().to_string() == path)
  }
}

fn build_leaves(
  node: &Rc<ParquetType>,
  parent_max_def: i16,
  parent_max_rep: i16,
  path: &mut Vec<String>,
  repeated_ancestor_def_levels: &mut Vec<i16>,
  leaves: &mut Vec<ColumnDescriptor>,
) {
  path.push(node.name().to_owned());
  let (max_def, max_rep) = match node.repetition() {
    Repetition::OPTIONAL => (parent_max_def + 1, parent_max_rep),
    Repetition::REPEATED => (parent_max_def + 1, parent_max_rep + 1),
    Repetition::REQUIRED => (parent_max_def, parent_max_rep),
  };

  let pushed = node.repetition() == Repetition::REPEATED;
  if pushed {
    repeated_ancestor_def_levels.push(max_def);
  }

  match node.as_ref() {
    ParquetType::Primitive { .. } => {
      leaves.push(ColumnDescriptor::new(
        node.clone(),
        max_def,
        max_rep,
        repeated_ancestor_def_levels.clone(),
        ColumnPath::new(path.clone()),
      ));
    },
    ParquetType::Group { fields, .. } => {
      for child in fields {
        build_leaves(child, max_def, max_rep, path, repeated_ancestor_def_levels, leaves);
      }
    },
  }

  if pushed {
    repeated_ancestor_def_levels.pop();
  }
  path.pop();
}

/// One entry of the depth-first pre-order sequence a Thrift-compact-binary
/// metadata parser (external to this crate, see `SPEC_FULL.md` §6) hands to
/// [`build_schema_tree`]: a leaf carries `physical_type`, a group carries
/// `num_children`.
#[derive(Debug, Clone)]
pub struct SchemaElement {
  pub name: String,
  pub repetition: Option<Repetition>,
  pub physical_type: Option<Type>,
  pub type_length: Option<i32>,
  pub num_children: Option<i32>,
  pub logical_type: Option<LogicalType>,
}

impl SchemaElement {
  pub fn root_message(name: &str, num_children: i32) -> Self {
    SchemaElement {
      name: name.to_owned(),
      repetition: None,
      physical_type: None,
      type_length: None,
      num_children: Some(num_children),
      logical_type: None,
    }
  }
}

/// Rebuilds the schema tree from a flat depth-first pre-order `SchemaElement`
/// sequence. The root element's repetition is ignored (message roots may
/// carry any name and an implicit top-level repetition, per §9 "Schema root
/// name").
pub fn build_schema_tree(elements: &[SchemaElement]) -> Result<Rc<ParquetType>> {
  if elements.is_empty() {
    return Err(ParquetError::Schema("schema element list is empty".to_owned()));
  }
  let mut pos = 0usize;
  let root = build_node(elements, &mut pos, true)?;
  if pos != elements.len() {
    return Err(ParquetError::Schema(format!(
      "schema element list has {} trailing elements past the declared tree",
      elements.len() - pos
    )));
  }
  let root = Rc::new(root);
  validate_schema(&root)?;
  Ok(root)
}

fn build_node(elements: &[SchemaElement], pos: &mut usize, is_root: bool) -> Result<ParquetType> {
  if *pos >= elements.len() {
    return Err(ParquetError::Schema("schema element list ended unexpectedly".to_owned()));
  }
  let elem = &elements[*pos];
  *pos += 1;

  let repetition = if is_root { Repetition::REQUIRED } else {
    elem.repetition.ok_or_else(|| {
      ParquetError::Schema(format!("field '{}' is missing a repetition", elem.name))
    })?
  };
  let logical_type = elem.logical_type.unwrap_or(LogicalType::NONE);

  match elem.num_children {
    None => {
      let physical_type = elem.physical_type.ok_or_else(|| {
        ParquetError::Schema(format!("leaf field '{}' is missing a physical_type", elem.name))
      })?;
      Ok(ParquetType::new_primitive(
        &elem.name,
        repetition,
        physical_type,
        logical_type,
        elem.type_length.unwrap_or(-1),
      ))
    },
    Some(n) => {
      if n < 0 {
        return Err(ParquetError::Schema(format!("field '{}' has a negative child count", elem.name)));
      }
      let mut fields = Vec::with_capacity(n as usize);
      for _ in 0..n {
        fields.push(Rc::new(build_node(elements, pos, false)?));
      }
      Ok(ParquetType::new_group(&elem.name, repetition, logical_type, fields))
    },
  }
}

/// Validates a freshly-assembled schema tree's invariants: the root must be a
/// group, REPEATED nodes may not appear directly under the root message
/// (files always wrap them in an intermediate group), and LIST/MAP-annotated
/// groups must have the three-level shape `is_list`/`is_map` check for.
pub fn validate_schema(root: &ParquetType) -> Result<()> {
  if !root.is_group() {
    return Err(ParquetError::Schema("root schema node must be a group".to_owned()));
  }
  for child in root.get_fields() {
    if child.repetition() == Repetition::REPEATED {
      return Err(ParquetError::Schema(format!(
        "field '{}' is REPEATED directly under the message root",
        child.name()
      )));
    }
    validate_node(child)?;
  }
  Ok(())
}

fn validate_node(node: &ParquetType) -> Result<()> {
  if let ParquetType::Group { basic_info, fields } = node {
    if basic_info.logical_type.is_list() && !node.is_list() {
      return Err(ParquetError::Schema(format!(
        "field '{}' is annotated LIST but does not have the expected 3-level shape",
        node.name()
      )));
    }
    if basic_info.logical_type.is_map() && !node.is_map() {
      return Err(ParquetError::Schema(format!(
        "field '{}' is annotated MAP but does not have the expected 3-level shape",
        node.name()
      )));
    }
    for child in fields {
      validate_node(child)?;
    }
  }
  Ok(())
}
