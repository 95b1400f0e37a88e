use crate::parsers::{usda, UsdaParseError};
use crate::path::{self, PrimPath};
use crate::value::{Value, ValueType};
use crate::writer;
use linked_hash_map::LinkedHashMap;
use log::debug;
use std::{
    fs, io,
    path::{Path, PathBuf},
    result::Result as StdResult,
};

/// A stage is the top-level container of a prim hierarchy, bound to a backing file.
///
/// Stages are either created empty with `Stage::create_new` or loaded from disk with
/// `Stage::open`. Everything lives in memory until `Stage::save` writes the text form to
/// the backing file, overwriting whatever was there.
pub struct Stage {
    file_path: PathBuf,
    pub(crate) default_prim: Option<String>,
    pub(crate) doc: Option<String>,
    /// The pseudo-root at `/`. It holds the root prims but is not a prim of the stage:
    /// it is never serialized and never shows up during traversal.
    pub(crate) root: Prim,
}

/// A node of the hierarchy: a named, typed object holding properties, references and
/// child prims. Prims are created through `Stage::define` and identified by their
/// `PrimPath`.
pub struct Prim {
    pub(crate) path: PrimPath,
    pub(crate) type_name: String,
    pub(crate) references: Vec<Reference>,
    // Both maps are LinkedHashMaps because authoring order decides the order things are
    // written in, and the output must not change between runs.
    pub(crate) properties: LinkedHashMap<String, Property>,
    pub(crate) children: LinkedHashMap<String, Prim>,
}

/// A prim property is either a typed attribute or a relationship.
pub enum Property {
    Attribute(Attribute),
    Relationship(Relationship),
}

impl Property {
    pub fn name(&self) -> &str {
        match self {
            Property::Attribute(attribute) => attribute.name(),
            Property::Relationship(relationship) => relationship.name(),
        }
    }
}

/// A typed data slot on a prim. Attributes are declared with a `ValueType` and may or
/// may not carry an authored value.
pub struct Attribute {
    pub(crate) name: String,
    pub(crate) value_type: ValueType,
    pub(crate) value: Option<Value>,
    pub(crate) custom: bool,
}

impl Attribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Whether the attribute was declared outside of any schema, which is true for every
    /// attribute this crate creates.
    pub fn is_custom(&self) -> bool {
        self.custom
    }

    /// Authors a value on this attribute.
    /// # Panics
    /// Panics if the value's type doesn't match the attribute's declared type.
    pub fn set(&mut self, value: Value) {
        if value.value_type() != self.value_type {
            panic!(
                "attribute '{}' is declared {} but the value is {}",
                self.name,
                self.value_type,
                value.value_type()
            );
        }

        self.value = Some(value);
    }
}

/// A named, ordered list of paths pointing at other prims.
pub struct Relationship {
    pub(crate) name: String,
    pub(crate) targets: Vec<PrimPath>,
    pub(crate) custom: bool,
}

impl Relationship {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn targets(&self) -> &[PrimPath] {
        &self.targets
    }

    pub fn is_custom(&self) -> bool {
        self.custom
    }

    /// Replaces the relationship's target list. Targets are recorded verbatim: they are
    /// expected to name existing or intended prims but nothing checks that they resolve.
    pub fn set_targets(&mut self, targets: Vec<PrimPath>) {
        self.targets = targets;
    }
}

/// A link to an external document. When a consumer composes the stage, the referenced
/// document's default prim is imported under the referencing prim. This crate authors
/// and serializes references but never resolves them.
pub struct Reference {
    pub(crate) asset_path: String,
}

impl Reference {
    pub fn asset_path(&self) -> &str {
        &self.asset_path
    }
}

impl Stage {
    /// Returns a new, empty stage bound to `file_path`. The backing file is not touched
    /// until `Stage::save`, which overwrites it unconditionally.
    pub fn create_new<P: AsRef<Path>>(file_path: P) -> Stage {
        Stage {
            file_path: file_path.as_ref().to_path_buf(),
            default_prim: None,
            doc: None,
            root: Prim::new(PrimPath::root(), ""),
        }
    }

    /// Reads and parses the document at `file_path`.
    pub fn open<P: AsRef<Path>>(file_path: P) -> StdResult<Stage, UsdaParseError> {
        let text = fs::read_to_string(file_path.as_ref()).map_err(UsdaParseError::IoError)?;
        let document = usda::parse_document(&text)?;

        let mut stage = Stage::create_new(file_path);
        stage.default_prim = document.default_prim;
        stage.doc = document.doc;
        for prim_def in document.prims {
            realize_prim(&mut stage, &PrimPath::root(), prim_def);
        }

        debug!("opened stage from {}", stage.file_path.display());
        Ok(stage)
    }

    /// Defines a `Scope` prim at `path`, along with any ancestors that don't exist yet.
    /// If the path is already defined the existing prim is returned unchanged, which
    /// makes repeated defines harmless.
    /// # Panics
    /// Panics if `path` is the pseudo-root path.
    pub fn define(&mut self, path: &PrimPath) -> &mut Prim {
        self.define_prim(path, "Scope")
    }

    /// Like `Stage::define` but with an explicit prim type name. Ancestors created along
    /// the way are always `Scope`s.
    /// # Panics
    /// Panics if `path` is the pseudo-root path or `type_name` is not a valid identifier.
    pub fn define_prim(&mut self, path: &PrimPath, type_name: &str) -> &mut Prim {
        assert!(!path.is_root(), "cannot define a prim at the pseudo-root path");
        assert!(
            path::is_identifier(type_name),
            "invalid prim type name '{}'",
            type_name
        );

        let elements: Vec<_> = path.elements().collect();
        let last = elements.len() - 1;

        let mut current = &mut self.root;
        let mut current_path = PrimPath::root();

        for (depth, name) in elements.into_iter().enumerate() {
            current_path = current_path.append_child(name);
            let child_type = if depth == last { type_name } else { "Scope" };
            let child_path = current_path.clone();

            current = current
                .children
                .entry(String::from(name))
                .or_insert_with(|| Prim::new(child_path, child_type));
        }

        current
    }

    /// Looks up a defined prim. The pseudo-root is not a prim, so `prim_at` of the root
    /// path returns `None`.
    pub fn prim_at(&self, path: &PrimPath) -> Option<&Prim> {
        if path.is_root() {
            return None;
        }

        let mut current = &self.root;
        for name in path.elements() {
            current = current.children.get(name)?;
        }

        Some(current)
    }

    /// Declares which root prim a referencing document imports by default.
    /// # Panics
    /// Panics if `name` is not a valid identifier.
    pub fn set_default_prim(&mut self, name: &str) {
        assert!(
            path::is_identifier(name),
            "invalid default prim name '{}'",
            name
        );
        self.default_prim = Some(String::from(name));
    }

    pub fn default_prim(&self) -> Option<&str> {
        self.default_prim.as_deref()
    }

    /// Attaches a documentation string to the layer metadata.
    pub fn set_doc(&mut self, doc: &str) {
        self.doc = Some(String::from(doc));
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Iterates over every defined prim, depth first, parents before children, siblings
    /// in the order they were defined. The pseudo-root is skipped.
    pub fn traverse(&self) -> Traverse<'_> {
        Traverse {
            stack: vec![self.root.children.values()],
        }
    }

    /// Root prims in definition order.
    pub fn root_prims(&self) -> impl Iterator<Item = &Prim> {
        self.root.children.values()
    }

    /// Serializes the stage to its text form without touching the disk.
    pub fn export_to_string(&self) -> String {
        writer::write_document(self)
    }

    /// Serializes the stage and writes it to the backing file, overwriting any previous
    /// content. A failure partway through leaves a truncated file behind.
    pub fn save(&self) -> io::Result<()> {
        let text = self.export_to_string();
        fs::write(&self.file_path, &text)?;
        debug!(
            "saved stage to {} ({} bytes)",
            self.file_path.display(),
            text.len()
        );
        Ok(())
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

impl Prim {
    fn new(path: PrimPath, type_name: &str) -> Prim {
        Prim {
            path,
            type_name: String::from(type_name),
            references: Vec::new(),
            properties: LinkedHashMap::new(),
            children: LinkedHashMap::new(),
        }
    }

    pub fn path(&self) -> &PrimPath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Declares a typed attribute on this prim and returns it. Declaring a name twice
    /// returns the existing slot unchanged.
    /// # Panics
    /// Panics if `name` is not a valid property identifier, or if the name is already
    /// taken by a relationship.
    pub fn create_attribute(&mut self, name: &str, value_type: ValueType) -> &mut Attribute {
        assert!(
            path::is_property_identifier(name),
            "invalid property name '{}'",
            name
        );

        let property = self
            .properties
            .entry(String::from(name))
            .or_insert_with(|| {
                Property::Attribute(Attribute {
                    name: String::from(name),
                    value_type,
                    value: None,
                    custom: true,
                })
            });

        match property {
            Property::Attribute(attribute) => attribute,
            Property::Relationship(_) => {
                panic!("property '{}' is already a relationship", name)
            }
        }
    }

    /// Declares a relationship on this prim and returns it, with the same reuse and
    /// panic behavior as `Prim::create_attribute`.
    pub fn create_relationship(&mut self, name: &str) -> &mut Relationship {
        assert!(
            path::is_property_identifier(name),
            "invalid property name '{}'",
            name
        );

        let property = self
            .properties
            .entry(String::from(name))
            .or_insert_with(|| {
                Property::Relationship(Relationship {
                    name: String::from(name),
                    targets: Vec::new(),
                    custom: true,
                })
            });

        match property {
            Property::Relationship(relationship) => relationship,
            Property::Attribute(_) => {
                panic!("property '{}' is already an attribute", name)
            }
        }
    }

    /// Appends a reference to an external document. The referenced document is expected
    /// to exist and declare a default prim by the time a consumer composes this stage.
    pub fn add_reference(&mut self, asset_path: &str) {
        self.references.push(Reference {
            asset_path: String::from(asset_path),
        });
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// Attributes in declaration order, skipping relationships.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.properties.values().filter_map(|property| match property {
            Property::Attribute(attribute) => Some(attribute),
            Property::Relationship(_) => None,
        })
    }

    /// Relationships in declaration order, skipping attributes.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.properties.values().filter_map(|property| match property {
            Property::Relationship(relationship) => Some(relationship),
            Property::Attribute(_) => None,
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        match self.properties.get(name) {
            Some(Property::Attribute(attribute)) => Some(attribute),
            _ => None,
        }
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        match self.properties.get(name) {
            Some(Property::Relationship(relationship)) => Some(relationship),
            _ => None,
        }
    }

    /// Child prims in definition order.
    pub fn children(&self) -> impl Iterator<Item = &Prim> {
        self.children.values()
    }

    pub fn child(&self, name: &str) -> Option<&Prim> {
        self.children.get(name)
    }
}

/// Depth-first prim iterator returned by `Stage::traverse`.
pub struct Traverse<'a> {
    stack: Vec<linked_hash_map::Values<'a, String, Prim>>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = &'a Prim;

    fn next(&mut self) -> Option<&'a Prim> {
        loop {
            let current = self.stack.last_mut()?;

            match current.next() {
                Some(prim) => {
                    self.stack.push(prim.children.values());
                    return Some(prim);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Rebuilds the runtime tree from a parsed prim definition. The parser has already
/// checked that names are identifiers and that values match their declared types, so
/// this can't fail.
fn realize_prim(stage: &mut Stage, parent_path: &PrimPath, prim_def: usda::PrimDef) {
    let prim_path = parent_path.append_child(&prim_def.name);
    let prim = stage.define_prim(&prim_path, &prim_def.type_name);

    for asset_path in prim_def.references {
        prim.references.push(Reference { asset_path });
    }

    for property in prim_def.properties {
        match property {
            usda::PropertyDef::Attribute {
                name,
                value_type,
                value,
                custom,
            } => {
                prim.properties.insert(
                    name.clone(),
                    Property::Attribute(Attribute {
                        name,
                        value_type,
                        value,
                        custom,
                    }),
                );
            }
            usda::PropertyDef::Relationship {
                name,
                targets,
                custom,
            } => {
                prim.properties.insert(
                    name.clone(),
                    Property::Relationship(Relationship {
                        name,
                        targets,
                        custom,
                    }),
                );
            }
        }
    }

    for child in prim_def.children {
        realize_prim(stage, &prim_path, child);
    }
}
