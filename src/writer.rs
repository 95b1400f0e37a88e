//! Serialization of a `Stage` into the `.usda` text form.
//!
//! The output is a pure function of the stage's contents: the same tree always produces
//! the same bytes, which is what lets a generated document double as a regression
//! fixture.

use crate::runtime::{Prim, Property, Stage};
use crate::value::escape_string;
use std::fmt::Write;

pub(crate) fn write_document(stage: &Stage) -> String {
    let mut writer = UsdaWriter {
        output: String::new(),
        indent: 0,
    };
    writer.document(stage);
    writer.output
}

struct UsdaWriter {
    output: String,
    indent: usize,
}

impl UsdaWriter {
    fn document(&mut self, stage: &Stage) {
        self.output.push_str("#usda 1.0\n");

        if stage.default_prim.is_some() || stage.doc.is_some() {
            self.output.push_str("(\n");
            if let Some(default_prim) = &stage.default_prim {
                writeln!(
                    self.output,
                    "    defaultPrim = \"{}\"",
                    escape_string(default_prim)
                )
                .unwrap();
            }
            if let Some(doc) = &stage.doc {
                writeln!(self.output, "    doc = \"{}\"", escape_string(doc)).unwrap();
            }
            self.output.push_str(")\n");
        }

        for prim in stage.root.children.values() {
            self.write_line("");
            self.prim(prim);
        }
    }

    fn prim(&mut self, prim: &Prim) {
        let def = format!("def {} \"{}\"", prim.type_name, escape_string(prim.name()));

        if prim.references.is_empty() {
            self.write_line(&def);
        } else {
            self.write_line(&format!("{} (", def));
            self.indent += 1;
            let assets: Vec<_> = prim
                .references
                .iter()
                .map(|reference| format!("@{}@", reference.asset_path))
                .collect();
            if assets.len() == 1 {
                self.write_line(&format!("references = {}", assets[0]));
            } else {
                self.write_line(&format!("references = [{}]", assets.join(", ")));
            }
            self.indent -= 1;
            self.write_line(")");
        }

        self.write_line("{");
        self.indent += 1;

        for property in prim.properties.values() {
            self.property(property);
        }

        for child in prim.children.values() {
            self.write_line("");
            self.prim(child);
        }

        self.indent -= 1;
        self.write_line("}");
    }

    fn property(&mut self, property: &Property) {
        let mut line = String::new();

        match property {
            Property::Attribute(attribute) => {
                if attribute.custom {
                    line.push_str("custom ");
                }
                write!(line, "{} {}", attribute.value_type.token(), attribute.name).unwrap();
                if let Some(value) = &attribute.value {
                    write!(line, " = {}", value).unwrap();
                }
            }
            Property::Relationship(relationship) => {
                if relationship.custom {
                    line.push_str("custom ");
                }
                write!(line, "rel {}", relationship.name).unwrap();
                match relationship.targets.len() {
                    0 => {}
                    1 => write!(line, " = <{}>", relationship.targets[0]).unwrap(),
                    _ => {
                        let targets: Vec<_> = relationship
                            .targets
                            .iter()
                            .map(|target| format!("<{}>", target))
                            .collect();
                        write!(line, " = [{}]", targets.join(", ")).unwrap();
                    }
                }
            }
        }

        self.write_line(&line);
    }

    // An empty line stays empty instead of carrying indentation.
    fn write_line(&mut self, line: &str) {
        if !line.is_empty() {
            for _ in 0..self.indent {
                self.output.push_str("    ");
            }
            self.output.push_str(line);
        }
        self.output.push('\n');
    }
}
