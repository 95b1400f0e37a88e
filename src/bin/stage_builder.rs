//! Generates the nested stress-test fixture: a main document with a deep, wide prim
//! hierarchy and a small companion document it references from every leaf.
//!
//! The output is deterministic, so the two files can be checked into a test suite and
//! regenerated at will. Both are written to the current working directory and
//! overwritten unconditionally.

use log::{debug, info};
use std::io;
use usda::{PrimPath, Stage, ValueType};

const ROOT_COUNT: usize = 100;
const CHILD_COUNT: usize = 100;
const GRANDCHILD_COUNT: usize = 10;
const GREATGRANDCHILD_COUNT: usize = 10;
const LEAF_PRIMVAR_COUNT: usize = 12;

const STAGE_PATH: &str = "./complicated.usd";
const REFERENCE_PATH: &str = "./reference.usd";

fn main() -> io::Result<()> {
    pretty_env_logger::init();

    // The reference document has to be on disk with a default prim before anything
    // points at it.
    let mut reference = Stage::create_new(REFERENCE_PATH);
    reference
        .define(&PrimPath::new("/reference"))
        .create_attribute("test", ValueType::Float);
    reference.set_default_prim("reference");
    reference.save()?;
    info!("saved {}", REFERENCE_PATH);

    let mut stage = Stage::create_new(STAGE_PATH);

    for i in 0..ROOT_COUNT {
        let root_path = PrimPath::new(&format!("/root_{}", i));
        let root = stage.define(&root_path);
        root.create_attribute("attr1", ValueType::Int);
        root.create_attribute("attr2", ValueType::Int);
        root.create_attribute("attr3", ValueType::IntArray);
        root.create_attribute("attr4", ValueType::IntArray);

        for j in 0..CHILD_COUNT {
            let child_path = root_path.append_child(&format!("child_{}", j));
            stage
                .define(&child_path)
                .create_relationship("rel1")
                .set_targets(vec![root_path.clone()]);

            for k in 0..GRANDCHILD_COUNT {
                let grandchild_path = child_path.append_child(&format!("grandchild_{}", k));
                stage
                    .define(&grandchild_path)
                    .create_relationship("rel2")
                    .set_targets(vec![child_path.clone()]);

                for m in 0..GREATGRANDCHILD_COUNT {
                    let greatgrandchild_path =
                        grandchild_path.append_child(&format!("greatgrandchild_{}", m));
                    let greatgrandchild = stage.define(&greatgrandchild_path);
                    greatgrandchild
                        .create_relationship("rel3")
                        .set_targets(vec![grandchild_path.clone()]);

                    for n in 0..LEAF_PRIMVAR_COUNT {
                        greatgrandchild.create_attribute(
                            &format!("primvars:primvar{}", n),
                            ValueType::IntArray,
                        );
                    }

                    greatgrandchild.add_reference(REFERENCE_PATH);
                }
            }
        }

        debug!("defined /root_{} and its subtree", i);
    }

    stage.save()?;
    info!("saved {}", STAGE_PATH);

    Ok(())
}
