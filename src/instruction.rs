use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// One node of the issuer's instruction forest.
///
/// The kind of a node decides how the claim-tree walk renders it into the
/// payload and which disclosures it emits. Holding the kinds apart as
/// variants makes the "value and children at once" shape unrepresentable;
/// loose input goes through [`NodeSpec`] instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Named scalar claim, rendered in cleartext or digested depending on
    /// the `sd` flag.
    Claim { name: String, value: Value, sd: bool },

    /// Unnamed value inside an array parent.
    ArrayElement { value: Value, sd: bool },

    /// Visible object; children render as a nested object.
    Object {
        name: String,
        children: Vec<Instruction>,
    },

    /// The whole subtree collapses into a single disclosure whose value is
    /// the cleartext object built from the children.
    SdObject {
        name: String,
        children: Vec<Instruction>,
    },

    /// Parent and children are each individually disclosable; the parent's
    /// disclosure references the children's digests.
    Recursive {
        name: String,
        children: Vec<Instruction>,
    },

    /// Array parent; children must be [`Instruction::ArrayElement`].
    Array {
        name: String,
        elements: Vec<Instruction>,
    },
}

pub type Instructions = Vec<Instruction>;

/// Appends `b` to `a`, keeping the traversal order of both sets.
pub fn combine_instruction_sets(mut a: Instructions, b: Instructions) -> Instructions {
    a.extend(b);
    a
}

/// Loosely shaped instruction node, as carried in configuration or on the
/// wire. The kind is implied by which fields are populated; [`NodeSpec::classify`]
/// resolves it into an [`Instruction`] or rejects contradictory shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeSpec>>,

    #[serde(default)]
    pub sd: bool,
}

impl NodeSpec {
    /// Resolves the node shape into an explicit instruction kind.
    ///
    /// A named parent whose children are all unnamed values becomes an
    /// array. A disclosable parent with at least one disclosable child is
    /// recursive; with none it collapses into a single disclosure.
    pub fn classify(self) -> Result<Instruction, Error> {
        let sd = self.sd;
        match (self.name, self.value, self.children) {
            (_, Some(_), Some(_)) => Err(Error::ValueAndChildrenConflict),
            (Some(name), Some(value), None) => Ok(Instruction::Claim { name, value, sd }),
            (None, Some(value), None) => Ok(Instruction::ArrayElement { value, sd }),
            (Some(name), None, Some(children)) => {
                if !children.is_empty() && children.iter().all(is_element_shaped) {
                    let elements = children
                        .into_iter()
                        .map(NodeSpec::classify)
                        .collect::<Result<_, _>>()?;
                    return Ok(Instruction::Array { name, elements });
                }

                let any_sd_child = children.iter().any(|child| child.sd);
                let children = children
                    .into_iter()
                    .map(NodeSpec::classify)
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(if sd && any_sd_child {
                    Instruction::Recursive { name, children }
                } else if sd {
                    Instruction::SdObject { name, children }
                } else {
                    Instruction::Object { name, children }
                })
            }
            _ => Err(Error::UnknownNodeKind),
        }
    }
}

/// Classifies a whole forest of loose nodes.
pub fn classify_forest(specs: Vec<NodeSpec>) -> Result<Instructions, Error> {
    specs.into_iter().map(NodeSpec::classify).collect()
}

fn is_element_shaped(spec: &NodeSpec) -> bool {
    spec.name.is_none() && spec.value.is_some() && spec.children.is_none()
}
