use std::collections::HashMap;

use tracing::debug;

use crate::Error;

use super::{
    description::{JointDescription, LinkDescription, RobotDescription},
    frame_elements::{Joint, JointID, JointType, Link, LinkDynamics, LinkID, Transform},
};

#[cfg(test)]
#[path = "model_tests.rs"]
mod model_tests;

/// Defines the kinematic tree of a serial-link manipulator.
///
/// Links and joints are stored in an arena and refer to each other through [LinkID] and
/// [JointID] handles. Every link except the root has exactly one parent joint and any number
/// of child joints. The tree is built once from a [RobotDescription] and its structure does not
/// change afterwards. The link poses and the joint states are updated in place by the
/// kinematics and dynamics calculations.
///
/// Cloning the tree creates an independent deep copy, which can be handed to a separate
/// worker.
#[derive(Clone, Debug)]
pub struct KinematicTree {
    /// The links of the tree, indexed by [LinkID].
    links: Vec<Link>,

    /// The joints of the tree, indexed by [JointID].
    joints: Vec<Joint>,

    /// The single link without a parent joint.
    root: LinkID,

    link_names: HashMap<String, LinkID>,
    joint_names: HashMap<String, JointID>,
}

impl KinematicTree {
    /// Returns the child joints of the given link.
    pub fn children(&self, link: LinkID) -> &[JointID] {
        self.links[link.index()].children()
    }

    /// Returns the ID of the link with the given name.
    ///
    /// ## Errors
    ///
    /// * [Error::UnknownLink] - Returned when no link with the given name exists.
    pub fn find_link(&self, name: &str) -> Result<LinkID, Error> {
        self.link_names
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownLink {
                name: name.to_string(),
            })
    }

    /// Returns the ID of the joint with the given name.
    ///
    /// ## Errors
    ///
    /// * [Error::UnknownJoint] - Returned when no joint with the given name exists.
    pub fn find_joint(&self, name: &str) -> Result<JointID, Error> {
        self.joint_names
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownJoint {
                name: name.to_string(),
            })
    }

    /// Builds the tree from a robot description.
    ///
    /// Joints of type `revolute` and `prismatic` move along the principal axis given by their
    /// description. All other joint types are treated as fixed.
    ///
    /// ## Errors
    ///
    /// * [Error::DuplicateLink] - Returned when two links share a name.
    /// * [Error::DuplicateJoint] - Returned when two joints share a name.
    /// * [Error::MissingLink] - Returned when a joint refers to a link that is not described.
    /// * [Error::InvalidJointAxis] - Returned when a movable joint has no principal unit axis.
    /// * [Error::LinkHasMultipleParents] - Returned when a link is the child of several joints.
    /// * [Error::NoUniqueRoot] - Returned when there is not exactly one link without a parent.
    /// * [Error::UnreachableLink] - Returned when a link cannot be reached from the root, e.g.
    ///   because it is part of a cycle.
    pub fn from_description<D: RobotDescription>(description: &D) -> Result<Self, Error> {
        let mut links = Vec::with_capacity(description.links().len());
        let mut link_names = HashMap::new();
        for link in description.links() {
            if link_names.contains_key(link.name()) {
                return Err(Error::DuplicateLink {
                    name: link.name().to_string(),
                });
            }

            link_names.insert(link.name().to_string(), LinkID::new(links.len()));
            links.push(Link::new(
                link.name().to_string(),
                LinkDynamics::from_upper_triangle(link.mass(), link.mass_center(), link.inertia()),
            ));
        }

        let find = |joint: &D::Joint, name: &str| {
            link_names
                .get(name)
                .copied()
                .ok_or_else(|| Error::MissingLink {
                    joint: joint.name().to_string(),
                    link: name.to_string(),
                })
        };

        let mut joints = Vec::with_capacity(description.joints().len());
        let mut joint_names = HashMap::new();
        for joint in description.joints() {
            if joint_names.contains_key(joint.name()) {
                return Err(Error::DuplicateJoint {
                    name: joint.name().to_string(),
                });
            }

            let parent = find(joint, joint.parent_link())?;
            let child = find(joint, joint.child_link())?;

            let joint_type = match joint.joint_type() {
                "revolute" | "prismatic" => {
                    let axis = joint.axis().ok_or_else(|| Error::InvalidJointAxis {
                        joint: joint.name().to_string(),
                    })?;
                    JointType::from_description(joint.joint_type(), axis)
                }
                _ => JointType::Fixed,
            };
            let limits = if joint_type.is_movable() {
                joint.limits()
            } else {
                (0.0, 0.0)
            };

            if links[child.index()].parent.is_some() {
                return Err(Error::LinkHasMultipleParents {
                    link: joint.child_link().to_string(),
                });
            }

            let id = JointID::new(joints.len());
            links[child.index()].parent = Some(id);
            links[parent.index()].children.push(id);

            joint_names.insert(joint.name().to_string(), id);
            joints.push(Joint::new(
                joint.name().to_string(),
                joint_type,
                parent,
                child,
                Transform::from_xyz_rpy(joint.xyz(), joint.rpy()),
                limits,
                joint.ik6_deflection(),
            ));
        }

        let roots: Vec<LinkID> = links
            .iter()
            .enumerate()
            .filter(|(_, link)| link.parent().is_none())
            .map(|(index, _)| LinkID::new(index))
            .collect();
        if roots.len() != 1 {
            return Err(Error::NoUniqueRoot { count: roots.len() });
        }
        let root = roots[0];

        // A link that is not visited from the root is part of a cycle.
        let mut visited = vec![false; links.len()];
        let mut stack = vec![root];
        while let Some(link) = stack.pop() {
            visited[link.index()] = true;
            for joint in links[link.index()].children() {
                stack.push(joints[joint.index()].child());
            }
        }
        if let Some(index) = visited.iter().position(|v| !v) {
            return Err(Error::UnreachableLink {
                link: links[index].name().to_string(),
            });
        }

        debug!(
            "Created kinematic tree with {} links and {} joints, root link '{}'",
            links.len(),
            joints.len(),
            links[root.index()].name()
        );

        Ok(Self {
            links,
            joints,
            root,
            link_names,
            joint_names,
        })
    }

    /// Returns the joint with the given ID.
    ///
    /// ## Panics
    ///
    /// Panics if the ID does not belong to this tree.
    pub fn joint(&self, id: JointID) -> &Joint {
        &self.joints[id.index()]
    }

    pub(crate) fn joint_mut(&mut self, id: JointID) -> &mut Joint {
        &mut self.joints[id.index()]
    }

    /// Returns all the joints of the tree in description order.
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Returns the link with the given ID.
    ///
    /// ## Panics
    ///
    /// Panics if the ID does not belong to this tree.
    pub fn link(&self, id: LinkID) -> &Link {
        &self.links[id.index()]
    }

    pub(crate) fn link_mut(&mut self, id: LinkID) -> &mut Link {
        &mut self.links[id.index()]
    }

    /// Returns all the links of the tree in description order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Returns the number of joints in the tree.
    pub fn number_of_joints(&self) -> usize {
        self.joints.len()
    }

    /// Returns the number of links in the tree.
    pub fn number_of_links(&self) -> usize {
        self.links.len()
    }

    /// Returns the parent joint of the given link, or `None` for the root link.
    pub fn parent(&self, link: LinkID) -> Option<JointID> {
        self.links[link.index()].parent()
    }

    /// Returns the root link of the tree.
    pub fn root(&self) -> LinkID {
        self.root
    }
}
