use cgmath::{One, Quaternion as CgQuaternion, Vector3, Zero};

/////////////////////////////////////////////////////////////////////////////////////////////////

pub type Index = usize;
pub type Quaternion = CgQuaternion<f64>;
pub type Position = Vector3<f64>;

/////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Position {
        match self {
            Axis::X => Position::unit_x(),
            Axis::Y => Position::unit_y(),
            Axis::Z => Position::unit_z(),
        }
    }

    /// Lowercase letter used when building an axis order string like "zxy".
    pub fn letter(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }
}

/// One animated scalar of a joint, as named in the CHANNELS line of a .bvh file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Xposition,
    Yposition,
    Zposition,
    Xrotation,
    Yrotation,
    Zrotation,
}

impl Channel {
    pub fn from_name(name: &str) -> Option<Channel> {
        match name {
            "Xposition" => Some(Channel::Xposition),
            "Yposition" => Some(Channel::Yposition),
            "Zposition" => Some(Channel::Zposition),
            "Xrotation" => Some(Channel::Xrotation),
            "Yrotation" => Some(Channel::Yrotation),
            "Zrotation" => Some(Channel::Zrotation),
            _ => None,
        }
    }

    pub fn is_position(self) -> bool {
        matches!(
            self,
            Channel::Xposition | Channel::Yposition | Channel::Zposition
        )
    }

    pub fn is_rotation(self) -> bool {
        !self.is_position()
    }

    pub fn axis(self) -> Axis {
        match self {
            Channel::Xposition | Channel::Xrotation => Axis::X,
            Channel::Yposition | Channel::Yrotation => Axis::Y,
            Channel::Zposition | Channel::Zrotation => Axis::Z,
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// A joint of the static skeleton. Children are owned by their parent, so the
/// hierarchy is always a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct JointNode {
    pub name: String,
    /// Rest pose translation relative to the parent joint.
    pub offset: Position,
    /// Animated channels in declaration order. The order decides both how many
    /// frame values the joint consumes and the rotation composition order.
    pub channels: Vec<Channel>,
    pub children: Vec<JointNode>,
    pub end_site: Option<Position>,
}

impl JointNode {
    pub fn new(name: impl Into<String>, offset: Position) -> Self {
        JointNode {
            name: name.into(),
            offset,
            channels: Vec::new(),
            children: Vec::new(),
            end_site: None,
        }
    }

    pub fn with_channels(mut self, channels: &[Channel]) -> Self {
        self.channels = channels.to_vec();
        self
    }

    pub fn with_child(mut self, child: JointNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_end_site(mut self, offset: Position) -> Self {
        self.end_site = Some(offset);
        self
    }

    /// Number of joints in this subtree, the joint itself included.
    pub fn num_joints(&self) -> usize {
        1 + self.children.iter().map(JointNode::num_joints).sum::<usize>()
    }

    /// Number of frame values this subtree consumes when the frame is long enough.
    pub fn num_channels_in_subtree(&self) -> usize {
        self.channels.len()
            + self
                .children
                .iter()
                .map(JointNode::num_channels_in_subtree)
                .sum::<usize>()
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        names.push(&self.name);
        for child in self.children.iter() {
            child.collect_names(names);
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Static skeleton of one motion file. Joint indices everywhere in the crate are
/// pre-order positions in this tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    root: JointNode,
    num_joints: usize,
    num_channels: usize,
}

impl Skeleton {
    pub fn new(root: JointNode) -> Self {
        let num_joints = root.num_joints();
        let num_channels = root.num_channels_in_subtree();
        Skeleton {
            root,
            num_joints,
            num_channels,
        }
    }

    pub fn root(&self) -> &JointNode {
        &self.root
    }

    pub fn num_joints(&self) -> usize {
        self.num_joints
    }

    /// Frame length needed to animate every channel of the skeleton.
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Joint names in pre-order, i.e. in the same order as `Pose` slots.
    pub fn joint_names(&self) -> Vec<&str> {
        let mut names = Vec::with_capacity(self.num_joints);
        self.root.collect_names(&mut names);
        names
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Global transforms of every joint for a single frame, keyed by pre-order joint index.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub global_positions: Vec<Position>,
    pub global_rotations: Vec<Quaternion>,
}

impl Pose {
    pub fn new(num_joints: usize) -> Self {
        Pose {
            global_positions: vec![Position::zero(); num_joints],
            global_rotations: vec![Quaternion::one(); num_joints],
        }
    }

    pub fn for_skeleton(skeleton: &Skeleton) -> Self {
        Pose::new(skeleton.num_joints())
    }

    pub fn num_joints(&self) -> usize {
        self.global_positions.len()
    }

    /// Reset to `num_joints` identity transforms, keeping allocations.
    pub fn reset(&mut self, num_joints: usize) {
        self.global_positions.clear();
        self.global_positions.resize(num_joints, Position::zero());
        self.global_rotations.clear();
        self.global_rotations.resize(num_joints, Quaternion::one());
    }
}
