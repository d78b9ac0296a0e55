use std::fmt;

/// Direction of an adjacency lookup.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Dir {
    /// Successors: targets of edges leaving the node.
    Out,
    /// Predecessors: sources of edges entering the node.
    In,
}

impl Dir {
    /// Short lowercase label used in logs and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Out => "out",
            Dir::In => "in",
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
