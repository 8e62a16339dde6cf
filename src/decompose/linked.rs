use arrow::{
    array::{cast::AsArray, Array, ArrayRef},
    datatypes::DataType,
};

/// One column view in the arena with index links to its relatives.
#[derive(Debug)]
pub(crate) struct LinkedNode {
    pub(crate) array: ArrayRef,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
}

/// Index-addressed forest of linked column views for one table.
///
/// Struct children come from `StructArray::column`, which Arrow already
/// slices to the parent's window. A list node has a single child: its full
/// values array, addressed through the list's offsets.
#[derive(Debug)]
pub(crate) struct LinkedColumns {
    nodes: Vec<LinkedNode>,
    roots: Vec<usize>,
}

impl LinkedColumns {
    pub(crate) fn new(columns: &[ArrayRef]) -> Self {
        let mut nodes = Vec::new();
        let mut roots = Vec::with_capacity(columns.len());
        let mut pending = Vec::new();

        for column in columns {
            roots.push(nodes.len());
            pending.push(nodes.len());
            nodes.push(LinkedNode {
                array: column.clone(),
                parent: None,
                children: Vec::new(),
            });

            while let Some(id) = pending.pop() {
                let children = match nodes[id].array.data_type() {
                    DataType::Struct(_) => nodes[id].array.as_struct().columns().to_vec(),
                    DataType::List(_) => vec![nodes[id].array.as_list::<i32>().values().clone()],
                    _ => continue,
                };
                for child in children {
                    let child_id = nodes.len();
                    nodes.push(LinkedNode {
                        array: child,
                        parent: Some(id),
                        children: Vec::new(),
                    });
                    nodes[id].children.push(child_id);
                    pending.push(child_id);
                }
            }
        }

        Self { nodes, roots }
    }

    pub(crate) fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub(crate) fn node(&self, id: usize) -> &LinkedNode {
        &self.nodes[id]
    }

    pub(crate) fn data_type(&self, id: usize) -> &DataType {
        self.nodes[id].array.data_type()
    }

    /// Ancestors of `id`, nearest first.
    pub(crate) fn ancestors(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.nodes[id].parent, move |&parent| self.nodes[parent].parent)
    }
}
