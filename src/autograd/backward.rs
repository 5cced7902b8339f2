//! Backward operation trait and graph traversal

use super::Tensor;
use std::collections::HashSet;
use std::rc::Rc;

/// Gradient propagation for one node of the computational graph
///
/// `backward` reads the gradient of the op's output and accumulates the
/// resulting gradients into its inputs. It does not recurse; [`crate::autograd::backward`]
/// schedules every op exactly once, after all consumers of its output have run.
pub trait BackwardOp {
    /// Propagate the output gradient into the inputs
    fn backward(&self);

    /// Tensors this op reads from
    fn inputs(&self) -> Vec<Tensor>;
}

/// Ops reachable from `root`, ordered so that every op comes after the ops
/// that produced its inputs.
pub(crate) fn topological_order(root: &Tensor) -> Vec<Rc<dyn BackwardOp>> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![(root.clone(), false)];

    while let Some((tensor, expanded)) = stack.pop() {
        let Some(op) = tensor.backward_op() else {
            continue;
        };
        if expanded {
            order.push(op);
            continue;
        }
        if !visited.insert(tensor.node_id()) {
            continue;
        }
        stack.push((tensor, true));
        for input in op.inputs() {
            if !visited.contains(&input.node_id()) {
                stack.push((input, false));
            }
        }
    }

    order
}
