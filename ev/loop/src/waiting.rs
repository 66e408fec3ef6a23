//! Waiting queue
//!
//! FIFO of subscriptions known to be ready, linked through `prev`/`next`
//! indices stored in a node array parallel to the subscription arena. Node
//! storage is reserved when a subscription is created, so splicing from the
//! notify path never allocates.

#[derive(Debug, Clone, Copy, Default)]
struct WaitNode {
    prev: Option<usize>,
    next: Option<usize>,
    queued: bool,
}

#[derive(Debug, Default)]
pub(crate) struct WaitList {
    nodes: Vec<WaitNode>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl WaitList {
    /// Make room for the node of subscription `index`.
    pub(crate) fn reserve(&mut self, index: usize) {
        if self.nodes.len() <= index {
            self.nodes.resize(index + 1, WaitNode::default());
        }
    }

    /// Append `index` unless it is already queued. Returns whether it was added.
    pub(crate) fn push_back(&mut self, index: usize) -> bool {
        let tail = self.tail;
        let Some(node) = self.nodes.get_mut(index) else {
            return false;
        };
        if node.queued {
            return false;
        }

        node.queued = true;
        node.prev = tail;
        node.next = None;

        match tail {
            Some(t) => self.nodes[t].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
        true
    }

    /// Insert `index` at the head unless it is already queued. Returns
    /// whether it was added.
    pub(crate) fn push_front(&mut self, index: usize) -> bool {
        let head = self.head;
        let Some(node) = self.nodes.get_mut(index) else {
            return false;
        };
        if node.queued {
            return false;
        }

        node.queued = true;
        node.prev = None;
        node.next = head;

        match head {
            Some(h) => self.nodes[h].prev = Some(index),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
        self.len += 1;
        true
    }

    /// Detach the head and clear its membership flag.
    pub(crate) fn pop_front(&mut self) -> Option<usize> {
        let head = self.head?;
        self.unlink(head);
        Some(head)
    }

    /// Detach `index` wherever it sits. Returns whether it was queued.
    pub(crate) fn remove(&mut self, index: usize) -> bool {
        match self.nodes.get(index) {
            Some(node) if node.queued => {
                self.unlink(index);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_queued(&self, index: usize) -> bool {
        self.nodes.get(index).is_some_and(|node| node.queued)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    fn unlink(&mut self, index: usize) {
        let WaitNode { prev, next, .. } = self.nodes[index];

        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }

        self.nodes[index] = WaitNode::default();
        self.len -= 1;
    }
}
