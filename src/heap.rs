// ABOUTME: Heap bookkeeping: allocation list, constructors, mark and sweep

use crate::env::Frame;
use crate::value::{Closure, EnvRef, NativeFn, Object, ObjRef, Value};

/// Collection is never triggered before this many allocations have
/// happened, so small programs never pay for a sweep.
pub const GC_COLD_THRESHOLD: usize = 128;

#[derive(Debug)]
struct Slot {
    obj: Object,
    marked: bool,
    prev: Option<ObjRef>,
    next: Option<ObjRef>,
}

/// Owns every runtime object and every environment frame.
///
/// Objects are threaded through a doubly-linked allocation list in
/// allocation order; the sweep phase walks that list from the tail. Slots
/// freed by the sweep are recycled through a free list.
#[derive(Debug)]
pub struct Heap {
    slots: Vec<Option<Slot>>,
    free: Vec<u32>,
    tail: Option<ObjRef>,
    live: usize,
    allocs_since_sweep: usize,
    live_at_last_sweep: usize,
    pub(crate) frames: Vec<Option<Frame>>,
    pub(crate) free_frames: Vec<u32>,
}

impl Heap {
    pub fn new() -> Self {
        Heap {
            slots: Vec::new(),
            free: Vec::new(),
            tail: None,
            live: 0,
            allocs_since_sweep: 0,
            live_at_last_sweep: 0,
            frames: Vec::new(),
            free_frames: Vec::new(),
        }
    }

    // ===== Allocation =====

    /// Links a new object at the tail of the allocation list.
    pub fn alloc(&mut self, obj: Object) -> ObjRef {
        let slot = Slot {
            obj,
            marked: false,
            prev: self.tail,
            next: None,
        };

        let r = match self.free.pop() {
            Some(i) => {
                self.slots[i as usize] = Some(slot);
                ObjRef(i)
            }
            None => {
                self.slots.push(Some(slot));
                ObjRef((self.slots.len() - 1) as u32)
            }
        };

        if let Some(old_tail) = self.tail {
            self.slot_mut(old_tail).next = Some(r);
        }
        self.tail = Some(r);
        self.live += 1;
        self.allocs_since_sweep += 1;
        r
    }

    pub fn number_new(&mut self, n: i64) -> Value {
        Some(self.alloc(Object::Number(n)))
    }

    pub fn symbol_new(&mut self, name: &str) -> Value {
        Some(self.alloc(Object::Symbol(name.to_string())))
    }

    pub fn str_new(&mut self, s: &str) -> Value {
        Some(self.alloc(Object::Str(s.to_string())))
    }

    pub fn bool_new(&mut self, b: bool) -> Value {
        Some(self.alloc(Object::Bool(b)))
    }

    pub fn error_new(&mut self, message: impl Into<String>) -> Value {
        Some(self.alloc(Object::Error(message.into())))
    }

    pub fn cons_new(&mut self, car: Value, cdr: Value) -> Value {
        Some(self.alloc(Object::Cons { car, cdr }))
    }

    pub fn builtin_new(&mut self, name: &'static str, f: NativeFn, handles_errors: bool) -> Value {
        Some(self.alloc(Object::Builtin {
            name,
            f,
            handles_errors,
        }))
    }

    pub fn function_new(&mut self, closure: Closure) -> Value {
        Some(self.alloc(Object::Function(closure)))
    }

    pub fn macro_new(&mut self, closure: Closure) -> Value {
        Some(self.alloc(Object::Macro(closure)))
    }

    /// Builds a proper list from a slice of values.
    pub fn list_from(&mut self, items: &[Value]) -> Value {
        let mut list = None;
        for item in items.iter().rev() {
            list = self.cons_new(*item, list);
        }
        list
    }

    // ===== Access =====

    pub fn get(&self, r: ObjRef) -> &Object {
        &self.slot(r).obj
    }

    pub fn get_mut(&mut self, r: ObjRef) -> &mut Object {
        &mut self.slot_mut(r).obj
    }

    fn slot(&self, r: ObjRef) -> &Slot {
        self.slots[r.0 as usize]
            .as_ref()
            .expect("use of collected object")
    }

    fn slot_mut(&mut self, r: ObjRef) -> &mut Slot {
        self.slots[r.0 as usize]
            .as_mut()
            .expect("use of collected object")
    }

    /// First element of a cons cell; nil for anything else.
    pub fn car(&self, v: Value) -> Value {
        match v {
            Some(r) => match self.get(r) {
                Object::Cons { car, .. } => *car,
                _ => None,
            },
            None => None,
        }
    }

    /// Second element of a cons cell; nil for anything else.
    pub fn cdr(&self, v: Value) -> Value {
        match v {
            Some(r) => match self.get(r) {
                Object::Cons { cdr, .. } => *cdr,
                _ => None,
            },
            None => None,
        }
    }

    pub fn is_cons(&self, v: Value) -> bool {
        matches!(v, Some(r) if matches!(self.get(r), Object::Cons { .. }))
    }

    pub fn is_error(&self, v: Value) -> bool {
        matches!(v, Some(r) if matches!(self.get(r), Object::Error(_)))
    }

    pub fn error_message(&self, v: Value) -> Option<&str> {
        match v {
            Some(r) => match self.get(r) {
                Object::Error(msg) => Some(msg),
                _ => None,
            },
            None => None,
        }
    }

    /// Name of a symbol value, if it is one.
    pub fn symbol_text(&self, v: Value) -> Option<&str> {
        match v {
            Some(r) => match self.get(r) {
                Object::Symbol(name) => Some(name),
                _ => None,
            },
            None => None,
        }
    }

    // ===== Collection =====

    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Number of objects reachable by walking the allocation list.
    pub fn allocation_list_len(&self) -> usize {
        let mut n = 0;
        let mut cursor = self.tail;
        while let Some(r) = cursor {
            n += 1;
            cursor = self.slot(r).prev;
        }
        n
    }

    pub fn any_marked(&self) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|slot| slot.marked)
    }

    /// True once the allocations since the last sweep exceed 1.25x the
    /// live count observed at that sweep (or the cold-start threshold).
    pub fn should_collect(&self) -> bool {
        let threshold = std::cmp::max(
            GC_COLD_THRESHOLD,
            self.live_at_last_sweep + self.live_at_last_sweep / 4,
        );
        self.allocs_since_sweep > threshold
    }

    /// Marks everything reachable from the given frames and values,
    /// descending through cons cells, closures, and frame parent links.
    /// The mark bit stops revisits, so cyclic structures terminate.
    pub fn mark(&mut self, frame_roots: &[EnvRef], value_roots: &[Value]) {
        let mut objs: Vec<ObjRef> = value_roots.iter().flatten().copied().collect();
        let mut frames: Vec<EnvRef> = frame_roots.to_vec();

        loop {
            if let Some(r) = objs.pop() {
                let slot = self.slot_mut(r);
                if slot.marked {
                    continue;
                }
                slot.marked = true;
                match &slot.obj {
                    Object::Cons { car, cdr } => {
                        objs.extend(car.iter().copied().chain(cdr.iter().copied()));
                    }
                    Object::Function(closure) | Object::Macro(closure) => {
                        objs.extend(
                            closure
                                .params
                                .iter()
                                .copied()
                                .chain(closure.body.iter().copied()),
                        );
                        frames.push(closure.env);
                    }
                    _ => {}
                }
            } else if let Some(e) = frames.pop() {
                let frame = self.frames[e.0 as usize]
                    .as_mut()
                    .expect("use of collected frame");
                if frame.marked {
                    continue;
                }
                frame.marked = true;
                if let Some(parent) = frame.parent {
                    frames.push(parent);
                }
                objs.extend(frame.bindings.values().flatten());
            } else {
                break;
            }
        }
    }

    /// Walks the allocation list, destroying every unmarked object and
    /// clearing the mark on every survivor, then drops unmarked frames.
    /// Returns the number of objects freed.
    pub fn sweep(&mut self) -> usize {
        let mut freed = 0;
        let mut cursor = self.tail;

        while let Some(r) = cursor {
            // Save the back link before this slot can be destroyed.
            let prev = self.slot(r).prev;
            if self.slot(r).marked {
                self.slot_mut(r).marked = false;
            } else {
                self.unlink(r);
                self.slots[r.0 as usize] = None;
                self.free.push(r.0);
                self.live -= 1;
                freed += 1;
            }
            cursor = prev;
        }

        // Frame 0 is the global frame and is never dropped.
        for i in 1..self.frames.len() {
            let unmarked = matches!(&self.frames[i], Some(frame) if !frame.marked);
            if unmarked {
                self.frames[i] = None;
                self.free_frames.push(i as u32);
            } else if let Some(frame) = self.frames[i].as_mut() {
                frame.marked = false;
            }
        }
        if let Some(frame) = self.frames.first_mut().and_then(|f| f.as_mut()) {
            frame.marked = false;
        }

        self.live_at_last_sweep = self.live;
        self.allocs_since_sweep = 0;
        freed
    }

    fn unlink(&mut self, r: ObjRef) {
        let (prev, next) = {
            let slot = self.slot(r);
            (slot.prev, slot.next)
        };
        if let Some(p) = prev {
            self.slot_mut(p).next = next;
        }
        if let Some(n) = next {
            self.slot_mut(n).prev = prev;
        }
        if self.tail == Some(r) {
            self.tail = prev;
        }
    }

    // ===== Printing =====

    /// Renders a value in its printed form.
    pub fn render(&self, v: Value) -> String {
        let mut out = String::new();
        self.write_value(&mut out, v);
        out
    }

    fn write_value(&self, out: &mut String, v: Value) {
        let Some(r) = v else {
            out.push_str("nil");
            return;
        };
        match self.get(r) {
            Object::Number(n) => out.push_str(&n.to_string()),
            Object::Symbol(s) | Object::Str(s) => out.push_str(s),
            Object::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Object::Error(msg) => {
                out.push_str("#<error: ");
                out.push_str(msg);
                out.push('>');
            }
            Object::Cons { .. } => {
                out.push('(');
                let mut cur = v;
                while let Some(c) = cur {
                    match self.get(c) {
                        Object::Cons { car, cdr } => {
                            self.write_value(out, *car);
                            match cdr {
                                None => break,
                                Some(n) if matches!(self.get(*n), Object::Cons { .. }) => {
                                    out.push(' ');
                                    cur = Some(*n);
                                }
                                Some(n) => {
                                    out.push_str(" . ");
                                    self.write_value(out, Some(*n));
                                    break;
                                }
                            }
                        }
                        _ => break,
                    }
                }
                out.push(')');
            }
            Object::Builtin { name, .. } => {
                out.push_str("#<builtin ");
                out.push_str(name);
                out.push('>');
            }
            Object::Function(_) => out.push_str("#<function>"),
            Object::Macro(_) => out.push_str("#<macro>"),
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_links_into_list() {
        let mut heap = Heap::new();
        heap.number_new(1);
        heap.number_new(2);
        heap.number_new(3);

        assert_eq!(heap.live_count(), 3);
        assert_eq!(heap.allocation_list_len(), 3);
    }

    #[test]
    fn test_sweep_frees_unmarked() {
        let mut heap = Heap::new();
        let keep = heap.number_new(1);
        heap.number_new(2);
        heap.number_new(3);

        heap.mark(&[], &[keep]);
        let freed = heap.sweep();

        assert_eq!(freed, 2);
        assert_eq!(heap.live_count(), 1);
        assert_eq!(heap.allocation_list_len(), 1);
    }

    #[test]
    fn test_sweep_clears_marks() {
        let mut heap = Heap::new();
        let keep = heap.number_new(1);

        heap.mark(&[], &[keep]);
        heap.sweep();

        assert!(!heap.any_marked());
    }

    #[test]
    fn test_mark_traverses_cons() {
        let mut heap = Heap::new();
        let a = heap.number_new(1);
        let b = heap.number_new(2);
        let pair = heap.cons_new(a, b);

        heap.mark(&[], &[pair]);
        let freed = heap.sweep();

        assert_eq!(freed, 0);
        assert_eq!(heap.live_count(), 3);
    }

    #[test]
    fn test_mark_survives_cycles() {
        let mut heap = Heap::new();
        let a = heap.cons_new(None, None);
        let b = heap.cons_new(a, None);
        if let Object::Cons { cdr, .. } = heap.get_mut(a.unwrap()) {
            *cdr = b;
        }

        heap.mark(&[], &[a]);
        assert_eq!(heap.sweep(), 0);
        assert_eq!(heap.live_count(), 2);
    }

    #[test]
    fn test_slot_reuse_after_sweep() {
        let mut heap = Heap::new();
        heap.number_new(1);
        heap.sweep();
        assert_eq!(heap.live_count(), 0);

        let again = heap.number_new(2);
        assert_eq!(heap.live_count(), 1);
        assert!(matches!(heap.get(again.unwrap()), Object::Number(2)));
    }

    #[test]
    fn test_render_atoms() {
        let mut heap = Heap::new();
        assert_eq!(heap.render(None), "nil");

        let n = heap.number_new(-42);
        assert_eq!(heap.render(n), "-42");

        let s = heap.str_new("hello");
        assert_eq!(heap.render(s), "hello");

        let t = heap.bool_new(true);
        assert_eq!(heap.render(t), "true");
    }

    #[test]
    fn test_render_proper_list() {
        let mut heap = Heap::new();
        let items: Vec<Value> = (1..=3).map(|n| heap.number_new(n)).collect();
        let list = heap.list_from(&items);

        assert_eq!(heap.render(list), "(1 2 3)");
    }

    #[test]
    fn test_render_dotted_pair() {
        let mut heap = Heap::new();
        let a = heap.number_new(1);
        let b = heap.number_new(2);
        let pair = heap.cons_new(a, b);

        assert_eq!(heap.render(pair), "(1 . 2)");
    }

    #[test]
    fn test_render_dotted_tail() {
        let mut heap = Heap::new();
        let c = heap.number_new(3);
        let b = heap.number_new(2);
        let a = heap.number_new(1);
        let tail = heap.cons_new(b, c);
        let list = heap.cons_new(a, tail);

        assert_eq!(heap.render(list), "(1 2 . 3)");
    }

    #[test]
    fn test_should_collect_cold_start() {
        let mut heap = Heap::new();
        for i in 0..GC_COLD_THRESHOLD {
            heap.number_new(i as i64);
        }
        assert!(!heap.should_collect());

        heap.number_new(0);
        assert!(heap.should_collect());
    }
}
