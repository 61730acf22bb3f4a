// ABOUTME: Environment frames and the lexical lookup chain

use crate::heap::Heap;
use crate::map::SymbolMap;
use crate::value::{EnvRef, Value};

/// One level of the environment chain. Frames live in the heap beside the
/// objects they bind, carry a mark bit, and are collected as a unit.
#[derive(Debug)]
pub struct Frame {
    pub(crate) bindings: SymbolMap,
    pub(crate) parent: Option<EnvRef>,
    pub(crate) marked: bool,
}

impl Heap {
    /// Creates a frame whose lookups fall through to `parent`. The first
    /// frame ever created is the global frame.
    pub fn env_new(&mut self, parent: Option<EnvRef>) -> EnvRef {
        let frame = Frame {
            bindings: SymbolMap::new(),
            parent,
            marked: false,
        };
        match self.free_frames.pop() {
            Some(i) => {
                self.frames[i as usize] = Some(frame);
                EnvRef(i)
            }
            None => {
                self.frames.push(Some(frame));
                EnvRef((self.frames.len() - 1) as u32)
            }
        }
    }

    fn frame(&self, env: EnvRef) -> &Frame {
        self.frames[env.0 as usize]
            .as_ref()
            .expect("use of collected frame")
    }

    fn frame_mut(&mut self, env: EnvRef) -> &mut Frame {
        self.frames[env.0 as usize]
            .as_mut()
            .expect("use of collected frame")
    }

    /// Binds `name` in this frame only.
    pub fn env_put(&mut self, env: EnvRef, name: &str, value: Value) {
        self.frame_mut(env).bindings.put(name, value);
    }

    /// Walks the chain from `env` to the root; `None` means unbound.
    pub fn env_get(&self, env: EnvRef, name: &str) -> Option<Value> {
        let mut cursor = Some(env);
        while let Some(e) = cursor {
            let frame = self.frame(e);
            if let Some(value) = frame.bindings.get(name) {
                return Some(value);
            }
            cursor = frame.parent;
        }
        None
    }

    /// Writes at the first enclosing frame that defines `name`; if no
    /// frame does, binds in the current frame.
    pub fn env_set(&mut self, env: EnvRef, name: &str, value: Value) {
        let mut cursor = Some(env);
        while let Some(e) = cursor {
            let (defined, parent) = {
                let frame = self.frame(e);
                (frame.bindings.contains_key(name), frame.parent)
            };
            if defined {
                self.frame_mut(e).bindings.put(name, value);
                return;
            }
            cursor = parent;
        }
        self.env_put(env, name, value);
    }

    /// Binds `name` in the global frame regardless of the current depth.
    pub fn env_define_at_root(&mut self, env: EnvRef, name: &str, value: Value) {
        let mut root = env;
        while let Some(parent) = self.frame(root).parent {
            root = parent;
        }
        self.env_put(root, name, value);
    }
}
