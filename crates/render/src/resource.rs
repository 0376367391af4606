//! Generational handle table for native resources (textures, buffers, audio).
//!
//! Handles are opaque: an index plus the generation of the slot at
//! acquisition time. Releasing a slot bumps its generation, so any handle
//! still pointing at it is detected as disposed instead of reaching whatever
//! reuses the slot.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    Buffer,
    AudioBuffer,
    AudioSource,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Texture => "texture",
            ResourceKind::Buffer => "buffer",
            ResourceKind::AudioBuffer => "audio buffer",
            ResourceKind::AudioSource => "audio source",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    kind: ResourceKind,
    index: u32,
    generation: u32,
}

impl ResourceHandle {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}v{}", self.kind, self.index, self.generation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("{kind} {handle} has been disposed")]
    Disposed {
        kind: ResourceKind,
        handle: ResourceHandle,
    },
    #[error("handle {handle} does not belong to this table")]
    Foreign { handle: ResourceHandle },
}

struct Slot<T> {
    generation: u32,
    kind: ResourceKind,
    value: Option<T>,
}

/// Owns resources and hands out generational handles to them.
pub struct ResourceTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Default for ResourceTable<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> ResourceTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live resources.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn acquire(&mut self, kind: ResourceKind, value: T) -> ResourceHandle {
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.kind = kind;
                slot.value = Some(value);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    kind,
                    value: Some(value),
                });
                (self.slots.len() - 1) as u32
            }
        };
        let handle = ResourceHandle {
            kind,
            index,
            generation: self.slots[index as usize].generation,
        };
        tracing::trace!(%handle, "resource acquired");
        handle
    }

    fn slot(&self, handle: ResourceHandle) -> Result<&Slot<T>, ResourceError> {
        let slot = self
            .slots
            .get(handle.index as usize)
            .ok_or(ResourceError::Foreign { handle })?;
        if slot.generation != handle.generation || slot.value.is_none() || slot.kind != handle.kind
        {
            return Err(ResourceError::Disposed {
                kind: handle.kind,
                handle,
            });
        }
        Ok(slot)
    }

    pub fn is_live(&self, handle: ResourceHandle) -> bool {
        self.slot(handle).is_ok()
    }

    pub fn get(&self, handle: ResourceHandle) -> Result<&T, ResourceError> {
        self.slot(handle)?
            .value
            .as_ref()
            .ok_or(ResourceError::Disposed {
                kind: handle.kind,
                handle,
            })
    }

    pub fn get_mut(&mut self, handle: ResourceHandle) -> Result<&mut T, ResourceError> {
        self.slot(handle)?;
        self.slots[handle.index as usize]
            .value
            .as_mut()
            .ok_or(ResourceError::Disposed {
                kind: handle.kind,
                handle,
            })
    }

    /// Dispose a resource, returning it. Releasing twice is an error.
    pub fn release(&mut self, handle: ResourceHandle) -> Result<T, ResourceError> {
        self.slot(handle)?;
        let slot = &mut self.slots[handle.index as usize];
        let value = slot.value.take().ok_or(ResourceError::Disposed {
            kind: handle.kind,
            handle,
        })?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        tracing::trace!(%handle, "resource released");
        Ok(value)
    }
}
