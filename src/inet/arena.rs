// Generational arenas for the three kinds of graph objects. A handle remembers the generation of
// the slot it was issued for, so once the value is removed the handle stops resolving even if the
// slot gets reused.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
  index: u32,
  generation: u32,
}

pub trait Handle: Copy {
  fn from_key(key: Key) -> Self;
  fn key(self) -> Key;
}

macro_rules! handle {
  ($name:ident, $tag:expr) => {
    #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct $name(Key);

    impl Handle for $name {
      fn from_key(key: Key) -> Self {
        $name(key)
      }
      fn key(self) -> Key {
        self.0
      }
    }

    impl fmt::Debug for $name {
      fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", $tag, self.0.index)?;
        if self.0.generation > 0 {
          write!(f, "@{}", self.0.generation)?;
        }
        Ok(())
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
      }
    }
  };
}

handle!(NodeId, "n");
handle!(PortId, "p");
handle!(EdgeId, "e");

struct Entry<T> {
  generation: u32,
  value: Option<T>,
}

pub struct Arena<H, T> {
  entries: Vec<Entry<T>>,
  vacant: Vec<u32>,
  len: usize,
  marker: PhantomData<fn() -> H>,
}

impl<H, T> Default for Arena<H, T> {
  fn default() -> Self {
    Arena {
      entries: Vec::new(),
      vacant: Vec::new(),
      len: 0,
      marker: PhantomData,
    }
  }
}

impl<H: Handle, T> Arena<H, T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, value: T) -> H {
    self.len += 1;
    match self.vacant.pop() {
      Some(index) => {
        let entry = &mut self.entries[index as usize];
        entry.value = Some(value);
        H::from_key(Key { index, generation: entry.generation })
      }
      None => {
        let index = self.entries.len() as u32;
        self.entries.push(Entry { generation: 0, value: Some(value) });
        H::from_key(Key { index, generation: 0 })
      }
    }
  }

  // Removes a value. Returns None if the handle is stale.
  pub fn remove(&mut self, handle: H) -> Option<T> {
    let key = handle.key();
    let entry = self.entries.get_mut(key.index as usize)?;
    if entry.generation != key.generation {
      return None;
    }
    let value = entry.value.take()?;
    entry.generation = entry.generation.wrapping_add(1);
    self.vacant.push(key.index);
    self.len -= 1;
    Some(value)
  }

  pub fn get(&self, handle: H) -> Option<&T> {
    let key = handle.key();
    self.entries
      .get(key.index as usize)
      .filter(|entry| entry.generation == key.generation)
      .and_then(|entry| entry.value.as_ref())
  }

  pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
    let key = handle.key();
    self.entries
      .get_mut(key.index as usize)
      .filter(|entry| entry.generation == key.generation)
      .and_then(|entry| entry.value.as_mut())
  }

  pub fn contains(&self, handle: H) -> bool {
    self.get(handle).is_some()
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn iter(&self) -> impl Iterator<Item = (H, &T)> {
    self.entries.iter().enumerate().filter_map(|(index, entry)| {
      let key = Key { index: index as u32, generation: entry.generation };
      entry.value.as_ref().map(|value| (H::from_key(key), value))
    })
  }

  pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
    self.entries.iter_mut().filter_map(|entry| entry.value.as_mut())
  }
}

impl<H: Handle + fmt::Debug, T> Index<H> for Arena<H, T> {
  type Output = T;
  fn index(&self, handle: H) -> &T {
    match self.get(handle) {
      Some(value) => value,
      None => panic!("stale handle {:?}", handle),
    }
  }
}

impl<H: Handle + fmt::Debug, T> IndexMut<H> for Arena<H, T> {
  fn index_mut(&mut self, handle: H) -> &mut T {
    match self.get_mut(handle) {
      Some(value) => value,
      None => panic!("stale handle {:?}", handle),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn insert_get_remove() {
    let mut arena: Arena<NodeId, &str> = Arena::new();
    let a = arena.insert("a");
    let b = arena.insert("b");
    assert_eq!(arena.len(), 2);
    assert_eq!(arena[a], "a");
    assert_eq!(arena.remove(b), Some("b"));
    assert_eq!(arena.len(), 1);
    assert!(!arena.contains(b));
    assert_eq!(arena.remove(b), None);
  }

  #[test]
  fn reused_slot_does_not_revive_stale_handle() {
    let mut arena: Arena<PortId, u32> = Arena::new();
    let old = arena.insert(1);
    arena.remove(old);
    let new = arena.insert(2);
    assert_ne!(old, new);
    assert_eq!(arena.get(old), None);
    assert_eq!(arena.get(new), Some(&2));
    assert_eq!(arena.iter().count(), 1);
  }

  #[test]
  #[should_panic(expected = "stale handle")]
  fn indexing_a_stale_handle_panics() {
    let mut arena: Arena<EdgeId, u32> = Arena::new();
    let edge = arena.insert(7);
    arena.remove(edge);
    let _ = arena[edge];
  }
}
