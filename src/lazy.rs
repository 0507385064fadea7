// This file is part of the shakmaty-mtb library.
// Copyright (C) 2019-2020 Niklas Fiekas <niklas.fiekas@backscattering.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A value that is initialized on first access, at most once, and can be
/// read without locking afterwards.
///
/// Initialization results are latched: whatever the closure produces is
/// what every later caller sees, so fallible loaders store their failure
/// state in `T` rather than retrying.
#[derive(Debug)]
pub struct Lazy<T> {
    initialized: AtomicBool,
    lock: Mutex<()>,
    value: UnsafeCell<Option<T>>,
}

// The UnsafeCell is only written while holding the lock and before the
// initialized flag is released.
unsafe impl<T: Send + Sync> Sync for Lazy<T> {}

impl<T> Lazy<T> {
    pub fn new() -> Lazy<T> {
        Lazy {
            initialized: AtomicBool::new(false),
            lock: Mutex::new(()),
            value: UnsafeCell::new(None),
        }
    }

    /// An already initialized value, e.g. transplanted from another owner.
    pub fn preset(value: T) -> Lazy<T> {
        Lazy {
            initialized: AtomicBool::new(true),
            lock: Mutex::new(()),
            value: UnsafeCell::new(Some(value)),
        }
    }

    pub fn get_or_init<F>(&self, f: F) -> &T
    where
        F: FnOnce() -> T,
    {
        // Double-checked locking:
        // https://stackoverflow.com/a/45692413/722291
        if !self.initialized.load(Ordering::Acquire) {
            let _lock = self.lock.lock().unwrap();

            if !self.initialized.load(Ordering::Relaxed) {
                let value = unsafe { &mut *self.value.get() };
                *value = Some(f());
                self.initialized.store(true, Ordering::Release);
            }
        }

        unsafe { &*self.value.get() }.as_ref().unwrap()
    }

    /// The value, if it has been initialized.
    pub fn get(&self) -> Option<&T> {
        if self.initialized.load(Ordering::Acquire) {
            unsafe { &*self.value.get() }.as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        if *self.initialized.get_mut() {
            self.value.get_mut().as_mut()
        } else {
            None
        }
    }

    /// Remove the value, returning the cell to its uninitialized state.
    pub fn take(&mut self) -> Option<T> {
        *self.initialized.get_mut() = false;
        self.value.get_mut().take()
    }

    pub fn into_inner(mut self) -> Option<T> {
        self.value.get_mut().take()
    }
}

impl<T> Default for Lazy<T> {
    fn default() -> Lazy<T> {
        Lazy::new()
    }
}
